//! String literal decoding and identifier helpers.
//!
//! ## Escape Sequences
//!
//! | Escape | Meaning |
//! |--------|---------|
//! | `\n` `\r` `\t` `\b` `\f` `\v` `\0` | Control characters |
//! | `\xNN` | Hex escape |
//! | `\uNNNN` | Unicode escape |
//! | `\u{N...}` | Code point escape |
//! | `\cX` | Control character `X % 32` |
//! | `\` + newline | Line continuation (produces nothing) |
//! | `\` + anything else | The character itself |

/// Checks if a character can start an identifier.
pub fn is_id_start(ch: char) -> bool {
    ch == '_' || ch == '$' || unicode_xid::UnicodeXID::is_xid_start(ch)
}

/// Checks if a character can continue an identifier.
pub fn is_id_continue(ch: char) -> bool {
    ch == '_' || ch == '$' || unicode_xid::UnicodeXID::is_xid_continue(ch)
}

/// Returns the byte length of the identifier at the start of `input`, or 0.
pub fn identifier_len(input: &str) -> usize {
    let mut chars = input.char_indices();
    match chars.next() {
        Some((_, ch)) if is_id_start(ch) => {}
        _ => return 0,
    }
    chars
        .find(|&(_, ch)| !is_id_continue(ch))
        .map_or(input.len(), |(pos, _)| pos)
}

/// Returns true if `name` is a complete identifier.
pub fn is_identifier(name: &str) -> bool {
    !name.is_empty() && identifier_len(name) == name.len()
}

/// Decodes the quoted string literal at the start of `input`.
///
/// Returns the decoded value and the byte length of the literal including
/// both quotes. Only single- and double-quoted literals are accepted.
pub fn parse_string_at(input: &str) -> Option<(String, usize)> {
    let mut chars = input.char_indices().peekable();
    let quote = match chars.next() {
        Some((_, q @ ('\'' | '"'))) => q,
        _ => return None,
    };
    let mut value = String::new();

    loop {
        let (pos, ch) = chars.next()?;
        match ch {
            c if c == quote => return Some((value, pos + 1)),
            '\n' => return None,
            '\\' => {
                let (_, escaped) = chars.next()?;
                match escaped {
                    'n' => value.push('\n'),
                    'r' => value.push('\r'),
                    't' => value.push('\t'),
                    'b' => value.push('\u{8}'),
                    'f' => value.push('\u{c}'),
                    'v' => value.push('\u{b}'),
                    '0' => value.push('\0'),
                    '\n' => {}
                    '\r' => {
                        if chars.peek().map(|&(_, c)| c) == Some('\n') {
                            chars.next();
                        }
                    }
                    'x' => {
                        let code = take_hex(&mut chars, 2)?;
                        value.push(char::from_u32(code)?);
                    }
                    'u' => {
                        let code = if chars.peek().map(|&(_, c)| c) == Some('{') {
                            chars.next();
                            let mut code = 0u32;
                            loop {
                                let (_, c) = chars.next()?;
                                if c == '}' {
                                    break;
                                }
                                code = code.checked_mul(16)?.checked_add(c.to_digit(16)?)?;
                            }
                            code
                        } else {
                            take_hex(&mut chars, 4)?
                        };
                        value.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                    }
                    'c' => match chars.peek().map(|&(_, c)| c) {
                        Some(letter) if letter.is_ascii_alphabetic() => {
                            chars.next();
                            value.push(char::from(letter as u8 % 32));
                        }
                        _ => value.push('c'),
                    },
                    other => value.push(other),
                }
            }
            other => value.push(other),
        }
    }
}

fn take_hex(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    count: usize,
) -> Option<u32> {
    let mut code = 0u32;
    for _ in 0..count {
        let (_, c) = chars.next()?;
        code = code * 16 + c.to_digit(16)?;
    }
    Some(code)
}

//! Skip-region measurement.
//!
//! A skip region is a lexical span whose contents must never be scanned for
//! statement syntax: string literals, comments, regex literals and template
//! literals. Every function here looks only at the start of its input and
//! returns the byte length of the region found there.
//!
//! ## Priority
//!
//! | Input starts with | Region |
//! |-------------------|--------|
//! | `'` or `"` | String literal (single line, backslash escapes) |
//! | `//` | Line comment (newline excluded) |
//! | `/*` | Block comment |
//! | `/` | Regex literal with trailing flags |
//! | `` ` `` | Template literal, nested interpolation included |
//!
//! ## Known limitations
//!
//! Without knowing the preceding token a lone `/` is always read as the start
//! of a regex literal, so `a / b / c` on one line is measured as a regex.
//! [`skip_region_after`] accepts the previous significant character and uses
//! it to tell division from a regex. Unterminated literals are not regions at
//! all: the caller advances one character and keeps going.

/// Maximum nesting of template literals inside interpolations.
pub const MAX_TEMPLATE_DEPTH: usize = 256;

/// Measures the skip region at the start of `input`.
pub fn skip_region(input: &str) -> Option<usize> {
    measure(input.as_bytes(), None)
}

/// Measures the skip region at the start of `input`, given the last
/// non-whitespace character before it (`None` at the start of a buffer).
pub fn skip_region_after(prev: Option<char>, input: &str) -> Option<usize> {
    let prev = match prev {
        Some(ch) if ch.is_ascii() => Some(ch as u8),
        Some(_) => Some(b'a'),
        None => None,
    };
    measure(input.as_bytes(), Some(prev))
}

/// Returns true if a `/` following `prev` starts a regex literal rather than
/// a division.
pub fn regex_allowed_after(prev: Option<u8>) -> bool {
    match prev {
        None => true,
        Some(b) => matches!(
            b,
            b'(' | b','
                | b'='
                | b':'
                | b'['
                | b'!'
                | b'&'
                | b'|'
                | b'?'
                | b'{'
                | b'}'
                | b';'
                | b'+'
                | b'-'
                | b'*'
                | b'%'
                | b'<'
                | b'>'
                | b'~'
                | b'^'
        ),
    }
}

/// `context` is `None` when nothing is known about the preceding text, and
/// `Some(prev)` when the caller tracked it.
fn measure(bytes: &[u8], context: Option<Option<u8>>) -> Option<usize> {
    match bytes.first()? {
        b'\'' | b'"' => quoted(bytes),
        b'/' => match bytes.get(1) {
            Some(b'/') => Some(line_comment(bytes)),
            Some(b'*') => block_comment(bytes),
            _ => match context {
                Some(prev) if !regex_allowed_after(prev) => None,
                _ => regex_literal(bytes),
            },
        },
        b'`' => template(bytes),
        _ => None,
    }
}

fn quoted(bytes: &[u8]) -> Option<usize> {
    let quote = bytes[0];
    let mut i = 1;
    loop {
        match *bytes.get(i)? {
            b'\\' => {
                // `\` followed by CRLF is a line continuation
                if bytes.get(i + 1) == Some(&b'\r') && bytes.get(i + 2) == Some(&b'\n') {
                    i += 3;
                } else {
                    i += 2;
                }
            }
            b'\n' => return None,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
}

fn line_comment(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .position(|&b| b == b'\n')
        .unwrap_or(bytes.len())
}

fn block_comment(bytes: &[u8]) -> Option<usize> {
    bytes[2..]
        .windows(2)
        .position(|w| w == b"*/")
        .map(|pos| pos + 4)
}

fn regex_literal(bytes: &[u8]) -> Option<usize> {
    let mut i = 1;
    let mut in_class = false;
    loop {
        match *bytes.get(i)? {
            b'\\' => i += 2,
            b'\n' => return None,
            b'[' => {
                in_class = true;
                i += 1;
            }
            b']' => {
                in_class = false;
                i += 1;
            }
            b'/' if !in_class => break,
            _ => i += 1,
        }
    }
    // closing slash, then flags
    i += 1;
    while bytes.get(i).is_some_and(u8::is_ascii_alphabetic) {
        i += 1;
    }
    Some(i)
}

#[derive(Debug, Clone, Copy)]
enum Frame {
    Template,
    Interpolation { braces: usize },
}

fn template(bytes: &[u8]) -> Option<usize> {
    let mut stack = vec![Frame::Template];
    let mut i = 1;

    loop {
        let Some(&frame) = stack.last() else {
            return Some(i);
        };
        let b = *bytes.get(i)?;

        match frame {
            Frame::Template => match b {
                b'\\' => i += 2,
                b'`' => {
                    stack.pop();
                    i += 1;
                }
                b'$' if bytes.get(i + 1) == Some(&b'{') => {
                    if stack.len() >= MAX_TEMPLATE_DEPTH {
                        return None;
                    }
                    stack.push(Frame::Interpolation { braces: 1 });
                    i += 2;
                }
                _ => i += 1,
            },
            Frame::Interpolation { braces } => match b {
                b'\'' | b'"' => i += quoted(&bytes[i..]).unwrap_or(1),
                b'/' => {
                    let prev = bytes[..i]
                        .iter()
                        .rev()
                        .copied()
                        .find(|b| !b.is_ascii_whitespace());
                    i += measure(&bytes[i..], Some(prev)).unwrap_or(1);
                }
                b'`' => {
                    if stack.len() >= MAX_TEMPLATE_DEPTH {
                        return None;
                    }
                    stack.push(Frame::Template);
                    i += 1;
                }
                b'{' => {
                    set_braces(&mut stack, braces + 1);
                    i += 1;
                }
                b'}' => {
                    i += 1;
                    if braces == 1 {
                        stack.pop();
                    } else {
                        set_braces(&mut stack, braces - 1);
                    }
                }
                _ => i += 1,
            },
        }
    }
}

fn set_braces(stack: &mut [Frame], depth: usize) {
    if let Some(Frame::Interpolation { braces }) = stack.last_mut() {
        *braces = depth;
    }
}

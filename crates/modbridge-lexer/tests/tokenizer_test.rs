//! Tokenizer Integration Tests
//!
//! Runs the tokenizer over realistic JavaScript snippets.

use modbridge_lexer::{Recognized, Recognizer, Selector, Span, Tokenizer, parse_string_at, skip_region};

fn js_tokenizer(source: &str) -> Tokenizer<'static> {
    Tokenizer::new(
        source,
        vec![
            ("skip", Recognizer::func(|s: &str| skip_region(s).map(Recognized::bare))),
            ("keyword", Recognizer::pattern(r"\b(?:import|export|require)\b").unwrap()),
            ("word", Recognizer::pattern(r"[A-Za-z_$][\w$]*").unwrap()),
            ("string", Recognizer::pattern(r#""[^"]*""#).unwrap()),
        ],
    )
}

#[test]
fn test_nested_template_is_one_region() {
    let source = "const t = `a ${ `b ${ `c ${ d } e` } f` } g`; next";
    let tok = js_tokenizer(source);
    let skips: Vec<_> = tok.tokens_named("skip").collect();
    assert_eq!(skips.len(), 1);
    assert_eq!(skips[0].text, "`a ${ `b ${ `c ${ d } e` } f` } g`");
    assert_eq!(tok.tokens().last().unwrap().text, "next");
}

#[test]
fn test_keywords_inside_regions_are_hidden() {
    let source = concat!(
        "const a = 'import x';\n",
        "// export default a\n",
        "/* require('b') */\n",
        "const r = /import/g;\n",
        "const t = `${ \"export\" } import`;\n",
        "import y from \"./y.js\";\n",
    );
    let tok = js_tokenizer(source);
    let keywords: Vec<_> = tok.tokens_named("keyword").collect();
    assert_eq!(keywords.len(), 1);
    assert_eq!(keywords[0].span.start, source.rfind("import").unwrap());
}

#[test]
fn test_earlier_recognizer_wins() {
    let tok = js_tokenizer("require exporter");
    let names: Vec<_> = tok.tokens().iter().map(|t| t.name).collect();
    assert_eq!(names, ["keyword", "word"]);
}

#[test]
fn test_spans_index_original_buffer() {
    let source = "import \"é\";";
    let tok = js_tokenizer(source);
    for token in tok.tokens() {
        assert_eq!(&source[token.span.start..token.span.end], token.text);
    }
    let skip = tok.tokens_named("skip").next().unwrap();
    assert_eq!(skip.span, Span::new(7, 7 + "\"é\"".len()));
    assert_eq!(parse_string_at(&skip.text), Some(("é".to_string(), skip.text.len())));
}

#[test]
fn test_group_matching_over_statements() {
    let tok = js_tokenizer("import a from \"x\"; import b; export c");
    let selectors = ["keyword", "word", "?word"].map(Selector::from);
    let groups = tok.match_groups(&selectors);
    let texts: Vec<Vec<&str>> = groups
        .iter()
        .map(|g| g.iter().filter_map(|i| i.as_token()).map(|t| t.text.as_str()).collect())
        .collect();
    assert_eq!(texts, [vec!["import", "a", "from"], vec!["import", "b"], vec!["export", "c"]]);
}

use helios_xml::XmlError;
use helios_xml::xml::lexer::{QualifiedName, Token, Tokenizer};
use helios_xml::xml::namespace::{NamespaceScope, scan_declarations};

fn tokens(xml: &str) -> Result<Vec<Token>, XmlError> {
    let mut tokenizer = Tokenizer::new(xml);
    let mut out = Vec::new();
    loop {
        let token = tokenizer.next_token()?;
        if token == Token::DocumentEnd {
            return Ok(out);
        }
        out.push(token);
    }
}

fn name(raw: &str) -> QualifiedName {
    match raw.split_once(':') {
        Some((prefix, local)) => QualifiedName::prefixed(prefix, local),
        None => QualifiedName::new(raw),
    }
}

#[test]
fn test_greeting_token_stream() -> Result<(), XmlError> {
    let actual = tokens(r#"<Greeting from="Ryan" to='Bill'><Message>Hi</Message></Greeting>"#)?;
    assert_eq!(
        actual,
        vec![
            Token::ElementStart(name("Greeting")),
            Token::AttributeName(name("from")),
            Token::AttributeValue("Ryan".to_string()),
            Token::AttributeName(name("to")),
            Token::AttributeValue("Bill".to_string()),
            Token::ElementStartEnd,
            Token::ElementStart(name("Message")),
            Token::ElementStartEnd,
            Token::Text("Hi".to_string()),
            Token::ElementEnd(Some(name("Message"))),
            Token::ElementEnd(Some(name("Greeting"))),
        ]
    );
    Ok(())
}

#[test]
fn test_prefixes_and_self_closing_tags() -> Result<(), XmlError> {
    let actual = tokens(r#"<stream:stream xmlns:stream="urn:s" xml:lang = "en" />"#)?;
    assert_eq!(
        actual,
        vec![
            Token::ElementStart(name("stream:stream")),
            Token::AttributeName(name("xmlns:stream")),
            Token::AttributeValue("urn:s".to_string()),
            Token::AttributeName(name("xml:lang")),
            Token::AttributeValue("en".to_string()),
            Token::ElementEnd(None),
        ]
    );
    Ok(())
}

#[test]
fn test_insignificant_markup_is_skipped() -> Result<(), XmlError> {
    let actual = tokens(
        "<?xml version=\"1.0\"?>\n<!DOCTYPE a>\n<!-- <fake> -->\n<a>\n  <?pi data?>\n  <b/>\n</a>\n<!-- end -->\n",
    )?;
    assert_eq!(
        actual,
        vec![
            Token::ElementStart(name("a")),
            Token::ElementStartEnd,
            Token::ElementStart(name("b")),
            Token::ElementEnd(None),
            Token::ElementEnd(Some(name("a"))),
        ]
    );
    Ok(())
}

#[test]
fn test_text_is_trimmed_unescaped_and_merged() -> Result<(), XmlError> {
    let actual = tokens("<a>\n  one &amp; <!-- gap --> two<![CDATA[ <three> ]]>\n</a>")?;
    assert_eq!(actual[2], Token::Text("one &  two <three> ".to_string()));
    Ok(())
}

#[test]
fn test_valueless_attributes() -> Result<(), XmlError> {
    let actual = tokens("<input required disabled/>")?;
    assert_eq!(
        actual,
        vec![
            Token::ElementStart(name("input")),
            Token::AttributeName(name("required")),
            Token::AttributeName(name("disabled")),
            Token::ElementEnd(None),
        ]
    );
    Ok(())
}

#[test]
fn test_unterminated_attribute_reports_quote_position() {
    let mut tokenizer = Tokenizer::new(r#"<a b="xyz"#);
    assert_eq!(tokenizer.next_token().ok(), Some(Token::ElementStart(name("a"))));
    assert_eq!(tokenizer.next_token().ok(), Some(Token::AttributeName(name("b"))));
    match tokenizer.next_token() {
        Err(XmlError::MalformedInput { position, .. }) => assert_eq!(position, 5),
        other => panic!("expected malformed input, got {:?}", other),
    }
}

#[test]
fn test_malformed_inputs() {
    let cases = [
        "<a b=\"<\"/>",
        "<a b=c/>",
        "<a",
        "<a>text",
        "<a>&bogus;</a>",
        "<a><!-- open</a>",
        "<a><![CDATA[never closed</a>",
        "</>",
    ];
    for xml in cases {
        assert!(
            matches!(tokens(xml), Err(XmlError::MalformedInput { .. })),
            "expected malformed input for {:?}",
            xml
        );
    }
}

#[test]
fn test_snapshot_scans_ahead_for_declarations() -> Result<(), XmlError> {
    let mut tokenizer = Tokenizer::new(r#"<p:a b="1" p:c="2" xmlns:p="urn:p" xmlns="urn:d"><p:child/></p:a>"#);
    assert_eq!(tokenizer.next_token()?, Token::ElementStart(name("p:a")));
    let position = tokenizer.position();

    let declarations = scan_declarations(&tokenizer)?;
    assert_eq!(
        declarations,
        vec![
            ("p".to_string(), "urn:p".to_string()),
            (String::new(), "urn:d".to_string()),
        ]
    );
    assert_eq!(tokenizer.position(), position);

    let scope = NamespaceScope::root().enter_start_tag(&tokenizer)?;
    assert_eq!(scope.resolve_element(&name("p:a"))?.as_deref(), Some("urn:p"));
    assert_eq!(scope.resolve_element(&name("child"))?.as_deref(), Some("urn:d"));
    assert_eq!(scope.resolve_attribute(&name("b"))?, None);

    // The primary cursor continues with the first attribute.
    assert_eq!(tokenizer.next_token()?, Token::AttributeName(name("b")));
    Ok(())
}

#[test]
fn test_token_display() {
    assert_eq!(
        Token::ElementStart(name("p:a")).to_string(),
        "start of element <p:a>"
    );
    assert_eq!(Token::ElementEnd(None).to_string(), "end of element '/>'");
    assert_eq!(name("xml:lang").to_string(), "xml:lang");
}

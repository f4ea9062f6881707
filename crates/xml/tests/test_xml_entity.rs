use helios_xml::entity::{XmlAttribute, XmlContent, XmlDocument, XmlElement};
use helios_xml::{Result, XmlConfig, XmlError};

#[test]
fn test_parse_tree() -> Result<()> {
    let doc: XmlDocument = r#"<!-- header -->
<Greeting from="Ryan" to="Bill">
    <Message lang="en">Hi <![CDATA[<there>]]></Message>
    <!-- dropped -->
    <Signature/>
</Greeting>"#
        .parse()?;

    let root = &doc.root;
    assert_eq!(root.name, "Greeting");
    assert_eq!(root.prefix, None);
    assert_eq!(root.attribute("from"), Some("Ryan"));
    assert_eq!(root.attribute("to"), Some("Bill"));

    let children: Vec<&XmlElement> = root.children().collect();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].name, "Message");
    assert_eq!(children[0].attribute("lang"), Some("en"));
    assert_eq!(children[0].text(), "Hi <there>");
    assert_eq!(children[1].name, "Signature");
    assert!(children[1].content.is_empty());
    assert!(
        !root
            .content
            .iter()
            .any(|content| matches!(content, XmlContent::Comment(_)))
    );
    Ok(())
}

#[test]
fn test_prefixes_are_kept_as_written() -> Result<()> {
    let xml = r#"<stream:stream xmlns:stream="http://etherx.jabber.org/streams" xmlns="jabber:client" xml:lang="en"><message>hi</message></stream:stream>"#;
    let doc = XmlDocument::from_xml_str(xml)?;
    assert_eq!(doc.root.name, "stream");
    assert_eq!(doc.root.prefix.as_deref(), Some("stream"));
    assert_eq!(
        doc.root.attributes[0],
        XmlAttribute::new("stream", "http://etherx.jabber.org/streams").with_prefix("xmlns")
    );
    assert_eq!(
        doc.root.attributes[2],
        XmlAttribute::new("lang", "en").with_prefix("xml")
    );
    assert_eq!(doc.to_string(), xml);
    Ok(())
}

#[test]
fn test_undefined_prefix() {
    match XmlDocument::from_xml_str(r#"<a><b p:c="1"/></a>"#) {
        Err(XmlError::UndefinedNamespace { reference }) => assert_eq!(reference, "p"),
        other => panic!("expected an undefined namespace error, got {:?}", other),
    }
    assert!(matches!(
        XmlDocument::from_xml_str(r#"<a><b xmlns:p="urn:p"/><p:c/></a>"#),
        Err(XmlError::UndefinedNamespace { .. })
    ));
}

#[test]
fn test_malformed_documents() {
    let cases = ["", "<a>", "<a></b>", "<a/><b/>", "<a>x</a>y"];
    for xml in cases {
        assert!(
            matches!(
                XmlDocument::from_xml_str(xml),
                Err(XmlError::MalformedInput { .. })
            ),
            "expected malformed input for {:?}",
            xml
        );
    }
}

#[test]
fn test_compact_output_escapes() {
    let doc = XmlDocument::new(
        XmlElement::new("note")
            .with_attribute("title", "a \"quoted\" <title>")
            .with_text("1 < 2 & 3"),
    );
    assert_eq!(
        doc.to_string(),
        r#"<note title="a &quot;quoted&quot; &lt;title&gt;">1 &lt; 2 &amp; 3</note>"#
    );
}

#[test]
fn test_pretty_output() -> Result<()> {
    let doc: XmlDocument = "<a><b>x</b><c/></a>".parse()?;
    let config = XmlConfig::default()
        .with_pretty_print(true)
        .with_xml_declaration(true);
    assert_eq!(
        doc.to_xml_string(&config),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<a>\n  <b>x</b>\n  <c/>\n</a>"
    );
    Ok(())
}

#[test]
fn test_round_trip() -> Result<()> {
    let xml = r#"<list xmlns="urn:list"><item id="1">one</item><item id="2"><sub/></item></list>"#;
    let doc: XmlDocument = xml.parse()?;
    assert_eq!(doc.to_string(), xml);
    assert_eq!(XmlDocument::from_xml_str(&doc.to_string())?, doc);
    Ok(())
}

use std::collections::HashMap;

use helios_xml::schema::{FieldDescriptor, Schema, TypeDescriptor};
use helios_xml::{Result, Xml, XmlConfig, XmlError, to_xml_string, to_xml_string_pretty};
use serde::Serialize;

const STREAMS: &str = "http://etherx.jabber.org/streams";

#[derive(Serialize)]
struct Message {
    #[serde(rename = "$text")]
    content: String,
}

#[derive(Serialize)]
struct Greeting {
    #[serde(rename = "@from")]
    from: String,
    #[serde(rename = "@to")]
    to: String,
    #[serde(rename = "Message")]
    message: Message,
}

fn greeting() -> Greeting {
    Greeting {
        from: "Ryan".to_string(),
        to: "Bill".to_string(),
        message: Message {
            content: "Hi".to_string(),
        },
    }
}

#[derive(Serialize)]
struct SimpleAttributes {
    #[serde(rename = "@first")]
    first: String,
    #[serde(rename = "@second")]
    second: i32,
    #[serde(rename = "@third")]
    third: f32,
    #[serde(rename = "@fourth")]
    fourth: f64,
    #[serde(rename = "@fifth")]
    fifth: i64,
    #[serde(rename = "@sixth")]
    sixth: bool,
    #[serde(rename = "@seventh")]
    seventh: bool,
}

#[derive(Serialize)]
struct ContentAsText {
    #[serde(rename = "@first")]
    first: String,
    #[serde(rename = "@second")]
    second: String,
    #[serde(rename = "$text")]
    third: String,
    fourth: String,
}

#[derive(Serialize)]
struct DefaultNamespace {
    foo: String,
    bar: String,
}

#[derive(Serialize)]
#[serde(rename = "stream")]
struct Stream {
    #[serde(rename = "@from")]
    from: String,
    #[serde(rename = "@to")]
    to: String,
    #[serde(rename = "@version")]
    version: String,
    #[serde(rename = "@lang")]
    lang: String,
}

#[test]
fn test_greeting() -> Result<()> {
    let xml = to_xml_string(&greeting())?;
    assert_eq!(
        xml,
        r#"<Greeting from="Ryan" to="Bill"><Message>Hi</Message></Greeting>"#
    );
    Ok(())
}

#[test]
fn test_simple_attributes() -> Result<()> {
    let value = SimpleAttributes {
        first: "string".to_string(),
        second: 1,
        third: 4.32,
        fourth: 1.23,
        fifth: 123,
        sixth: false,
        seventh: true,
    };
    assert_eq!(
        to_xml_string(&value)?,
        r#"<SimpleAttributes first="string" second="1" third="4.32" fourth="1.23" fifth="123" sixth="false" seventh="true"/>"#
    );
    Ok(())
}

#[test]
fn test_content_as_text() -> Result<()> {
    let value = ContentAsText {
        first: "one".to_string(),
        second: "two".to_string(),
        third: "three".to_string(),
        fourth: "four".to_string(),
    };
    assert_eq!(
        to_xml_string(&value)?,
        r#"<ContentAsText first="one" second="two">three<fourth>four</fourth></ContentAsText>"#
    );
    Ok(())
}

#[test]
fn test_default_namespace_from_schema() -> Result<()> {
    // Roles can come from the schema instead of the serde key.
    let schema = Schema::new().with_type(
        TypeDescriptor::new("DefaultNamespace")
            .with_default_namespace("http://example.com/entity")
            .with_field(FieldDescriptor::attribute("foo"))
            .with_field(FieldDescriptor::attribute("bar")),
    );
    let xml = Xml::new(XmlConfig::default(), schema);
    let value = DefaultNamespace {
        foo: "fooz".to_string(),
        bar: "barz".to_string(),
    };
    assert_eq!(
        xml.to_xml_string(&value)?,
        r#"<DefaultNamespace xmlns="http://example.com/entity" foo="fooz" bar="barz"/>"#
    );
    Ok(())
}

#[test]
fn test_stream_declares_prefix_and_default_namespace() -> Result<()> {
    let schema = Schema::new().with_prefix("stream", STREAMS).with_type(
        TypeDescriptor::new("stream")
            .with_namespace(STREAMS)
            .with_default_namespace("jabber:client"),
    );
    let xml = Xml::new(XmlConfig::default(), schema);
    let value = Stream {
        from: "me@jabber.im".to_string(),
        to: "jabber.im".to_string(),
        version: "1.0".to_string(),
        lang: "en".to_string(),
    };
    assert_eq!(
        xml.to_xml_string(&value)?,
        r#"<stream:stream xmlns:stream="http://etherx.jabber.org/streams" xmlns="jabber:client" from="me@jabber.im" to="jabber.im" version="1.0" lang="en"/>"#
    );
    Ok(())
}

#[derive(Serialize)]
struct Inner {
    #[serde(rename = "{urn:x}value")]
    value: String,
}

#[derive(Serialize)]
struct Outer {
    #[serde(rename = "@{urn:x}lang")]
    lang: String,
    #[serde(rename = "{urn:x}inner")]
    inner: Inner,
}

#[test]
fn test_namespaces_are_declared_once_on_the_outermost_user() -> Result<()> {
    let value = Outer {
        lang: "en".to_string(),
        inner: Inner {
            value: "v".to_string(),
        },
    };
    assert_eq!(
        to_xml_string(&value)?,
        r#"<Outer xmlns:ns1="urn:x" ns1:lang="en"><ns1:inner><ns1:value>v</ns1:value></ns1:inner></Outer>"#
    );

    let preferred = Xml::new(XmlConfig::default(), Schema::new().with_prefix("x", "urn:x"));
    assert_eq!(
        preferred.to_xml_string(&value)?,
        r#"<Outer xmlns:x="urn:x" x:lang="en"><x:inner><x:value>v</x:value></x:inner></Outer>"#
    );
    Ok(())
}

#[derive(Serialize)]
struct Part {
    #[serde(rename = "@id")]
    id: u32,
}

#[derive(Serialize)]
struct Assembly {
    part: Part,
    #[serde(rename = "{urn:y}spare")]
    spare: Part,
}

#[derive(Serialize)]
struct Warehouse {
    part: Part,
}

#[test]
fn test_nested_struct_is_written_in_its_type_namespace() -> Result<()> {
    let schema = Schema::new()
        .with_prefix("x", "urn:x")
        .with_type(TypeDescriptor::new("Part").with_namespace("urn:x"))
        .with_type(TypeDescriptor::new("Warehouse").with_default_namespace("urn:x"));
    let xml = Xml::new(XmlConfig::default(), schema);

    assert_eq!(
        xml.to_xml_string(&Part { id: 3 })?,
        r#"<x:Part xmlns:x="urn:x" id="3"/>"#
    );

    // Declared up front on the parent; a field namespace wins over the type's.
    let assembly = Assembly {
        part: Part { id: 1 },
        spare: Part { id: 2 },
    };
    assert_eq!(
        xml.to_xml_string(&assembly)?,
        r#"<Assembly xmlns:x="urn:x" xmlns:ns1="urn:y"><x:part id="1"/><ns1:spare id="2"/></Assembly>"#
    );

    let warehouse = Warehouse {
        part: Part { id: 4 },
    };
    assert_eq!(
        xml.to_xml_string(&warehouse)?,
        r#"<Warehouse xmlns="urn:x"><part id="4"/></Warehouse>"#
    );
    Ok(())
}

#[derive(Serialize)]
struct Misordered {
    #[serde(rename = "@from")]
    from: String,
    message: String,
    #[serde(rename = "@to")]
    to: String,
}

#[test]
fn test_attribute_after_element_is_a_schema_error() {
    let value = Misordered {
        from: "Ryan".to_string(),
        message: "Hi".to_string(),
        to: "Bill".to_string(),
    };
    match to_xml_string(&value) {
        Err(XmlError::SchemaOrder { field_name }) => assert_eq!(field_name, "to"),
        other => panic!("expected a schema order error, got {:?}", other),
    }
}

#[derive(Serialize)]
struct Note {
    #[serde(rename = "@id")]
    id: u32,
    #[serde(rename = "@lang")]
    lang: Option<String>,
    title: Option<String>,
    body: Option<String>,
}

#[test]
fn test_none_fields_are_omitted() -> Result<()> {
    let value = Note {
        id: 1,
        lang: None,
        title: Some("T".to_string()),
        body: None,
    };
    assert_eq!(
        to_xml_string(&value)?,
        r#"<Note id="1"><title>T</title></Note>"#
    );

    let empty = Note {
        id: 2,
        lang: Some("en".to_string()),
        title: None,
        body: None,
    };
    assert_eq!(to_xml_string(&empty)?, r#"<Note id="2" lang="en"/>"#);
    Ok(())
}

#[test]
fn test_null_without_an_omittable_field_is_rejected() {
    assert!(matches!(
        to_xml_string(&None::<Greeting>),
        Err(XmlError::UnsupportedNull)
    ));

    #[derive(Serialize)]
    struct Items {
        item: Vec<Option<String>>,
    }
    let value = Items {
        item: vec![Some("a".to_string()), None],
    };
    assert!(matches!(
        to_xml_string(&value),
        Err(XmlError::UnsupportedNull)
    ));
}

#[derive(Serialize)]
struct Book {
    #[serde(rename = "@title")]
    title: String,
}

#[derive(Serialize)]
struct Library {
    #[serde(rename = "@name")]
    name: String,
    tag: Vec<String>,
    book: Vec<Book>,
}

#[test]
fn test_sequences_repeat_the_element() -> Result<()> {
    let value = Library {
        name: "City".to_string(),
        tag: vec!["public".to_string(), "free".to_string()],
        book: vec![
            Book {
                title: "A".to_string(),
            },
            Book {
                title: "B".to_string(),
            },
        ],
    };
    assert_eq!(
        to_xml_string(&value)?,
        r#"<Library name="City"><tag>public</tag><tag>free</tag><book title="A"/><book title="B"/></Library>"#
    );
    Ok(())
}

#[test]
fn test_escaping() -> Result<()> {
    let value = ContentAsText {
        first: r#"say "hi" & <wave>"#.to_string(),
        second: "it's".to_string(),
        third: "1 < 2".to_string(),
        fourth: "a & b".to_string(),
    };
    let xml = to_xml_string(&value)?;
    assert!(xml.contains(r#"first="say &quot;hi&quot; &amp; &lt;wave&gt;""#));
    assert!(xml.contains(r#"second="it&apos;s""#));
    assert!(xml.contains(">1 &lt; 2<fourth>a &amp; b</fourth>"));
    Ok(())
}

#[derive(Serialize)]
enum Mood {
    Happy,
    #[serde(rename = "grumpy")]
    Grumpy,
}

#[derive(Serialize)]
struct Person {
    #[serde(rename = "@mood")]
    mood: Mood,
    later: Mood,
}

#[test]
fn test_unit_variants_are_text() -> Result<()> {
    let value = Person {
        mood: Mood::Happy,
        later: Mood::Grumpy,
    };
    assert_eq!(
        to_xml_string(&value)?,
        r#"<Person mood="Happy"><later>grumpy</later></Person>"#
    );
    Ok(())
}

#[test]
fn test_pretty_print() -> Result<()> {
    assert_eq!(
        to_xml_string_pretty(&greeting())?,
        "<Greeting from=\"Ryan\" to=\"Bill\">\n  <Message>Hi</Message>\n</Greeting>"
    );

    let xml = Xml::new(
        XmlConfig::default()
            .with_pretty_print(true)
            .with_indent(4)
            .with_xml_declaration(true),
        Schema::new(),
    );
    let value = Library {
        name: "City".to_string(),
        tag: vec!["public".to_string()],
        book: vec![Book {
            title: "A".to_string(),
        }],
    };
    assert_eq!(
        xml.to_xml_string(&value)?,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Library name=\"City\">\n    <tag>public</tag>\n    <book title=\"A\"/>\n</Library>"
    );
    Ok(())
}

#[test]
fn test_xml_declaration_compact() -> Result<()> {
    let xml = Xml::new(XmlConfig::default().with_xml_declaration(true), Schema::new());
    assert_eq!(
        xml.to_xml_string(&Book {
            title: "A".to_string()
        })?,
        r#"<?xml version="1.0" encoding="UTF-8"?><Book title="A"/>"#
    );
    Ok(())
}

#[test]
fn test_vec_and_writer_match_string() -> Result<()> {
    let expected = to_xml_string(&greeting())?;
    assert_eq!(helios_xml::to_xml_vec(&greeting())?, expected.as_bytes());

    let mut buffer = Vec::new();
    helios_xml::to_xml_writer(&greeting(), &mut buffer)?;
    assert_eq!(buffer, expected.as_bytes());
    Ok(())
}

#[test]
fn test_unsupported_shapes() {
    assert!(matches!(
        to_xml_string("just text"),
        Err(XmlError::Unsupported(_))
    ));

    #[derive(Serialize)]
    struct WithMap {
        entries: HashMap<String, String>,
    }
    let value = WithMap {
        entries: HashMap::from([("a".to_string(), "b".to_string())]),
    };
    assert!(matches!(
        to_xml_string(&value),
        Err(XmlError::Unsupported(_))
    ));

    #[derive(Serialize)]
    struct WithStructAttribute {
        #[serde(rename = "@book")]
        book: Book,
    }
    let value = WithStructAttribute {
        book: Book {
            title: "A".to_string(),
        },
    };
    assert!(matches!(
        to_xml_string(&value),
        Err(XmlError::Unsupported(_))
    ));
}

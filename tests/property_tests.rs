//! Property-based tests for the WBXML codec

use eas_wbxml::{
    NextTag, Parser, START_DOCUMENT, Serializer, WbxmlToXmlConverter, XmlToWbxmlConverter, tags,
    varint,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Node {
    Empty(u16),
    Text(u16, String),
    Opaque(u16, Vec<u8>),
    Parent(u16, Vec<Node>),
}

fn known_tags() -> Vec<u16> {
    let mut known = Vec::new();
    for page in 0..=tags::RIGHTS_MANAGEMENT {
        for index in tags::TAG_BASE..=tags::PAGE_MASK {
            if tags::is_valid_tag(page, index) {
                known.push(tags::tag_number(page, index));
            }
        }
    }
    known
}

fn node_strategy() -> impl Strategy<Value = Node> {
    let tag = prop::sample::select(known_tags());
    let leaf = prop_oneof![
        tag.clone().prop_map(Node::Empty),
        (tag.clone(), "[a-zA-Z0-9][a-zA-Z0-9 &<>.:-]{0,15}")
            .prop_map(|(tag, text)| Node::Text(tag, text)),
        (tag.clone(), prop::collection::vec(any::<u8>(), 1..32))
            .prop_map(|(tag, data)| Node::Opaque(tag, data)),
    ];
    leaf.prop_recursive(4, 32, 4, move |inner| {
        (tag.clone(), prop::collection::vec(inner, 1..4))
            .prop_map(|(tag, children)| Node::Parent(tag, children))
    })
}

fn write_node(serializer: &mut Serializer<Vec<u8>>, node: &Node) -> eas_wbxml::Result<()> {
    match node {
        Node::Empty(tag) => {
            serializer.tag(*tag)?;
        }
        Node::Text(tag, text) => {
            serializer.data(*tag, text)?;
        }
        Node::Opaque(tag, data) => {
            serializer
                .start(*tag)?
                .opaque(&data[..], data.len() as u32)?
                .end()?;
        }
        Node::Parent(tag, children) => {
            serializer.start(*tag)?;
            for child in children {
                write_node(serializer, child)?;
            }
            serializer.end()?;
        }
    }
    Ok(())
}

fn encode(root: &Node) -> Vec<u8> {
    let mut serializer = Serializer::in_memory().unwrap();
    write_node(&mut serializer, root).unwrap();
    serializer.done().unwrap();
    serializer.into_inner()
}

fn expect_node(parser: &mut Parser<&[u8]>, node: &Node, parent: u16) -> Result<(), TestCaseError> {
    let tag = match node {
        Node::Empty(tag) | Node::Text(tag, _) | Node::Opaque(tag, _) | Node::Parent(tag, _) => *tag,
    };
    prop_assert_eq!(parser.next_tag(parent).unwrap(), NextTag::Start(tag));

    match node {
        Node::Empty(_) => prop_assert_eq!(parser.value().unwrap(), ""),
        Node::Text(_, text) => prop_assert_eq!(&parser.value().unwrap(), text),
        Node::Opaque(_, data) => prop_assert_eq!(&parser.value_bytes().unwrap(), data),
        Node::Parent(_, children) => {
            for child in children {
                expect_node(parser, child, tag)?;
            }
            prop_assert_eq!(parser.next_tag(tag).unwrap(), NextTag::End);
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn varint_roundtrip_property(value in any::<u32>()) {
        let encoded = varint::encode(value);
        prop_assert!(encoded.len() <= varint::MAX_BYTES);
        let (decoded, used) = varint::decode_slice(&encoded).expect("Failed to decode varint");
        prop_assert_eq!(value, decoded);
        prop_assert_eq!(used, encoded.len());
    }

    #[test]
    fn parser_reads_what_serializer_wrote(root in node_strategy()) {
        let wbxml = encode(&root);
        let mut parser = Parser::new(&wbxml[..]).unwrap();
        expect_node(&mut parser, &root, START_DOCUMENT)?;
        prop_assert_eq!(parser.next_tag(START_DOCUMENT).unwrap(), NextTag::EndDocument);
        prop_assert_eq!(parser.depth(), 0);
    }

    #[test]
    fn xml_dump_encodes_back_to_same_bytes(root in node_strategy()) {
        let wbxml = encode(&root);
        let xml = WbxmlToXmlConverter::convert_bytes(&wbxml).unwrap();
        let encoded = XmlToWbxmlConverter::convert_bytes(xml.as_bytes()).unwrap();
        prop_assert_eq!(encoded, wbxml);
    }

    #[test]
    fn skip_tag_consumes_whole_element(root in node_strategy(), after in prop::sample::select(known_tags())) {
        let mut serializer = Serializer::in_memory().unwrap();
        let wrapper = tags::find("AirSync:Sync").unwrap();
        serializer.start(wrapper).unwrap();
        write_node(&mut serializer, &root).unwrap();
        serializer.data(after, "next").unwrap();
        serializer.end().unwrap();
        serializer.done().unwrap();
        let wbxml = serializer.into_inner();

        let mut parser = Parser::new(&wbxml[..]).unwrap();
        prop_assert_eq!(parser.next_tag(START_DOCUMENT).unwrap(), NextTag::Start(wrapper));
        prop_assert!(matches!(parser.next_tag(wrapper).unwrap(), NextTag::Start(_)));
        parser.skip_tag().unwrap();
        prop_assert_eq!(parser.depth(), 1);
        prop_assert_eq!(parser.next_tag(wrapper).unwrap(), NextTag::Start(after));
        prop_assert_eq!(parser.value().unwrap(), "next");
        prop_assert_eq!(parser.next_tag(wrapper).unwrap(), NextTag::End);
    }

    #[test]
    fn empty_value_forms_are_equivalent(tag in prop::sample::select(known_tags()), empty in any::<bool>()) {
        let mut serializer = Serializer::in_memory().unwrap();
        serializer.write_string_value(tag, if empty { Some("") } else { None }).unwrap();
        serializer.done().unwrap();
        let wbxml = serializer.into_inner();

        // Always the one-byte self-closing form, after a page switch if needed
        let switch = if tags::page_of(tag) == tags::AIRSYNC { 0 } else { 2 };
        prop_assert_eq!(wbxml.len(), 5 + switch);
        prop_assert_eq!(wbxml[4 + switch], tags::index_of(tag));

        let mut parser = Parser::new(&wbxml[..]).unwrap();
        prop_assert_eq!(parser.next_tag(START_DOCUMENT).unwrap(), NextTag::Start(tag));
        prop_assert_eq!(parser.value_int().unwrap(), 0);
    }
}

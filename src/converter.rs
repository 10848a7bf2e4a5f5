use crate::parser::Token;
use crate::{Parser, Result, Serializer, WbxmlError, tags};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::{BufRead, Cursor, Read, Write};

const OPAQUE_ATTRIBUTE: (&str, &str) = ("encoding", "base64");

/// Dumps a WBXML document as indented XML.
///
/// Element names are `Page:Tag`, e.g. `AirSync:SyncKey`. Opaque data is
/// written base64-encoded on an element carrying `encoding="base64"`.
pub struct WbxmlToXmlConverter;

impl WbxmlToXmlConverter {
    /// Convert WBXML from a reader to XML on a writer
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use eas_wbxml::WbxmlToXmlConverter;
    /// use std::fs::File;
    ///
    /// let input = File::open("response.wbxml").unwrap();
    /// let output = File::create("response.xml").unwrap();
    /// WbxmlToXmlConverter::convert(input, output).unwrap();
    /// ```
    pub fn convert<R: Read, W: Write>(reader: R, writer: W) -> Result<()> {
        let mut parser = Parser::new(reader)?;
        let mut xml = Writer::new_with_indent(writer, b' ', 2);
        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        // Held back until we know whether the element is empty
        let mut pending: Option<BytesStart<'static>> = None;
        // Tag number and content so far of each open element
        let mut contents: Vec<(u16, Content)> = Vec::new();
        // Opaque blocks of the innermost element, joined into one
        let mut opaque: Vec<u8> = Vec::new();

        loop {
            match parser.next_token()? {
                Token::Start(tag) => {
                    if let Some((parent, content)) = contents.last_mut() {
                        content.add(Content::Elements, *parent)?;
                    }
                    if let Some(start) = pending.take() {
                        xml.write_event(Event::Start(start))?;
                    }
                    contents.push((tag.tag_num(), Content::Nothing));
                    pending = Some(BytesStart::new(tags::qualified_name(tag.tag_num())));
                }
                Token::End(tag) => {
                    let name = tags::qualified_name(tag.tag_num());
                    if matches!(contents.pop(), Some((_, Content::Opaque))) {
                        let mut start = pending
                            .take()
                            .unwrap_or_else(|| BytesStart::new(name.clone()));
                        start.push_attribute(OPAQUE_ATTRIBUTE);
                        xml.write_event(Event::Start(start))?;
                        let encoded = STANDARD.encode(&opaque);
                        xml.write_event(Event::Text(BytesText::new(&encoded)))?;
                        opaque.clear();
                        xml.write_event(Event::End(BytesEnd::new(name)))?;
                    } else {
                        match pending.take() {
                            Some(start) => xml.write_event(Event::Empty(start))?,
                            None => xml.write_event(Event::End(BytesEnd::new(name)))?,
                        }
                    }
                }
                Token::Text(text) => {
                    if let Some((parent, content)) = contents.last_mut() {
                        content.add(Content::Text, *parent)?;
                    }
                    if let Some(start) = pending.take() {
                        xml.write_event(Event::Start(start))?;
                    }
                    xml.write_event(Event::Text(BytesText::new(&text)))?;
                }
                Token::Opaque(bytes) => {
                    let Some((parent, content)) = contents.last_mut() else {
                        return Err(WbxmlError::Format(
                            "Opaque data outside of an element".to_string(),
                        ));
                    };
                    content.add(Content::Opaque, *parent)?;
                    opaque.extend_from_slice(&bytes);
                }
                Token::Done => break,
            }
        }

        if parser.depth() > 0 {
            return Err(WbxmlError::UnexpectedEof(format!(
                "end of document with {} open tags",
                parser.depth()
            )));
        }

        let mut output = xml.into_inner();
        output.write_all(b"\n")?;
        output.flush()?;
        Ok(())
    }

    /// Convert WBXML already in memory to an XML string
    ///
    /// # Examples
    ///
    /// ```
    /// use eas_wbxml::WbxmlToXmlConverter;
    ///
    /// let xml = WbxmlToXmlConverter::convert_bytes(&[0x03, 0x01, 0x6A, 0x00, 0x0B]).unwrap();
    /// assert!(xml.contains("<AirSync:SyncKey/>"));
    /// ```
    pub fn convert_bytes(wbxml: &[u8]) -> Result<String> {
        let mut output = Vec::new();
        Self::convert(Cursor::new(wbxml), &mut output)?;
        String::from_utf8(output)
            .map_err(|_| WbxmlError::Format("Invalid UTF-8 in output".to_string()))
    }
}

/// What an open element has held so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Content {
    Nothing,
    Text,
    Elements,
    Opaque,
}

impl Content {
    /// Opaque data is written as one base64 block, so it cannot share an
    /// element with text or children
    fn add(&mut self, next: Content, tag: u16) -> Result<()> {
        let mixed = match (*self, next) {
            (Content::Nothing, _) => false,
            (Content::Opaque, Content::Opaque) => false,
            (Content::Opaque, _) | (_, Content::Opaque) => true,
            _ => false,
        };
        if mixed {
            return Err(WbxmlError::Format(format!(
                "Opaque data mixed with other content in {}",
                tags::qualified_name(tag)
            )));
        }
        if *self != Content::Opaque {
            *self = next;
        }
        Ok(())
    }
}

/// Encodes XML in the form written by [`WbxmlToXmlConverter`] back to WBXML.
///
/// Whitespace-only text between elements is ignored. Element names must
/// be known `Page:Tag` names; the only attribute accepted is
/// `encoding="base64"`, which turns the element's text into opaque data.
pub struct XmlToWbxmlConverter;

impl XmlToWbxmlConverter {
    pub fn convert<R: BufRead, W: Write>(reader: R, writer: W) -> Result<()> {
        let mut xml = Reader::from_reader(reader);
        xml.config_mut().trim_text(false);
        let mut serializer = Serializer::new(writer)?;

        let mut buf = Vec::new();
        let mut text = String::new();
        // One entry per open element: whether its text is base64 opaque data
        let mut opaque_stack: Vec<bool> = Vec::new();

        loop {
            match xml.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    flush_text(&mut serializer, &mut text, opaque_stack.last().copied())?;
                    let tag = lookup(e.name().as_ref())?;
                    opaque_stack.push(is_opaque(&e)?);
                    serializer.start(tag)?;
                }
                Event::Empty(e) => {
                    flush_text(&mut serializer, &mut text, opaque_stack.last().copied())?;
                    let tag = lookup(e.name().as_ref())?;
                    is_opaque(&e)?;
                    serializer.tag(tag)?;
                }
                Event::End(_) => {
                    flush_text(&mut serializer, &mut text, opaque_stack.last().copied())?;
                    opaque_stack.pop();
                    serializer.end()?;
                }
                Event::Text(e) => text.push_str(utf8(e.as_ref())?),
                Event::CData(e) => text.push_str(utf8(e.as_ref())?),
                Event::GeneralRef(e) => text.push_str(&resolve_reference(utf8(e.as_ref())?)?),
                Event::Eof => break,
                // Declaration, comments, processing instructions, doctype
                _ => {}
            }
            buf.clear();
        }

        flush_text(&mut serializer, &mut text, opaque_stack.last().copied())?;
        serializer.done()
    }

    /// Convert XML already in memory to WBXML bytes
    ///
    /// # Examples
    ///
    /// ```
    /// use eas_wbxml::XmlToWbxmlConverter;
    ///
    /// let wbxml = XmlToWbxmlConverter::convert_bytes(b"<AirSync:SyncKey/>").unwrap();
    /// assert_eq!(wbxml, vec![0x03, 0x01, 0x6A, 0x00, 0x0B]);
    /// ```
    pub fn convert_bytes(xml: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        Self::convert(Cursor::new(xml), &mut output)?;
        Ok(output)
    }
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes)
        .map_err(|e| WbxmlError::Format(format!("Invalid UTF-8 in XML: {}", e)))
}

fn lookup(name: &[u8]) -> Result<u16> {
    let name = utf8(name)?;
    tags::find(name).ok_or_else(|| WbxmlError::Format(format!("Unknown element {}", name)))
}

fn is_opaque(start: &BytesStart<'_>) -> Result<bool> {
    let mut opaque = false;
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = attr.key.as_ref();
        if key == OPAQUE_ATTRIBUTE.0.as_bytes() && attr.value.as_ref() == OPAQUE_ATTRIBUTE.1.as_bytes()
        {
            opaque = true;
        } else {
            return Err(WbxmlError::Format(format!(
                "Attributes unsupported: {}",
                String::from_utf8_lossy(key)
            )));
        }
    }
    Ok(opaque)
}

fn resolve_reference(name: &str) -> Result<String> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix('x') {
            Some(hex_digits) => u32::from_str_radix(hex_digits, 16).ok(),
            None => number.parse::<u32>().ok(),
        };
        return code
            .and_then(char::from_u32)
            .map(String::from)
            .ok_or_else(|| WbxmlError::Format(format!("Invalid character reference &{};", name)));
    }
    quick_xml::escape::resolve_predefined_entity(name)
        .map(str::to_string)
        .ok_or_else(|| WbxmlError::Format(format!("Unknown entity &{};", name)))
}

/// Write accumulated text into the current element.
///
/// `opaque` is `None` at the top level, where only whitespace may appear.
fn flush_text<W: Write>(
    serializer: &mut Serializer<W>,
    text: &mut String,
    opaque: Option<bool>,
) -> Result<()> {
    if text.trim().is_empty() {
        text.clear();
        return Ok(());
    }

    match opaque {
        None => {
            return Err(WbxmlError::Format(format!(
                "Text outside of an element: {:?}",
                text.trim()
            )));
        }
        Some(true) => {
            let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            let data = STANDARD.decode(compact)?;
            let length = u32::try_from(data.len())
                .map_err(|_| WbxmlError::Format("Opaque data too large".to_string()))?;
            serializer.opaque(&data[..], length)?;
        }
        Some(false) => {
            serializer.text(text)?;
        }
    }
    text.clear();
    Ok(())
}

use crate::tags::{self, PAGE_MASK};
use crate::{END, OPAQUE, START_DOCUMENT, STR_I, SWITCH_PAGE, WITH_ATTRIBUTES, WITH_CONTENT};
use crate::{Result, WbxmlError, varint};
use std::fmt;
use std::io::{ErrorKind, Read};
use tracing::Level;

/// A tag as read from the stream: code page, 6-bit index and content flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    page: u8,
    index: u8,
    no_content: bool,
    name: &'static str,
}

impl Tag {
    /// Build a tag from the current page and a raw tag byte
    pub fn new(page: u8, id: u8) -> Self {
        let index = id & PAGE_MASK;
        let name = if tags::is_global_tag(index) {
            "unsupported-WBXML"
        } else {
            tags::tag_name(page, index)
        };
        Self {
            page,
            index,
            no_content: id & WITH_CONTENT == 0,
            name,
        }
    }

    pub fn page(&self) -> u8 {
        self.page
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    /// False for `<Foo/>`, which is never followed by an END byte
    pub fn has_content(&self) -> bool {
        !self.no_content
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Global tag number, `(page << PAGE_SHIFT) | index`
    pub fn tag_num(&self) -> u16 {
        tags::tag_number(self.page, self.index)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Result of [`Parser::next_tag`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextTag {
    /// A new element started; carries its global tag number
    Start(u16),
    /// The element passed as `ending_tag` closed
    End,
    /// The stream ended while reading at the top level
    EndDocument,
}

/// One primitive read from the stream
#[derive(Debug, PartialEq)]
pub(crate) enum Token {
    Start(Tag),
    End(Tag),
    Text(String),
    Opaque(Vec<u8>),
    Done,
}

/// Pull parser for EAS WBXML.
///
/// Callers drive it with [`next_tag`](Parser::next_tag), passing the tag
/// whose END they are waiting for, and read element values with
/// [`value`](Parser::value) and friends. The code page is a property of
/// the stream, not of the element stack: a page switch stays in effect
/// across siblings until the next switch.
pub struct Parser<R: Read> {
    input: R,
    page: u8,
    stack: Vec<Tag>,
    start_tag: Option<Tag>,
    no_content: bool,
    tag: u16,
    capture: Option<Vec<u8>>,
}

impl<R: Read> Parser<R> {
    /// Create a parser and read the WBXML preamble.
    ///
    /// Returns [`WbxmlError::EmptyStream`] if not even the version byte is
    /// present, and a format error if the document declares a string table.
    pub fn new(input: R) -> Result<Self> {
        let mut parser = Self::with_input(input);
        parser.read_preamble()?;
        Ok(parser)
    }

    /// Continue reading the same stream with a fresh parser.
    ///
    /// The preamble is not read again. Page and element stack start over;
    /// use [`push_tag`](Parser::push_tag) to re-establish the enclosing
    /// element if the new parser has to find its END.
    pub fn from_parser(previous: Parser<R>) -> Self {
        Self::with_input(previous.input)
    }

    fn with_input(input: R) -> Self {
        Self {
            input,
            page: 0,
            stack: Vec::new(),
            start_tag: None,
            no_content: false,
            tag: START_DOCUMENT,
            capture: None,
        }
    }

    fn read_preamble(&mut self) -> Result<()> {
        let version = match self.read_byte("version") {
            Ok(version) => version,
            Err(WbxmlError::UnexpectedEof(_)) => return Err(WbxmlError::EmptyStream),
            Err(e) => return Err(e),
        };
        let public_id = self.read_int()?;
        let charset = self.read_int()?;
        let string_table_length = self.read_int()?;
        if string_table_length != 0 {
            return Err(WbxmlError::Format(
                "WBXML string table unsupported".to_string(),
            ));
        }
        tracing::trace!(version, public_id, charset, "WBXML preamble");
        Ok(())
    }

    /// Give back the underlying reader
    pub fn into_inner(self) -> R {
        self.input
    }

    /// The tag most recently started or ended
    pub fn current_tag(&self) -> Option<Tag> {
        self.start_tag
    }

    /// Global number of the last tag returned by `next_tag`
    pub fn tag(&self) -> u16 {
        self.tag
    }

    /// Code page currently in effect
    pub fn page(&self) -> u8 {
        self.page
    }

    /// Number of open elements
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Open `tag` as if its start had been read; also switches to its page
    pub fn push_tag(&mut self, tag: u16) {
        self.page = tags::page_of(tag);
        self.push(tags::index_of(tag) | WITH_CONTENT);
    }

    /// Start recording every byte consumed from here on
    pub fn capture_on(&mut self) {
        self.capture = Some(Vec::new());
    }

    /// Stop recording and hand back what was captured
    pub fn capture_off(&mut self) -> Vec<u8> {
        self.capture.take().unwrap_or_default()
    }

    /// Value of the current tag as text.
    ///
    /// `<Foo/>` and `<Foo></Foo>` both yield an empty string.
    pub fn value(&mut self) -> Result<String> {
        let name = self.current_name();
        match self.next_token()? {
            Token::End(_) => {
                self.log(format_args!("No value for tag: {}", name));
                Ok(String::new())
            }
            Token::Text(text) => {
                self.expect_end(name)?;
                Ok(text)
            }
            Token::Done => Err(WbxmlError::UnexpectedEof(format!(
                "expected TEXT data for tag {}",
                name
            ))),
            _ => Err(WbxmlError::Format(format!(
                "Expected TEXT data for tag {}",
                name
            ))),
        }
    }

    /// Value of the current tag as bytes; accepts opaque data or text
    pub fn value_bytes(&mut self) -> Result<Vec<u8>> {
        let name = self.current_name();
        match self.next_token()? {
            Token::End(_) => {
                self.log(format_args!("No value for tag: {}", name));
                Ok(Vec::new())
            }
            Token::Opaque(bytes) => {
                self.expect_end(name)?;
                Ok(bytes)
            }
            Token::Text(text) => {
                self.expect_end(name)?;
                Ok(text.into_bytes())
            }
            Token::Done => Err(WbxmlError::UnexpectedEof(format!(
                "expected OPAQUE or TEXT data for tag {}",
                name
            ))),
            Token::Start(_) => Err(WbxmlError::Format(format!(
                "Expected OPAQUE or TEXT data for tag {}",
                name
            ))),
        }
    }

    /// Value of the current tag as a decimal integer; 0 when empty
    pub fn value_int(&mut self) -> Result<i32> {
        let name = self.current_name();
        let value = self.value()?;
        if value.is_empty() {
            return Ok(0);
        }
        value
            .parse::<i32>()
            .map_err(|e| WbxmlError::Format(format!("Tag {}: {} ({:?})", name, e, value)))
    }

    /// Next start tag before `ending_tag` closes.
    ///
    /// Anything else read on the way (values of ignored tags, ENDs of other
    /// elements) is dropped. Running out of input is only normal when
    /// reading at the top level, i.e. with `START_DOCUMENT`.
    pub fn next_tag(&mut self, ending_tag: u16) -> Result<NextTag> {
        loop {
            match self.next_token()? {
                Token::Start(tag) => {
                    self.tag = tag.tag_num();
                    return Ok(NextTag::Start(self.tag));
                }
                Token::End(tag) if tag.tag_num() == ending_tag => return Ok(NextTag::End),
                Token::Done => break,
                _ => {}
            }
        }

        if ending_tag == START_DOCUMENT {
            return Ok(NextTag::EndDocument);
        }
        Err(WbxmlError::UnexpectedEof(format!(
            "end of document while expecting end of {}",
            tags::qualified_name(ending_tag)
        )))
    }

    /// Discard everything up to and including the END of the open element
    pub fn skip_tag(&mut self) -> Result<()> {
        let name = self.current_name();
        let target_depth = match self.stack.len().checked_sub(1) {
            Some(depth) => depth,
            None => {
                return Err(WbxmlError::Misuse(
                    "skip_tag called with no open tag".to_string(),
                ));
            }
        };

        loop {
            match self.next_token()? {
                Token::End(_) if self.stack.len() == target_depth => return Ok(()),
                Token::Done => {
                    return Err(WbxmlError::UnexpectedEof(format!(
                        "end of document while skipping {}",
                        name
                    )));
                }
                _ => {}
            }
        }
    }

    fn expect_end(&mut self, name: &str) -> Result<()> {
        match self.next_token()? {
            Token::End(_) => Ok(()),
            Token::Done => Err(WbxmlError::UnexpectedEof(format!(
                "No END found for tag {}",
                name
            ))),
            _ => Err(WbxmlError::Format(format!("No END found for tag {}", name))),
        }
    }

    fn current_name(&self) -> &'static str {
        self.start_tag.map_or("unknown", |tag| tag.name)
    }

    fn push(&mut self, id: u8) -> Tag {
        let tag = Tag::new(self.page, id);
        self.no_content = tag.no_content;
        self.log(format_args!(
            "<{}{}>",
            tag,
            if tag.no_content { "/" } else { "" }
        ));
        self.stack.push(tag);
        self.start_tag = Some(tag);
        tag
    }

    fn pop(&mut self) -> Result<Tag> {
        let tag = self
            .stack
            .pop()
            .ok_or_else(|| WbxmlError::Format("END with no open tag".to_string()))?;
        self.start_tag = Some(tag);
        self.log(format_args!("</{}>", tag));
        Ok(tag)
    }

    /// Read one token, following page switches.
    ///
    /// A tag without content gets a synthesized END on the following call,
    /// so every START is matched by an END whatever the wire form.
    pub(crate) fn next_token(&mut self) -> Result<Token> {
        if self.no_content {
            self.no_content = false;
            if let Some(tag) = self.stack.pop() {
                return Ok(Token::End(tag));
            }
        }

        let mut id = self.read()?;
        while id == Some(SWITCH_PAGE) {
            let page = self.read_byte("code page")?;
            if !tags::is_valid_page(page) {
                // Mostly seen with corrupt server data
                return Err(WbxmlError::Format(format!("Unknown code page {}", page)));
            }
            self.page = page;
            tracing::trace!(page, "switch page");
            id = self.read()?;
        }

        let Some(id) = id else {
            return Ok(Token::Done);
        };

        match id {
            END => Ok(Token::End(self.pop()?)),
            STR_I => {
                let text = self.read_inline_string()?;
                self.log(format_args!("{}: {}", self.current_name(), text));
                Ok(Token::Text(text))
            }
            OPAQUE => {
                let length = self.read_int()?;
                let bytes = self.read_opaque(length)?;
                self.log(format_args!("{}: (opaque:{})", self.current_name(), length));
                Ok(Token::Opaque(bytes))
            }
            _ => {
                if tags::is_global_tag(id & PAGE_MASK) {
                    return Err(WbxmlError::Format(format!(
                        "Unhandled WBXML global token 0x{:02X}",
                        id
                    )));
                }
                if id & WITH_ATTRIBUTES != 0 {
                    return Err(WbxmlError::Format(format!(
                        "Attributes unsupported, tag 0x{:02X}",
                        id
                    )));
                }
                Ok(Token::Start(self.push(id)))
            }
        }
    }

    fn log(&self, args: fmt::Arguments<'_>) {
        if !tracing::enabled!(Level::DEBUG) {
            return;
        }
        let message = args.to_string();
        let line = message.lines().next().unwrap_or_default();
        let indent = " ".repeat(self.stack.len() * 2);
        tracing::debug!("{}{}", indent, line);
    }

    /// Next byte, or `None` at end of stream
    fn read(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.input.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(WbxmlError::Io(e)),
            }
        }
        if let Some(capture) = self.capture.as_mut() {
            capture.push(buf[0]);
        }
        tracing::trace!("Byte: {}", buf[0]);
        Ok(Some(buf[0]))
    }

    fn read_byte(&mut self, what: &str) -> Result<u8> {
        self.read()?
            .ok_or_else(|| WbxmlError::UnexpectedEof(format!("expected {}", what)))
    }

    fn read_int(&mut self) -> Result<u32> {
        varint::decode(|| self.read_byte("multi-byte integer"))
    }

    fn read_inline_string(&mut self) -> Result<String> {
        let mut buf = Vec::new();
        loop {
            match self.read()? {
                Some(0) => break,
                Some(byte) => buf.push(byte),
                None => {
                    return Err(WbxmlError::UnexpectedEof(
                        "unterminated inline string".to_string(),
                    ));
                }
            }
        }
        Ok(match String::from_utf8(buf) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    /// Grows with the bytes actually present, so a bogus length on a short
    /// stream fails without allocating it up front
    fn read_opaque(&mut self, length: u32) -> Result<Vec<u8>> {
        let length = length as usize;
        let mut bytes = Vec::new();
        let mut chunk = [0u8; 4096];

        while bytes.len() < length {
            let want = (length - bytes.len()).min(chunk.len());
            match self.input.read(&mut chunk[..want]) {
                Ok(0) => {
                    return Err(WbxmlError::UnexpectedEof(format!(
                        "opaque data, read {} of {} bytes",
                        bytes.len(),
                        length
                    )));
                }
                Ok(n) => bytes.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(WbxmlError::Io(e)),
            }
        }

        if let Some(capture) = self.capture.as_mut() {
            capture.extend_from_slice(&bytes);
        }
        Ok(bytes)
    }
}

use crate::tags;
use crate::{CHARSET_UTF8, END, OPAQUE, PUBLIC_ID_UNKNOWN, STR_I, SWITCH_PAGE, WBXML_VERSION_1_3};
use crate::{Result, WITH_CONTENT, WbxmlError, varint};
use std::io::{ErrorKind, Read, Write};
use tracing::Level;

const BUFFER_SIZE: usize = 16 * 1024;

/// Push serializer producing EAS WBXML.
///
/// A started tag is held back until the next call shows whether it has
/// content: `end()` straight after `start()` writes the tag byte without
/// the content flag and no END byte, anything else writes it with the flag.
pub struct Serializer<W: Write> {
    output: W,
    pending: Option<u16>,
    name_stack: Vec<&'static str>,
    tag_page: u8,
}

impl Serializer<Vec<u8>> {
    /// Serializer writing to memory, preamble included
    pub fn in_memory() -> Result<Self> {
        Self::new(Vec::new())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.output
    }
}

impl<W: Write> Serializer<W> {
    /// Create a serializer and write the WBXML preamble
    pub fn new(output: W) -> Result<Self> {
        let mut serializer = Self::without_document(output);
        serializer.start_document()?;
        Ok(serializer)
    }

    /// Create a serializer that writes no preamble and no other leading
    /// bytes; the output starts directly with the first tag
    pub fn without_document(output: W) -> Self {
        Self {
            output,
            pending: None,
            name_stack: Vec::new(),
            tag_page: 0,
        }
    }

    /// Version 1.3, unknown public identifier, UTF-8, no string table
    pub fn start_document(&mut self) -> Result<()> {
        self.output.write_all(&[WBXML_VERSION_1_3])?;
        varint::write(&mut self.output, PUBLIC_ID_UNKNOWN)?;
        varint::write(&mut self.output, CHARSET_UTF8)?;
        varint::write(&mut self.output, 0)?;
        Ok(())
    }

    /// Check every tag is closed and flush the output
    pub fn done(&mut self) -> Result<()> {
        if !self.name_stack.is_empty() || self.pending.is_some() {
            return Err(WbxmlError::Misuse(
                "Done received with unclosed tags".to_string(),
            ));
        }
        self.output.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.output
    }

    /// Number of open elements, not counting a pending tag
    pub fn depth(&self) -> usize {
        self.name_stack.len()
    }

    fn flush_pending(&mut self, no_content: bool) -> Result<()> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };

        let page = tags::page_of(pending);
        let index = tags::index_of(pending);
        if page != self.tag_page {
            self.tag_page = page;
            self.output.write_all(&[SWITCH_PAGE, page])?;
        }
        let id = if no_content { index } else { index | WITH_CONTENT };
        self.output.write_all(&[id])?;

        let name = if !tags::is_valid_page(page) {
            self.log(&format!("Unrecognized page {}", page));
            "unknown"
        } else if !tags::is_valid_tag(page, index) {
            self.log(&format!("Unknown tag {} on page {}", index, page));
            "unknown"
        } else {
            tags::tag_name(page, index)
        };
        self.log(&format!("<{}{}>", name, if no_content { "/" } else { "" }));
        if !no_content {
            self.name_stack.push(name);
        }
        Ok(())
    }

    /// Open `tag`; its encoding is decided by the next call
    pub fn start(&mut self, tag: u16) -> Result<&mut Self> {
        if tag >> tags::PAGE_SHIFT > u16::from(u8::MAX) {
            return Err(WbxmlError::Misuse(format!(
                "Tag 0x{:04X} has no code page",
                tag
            )));
        }
        self.flush_pending(false)?;
        self.pending = Some(tag);
        Ok(self)
    }

    /// Close the innermost element
    pub fn end(&mut self) -> Result<&mut Self> {
        if self.pending.is_some() {
            self.flush_pending(true)?;
        } else {
            let name = self
                .name_stack
                .pop()
                .ok_or_else(|| WbxmlError::Misuse("END with no open tag".to_string()))?;
            self.output.write_all(&[END])?;
            self.log(&format!("</{}>", name));
        }
        Ok(self)
    }

    /// Write `<tag/>`
    pub fn tag(&mut self, tag: u16) -> Result<&mut Self> {
        self.start(tag)?;
        self.end()
    }

    /// Write `<tag>value</tag>`
    pub fn data(&mut self, tag: u16, value: &str) -> Result<&mut Self> {
        check_text(value)?;
        self.start(tag)?;
        self.text(value)?;
        self.end()
    }

    /// Write `<tag/>` for a missing or empty value, `<tag>value</tag>` otherwise
    pub fn write_string_value(&mut self, tag: u16, value: Option<&str>) -> Result<&mut Self> {
        match value {
            Some(value) if !value.is_empty() => self.data(tag, value),
            _ => self.tag(tag),
        }
    }

    /// Write an inline string into the current element
    pub fn text(&mut self, text: &str) -> Result<&mut Self> {
        check_text(text)?;
        self.flush_pending(false)?;
        self.output.write_all(&[STR_I])?;
        self.output.write_all(text.as_bytes())?;
        self.output.write_all(&[0])?;
        self.log(text);
        Ok(self)
    }

    /// Copy exactly `length` bytes from `input` as one opaque block
    pub fn opaque<R: Read>(&mut self, mut input: R, length: u32) -> Result<&mut Self> {
        self.write_opaque_header(length)?;
        self.log(&format!("opaque: {}", length));

        let length = length as usize;
        let mut buffer = vec![0u8; BUFFER_SIZE.min(length)];
        let mut total = 0;
        while total < length {
            let want = (length - total).min(buffer.len());
            let read = match input.read(&mut buffer[..want]) {
                Ok(read) => read,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if read == 0 {
                return Err(WbxmlError::UnexpectedEof(format!(
                    "Invalid opaque data block; read {} bytes but expected {}",
                    total, length
                )));
            }
            self.output.write_all(&buffer[..read])?;
            total += read;
        }
        Ok(self)
    }

    /// Write the opaque marker and length without the payload.
    ///
    /// Lets a caller size a request before streaming the body. A zero
    /// length writes nothing at all.
    pub fn write_opaque_header(&mut self, length: u32) -> Result<&mut Self> {
        if length == 0 {
            return Ok(self);
        }
        self.flush_pending(false)?;
        self.output.write_all(&[OPAQUE])?;
        varint::write(&mut self.output, length)?;
        Ok(self)
    }

    fn log(&self, message: &str) {
        if !tracing::enabled!(Level::DEBUG) {
            return;
        }
        let line = message.lines().next().unwrap_or_default();
        let indent = " ".repeat(self.name_stack.len() * 2);
        tracing::debug!("{}{}", indent, line);
    }
}

/// Inline strings are NUL-terminated on the wire
fn check_text(text: &str) -> Result<()> {
    if text.contains('\0') {
        return Err(WbxmlError::Misuse(
            "Text value contains a NUL character".to_string(),
        ));
    }
    Ok(())
}

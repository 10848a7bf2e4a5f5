//! A WBXML codec for the Exchange ActiveSync (EAS) protocol.
//!
//! Implements the subset of WAP Binary XML that EAS uses: tag tokens,
//! code pages, inline strings and opaque data. String tables, entities,
//! processing instructions and attributes are rejected as format errors.
//!
//! # Examples
//!
//! ```no_run
//! use eas_wbxml::{NextTag, Parser, Serializer, START_DOCUMENT, tags};
//!
//! let sync_key = tags::find("AirSync:SyncKey").unwrap();
//! let mut serializer = Serializer::in_memory().unwrap();
//! serializer.data(sync_key, "0").unwrap();
//! serializer.done().unwrap();
//!
//! let mut parser = Parser::new(serializer.as_bytes()).unwrap();
//! while let NextTag::Start(tag) = parser.next_tag(START_DOCUMENT).unwrap() {
//!     if tag == sync_key {
//!         println!("SyncKey = {}", parser.value().unwrap());
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

pub mod cli;
mod converter;
mod parser;
pub mod response_log;
mod serializer;
pub mod tags;
pub mod varint;

pub use converter::{WbxmlToXmlConverter, XmlToWbxmlConverter};
pub use parser::{NextTag, Parser, Tag};
pub use serializer::Serializer;

/// Error types for WBXML decoding and encoding
#[derive(Error, Debug)]
pub enum WbxmlError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Empty WBXML stream")]
    EmptyStream,
    #[error("Unexpected end of WBXML stream: {0}")]
    UnexpectedEof(String),
    #[error("WBXML format error: {0}")]
    Format(String),
    #[error("Serializer misuse: {0}")]
    Misuse(String),
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Invalid base64 input: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Invalid hex input: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("{0}")]
    Usage(String),
}

impl WbxmlError {
    /// True when the stream ran out, either before the first byte or mid-document
    pub fn is_eof(&self) -> bool {
        matches!(self, WbxmlError::EmptyStream | WbxmlError::UnexpectedEof(_))
    }
}

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, WbxmlError>;

/// Sentinel passed to `Parser::next_tag` when reading at the top level
pub const START_DOCUMENT: u16 = 0;

// Preamble written by the serializer
pub const WBXML_VERSION_1_3: u8 = 0x03;
pub const PUBLIC_ID_UNKNOWN: u32 = 0x01;
pub const CHARSET_UTF8: u32 = 106;

// Global tokens
pub const SWITCH_PAGE: u8 = 0x00;
pub const END: u8 = 0x01;
pub const ENTITY: u8 = 0x02;
pub const STR_I: u8 = 0x03;
pub const LITERAL: u8 = 0x04;
pub const EXT_I_0: u8 = 0x40;
pub const EXT_I_1: u8 = 0x41;
pub const EXT_I_2: u8 = 0x42;
pub const PI: u8 = 0x43;
pub const LITERAL_C: u8 = 0x44;
pub const EXT_T_0: u8 = 0x80;
pub const EXT_T_1: u8 = 0x81;
pub const EXT_T_2: u8 = 0x82;
pub const STR_T: u8 = 0x83;
pub const LITERAL_A: u8 = 0x84;
pub const EXT_0: u8 = 0xC0;
pub const EXT_1: u8 = 0xC1;
pub const EXT_2: u8 = 0xC2;
pub const OPAQUE: u8 = 0xC3;
pub const LITERAL_AC: u8 = 0xC4;

// Tag byte flags
pub const WITH_CONTENT: u8 = 0x40;
pub const WITH_ATTRIBUTES: u8 = 0x80;

//! YBIN: compact binary form of a resolved [`Document`].
//!
//! ```text
//! magic   u32  0x59494E49 ("YINI")
//! version u8   1
//! count   u32  sections
//! section      name, parents (u32 count + strings),
//!              properties (u32 count + (key, value)*),
//!              registry (u32 count + value*)
//! ```
//!
//! Integers are little-endian, strings are a `u32` byte length followed by
//! UTF-8. Every value starts with a one-byte tag.

use crate::ast::Document;
use crate::YiniError;

mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

pub const MAGIC: u32 = 0x5949_4E49;
pub const VERSION: u8 = 1;

pub(crate) mod tag {
    pub const INTEGER: u8 = 1;
    pub const FLOAT: u8 = 2;
    pub const BOOLEAN: u8 = 3;
    pub const STRING: u8 = 4;
    pub const COLOR: u8 = 5;
    pub const COORD: u8 = 6;
    pub const PATH: u8 = 7;
    pub const ARRAY: u8 = 8;
    pub const LIST: u8 = 9;
    pub const SET: u8 = 10;
    pub const MAP: u8 = 11;
    pub const REFERENCE: u8 = 12;
    pub const DYNA: u8 = 13;
    pub const STRUCT: u8 = 14;
}

/// Encodes every section of `doc`. Schema sections are not part of the
/// format; unfolded expressions and schema definitions cannot be encoded.
pub fn encode(doc: &Document) -> Result<Vec<u8>, YiniError> {
    let mut writer = Writer::new();
    writer.write_document(doc)?;
    Ok(writer.into_bytes())
}

/// Decodes a buffer produced by [`encode`]. Macros travel as the
/// `[#define]` section, which also repopulates the macro table.
pub fn decode(bytes: &[u8]) -> Result<Document, YiniError> {
    Reader::new(bytes).read_document()
}

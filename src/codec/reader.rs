use indexmap::IndexMap;

use super::{tag, MAGIC, VERSION};
use crate::ast::{Color, Coord, Document, Reference, ReferenceKind, Section, Value, ValueKind};
use crate::compiler::DEFINE;
use crate::parser::MAX_NESTING;
use crate::YiniError;

/// Cursor over a YBIN buffer. Every read is bounds-checked; running out of
/// bytes is a `FormatError` carrying the offset. Containers nest at most
/// [`MAX_NESTING`] deep, the same limit the parser applies to source text.
pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0, depth: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn read_document(&mut self) -> Result<Document, YiniError> {
        let magic = self.read_u32()?;
        if magic != MAGIC {
            return Err(YiniError::format(
                format!("Bad magic 0x{:08X}, not a YBIN buffer", magic),
                0,
                601,
            ));
        }
        let version = self.read_u8()?;
        if version > VERSION {
            return Err(YiniError::FormatError {
                message: format!("Unsupported YBIN version {} (newest known is {})", version, VERSION),
                offset: 4,
                code: Some(602),
            });
        }

        let mut doc = Document::new();
        let count = self.read_count()?;
        for _ in 0..count {
            let section = self.read_section()?;
            doc.insert_section(section);
        }

        if self.pos != self.bytes.len() {
            return Err(YiniError::format("Trailing bytes after document", self.pos, 608));
        }

        if let Some(define) = doc.sections.get(DEFINE) {
            doc.macros = define.properties.clone();
        }
        Ok(doc)
    }

    fn read_section(&mut self) -> Result<Section, YiniError> {
        let mut section = Section::new(self.read_string()?);

        let parents = self.read_count()?;
        for _ in 0..parents {
            section.parents.push(self.read_string()?);
        }

        section.properties = self.read_entries()?;

        let registry = self.read_count()?;
        for _ in 0..registry {
            section.registry.push(self.read_value()?);
        }
        Ok(section)
    }

    pub fn read_value(&mut self) -> Result<Value, YiniError> {
        let at = self.pos;
        let kind = match self.read_u8()? {
            tag::INTEGER => ValueKind::Integer(i32::from_le_bytes(self.read_array()?)),
            tag::FLOAT => ValueKind::Float(f32::from_le_bytes(self.read_array()?)),
            tag::BOOLEAN => ValueKind::Boolean(self.read_u8()? != 0),
            tag::STRING => ValueKind::String(self.read_string()?),
            tag::COLOR => {
                let [r, g, b, a] = self.read_array()?;
                ValueKind::Color(Color::rgba(r, g, b, a))
            }
            tag::COORD => {
                let is_3d = self.read_u8()? != 0;
                let x = f32::from_le_bytes(self.read_array()?);
                let y = f32::from_le_bytes(self.read_array()?);
                let z = f32::from_le_bytes(self.read_array()?);
                ValueKind::Coord(Coord { x, y, z, is_3d })
            }
            tag::PATH => ValueKind::Path(self.read_string()?),
            tag::ARRAY => ValueKind::Array(self.read_items()?),
            tag::LIST => ValueKind::List(self.read_items()?),
            tag::SET => ValueKind::Set(self.read_items()?),
            tag::MAP => ValueKind::Map(self.read_entries()?),
            tag::STRUCT => ValueKind::Struct(self.read_entries()?),
            tag::REFERENCE => {
                let kind = match self.read_u8()? {
                    0 => ReferenceKind::Environment,
                    1 => ReferenceKind::CrossSection,
                    2 => ReferenceKind::Macro,
                    3 => ReferenceKind::Localization,
                    other => {
                        return Err(YiniError::format(
                            format!("Unknown reference kind {}", other),
                            self.pos - 1,
                            609,
                        ));
                    }
                };
                ValueKind::Reference(Reference::new(kind, self.read_string()?))
            }
            tag::DYNA => ValueKind::Dyna(self.read_string()?),
            other => {
                return Err(YiniError::FormatError {
                    message: format!("Unknown value tag {}", other),
                    offset: at,
                    code: Some(603),
                });
            }
        };
        Ok(Value::bare(kind))
    }

    fn read_items(&mut self) -> Result<Vec<Value>, YiniError> {
        self.nested(|r| {
            let count = r.read_count()?;
            // Each value takes at least its tag byte.
            let mut items = Vec::with_capacity(count.min(r.remaining()));
            for _ in 0..count {
                items.push(r.read_value()?);
            }
            Ok(items)
        })
    }

    fn read_entries(&mut self) -> Result<IndexMap<String, Value>, YiniError> {
        self.nested(|r| {
            let count = r.read_count()?;
            let mut entries = IndexMap::with_capacity(count.min(r.remaining()));
            for _ in 0..count {
                let key = r.read_string()?;
                let value = r.read_value()?;
                entries.insert(key, value);
            }
            Ok(entries)
        })
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, YiniError>) -> Result<T, YiniError> {
        // Section properties count as the first level.
        if self.depth > MAX_NESTING {
            return Err(YiniError::format(
                format!("Values nested deeper than {} levels", MAX_NESTING),
                self.pos,
                611,
            ));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], YiniError> {
        if self.remaining() < len {
            return Err(YiniError::FormatError {
                message: format!("Unexpected end of data: wanted {} bytes, {} left", len, self.remaining()),
                offset: self.pos,
                code: Some(604),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], YiniError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8, YiniError> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32, YiniError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    fn read_count(&mut self) -> Result<usize, YiniError> {
        Ok(self.read_u32()? as usize)
    }

    fn read_string(&mut self) -> Result<String, YiniError> {
        let len = self.read_count()?;
        let at = self.pos;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| YiniError::format(format!("Invalid UTF-8 in string: {}", e), at, 605))
    }
}

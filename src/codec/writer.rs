use indexmap::IndexMap;

use super::{tag, MAGIC, VERSION};
use crate::ast::{Document, ReferenceKind, Section, Value, ValueKind};
use crate::YiniError;

pub struct Writer {
    buf: Vec<u8>,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_document(&mut self, doc: &Document) -> Result<(), YiniError> {
        self.write_u32(MAGIC);
        self.write_u8(VERSION);
        self.write_count(doc.sections.len())?;
        for section in doc.sections.values() {
            self.write_section(section)?;
        }
        Ok(())
    }

    fn write_section(&mut self, section: &Section) -> Result<(), YiniError> {
        self.write_str(&section.name)?;

        self.write_count(section.parents.len())?;
        for parent in &section.parents {
            self.write_str(parent)?;
        }

        self.write_entries(&section.properties)?;

        self.write_count(section.registry.len())?;
        for value in &section.registry {
            self.write_value(value)?;
        }
        Ok(())
    }

    pub fn write_value(&mut self, value: &Value) -> Result<(), YiniError> {
        match &value.kind {
            ValueKind::Integer(i) => {
                self.write_u8(tag::INTEGER);
                self.buf.extend_from_slice(&i.to_le_bytes());
            }
            ValueKind::Float(f) => {
                self.write_u8(tag::FLOAT);
                self.buf.extend_from_slice(&f.to_le_bytes());
            }
            ValueKind::Boolean(b) => {
                self.write_u8(tag::BOOLEAN);
                self.write_u8(u8::from(*b));
            }
            ValueKind::String(s) => {
                self.write_u8(tag::STRING);
                self.write_str(s)?;
            }
            ValueKind::Color(c) => {
                self.write_u8(tag::COLOR);
                self.buf.extend_from_slice(&[c.r, c.g, c.b, c.a]);
            }
            ValueKind::Coord(c) => {
                self.write_u8(tag::COORD);
                self.write_u8(u8::from(c.is_3d));
                for axis in [c.x, c.y, c.z] {
                    self.buf.extend_from_slice(&axis.to_le_bytes());
                }
            }
            ValueKind::Path(p) => {
                self.write_u8(tag::PATH);
                self.write_str(p)?;
            }
            ValueKind::Array(items) => self.write_items(tag::ARRAY, items)?,
            ValueKind::List(items) => self.write_items(tag::LIST, items)?,
            ValueKind::Set(items) => self.write_items(tag::SET, items)?,
            ValueKind::Map(entries) => {
                self.write_u8(tag::MAP);
                self.write_entries(entries)?;
            }
            ValueKind::Struct(fields) => {
                self.write_u8(tag::STRUCT);
                self.write_entries(fields)?;
            }
            ValueKind::Reference(r) => {
                self.write_u8(tag::REFERENCE);
                self.write_u8(match r.kind {
                    ReferenceKind::Environment => 0,
                    ReferenceKind::CrossSection => 1,
                    ReferenceKind::Macro => 2,
                    ReferenceKind::Localization => 3,
                });
                self.write_str(&r.target)?;
            }
            ValueKind::Dyna(expression) => {
                self.write_u8(tag::DYNA);
                self.write_str(expression)?;
            }
            ValueKind::Binary(..) | ValueKind::Unary(..) | ValueKind::Schema(_) => {
                return Err(YiniError::FormatError {
                    message: format!("A {} cannot be encoded; compile the document first", value.type_name()),
                    offset: self.buf.len(),
                    code: Some(606),
                });
            }
        }
        Ok(())
    }

    fn write_items(&mut self, kind: u8, items: &[Value]) -> Result<(), YiniError> {
        self.write_u8(kind);
        self.write_count(items.len())?;
        for item in items {
            self.write_value(item)?;
        }
        Ok(())
    }

    fn write_entries(&mut self, entries: &IndexMap<String, Value>) -> Result<(), YiniError> {
        self.write_count(entries.len())?;
        for (key, value) in entries {
            self.write_str(key)?;
            self.write_value(value)?;
        }
        Ok(())
    }

    fn write_u8(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn write_count(&mut self, count: usize) -> Result<(), YiniError> {
        let count = u32::try_from(count)
            .map_err(|_| YiniError::format("Collection too large for YBIN", self.buf.len(), 607))?;
        self.write_u32(count);
        Ok(())
    }

    fn write_str(&mut self, s: &str) -> Result<(), YiniError> {
        self.write_count(s.len())?;
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

//! XML to JSON document conversion
//!
//! An upload is a single root element with `id`, `name` and `content`
//! children. It is decoded into a [`CustomerRecord`], renamed field by field
//! into a [`CanonicalDocument`], and stored as pretty-printed JSON.
//!
//! Field text is kept exactly as written, surrounding whitespace included.
//! Whitespace between elements is layout and is ignored.

use quick_xml::Reader;
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Result, StoreError};

/// Customer record as uploaded. The root element name is not checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRecord {
    pub id: String,
    pub name: String,
    pub content: String,
}

/// Stored form of a customer record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CanonicalDocument {
    pub customer_id: String,
    pub customer_name: String,
    pub payload: String,
}

impl From<CustomerRecord> for CanonicalDocument {
    fn from(record: CustomerRecord) -> Self {
        Self {
            customer_id: record.id,
            customer_name: record.name,
            payload: record.content,
        }
    }
}

/// Reasons an upload does not decode into a [`CustomerRecord`]
#[derive(Error, Debug)]
pub enum XmlError {
    #[error(transparent)]
    Syntax(#[from] quick_xml::Error),

    #[error("document has no root element")]
    NoRoot,

    #[error("document has more than one root element")]
    ExtraRoot,

    #[error("document ends before the root element is closed")]
    Unterminated,

    #[error("unexpected element <{0}>")]
    UnexpectedElement(String),

    #[error("element <{0}> appears more than once")]
    DuplicateElement(&'static str),

    #[error("missing element <{0}>")]
    MissingElement(&'static str),

    #[error("unexpected text outside a field element")]
    StrayText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Name,
    Content,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"id" => Some(Field::Id),
            b"name" => Some(Field::Name),
            b"content" => Some(Field::Content),
            _ => None,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Name => "name",
            Field::Content => "content",
        }
    }
}

#[derive(Default)]
struct RecordBuilder {
    id: Option<String>,
    name: Option<String>,
    content: Option<String>,
}

impl RecordBuilder {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Id => &mut self.id,
            Field::Name => &mut self.name,
            Field::Content => &mut self.content,
        }
    }

    fn set(&mut self, field: Field, value: String) -> std::result::Result<(), XmlError> {
        let slot = self.slot(field);
        if slot.is_some() {
            return Err(XmlError::DuplicateElement(field.tag()));
        }
        *slot = Some(value);
        Ok(())
    }

    fn finish(self) -> std::result::Result<CustomerRecord, XmlError> {
        Ok(CustomerRecord {
            id: self.id.ok_or(XmlError::MissingElement(Field::Id.tag()))?,
            name: self.name.ok_or(XmlError::MissingElement(Field::Name.tag()))?,
            content: self
                .content
                .ok_or(XmlError::MissingElement(Field::Content.tag()))?,
        })
    }
}

/// Where the reader is relative to the expected document shape
enum Position {
    BeforeRoot,
    InRoot,
    InField(Field, String),
    AfterRoot,
}

fn read_record(text: &str) -> std::result::Result<CustomerRecord, XmlError> {
    let mut reader = Reader::from_str(text);
    let mut builder = RecordBuilder::default();
    let mut position = Position::BeforeRoot;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                position = match position {
                    Position::BeforeRoot => Position::InRoot,
                    Position::InRoot => {
                        let local = start.local_name();
                        let field = Field::from_tag(local.as_ref()).ok_or_else(|| {
                            XmlError::UnexpectedElement(
                                String::from_utf8_lossy(local.as_ref()).into_owned(),
                            )
                        })?;
                        Position::InField(field, String::new())
                    }
                    Position::InField(..) => {
                        return Err(XmlError::UnexpectedElement(
                            String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
                        ));
                    }
                    Position::AfterRoot => return Err(XmlError::ExtraRoot),
                };
            }
            Event::Empty(start) => match position {
                // an empty root has no fields; finish() reports the first one
                Position::BeforeRoot => position = Position::AfterRoot,
                Position::InRoot => {
                    let local = start.local_name();
                    let field = Field::from_tag(local.as_ref()).ok_or_else(|| {
                        XmlError::UnexpectedElement(
                            String::from_utf8_lossy(local.as_ref()).into_owned(),
                        )
                    })?;
                    builder.set(field, String::new())?;
                }
                Position::InField(..) => {
                    return Err(XmlError::UnexpectedElement(
                        String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
                    ));
                }
                Position::AfterRoot => return Err(XmlError::ExtraRoot),
            },
            Event::End(_) => {
                // mismatched end tags are rejected by the reader itself
                position = match position {
                    Position::InField(field, value) => {
                        builder.set(field, value)?;
                        Position::InRoot
                    }
                    _ => Position::AfterRoot,
                };
            }
            Event::Text(chars) => {
                let unescaped = chars.unescape()?;
                match &mut position {
                    Position::InField(_, value) => value.push_str(&unescaped),
                    _ if unescaped.trim().is_empty() => {}
                    _ => return Err(XmlError::StrayText),
                }
            }
            Event::CData(data) => {
                let decoded = data.decode().map_err(quick_xml::Error::from)?;
                match &mut position {
                    Position::InField(_, value) => value.push_str(&decoded),
                    _ => return Err(XmlError::StrayText),
                }
            }
            Event::Eof => break,
            // declaration, comments, processing instructions, doctype
            _ => {}
        }
    }

    match position {
        Position::AfterRoot => builder.finish(),
        Position::BeforeRoot => Err(XmlError::NoRoot),
        Position::InRoot | Position::InField(..) => Err(XmlError::Unterminated),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentConverter;

impl DocumentConverter {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_xml(&self, bytes: &[u8]) -> Result<CustomerRecord> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| StoreError::invalid_format("Uploaded document is not valid UTF-8", e))?;

        read_record(text)
            .map_err(|e| StoreError::invalid_format(format!("Error parsing XML: {}", e), e))
    }

    pub fn to_canonical(&self, record: CustomerRecord) -> CanonicalDocument {
        CanonicalDocument::from(record)
    }

    pub fn serialize_json(&self, document: &CanonicalDocument) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(document)
            .map_err(|e| StoreError::invalid_format(format!("Error writing JSON: {}", e), e))
    }

    pub fn deserialize_json(&self, bytes: &[u8]) -> Result<CanonicalDocument> {
        serde_json::from_slice(bytes)
            .map_err(|e| StoreError::invalid_format(format!("Error reading JSON: {}", e), e))
    }

    /// Full upload pipeline: XML bytes in, stored JSON bytes out
    pub fn convert(&self, xml: &[u8]) -> Result<Vec<u8>> {
        let record = self.parse_xml(xml)?;
        self.serialize_json(&self.to_canonical(record))
    }
}

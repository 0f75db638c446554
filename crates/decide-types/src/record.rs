//! Typed view of a document during the 1.0 to 2.0 transition.
//!
//! Documents in `events` and `trials` are schemaless in the store, but the
//! fields touched by the migration have a small number of legal shapes.
//! [`Record`] pulls those fields out into enums so the transformer matches
//! on shapes instead of probing keys, and carries every other field through
//! untouched.

use bson::{Binary, Bson, Document};

use crate::compound::is_compound;

/// Primary key field.
pub const ID_FIELD: &str = "_id";

/// Address field; compound in 1.0, plain in 2.0.
pub const ADDR_FIELD: &str = "addr";

/// Name field, introduced in 2.0.
pub const NAME_FIELD: &str = "name";

/// Errors raised when a document cannot be viewed as a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// The document has no `_id`, so it cannot be written back.
    #[error("document has no _id")]
    MissingId,
}

/// Shape of the `addr`/`name` pair.
///
/// Classified on `addr` alone: a string holding the separator is compound
/// whatever `name` holds, so a stale `name` never hides an unsplit key.
#[derive(Debug, Clone, PartialEq)]
pub enum AddrField {
    /// 1.0 shape: a string `addr` containing the separator.
    Compound {
        /// The compound key.
        addr: String,
        /// Any existing `name`, replaced when the key is split.
        name: Option<Bson>,
    },
    /// 2.0 shape: a plain string `addr` and a string `name`.
    Split {
        /// Controller address.
        addr: String,
        /// Logical name within the controller.
        name: String,
    },
    /// Anything else, including a missing `addr`. Kept verbatim.
    Unrecognized {
        /// Raw `addr` value, if present.
        addr: Option<Bson>,
        /// Raw `name` value, if present.
        name: Option<Bson>,
    },
}

impl AddrField {
    fn classify(addr: Option<Bson>, name: Option<Bson>) -> Self {
        match (addr, name) {
            (Some(Bson::String(addr)), name) if is_compound(&addr) => {
                Self::Compound { addr, name }
            }
            (Some(Bson::String(addr)), Some(Bson::String(name))) => Self::Split { addr, name },
            (addr, name) => Self::Unrecognized { addr, name },
        }
    }

    fn write_into(self, doc: &mut Document) {
        match self {
            Self::Split { addr, name } => {
                doc.insert(ADDR_FIELD, addr);
                doc.insert(NAME_FIELD, name);
            }
            Self::Compound { addr, name } => {
                doc.insert(ADDR_FIELD, addr);
                if let Some(name) = name {
                    doc.insert(NAME_FIELD, name);
                }
            }
            Self::Unrecognized { addr, name } => {
                if let Some(addr) = addr {
                    doc.insert(ADDR_FIELD, addr);
                }
                if let Some(name) = name {
                    doc.insert(NAME_FIELD, name);
                }
            }
        }
    }
}

/// Shape of a field that should end up holding a binary UUID.
#[derive(Debug, Clone, PartialEq)]
pub enum UuidField {
    /// Not yet converted: a string, possibly a UUID.
    Text(String),
    /// Already binary.
    Binary(Binary),
    /// Some other BSON value.
    Other(Bson),
    /// The field is not set.
    Absent,
}

impl UuidField {
    fn classify(value: Option<Bson>) -> Self {
        match value {
            Some(Bson::String(text)) => Self::Text(text),
            Some(Bson::Binary(binary)) => Self::Binary(binary),
            Some(other) => Self::Other(other),
            None => Self::Absent,
        }
    }

    fn into_bson(self) -> Option<Bson> {
        match self {
            Self::Text(text) => Some(Bson::String(text)),
            Self::Binary(binary) => Some(Bson::Binary(binary)),
            Self::Other(other) => Some(other),
            Self::Absent => None,
        }
    }
}

/// A named UUID-bearing field and its current shape.
#[derive(Debug, Clone, PartialEq)]
pub struct UuidSlot {
    /// Field name within the document.
    pub field: String,
    /// Current value.
    pub value: UuidField,
}

/// A document split into its transitional fields and everything else.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: Bson,
    /// The `addr`/`name` pair.
    pub addr: AddrField,
    /// The UUID field, when the caller asked for one.
    pub uuid: Option<UuidSlot>,
    rest: Document,
}

impl Record {
    /// View `doc` as a record, extracting `uuid_field` when given.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingId`] if the document has no `_id`.
    pub fn from_document(mut doc: Document, uuid_field: Option<&str>) -> Result<Self, SchemaError> {
        let id = doc.remove(ID_FIELD).ok_or(SchemaError::MissingId)?;
        let addr = AddrField::classify(doc.remove(ADDR_FIELD), doc.remove(NAME_FIELD));
        let uuid = uuid_field.map(|field| UuidSlot {
            field: field.to_owned(),
            value: UuidField::classify(doc.remove(field)),
        });
        Ok(Self {
            id,
            addr,
            uuid,
            rest: doc,
        })
    }

    /// The document's primary key.
    pub const fn id(&self) -> &Bson {
        &self.id
    }

    /// Reassemble the document, `_id` first.
    pub fn into_document(self) -> Document {
        let mut doc = Document::new();
        doc.insert(ID_FIELD, self.id);
        self.addr.write_into(&mut doc);
        if let Some(slot) = self.uuid {
            if let Some(value) = slot.value.into_bson() {
                doc.insert(slot.field, value);
            }
        }
        for (key, value) in self.rest {
            doc.insert(key, value);
        }
        doc
    }
}

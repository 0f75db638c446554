//! Per-document transformation from the 1.0 to the 2.0 schema.
//!
//! A [`TransformProfile`] says which rewrites apply to a collection. The
//! transformer never fails on a field it cannot rewrite: an unsplittable
//! `addr` is left as it was and reported as a [`TransformWarning`], and a
//! UUID field that does not hold a UUID string is left as it was silently,
//! since that is what an already-migrated document looks like.
//!
//! Both rewrites check their precondition before acting, so running the
//! transformer over its own output changes nothing:
//!
//! | Field   | Rewritten when                         | Otherwise            |
//! |---------|----------------------------------------|----------------------|
//! | `addr`  | string `addr` containing `.`           | unchanged            |
//! | UUID    | string value that parses as a UUID     | unchanged, no warning|

use bson::{Bson, Document};
use decide_types::record::{ADDR_FIELD, AddrField, Record, UuidField};
use decide_types::{SplitError, UuidEncoding, split_addr};

use crate::error::TransformError;

/// Rewrite of one field from a UUID string to a binary UUID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UuidRecode {
    /// Field holding the UUID.
    pub field: String,
    /// Binary layout to write.
    pub encoding: UuidEncoding,
}

/// The rewrites applied to every document of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformProfile {
    /// Split the compound `addr` into `addr` and `name`.
    pub split_addr: bool,
    /// Convert a UUID string field to binary.
    pub recode: Option<UuidRecode>,
}

/// A field that could not be rewritten and was left as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformWarning {
    /// `_id` of the affected document.
    pub id: Bson,
    /// Field that was left untouched.
    pub field: &'static str,
    /// Why the rewrite did not apply.
    pub reason: SplitError,
}

impl core::fmt::Display for TransformWarning {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "unable to split {} for {}: {}", self.field, self.id, self.reason)
    }
}

/// Outcome of transforming one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed {
    /// The document to write back.
    pub document: Document,
    /// Whether any field was rewritten.
    pub changed: bool,
    /// Fields that were left untouched because they could not be rewritten.
    pub warnings: Vec<TransformWarning>,
}

/// Apply `profile` to one document.
///
/// # Errors
///
/// Returns [`TransformError::Schema`] if the document has no `_id`. Field
/// level failures are never errors.
pub fn transform(
    document: Document,
    profile: &TransformProfile,
) -> Result<Transformed, TransformError> {
    let uuid_field = profile.recode.as_ref().map(|recode| recode.field.as_str());
    let mut record = Record::from_document(document, uuid_field)?;
    let mut changed = false;
    let mut warnings = Vec::new();

    if profile.split_addr {
        match split_field(&record.addr) {
            Ok(Some(split)) => {
                record.addr = split;
                changed = true;
            }
            Ok(None) => {}
            Err(reason) => warnings.push(TransformWarning {
                id: record.id().clone(),
                field: ADDR_FIELD,
                reason,
            }),
        }
    }

    if let (Some(recode), Some(slot)) = (&profile.recode, record.uuid.as_mut()) {
        let encoded = match &slot.value {
            UuidField::Text(text) => recode.encoding.encode(text).ok(),
            UuidField::Binary(_) | UuidField::Other(_) | UuidField::Absent => None,
        };
        if let Some(binary) = encoded {
            slot.value = UuidField::Binary(binary);
            changed = true;
        }
    }

    Ok(Transformed {
        document: record.into_document(),
        changed,
        warnings,
    })
}

/// The split shape for `addr`, or `None` if it is already split.
///
/// Splitting replaces any `name` the compound document already had.
fn split_field(addr: &AddrField) -> Result<Option<AddrField>, SplitError> {
    match addr {
        AddrField::Compound { addr, .. } => {
            let key = split_addr(addr)?;
            Ok(Some(AddrField::Split {
                addr: key.addr,
                name: key.name,
            }))
        }
        AddrField::Split { .. } => Ok(None),
        AddrField::Unrecognized { .. } => Err(SplitError::MissingSeparator),
    }
}

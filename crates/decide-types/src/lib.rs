//! Shared types for the `decide` 1.0 to 2.0 schema migration.
//!
//! Everything here is pure: no I/O and no logging. The migration crate
//! composes these pieces into the per-document transformation.
//!
//! # Modules
//!
//! - [`uuid_codec`] -- textual UUIDs to and from standard or legacy BSON binary
//! - [`compound`] -- splitting the 1.0 compound `addr` key
//! - [`record`] -- typed view of the fields that change shape in 2.0

pub mod compound;
pub mod record;
pub mod uuid_codec;

pub use compound::{ADDR_SEPARATOR, SplitError, SplitKey, is_compound, split_addr};
pub use record::{AddrField, Record, SchemaError, UuidField, UuidSlot};
pub use uuid_codec::{
    CodecError, UuidEncoding, decode_legacy, decode_standard, encode_legacy, encode_standard,
};

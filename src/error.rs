//! Error taxonomy for the schema model, relation index and renderers.

use thiserror::Error;

/// Errors raised by the entity model and everything derived from it.
///
/// All of them are local and synchronous: they are reported at the point of
/// detection and never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A table or field name is already taken within its owner
    #[error("{kind} \"{name}\" already exists in {owner}")]
    DuplicateName {
        kind: &'static str,
        owner: String,
        name: String,
    },

    /// Conflicting key classification on a single field
    #[error("field {field} is already keyed: {reason}")]
    FieldAlreadyKeyed { field: String, reason: String },

    /// Field handles are 16-bit
    #[error("table \"{table}\" has more than {limit} fields")]
    TooManyFields { table: String, limit: usize },

    /// An operation referenced a table that is not loaded
    #[error("unknown table \"{0}\"")]
    UnknownTable(String),

    /// An operation referenced a field that does not exist in its table
    #[error("unknown field \"{field}\" in table \"{table}\"")]
    UnknownField { table: String, field: String },

    /// The type of a table pair was requested but no relation exists between them
    #[error("no relation from \"{dependent}\" to \"{reference}\"")]
    NoSuchRelation { dependent: String, reference: String },

    /// A (min, max) occurrence pair has no cardinality symbol
    #[error("invalid cardinality bounds (min={min}, max={max})")]
    InvalidCardinality { min: u32, max: u32 },
}

/// Result alias used throughout the core
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Lookup failure in an add-on registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind}: {name}. Valid options: {available}")]
pub struct UnknownEntry {
    pub kind: &'static str,
    pub name: String,
    pub available: String,
}

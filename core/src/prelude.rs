use serde::{Deserialize, Serialize};

use crate::record::{CategoryKey, IdentityKey, RawTable};

/// Structural failure while turning a raw table into detections.
///
/// Any of these aborts the whole load; callers are expected to fall back to
/// another source rather than use a partially built collection.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("table has no rows")]
    EmptyTable,
    #[error("required column `{column}` is missing")]
    MissingColumn { column: String },
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("malformed table: {0}")]
    Malformed(String),
}

/// Rejected focus change.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("identity `{identity}` is not present in category `{category}`")]
    UnknownIdentity {
        identity: IdentityKey,
        category: CategoryKey,
    },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown granularity `{0}` (expected hourly, daily, weekly or monthly)")]
    UnknownGranularity(String),
}

/// Failure of an inbound table source.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("no table available for category `{0}`")]
    NotFound(CategoryKey),
    #[error("reading table: {0}")]
    Io(#[from] std::io::Error),
    #[error("decoding table: {0}")]
    Decode(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Why a single row was left out of a parsed collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    MissingIdentity,
    InvalidCoordinate { column: String },
    InvalidTimestamp,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingIdentity => write!(f, "missing identity"),
            SkipReason::InvalidCoordinate { column } => {
                write!(f, "invalid coordinate in `{}`", column)
            }
            SkipReason::InvalidTimestamp => write!(f, "unparseable timestamp"),
        }
    }
}

/// A soft, row-level parse failure. Never surfaced as an `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSkipped {
    /// Zero-based data row index (header excluded).
    pub row: usize,
    pub reason: SkipReason,
}

/// Anything able to hand the core a fully materialized table for a category.
pub trait TableSource {
    fn load(&self, category: &CategoryKey) -> Result<RawTable, SourceError>;
}

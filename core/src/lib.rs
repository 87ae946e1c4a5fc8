//! Core transformation layer for detection browsing.
//!
//! Raw tables are parsed into per-category detection collections, indexed by
//! identity, and bucketed into chronological frequency series. A
//! `SelectionState` decides which of those derived views is requested next.

pub mod prelude;
pub mod processing;
pub mod record;
pub mod selection;
pub mod store;
pub mod telemetry;

pub use prelude::{ConfigError, ParseError, RowSkipped, SelectionError, SourceError, TableSource};
pub use processing::{bucket, distinct_identities, FrequencySeries, Granularity, RecordParser};
pub use record::{CategoryKey, Detection, DetectionCollection, IdentityKey, RawTable};
pub use selection::{Focus, SelectionState, View, ViewRequest};
pub use store::DetectionStore;

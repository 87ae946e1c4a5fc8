pub mod bucket;
pub mod identity;
pub mod parser;

pub use bucket::{bucket, FrequencyBucket, FrequencySeries, Granularity};
pub use identity::{distinct_identities, IdentityIndex};
pub use parser::{parse_table, parse_timestamp, ParseReport, RecordParser};

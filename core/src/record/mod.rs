pub mod detection;
pub mod table;

pub use detection::{CategoryKey, Detection, DetectionCollection, IdentityKey};
pub use table::{CellValue, RawTable};

use log::{info, warn};

use crate::prelude::RowSkipped;
use crate::record::CategoryKey;

/// Logger scoped to the category a component is working on.
pub struct LogManager {
    scope: String,
}

impl LogManager {
    pub fn new(category: &CategoryKey) -> Self {
        Self {
            scope: category.to_string(),
        }
    }

    pub fn record(&self, message: &str) {
        info!("[{}] {}", self.scope, message);
    }

    pub fn row_skipped(&self, skipped: &RowSkipped) {
        warn!("[{}] skipping row {}: {}", self.scope, skipped.row, skipped.reason);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new(&CategoryKey::default())
    }
}

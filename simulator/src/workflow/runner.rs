use anyhow::Context;
use log::warn;
use serde::{Deserialize, Serialize};
use sightcore::prelude::{RowSkipped, SourceError, TableSource};
use sightcore::processing::RecordParser;
use sightcore::record::CategoryKey;
use sightcore::store::{CategoryEntry, DetectionStore};
use sightcore::telemetry::{MetricsRecorder, ParseMetrics};
use std::sync::Arc;

use crate::generator::profile::build_sample_table;
use crate::workflow::config::WorkflowConfig;
use crate::workflow::source::DirectorySource;

/// Where a published collection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadOrigin {
    File,
    Sample,
}

pub struct LoadOutcome {
    pub origin: LoadOrigin,
    pub entry: Arc<CategoryEntry>,
    pub skipped: Vec<RowSkipped>,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
    source: Arc<dyn TableSource + Send + Sync>,
    store: Arc<DetectionStore>,
    metrics: Arc<MetricsRecorder>,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        let source = Arc::new(DirectorySource::new(config.data_dir.clone()));
        Self::with_source(config, source)
    }

    pub fn with_source(config: WorkflowConfig, source: Arc<dyn TableSource + Send + Sync>) -> Self {
        Self {
            config,
            source,
            store: Arc::new(DetectionStore::new()),
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn store(&self) -> &DetectionStore {
        &self.store
    }

    pub fn metrics(&self) -> ParseMetrics {
        self.metrics.snapshot()
    }

    /// Loads and publishes `category`, falling back to generated sample data
    /// when the source or the table structure fails.
    pub fn load(&self, category: &CategoryKey) -> anyhow::Result<LoadOutcome> {
        let parser = RecordParser::new(category.clone()).with_metrics(self.metrics.clone());

        let loaded = match self.source.load(category) {
            Ok(table) => parser.parse(&table).map_err(SourceError::from),
            Err(err) => {
                self.metrics.record_failure();
                Err(err)
            }
        };

        let (origin, report) = match loaded {
            Ok(report) => (LoadOrigin::File, report),
            Err(err) => {
                warn!(
                    "loading category {} failed ({}); using generated sample data",
                    category, err
                );
                let table = build_sample_table(category, &self.config.generator)
                    .with_context(|| format!("generating sample data for {}", category))?;
                let report = parser
                    .parse(&table)
                    .with_context(|| format!("parsing sample data for {}", category))?;
                (LoadOrigin::Sample, report)
            }
        };

        let entry = self.store.publish(report.collection);
        Ok(LoadOutcome {
            origin,
            entry,
            skipped: report.skipped,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use sightcore::record::{CellValue, RawTable};
    use std::collections::HashMap;

    /// In-memory source keyed by category.
    pub(crate) struct StaticSource(pub HashMap<String, RawTable>);

    impl TableSource for StaticSource {
        fn load(&self, category: &CategoryKey) -> Result<RawTable, SourceError> {
            self.0
                .get(category.as_str())
                .cloned()
                .ok_or_else(|| SourceError::NotFound(category.clone()))
        }
    }

    pub(crate) fn table(rows: &[[&str; 4]]) -> RawTable {
        RawTable::new(
            ["id", "x", "y", "timestamp"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            rows.iter()
                .map(|row| row.iter().map(|cell| CellValue::from(*cell)).collect())
                .collect(),
        )
        .unwrap()
    }

    pub(crate) fn runner_with(tables: Vec<(&str, RawTable)>) -> Runner {
        let mut config = WorkflowConfig::default();
        config.generator.seed = Some(7);
        let source = StaticSource(
            tables
                .into_iter()
                .map(|(category, table)| (category.to_string(), table))
                .collect(),
        );
        Runner::with_source(config, Arc::new(source))
    }

    #[test]
    fn runner_publishes_file_tables() {
        let runner = runner_with(vec![(
            "face",
            table(&[
                ["F1", "77.1", "28.6", "2024-01-01T10:00"],
                ["F2", "77.2", "28.7", "not a time"],
            ]),
        )]);
        let outcome = runner.load(&"face".into()).unwrap();
        assert_eq!(outcome.origin, LoadOrigin::File);
        assert_eq!(outcome.entry.collection.len(), 1);
        assert_eq!(outcome.skipped.len(), 1);
        assert!(runner.store().contains(&"face".into()));
        assert_eq!(runner.metrics().rows_skipped, 1);
    }

    #[test]
    fn runner_falls_back_on_missing_source() {
        let runner = runner_with(Vec::new());
        let outcome = runner.load(&"car".into()).unwrap();
        assert_eq!(outcome.origin, LoadOrigin::Sample);
        assert_eq!(outcome.entry.identities.len(), 5);
        assert!(outcome.entry.identities.as_slice()[0].as_str().starts_with('C'));
        assert_eq!(runner.metrics().load_failures, 1);
    }

    #[test]
    fn runner_falls_back_on_empty_table() {
        let runner = runner_with(vec![("face", table(&[]))]);
        let outcome = runner.load(&"face".into()).unwrap();
        assert_eq!(outcome.origin, LoadOrigin::Sample);
        assert_eq!(runner.metrics().load_failures, 1);
    }

    #[test]
    fn malformed_rows_do_not_trigger_fallback() {
        let runner = runner_with(vec![("face", table(&[["F1", "77.1", "28.6", "never"]]))]);
        let outcome = runner.load(&"face".into()).unwrap();
        assert_eq!(outcome.origin, LoadOrigin::File);
        assert!(outcome.entry.collection.is_empty());
        assert_eq!(runner.metrics().load_failures, 0);
    }
}

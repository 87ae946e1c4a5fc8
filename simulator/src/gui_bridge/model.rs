use serde::{Deserialize, Serialize};
use sightcore::processing::IdentityIndex;
use sightcore::record::CategoryKey;
use sightcore::selection::{SelectionState, View};
use sightcore::telemetry::ParseMetrics;

use crate::workflow::runner::LoadOrigin;

/// Everything a rendering client needs for the current selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizationModel {
    pub selection: SelectionState,
    pub categories: Vec<CategoryKey>,
    pub origin: Option<LoadOrigin>,
    pub identities: IdentityIndex,
    pub view: View,
    pub metrics: ParseMetrics,
}

impl VisualizationModel {
    /// One-line description used for offline reports.
    pub fn summary(&self) -> String {
        let origin = match self.origin {
            Some(LoadOrigin::File) => "file",
            Some(LoadOrigin::Sample) => "sample",
            None => "unknown",
        };
        let head = format!(
            "category={} origin={} identities={}",
            self.selection.category(),
            origin,
            self.identities.len()
        );
        match &self.view {
            View::Overview(overview) => {
                format!("{} view=overview points={}", head, overview.point_count())
            }
            View::Series(series) => {
                let buckets = series
                    .series
                    .buckets()
                    .iter()
                    .map(|bucket| format!("{}:{}", bucket.label, bucket.count))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "{} view=series identity={} granularity={} buckets=[{}]",
                    head,
                    series.identity,
                    series.series.granularity(),
                    buckets
                )
            }
        }
    }
}

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::processing::{bucket, FrequencySeries, Granularity};
use crate::record::{CategoryKey, Detection, DetectionCollection, IdentityKey};

/// Number of distinct marker colors renderers cycle through.
pub const PALETTE_SIZE: usize = 10;

/// What the selection asks renderers to show next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ViewRequest {
    Overview {
        category: CategoryKey,
    },
    Series {
        category: CategoryKey,
        identity: IdentityKey,
        granularity: Granularity,
    },
}

impl ViewRequest {
    pub fn category(&self) -> &CategoryKey {
        match self {
            ViewRequest::Overview { category } | ViewRequest::Series { category, .. } => category,
        }
    }

    /// Produces the view from the collection of the requested category.
    pub fn resolve(&self, collection: &DetectionCollection) -> View {
        match self {
            ViewRequest::Overview { .. } => View::Overview(OverviewModel::build(collection)),
            ViewRequest::Series {
                identity,
                granularity,
                ..
            } => View::Series(SeriesModel::build(collection, identity, *granularity)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "model", rename_all = "lowercase")]
pub enum View {
    Overview(OverviewModel),
    Series(SeriesModel),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Local>,
    pub timestamp_label: String,
}

impl MapPoint {
    /// `(lat, lon)` to four decimal places.
    pub fn location_label(&self) -> String {
        format!("({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

impl From<&Detection> for MapPoint {
    fn from(detection: &Detection) -> Self {
        Self {
            latitude: detection.latitude(),
            longitude: detection.longitude(),
            timestamp: detection.timestamp(),
            timestamp_label: detection.timestamp().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityGroup {
    pub identity: IdentityKey,
    pub palette_slot: usize,
    pub points: Vec<MapPoint>,
}

/// Every point of a category, grouped by identity in first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewModel {
    pub category: CategoryKey,
    pub groups: Vec<IdentityGroup>,
}

impl OverviewModel {
    pub fn build(collection: &DetectionCollection) -> Self {
        let mut slots: HashMap<&IdentityKey, usize> = HashMap::new();
        let mut groups: Vec<IdentityGroup> = Vec::new();

        for detection in collection {
            let slot = *slots.entry(detection.identity()).or_insert_with(|| {
                groups.push(IdentityGroup {
                    identity: detection.identity().clone(),
                    palette_slot: groups.len() % PALETTE_SIZE,
                    points: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot].points.push(MapPoint::from(detection));
        }

        Self {
            category: collection.category().clone(),
            groups,
        }
    }

    pub fn point_count(&self) -> usize {
        self.groups.iter().map(|group| group.points.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesModel {
    pub identity: IdentityKey,
    pub title: String,
    pub dataset_label: String,
    pub unit_label: String,
    pub series: FrequencySeries,
}

impl SeriesModel {
    pub fn build(
        collection: &DetectionCollection,
        identity: &IdentityKey,
        granularity: Granularity,
    ) -> Self {
        Self {
            identity: identity.clone(),
            title: format!("Frequency for ID: {}", identity),
            dataset_label: format!("Frequency ({})", granularity),
            unit_label: granularity.unit_label().to_string(),
            series: bucket(collection, identity, granularity),
        }
    }
}

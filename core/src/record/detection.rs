use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a tracked subject ("F1", "C3", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IdentityKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for IdentityKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Partition key separating independent detection collections ("face", "car").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryKey(String);

impl CategoryKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CategoryKey {
    fn default() -> Self {
        Self::new("face")
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A single sighting of an identity at a place and time.
///
/// Coordinates are carried as given; no range validation happens here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    identity: IdentityKey,
    longitude: f64,
    latitude: f64,
    timestamp: DateTime<Local>,
}

impl Detection {
    pub fn new(
        identity: IdentityKey,
        longitude: f64,
        latitude: f64,
        timestamp: DateTime<Local>,
    ) -> Self {
        Self {
            identity,
            longitude,
            latitude,
            timestamp,
        }
    }

    pub fn identity(&self) -> &IdentityKey {
        &self.identity
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }
}

/// Ordered detections belonging to one category. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionCollection {
    category: CategoryKey,
    detections: Vec<Detection>,
}

impl DetectionCollection {
    pub fn new(category: CategoryKey, detections: Vec<Detection>) -> Self {
        Self {
            category,
            detections,
        }
    }

    pub fn empty(category: CategoryKey) -> Self {
        Self::new(category, Vec::new())
    }

    pub fn category(&self) -> &CategoryKey {
        &self.category
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
        self.detections.iter()
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// Detections of a single identity, in collection order.
    pub fn for_identity<'a>(
        &'a self,
        identity: &'a IdentityKey,
    ) -> impl Iterator<Item = &'a Detection> + 'a {
        self.detections
            .iter()
            .filter(move |detection| detection.identity() == identity)
    }
}

impl<'a> IntoIterator for &'a DetectionCollection {
    type Item = &'a Detection;
    type IntoIter = std::slice::Iter<'a, Detection>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

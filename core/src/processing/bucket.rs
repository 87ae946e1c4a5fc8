use chrono::{DateTime, Datelike, Days, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::prelude::ConfigError;
use crate::record::{Detection, DetectionCollection, IdentityKey};

/// Time resolution of a frequency series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hourly,
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    pub const ALL: [Granularity; 4] = [
        Granularity::Hourly,
        Granularity::Daily,
        Granularity::Weekly,
        Granularity::Monthly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Hourly => "hourly",
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
        }
    }

    /// Axis caption for charts of this granularity.
    pub fn unit_label(&self) -> &'static str {
        match self {
            Granularity::Hourly => "Hour",
            Granularity::Daily => "Date",
            Granularity::Weekly => "Week",
            Granularity::Monthly => "Month",
        }
    }

    /// Bucket label for an instant, in local wall-clock time.
    ///
    /// Labels are zero-padded and most-significant-first, so sorting them as
    /// strings sorts them chronologically. Weeks start on the Sunday at or
    /// before the instant's own date.
    pub fn bucket_key(&self, timestamp: DateTime<Local>) -> String {
        match self {
            Granularity::Hourly => timestamp.format("%Y-%m-%d %H:00").to_string(),
            Granularity::Daily => timestamp.format("%Y-%m-%d").to_string(),
            Granularity::Weekly => {
                let date = timestamp.date_naive();
                let offset = u64::from(date.weekday().num_days_from_sunday());
                let start = date.checked_sub_days(Days::new(offset)).unwrap_or(date);
                format!("Week of {}", start.format("%Y-%m-%d"))
            }
            Granularity::Monthly => timestamp.format("%Y-%m").to_string(),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Granularity::ALL
            .into_iter()
            .find(|granularity| granularity.as_str() == value)
            .ok_or_else(|| ConfigError::UnknownGranularity(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyBucket {
    pub label: String,
    pub count: usize,
}

/// Chronologically ordered counts per time bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencySeries {
    granularity: Granularity,
    buckets: Vec<FrequencyBucket>,
}

impl FrequencySeries {
    pub fn from_detections<'a>(
        detections: impl IntoIterator<Item = &'a Detection>,
        granularity: Granularity,
    ) -> Self {
        let mut tally: BTreeMap<String, usize> = BTreeMap::new();
        for detection in detections {
            *tally
                .entry(granularity.bucket_key(detection.timestamp()))
                .or_insert(0) += 1;
        }

        // BTreeMap iterates keys in byte order, which the label format keeps
        // equal to chronological order.
        let buckets = tally
            .into_iter()
            .map(|(label, count)| FrequencyBucket { label, count })
            .collect();

        Self {
            granularity,
            buckets,
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn buckets(&self) -> &[FrequencyBucket] {
        &self.buckets
    }

    pub fn labels(&self) -> Vec<&str> {
        self.buckets.iter().map(|b| b.label.as_str()).collect()
    }

    pub fn counts(&self) -> Vec<usize> {
        self.buckets.iter().map(|b| b.count).collect()
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(|b| b.count).sum()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Frequency series of one identity. An unknown identity gives an empty series.
pub fn bucket(
    collection: &DetectionCollection,
    identity: &IdentityKey,
    granularity: Granularity,
) -> FrequencySeries {
    FrequencySeries::from_detections(collection.for_identity(identity), granularity)
}

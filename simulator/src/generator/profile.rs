use anyhow::Context;
use chrono::{Days, Local, NaiveDateTime, Timelike};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sightcore::record::{CategoryKey, CellValue, RawTable};

/// Configuration for generating demo detections when no real table loads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    pub identity_count: usize,
    pub min_entries: usize,
    pub max_entries: usize,
    pub longitude_min: f64,
    pub longitude_span: f64,
    pub latitude_min: f64,
    pub latitude_span: f64,
    pub days_back: u32,
    pub seed: Option<u64>,
    /// Latest instant a sample may carry; defaults to now.
    pub anchor: Option<NaiveDateTime>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            identity_count: 5,
            min_entries: 10,
            max_entries: 19,
            longitude_min: 77.0,
            longitude_span: 0.5,
            latitude_min: 28.5,
            latitude_span: 0.5,
            days_back: 7,
            seed: None,
            anchor: None,
        }
    }
}

impl GeneratorConfig {
    fn entry_range(&self) -> std::ops::RangeInclusive<usize> {
        self.min_entries..=self.max_entries.max(self.min_entries)
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

fn identity_prefix(category: &CategoryKey) -> char {
    if category.as_str() == "face" {
        'F'
    } else {
        'C'
    }
}

/// Builds a recognized-column table of random detections for `category`.
pub fn build_sample_table(
    category: &CategoryKey,
    config: &GeneratorConfig,
) -> anyhow::Result<RawTable> {
    let mut rng = config.rng();
    let anchor = config
        .anchor
        .unwrap_or_else(|| Local::now().naive_local());
    let prefix = identity_prefix(category);
    let columns = ["id", "x", "y", "timestamp"]
        .iter()
        .map(|c| c.to_string())
        .collect();

    let mut rows = Vec::new();
    for index in 1..=config.identity_count {
        let identity = format!("{}{}", prefix, index);
        let entries = rng.gen_range(config.entry_range());

        for _ in 0..entries {
            let longitude = config.longitude_min + rng.gen::<f64>() * config.longitude_span;
            let latitude = config.latitude_min + rng.gen::<f64>() * config.latitude_span;
            let days = rng.gen_range(0..config.days_back.max(1));
            let hour = rng.gen_range(0..24);

            let date = anchor
                .date()
                .checked_sub_days(Days::new(u64::from(days)))
                .context("sample date out of range")?;
            let stamp = date
                .and_hms_opt(hour, anchor.minute(), anchor.second())
                .context("building sample timestamp")?;

            rows.push(vec![
                CellValue::Text(identity.clone()),
                CellValue::Number(longitude),
                CellValue::Number(latitude),
                CellValue::Text(stamp.format("%Y-%m-%dT%H:%M:%S").to_string()),
            ]);
        }
    }

    RawTable::new(columns, rows).context("assembling sample table")
}

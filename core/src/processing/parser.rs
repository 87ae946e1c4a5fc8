use chrono::{DateTime, Datelike, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone};
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::prelude::{ParseError, ParseResult, RowSkipped, SkipReason};
use crate::record::{CategoryKey, CellValue, Detection, DetectionCollection, IdentityKey, RawTable};
use crate::telemetry::{LogManager, MetricsRecorder};

pub const IDENTITY_COLUMN: &str = "id";
pub const LONGITUDE_COLUMN: &str = "x";
pub const LATITUDE_COLUMN: &str = "y";
pub const TIMESTAMP_COLUMN: &str = "timestamp";

const REQUIRED_COLUMNS: [&str; 4] = [
    IDENTITY_COLUMN,
    LONGITUDE_COLUMN,
    LATITUDE_COLUMN,
    TIMESTAMP_COLUMN,
];

const NAIVE_FORMATS: [&str; 8] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Years whose bucket labels stay four digits wide.
const SUPPORTED_YEARS: RangeInclusive<i32> = 0..=9999;

/// Parsed collection plus the rows that were left out of it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseReport {
    pub collection: DetectionCollection,
    pub skipped: Vec<RowSkipped>,
}

/// Column positions resolved once per table.
struct Schema {
    identity: usize,
    longitude: usize,
    latitude: usize,
    timestamp: usize,
}

impl Schema {
    fn resolve(table: &RawTable) -> ParseResult<Self> {
        let lookup = |column: &str| {
            table
                .column_index(column)
                .ok_or_else(|| ParseError::MissingColumn {
                    column: column.to_string(),
                })
        };
        Ok(Self {
            identity: lookup(REQUIRED_COLUMNS[0])?,
            longitude: lookup(REQUIRED_COLUMNS[1])?,
            latitude: lookup(REQUIRED_COLUMNS[2])?,
            timestamp: lookup(REQUIRED_COLUMNS[3])?,
        })
    }

    fn detection(&self, cells: &[CellValue]) -> Result<Detection, SkipReason> {
        let identity = cells[self.identity]
            .as_text()
            .map(|text| IdentityKey::new(text.into_owned()))
            .ok_or(SkipReason::MissingIdentity)?;
        let longitude = coordinate(&cells[self.longitude], LONGITUDE_COLUMN)?;
        let latitude = coordinate(&cells[self.latitude], LATITUDE_COLUMN)?;
        let timestamp = parse_timestamp(&cells[self.timestamp]).ok_or(SkipReason::InvalidTimestamp)?;
        Ok(Detection::new(identity, longitude, latitude, timestamp))
    }
}

fn coordinate(cell: &CellValue, column: &str) -> Result<f64, SkipReason> {
    cell.as_number()
        .filter(|value| value.is_finite())
        .ok_or_else(|| SkipReason::InvalidCoordinate {
            column: column.to_string(),
        })
}

/// Converts raw tables into detection collections for one category.
///
/// Structural problems fail the whole table; individual bad rows are
/// skipped, logged and counted.
pub struct RecordParser {
    category: CategoryKey,
    logger: LogManager,
    metrics: Arc<MetricsRecorder>,
}

impl RecordParser {
    pub fn new(category: CategoryKey) -> Self {
        Self {
            logger: LogManager::new(&category),
            category,
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn parse(&self, table: &RawTable) -> ParseResult<ParseReport> {
        let schema = match self.validate(table) {
            Ok(schema) => schema,
            Err(err) => {
                self.metrics.record_failure();
                return Err(err);
            }
        };

        let mut detections = Vec::with_capacity(table.len());
        let mut skipped = Vec::new();
        for (row, cells) in table.rows().iter().enumerate() {
            match schema.detection(cells) {
                Ok(detection) => detections.push(detection),
                Err(reason) => {
                    let entry = RowSkipped { row, reason };
                    self.logger.row_skipped(&entry);
                    skipped.push(entry);
                }
            }
        }

        self.metrics.record_parsed(detections.len());
        self.metrics.record_skipped(skipped.len());
        self.logger.record(&format!(
            "parsed {} detections, skipped {} rows",
            detections.len(),
            skipped.len()
        ));

        Ok(ParseReport {
            collection: DetectionCollection::new(self.category.clone(), detections),
            skipped,
        })
    }

    fn validate(&self, table: &RawTable) -> ParseResult<Schema> {
        if table.is_empty() {
            return Err(ParseError::EmptyTable);
        }
        Schema::resolve(table)
    }
}

/// Convenience wrapper for one-off parses.
pub fn parse_table(category: CategoryKey, table: &RawTable) -> ParseResult<ParseReport> {
    RecordParser::new(category).parse(table)
}

/// Reads a timestamp cell as a local instant.
///
/// Numbers, and text made only of digits, are Unix epoch milliseconds. Other
/// text may be RFC 3339 or a naive date/time taken as local wall-clock time.
/// Instants outside years 0 through 9999 are rejected.
pub fn parse_timestamp(cell: &CellValue) -> Option<DateTime<Local>> {
    let parsed = match cell {
        CellValue::Number(millis) if millis.is_finite() => {
            Local.timestamp_millis_opt(*millis as i64).single()
        }
        CellValue::Text(text) => parse_timestamp_text(text.trim()),
        _ => None,
    };
    parsed.filter(|instant| SUPPORTED_YEARS.contains(&instant.year()))
}

fn parse_timestamp_text(value: &str) -> Option<DateTime<Local>> {
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Local));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return resolve_local(naive);
        }
    }
    if let Some(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return resolve_local(date);
    }
    // Text exports of numeric cells.
    value
        .parse::<i64>()
        .ok()
        .and_then(|millis| Local.timestamp_millis_opt(millis).single())
}

fn resolve_local(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => None,
    }
}

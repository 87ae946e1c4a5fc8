use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::prelude::{ParseError, ParseResult};

/// Largest magnitude below which every integral `f64` converts to `i64` exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Scalar cell of a decoded spreadsheet-like table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Cell rendered as text; `None` for empty or whitespace-only cells.
    ///
    /// Integral numbers render without a fractional part so that a numeric
    /// `7` and a textual `"7"` produce the same string.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            CellValue::Empty => None,
            CellValue::Bool(value) => Some(Cow::Owned(value.to_string())),
            CellValue::Number(value) if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER => {
                Some(Cow::Owned(format!("{}", *value as i64)))
            }
            CellValue::Number(value) => Some(Cow::Owned(value.to_string())),
            CellValue::Text(value) => {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then_some(Cow::Borrowed(trimmed))
            }
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) => Some(*value),
            CellValue::Text(value) => value.trim().parse::<f64>().ok(),
            CellValue::Empty | CellValue::Bool(_) => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// Rectangular table of named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    /// Builds a table, rejecting duplicate column names and ragged rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> ParseResult<Self> {
        for (idx, name) in columns.iter().enumerate() {
            if columns[..idx].contains(name) {
                return Err(ParseError::Malformed(format!(
                    "duplicate column `{}`",
                    name
                )));
            }
        }
        if let Some((row, cells)) = rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != columns.len())
        {
            return Err(ParseError::RaggedRow {
                row,
                expected: columns.len(),
                found: cells.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    /// Builds a table from row mappings of column name to cell.
    ///
    /// Columns are the union of all keys in first-seen order; a row lacking
    /// a column gets an empty cell there.
    pub fn from_records<R, K>(records: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = (K, CellValue)>,
        K: Into<String>,
    {
        let mut columns: Vec<String> = Vec::new();
        let mut sparse: Vec<Vec<(usize, CellValue)>> = Vec::new();

        for record in records {
            let mut cells = Vec::new();
            for (key, value) in record {
                let key = key.into();
                let idx = match columns.iter().position(|column| *column == key) {
                    Some(idx) => idx,
                    None => {
                        columns.push(key);
                        columns.len() - 1
                    }
                };
                cells.push((idx, value));
            }
            sparse.push(cells);
        }

        let rows = sparse
            .into_iter()
            .map(|cells| {
                let mut row = vec![CellValue::Empty; columns.len()];
                for (idx, value) in cells {
                    row[idx] = value;
                }
                row
            })
            .collect();

        Self { columns, rows }
    }

    /// Decodes a JSON array of row objects, the shape a sheet-to-JSON export
    /// produces. Keys keep their document order.
    pub fn from_json_rows(input: &str) -> ParseResult<Self> {
        let value: serde_json::Value =
            serde_json::from_str(input).map_err(|err| ParseError::Malformed(err.to_string()))?;
        let rows = value
            .as_array()
            .ok_or_else(|| ParseError::Malformed("expected an array of rows".into()))?;

        let mut records = Vec::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            let object = row.as_object().ok_or_else(|| {
                ParseError::Malformed(format!("row {} is not an object", idx))
            })?;
            let mut record = Vec::with_capacity(object.len());
            for (key, cell) in object {
                let cell = serde_json::from_value::<CellValue>(cell.clone()).map_err(|_| {
                    ParseError::Malformed(format!("row {} column `{}` is not a scalar", idx, key))
                })?;
                record.push((key.clone(), cell));
            }
            records.push(record);
        }

        Ok(Self::from_records(records))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ragged_rows_are_rejected() {
        let err = RawTable::new(
            vec!["id".into(), "x".into()],
            vec![vec!["F1".into(), CellValue::Number(1.0)], vec!["F2".into()]],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ParseError::RaggedRow {
                row: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn duplicate_columns_are_rejected() {
        let err = RawTable::new(vec!["id".into(), "id".into()], Vec::new()).unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));
    }

    #[test]
    fn records_fill_missing_cells_with_empty() {
        let table = RawTable::from_records(vec![
            vec![("id", CellValue::from("F1")), ("x", CellValue::from(1.5))],
            vec![("id", CellValue::from("F2")), ("note", CellValue::from("late"))],
        ]);
        assert_eq!(table.columns(), ["id", "x", "note"]);
        assert_eq!(table.rows()[0][2], CellValue::Empty);
        assert_eq!(table.rows()[1][1], CellValue::Empty);
    }

    #[test]
    fn json_rows_decode_scalars() {
        let table = RawTable::from_json_rows(
            r#"[{"id": 7, "x": 77.1, "y": "28.6", "timestamp": null, "seen": true}]"#,
        )
        .unwrap();
        let id = table.column_index("id").unwrap();
        let ts = table.column_index("timestamp").unwrap();
        let seen = table.column_index("seen").unwrap();
        assert_eq!(table.rows()[0][id].as_text().as_deref(), Some("7"));
        assert_eq!(table.rows()[0][ts], CellValue::Empty);
        assert_eq!(table.rows()[0][seen], CellValue::Bool(true));
    }

    #[test]
    fn json_columns_follow_document_order() {
        let table = RawTable::from_json_rows(
            r#"[
                {"timestamp": "2024-01-01T10:00", "y": 28.6, "x": 77.1, "id": "F1"},
                {"id": "F2", "camera": "north", "x": 77.2}
            ]"#,
        )
        .unwrap();
        assert_eq!(table.columns(), ["timestamp", "y", "x", "id", "camera"]);
        assert_eq!(table.rows()[0][2], CellValue::Number(77.1));
        assert_eq!(table.rows()[1][0], CellValue::Empty);
    }

    #[test]
    fn json_rows_reject_nested_values() {
        let err = RawTable::from_json_rows(r#"[{"id": {"nested": 1}}]"#).unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));
        let err = RawTable::from_json_rows(r#"{"id": "F1"}"#).unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));
    }

    #[test]
    fn text_cells_trim_and_parse_numbers() {
        assert_eq!(CellValue::from("  ").as_text(), None);
        assert_eq!(CellValue::from(" 28.5 ").as_number(), Some(28.5));
        assert_eq!(CellValue::from(2.5).as_text().as_deref(), Some("2.5"));
        assert_eq!(CellValue::Bool(true).as_number(), None);
    }

    #[test]
    fn large_integral_numbers_keep_distinct_text() {
        let small = CellValue::Number(-42.0).as_text().unwrap().into_owned();
        let first = CellValue::Number(1e20).as_text().unwrap().into_owned();
        let second = CellValue::Number(2e20).as_text().unwrap().into_owned();
        assert_eq!(small, "-42");
        assert_eq!(first, "100000000000000000000");
        assert_eq!(second, "200000000000000000000");
        assert_eq!(CellValue::Number(f64::INFINITY).as_text().as_deref(), Some("inf"));
    }
}

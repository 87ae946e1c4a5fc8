use sightcore::prelude::{SourceError, TableSource};
use sightcore::record::{CategoryKey, CellValue, RawTable};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Reads `<root>/<category>_detection.csv`, or the `.json` export when no CSV
/// exists.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn table_path(&self, category: &CategoryKey, extension: &str) -> PathBuf {
        self.root
            .join(format!("{}_detection.{}", category, extension))
    }
}

impl TableSource for DirectorySource {
    fn load(&self, category: &CategoryKey) -> Result<RawTable, SourceError> {
        let csv_path = self.table_path(category, "csv");
        if csv_path.is_file() {
            return read_csv(File::open(&csv_path)?);
        }
        let json_path = self.table_path(category, "json");
        if json_path.is_file() {
            return read_json(&json_path);
        }
        Err(SourceError::NotFound(category.clone()))
    }
}

/// Decodes a headed CSV table. Row width is checked by `RawTable`.
pub fn read_csv<R: Read>(input: R) -> Result<RawTable, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let columns = reader
        .headers()
        .map_err(|err| SourceError::Decode(err.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| SourceError::Decode(err.to_string()))?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(RawTable::new(columns, rows)?)
}

fn read_json(path: &Path) -> Result<RawTable, SourceError> {
    let contents = fs::read_to_string(path)?;
    Ok(RawTable::from_json_rows(&contents)?)
}

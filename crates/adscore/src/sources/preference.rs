use super::cells::{classify, clean_header, dedupe_headers, Cell};
use super::{LoadError, SourceKind};
use std::collections::HashMap;
use std::io::Read;
use tracing::{debug, info};

/// Separator between ad type and tag in population column names (U+2013).
pub const COLUMN_SEPARATOR: char = '\u{2013}';

/// Composite column name used by population exports, e.g. `短视频类–情感关系联结`.
pub fn column_key(ad_type: &str, tag: &str) -> String {
    format!("{ad_type}{COLUMN_SEPARATOR}{tag}")
}

/// Mean audience preference ("Pavg") per population column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferenceTable {
    columns: Vec<String>,
    means: HashMap<String, f64>,
}

impl PreferenceTable {
    pub fn from_means<I, K>(means: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let mut table = Self::default();
        for (column, mean) in means {
            table.insert(column.into(), mean);
        }
        table
    }

    fn insert(&mut self, column: String, mean: f64) {
        if self.means.insert(column.clone(), mean).is_none() {
            self.columns.push(column);
        }
    }

    /// Raw lookup by column name.
    pub fn get(&self, column: &str) -> Option<f64> {
        self.means.get(column).copied()
    }

    pub fn for_tag(&self, ad_type: &str, tag: &str) -> Option<f64> {
        self.get(&column_key(ad_type, tag))
    }

    /// Column names in source order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[derive(Debug, Default)]
struct ColumnAccumulator {
    sum: f64,
    numbers: usize,
    booleans: usize,
    missing: usize,
    text: usize,
}

enum ColumnMean {
    Value(f64),
    NonNumeric,
    NoValues,
}

impl ColumnAccumulator {
    fn push(&mut self, cell: Cell) {
        match cell {
            Cell::Missing => self.missing += 1,
            Cell::Number(value) => {
                self.sum += value;
                self.numbers += 1;
            }
            Cell::Boolean(flag) => {
                if flag {
                    self.sum += 1.0;
                }
                self.booleans += 1;
            }
            Cell::Text => self.text += 1,
        }
    }

    fn mean(&self) -> ColumnMean {
        let mixed_kinds = self.numbers > 0 && self.booleans > 0;
        // A boolean column with gaps cannot stay boolean, so it reads as text.
        let sparse_booleans = self.booleans > 0 && self.missing > 0;
        if self.text > 0 || mixed_kinds || sparse_booleans {
            return ColumnMean::NonNumeric;
        }

        let count = self.numbers + self.booleans;
        if count > 0 {
            ColumnMean::Value(self.sum / count as f64)
        } else if self.missing > 0 {
            ColumnMean::NoValues
        } else {
            ColumnMean::NonNumeric
        }
    }
}

pub(crate) fn parse_preferences<R: Read>(reader: R) -> Result<PreferenceTable, LoadError> {
    let kind = SourceKind::Preference;
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|err| LoadError::csv(kind, err))?
        .iter()
        .map(clean_header)
        .collect();
    let headers = dedupe_headers(headers);
    if headers.is_empty() || headers.iter().all(|header| header.trim().is_empty()) {
        return Err(LoadError::Empty { source_kind: kind });
    }

    let mut accumulators: Vec<ColumnAccumulator> =
        headers.iter().map(|_| ColumnAccumulator::default()).collect();
    let mut rows = 0usize;

    for record in csv_reader.records() {
        let record = record.map_err(|err| LoadError::csv(kind, err))?;
        for (index, accumulator) in accumulators.iter_mut().enumerate() {
            let cell = record.get(index).map(classify).unwrap_or(Cell::Missing);
            accumulator.push(cell);
        }
        rows += 1;
    }

    info!(rows, columns = headers.len(), "population table read");

    let mut table = PreferenceTable::default();
    for (column, accumulator) in headers.into_iter().zip(accumulators) {
        match accumulator.mean() {
            ColumnMean::Value(mean) => table.insert(column, mean),
            ColumnMean::NonNumeric => info!(%column, "skipping non-numeric column"),
            ColumnMean::NoValues => debug!(%column, "skipping column without values"),
        }
    }

    info!(numeric_columns = table.len(), "preference means computed");
    Ok(table)
}

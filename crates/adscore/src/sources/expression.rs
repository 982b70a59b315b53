use super::cells::{classify, clean_header, dedupe_headers, Cell};
use super::{LoadError, SourceKind};
use std::collections::HashMap;
use std::io::Read;
use tracing::{info, warn};

/// Value stored for a cell that does not hold a number.
pub const UNPARSABLE_CELL_VALUE: f64 = 0.5;

/// Per ad type content-expression strength of each tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionTable {
    ad_types: Vec<String>,
    values: HashMap<String, HashMap<String, f64>>,
}

impl ExpressionTable {
    /// Replaces any row previously stored for `ad_type`.
    pub fn insert_row<I, K>(&mut self, ad_type: impl Into<String>, tags: I)
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let ad_type = ad_type.into();
        let row = tags
            .into_iter()
            .map(|(tag, value)| (tag.into(), value))
            .collect();
        if self.values.insert(ad_type.clone(), row).is_none() {
            self.ad_types.push(ad_type);
        }
    }

    pub fn get(&self, ad_type: &str, tag: &str) -> Option<f64> {
        self.values
            .get(ad_type)
            .and_then(|row| row.get(tag))
            .copied()
    }

    pub fn row(&self, ad_type: &str) -> Option<&HashMap<String, f64>> {
        self.values.get(ad_type)
    }

    /// Ad type labels in source order.
    pub fn ad_types(&self) -> &[String] {
        &self.ad_types
    }

    pub fn len(&self) -> usize {
        self.ad_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ad_types.is_empty()
    }
}

fn cell_value(raw: Option<&str>) -> f64 {
    match raw.map(classify) {
        Some(Cell::Number(value)) => value,
        Some(Cell::Boolean(flag)) => f64::from(u8::from(flag)),
        _ => UNPARSABLE_CELL_VALUE,
    }
}

pub(crate) fn parse_expressions<R: Read>(reader: R) -> Result<ExpressionTable, LoadError> {
    let kind = SourceKind::Expression;
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

    let mut table = ExpressionTable::default();
    for (line, record) in csv_reader.records().enumerate() {
        let record = record.map_err(|err| LoadError::csv(kind, err))?;
        let ad_type = record.get(0).map(str::trim).unwrap_or_default();
        if ad_type.is_empty() {
            warn!(row = line + 1, "skipping expression row without an ad type");
            continue;
        }

        let tags = headers
            .iter()
            .enumerate()
            .skip(1)
            .map(|(index, tag)| (tag.clone(), cell_value(record.get(index))));
        table.insert_row(ad_type, tags);
    }

    info!(
        ad_types = table.len(),
        tags = headers.len().saturating_sub(1),
        "content expression values loaded"
    );
    Ok(table)
}

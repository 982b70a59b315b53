use std::collections::HashMap;
use tracing::warn;

/// Markers read as a missing value rather than text, matching the
/// conventions of common dataframe CSV readers.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const TRUE_MARKERS: &[&str] = &["True", "TRUE", "true"];
const FALSE_MARKERS: &[&str] = &["False", "FALSE", "false"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Cell {
    Missing,
    Number(f64),
    Boolean(bool),
    Text,
}

/// Missing markers must match the whole cell; a blank-but-spaced cell is text.
pub(crate) fn classify(raw: &str) -> Cell {
    if MISSING_MARKERS.contains(&raw) {
        return Cell::Missing;
    }
    let value = raw.trim();
    if TRUE_MARKERS.contains(&value) {
        return Cell::Boolean(true);
    }
    if FALSE_MARKERS.contains(&value) {
        return Cell::Boolean(false);
    }

    match value.parse::<f64>() {
        Ok(number) if !number.is_nan() => Cell::Number(number),
        _ => Cell::Text,
    }
}

/// Header cleanup: strips byte-order marks that spreadsheet exports prepend.
pub(crate) fn clean_header(value: &str) -> String {
    value.trim_start_matches('\u{feff}').to_string()
}

/// Renames repeated header names to `name.1`, `name.2`, ... so every column
/// keeps its own values and the first occurrence keeps the bare name.
pub(crate) fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    headers
        .into_iter()
        .map(|header| {
            let mut name = header.clone();
            let mut count = counts.get(&name).copied().unwrap_or(0);
            while count > 0 {
                counts.insert(name.clone(), count + 1);
                name = format!("{name}.{count}");
                count = counts.get(&name).copied().unwrap_or(0);
            }
            counts.insert(name.clone(), count + 1);
            if name != header {
                warn!(%header, renamed = %name, "duplicate column name");
            }
            name
        })
        .collect()
}

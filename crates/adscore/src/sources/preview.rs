use super::cells::{clean_header, dedupe_headers};
use super::{LoadError, SourceKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Presence and size of a source file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileStatus {
    pub exists: bool,
    pub size: u64,
}

impl FileStatus {
    pub fn probe(path: &Path) -> Self {
        match fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => Self {
                exists: true,
                size: metadata.len(),
            },
            _ => Self {
                exists: false,
                size: 0,
            },
        }
    }
}

/// First rows of a source file, read without interpretation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourcePreview {
    pub columns: Vec<String>,
    /// Rows read, capped at the requested limit.
    pub row_count: usize,
    pub sample: Vec<BTreeMap<String, String>>,
}

impl SourcePreview {
    /// Reads the header and up to `max_rows` records; `sample` keeps the first
    /// `sample_rows` of them keyed by column.
    pub fn read(
        source_kind: SourceKind,
        path: &Path,
        max_rows: usize,
        sample_rows: usize,
    ) -> Result<Self, LoadError> {
        let file = fs::File::open(path).map_err(|source| LoadError::Io {
            source_kind,
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

        let columns = dedupe_headers(
            reader
                .headers()
                .map_err(|err| LoadError::csv(source_kind, err))?
                .iter()
                .map(clean_header)
                .collect(),
        );

        let mut row_count = 0;
        let mut sample = Vec::new();
        for record in reader.records().take(max_rows) {
            let record = record.map_err(|err| LoadError::csv(source_kind, err))?;
            if sample.len() < sample_rows {
                sample.push(
                    columns
                        .iter()
                        .cloned()
                        .zip(record.iter().map(str::to_string))
                        .collect(),
                );
            }
            row_count += 1;
        }

        Ok(Self {
            columns,
            row_count,
            sample,
        })
    }
}

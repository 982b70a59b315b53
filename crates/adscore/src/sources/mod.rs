//! Loading of the two tabular sources behind the scoring engine.
//!
//! The population table yields mean preference values per `"{ad type}–{tag}"`
//! column; the content table yields expression values per ad type and tag.
//! Both are built together into an immutable [`DataSnapshot`].

mod cells;
mod expression;
mod preference;
mod preview;
mod store;

pub use expression::{ExpressionTable, UNPARSABLE_CELL_VALUE};
pub use preference::{column_key, PreferenceTable, COLUMN_SEPARATOR};
pub use preview::{FileStatus, SourcePreview};
pub use store::SnapshotStore;

use chrono::{DateTime, Utc};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_PREFERENCE_FILE: &str = "generated_population_data.csv";
pub const DEFAULT_EXPRESSION_FILE: &str = "content_tag_values.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Preference,
    Expression,
}

impl SourceKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Preference => "population preference source",
            Self::Expression => "content expression source",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {source_kind} at {}: {source}", .path.display())]
    Io {
        source_kind: SourceKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid CSV data in {source_kind}: {source}")]
    Csv {
        source_kind: SourceKind,
        #[source]
        source: csv::Error,
    },
    #[error("{source_kind} is empty (no header row)")]
    Empty { source_kind: SourceKind },
}

impl LoadError {
    pub(crate) fn csv(source_kind: SourceKind, source: csv::Error) -> Self {
        Self::Csv {
            source_kind,
            source,
        }
    }

    pub fn source_kind(&self) -> SourceKind {
        match self {
            Self::Io { source_kind, .. }
            | Self::Csv { source_kind, .. }
            | Self::Empty { source_kind } => *source_kind,
        }
    }
}

/// Locations of the two source files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePaths {
    pub preference: PathBuf,
    pub expression: PathBuf,
}

impl SourcePaths {
    pub fn new(preference: impl Into<PathBuf>, expression: impl Into<PathBuf>) -> Self {
        Self {
            preference: preference.into(),
            expression: expression.into(),
        }
    }

    /// Default file names resolved against `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(
            dir.join(DEFAULT_PREFERENCE_FILE),
            dir.join(DEFAULT_EXPRESSION_FILE),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (SourceKind, &Path)> {
        [
            (SourceKind::Preference, self.preference.as_path()),
            (SourceKind::Expression, self.expression.as_path()),
        ]
        .into_iter()
    }
}

/// Consistent pair of lookup tables. Never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSnapshot {
    version: u64,
    loaded_at: DateTime<Utc>,
    preferences: PreferenceTable,
    expressions: ExpressionTable,
}

impl DataSnapshot {
    pub fn new(preferences: PreferenceTable, expressions: ExpressionTable) -> Self {
        Self {
            version: 0,
            loaded_at: Utc::now(),
            preferences,
            expressions,
        }
    }

    pub fn empty() -> Self {
        Self::new(PreferenceTable::default(), ExpressionTable::default())
    }

    pub(crate) fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Publication counter assigned by [`SnapshotStore`]; zero when unpublished.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn preferences(&self) -> &PreferenceTable {
        &self.preferences
    }

    pub fn expressions(&self) -> &ExpressionTable {
        &self.expressions
    }

    /// Mean preference for `(ad_type, tag)`, if the population table has it.
    pub fn preference(&self, ad_type: &str, tag: &str) -> Option<f64> {
        self.preferences.for_tag(ad_type, tag)
    }

    pub fn expression(&self, ad_type: &str, tag: &str) -> Option<f64> {
        self.expressions.get(ad_type, tag)
    }
}

pub struct SourceLoader;

impl SourceLoader {
    pub fn from_paths(paths: &SourcePaths) -> Result<DataSnapshot, LoadError> {
        let population = open(SourceKind::Preference, &paths.preference)?;
        let content = open(SourceKind::Expression, &paths.expression)?;
        Self::from_readers(population, content)
    }

    pub fn from_readers<P: Read, E: Read>(
        population: P,
        content: E,
    ) -> Result<DataSnapshot, LoadError> {
        let preferences = preference::parse_preferences(population)?;
        let expressions = expression::parse_expressions(content)?;

        info!(
            preference_columns = preferences.len(),
            expression_types = expressions.len(),
            "source tables built"
        );
        Ok(DataSnapshot::new(preferences, expressions))
    }
}

fn open(source_kind: SourceKind, path: &Path) -> Result<std::fs::File, LoadError> {
    std::fs::File::open(path).map_err(|source| LoadError::Io {
        source_kind,
        path: path.to_path_buf(),
        source,
    })
}

use adscore::error::AppError;
use adscore::scoring::{ScoringEngine, TagSelection};
use adscore::sources::{DataSnapshot, SnapshotStore};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) store: Arc<SnapshotStore>,
    pub(crate) engine: Arc<ScoringEngine>,
}

impl AppState {
    pub(crate) fn new(
        store: SnapshotStore,
        engine: ScoringEngine,
        metrics: PrometheusHandle,
    ) -> Self {
        Self {
            readiness: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(metrics),
            store: Arc::new(store),
            engine: Arc::new(engine),
        }
    }
}

/// How a handler wants the snapshot store consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoadMode {
    /// Use the live snapshot, loading only when none exists yet.
    Ensure,
    /// Re-read both sources from disk.
    Reload,
}

/// Runs a store load on the blocking pool so file I/O never stalls the runtime.
pub(crate) async fn load_snapshot(
    store: Arc<SnapshotStore>,
    mode: LoadMode,
) -> Result<Arc<DataSnapshot>, AppError> {
    let task = tokio::task::spawn_blocking(move || match mode {
        LoadMode::Ensure => store.ensure_loaded(),
        LoadMode::Reload => store.reload(),
    });

    match task.await {
        Ok(result) => result.map_err(AppError::from),
        Err(join) => Err(AppError::Io(std::io::Error::other(join))),
    }
}

/// A `DIMENSION=TAG[:WEIGHT]` selection given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SelectionArg {
    pub(crate) dimension: String,
    pub(crate) selection: TagSelection,
}

pub(crate) fn parse_selection(raw: &str) -> Result<SelectionArg, String> {
    let (dimension, rest) = raw
        .split_once('=')
        .ok_or_else(|| format!("'{raw}' must look like DIMENSION=TAG[:WEIGHT]"))?;

    let (tag, weight) = match rest.rsplit_once(':') {
        Some((tag, weight)) => {
            let weight = weight
                .trim()
                .parse::<f64>()
                .map_err(|err| format!("invalid weight '{weight}' in '{raw}' ({err})"))?;
            (tag, weight)
        }
        None => (rest, 1.0),
    };

    let dimension = dimension.trim();
    let tag = tag.trim();
    if dimension.is_empty() || tag.is_empty() {
        return Err(format!("'{raw}' must name both a dimension and a tag"));
    }

    Ok(SelectionArg {
        dimension: dimension.to_string(),
        selection: TagSelection::new(tag, weight),
    })
}

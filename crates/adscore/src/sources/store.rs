use super::{DataSnapshot, LoadError, SourceLoader, SourcePaths};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

/// Process-wide holder of the current [`DataSnapshot`].
///
/// Readers clone the `Arc` and compute against it without holding the lock, so
/// a reload never exposes a half-replaced pair of tables. A failed load leaves
/// the previous snapshot in place and records the diagnostic for status
/// endpoints.
#[derive(Debug)]
pub struct SnapshotStore {
    paths: SourcePaths,
    current: RwLock<Option<Arc<DataSnapshot>>>,
    last_error: RwLock<Option<String>>,
    versions: AtomicU64,
}

impl SnapshotStore {
    pub fn new(paths: SourcePaths) -> Self {
        Self {
            paths,
            current: RwLock::new(None),
            last_error: RwLock::new(None),
            versions: AtomicU64::new(0),
        }
    }

    pub fn paths(&self) -> &SourcePaths {
        &self.paths
    }

    pub fn current(&self) -> Option<Arc<DataSnapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.current().is_some()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reads both sources from disk and publishes them together.
    pub fn reload(&self) -> Result<Arc<DataSnapshot>, LoadError> {
        match SourceLoader::from_paths(&self.paths) {
            Ok(snapshot) => Ok(self.publish(snapshot)),
            Err(err) => {
                warn!(error = %err, "source load failed; keeping previous snapshot");
                *self
                    .last_error
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Returns the live snapshot, loading it first when none has been published.
    pub fn ensure_loaded(&self) -> Result<Arc<DataSnapshot>, LoadError> {
        match self.current() {
            Some(snapshot) => Ok(snapshot),
            None => self.reload(),
        }
    }

    /// Installs `snapshot` as the live pair of tables under a fresh version.
    pub fn publish(&self, snapshot: DataSnapshot) -> Arc<DataSnapshot> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        // Versions are assigned under the write lock so the live one only grows.
        let version = self.versions.fetch_add(1, Ordering::AcqRel) + 1;
        let snapshot = Arc::new(snapshot.with_version(version));
        *current = Some(snapshot.clone());
        drop(current);

        *self
            .last_error
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;

        info!(
            version,
            preference_columns = snapshot.preferences().len(),
            expression_types = snapshot.expressions().len(),
            "data snapshot published"
        );
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{ExpressionTable, PreferenceTable};
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::AtomicUsize;

    static DIR_SEQUENCE: AtomicUsize = AtomicUsize::new(0);

    fn scratch_dir() -> PathBuf {
        let id = DIR_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "adscore-store-{}-{id}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).expect("scratch dir");
        dir
    }

    fn write_sources(dir: &Path, pavg: &str, expression: &str) -> SourcePaths {
        let paths = SourcePaths::in_dir(dir);
        fs::write(&paths.preference, format!("短视频类–情感关系联结\n{pavg}\n"))
            .expect("write preference");
        fs::write(
            &paths.expression,
            format!("类型,情感关系联结\n短视频类,{expression}\n"),
        )
        .expect("write expression");
        paths
    }

    #[test]
    fn ensure_loaded_reads_sources_once_published() {
        let dir = scratch_dir();
        let store = SnapshotStore::new(write_sources(&dir, "0.9", "0.4"));

        assert!(!store.is_loaded());
        let first = store.ensure_loaded().expect("initial load");
        assert_eq!(first.version(), 1);
        assert_eq!(first.preference("短视频类", "情感关系联结"), Some(0.9));

        let again = store.ensure_loaded().expect("cached snapshot");
        assert!(Arc::ptr_eq(&first, &again));
    }

    #[test]
    fn failed_load_is_retryable_and_publishes_nothing() {
        let dir = scratch_dir();
        let store = SnapshotStore::new(SourcePaths::in_dir(&dir));

        store.ensure_loaded().expect_err("sources missing");
        assert!(!store.is_loaded());
        assert!(store.last_error().is_some());

        write_sources(&dir, "0.2", "0.6");
        let snapshot = store.ensure_loaded().expect("retry succeeds");
        assert_eq!(snapshot.expression("短视频类", "情感关系联结"), Some(0.6));
        assert!(store.last_error().is_none());
    }

    #[test]
    fn failed_reload_keeps_previous_snapshot() {
        let dir = scratch_dir();
        let paths = write_sources(&dir, "0.3", "0.7");
        let store = SnapshotStore::new(paths.clone());
        let before = store.reload().expect("first load");

        fs::write(&paths.expression, "").expect("truncate expression source");
        store.reload().expect_err("empty expression source");

        let after = store.current().expect("snapshot still live");
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn held_snapshots_survive_replacement() {
        let store = SnapshotStore::new(SourcePaths::in_dir(scratch_dir()));
        let held = store.publish(DataSnapshot::new(
            PreferenceTable::from_means([("短视频类–主题", 0.1)]),
            ExpressionTable::default(),
        ));
        let replaced = store.publish(DataSnapshot::empty());

        assert_eq!(held.version(), 1);
        assert_eq!(replaced.version(), 2);
        assert_eq!(held.preferences().len(), 1);
        assert!(store
            .current()
            .expect("current snapshot")
            .preferences()
            .is_empty());
    }

    #[test]
    fn concurrent_publishes_leave_the_newest_version_live() {
        let store = SnapshotStore::new(SourcePaths::in_dir(scratch_dir()));
        let publishers = 8;
        let rounds = 50;

        std::thread::scope(|scope| {
            for _ in 0..publishers {
                scope.spawn(|| {
                    for _ in 0..rounds {
                        store.publish(DataSnapshot::empty());
                    }
                });
            }
        });

        let live = store.current().expect("published snapshot");
        assert_eq!(live.version(), (publishers * rounds) as u64);
    }
}

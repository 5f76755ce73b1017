//! Module cache with cycle detection
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

/// Verdict for a path about to be imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginImport {
    /// Already imported successfully; skip.
    AlreadyLoaded,
    /// Already failed; skip.
    AlreadyFailed,
    /// Currently in flight: the import re-entered itself through a
    /// transitive include. The path has been marked failed.
    CycleDetected,
    /// Claimed for import; the caller must call [`ModuleCache::finish`].
    Ready,
}

#[derive(Default)]
struct CacheInner {
    loaded: HashSet<PathBuf>,
    failed: HashSet<PathBuf>,
    processing: HashSet<PathBuf>,
}

/// Tracks the import state of every module path for one bootstrap run.
///
/// The three sets are disjoint at every instant: a single lock guards all
/// transitions. `processing` membership is always released by `finish`,
/// or by the cycle verdict that moves the path straight to `failed`.
#[derive(Default)]
pub struct ModuleCache {
    inner: Mutex<CacheInner>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a path for import, or report why it must be skipped.
    pub fn begin(&self, path: &Path) -> BeginImport {
        let mut inner = self.inner.lock();
        if inner.loaded.contains(path) {
            return BeginImport::AlreadyLoaded;
        }
        if inner.failed.contains(path) {
            return BeginImport::AlreadyFailed;
        }
        if inner.processing.contains(path) {
            // Re-entry while in flight: record the cycle as a failure and
            // release the processing claim so the sets stay disjoint. The
            // outer frame's finish() becomes a no-op.
            inner.processing.remove(path);
            inner.failed.insert(path.to_path_buf());
            return BeginImport::CycleDetected;
        }
        inner.processing.insert(path.to_path_buf());
        BeginImport::Ready
    }

    /// Record the outcome of an import begun with [`BeginImport::Ready`].
    ///
    /// If the path is no longer in `processing` (a cycle verdict landed
    /// first), the earlier failure verdict stands.
    pub fn finish(&self, path: &Path, success: bool) {
        let mut inner = self.inner.lock();
        if !inner.processing.remove(path) {
            return;
        }
        if success {
            inner.loaded.insert(path.to_path_buf());
        } else {
            inner.failed.insert(path.to_path_buf());
        }
    }

    /// Record a failure for a path that never reached `begin` (unreadable
    /// or unsafe location).
    pub fn mark_failed(&self, path: &Path) {
        let mut inner = self.inner.lock();
        if !inner.loaded.contains(path) && !inner.processing.contains(path) {
            inner.failed.insert(path.to_path_buf());
        }
    }

    pub fn loaded_count(&self) -> usize {
        self.inner.lock().loaded.len()
    }

    pub fn failed_count(&self) -> usize {
        self.inner.lock().failed.len()
    }

    pub fn processing_count(&self) -> usize {
        self.inner.lock().processing.len()
    }

    /// Paths that failed to import, for diagnostics.
    pub fn failed_paths(&self) -> Vec<PathBuf> {
        self.inner.lock().failed.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_claims_once() {
        let cache = ModuleCache::new();
        let path = Path::new("/mods/a.yaml");

        assert_eq!(cache.begin(path), BeginImport::Ready);
        assert_eq!(cache.processing_count(), 1);

        cache.finish(path, true);
        assert_eq!(cache.processing_count(), 0);
        assert_eq!(cache.loaded_count(), 1);

        // Re-invoking is an idempotent no-op.
        assert_eq!(cache.begin(path), BeginImport::AlreadyLoaded);
    }

    #[test]
    fn test_failed_paths_skip() {
        let cache = ModuleCache::new();
        let path = Path::new("/mods/broken.yaml");

        assert_eq!(cache.begin(path), BeginImport::Ready);
        cache.finish(path, false);

        assert_eq!(cache.begin(path), BeginImport::AlreadyFailed);
        assert_eq!(cache.failed_count(), 1);
        assert_eq!(cache.loaded_count(), 0);
    }

    #[test]
    fn test_cycle_marks_failed_and_outer_finish_is_noop() {
        let cache = ModuleCache::new();
        let path = Path::new("/mods/a.yaml");

        assert_eq!(cache.begin(path), BeginImport::Ready);
        // Re-entry through a transitive include.
        assert_eq!(cache.begin(path), BeginImport::CycleDetected);
        assert_eq!(cache.failed_count(), 1);
        assert_eq!(cache.processing_count(), 0);

        // The outer frame completes; the cycle verdict stands.
        cache.finish(path, true);
        assert_eq!(cache.failed_count(), 1);
        assert_eq!(cache.loaded_count(), 0);
    }

    #[test]
    fn test_sets_stay_disjoint() {
        let cache = ModuleCache::new();
        let a = Path::new("/mods/a.yaml");
        let b = Path::new("/mods/b.yaml");

        cache.begin(a);
        cache.begin(b);
        cache.finish(a, true);
        cache.finish(b, false);

        assert_eq!(cache.loaded_count(), 1);
        assert_eq!(cache.failed_count(), 1);
        assert_eq!(cache.processing_count(), 0);
    }

    #[test]
    fn test_mark_failed_for_unreadable_path() {
        let cache = ModuleCache::new();
        let path = Path::new("/mods/missing.yaml");

        cache.mark_failed(path);
        assert_eq!(cache.failed_count(), 1);
        assert_eq!(cache.begin(path), BeginImport::AlreadyFailed);
    }
}

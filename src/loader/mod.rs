//! # Module Loader
//!
//! Imports every eligible module manifest under a root directory exactly
//! once, tolerating include cycles and isolating per-file failures. Files
//! are pushed into a shared queue drained by a bounded pool of workers in
//! fixed-size batches: imports overlap across workers while peak in-flight
//! file pressure stays bounded. Ordering across workers is not guaranteed;
//! within a worker, batches are processed FIFO.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

pub mod cache;
pub mod discovery;
pub mod manifest;

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use log::{error, info, warn};
use parking_lot::Mutex;

use crate::definitions::ActionTable;
use crate::middleware::MiddlewareTable;
use crate::registry::Registries;

pub use cache::{BeginImport, ModuleCache};

/// Imports awaited together before a worker pulls its next batch.
const BATCH_SIZE: usize = 20;

/// Outcome of a full load pass, for diagnostics. A partial load is not
/// fatal: failed counts are reported, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub failed: usize,
}

/// Loads handler modules into the registries.
pub struct ModuleLoader {
    root: PathBuf,
    cache: ModuleCache,
    registries: Arc<Registries>,
    actions: Arc<ActionTable>,
    middlewares: Arc<MiddlewareTable>,
}

impl ModuleLoader {
    pub fn new(
        root: impl Into<PathBuf>,
        registries: Arc<Registries>,
        actions: Arc<ActionTable>,
        middlewares: Arc<MiddlewareTable>,
    ) -> Self {
        let root: PathBuf = root.into();
        // Resolve once so per-file safety checks compare like with like.
        let root = root.canonicalize().unwrap_or(root);
        Self {
            root,
            cache: ModuleCache::new(),
            registries,
            actions,
            middlewares,
        }
    }

    pub fn registries(&self) -> Arc<Registries> {
        Arc::clone(&self.registries)
    }

    pub fn actions(&self) -> Arc<ActionTable> {
        Arc::clone(&self.actions)
    }

    pub fn middlewares(&self) -> Arc<MiddlewareTable> {
        Arc::clone(&self.middlewares)
    }

    pub fn cache(&self) -> &ModuleCache {
        &self.cache
    }

    /// Discover and import every module under the root.
    ///
    /// Completes when the queue is empty and all in-flight batches have
    /// resolved. Re-invoking on the same loader is a no-op for already
    /// processed paths.
    pub async fn load_all(self: &Arc<Self>) -> LoadReport {
        let files = match discovery::discover_modules(&self.root) {
            Ok(files) => files,
            Err(e) => {
                warn!(
                    "Module discovery failed for {}: {e}. Nothing to load.",
                    self.root.display()
                );
                return self.report();
            }
        };

        info!("Discovered {} module file(s) under {}", files.len(), self.root.display());

        let queue: Arc<Mutex<VecDeque<PathBuf>>> = Arc::new(Mutex::new(files.into()));
        let worker_count = std::cmp::max(1, num_cpus::get().saturating_sub(1));

        let workers: Vec<_> = (0..worker_count)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let loader = Arc::clone(self);
                tokio::spawn(async move { worker(queue, loader).await })
            })
            .collect();
        join_all(workers).await;

        let report = self.report();
        if report.failed > 0 {
            warn!("Failed to load {} module(s).", report.failed);
        }
        info!("Loaded {} module(s).", report.loaded);
        report
    }

    /// Import one module path, exactly once per loader lifetime.
    ///
    /// Re-entrant: manifest includes call back into this method, which is
    /// how cycles reach the cache's cycle verdict. Never returns an error;
    /// failures are recorded in the cache and logged.
    pub fn load_module(self: &Arc<Self>, path: PathBuf) -> BoxFuture<'static, ()> {
        let loader = Arc::clone(self);
        Box::pin(async move {
            let resolved = match path.canonicalize() {
                Ok(resolved) => resolved,
                Err(e) => {
                    error!("Failed to resolve module path {}: {e}", path.display());
                    loader.cache.mark_failed(&path);
                    return;
                }
            };

            if !discovery::is_safe_path(&resolved, &loader.root) {
                warn!(
                    "Refusing to import module outside the declared root: {}",
                    resolved.display()
                );
                loader.cache.mark_failed(&resolved);
                return;
            }

            match loader.cache.begin(&resolved) {
                BeginImport::AlreadyLoaded | BeginImport::AlreadyFailed => return,
                BeginImport::CycleDetected => {
                    warn!("Cycle detected: {}", resolved.display());
                    return;
                }
                BeginImport::Ready => {}
            }

            match manifest::import_manifest(&loader, &resolved).await {
                Ok(()) => loader.cache.finish(&resolved, true),
                Err(e) => {
                    error!("Failed to import module {}: {e}", resolved.display());
                    loader.cache.finish(&resolved, false);
                }
            }
        })
    }

    fn report(&self) -> LoadReport {
        LoadReport {
            loaded: self.cache.loaded_count(),
            failed: self.cache.failed_count(),
        }
    }
}

/// Drain the shared queue in fixed-size batches until it is empty.
async fn worker(queue: Arc<Mutex<VecDeque<PathBuf>>>, loader: Arc<ModuleLoader>) {
    loop {
        let batch: Vec<PathBuf> = {
            let mut queue = queue.lock();
            let take = std::cmp::min(BATCH_SIZE, queue.len());
            queue.drain(..take).collect()
        };
        if batch.is_empty() {
            break;
        }
        join_all(batch.into_iter().map(|file| loader.load_module(file))).await;
    }
}

//! The upward-facing surface: one engine, its loader and both compilers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::cohort::{CohortCompiler, CohortResult};
use crate::config::Settings;
use crate::dataset::Record;
use crate::engine::{
    EngineHandle, EngineManager, EngineProvider, EngineResult, EngineStatus, StatusListener,
};
use crate::loader::{LoadResult, LoadSummary, Loader};
use crate::pivot::{self, PivotError, PivotOptions, PivotRequest, PivotResult};

/// Engine lifecycle plus loading, pivoting and cohort grouping.
///
/// # Example
///
/// ```ignore
/// let session = PivotSession::new(Arc::new(SqliteProvider::new()));
/// let engine = session.initialize_engine(None).await?;
/// session.load_rows(&engine, &rows).await?;
/// let pivot = session.compile_pivot(Some(&engine), &request).await?;
/// ```
pub struct PivotSession {
    manager: EngineManager,
    loader: Loader,
    pivot_options: PivotOptions,
    cohort: CohortCompiler,
    /// Pivots in flight.
    pivoting: AtomicUsize,
}

impl PivotSession {
    pub fn new(provider: Arc<dyn EngineProvider>) -> Self {
        Self::from_settings(provider, &Settings::default())
    }

    pub fn from_settings(provider: Arc<dyn EngineProvider>, settings: &Settings) -> Self {
        Self {
            manager: EngineManager::from_settings(provider, &settings.engine),
            loader: Loader::from_settings(&settings.loader, &settings.inference),
            pivot_options: PivotOptions::from_settings(settings),
            cohort: CohortCompiler::from_settings(settings),
            pivoting: AtomicUsize::new(0),
        }
    }

    pub fn manager(&self) -> &EngineManager {
        &self.manager
    }

    pub async fn initialize_engine(
        &self,
        on_status: Option<StatusListener>,
    ) -> EngineResult<EngineHandle> {
        self.manager.initialize(on_status).await
    }

    pub fn status(&self) -> EngineStatus {
        self.manager.status()
    }

    pub fn handle(&self) -> Option<EngineHandle> {
        self.manager.handle()
    }

    pub async fn cleanup(&self, handle: Option<EngineHandle>) {
        self.manager.cleanup(handle).await
    }

    pub async fn load_rows(
        &self,
        engine: &EngineHandle,
        rows: &[Record],
    ) -> LoadResult<LoadSummary> {
        self.loader.load(engine, rows).await
    }

    pub async fn compile_pivot(
        &self,
        engine: Option<&EngineHandle>,
        request: &PivotRequest,
    ) -> Result<Option<PivotResult>, PivotError> {
        let _busy = BusyCount::enter(&self.pivoting);
        pivot::compile_pivot(engine, request, &self.pivot_options).await
    }

    /// Group `rows` using the managed engine, if it is ready.
    pub async fn group_by_cohort(
        &self,
        rows: &[Record],
        expression: Option<&str>,
    ) -> CohortResult {
        let engine = self.manager.handle();
        self.cohort
            .group_by_cohort(engine.as_ref(), rows, expression)
            .await
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    /// True while at least one pivot is running.
    pub fn is_pivoting(&self) -> bool {
        self.pivoting.load(Ordering::SeqCst) > 0
    }
}

/// Counts one in-flight operation for its lifetime.
struct BusyCount<'a>(&'a AtomicUsize);

impl<'a> BusyCount<'a> {
    fn enter(count: &'a AtomicUsize) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self(count)
    }
}

impl Drop for BusyCount<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

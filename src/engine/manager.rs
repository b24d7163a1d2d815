//! Singleton engine lifecycle: shared initialization, progress reporting,
//! timeout, teardown and retry.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, ReentrantMutex};
use tracing::{debug, error, info, warn};

use super::error::{EngineError, EngineResult};
use super::status::{download_progress, EngineState, EngineStatus};
use super::{EngineHandle, EngineProvider, ProgressReporter};
use crate::config::EngineSettings;

/// Default instantiation timeout (100 seconds).
const DEFAULT_INIT_TIMEOUT_SECS: u64 = 100;

/// Callback receiving every status change of the attempt it joined.
pub type StatusListener = Arc<dyn Fn(&EngineStatus) + Send + Sync>;

/// Wrap a closure as a [`StatusListener`].
pub fn listener(f: impl Fn(&EngineStatus) + Send + Sync + 'static) -> StatusListener {
    Arc::new(f)
}

type InitFuture = Shared<BoxFuture<'static, EngineResult<EngineHandle>>>;

#[derive(Default)]
struct ManagerState {
    status: EngineStatus,
    /// Bumped by every new attempt and by `cleanup`; updates from an older
    /// generation are ignored.
    generation: u64,
    attempt: Option<InitFuture>,
    listeners: Vec<StatusListener>,
    handle: Option<EngineHandle>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<ManagerState>,
    /// Held from a status change until its listeners have been called, so
    /// every listener sees statuses in the order they were recorded.
    /// Re-entrant so a listener may call back into the manager.
    dispatch: ReentrantMutex<()>,
}

impl Inner {
    /// Apply `change` to the state of `generation` and deliver the status it
    /// returns. Terminal statuses release the attempt's listeners.
    ///
    /// Returns `false`, without calling `change`, when `generation` is stale.
    fn transition<F>(&self, generation: u64, change: F) -> bool
    where
        F: FnOnce(&mut ManagerState) -> Option<EngineStatus>,
    {
        let _dispatch = self.dispatch.lock();
        let (status, listeners) = {
            let mut s = self.state.lock();
            if s.generation != generation {
                return false;
            }
            let Some(status) = change(&mut s) else {
                return true;
            };
            s.status = status.clone();
            let listeners = if status.is_terminal() {
                std::mem::take(&mut s.listeners)
            } else {
                s.listeners.clone()
            };
            (status, listeners)
        };
        for l in &listeners {
            l(&status);
        }
        true
    }

    fn emit(&self, generation: u64, status: EngineStatus) {
        self.transition(generation, |_| Some(status));
    }

    /// Emit a loading status only if it moves progress forward.
    fn emit_progress(&self, generation: u64, progress: u8, message: &str) {
        self.transition(generation, |s| {
            (s.status.state == EngineState::Loading && progress > s.status.progress)
                .then(|| EngineStatus::loading(progress, message))
        });
    }
}

/// Owns the one engine instance of the process and its [`EngineStatus`].
///
/// Concurrent and repeated `initialize` calls share a single attempt; a
/// failed attempt is forgotten so the next call starts over.
///
/// # Example
///
/// ```ignore
/// let manager = EngineManager::new(Arc::new(SqliteProvider::new()));
/// let handle = manager
///     .initialize(Some(listener(|s| eprintln!("{}% {}", s.progress, s.message))))
///     .await?;
/// ```
pub struct EngineManager {
    provider: Arc<dyn EngineProvider>,
    timeout: Duration,
    inner: Arc<Inner>,
}

impl EngineManager {
    pub fn new(provider: Arc<dyn EngineProvider>) -> Self {
        Self {
            provider,
            timeout: Duration::from_secs(DEFAULT_INIT_TIMEOUT_SECS),
            inner: Arc::new(Inner::default()),
        }
    }

    pub fn from_settings(provider: Arc<dyn EngineProvider>, settings: &EngineSettings) -> Self {
        Self::new(provider).with_timeout(settings.init_timeout())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Snapshot of the current status.
    pub fn status(&self) -> EngineStatus {
        self.inner.state.lock().status.clone()
    }

    /// The ready engine, if initialization has succeeded.
    pub fn handle(&self) -> Option<EngineHandle> {
        self.inner.state.lock().handle.clone()
    }

    /// Start the engine, or join the attempt already under way.
    ///
    /// The listener first receives the attempt's current status, then every
    /// later update of that attempt.
    pub async fn initialize(&self, on_status: Option<StatusListener>) -> EngineResult<EngineHandle> {
        let future = {
            let _dispatch = self.inner.dispatch.lock();
            let (future, replay) = {
                let mut state = self.inner.state.lock();
                match state.attempt.clone() {
                    Some(existing) => {
                        debug!(status = ?state.status.state, "joining existing engine initialization");
                        let replay = on_status.map(|l| {
                            if !state.status.is_terminal() {
                                state.listeners.push(l.clone());
                            }
                            (l, state.status.clone())
                        });
                        (existing, replay)
                    }
                    None => {
                        state.generation += 1;
                        let generation = state.generation;
                        state.status = EngineStatus::loading(10, "Selecting engine bundle");
                        let replay = on_status.map(|l| {
                            state.listeners.push(l.clone());
                            (l, state.status.clone())
                        });
                        info!(generation, "starting engine initialization");
                        let future = run_attempt(
                            Arc::clone(&self.provider),
                            Arc::clone(&self.inner),
                            generation,
                            self.timeout,
                        )
                        .boxed()
                        .shared();
                        state.attempt = Some(future.clone());
                        (future, replay)
                    }
                }
            };
            if let Some((l, status)) = replay {
                l(&status);
            }
            future
        };

        future.await
    }

    /// Tear down the engine and reset to `Idle`.
    ///
    /// Terminates `handle`, or the managed handle when none is given.
    /// Termination errors are logged, never returned. Any attempt still in
    /// flight is invalidated.
    pub async fn cleanup(&self, handle: Option<EngineHandle>) {
        let target = {
            let _dispatch = self.inner.dispatch.lock();
            let (target, dropped_listeners) = {
                let mut state = self.inner.state.lock();
                state.generation += 1;
                state.attempt = None;
                state.status = EngineStatus::idle();
                let managed = state.handle.take();
                (handle.or(managed), std::mem::take(&mut state.listeners))
            };
            drop(dropped_listeners);
            target
        };

        if let Some(engine) = target {
            match engine.terminate().await {
                Ok(()) => info!("engine terminated"),
                Err(err) => warn!(error = %err, "engine termination failed"),
            }
        }
    }
}

async fn run_attempt(
    provider: Arc<dyn EngineProvider>,
    inner: Arc<Inner>,
    generation: u64,
    timeout: Duration,
) -> EngineResult<EngineHandle> {
    match start_engine(provider.as_ref(), &inner, generation, timeout).await {
        Ok(engine) => {
            let current = inner.transition(generation, |s| {
                s.handle = Some(Arc::clone(&engine));
                Some(EngineStatus::success())
            });
            if !current {
                debug!(generation, "engine initialized after cleanup; terminating it");
                if let Err(err) = engine.terminate().await {
                    warn!(error = %err, "failed to terminate stale engine");
                }
                return Err(EngineError::Terminated);
            }
            info!(generation, "engine ready");
            Ok(engine)
        }
        Err(err) => {
            error!(generation, error = %err, "engine initialization failed");
            inner.transition(generation, |s| {
                s.attempt = None;
                Some(EngineStatus::error(err.to_string()))
            });
            Err(err)
        }
    }
}

async fn start_engine(
    provider: &dyn EngineProvider,
    inner: &Arc<Inner>,
    generation: u64,
    timeout: Duration,
) -> EngineResult<EngineHandle> {
    let bundle = provider.select_bundle().await?;
    inner.emit(
        generation,
        EngineStatus::loading(20, format!("Selected {} {}", bundle.name, bundle.version)),
    );

    inner.emit(generation, EngineStatus::loading(30, "Creating execution context"));
    provider.create_context(&bundle).await?;
    inner.emit(generation, EngineStatus::loading(40, "Execution context ready"));

    inner.emit(generation, EngineStatus::loading(50, "Loading engine"));
    let progress_inner = Arc::clone(inner);
    let reporter = ProgressReporter::new(move |loaded, total| {
        if let Some(pct) = download_progress(loaded, total) {
            progress_inner.emit_progress(generation, pct, "Loading engine");
        }
    });

    match tokio::time::timeout(timeout, provider.instantiate(&bundle, reporter)).await {
        Ok(result) => result,
        Err(_) => Err(EngineError::Timeout(timeout)),
    }
}

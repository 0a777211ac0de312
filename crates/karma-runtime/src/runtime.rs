//! The message loop.
//!
//! [`KarmaRuntime`] owns the store and the dispatcher. A transport feeds it
//! [`InboundMessage`]s through an mpsc channel; every message is dispatched
//! on its own task, so messages interleave while the handlers for any one
//! message run strictly in order.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use karma_runtime::KarmaRuntime;
//!
//! let runtime = KarmaRuntime::builder()
//!     .config_file("karma.toml")
//!     .build(transport)?;
//!
//! runtime.refresh_roster(&roster).await?;
//! runtime.run(inbound_rx).await?;
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

use karma_core::{
    BoxedTransport, Clock, InboundMessage, RandomPicker, RosterEntry, SystemClock, TemplatePicker,
};
use karma_framework::{Dispatched, Dispatcher};
use karma_plugins::{Echo, PlusPlus, Snark, echo, plusplus, snark};
use karma_store::SqliteStore;

use crate::config::{ConfigError, ConfigLoader, KarmaConfig, validate_config};
use crate::error::RuntimeResult;
use crate::logging;

/// Dispatch counters since the runtime was built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub handled: u64,
    pub unhandled: u64,
    pub aborted: u64,
}

#[derive(Debug, Default)]
struct Counters {
    handled: AtomicU64,
    unhandled: AtomicU64,
    aborted: AtomicU64,
}

impl Counters {
    fn record(&self, result: &Dispatched) {
        let counter = match result {
            Dispatched::Handled { .. } => &self.handled,
            Dispatched::Unhandled => &self.unhandled,
            Dispatched::Aborted => &self.aborted,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> RuntimeStats {
        RuntimeStats {
            handled: self.handled.load(Ordering::Relaxed),
            unhandled: self.unhandled.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
        }
    }
}

/// The assembled bot: store, handler chain and message loop.
pub struct KarmaRuntime {
    config: KarmaConfig,
    store: SqliteStore,
    dispatcher: Arc<Dispatcher>,
    counters: Arc<Counters>,
    shutdown: CancellationToken,
}

impl KarmaRuntime {
    /// Creates a runtime builder that loads configuration from files and the
    /// environment.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Assembles a runtime from an already-loaded configuration.
    ///
    /// Validates the configuration, initializes logging, opens the store and
    /// registers the handlers listed in `plugins.order`.
    pub fn from_config(config: &KarmaConfig, transport: BoxedTransport) -> RuntimeResult<Self> {
        Self::assemble(
            config,
            transport,
            Arc::new(SystemClock),
            Arc::new(RandomPicker::new()),
        )
    }

    fn assemble(
        config: &KarmaConfig,
        transport: BoxedTransport,
        clock: Arc<dyn Clock>,
        picker: Arc<dyn TemplatePicker>,
    ) -> RuntimeResult<Self> {
        validate_config(config)?;
        logging::init_from_config(&config.logging);

        let own_user_id = config
            .bot
            .own_user_id()
            .ok_or_else(|| ConfigError::missing_field("bot.user_id"))?;

        let store = if config.store.is_in_memory() {
            SqliteStore::open_in_memory()?
        } else {
            SqliteStore::open(&config.store.path)?
        };

        let mut dispatcher = Dispatcher::new(Arc::new(store.clone()), transport, own_user_id);
        for name in &config.plugins.order {
            match name.as_str() {
                plusplus::NAME => dispatcher.register(
                    PlusPlus::new(Arc::new(store.clone()), Arc::new(store.clone()))
                        .with_clock(Arc::clone(&clock))
                        .with_picker(Arc::clone(&picker))
                        .with_throttle_secs(i64::from(config.plugins.plusplus.throttle_secs)),
                ),
                echo::NAME => dispatcher.register(Echo::new()),
                snark::NAME => dispatcher.register(Snark::with_picker(Arc::clone(&picker))),
                other => return Err(ConfigError::UnknownPlugin(other.to_string()).into()),
            }
        }

        info!(
            own_user_id,
            store = %config.store.path,
            handlers = ?dispatcher.handler_names(),
            "Runtime initialized from configuration"
        );

        Ok(Self {
            config: config.clone(),
            store,
            dispatcher: Arc::new(dispatcher),
            counters: Arc::new(Counters::default()),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &KarmaConfig {
        &self.config
    }

    /// The store backing the directory and the scores.
    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn stats(&self) -> RuntimeStats {
        self.counters.snapshot()
    }

    /// A token that stops [`run`](Self::run) when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Upserts roster entries into the user directory.
    pub async fn refresh_roster(&self, roster: &[RosterEntry]) -> RuntimeResult<usize> {
        let count = self.store.refresh_roster(roster).await?;
        info!(count, "Roster refreshed");
        Ok(count)
    }

    /// Dispatches one message on the current task.
    pub async fn dispatch(&self, message: InboundMessage) -> Dispatched {
        let result = self.dispatcher.dispatch(message).await;
        self.counters.record(&result);
        result
    }

    /// Runs until Ctrl+C / SIGTERM, until the shutdown token is cancelled, or
    /// until every sender of `inbound` is dropped.
    pub async fn run(&self, inbound: mpsc::Receiver<InboundMessage>) -> RuntimeResult<()> {
        info!("karma is now running. Press Ctrl+C to stop.");
        self.run_until(inbound, wait_for_shutdown()).await
    }

    /// Like [`run`](Self::run), with a custom shutdown future instead of OS
    /// signals.
    ///
    /// In-flight dispatches are awaited before returning.
    pub async fn run_until<F>(
        &self,
        mut inbound: mpsc::Receiver<InboundMessage>,
        shutdown: F,
    ) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let tracker = TaskTracker::new();

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown token cancelled");
                    break;
                }
                message = inbound.recv() => {
                    let Some(message) = message else {
                        info!("Inbound channel closed");
                        break;
                    };
                    let dispatcher = Arc::clone(&self.dispatcher);
                    let counters = Arc::clone(&self.counters);
                    tracker.spawn(async move {
                        let result = dispatcher.dispatch(message).await;
                        counters.record(&result);
                    });
                }
            }
        }

        tracker.close();
        debug!(pending = tracker.len(), "Waiting for in-flight dispatches");
        tracker.wait().await;

        let stats = self.stats();
        info!(
            handled = stats.handled,
            unhandled = stats.unhandled,
            aborted = stats.aborted,
            "Runtime stopped"
        );
        Ok(())
    }
}

impl std::fmt::Debug for KarmaRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KarmaRuntime")
            .field("dispatcher", &self.dispatcher)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// Waits for Ctrl+C, or SIGTERM on unix.
///
/// If a handler cannot be installed that signal is simply never observed.
async fn wait_for_shutdown() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`KarmaRuntime`] with layered configuration.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    clock: Arc<dyn Clock>,
    picker: Arc<dyn TemplatePicker>,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
            clock: Arc::new(SystemClock),
            picker: Arc::new(RandomPicker::new()),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: KarmaConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Replaces the clock the award throttle reads.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the template picker used for replies.
    pub fn picker(mut self, picker: Arc<dyn TemplatePicker>) -> Self {
        self.picker = picker;
        self
    }

    /// Loads configuration and assembles the runtime.
    pub fn build(self, transport: BoxedTransport) -> RuntimeResult<KarmaRuntime> {
        let config = self.config_loader.load()?;
        KarmaRuntime::assemble(&config, transport, self.clock, self.picker)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

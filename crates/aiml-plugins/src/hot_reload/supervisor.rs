//! Hot-reload supervisor
//!
//! Owns the platform file watcher and the background watch thread, and wires
//! accepted changes through the [`ReloadOrderer`] to an optional observer.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use aiml_kernel::plugin::HotReloadConfig;

use super::error::{ReloadError, panic_message};
use super::orderer::ReloadOrderer;
use super::watcher::{ChangeCallback, DirectoryWatcher};

/// Called with the plugin id after every successful reload
pub type ReloadObserver = Arc<dyn Fn(&str) + Send + Sync>;

type FsEvents = Receiver<notify::Result<Event>>;

const WATCH_THREAD_NAME: &str = "aiml-plugin-watch";

/// A started watch thread
struct Running {
    shutdown_tx: Sender<()>,
    /// Hands the dispatcher back on exit so debounce tokens survive restarts
    handle: JoinHandle<(DirectoryWatcher, FsEvents)>,
}

/// Watches a plugins root and reloads plugins as their sources change
pub struct HotReloadSupervisor {
    root: PathBuf,
    config: HotReloadConfig,
    fs_watcher: RecommendedWatcher,
    /// Dispatcher and event queue while stopped
    idle: Option<(DirectoryWatcher, FsEvents)>,
    running: Option<Running>,
}

impl HotReloadSupervisor {
    /// Create a stopped supervisor for `root`.
    ///
    /// Fails with [`ReloadError::WatchUnavailable`] if the platform watcher
    /// cannot be created.
    pub fn new(
        root: impl AsRef<Path>,
        config: HotReloadConfig,
        orderer: Arc<ReloadOrderer>,
        observer: Option<ReloadObserver>,
    ) -> Result<Self, ReloadError> {
        let root = root.as_ref();
        // Event paths are reported in canonical form on some platforms.
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

        let (fs_tx, fs_rx) = unbounded();
        let fs_watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| {
                let _ = fs_tx.send(result);
            },
            notify::Config::default().with_poll_interval(config.poll_interval()),
        )
        .map_err(|e| ReloadError::WatchUnavailable(e.to_string()))?;

        let on_change: ChangeCallback = Box::new(move |plugin_id: &str| {
            if !orderer.reload(plugin_id) {
                return Err(ReloadError::ReloadFailed(plugin_id.to_string()));
            }
            if let Some(observer) = &observer {
                observer(plugin_id);
            }
            Ok(())
        });
        let dispatcher = DirectoryWatcher::new(root.clone(), &config, on_change);

        Ok(Self {
            root,
            config,
            fs_watcher,
            idle: Some((dispatcher, fs_rx)),
            running: None,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &HotReloadConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// When a change for `plugin_id` was last accepted. Only known while the
    /// supervisor is stopped.
    pub fn last_accepted(&self, plugin_id: &str) -> Option<Instant> {
        self.idle
            .as_ref()
            .and_then(|(dispatcher, _)| dispatcher.tokens().last_accepted(plugin_id))
    }

    /// Start watching the plugins root on a background thread.
    pub fn start(&mut self) -> Result<(), ReloadError> {
        if self.running.is_some() {
            return Err(ReloadError::AlreadyRunning);
        }

        let (mut dispatcher, events) = self
            .idle
            .take()
            .ok_or_else(|| ReloadError::Internal("watch state lost".to_string()))?;

        // Changes made while stopped are not replayed.
        let stale = events.try_iter().count();
        if stale > 0 {
            debug!("Discarded {} events queued while stopped", stale);
        }

        if let Err(e) = self.fs_watcher.watch(&self.root, RecursiveMode::Recursive) {
            self.idle = Some((dispatcher, events));
            return Err(ReloadError::WatchError(e.to_string()));
        }

        let (shutdown_tx, shutdown_rx) = bounded(1);
        let handle = thread::Builder::new()
            .name(WATCH_THREAD_NAME.to_string())
            .spawn(move || {
                dispatcher.run(&events, &shutdown_rx);
                (dispatcher, events)
            });

        let handle = match handle {
            Ok(handle) => handle,
            Err(e) => {
                let _ = self.fs_watcher.unwatch(&self.root);
                return Err(ReloadError::Internal(format!(
                    "failed to spawn watch thread: {e}"
                )));
            }
        };

        self.running = Some(Running {
            shutdown_tx,
            handle,
        });
        info!("Hot reload started for {:?}", self.root);
        Ok(())
    }

    /// Stop watching and wait for the watch thread, including any reload in
    /// flight. Does nothing if not running.
    pub fn stop(&mut self) -> Result<(), ReloadError> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        if let Err(e) = self.fs_watcher.unwatch(&self.root) {
            debug!("Unwatch of {:?} failed: {}", self.root, e);
        }
        let _ = running.shutdown_tx.send(());

        match running.handle.join() {
            Ok(state) => {
                self.idle = Some(state);
                info!("Hot reload stopped for {:?}", self.root);
                Ok(())
            }
            Err(payload) => Err(ReloadError::ThreadPanicked(panic_message(payload.as_ref()))),
        }
    }

    /// Start, returning a guard that stops the supervisor when dropped.
    pub fn start_scoped(&mut self) -> Result<HotReloadGuard<'_>, ReloadError> {
        self.start()?;
        Ok(HotReloadGuard { supervisor: self })
    }

    /// Run `f` with hot reload active.
    pub fn run_scoped<T>(&mut self, f: impl FnOnce() -> T) -> Result<T, ReloadError> {
        let guard = self.start_scoped()?;
        let output = f();
        guard.stop()?;
        Ok(output)
    }
}

impl Drop for HotReloadSupervisor {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Hot reload did not stop cleanly: {}", e);
        }
    }
}

/// Keeps a supervisor running for the guard's lifetime
pub struct HotReloadGuard<'a> {
    supervisor: &'a mut HotReloadSupervisor,
}

impl HotReloadGuard<'_> {
    pub fn supervisor(&self) -> &HotReloadSupervisor {
        self.supervisor
    }

    /// Stop now and report how it went.
    pub fn stop(self) -> Result<(), ReloadError> {
        self.supervisor.stop()
    }
}

impl Drop for HotReloadGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.supervisor.stop() {
            warn!("Hot reload did not stop cleanly: {}", e);
        }
    }
}

/// Hot reload, if this platform supports it
pub enum HotReload {
    Available(HotReloadSupervisor),
    Unavailable { reason: String },
}

impl HotReload {
    pub fn is_available(&self) -> bool {
        matches!(self, HotReload::Available(_))
    }

    pub fn into_option(self) -> Option<HotReloadSupervisor> {
        match self {
            HotReload::Available(supervisor) => Some(supervisor),
            HotReload::Unavailable { .. } => None,
        }
    }
}

/// Create a supervisor, degrading to [`HotReload::Unavailable`] instead of
/// failing.
pub fn create_hot_reloader(
    root: impl AsRef<Path>,
    config: HotReloadConfig,
    orderer: Arc<ReloadOrderer>,
    observer: Option<ReloadObserver>,
) -> HotReload {
    match HotReloadSupervisor::new(root, config, orderer, observer) {
        Ok(supervisor) => HotReload::Available(supervisor),
        Err(e) => {
            warn!("Hot reload unavailable: {}", e);
            HotReload::Unavailable {
                reason: e.to_string(),
            }
        }
    }
}

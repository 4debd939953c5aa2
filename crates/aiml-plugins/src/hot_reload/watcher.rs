//! Plugin directory watcher
//!
//! Maps file system events under the plugins root to plugin ids, debounces
//! them per plugin and hands accepted changes to a callback.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, select};
use notify::{Event, EventKind, event::ModifyKind};
use tracing::{debug, error, info, trace, warn};

use aiml_kernel::plugin::HotReloadConfig;

use super::error::{ReloadError, panic_message};

/// Invoked with the plugin id of every accepted change
pub type ChangeCallback = Box<dyn FnMut(&str) -> Result<(), ReloadError> + Send>;

/// Per-plugin debounce tokens
#[derive(Debug, Clone)]
pub struct ReloadTokens {
    last: HashMap<String, Instant>,
    window: Duration,
}

impl ReloadTokens {
    pub fn new(window: Duration) -> Self {
        Self {
            last: HashMap::new(),
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Accept a change for `plugin_id` at `now` unless one was accepted less
    /// than a window ago. Accepting refreshes the token.
    pub fn try_accept(&mut self, plugin_id: &str, now: Instant) -> bool {
        if let Some(last) = self.last.get(plugin_id) {
            if now.saturating_duration_since(*last) < self.window {
                return false;
            }
        }
        self.last.insert(plugin_id.to_string(), now);
        true
    }

    /// When a change for `plugin_id` was last accepted
    pub fn last_accepted(&self, plugin_id: &str) -> Option<Instant> {
        self.last.get(plugin_id).copied()
    }
}

/// Plugin id owning `path`: the first path segment below `root`.
///
/// Files directly in the root, the root itself and paths outside it have no
/// owner.
pub fn plugin_id_for(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut components = relative.components();

    let first = match components.next()? {
        Component::Normal(segment) => segment.to_str()?,
        _ => return None,
    };
    components.next()?;

    Some(first.to_string())
}

/// Debouncing dispatcher for changes under one plugins root
pub struct DirectoryWatcher {
    root: PathBuf,
    extension: String,
    tokens: ReloadTokens,
    on_change: ChangeCallback,
}

impl DirectoryWatcher {
    pub fn new(root: impl Into<PathBuf>, config: &HotReloadConfig, on_change: ChangeCallback) -> Self {
        Self {
            root: root.into(),
            extension: config.source_extension.trim_start_matches('.').to_string(),
            tokens: ReloadTokens::new(config.debounce()),
            on_change,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tokens(&self) -> &ReloadTokens {
        &self.tokens
    }

    /// Plugin id for a changed path, or `None` if the change is irrelevant.
    pub fn plugin_for_path(&self, path: &Path) -> Option<String> {
        if path.is_dir() {
            return None;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
            return None;
        }

        let plugin_id = plugin_id_for(&self.root, path);
        if plugin_id.is_none() {
            trace!("No plugin owns {:?}", path);
        }
        plugin_id
    }

    /// Handle a change to `path` now. Returns the plugin id if the change was
    /// accepted.
    pub fn handle_change(&mut self, path: &Path) -> Option<String> {
        self.handle_change_at(path, Instant::now())
    }

    /// Handle a change to `path` observed at `now`.
    pub fn handle_change_at(&mut self, path: &Path, now: Instant) -> Option<String> {
        let plugin_id = self.plugin_for_path(path)?;

        if !self.tokens.try_accept(&plugin_id, now) {
            debug!("Debounced change to plugin {} ({:?})", plugin_id, path);
            return None;
        }

        info!("Plugin {} changed: {:?}", plugin_id, path);
        let on_change = &mut self.on_change;
        match catch_unwind(AssertUnwindSafe(|| on_change(&plugin_id))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Change handler for plugin {} failed: {}", plugin_id, e),
            Err(payload) => error!(
                "Change handler for plugin {} panicked: {}",
                plugin_id,
                panic_message(payload.as_ref())
            ),
        }

        Some(plugin_id)
    }

    /// Handle a raw notify event. Returns the plugin ids accepted from it.
    pub fn handle_event(&mut self, event: &Event) -> Vec<String> {
        if !is_source_change(&event.kind) {
            trace!("Ignoring event {:?}", event.kind);
            return Vec::new();
        }

        event
            .paths
            .iter()
            .filter_map(|path| self.handle_change(path))
            .collect()
    }

    /// Dispatch events until `shutdown` fires or the event source closes.
    pub fn run(&mut self, events: &Receiver<notify::Result<Event>>, shutdown: &Receiver<()>) {
        debug!("Watch loop started for {:?}", self.root);

        loop {
            select! {
                recv(events) -> msg => match msg {
                    Ok(Ok(event)) => {
                        self.handle_event(&event);
                    }
                    Ok(Err(e)) => warn!("Watch error under {:?}: {}", self.root, e),
                    Err(_) => {
                        debug!("Event source closed");
                        break;
                    }
                },
                recv(shutdown) -> _ => break,
            }
        }

        debug!("Watch loop stopped for {:?}", self.root);
    }
}

/// Content writes and file creations. Editors that save atomically replace
/// the file, which shows up as a create.
fn is_source_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    }
}

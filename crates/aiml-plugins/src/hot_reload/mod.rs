//! Development hot reload
//!
//! Re-executes a plugin's code units in place when its source files change:
//! - `units`: versioned table of loaded units
//! - `orderer`: dependency-safe reload order per plugin
//! - `watcher`: path-to-plugin mapping and per-plugin debounce
//! - `supervisor`: file watcher and background thread lifecycle

mod error;
mod orderer;
mod supervisor;
mod units;
mod watcher;

pub use error::ReloadError;
pub use orderer::ReloadOrderer;
pub use supervisor::{
    HotReload, HotReloadGuard, HotReloadSupervisor, ReloadObserver, create_hot_reloader,
};
pub use units::UnitRegistry;
pub use watcher::{ChangeCallback, DirectoryWatcher, ReloadTokens, plugin_id_for};

// Re-export kernel hot reload definitions
pub use aiml_kernel::plugin::{HotReloadConfig, LoadedUnits, SubUnit, UnitBuilder, UnitHandle};

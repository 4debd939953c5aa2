//! Reload ordering
//!
//! Re-executes a plugin's loaded units in dependency-safe order: the
//! conventional sub-units first, the aggregating unit last, so the aggregate
//! picks up freshly built sub-units.

use parking_lot::Mutex;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::{debug, error, info};

use aiml_kernel::plugin::{HotReloadConfig, LoadedUnits, PluginError, SubUnit, unit_address};

use super::error::{ReloadError, panic_message};

/// Reloads plugin units against a [`LoadedUnits`] table
pub struct ReloadOrderer {
    namespace: String,
    units: Arc<dyn LoadedUnits>,
    /// Serializes reloads issued through this orderer
    reload_lock: Mutex<()>,
}

impl ReloadOrderer {
    /// Create an orderer using the default unit namespace
    pub fn new(units: Arc<dyn LoadedUnits>) -> Self {
        Self::with_namespace(units, &HotReloadConfig::default().unit_namespace)
    }

    /// Create an orderer for units under `namespace`
    pub fn with_namespace(units: Arc<dyn LoadedUnits>, namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            units,
            reload_lock: Mutex::new(()),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Unit addresses that a reload of `plugin_id` will visit, in order.
    pub fn reload_plan(&self, plugin_id: &str) -> Vec<String> {
        let mut plan = Vec::with_capacity(SubUnit::ALL.len() + 1);
        plan.push(unit_address(&self.namespace, plugin_id, None));
        plan.extend(
            SubUnit::ALL
                .iter()
                .map(|sub| unit_address(&self.namespace, plugin_id, Some(*sub))),
        );
        plan.reverse();
        plan
    }

    /// Re-execute every loaded unit of `plugin_id` and return how many were
    /// refreshed.
    ///
    /// The first failure aborts the reload. Units refreshed before it stay
    /// refreshed.
    pub fn try_reload(&self, plugin_id: &str) -> Result<usize, ReloadError> {
        let _guard = self.reload_lock.lock();
        let mut refreshed = 0;

        for address in self.reload_plan(plugin_id) {
            if !self.units.is_loaded(&address) {
                debug!("Skipping unit {} (not loaded)", address);
                continue;
            }

            let result = catch_unwind(AssertUnwindSafe(|| self.units.reexecute(&address)))
                .unwrap_or_else(|payload| {
                    Err(PluginError::BuildPanicked {
                        address: address.clone(),
                        message: panic_message(payload.as_ref()),
                    })
                });

            if let Err(source) = result {
                return Err(ReloadError::UnitFailed {
                    plugin_id: plugin_id.to_string(),
                    address,
                    source,
                });
            }

            debug!("Reloaded unit {}", address);
            refreshed += 1;
        }

        Ok(refreshed)
    }

    /// Reload `plugin_id`, logging any failure. Returns true on success.
    pub fn reload(&self, plugin_id: &str) -> bool {
        match self.try_reload(plugin_id) {
            Ok(count) => {
                info!("Reloaded plugin {} ({} units)", plugin_id, count);
                true
            }
            Err(e) => {
                error!("Failed to reload plugin {}: {}", plugin_id, e);
                false
            }
        }
    }
}

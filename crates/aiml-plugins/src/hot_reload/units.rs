//! Loaded-unit registry
//!
//! Maps unit addresses to their currently active implementation. Every unit
//! sits behind a versioned slot: re-execution builds the new implementation
//! first and then swaps it in, so readers only ever see a complete old or a
//! complete new implementation.

use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

use aiml_kernel::plugin::{LoadedUnits, PluginError, PluginResult, UnitBuilder, UnitHandle};

use super::error::panic_message;

/// One loaded unit
struct UnitSlot {
    builder: Arc<dyn UnitBuilder>,
    current: RwLock<UnitHandle>,
    /// Bumped after every successful re-execution
    generation: AtomicU64,
    /// Serializes re-executions of this unit
    reload_lock: Mutex<()>,
}

/// Process-wide table of loaded units
#[derive(Default)]
pub struct UnitRegistry {
    slots: RwLock<HashMap<String, Arc<UnitSlot>>>,
}

impl UnitRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit and build its first implementation.
    pub fn register(&self, address: &str, builder: Arc<dyn UnitBuilder>) -> PluginResult<()> {
        if self.is_loaded(address) {
            return Err(PluginError::AlreadyLoaded(address.to_string()));
        }

        let handle = build_contained(address, builder.as_ref())?;
        let slot = Arc::new(UnitSlot {
            builder,
            current: RwLock::new(handle),
            generation: AtomicU64::new(0),
            reload_lock: Mutex::new(()),
        });

        let mut slots = self.slots.write();
        if slots.contains_key(address) {
            return Err(PluginError::AlreadyLoaded(address.to_string()));
        }
        slots.insert(address.to_string(), slot);
        info!("Loaded unit: {}", address);
        Ok(())
    }

    /// Drop a unit. Returns false if it was not registered.
    pub fn unregister(&self, address: &str) -> bool {
        let removed = self.slots.write().remove(address).is_some();
        if removed {
            info!("Unloaded unit: {}", address);
        }
        removed
    }

    /// Current implementation of a unit
    pub fn current(&self, address: &str) -> Option<UnitHandle> {
        let slot = self.slot(address)?;
        let handle = slot.current.read().clone();
        Some(handle)
    }

    /// Current implementation of a unit, downcast to its concrete type
    pub fn current_as<T: Any + Send + Sync>(&self, address: &str) -> Option<Arc<T>> {
        self.current(address)?.downcast::<T>().ok()
    }

    /// How many times a unit has been successfully re-executed
    pub fn generation(&self, address: &str) -> Option<u64> {
        self.slot(address)
            .map(|slot| slot.generation.load(Ordering::Acquire))
    }

    /// Addresses of all loaded units, sorted
    pub fn addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self.slots.read().keys().cloned().collect();
        addresses.sort();
        addresses
    }

    fn slot(&self, address: &str) -> Option<Arc<UnitSlot>> {
        self.slots.read().get(address).cloned()
    }
}

impl LoadedUnits for UnitRegistry {
    fn is_loaded(&self, address: &str) -> bool {
        self.slots.read().contains_key(address)
    }

    fn reexecute(&self, address: &str) -> PluginResult<()> {
        let slot = self
            .slot(address)
            .ok_or_else(|| PluginError::NotLoaded(address.to_string()))?;

        let _guard = slot.reload_lock.lock();
        let handle = build_contained(address, slot.builder.as_ref())?;
        *slot.current.write() = handle;
        let generation = slot.generation.fetch_add(1, Ordering::AcqRel) + 1;

        debug!("Re-executed unit {} (generation {})", address, generation);
        Ok(())
    }
}

/// Run a builder, turning a panic into a [`PluginError::BuildPanicked`].
fn build_contained(address: &str, builder: &dyn UnitBuilder) -> PluginResult<UnitHandle> {
    match catch_unwind(AssertUnwindSafe(|| builder.build())) {
        Ok(result) => result,
        Err(payload) => Err(PluginError::BuildPanicked {
            address: address.to_string(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

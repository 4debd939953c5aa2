//! Plugin registry
//!
//! Holds plugin metadata and decides which plugins are effectively enabled.
//! This is the only place enablement is computed: a locked plugin is always
//! enabled, whatever the client sent.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

use aiml_kernel::plugin::{PluginMetadata, ResolvedPluginView};

use crate::codec::decode_enabled;

/// Plugin ids the user explicitly turned on
///
/// Order is irrelevant and duplicates collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnabledSet(BTreeSet<String>);

impl EnabledSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, plugin_id: &str) -> bool {
        self.0.contains(plugin_id)
    }

    pub fn insert(&mut self, plugin_id: impl Into<String>) -> bool {
        self.0.insert(plugin_id.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for EnabledSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Registry of known plugins
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    /// Entries with a usable id, first occurrence of each id, input order
    plugins: Vec<PluginMetadata>,
}

impl PluginRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a metadata source. Entries without an id are dropped and
    /// only the first entry of a duplicated id is kept.
    pub fn from_metadata<I>(metadata: I) -> Self
    where
        I: IntoIterator<Item = PluginMetadata>,
    {
        let mut registry = Self::new();
        for entry in metadata {
            registry.register(entry);
        }
        registry
    }

    /// Build from an optional metadata source; `None` gives an empty registry.
    pub fn from_optional(metadata: Option<Vec<PluginMetadata>>) -> Self {
        metadata.map(Self::from_metadata).unwrap_or_default()
    }

    /// Register a plugin. Returns false if the entry was dropped.
    pub fn register(&mut self, metadata: PluginMetadata) -> bool {
        if !metadata.has_id() {
            debug!("Dropping plugin metadata without an id: {:?}", metadata.name);
            return false;
        }
        if self.contains(&metadata.id) {
            warn!("Duplicate plugin id ignored: {}", metadata.id);
            return false;
        }
        self.plugins.push(metadata);
        true
    }

    pub fn contains(&self, plugin_id: &str) -> bool {
        self.get(plugin_id).is_some()
    }

    pub fn get(&self, plugin_id: &str) -> Option<&PluginMetadata> {
        self.plugins.iter().find(|p| p.id == plugin_id)
    }

    /// Registered plugins, in registration order
    pub fn plugins(&self) -> &[PluginMetadata] {
        &self.plugins
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Ids of plugins that can never be disabled
    pub fn locked_ids(&self) -> BTreeSet<String> {
        self.plugins
            .iter()
            .filter(|p| p.locked)
            .map(|p| p.id.clone())
            .collect()
    }

    /// Whether `plugin_id` is effectively enabled: explicitly enabled, or
    /// locked. A missing enabled set counts as empty.
    pub fn is_enabled(&self, plugin_id: &str, enabled: Option<&EnabledSet>) -> bool {
        if enabled.is_some_and(|set| set.contains(plugin_id)) {
            return true;
        }
        self.get(plugin_id).is_some_and(|p| p.locked)
    }

    /// Merge metadata with effective enablement, preserving order and every
    /// descriptive field.
    pub fn resolve(&self, enabled: Option<&EnabledSet>) -> Vec<ResolvedPluginView> {
        self.plugins
            .iter()
            .map(|p| ResolvedPluginView::new(p.clone(), self.is_enabled(&p.id, enabled)))
            .collect()
    }

    /// Plugins enabled when the client sent no preference: everything marked
    /// `default_enabled` plus every locked plugin.
    pub fn default_enabled_ids(&self) -> Vec<String> {
        self.plugins
            .iter()
            .filter(|p| p.default_enabled || p.locked)
            .map(|p| p.id.clone())
            .collect()
    }

    /// Effective enabled ids in registry order.
    ///
    /// Without a preference the defaults apply. Locked plugins are always
    /// included; ids the registry does not know are dropped.
    pub fn normalize_enabled(&self, enabled: Option<&EnabledSet>) -> Vec<String> {
        let chosen: HashSet<&str> = match enabled {
            Some(set) => set.iter().collect(),
            None => self
                .plugins
                .iter()
                .filter(|p| p.default_enabled)
                .map(|p| p.id.as_str())
                .collect(),
        };

        self.plugins
            .iter()
            .filter(|p| p.locked || chosen.contains(p.id.as_str()))
            .map(|p| p.id.clone())
            .collect()
    }

    /// Effective enabled ids for a client token. An absent or corrupt token
    /// falls back to the defaults.
    pub fn enabled_from_token(&self, token: Option<&str>) -> Vec<String> {
        let enabled = decode_enabled(token).map(EnabledSet::from_iter);
        self.normalize_enabled(enabled.as_ref())
    }
}

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

pub mod error;
pub mod marketplace;

pub use error::PluginError;
pub use marketplace::{InstalledPlugin, Marketplace, MarketplaceEntry, MarketplaceOutcome};

/// Plugin operation result type using the typed [`PluginError`].
pub type PluginResult<T> = Result<T, PluginError>;

// ============================================================================
// 插件元数据 (Plugin metadata)
// ============================================================================

/// 插件元数据
/// Plugin metadata
///
/// 除 `id`、`locked`、`default_enabled` 外，其余字段对生命周期管理器是不透明的，
/// 会被原样传递给 UI。
/// Apart from `id`, `locked` and `default_enabled`, every field is opaque to
/// the lifecycle manager and is passed through to the UI unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginMetadata {
    /// 插件唯一标识（为空表示缺失）
    /// Unique plugin identifier (empty means missing)
    #[serde(default)]
    pub id: String,
    /// 插件名称
    /// Plugin name
    #[serde(default)]
    pub name: String,
    /// 插件版本
    /// Plugin version
    #[serde(default = "default_version")]
    pub version: String,
    /// 插件描述
    /// Plugin description
    #[serde(default)]
    pub description: String,
    /// 锁定的插件永远不能被禁用
    /// A locked plugin can never be disabled
    #[serde(default)]
    pub locked: bool,
    /// 默认是否启用
    /// Whether the plugin is enabled when the client sent no preference
    #[serde(default = "default_true")]
    pub default_enabled: bool,
    /// 插件设置的 schema
    /// Schema for the plugin's settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_schema: Option<serde_json::Value>,
    /// 其他描述字段
    /// Any other descriptive fields
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_true() -> bool {
    true
}

impl PluginMetadata {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            version: default_version(),
            description: String::new(),
            locked: false,
            default_enabled: true,
            config_schema: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    pub fn with_default_enabled(mut self, enabled: bool) -> Self {
        self.default_enabled = enabled;
        self
    }

    pub fn with_config_schema(mut self, schema: serde_json::Value) -> Self {
        self.config_schema = Some(schema);
        self
    }

    pub fn with_extra(mut self, key: &str, value: serde_json::Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    /// 是否带有可用的 id
    /// Whether the entry carries a usable id
    pub fn has_id(&self) -> bool {
        !self.id.trim().is_empty()
    }
}

/// 合并了启用状态的插件视图，UI 只应渲染这个结构
/// Plugin metadata merged with its effective enablement. This is the only
/// shape the UI should render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPluginView {
    #[serde(flatten)]
    pub metadata: PluginMetadata,
    pub enabled: bool,
}

impl ResolvedPluginView {
    /// Pair `metadata` with its computed enablement. A stored `enabled`
    /// field in the metadata is dropped so it cannot shadow the computed one.
    pub fn new(mut metadata: PluginMetadata, enabled: bool) -> Self {
        metadata.extra.remove("enabled");
        Self { metadata, enabled }
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    /// Locked plugins are rendered without a toggle.
    pub fn is_togglable(&self) -> bool {
        !self.metadata.locked
    }
}

// ============================================================================
// 可重载单元 (Reloadable module units)
// ============================================================================

/// 插件约定的子单元
/// Conventional sub-units of a plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubUnit {
    Layout,
    Components,
    Callbacks,
    Styles,
    Constants,
}

impl SubUnit {
    /// Declaration order of the conventional sub-units.
    pub const ALL: [SubUnit; 5] = [
        SubUnit::Layout,
        SubUnit::Components,
        SubUnit::Callbacks,
        SubUnit::Styles,
        SubUnit::Constants,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubUnit::Layout => "layout",
            SubUnit::Components => "components",
            SubUnit::Callbacks => "callbacks",
            SubUnit::Styles => "styles",
            SubUnit::Constants => "constants",
        }
    }
}

impl std::fmt::Display for SubUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单元地址：`<namespace>.<plugin_id>[.<sub>]`
/// Unit address: `<namespace>.<plugin_id>[.<sub>]`
pub fn unit_address(namespace: &str, plugin_id: &str, sub: Option<SubUnit>) -> String {
    match sub {
        Some(sub) => format!("{namespace}.{plugin_id}.{sub}"),
        None => format!("{namespace}.{plugin_id}"),
    }
}

/// Type-erased, shareable implementation of a loaded unit.
pub type UnitHandle = Arc<dyn Any + Send + Sync>;

/// 构建单元实现
/// Builds a fresh implementation of a unit. Called once on first load and
/// again on every re-execution.
pub trait UnitBuilder: Send + Sync {
    fn build(&self) -> PluginResult<UnitHandle>;
}

impl<F> UnitBuilder for F
where
    F: Fn() -> PluginResult<UnitHandle> + Send + Sync,
{
    fn build(&self) -> PluginResult<UnitHandle> {
        self()
    }
}

/// 宿主的已加载单元表
/// The host runtime's table of loaded units. Reloading only ever touches
/// units that are already present; it never loads a unit for the first time.
pub trait LoadedUnits: Send + Sync {
    /// Whether the unit at `address` is currently loaded.
    fn is_loaded(&self, address: &str) -> bool;

    /// Re-execute the unit at `address`, replacing its implementation.
    fn reexecute(&self, address: &str) -> PluginResult<()>;
}

// ============================================================================
// 热加载相关定义 (Hot-reload related definitions)
// ============================================================================

/// 热加载配置
/// Hot-reload configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotReloadConfig {
    /// 防抖窗口（毫秒）
    /// Debounce window in milliseconds
    pub debounce_ms: u64,
    /// 触发重载的源文件扩展名
    /// Source file extension that triggers a reload
    pub source_extension: String,
    /// 单元地址的命名空间
    /// Namespace prefix of unit addresses
    pub unit_namespace: String,
    /// 轮询后端的间隔（毫秒）
    /// Poll interval for polling watch backends, in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for HotReloadConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 1000,
            source_extension: "rs".to_string(),
            unit_namespace: "aiml_dash.plugins".to_string(),
            poll_interval_ms: 100,
        }
    }
}

impl HotReloadConfig {
    /// 创建新配置
    /// Create new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置防抖窗口
    /// Set the debounce window
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce_ms = window.as_millis() as u64;
        self
    }

    /// 设置源文件扩展名
    /// Set the source extension (with or without the leading dot)
    pub fn with_source_extension(mut self, ext: &str) -> Self {
        self.source_extension = ext.trim_start_matches('.').to_string();
        self
    }

    /// 设置单元命名空间
    /// Set the unit namespace
    pub fn with_unit_namespace(mut self, namespace: &str) -> Self {
        self.unit_namespace = namespace.to_string();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

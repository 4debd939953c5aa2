//! 插件生命周期模块
//!
//! 提供插件启用状态管理与开发期热重载：
//! - 启用状态令牌的编码与解码
//! - 插件注册表与锁定插件规则
//! - 插件设置存储
//! - 插件市场客户端
//! - 源文件变更触发的热重载
//!
//! Plugin lifecycle support: enablement tokens, the plugin registry with its
//! lock rule, per-plugin settings, the marketplace client and development
//! hot reload.

pub mod codec;
pub mod hot_reload;
pub mod marketplace;
pub mod registry;
pub mod settings;

pub use aiml_kernel::plugin::{
    InstalledPlugin, Marketplace, MarketplaceEntry, MarketplaceOutcome, PluginError,
    PluginMetadata, PluginResult, ResolvedPluginView,
};
pub use codec::{decode_enabled, encode_enabled};
pub use hot_reload::{
    HotReload, HotReloadConfig, HotReloadSupervisor, ReloadError, ReloadOrderer, UnitRegistry,
    create_hot_reloader,
};
pub use marketplace::{DEFAULT_MARKETPLACE_URL, PlaceholderMarketplace, entry_file};
pub use registry::{EnabledSet, PluginRegistry};
pub use settings::{PluginSettingsStore, Settings, SettingsError, default_settings_dir};

//! Plugin management commands

pub mod list;
pub mod settings;
pub mod uninstall;

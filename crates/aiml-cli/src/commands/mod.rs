//! Command implementations

pub mod plugin;
pub mod resolve;
pub mod token;
pub mod watch;

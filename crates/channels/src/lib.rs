//! Transport abstraction and the plugin dispatch loop.

pub mod plugin;
pub mod registry;
pub mod transport;

pub use {
    plugin::BotPlugin,
    registry::PluginRegistry,
    transport::{Transport, reactions},
};

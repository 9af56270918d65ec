pub mod plugin;
pub mod plugins;
pub mod registry;

pub use plugin::{ChallengePlugin, PluginMetadata, PluginState, ProcessResult, TriggerCb, ValidateResult};
pub use registry::PluginRegistry;

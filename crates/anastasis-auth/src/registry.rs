//! Maps a truth's `method_name` to the plugin instance configured for it.
//! One instance per method, built once at startup and shared across
//! requests (spec.md §4.2: "one plugin instance exists per authentication
//! method").

use std::collections::HashMap;
use std::sync::Arc;

use crate::plugin::ChallengePlugin;

pub struct PluginRegistry {
    plugins: HashMap<String, Arc<dyn ChallengePlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self { plugins: HashMap::new() }
    }

    pub fn register(&mut self, plugin: Arc<dyn ChallengePlugin>) {
        self.plugins.insert(plugin.metadata().method_name.to_string(), plugin);
    }

    pub fn get(&self, method_name: &str) -> Option<&Arc<dyn ChallengePlugin>> {
        self.plugins.get(method_name)
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::QuestionPlugin;

    #[test]
    fn looks_up_a_registered_plugin_by_method_name() {
        let mut registry = PluginRegistry::new();
        registry.register(Arc::new(QuestionPlugin::new()));
        assert!(registry.get("question").is_some());
        assert!(registry.get("unknown").is_none());
    }
}

use crate::{Plugin, PluginError, builtin};
use std::collections::BTreeMap;
use std::sync::Arc;
use stencil_template_core::SchemaCatalog;

/// Maps schema type names to plugins. Lookup is by exact name.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: BTreeMap<String, Arc<dyn Plugin>>,
}

impl PluginRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in type.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for plugin in builtin::all() {
            registry.register_arc(plugin);
        }
        registry
    }

    /// Adds `plugin`, replacing any plugin registered for the same type.
    pub fn register(&mut self, plugin: impl Plugin + 'static) {
        self.register_arc(Arc::new(plugin));
    }

    pub fn register_arc(&mut self, plugin: Arc<dyn Plugin>) {
        let name = plugin.type_name().to_string();
        if self.plugins.insert(name.clone(), plugin).is_some() {
            log::debug!("Replaced plugin for type '{}'", name);
        }
    }

    pub fn get(&self, kind: &str) -> Result<&Arc<dyn Plugin>, PluginError> {
        self.plugins
            .get(kind)
            .ok_or_else(|| PluginError::UnknownSchemaType(kind.to_string()))
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.plugins.contains_key(kind)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.plugins.keys()).finish()
    }
}

impl SchemaCatalog for PluginRegistry {
    fn contains_type(&self, kind: &str) -> bool {
        self.contains(kind)
    }

    fn required_by_default(&self, kind: &str) -> bool {
        self.plugins
            .get(kind)
            .and_then(|p| p.default_schema().required)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_set_is_complete() {
        let registry = PluginRegistry::builtin();
        for kind in [
            "text",
            "multiVariableText",
            "date",
            "time",
            "dateTime",
            "select",
            "image",
            "svg",
            "signature",
            "table",
            "qrcode",
            "code128",
            "ean13",
            "line",
            "rectangle",
            "ellipse",
            "checkbox",
            "radioGroup",
        ] {
            assert!(registry.contains(kind), "missing {kind}");
        }
        assert_eq!(registry.len(), 18);
    }

    #[test]
    fn unknown_type_is_an_error() {
        let registry = PluginRegistry::builtin();
        assert!(matches!(
            registry.get("chart"),
            Err(PluginError::UnknownSchemaType(kind)) if kind == "chart"
        ));
    }

    #[test]
    fn signature_is_optional_by_default() {
        let registry = PluginRegistry::builtin();
        assert!(!registry.required_by_default("signature"));
        assert!(!registry.required_by_default("line"));
    }

    #[test]
    fn empty_registry_knows_nothing() {
        let registry = PluginRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.contains_type("text"));
    }
}

//! Extension registry: named hooks into config resolution and loading.
//!
//! The registry is built once at startup and passed by reference; there
//! is no global registration. Order matters twice: earlier-registered
//! extensions win override collisions, and on-load callbacks run
//! strictly in registration order.

use mosaic_model::{Component, ComponentId, OverrideSet, SourceFile};
use serde_json::Value;

/// What an overrides contributor gets to look at.
pub struct OverridesContext<'a> {
    pub id: &'a ComponentId,
    pub files: &'a [SourceFile],
    pub local_config: Option<&'a OverrideSet>,
}

pub type OverridesFn = dyn Fn(&OverridesContext<'_>) -> Result<OverrideSet, String> + Send + Sync;
pub type OnLoadFn = dyn Fn(&Component) -> Result<Option<Value>, String> + Send + Sync;

pub struct Extension {
    name: String,
    contribute_overrides: Option<Box<OverridesFn>>,
    on_load: Option<Box<OnLoadFn>>,
}

impl Extension {
    pub fn new(name: impl Into<String>) -> Self {
        Extension { name: name.into(), contribute_overrides: None, on_load: None }
    }

    pub fn with_overrides<F>(mut self, f: F) -> Self
    where
        F: Fn(&OverridesContext<'_>) -> Result<OverrideSet, String> + Send + Sync + 'static,
    {
        self.contribute_overrides = Some(Box::new(f));
        self
    }

    pub fn with_on_load<F>(mut self, f: F) -> Self
    where
        F: Fn(&Component) -> Result<Option<Value>, String> + Send + Sync + 'static,
    {
        self.on_load = Some(Box::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn overrides_hook(&self) -> Option<&OverridesFn> {
        self.contribute_overrides.as_deref()
    }

    pub fn on_load_hook(&self) -> Option<&OnLoadFn> {
        self.on_load.as_deref()
    }
}

impl std::fmt::Debug for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extension")
            .field("name", &self.name)
            .field("contribute_overrides", &self.contribute_overrides.is_some())
            .field("on_load", &self.on_load.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    extensions: Vec<Extension>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, extension: Extension) {
        self.extensions.push(extension);
    }

    /// Registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Extension> {
        self.extensions.iter()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iteration_preserves_registration_order() {
        let mut registry = ExtensionRegistry::new();
        registry.register(Extension::new("b.second"));
        registry.register(Extension::new("a.first"));
        let names: Vec<&str> = registry.iter().map(Extension::name).collect();
        assert_eq!(names, vec!["b.second", "a.first"]);
    }

    #[test]
    fn hooks_are_optional() {
        let bare = Extension::new("bare");
        assert!(bare.overrides_hook().is_none());
        assert!(bare.on_load_hook().is_none());

        let with_hook = Extension::new("hooked").with_overrides(|_| Ok(OverrideSet::new()));
        assert!(with_hook.overrides_hook().is_some());
    }
}

// src/upload/context.rs
//! Context providers
//!
//! Ambient metadata merged into each upload payload. Providers run in
//! registration order when a batch is dispatched; the result never becomes
//! part of queue state.

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Ambient metadata sent with every batch
pub type Context = Map<String, Value>;

/// Adds or rewrites entries of the upload context
pub trait ContextProvider: Send + Sync {
    fn capture_context(&self, context: Context) -> Context;
}

/// SDK name and version
#[derive(Debug, Clone, Default)]
pub struct SdkContextProvider;

impl ContextProvider for SdkContextProvider {
    fn capture_context(&self, mut context: Context) -> Context {
        context.insert("sdk_name".to_string(), Value::from(env!("CARGO_PKG_NAME")));
        context.insert(
            "sdk_version".to_string(),
            Value::from(env!("CARGO_PKG_VERSION")),
        );
        context
    }
}

/// Fixed key/values supplied by the host (app or device metadata)
#[derive(Debug, Clone, Default)]
pub struct StaticContextProvider {
    values: Context,
}

impl StaticContextProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl ContextProvider for StaticContextProvider {
    fn capture_context(&self, mut context: Context) -> Context {
        for (key, value) in &self.values {
            context.insert(key.clone(), value.clone());
        }
        context
    }
}

/// Ordered set of context providers
#[derive(Clone, Default)]
pub struct ContextRegistry {
    providers: Arc<RwLock<Vec<Arc<dyn ContextProvider>>>>,
}

impl ContextRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in SDK provider
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(SdkContextProvider));
        registry
    }

    pub fn register(&self, provider: Arc<dyn ContextProvider>) {
        let mut providers = self.providers.write();
        providers.push(provider);
        debug!(providers = providers.len(), "registered context provider");
    }

    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }

    /// Run every provider over an empty context
    pub fn capture(&self) -> Context {
        let providers: Vec<Arc<dyn ContextProvider>> = self.providers.read().clone();

        providers
            .iter()
            .fold(Context::new(), |context, provider| {
                provider.capture_context(context)
            })
    }
}

impl std::fmt::Debug for ContextRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextRegistry")
            .field("providers", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ClearingProvider;

    impl ContextProvider for ClearingProvider {
        fn capture_context(&self, _context: Context) -> Context {
            Context::new()
        }
    }

    #[test]
    fn test_defaults() {
        let registry = ContextRegistry::with_defaults();
        assert_eq!(registry.len(), 1);

        let context = registry.capture();
        assert_eq!(context["sdk_version"], env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_register_adds_provider() {
        let registry = ContextRegistry::with_defaults();
        registry.register(Arc::new(StaticContextProvider::new().with("app", "demo")));

        assert_eq!(registry.len(), 2);
        let context = registry.capture();
        assert_eq!(context["app"], "demo");
        assert!(context.contains_key("sdk_name"));
    }

    #[test]
    fn test_providers_run_in_order() {
        let registry = ContextRegistry::new();
        registry.register(Arc::new(StaticContextProvider::new().with("os", "linux")));
        registry.register(Arc::new(ClearingProvider));
        registry.register(Arc::new(StaticContextProvider::new().with("locale", "en_CA")));

        let context = registry.capture();
        assert!(!context.contains_key("os"));
        assert_eq!(context["locale"], "en_CA");
    }

    #[test]
    fn test_clones_share_providers() {
        let registry = ContextRegistry::new();
        let clone = registry.clone();
        clone.register(Arc::new(SdkContextProvider));
        assert_eq!(registry.len(), 1);
    }
}

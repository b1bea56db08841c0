//! Tool registry
//!
//! Static mapping from tool type to the handler that fetches its data. The registry
//! is filled once at start-up and shared read-only behind an `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::ToolsConfig;
use crate::error::{CanvasError, Result};

use super::definition::{ToolArgs, ToolDefinition, ToolType};
use super::handlers::{AssetAllocationTool, OhlcvTool, SearchWithCriteriaTool, SixApiClient};

/// A remote data function callable with named string arguments
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Tool type this handler serves
    fn tool_type(&self) -> ToolType;

    /// Fetch the data for one tile
    async fn call(&self, args: &ToolArgs) -> Result<Value>;
}

/// Lookup table from tool type to handler
#[derive(Default, Clone)]
pub struct ToolRegistry {
    handlers: HashMap<ToolType, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry with every production handler
    pub fn standard(config: &ToolsConfig) -> Result<Self> {
        let api = Arc::new(SixApiClient::new(&config.base_url, config.timeout())?);

        let registry = Self::new()
            .with_handler(OhlcvTool::new(api.clone()))
            .with_handler(SearchWithCriteriaTool::new(api))
            .with_handler(AssetAllocationTool::new(config.asset_allocation_path.clone()));

        Ok(registry)
    }

    /// Register a handler under its own tool type
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) {
        let tool_type = handler.tool_type();
        if self.handlers.insert(tool_type, handler).is_some() {
            log::warn!("Replacing handler already registered for {}", tool_type);
        }
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_handler(mut self, handler: impl ToolHandler + 'static) -> Self {
        self.register(Arc::new(handler));
        self
    }

    /// Find the handler for a tool type
    pub fn resolve(&self, tool_type: ToolType) -> Result<Arc<dyn ToolHandler>> {
        self.handlers
            .get(&tool_type)
            .cloned()
            .ok_or_else(|| CanvasError::UnknownTool(tool_type.to_string()))
    }

    /// Registered tool types, sorted
    pub fn tool_types(&self) -> Vec<ToolType> {
        let mut types: Vec<ToolType> = self.handlers.keys().copied().collect();
        types.sort();
        types
    }

    /// Planner-facing definitions of every registered tool
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tool_types().iter().map(ToolType::definition).collect()
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool(ToolType);

    #[async_trait]
    impl ToolHandler for EchoTool {
        fn tool_type(&self) -> ToolType {
            self.0
        }

        async fn call(&self, args: &ToolArgs) -> Result<Value> {
            Ok(serde_json::to_value(args)?)
        }
    }

    #[test]
    fn test_empty_registry() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.tool_types().is_empty());
    }

    #[test]
    fn test_resolve_unknown_tool() {
        let registry = ToolRegistry::new().with_handler(EchoTool(ToolType::Ohlcv));
        let err = registry.resolve(ToolType::SearchWithCriteria).err().unwrap();
        assert!(matches!(err, CanvasError::UnknownTool(ref name) if name == "SEARCHWITHCRITERIA"));
    }

    #[tokio::test]
    async fn test_resolve_registered_tool() {
        let registry = ToolRegistry::new().with_handler(EchoTool(ToolType::Ohlcv));
        let handler = registry.resolve(ToolType::Ohlcv).unwrap();

        let mut args = ToolArgs::new();
        args.insert("symbol".to_string(), "NVIDIA".to_string());
        let value = handler.call(&args).await.unwrap();
        assert_eq!(value["symbol"], "NVIDIA");
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool(ToolType::Ohlcv)));
        registry.register(Arc::new(EchoTool(ToolType::Ohlcv)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_tool_types_sorted() {
        let registry = ToolRegistry::new()
            .with_handler(EchoTool(ToolType::FetchAssetAllocation))
            .with_handler(EchoTool(ToolType::Ohlcv));
        assert_eq!(
            registry.tool_types(),
            vec![ToolType::Ohlcv, ToolType::FetchAssetAllocation]
        );
        assert_eq!(registry.definitions().len(), 2);
    }

    #[test]
    fn test_standard_registry_has_every_tool() {
        let registry = ToolRegistry::standard(&ToolsConfig::default()).unwrap();
        assert_eq!(registry.tool_types(), ToolType::ALL.to_vec());
    }
}

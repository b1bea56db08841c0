//! Tool-call dispatch
//!
//! Turns one planner-produced tool call into a handler invocation. Every failure is
//! reported as a typed error for the caller to log; nothing is swallowed here.

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CanvasError, Result};

use super::definition::{ToolArgs, ToolType};
use super::registry::ToolRegistry;

/// A tool call as written by the planner for one tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallDescriptor {
    #[serde(rename = "type")]
    pub tool_type: ToolType,
    #[serde(default)]
    pub inputs: Vec<String>,
}

impl ToolCallDescriptor {
    /// Create a new descriptor
    pub fn new<I, S>(tool_type: ToolType, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tool_type,
            inputs: inputs.into_iter().map(Into::into).collect(),
        }
    }
}

/// Split `key=value` entries into named arguments
///
/// Each entry is split on its first `=`; later keys overwrite earlier ones.
pub fn parse_inputs(inputs: &[String]) -> Result<ToolArgs> {
    inputs
        .iter()
        .map(|entry| {
            entry
                .split_once('=')
                .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
                .ok_or_else(|| CanvasError::MalformedInput(entry.clone()))
        })
        .collect()
}

/// Resolves and invokes tool handlers
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
}

impl ToolDispatcher {
    /// Create a dispatcher over a finished registry
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Registry this dispatcher resolves against
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Execute one tool call
    pub async fn dispatch(&self, descriptor: ToolCallDescriptor) -> Result<Value> {
        let handler = self.registry.resolve(descriptor.tool_type)?;
        let args = parse_inputs(&descriptor.inputs)?;

        debug!("Dispatching {} with {:?}", descriptor.tool_type, args);

        handler.call(&args).await.map_err(|e| CanvasError::ToolExecution {
            tool_type: descriptor.tool_type,
            inputs: descriptor.inputs,
            cause: e.to_string(),
        })
    }
}

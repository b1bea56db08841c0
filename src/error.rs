//! Error types for canvasiq
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::tools::ToolType;

/// All error types that can occur while building a canvas
#[derive(Debug, Error)]
pub enum CanvasError {
    /// The planner could not produce a layout plan or a tool call
    #[error("Planner error: {0}")]
    Planner(String),

    /// No handler is registered for the requested tool type
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A tool-call input is not of the form `key=value`
    #[error("Malformed input: {0:?} (expected key=value)")]
    MalformedInput(String),

    /// The tool handler itself failed (network, remote status, bad payload)
    #[error("Tool {tool_type} failed with inputs {inputs:?}: {cause}")]
    ToolExecution {
        tool_type: ToolType,
        inputs: Vec<String>,
        cause: String,
    },

    /// A session disappeared between touch and append
    #[error("Session {0} expired before its tiles could be stored")]
    SessionRace(String),

    /// A spawned per-tile task panicked or was cancelled
    #[error("Task failed: {0}")]
    Task(String),

    /// Remote data provider returned something unusable
    #[error("Remote error: {0}")]
    Remote(String),

    /// LLM API error
    #[error("LLM error: {0}")]
    Llm(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for canvasiq operations
pub type Result<T> = std::result::Result<T, CanvasError>;

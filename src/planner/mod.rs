//! Planner - turns a prompt into a tile layout and each tile into a tool call

mod llm_planner;
mod mock;

use async_trait::async_trait;

use crate::canvas::{CanvasPlan, TileSpec};
use crate::error::Result;
use crate::tools::ToolCallDescriptor;

pub use llm_planner::{LlmPlanner, extract_json};
pub use mock::MockPlanner;

/// Language-model-backed planning calls
#[async_trait]
pub trait Planner: Send + Sync {
    /// Decide which tiles the dashboard should show
    async fn generate_canvas(&self, prompt: &str, context: &str) -> Result<CanvasPlan>;

    /// Decide which tool call fills one tile; `date` is empty or `YYYY-MM-DD`
    async fn generate_tool_call(&self, tile: &TileSpec, context: &str, date: &str) -> Result<ToolCallDescriptor>;
}

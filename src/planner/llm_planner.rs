//! Planner backed by an LLM client
//!
//! Both planning calls ask the model for a single JSON object and deserialize it.

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

use crate::canvas::{CanvasPlan, TileSpec, TileType};
use crate::error::{CanvasError, Result};
use crate::llm::{CompletionRequest, LlmClient};
use crate::tools::{ToolCallDescriptor, ToolDefinition, ToolType};

use super::Planner;

const CANVAS_SYSTEM_PROMPT: &str = "You design financial dashboards. \
Given a user request, choose the tiles that answer it. \
Reply with exactly one JSON object and nothing else: \
{\"tiles\": [{\"title\": string, \"type\": TILE_TYPE, \"content\": string}]}. \
\"content\" describes what the tile shows and which data it needs.";

const TOOL_CALL_SYSTEM_PROMPT: &str = "You fetch data for one dashboard tile. \
Pick exactly one tool and write its inputs as \"key=value\" strings, one per parameter, \
never using '=' inside a key. \
Reply with exactly one JSON object and nothing else: {\"type\": TOOL, \"inputs\": [\"key=value\"]}.";

/// Tool call as written by the model, before the tool name is checked
#[derive(Debug, Deserialize)]
struct RawToolCall {
    #[serde(rename = "type")]
    tool_type: String,
    #[serde(default)]
    inputs: Vec<String>,
}

/// Slice out the JSON object in a model reply, skipping prose and code fences
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Planner that prompts an LLM client
pub struct LlmPlanner<L: LlmClient> {
    client: L,
    tools: Vec<ToolDefinition>,
}

impl<L: LlmClient> LlmPlanner<L> {
    /// Create a planner offering the given tools to the model
    pub fn new(client: L, tools: Vec<ToolDefinition>) -> Self {
        Self { client, tools }
    }

    pub fn client(&self) -> &L {
        &self.client
    }

    fn canvas_request(&self, prompt: &str, context: &str) -> CompletionRequest {
        let tile_types: Vec<&str> = TileType::ALL.iter().map(TileType::as_str).collect();
        let system = format!("{}\nTILE_TYPE is one of: {}.", CANVAS_SYSTEM_PROMPT, tile_types.join(", "));

        let mut user = format!("Request: {}", prompt);
        if !context.is_empty() {
            user.push_str(&format!("\nCurrent canvas: {}", context));
        }

        CompletionRequest::new(system).with_user_message(user)
    }

    fn tool_call_request(&self, tile: &TileSpec, context: &str, date: &str) -> CompletionRequest {
        let tools: Vec<String> = self.tools.iter().map(ToolDefinition::to_prompt_line).collect();
        let system = format!("{}\nAvailable tools:\n{}", TOOL_CALL_SYSTEM_PROMPT, tools.join("\n"));

        let mut user = format!(
            "Title: {}\nType: {}\nDescription: {}",
            tile.title, tile.tile_type, tile.content
        );
        if !context.is_empty() {
            user.push_str(&format!("\nContext: {}", context));
        }
        if !date.is_empty() {
            user.push_str(&format!(
                "\nToday is {}; unless the description says otherwise, end the time window on this date.",
                date
            ));
        }

        CompletionRequest::new(system).with_user_message(user)
    }

    async fn complete_json(&self, request: CompletionRequest) -> Result<String> {
        let response = self
            .client
            .complete(request)
            .await
            .map_err(|e| CanvasError::Planner(e.to_string()))?;

        if response.stop_reason.is_truncated() {
            return Err(CanvasError::Planner("Model output was truncated".to_string()));
        }

        extract_json(&response.content)
            .map(str::to_string)
            .ok_or_else(|| CanvasError::Planner(format!("No JSON object in reply: {}", response.content)))
    }
}

/// Parse a layout reply
pub(crate) fn parse_plan(json: &str) -> Result<CanvasPlan> {
    serde_json::from_str(json).map_err(|e| CanvasError::Planner(format!("Invalid canvas plan: {}", e)))
}

/// Parse a tool-call reply, rejecting tool names this crate does not know
pub(crate) fn parse_tool_call(json: &str) -> Result<ToolCallDescriptor> {
    let raw: RawToolCall =
        serde_json::from_str(json).map_err(|e| CanvasError::Planner(format!("Invalid tool call: {}", e)))?;

    let tool_type = ToolType::from_str(&raw.tool_type).ok_or(CanvasError::UnknownTool(raw.tool_type))?;
    Ok(ToolCallDescriptor {
        tool_type,
        inputs: raw.inputs,
    })
}

#[async_trait]
impl<L: LlmClient> Planner for LlmPlanner<L> {
    async fn generate_canvas(&self, prompt: &str, context: &str) -> Result<CanvasPlan> {
        let json = self.complete_json(self.canvas_request(prompt, context)).await?;
        let plan = parse_plan(&json)?;
        debug!("Generated canvas plan: {:?}", plan);
        Ok(plan)
    }

    async fn generate_tool_call(&self, tile: &TileSpec, context: &str, date: &str) -> Result<ToolCallDescriptor> {
        let json = self.complete_json(self.tool_call_request(tile, context, date)).await?;
        let call = parse_tool_call(&json)?;
        debug!("Generated tool call for '{}': {:?}", tile.title, call);
        Ok(call)
    }
}

//! Scripted planner for tests and offline runs

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::canvas::{CanvasPlan, TileSpec};
use crate::error::{CanvasError, Result};
use crate::tools::ToolCallDescriptor;

use super::Planner;

/// A planner that serves canned answers keyed by tile title
#[derive(Debug, Default)]
pub struct MockPlanner {
    plan: Option<CanvasPlan>,
    plan_error: Option<String>,
    tool_calls: HashMap<String, std::result::Result<ToolCallDescriptor, String>>,
    delays: HashMap<String, Duration>,
    seen: Mutex<Vec<(String, String)>>,
}

impl MockPlanner {
    pub fn new(plan: CanvasPlan) -> Self {
        Self {
            plan: Some(plan),
            ..Default::default()
        }
    }

    /// Planner whose layout call always fails
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            plan_error: Some(message.into()),
            ..Default::default()
        }
    }

    /// Answer for the tile with this title
    pub fn with_tool_call(mut self, title: impl Into<String>, call: ToolCallDescriptor) -> Self {
        self.tool_calls.insert(title.into(), Ok(call));
        self
    }

    /// Fail the tool-call step for the tile with this title
    pub fn with_tool_call_error(mut self, title: impl Into<String>, message: impl Into<String>) -> Self {
        self.tool_calls.insert(title.into(), Err(message.into()));
        self
    }

    /// Delay the tool-call answer for this title
    pub fn with_delay(mut self, title: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(title.into(), delay);
        self
    }

    /// `(title, date)` pairs passed to `generate_tool_call`, in call order
    pub fn seen(&self) -> Vec<(String, String)> {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Planner for MockPlanner {
    async fn generate_canvas(&self, _prompt: &str, _context: &str) -> Result<CanvasPlan> {
        if let Some(message) = &self.plan_error {
            return Err(CanvasError::Planner(message.clone()));
        }
        Ok(self.plan.clone().unwrap_or_default())
    }

    async fn generate_tool_call(&self, tile: &TileSpec, _context: &str, date: &str) -> Result<ToolCallDescriptor> {
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((tile.title.clone(), date.to_string()));

        if let Some(delay) = self.delays.get(&tile.title) {
            tokio::time::sleep(*delay).await;
        }

        match self.tool_calls.get(&tile.title) {
            Some(Ok(call)) => Ok(call.clone()),
            Some(Err(message)) => Err(CanvasError::Planner(message.clone())),
            None => Err(CanvasError::Planner(format!("No tool call scripted for '{}'", tile.title))),
        }
    }
}

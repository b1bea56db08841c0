//! Tool types and their planner-facing definitions
//!
//! A tool type names one remote financial-data capability. Each type carries a
//! description and parameter list that the planner uses to write `key=value` inputs.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Named string arguments passed to a tool handler
pub type ToolArgs = BTreeMap<String, String>;

/// Which remote data capability a tile's data comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ToolType {
    /// Historical open/high/low/close/volume series
    #[serde(rename = "OHLCV")]
    Ohlcv,
    /// Screener over company fundamentals
    #[serde(rename = "SEARCHWITHCRITERIA")]
    SearchWithCriteria,
    /// A customer's portfolio split
    #[serde(rename = "FETCH_ASSET_ALLOCATION")]
    FetchAssetAllocation,
}

impl ToolType {
    /// Every tool type, in declaration order
    pub const ALL: [ToolType; 3] = [
        ToolType::Ohlcv,
        ToolType::SearchWithCriteria,
        ToolType::FetchAssetAllocation,
    ];

    /// Wire name used by the planner
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ohlcv => "OHLCV",
            Self::SearchWithCriteria => "SEARCHWITHCRITERIA",
            Self::FetchAssetAllocation => "FETCH_ASSET_ALLOCATION",
        }
    }

    /// Parse from string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "OHLCV" => Some(Self::Ohlcv),
            "SEARCHWITHCRITERIA" | "SEARCH_WITH_CRITERIA" => Some(Self::SearchWithCriteria),
            "FETCH_ASSET_ALLOCATION" | "ASSET_ALLOCATION" => Some(Self::FetchAssetAllocation),
            _ => None,
        }
    }

    /// Planner-facing definition of this tool
    pub fn definition(&self) -> ToolDefinition {
        match self {
            Self::Ohlcv => ToolDefinition::new(*self, "Historical daily price series (open, high, low, close, volume) for one company")
                .with_param("symbol", "Company name or ticker, e.g. NVIDIA")
                .with_param("first", "Start date, dd.mm.yyyy")
                .with_param("last", "End date, dd.mm.yyyy"),
            Self::SearchWithCriteria => ToolDefinition::new(*self, "Table of companies matching fundamental criteria")
                .with_param(
                    "query",
                    "JSON object of criteria, e.g. {\"ebitda\": \"is positive\", \"employees\": \"more than 10000\"}",
                ),
            Self::FetchAssetAllocation => {
                ToolDefinition::new(*self, "Portfolio allocation of a customer as labels and percentages")
                    .with_param("customer_name", "Full name of the customer")
            }
        }
    }
}

impl fmt::Display for ToolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named tool parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolParam {
    pub name: String,
    pub description: String,
}

/// Description of a tool as shown to the planner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub tool_type: ToolType,
    pub description: String,
    pub params: Vec<ToolParam>,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(tool_type: ToolType, description: impl Into<String>) -> Self {
        Self {
            tool_type,
            description: description.into(),
            params: Vec::new(),
        }
    }

    /// Add a parameter
    pub fn with_param(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.params.push(ToolParam {
            name: name.into(),
            description: description.into(),
        });
        self
    }

    /// Render as a prompt fragment
    pub fn to_prompt_line(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| format!("{}=<{}>", p.name, p.description))
            .collect();
        format!("- {}: {}. inputs: [{}]", self.tool_type, self.description, params.join(", "))
    }
}

/// Fetch a required argument or fail with a readable message
pub fn required_arg<'a>(args: &'a ToolArgs, name: &str) -> crate::Result<&'a str> {
    args.get(name)
        .map(String::as_str)
        .ok_or_else(|| crate::CanvasError::Remote(format!("Missing '{}' parameter", name)))
}

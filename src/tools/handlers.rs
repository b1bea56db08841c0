//! Production tool handlers
//!
//! Two handlers talk to the financial-data HTTP API, one reads customer portfolios
//! from a local JSON file. Provider payloads arrive double-encoded (JSON strings
//! inside JSON), so each handler unwraps its envelope before shaping rows.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{CanvasError, Result};

use super::definition::{ToolArgs, ToolType, required_arg};
use super::registry::ToolHandler;

/// Thin client for the financial-data API
#[derive(Debug, Clone)]
pub struct SixApiClient {
    client: Client,
    base_url: String,
}

impl SixApiClient {
    /// Create a client for the given base URL
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CanvasError::Remote(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST to an endpoint with query parameters and return the decoded `object` envelope
    pub async fn post(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("POST {} {:?}", url, query);

        let response = self.client.post(&url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CanvasError::Remote(format!("{} returned {}: {}", endpoint, status, error_body)));
        }

        let body: Value = response.json().await?;
        unwrap_envelope(&body)
    }
}

/// Decode a value that may itself be a JSON document encoded as a string
pub fn decode_embedded(value: &Value) -> Result<Value> {
    match value {
        Value::String(s) => Ok(serde_json::from_str(s)?),
        other => Ok(other.clone()),
    }
}

/// Pull the `object` member out of a provider response
pub fn unwrap_envelope(body: &Value) -> Result<Value> {
    let object = body
        .get("object")
        .ok_or_else(|| CanvasError::Remote("Response has no 'object' member".to_string()))?;
    decode_embedded(object)
}

/// Turn an OHLCV envelope into chart rows ordered by date
pub fn ohlcv_rows(object: &Value) -> Result<Value> {
    let data = object
        .get("data")
        .ok_or_else(|| CanvasError::Remote("OHLCV payload has no 'data' member".to_string()))?;
    let data = decode_embedded(data)?;

    let series = data
        .as_object()
        .and_then(|m| m.values().next())
        .ok_or_else(|| CanvasError::Remote("OHLCV payload contains no series".to_string()))?;
    let series = decode_embedded(series)?;

    let points = series
        .as_object()
        .ok_or_else(|| CanvasError::Remote("OHLCV series is not an object".to_string()))?;

    let mut rows: Vec<Value> = points
        .iter()
        .map(|(timestamp, values)| {
            let date = timestamp.split('T').next().unwrap_or(timestamp);
            json!({
                "name": date,
                "open": values["open"],
                "high": values["high"],
                "low": values["low"],
                "close": values["close"],
                "volume": values["vol"],
            })
        })
        .collect();
    rows.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));

    Ok(Value::Array(rows))
}

/// Turn a screener envelope into its result table
pub fn search_table(object: &Value) -> Result<Value> {
    let first = object
        .get("data")
        .and_then(|d| d.get(0))
        .ok_or_else(|| CanvasError::Remote("Search payload has no data table".to_string()))?;
    decode_embedded(first)
}

/// Historical price series for one company
#[derive(Debug, Clone)]
pub struct OhlcvTool {
    api: Arc<SixApiClient>,
}

impl OhlcvTool {
    pub fn new(api: Arc<SixApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ToolHandler for OhlcvTool {
    fn tool_type(&self) -> ToolType {
        ToolType::Ohlcv
    }

    async fn call(&self, args: &ToolArgs) -> Result<Value> {
        let symbol = required_arg(args, "symbol")?;
        let first = required_arg(args, "first")?;
        let last = required_arg(args, "last")?;

        let object = self
            .api
            .post("ohlcv", &[("query", symbol), ("first", first), ("last", last)])
            .await?;
        ohlcv_rows(&object)
    }
}

/// Company screener
#[derive(Debug, Clone)]
pub struct SearchWithCriteriaTool {
    api: Arc<SixApiClient>,
}

impl SearchWithCriteriaTool {
    pub fn new(api: Arc<SixApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ToolHandler for SearchWithCriteriaTool {
    fn tool_type(&self) -> ToolType {
        ToolType::SearchWithCriteria
    }

    async fn call(&self, args: &ToolArgs) -> Result<Value> {
        let query = required_arg(args, "query")?;
        let object = self.api.post("searchwithcriteria", &[("query", query)]).await?;
        search_table(&object)
    }
}

#[derive(Debug, Deserialize)]
struct Holding {
    asset: String,
    allocation: f64,
}

#[derive(Debug, Deserialize)]
struct Customer {
    name: String,
    #[serde(default)]
    portfolio: Vec<Holding>,
}

/// Portfolio split read from a local customer file
#[derive(Debug, Clone)]
pub struct AssetAllocationTool {
    path: PathBuf,
}

impl AssetAllocationTool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ToolHandler for AssetAllocationTool {
    fn tool_type(&self) -> ToolType {
        ToolType::FetchAssetAllocation
    }

    async fn call(&self, args: &ToolArgs) -> Result<Value> {
        let customer_name = required_arg(args, "customer_name")?;

        let content = tokio::fs::read_to_string(&self.path).await?;
        let customers: Vec<Customer> = serde_json::from_str(&content)?;

        let customer = customers
            .into_iter()
            .find(|c| c.name == customer_name)
            .ok_or_else(|| CanvasError::Remote(format!("Unknown customer: {}", customer_name)))?;

        let labels: Vec<&str> = customer.portfolio.iter().map(|h| h.asset.as_str()).collect();
        let data: Vec<f64> = customer.portfolio.iter().map(|h| h.allocation).collect();

        let total: f64 = data.iter().sum();
        if (total - 100.0).abs() > 1e-6 {
            warn!("Total allocation for customer {} is {}, expected 100", customer.name, total);
        }

        Ok(json!({ "labels": labels, "data": data }))
    }
}

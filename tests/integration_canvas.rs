//! Canvas generation integration tests
//!
//! Runs the orchestrator end to end with scripted planners and in-test tool handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use canvasiq::canvas::{CanvasArchive, CanvasOrchestrator, CanvasPlan, TileSpec, TileType};
use canvasiq::error::{CanvasError, Result};
use canvasiq::llm::MockLlmClient;
use canvasiq::planner::{LlmPlanner, MockPlanner};
use canvasiq::service::CanvasService;
use canvasiq::session::SessionStore;
use canvasiq::tools::{
    AssetAllocationTool, ToolArgs, ToolCallDescriptor, ToolDispatcher, ToolHandler, ToolRegistry, ToolType,
};
use chrono::NaiveDate;
use serde_json::{Value, json};
use tempfile::TempDir;

/// Price tool: fails for one symbol, sleeps longer for earlier symbols
struct PriceTool {
    calls: AtomicUsize,
}

#[async_trait]
impl ToolHandler for PriceTool {
    fn tool_type(&self) -> ToolType {
        ToolType::Ohlcv
    }

    async fn call(&self, args: &ToolArgs) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let symbol = args.get("symbol").cloned().unwrap_or_default();
        let delay = match symbol.as_str() {
            "AAA" => 60,
            "CCC" => 5,
            _ => 20,
        };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        if symbol == "BAD" {
            return Err(CanvasError::Remote("HTTP 502".to_string()));
        }
        Ok(json!([{"name": "2024-03-04", "close": 1.0, "symbol": symbol}]))
    }
}

fn price_registry() -> (Arc<ToolRegistry>, Arc<PriceTool>) {
    let tool = Arc::new(PriceTool {
        calls: AtomicUsize::new(0),
    });
    let mut registry = ToolRegistry::new();
    registry.register(tool.clone());
    (Arc::new(registry), tool)
}

fn price_planner(symbols: &[&str]) -> MockPlanner {
    let specs = symbols
        .iter()
        .map(|s| TileSpec::new(format!("{} price", s), TileType::Line, format!("{} close", s)))
        .collect();
    symbols.iter().fold(MockPlanner::new(CanvasPlan::new(specs)), |planner, s| {
        planner.with_tool_call(
            format!("{} price", s),
            ToolCallDescriptor::new(ToolType::Ohlcv, [format!("symbol={}", s), "first=2024-01-01".to_string()]),
        )
    })
}

#[tokio::test]
async fn test_alternating_failures_keep_successes_in_order() {
    let (registry, tool) = price_registry();
    let symbols = ["AAA", "BAD", "CCC", "BAD", "EEE", "BAD"];
    let store = Arc::new(SessionStore::default());
    store.create_session("s").await;

    let orchestrator = CanvasOrchestrator::new(
        Arc::new(price_planner(&symbols)),
        Arc::new(ToolDispatcher::new(registry)),
        store.clone(),
    );

    let tiles = orchestrator.generate_canvas("s", "prices", "").await.unwrap();
    assert_eq!(tool.calls.load(Ordering::SeqCst), symbols.len());

    let symbols_out: Vec<&str> = tiles.iter().map(|t| t.data[0]["symbol"].as_str().unwrap()).collect();
    assert_eq!(symbols_out, vec!["AAA", "CCC", "EEE"]);
    let positions: Vec<usize> = tiles.iter().map(|t| t.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
    assert_eq!(store.get_session("s").await, tiles);
}

#[tokio::test]
async fn test_planner_sees_yesterday_for_time_series_only() {
    let (registry, _) = price_registry();
    let planner = Arc::new(
        MockPlanner::new(CanvasPlan::new(vec![
            TileSpec::new("Trend", TileType::Candle, ""),
            TileSpec::new("Screener", TileType::Table, ""),
        ]))
        .with_tool_call("Trend", ToolCallDescriptor::new(ToolType::Ohlcv, ["symbol=AAA"])),
    );
    let orchestrator = CanvasOrchestrator::new(
        planner.clone(),
        Arc::new(ToolDispatcher::new(registry)),
        Arc::new(SessionStore::default()),
    );

    let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let tiles = orchestrator.generate_canvas_on("s", "trend", "", today).await.unwrap();
    assert_eq!(tiles.len(), 1);

    let mut seen = planner.seen();
    seen.sort();
    assert_eq!(
        seen,
        vec![
            ("Screener".to_string(), String::new()),
            ("Trend".to_string(), "2024-02-29".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_failed_plan_stores_nothing() {
    let (registry, tool) = price_registry();
    let store = Arc::new(SessionStore::default());
    store.create_session("s").await;
    let orchestrator = CanvasOrchestrator::new(
        Arc::new(MockPlanner::failing("model unavailable")),
        Arc::new(ToolDispatcher::new(registry)),
        store.clone(),
    );

    let err = orchestrator.generate_canvas("s", "prices", "").await.unwrap_err();
    assert!(matches!(err, CanvasError::Planner(_)));
    assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
    assert!(store.get_session("s").await.is_empty());
}

#[tokio::test]
async fn test_archive_written_for_each_batch() {
    let temp = TempDir::new().unwrap();
    let (registry, _) = price_registry();
    let orchestrator = CanvasOrchestrator::new(
        Arc::new(price_planner(&["AAA"])),
        Arc::new(ToolDispatcher::new(registry)),
        Arc::new(SessionStore::default()),
    )
    .with_archive(Some(CanvasArchive::new(temp.path())));

    orchestrator.generate_canvas("s", "prices", "").await.unwrap();
    orchestrator.generate_canvas("s", "prices", "").await.unwrap();

    let mut files: Vec<String> = std::fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    files.sort();
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|f| f.starts_with("canvas_") && f.ends_with(".json")));

    let content = std::fs::read_to_string(temp.path().join(&files[0])).unwrap();
    let value: Value = serde_json::from_str(&content).unwrap();
    assert_eq!(value[0]["title"], "AAA price");
    assert_eq!(value[0]["type"], "LINE");
    assert_eq!(value[0]["position"], 0);
}

#[tokio::test]
async fn test_llm_planner_to_asset_allocation_pie() {
    let temp = TempDir::new().unwrap();
    let customers = temp.path().join("asset_allocation.json");
    std::fs::write(
        &customers,
        r#"[{"name": "Jane Doe", "portfolio": [
            {"asset": "Equities", "allocation": 60},
            {"asset": "Bonds", "allocation": 40}
        ]}]"#,
    )
    .unwrap();

    let client = MockLlmClient::new()
        .with_response(r#"{"tiles": [{"title": "Jane split", "type": "PIE", "content": "Jane Doe allocation"}]}"#)
        .with_response("```json\n{\"type\": \"FETCH_ASSET_ALLOCATION\", \"inputs\": [\"customer_name=Jane Doe\"]}\n```");

    let registry = Arc::new(ToolRegistry::new().with_handler(AssetAllocationTool::new(&customers)));
    let planner = LlmPlanner::new(client, registry.definitions());
    let orchestrator = CanvasOrchestrator::new(
        Arc::new(planner),
        Arc::new(ToolDispatcher::new(registry)),
        Arc::new(SessionStore::default()),
    );
    let service = CanvasService::new(orchestrator);
    service.ensure_session("jane").await;

    let tiles = service.touch_and_run("jane", "show Jane Doe's portfolio").await.unwrap();
    assert_eq!(tiles.len(), 1);
    assert_eq!(tiles[0].tile_type, TileType::Pie);
    assert_eq!(tiles[0].data["labels"], json!(["Equities", "Bonds"]));
    assert_eq!(tiles[0].data["data"], json!([60.0, 40.0]));
    assert_eq!(service.get_session("jane").await.len(), 1);
}

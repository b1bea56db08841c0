//! Tool System - tool types, registry, handlers and dispatch

mod definition;
mod dispatcher;
mod handlers;
mod registry;

pub use definition::{ToolArgs, ToolDefinition, ToolParam, ToolType, required_arg};
pub use dispatcher::{ToolCallDescriptor, ToolDispatcher, parse_inputs};
pub use handlers::{
    AssetAllocationTool, OhlcvTool, SearchWithCriteriaTool, SixApiClient, decode_embedded, ohlcv_rows,
    search_table, unwrap_envelope,
};
pub use registry::{ToolHandler, ToolRegistry};

//! Canvas - tiles, the orchestrator that builds them, and the on-disk archive

mod archive;
mod orchestrator;
mod tile;

pub use archive::CanvasArchive;
pub use orchestrator::{CanvasOrchestrator, anchor_date, gather};
pub use tile::{CanvasPlan, Tile, TileSpec, TileType};

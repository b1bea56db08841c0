//! Tile types shared by the planner, orchestrator and session store

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of widget a tile renders as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TileType {
    Line,
    Candle,
    Table,
    Pie,
    Bar,
    Area,
}

impl TileType {
    /// Every tile type, in declaration order
    pub const ALL: [TileType; 6] = [
        TileType::Line,
        TileType::Candle,
        TileType::Table,
        TileType::Pie,
        TileType::Bar,
        TileType::Area,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Line => "LINE",
            Self::Candle => "CANDLE",
            Self::Table => "TABLE",
            Self::Pie => "PIE",
            Self::Bar => "BAR",
            Self::Area => "AREA",
        }
    }

    /// Time-series tiles get a default trailing-window anchor date
    pub fn is_time_series(&self) -> bool {
        matches!(self, Self::Line | Self::Candle)
    }
}

impl fmt::Display for TileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A planner-authored tile before its data is fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSpec {
    pub title: String,
    #[serde(rename = "type")]
    pub tile_type: TileType,
    #[serde(default)]
    pub content: String,
}

impl TileSpec {
    pub fn new(title: impl Into<String>, tile_type: TileType, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            tile_type,
            content: content.into(),
        }
    }
}

/// Layout plan returned by the planner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasPlan {
    #[serde(default)]
    pub tiles: Vec<TileSpec>,
}

impl CanvasPlan {
    pub fn new(tiles: Vec<TileSpec>) -> Self {
        Self { tiles }
    }
}

/// A dashboard tile with its fetched data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub title: String,
    #[serde(rename = "type")]
    pub tile_type: TileType,
    pub content: String,
    pub data: Value,
    pub position: usize,
}

impl Tile {
    /// Attach fetched data to a spec at the given position
    pub fn from_spec(spec: TileSpec, data: Value, position: usize) -> Self {
        Self {
            title: spec.title,
            tile_type: spec.tile_type,
            content: spec.content,
            data,
            position,
        }
    }
}

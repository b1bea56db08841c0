//! On-disk copies of generated canvases for offline inspection

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::info;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::config::ArchiveConfig;
use crate::error::Result;

use super::tile::Tile;

/// Writes each generated batch as `canvas_<YYYYmmdd_HHMMSS>.json`
#[derive(Debug, Clone)]
pub struct CanvasArchive {
    dir: PathBuf,
}

impl CanvasArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Archive from configuration, `None` when disabled
    pub fn from_config(config: &ArchiveConfig) -> Option<Self> {
        config.enabled.then(|| Self::new(&config.dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a batch stamped with the current local time
    pub async fn save(&self, tiles: &[Tile]) -> Result<PathBuf> {
        self.save_at(tiles, Local::now()).await
    }

    /// Write a batch stamped with `at`; later batches in the same second get a `_n` suffix
    pub async fn save_at(&self, tiles: &[Tile], at: DateTime<Local>) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let json = serde_json::to_string_pretty(tiles)?;
        let stem = format!("canvas_{}", at.format("%Y%m%d_%H%M%S"));

        let mut path = self.dir.join(format!("{}.json", stem));
        let mut n = 1;
        let mut file = loop {
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => break file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    path = self.dir.join(format!("{}_{}.json", stem, n));
                    n += 1;
                }
                Err(e) => return Err(e.into()),
            }
        };
        file.write_all(json.as_bytes()).await?;
        file.flush().await?;

        info!("Canvas data written to file: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{TileSpec, TileType};
    use chrono::TimeZone;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    fn tiles() -> Vec<Tile> {
        vec![
            Tile::from_spec(TileSpec::new("Prices", TileType::Line, "NVIDIA close"), json!([{"close": 1.0}]), 0),
            Tile::from_spec(TileSpec::new("Split", TileType::Pie, "Jane"), json!({"labels": []}), 1),
        ]
    }

    #[test]
    fn test_from_config_disabled() {
        let config = ArchiveConfig {
            enabled: false,
            dir: PathBuf::from("/tmp"),
        };
        assert!(CanvasArchive::from_config(&config).is_none());
    }

    #[test]
    fn test_from_config_enabled() {
        let config = ArchiveConfig {
            enabled: true,
            dir: PathBuf::from("/tmp/canvas"),
        };
        let archive = CanvasArchive::from_config(&config).unwrap();
        assert_eq!(archive.dir(), Path::new("/tmp/canvas"));
    }

    #[tokio::test]
    async fn test_save_writes_tile_array() {
        let temp = TempDir::new().unwrap();
        let archive = CanvasArchive::new(temp.path().join("canvas"));
        let at = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();

        let path = archive.save_at(&tiles(), at).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "canvas_20240305_140709.json");

        let content = std::fs::read_to_string(&path).unwrap();
        let value: Value = serde_json::from_str(&content).unwrap();
        let array = value.as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["type"], "LINE");
        assert_eq!(array[1]["position"], 1);
        for field in ["title", "type", "content", "data", "position"] {
            assert!(array[0].get(field).is_some(), "missing {}", field);
        }
    }

    #[tokio::test]
    async fn test_save_same_second_does_not_overwrite() {
        let temp = TempDir::new().unwrap();
        let archive = CanvasArchive::new(temp.path());
        let at = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();

        let first = archive.save_at(&tiles(), at).await.unwrap();
        let second = archive.save_at(&tiles()[..1], at).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(second.file_name().unwrap(), "canvas_20240305_140709_1.json");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_in_same_second_keep_every_batch() {
        let temp = TempDir::new().unwrap();
        let archive = std::sync::Arc::new(CanvasArchive::new(temp.path()));
        let at = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let archive = archive.clone();
                tokio::spawn(async move {
                    let batch = vec![Tile::from_spec(TileSpec::new(format!("batch {}", i), TileType::Bar, ""), json!([i]), 0)];
                    archive.save_at(&batch, at).await.unwrap()
                })
            })
            .collect();

        let mut paths = Vec::new();
        for handle in handles {
            paths.push(handle.await.unwrap());
        }
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 8);

        let mut titles: Vec<String> = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|entry| {
                let content = std::fs::read_to_string(entry.unwrap().path()).unwrap();
                let value: Value = serde_json::from_str(&content).unwrap();
                value[0]["title"].as_str().unwrap().to_string()
            })
            .collect();
        titles.sort();
        let expected: Vec<String> = (0..8).map(|i| format!("batch {}", i)).collect();
        assert_eq!(titles, expected);
    }
}

//! canvasiq - prompt-driven dashboard canvases
//!
//! A planner turns a free-text request into a layout of tiles, every tile gets its data
//! from a tool call run concurrently with the others, and the results accumulate in a
//! short-lived in-memory session.

pub mod canvas;
pub mod config;
pub mod error;
pub mod id;
pub mod llm;
pub mod planner;
pub mod service;
pub mod session;
pub mod tools;

pub use error::{CanvasError, Result};

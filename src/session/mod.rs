//! Session Store - short-lived in-memory sessions and their reaper

mod reaper;
mod store;

pub use reaper::{Reaper, ReaperHandle, ReaperStats};
pub use store::{Session, SessionStore};

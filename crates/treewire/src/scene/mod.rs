//! Scene Management
//!
//! Handles loading scene files from disk and building the node tree the
//! resolver looks slots up in.

mod config;
mod loader;
mod tree;

pub use config::*;
pub use loader::*;
pub use tree::*;

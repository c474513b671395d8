//! Treewire - Declarative scene-graph wiring
//!
//! This crate provides the host side of the member resolver and the input
//! dispatcher, including:
//! - An in-memory node tree used as the resolver's lookup collaborator
//! - Scene files declaring classes, nodes, slots, bindings and input to replay
//! - Runtime slot storage for slots declared in scene files
//! - Binding registration and event replay

// Re-export core crates
pub use treewire_runtime;
pub use treewire_types;

// Scene files and the node tree
pub mod scene;

// Plan-sized slot storage
pub mod slots;

// Input bindings
pub mod bindings;

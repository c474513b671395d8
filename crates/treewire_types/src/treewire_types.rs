//! Treewire Types - Core data definitions shared by the resolver and dispatcher
//!
//! This crate contains the pure data structures of the system: node handles,
//! the class hierarchy, slot descriptors and the input event model. It has no
//! runtime behaviour beyond validation and matching helpers.

mod class_db;
mod input;
mod node;
mod slot;

pub use class_db::*;
pub use input::*;
pub use node::*;
pub use slot::*;

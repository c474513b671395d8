//! Treewire Runtime - Slot resolution and input dispatch
//!
//! This crate contains the resolution-plan cache, the member resolver and the
//! ordered input dispatcher. Both are synchronous leaf utilities driven by a
//! host's lifecycle and input callbacks.

pub use treewire_macros::Slots;
pub use treewire_types;

mod dispatcher;
mod plan;
mod resolver;

pub use dispatcher::*;
pub use plan::*;
pub use resolver::*;

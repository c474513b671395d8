// Slot Types - Declarations of node-backed members
//
// A shape (usually a struct deriving `Slots`) declares its slots as a table of
// descriptors. The runtime turns that table into a cached resolution plan and
// writes resolved nodes back through `SlotTarget`.

use serde::{Deserialize, Serialize};

use crate::{NodeRef, ROOT_CLASS};

// ─────────────────────────────────────────────────────────────────────────────
// Slot Descriptor
// ─────────────────────────────────────────────────────────────────────────────

/// Declaration of a single slot on a shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDescriptor {
    /// Member identifier as written in the source (e.g. `_player_label`)
    #[serde(rename = "id")]
    pub slot_id: String,
    /// Class a found node must be assignable to
    #[serde(rename = "class", default = "default_declared_type")]
    pub declared_type: String,
    /// Explicit lookup path; when absent a key is derived from `slot_id`
    #[serde(rename = "path", default, skip_serializing_if = "Option::is_none")]
    pub lookup_hint: Option<String>,
}

fn default_declared_type() -> String {
    ROOT_CLASS.to_string()
}

impl SlotDescriptor {
    /// A slot accepting any node, looked up by its derived name
    pub fn new(slot_id: impl Into<String>) -> Self {
        Self {
            slot_id: slot_id.into(),
            declared_type: default_declared_type(),
            lookup_hint: None,
        }
    }

    /// Set the declared class
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.declared_type = class.into();
        self
    }

    /// Set an explicit lookup path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.lookup_hint = Some(path.into());
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolve State
// ─────────────────────────────────────────────────────────────────────────────

/// Per-instance marker recording that all slots have been assigned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveState {
    resolved: bool,
}

impl ResolveState {
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Set once every slot of the owning instance holds a value
    pub fn mark_resolved(&mut self) {
        self.resolved = true;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Slot Traits
// ─────────────────────────────────────────────────────────────────────────────

/// An instance whose slots can be written by index.
///
/// Indices follow the order of the descriptor table the instance was planned
/// from.
pub trait SlotTarget {
    /// Number of slots this instance exposes
    fn slot_count(&self) -> usize;

    /// Store a resolved node in the slot at `index`
    fn assign_slot(&mut self, index: usize, value: NodeRef);

    fn resolve_state(&self) -> &ResolveState;

    fn resolve_state_mut(&mut self) -> &mut ResolveState;
}

/// A statically known shape with a fixed descriptor table.
///
/// Normally implemented with `#[derive(Slots)]`.
pub trait SlotShape: SlotTarget + 'static {
    /// Human-readable shape name, used in diagnostics
    fn shape_name() -> &'static str;

    /// Slot declarations in declaration order
    fn slot_descriptors() -> Vec<SlotDescriptor>;
}

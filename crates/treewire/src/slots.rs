//! Dynamic Slots
//!
//! A slot target whose layout comes from a plan at runtime rather than from a
//! derived struct. Used for slots declared in scene files.

use treewire_runtime::ResolutionPlan;
use treewire_types::{NodeRef, ResolveState, SlotTarget};

/// Slot storage sized from a plan
#[derive(Debug, Clone, Default)]
pub struct DynamicSlots {
    values: Vec<Option<NodeRef>>,
    state: ResolveState,
}

impl DynamicSlots {
    /// Empty storage with one unassigned slot per planned slot
    pub fn for_plan(plan: &ResolutionPlan) -> Self {
        Self {
            values: vec![None; plan.len()],
            state: ResolveState::default(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&NodeRef> {
        self.values.get(index).and_then(Option::as_ref)
    }

    pub fn values(&self) -> &[Option<NodeRef>] {
        &self.values
    }

    pub fn is_resolved(&self) -> bool {
        self.state.is_resolved()
    }
}

impl SlotTarget for DynamicSlots {
    fn slot_count(&self) -> usize {
        self.values.len()
    }

    fn assign_slot(&mut self, index: usize, value: NodeRef) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = Some(value);
        }
    }

    fn resolve_state(&self) -> &ResolveState {
        &self.state
    }

    fn resolve_state_mut(&mut self) -> &mut ResolveState {
        &mut self.state
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

// Resolution Plans - Per-shape slot tables with precomputed lookup keys
//
// A plan is built once per shape and never changes afterwards. The cache is an
// explicit object owned by whoever resolves, so tests get fresh state by
// constructing a new one.

use std::any::TypeId;
use std::sync::Arc;

use dashmap::DashMap;
use heck::ToUpperCamelCase;
use serde::Serialize;
use tracing::debug;

use treewire_types::{SlotDescriptor, SlotShape};

// ─────────────────────────────────────────────────────────────────────────────
// Lookup Keys
// ─────────────────────────────────────────────────────────────────────────────

/// Default lookup key for a slot without an explicit path.
///
/// Leading underscores are stripped and the rest is converted to upper camel
/// case: `_playerLabel` and `_player_label` both become `PlayerLabel`.
pub fn derive_lookup_key(slot_id: &str) -> String {
    slot_id.trim_start_matches('_').to_upper_camel_case()
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolution Plan
// ─────────────────────────────────────────────────────────────────────────────

/// A slot descriptor paired with the key used to look it up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedSlot {
    #[serde(flatten)]
    pub descriptor: SlotDescriptor,
    /// Hint verbatim, or the key derived from the slot id
    pub key: String,
    /// Whether `key` was derived rather than given
    pub derived: bool,
}

/// Ordered lookup plan for one shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionPlan {
    shape: String,
    slots: Vec<PlannedSlot>,
}

impl ResolutionPlan {
    pub fn shape(&self) -> &str {
        &self.shape
    }

    pub fn slots(&self) -> &[PlannedSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Build a plan from a shape's descriptor table, keeping declaration order
pub fn build_plan(shape: impl Into<String>, descriptors: Vec<SlotDescriptor>) -> ResolutionPlan {
    let slots = descriptors
        .into_iter()
        .map(|descriptor| {
            let (key, derived) = match &descriptor.lookup_hint {
                Some(hint) => (hint.clone(), false),
                None => (derive_lookup_key(&descriptor.slot_id), true),
            };
            PlannedSlot {
                descriptor,
                key,
                derived,
            }
        })
        .collect();

    ResolutionPlan {
        shape: shape.into(),
        slots,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plan Cache
// ─────────────────────────────────────────────────────────────────────────────

/// Memoized plans keyed by shape type
#[derive(Default)]
pub struct PlanCache {
    plans: DashMap<TypeId, Arc<ResolutionPlan>>,
}

impl PlanCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the plan for `S`, building it on first use.
    ///
    /// Every call for the same shape returns the same `Arc`.
    pub fn plan_for<S: SlotShape>(&self) -> Arc<ResolutionPlan> {
        let type_id = TypeId::of::<S>();
        if let Some(plan) = self.plans.get(&type_id) {
            return Arc::clone(plan.value());
        }

        let entry = self.plans.entry(type_id).or_insert_with(|| {
            let plan = build_plan(S::shape_name(), S::slot_descriptors());
            debug!(shape = plan.shape(), slots = plan.len(), "Built resolution plan");
            Arc::new(plan)
        });
        Arc::clone(entry.value())
    }

    /// Check if a plan for `S` has been built
    pub fn contains<S: SlotShape>(&self) -> bool {
        self.plans.contains_key(&TypeId::of::<S>())
    }

    /// Number of cached plans
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

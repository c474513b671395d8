//! Member Resolver
//!
//! Populates an instance's slots from a named-lookup collaborator, exactly once
//! per instance. Each slot is looked up by path or name relative to the owning
//! node first and through the collaborator's unique-name table second.
//!
//! Assignment is all-or-nothing: every slot is looked up and type-checked
//! before any value is written, so a failed call leaves the instance exactly as
//! it was.

use std::sync::Arc;

use tracing::{debug, trace};

use treewire_types::{ClassDb, NodeId, NodeRef, SlotShape, SlotTarget};

use crate::plan::{PlanCache, PlannedSlot, ResolutionPlan};

// ─────────────────────────────────────────────────────────────────────────────
// Lookup Collaborator
// ─────────────────────────────────────────────────────────────────────────────

/// Hierarchical name lookup provided by the host
pub trait NodeLookup {
    /// Find a node by path or child name relative to `owner`
    fn find_by_path_or_name(&self, owner: NodeId, key: &str) -> Option<NodeRef>;

    /// Find a node through the host's unique-name table
    fn find_unique(&self, key: &str) -> Option<NodeRef>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolve Error
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur while resolving an instance
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("Slot '{slot}' of {shape} not found: no node at '{key}' and no unique node '%{key}'")]
    SlotNotFound {
        shape: String,
        slot: String,
        key: String,
    },

    #[error(
        "Node '{node}' of class {found} is not assignable to slot '{slot}' of {shape} (declared {declared})"
    )]
    TypeMismatch {
        shape: String,
        slot: String,
        node: String,
        found: String,
        declared: String,
    },

    #[error("Plan for {shape} has {expected} slots but the instance exposes {found}")]
    ShapeMismatch {
        shape: String,
        expected: usize,
        found: usize,
    },
}

/// Result type for resolution
pub type ResolveResult<T> = Result<T, ResolveError>;

// ─────────────────────────────────────────────────────────────────────────────
// Member Resolver
// ─────────────────────────────────────────────────────────────────────────────

/// Resolves slots against a lookup collaborator, caching plans per shape
pub struct MemberResolver {
    plans: PlanCache,
    classes: Arc<ClassDb>,
}

impl Default for MemberResolver {
    fn default() -> Self {
        Self::new(Arc::new(ClassDb::builtin()))
    }
}

impl MemberResolver {
    /// Create a resolver checking assignability against `classes`
    pub fn new(classes: Arc<ClassDb>) -> Self {
        Self {
            plans: PlanCache::new(),
            classes,
        }
    }

    pub fn classes(&self) -> &ClassDb {
        &self.classes
    }

    pub fn plans(&self) -> &PlanCache {
        &self.plans
    }

    /// Cached plan for `S`
    pub fn plan_for<S: SlotShape>(&self) -> Arc<ResolutionPlan> {
        self.plans.plan_for::<S>()
    }

    /// Check if every slot of `instance` has been assigned
    pub fn is_resolved<T: SlotTarget + ?Sized>(instance: &T) -> bool {
        instance.resolve_state().is_resolved()
    }

    /// Resolve a statically known shape using its cached plan.
    ///
    /// A no-op when the instance is already resolved.
    pub fn resolve<S, L>(&self, instance: &mut S, owner: NodeId, lookup: &L) -> ResolveResult<()>
    where
        S: SlotShape,
        L: NodeLookup + ?Sized,
    {
        if Self::is_resolved(&*instance) {
            return Ok(());
        }
        let plan = self.plans.plan_for::<S>();
        self.resolve_with(instance, owner, &plan, lookup)
    }

    /// Resolve `instance` against an explicit plan.
    ///
    /// Slots are looked up in plan order and processing stops at the first
    /// failure. Values are written only after every slot succeeded, then the
    /// instance is marked resolved.
    pub fn resolve_with<T, L>(
        &self,
        instance: &mut T,
        owner: NodeId,
        plan: &ResolutionPlan,
        lookup: &L,
    ) -> ResolveResult<()>
    where
        T: SlotTarget + ?Sized,
        L: NodeLookup + ?Sized,
    {
        if Self::is_resolved(&*instance) {
            trace!(shape = plan.shape(), %owner, "Already resolved");
            return Ok(());
        }

        if instance.slot_count() != plan.len() {
            return Err(ResolveError::ShapeMismatch {
                shape: plan.shape().to_string(),
                expected: plan.len(),
                found: instance.slot_count(),
            });
        }

        let values = plan
            .slots()
            .iter()
            .map(|slot| self.find_slot_value(plan.shape(), slot, owner, lookup))
            .collect::<ResolveResult<Vec<_>>>()?;

        for (index, value) in values.into_iter().enumerate() {
            instance.assign_slot(index, value);
        }
        instance.resolve_state_mut().mark_resolved();

        debug!(shape = plan.shape(), %owner, slots = plan.len(), "Resolved slots");
        Ok(())
    }

    /// Look up and type-check a single slot
    fn find_slot_value<L>(
        &self,
        shape: &str,
        slot: &PlannedSlot,
        owner: NodeId,
        lookup: &L,
    ) -> ResolveResult<NodeRef>
    where
        L: NodeLookup + ?Sized,
    {
        let descriptor = &slot.descriptor;

        let node = lookup
            .find_by_path_or_name(owner, &slot.key)
            .or_else(|| {
                trace!(slot = %descriptor.slot_id, key = %slot.key, "Falling back to unique lookup");
                lookup.find_unique(&slot.key)
            })
            .ok_or_else(|| ResolveError::SlotNotFound {
                shape: shape.to_string(),
                slot: descriptor.slot_id.clone(),
                key: slot.key.clone(),
            })?;

        if !self
            .classes
            .is_assignable(&node.class, &descriptor.declared_type)
        {
            return Err(ResolveError::TypeMismatch {
                shape: shape.to_string(),
                slot: descriptor.slot_id.clone(),
                node: node.name,
                found: node.class,
                declared: descriptor.declared_type.clone(),
            });
        }

        trace!(slot = %descriptor.slot_id, node = %node, "Slot matched");
        Ok(node)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

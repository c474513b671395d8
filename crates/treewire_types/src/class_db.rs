//! Class Database
//!
//! A single-inheritance class table used to decide whether a node found by a
//! lookup can be stored in a slot declared with a given class. A node of class
//! `Label` is assignable to slots declared `Label`, `Control`, `CanvasItem` or
//! `Node`, but not to a slot declared `Node2D`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The root of every builtin class chain
pub const ROOT_CLASS: &str = "Node";

/// Builtin hierarchy as `(class, parent)` pairs, parents listed before children
const BUILTIN_CLASSES: &[(&str, &str)] = &[
    ("CanvasItem", "Node"),
    ("Node2D", "CanvasItem"),
    ("Sprite2D", "Node2D"),
    ("Camera2D", "Node2D"),
    ("Control", "CanvasItem"),
    ("Label", "Control"),
    ("Button", "Control"),
    ("LineEdit", "Control"),
    ("Panel", "Control"),
    ("TextureRect", "Control"),
    ("Container", "Control"),
    ("VBoxContainer", "Container"),
    ("HBoxContainer", "Container"),
    ("CanvasLayer", "Node"),
    ("Node3D", "Node"),
    ("Camera3D", "Node3D"),
    ("MeshInstance3D", "Node3D"),
    ("Timer", "Node"),
    ("AudioStreamPlayer", "Node"),
    ("AudioStreamPlayer2D", "Node2D"),
    ("Viewport", "Node"),
];

// ─────────────────────────────────────────────────────────────────────────────
// Class Definition
// ─────────────────────────────────────────────────────────────────────────────

/// A class declaration, as read from configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    /// Class name
    pub name: String,
    /// Parent class name (must already be registered)
    pub parent: String,
}

impl ClassDef {
    pub fn new(name: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: parent.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Class Database Error
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur when registering classes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassDbError {
    #[error("Unknown parent class '{parent}' for '{class}'")]
    UnknownParent { class: String, parent: String },
    #[error("Class '{class}' already registered with parent '{existing}'")]
    AlreadyRegistered { class: String, existing: String },
}

// ─────────────────────────────────────────────────────────────────────────────
// Class Database
// ─────────────────────────────────────────────────────────────────────────────

/// Class hierarchy shared between the node host and the resolver
#[derive(Debug, Clone)]
pub struct ClassDb {
    /// Class name -> parent name (`None` for roots)
    parents: HashMap<String, Option<String>>,
}

impl Default for ClassDb {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ClassDb {
    /// Create a database containing only the root class
    pub fn new() -> Self {
        let mut parents = HashMap::new();
        parents.insert(ROOT_CLASS.to_string(), None);
        Self { parents }
    }

    /// Create a database seeded with the builtin scene-graph hierarchy
    pub fn builtin() -> Self {
        let mut db = Self::new();
        for (class, parent) in BUILTIN_CLASSES {
            db.parents
                .insert((*class).to_string(), Some((*parent).to_string()));
        }
        db
    }

    /// Register a class under an existing parent.
    ///
    /// Registering the same class twice with the same parent is a no-op.
    pub fn register(&mut self, def: ClassDef) -> Result<(), ClassDbError> {
        if let Some(existing) = self.parents.get(&def.name) {
            return match existing {
                Some(parent) if *parent == def.parent => Ok(()),
                _ => Err(ClassDbError::AlreadyRegistered {
                    class: def.name,
                    existing: existing.clone().unwrap_or_default(),
                }),
            };
        }
        if !self.parents.contains_key(&def.parent) {
            return Err(ClassDbError::UnknownParent {
                class: def.name,
                parent: def.parent,
            });
        }
        self.parents.insert(def.name, Some(def.parent));
        Ok(())
    }

    /// Check if a class is known
    pub fn contains(&self, class: &str) -> bool {
        self.parents.contains_key(class)
    }

    /// Parent of a class, if it has one
    pub fn parent_of(&self, class: &str) -> Option<&str> {
        self.parents.get(class).and_then(|p| p.as_deref())
    }

    /// Iterate from `class` up to its root, starting with `class` itself.
    /// Unknown classes yield only themselves.
    pub fn ancestors<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        std::iter::successors(Some(class), move |c| self.parent_of(c))
    }

    /// Whether a value of class `actual` may be stored where `declared` is expected
    pub fn is_assignable(&self, actual: &str, declared: &str) -> bool {
        self.ancestors(actual).any(|c| c == declared)
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

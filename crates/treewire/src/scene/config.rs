//! Scene File Types
//!
//! Defines the structure of scene files on disk (`*.scene.toml`).

use serde::{Deserialize, Serialize};

use treewire_types::{ClassDef, InputEvent, SlotDescriptor};

/// A scene file: tree, slots to resolve, and input to replay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneFile {
    pub scene: SceneInfo,
    /// Classes added on top of the builtin hierarchy
    #[serde(default)]
    pub classes: Vec<ClassDef>,
    /// Nodes in creation order; parents must come first
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
    /// Slots of the owner node, in declaration order
    #[serde(default)]
    pub slots: Vec<SlotDescriptor>,
    #[serde(default)]
    pub bindings: Vec<BindingConfig>,
    /// Events to feed through the bindings
    #[serde(default)]
    pub events: Vec<InputEvent>,
}

/// Scene information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneInfo {
    pub name: String,
    /// Path (relative to the root) of the node owning the slots; the root if absent
    #[serde(default)]
    pub owner: Option<String>,
    pub description: Option<String>,
}

/// A node declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Path relative to the root, e.g. `Hud/Panel/PlayerLabel`
    pub path: String,
    #[serde(default = "default_class")]
    pub class: String,
    /// Register the node's name in the unique table
    #[serde(default)]
    pub unique: bool,
}

fn default_class() -> String {
    treewire_types::ROOT_CLASS.to_string()
}

/// An input binding declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingConfig {
    pub name: String,
    /// Template the incoming events are matched against
    pub event: InputEvent,
    #[serde(default = "default_match_pressed")]
    pub match_pressed: bool,
    #[serde(default)]
    pub match_modifiers: bool,
    /// Let later bindings see the event after this one fired
    #[serde(default)]
    pub pass: bool,
    #[serde(default)]
    pub disabled: bool,
}

fn default_match_pressed() -> bool {
    true
}

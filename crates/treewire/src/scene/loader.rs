//! Scene Loader
//!
//! Loads a scene file from disk and builds its class database and node tree.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use treewire_runtime::{build_plan, derive_lookup_key, ResolutionPlan};
use treewire_types::{ClassDb, ClassDbError, NodeId};

use super::config::SceneFile;
use super::tree::{NodeTree, TreeError};

/// Error type for scene loading
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Scene file does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("Failed to read file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("Invalid class declaration: {0}")]
    Class(#[from] ClassDbError),

    #[error("Invalid node '{path}': {source}")]
    Tree {
        path: String,
        #[source]
        source: TreeError,
    },

    #[error("Parent of node '{path}' not found (declare parents first)")]
    MissingParent { path: String },

    #[error("Owner node '{0}' not found")]
    OwnerNotFound(String),

    #[error("Slot '{0}' has an empty lookup key (give it a non-empty path)")]
    EmptySlotKey(String),
}

/// A scene with its tree built
#[derive(Debug)]
pub struct LoadedScene {
    pub file: SceneFile,
    pub classes: Arc<ClassDb>,
    pub tree: NodeTree,
    /// Node owning the declared slots
    pub owner: NodeId,
}

impl LoadedScene {
    pub fn name(&self) -> &str {
        &self.file.scene.name
    }

    /// Resolution plan for the scene's declared slots
    pub fn plan(&self) -> ResolutionPlan {
        build_plan(self.file.scene.name.clone(), self.file.slots.clone())
    }
}

/// Scene loader
pub struct SceneLoader;

impl SceneLoader {
    /// Load a scene from a `*.scene.toml` file
    pub fn load(path: impl AsRef<Path>) -> Result<LoadedScene, LoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LoadError::PathNotFound(path.to_path_buf()));
        }

        info!("Loading scene from: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Build a scene from TOML source
    pub fn parse(content: &str) -> Result<LoadedScene, LoadError> {
        let file: SceneFile = toml::from_str(content)?;

        for slot in &file.slots {
            let key = match &slot.lookup_hint {
                Some(path) => path.clone(),
                None => derive_lookup_key(&slot.slot_id),
            };
            if key.is_empty() {
                return Err(LoadError::EmptySlotKey(slot.slot_id.clone()));
            }
        }

        let mut classes = ClassDb::builtin();
        for def in &file.classes {
            classes.register(def.clone())?;
            debug!(class = %def.name, parent = %def.parent, "Registered class");
        }
        let classes = Arc::new(classes);

        let mut tree = NodeTree::new(Arc::clone(&classes));
        for node in &file.nodes {
            let (parent_path, name) = match node.path.rsplit_once('/') {
                Some((parent, name)) => (parent, name),
                None => ("", node.path.as_str()),
            };
            let parent = match parent_path {
                "" => Some(tree.root()),
                path => tree.get_node(tree.root(), path),
            }
            .ok_or_else(|| LoadError::MissingParent {
                path: node.path.clone(),
            })?;

            let tree_err = |source| LoadError::Tree {
                path: node.path.clone(),
                source,
            };
            let id = tree
                .add_child(parent, name, node.class.clone())
                .map_err(tree_err)?;
            if node.unique {
                tree.set_unique(id).map_err(tree_err)?;
            }
        }

        let owner = match &file.scene.owner {
            Some(path) => tree
                .get_node(tree.root(), path)
                .ok_or_else(|| LoadError::OwnerNotFound(path.clone()))?,
            None => tree.root(),
        };

        info!(
            "Loaded scene '{}': {} nodes, {} slots, {} bindings",
            file.scene.name,
            tree.len(),
            file.slots.len(),
            file.bindings.len()
        );

        Ok(LoadedScene {
            file,
            classes,
            tree,
            owner,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::io::Write;

    use treewire_types::{InputEvent, Key};

    use super::*;

    const HUD_SCENE: &str = r#"
[scene]
name = "Hud"
owner = "Hud"

[[classes]]
name = "ScoreLabel"
parent = "Label"

[[nodes]]
path = "Hud"
class = "CanvasLayer"

[[nodes]]
path = "Hud/Panel"
class = "Panel"

[[nodes]]
path = "Hud/Panel/PlayerLabel"
class = "ScoreLabel"
unique = true

[[nodes]]
path = "Hud/Label"
class = "Label"

[[slots]]
id = "_player_label"
class = "Label"

[[slots]]
id = "label"
class = "Control"

[[bindings]]
name = "jump"
event = { kind = "key", key = "Space", pressed = true }

[[events]]
kind = "key"
key = "Space"
pressed = true
"#;

    #[test]
    fn test_parse_scene() {
        let scene = SceneLoader::parse(HUD_SCENE).unwrap();

        assert_eq!(scene.name(), "Hud");
        assert_eq!(scene.tree.len(), 5);
        assert_eq!(scene.tree.path_of(scene.owner).unwrap(), "/root/Hud");
        assert!(scene.classes.is_assignable("ScoreLabel", "Control"));

        let label = scene.tree.unique("PlayerLabel").unwrap();
        assert_eq!(scene.tree.get(label).unwrap().class, "ScoreLabel");

        assert_eq!(scene.file.bindings.len(), 1);
        assert!(scene.file.bindings[0].match_pressed);
        assert!(!scene.file.bindings[0].pass);
        assert_eq!(
            scene.file.events[0],
            InputEvent::Key(treewire_types::KeyEvent::pressed(Key::Space))
        );
    }

    #[test]
    fn test_plan_from_scene() {
        let scene = SceneLoader::parse(HUD_SCENE).unwrap();
        let plan = scene.plan();

        assert_eq!(plan.shape(), "Hud");
        let keys: Vec<_> = plan.slots().iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, ["PlayerLabel", "Label"]);
    }

    #[test]
    fn test_owner_defaults_to_root() {
        let scene = SceneLoader::parse("[scene]\nname = \"Empty\"\n").unwrap();
        assert_eq!(scene.owner, scene.tree.root());
        assert_eq!(scene.tree.len(), 1);
        assert!(scene.plan().is_empty());
    }

    #[test]
    fn test_missing_parent() {
        let err = SceneLoader::parse(
            r#"
[scene]
name = "Broken"

[[nodes]]
path = "Hud/Label"
class = "Label"
"#,
        )
        .unwrap_err();

        assert!(matches!(err, LoadError::MissingParent { path } if path == "Hud/Label"));
    }

    #[test]
    fn test_unknown_class() {
        let err = SceneLoader::parse(
            r#"
[scene]
name = "Broken"

[[nodes]]
path = "Hud"
class = "Widget"
"#,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            LoadError::Tree {
                source: TreeError::UnknownClass(_),
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_parent_class() {
        let err = SceneLoader::parse(
            r#"
[scene]
name = "Broken"

[[classes]]
name = "Fancy"
parent = "Widget"
"#,
        )
        .unwrap_err();

        assert!(matches!(err, LoadError::Class(ClassDbError::UnknownParent { .. })));
    }

    #[test]
    fn test_empty_slot_keys_rejected() {
        let underscores = SceneLoader::parse(
            r#"
[scene]
name = "Hud"

[[slots]]
id = "_"
"#,
        )
        .unwrap_err();
        assert!(matches!(underscores, LoadError::EmptySlotKey(id) if id == "_"));

        let empty_path = SceneLoader::parse(
            r#"
[scene]
name = "Hud"

[[slots]]
id = "_other"
path = ""
"#,
        )
        .unwrap_err();
        assert!(matches!(empty_path, LoadError::EmptySlotKey(id) if id == "_other"));
    }

    #[test]
    fn test_owner_not_found() {
        let err = SceneLoader::parse("[scene]\nname = \"Hud\"\nowner = \"Nope\"\n").unwrap_err();
        assert!(matches!(err, LoadError::OwnerNotFound(path) if path == "Nope"));
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::Builder::new()
            .suffix(".scene.toml")
            .tempfile()
            .unwrap();
        file.write_all(HUD_SCENE.as_bytes()).unwrap();

        let scene = SceneLoader::load(file.path()).unwrap();
        assert_eq!(scene.name(), "Hud");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SceneLoader::load(dir.path().join("missing.scene.toml")).unwrap_err();
        assert!(matches!(err, LoadError::PathNotFound(_)));
    }
}

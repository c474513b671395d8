//! Node Tree
//!
//! An in-memory scene tree that serves as the resolver's lookup collaborator.
//! Nodes live in an arena indexed by `NodeId`; children keep insertion order.
//!
//! Paths are `/`-separated. `.` is the current node, `..` its parent, a leading
//! `/` starts at the root (whose name must be the first segment), and a segment
//! `%Name` jumps to the node registered under that unique name.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use treewire_runtime::NodeLookup;
use treewire_types::{ClassDb, NodeId, NodeRef, ROOT_CLASS};

/// Name of the node every tree starts with
pub const ROOT_NAME: &str = "root";

/// Prefix marking a unique-name segment
pub const UNIQUE_PREFIX: char = '%';

// ─────────────────────────────────────────────────────────────────────────────
// Tree Error
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur when building a tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("Node not found: {0}")]
    UnknownNode(NodeId),

    #[error("Unknown class: {0}")]
    UnknownClass(String),

    #[error("Invalid node name: '{0}'")]
    InvalidName(String),

    #[error("Node '{parent}' already has a child named '{name}'")]
    DuplicateName { parent: String, name: String },

    #[error("Unique name already taken: %{0}")]
    DuplicateUnique(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Node Tree
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct NodeData {
    name: String,
    class: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    unique: bool,
}

/// Arena-backed scene tree
#[derive(Debug, Clone)]
pub struct NodeTree {
    classes: Arc<ClassDb>,
    nodes: Vec<NodeData>,
    unique: HashMap<String, NodeId>,
}

impl NodeTree {
    /// Create a tree containing only the root node
    pub fn new(classes: Arc<ClassDb>) -> Self {
        let root = NodeData {
            name: ROOT_NAME.to_string(),
            class: ROOT_CLASS.to_string(),
            parent: None,
            children: Vec::new(),
            unique: false,
        };
        Self {
            classes,
            nodes: vec![root],
            unique: HashMap::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn classes(&self) -> &Arc<ClassDb> {
        &self.classes
    }

    fn data(&self, id: NodeId) -> Option<&NodeData> {
        usize::try_from(id.0).ok().and_then(|i| self.nodes.get(i))
    }

    fn data_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        usize::try_from(id.0).ok().and_then(|i| self.nodes.get_mut(i))
    }

    /// Add a node under `parent`
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        class: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        let name = name.into();
        let class = class.into();

        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', ':', UNIQUE_PREFIX])
        {
            return Err(TreeError::InvalidName(name));
        }
        if !self.classes.contains(&class) {
            return Err(TreeError::UnknownClass(class));
        }
        let parent_data = self.data(parent).ok_or(TreeError::UnknownNode(parent))?;
        if self.child(parent, &name).is_some() {
            return Err(TreeError::DuplicateName {
                parent: parent_data.name.clone(),
                name,
            });
        }

        let id = NodeId(self.nodes.len() as u64);
        self.nodes.push(NodeData {
            name,
            class,
            parent: Some(parent),
            children: Vec::new(),
            unique: false,
        });
        if let Some(parent_data) = self.data_mut(parent) {
            parent_data.children.push(id);
        }
        Ok(id)
    }

    /// Register a node's name in the tree-wide unique table
    pub fn set_unique(&mut self, id: NodeId) -> Result<(), TreeError> {
        let name = self.data(id).ok_or(TreeError::UnknownNode(id))?.name.clone();
        match self.unique.get(&name) {
            Some(existing) if *existing == id => return Ok(()),
            Some(_) => return Err(TreeError::DuplicateUnique(name)),
            None => {}
        }
        self.unique.insert(name, id);
        if let Some(data) = self.data_mut(id) {
            data.unique = true;
        }
        Ok(())
    }

    /// Node handle for `id`
    pub fn get(&self, id: NodeId) -> Option<NodeRef> {
        self.data(id)
            .map(|d| NodeRef::new(id, d.name.clone(), d.class.clone()))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).and_then(|d| d.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.data(id).map(|d| d.children.as_slice()).unwrap_or(&[])
    }

    pub fn is_unique(&self, id: NodeId) -> bool {
        self.data(id).is_some_and(|d| d.unique)
    }

    /// Direct child of `parent` named `name`
    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|c| self.data(*c).is_some_and(|d| d.name == name))
    }

    /// Node registered under a unique name
    pub fn unique(&self, name: &str) -> Option<NodeId> {
        self.unique.get(name).copied()
    }

    /// Follow `path` from `owner`. An empty path names no node; use `.` for the owner.
    pub fn get_node(&self, owner: NodeId, path: &str) -> Option<NodeId> {
        self.data(owner)?;
        if path.is_empty() {
            return None;
        }

        let (mut current, rest) = match path.strip_prefix('/') {
            Some(absolute) => {
                let mut segments = absolute.splitn(2, '/');
                if segments.next()? != self.nodes[0].name {
                    return None;
                }
                (self.root(), segments.next().unwrap_or(""))
            }
            None => (owner, path),
        };

        for segment in rest.split('/').filter(|s| !s.is_empty()) {
            current = match segment {
                "." => current,
                ".." => self.parent(current)?,
                _ => match segment.strip_prefix(UNIQUE_PREFIX) {
                    Some(name) => self.unique(name)?,
                    None => self.child(current, segment)?,
                },
            };
        }
        Some(current)
    }

    /// Absolute path of a node, e.g. `/root/Hud/Label`
    pub fn path_of(&self, id: NodeId) -> Option<String> {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            let data = self.data(node)?;
            names.push(data.name.as_str());
            current = data.parent;
        }
        names.reverse();
        Some(format!("/{}", names.join("/")))
    }

    /// All nodes in depth-first pre-order, starting at the root
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        order
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl NodeLookup for NodeTree {
    fn find_by_path_or_name(&self, owner: NodeId, key: &str) -> Option<NodeRef> {
        let found = self.get_node(owner, key).and_then(|id| self.get(id));
        trace!(%owner, key, found = found.is_some(), "Path lookup");
        found
    }

    fn find_unique(&self, key: &str) -> Option<NodeRef> {
        let found = self
            .get_node(self.root(), &format!("{}{}", UNIQUE_PREFIX, key))
            .and_then(|id| self.get(id));
        trace!(key, found = found.is_some(), "Unique lookup");
        found
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use treewire_runtime::{MemberResolver, ResolveError, Slots};
    use treewire_types::ResolveState;

    use super::*;

    /// root
    /// └── Hud (Control)
    ///     ├── Panel (Panel)
    ///     │   └── PlayerLabel (Label, unique)
    ///     ├── Label (Label)
    ///     │   └── AudioStreamPlayer2D
    ///     └── CanvasLayer
    fn hud_tree() -> (NodeTree, NodeId) {
        let mut tree = NodeTree::new(Arc::new(ClassDb::builtin()));
        let hud = tree.add_child(tree.root(), "Hud", "Control").unwrap();
        let panel = tree.add_child(hud, "Panel", "Panel").unwrap();
        let player_label = tree.add_child(panel, "PlayerLabel", "Label").unwrap();
        tree.set_unique(player_label).unwrap();
        let label = tree.add_child(hud, "Label", "Label").unwrap();
        tree.add_child(label, "AudioStreamPlayer2D", "AudioStreamPlayer2D")
            .unwrap();
        tree.add_child(hud, "CanvasLayer", "CanvasLayer").unwrap();
        (tree, hud)
    }

    #[test]
    fn test_relative_and_absolute_paths() {
        let (tree, hud) = hud_tree();
        let label = tree.get_node(hud, "Label").unwrap();
        let player = tree.get_node(hud, "Label/AudioStreamPlayer2D").unwrap();

        assert_eq!(tree.get_node(player, ".."), Some(label));
        assert_eq!(tree.get_node(player, "../.."), Some(hud));
        assert_eq!(tree.get_node(player, "."), Some(player));
        assert_eq!(tree.get_node(player, "/root/Hud/Label"), Some(label));
        assert_eq!(tree.get_node(player, "/elsewhere/Hud"), None);
        assert_eq!(tree.get_node(tree.root(), ".."), None);
        assert_eq!(tree.get_node(hud, "Missing"), None);
    }

    #[test]
    fn test_empty_key_finds_nothing() {
        let (tree, hud) = hud_tree();

        assert_eq!(tree.get_node(hud, ""), None);
        assert_eq!(tree.get_node(hud, "."), Some(hud));
        assert!(tree.find_by_path_or_name(hud, "").is_none());
        assert!(tree.find_unique("").is_none());
    }

    #[test]
    fn test_resolve_empty_key_is_not_found() {
        let (tree, hud_id) = hud_tree();
        let resolver = MemberResolver::new(Arc::clone(tree.classes()));
        let plan = treewire_runtime::build_plan(
            "Hud",
            vec![treewire_types::SlotDescriptor::new("__")],
        );
        let mut slots = crate::slots::DynamicSlots::for_plan(&plan);

        let err = resolver
            .resolve_with(&mut slots, hud_id, &plan, &tree)
            .unwrap_err();

        assert!(matches!(err, ResolveError::SlotNotFound { key, .. } if key.is_empty()));
        assert!(slots.get(0).is_none());
    }

    #[test]
    fn test_unique_segments() {
        let (tree, hud) = hud_tree();
        let player_label = tree.get_node(hud, "Panel/PlayerLabel").unwrap();

        assert_eq!(tree.get_node(hud, "%PlayerLabel"), Some(player_label));
        assert_eq!(tree.get_node(tree.root(), "%PlayerLabel/.."), tree.get_node(hud, "Panel"));
        assert!(tree.is_unique(player_label));
        assert_eq!(tree.find_unique("PlayerLabel").unwrap().class, "Label");
        assert!(tree.find_unique("Label").is_none());
    }

    #[test]
    fn test_path_of_and_walk() {
        let (tree, hud) = hud_tree();
        let player = tree.get_node(hud, "Label/AudioStreamPlayer2D").unwrap();

        assert_eq!(tree.path_of(player).unwrap(), "/root/Hud/Label/AudioStreamPlayer2D");
        assert_eq!(tree.path_of(tree.root()).unwrap(), "/root");

        let names: Vec<_> = tree
            .walk()
            .into_iter()
            .map(|id| tree.get(id).unwrap().name)
            .collect();
        assert_eq!(
            names,
            vec!["root", "Hud", "Panel", "PlayerLabel", "Label", "AudioStreamPlayer2D", "CanvasLayer"]
        );
    }

    #[test]
    fn test_add_child_validation() {
        let (mut tree, hud) = hud_tree();

        assert_eq!(
            tree.add_child(hud, "Label", "Label"),
            Err(TreeError::DuplicateName {
                parent: "Hud".to_string(),
                name: "Label".to_string(),
            })
        );
        assert_eq!(
            tree.add_child(hud, "Thing", "Gizmo"),
            Err(TreeError::UnknownClass("Gizmo".to_string()))
        );
        assert!(matches!(tree.add_child(hud, "a/b", "Node"), Err(TreeError::InvalidName(_))));
        assert!(matches!(tree.add_child(hud, "%x", "Node"), Err(TreeError::InvalidName(_))));
        assert_eq!(
            tree.add_child(NodeId(99), "Orphan", "Node"),
            Err(TreeError::UnknownNode(NodeId(99)))
        );
    }

    #[test]
    fn test_duplicate_unique_name() {
        let (mut tree, hud) = hud_tree();
        let other_panel = tree.add_child(hud, "Other", "Panel").unwrap();
        let clash = tree.add_child(other_panel, "PlayerLabel", "Label").unwrap();

        assert_eq!(
            tree.set_unique(clash),
            Err(TreeError::DuplicateUnique("PlayerLabel".to_string()))
        );
        let original = tree.unique("PlayerLabel").unwrap();
        assert!(tree.set_unique(original).is_ok());
    }

    #[derive(Default, Slots)]
    struct Hud {
        #[slot(class = "Label")]
        _player_label: Option<NodeRef>,
        #[slot(path = "Label/AudioStreamPlayer2D", class = "AudioStreamPlayer2D")]
        _player: Option<NodeRef>,
        #[slot]
        _canvas_layer: Option<NodeRef>,
        #[slot(class = "Label")]
        label: Option<NodeRef>,
        #[resolve_state]
        state: ResolveState,
    }

    #[test]
    fn test_resolve_against_tree() {
        let (tree, hud_id) = hud_tree();
        let resolver = MemberResolver::new(Arc::clone(tree.classes()));
        let mut hud = Hud::default();

        resolver.resolve(&mut hud, hud_id, &tree).unwrap();

        // PlayerLabel is not a direct child; found through the unique table
        let player_label = hud._player_label.unwrap();
        assert_eq!(tree.path_of(player_label.id).unwrap(), "/root/Hud/Panel/PlayerLabel");
        assert_eq!(hud._player.unwrap().class, "AudioStreamPlayer2D");
        assert_eq!(hud._canvas_layer.unwrap().name, "CanvasLayer");
        assert_eq!(hud.label.unwrap().name, "Label");
    }

    #[test]
    fn test_resolve_type_mismatch_against_tree() {
        #[derive(Default, Slots)]
        struct Wrong {
            #[slot(class = "Node2D")]
            label: Option<NodeRef>,
            #[resolve_state]
            state: ResolveState,
        }

        let (tree, hud_id) = hud_tree();
        let resolver = MemberResolver::new(Arc::clone(tree.classes()));
        let mut wrong = Wrong::default();

        let err = resolver.resolve(&mut wrong, hud_id, &tree).unwrap_err();
        assert!(matches!(err, ResolveError::TypeMismatch { .. }));
        assert!(wrong.label.is_none());
    }
}

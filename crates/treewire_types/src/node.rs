// Node handles - lightweight references to nodes owned by a lookup collaborator
//
// The resolver never owns nodes. It receives `NodeRef`s from whatever hosts the
// tree and stores them in slots.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a node inside its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A resolved reference to a node: identity, name and runtime class
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub id: NodeId,
    pub name: String,
    pub class: String,
}

impl NodeRef {
    pub fn new(id: NodeId, name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            class: class.into(),
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}{}", self.name, self.class, self.id)
    }
}

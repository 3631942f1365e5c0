//! Deduplicated node storage: an arena plus an identity index.
//!
//! Insertion is the only way a node enters the set. A candidate whose
//! [`NodeKey`] is already present is merged into the existing slot instead of
//! being stored twice, so a [`NodeId`] is unique per identity.

use crate::node::{Node, NodeId, NodeKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// What happens to a duplicate candidate's group tags on insertion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupMergePolicy {
    /// `existing.group |= candidate.group`.
    #[default]
    Union,
    /// Keep the existing node untouched and drop the candidate's tags.
    KeepFirst,
}

impl FromStr for GroupMergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "union" => Ok(Self::Union),
            "keep_first" | "keep-first" => Ok(Self::KeepFirst),
            other => Err(format!("unknown group merge policy: {}", other)),
        }
    }
}

/// Result of inserting a candidate node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The candidate was new and now lives at this id.
    Added(NodeId),
    /// An equal node already existed at this id; the candidate was merged.
    Merged(NodeId),
}

impl Insertion {
    pub fn id(self) -> NodeId {
        match self {
            Self::Added(id) | Self::Merged(id) => id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NodeSet {
    nodes: Vec<Node>,
    index: HashMap<NodeKey, NodeId>,
}

impl NodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `node`, or merge it into the equal node already stored.
    pub fn insert(&mut self, node: Node, policy: GroupMergePolicy) -> Insertion {
        if let Some(&id) = self.index.get(node.key()) {
            if policy == GroupMergePolicy::Union {
                self.nodes[id.0].group.extend(node.group);
            }
            return Insertion::Merged(id);
        }
        let id = NodeId(self.nodes.len());
        self.index.insert(node.key().clone(), id);
        self.nodes.push(node);
        Insertion::Added(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn find(&self, key: &NodeKey) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Consume the set, yielding nodes in insertion order.
    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }
}

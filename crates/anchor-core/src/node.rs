//! Graph nodes: identity, bundles, and neighbor bookkeeping.
//!
//! A node's identity is its [`NodeKey`] (`subtype_name` + `value`). Group
//! membership, neighbors and the independence flag are metadata and never
//! participate in equality or hashing.

use crate::error::GraphError;
use crate::value::{Primitive, sequence_from_json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Handle to a node owned by an [`AnchoredGraph`](crate::graph::AnchoredGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Identity of a node: two nodes with equal keys are the same entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    pub subtype_name: String,
    pub value: Box<[Primitive]>,
}

impl NodeKey {
    pub fn new(subtype_name: impl Into<String>, value: Vec<Primitive>) -> Self {
        Self {
            subtype_name: subtype_name.into(),
            value: value.into_boxed_slice(),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.subtype_name)?;
        for (i, v) in self.value.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, ")")
    }
}

/// Structural tag for a node. Only anchors are tagged today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Root,
}

/// Traversal marker. Reserved; nothing in this crate reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    #[default]
    Black,
    Gray,
    White,
}

/// One entity instance, or a bundle of same-typed raw values awaiting a split.
#[derive(Debug, Clone)]
pub struct Node {
    key: NodeKey,
    /// `true` for an atomic entity, `false` for a bundle.
    pub independent: bool,
    /// Source-record group indices this node participates in.
    pub group: BTreeSet<usize>,
    pub level: Option<Level>,
    pub color: Color,
    /// Extra attributes merged onto the node at construction.
    pub attributes: BTreeMap<String, String>,
    neighbors: Vec<NodeId>,
}

/// Point-in-time copy of a node's attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub subtype_name: String,
    pub value: Vec<Primitive>,
    pub independent: bool,
    pub group: BTreeSet<usize>,
    pub neighbors: Vec<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    pub color: Color,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    pub object_length: usize,
}

impl Node {
    /// Create a node from an already-typed value sequence.
    pub fn new(subtype_name: impl Into<String>, value: Vec<Primitive>, independent: bool) -> Self {
        Self {
            key: NodeKey::new(subtype_name, value),
            independent,
            group: BTreeSet::new(),
            level: None,
            color: Color::default(),
            attributes: BTreeMap::new(),
            neighbors: Vec::new(),
        }
    }

    /// Create a node from a raw JSON field value.
    ///
    /// Scalars become one-element sequences; lists must hold only ints and
    /// strings.
    pub fn from_json(
        subtype_name: impl Into<String>,
        value: &Value,
        independent: bool,
    ) -> Result<Self, GraphError> {
        let subtype_name = subtype_name.into();
        let value = sequence_from_json(&subtype_name, value)?;
        Ok(Self::new(subtype_name, value, independent))
    }

    /// Tag this node as an anchor.
    #[must_use]
    pub fn as_root(mut self) -> Self {
        self.level = Some(Level::Root);
        self
    }

    #[must_use]
    pub fn with_group(mut self, group_index: usize) -> Self {
        self.group.insert(group_index);
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    pub fn subtype_name(&self) -> &str {
        &self.key.subtype_name
    }

    pub fn value(&self) -> &[Primitive] {
        &self.key.value
    }

    pub fn neighbors(&self) -> &[NodeId] {
        &self.neighbors
    }

    pub fn is_root(&self) -> bool {
        self.level == Some(Level::Root)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Primitive> {
        self.key.value.iter()
    }

    pub fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            subtype_name: self.key.subtype_name.clone(),
            value: self.key.value.to_vec(),
            independent: self.independent,
            group: self.group.clone(),
            neighbors: self.neighbors.clone(),
            level: self.level,
            color: self.color,
            attributes: self.attributes.clone(),
            object_length: self.key.value.len(),
        }
    }

    /// Derive one atomic node with the same subtype from a bundle.
    ///
    /// The new node has an empty group set; callers tag it.
    pub fn create_independent(&self, value: Primitive) -> Result<Node, GraphError> {
        if self.independent {
            return Err(GraphError::NotABundle(self.key.to_string()));
        }
        Ok(Node::new(self.key.subtype_name.clone(), vec![value], true))
    }

    /// Expand a bundle into atomic nodes, each carrying the bundle's groups.
    ///
    /// Repeated raw values yield equal nodes; deduplication is left to the
    /// node set they are inserted into.
    pub fn split(&self) -> Result<Vec<Node>, GraphError> {
        let mut atoms = Vec::with_capacity(self.key.value.len());
        for v in self.iter() {
            let mut atom = self.create_independent(v.clone())?;
            atom.group.clone_from(&self.group);
            atoms.push(atom);
        }
        Ok(atoms)
    }

    /// Add a neighbor unless it is already present. Returns `true` if added.
    pub fn add_neighbor(&mut self, id: NodeId) -> bool {
        if self.neighbors.contains(&id) {
            return false;
        }
        self.neighbors.push(id);
        true
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.key, f)
    }
}

impl<'a> IntoIterator for &'a Node {
    type Item = &'a Primitive;
    type IntoIter = std::slice::Iter<'a, Primitive>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(node: &Node) -> u64 {
        let mut h = DefaultHasher::new();
        node.hash(&mut h);
        h.finish()
    }

    #[test]
    fn test_identity_ignores_metadata() {
        let a = Node::new("tags", vec![1.into()], true).with_group(0);
        let mut b = Node::new("tags", vec![1.into()], false).with_group(7);
        b.add_neighbor(NodeId(3));

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_identity_distinguishes_subtype_and_value() {
        let a = Node::new("tags", vec![1.into()], true);
        assert_ne!(a, Node::new("ids", vec![1.into()], true));
        assert_ne!(a, Node::new("tags", vec![2.into()], true));
        assert_ne!(a, Node::new("tags", vec!["1".into()], true));
    }

    #[test]
    fn test_metadata_object_length() {
        let scalar = Node::from_json("id", &json!(3), true).unwrap();
        assert_eq!(scalar.metadata().object_length, 1);

        let bundle = Node::from_json("tags", &json!([1, 2, 3]), false).unwrap();
        let meta = bundle.metadata();
        assert_eq!(meta.object_length, 3);
        assert_eq!(meta.object_length, bundle.value().len());
        assert!(!meta.independent);
    }

    #[test]
    fn test_metadata_includes_attributes_and_level() {
        let node = Node::new("id", vec![1.into()], true)
            .as_root()
            .with_attribute("source", "members");
        let meta = node.metadata();
        assert_eq!(meta.level, Some(Level::Root));
        assert_eq!(meta.color, Color::Black);
        assert_eq!(meta.attributes["source"], "members");
    }

    #[test]
    fn test_add_neighbor_is_idempotent() {
        let mut node = Node::new("id", vec![1.into()], true);
        assert!(node.add_neighbor(NodeId(4)));
        assert!(!node.add_neighbor(NodeId(4)));
        assert_eq!(node.neighbors().len(), 1);
    }

    #[test]
    fn test_create_independent_on_bundle() {
        let bundle = Node::new("tags", vec![1.into(), 2.into()], false).with_group(2);
        let atom = bundle.create_independent(Primitive::Int(2)).unwrap();
        assert_eq!(atom.subtype_name(), "tags");
        assert_eq!(atom.value(), &[Primitive::Int(2)]);
        assert!(atom.independent);
        assert!(atom.group.is_empty());
    }

    #[test]
    fn test_create_independent_rejects_independent_node() {
        let node = Node::new("id", vec![1.into()], true);
        assert!(matches!(
            node.create_independent(Primitive::Int(1)),
            Err(GraphError::NotABundle(_))
        ));
    }

    #[test]
    fn test_split_tags_atoms_with_bundle_group() {
        let bundle = Node::new("tags", vec![1.into(), 2.into(), 1.into()], false).with_group(5);
        let atoms = bundle.split().unwrap();
        assert_eq!(atoms.len(), 3);
        assert!(atoms.iter().all(|a| a.independent));
        assert!(atoms.iter().all(|a| a.group == BTreeSet::from([5])));
        assert_eq!(atoms[0], atoms[2]);
    }

    #[test]
    fn test_iteration_is_restartable() {
        let node = Node::new("tags", vec![3.into(), "x".into()], false);
        let first: Vec<_> = node.iter().cloned().collect();
        let second: Vec<_> = (&node).into_iter().cloned().collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![Primitive::Int(3), Primitive::from("x")]);
    }

    #[test]
    fn test_display() {
        let node = Node::new("tags", vec![1.into(), "a".into()], false);
        assert_eq!(node.to_string(), r#"tags(1, "a")"#);
    }
}

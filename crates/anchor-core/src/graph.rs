//! Anchored bipartite graph: construction pipeline and queries.
//!
//! One side of the graph holds root (anchor) nodes, the other side holds
//! branch nodes. A root and a branch are adjacent exactly when their group
//! sets intersect, i.e. they came out of the same source record position.

use crate::error::GraphError;
use crate::node::{Node, NodeId, NodeKey};
use crate::node_set::{GroupMergePolicy, NodeSet};
use crate::record::{Record, RecordGroups, Vertex, VertexGroup};
use crate::value::{Primitive, json_kind};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Deref;

/// Owned node ids mapped to the group indices they were seen with during one
/// build step.
pub type GroupedNodes = BTreeMap<NodeId, BTreeSet<usize>>;

/// Knobs for graph construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// How a recurring root value merges its group tags.
    pub root_groups: GroupMergePolicy,
}

/// The graph. Exclusively owns every node it contains.
#[derive(Debug, Clone, Default)]
pub struct AnchoredGraph {
    nodes: NodeSet,
    options: BuildOptions,
}

/// Borrowed handle to an owned node.
#[derive(Clone, Copy)]
pub struct NodeRef<'g> {
    id: NodeId,
    node: &'g Node,
    graph: &'g AnchoredGraph,
}

impl<'g> NodeRef<'g> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node(&self) -> &'g Node {
        self.node
    }

    /// Adjacent nodes, in insertion order.
    pub fn neighbors(&self) -> impl Iterator<Item = NodeRef<'g>> + use<'g> {
        let graph = self.graph;
        let ids: &'g [NodeId] = self.node.neighbors();
        ids.iter().filter_map(move |&id| graph.node(id))
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("node", self.node)
            .finish()
    }
}

impl Deref for NodeRef<'_> {
    type Target = Node;

    fn deref(&self) -> &Node {
        self.node
    }
}

/// Node and edge counts for a built graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub root_nodes: usize,
    pub total_edges: usize,
    /// Node count per subtype name.
    pub subtypes: BTreeMap<String, usize>,
}

impl AnchoredGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: BuildOptions) -> Self {
        Self {
            nodes: NodeSet::new(),
            options,
        }
    }

    pub fn options(&self) -> BuildOptions {
        self.options
    }

    /// Build the graph from grouped records and return the root nodes.
    ///
    /// Every record list in `record_groups` is walked; list elements that are
    /// objects are staged as records with their list position as group index,
    /// anything else is skipped. All records are staged before any node is
    /// admitted, so an error leaves the graph exactly as it was.
    ///
    /// Returns `None` if the graph owns no nodes afterwards.
    pub fn build_graph<'g>(
        &'g mut self,
        record_groups: &RecordGroups,
        root_name: &str,
        branch_names: &[&str],
    ) -> Result<Option<impl Iterator<Item = NodeRef<'g>> + use<'g>>, GraphError> {
        let mut staged = Vec::new();
        for (category, entries) in record_groups {
            let Value::Array(entries) = entries else {
                tracing::debug!(
                    category = %category,
                    kind = json_kind(entries),
                    "skipping category that is not a list"
                );
                continue;
            };
            for (index, entry) in entries.iter().enumerate() {
                let Value::Object(record) = entry else {
                    tracing::debug!(category = %category, index, "skipping non-record entry");
                    continue;
                };
                staged.push(VertexGroup::stage(record, root_name, false, index)?);
            }
        }

        for group in &mut staged {
            self.anchor_root(group);
        }
        let roots = self.collect_roots(&staged);

        let mut edges = 0;
        for &branch_name in branch_names {
            if branch_name == root_name {
                tracing::warn!(
                    branch = branch_name,
                    "root field cannot be its own branch; skipping"
                );
                continue;
            }
            let branches = self.locate_graph_link(&staged, branch_name)?;
            if branches.is_empty() {
                tracing::debug!(branch = branch_name, "no record carries this branch field");
                continue;
            }
            edges += self.initialize_connection(&branches, &roots);
        }

        tracing::debug!(
            records = staged.len(),
            roots = roots.len(),
            nodes = self.nodes.len(),
            edges,
            "built anchored graph"
        );
        Ok(self.find_nodes_subtype(root_name))
    }

    /// Stage one record and admit its root node.
    ///
    /// Non-root fields stay detached in the returned working map until
    /// [`locate_graph_link`](Self::locate_graph_link) resolves them. A record
    /// that fails to stage does not touch the graph.
    pub fn initialize_vertices(
        &mut self,
        record: &Record,
        root_name: &str,
        independent: bool,
        group_index: usize,
    ) -> Result<VertexGroup, GraphError> {
        let mut group = VertexGroup::stage(record, root_name, independent, group_index)?;
        self.anchor_root(&mut group);
        Ok(group)
    }

    /// Admitted roots of `vertex_groups` with the group indices of the working
    /// maps they came from.
    ///
    /// A root seen in several maps follows the configured
    /// [`GroupMergePolicy`]: with `KeepFirst` only its first group counts.
    pub fn collect_roots(&self, vertex_groups: &[VertexGroup]) -> GroupedNodes {
        let mut roots = GroupedNodes::new();
        for group in vertex_groups {
            let Some(id) = group.root() else { continue };
            match roots.get_mut(&id) {
                None => {
                    roots.insert(id, BTreeSet::from([group.group_index]));
                }
                Some(groups) if self.options.root_groups == GroupMergePolicy::Union => {
                    groups.insert(group.group_index);
                }
                Some(_) => {}
            }
        }
        roots
    }

    /// Resolve the `branch_name` field of every working map into owned nodes.
    ///
    /// Independent nodes are taken as-is, bundles are split into atomic nodes
    /// carrying the bundle's group index. Duplicates collapse with their group
    /// sets unioned. The bundles themselves are never admitted.
    ///
    /// Each returned id maps to the groups found in `vertex_groups` only.
    /// Groups the owned node picked up in earlier builds are not included.
    pub fn locate_graph_link(
        &mut self,
        vertex_groups: &[VertexGroup],
        branch_name: &str,
    ) -> Result<GroupedNodes, GraphError> {
        let mut shared = NodeSet::new();
        let mut resolved = GroupedNodes::new();
        for group in vertex_groups {
            match group.get(branch_name) {
                None => {}
                Some(Vertex::Anchored(id)) => {
                    resolved.entry(*id).or_default().insert(group.group_index);
                }
                Some(Vertex::Detached(node)) if node.independent => {
                    shared.insert(node.clone(), GroupMergePolicy::Union);
                }
                Some(Vertex::Detached(bundle)) => {
                    for atom in bundle.split()? {
                        shared.insert(atom, GroupMergePolicy::Union);
                    }
                }
            }
        }

        for node in shared.into_nodes() {
            let groups = node.group.clone();
            let id = self.nodes.insert(node, GroupMergePolicy::Union).id();
            resolved.entry(id).or_default().extend(groups);
        }
        Ok(resolved)
    }

    /// Connect every root/branch pair whose group sets intersect.
    ///
    /// Only the groups carried in the two maps are compared, never the
    /// accumulated `group` of the owned nodes. Returns the number of edges
    /// that did not exist before.
    pub fn initialize_connection(
        &mut self,
        branch_nodes: &GroupedNodes,
        root_nodes: &GroupedNodes,
    ) -> usize {
        let mut added = 0;
        for (&root, root_groups) in root_nodes {
            for (&branch, branch_groups) in branch_nodes {
                if !root_groups.is_disjoint(branch_groups) && self.add_edge(root, branch) {
                    added += 1;
                }
            }
        }
        added
    }

    /// Insert an undirected edge. No-op unless both endpoints are owned and
    /// distinct. Returns `true` if either side gained a neighbor.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> bool {
        if a == b || !self.nodes.contains(a) || !self.nodes.contains(b) {
            return false;
        }
        let mut added = false;
        if let Some(node) = self.nodes.get_mut(a) {
            added |= node.add_neighbor(b);
        }
        if let Some(node) = self.nodes.get_mut(b) {
            added |= node.add_neighbor(a);
        }
        added
    }

    /// Record `neighbor` on `node` only (one direction).
    pub fn add_neighbor(&mut self, node: NodeId, neighbor: NodeId) -> Result<bool, GraphError> {
        if !self.nodes.contains(neighbor) {
            return Err(GraphError::InvalidArgument(format!(
                "{} is not a node of this graph",
                neighbor
            )));
        }
        let target = self.nodes.get_mut(node).ok_or_else(|| {
            GraphError::InvalidArgument(format!("{} is not a node of this graph", node))
        })?;
        Ok(target.add_neighbor(neighbor))
    }

    /// Owned nodes with the given subtype name, lazily.
    ///
    /// `None` means the graph has no nodes at all; an existing graph with no
    /// matches yields an empty iterator.
    pub fn find_nodes_subtype<'g>(
        &'g self,
        name: &str,
    ) -> Option<impl Iterator<Item = NodeRef<'g>> + use<'g>> {
        if self.nodes.is_empty() {
            return None;
        }
        let name = name.to_string();
        Some(
            self.nodes
                .iter()
                .filter(move |(_, node)| node.subtype_name() == name)
                .map(move |(id, node)| NodeRef {
                    id,
                    node,
                    graph: self,
                }),
        )
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.nodes.get(id).map(|node| NodeRef {
            id,
            node,
            graph: self,
        })
    }

    /// Look a node up by identity.
    pub fn find(&self, subtype_name: &str, value: &[Primitive]) -> Option<NodeRef<'_>> {
        let id = self.nodes.find(&NodeKey::new(subtype_name, value.to_vec()))?;
        self.node(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeRef<'_>> {
        self.nodes.iter().map(|(id, node)| NodeRef {
            id,
            node,
            graph: self,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of distinct undirected edges.
    pub fn edge_count(&self) -> usize {
        let mut pairs = BTreeSet::new();
        for (id, node) in self.nodes.iter() {
            for &other in node.neighbors() {
                pairs.insert((id.min(other), id.max(other)));
            }
        }
        pairs.len()
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            total_nodes: self.nodes.len(),
            total_edges: self.edge_count(),
            ..GraphStats::default()
        };
        for (_, node) in self.nodes.iter() {
            if node.is_root() {
                stats.root_nodes += 1;
            }
            *stats
                .subtypes
                .entry(node.subtype_name().to_string())
                .or_default() += 1;
        }
        stats
    }

    fn anchor_root(&mut self, group: &mut VertexGroup) {
        if let Some((field_name, node)) = group.take_root() {
            let id = self.nodes.insert(node, self.options.root_groups).id();
            group.anchor(field_name, id);
        }
    }
}

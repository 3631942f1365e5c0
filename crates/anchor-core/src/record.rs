//! Per-record working maps produced while staging input records.

use crate::error::GraphError;
use crate::node::{Node, NodeId};
use crate::value::{Primitive, json_kind};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A single per-group record: field name → raw value.
pub type Record = Map<String, Value>;

/// The full input: category label → ordered list of records (or other values,
/// which are skipped).
pub type RecordGroups = Map<String, Value>;

/// A node referenced from a working map.
#[derive(Debug, Clone)]
pub enum Vertex {
    /// A root node already admitted into the graph.
    Anchored(NodeId),
    /// A node not owned by any graph yet: a branch node or a bundle.
    Detached(Node),
}

/// Working map for one record: every field of the record turned into a node.
#[derive(Debug, Clone)]
pub struct VertexGroup {
    pub group_index: usize,
    fields: BTreeMap<String, Vertex>,
}

impl VertexGroup {
    /// Convert every field of `record` into a node without touching any graph.
    ///
    /// The root field must hold a single int or string and becomes an
    /// independent node tagged as a root. Every other field becomes one node
    /// with the given `independent` flag holding the whole field value.
    pub fn stage(
        record: &Record,
        root_name: &str,
        independent: bool,
        group_index: usize,
    ) -> Result<Self, GraphError> {
        let mut fields = BTreeMap::new();
        for (field_name, field_value) in record {
            let node = if field_name == root_name {
                if matches!(field_value, Value::Array(_)) {
                    return Err(GraphError::type_mismatch(
                        field_name.as_str(),
                        "a single int or str",
                        json_kind(field_value),
                    ));
                }
                let value = Primitive::from_json(field_name, field_value)?;
                Node::new(field_name.as_str(), vec![value], true).as_root()
            } else {
                Node::from_json(field_name.as_str(), field_value, independent)?
            };
            fields.insert(field_name.clone(), Vertex::Detached(node.with_group(group_index)));
        }
        Ok(Self {
            group_index,
            fields,
        })
    }

    /// Look up a field's vertex. Records need not carry every field.
    pub fn get(&self, field_name: &str) -> Option<&Vertex> {
        self.fields.get(field_name)
    }

    /// The admitted root of this record, if it had one.
    pub fn root(&self) -> Option<NodeId> {
        self.fields.values().find_map(|v| match v {
            Vertex::Anchored(id) => Some(*id),
            Vertex::Detached(_) => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Vertex)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Take out the staged root node for admission, leaving a placeholder to
    /// be replaced by [`VertexGroup::anchor`].
    pub(crate) fn take_root(&mut self) -> Option<(String, Node)> {
        let name = self.fields.iter().find_map(|(k, v)| match v {
            Vertex::Detached(node) if node.is_root() => Some(k.clone()),
            _ => None,
        })?;
        match self.fields.remove(&name) {
            Some(Vertex::Detached(node)) => Some((name, node)),
            _ => None,
        }
    }

    pub(crate) fn anchor(&mut self, field_name: String, id: NodeId) {
        self.fields.insert(field_name, Vertex::Anchored(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_stage_root_and_bundle() {
        let rec = record(json!({"id": 3, "tags": [1, 2, 3]}));
        let group = VertexGroup::stage(&rec, "id", false, 4).unwrap();

        assert_eq!(group.group_index, 4);
        assert_eq!(group.len(), 2);
        let Some(Vertex::Detached(root)) = group.get("id") else {
            panic!("root should be staged detached");
        };
        assert!(root.is_root());
        assert!(root.independent);
        assert_eq!(root.value(), &[Primitive::Int(3)]);

        let Some(Vertex::Detached(tags)) = group.get("tags") else {
            panic!("tags should be staged detached");
        };
        assert!(!tags.independent);
        assert_eq!(tags.value().len(), 3);
        assert!(tags.group.contains(&4));
    }

    #[test]
    fn test_stage_rejects_list_root() {
        let rec = record(json!({"id": [1, 2], "tags": [1]}));
        let err = VertexGroup::stage(&rec, "id", false, 0).unwrap_err();
        assert_eq!(
            err,
            GraphError::TypeMismatch {
                field: "id".into(),
                expected: "a single int or str",
                found: "list",
            }
        );
    }

    #[test]
    fn test_stage_rejects_bad_branch_element() {
        let rec = record(json!({"id": 1, "tags": [1, null]}));
        assert!(matches!(
            VertexGroup::stage(&rec, "id", false, 0),
            Err(GraphError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_field_is_none() {
        let rec = record(json!({"id": 1}));
        let group = VertexGroup::stage(&rec, "id", false, 0).unwrap();
        assert!(group.get("tags").is_none());
        assert!(group.root().is_none());
    }

    #[test]
    fn test_take_root_then_anchor() {
        let rec = record(json!({"id": "a", "tags": ["x"]}));
        let mut group = VertexGroup::stage(&rec, "id", false, 0).unwrap();

        let (name, node) = group.take_root().unwrap();
        assert_eq!(name, "id");
        assert_eq!(node.value(), &[Primitive::from("a")]);

        group.anchor(name, NodeId(9));
        assert_eq!(group.root(), Some(NodeId(9)));
        assert!(group.take_root().is_none());
    }
}

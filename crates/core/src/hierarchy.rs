use serde::{Deserialize, Serialize};

use crate::error::ChartError;
use crate::geometry::{Point, Polygon};
use crate::model::Datum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl Default for NodeId {
    fn default() -> Self {
        NodeId(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Root,
    Group,
    Leaf,
}

/// One node of the two-level chart hierarchy. Polygons and sites start out
/// empty and are filled in by the tessellator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
    pub depth: u8,
    /// Leaf key (symbol) or group key (country); empty for the root.
    pub key: String,
    /// Display name; for groups this is the group key itself.
    pub name: String,
    pub icon: Option<String>,
    pub value: f64,
    pub children: Vec<NodeId>,
    pub polygon: Option<Polygon>,
    pub site: Option<Point>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hierarchy {
    pub root: NodeId,
    pub nodes: Vec<Node>,
}

impl Hierarchy {
    /// Group records by their group key (first-seen order) under a single
    /// root, summing values bottom-up. Rejects datasets the tessellator
    /// cannot handle before any layout work happens.
    pub fn build<D: Datum>(records: &[D]) -> Result<Self, ChartError> {
        if records.is_empty() {
            return Err(ChartError::EmptyDataset);
        }
        for r in records {
            let v = r.value();
            if !v.is_finite() {
                return Err(ChartError::NonFiniteValue {
                    key: r.key().to_string(),
                });
            }
            if v < 0.0 {
                return Err(ChartError::NegativeValue {
                    key: r.key().to_string(),
                    value: v,
                });
            }
        }

        let mut nodes: Vec<Node> = Vec::with_capacity(records.len() + 8);
        nodes.push(Node {
            id: NodeId(0),
            parent: None,
            kind: NodeKind::Root,
            depth: 0,
            key: String::new(),
            name: String::new(),
            icon: None,
            value: 0.0,
            children: Vec::new(),
            polygon: None,
            site: None,
        });

        // first-seen group order, looked up linearly; group counts are tiny
        let mut group_ids: Vec<(String, NodeId)> = Vec::new();
        for r in records {
            let gid = match group_ids.iter().find(|(g, _)| g.as_str() == r.group()) {
                Some((_, id)) => *id,
                None => {
                    let id = NodeId(nodes.len() as u64);
                    nodes.push(Node {
                        id,
                        parent: Some(NodeId(0)),
                        kind: NodeKind::Group,
                        depth: 1,
                        key: r.group().to_string(),
                        name: r.group().to_string(),
                        icon: None,
                        value: 0.0,
                        children: Vec::new(),
                        polygon: None,
                        site: None,
                    });
                    nodes[0].children.push(id);
                    group_ids.push((r.group().to_string(), id));
                    id
                }
            };
            let id = NodeId(nodes.len() as u64);
            nodes.push(Node {
                id,
                parent: Some(gid),
                kind: NodeKind::Leaf,
                depth: 2,
                key: r.key().to_string(),
                name: r.name().to_string(),
                icon: Some(r.icon_path()),
                value: r.value(),
                children: Vec::new(),
                polygon: None,
                site: None,
            });
            let v = r.value();
            nodes[gid.0 as usize].children.push(id);
            nodes[gid.0 as usize].value += v;
            nodes[0].value += v;
        }

        if nodes[0].value <= 0.0 {
            return Err(ChartError::ZeroTotal);
        }

        Ok(Hierarchy {
            root: NodeId(0),
            nodes,
        })
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn groups(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.kind == NodeKind::Group)
    }

    pub fn leaves(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.kind == NodeKind::Leaf)
    }

    /// Group key of the leaf's parent.
    pub fn group_of(&self, leaf: NodeId) -> &str {
        match self.node(leaf).parent {
            Some(p) => &self.node(p).key,
            None => "",
        }
    }
}

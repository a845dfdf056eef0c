use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::InvalidEdge;
use crate::model::{Edge, EdgeId, EdgeStyle, GraphSnapshot, Node, NodeId, NodeSpec, Point};

/// Owner of the current nodes and edges.
///
/// Ids are allocated monotonically, so iterating the id-keyed maps yields
/// insertion order. Every mutation bumps `revision`, which presentation code
/// compares against the last snapshot it drew.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeMap<EdgeId, Edge>,
    next_node: u64,
    next_edge: u64,
    revision: u64,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, spec: NodeSpec) -> NodeId {
        self.next_node += 1;
        let id = NodeId::new(self.next_node);
        self.nodes.insert(
            id,
            Node {
                id,
                kind: spec.kind,
                position: spec.position,
                ports: spec.ports,
                size: spec.size,
                payload: spec.payload,
                manually_placed: false,
            },
        );
        self.bump();
        trace!(%id, "node added");
        id
    }

    /// Removes a node together with every edge touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&id)?;
        let before = self.edges.len();
        self.edges.retain(|_, edge| edge.source != id && edge.target != id);
        self.bump();
        debug!(%id, cascaded = before - self.edges.len(), "node removed");
        Some(node)
    }

    pub fn add_edge(&mut self, source: NodeId, target: NodeId) -> Result<EdgeId, InvalidEdge> {
        self.add_edge_styled(source, target, EdgeStyle::Solid)
    }

    pub fn add_edge_styled(
        &mut self,
        source: NodeId,
        target: NodeId,
        style: EdgeStyle,
    ) -> Result<EdgeId, InvalidEdge> {
        self.validate_edge(source, target)?;
        self.next_edge += 1;
        let id = EdgeId::new(self.next_edge);
        self.edges.insert(
            id,
            Edge {
                id,
                source,
                target,
                style,
            },
        );
        self.bump();
        trace!(%id, %source, %target, "edge added");
        Ok(id)
    }

    /// Checks an edge without inserting it.
    pub fn validate_edge(&self, source: NodeId, target: NodeId) -> Result<(), InvalidEdge> {
        if source == target {
            return Err(InvalidEdge::SelfLoop(source));
        }
        let from = self
            .nodes
            .get(&source)
            .ok_or(InvalidEdge::MissingSource(source))?;
        let to = self
            .nodes
            .get(&target)
            .ok_or(InvalidEdge::MissingTarget(target))?;
        if !from.ports.accepts_outgoing() {
            return Err(InvalidEdge::NoOutputs(source));
        }
        if !to.ports.accepts_incoming() {
            return Err(InvalidEdge::NoInputs(target));
        }
        Ok(())
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let edge = self.edges.remove(&id)?;
        self.bump();
        Some(edge)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl DoubleEndedIterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Writes a computed position and clears the manual-placement flag.
    pub fn place_node(&mut self, id: NodeId, position: Point) -> bool {
        self.write_position(id, position, false)
    }

    /// Writes a user-chosen position and marks the node as manually placed.
    pub fn drag_node(&mut self, id: NodeId, position: Point) -> bool {
        self.write_position(id, position, true)
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.values().cloned().collect(),
            revision: self.revision,
        }
    }

    fn write_position(&mut self, id: NodeId, position: Point, manual: bool) -> bool {
        let Some(node) = self.nodes.get_mut(&id) else {
            return false;
        };
        node.position = position;
        node.manually_placed = manual;
        self.bump();
        true
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeKind, Ports};

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut store = GraphStore::new();
        let a = store.add_node(NodeSpec::new(NodeKind::Action, "a"));
        store.remove_node(a);
        let b = store.add_node(NodeSpec::new(NodeKind::Action, "b"));
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn rejects_edges_into_portless_nodes() {
        let mut store = GraphStore::new();
        let trigger = store.add_node(NodeSpec::new(NodeKind::Trigger, "start"));
        let sink = store.add_node(
            NodeSpec::new(NodeKind::Action, "sink").with_ports(Ports::new(1, 0)),
        );
        assert_eq!(
            store.add_edge(sink, trigger),
            Err(InvalidEdge::NoOutputs(sink))
        );
        let action = store.add_node(NodeSpec::new(NodeKind::Action, "act"));
        assert_eq!(
            store.add_edge(action, trigger),
            Err(InvalidEdge::NoInputs(trigger))
        );
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn revision_tracks_mutations_only() {
        let mut store = GraphStore::new();
        let a = store.add_node(NodeSpec::new(NodeKind::Problem, "a"));
        let rev = store.revision();
        let _ = store.snapshot();
        assert_eq!(store.revision(), rev);
        assert!(store.add_edge(a, a).is_err());
        assert_eq!(store.revision(), rev);
        store.drag_node(a, Point::new(5.0, 5.0));
        assert!(store.revision() > rev);
        assert!(store.node(a).is_some_and(|node| node.manually_placed));
    }
}

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info_span};
use whiteboard_graph::{
    Direction, EdgeId, EdgeStyle, GraphSnapshot, GraphStore, NodeId, Point, Rect, Size,
};

/// Where a rank sits inside the cross-axis extent of its component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankAlign {
    Start,
    #[default]
    Center,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Gap between neighbouring nodes of one rank, and between components.
    pub nodesep: f32,
    /// Gap between consecutive ranks.
    pub ranksep: f32,
    pub direction: Direction,
    /// Box used for nodes that carry no size of their own.
    pub node_size: Size,
    pub rank_align: RankAlign,
    /// Barycenter sweeps; even passes go down, odd passes go back up.
    pub ordering_passes: usize,
    /// Top-left corner of the laid-out bounding box.
    pub origin: Point,
    /// Skip nodes the user dragged when writing positions back.
    pub preserve_manual: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            nodesep: 60.0,
            ranksep: 120.0,
            direction: Direction::TB,
            node_size: Size::new(280.0, 150.0),
            rank_align: RankAlign::Center,
            ordering_passes: 1,
            origin: Point::ORIGIN,
            preserve_manual: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("graph contains a cycle through {0}")]
    CyclicGraph(NodeId),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutNode {
    pub id: NodeId,
    pub rank: usize,
    pub order: usize,
    pub component: usize,
    /// Top-left corner.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl LayoutNode {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub style: EdgeStyle,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutGraph {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
    pub direction: Direction,
    pub width: f32,
    pub height: f32,
}

impl LayoutGraph {
    pub fn node(&self, id: NodeId) -> Option<&LayoutNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn position(&self, id: NodeId) -> Option<Point> {
        self.node(id).map(LayoutNode::position)
    }

    pub fn rank(&self, id: NodeId) -> Option<usize> {
        self.node(id).map(|node| node.rank)
    }
}

#[derive(Debug, Clone)]
struct WorkNode {
    id: NodeId,
    width: f32,
    height: f32,
    rank: usize,
    order: usize,
    component: usize,
    cross: f32,
    main: f32,
}

impl WorkNode {
    fn cross_len(&self, direction: Direction) -> f32 {
        match direction {
            Direction::TB => self.width,
            Direction::LR => self.height,
        }
    }

    fn main_len(&self, direction: Direction) -> f32 {
        match direction {
            Direction::TB => self.height,
            Direction::LR => self.width,
        }
    }
}

#[derive(Debug, Clone)]
struct EdgeMeta {
    id: EdgeId,
    from: usize,
    to: usize,
    style: EdgeStyle,
}

/// Computes a layered layout for every node and edge in `snapshot`.
///
/// Pure: the snapshot is not touched and nothing is written anywhere, so the
/// call can run off the UI thread. Identical input yields bit-identical output.
pub fn layout(snapshot: &GraphSnapshot, config: &LayoutConfig) -> Result<LayoutGraph, LayoutError> {
    let _span = info_span!(
        "layout",
        nodes = snapshot.nodes.len(),
        edges = snapshot.edges.len()
    )
    .entered();

    let mut nodes = Vec::with_capacity(snapshot.nodes.len());
    let mut node_index = HashMap::new();
    for node in &snapshot.nodes {
        let size = node.box_size(config.node_size);
        node_index.insert(node.id, nodes.len());
        nodes.push(WorkNode {
            id: node.id,
            width: size.width,
            height: size.height,
            rank: 0,
            order: 0,
            component: 0,
            cross: 0.0,
            main: 0.0,
        });
    }

    let mut edges = Vec::new();
    for edge in &snapshot.edges {
        let (Some(&from), Some(&to)) = (node_index.get(&edge.source), node_index.get(&edge.target))
        else {
            continue;
        };
        edges.push(EdgeMeta {
            id: edge.id,
            from,
            to,
            style: edge.style,
        });
    }

    assign_ranks(&mut nodes, &edges)?;
    let components = find_components(&mut nodes, &edges);

    let (up_neighbors, down_neighbors) = neighbor_lists(&nodes, &edges);
    let mut cursor = 0.0f32;
    for component in &components {
        let mut layers = build_layers(&mut nodes, component);
        reduce_crossings(
            &mut nodes,
            &mut layers,
            &up_neighbors,
            &down_neighbors,
            config.ordering_passes,
        );
        let extent = assign_coordinates(&mut nodes, &layers, config);
        for &idx in component {
            nodes[idx].cross += cursor;
        }
        cursor += extent + config.nodesep;
    }

    let mut layout_nodes = place_nodes(&nodes, config);
    let (width, height) = translate_to_origin(&mut layout_nodes, config.origin);
    let layout_edges = route_edges(&layout_nodes, &edges, config.direction);

    debug!(
        components = components.len(),
        ranks = nodes.iter().map(|node| node.rank + 1).max().unwrap_or(0),
        "layout computed"
    );

    Ok(LayoutGraph {
        nodes: layout_nodes,
        edges: layout_edges,
        direction: config.direction,
        width,
        height,
    })
}

/// Lays out the whole store and writes the positions back.
///
/// On error the store keeps its previous positions.
pub fn layout_store(
    store: &mut GraphStore,
    config: &LayoutConfig,
) -> Result<LayoutGraph, LayoutError> {
    let result = layout(&store.snapshot(), config)?;
    apply_layout(store, &result, config);
    Ok(result)
}

/// Lays out only `ids` (and the edges between them); other nodes are left
/// where they are.
pub fn layout_subset(
    store: &mut GraphStore,
    ids: &[NodeId],
    config: &LayoutConfig,
) -> Result<LayoutGraph, LayoutError> {
    let wanted: HashSet<NodeId> = ids.iter().copied().collect();
    let mut snapshot = store.snapshot();
    snapshot.nodes.retain(|node| wanted.contains(&node.id));
    snapshot
        .edges
        .retain(|edge| wanted.contains(&edge.source) && wanted.contains(&edge.target));
    let result = layout(&snapshot, config)?;
    apply_layout(store, &result, config);
    Ok(result)
}

/// Writes laid-out positions onto the store. Returns how many nodes moved.
pub fn apply_layout(store: &mut GraphStore, layout: &LayoutGraph, config: &LayoutConfig) -> usize {
    let mut written = 0;
    for node in &layout.nodes {
        let manual = store.node(node.id).is_some_and(|current| current.manually_placed);
        if config.preserve_manual && manual {
            continue;
        }
        if store.place_node(node.id, node.position()) {
            written += 1;
        }
    }
    written
}

/// Longest-path ranking over a Kahn topological order seeded in insertion
/// order. Any node left unvisited sits on a cycle.
fn assign_ranks(nodes: &mut [WorkNode], edges: &[EdgeMeta]) -> Result<(), LayoutError> {
    let node_count = nodes.len();
    let mut indegree = vec![0usize; node_count];
    let mut outgoing = vec![Vec::new(); node_count];

    for edge in edges {
        outgoing[edge.from].push(edge.to);
        indegree[edge.to] += 1;
    }

    let mut queue = VecDeque::new();
    for (i, &degree) in indegree.iter().enumerate() {
        if degree == 0 {
            queue.push_back(i);
        }
    }

    let mut order = Vec::with_capacity(node_count);
    while let Some(node) = queue.pop_front() {
        order.push(node);
        for &next in &outgoing[node] {
            indegree[next] -= 1;
            if indegree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    if order.len() < node_count {
        let stuck = indegree
            .iter()
            .position(|&degree| degree > 0)
            .unwrap_or_default();
        return Err(LayoutError::CyclicGraph(nodes[stuck].id));
    }

    for &node in &order {
        let current = nodes[node].rank;
        for &next in &outgoing[node] {
            nodes[next].rank = nodes[next].rank.max(current + 1);
        }
    }
    Ok(())
}

/// Weakly connected components, discovered and listed in insertion order.
fn find_components(nodes: &mut [WorkNode], edges: &[EdgeMeta]) -> Vec<Vec<usize>> {
    let mut adjacency = vec![Vec::new(); nodes.len()];
    for edge in edges {
        adjacency[edge.from].push(edge.to);
        adjacency[edge.to].push(edge.from);
    }

    let mut seen = vec![false; nodes.len()];
    let mut components = Vec::new();
    for start in 0..nodes.len() {
        if seen[start] {
            continue;
        }
        let component_index = components.len();
        let mut members = Vec::new();
        let mut queue = VecDeque::from([start]);
        seen[start] = true;
        while let Some(node) = queue.pop_front() {
            nodes[node].component = component_index;
            members.push(node);
            for &next in &adjacency[node] {
                if !seen[next] {
                    seen[next] = true;
                    queue.push_back(next);
                }
            }
        }
        members.sort_unstable();
        components.push(members);
    }
    components
}

/// Neighbours on the adjacent ranks only. Edges spanning several ranks carry
/// order indices from a different layer and are left out of the barycenter.
fn neighbor_lists(nodes: &[WorkNode], edges: &[EdgeMeta]) -> (Vec<Vec<usize>>, Vec<Vec<usize>>) {
    let mut up = vec![Vec::new(); nodes.len()];
    let mut down = vec![Vec::new(); nodes.len()];
    for edge in edges {
        if nodes[edge.to].rank != nodes[edge.from].rank + 1 {
            continue;
        }
        down[edge.from].push(edge.to);
        up[edge.to].push(edge.from);
    }
    (up, down)
}

fn build_layers(nodes: &mut [WorkNode], component: &[usize]) -> Vec<Vec<usize>> {
    let max_rank = component
        .iter()
        .map(|&idx| nodes[idx].rank)
        .max()
        .unwrap_or(0);
    let mut layers = vec![Vec::new(); max_rank + 1];
    for &idx in component {
        layers[nodes[idx].rank].push(idx);
    }
    for layer in &layers {
        for (order, &node_idx) in layer.iter().enumerate() {
            nodes[node_idx].order = order;
        }
    }
    layers
}

fn reduce_crossings(
    nodes: &mut [WorkNode],
    layers: &mut [Vec<usize>],
    up_neighbors: &[Vec<usize>],
    down_neighbors: &[Vec<usize>],
    passes: usize,
) {
    for pass in 0..passes {
        if pass % 2 == 0 {
            for layer in 1..layers.len() {
                reorder_layer(nodes, layers, layer, up_neighbors);
            }
        } else {
            for layer in (0..layers.len().saturating_sub(1)).rev() {
                reorder_layer(nodes, layers, layer, down_neighbors);
            }
        }
    }
}

/// Barycenter ordering of one rank against its already-placed neighbours.
/// Nodes without neighbours keep their current slot as key; ties fall back
/// to insertion order.
fn reorder_layer(
    nodes: &mut [WorkNode],
    layers: &mut [Vec<usize>],
    layer_index: usize,
    neighbor_lists: &[Vec<usize>],
) {
    let mut scored: Vec<(usize, f32)> = layers[layer_index]
        .iter()
        .map(|&node_idx| {
            let neighbors = &neighbor_lists[node_idx];
            if neighbors.is_empty() {
                return (node_idx, nodes[node_idx].order as f32);
            }
            let sum: usize = neighbors.iter().map(|&n| nodes[n].order).sum();
            (node_idx, sum as f32 / neighbors.len() as f32)
        })
        .collect();

    scored.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    layers[layer_index] = scored.iter().map(|(idx, _)| *idx).collect();
    for (order, &node_idx) in layers[layer_index].iter().enumerate() {
        nodes[node_idx].order = order;
    }
}

/// Places one component in local coordinates and returns its cross-axis
/// extent.
fn assign_coordinates(nodes: &mut [WorkNode], layers: &[Vec<usize>], config: &LayoutConfig) -> f32 {
    let direction = config.direction;
    let spans: Vec<f32> = layers
        .iter()
        .map(|layer| {
            let total: f32 = layer.iter().map(|&idx| nodes[idx].cross_len(direction)).sum();
            total + config.nodesep * layer.len().saturating_sub(1) as f32
        })
        .collect();
    let extent = spans.iter().copied().fold(0.0f32, f32::max);

    let mut main = 0.0f32;
    for (layer, span) in layers.iter().zip(&spans) {
        let thickness = layer
            .iter()
            .map(|&idx| nodes[idx].main_len(direction))
            .fold(0.0f32, f32::max);
        let mut cross = match config.rank_align {
            RankAlign::Start => 0.0,
            RankAlign::Center => (extent - span) / 2.0,
        };
        for &node_idx in layer {
            let node = &mut nodes[node_idx];
            node.cross = cross;
            node.main = main + (thickness - node.main_len(direction)) / 2.0;
            cross += node.cross_len(direction) + config.nodesep;
        }
        main += thickness + config.ranksep;
    }
    extent
}

fn place_nodes(nodes: &[WorkNode], config: &LayoutConfig) -> Vec<LayoutNode> {
    nodes
        .iter()
        .map(|node| {
            let (x, y) = match config.direction {
                Direction::TB => (node.cross, node.main),
                Direction::LR => (node.main, node.cross),
            };
            LayoutNode {
                id: node.id,
                rank: node.rank,
                order: node.order,
                component: node.component,
                x,
                y,
                width: node.width,
                height: node.height,
            }
        })
        .collect()
}

/// Shifts everything so the bounding box starts at `origin`; returns the
/// box's width and height.
fn translate_to_origin(nodes: &mut [LayoutNode], origin: Point) -> (f32, f32) {
    if nodes.is_empty() {
        return (0.0, 0.0);
    }
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for node in nodes.iter() {
        min_x = min_x.min(node.x);
        min_y = min_y.min(node.y);
        max_x = max_x.max(node.x + node.width);
        max_y = max_y.max(node.y + node.height);
    }
    let dx = origin.x - min_x;
    let dy = origin.y - min_y;
    for node in nodes.iter_mut() {
        node.x += dx;
        node.y += dy;
    }
    (max_x - min_x, max_y - min_y)
}

fn route_edges(nodes: &[LayoutNode], edges: &[EdgeMeta], direction: Direction) -> Vec<LayoutEdge> {
    edges
        .iter()
        .map(|edge| {
            let from = &nodes[edge.from];
            let to = &nodes[edge.to];
            LayoutEdge {
                id: edge.id,
                source: from.id,
                target: to.id,
                style: edge.style,
                points: route_edge(from.bounds(), to.bounds(), direction),
            }
        })
        .collect()
}

/// Orthogonal polyline from the output side of `from` to the input side of
/// `to`, bending once halfway between them.
pub fn route_edge(from: Rect, to: Rect, direction: Direction) -> Vec<Point> {
    let mut points = Vec::new();
    match direction {
        Direction::TB => {
            let start = Point::new(from.center().x, from.bottom());
            let end = Point::new(to.center().x, to.y);
            let mid_y = (start.y + end.y) / 2.0;
            push_point(&mut points, start);
            push_point(&mut points, Point::new(start.x, mid_y));
            push_point(&mut points, Point::new(end.x, mid_y));
            push_point(&mut points, end);
        }
        Direction::LR => {
            let start = Point::new(from.right(), from.center().y);
            let end = Point::new(to.x, to.center().y);
            let mid_x = (start.x + end.x) / 2.0;
            push_point(&mut points, start);
            push_point(&mut points, Point::new(mid_x, start.y));
            push_point(&mut points, Point::new(mid_x, end.y));
            push_point(&mut points, end);
        }
    }
    points
}

fn push_point(points: &mut Vec<Point>, point: Point) {
    if points.last().is_none_or(|last| {
        (last.x - point.x).abs() > 0.01 || (last.y - point.y).abs() > 0.01
    }) {
        points.push(point);
    }
}

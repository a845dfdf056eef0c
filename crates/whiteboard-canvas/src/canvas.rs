use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use whiteboard_graph::{
    AnalysisResult, BuildOptions, Direction, GraphSnapshot, GraphStore, Node, NodeId, NodeSpec,
    Point, Rect, Size, build_graph,
};
use whiteboard_layout::{LayoutConfig, LayoutError, LayoutGraph, layout_store};

use crate::CanvasError;
use crate::controller::{EditMode, HitTarget, InteractionController, Outcome, PointerEvent};
use crate::viewport::{Viewport, ViewportConfig, ViewportState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub layout: LayoutConfig,
    pub viewport: ViewportConfig,
    pub build: BuildOptions,
    pub edit_mode: EditMode,
    /// Hit radius around a port centre, in graph units.
    pub port_radius: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            viewport: ViewportConfig::default(),
            build: BuildOptions::default(),
            edit_mode: EditMode::Free,
            port_radius: 8.0,
        }
    }
}

/// One editing session: the graph, its viewport and the gesture state.
///
/// Analysis trees and free-form workflows share this type; `edit_mode`
/// decides whether the user may reshape the graph.
#[derive(Debug, Clone)]
pub struct Canvas {
    store: GraphStore,
    viewport: Viewport,
    controller: InteractionController,
    config: CanvasConfig,
}

impl Canvas {
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            store: GraphStore::new(),
            viewport: Viewport::new(config.viewport),
            controller: InteractionController::new(config.edit_mode),
            config,
        }
    }

    pub fn from_analysis(
        result: &AnalysisResult,
        config: CanvasConfig,
    ) -> Result<Self, CanvasError> {
        let mut canvas = Self::new(config);
        canvas.load_analysis(result)?;
        Ok(canvas)
    }

    /// Replaces the graph with one built from `result` and lays it out.
    /// The current graph survives if either step fails.
    pub fn load_analysis(&mut self, result: &AnalysisResult) -> Result<LayoutGraph, CanvasError> {
        let mut store = build_graph(result, &self.config.build)?;
        let layout = layout_store(&mut store, &self.config.layout)?;
        self.controller.cancel();
        self.store = store;
        debug!(nodes = self.store.node_count(), "analysis loaded");
        Ok(layout)
    }

    pub fn relayout(&mut self) -> Result<LayoutGraph, LayoutError> {
        layout_store(&mut self.store, &self.config.layout).inspect_err(|err| {
            warn!(%err, "layout pass failed, keeping previous positions");
        })
    }

    pub fn add_node(&mut self, spec: NodeSpec) -> NodeId {
        self.store.add_node(spec)
    }

    pub fn handle(&mut self, event: PointerEvent) -> Outcome {
        self.controller
            .handle(event, &mut self.store, &mut self.viewport)
    }

    pub fn set_edit_mode(&mut self, mode: EditMode) {
        self.config.edit_mode = mode;
        self.controller.set_mode(mode);
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut GraphStore {
        &mut self.store
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn viewport_state(&self) -> ViewportState {
        self.viewport.state()
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        self.store.snapshot()
    }

    /// Fresh snapshot if the graph changed after `revision`.
    pub fn changed_since(&self, revision: u64) -> Option<GraphSnapshot> {
        (self.store.revision() != revision).then(|| self.store.snapshot())
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.store
            .nodes()
            .map(|node| node.bounds(self.config.layout.node_size))
            .reduce(|acc, rect| acc.union(&rect))
    }

    pub fn fit_to(&mut self, screen: Size, padding: f32) {
        if let Some(bounds) = self.bounds() {
            self.viewport.zoom_to_fit(bounds, screen, padding);
        }
    }

    /// Graph-space centre of a node's input port.
    pub fn input_port(&self, node: NodeId) -> Option<Point> {
        let node = self.store.node(node)?;
        Some(port_anchor(node, &self.config.layout, false))
    }

    /// Graph-space centre of a node's output port.
    pub fn output_port(&self, node: NodeId) -> Option<Point> {
        let node = self.store.node(node)?;
        Some(port_anchor(node, &self.config.layout, true))
    }

    /// Resolves what lies under a screen point. Later nodes are drawn on top,
    /// so they win; ports win over the body of the same node.
    pub fn hit_test(&self, screen: Point) -> HitTarget {
        let point = self.viewport.screen_to_graph(screen);
        let radius = self.config.port_radius;
        let layout = &self.config.layout;
        for node in self.store.nodes().rev() {
            let input = port_anchor(node, layout, false);
            if node.ports.accepts_incoming() && within(point, input, radius) {
                return HitTarget::InputPort(node.id);
            }
            let output = port_anchor(node, layout, true);
            if node.ports.accepts_outgoing() && within(point, output, radius) {
                return HitTarget::OutputPort(node.id);
            }
            if node.bounds(layout.node_size).contains(point) {
                return HitTarget::NodeBody(node.id);
            }
        }
        HitTarget::Canvas
    }
}

fn port_anchor(node: &Node, layout: &LayoutConfig, output: bool) -> Point {
    let rect = node.bounds(layout.node_size);
    match (layout.direction, output) {
        (Direction::TB, false) => Point::new(rect.center().x, rect.y),
        (Direction::TB, true) => Point::new(rect.center().x, rect.bottom()),
        (Direction::LR, false) => Point::new(rect.x, rect.center().y),
        (Direction::LR, true) => Point::new(rect.right(), rect.center().y),
    }
}

fn within(point: Point, center: Point, radius: f32) -> bool {
    let d = point - center;
    d.x * d.x + d.y * d.y <= radius * radius
}

//! Pointer-driven editing state machine.
//!
//! One gesture is active at a time. Gesture-start events that arrive while a
//! drag, connection or pan is in progress are ignored. A connection only
//! touches the store when it completes on an input port, so cancelling one
//! never leaves a partial edit behind.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use whiteboard_graph::{EdgeId, GraphStore, InvalidEdge, NodeId, Point};

use crate::viewport::Viewport;

/// Wheel notch zoom factor.
pub const WHEEL_ZOOM_STEP: f32 = 1.1;

/// What was under the pointer when the event fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Canvas,
    NodeBody(NodeId),
    InputPort(NodeId),
    OutputPort(NodeId),
}

impl HitTarget {
    pub fn node(self) -> Option<NodeId> {
        match self {
            HitTarget::Canvas => None,
            HitTarget::NodeBody(id) | HitTarget::InputPort(id) | HitTarget::OutputPort(id) => {
                Some(id)
            }
        }
    }
}

/// Positions are in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { position: Point, target: HitTarget },
    Move { position: Point },
    Up { position: Point, target: HitTarget },
    DoubleClick { position: Point, target: HitTarget },
    /// Positive deltas zoom out, negative zoom in, one unit per wheel notch.
    Wheel { position: Point, delta: f32 },
    Leave,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    DraggingNode {
        node: NodeId,
        grab_offset: Point,
    },
    /// `pointer` is the graph-space end of the preview line.
    ConnectingEdge {
        source: NodeId,
        pointer: Point,
    },
    Panning {
        last: Point,
    },
}

/// `Free` allows every gesture; `LayoutOnly` keeps the graph as laid out and
/// only lets the user pan and zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditMode {
    #[default]
    Free,
    LayoutOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ignored,
    GestureStarted,
    GestureEnded,
    Cancelled,
    NodeMoved(NodeId),
    EdgeCreated(EdgeId),
    EdgeRejected(InvalidEdge),
    NodeRemoved(NodeId),
    ViewportChanged,
}

#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    state: InteractionState,
    mode: EditMode,
}

impl InteractionController {
    pub fn new(mode: EditMode) -> Self {
        Self {
            state: InteractionState::Idle,
            mode,
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn is_idle(&self) -> bool {
        self.state == InteractionState::Idle
    }

    /// Switching modes abandons any gesture in progress.
    pub fn set_mode(&mut self, mode: EditMode) {
        if mode != self.mode {
            self.cancel();
            self.mode = mode;
        }
    }

    pub fn cancel(&mut self) -> Outcome {
        let previous = std::mem::take(&mut self.state);
        if previous == InteractionState::Idle {
            return Outcome::Ignored;
        }
        debug!(?previous, "gesture cancelled");
        Outcome::Cancelled
    }

    pub fn handle(
        &mut self,
        event: PointerEvent,
        store: &mut GraphStore,
        viewport: &mut Viewport,
    ) -> Outcome {
        trace!(?event, state = ?self.state, "pointer event");
        match event {
            PointerEvent::Wheel { position, delta } => {
                let factor = WHEEL_ZOOM_STEP.powf(-delta);
                if viewport.zoom_by(factor, position) {
                    Outcome::ViewportChanged
                } else {
                    Outcome::Ignored
                }
            }
            PointerEvent::Leave | PointerEvent::Cancel => self.cancel(),
            PointerEvent::Down { position, target } => {
                self.on_down(position, target, store, viewport)
            }
            PointerEvent::Move { position } => self.on_move(position, store, viewport),
            PointerEvent::Up { target, .. } => self.on_up(target, store),
            PointerEvent::DoubleClick { target, .. } => self.on_double_click(target, store),
        }
    }

    fn on_down(
        &mut self,
        position: Point,
        target: HitTarget,
        store: &mut GraphStore,
        viewport: &Viewport,
    ) -> Outcome {
        match self.state {
            InteractionState::Idle => {}
            InteractionState::ConnectingEdge { source, .. } => {
                if let HitTarget::InputPort(target) = target {
                    return self.finish_connection(source, target, store);
                }
                return Outcome::Ignored;
            }
            InteractionState::DraggingNode { .. } | InteractionState::Panning { .. } => {
                return Outcome::Ignored;
            }
        }

        let graph_point = viewport.screen_to_graph(position);
        match target {
            HitTarget::Canvas => {
                self.state = InteractionState::Panning { last: position };
                Outcome::GestureStarted
            }
            _ if self.mode == EditMode::LayoutOnly => Outcome::Ignored,
            HitTarget::NodeBody(node) => {
                let Some(current) = store.node(node) else {
                    return Outcome::Ignored;
                };
                let grab_offset = graph_point - current.position;
                self.state = InteractionState::DraggingNode { node, grab_offset };
                debug!(%node, "drag started");
                Outcome::GestureStarted
            }
            HitTarget::OutputPort(source) => {
                let accepts = store
                    .node(source)
                    .is_some_and(|node| node.ports.accepts_outgoing());
                if !accepts {
                    return Outcome::Ignored;
                }
                self.state = InteractionState::ConnectingEdge {
                    source,
                    pointer: graph_point,
                };
                debug!(%source, "connection started");
                Outcome::GestureStarted
            }
            HitTarget::InputPort(_) => Outcome::Ignored,
        }
    }

    fn on_move(
        &mut self,
        position: Point,
        store: &mut GraphStore,
        viewport: &mut Viewport,
    ) -> Outcome {
        match self.state {
            InteractionState::Idle => Outcome::Ignored,
            InteractionState::DraggingNode { node, grab_offset } => {
                let target = viewport.screen_to_graph(position) - grab_offset;
                if store.drag_node(node, target) {
                    Outcome::NodeMoved(node)
                } else {
                    self.state = InteractionState::Idle;
                    Outcome::Cancelled
                }
            }
            InteractionState::ConnectingEdge { source, .. } => {
                self.state = InteractionState::ConnectingEdge {
                    source,
                    pointer: viewport.screen_to_graph(position),
                };
                Outcome::Ignored
            }
            InteractionState::Panning { last } => {
                viewport.pan_by(position - last);
                self.state = InteractionState::Panning { last: position };
                Outcome::ViewportChanged
            }
        }
    }

    fn on_up(&mut self, target: HitTarget, store: &mut GraphStore) -> Outcome {
        match self.state {
            InteractionState::Idle => Outcome::Ignored,
            InteractionState::DraggingNode { node, .. } => {
                self.state = InteractionState::Idle;
                debug!(%node, "drag finished");
                Outcome::GestureEnded
            }
            InteractionState::Panning { .. } => {
                self.state = InteractionState::Idle;
                Outcome::GestureEnded
            }
            InteractionState::ConnectingEdge { source, .. } => match target {
                HitTarget::InputPort(target) => self.finish_connection(source, target, store),
                // Releasing over the port the connection started from keeps
                // it pending, so click-then-click works as well as dragging.
                HitTarget::OutputPort(id) if id == source => Outcome::Ignored,
                _ => self.cancel(),
            },
        }
    }

    fn on_double_click(&mut self, target: HitTarget, store: &mut GraphStore) -> Outcome {
        if !self.is_idle() || self.mode == EditMode::LayoutOnly {
            return Outcome::Ignored;
        }
        match target.node().and_then(|node| store.remove_node(node)) {
            Some(removed) => Outcome::NodeRemoved(removed.id),
            None => Outcome::Ignored,
        }
    }

    fn finish_connection(
        &mut self,
        source: NodeId,
        target: NodeId,
        store: &mut GraphStore,
    ) -> Outcome {
        self.state = InteractionState::Idle;
        match store.add_edge(source, target) {
            Ok(edge) => {
                debug!(%edge, %source, %target, "edge created");
                Outcome::EdgeCreated(edge)
            }
            Err(reason) => {
                warn!(%reason, %source, %target, "connection rejected");
                Outcome::EdgeRejected(reason)
            }
        }
    }
}

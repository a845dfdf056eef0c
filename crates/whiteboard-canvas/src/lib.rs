mod canvas;
mod controller;
mod viewport;

pub use canvas::{Canvas, CanvasConfig};
pub use controller::{
    EditMode, HitTarget, InteractionController, InteractionState, Outcome, PointerEvent,
    WHEEL_ZOOM_STEP,
};
pub use viewport::{Viewport, ViewportConfig, ViewportState};

use thiserror::Error;
use whiteboard_graph::GraphError;
use whiteboard_layout::LayoutError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanvasError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

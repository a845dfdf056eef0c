mod builder;
mod model;
mod store;

pub use builder::{AnalysisResult, BuildOptions, Pillar, SolutionItem, build_graph};
pub use model::{
    Direction, Edge, EdgeId, EdgeStyle, GraphSnapshot, Node, NodeId, NodeKind, NodePayload,
    NodeSpec, Point, Ports, Rect, Size,
};
pub use store::GraphStore;

use thiserror::Error;

/// Reasons an edge is refused. The store is left unchanged in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidEdge {
    #[error("edge from {0} to itself")]
    SelfLoop(NodeId),
    #[error("source {0} does not exist")]
    MissingSource(NodeId),
    #[error("target {0} does not exist")]
    MissingTarget(NodeId),
    #[error("{0} has no output ports")]
    NoOutputs(NodeId),
    #[error("{0} has no input ports")]
    NoInputs(NodeId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("malformed input at `{field}`: {reason}")]
    MalformedInput { field: String, reason: String },
    #[error(transparent)]
    InvalidEdge(#[from] InvalidEdge),
}

impl GraphError {
    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

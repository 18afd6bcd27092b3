use crate::model::{EdgeId, NodeId};
use thiserror::Error;

/// Failure to turn an endpoint/attachment reference into an absolute point.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("unknown node id {0}")]
    UnknownNode(NodeId),
    #[error("unknown edge id {0}")]
    UnknownEdge(EdgeId),
    #[error("reference cycle through edge {0}")]
    Cycle(EdgeId),
    #[error("reference resolves to a non-finite point")]
    NonFinite,
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum SplitError {
    #[error("unknown edge id {0}")]
    UnknownEdge(EdgeId),
    #[error("edge {0} has no interior vertices to cut at")]
    NoVertices(EdgeId),
    #[error("vertex index {index} out of range for edge {edge}")]
    VertexOutOfRange { edge: EdgeId, index: usize },
    #[error("split point is not near any segment of edge {0}")]
    NoSegment(EdgeId),
    #[error("edge {0} is too short to split")]
    DegenerateEdge(EdgeId),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum EditError {
    #[error("unknown node id {0}")]
    UnknownNode(NodeId),
    #[error("unknown edge id {0}")]
    UnknownEdge(EdgeId),
    #[error("label index {index} out of range for edge {edge}")]
    LabelOutOfRange { edge: EdgeId, index: usize },
    #[error("node {0} has no attachment")]
    NoAttachment(NodeId),
    #[error("endpoint reference would create a cycle")]
    WouldCycle,
    #[error(transparent)]
    Split(#[from] SplitError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

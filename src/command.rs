//! Serialized edit commands, the wire form of the [`Editor`](crate::Editor)
//! surface. Hosts send these over an embedding boundary; `from` fields are
//! advisory context from the sender, the scene's current values are what
//! history actually records.

use crate::algorithms::split::SplitSpec;
use crate::model::{Edge, EdgeId, End, EndpointRef, Label, Node, NodeId, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Command {
    AddNode { node: Node },
    RemoveNode { id: NodeId },
    AddEdge { edge: Edge },
    RemoveEdge { id: EdgeId },
    MoveNode { id: NodeId, from: Vec2, to: Vec2 },
    EditVertices { id: EdgeId, from: Vec<Vec2>, to: Vec<Vec2> },
    EditLabel { id: EdgeId, index: usize, from: Label, to: Label },
    ChangeEndpoint { id: EdgeId, end: End, from: EndpointRef, to: EndpointRef },
    MoveAttachment { id: NodeId, from: f32, to: f32 },
    SplitEdge { id: EdgeId, spec: SplitSpec },
}

/// What a successfully applied command produced.
#[derive(Clone, Debug, PartialEq)]
pub enum Applied {
    Node(NodeId),
    Edge(EdgeId),
    /// Segment ids produced by a split, source side first.
    Segments(Vec<EdgeId>),
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_is_type_and_payload() {
        let cmd = Command::MoveNode {
            id: 3,
            from: Vec2::new(0.0, 0.0),
            to: Vec2::new(10.0, 20.0),
        };
        let v = serde_json::to_value(&cmd).unwrap();
        assert_eq!(v["type"], "moveNode");
        assert_eq!(v["payload"]["id"], 3);
        assert_eq!(v["payload"]["to"]["x"], 10.0);
        let back: Command = serde_json::from_value(v).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn split_spec_rides_along() {
        let cmd = Command::SplitEdge {
            id: 7,
            spec: SplitSpec::WithNode { ratio: 0.25 },
        };
        let v = serde_json::to_value(&cmd).unwrap();
        assert_eq!(v["type"], "splitEdge");
        assert_eq!(v["payload"]["spec"]["mode"], "withNode");
        let back: Command = serde_json::from_value(v).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn endpoint_refs_tag_by_kind() {
        let cmd = Command::ChangeEndpoint {
            id: 1,
            end: End::Target,
            from: EndpointRef::Point { x: 0.0, y: 0.0 },
            to: EndpointRef::EdgeRatio { edge: 4, ratio: 0.5 },
        };
        let v = serde_json::to_value(&cmd).unwrap();
        assert_eq!(v["payload"]["to"]["kind"], "edgeRatio");
        assert_eq!(v["payload"]["end"], "target");
    }
}

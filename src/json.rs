//! Serialized scene documents. Snapshot transactions and save/load share the
//! same format: every entity with its stable id and raw, unresolved
//! references. Restore rebuilds in passes because a referrer may appear
//! before its target in document order.

use crate::model::{Attachment, Edge, EdgeId, End, EndpointRef, Node, NodeId};
use crate::Scene;
use log::debug;
use serde::{Deserialize, Serialize};

pub const DOC_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeDoc {
    pub id: NodeId,
    #[serde(flatten)]
    pub node: Node,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeDoc {
    pub id: EdgeId,
    #[serde(flatten)]
    pub edge: Edge,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneDoc {
    pub version: u32,
    pub nodes: Vec<NodeDoc>,
    pub edges: Vec<EdgeDoc>,
}

pub fn snapshot(scene: &Scene) -> SceneDoc {
    let nodes = scene
        .nodes
        .iter()
        .enumerate()
        .filter_map(|(i, n)| {
            n.as_ref().map(|n| NodeDoc {
                id: i as NodeId,
                node: n.clone(),
            })
        })
        .collect();
    let edges = scene
        .edges
        .iter()
        .enumerate()
        .filter_map(|(i, e)| {
            e.as_ref().map(|e| EdgeDoc {
                id: i as EdgeId,
                edge: e.clone(),
            })
        })
        .collect();
    SceneDoc {
        version: DOC_VERSION,
        nodes,
        edges,
    }
}

/// Rebuild `scene` wholesale from a document.
///
/// Pass 1 recreates every entity with references detached, pass 2 wires the
/// endpoint and attachment references now that every id exists, pass 3
/// restores z-order.
pub fn restore(scene: &mut Scene, doc: &SceneDoc) {
    scene.clear();

    let placeholder = EndpointRef::Point { x: 0.0, y: 0.0 };
    for nd in &doc.nodes {
        let mut node = nd.node.clone();
        node.attachment = None;
        let ok = scene.add_node_at(nd.id, node);
        debug_assert!(ok, "duplicate node id {} in snapshot", nd.id);
    }
    for ed in &doc.edges {
        let mut edge = ed.edge.clone();
        edge.source = placeholder;
        edge.target = placeholder;
        let ok = scene.add_edge_at(ed.id, edge);
        debug_assert!(ok, "duplicate edge id {} in snapshot", ed.id);
    }

    for ed in &doc.edges {
        scene.set_endpoint(ed.id, End::Source, ed.edge.source);
        scene.set_endpoint(ed.id, End::Target, ed.edge.target);
    }
    for nd in &doc.nodes {
        if let Some(Attachment { host, ratio }) = nd.node.attachment {
            scene.set_attachment(nd.id, Some(Attachment { host, ratio }));
        }
    }

    for nd in &doc.nodes {
        scene.set_node_z(nd.id, nd.node.z);
    }
    for ed in &doc.edges {
        scene.set_edge_z(ed.id, ed.edge.z);
    }

    debug!(
        "restored snapshot: {} nodes, {} edges",
        doc.nodes.len(),
        doc.edges.len()
    );
}

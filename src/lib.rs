//! Scene-mutation and geometry core for an interactive branching-diagram
//! editor: an undoable scene graph of nodes and curved edges, ratio-based
//! anchoring between edges, structural edge splitting, and a procedural
//! stroke-outline generator. The paint layer is injected as a [`View`]
//! capability; this crate owns the data and the mutations.

pub mod command;
pub mod editor;
pub mod error;
pub mod history;
pub mod json;
pub mod model;
pub mod view;
pub mod geometry {
    pub mod math;
    pub mod tolerance;
}
pub mod algorithms {
    pub mod anchor;
    pub mod attach;
    pub mod outline;
    pub mod split;
}

pub use algorithms::split::{SplitOutcome, SplitSpec};
pub use command::{Applied, Command};
pub use editor::{AttachmentDrag, Editor};
pub use history::History;
pub use error::{EditError, ResolutionError, SplitError};
pub use model::{Attachment, Edge, EdgeId, End, EndpointRef, Label, Node, NodeId, NodeKind, StrokeStyle, Vec2};
pub use view::{Centerline, PolylineView, View};

use geometry::tolerance::clamp01;

/// The mutable scene graph. Ids are indices into slot vectors; slots are
/// never reused within a session, so an id stays a stable identity key for
/// history snapshots. All mutations here are primitive and non-recording;
/// [`Editor`] layers history on top.
pub struct Scene {
    pub(crate) nodes: Vec<Option<Node>>,
    pub(crate) edges: Vec<Option<Edge>>,
    pub(crate) geom_ver: u64,
}

impl Default for Scene {
    fn default() -> Scene {
        Scene::new()
    }
}

impl Scene {
    pub fn new() -> Scene {
        Scene {
            nodes: Vec::new(),
            edges: Vec::new(),
            geom_ver: 1,
        }
    }

    pub fn geom_version(&self) -> u64 {
        self.geom_ver
    }

    fn bump(&mut self) {
        self.geom_ver += 1;
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.bump();
    }

    // Nodes

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize).and_then(|n| n.as_ref())
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|_| i as NodeId))
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn add_node(&mut self, mut node: Node) -> NodeId {
        clamp_node(&mut node);
        let id = self.nodes.len() as NodeId;
        self.nodes.push(Some(node));
        self.bump();
        id
    }

    /// Recreate a node at a specific id (snapshot restore, op replay).
    pub(crate) fn add_node_at(&mut self, id: NodeId, mut node: Node) -> bool {
        clamp_node(&mut node);
        let idx = id as usize;
        if idx >= self.nodes.len() {
            self.nodes.resize_with(idx + 1, || None);
        }
        if self.nodes[idx].is_some() {
            return false;
        }
        self.nodes[idx] = Some(node);
        self.bump();
        true
    }

    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let slot = self.nodes.get_mut(id as usize)?;
        let node = slot.take()?;
        self.bump();
        Some(node)
    }

    pub fn set_node_position(&mut self, id: NodeId, x: f32, y: f32) -> bool {
        if !x.is_finite() || !y.is_finite() {
            return false;
        }
        match self.nodes.get_mut(id as usize).and_then(|n| n.as_mut()) {
            Some(n) => {
                n.x = x;
                n.y = y;
                self.bump();
                true
            }
            None => false,
        }
    }

    /// Derived write used by attachment projection: position plus rotation.
    pub fn set_node_pose(&mut self, id: NodeId, x: f32, y: f32, rotation: f32) -> bool {
        if !x.is_finite() || !y.is_finite() || !rotation.is_finite() {
            return false;
        }
        match self.nodes.get_mut(id as usize).and_then(|n| n.as_mut()) {
            Some(n) => {
                n.x = x;
                n.y = y;
                n.rotation = rotation;
                self.bump();
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_attachment(&mut self, id: NodeId, attachment: Option<Attachment>) -> bool {
        match self.nodes.get_mut(id as usize).and_then(|n| n.as_mut()) {
            Some(n) => {
                n.attachment = attachment.map(|mut a| {
                    a.ratio = clamp01(a.ratio);
                    a
                });
                self.bump();
                true
            }
            None => false,
        }
    }

    pub fn set_attachment_ratio(&mut self, id: NodeId, ratio: f32) -> bool {
        match self
            .nodes
            .get_mut(id as usize)
            .and_then(|n| n.as_mut())
            .and_then(|n| n.attachment.as_mut())
        {
            Some(a) => {
                a.ratio = clamp01(ratio);
                self.bump();
                true
            }
            None => false,
        }
    }

    pub fn set_node_z(&mut self, id: NodeId, z: i32) -> bool {
        match self.nodes.get_mut(id as usize).and_then(|n| n.as_mut()) {
            Some(n) => {
                n.z = z;
                true
            }
            None => false,
        }
    }

    // Edges

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id as usize).and_then(|e| e.as_ref())
    }

    pub fn edge_ids(&self) -> Vec<EdgeId> {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|_| i as EdgeId))
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_some()).count()
    }

    pub fn add_edge(&mut self, mut edge: Edge) -> EdgeId {
        clamp_edge(&mut edge);
        let id = self.edges.len() as EdgeId;
        self.edges.push(Some(edge));
        self.bump();
        id
    }

    pub(crate) fn add_edge_at(&mut self, id: EdgeId, mut edge: Edge) -> bool {
        clamp_edge(&mut edge);
        let idx = id as usize;
        if idx >= self.edges.len() {
            self.edges.resize_with(idx + 1, || None);
        }
        if self.edges[idx].is_some() {
            return false;
        }
        self.edges[idx] = Some(edge);
        self.bump();
        true
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let slot = self.edges.get_mut(id as usize)?;
        let edge = slot.take()?;
        self.bump();
        Some(edge)
    }

    pub fn set_vertices(&mut self, id: EdgeId, vertices: Vec<Vec2>) -> bool {
        if vertices.iter().any(|v| !v.is_finite()) {
            return false;
        }
        match self.edges.get_mut(id as usize).and_then(|e| e.as_mut()) {
            Some(e) => {
                e.vertices = vertices;
                self.bump();
                true
            }
            None => false,
        }
    }

    pub fn set_label(&mut self, id: EdgeId, index: usize, mut label: Label) -> bool {
        label.distance = clamp01(label.distance);
        match self
            .edges
            .get_mut(id as usize)
            .and_then(|e| e.as_mut())
            .and_then(|e| e.labels.get_mut(index))
        {
            Some(slot) => {
                *slot = label;
                self.bump();
                true
            }
            None => false,
        }
    }

    pub fn append_label(&mut self, id: EdgeId, mut label: Label) -> bool {
        label.distance = clamp01(label.distance);
        match self.edges.get_mut(id as usize).and_then(|e| e.as_mut()) {
            Some(e) => {
                e.labels.push(label);
                self.bump();
                true
            }
            None => false,
        }
    }

    /// Raw endpoint write. Ratio is clamped; acyclicity is the caller's
    /// responsibility ([`Editor::change_endpoint`] validates it).
    pub fn set_endpoint(&mut self, id: EdgeId, end: End, mut r: EndpointRef) -> bool {
        if let EndpointRef::EdgeRatio { ratio, .. } = &mut r {
            *ratio = clamp01(*ratio);
        }
        match self.edges.get_mut(id as usize).and_then(|e| e.as_mut()) {
            Some(e) => {
                match end {
                    End::Source => e.source = r,
                    End::Target => e.target = r,
                }
                self.bump();
                true
            }
            None => false,
        }
    }

    pub fn set_edge_z(&mut self, id: EdgeId, z: i32) -> bool {
        match self.edges.get_mut(id as usize).and_then(|e| e.as_mut()) {
            Some(e) => {
                e.z = z;
                true
            }
            None => false,
        }
    }

    // Dependent lookups

    /// Edge ends anchored to `edge` via `EdgeRatio`, in id order.
    pub fn edges_referencing(&self, edge: EdgeId) -> Vec<(EdgeId, End)> {
        let mut out = Vec::new();
        for (i, e) in self.edges.iter().enumerate() {
            let Some(e) = e else { continue };
            for end in [End::Source, End::Target] {
                if let EndpointRef::EdgeRatio { edge: host, .. } = e.endpoint(end) {
                    if *host == edge {
                        out.push((i as EdgeId, end));
                    }
                }
            }
        }
        out
    }

    /// Edge ends anchored to `node` by a node reference, in id order.
    pub fn edges_anchored_to_node(&self, node: NodeId) -> Vec<(EdgeId, End)> {
        let mut out = Vec::new();
        for (i, e) in self.edges.iter().enumerate() {
            let Some(e) = e else { continue };
            for end in [End::Source, End::Target] {
                if let EndpointRef::Node { node: n } = e.endpoint(end) {
                    if *n == node {
                        out.push((i as EdgeId, end));
                    }
                }
            }
        }
        out
    }

    /// Decoration nodes attached to `edge`, in id order.
    pub fn attachments_on(&self, edge: EdgeId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| {
                let n = n.as_ref()?;
                let a = n.attachment.as_ref()?;
                (a.host == edge).then_some(i as NodeId)
            })
            .collect()
    }

    // Save/load

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(json::snapshot(self)).unwrap_or(serde_json::Value::Null)
    }

    pub fn from_json(value: serde_json::Value) -> Result<Scene, serde_json::Error> {
        let doc: json::SceneDoc = serde_json::from_value(value)?;
        let mut scene = Scene::new();
        json::restore(&mut scene, &doc);
        Ok(scene)
    }
}

fn clamp_node(node: &mut Node) {
    if let Some(a) = node.attachment.as_mut() {
        a.ratio = clamp01(a.ratio);
    }
}

fn clamp_edge(edge: &mut Edge) {
    for end in [&mut edge.source, &mut edge.target] {
        if let EndpointRef::EdgeRatio { ratio, .. } = end {
            *ratio = clamp01(*ratio);
        }
    }
    for label in &mut edge.labels {
        label.distance = clamp01(label.distance);
    }
    edge.style.thinning = clamp01(edge.style.thinning);
}

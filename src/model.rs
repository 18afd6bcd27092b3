use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type NodeId = u32;
pub type EdgeId = u32;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Vec2 {
        Vec2 { x, y }
    }
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
    pub fn dist(self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A placed shape with its own meaning (labeled icon etc.).
    Content,
    /// A marker riding along a host edge via `Attachment`.
    Decoration,
}

/// A decoration's binding to a host edge at a normalized position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub host: EdgeId,
    pub ratio: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Rotation in degrees around the node center.
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub attachment: Option<Attachment>,
    #[serde(default)]
    pub z: i32,
}

impl Node {
    pub fn content(x: f32, y: f32, width: f32, height: f32) -> Node {
        Node {
            kind: NodeKind::Content,
            x,
            y,
            width,
            height,
            rotation: 0.0,
            attrs: BTreeMap::new(),
            attachment: None,
            z: 2,
        }
    }

    pub fn decoration(x: f32, y: f32, width: f32, height: f32) -> Node {
        Node {
            kind: NodeKind::Decoration,
            ..Node::content(x, y, width, height)
        }
    }

    pub fn attached(host: EdgeId, ratio: f32, width: f32, height: f32) -> Node {
        Node {
            attachment: Some(Attachment { host, ratio }),
            ..Node::decoration(0.0, 0.0, width, height)
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2 {
            x: self.x + self.width * 0.5,
            y: self.y + self.height * 0.5,
        }
    }
}

/// Where an edge end (or a dependent) takes its position from.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EndpointRef {
    /// An absolute point on the canvas.
    Point { x: f32, y: f32 },
    /// The connection boundary of a node (delegated to the view).
    Node { node: NodeId },
    /// A normalized position along another edge's rendered centerline.
    EdgeRatio { edge: EdgeId, ratio: f32 },
}

impl EndpointRef {
    pub fn point(p: Vec2) -> EndpointRef {
        EndpointRef::Point { x: p.x, y: p.y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum End {
    Source,
    Target,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub text: String,
    /// Normalized position along the edge, 0 = source end, 1 = target end.
    pub distance: f32,
    #[serde(default)]
    pub angle: f32,
    #[serde(default)]
    pub offset: Vec2,
}

impl Label {
    pub fn new(text: impl Into<String>, distance: f32) -> Label {
        Label {
            text: text.into(),
            distance,
            angle: 0.0,
            offset: Vec2::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    /// Width of the hairline fallback stroke.
    pub width: f32,
    /// Brush size of the organic stroke outline.
    pub size: f32,
    /// How strongly pressure thins the stroke, 0..=1.
    pub thinning: f32,
    /// Whether thinning is honored at all; a split zeroes this on every
    /// segment but the last so a stroke only tapers at its true endpoint.
    pub taper: bool,
}

impl Default for StrokeStyle {
    fn default() -> StrokeStyle {
        StrokeStyle {
            width: 3.0,
            size: 20.0,
            thinning: 0.0,
            taper: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: EndpointRef,
    pub target: EndpointRef,
    #[serde(default)]
    pub vertices: Vec<Vec2>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub style: StrokeStyle,
    /// Opaque router name passed through to the view layer.
    #[serde(default)]
    pub router: Option<String>,
    #[serde(default)]
    pub z: i32,
}

impl Edge {
    pub fn new(source: EndpointRef, target: EndpointRef) -> Edge {
        Edge {
            source,
            target,
            vertices: Vec::new(),
            labels: Vec::new(),
            style: StrokeStyle::default(),
            router: None,
            z: 1,
        }
    }

    pub fn endpoint(&self, end: End) -> &EndpointRef {
        match end {
            End::Source => &self.source,
            End::Target => &self.target,
        }
    }
}

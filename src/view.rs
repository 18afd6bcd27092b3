//! The capability contract between the core and the paint layer. The core
//! never draws; it asks the view for rendered centerlines and node boundary
//! points, and pushes computed outline paths back through `commit_outline`.

use crate::algorithms::anchor::resolve_endpoint;
use crate::error::ResolutionError;
use crate::geometry::math::{lerp, seg_distance_sq};
use crate::geometry::tolerance::clamp01;
use crate::model::{EdgeId, NodeId, Vec2};
use crate::Scene;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

/// A sampled centerline: an ordered polyline with precomputed arc lengths.
#[derive(Clone, Debug)]
pub struct Centerline {
    points: Vec<Vec2>,
    cum: Vec<f32>,
    total: f32,
}

impl Centerline {
    pub fn from_points(points: Vec<Vec2>) -> Centerline {
        let mut cum = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (i, p) in points.iter().enumerate() {
            if i > 0 {
                total += points[i - 1].dist(*p);
            }
            cum.push(total);
        }
        Centerline { points, cum, total }
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn length(&self) -> f32 {
        self.total
    }

    pub fn point_at_length(&self, l: f32) -> Vec2 {
        if self.points.is_empty() {
            return Vec2::default();
        }
        if self.points.len() == 1 || self.total <= 0.0 {
            return self.points[0];
        }
        let l = l.clamp(0.0, self.total);
        // cum is non-decreasing; find the segment containing l.
        let mut i = match self.cum.binary_search_by(|c| c.total_cmp(&l)) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        if i >= self.points.len() - 1 {
            i = self.points.len() - 2;
        }
        let seg_len = self.cum[i + 1] - self.cum[i];
        let t = if seg_len > 0.0 { (l - self.cum[i]) / seg_len } else { 0.0 };
        lerp(self.points[i], self.points[i + 1], t)
    }

    pub fn point_at_ratio(&self, r: f32) -> Vec2 {
        self.point_at_length(clamp01(r) * self.total)
    }

    /// Arc length and distance of the closest point on the polyline to `p`.
    pub fn closest_point(&self, p: Vec2) -> (f32, f32) {
        if self.points.is_empty() {
            return (0.0, f32::INFINITY);
        }
        if self.points.len() == 1 {
            return (0.0, self.points[0].dist(p));
        }
        let mut best_len = 0.0;
        let mut best_d2 = f32::INFINITY;
        for i in 0..self.points.len() - 1 {
            let (d2, t) = seg_distance_sq(p, self.points[i], self.points[i + 1]);
            if d2 < best_d2 {
                best_d2 = d2;
                best_len = self.cum[i] + t * (self.cum[i + 1] - self.cum[i]);
            }
        }
        (best_len, best_d2.sqrt())
    }

    pub fn closest_point_length(&self, p: Vec2) -> f32 {
        self.closest_point(p).0
    }
}

/// What the core needs from the paint layer.
pub trait View {
    /// The rendered centerline of an edge. Must fail with
    /// [`ResolutionError::Cycle`] instead of recursing forever when edge
    /// references form a loop.
    fn centerline(&self, scene: &Scene, edge: EdgeId) -> Result<Centerline, ResolutionError>;

    /// The connection boundary point of a node.
    fn node_boundary(&self, scene: &Scene, node: NodeId) -> Result<Vec2, ResolutionError>;

    /// Receive a computed stroke outline path for display. An empty path
    /// means "render nothing".
    fn commit_outline(&self, edge: EdgeId, d: &str);
}

/// Headless sampler: straight polyline through the resolved source point,
/// the vertices, and the resolved target point; node boundary is the node
/// center. Hosts with a real renderer (curved connectors, shape-aware
/// boundaries) supply their own [`View`].
#[derive(Default)]
pub struct PolylineView {
    in_flight: RefCell<HashSet<EdgeId>>,
    outlines: RefCell<HashMap<EdgeId, String>>,
}

impl PolylineView {
    pub fn new() -> PolylineView {
        PolylineView::default()
    }

    /// Last outline committed for an edge, if any.
    pub fn outline(&self, edge: EdgeId) -> Option<String> {
        self.outlines.borrow().get(&edge).cloned()
    }
}

impl View for PolylineView {
    fn centerline(&self, scene: &Scene, edge: EdgeId) -> Result<Centerline, ResolutionError> {
        let e = scene.edge(edge).ok_or(ResolutionError::UnknownEdge(edge))?;
        // Visited-set guard: endpoint resolution recurses back through this
        // method for EdgeRatio references.
        if !self.in_flight.borrow_mut().insert(edge) {
            return Err(ResolutionError::Cycle(edge));
        }
        let result = (|| {
            let a = resolve_endpoint(scene, self, &e.source)?;
            let b = resolve_endpoint(scene, self, &e.target)?;
            let mut pts = Vec::with_capacity(e.vertices.len() + 2);
            pts.push(a);
            pts.extend(e.vertices.iter().copied());
            pts.push(b);
            Ok(Centerline::from_points(pts))
        })();
        self.in_flight.borrow_mut().remove(&edge);
        result
    }

    fn node_boundary(&self, scene: &Scene, node: NodeId) -> Result<Vec2, ResolutionError> {
        let n = scene.node(node).ok_or(ResolutionError::UnknownNode(node))?;
        let c = n.center();
        if !c.is_finite() {
            return Err(ResolutionError::NonFinite);
        }
        Ok(c)
    }

    fn commit_outline(&self, edge: EdgeId, d: &str) {
        self.outlines.borrow_mut().insert(edge, d.to_string());
    }
}

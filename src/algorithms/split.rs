//! Structural edge splitting. An edge is cut into segments, every dependent
//! (ratio-anchored child edges, labels, decoration attachments) is remapped
//! onto the segment its ratio falls into, and the original edge is retired.
//! Callers wrap the surgery in a snapshot transaction; this module only
//! mutates the scene.

use crate::algorithms::anchor::resolve_endpoint;
use crate::error::SplitError;
use crate::geometry::tolerance::{clamp01, EPS_LEN, EPS_SPLIT, SPLIT_PICK_TOL};
use crate::model::{Attachment, Edge, EdgeId, EndpointRef, Node, NodeId, Vec2};
use crate::view::View;
use crate::Scene;
use log::debug;
use serde::{Deserialize, Serialize};

const INSERTED_NODE_SIZE: f32 = 24.0;

/// Where to cut.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum SplitSpec {
    /// Every interior vertex becomes a segment boundary; an edge with k
    /// vertices yields k+1 segments.
    EveryVertex,
    /// Drop one vertex and cut there, yielding two segments.
    AtVertex { index: usize },
    /// Cut at the point on the centerline nearest to the given point,
    /// yielding two segments. Aborts if the point is too far from the path.
    AtPoint { x: f32, y: f32 },
    /// Cut at a normalized position and join the two segments through a
    /// newly inserted decoration node.
    WithNode { ratio: f32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct SplitOutcome {
    /// Produced segments, source side first.
    pub segments: Vec<EdgeId>,
    /// The decoration node inserted by [`SplitSpec::WithNode`].
    pub inserted: Option<NodeId>,
}

/// Map a ratio on the original edge to `(segment index, local ratio)` given
/// a uniform partition into `n` segments.
pub fn floor_remap(r: f32, n: usize) -> (usize, f32) {
    let r = clamp01(r);
    let scaled = r * n as f32;
    let seg = (scaled.floor() as usize).min(n - 1);
    (seg, scaled - seg as f32)
}

/// Map a ratio on the original edge across a two-way cut at `s`.
fn two_way_remap(r: f32, s: f32) -> (usize, f32) {
    let r = clamp01(r);
    if r <= s {
        (0, clamp01(r / s))
    } else {
        (1, clamp01((r - s) / (1.0 - s)))
    }
}

pub fn split_edge<V: View + ?Sized>(
    scene: &mut Scene,
    view: &V,
    id: EdgeId,
    spec: SplitSpec,
) -> Result<SplitOutcome, SplitError> {
    let original = scene.edge(id).ok_or(SplitError::UnknownEdge(id))?.clone();
    let cl = view.centerline(scene, id)?;
    if cl.length() <= EPS_LEN {
        return Err(SplitError::DegenerateEdge(id));
    }
    let outcome = match spec {
        SplitSpec::EveryVertex => split_every_vertex(scene, view, id, &original)?,
        SplitSpec::AtVertex { index } => {
            if original.vertices.is_empty() {
                return Err(SplitError::NoVertices(id));
            }
            if index >= original.vertices.len() {
                return Err(SplitError::VertexOutOfRange { edge: id, index });
            }
            let v = original.vertices[index];
            let s = cl.closest_point_length(v) / cl.length();
            let left_verts = original.vertices[..index].to_vec();
            let right_verts = original.vertices[index + 1..].to_vec();
            split_two_way(scene, id, &original, s, v, left_verts, right_verts, false)?
        }
        SplitSpec::AtPoint { x, y } => {
            let p = Vec2::new(x, y);
            if !p.is_finite() {
                return Err(SplitError::NoSegment(id));
            }
            let (at, dist) = cl.closest_point(p);
            if dist > SPLIT_PICK_TOL {
                return Err(SplitError::NoSegment(id));
            }
            let s = at / cl.length();
            let cut = cl.point_at_length(at);
            let (left_verts, right_verts) = partition_vertices(&cl, &original.vertices, s);
            split_two_way(scene, id, &original, s, cut, left_verts, right_verts, false)?
        }
        SplitSpec::WithNode { ratio } => {
            // Keep the junction off the exact ends up front so the inserted
            // node never coincides with an original endpoint.
            let s = clamp01(ratio).clamp(EPS_SPLIT, 1.0 - EPS_SPLIT);
            let cut = cl.point_at_ratio(s);
            let (left_verts, right_verts) = partition_vertices(&cl, &original.vertices, s);
            split_two_way(scene, id, &original, s, cut, left_verts, right_verts, true)?
        }
    };
    debug!(
        "split edge {} into {} segments ({:?})",
        id,
        outcome.segments.len(),
        spec
    );
    Ok(outcome)
}

fn partition_vertices(
    cl: &crate::view::Centerline,
    vertices: &[Vec2],
    s: f32,
) -> (Vec<Vec2>, Vec<Vec2>) {
    let len = cl.length();
    let mut left = Vec::new();
    let mut right = Vec::new();
    for &v in vertices {
        let t = cl.closest_point_length(v) / len;
        if t <= s {
            left.push(v);
        } else {
            right.push(v);
        }
    }
    (left, right)
}

fn segment_from(original: &Edge, source: EndpointRef, target: EndpointRef, last: bool) -> Edge {
    let mut e = Edge::new(source, target);
    e.style = original.style;
    if !last {
        // A tapering stroke only tapers at its true endpoint.
        e.style.thinning = 0.0;
        e.style.taper = false;
    }
    e.router = original.router.clone();
    e.z = original.z;
    e
}

fn split_every_vertex<V: View + ?Sized>(
    scene: &mut Scene,
    view: &V,
    id: EdgeId,
    original: &Edge,
) -> Result<SplitOutcome, SplitError> {
    if original.vertices.is_empty() {
        return Err(SplitError::NoVertices(id));
    }
    let src = resolve_endpoint(scene, view, &original.source)?;
    let dst = resolve_endpoint(scene, view, &original.target)?;
    let mut points = Vec::with_capacity(original.vertices.len() + 2);
    points.push(src);
    points.extend(original.vertices.iter().copied());
    points.push(dst);

    let n = points.len() - 1;
    let mut segments = Vec::with_capacity(n);
    for i in 0..n {
        let source = if i == 0 {
            original.source
        } else {
            EndpointRef::point(points[i])
        };
        let target = if i == n - 1 {
            original.target
        } else {
            EndpointRef::point(points[i + 1])
        };
        segments.push(scene.add_edge(segment_from(original, source, target, i == n - 1)));
    }

    for label in &original.labels {
        let (seg, local) = floor_remap(label.distance, n);
        let mut l = label.clone();
        l.distance = local;
        scene.append_label(segments[seg], l);
    }
    remap_dependents(scene, id, &segments, |r| floor_remap(r, n));
    scene.remove_edge(id);
    Ok(SplitOutcome {
        segments,
        inserted: None,
    })
}

#[allow(clippy::too_many_arguments)]
fn split_two_way(
    scene: &mut Scene,
    id: EdgeId,
    original: &Edge,
    s: f32,
    cut: Vec2,
    left_verts: Vec<Vec2>,
    right_verts: Vec<Vec2>,
    insert_node: bool,
) -> Result<SplitOutcome, SplitError> {
    // Keep the boundary off the exact ends so neither segment is degenerate.
    let s = s.clamp(EPS_SPLIT, 1.0 - EPS_SPLIT);

    let (left_target, right_source, inserted) = if insert_node {
        let half = INSERTED_NODE_SIZE * 0.5;
        let nid = scene.add_node(Node::decoration(
            cut.x - half,
            cut.y - half,
            INSERTED_NODE_SIZE,
            INSERTED_NODE_SIZE,
        ));
        (
            EndpointRef::Node { node: nid },
            EndpointRef::Node { node: nid },
            Some(nid),
        )
    } else {
        (EndpointRef::point(cut), EndpointRef::point(cut), None)
    };

    let mut left = segment_from(original, original.source, left_target, false);
    left.vertices = left_verts;
    let mut right = segment_from(original, right_source, original.target, true);
    right.vertices = right_verts;
    let segments = vec![scene.add_edge(left), scene.add_edge(right)];

    for label in &original.labels {
        let (seg, local) = two_way_remap(label.distance, s);
        let mut l = label.clone();
        l.distance = local;
        scene.append_label(segments[seg], l);
    }
    remap_dependents(scene, id, &segments, |r| two_way_remap(r, s));
    scene.remove_edge(id);
    Ok(SplitOutcome { segments, inserted })
}

fn remap_dependents(
    scene: &mut Scene,
    original: EdgeId,
    segments: &[EdgeId],
    map: impl Fn(f32) -> (usize, f32),
) {
    for (eid, end) in scene.edges_referencing(original) {
        let Some(e) = scene.edge(eid) else { continue };
        let EndpointRef::EdgeRatio { ratio, .. } = *e.endpoint(end) else {
            continue;
        };
        let (seg, local) = map(ratio);
        scene.set_endpoint(
            eid,
            end,
            EndpointRef::EdgeRatio {
                edge: segments[seg],
                ratio: local,
            },
        );
    }
    for nid in scene.attachments_on(original) {
        let Some(a) = scene.node(nid).and_then(|n| n.attachment) else {
            continue;
        };
        let (seg, local) = map(a.ratio);
        scene.set_attachment(
            nid,
            Some(Attachment {
                host: segments[seg],
                ratio: local,
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::PolylineView;

    fn fixed(x: f32, y: f32) -> EndpointRef {
        EndpointRef::Point { x, y }
    }

    fn bent_edge(scene: &mut Scene) -> EdgeId {
        // 0,0 -> 10,0 -> 20,0 -> 30,0: two interior vertices, three segments.
        let mut e = Edge::new(fixed(0.0, 0.0), fixed(30.0, 0.0));
        e.vertices = vec![Vec2::new(10.0, 0.0), Vec2::new(20.0, 0.0)];
        scene.add_edge(e)
    }

    #[test]
    fn every_vertex_split_counts() {
        let mut s = Scene::new();
        let e = bent_edge(&mut s);
        let v = PolylineView::new();
        let out = split_edge(&mut s, &v, e, SplitSpec::EveryVertex).unwrap();
        assert_eq!(out.segments.len(), 3);
        assert!(s.edge(e).is_none(), "original is retired");
        // Boundaries became fixed endpoints; no segment keeps vertices.
        for &seg in &out.segments {
            assert!(s.edge(seg).unwrap().vertices.is_empty());
        }
        // Endpoint continuity: first keeps the source, last keeps the target.
        assert_eq!(s.edge(out.segments[0]).unwrap().source, fixed(0.0, 0.0));
        assert_eq!(s.edge(out.segments[2]).unwrap().target, fixed(30.0, 0.0));
    }

    #[test]
    fn dependent_at_half_lands_on_middle_segment() {
        let mut s = Scene::new();
        let e = bent_edge(&mut s);
        let dep = s.add_edge(Edge::new(
            EndpointRef::EdgeRatio { edge: e, ratio: 0.5 },
            fixed(15.0, 50.0),
        ));
        let v = PolylineView::new();
        let out = split_edge(&mut s, &v, e, SplitSpec::EveryVertex).unwrap();
        let r = s.edge(dep).unwrap().source;
        assert_eq!(
            r,
            EndpointRef::EdgeRatio {
                edge: out.segments[1],
                ratio: 0.5
            }
        );
    }

    #[test]
    fn floor_remap_boundaries() {
        assert_eq!(floor_remap(0.0, 3), (0, 0.0));
        assert_eq!(floor_remap(1.0, 3), (2, 1.0));
        let (seg, local) = floor_remap(0.5, 3);
        assert_eq!(seg, 1);
        assert!((local - 0.5).abs() < 1e-6);
    }

    #[test]
    fn labels_remap_like_dependents() {
        let mut s = Scene::new();
        let e = bent_edge(&mut s);
        s.append_label(e, crate::model::Label::new("MRCA", 0.5));
        s.append_label(e, crate::model::Label::new("PLM", 0.95));
        let v = PolylineView::new();
        let out = split_edge(&mut s, &v, e, SplitSpec::EveryVertex).unwrap();
        let mid = s.edge(out.segments[1]).unwrap();
        assert_eq!(mid.labels.len(), 1);
        assert_eq!(mid.labels[0].text, "MRCA");
        assert!((mid.labels[0].distance - 0.5).abs() < 1e-6);
        let last = s.edge(out.segments[2]).unwrap();
        assert_eq!(last.labels.len(), 1);
        assert!((last.labels[0].distance - 0.85).abs() < 1e-4);
    }

    #[test]
    fn taper_only_on_final_segment() {
        let mut s = Scene::new();
        let mut e = Edge::new(fixed(0.0, 0.0), fixed(30.0, 0.0));
        e.vertices = vec![Vec2::new(10.0, 0.0), Vec2::new(20.0, 0.0)];
        e.style.thinning = 0.8;
        e.style.taper = true;
        let id = s.add_edge(e);
        let v = PolylineView::new();
        let out = split_edge(&mut s, &v, id, SplitSpec::EveryVertex).unwrap();
        for (i, &seg) in out.segments.iter().enumerate() {
            let st = s.edge(seg).unwrap().style;
            if i == out.segments.len() - 1 {
                assert!(st.taper && (st.thinning - 0.8).abs() < 1e-6);
            } else {
                assert!(!st.taper && st.thinning == 0.0);
            }
        }
    }

    #[test]
    fn point_split_partitions_vertices() {
        let mut s = Scene::new();
        let e = bent_edge(&mut s);
        let v = PolylineView::new();
        let out = split_edge(&mut s, &v, e, SplitSpec::AtPoint { x: 15.0, y: 1.0 }).unwrap();
        assert_eq!(out.segments.len(), 2);
        let left = s.edge(out.segments[0]).unwrap();
        let right = s.edge(out.segments[1]).unwrap();
        // Vertex counts partition: one on each side of the cut at x=15.
        assert_eq!(left.vertices.len() + right.vertices.len(), 2);
        assert_eq!(left.vertices, vec![Vec2::new(10.0, 0.0)]);
        assert_eq!(right.vertices, vec![Vec2::new(20.0, 0.0)]);
    }

    #[test]
    fn point_split_remaps_by_cut_ratio() {
        let mut s = Scene::new();
        let e = s.add_edge(Edge::new(fixed(0.0, 0.0), fixed(100.0, 0.0)));
        let before = s.add_edge(Edge::new(
            EndpointRef::EdgeRatio { edge: e, ratio: 0.2 },
            fixed(20.0, 50.0),
        ));
        let after = s.add_edge(Edge::new(
            EndpointRef::EdgeRatio { edge: e, ratio: 0.8 },
            fixed(80.0, 50.0),
        ));
        let v = PolylineView::new();
        let out = split_edge(&mut s, &v, e, SplitSpec::AtPoint { x: 40.0, y: 0.0 }).unwrap();
        // s = 0.4: 0.2 -> left at 0.5; 0.8 -> right at (0.8-0.4)/0.6.
        match s.edge(before).unwrap().source {
            EndpointRef::EdgeRatio { edge, ratio } => {
                assert_eq!(edge, out.segments[0]);
                assert!((ratio - 0.5).abs() < 1e-4);
            }
            other => panic!("unexpected ref {:?}", other),
        }
        match s.edge(after).unwrap().source {
            EndpointRef::EdgeRatio { edge, ratio } => {
                assert_eq!(edge, out.segments[1]);
                assert!((ratio - 0.4 / 0.6).abs() < 1e-4);
            }
            other => panic!("unexpected ref {:?}", other),
        }
    }

    #[test]
    fn far_point_aborts_without_mutation() {
        let mut s = Scene::new();
        let e = bent_edge(&mut s);
        let v = PolylineView::new();
        let err = split_edge(&mut s, &v, e, SplitSpec::AtPoint { x: 15.0, y: 500.0 }).unwrap_err();
        assert_eq!(err, SplitError::NoSegment(e));
        assert!(s.edge(e).is_some());
        assert_eq!(s.edge_count(), 1);
    }

    #[test]
    fn with_node_inserts_decoration_junction() {
        let mut s = Scene::new();
        let e = s.add_edge(Edge::new(fixed(0.0, 0.0), fixed(100.0, 0.0)));
        let v = PolylineView::new();
        let out = split_edge(&mut s, &v, e, SplitSpec::WithNode { ratio: 0.25 }).unwrap();
        let nid = out.inserted.unwrap();
        let node = s.node(nid).unwrap();
        assert_eq!(node.kind, crate::model::NodeKind::Decoration);
        assert!((node.center().x - 25.0).abs() < 1e-3);
        assert_eq!(
            s.edge(out.segments[0]).unwrap().target,
            EndpointRef::Node { node: nid }
        );
        assert_eq!(
            s.edge(out.segments[1]).unwrap().source,
            EndpointRef::Node { node: nid }
        );
    }

    #[test]
    fn attachment_transfers_to_segment() {
        let mut s = Scene::new();
        let e = bent_edge(&mut s);
        let deco = s.add_node(Node::attached(e, 0.9, 12.0, 12.0));
        let v = PolylineView::new();
        let out = split_edge(&mut s, &v, e, SplitSpec::EveryVertex).unwrap();
        let a = s.node(deco).unwrap().attachment.unwrap();
        assert_eq!(a.host, out.segments[2]);
        assert!((a.ratio - 0.7).abs() < 1e-4);
    }

    #[test]
    fn split_ratio_clamped_off_ends() {
        let mut s = Scene::new();
        let e = s.add_edge(Edge::new(fixed(0.0, 0.0), fixed(100.0, 0.0)));
        let v = PolylineView::new();
        let out = split_edge(&mut s, &v, e, SplitSpec::WithNode { ratio: 0.0 }).unwrap();
        // Both segments exist and the junction sits just off the source end.
        assert_eq!(out.segments.len(), 2);
        let node = s.node(out.inserted.unwrap()).unwrap();
        assert!(node.center().x > 0.0);
    }

    #[test]
    fn vertexless_edge_rejects_vertex_split() {
        let mut s = Scene::new();
        let e = s.add_edge(Edge::new(fixed(0.0, 0.0), fixed(100.0, 0.0)));
        let v = PolylineView::new();
        assert_eq!(
            split_edge(&mut s, &v, e, SplitSpec::EveryVertex).unwrap_err(),
            SplitError::NoVertices(e)
        );
        assert_eq!(
            split_edge(&mut s, &v, e, SplitSpec::AtVertex { index: 0 }).unwrap_err(),
            SplitError::NoVertices(e)
        );
    }
}

//! Endpoint reference resolution and reference-graph validation.
//!
//! `EdgeRatio` and node references chain: an edge may anchor to a
//! point on another edge whose own source is again a ratio reference, and a
//! node anchor may reach a decoration whose position follows its host edge.
//! Resolution walks that chain through the injected [`View`]; validation
//! walks the same chain statically to reject cycles at assignment time.

use crate::error::ResolutionError;
use crate::geometry::tolerance::clamp01;
use crate::model::{EdgeId, EndpointRef, Vec2};
use crate::view::View;
use crate::Scene;
use std::collections::HashSet;

/// Resolve a reference to an absolute point. `EdgeRatio` recursion runs
/// through `view.centerline`, which carries the cycle guard.
pub fn resolve_endpoint<V: View + ?Sized>(
    scene: &Scene,
    view: &V,
    r: &EndpointRef,
) -> Result<Vec2, ResolutionError> {
    match *r {
        EndpointRef::Point { x, y } => {
            let p = Vec2::new(x, y);
            if !p.is_finite() {
                return Err(ResolutionError::NonFinite);
            }
            Ok(p)
        }
        EndpointRef::Node { node } => view.node_boundary(scene, node),
        EndpointRef::EdgeRatio { edge, ratio } => {
            let cl = view.centerline(scene, edge)?;
            let p = cl.point_at_ratio(clamp01(ratio));
            if !p.is_finite() {
                return Err(ResolutionError::NonFinite);
            }
            Ok(p)
        }
    }
}

/// Would assigning `r` as an endpoint of `edge` close a reference cycle?
/// Walks every edge reachable from `r`, through `EdgeRatio` references and
/// through decoration attachments behind node-anchor references.
pub fn would_cycle(scene: &Scene, edge: EdgeId, r: &EndpointRef) -> bool {
    let mut stack: Vec<EdgeId> = Vec::new();
    push_targets(scene, r, &mut stack);
    let mut seen: HashSet<EdgeId> = HashSet::new();
    while let Some(eid) = stack.pop() {
        if eid == edge {
            return true;
        }
        if !seen.insert(eid) {
            continue;
        }
        if let Some(e) = scene.edge(eid) {
            push_targets(scene, &e.source, &mut stack);
            push_targets(scene, &e.target, &mut stack);
        }
    }
    false
}

fn push_targets(scene: &Scene, r: &EndpointRef, out: &mut Vec<EdgeId>) {
    match *r {
        EndpointRef::Point { .. } => {}
        EndpointRef::Node { node } => {
            if let Some(a) = scene.node(node).and_then(|n| n.attachment.as_ref()) {
                out.push(a.host);
            }
        }
        EndpointRef::EdgeRatio { edge, .. } => out.push(edge),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, End, Node};
    use crate::view::PolylineView;

    fn fixed(x: f32, y: f32) -> EndpointRef {
        EndpointRef::Point { x, y }
    }

    #[test]
    fn resolves_fixed_and_node() {
        let mut s = Scene::new();
        let n = s.add_node(Node::content(10.0, 10.0, 20.0, 20.0));
        let v = PolylineView::new();
        let p = resolve_endpoint(&s, &v, &fixed(3.0, 4.0)).unwrap();
        assert_eq!((p.x, p.y), (3.0, 4.0));
        let p = resolve_endpoint(&s, &v, &EndpointRef::Node { node: n }).unwrap();
        assert_eq!((p.x, p.y), (20.0, 20.0));
    }

    #[test]
    fn resolves_through_a_reference_chain() {
        let mut s = Scene::new();
        let trunk = s.add_edge(Edge::new(fixed(0.0, 0.0), fixed(100.0, 0.0)));
        let limb = s.add_edge(Edge::new(
            EndpointRef::EdgeRatio { edge: trunk, ratio: 0.5 },
            fixed(50.0, 100.0),
        ));
        let twig = EndpointRef::EdgeRatio { edge: limb, ratio: 0.5 };
        let v = PolylineView::new();
        let p = resolve_endpoint(&s, &v, &twig).unwrap();
        assert!((p.x - 50.0).abs() < 1e-4);
        assert!((p.y - 50.0).abs() < 1e-4);
    }

    #[test]
    fn dangling_ids_error() {
        let s = Scene::new();
        let v = PolylineView::new();
        assert_eq!(
            resolve_endpoint(&s, &v, &EndpointRef::Node { node: 9 }),
            Err(ResolutionError::UnknownNode(9))
        );
        assert_eq!(
            resolve_endpoint(&s, &v, &EndpointRef::EdgeRatio { edge: 9, ratio: 0.5 }),
            Err(ResolutionError::UnknownEdge(9))
        );
    }

    #[test]
    fn cycle_is_detected_not_recursed() {
        let mut s = Scene::new();
        let a = s.add_edge(Edge::new(fixed(0.0, 0.0), fixed(10.0, 0.0)));
        let b = s.add_edge(Edge::new(
            EndpointRef::EdgeRatio { edge: a, ratio: 0.5 },
            fixed(10.0, 10.0),
        ));
        // Force the cycle through the raw scene write.
        assert!(s.set_endpoint(a, End::Source, EndpointRef::EdgeRatio { edge: b, ratio: 0.5 }));
        let v = PolylineView::new();
        let err = resolve_endpoint(&s, &v, &EndpointRef::EdgeRatio { edge: a, ratio: 0.1 })
            .unwrap_err();
        assert!(matches!(err, ResolutionError::Cycle(_)));
    }

    #[test]
    fn would_cycle_walks_attachments() {
        let mut s = Scene::new();
        let host = s.add_edge(Edge::new(fixed(0.0, 0.0), fixed(100.0, 0.0)));
        let deco = s.add_node(Node::attached(host, 0.5, 10.0, 10.0));
        // host -> deco -> host is a loop.
        assert!(would_cycle(&s, host, &EndpointRef::Node { node: deco }));
        // Anchoring some other edge to the decoration is fine.
        let other = s.add_edge(Edge::new(fixed(0.0, 50.0), fixed(100.0, 50.0)));
        assert!(!would_cycle(&s, other, &EndpointRef::Node { node: deco }));
    }

    #[test]
    fn would_cycle_direct_self_reference() {
        let mut s = Scene::new();
        let e = s.add_edge(Edge::new(fixed(0.0, 0.0), fixed(10.0, 0.0)));
        assert!(would_cycle(&s, e, &EndpointRef::EdgeRatio { edge: e, ratio: 0.2 }));
    }
}

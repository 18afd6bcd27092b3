//! Decoration projection. An attached node has no position of its own; its
//! pose is derived from the host edge's rendered centerline every time the
//! host's geometry changes. Derived writes are never recorded in history,
//! only the authoritative ratio is.

use crate::error::{EditError, ResolutionError};
use crate::geometry::math::angle_diff_rad;
use crate::geometry::tolerance::{clamp01, EPS_LEN, MIN_DECORATION_HEIGHT, TANGENT_DELTA};
use crate::model::{EdgeId, NodeId, Vec2};
use crate::view::View;
use crate::Scene;

/// A computed pose for an attached decoration. `height` is a display hint
/// (markers shrink across sharp kinks); it is never written back to the node,
/// otherwise repeated projection would compound the shrink.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Center of the decoration, on the host centerline.
    pub pos: Vec2,
    /// Rotation in degrees, aligned with the local tangent.
    pub angle: f32,
    pub height: f32,
}

/// Compute where an attached node belongs on its host's current centerline.
pub fn project<V: View + ?Sized>(
    scene: &Scene,
    view: &V,
    node: NodeId,
) -> Result<Placement, EditError> {
    let n = scene.node(node).ok_or(EditError::UnknownNode(node))?;
    let a = n.attachment.ok_or(EditError::NoAttachment(node))?;
    let cl = view.centerline(scene, a.host)?;

    let r = clamp01(a.ratio);
    let pos = cl.point_at_ratio(r);
    let p0 = cl.point_at_ratio(clamp01(r - TANGENT_DELTA));
    let p1 = cl.point_at_ratio(clamp01(r + TANGENT_DELTA));
    if !pos.is_finite() || !p0.is_finite() || !p1.is_finite() {
        return Err(ResolutionError::NonFinite.into());
    }

    let raw = (p1.y - p0.y).atan2(p1.x - p0.x).to_degrees();
    let angle = unwrap_angle(raw, n.rotation);

    // Kink between the two half-segments around the anchor; a marker
    // straddling a sharp bend is drawn shorter.
    let a0 = (pos.y - p0.y).atan2(pos.x - p0.x);
    let a1 = (p1.y - pos.y).atan2(p1.x - pos.x);
    let kink = angle_diff_rad(a1, a0).abs();
    let height =
        (n.height * (1.0 - kink / std::f32::consts::PI)).max(MIN_DECORATION_HEIGHT);

    Ok(Placement { pos, angle, height })
}

/// Flip `angle` by half-turns until it sits within a quarter-turn of the
/// node's previous rotation, so reprojection never flips a marker upside
/// down as the tangent crosses the vertical.
fn unwrap_angle(mut angle: f32, prev: f32) -> f32 {
    while angle - prev > 90.0 {
        angle -= 180.0;
    }
    while angle - prev < -90.0 {
        angle += 180.0;
    }
    angle
}

/// Write a placement to the scene: position and rotation only.
pub fn apply_placement(scene: &mut Scene, node: NodeId, p: &Placement) -> bool {
    let Some(n) = scene.node(node) else {
        return false;
    };
    let (w, h) = (n.width, n.height);
    scene.set_node_pose(node, p.pos.x - w * 0.5, p.pos.y - h * 0.5, p.angle)
}

/// Spread the decorations sharing `host` so none overlap along the
/// centerline. One greedy pass in id order: each decoration is pushed off
/// every earlier one that sits closer than their footprint allows. The pass
/// is not a global optimum, just enough separation for hit-testing.
pub fn relax_shared_host<V: View + ?Sized>(
    scene: &mut Scene,
    view: &V,
    host: EdgeId,
) -> Result<(), ResolutionError> {
    let cl = view.centerline(scene, host)?;
    let len = cl.length();
    if len <= EPS_LEN {
        return Ok(());
    }

    let ids = scene.attachments_on(host);
    let mut placed: Vec<(NodeId, f32, f32)> = Vec::with_capacity(ids.len());
    for nid in ids {
        let Some(n) = scene.node(nid) else { continue };
        let Some(a) = n.attachment else { continue };
        let mut r = clamp01(a.ratio);
        let footprint = n.width / len;
        for &(_, rj, fj) in &placed {
            let spacing = footprint.max(fj);
            let d = r - rj;
            if d.abs() < spacing {
                r = if d >= 0.0 { rj + spacing } else { rj - spacing };
                r = clamp01(r);
            }
        }
        if (r - a.ratio).abs() > f32::EPSILON {
            scene.set_attachment_ratio(nid, r);
        }
        placed.push((nid, r, footprint));
    }
    Ok(())
}

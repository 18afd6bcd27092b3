//! Procedural stroke outlines: a pressure-weighted centerline becomes a
//! closed, smoothly interpolated silhouette path. Pressure decreases
//! linearly from 1 at the source end to 0 at the target end, so strokes
//! taper toward their target.

use crate::error::ResolutionError;
use crate::geometry::math::{midpoint, unit_dir};
use crate::geometry::tolerance::{clamp01, EPS_LEN};
use crate::model::{EdgeId, StrokeStyle, Vec2};
use crate::view::{Centerline, View};
use crate::Scene;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokePoint {
    pub pos: Vec2,
    pub pressure: f32,
}

/// Tag each centerline point with `pressure(i) = 1 - i/maxIndex`.
pub fn pressure_line(cl: &Centerline) -> Vec<StrokePoint> {
    let pts = cl.points();
    if pts.len() < 2 {
        return pts
            .iter()
            .map(|&pos| StrokePoint { pos, pressure: 1.0 })
            .collect();
    }
    let max_index = (pts.len() - 1) as f32;
    pts.iter()
        .enumerate()
        .map(|(i, &pos)| StrokePoint {
            pos,
            pressure: 1.0 - i as f32 / max_index,
        })
        .collect()
}

/// Pluggable thickness/outline capability: turns a pressure-weighted
/// centerline into an ordered outline-point sequence tracing the stroke's
/// silhouette.
pub trait OutlineBuilder {
    fn build(&self, line: &[StrokePoint], style: &StrokeStyle) -> Vec<Vec2>;
}

/// Default builder: pressure maps to a per-point radius, points are offset
/// perpendicular to the local direction, and the outline walks down one side
/// and back up the other.
#[derive(Clone, Copy, Debug, Default)]
pub struct FreehandOutline;

fn stroke_radius(size: f32, thinning: f32, pressure: f32) -> f32 {
    (size * (0.5 - thinning * (0.5 - pressure))).max(0.0)
}

impl OutlineBuilder for FreehandOutline {
    fn build(&self, line: &[StrokePoint], style: &StrokeStyle) -> Vec<Vec2> {
        if line.len() < 2 {
            return Vec::new();
        }
        let total: f32 = line.windows(2).map(|w| w[0].pos.dist(w[1].pos)).sum();
        if total <= EPS_LEN {
            return Vec::new();
        }
        let thinning = if style.taper { clamp01(style.thinning) } else { 0.0 };

        let n = line.len();
        let mut left = Vec::with_capacity(n);
        let mut right = Vec::with_capacity(n);
        let mut dir = Vec2::new(1.0, 0.0);
        for i in 0..n {
            // Direction of the outgoing segment; keep the previous direction
            // across zero-length segments.
            let next = if i + 1 < n {
                unit_dir(line[i].pos, line[i + 1].pos)
            } else {
                unit_dir(line[i - 1].pos, line[i].pos)
            };
            if let Some(d) = next {
                dir = d;
            }
            let normal = Vec2::new(-dir.y, dir.x);
            let r = stroke_radius(style.size, thinning, clamp01(line[i].pressure));
            let p = line[i].pos;
            left.push(Vec2::new(p.x + normal.x * r, p.y + normal.y * r));
            right.push(Vec2::new(p.x - normal.x * r, p.y - normal.y * r));
        }
        left.extend(right.into_iter().rev());
        left
    }
}

/// Closed path via local quadratic interpolation: curve from the first point
/// through the second, then a sliding window of implicit midpoints. Fewer
/// than 4 outline points yield an empty path (nothing to render).
pub fn quadratic_path(points: &[Vec2]) -> String {
    if points.len() < 4 {
        return String::new();
    }
    let (a, b, c) = (points[0], points[1], points[2]);
    let m = midpoint(b, c);
    let mut d = format!(
        "M{:.2},{:.2} Q{:.2},{:.2} {:.2},{:.2} T ",
        a.x, a.y, b.x, b.y, m.x, m.y
    );
    for i in 2..points.len() - 1 {
        let m = midpoint(points[i], points[i + 1]);
        d.push_str(&format!("{:.2},{:.2} ", m.x, m.y));
    }
    d.push('Z');
    d
}

/// Recompute and push one edge's outline: centerline -> pressure line ->
/// silhouette -> path string -> `commit_outline`.
pub fn repaint_edge<V: View + ?Sized, B: OutlineBuilder + ?Sized>(
    scene: &Scene,
    view: &V,
    builder: &B,
    edge: EdgeId,
) -> Result<(), ResolutionError> {
    let style = scene
        .edge(edge)
        .ok_or(ResolutionError::UnknownEdge(edge))?
        .style;
    let cl = view.centerline(scene, edge)?;
    let line = pressure_line(&cl);
    let outline = builder.build(&line, &style);
    let d = quadratic_path(&outline);
    view.commit_outline(edge, &d);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, EndpointRef};
    use crate::view::PolylineView;

    fn straight(n: usize) -> Centerline {
        Centerline::from_points((0..n).map(|i| Vec2::new(i as f32 * 10.0, 0.0)).collect())
    }

    #[test]
    fn pressure_decreases_from_one_to_zero() {
        let line = pressure_line(&straight(5));
        assert_eq!(line[0].pressure, 1.0);
        assert_eq!(line[4].pressure, 0.0);
        for w in line.windows(2) {
            assert!(w[1].pressure <= w[0].pressure);
        }
    }

    #[test]
    fn constant_radius_without_taper() {
        let style = StrokeStyle {
            size: 20.0,
            thinning: 0.8,
            taper: false,
            ..StrokeStyle::default()
        };
        let outline = FreehandOutline.build(&pressure_line(&straight(4)), &style);
        assert_eq!(outline.len(), 8);
        // thinning ignored: every offset is size/2 off the axis.
        for p in &outline {
            assert!((p.y.abs() - 10.0).abs() < 1e-4, "offset {}", p.y);
        }
    }

    #[test]
    fn tapered_radius_shrinks_toward_target() {
        let style = StrokeStyle {
            size: 20.0,
            thinning: 1.0,
            taper: true,
            ..StrokeStyle::default()
        };
        let line = pressure_line(&straight(4));
        let outline = FreehandOutline.build(&line, &style);
        // Left side offsets run source -> target; widths must not grow.
        for i in 0..3 {
            assert!(outline[i + 1].y.abs() <= outline[i].y.abs() + 1e-4);
        }
        // Full pressure with thinning 1 gives the full brush size.
        assert!((outline[0].y.abs() - 20.0).abs() < 1e-4);
        // Zero pressure at the target collapses the radius.
        assert!(outline[3].y.abs() < 1e-4);
    }

    #[test]
    fn empty_path_below_four_points() {
        assert_eq!(quadratic_path(&[]), "");
        let three = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)];
        assert_eq!(quadratic_path(&three), "");
    }

    #[test]
    fn path_is_closed_and_starts_at_first_point() {
        let pts = [
            Vec2::new(0.0, 5.0),
            Vec2::new(10.0, 5.0),
            Vec2::new(10.0, -5.0),
            Vec2::new(0.0, -5.0),
        ];
        let d = quadratic_path(&pts);
        assert!(d.starts_with("M0.00,5.00 Q10.00,5.00 10.00,0.00 T "));
        assert!(d.ends_with('Z'));
    }

    #[test]
    fn degenerate_edge_commits_empty_path() {
        let mut s = crate::Scene::new();
        let e = s.add_edge(Edge::new(
            EndpointRef::Point { x: 5.0, y: 5.0 },
            EndpointRef::Point { x: 5.0, y: 5.0 },
        ));
        let v = PolylineView::new();
        repaint_edge(&s, &v, &FreehandOutline, e).unwrap();
        assert_eq!(v.outline(e).as_deref(), Some(""));
    }

    #[test]
    fn straight_edge_commits_nonempty_path() {
        let mut s = crate::Scene::new();
        let mut edge = Edge::new(
            EndpointRef::Point { x: 0.0, y: 0.0 },
            EndpointRef::Point { x: 100.0, y: 0.0 },
        );
        edge.vertices.push(Vec2::new(40.0, 20.0));
        edge.vertices.push(Vec2::new(70.0, -10.0));
        let e = s.add_edge(edge);
        let v = PolylineView::new();
        repaint_edge(&s, &v, &FreehandOutline, e).unwrap();
        let d = v.outline(e).unwrap();
        assert!(d.starts_with('M') && d.ends_with('Z'));
    }
}

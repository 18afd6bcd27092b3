use crate::geometry::tolerance::EPS_LEN;
use crate::model::Vec2;

/// Squared distance from `p` to segment `a..b`, plus the clamped parameter t.
pub fn seg_distance_sq(p: Vec2, a: Vec2, b: Vec2) -> (f32, f32) {
    let vx = b.x - a.x;
    let vy = b.y - a.y;
    let wx = p.x - a.x;
    let wy = p.y - a.y;
    let vv = vx * vx + vy * vy;
    let mut t = if vv > 0.0 { (wx * vx + wy * vy) / vv } else { 0.0 };
    if t < 0.0 {
        t = 0.0;
    } else if t > 1.0 {
        t = 1.0;
    }
    let projx = a.x + t * vx;
    let projy = a.y + t * vy;
    let dx = p.x - projx;
    let dy = p.y - projy;
    (dx * dx + dy * dy, t)
}

#[inline]
pub fn lerp(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    Vec2 {
        x: a.x + (b.x - a.x) * t,
        y: a.y + (b.y - a.y) * t,
    }
}

#[inline]
pub fn midpoint(a: Vec2, b: Vec2) -> Vec2 {
    Vec2 {
        x: (a.x + b.x) * 0.5,
        y: (a.y + b.y) * 0.5,
    }
}

/// Unit direction from `a` to `b`, or None for a ~zero-length segment.
pub fn unit_dir(a: Vec2, b: Vec2) -> Option<Vec2> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len <= EPS_LEN {
        None
    } else {
        Some(Vec2 {
            x: dx / len,
            y: dy / len,
        })
    }
}

/// Smallest signed difference `a - b` between two angles in radians,
/// wrapped into [-pi, pi].
pub fn angle_diff_rad(a: f32, b: f32) -> f32 {
    let mut d = a - b;
    while d > std::f32::consts::PI {
        d -= 2.0 * std::f32::consts::PI;
    }
    while d < -std::f32::consts::PI {
        d += 2.0 * std::f32::consts::PI;
    }
    d
}

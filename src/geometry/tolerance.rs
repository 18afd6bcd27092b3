// Centralized tolerances and helpers for robust geometry

pub const EPS_LEN: f32 = 1e-6;            // zero-length vector threshold
pub const EPS_SPLIT: f32 = 1e-3;          // keeps split boundaries off the edge ends
pub const TANGENT_DELTA: f32 = 2e-3;      // finite-difference half-step (normalized length)
pub const MIN_DECORATION_HEIGHT: f32 = 4.0; // floor for curvature-shrunk decorations (px)
pub const SPLIT_PICK_TOL: f32 = 150.0;    // max distance from a split point to the path (px)

#[inline] pub fn clamp01(x: f32) -> f32 { x.max(0.0).min(1.0) }

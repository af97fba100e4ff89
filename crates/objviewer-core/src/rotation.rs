//! Trackball rotation and axis-angle / rotation-matrix conversions.
//!
//! Rotations are plain [`DMat3`] values (orthonormal, det = +1) and axis-angle
//! vectors are [`DVec3`] values whose direction is the axis and whose length is
//! the angle in radians.

use std::f64::consts::{PI, SQRT_2};

use glam::{DMat3, DVec2, DVec3};

/// Radius of the virtual trackball sphere, in normalized device coordinates.
pub const TRACKBALL_RADIUS: f64 = 0.8;

/// Angles closer than this to `0` or `PI` use the degenerate-case formulas.
pub const ROTATION_EPSILON: f64 = 1e-15;

/// Axis-angle rotation vector.
pub type AxisAngle = DVec3;

/// Element `(row, col)` of a column-major matrix.
#[inline]
fn at(m: &DMat3, row: usize, col: usize) -> f64 {
    m.col(col)[row]
}

/// Skew-symmetric cross-product matrix `W` with `W * v == r x v`.
#[must_use]
pub fn skew(r: DVec3) -> DMat3 {
    DMat3::from_cols(
        DVec3::new(0.0, r.z, -r.y),
        DVec3::new(-r.z, 0.0, r.x),
        DVec3::new(r.y, -r.x, 0.0),
    )
}

/// Trace of a 3x3 matrix.
#[must_use]
pub fn trace(m: &DMat3) -> f64 {
    m.x_axis.x + m.y_axis.y + m.z_axis.z
}

/// Height of a 2D point lifted onto the trackball surface.
///
/// Inside `r / sqrt(2)` the point lands on the sphere of radius `r`; outside it
/// lands on the hyperbolic sheet `z = r^2 / (2 |p|)`, which meets the sphere
/// smoothly at the boundary.
#[must_use]
pub fn trackball_height(radius: f64, p: DVec2) -> f64 {
    let d = p.length();
    if d < radius / SQRT_2 {
        (radius * radius - d * d).sqrt()
    } else {
        radius * radius / (2.0 * d)
    }
}

/// Rotation produced by dragging from `prev` to `curr` on the default trackball.
///
/// Both points are in normalized device coordinates (`[-1, 1]` on each axis).
#[must_use]
pub fn trackball(prev: DVec2, curr: DVec2) -> DMat3 {
    trackball_with_radius(TRACKBALL_RADIUS, prev, curr)
}

/// Rotation produced by dragging from `prev` to `curr` on a trackball of `radius`.
///
/// Returns the identity when the two points coincide.
#[must_use]
pub fn trackball_with_radius(radius: f64, prev: DVec2, curr: DVec2) -> DMat3 {
    if prev == curr {
        return DMat3::IDENTITY;
    }

    let p1 = prev.extend(trackball_height(radius, prev));
    let p2 = curr.extend(trackball_height(radius, curr));
    let axis = p1.cross(p2).normalize_or_zero();

    let t = ((p1 - p2).length() / (2.0 * radius)).clamp(-1.0, 1.0);
    let angle = 2.0 * t.asin();

    axis_angle_to_rotation(axis * angle)
}

/// Rodrigues formula: axis-angle vector to rotation matrix.
///
/// For angles below [`ROTATION_EPSILON`] the second-order expansion
/// `I + W + W^2 / 2` replaces the closed form, which would divide by the angle.
#[must_use]
pub fn axis_angle_to_rotation(r: AxisAngle) -> DMat3 {
    let w = skew(r);
    let w2 = w * w;
    let a = r.length();

    if a < ROTATION_EPSILON {
        DMat3::IDENTITY + w + w2 * 0.5
    } else {
        DMat3::IDENTITY + w * (a.sin() / a) + w2 * ((1.0 - a.cos()) / (a * a))
    }
}

/// Inverse Rodrigues formula: rotation matrix to axis-angle vector.
///
/// Three regimes:
/// - near identity, the antisymmetric part is used directly;
/// - near `PI`, the axis is recovered from the symmetric part
///   `S = (R - I) / 2`, anchored on its largest diagonal component;
/// - otherwise the antisymmetric part is scaled by `a / (2 sin a)`.
///
/// The near-`PI` branch is ill-conditioned: the axis sign is arbitrary and
/// precision degrades as the angle approaches `PI` from below.
#[must_use]
pub fn rotation_to_axis_angle(r: &DMat3) -> AxisAngle {
    let cos_a = ((trace(r) - 1.0) / 2.0).clamp(-1.0, 1.0);
    let a = cos_a.acos();

    let antisymmetric = DVec3::new(
        at(r, 2, 1) - at(r, 1, 2),
        at(r, 0, 2) - at(r, 2, 0),
        at(r, 1, 0) - at(r, 0, 1),
    );

    if a < ROTATION_EPSILON {
        antisymmetric * 0.5
    } else if a > PI - ROTATION_EPSILON {
        axis_from_symmetric_part(r) * a
    } else {
        antisymmetric * (a / (2.0 * a.sin()))
    }
}

/// Unit rotation axis of a half-turn, from `S = (R - I) / 2 = u u^T - I`.
fn axis_from_symmetric_part(r: &DMat3) -> DVec3 {
    let s = (*r - DMat3::IDENTITY) * 0.5;
    let magnitudes = DVec3::new(
        (at(&s, 0, 0) + 1.0).max(0.0).sqrt(),
        (at(&s, 1, 1) + 1.0).max(0.0).sqrt(),
        (at(&s, 2, 2) + 1.0).max(0.0).sqrt(),
    );

    let anchor = if magnitudes.x >= magnitudes.y && magnitudes.x >= magnitudes.z {
        0
    } else if magnitudes.y >= magnitudes.z {
        1
    } else {
        2
    };

    let pivot = magnitudes[anchor];
    if pivot <= ROTATION_EPSILON {
        return DVec3::ZERO;
    }

    let mut axis = DVec3::ZERO;
    for i in 0..3 {
        axis[i] = if i == anchor {
            pivot
        } else {
            at(&s, i, anchor) / pivot
        };
    }
    axis.normalize_or_zero()
}

/// Whether `m` is orthonormal with determinant +1, within `tolerance`.
#[must_use]
pub fn is_rotation(m: &DMat3, tolerance: f64) -> bool {
    let gram = m.transpose() * *m;
    gram.abs_diff_eq(DMat3::IDENTITY, tolerance) && (m.determinant() - 1.0).abs() <= tolerance
}

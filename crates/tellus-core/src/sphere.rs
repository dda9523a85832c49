//! Spherical geometry utilities shared by every pipeline stage.
//! All operations on the unit sphere using f64 precision.
//!
//! The polar axis is +Y: latitude is `asin(y)`, the equator lies in the
//! XZ plane. Tangent frames built in `climate::frames` follow the same
//! convention.

use serde::{Deserialize, Serialize};

/// A point (or direction) on the unit sphere in Cartesian coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0 }
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn normalize(self) -> Self {
        let len = self.length();
        if len < 1e-15 {
            return Self::new(1.0, 0.0, 0.0);
        }
        Self { x: self.x / len, y: self.y / len, z: self.z / len }
    }

    pub fn add(self, other: Self) -> Self {
        Self { x: self.x + other.x, y: self.y + other.y, z: self.z + other.z }
    }

    pub fn sub(self, other: Self) -> Self {
        Self { x: self.x - other.x, y: self.y - other.y, z: self.z - other.z }
    }

    pub fn scale(self, s: f64) -> Self {
        Self { x: self.x * s, y: self.y * s, z: self.z * s }
    }

    /// Latitude in degrees, +90 at the +Y pole.
    pub fn latitude_deg(self) -> f64 {
        self.y.clamp(-1.0, 1.0).asin().to_degrees()
    }

    /// Longitude in degrees in [-180, 180), measured in the XZ plane.
    pub fn longitude_deg(self) -> f64 {
        self.z.atan2(self.x).to_degrees()
    }

    /// Component of `self` perpendicular to unit vector `axis`, normalized.
    /// Returns `None` when `self` is (anti)parallel to `axis`.
    pub fn tangent_from(self, axis: Self) -> Option<Self> {
        let t = self.sub(axis.scale(self.dot(axis)));
        if t.length() < 1e-12 {
            None
        } else {
            Some(t.normalize())
        }
    }
}

/// Great-circle distance between two unit vectors in radians.
pub fn great_circle_distance_rad(a: Vec3, b: Vec3) -> f64 {
    a.dot(b).clamp(-1.0, 1.0).acos()
}

/// Interpolate along a great circle arc. t=0 returns a, t=1 returns b.
pub fn slerp(a: Vec3, b: Vec3, t: f64) -> Vec3 {
    let omega = great_circle_distance_rad(a, b);
    if omega.abs() < 1e-10 {
        return a;
    }
    let sin_omega = omega.sin();
    let fa = ((1.0 - t) * omega).sin() / sin_omega;
    let fb = (t * omega).sin() / sin_omega;
    Vec3 {
        x: fa * a.x + fb * b.x,
        y: fa * a.y + fb * b.y,
        z: fa * a.z + fb * b.z,
    }
}

/// Rotate unit vector `p` by `angle_rad` about unit `axis` (Rodrigues).
pub fn rotate_about_axis(p: Vec3, axis: Vec3, angle_rad: f64) -> Vec3 {
    let (sin_a, cos_a) = angle_rad.sin_cos();
    let k = axis;
    let kxp = k.cross(p);
    let kdp = k.dot(p);
    Vec3 {
        x: p.x * cos_a + kxp.x * sin_a + k.x * kdp * (1.0 - cos_a),
        y: p.y * cos_a + kxp.y * sin_a + k.y * kdp * (1.0 - cos_a),
        z: p.z * cos_a + kxp.z * sin_a + k.z * kdp * (1.0 - cos_a),
    }
    .normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latitude_of_poles() {
        assert!((Vec3::new(0.0, 1.0, 0.0).latitude_deg() - 90.0).abs() < 1e-9);
        assert!((Vec3::new(0.0, -1.0, 0.0).latitude_deg() + 90.0).abs() < 1e-9);
        assert!(Vec3::new(1.0, 0.0, 0.0).latitude_deg().abs() < 1e-9);
    }

    #[test]
    fn slerp_endpoints() {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 0.0, 1.0);
        let s0 = slerp(a, b, 0.0);
        let s1 = slerp(a, b, 1.0);
        assert!((s0.x - a.x).abs() < 1e-9);
        assert!((s1.z - b.z).abs() < 1e-9);
    }

    #[test]
    fn rotation_preserves_unit_length_and_angle() {
        let p = Vec3::new(1.0, 0.0, 0.0);
        let axis = Vec3::new(0.0, 1.0, 0.0);
        let q = rotate_about_axis(p, axis, 0.25);
        assert!((q.length() - 1.0).abs() < 1e-12);
        assert!((great_circle_distance_rad(p, q) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn tangent_from_is_perpendicular() {
        let p = Vec3::new(0.3, 0.5, 0.81).normalize();
        let axis = Vec3::new(0.0, 1.0, 0.0);
        let t = p.tangent_from(axis).unwrap();
        assert!(t.dot(axis).abs() < 1e-9, "tangent must be perpendicular to axis");
        assert!((t.length() - 1.0).abs() < 1e-12);
    }
}

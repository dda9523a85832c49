//! Geostrophic wind from the pressure field: per-cell least-squares
//! gradients in the tangent frame, a latitude-dependent Coriolis rotation
//! with surface friction folded in, and a seasonal 95th-percentile
//! normalization.

use crate::climate::frames::TangentFrames;
use crate::fields::{normalize_p95, smoothstep};
use crate::mesh::Mesh;

pub struct WindField {
    pub pressure: Vec<f32>,
    /// Tangent-frame components, normalized by the seasonal 95th percentile.
    pub east: Vec<f32>,
    pub north: Vec<f32>,
    /// Magnitude in [0, 1].
    pub speed: Vec<f32>,
}

/// Independent 1-D least squares along each tangent direction:
/// `grad = sum(d * dp) / sum(d * d)` over the neighbor offsets.
pub fn pressure_gradients(
    mesh: &Mesh,
    frames: &TangentFrames,
    pressure: &[f32],
) -> (Vec<f32>, Vec<f32>) {
    let n = mesh.num_regions;
    let mut grad_e = vec![0.0f32; n];
    let mut grad_n = vec![0.0f32; n];
    let edge = mesh.avg_edge_rad();

    for r in 0..n {
        let p = mesh.positions[r];
        let mut ee = 0.0f64;
        let mut ep = 0.0f64;
        let mut nn = 0.0f64;
        let mut np = 0.0f64;
        for &nb in mesh.neighbors(r) {
            let nb = nb as usize;
            let offset = mesh.positions[nb].sub(p);
            let de = offset.dot(frames.east[r]) / edge;
            let dn = offset.dot(frames.north[r]) / edge;
            let dp = (pressure[nb] - pressure[r]) as f64;
            ee += de * de;
            ep += de * dp;
            nn += dn * dn;
            np += dn * dp;
        }
        if ee > 1e-12 {
            grad_e[r] = (ep / ee) as f32;
        }
        if nn > 1e-12 {
            grad_n[r] = (np / nn) as f32;
        }
    }
    (grad_e, grad_n)
}

/// Build the seasonal wind field from a pressure field.
pub fn wind_field(mesh: &Mesh, frames: &TangentFrames, pressure: Vec<f32>) -> WindField {
    let n = mesh.num_regions;
    let (grad_e, grad_n) = pressure_gradients(mesh, frames, &pressure);
    let sin5 = 5.0f32.to_radians().sin();

    let mut east = vec![0.0f32; n];
    let mut north = vec![0.0f32; n];
    for r in 0..n {
        let sin_lat = mesh.positions[r].y as f32;
        // Pressure-gradient force, rotated by the Coriolis deflection. The
        // -20 degree offset stands in for surface friction near the equator.
        let pgf_e = -grad_e[r];
        let pgf_n = -grad_n[r];
        let theta_mag = 70.0 * smoothstep(0.0, sin5, sin_lat.abs()) - 20.0;
        let rotation_sign = if sin_lat >= 0.0 { -1.0 } else { 1.0 };
        let theta = (rotation_sign * theta_mag).to_radians();
        let (sin_t, cos_t) = theta.sin_cos();
        east[r] = (cos_t * pgf_e - sin_t * pgf_n) * 0.6;
        north[r] = (sin_t * pgf_e + cos_t * pgf_n) * 0.6;
    }

    // Season-global normalization by the 95th-percentile speed; everything
    // faster clamps to 1 so downstream consumers can treat speed as [0, 1].
    let mut speed: Vec<f32> = (0..n)
        .map(|r| (east[r] * east[r] + north[r] * north[r]).sqrt())
        .collect();
    let p95 = normalize_p95(&mut speed);
    if p95 > 1e-9 {
        for r in 0..n {
            east[r] /= p95;
            north[r] /= p95;
            if speed[r] > 1.0 {
                east[r] /= speed[r];
                north[r] /= speed[r];
                speed[r] = 1.0;
            }
        }
    }

    WindField { pressure, east, north, speed }
}

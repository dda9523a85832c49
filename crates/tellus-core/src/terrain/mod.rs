//! Terrain post-processing: bilateral smoothing, priority-flood pit
//! resolution with canyon carving, interleaved glacial / hydraulic / thermal
//! erosion, ridge sharpening, and soil creep.
//!
//! Re-runs after every elevation update. With all strengths at zero the
//! stage is the identity.

pub mod flood;
pub mod glacial;
pub mod hydraulic;
pub mod smoothing;
pub mod thermal;

use crate::error::GenError;
use crate::mesh::Mesh;
use flood::priority_flood;
use serde::{Deserialize, Serialize};

/// User-facing post-processing strengths, each in [0, 1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PostParams {
    pub smoothing: f32,
    pub glacial_erosion: f32,
    pub hydraulic_erosion: f32,
    pub thermal_erosion: f32,
    pub ridge_sharpening: f32,
}

impl Default for PostParams {
    fn default() -> Self {
        Self {
            smoothing: 0.5,
            glacial_erosion: 0.5,
            hydraulic_erosion: 0.5,
            thermal_erosion: 0.5,
            ridge_sharpening: 0.5,
        }
    }
}

impl PostParams {
    pub fn validate(&self) -> Result<(), GenError> {
        for (name, v) in [
            ("smoothing", self.smoothing),
            ("glacial_erosion", self.glacial_erosion),
            ("hydraulic_erosion", self.hydraulic_erosion),
            ("thermal_erosion", self.thermal_erosion),
            ("ridge_sharpening", self.ridge_sharpening),
        ] {
            if !(0.0..=1.0).contains(&v) || !v.is_finite() {
                return Err(GenError::invalid(format!("{name} strength {v} outside [0, 1]")));
            }
        }
        Ok(())
    }

    /// All strengths zero: post-processing must leave elevation untouched.
    pub fn is_identity(&self) -> bool {
        self.smoothing == 0.0
            && self.glacial_erosion == 0.0
            && self.hydraulic_erosion == 0.0
            && self.thermal_erosion == 0.0
            && self.ridge_sharpening == 0.0
    }
}

/// Run the full post-processing stack in place.
pub fn post_process(
    mesh: &Mesh,
    plate_of: &[u32],
    elevation: &mut [f32],
    params: &PostParams,
    seed: u64,
) -> Result<(), GenError> {
    params.validate()?;
    if elevation.len() != mesh.num_regions {
        return Err(GenError::invariant("elevation length does not match mesh".to_string()));
    }
    if params.is_identity() {
        return Ok(());
    }

    smoothing::bilateral_smooth(mesh, elevation, params.smoothing);
    priority_flood(mesh, elevation, 0.5, seed);

    // ── Interleaved erosion ─────────────────────────────────────────────────
    let h_iters = (20.0 * params.hydraulic_erosion).round() as usize;
    let t_iters = (10.0 * params.thermal_erosion).round() as usize;
    let g_iters = (10.0 * params.glacial_erosion).round() as usize;
    let total = h_iters.max(t_iters).max(g_iters);
    let reflood_at = (0.75 * total as f32) as usize;

    for it in 0..total {
        if it == reflood_at && total > 0 {
            // Glaciers carve closed basins; punch outlets through them with
            // an aggressive carve before the remaining iterations.
            priority_flood(mesh, elevation, 0.85, seed);
        }
        if it < g_iters {
            glacial::glacial_iteration(mesh, elevation, params.glacial_erosion, g_iters);
        }
        if it < h_iters {
            hydraulic::hydraulic_iteration(mesh, elevation);
        }
        if it < t_iters {
            thermal::thermal_iteration(mesh, plate_of, elevation);
        }
    }

    smoothing::ridge_sharpen(mesh, elevation, params.ridge_sharpening);
    smoothing::soil_creep(mesh, elevation);

    log::info!(
        "terrain: {total} erosion iterations (h={h_iters} t={t_iters} g={g_iters}), peak {:.3}",
        elevation.iter().cloned().fold(f32::MIN, f32::max),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plates::simulate_plates;
    use crate::{elevation::assign_elevation, noise_field::NoiseField};

    fn generated(seed: u64, n: usize) -> (Mesh, Vec<u32>, Vec<f32>) {
        let mesh = Mesh::fibonacci(n, 0.5, seed).unwrap();
        let plates = simulate_plates(&mesh, seed, 12, 4).unwrap();
        let noise = NoiseField::new(seed as u32);
        let field = assign_elevation(&mesh, &plates, &noise, seed, 0.04).unwrap();
        (mesh, plates.plate_of, field.elevation)
    }

    #[test]
    fn zero_strengths_leave_elevation_unchanged() {
        let (mesh, plate_of, mut elevation) = generated(42, 1500);
        let before = elevation.clone();
        let zero = PostParams {
            smoothing: 0.0,
            glacial_erosion: 0.0,
            hydraulic_erosion: 0.0,
            thermal_erosion: 0.0,
            ridge_sharpening: 0.0,
        };
        post_process(&mesh, &plate_of, &mut elevation, &zero, 42).unwrap();
        assert_eq!(elevation, before, "identity law violated");
    }

    #[test]
    fn full_stack_resolves_every_pit() {
        let (mesh, plate_of, mut elevation) = generated(42, 2000);
        post_process(&mesh, &plate_of, &mut elevation, &PostParams::default(), 42).unwrap();

        // After the stack, a final flood must find nothing to fill.
        let before = elevation.clone();
        let result = priority_flood(&mesh, &mut elevation, 0.5, 42);
        if result.open_ocean.iter().any(|&o| o) {
            let moved = elevation
                .iter()
                .zip(&before)
                .filter(|(a, b)| (**a - **b).abs() > 1e-3)
                .count();
            // Ridge sharpening and soil creep may re-open a handful of
            // epsilon-scale pits; anything beyond that is a real failure.
            assert!(
                moved < mesh.num_regions / 50,
                "{moved} cells still needed pit resolution after post-processing"
            );
        }
    }

    #[test]
    fn rejects_out_of_range_strengths() {
        let (mesh, plate_of, mut elevation) = generated(3, 800);
        let bad = PostParams { smoothing: 1.5, ..PostParams::default() };
        assert!(post_process(&mesh, &plate_of, &mut elevation, &bad, 3).is_err());
    }

    #[test]
    fn post_processing_is_deterministic() {
        let (mesh, plate_of, elevation) = generated(9, 1200);
        let mut a = elevation.clone();
        let mut b = elevation;
        post_process(&mesh, &plate_of, &mut a, &PostParams::default(), 9).unwrap();
        post_process(&mesh, &plate_of, &mut b, &PostParams::default(), 9).unwrap();
        assert_eq!(a, b);
    }
}

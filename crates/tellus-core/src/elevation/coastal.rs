//! Coastal roughening: fractal noise and domain warping inside a band
//! around the shoreline, plus island scattering in shallow water. Runs after
//! the layer stack, once the downstream classifications have been captured,
//! so new islands never retroactively change coast seeds.

use crate::elevation::distance::bfs_distance_capped;
use crate::elevation::DebugLayers;
use crate::mesh::Mesh;
use crate::noise_field::NoiseField;

/// Width of the roughening band in cells.
const COAST_BAND: f32 = 8.0;

pub fn roughen_coasts(
    mesh: &Mesh,
    noise: &NoiseField,
    stress: &[f32],
    trench_dist: &[f32],
    elevation: &mut [f32],
    debug: &mut DebugLayers,
) {
    let n = mesh.num_regions;

    // Coast cells by current elevation sign, both sides of the waterline.
    let mut seeds: Vec<u32> = Vec::new();
    for r in 0..n {
        let land = elevation[r] >= 0.0;
        if mesh
            .neighbors(r)
            .iter()
            .any(|&nb| (elevation[nb as usize] >= 0.0) != land)
        {
            seeds.push(r as u32);
        }
    }
    let band = bfs_distance_capped(mesh, &seeds, COAST_BAND, None);

    for r in 0..n {
        let d = band[r];
        if !d.is_finite() || d > COAST_BAND {
            continue;
        }
        let pos = mesh.positions[r];
        let falloff = 1.0 - d / COAST_BAND;
        // Active margins (high residual stress) get busier coastlines.
        let active = stress[r] > 0.03;
        let (freq, amp, warp) = if active { (18.0, 0.12, 0.5) } else { (12.0, 0.08, 0.3) };

        let mut delta = amp * noise.fbm(pos, freq, 4) * falloff * falloff;
        delta += 0.05 * noise.warped_fbm(pos, 2.0, 3, warp) * falloff;

        // Island scattering: shallow open-water cells away from subduction
        // coasts can break the surface.
        let e = elevation[r];
        if e < 0.0 && e > -0.12 && trench_dist[r] > 6.0 {
            let v = noise.fbm(pos, 9.0, 4);
            if v > 0.55 {
                delta += (v - 0.55) * 0.5 * falloff * falloff;
            }
        }

        elevation[r] += delta;
        debug.coastal[r] = delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elevation::distance::UNREACHED;

    /// Synthetic hemisphere split: land where y >= 0.
    fn split_elevation(mesh: &Mesh) -> Vec<f32> {
        mesh.positions
            .iter()
            .map(|p| if p.y >= 0.0 { 0.2 } else { -0.2 })
            .collect()
    }

    #[test]
    fn roughening_only_touches_the_coastal_band() {
        let mesh = Mesh::fibonacci(1500, 0.5, 42).unwrap();
        let noise = NoiseField::new(42);
        let mut elevation = split_elevation(&mesh);
        let before = elevation.clone();
        let stress = vec![0.0f32; mesh.num_regions];
        let trench = vec![UNREACHED; mesh.num_regions];
        let mut debug = DebugLayers::zeroed(mesh.num_regions);
        roughen_coasts(&mesh, &noise, &stress, &trench, &mut elevation, &mut debug);

        // Poles are far from the equatorial coast; they must be untouched.
        for r in 0..mesh.num_regions {
            if mesh.positions[r].y.abs() > 0.8 {
                assert_eq!(elevation[r], before[r], "far cell {r} was modified");
            }
        }
        // Something near the coast must have moved.
        assert!(
            elevation.iter().zip(&before).any(|(a, b)| a != b),
            "coastal band should be roughened"
        );
    }

    #[test]
    fn deep_water_gets_no_islands() {
        let mesh = Mesh::fibonacci(1000, 0.5, 9).unwrap();
        let noise = NoiseField::new(9);
        // Uniform deep ocean with one land cap: shallow threshold never met
        // outside the profile, so no cell should jump above sea level far
        // from the cap.
        let mut elevation: Vec<f32> = mesh
            .positions
            .iter()
            .map(|p| if p.y > 0.95 { 0.2 } else { -0.4 })
            .collect();
        let stress = vec![0.0f32; mesh.num_regions];
        let trench = vec![UNREACHED; mesh.num_regions];
        let mut debug = DebugLayers::zeroed(mesh.num_regions);
        roughen_coasts(&mesh, &noise, &stress, &trench, &mut elevation, &mut debug);
        for r in 0..mesh.num_regions {
            if mesh.positions[r].y < 0.0 {
                assert!(elevation[r] < 0.0, "deep southern cell {r} surfaced");
            }
        }
    }
}

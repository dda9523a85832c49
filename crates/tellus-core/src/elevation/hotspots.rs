//! Mantle-plume hotspot chains.
//!
//! Each plume drops a chain of volcanic domes: the dome center walks
//! opposite the owning plate's drift (the plate slides over a stationary
//! plume), with a little wobble off-axis. Dome uplift is a Gaussian in the
//! cosine-of-angle domain, shape-warped by a per-cell multiplier so domes
//! read as shields rather than perfect bumps.

use crate::elevation::DebugLayers;
use crate::mesh::Mesh;
use crate::noise_field::NoiseField;
use crate::plates::PlateSimulation;
use crate::sphere::{rotate_about_axis, Vec3};
use rand::rngs::StdRng;
use rand::Rng;

const NUM_PLUMES: usize = 5;
/// Great-circle step between successive domes, radians.
const CHAIN_STEP_RAD: f64 = 0.06;
/// Maximum off-axis wobble per step, radians.
const WOBBLE_RAD: f64 = 0.4;
/// Strength falloff along the chain (older domes are more eroded).
const CHAIN_DECAY: f32 = 0.85;

struct Dome {
    center: Vec3,
    strength: f32,
    /// Angular sigma in radians.
    sigma: f64,
}

pub fn apply_hotspots(
    mesh: &Mesh,
    plates: &PlateSimulation,
    noise: &NoiseField,
    elevation: &mut [f32],
    rng: &mut StdRng,
    debug: &mut DebugLayers,
) {
    let n = mesh.num_regions;
    let edge = mesh.avg_edge_rad();
    let mut domes: Vec<Dome> = Vec::new();

    for _ in 0..NUM_PLUMES {
        let origin = rng.gen_range(0..n);
        let plate = plates.plate_of[origin] as usize;
        let ocean = plates.is_ocean[plate];
        // Ocean lithosphere is thin; plume heads push through harder.
        let base = if ocean { 0.09 } else { 0.05 };
        let drift = plates.drift[plate];

        let mut center = mesh.positions[origin];
        let num_domes = rng.gen_range(4..=8);
        let mut strength = base * (0.6 + 0.4 * rng.gen::<f32>());
        for _ in 0..num_domes {
            let sigma = edge * (1.5 + rng.gen::<f64>());
            domes.push(Dome { center, strength, sigma });
            strength *= CHAIN_DECAY;

            // Step opposite the drift, wobbled off-axis.
            let axis_raw = center.cross(drift);
            if axis_raw.length() < 1e-9 {
                break; // drift is radial here; the chain cannot continue
            }
            let wobble = (rng.gen::<f64>() * 2.0 - 1.0) * WOBBLE_RAD;
            let axis = rotate_about_axis(axis_raw.normalize(), center, wobble);
            center = rotate_about_axis(center, axis, -CHAIN_STEP_RAD);
        }
    }

    for r in 0..n {
        let pos = mesh.positions[r];
        let mut uplift = 0.0f32;
        for dome in &domes {
            let five_sigma_cos = (5.0 * dome.sigma).min(std::f64::consts::PI).cos();
            let dotv = pos.dot(dome.center);
            if dotv <= five_sigma_cos {
                continue;
            }
            // exp(-θ²/2σ²) with θ² ≈ 2(1 - cosθ).
            uplift += dome.strength * ((-(1.0 - dotv) / (dome.sigma * dome.sigma)).exp()) as f32;
        }
        if uplift > 0.0 {
            let shape = (0.75 + 0.5 * noise.fbm(pos, 4.0, 3)).max(0.0);
            let contrib = uplift * shape;
            elevation[r] += contrib;
            debug.hotspots[r] = contrib;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plates::simulate_plates;
    use rand::SeedableRng;

    #[test]
    fn hotspots_form_chains_along_drift() {
        let mesh = Mesh::fibonacci(4000, 0.5, 42).unwrap();
        let plates = simulate_plates(&mesh, 42, 12, 4).unwrap();
        let noise = NoiseField::new(42);
        let mut elevation = vec![0.0f32; mesh.num_regions];
        let mut debug = DebugLayers::zeroed(mesh.num_regions);
        let mut rng = StdRng::seed_from_u64(42);
        apply_hotspots(&mesh, &plates, &noise, &mut elevation, &mut rng, &mut debug);

        // At least one chain should leave a trail of 3+ clearly uplifted
        // cells spanning more than a single dome radius.
        let raised: Vec<usize> = (0..mesh.num_regions).filter(|&r| elevation[r] > 0.01).collect();
        assert!(raised.len() >= 3, "expected a visible chain, got {} raised cells", raised.len());
        let mut max_span = 0.0f64;
        for &a in &raised {
            for &b in &raised {
                let d = 1.0 - mesh.positions[a].dot(mesh.positions[b]);
                if d > max_span {
                    max_span = d;
                }
            }
        }
        let edge_cos = mesh.avg_edge_rad();
        assert!(
            max_span > edge_cos * edge_cos,
            "uplift should span beyond one dome: span {max_span:.5}"
        );
    }

    #[test]
    fn hotspot_uplift_is_additive_only() {
        let mesh = Mesh::fibonacci(1000, 0.5, 5).unwrap();
        let plates = simulate_plates(&mesh, 5, 8, 3).unwrap();
        let noise = NoiseField::new(5);
        let mut elevation = vec![-0.1f32; mesh.num_regions];
        let mut debug = DebugLayers::zeroed(mesh.num_regions);
        let mut rng = StdRng::seed_from_u64(5);
        apply_hotspots(&mesh, &plates, &noise, &mut elevation, &mut rng, &mut debug);
        for (r, &e) in elevation.iter().enumerate() {
            assert!(e >= -0.1 - 1e-6, "hotspot lowered cell {r} to {e}");
        }
    }
}

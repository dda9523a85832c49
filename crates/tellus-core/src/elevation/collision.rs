//! Collision detection along plate boundaries (elevation step one) and the
//! frontier BFS that spreads boundary stress into plate interiors.
//!
//! Compression is measured by displacing both cells of a boundary pair along
//! their plates' drift vectors for a small `dt` and comparing distances.
//! The subduction factor encodes which side of a convergent pair dives under:
//! < 0.5 overriding, > 0.5 subducting.

use crate::mesh::Mesh;
use crate::noise_field::NoiseField;
use crate::plates::PlateSimulation;

/// Boundary classification per region.
pub const BOUNDARY_NONE: u8 = 0;
pub const BOUNDARY_CONVERGENT: u8 = 1;
pub const BOUNDARY_DIVERGENT: u8 = 2;
pub const BOUNDARY_TRANSFORM: u8 = 3;

/// Stress values below this stop propagating.
const STRESS_FLOOR: f32 = 0.005;

/// Width control for stress propagation, in mean mountain-belt cells.
const STRESS_SPREAD: f32 = 5.0;

pub struct CollisionField {
    pub stress: Vec<f32>,
    pub boundary_type: Vec<u8>,
    pub subduct_factor: Vec<f32>,
    pub mountain: Vec<bool>,
    pub coastline: Vec<bool>,
    pub ocean_floor: Vec<bool>,
}

/// Displacement step: shrinks with mesh density so compression thresholds
/// stay comparable across sizes.
pub fn collision_dt(num_regions: usize) -> f64 {
    0.01 / (num_regions as f64 / 10_000.0).sqrt().max(1.0)
}

pub fn detect_collisions(
    mesh: &Mesh,
    plates: &PlateSimulation,
    noise: &NoiseField,
    seed: u64,
) -> CollisionField {
    let n = mesh.num_regions;
    let dt = collision_dt(n);

    let mut field = CollisionField {
        stress: vec![0.0; n],
        boundary_type: vec![BOUNDARY_NONE; n],
        subduct_factor: vec![0.5; n],
        mountain: vec![false; n],
        coastline: vec![false; n],
        ocean_floor: vec![false; n],
    };

    for r in 0..n {
        let p = plates.plate_of[r] as usize;
        let pos = mesh.positions[r];

        // Neighbor on a different plate that maximizes compression.
        let mut best: Option<(f64, usize)> = None;
        for &nb in mesh.neighbors(r) {
            let q = plates.plate_of[nb as usize] as usize;
            if q == p {
                continue;
            }
            let nb_pos = mesh.positions[nb as usize];
            let d_before = nb_pos.sub(pos).length();
            let d_after = nb_pos
                .add(plates.drift[q].scale(dt))
                .sub(pos.add(plates.drift[p].scale(dt)))
                .length();
            let compression = d_before - d_after;
            if best.map_or(true, |(c, _)| compression > c) {
                best = Some((compression, nb as usize));
            }
        }
        let Some((compression, nb)) = best else {
            continue; // plate interior
        };
        let q = plates.plate_of[nb] as usize;
        let collided = compression > 0.75 * dt;

        if collided {
            let intensity = pair_intensity(plates.seeds[p], plates.seeds[q], seed);
            field.stress[r] = (compression / dt) as f32 * intensity;
        }

        // Normal component of the relative velocity across the boundary.
        let normal = mesh.positions[nb].sub(pos).normalize();
        let rel = plates.drift[p].sub(plates.drift[q]);
        let normal_comp = rel.dot(normal);
        field.boundary_type[r] = if normal_comp > 0.3 * dt {
            BOUNDARY_CONVERGENT
        } else if normal_comp < -0.3 * dt {
            BOUNDARY_DIVERGENT
        } else {
            BOUNDARY_TRANSFORM
        };

        // Density contrast decides the subducting side; noise breaks near-ties.
        let drho = plates.density[p] - plates.density[q];
        let sf = 0.5
            + 0.5 * (8.0 * drho).tanh()
            + noise.sample(pos, 4.0) * 0.4 * (-12.0 * drho.abs()).exp();
        field.subduct_factor[r] = sf.clamp(0.0, 1.0);

        // Boundary feature classification.
        let my_ocean = plates.is_ocean[p];
        let nb_ocean = plates.is_ocean[q];
        match (my_ocean, nb_ocean) {
            (false, false) if collided => field.mountain[r] = true,
            (true, true) if collided => field.ocean_floor[r] = true,
            (a, b) if a != b => {
                field.coastline[r] = true;
                // Overriding land above a subducting ocean slab builds
                // Andean-style mountains right at the margin.
                if !my_ocean && collided && field.subduct_factor[r] < 0.5 {
                    field.mountain[r] = true;
                }
            }
            _ => {}
        }
    }
    field
}

/// Deterministic 0.5-1.5 weight per colliding plate pair.
fn pair_intensity(seed_a: u32, seed_b: u32, seed: u64) -> f32 {
    let (lo, hi) = if seed_a < seed_b { (seed_a, seed_b) } else { (seed_b, seed_a) };
    let mut h = seed ^ ((lo as u64) << 32 | hi as u64);
    h = h.wrapping_add(0x9E37_79B9_7F4A_7C15);
    h = (h ^ (h >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h = (h ^ (h >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    h ^= h >> 31;
    0.5 + (h >> 40) as f32 / (1u64 << 24) as f32
}

/// Spread stress from boundary cells into plate interiors. Same-plate only,
/// decaying per hop; subducting cells damp the wave so belts pile up on the
/// overriding side.
pub fn propagate_stress(
    mesh: &Mesh,
    plate_of: &[u32],
    subduct_factor: &[f32],
    stress: &mut [f32],
) {
    let n = mesh.num_regions;
    let scale = (n as f64 / 10_000.0).sqrt();
    let passes = ((3.0 * STRESS_SPREAD as f64 * scale).round() as usize).max(1);
    let decay = (0.5 + 0.04 * STRESS_SPREAD) as f64;
    let decay = decay.powf(1.0 / scale.max(1e-6)) as f32;

    let mut frontier: Vec<u32> = (0..n as u32).filter(|&r| stress[r as usize] > 0.0).collect();
    let mut next: Vec<u32> = Vec::new();

    for _ in 0..passes {
        if frontier.is_empty() {
            break;
        }
        next.clear();
        for &r in &frontier {
            let r = r as usize;
            for &nb in mesh.neighbors(r) {
                let nb = nb as usize;
                if plate_of[nb] != plate_of[r] {
                    continue;
                }
                let mut step = decay;
                if subduct_factor[nb] > 0.5 {
                    step *= 0.45;
                }
                let candidate = stress[r] * step;
                if candidate > stress[nb] && candidate > STRESS_FLOOR {
                    stress[nb] = candidate;
                    next.push(nb as u32);
                }
            }
        }
        std::mem::swap(&mut frontier, &mut next);
    }
}

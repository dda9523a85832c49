//! Plate seeding: farthest-point sampling on the unit sphere plus the
//! per-plate growth parameters that bias expansion.

use crate::mesh::Mesh;
use crate::sphere::Vec3;
use rand::rngs::StdRng;
use rand::Rng;

/// How a single plate expands from its seed.
#[derive(Debug, Clone, Copy)]
pub struct GrowthParams {
    /// Cells claimed per round, in [0.7, 3.0], biased low.
    pub rate: f32,
    /// Preferred growth direction in the seed's tangent plane.
    pub dir: Vec3,
    /// How strongly growth follows `dir`, in [0.15, 0.4/rate].
    pub dir_strength: f32,
}

/// Pick `count` seed regions by farthest-point sampling.
///
/// The first seed is uniform; each subsequent seed is drawn uniformly from
/// the top-3 regions by minimum cosine distance (`1 - dot`) to all existing
/// seeds, which keeps layouts varied without clustering.
pub fn farthest_point_seeds(mesh: &Mesh, count: usize, rng: &mut StdRng) -> Vec<u32> {
    let n = mesh.num_regions;
    let count = count.min(n);
    let mut seeds = Vec::with_capacity(count);
    let mut min_dist = vec![f32::INFINITY; n];

    let first = rng.gen_range(0..n) as u32;
    seeds.push(first);
    update_min_dist(mesh, &mut min_dist, first);

    while seeds.len() < count {
        let pick = pick_among_top3(&min_dist, rng);
        seeds.push(pick);
        update_min_dist(mesh, &mut min_dist, pick);
    }
    seeds
}

fn update_min_dist(mesh: &Mesh, min_dist: &mut [f32], seed: u32) {
    let sp = mesh.positions[seed as usize];
    for (r, d) in min_dist.iter_mut().enumerate() {
        let cos_dist = (1.0 - mesh.positions[r].dot(sp)) as f32;
        if cos_dist < *d {
            *d = cos_dist;
        }
    }
}

/// Uniform choice among the three regions with the largest minimum distance.
fn pick_among_top3(min_dist: &[f32], rng: &mut StdRng) -> u32 {
    let mut top: [(f32, u32); 3] = [(f32::NEG_INFINITY, 0); 3];
    for (r, &d) in min_dist.iter().enumerate() {
        if d > top[2].0 {
            top[2] = (d, r as u32);
            if top[2].0 > top[1].0 {
                top.swap(1, 2);
            }
            if top[1].0 > top[0].0 {
                top.swap(0, 1);
            }
        }
    }
    let valid = top.iter().filter(|t| t.0 > f32::NEG_INFINITY).count().max(1);
    top[rng.gen_range(0..valid)].1
}

/// Sample growth parameters for one plate seeded at `seed_region`.
pub fn sample_growth_params(mesh: &Mesh, seed_region: u32, rng: &mut StdRng) -> GrowthParams {
    // Squared uniform biases rates toward slow growers; a few fast plates
    // dominate, which is what real plate size distributions look like.
    let u: f32 = rng.gen();
    let rate = 0.7 + 2.3 * u * u;

    let dir = random_tangent(mesh.positions[seed_region as usize], rng);

    let hi = 0.4 / rate;
    let dir_strength = if hi > 0.15 {
        0.15 + rng.gen::<f32>() * (hi - 0.15)
    } else {
        hi
    };

    GrowthParams { rate, dir, dir_strength }
}

/// Random unit vector in the tangent plane at `p`.
pub fn random_tangent(p: Vec3, rng: &mut StdRng) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen::<f64>() * 2.0 - 1.0,
            rng.gen::<f64>() * 2.0 - 1.0,
            rng.gen::<f64>() * 2.0 - 1.0,
        );
        if let Some(t) = v.tangent_from(p) {
            return t;
        }
    }
}

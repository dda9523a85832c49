//! Round-robin plate growth over the region graph, followed by the cleanup
//! passes that make plate territories contiguous and smooth: orphan sweep,
//! majority-vote boundary smoothing, and seed-reachability reconnect.

use crate::error::GenError;
use crate::mesh::Mesh;
use crate::plates::seeds::GrowthParams;
use crate::sphere::Vec3;
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::VecDeque;

pub const UNCLAIMED: u32 = u32::MAX;

/// Grow all plates to full coverage. Returns the dense plate index per
/// region (position in `seeds`).
pub fn grow_plates(
    mesh: &Mesh,
    seeds: &[u32],
    params: &[GrowthParams],
    rng: &mut StdRng,
) -> Result<Vec<u32>, GenError> {
    let n = mesh.num_regions;
    let num_plates = seeds.len();
    let expected_share = n as f32 / num_plates as f32;

    let mut plate_of = vec![UNCLAIMED; n];
    let mut area = vec![1u32; num_plates];
    let mut frontier: Vec<Vec<u32>> = Vec::with_capacity(num_plates);
    for (pi, &s) in seeds.iter().enumerate() {
        plate_of[s as usize] = pi as u32;
        frontier.push(vec![s]);
    }

    // Round-robin passes: each plate takes a rate-scaled number of steps,
    // each step claiming around its best-scoring sampled frontier cell.
    loop {
        let mut progressed = false;
        for pi in 0..num_plates {
            let p = &params[pi];
            let mut steps = (p.rate * (0.5 + rng.gen::<f32>())).ceil() as usize;
            if area[pi] as f32 > 2.0 * expected_share {
                steps = (steps / 2).max(1);
            }
            for _ in 0..steps {
                if frontier[pi].is_empty() {
                    break;
                }
                let fi = best_frontier_cell(mesh, &frontier[pi], seeds[pi], p, area[pi], n, rng);
                let cell = frontier[pi].swap_remove(fi);
                for &nb in mesh.neighbors(cell as usize) {
                    if plate_of[nb as usize] == UNCLAIMED {
                        plate_of[nb as usize] = pi as u32;
                        area[pi] += 1;
                        frontier[pi].push(nb);
                        progressed = true;
                    }
                }
            }
        }
        if !progressed {
            break;
        }
    }

    orphan_sweep(mesh, &mut plate_of)?;
    smooth_boundaries(mesh, seeds, &mut plate_of);
    reconnect(mesh, seeds, &mut plate_of)?;
    Ok(plate_of)
}

/// Sample up to `3 + floor(dir_strength * 5)` random frontier cells and
/// return the index of the best-scoring one.
fn best_frontier_cell(
    mesh: &Mesh,
    frontier: &[u32],
    seed: u32,
    p: &GrowthParams,
    area: u32,
    num_regions: usize,
    rng: &mut StdRng,
) -> usize {
    let samples = (3 + (p.dir_strength * 5.0) as usize).min(frontier.len());
    let seed_pos = mesh.positions[seed as usize];
    let expected_chord = 2.0 * (area as f64 / num_regions as f64).sqrt();

    let mut best_idx = 0usize;
    let mut best_score = f32::NEG_INFINITY;
    for _ in 0..samples {
        let fi = rng.gen_range(0..frontier.len());
        let pos = mesh.positions[frontier[fi] as usize];
        let u: f32 = rng.gen();
        let score = p.dir_strength * cos_from_growth_dir(seed_pos, p.dir, pos)
            + u * (1.0 - p.dir_strength / 2.0)
            - compact_penalty(seed_pos, pos, expected_chord);
        if score > best_score {
            best_score = score;
            best_idx = fi;
        }
    }
    best_idx
}

/// Cosine of the angle between the seed->cell direction (projected into the
/// seed's tangent plane) and the plate's preferred growth direction.
fn cos_from_growth_dir(seed_pos: Vec3, dir: Vec3, cell_pos: Vec3) -> f32 {
    match cell_pos.sub(seed_pos).tangent_from(seed_pos) {
        Some(t) => t.dot(dir) as f32,
        None => 1.0, // the seed cell itself
    }
}

/// Quadratic penalty once a cell sits beyond 1.8x the expected chord radius
/// for the plate's current area. Keeps fast plates roughly round.
fn compact_penalty(seed_pos: Vec3, cell_pos: Vec3, expected_chord: f64) -> f32 {
    let chord = cell_pos.sub(seed_pos).length();
    let excess = chord - 1.8 * expected_chord;
    if excess <= 0.0 {
        0.0
    } else {
        let rel = excess / expected_chord.max(1e-6);
        (rel * rel) as f32
    }
}

/// Any unclaimed region adopts the plate of its first claimed neighbor,
/// repeated until stable. Fails if unclaimed regions remain (disconnected
/// mesh), which later stages cannot tolerate.
fn orphan_sweep(mesh: &Mesh, plate_of: &mut [u32]) -> Result<(), GenError> {
    loop {
        let mut changed = false;
        for r in 0..mesh.num_regions {
            if plate_of[r] != UNCLAIMED {
                continue;
            }
            for &nb in mesh.neighbors(r) {
                if plate_of[nb as usize] != UNCLAIMED {
                    plate_of[r] = plate_of[nb as usize];
                    changed = true;
                    break;
                }
            }
        }
        if !changed {
            break;
        }
    }
    if let Some(r) = plate_of.iter().position(|&p| p == UNCLAIMED) {
        return Err(GenError::invariant(format!("region {r} unclaimed after orphan sweep")));
    }
    Ok(())
}

/// Three passes of majority-vote relabeling against a snapshot. The first
/// pass uses a 0.4-of-degree threshold to knock out single-cell fingers,
/// later passes require a strict majority. Seed cells are never reassigned.
fn smooth_boundaries(mesh: &Mesh, seeds: &[u32], plate_of: &mut [u32]) {
    let mut is_seed = vec![false; mesh.num_regions];
    for &s in seeds {
        is_seed[s as usize] = true;
    }
    let mut counts: Vec<(u32, u32)> = Vec::with_capacity(12);

    for pass in 0..3 {
        let threshold = if pass == 0 { 0.4 } else { 0.5 };
        let snapshot = plate_of.to_vec();
        for r in 0..mesh.num_regions {
            if is_seed[r] {
                continue;
            }
            counts.clear();
            let nbs = mesh.neighbors(r);
            for &nb in nbs {
                let p = snapshot[nb as usize];
                match counts.iter_mut().find(|(q, _)| *q == p) {
                    Some((_, c)) => *c += 1,
                    None => counts.push((p, 1)),
                }
            }
            // Lowest plate index wins ties for determinism.
            let Some(&(winner, votes)) = counts
                .iter()
                .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
            else {
                continue;
            };
            if winner != snapshot[r] && votes as f32 > threshold * nbs.len() as f32 {
                plate_of[r] = winner;
            }
        }
    }
}

/// BFS from each seed through same-plate cells; cells smoothing severed from
/// their seed are relabeled to a reached neighbor's plate.
fn reconnect(mesh: &Mesh, seeds: &[u32], plate_of: &mut [u32]) -> Result<(), GenError> {
    let n = mesh.num_regions;
    let mut reached = vec![false; n];
    let mut queue = VecDeque::new();
    for &s in seeds {
        reached[s as usize] = true;
        queue.push_back(s as usize);
    }
    while let Some(r) = queue.pop_front() {
        for &nb in mesh.neighbors(r) {
            let nb = nb as usize;
            if !reached[nb] && plate_of[nb] == plate_of[r] {
                reached[nb] = true;
                queue.push_back(nb);
            }
        }
    }

    // Severed fragments adopt outward from the reached set.
    loop {
        let mut changed = false;
        for r in 0..n {
            if reached[r] {
                continue;
            }
            for &nb in mesh.neighbors(r) {
                if reached[nb as usize] {
                    plate_of[r] = plate_of[nb as usize];
                    reached[r] = true;
                    changed = true;
                    break;
                }
            }
        }
        if !changed {
            break;
        }
    }
    if let Some(r) = reached.iter().position(|&x| !x) {
        return Err(GenError::invariant(format!("region {r} unreachable during reconnect")));
    }
    Ok(())
}

/// Per-plate drift: the unit direction from each seed toward one of its
/// randomly chosen neighbors.
pub fn drift_vectors(mesh: &Mesh, seeds: &[u32], rng: &mut StdRng) -> Vec<Vec3> {
    seeds
        .iter()
        .map(|&s| {
            let nbs = mesh.neighbors(s as usize);
            let nb = nbs[rng.gen_range(0..nbs.len())];
            mesh.positions[nb as usize]
                .sub(mesh.positions[s as usize])
                .normalize()
        })
        .collect()
}

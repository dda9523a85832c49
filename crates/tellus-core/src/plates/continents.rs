//! Ocean/land plate assignment: pick continent seed plates by farthest-point
//! sampling on plate centroids, grow continents over the plate-adjacency
//! graph toward a 30% land-area target, then absorb trapped seas.

use crate::error::GenError;
use crate::mesh::Mesh;
use crate::sphere::Vec3;
use rand::rngs::StdRng;
use rand::Rng;

/// Fraction of all regions that should end up on land plates.
pub const LAND_TARGET_FRACTION: f32 = 0.3;

/// Per-plate geometric features used by continent scoring.
pub struct PlateFeatures {
    pub area: Vec<u32>,
    pub centroid: Vec<Vec3>,
    pub perimeter: Vec<u32>,
    /// `sqrt(area) / perimeter`, normalized by the global maximum.
    pub compactness: Vec<f32>,
    /// Adjacent plates (dense indices), sorted.
    pub adjacency: Vec<Vec<u32>>,
}

/// Output of the ocean/land assignment.
pub struct OceanAssignment {
    /// Per plate (dense index): true when the plate carries ocean crust.
    pub is_ocean: Vec<bool>,
    /// Per plate: crust density sample. Ocean 3.0-3.5, land 2.4-2.9.
    pub density: Vec<f32>,
    /// Per plate: owning continent, if any.
    pub continent_of: Vec<Option<u16>>,
}

pub fn compute_plate_features(mesh: &Mesh, num_plates: usize, plate_of: &[u32]) -> PlateFeatures {
    let mut area = vec![0u32; num_plates];
    let mut centroid_sum = vec![Vec3::zero(); num_plates];
    let mut perimeter = vec![0u32; num_plates];
    let mut adjacency: Vec<Vec<u32>> = vec![Vec::new(); num_plates];

    for r in 0..mesh.num_regions {
        let p = plate_of[r] as usize;
        area[p] += 1;
        centroid_sum[p] = centroid_sum[p].add(mesh.positions[r]);
        let mut on_boundary = false;
        for &nb in mesh.neighbors(r) {
            let q = plate_of[nb as usize];
            if q as usize != p {
                on_boundary = true;
                if !adjacency[p].contains(&q) {
                    adjacency[p].push(q);
                }
            }
        }
        if on_boundary {
            perimeter[p] += 1;
        }
    }
    for adj in &mut adjacency {
        adj.sort_unstable();
    }

    let centroid: Vec<Vec3> = centroid_sum.iter().map(|c| c.normalize()).collect();
    let raw: Vec<f32> = (0..num_plates)
        .map(|p| (area[p] as f32).sqrt() / perimeter[p].max(1) as f32)
        .collect();
    let max = raw.iter().cloned().fold(f32::MIN, f32::max).max(1e-9);
    let compactness = raw.iter().map(|&c| c / max).collect();

    PlateFeatures { area, centroid, perimeter, compactness, adjacency }
}

/// Assign every plate to a continent or to the ocean.
pub fn assign_oceans(
    mesh: &Mesh,
    plate_of: &[u32],
    num_plates: usize,
    num_continents: usize,
    rng: &mut StdRng,
) -> Result<OceanAssignment, GenError> {
    if num_continents == 0 || num_continents > num_plates {
        return Err(GenError::invalid(format!(
            "continent count {num_continents} outside [1, {num_plates}]"
        )));
    }
    let n = mesh.num_regions;
    let features = compute_plate_features(mesh, num_plates, plate_of);
    let target = LAND_TARGET_FRACTION * n as f32;

    // ── Continent seed plates ───────────────────────────────────────────────
    let mut seeds = continent_seed_plates(&features, num_plates, num_continents, n, rng);

    // Drop the largest seeds while the combined seed area busts the budget.
    seeds.sort_by_key(|&p| features.area[p as usize]);
    let mut seed_area: u32 = seeds.iter().map(|&p| features.area[p as usize]).sum();
    while seeds.len() > 1 && seed_area as f32 > target {
        if let Some(dropped) = seeds.pop() {
            seed_area -= features.area[dropped as usize];
        }
    }

    let mut continent_of: Vec<Option<u16>> = vec![None; num_plates];
    for (c, &p) in seeds.iter().enumerate() {
        continent_of[p as usize] = Some(c as u16);
    }
    let mut land_area = seed_area as f32;

    // ── Area-targeted growth ────────────────────────────────────────────────
    let growth_target = 0.9 * target;
    'grow: loop {
        let mut progressed = false;
        for c in 0..seeds.len() as u16 {
            if land_area >= growth_target {
                break 'grow;
            }
            let Some(pick) = pick_growth_plate(&features, &continent_of, c, rng) else {
                continue;
            };
            continent_of[pick as usize] = Some(c);
            land_area += features.area[pick as usize] as f32;
            progressed = true;
        }
        if !progressed {
            break;
        }
    }

    // ── Trapped-sea absorption ──────────────────────────────────────────────
    absorb_trapped_seas(&features, &mut continent_of, &mut land_area, target);

    log::debug!(
        "continents: {} seeds, land area {:.0} cells ({:.1}% of {n})",
        seeds.len(),
        land_area,
        100.0 * land_area / n as f32
    );

    // ── Densities ───────────────────────────────────────────────────────────
    let is_ocean: Vec<bool> = continent_of.iter().map(|c| c.is_none()).collect();
    let density: Vec<f32> = is_ocean
        .iter()
        .map(|&ocean| {
            if ocean {
                3.0 + 0.5 * rng.gen::<f32>()
            } else {
                2.4 + 0.5 * rng.gen::<f32>()
            }
        })
        .collect();

    Ok(OceanAssignment { is_ocean, density, continent_of })
}

/// Farthest-point sampling over plate centroids, scored by separation,
/// mid-size preference, and compactness.
fn continent_seed_plates(
    features: &PlateFeatures,
    num_plates: usize,
    num_continents: usize,
    num_regions: usize,
    rng: &mut StdRng,
) -> Vec<u32> {
    let mut seeds: Vec<u32> = Vec::with_capacity(num_continents);
    let first = rng.gen_range(0..num_plates) as u32;
    seeds.push(first);

    let mut min_dist: Vec<f32> = (0..num_plates)
        .map(|p| (1.0 - features.centroid[p].dot(features.centroid[first as usize])) as f32)
        .collect();

    // Favors mid-sized plates: very large plates would blow the land budget,
    // slivers make unconvincing continents.
    let area_factor = |p: usize| -> f32 {
        (num_regions as f32 / num_plates as f32).sqrt() / (features.area[p] as f32).sqrt().max(1.0)
    };

    while seeds.len() < num_continents {
        let mut top: [(f32, u32); 3] = [(f32::NEG_INFINITY, 0); 3];
        for p in 0..num_plates {
            if seeds.contains(&(p as u32)) {
                continue;
            }
            let score = min_dist[p] * min_dist[p] * area_factor(p) * features.compactness[p];
            if score > top[2].0 {
                top[2] = (score, p as u32);
                if top[2].0 > top[1].0 {
                    top.swap(1, 2);
                }
                if top[1].0 > top[0].0 {
                    top.swap(0, 1);
                }
            }
        }
        let valid = top.iter().filter(|t| t.0 > f32::NEG_INFINITY).count();
        if valid == 0 {
            break;
        }
        let pick = top[rng.gen_range(0..valid)].1;
        seeds.push(pick);
        for p in 0..num_plates {
            let d = (1.0 - features.centroid[p].dot(features.centroid[pick as usize])) as f32;
            if d < min_dist[p] {
                min_dist[p] = d;
            }
        }
    }
    seeds
}

/// Candidate plates for continent `c`: unassigned, touching `c`, and not
/// touching any other continent. Scored by touch count, compactness, and a
/// little randomness; uniform pick among the top 3.
fn pick_growth_plate(
    features: &PlateFeatures,
    continent_of: &[Option<u16>],
    c: u16,
    rng: &mut StdRng,
) -> Option<u32> {
    let mut top: [(f32, u32); 3] = [(f32::NEG_INFINITY, 0); 3];
    for p in 0..continent_of.len() {
        if continent_of[p].is_some() {
            continue;
        }
        let mut same_touch = 0u32;
        let mut other_touch = false;
        for &q in &features.adjacency[p] {
            match continent_of[q as usize] {
                Some(cc) if cc == c => same_touch += 1,
                Some(_) => {
                    other_touch = true;
                    break;
                }
                None => {}
            }
        }
        if other_touch || same_touch == 0 {
            continue;
        }
        let score = same_touch as f32 + 3.0 * features.compactness[p] + 0.5 * rng.gen::<f32>();
        if score > top[2].0 {
            top[2] = (score, p as u32);
            if top[2].0 > top[1].0 {
                top.swap(1, 2);
            }
            if top[1].0 > top[0].0 {
                top.swap(0, 1);
            }
        }
    }
    let valid = top.iter().filter(|t| t.0 > f32::NEG_INFINITY).count();
    if valid == 0 {
        None
    } else {
        Some(top[rng.gen_range(0..valid)].1)
    }
}

/// Connected components of unassigned plates. The largest stays open ocean;
/// any other component bordering exactly one continent is absorbed into it
/// while the land budget allows.
fn absorb_trapped_seas(
    features: &PlateFeatures,
    continent_of: &mut [Option<u16>],
    land_area: &mut f32,
    target: f32,
) {
    let num_plates = continent_of.len();
    let mut component = vec![usize::MAX; num_plates];
    let mut comp_area: Vec<u32> = Vec::new();

    for p in 0..num_plates {
        if continent_of[p].is_some() || component[p] != usize::MAX {
            continue;
        }
        let id = comp_area.len();
        let mut stack = vec![p];
        component[p] = id;
        let mut total = 0u32;
        while let Some(q) = stack.pop() {
            total += features.area[q];
            for &nb in &features.adjacency[q] {
                let nb = nb as usize;
                if continent_of[nb].is_none() && component[nb] == usize::MAX {
                    component[nb] = id;
                    stack.push(nb);
                }
            }
        }
        comp_area.push(total);
    }
    let Some(open_ocean) = (0..comp_area.len()).max_by_key(|&c| comp_area[c]) else {
        return;
    };

    for comp in 0..comp_area.len() {
        if comp == open_ocean {
            continue;
        }
        // Continents bordering this trapped component.
        let mut border: Option<u16> = None;
        let mut unique = true;
        for p in 0..num_plates {
            if component[p] != comp {
                continue;
            }
            for &q in &features.adjacency[p] {
                if let Some(c) = continent_of[q as usize] {
                    match border {
                        None => border = Some(c),
                        Some(b) if b != c => unique = false,
                        _ => {}
                    }
                }
            }
        }
        if let (Some(c), true) = (border, unique) {
            if *land_area + comp_area[comp] as f32 <= 1.1 * target {
                log::debug!("absorbing trapped sea of {} cells into continent {c}", comp_area[comp]);
                for p in 0..num_plates {
                    if component[p] == comp {
                        continent_of[p] = Some(c);
                    }
                }
                *land_area += comp_area[comp] as f32;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plates::simulate_plates;

    fn land_fraction(mesh: &Mesh, plate_of: &[u32], is_ocean: &[bool]) -> f32 {
        let land = (0..mesh.num_regions)
            .filter(|&r| !is_ocean[plate_of[r] as usize])
            .count();
        land as f32 / mesh.num_regions as f32
    }

    #[test]
    fn land_budget_near_30_percent() {
        let mesh = Mesh::fibonacci(3000, 0.5, 42).unwrap();
        let sim = simulate_plates(&mesh, 42, 24, 5).unwrap();
        let frac = land_fraction(&mesh, &sim.plate_of, &sim.is_ocean);
        assert!(
            (0.2..=0.45).contains(&frac),
            "land fraction {frac:.3} outside [0.2, 0.45]"
        );
    }

    #[test]
    fn single_continent_request_yields_one_continent() {
        let mesh = Mesh::fibonacci(2000, 0.5, 7).unwrap();
        let sim = simulate_plates(&mesh, 7, 16, 1).unwrap();
        let mut ids: Vec<u16> = sim.continent_of.iter().flatten().cloned().collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 1, "expected exactly one continent, got {ids:?}");
    }

    #[test]
    fn density_bands_follow_crust_type() {
        let mesh = Mesh::fibonacci(2000, 0.5, 99).unwrap();
        let sim = simulate_plates(&mesh, 99, 16, 4).unwrap();
        for p in 0..sim.seeds.len() {
            let d = sim.density[p];
            if sim.is_ocean[p] {
                assert!((3.0..=3.5).contains(&d), "ocean plate {p} density {d}");
            } else {
                assert!((2.4..=2.9).contains(&d), "land plate {p} density {d}");
            }
        }
    }

    #[test]
    fn some_ocean_always_remains() {
        let mesh = Mesh::fibonacci(2500, 0.5, 3).unwrap();
        let sim = simulate_plates(&mesh, 3, 20, 6).unwrap();
        assert!(
            sim.is_ocean.iter().any(|&o| o),
            "at least one ocean plate must remain"
        );
    }
}

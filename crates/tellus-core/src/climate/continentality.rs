//! Continentality: smoothed, normalized distance from the nearest coast of
//! the main ocean body. Two variants share the algorithm: one over the
//! actual (elevation-derived) ocean mask, one over plate crust classes. The
//! plate variant is stabler under coastal roughening and fences deep
//! interiors in the temperature stage.

use crate::fields::{laplacian_smooth, smoothstep};
use crate::mesh::Mesh;
use std::collections::VecDeque;

/// Distance at which a cell counts as fully continental.
const SATURATION_KM: f32 = 2000.0;

pub struct Continentality {
    /// From the elevation-derived ocean mask.
    pub actual: Vec<f32>,
    /// From the plate-is-ocean mask.
    pub plate: Vec<f32>,
}

pub fn compute_continentality(mesh: &Mesh, ocean: &[bool], plate_ocean: &[bool]) -> Continentality {
    Continentality {
        actual: continentality_from(mesh, ocean),
        plate: continentality_from(mesh, plate_ocean),
    }
}

fn continentality_from(mesh: &Mesh, ocean: &[bool]) -> Vec<f32> {
    let n = mesh.num_regions;
    let open = largest_component(mesh, ocean);
    let avg_edge_km = mesh.avg_edge_km() as f32;

    // Hop distance through land, seeded at the main-ocean shoreline.
    let mut hops = vec![f32::INFINITY; n];
    let mut queue = VecDeque::new();
    for r in 0..n {
        if !ocean[r] && mesh.neighbors(r).iter().any(|&nb| open[nb as usize]) {
            hops[r] = 0.0;
            queue.push_back(r);
        }
    }
    while let Some(r) = queue.pop_front() {
        for &nb in mesh.neighbors(r) {
            let nb = nb as usize;
            if !ocean[nb] && hops[nb].is_infinite() {
                hops[nb] = hops[r] + 1.0;
                queue.push_back(nb);
            }
        }
    }

    let mut field: Vec<f32> = (0..n)
        .map(|r| {
            if ocean[r] {
                0.0
            } else if hops[r].is_infinite() {
                1.0 // landlocked world, or land cut off from the main ocean
            } else {
                smoothstep(0.0, SATURATION_KM, hops[r] * avg_edge_km)
            }
        })
        .collect();

    // Light smoothing bleeds a little continentality onto near-shore ocean.
    laplacian_smooth(mesh, &mut field, 2, 0.5);
    field
}

/// Largest connected component of `mask`.
pub fn largest_component(mesh: &Mesh, mask: &[bool]) -> Vec<bool> {
    let n = mesh.num_regions;
    let mut component = vec![usize::MAX; n];
    let mut sizes: Vec<usize> = Vec::new();
    for start in 0..n {
        if !mask[start] || component[start] != usize::MAX {
            continue;
        }
        let id = sizes.len();
        let mut size = 0usize;
        let mut queue = VecDeque::from([start]);
        component[start] = id;
        while let Some(r) = queue.pop_front() {
            size += 1;
            for &nb in mesh.neighbors(r) {
                let nb = nb as usize;
                if mask[nb] && component[nb] == usize::MAX {
                    component[nb] = id;
                    queue.push_back(nb);
                }
            }
        }
        sizes.push(size);
    }
    match (0..sizes.len()).max_by_key(|&c| sizes[c]) {
        Some(largest) => (0..n).map(|r| component[r] == largest).collect(),
        None => vec![false; n],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_beats_coast() {
        let mesh = Mesh::fibonacci(3000, 0.5, 42).unwrap();
        // Land cap north of 30 degrees.
        let ocean: Vec<bool> = mesh.positions.iter().map(|p| p.y < 0.5).collect();
        let c = continentality_from(&mesh, &ocean);
        let pole_mean = mean_where(&mesh, &c, |y| y > 0.95);
        let coast_mean = mean_where(&mesh, &c, |y| (0.5..0.55).contains(&y));
        assert!(
            pole_mean > coast_mean,
            "pole {pole_mean:.3} should be more continental than coast {coast_mean:.3}"
        );
        for (r, &v) in c.iter().enumerate() {
            assert!((0.0..=1.0).contains(&v), "cell {r} continentality {v}");
        }
    }

    #[test]
    fn ocean_world_is_zero_everywhere() {
        let mesh = Mesh::fibonacci(800, 0.5, 7).unwrap();
        let ocean = vec![true; mesh.num_regions];
        let c = continentality_from(&mesh, &ocean);
        assert!(c.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn land_world_saturates() {
        let mesh = Mesh::fibonacci(800, 0.5, 3).unwrap();
        let ocean = vec![false; mesh.num_regions];
        let c = continentality_from(&mesh, &ocean);
        assert!(c.iter().all(|&v| v > 0.99), "landlocked world must be fully continental");
    }

    #[test]
    fn inland_sea_does_not_reset_the_field() {
        let mesh = Mesh::fibonacci(3000, 0.5, 9).unwrap();
        // Main ocean south of the equator plus a small inland sea near the
        // pole. Seeding only from the main body keeps the deep interior dry.
        let ocean: Vec<bool> = mesh.positions.iter().map(|p| p.y < 0.0 || p.y > 0.97).collect();
        let c = continentality_from(&mesh, &ocean);
        let near_inland_sea = mean_where(&mesh, &c, |y| (0.85..0.95).contains(&y));
        let near_main_coast = mean_where(&mesh, &c, |y| (0.0..0.1).contains(&y));
        assert!(
            near_inland_sea > near_main_coast,
            "inland-sea shore {near_inland_sea:.3} should stay more continental than the main coast {near_main_coast:.3}"
        );
    }

    fn mean_where(mesh: &Mesh, field: &[f32], pred: impl Fn(f64) -> bool) -> f32 {
        let vals: Vec<f32> = (0..mesh.num_regions)
            .filter(|&r| pred(mesh.positions[r].y))
            .map(|r| field[r])
            .collect();
        vals.iter().sum::<f32>() / vals.len().max(1) as f32
    }
}

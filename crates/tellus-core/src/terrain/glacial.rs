//! Glacial erosion: latitude- and altitude-driven ice accumulation flows
//! down the steepest-descent graph, carving U-valleys, over-deepening where
//! ice streams merge, dropping moraines at termini, and gouging fjords on
//! glaciated coasts.

use crate::fields::smoothstep;
use crate::mesh::Mesh;
use crate::terrain::hydraulic::{descending_land_order, steepest_receivers};

/// Carving may dig a little below sea level; the mid-erosion reflood punches
/// outlets through whatever basins remain.
const CARVE_FLOOR: f32 = -0.03;

/// Per-cell glaciation index in [0, 1]: polar latitude plus high altitude.
pub fn glaciation_index(mesh: &Mesh, elevation: &[f32], strength: f32) -> Vec<f32> {
    let lat_threshold = 70.0 - 20.0 * strength;
    (0..mesh.num_regions)
        .map(|r| {
            if elevation[r] < 0.0 {
                return 0.0;
            }
            let lat = mesh.positions[r].latitude_deg().abs() as f32;
            let polar = smoothstep(lat_threshold, lat_threshold + 15.0, lat);
            let alpine = 0.5 * smoothstep(0.5, 0.9, elevation[r]);
            (polar + alpine).min(1.0)
        })
        .collect()
}

/// One glacial iteration.
pub fn glacial_iteration(mesh: &Mesh, elevation: &mut [f32], strength: f32, g_iters: usize) {
    let n = mesh.num_regions;
    let ice = glaciation_index(mesh, elevation, strength);
    if ice.iter().all(|&i| i <= 0.0) {
        return;
    }

    let order = descending_land_order(mesh, elevation);
    let receivers = steepest_receivers(mesh, elevation);

    // Ice flow accumulation and upstream-donor counts, downstream sweep.
    let mut flow = ice.clone();
    let mut donors = vec![0u8; n];
    for &r in &order {
        let r = r as usize;
        if ice[r] <= 0.0 {
            continue;
        }
        let rcv = receivers[r] as usize;
        if rcv != r && elevation[rcv] < elevation[r] && ice[rcv] > 0.0 {
            flow[rcv] += flow[r];
            donors[rcv] = donors[rcv].saturating_add(1);
        }
    }

    let per_iter = strength / g_iters.max(1) as f32;
    let mut delta = vec![0.0f32; n];

    for &r in &order {
        let r = r as usize;
        if ice[r] <= 0.0 {
            continue;
        }
        let mut carve = 0.02 * flow[r].powf(0.6) * per_iter;
        // Confluences over-deepen their troughs.
        if donors[r] >= 2 {
            carve *= 1.5;
        }
        delta[r] -= carve;

        // U-valley widening: gentle walls are planed down too.
        if flow[r] > 2.0 {
            for &nb in mesh.neighbors(r) {
                let nb = nb as usize;
                if elevation[nb] <= elevation[r] {
                    continue;
                }
                let slope = (elevation[nb] - elevation[r]).min(1.0);
                delta[nb] -= carve * 0.4 * (1.0 - slope);
            }
        }

        // Moraine at the terminus: ice dies where the downstream index drops
        // below 30% of the source's.
        let rcv = receivers[r] as usize;
        if rcv != r && ice[rcv] < 0.3 * ice[r] {
            delta[rcv] += 0.3 * carve;
        }

        // Fjord enhancement on glaciated coasts.
        if mesh.neighbors(r).iter().any(|&nb| elevation[nb as usize] < 0.0) {
            delta[r] -= carve * 0.8;
        }
    }

    for r in 0..n {
        if delta[r] != 0.0 {
            elevation[r] = (elevation[r] + delta[r]).max(CARVE_FLOOR);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Polar cap terrain: a tall dome at the +Y pole, ocean south of 0.
    fn polar_dome(mesh: &Mesh) -> Vec<f32> {
        mesh.positions
            .iter()
            .map(|p| {
                if p.y < 0.0 {
                    -0.3
                } else {
                    (p.y as f32).powi(2) * 0.9
                }
            })
            .collect()
    }

    #[test]
    fn glaciation_index_is_polar_and_alpine() {
        let mesh = Mesh::fibonacci(1000, 0.5, 42).unwrap();
        let e = polar_dome(&mesh);
        let ice = glaciation_index(&mesh, &e, 0.5);
        for r in 0..mesh.num_regions {
            let lat = mesh.positions[r].latitude_deg();
            if lat.abs() < 20.0 {
                assert!(ice[r] < 0.6, "low-latitude low cell {r} too glaciated: {}", ice[r]);
            }
            if e[r] < 0.0 {
                assert_eq!(ice[r], 0.0, "ocean cell {r} must not glaciate");
            }
        }
        assert!(ice.iter().any(|&i| i > 0.5), "the polar dome should glaciate");
    }

    #[test]
    fn glacial_carving_lowers_polar_terrain() {
        let mesh = Mesh::fibonacci(1500, 0.5, 7).unwrap();
        let mut e = polar_dome(&mesh);
        let polar_before: f32 = polar_sum(&mesh, &e);
        for _ in 0..5 {
            glacial_iteration(&mesh, &mut e, 0.8, 5);
        }
        let polar_after: f32 = polar_sum(&mesh, &e);
        assert!(
            polar_after < polar_before,
            "glaciers should carve the cap: {polar_before:.2} -> {polar_after:.2}"
        );
        for &v in &e {
            assert!(v >= CARVE_FLOOR - 1e-6, "carving dug below the floor: {v}");
        }
    }

    #[test]
    fn zero_ice_world_is_untouched() {
        let mesh = Mesh::fibonacci(600, 0.5, 3).unwrap();
        // Equatorial lowlands only: no latitude or altitude trigger.
        let mut e: Vec<f32> = mesh
            .positions
            .iter()
            .map(|p| if p.y.abs() < 0.3 { 0.1 } else { -0.2 })
            .collect();
        let before = e.clone();
        glacial_iteration(&mesh, &mut e, 0.2, 2);
        assert_eq!(e, before);
    }

    fn polar_sum(mesh: &Mesh, e: &[f32]) -> f32 {
        (0..mesh.num_regions)
            .filter(|&r| mesh.positions[r].y > 0.8)
            .map(|r| e[r])
            .sum()
    }
}

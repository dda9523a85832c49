//! Slope-preserving smoothing passes: bilateral pre-smoothing, ridge
//! sharpening, and the final soil-creep relaxation.

use crate::mesh::Mesh;

/// Bilateral smoothing over land cells. Neighbors are weighted by inverse
/// elevation difference so sharp edges survive while speckle noise goes.
/// Coastline land cells (land with an ocean neighbor) are locked to keep the
/// waterline in place.
pub fn bilateral_smooth(mesh: &Mesh, elevation: &mut [f32], strength: f32) {
    if strength <= 0.0 {
        return;
    }
    let iters = (1.0 + 4.0 * strength).round() as usize;
    let str_ = 0.2 + 0.5 * strength;
    let n = mesh.num_regions;
    let mut next = elevation.to_vec();

    for _ in 0..iters {
        for r in 0..n {
            let e = elevation[r];
            if e < 0.0 {
                continue;
            }
            let mut locked = false;
            let mut wsum = 0.0f32;
            let mut vsum = 0.0f32;
            for &nb in mesh.neighbors(r) {
                let en = elevation[nb as usize];
                if en < 0.0 {
                    locked = true;
                    break;
                }
                let w = 1.0 / (1.0 + 8.0 * (en - e).abs());
                wsum += w;
                vsum += w * en;
            }
            if locked || wsum <= 0.0 {
                continue;
            }
            next[r] = e + str_ * (vsum / wsum - e);
        }
        elevation.copy_from_slice(&next);
    }
}

/// Push land cells that already stand above their neighborhood mean further
/// up, capped at 1.5x their pre-pass value so crests sharpen without
/// spiking.
pub fn ridge_sharpen(mesh: &Mesh, elevation: &mut [f32], strength: f32) {
    if strength <= 0.0 {
        return;
    }
    let iters = (1.0 + 3.0 * strength).round() as usize;
    let str_ = 0.08 * strength;
    let n = mesh.num_regions;
    let mut next = elevation.to_vec();

    for _ in 0..iters {
        for r in 0..n {
            let e = elevation[r];
            if e <= 0.0 {
                continue;
            }
            let nbs = mesh.neighbors(r);
            if nbs.is_empty() {
                continue;
            }
            let avg = nbs.iter().map(|&nb| elevation[nb as usize]).sum::<f32>() / nbs.len() as f32;
            if e > avg {
                next[r] = (e + str_ * (e - avg)).min(1.5 * e);
            }
        }
        elevation.copy_from_slice(&next);
    }
}

/// Three light Laplacian passes on interior land (cells with no ocean
/// neighbor), settling loose material after erosion.
pub fn soil_creep(mesh: &Mesh, elevation: &mut [f32]) {
    const STRENGTH: f32 = 0.1125;
    let n = mesh.num_regions;
    let mut next = elevation.to_vec();
    for _ in 0..3 {
        for r in 0..n {
            if elevation[r] < 0.0 {
                continue;
            }
            let nbs = mesh.neighbors(r);
            if nbs.is_empty() || nbs.iter().any(|&nb| elevation[nb as usize] < 0.0) {
                continue;
            }
            let avg = nbs.iter().map(|&nb| elevation[nb as usize]).sum::<f32>() / nbs.len() as f32;
            next[r] = elevation[r] + STRENGTH * (avg - elevation[r]);
        }
        elevation.copy_from_slice(&next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speckled(mesh: &Mesh) -> Vec<f32> {
        (0..mesh.num_regions)
            .map(|r| if r % 3 == 0 { 0.5 } else { 0.2 })
            .collect()
    }

    #[test]
    fn zero_strength_is_identity() {
        let mesh = Mesh::fibonacci(400, 0.5, 42).unwrap();
        let mut e = speckled(&mesh);
        let before = e.clone();
        bilateral_smooth(&mesh, &mut e, 0.0);
        ridge_sharpen(&mesh, &mut e, 0.0);
        assert_eq!(e, before);
    }

    #[test]
    fn bilateral_reduces_speckle_on_land() {
        let mesh = Mesh::fibonacci(600, 0.5, 7).unwrap();
        let mut e = speckled(&mesh);
        let var_before = variance(&e);
        bilateral_smooth(&mesh, &mut e, 0.8);
        assert!(variance(&e) < var_before, "smoothing should reduce variance");
    }

    #[test]
    fn coastline_cells_are_locked() {
        let mesh = Mesh::fibonacci(800, 0.5, 3).unwrap();
        let mut e: Vec<f32> = mesh
            .positions
            .iter()
            .map(|p| if p.y >= 0.0 { 0.3 } else { -0.3 })
            .collect();
        let before = e.clone();
        bilateral_smooth(&mesh, &mut e, 1.0);
        for r in 0..mesh.num_regions {
            let coastal = e[r] >= 0.0
                && mesh.neighbors(r).iter().any(|&nb| before[nb as usize] < 0.0);
            if coastal {
                assert_eq!(e[r], before[r], "coastline cell {r} moved");
            }
        }
    }

    #[test]
    fn sharpening_never_exceeds_cap() {
        let mesh = Mesh::fibonacci(500, 0.5, 9).unwrap();
        let mut e = speckled(&mesh);
        let before = e.clone();
        ridge_sharpen(&mesh, &mut e, 1.0);
        for r in 0..mesh.num_regions {
            // Per-iteration cap of 1.5x compounds over at most 4 iterations.
            let bound = before[r] * 1.5f32.powi(4) + 1e-6;
            assert!(e[r] <= bound, "cell {r}: {} exceeds cap {bound}", e[r]);
        }
    }

    fn variance(v: &[f32]) -> f32 {
        let mean = v.iter().sum::<f32>() / v.len() as f32;
        v.iter().map(|x| (x - mean) * (x - mean)).sum::<f32>() / v.len() as f32
    }
}

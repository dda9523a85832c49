//! Thermal erosion: talus-angle diffusion. Slopes steeper than the critical
//! angle shed material to their lower neighbors; the redistribution is
//! buffered and applied after the full sweep so order does not matter.

use crate::mesh::Mesh;

/// Critical slope in elevation units per cell spacing.
const TALUS_SLOPE: f32 = 0.02;

/// Fraction of the accumulated excess moved per iteration.
const K_THERMAL: f32 = 0.1;

/// One thermal iteration. Material only moves between cells on the same
/// plate; faults decouple hillslopes.
pub fn thermal_iteration(mesh: &Mesh, plate_of: &[u32], elevation: &mut [f32]) {
    let n = mesh.num_regions;
    let edge = mesh.avg_edge_rad();
    let mut delta = vec![0.0f32; n];
    let mut excess: Vec<(usize, f32)> = Vec::with_capacity(12);

    for r in 0..n {
        if elevation[r] < 0.0 {
            continue;
        }
        excess.clear();
        let mut total = 0.0f32;
        for &nb in mesh.neighbors(r) {
            let nb = nb as usize;
            if plate_of[nb] != plate_of[r] {
                continue;
            }
            if elevation[nb] >= elevation[r] {
                continue;
            }
            let dist = (mesh.positions[r].sub(mesh.positions[nb]).length() / edge).max(0.25) as f32;
            let slope = (elevation[r] - elevation[nb]) / dist;
            if slope > TALUS_SLOPE {
                let ex = (slope - TALUS_SLOPE) * dist;
                excess.push((nb, ex));
                total += ex;
            }
        }
        if total <= 0.0 {
            continue;
        }
        let moved = K_THERMAL * total * 0.5;
        delta[r] -= moved;
        for &(nb, ex) in &excess {
            delta[nb] += moved * ex / total;
        }
    }
    for r in 0..n {
        elevation[r] += delta[r];
    }
}

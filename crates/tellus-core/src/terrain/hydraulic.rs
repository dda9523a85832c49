//! Hydraulic erosion: steepest-descent stream power solved implicitly in
//! the Braun-Willett fashion, one sweep per erosion iteration.

use crate::mesh::Mesh;

/// Stream-power constants: `dh/dt = -K * A^m * S` with n = 1.
const K_HYDRAULIC: f32 = 0.015;
const M_EXPONENT: f32 = 0.5;

/// Fraction of eroded material offered to the receiver before slope damping.
const DEPOSIT_BASE: f32 = 0.3;

/// Per-cell steepest-descent receiver: the neighbor with the maximum drop.
/// Pits get their least-steep ascent neighbor by the same argmax; cells
/// with no neighbors map to themselves.
pub fn steepest_receivers(mesh: &Mesh, elevation: &[f32]) -> Vec<u32> {
    (0..mesh.num_regions)
        .map(|r| {
            let mut best = r as u32;
            let mut best_drop = f32::NEG_INFINITY;
            for &nb in mesh.neighbors(r) {
                let drop = elevation[r] - elevation[nb as usize];
                if drop > best_drop {
                    best_drop = drop;
                    best = nb;
                }
            }
            best
        })
        .collect()
}

/// Land cells (elevation >= 0) sorted by descending elevation. Index ties
/// break ascending for determinism.
pub fn descending_land_order(mesh: &Mesh, elevation: &[f32]) -> Vec<u32> {
    let mut order: Vec<u32> = (0..mesh.num_regions as u32)
        .filter(|&r| elevation[r as usize] >= 0.0)
        .collect();
    order.sort_by(|&a, &b| {
        elevation[b as usize]
            .total_cmp(&elevation[a as usize])
            .then(a.cmp(&b))
    });
    order
}

/// Flow accumulation: every land cell contributes 1.0 and passes its total
/// downstream in descending-elevation order.
pub fn accumulate_flow(elevation: &[f32], receivers: &[u32], order_desc: &[u32]) -> Vec<f32> {
    let mut flow = vec![0.0f32; elevation.len()];
    for &r in order_desc {
        flow[r as usize] += 1.0;
    }
    for &r in order_desc {
        let r = r as usize;
        let rcv = receivers[r] as usize;
        if rcv != r && elevation[rcv] < elevation[r] {
            let f = flow[r];
            flow[rcv] += f;
        }
    }
    flow
}

/// One hydraulic iteration over the current terrain.
pub fn hydraulic_iteration(mesh: &Mesh, elevation: &mut [f32]) {
    let order_desc = descending_land_order(mesh, elevation);
    let receivers = steepest_receivers(mesh, elevation);
    let flow = accumulate_flow(elevation, &receivers, &order_desc);
    let edge = mesh.avg_edge_rad();

    // Implicit solve in ascending order: receivers are already final when
    // their donors are visited.
    for &r in order_desc.iter().rev() {
        let r = r as usize;
        let rcv = receivers[r] as usize;
        if rcv == r {
            continue;
        }
        let dist = mesh.positions[r].sub(mesh.positions[rcv]).length() / edge;
        let dist = dist.max(0.25) as f32;
        let factor = K_HYDRAULIC * flow[r].powf(M_EXPONENT) / dist;
        let h_old = elevation[r];
        let h_rcv = elevation[rcv];
        let mut h_new = (h_old + factor * h_rcv) / (1.0 + factor);
        h_new = h_new.max(h_rcv).max(0.0);
        elevation[r] = h_new;

        // Slope-damped deposition at the receiver, capped so the receiver
        // never rises above the source's new elevation.
        let eroded = h_old - h_new;
        if eroded > 0.0 {
            let rcv_next = receivers[rcv] as usize;
            let rcv_slope = ((elevation[rcv] - elevation[rcv_next]).max(0.0)) / dist;
            let mut dep = eroded * DEPOSIT_BASE / (1.0 + 50.0 * rcv_slope);
            dep = dep.min((h_new - elevation[rcv]).max(0.0));
            elevation[rcv] += dep;
        }
    }
}

//! The spherical region mesh consumed by every pipeline stage.
//!
//! A mesh is a set of Voronoi-like cells ("regions") on the unit sphere with
//! a CSR-format neighbor list. Mesh construction proper belongs to an
//! external collaborator; this module defines the contract and ships a
//! Fibonacci-lattice reference builder so the pipeline and its tests can run
//! without one. Any mesh honoring the CSR invariants works.

use crate::error::GenError;
use crate::sphere::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Seed salt for the reference mesh builder.
const SALT_MESH: u64 = 0x7E11_05E5_0000_0001;

/// Region adjacency graph on the unit sphere.
///
/// Invariants:
/// - `adj_offset.len() == num_regions + 1`, monotone, starting at 0;
/// - `adj_list[adj_offset[r]..adj_offset[r+1]]` are the neighbors of `r`,
///   each `< num_regions`, never `r` itself;
/// - adjacency is symmetric;
/// - `positions.len() == num_regions`, all unit length.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub num_regions: usize,
    pub adj_offset: Vec<u32>,
    pub adj_list: Vec<u32>,
    pub positions: Vec<Vec3>,
    /// Optional dual-surface triangles (region index triples). May be empty;
    /// only the triangle-elevation output depends on it.
    pub triangles: Vec<[u32; 3]>,
}

impl Mesh {
    /// Validate and assemble a mesh from externally built parts.
    pub fn from_parts(
        adj_offset: Vec<u32>,
        adj_list: Vec<u32>,
        positions: Vec<Vec3>,
        triangles: Vec<[u32; 3]>,
    ) -> Result<Self, GenError> {
        let n = positions.len();
        if n == 0 {
            return Err(GenError::invalid("mesh has no regions"));
        }
        if adj_offset.len() != n + 1 || adj_offset[0] != 0 {
            return Err(GenError::invalid("adjacency offsets malformed"));
        }
        if adj_offset[n] as usize != adj_list.len() {
            return Err(GenError::invalid("adjacency list length mismatch"));
        }
        for r in 0..n {
            if adj_offset[r] > adj_offset[r + 1] {
                return Err(GenError::invalid("adjacency offsets not monotone"));
            }
            for &nb in &adj_list[adj_offset[r] as usize..adj_offset[r + 1] as usize] {
                if nb as usize >= n || nb as usize == r {
                    return Err(GenError::invalid(format!("bad neighbor {nb} of region {r}")));
                }
            }
        }
        Ok(Self { num_regions: n, adj_offset, adj_list, positions, triangles })
    }

    /// Neighbors of region `r` (the `r_circulate` accessor).
    #[inline]
    pub fn neighbors(&self, r: usize) -> &[u32] {
        &self.adj_list[self.adj_offset[r] as usize..self.adj_offset[r + 1] as usize]
    }

    #[inline]
    pub fn degree(&self, r: usize) -> usize {
        (self.adj_offset[r + 1] - self.adj_offset[r]) as usize
    }

    /// Mean edge length in km for a mesh of this density:
    /// `π · R_earth / sqrt(N)`.
    pub fn avg_edge_km(&self) -> f64 {
        std::f64::consts::PI * EARTH_RADIUS_KM / (self.num_regions as f64).sqrt()
    }

    /// Mean edge length as an angle in radians.
    pub fn avg_edge_rad(&self) -> f64 {
        std::f64::consts::PI / (self.num_regions as f64).sqrt()
    }

    /// Reference builder: Fibonacci-lattice points with tangent-plane jitter
    /// and symmetrized 6-nearest-neighbor adjacency.
    ///
    /// `jitter` in [0, 1] perturbs points by up to half a cell spacing.
    pub fn fibonacci(n: usize, jitter: f64, seed: u64) -> Result<Self, GenError> {
        if n < 32 {
            return Err(GenError::invalid(format!("mesh size {n} below minimum of 32")));
        }
        if !(0.0..=1.0).contains(&jitter) {
            return Err(GenError::invalid(format!("jitter {jitter} outside [0, 1]")));
        }
        let mut rng = StdRng::seed_from_u64(seed ^ SALT_MESH);
        let golden_angle = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
        let spacing = (4.0 * std::f64::consts::PI / n as f64).sqrt();

        let mut positions = Vec::with_capacity(n);
        for i in 0..n {
            let y = 1.0 - 2.0 * (i as f64 + 0.5) / n as f64;
            let radius = (1.0 - y * y).max(0.0).sqrt();
            let theta = i as f64 * golden_angle;
            let p = Vec3::new(radius * theta.cos(), y, radius * theta.sin());

            // Jitter within the tangent plane, then reproject.
            let (du, dv) = (rng.gen::<f64>() - 0.5, rng.gen::<f64>() - 0.5);
            let u = p
                .tangent_from(Vec3::new(0.0, 1.0, 0.0))
                .unwrap_or(Vec3::new(1.0, 0.0, 0.0));
            let v = p.cross(u).normalize();
            let amp = jitter * spacing;
            positions.push(p.add(u.scale(du * amp)).add(v.scale(dv * amp)).normalize());
        }

        let adjacency = nearest_neighbor_adjacency(&positions, 6);
        let mut adj_offset = Vec::with_capacity(n + 1);
        let mut adj_list = Vec::new();
        adj_offset.push(0u32);
        for nbs in &adjacency {
            adj_list.extend_from_slice(nbs);
            adj_offset.push(adj_list.len() as u32);
        }

        Mesh::from_parts(adj_offset, adj_list, positions, Vec::new())
    }
}

/// Symmetrized k-nearest-neighbor adjacency via latitude-band buckets.
/// Deterministic: each list is sorted ascending.
fn nearest_neighbor_adjacency(positions: &[Vec3], k: usize) -> Vec<Vec<u32>> {
    let n = positions.len();
    let bands = ((n as f64 / 2.0).sqrt().ceil() as usize).max(3);
    let band_of = |p: Vec3| -> usize {
        let lat01 = (p.y.clamp(-1.0, 1.0).asin() / std::f64::consts::PI) + 0.5;
        ((lat01 * bands as f64) as usize).min(bands - 1)
    };

    // Per-band longitude bins sized to the band circumference.
    let mut bins: Vec<Vec<Vec<u32>>> = (0..bands)
        .map(|b| {
            let lat_c = ((b as f64 + 0.5) / bands as f64 - 0.5) * std::f64::consts::PI;
            let nbin = ((2.0 * bands as f64 * lat_c.cos()).round() as usize).max(1);
            vec![Vec::new(); nbin]
        })
        .collect();
    let bin_of = |p: Vec3, nbin: usize| -> usize {
        let lon01 = (p.z.atan2(p.x) / std::f64::consts::TAU) + 0.5;
        ((lon01 * nbin as f64) as usize).min(nbin - 1)
    };
    for (i, &p) in positions.iter().enumerate() {
        let b = band_of(p);
        let nbin = bins[b].len();
        bins[b][bin_of(p, nbin)].push(i as u32);
    }

    let spacing = (4.0 * std::f64::consts::PI / n as f64).sqrt();
    let mut nearest: Vec<Vec<u32>> = vec![Vec::new(); n];
    let mut candidates: Vec<u32> = Vec::new();

    for (i, &p) in positions.iter().enumerate() {
        let b = band_of(p);
        let mut window = 4.0 * spacing;
        loop {
            candidates.clear();
            let lon01 = (p.z.atan2(p.x) / std::f64::consts::TAU) + 0.5;
            let cos_lat = (1.0 - p.y * p.y).max(0.05).sqrt();
            for band in b.saturating_sub(1)..=(b + 1).min(bands - 1) {
                let nbin = bins[band].len();
                let half = (window / (std::f64::consts::TAU * cos_lat) * nbin as f64).ceil() as i64 + 1;
                if half as usize * 2 + 1 >= nbin {
                    for bin in &bins[band] {
                        candidates.extend_from_slice(bin);
                    }
                } else {
                    let center = (lon01 * nbin as f64) as i64;
                    for d in -half..=half {
                        let idx = (center + d).rem_euclid(nbin as i64) as usize;
                        candidates.extend_from_slice(&bins[band][idx]);
                    }
                }
            }
            if candidates.len() > k || window > std::f64::consts::PI {
                break;
            }
            window *= 2.0;
        }

        // k smallest cosine distances, excluding self.
        candidates.sort_unstable();
        candidates.dedup();
        let mut scored: Vec<(f64, u32)> = candidates
            .iter()
            .filter(|&&c| c as usize != i)
            .map(|&c| (1.0 - p.dot(positions[c as usize]), c))
            .collect();
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        nearest[i] = scored.iter().take(k).map(|&(_, c)| c).collect();
    }

    // Symmetrize and sort for deterministic iteration order.
    let mut out: Vec<Vec<u32>> = vec![Vec::new(); n];
    for (i, nbs) in nearest.iter().enumerate() {
        for &nb in nbs {
            out[i].push(nb);
            out[nb as usize].push(i as u32);
        }
    }
    for list in &mut out {
        list.sort_unstable();
        list.dedup();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fibonacci_rejects_degenerate_inputs() {
        assert!(Mesh::fibonacci(8, 0.5, 42).is_err());
        assert!(Mesh::fibonacci(1000, 1.5, 42).is_err());
    }

    #[test]
    fn adjacency_is_symmetric_and_self_free() {
        let mesh = Mesh::fibonacci(500, 0.5, 42).unwrap();
        for r in 0..mesh.num_regions {
            for &nb in mesh.neighbors(r) {
                assert_ne!(nb as usize, r, "region {r} is its own neighbor");
                assert!(
                    mesh.neighbors(nb as usize).contains(&(r as u32)),
                    "edge {r}->{nb} has no reverse edge"
                );
            }
        }
    }

    #[test]
    fn mesh_graph_is_connected() {
        let mesh = Mesh::fibonacci(1000, 0.5, 7).unwrap();
        let mut seen = vec![false; mesh.num_regions];
        let mut queue = std::collections::VecDeque::from([0usize]);
        seen[0] = true;
        let mut count = 1;
        while let Some(r) = queue.pop_front() {
            for &nb in mesh.neighbors(r) {
                if !seen[nb as usize] {
                    seen[nb as usize] = true;
                    count += 1;
                    queue.push_back(nb as usize);
                }
            }
        }
        assert_eq!(count, mesh.num_regions, "mesh graph must be connected");
    }

    #[test]
    fn degrees_are_plausible() {
        let mesh = Mesh::fibonacci(800, 0.5, 3).unwrap();
        for r in 0..mesh.num_regions {
            let d = mesh.degree(r);
            assert!((4..=14).contains(&d), "region {r} has degree {d}");
        }
    }

    #[test]
    fn same_seed_same_mesh() {
        let a = Mesh::fibonacci(400, 0.7, 99).unwrap();
        let b = Mesh::fibonacci(400, 0.7, 99).unwrap();
        assert_eq!(a.adj_list, b.adj_list);
        assert!(a
            .positions
            .iter()
            .zip(&b.positions)
            .all(|(p, q)| p.x == q.x && p.y == q.y && p.z == q.z));
    }
}

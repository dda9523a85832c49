//! Per-region scalar field helpers: smoothing sweeps over the CSR mesh,
//! percentile normalization, and the shared elevation-to-kilometres mapping.

use crate::mesh::Mesh;

/// Hermite smoothstep of `x` between `edge0` and `edge1`.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if (edge1 - edge0).abs() < 1e-12 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Physical height in km for a unitless elevation in roughly [-1, 1].
///
/// Both the pressure and temperature stages use this one mapping; the
/// exponent keeps mid elevations low so lapse effects concentrate at peaks.
/// Ocean (negative) elevations map to 0.
pub fn elevation_to_km(e: f32) -> f32 {
    if e <= 0.0 {
        0.0
    } else {
        7.0 * e.powf(1.3)
    }
}

/// One Laplacian relaxation pass: every cell moves `alpha` of the way toward
/// its neighborhood mean. Double-buffered, so sweep order does not matter.
pub fn laplacian_smooth(mesh: &Mesh, field: &mut [f32], passes: usize, alpha: f32) {
    let mut next = field.to_vec();
    for _ in 0..passes {
        for r in 0..mesh.num_regions {
            let nbs = mesh.neighbors(r);
            if nbs.is_empty() {
                continue;
            }
            let mean = nbs.iter().map(|&nb| field[nb as usize]).sum::<f32>() / nbs.len() as f32;
            next[r] = field[r] + alpha * (mean - field[r]);
        }
        field.copy_from_slice(&next);
    }
}

/// Laplacian smoothing restricted to cells where `mask` is true; the
/// neighborhood mean also only reads masked neighbors. Cells outside the
/// mask are left untouched.
pub fn laplacian_smooth_masked(
    mesh: &Mesh,
    field: &mut [f32],
    mask: &[bool],
    passes: usize,
    alpha: f32,
) {
    let mut next = field.to_vec();
    for _ in 0..passes {
        for r in 0..mesh.num_regions {
            if !mask[r] {
                continue;
            }
            let mut sum = 0.0f32;
            let mut count = 0usize;
            for &nb in mesh.neighbors(r) {
                if mask[nb as usize] {
                    sum += field[nb as usize];
                    count += 1;
                }
            }
            if count > 0 {
                next[r] = field[r] + alpha * (sum / count as f32 - field[r]);
            }
        }
        field.copy_from_slice(&next);
    }
}

/// Value at quantile `q` in [0, 1] of `field`, by sorted copy.
pub fn percentile(field: &[f32], q: f32) -> f32 {
    if field.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f32> = field.iter().cloned().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let idx = ((sorted.len() - 1) as f32 * q.clamp(0.0, 1.0)).round() as usize;
    sorted[idx]
}

/// Divide `field` by its 95th percentile (if positive). Returns the divisor.
/// Callers that need a hard [0, 1] range clamp afterwards.
pub fn normalize_p95(field: &mut [f32]) -> f32 {
    let p95 = percentile(field, 0.95);
    if p95 > 1e-9 {
        for v in field.iter_mut() {
            *v /= p95;
        }
    }
    p95
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;

    #[test]
    fn smoothstep_edges() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn elevation_to_km_is_monotone_and_clamped_at_sea() {
        assert_eq!(elevation_to_km(-0.5), 0.0);
        assert_eq!(elevation_to_km(0.0), 0.0);
        assert!(elevation_to_km(0.5) < elevation_to_km(1.0));
        assert!((elevation_to_km(1.0) - 7.0).abs() < 1e-5);
    }

    #[test]
    fn laplacian_contracts_toward_mean() {
        let mesh = Mesh::fibonacci(300, 0.4, 11).unwrap();
        let mut field: Vec<f32> = (0..mesh.num_regions).map(|r| (r % 7) as f32).collect();
        let before: f32 = variance(&field);
        laplacian_smooth(&mesh, &mut field, 4, 0.5);
        let after: f32 = variance(&field);
        assert!(after < before, "smoothing must reduce variance: {before} -> {after}");
    }

    #[test]
    fn masked_smoothing_leaves_unmasked_cells_alone() {
        let mesh = Mesh::fibonacci(200, 0.4, 2).unwrap();
        let mut field: Vec<f32> = (0..mesh.num_regions).map(|r| r as f32).collect();
        let mask: Vec<bool> = (0..mesh.num_regions).map(|r| r % 2 == 0).collect();
        let orig = field.clone();
        laplacian_smooth_masked(&mesh, &mut field, &mask, 3, 0.5);
        for r in 0..mesh.num_regions {
            if !mask[r] {
                assert_eq!(field[r], orig[r], "unmasked cell {r} changed");
            }
        }
    }

    #[test]
    fn p95_normalization_brings_peak_near_one() {
        let mut field: Vec<f32> = (0..1000).map(|i| i as f32 / 100.0).collect();
        normalize_p95(&mut field);
        let above = field.iter().filter(|&&v| v >= 0.95).count();
        assert!(above > 0, "at least one cell must reach 0.95 after normalization");
    }

    fn variance(v: &[f32]) -> f32 {
        let mean = v.iter().sum::<f32>() / v.len() as f32;
        v.iter().map(|x| (x - mean) * (x - mean)).sum::<f32>() / v.len() as f32
    }
}

//! Deterministic noise handle shared across pipeline stages.
//!
//! Wraps the `noise` crate's Perlin primitive with the fractal combinations
//! the elevation and climate layers use: plain fBm, ridged fBm, and
//! domain-warped variants, all sampled at unit-sphere positions so fields
//! wrap seamlessly. One instance is built per generation and shared by
//! reference; it is reentrant for reads.

use crate::sphere::Vec3;
use noise::{NoiseFn, Perlin};

pub struct NoiseField {
    detail: Perlin,
    warp_u: Perlin,
    warp_v: Perlin,
    warp_w: Perlin,
}

impl NoiseField {
    pub fn new(seed: u32) -> Self {
        Self {
            detail: Perlin::new(seed),
            warp_u: Perlin::new(seed ^ 0xBEEF),
            warp_v: Perlin::new(seed ^ 0xB00F),
            warp_w: Perlin::new(seed ^ 0xBAAF),
        }
    }

    /// Single octave at the given frequency, roughly in [-1, 1].
    pub fn sample(&self, p: Vec3, freq: f64) -> f32 {
        self.detail.get([p.x * freq, p.y * freq, p.z * freq]) as f32
    }

    /// Fractional Brownian motion: `octaves` octaves, gain 0.5, lacunarity 2.
    /// Amplitude-normalized to roughly [-1, 1].
    pub fn fbm(&self, p: Vec3, freq: f64, octaves: u32) -> f32 {
        let mut sum = 0.0f64;
        let mut amp = 1.0f64;
        let mut f = freq;
        let mut norm = 0.0f64;
        for _ in 0..octaves {
            sum += amp * self.detail.get([p.x * f, p.y * f, p.z * f]);
            norm += amp;
            amp *= 0.5;
            f *= 2.0;
        }
        (sum / norm) as f32
    }

    /// Ridged fBm in [0, 1]: sharp crests, used for mountain texture and
    /// mid-ocean ridge detail.
    pub fn ridged(&self, p: Vec3, freq: f64, octaves: u32) -> f32 {
        let mut sum = 0.0f64;
        let mut amp = 1.0f64;
        let mut f = freq;
        let mut norm = 0.0f64;
        for _ in 0..octaves {
            let v = 1.0 - self.detail.get([p.x * f, p.y * f, p.z * f]).abs();
            sum += amp * v * v;
            norm += amp;
            amp *= 0.5;
            f *= 2.0;
        }
        (sum / norm) as f32
    }

    /// Displace `p` along a low-frequency vector field and reproject onto the
    /// sphere. `amp` is the displacement in chord units.
    pub fn warp(&self, p: Vec3, warp_freq: f64, amp: f64) -> Vec3 {
        let at = [p.x * warp_freq, p.y * warp_freq, p.z * warp_freq];
        Vec3 {
            x: p.x + amp * self.warp_u.get(at),
            y: p.y + amp * self.warp_v.get(at),
            z: p.z + amp * self.warp_w.get(at),
        }
        .normalize()
    }

    /// fBm sampled at a domain-warped position.
    pub fn warped_fbm(&self, p: Vec3, freq: f64, octaves: u32, warp_amp: f64) -> f32 {
        self.fbm(self.warp(p, freq * 0.5, warp_amp), freq, octaves)
    }

    /// Ridged fBm sampled at a domain-warped position.
    pub fn warped_ridged(&self, p: Vec3, freq: f64, octaves: u32, warp_amp: f64) -> f32 {
        self.ridged(self.warp(p, freq * 0.5, warp_amp), freq, octaves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe_points() -> Vec<Vec3> {
        (0..64)
            .map(|i| {
                let y = 1.0 - 2.0 * (i as f64 + 0.5) / 64.0;
                let r = (1.0 - y * y).sqrt();
                let t = i as f64 * 2.39996;
                Vec3::new(r * t.cos(), y, r * t.sin())
            })
            .collect()
    }

    #[test]
    fn fbm_is_bounded_and_varied() {
        let nf = NoiseField::new(42);
        let vals: Vec<f32> = probe_points().iter().map(|&p| nf.fbm(p, 3.0, 4)).collect();
        for &v in &vals {
            assert!((-1.2..=1.2).contains(&v), "fbm out of range: {v}");
        }
        let spread = vals.iter().cloned().fold(f32::MIN, f32::max)
            - vals.iter().cloned().fold(f32::MAX, f32::min);
        assert!(spread > 0.05, "fbm should vary over the sphere, spread={spread}");
    }

    #[test]
    fn ridged_is_non_negative() {
        let nf = NoiseField::new(7);
        for p in probe_points() {
            let v = nf.ridged(p, 5.0, 3);
            assert!((0.0..=1.0).contains(&v), "ridged out of [0,1]: {v}");
        }
    }

    #[test]
    fn same_seed_same_field() {
        let a = NoiseField::new(1234);
        let b = NoiseField::new(1234);
        for p in probe_points() {
            assert_eq!(a.warped_fbm(p, 4.0, 3, 0.3), b.warped_fbm(p, 4.0, 3, 0.3));
        }
    }

    #[test]
    fn warp_stays_on_sphere() {
        let nf = NoiseField::new(5);
        for p in probe_points() {
            let q = nf.warp(p, 2.0, 0.4);
            assert!((q.length() - 1.0).abs() < 1e-12);
        }
    }
}

//! Layered elevation composition: the base three-field profile plus the
//! land and ocean layer stacks. Every layer is additive (or a bounded
//! multiplicative correction) so each contribution stays inspectable in the
//! debug output.

use crate::elevation::collision::CollisionField;
use crate::elevation::{DebugLayers, Distances};
use crate::fields::{lerp, smoothstep};
use crate::mesh::Mesh;
use crate::noise_field::NoiseField;
use crate::plates::PlateSimulation;

/// Softens the 1/distance poles of the base profile.
const BASE_EPS: f32 = 0.1;

pub struct LayerCtx<'a> {
    pub mesh: &'a Mesh,
    pub plates: &'a PlateSimulation,
    pub col: &'a CollisionField,
    pub dist: &'a Distances,
    pub noise: &'a NoiseField,
    pub n_mag: f32,
}

/// Base profile: high near mountains, deep near ocean seeds, zero-crossing
/// near coastlines. The subduction factor skews peaks toward the
/// subducting side.
pub fn base_elevation(ctx: &LayerCtx<'_>) -> Vec<f32> {
    let n = ctx.mesh.num_regions;
    let mut out = vec![0.0f32; n];
    for r in 0..n {
        let asymmetry = 1.0 + 0.8 * (ctx.col.subduct_factor[r] - 0.5);
        let inv_a = 1.0 / (ctx.dist.mountain[r] * asymmetry + BASE_EPS);
        let inv_b = 1.0 / (ctx.dist.ocean[r] + BASE_EPS);
        let inv_c = 1.0 / (ctx.dist.coastline[r] + BASE_EPS);
        let denom = inv_a + inv_b + inv_c;
        if denom > 1e-12 {
            out[r] = (inv_a - inv_b) / denom * 0.6;
        }
    }
    out
}

/// Land layer stack, applied to cells on land plates.
pub fn apply_land_layers(ctx: &LayerCtx<'_>, elevation: &mut [f32], debug: &mut DebugLayers) {
    let mesh = ctx.mesh;
    let n = mesh.num_regions;
    let interior_reach = (12.0 * (n as f32 / 10_000.0).sqrt()).max(4.0);
    let activity = plate_activity(ctx);

    for r in 0..n {
        let p = ctx.plates.plate_of[r] as usize;
        if ctx.plates.is_ocean[p] {
            continue;
        }
        let pos = mesh.positions[r];
        let sf = ctx.col.subduct_factor[r];
        let stress = ctx.col.stress[r];
        let mut e = elevation[r];

        // Subducting margins sink; the overriding side keeps its relief.
        if sf > 0.5 {
            e *= 1.0 - 0.42 * (sf - 0.5) * 2.0;
        }

        // Stress uplift, modulated by a height-variation noise so belts are
        // rugged rather than uniform walls; rarely the noise dips a cell.
        let hv = 0.5 + 0.5 * ctx.noise.fbm(pos, 3.0, 4);
        let uplift = stress.min(1.5) * (0.45 * hv - 0.05);
        e += uplift;
        debug.stress_uplift[r] = uplift;

        // Foreland depression: quiet cells close to a belt flex downward.
        let dm = ctx.dist.mountain[r];
        if stress < 0.15 && dm.is_finite() && dm >= 1.0 {
            e -= 0.05 * (1.0 - stress / 0.15) * (-(dm - 1.0) / 4.0).exp();
        }

        // Continental rift graben.
        let dr = ctx.dist.rift[r];
        if dr.is_finite() {
            let g = graben_profile(dr, ctx.noise.ridged(pos, 8.0, 3));
            e += g;
            debug.graben[r] = g;
        }

        // Back-arc flexure on the land side.
        let db = ctx.dist.backarc[r];
        if db.is_finite() {
            e -= 0.05 * (-0.5 * ((db - 4.0) / 1.5) * ((db - 4.0) / 1.5)).exp();
        }

        // Terrain texture: ridged where stressed, billowy where quiet.
        let w = (3.0 * stress).min(1.0);
        let billow = ctx.noise.warped_fbm(pos, 4.0, 5, 0.3);
        let ridged = 2.0 * ctx.noise.warped_ridged(pos, 5.0, 4, 0.3) - 1.0;
        let texture = ((1.0 - w) * billow + w * ridged) * ctx.n_mag * 2.0;
        e += texture;
        debug.terrain_noise[r] = texture;

        // Interior uplift: coasts sit low, deep interiors rise with the
        // plate's tectonic activity (active orogens vs. quiet cratons).
        let u = smoothstep(0.0, interior_reach, ctx.dist.coast_land[r]);
        let deep = lerp(0.06, 0.22, activity[p]);
        let interior = lerp(-0.08, deep, u);
        e += interior;
        debug.interior[r] = interior;

        // Plateau boost on overriding sides of active margins.
        if sf < 0.4 && stress > 0.05 {
            e += 0.05 * ((0.4 - sf) / 0.4) * (2.0 * stress).min(1.0);
        }

        elevation[r] = e;
    }
}

/// Ocean layer stack, applied to cells on ocean plates.
pub fn apply_ocean_layers(ctx: &LayerCtx<'_>, elevation: &mut [f32], debug: &mut DebugLayers) {
    let mesh = ctx.mesh;
    for r in 0..mesh.num_regions {
        let p = ctx.plates.plate_of[r] as usize;
        if !ctx.plates.is_ocean[p] {
            continue;
        }
        let pos = mesh.positions[r];
        let stress = ctx.col.stress[r];
        let mut e = elevation[r];

        // Shelf, slope, abyss: a three-segment profile by coast distance.
        let dc = ctx.dist.coast_ocean[r];
        let profile = if dc <= 5.0 {
            lerp(-0.04, -0.10, dc / 5.0)
        } else if dc <= 12.0 {
            lerp(-0.10, -0.35, (dc - 5.0) / 7.0)
        } else {
            -0.35 + 0.05 * ctx.noise.fbm(pos, 0.8, 3)
        };
        e += profile;
        debug.ocean_profile[r] = profile;

        // Mid-ocean ridge with quadratic falloff and ridged crest detail.
        let dr = ctx.dist.ridge[r];
        if dr.is_finite() && dr < 8.0 {
            let f = 1.0 - dr / 8.0;
            let ridge = 0.28 * f * f * (0.4 + 0.6 * ctx.noise.ridged(pos, 6.0, 3));
            e += ridge;
            debug.ridge[r] = ridge;
        }

        // Fracture zones cut linear scars across the ridge flanks.
        let df = ctx.dist.fracture[r];
        if df.is_finite() && df < 2.5 {
            e -= 0.05 * (1.0 - df / 2.5);
        }

        // Trench along convergent margins, deepening with stress.
        let dtr = ctx.dist.trench[r];
        if dtr.is_finite() && dtr < 2.0 {
            let t = (-0.15 - 0.15 * stress.min(1.0)) * (1.0 - dtr / 2.0);
            e += t;
            debug.trench[r] = t;
        }

        // Back-arc basin deepening behind island arcs.
        let db = ctx.dist.backarc[r];
        if db.is_finite() {
            e -= 0.07 * (-0.5 * ((db - 3.0) / 1.5) * ((db - 3.0) / 1.5)).exp();
        }

        // Low-amplitude abyssal texture.
        e += ctx.noise.warped_fbm(pos, 3.0, 4, 0.25) * ctx.n_mag;

        elevation[r] = e;
    }
}

/// Piecewise graben cross-section: sunken axis, rising floor, raised
/// shoulders, smooth fadeout.
fn graben_profile(d: f32, ridged: f32) -> f32 {
    if d <= 0.5 {
        -0.15 + 0.05 * ridged
    } else if d <= 2.5 {
        lerp(-0.15, 0.03, (d - 0.5) / 2.0)
    } else if d <= 3.5 {
        0.03
    } else {
        0.03 * (1.0 - smoothstep(3.5, 6.0, d))
    }
}

/// Per-plate tectonic activity in [0, 1]: mean propagated stress over the
/// plate's cells, saturated early.
fn plate_activity(ctx: &LayerCtx<'_>) -> Vec<f32> {
    let num_plates = ctx.plates.num_plates();
    let mut sum = vec![0.0f64; num_plates];
    let mut count = vec![0u32; num_plates];
    for r in 0..ctx.mesh.num_regions {
        let p = ctx.plates.plate_of[r] as usize;
        sum[p] += ctx.col.stress[r] as f64;
        count[p] += 1;
    }
    (0..num_plates)
        .map(|p| ((sum[p] / count[p].max(1) as f64) as f32 * 8.0).min(1.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graben_axis_is_sunken_and_shoulders_raised() {
        let axis = graben_profile(0.0, 0.5);
        assert!(axis < -0.10, "graben axis should sit below -0.10, got {axis}");
        let shoulder = graben_profile(3.0, 0.5);
        assert!(shoulder > 0.0, "graben shoulder should be raised, got {shoulder}");
        let far = graben_profile(7.0, 0.5);
        assert!(far.abs() < 1e-6, "graben should fade out, got {far}");
    }

    #[test]
    fn graben_profile_is_continuous() {
        // No jumps larger than what one step of the piecewise ramp allows.
        let mut prev = graben_profile(0.0, 0.0);
        let mut d = 0.05f32;
        while d < 8.0 {
            let v = graben_profile(d, 0.0);
            assert!((v - prev).abs() < 0.03, "jump at d={d}: {prev} -> {v}");
            prev = v;
            d += 0.05;
        }
    }
}

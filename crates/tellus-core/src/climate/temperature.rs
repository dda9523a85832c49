//! Seasonal temperature synthesis: an ITCZ-anchored baseline, lapse-rate
//! cooling, ocean-current warmth, cloud moderation, and a maritime factor
//! that damps seasonal swings near the sea. Output is normalized to [0, 1]
//! over the -45..+45 C display range.

use crate::climate::currents::CurrentField;
use crate::climate::itcz::ItczCurve;
use crate::climate::{ClimateCtx, Season};
use crate::fields::{elevation_to_km, laplacian_smooth, laplacian_smooth_masked, smoothstep};
use crate::mesh::Mesh;

const LAPSE_C_PER_KM: f32 = 6.5;
const DISPLAY_MIN_C: f32 = -45.0;
const DISPLAY_RANGE_C: f32 = 90.0;

pub fn temperature(
    ctx: &ClimateCtx<'_>,
    itcz: &ItczCurve,
    currents: &CurrentField,
    precip: &[f32],
    season: Season,
) -> Vec<f32> {
    let mesh = ctx.mesh;
    let n = mesh.num_regions;
    let sign = season.hemisphere_sign();
    let coastal_warmth = diffuse_coastal_warmth(mesh, ctx, currents);

    let mut temp = Vec::with_capacity(n);
    for r in 0..n {
        let pos = mesh.positions[r];
        let lat = pos.latitude_deg() as f32;
        let lon = pos.longitude_deg();
        let km = elevation_to_km(ctx.elevation[r]);

        // Baseline: the land-warped ITCZ rules the tropics, a fixed +-5
        // degree ITCZ rules the poles (far from land the warp is noise).
        let t_warped = itcz_baseline((lat - itcz.lat_at(lon)).abs());
        let t_fixed = itcz_baseline((lat - 5.0 * sign).abs());
        let polar_blend = smoothstep(45.0, 90.0, lat.abs());
        let mut t = t_warped * (1.0 - polar_blend) + t_fixed * polar_blend;

        // Lapse-rate cooling with height.
        t -= LAPSE_C_PER_KM * km;

        // Ocean warmth: currents carry heat; fast currents carry more.
        if ctx.ocean[r] {
            t += currents.warmth[r] * (2.0 * currents.speed[r]).min(1.0) * 10.0;
        } else {
            let fence = 1.0 - smoothstep(0.0, 0.8, ctx.cont.plate[r]);
            t += coastal_warmth[r] * fence * 12.0;
        }

        // Cloud moderation: wet cells trend mild, bone-dry cells swing hard.
        let p = precip[r];
        if p > 0.5 {
            t *= 1.0 - smoothstep(0.5, 1.0, p) * 0.15;
        } else if p < 0.3 {
            t *= 1.0 + smoothstep(0.3, 0.0, p) * 0.15;
        }

        // Maritime factor: scale the seasonal deviation from the annual
        // baseline by continentality.
        let t_annual = itcz_baseline(lat.abs()) - LAPSE_C_PER_KM * km;
        t = t_annual + (t - t_annual) * (0.35 + 0.85 * ctx.cont.actual[r]);

        temp.push(t);
    }

    laplacian_smooth(mesh, &mut temp, 1, 0.5);

    for t in &mut temp {
        *t = ((*t - DISPLAY_MIN_C) / DISPLAY_RANGE_C).clamp(0.0, 1.0);
    }
    temp
}

/// 27 C at the convergence zone, falling toward the poles.
fn itcz_baseline(itcz_dist_deg: f32) -> f32 {
    27.0 - 55.0 * ((itcz_dist_deg - 11.0).max(0.0) / 79.0).powf(1.5)
}

/// Ocean warmth diffused a short way onto coastal land. Deep interiors
/// (plate continentality >= 0.8) are fenced out so the diffusion cannot
/// tunnel warmth across a continent.
fn diffuse_coastal_warmth(mesh: &Mesh, ctx: &ClimateCtx<'_>, currents: &CurrentField) -> Vec<f32> {
    let n = mesh.num_regions;
    let mut field = vec![0.0f32; n];
    let mut mask = vec![false; n];
    for r in 0..n {
        if ctx.ocean[r] {
            field[r] = currents.warmth[r];
        }
        mask[r] = ctx.ocean[r] || ctx.cont.plate[r] < 0.8;
    }
    laplacian_smooth_masked(mesh, &mut field, &mask, 8, 0.5);
    // Only the land part is consumed; keep it bounded.
    for v in &mut field {
        *v = v.clamp(-1.0, 1.0);
    }
    field
}

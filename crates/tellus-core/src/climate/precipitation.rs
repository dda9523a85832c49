//! Seasonal precipitation: a physical model (wind convergence + upwind
//! moisture advection + mechanism stack) blended 50/50 with a zonal
//! heuristic, then normalized by the 95th percentile.

use crate::climate::currents::CurrentField;
use crate::climate::itcz::ItczCurve;
use crate::climate::wind::WindField;
use crate::climate::{ClimateCtx, Season};
use crate::fields::{elevation_to_km, laplacian_smooth, lerp, normalize_p95, smoothstep};
use crate::sphere::Vec3;

pub fn precipitation(
    ctx: &ClimateCtx<'_>,
    itcz: &ItczCurve,
    wind: &WindField,
    currents: &CurrentField,
    season: Season,
) -> Vec<f32> {
    let physical = physical_model(ctx, itcz, wind, currents);
    let zonal = zonal_model(ctx, itcz, season);

    let n = ctx.mesh.num_regions;
    let mut precip: Vec<f32> = (0..n).map(|r| 0.5 * physical[r] + 0.5 * zonal[r]).collect();
    normalize_p95(&mut precip);
    for p in &mut precip {
        *p = p.clamp(0.0, 1.0);
    }
    precip
}

// ── Physical model ────────────────────────────────────────────────────────────

fn physical_model(
    ctx: &ClimateCtx<'_>,
    itcz: &ItczCurve,
    wind: &WindField,
    currents: &CurrentField,
) -> Vec<f32> {
    let mesh = ctx.mesh;
    let n = mesh.num_regions;
    let avg_edge_km = mesh.avg_edge_km();

    // 3-D wind vectors from the tangent components.
    let wvec: Vec<Vec3> = (0..n)
        .map(|r| {
            ctx.frames.east[r]
                .scale(wind.east[r] as f64)
                .add(ctx.frames.north[r].scale(wind.north[r] as f64))
        })
        .collect();

    // ── Wind convergence ────────────────────────────────────────────────────
    let mut convergence = vec![0.0f32; n];
    for r in 0..n {
        let nbs = mesh.neighbors(r);
        if nbs.is_empty() {
            continue;
        }
        let mut sum = 0.0f64;
        for &nb in nbs {
            let nb = nb as usize;
            let dir = mesh.positions[nb].sub(mesh.positions[r]).normalize();
            sum += wvec[nb].dot(dir) - wvec[r].dot(dir);
        }
        convergence[r] = (sum / nbs.len() as f64) as f32;
    }
    let conv_passes = ((600.0 / avg_edge_km).round() as usize).clamp(1, 12);
    laplacian_smooth(mesh, &mut convergence, conv_passes, 0.5);
    let conv_scale = convergence.iter().fold(0.0f32, |m, &c| m.max(c.abs())).max(1e-6);

    // ── Moisture advection ──────────────────────────────────────────────────
    let moisture = advect_moisture(ctx, &wvec, currents, avg_edge_km);

    // ── Mechanisms ──────────────────────────────────────────────────────────
    let mut out = vec![0.0f32; n];
    for r in 0..n {
        let pos = mesh.positions[r];
        let lat = pos.latitude_deg() as f32;
        let lat_abs = lat.abs();
        let itcz_dist = (lat - itcz.lat_at(pos.longitude_deg())).abs();
        let km = elevation_to_km(ctx.elevation[r]);
        let pressure = wind.pressure[r];
        let mut p = moisture[r];

        // ITCZ uplift: deep convection within +-15 degrees of the trough.
        if itcz_dist < 15.0 {
            p *= 1.0 + 1.2 * (1.0 - itcz_dist / 15.0).powf(1.5);
        }

        // Convergence lifts moist air.
        let conv = (convergence[r] / conv_scale).max(0.0);
        p *= 1.0 + 0.8 * conv;

        // Orographic: windward slopes wring moisture out, lee sides dry.
        let (rise, fall) = upwind_height_change(ctx, &wvec, r, km);
        p *= 1.0 + (0.8 * rise).min(1.0);
        p *= 1.0 - (0.5 * fall).min(0.7); // foehn

        // Subtropical suppression under the highs.
        let band = smoothstep(15.0, 25.0, lat_abs) * (1.0 - smoothstep(35.0, 45.0, lat_abs));
        p *= 1.0 - 0.7 * band * smoothstep(1016.0, 1028.0, pressure);

        // Polar front: storm tracks, strongest near coasts.
        if lat_abs > 40.0 {
            let pf = (-0.5 * ((lat_abs - 55.0) / 10.0) * ((lat_abs - 55.0) / 10.0)).exp();
            p += 0.25 * pf * (0.3 + 0.7 * (1.0 - ctx.cont.actual[r]));
        }

        // Continental interiors dry out.
        p *= 1.0 - 0.55 * smoothstep(0.3, 0.9, ctx.cont.actual[r]);

        // Lee cyclogenesis: a moist zone downwind of mid-latitude barriers.
        let westerly_band = smoothstep(35.0, 40.0, lat_abs) * (1.0 - smoothstep(55.0, 60.0, lat_abs));
        p += 0.1 * fall.min(1.0) * westerly_band;

        // Ocean baseline, suppressed under anticyclones.
        if ctx.ocean[r] {
            p = p.max(0.15 * (1.0 - smoothstep(1016.0, 1030.0, pressure)));
        }

        out[r] = p.max(0.0);
    }

    let passes = ((100.0 / avg_edge_km).round() as usize).clamp(1, 3);
    laplacian_smooth(mesh, &mut out, passes, 0.5);
    out
}

/// Seed moisture over ocean (warm water evaporates more) and on onshore
/// coasts, then advect it inland along the wind for `max_hops` sweeps with
/// per-hop depletion plus an orographic-gain term.
fn advect_moisture(
    ctx: &ClimateCtx<'_>,
    wvec: &[Vec3],
    currents: &CurrentField,
    avg_edge_km: f64,
) -> Vec<f32> {
    let mesh = ctx.mesh;
    let n = mesh.num_regions;
    let max_hops = ((2000.0 / avg_edge_km).round() as usize).clamp(8, 20);
    let base_depletion = 1.0 - 0.78f32.powf(1.0 / max_hops as f32);

    let mut moisture = vec![0.0f32; n];
    for r in 0..n {
        if ctx.ocean[r] {
            moisture[r] = 0.4 + 0.35 * currents.warmth[r].max(0.0);
        }
    }
    // Coastal land seeds: onshore flow delivers, offshore flow starves.
    for r in 0..n {
        if ctx.ocean[r] {
            continue;
        }
        let mut warmth_sum = 0.0f32;
        let mut count = 0u32;
        let mut onshore = false;
        for &nb in mesh.neighbors(r) {
            let nb = nb as usize;
            if !ctx.ocean[nb] {
                continue;
            }
            count += 1;
            warmth_sum += currents.warmth[nb];
            let dir = mesh.positions[r].sub(mesh.positions[nb]).normalize();
            if wvec[nb].dot(dir) > 0.0 {
                onshore = true;
            }
        }
        if count > 0 {
            let factor = if onshore { 1.0 } else { 0.25 };
            moisture[r] = factor * (0.5 + 0.5 * warmth_sum / count as f32);
        }
    }

    let km: Vec<f32> = ctx.elevation.iter().map(|&e| elevation_to_km(e)).collect();
    let mut next = moisture.clone();
    for _ in 0..max_hops {
        for r in 0..n {
            if ctx.ocean[r] {
                continue;
            }
            let mut wsum = 0.0f32;
            let mut msum = 0.0f32;
            for &nb in mesh.neighbors(r) {
                let nb = nb as usize;
                let dir = mesh.positions[r].sub(mesh.positions[nb]).normalize();
                let w = wvec[nb].dot(dir).max(0.0) as f32;
                if w <= 0.0 {
                    continue;
                }
                let gain = (km[r] - km[nb]).max(0.0);
                let depletion = base_depletion + (0.55 * gain * max_hops as f32).min(0.8);
                wsum += w;
                msum += w * moisture[nb] * (1.0 - depletion);
            }
            if wsum > 0.0 {
                next[r] = moisture[r].max(msum / wsum);
            }
        }
        moisture.copy_from_slice(&next);
    }
    moisture
}

/// Height gained (and lost) along the upwind direction at `r`, in km.
fn upwind_height_change(ctx: &ClimateCtx<'_>, wvec: &[Vec3], r: usize, km_r: f32) -> (f32, f32) {
    let mut rise = 0.0f32;
    let mut fall = 0.0f32;
    for &nb in ctx.mesh.neighbors(r) {
        let nb = nb as usize;
        let dir = ctx.mesh.positions[r].sub(ctx.mesh.positions[nb]).normalize();
        let w = wvec[nb].dot(dir).max(0.0) as f32;
        if w <= 0.0 {
            continue;
        }
        let km_nb = elevation_to_km(ctx.elevation[nb]);
        rise += (km_r - km_nb).max(0.0) * w;
        fall += (km_nb - km_r).max(0.0) * w;
    }
    (rise, fall)
}

// ── Zonal heuristic ───────────────────────────────────────────────────────────

fn zonal_model(ctx: &ClimateCtx<'_>, itcz: &ItczCurve, season: Season) -> Vec<f32> {
    let mesh = ctx.mesh;
    let n = mesh.num_regions;
    let sign = season.hemisphere_sign();
    let mut out = vec![0.0f32; n];

    for r in 0..n {
        let pos = mesh.positions[r];
        let lat = pos.latitude_deg() as f32;
        let itcz_dist = (lat - itcz.lat_at(pos.longitude_deg())).abs();
        let mut p = zonal_base(itcz_dist);

        // Summer hemisphere runs ~10% wetter.
        p *= if lat * sign >= 0.0 { 1.1 } else { 0.9 };

        if !ctx.ocean[r] {
            // Continental dryness.
            p *= 1.0 - 0.7 * smoothstep(0.2, 1.0, ctx.cont.actual[r]);
            // Rain shadow under idealized zonal winds.
            if upwind_barrier(ctx, r, lat) {
                p *= 0.45;
            }
            // Hard cutoff: moisture cannot cross 2-3000 km of land.
            p *= 1.0 - smoothstep(2000.0, 3000.0, ctx.coast_km[r]);
        }
        out[r] = p;
    }
    out
}

/// Idealized zonal precipitation by distance from the ITCZ.
fn zonal_base(itcz_dist: f32) -> f32 {
    if itcz_dist < 10.0 {
        lerp(1.0, 0.6, itcz_dist / 10.0)
    } else if itcz_dist < 25.0 {
        lerp(0.6, 0.02, (itcz_dist - 10.0) / 15.0)
    } else if itcz_dist < 45.0 {
        lerp(0.02, 0.5, (itcz_dist - 25.0) / 20.0)
    } else if itcz_dist < 65.0 {
        lerp(0.5, 0.3, (itcz_dist - 45.0) / 20.0)
    } else {
        lerp(0.3, 0.1, ((itcz_dist - 65.0) / 25.0).min(1.0))
    }
}

/// Walk a few cells upwind (idealized zonal flow) looking for a barrier at
/// least 400 m higher than this cell.
fn upwind_barrier(ctx: &ClimateCtx<'_>, r: usize, lat: f32) -> bool {
    // Trades and polar easterlies arrive from the east, westerlies from the
    // west.
    let band = lat.abs();
    let from_east = !(30.0..60.0).contains(&band);
    let upwind_sign = if from_east { 1.0 } else { -1.0 };

    let km_here = elevation_to_km(ctx.elevation[r]);
    let mut cur = r;
    for _ in 0..3 {
        let mut best: Option<(f64, usize)> = None;
        for &nb in ctx.mesh.neighbors(cur) {
            let nb = nb as usize;
            let dir = ctx.mesh.positions[nb].sub(ctx.mesh.positions[cur]).normalize();
            let along = dir.dot(ctx.frames.east[cur]) * upwind_sign;
            if best.map_or(true, |(b, _)| along > b) {
                best = Some((along, nb));
            }
        }
        let Some((along, nb)) = best else {
            return false;
        };
        if along <= 0.2 {
            return false;
        }
        cur = nb;
        if elevation_to_km(ctx.elevation[cur]) - km_here > 0.4 {
            return true;
        }
    }
    false
}

//! Rule-based seasonal ocean currents: latitude-band zonal flow, coastal
//! deflection into gyres, a circumpolar override where an unbroken channel
//! exists, and the signed warmth field that feeds moisture and temperature.

use crate::climate::continentality::largest_component;
use crate::climate::frames::TangentFrames;
use crate::climate::Season;
use crate::fields::{laplacian_smooth_masked, lerp, normalize_p95, smoothstep};
use crate::mesh::Mesh;
use crate::sphere::Vec3;
use std::collections::VecDeque;

pub struct CurrentField {
    pub east: Vec<f32>,
    pub north: Vec<f32>,
    /// Magnitude in [0, 1] after seasonal normalization.
    pub speed: Vec<f32>,
    /// Signed warmth in [-1, 1]: +1 downwind of warm boundary currents.
    pub warmth: Vec<f32>,
}

/// Coast influence distance in cells.
fn coast_threshold(num_regions: usize) -> f32 {
    ((num_regions as f64).sqrt() * 0.035).round().max(5.0) as f32
}

pub fn ocean_currents(
    mesh: &Mesh,
    frames: &TangentFrames,
    ocean: &[bool],
    season: Season,
) -> CurrentField {
    let n = mesh.num_regions;
    if !ocean.iter().any(|&o| o) {
        // Landlocked world: no currents, no warmth.
        return CurrentField {
            east: vec![0.0; n],
            north: vec![0.0; n],
            speed: vec![0.0; n],
            warmth: vec![0.0; n],
        };
    }

    let sign = season.hemisphere_sign();
    let ct = coast_threshold(n);
    let warmth_range = 2.0 * ct;

    // ── Coast fields through ocean cells ────────────────────────────────────
    let (west_seeds, east_seeds) = classify_coast_seeds(mesh, frames, ocean);
    let west_dist = ocean_bfs(mesh, ocean, &west_seeds, warmth_range + 1.0);
    let east_dist = ocean_bfs(mesh, ocean, &east_seeds, warmth_range + 1.0);

    // ── Circumpolar channels ────────────────────────────────────────────────
    let open = largest_component(mesh, ocean);
    let channel_north = circumpolar_channel(mesh, &open, 60.0);
    let channel_south = circumpolar_channel(mesh, &open, -60.0);
    log::debug!("circumpolar channel: north={channel_north} south={channel_south}");

    // ── Base zonal flow + coastal deflection ────────────────────────────────
    let mut east = vec![0.0f32; n];
    let mut north = vec![0.0f32; n];
    for r in 0..n {
        if !ocean[r] {
            continue;
        }
        let lat = mesh.positions[r].latitude_deg() as f32;
        let band_lat = (lat - 5.0 * sign).abs();
        let mut u = zonal_base(band_lat);
        let mut v = 0.0f32;
        let hemi = if lat >= 0.0 { 1.0 } else { -1.0 };

        // Western boundary currents turn poleward and strengthen.
        if west_dist[r] < ct {
            let f = 1.0 - west_dist[r] / ct;
            v += hemi * 2.0 * f * f;
            u *= 1.0 - 0.7 * f * f;
        }
        // Eastern boundary currents are weaker and equatorward.
        if east_dist[r] < ct {
            let f = 1.0 - east_dist[r] / ct;
            v -= hemi * 1.6 * f * f;
            u *= 1.0 - 0.35 * f * f;
        }

        // Circumpolar override: unbroken channel locks in a strong eastward
        // stream and flattens the meridional component.
        let channel = if lat >= 0.0 { channel_north } else { channel_south };
        if channel {
            let w = smoothstep(55.0, 60.0, lat.abs()) * (1.0 - smoothstep(70.0, 75.0, lat.abs()));
            u = lerp(u, 1.5, 0.8 * w);
            v *= 1.0 - 0.8 * w;
        }

        east[r] = u;
        north[r] = v;
    }

    laplacian_smooth_masked(mesh, &mut east, ocean, 5, 0.5);
    laplacian_smooth_masked(mesh, &mut north, ocean, 5, 0.5);

    // ── Warmth classification ───────────────────────────────────────────────
    let mut warmth = vec![0.0f32; n];
    for r in 0..n {
        if !ocean[r] {
            continue;
        }
        let lat = mesh.positions[r].latitude_deg() as f32;
        let band_lat = (lat - 5.0 * sign).abs();
        let cell_sign = warmth_cell_sign(band_lat);
        let mut w = 0.0f32;
        if west_dist[r] < warmth_range {
            let f = 1.0 - west_dist[r] / warmth_range;
            w += cell_sign * f * f;
        }
        if east_dist[r] < warmth_range {
            let f = 1.0 - east_dist[r] / warmth_range;
            w -= cell_sign * f * f;
        }
        warmth[r] = w.clamp(-1.0, 1.0);
    }
    laplacian_smooth_masked(mesh, &mut warmth, ocean, 10, 0.5);
    for w in &mut warmth {
        *w = w.clamp(-1.0, 1.0);
    }

    // ── Speed normalization ─────────────────────────────────────────────────
    let mut speed: Vec<f32> = (0..n)
        .map(|r| (east[r] * east[r] + north[r] * north[r]).sqrt())
        .collect();
    let p95 = normalize_p95(&mut speed);
    if p95 > 1e-9 {
        for r in 0..n {
            east[r] /= p95;
            north[r] /= p95;
            if speed[r] > 1.0 {
                east[r] /= speed[r];
                north[r] /= speed[r];
                speed[r] = 1.0;
            }
        }
    }

    CurrentField { east, north, speed, warmth }
}

/// Zonal current by season-shifted latitude band: trades run westward,
/// westerlies eastward, polar easterlies weakly westward.
fn zonal_base(band_lat: f32) -> f32 {
    if band_lat < 3.0 {
        -band_lat / 3.0
    } else if band_lat < 30.0 {
        -1.0
    } else if band_lat < 35.0 {
        lerp(-1.0, 1.0, (band_lat - 30.0) / 5.0)
    } else if band_lat < 58.0 {
        1.0
    } else if band_lat < 65.0 {
        lerp(1.0, -0.5, (band_lat - 58.0) / 7.0)
    } else {
        -0.5
    }
}

/// Which way a boundary current warms: +1 where trades/polar easterlies pile
/// warm water against west coasts, -1 in the westerlies.
fn warmth_cell_sign(band_lat: f32) -> f32 {
    if band_lat < 30.0 {
        1.0
    } else if band_lat < 35.0 {
        lerp(1.0, -1.0, (band_lat - 30.0) / 5.0)
    } else if band_lat < 58.0 {
        -1.0
    } else if band_lat < 65.0 {
        lerp(-1.0, 1.0, (band_lat - 58.0) / 7.0)
    } else {
        1.0
    }
}

/// Split coastal ocean cells into west-coast seeds (land lies to the west)
/// and east-coast seeds (land lies to the east).
fn classify_coast_seeds(
    mesh: &Mesh,
    frames: &TangentFrames,
    ocean: &[bool],
) -> (Vec<u32>, Vec<u32>) {
    let mut west = Vec::new();
    let mut east = Vec::new();
    for r in 0..mesh.num_regions {
        if !ocean[r] {
            continue;
        }
        let mut toward_land = Vec3::zero();
        let mut has_land = false;
        for &nb in mesh.neighbors(r) {
            let nb = nb as usize;
            if !ocean[nb] {
                toward_land = toward_land.add(mesh.positions[nb].sub(mesh.positions[r]));
                has_land = true;
            }
        }
        if !has_land || toward_land.length() < 1e-12 {
            continue;
        }
        let proj = toward_land.normalize().dot(frames.east[r]);
        if proj < -0.4 {
            west.push(r as u32);
        } else if proj > 0.4 {
            east.push(r as u32);
        }
    }
    (west, east)
}

/// Capped BFS hop distance through ocean cells.
fn ocean_bfs(mesh: &Mesh, ocean: &[bool], seeds: &[u32], cap: f32) -> Vec<f32> {
    let n = mesh.num_regions;
    let mut dist = vec![f32::INFINITY; n];
    let mut queue = VecDeque::new();
    for &s in seeds {
        if dist[s as usize].is_infinite() {
            dist[s as usize] = 0.0;
            queue.push_back(s);
        }
    }
    while let Some(r) = queue.pop_front() {
        let r = r as usize;
        if dist[r] >= cap {
            continue;
        }
        for &nb in mesh.neighbors(r) {
            let nb = nb as usize;
            if ocean[nb] && dist[nb].is_infinite() {
                dist[nb] = dist[r] + 1.0;
                queue.push_back(nb as u32);
            }
        }
    }
    dist
}

/// True when every one of 72 longitude bins inside the |lat -+ 60| <= 5 band
/// holds at least one open-ocean cell.
fn circumpolar_channel(mesh: &Mesh, open_ocean: &[bool], center_lat: f64) -> bool {
    let mut bins = [false; 72];
    for r in 0..mesh.num_regions {
        if !open_ocean[r] {
            continue;
        }
        let lat = mesh.positions[r].latitude_deg();
        if (lat - center_lat).abs() > 5.0 {
            continue;
        }
        let lon = mesh.positions[r].longitude_deg();
        let bin = (((lon + 180.0) / 5.0) as usize).min(71);
        bins[bin] = true;
    }
    bins.iter().all(|&b| b)
}

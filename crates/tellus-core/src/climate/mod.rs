//! Climate pipeline: geographic index, seasonal ITCZ, pressure, geostrophic
//! wind, ocean currents, precipitation, and temperature.
//!
//! Stages E through H run from the final elevation downward; each season is
//! computed independently from the same shared context (and in parallel
//! under the `threading` feature, which changes nothing about the output).

pub mod continentality;
pub mod currents;
pub mod frames;
pub mod geo_index;
pub mod itcz;
pub mod precipitation;
pub mod pressure;
pub mod temperature;
pub mod wind;

use crate::error::GenError;
use crate::mesh::Mesh;
use crate::noise_field::NoiseField;
use continentality::{compute_continentality, Continentality};
use frames::{tangent_frames, TangentFrames};
use geo_index::GeoIndex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Summer,
    Winter,
}

impl Season {
    pub const BOTH: [Season; 2] = [Season::Summer, Season::Winter];

    /// +1 for northern-hemisphere summer, -1 for northern-hemisphere winter.
    pub fn hemisphere_sign(self) -> f32 {
        match self {
            Season::Summer => 1.0,
            Season::Winter => -1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Season::Summer => "summer",
            Season::Winter => "winter",
        }
    }
}

/// A pair of per-season values with identical shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seasonal<T> {
    pub summer: T,
    pub winter: T,
}

impl<T> Seasonal<T> {
    pub fn get(&self, season: Season) -> &T {
        match season {
            Season::Summer => &self.summer,
            Season::Winter => &self.winter,
        }
    }
}

/// Shared read-only inputs for every seasonal computation.
pub struct ClimateCtx<'a> {
    pub mesh: &'a Mesh,
    pub elevation: &'a [f32],
    /// The ocean classification captured by the elevation stage before
    /// coastal roughening; all coast-derived seeds use this mask.
    pub ocean: &'a [bool],
    pub noise: &'a NoiseField,
    pub frames: &'a TangentFrames,
    pub geo: &'a GeoIndex,
    pub cont: &'a Continentality,
    /// Kilometres of land between each cell and the nearest ocean.
    pub coast_km: &'a [f32],
}

/// All seasonal climate outputs plus the shared continentality fields.
#[derive(Debug, Clone, Serialize)]
pub struct ClimateFields {
    pub pressure: Seasonal<Vec<f32>>,
    pub wind_east: Seasonal<Vec<f32>>,
    pub wind_north: Seasonal<Vec<f32>>,
    pub wind_speed: Seasonal<Vec<f32>>,
    pub current_east: Seasonal<Vec<f32>>,
    pub current_north: Seasonal<Vec<f32>>,
    pub current_speed: Seasonal<Vec<f32>>,
    pub ocean_warmth: Seasonal<Vec<f32>>,
    pub precipitation: Seasonal<Vec<f32>>,
    pub temperature: Seasonal<Vec<f32>>,
    /// ITCZ latitude per integer longitude (360 entries).
    pub itcz: Seasonal<Vec<f32>>,
    pub continentality: Vec<f32>,
    pub plate_continentality: Vec<f32>,
}

struct SeasonOut {
    pressure: Vec<f32>,
    wind_east: Vec<f32>,
    wind_north: Vec<f32>,
    wind_speed: Vec<f32>,
    current_east: Vec<f32>,
    current_north: Vec<f32>,
    current_speed: Vec<f32>,
    warmth: Vec<f32>,
    precipitation: Vec<f32>,
    temperature: Vec<f32>,
    itcz: Vec<f32>,
}

/// Run stages E-H for both seasons.
pub fn simulate_climate(
    mesh: &Mesh,
    elevation: &[f32],
    ocean: &[bool],
    plate_ocean: &[bool],
    noise: &NoiseField,
) -> Result<ClimateFields, GenError> {
    let n = mesh.num_regions;
    if elevation.len() != n || ocean.len() != n || plate_ocean.len() != n {
        return Err(GenError::invariant("climate input lengths do not match mesh".to_string()));
    }

    let frames = tangent_frames(mesh);
    let geo = GeoIndex::build(mesh, elevation, ocean);
    let cont = compute_continentality(mesh, ocean, plate_ocean);
    let coast_km = coast_distance_km(mesh, ocean);
    let ctx = ClimateCtx {
        mesh,
        elevation,
        ocean,
        noise,
        frames: &frames,
        geo: &geo,
        cont: &cont,
        coast_km: &coast_km,
    };

    #[cfg(feature = "threading")]
    let (summer, winter) = rayon::join(
        || season_fields(&ctx, Season::Summer),
        || season_fields(&ctx, Season::Winter),
    );
    #[cfg(not(feature = "threading"))]
    let (summer, winter) = (
        season_fields(&ctx, Season::Summer),
        season_fields(&ctx, Season::Winter),
    );

    log::info!(
        "climate: both seasons done, summer precip p95 cell count {}",
        summer.precipitation.iter().filter(|&&p| p >= 0.95).count()
    );

    Ok(ClimateFields {
        pressure: Seasonal { summer: summer.pressure, winter: winter.pressure },
        wind_east: Seasonal { summer: summer.wind_east, winter: winter.wind_east },
        wind_north: Seasonal { summer: summer.wind_north, winter: winter.wind_north },
        wind_speed: Seasonal { summer: summer.wind_speed, winter: winter.wind_speed },
        current_east: Seasonal { summer: summer.current_east, winter: winter.current_east },
        current_north: Seasonal { summer: summer.current_north, winter: winter.current_north },
        current_speed: Seasonal { summer: summer.current_speed, winter: winter.current_speed },
        ocean_warmth: Seasonal { summer: summer.warmth, winter: winter.warmth },
        precipitation: Seasonal { summer: summer.precipitation, winter: winter.precipitation },
        temperature: Seasonal { summer: summer.temperature, winter: winter.temperature },
        itcz: Seasonal { summer: summer.itcz, winter: winter.itcz },
        continentality: cont.actual,
        plate_continentality: cont.plate,
    })
}

fn season_fields(ctx: &ClimateCtx<'_>, season: Season) -> SeasonOut {
    let itcz_curve = itcz::compute_itcz(ctx.geo, season);
    let pressure_field = pressure::pressure_field(
        ctx.mesh,
        ctx.geo,
        &itcz_curve,
        &ctx.cont.actual,
        ctx.elevation,
        ctx.noise,
        season,
    );
    let wind = wind::wind_field(ctx.mesh, ctx.frames, pressure_field);
    let cur = currents::ocean_currents(ctx.mesh, ctx.frames, ctx.ocean, season);
    let precip = precipitation::precipitation(ctx, &itcz_curve, &wind, &cur, season);
    let temp = temperature::temperature(ctx, &itcz_curve, &cur, &precip, season);

    SeasonOut {
        pressure: wind.pressure,
        wind_east: wind.east,
        wind_north: wind.north,
        wind_speed: wind.speed,
        current_east: cur.east,
        current_north: cur.north,
        current_speed: cur.speed,
        warmth: cur.warmth,
        precipitation: precip,
        temperature: temp,
        itcz: itcz_curve.table().to_vec(),
    }
}

/// Kilometres of land between each cell and the nearest ocean cell.
fn coast_distance_km(mesh: &Mesh, ocean: &[bool]) -> Vec<f32> {
    let n = mesh.num_regions;
    let avg_edge_km = mesh.avg_edge_km() as f32;
    let mut hops = vec![f32::INFINITY; n];
    let mut queue = VecDeque::new();
    for r in 0..n {
        if !ocean[r] && mesh.neighbors(r).iter().any(|&nb| ocean[nb as usize]) {
            hops[r] = 0.0;
            queue.push_back(r);
        }
    }
    while let Some(r) = queue.pop_front() {
        for &nb in mesh.neighbors(r) {
            let nb = nb as usize;
            if !ocean[nb] && hops[nb].is_infinite() {
                hops[nb] = hops[r] + 1.0;
                queue.push_back(nb);
            }
        }
    }
    (0..n)
        .map(|r| {
            if ocean[r] {
                0.0
            } else if hops[r].is_infinite() {
                // Landlocked world: effectively infinite distance.
                f32::MAX / 2.0
            } else {
                hops[r] * avg_edge_km
            }
        })
        .collect()
}

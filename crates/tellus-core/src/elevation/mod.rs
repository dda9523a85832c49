//! Elevation assignment: collision detection, stress propagation, distance
//! fields, layered composition, coastal roughening, island arcs, hotspot
//! chains, and peak compression.
//!
//! The stage consumes the retained plate state and is re-run wholesale on a
//! plate toggle edit; everything here is deterministic in `(mesh, seed,
//! plates, n_mag)`.

pub mod arcs;
pub mod coastal;
pub mod collision;
pub mod distance;
pub mod hotspots;
pub mod layers;

use crate::error::GenError;
use crate::mesh::Mesh;
use crate::noise_field::NoiseField;
use crate::plates::PlateSimulation;
use collision::{
    detect_collisions, propagate_stress, CollisionField, BOUNDARY_CONVERGENT, BOUNDARY_DIVERGENT,
    BOUNDARY_TRANSFORM,
};
use distance::{bfs_distance_capped, random_fill_distance};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

const SALT_DISTANCES: u64 = 0x7E11_05C3_0000_0004;
const SALT_HOTSPOTS: u64 = 0x7E11_05D4_0000_0005;

/// All distance fields the layer stack reads. Hop counts; `INFINITY` where
/// a field never reaches.
pub struct Distances {
    pub mountain: Vec<f32>,
    pub ocean: Vec<f32>,
    pub coastline: Vec<f32>,
    /// Distance from the plate-class coast, through ocean cells.
    pub coast_ocean: Vec<f32>,
    /// Distance from the plate-class coast, through land cells.
    pub coast_land: Vec<f32>,
    pub rift: Vec<f32>,
    pub ridge: Vec<f32>,
    pub fracture: Vec<f32>,
    pub backarc: Vec<f32>,
    pub arc: Vec<f32>,
    pub trench: Vec<f32>,
}

/// Each elevation sub-contribution, exposed for visualization.
#[derive(Debug, Clone, Serialize)]
pub struct DebugLayers {
    pub base: Vec<f32>,
    pub stress_uplift: Vec<f32>,
    pub graben: Vec<f32>,
    pub terrain_noise: Vec<f32>,
    pub interior: Vec<f32>,
    pub ocean_profile: Vec<f32>,
    pub ridge: Vec<f32>,
    pub trench: Vec<f32>,
    pub coastal: Vec<f32>,
    pub island_arcs: Vec<f32>,
    pub hotspots: Vec<f32>,
}

impl DebugLayers {
    pub fn zeroed(n: usize) -> Self {
        Self {
            base: vec![0.0; n],
            stress_uplift: vec![0.0; n],
            graben: vec![0.0; n],
            terrain_noise: vec![0.0; n],
            interior: vec![0.0; n],
            ocean_profile: vec![0.0; n],
            ridge: vec![0.0; n],
            trench: vec![0.0; n],
            coastal: vec![0.0; n],
            island_arcs: vec![0.0; n],
            hotspots: vec![0.0; n],
        }
    }
}

/// Output of the elevation stage.
pub struct ElevationField {
    pub elevation: Vec<f32>,
    pub stress: Vec<f32>,
    pub boundary_type: Vec<u8>,
    pub subduct_factor: Vec<f32>,
    pub mountain_r: Vec<bool>,
    pub coastline_r: Vec<bool>,
    pub ocean_r: Vec<bool>,
    /// Ocean classification (elevation < 0) captured before coastal
    /// roughening; the climate stages seed their coast fields from this so
    /// scattered islands do not shift current seeds.
    pub ocean_before_roughening: Vec<bool>,
    pub debug: DebugLayers,
}

/// Run the full elevation stage.
pub fn assign_elevation(
    mesh: &Mesh,
    plates: &PlateSimulation,
    noise: &NoiseField,
    seed: u64,
    n_mag: f32,
) -> Result<ElevationField, GenError> {
    if !(0.0..=1.0).contains(&n_mag) {
        return Err(GenError::invalid(format!("noise magnitude {n_mag} outside [0, 1]")));
    }
    let n = mesh.num_regions;
    let mut debug = DebugLayers::zeroed(n);

    // ── Collisions and stress ───────────────────────────────────────────────
    let mut col = detect_collisions(mesh, plates, noise, seed);
    let sf = col.subduct_factor.clone();
    propagate_stress(mesh, &plates.plate_of, &sf, &mut col.stress);

    // ── Distance fields ─────────────────────────────────────────────────────
    let mut rng = StdRng::seed_from_u64(seed ^ SALT_DISTANCES);
    let dist = compute_distances(mesh, plates, &col, &mut rng);

    // ── Layered composition ─────────────────────────────────────────────────
    let ctx = layers::LayerCtx { mesh, plates, col: &col, dist: &dist, noise, n_mag };
    let mut elevation = layers::base_elevation(&ctx);
    debug.base.copy_from_slice(&elevation);
    layers::apply_land_layers(&ctx, &mut elevation, &mut debug);
    layers::apply_ocean_layers(&ctx, &mut elevation, &mut debug);

    // Downstream classifications are captured before roughening adds
    // islands; the climate stages rely on this ordering.
    let ocean_before_roughening: Vec<bool> = elevation.iter().map(|&e| e < 0.0).collect();

    coastal::roughen_coasts(mesh, noise, &col.stress, &dist.trench, &mut elevation, &mut debug);
    arcs::raise_island_arcs(mesh, noise, &dist.arc, &mut elevation, &mut debug);

    let mut hotspot_rng = StdRng::seed_from_u64(seed ^ SALT_HOTSPOTS);
    hotspots::apply_hotspots(mesh, plates, noise, &mut elevation, &mut hotspot_rng, &mut debug);

    // Peak compression softens the tallest summits.
    for e in &mut elevation {
        if *e > 0.0 {
            *e = e.powf(0.9);
        }
    }

    log::info!(
        "elevation: {} land / {} ocean cells, peak {:.3}",
        elevation.iter().filter(|&&e| e >= 0.0).count(),
        elevation.iter().filter(|&&e| e < 0.0).count(),
        elevation.iter().cloned().fold(f32::MIN, f32::max),
    );

    Ok(ElevationField {
        elevation,
        stress: col.stress,
        boundary_type: col.boundary_type,
        subduct_factor: col.subduct_factor,
        mountain_r: col.mountain,
        coastline_r: col.coastline,
        ocean_r: col.ocean_floor,
        ocean_before_roughening,
        debug,
    })
}

/// Build all distance fields. The five organic fields use random-fill BFS
/// from one shared RNG (the fill order is part of the output contract); the
/// narrow feature bands use plain capped BFS.
fn compute_distances(
    mesh: &Mesh,
    plates: &PlateSimulation,
    col: &CollisionField,
    rng: &mut StdRng,
) -> Distances {
    let n = mesh.num_regions;
    let collect = |mask: &dyn Fn(usize) -> bool| -> Vec<u32> {
        (0..n as u32).filter(|&r| mask(r as usize)).collect()
    };

    let mountain_seeds = collect(&|r| col.mountain[r]);
    let ocean_seeds = collect(&|r| col.ocean_floor[r]);
    let coast_seeds = collect(&|r| col.coastline[r]);

    let region_ocean = |r: usize| plates.region_on_ocean_plate(r);
    let land_mask: Vec<bool> = (0..n).map(|r| !region_ocean(r)).collect();
    let ocean_mask: Vec<bool> = (0..n).map(region_ocean).collect();

    // Plate-class coast seeds, one set per side of the waterline.
    let open_coast_seeds = collect(&|r| {
        region_ocean(r) && mesh.neighbors(r).iter().any(|&nb| !region_ocean(nb as usize))
    });
    let land_coast_seeds = collect(&|r| {
        !region_ocean(r) && mesh.neighbors(r).iter().any(|&nb| region_ocean(nb as usize))
    });

    // Stop set for the coastline field: mountain and ocean-floor features.
    let coast_stop: Vec<bool> = (0..n).map(|r| col.mountain[r] || col.ocean_floor[r]).collect();

    let mountain = random_fill_distance(mesh, &mountain_seeds, None, rng);
    let ocean = random_fill_distance(mesh, &ocean_seeds, None, rng);
    let coastline = random_fill_distance(mesh, &coast_seeds, Some(&coast_stop), rng);
    let coast_ocean = random_fill_distance(mesh, &open_coast_seeds, Some(&land_mask), rng);
    let coast_land = random_fill_distance(mesh, &land_coast_seeds, Some(&ocean_mask), rng);

    // Tectonic feature bands.
    let diff_plate_nb = |r: usize, want_ocean: bool| {
        mesh.neighbors(r).iter().any(|&nb| {
            plates.plate_of[nb as usize] != plates.plate_of[r]
                && region_ocean(nb as usize) == want_ocean
        })
    };
    let rift_seeds = collect(&|r| {
        col.boundary_type[r] == BOUNDARY_DIVERGENT && !region_ocean(r) && diff_plate_nb(r, false)
    });
    let ridge_seeds = collect(&|r| {
        col.boundary_type[r] == BOUNDARY_DIVERGENT && region_ocean(r) && diff_plate_nb(r, true)
    });
    let fracture_seeds = collect(&|r| {
        col.boundary_type[r] == BOUNDARY_TRANSFORM && region_ocean(r) && diff_plate_nb(r, true)
    });
    let arc_seeds = collect(&|r| {
        col.boundary_type[r] == BOUNDARY_CONVERGENT
            && region_ocean(r)
            && diff_plate_nb(r, true)
            && col.subduct_factor[r] < 0.5
    });
    let trench_seeds = collect(&|r| {
        col.boundary_type[r] == BOUNDARY_CONVERGENT && region_ocean(r) && col.subduct_factor[r] > 0.5
    });

    let rift = bfs_distance_capped(mesh, &rift_seeds, 6.0, Some(&ocean_mask));
    let ridge = bfs_distance_capped(mesh, &ridge_seeds, 8.0, Some(&land_mask));
    let fracture = bfs_distance_capped(mesh, &fracture_seeds, 3.0, Some(&land_mask));
    let backarc = bfs_distance_capped(mesh, &arc_seeds, 8.0, None);
    let arc = bfs_distance_capped(mesh, &arc_seeds, 5.0, Some(&land_mask));
    let trench = bfs_distance_capped(mesh, &trench_seeds, 2.0, Some(&land_mask));

    Distances {
        mountain,
        ocean,
        coastline,
        coast_ocean,
        coast_land,
        rift,
        ridge,
        fracture,
        backarc,
        arc,
        trench,
    }
}

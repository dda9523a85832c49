//! Plate tectonics pipeline: seeding, growth, and ocean/land assignment.
//!
//! Exposes the sub-modules and the `PlateSimulation` bundle consumed by the
//! elevation stage and retained across interactive edits.

pub mod continents;
pub mod growth;
pub mod seeds;

use crate::error::GenError;
use crate::mesh::Mesh;
use crate::sphere::Vec3;
use continents::assign_oceans;
use growth::{drift_vectors, grow_plates};
use rand::rngs::StdRng;
use rand::SeedableRng;
use seeds::{farthest_point_seeds, sample_growth_params};

const SALT_PLATES: u64 = 0x7E11_05A1_0000_0002;
const SALT_OCEANS: u64 = 0x7E11_05B2_0000_0003;

/// Everything the plate stages produce. Plate identity is the region id of
/// the seed cell; `plate_of` stores the dense index into `seeds`.
#[derive(Debug, Clone)]
pub struct PlateSimulation {
    pub seeds: Vec<u32>,
    /// Per region: dense plate index (position in `seeds`).
    pub plate_of: Vec<u32>,
    /// Per plate: unit drift direction.
    pub drift: Vec<Vec3>,
    /// Per plate: ocean crust flag (stage B).
    pub is_ocean: Vec<bool>,
    /// Per plate: crust density sample used in collision weighting.
    pub density: Vec<f32>,
    /// Per plate: owning continent, `None` for ocean plates.
    pub continent_of: Vec<Option<u16>>,
}

impl PlateSimulation {
    pub fn num_plates(&self) -> usize {
        self.seeds.len()
    }

    /// The external `r_plate` form: the owning plate's seed region id.
    pub fn r_plate(&self) -> Vec<i32> {
        self.plate_of.iter().map(|&p| self.seeds[p as usize] as i32).collect()
    }

    /// True when region `r` sits on an ocean plate.
    #[inline]
    pub fn region_on_ocean_plate(&self, r: usize) -> bool {
        self.is_ocean[self.plate_of[r] as usize]
    }

    /// Flip the ocean/land class of the plates whose *seed region ids* are
    /// listed. Density samples are kept; only the crust class changes.
    pub fn apply_toggle(&mut self, toggled_seed_ids: &[u32]) -> Result<(), GenError> {
        for &id in toggled_seed_ids {
            let Some(p) = self.seeds.iter().position(|&s| s == id) else {
                return Err(GenError::invalid(format!("toggled index {id} is not a plate seed")));
            };
            self.is_ocean[p] = !self.is_ocean[p];
            self.continent_of[p] = None;
        }
        Ok(())
    }
}

/// Run stages A and B: grow `num_plates` plates over the mesh, then assign
/// `num_continents` continents and sample crust densities.
pub fn simulate_plates(
    mesh: &Mesh,
    seed: u64,
    num_plates: usize,
    num_continents: usize,
) -> Result<PlateSimulation, GenError> {
    if num_plates < 2 {
        return Err(GenError::invalid(format!("need at least 2 plates, got {num_plates}")));
    }
    if num_plates * 4 > mesh.num_regions {
        return Err(GenError::invalid(format!(
            "{num_plates} plates is too many for {} regions",
            mesh.num_regions
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed ^ SALT_PLATES);
    let seeds = farthest_point_seeds(mesh, num_plates, &mut rng);
    let params: Vec<_> = seeds
        .iter()
        .map(|&s| sample_growth_params(mesh, s, &mut rng))
        .collect();
    let plate_of = grow_plates(mesh, &seeds, &params, &mut rng)?;
    let drift = drift_vectors(mesh, &seeds, &mut rng);

    let mut ocean_rng = StdRng::seed_from_u64(seed ^ SALT_OCEANS);
    let oceans = assign_oceans(mesh, &plate_of, num_plates, num_continents, &mut ocean_rng)?;

    log::info!(
        "plates: {num_plates} grown, {} ocean / {} land",
        oceans.is_ocean.iter().filter(|&&o| o).count(),
        oceans.is_ocean.iter().filter(|&&o| !o).count(),
    );

    Ok(PlateSimulation {
        seeds,
        plate_of,
        drift,
        is_ocean: oceans.is_ocean,
        density: oceans.density,
        continent_of: oceans.continent_of,
    })
}

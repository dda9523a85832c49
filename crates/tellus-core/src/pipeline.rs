//! Pipeline surface: user parameters, the result bundle, and progress
//! reporting between stages.

use crate::climate::ClimateFields;
use crate::elevation::{DebugLayers, ElevationField};
use crate::error::GenError;
use crate::mesh::Mesh;
use crate::plates::PlateSimulation;
use crate::sphere::Vec3;
use crate::terrain::PostParams;
use serde::{Deserialize, Serialize};

/// Everything a generation run needs besides the mesh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenParams {
    pub seed: u64,
    /// Target region count for the reference mesh builder.
    pub num_regions: usize,
    pub num_plates: usize,
    /// Mesh perturbation in [0, 1], forwarded to the mesh builder.
    pub jitter: f64,
    /// Noise amplitude for the elevation layers.
    pub noise_magnitude: f32,
    pub num_continents: usize,
    pub post: PostParams,
    /// Plate-seed region ids whose ocean/land class flips after assignment.
    #[serde(default)]
    pub toggled_indices: Vec<u32>,
}

impl Default for GenParams {
    fn default() -> Self {
        Self {
            seed: 42,
            num_regions: 10_000,
            num_plates: 24,
            jitter: 0.5,
            noise_magnitude: 0.04,
            num_continents: 5,
            post: PostParams::default(),
            toggled_indices: Vec::new(),
        }
    }
}

impl GenParams {
    pub fn validate(&self) -> Result<(), GenError> {
        if !(32..=2_000_000).contains(&self.num_regions) {
            return Err(GenError::invalid(format!(
                "region count {} outside [32, 2000000]",
                self.num_regions
            )));
        }
        if self.num_plates < 2 || self.num_plates * 4 > self.num_regions {
            return Err(GenError::invalid(format!(
                "plate count {} invalid for {} regions",
                self.num_plates, self.num_regions
            )));
        }
        if self.num_continents == 0 || self.num_continents > self.num_plates {
            return Err(GenError::invalid(format!(
                "continent count {} outside [1, {}]",
                self.num_continents, self.num_plates
            )));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(GenError::invalid(format!("jitter {} outside [0, 1]", self.jitter)));
        }
        if !(0.0..=1.0).contains(&self.noise_magnitude) {
            return Err(GenError::invalid(format!(
                "noise magnitude {} outside [0, 1]",
                self.noise_magnitude
            )));
        }
        self.post.validate()
    }
}

/// Full output of one generation.
#[derive(Debug, Clone, Serialize)]
pub struct PlanetResult {
    // Plates.
    pub r_plate: Vec<i32>,
    pub plate_seeds: Vec<u32>,
    pub plate_is_ocean: Vec<bool>,
    pub plate_density: Vec<f32>,
    pub plate_drift: Vec<Vec3>,
    // Elevation.
    pub r_elevation: Vec<f32>,
    pub r_stress: Vec<f32>,
    pub r_boundary_type: Vec<u8>,
    pub r_subduct_factor: Vec<f32>,
    pub mountain_r: Vec<bool>,
    pub coastline_r: Vec<bool>,
    pub ocean_r: Vec<bool>,
    /// Mean of corner-region elevations per dual triangle; empty when the
    /// mesh carries no triangle list.
    pub triangle_elevation: Vec<f32>,
    // Climate.
    pub climate: ClimateFields,
    pub debug_layers: DebugLayers,
}

/// Output of a `reapply` command.
#[derive(Debug, Clone, Serialize)]
pub struct ReapplyResult {
    pub r_elevation: Vec<f32>,
    pub triangle_elevation: Vec<f32>,
    /// `new - retained` elevation, for visualizing what erosion moved.
    pub erosion_delta: Vec<f32>,
    pub climate: ClimateFields,
}

/// Stage-boundary progress reporting.
pub trait ProgressSink {
    fn progress(&mut self, pct: f32, label: &str);
}

/// Discards all progress events.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn progress(&mut self, _pct: f32, _label: &str) {}
}

pub(crate) fn triangle_elevation(mesh: &Mesh, elevation: &[f32]) -> Vec<f32> {
    mesh.triangles
        .iter()
        .map(|t| (elevation[t[0] as usize] + elevation[t[1] as usize] + elevation[t[2] as usize]) / 3.0)
        .collect()
}

pub(crate) fn assemble_result(
    mesh: &Mesh,
    plates: &PlateSimulation,
    field: &ElevationField,
    final_elevation: Vec<f32>,
    climate: ClimateFields,
) -> PlanetResult {
    PlanetResult {
        r_plate: plates.r_plate(),
        plate_seeds: plates.seeds.clone(),
        plate_is_ocean: plates.is_ocean.clone(),
        plate_density: plates.density.clone(),
        plate_drift: plates.drift.clone(),
        triangle_elevation: triangle_elevation(mesh, &final_elevation),
        r_elevation: final_elevation,
        r_stress: field.stress.clone(),
        r_boundary_type: field.boundary_type.clone(),
        r_subduct_factor: field.subduct_factor.clone(),
        mountain_r: field.mountain_r.clone(),
        coastline_r: field.coastline_r.clone(),
        ocean_r: field.ocean_r.clone(),
        climate,
        debug_layers: field.debug.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_validate() {
        GenParams::default().validate().unwrap();
    }

    #[test]
    fn bad_params_are_rejected_with_context() {
        let cases = [
            GenParams { num_regions: 4, ..Default::default() },
            GenParams { num_plates: 1, ..Default::default() },
            GenParams { num_continents: 0, ..Default::default() },
            GenParams { num_continents: 99, ..Default::default() },
            GenParams { jitter: 2.0, ..Default::default() },
            GenParams { noise_magnitude: -0.1, ..Default::default() },
        ];
        for (i, p) in cases.iter().enumerate() {
            let err = p.validate().expect_err(&format!("case {i} should fail"));
            assert!(matches!(err, GenError::InvalidInput { .. }), "case {i}: wrong kind");
        }
    }

    #[test]
    fn params_round_trip_through_serde() {
        let p = GenParams { seed: 7, toggled_indices: vec![3, 9], ..Default::default() };
        let json = serde_json::to_string(&p).unwrap();
        let q: GenParams = serde_json::from_str(&json).unwrap();
        assert_eq!(q.seed, 7);
        assert_eq!(q.toggled_indices, vec![3, 9]);
        assert_eq!(q.num_plates, p.num_plates);
    }

    #[test]
    fn triangle_elevation_averages_corners() {
        let mut mesh = Mesh::fibonacci(100, 0.2, 1).unwrap();
        mesh.triangles = vec![[0, 1, 2]];
        let mut elevation = vec![0.0f32; mesh.num_regions];
        elevation[0] = 0.3;
        elevation[1] = 0.6;
        elevation[2] = 0.0;
        let te = triangle_elevation(&mesh, &elevation);
        assert_eq!(te.len(), 1);
        assert!((te[0] - 0.3).abs() < 1e-6);
    }
}

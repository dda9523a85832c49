//! The interactive session: one retained-state bundle between commands.
//!
//! `generate` runs stages A-H and retains everything later commands need;
//! `reapply` re-runs D-H on the retained pre-erosion elevation;
//! `edit_recompute` re-runs C-H on the retained plate state with an edited
//! ocean/density assignment. Issuing either before `generate` fails with
//! `NoRetainedState` instead of silently regenerating.

use crate::climate::simulate_climate;
use crate::elevation::{assign_elevation, ElevationField};
use crate::error::GenError;
use crate::mesh::Mesh;
use crate::noise_field::NoiseField;
use crate::pipeline::{
    assemble_result, triangle_elevation, GenParams, NoProgress, PlanetResult, ProgressSink,
    ReapplyResult,
};
use crate::plates::{simulate_plates, PlateSimulation};
use crate::terrain::{post_process, PostParams};

struct Retained {
    params: GenParams,
    noise: NoiseField,
    plates: PlateSimulation,
    elevation_field: ElevationField,
}

pub struct Session {
    mesh: Mesh,
    retained: Option<Retained>,
}

impl Session {
    pub fn new(mesh: Mesh) -> Self {
        Self { mesh, retained: None }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Build a session on the reference mesh described by `params`.
    pub fn from_params(params: &GenParams) -> Result<Self, GenError> {
        params.validate()?;
        let mesh = Mesh::fibonacci(params.num_regions, params.jitter, params.seed)?;
        Ok(Self::new(mesh))
    }

    /// Run the full pipeline (stages A-H) and retain state for edits.
    pub fn generate(
        &mut self,
        params: &GenParams,
        sink: &mut dyn ProgressSink,
    ) -> Result<PlanetResult, GenError> {
        params.validate()?;
        self.retained = None;

        sink.progress(0.0, "plates");
        let mut plates =
            simulate_plates(&self.mesh, params.seed, params.num_plates, params.num_continents)?;
        sink.progress(0.1, "oceans");
        if !params.toggled_indices.is_empty() {
            plates.apply_toggle(&params.toggled_indices)?;
        }

        sink.progress(0.15, "elevation");
        let noise = NoiseField::new(params.seed as u32);
        let field = assign_elevation(&self.mesh, &plates, &noise, params.seed, params.noise_magnitude)?;

        let retained = Retained { params: params.clone(), noise, plates, elevation_field: field };
        let result = run_downstream(&self.mesh, &retained, &params.post, sink)?;
        self.retained = Some(retained);
        sink.progress(1.0, "done");
        Ok(result)
    }

    /// Re-run post-processing and climate (stages D-H) on the retained
    /// pre-erosion elevation with new strengths.
    pub fn reapply(
        &mut self,
        post: &PostParams,
        sink: &mut dyn ProgressSink,
    ) -> Result<ReapplyResult, GenError> {
        let retained = self
            .retained
            .as_ref()
            .ok_or(GenError::NoRetainedState { command: "reapply" })?;

        let result = run_downstream(&self.mesh, retained, post, sink)?;
        let erosion_delta: Vec<f32> = result
            .r_elevation
            .iter()
            .zip(&retained.elevation_field.elevation)
            .map(|(new, old)| new - old)
            .collect();
        sink.progress(1.0, "done");
        Ok(ReapplyResult {
            triangle_elevation: triangle_elevation(&self.mesh, &result.r_elevation),
            erosion_delta,
            r_elevation: result.r_elevation,
            climate: result.climate,
        })
    }

    /// Re-run stages C-H on the retained plate layout with an edited
    /// per-plate ocean/density assignment.
    pub fn edit_recompute(
        &mut self,
        plate_is_ocean: &[bool],
        plate_density: &[f32],
        post: &PostParams,
        sink: &mut dyn ProgressSink,
    ) -> Result<PlanetResult, GenError> {
        let retained = self
            .retained
            .as_mut()
            .ok_or(GenError::NoRetainedState { command: "edit_recompute" })?;
        let num_plates = retained.plates.num_plates();
        if plate_is_ocean.len() != num_plates || plate_density.len() != num_plates {
            return Err(GenError::invalid(format!(
                "edit arrays must cover all {num_plates} plates"
            )));
        }

        retained.plates.is_ocean = plate_is_ocean.to_vec();
        retained.plates.density = plate_density.to_vec();

        sink.progress(0.1, "elevation");
        retained.elevation_field = assign_elevation(
            &self.mesh,
            &retained.plates,
            &retained.noise,
            retained.params.seed,
            retained.params.noise_magnitude,
        )?;
        let result = run_downstream(&self.mesh, retained, post, sink)?;
        sink.progress(1.0, "done");
        Ok(result)
    }

    /// Convenience: one-shot generation on the reference mesh.
    pub fn generate_once(params: &GenParams) -> Result<(Session, PlanetResult), GenError> {
        let mut session = Session::from_params(params)?;
        let result = session.generate(params, &mut NoProgress)?;
        Ok((session, result))
    }
}

/// Stages D-H from a retained C output.
fn run_downstream(
    mesh: &Mesh,
    retained: &Retained,
    post: &PostParams,
    sink: &mut dyn ProgressSink,
) -> Result<PlanetResult, GenError> {
    let field = &retained.elevation_field;
    let mut elevation = field.elevation.clone();

    sink.progress(0.45, "terrain");
    post_process(mesh, &retained.plates.plate_of, &mut elevation, post, retained.params.seed)?;

    sink.progress(0.65, "climate");
    let plate_ocean: Vec<bool> = (0..mesh.num_regions)
        .map(|r| retained.plates.region_on_ocean_plate(r))
        .collect();
    let climate = simulate_climate(
        mesh,
        &elevation,
        &field.ocean_before_roughening,
        &plate_ocean,
        &retained.noise,
    )?;

    Ok(assemble_result(mesh, &retained.plates, field, elevation, climate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params(seed: u64) -> GenParams {
        GenParams {
            seed,
            num_regions: 2000,
            num_plates: 12,
            num_continents: 4,
            ..Default::default()
        }
    }

    #[test]
    fn commands_before_generate_fail_cleanly() {
        let params = small_params(42);
        let mut session = Session::from_params(&params).unwrap();
        let err = session.reapply(&PostParams::default(), &mut NoProgress).unwrap_err();
        assert!(matches!(err, GenError::NoRetainedState { command: "reapply" }));
        let err = session
            .edit_recompute(&[], &[], &PostParams::default(), &mut NoProgress)
            .unwrap_err();
        assert!(matches!(err, GenError::NoRetainedState { .. }));
    }

    #[test]
    fn reapply_with_zero_strengths_returns_retained_elevation() {
        let params = small_params(42);
        let (mut session, _) = Session::generate_once(&params).unwrap();
        let zero = PostParams {
            smoothing: 0.0,
            glacial_erosion: 0.0,
            hydraulic_erosion: 0.0,
            thermal_erosion: 0.0,
            ridge_sharpening: 0.0,
        };
        let out = session.reapply(&zero, &mut NoProgress).unwrap();
        assert!(
            out.erosion_delta.iter().all(|&d| d == 0.0),
            "zero-strength reapply must return the retained elevation exactly"
        );
    }

    #[test]
    fn edit_with_unchanged_assignment_reproduces_the_run() {
        let params = small_params(7);
        let (mut session, original) = Session::generate_once(&params).unwrap();
        let edited = session
            .edit_recompute(
                &original.plate_is_ocean,
                &original.plate_density,
                &params.post,
                &mut NoProgress,
            )
            .unwrap();
        assert_eq!(edited.r_elevation, original.r_elevation);
        assert_eq!(edited.r_stress, original.r_stress);
    }

    #[test]
    fn toggling_a_land_plate_to_ocean_shrinks_the_land() {
        let params = small_params(11);
        let (mut session, original) = Session::generate_once(&params).unwrap();
        let Some(victim) = original.plate_is_ocean.iter().position(|&o| !o) else {
            panic!("expected at least one land plate");
        };
        let mut is_ocean = original.plate_is_ocean.clone();
        is_ocean[victim] = true;

        let edited = session
            .edit_recompute(&is_ocean, &original.plate_density, &params.post, &mut NoProgress)
            .unwrap();
        let land = |elev: &[f32]| elev.iter().filter(|&&e| e >= 0.0).count();
        assert!(
            land(&edited.r_elevation) < land(&original.r_elevation),
            "drowning a land plate must reduce the land area"
        );
    }

    #[test]
    fn generate_is_deterministic_end_to_end() {
        let params = small_params(99);
        let (_, a) = Session::generate_once(&params).unwrap();
        let (_, b) = Session::generate_once(&params).unwrap();
        assert_eq!(a.r_elevation, b.r_elevation);
        assert_eq!(a.climate.temperature.summer, b.climate.temperature.summer);
        assert_eq!(a.climate.precipitation.winter, b.climate.precipitation.winter);
    }

    #[test]
    fn progress_moves_forward_through_the_stages() {
        struct Recorder(Vec<f32>);
        impl ProgressSink for Recorder {
            fn progress(&mut self, pct: f32, _label: &str) {
                self.0.push(pct);
            }
        }
        let params = small_params(3);
        let mut session = Session::from_params(&params).unwrap();
        let mut rec = Recorder(Vec::new());
        session.generate(&params, &mut rec).unwrap();
        assert!(rec.0.len() >= 4, "expected several progress events");
        for pair in rec.0.windows(2) {
            assert!(pair[0] <= pair[1], "progress went backwards: {:?}", rec.0);
        }
        assert_eq!(*rec.0.last().unwrap(), 1.0);
    }
}

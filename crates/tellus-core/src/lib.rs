//! Procedural-planet geology and climate pipeline.
//!
//! Given a spherical mesh of Voronoi-like regions, the pipeline produces
//! per-region elevation, seasonal wind, pressure, ocean-current,
//! precipitation, and temperature fields that together resemble Earth-like
//! physical geography. Everything is heuristic, unitless where the display
//! does not need units, and deterministic in `(mesh, seed, params)`.
//!
//! Stages:
//! - A/B plates: [`plates::simulate_plates`]
//! - C elevation: [`elevation::assign_elevation`]
//! - D terrain post-processing: [`terrain::post_process`]
//! - E-H climate: [`climate::simulate_climate`]
//!
//! [`session::Session`] ties the stages together and retains state between
//! interactive edits (`generate` / `reapply` / `edit_recompute`).

pub mod climate;
pub mod elevation;
pub mod error;
pub mod fields;
pub mod mesh;
pub mod noise_field;
pub mod pipeline;
pub mod plates;
pub mod session;
pub mod sphere;
pub mod terrain;

pub use climate::{ClimateFields, Season, Seasonal};
pub use error::GenError;
pub use mesh::Mesh;
pub use pipeline::{GenParams, NoProgress, PlanetResult, ProgressSink, ReapplyResult};
pub use session::Session;
pub use terrain::PostParams;

//! Volcanic island arcs: ridged uplift in a narrow band on the overriding
//! side of ocean-ocean convergent boundaries, strongest about a cell and a
//! half behind the trench line.

use crate::elevation::DebugLayers;
use crate::mesh::Mesh;
use crate::noise_field::NoiseField;

/// Band width behind the boundary, in cells.
const ARC_BAND: f32 = 5.0;
/// Arc crest sits this many cells behind the boundary.
const ARC_CREST: f32 = 1.5;

/// `arc_dist` is the capped BFS field seeded from overriding-side
/// ocean-ocean convergent cells.
pub fn raise_island_arcs(
    mesh: &Mesh,
    noise: &NoiseField,
    arc_dist: &[f32],
    elevation: &mut [f32],
    debug: &mut DebugLayers,
) {
    for r in 0..mesh.num_regions {
        let d = arc_dist[r];
        if !d.is_finite() || d > ARC_BAND {
            continue;
        }
        let pos = mesh.positions[r];
        let gauss = (-0.5 * ((d - ARC_CREST) / 1.2) * ((d - ARC_CREST) / 1.2)).exp();
        let rn = noise.ridged(pos, 7.0, 3);
        if rn > 0.45 {
            let uplift = (rn - 0.45) * 0.55 * gauss;
            elevation[r] += uplift;
            debug.island_arcs[r] = uplift;
        }
    }
}

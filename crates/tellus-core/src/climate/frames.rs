//! Per-region tangent frames. The polar axis is +Y; `east` follows
//! increasing longitude, `north` points toward the +Y pole.

use crate::mesh::Mesh;
use crate::sphere::Vec3;

pub struct TangentFrames {
    pub east: Vec<Vec3>,
    pub north: Vec<Vec3>,
}

pub fn tangent_frames(mesh: &Mesh) -> TangentFrames {
    let mut east = Vec::with_capacity(mesh.num_regions);
    let mut north = Vec::with_capacity(mesh.num_regions);
    for &p in &mesh.positions {
        let e_raw = Vec3::new(p.z, 0.0, -p.x);
        let e = if e_raw.length() < 1e-9 {
            Vec3::new(1.0, 0.0, 0.0) // exactly at a pole
        } else {
            e_raw.normalize()
        };
        east.push(e);
        north.push(p.cross(e).normalize());
    }
    TangentFrames { east, north }
}

//! Seasonal ITCZ: the convergence-zone latitude as a function of longitude.
//!
//! Land in the summer-hemisphere subtropics pulls the ITCZ poleward (monsoon
//! behavior); high terrain pushes it back. The 72 longitude samples are
//! smoothed, clamped to the 5-20 degree band in the summer hemisphere, and
//! expanded through a periodic Catmull-Rom spline into a 360-entry lookup.

use crate::climate::geo_index::GeoIndex;
use crate::climate::Season;

const CONTROL_POINTS: usize = 72;
const TABLE_SIZE: usize = 360;

/// Latitudes probed in the summer hemisphere when weighing land pull.
const PROBE_LATS: [f64; 4] = [5.0, 10.0, 15.0, 20.0];
const PROBE_RADIUS_DEG: f64 = 7.5;

pub struct ItczCurve {
    /// ITCZ latitude per integer longitude, index 0 = -180.
    table: [f32; TABLE_SIZE],
}

impl ItczCurve {
    pub fn lat_at(&self, lon_deg: f64) -> f32 {
        let x = (lon_deg + 180.0).rem_euclid(360.0);
        let i = x as usize % TABLE_SIZE;
        let j = (i + 1) % TABLE_SIZE;
        let t = (x - x.floor()) as f32;
        self.table[i] * (1.0 - t) + self.table[j] * t
    }

    pub fn table(&self) -> &[f32; TABLE_SIZE] {
        &self.table
    }
}

pub fn compute_itcz(geo: &GeoIndex, season: Season) -> ItczCurve {
    let sign = season.hemisphere_sign();

    // ── Raw control points ──────────────────────────────────────────────────
    let mut control = [0.0f32; CONTROL_POINTS];
    for (k, c) in control.iter_mut().enumerate() {
        let lon = k as f64 * 5.0 - 180.0 + 2.5;
        let mut land_sum = 0.0f32;
        let mut elev_sum = 0.0f32;
        for &lat in &PROBE_LATS {
            let s = geo.sample(sign as f64 * lat, lon, PROBE_RADIUS_DEG);
            land_sum += s.land_fraction;
            elev_sum += s.mean_elevation_km;
        }
        let avg_land = land_sum / PROBE_LATS.len() as f32;
        let avg_elev = elev_sum / PROBE_LATS.len() as f32;
        let deg = (5.0 + 15.0 * (2.0 * avg_land).min(1.0) - 1.5 * avg_elev).clamp(5.0, 20.0);
        *c = sign * deg;
    }

    // ── Three 0.25/0.5/0.25 smoothing passes, then re-clamp ─────────────────
    for _ in 0..3 {
        let prev = control;
        for k in 0..CONTROL_POINTS {
            let l = prev[(k + CONTROL_POINTS - 1) % CONTROL_POINTS];
            let r = prev[(k + 1) % CONTROL_POINTS];
            control[k] = 0.25 * l + 0.5 * prev[k] + 0.25 * r;
        }
    }
    for c in &mut control {
        *c = sign * c.abs().clamp(5.0, 20.0);
    }

    // ── Periodic cubic spline to the lookup table ───────────────────────────
    let mut table = [0.0f32; TABLE_SIZE];
    let step = TABLE_SIZE / CONTROL_POINTS;
    for (i, entry) in table.iter_mut().enumerate() {
        let f = i as f32 / step as f32;
        let k = f as usize % CONTROL_POINTS;
        let t = f - f.floor();
        let p0 = control[(k + CONTROL_POINTS - 1) % CONTROL_POINTS];
        let p1 = control[k];
        let p2 = control[(k + 1) % CONTROL_POINTS];
        let p3 = control[(k + 2) % CONTROL_POINTS];
        *entry = catmull_rom(p0, p1, p2, p3, t);
    }
    ItczCurve { table }
}

fn catmull_rom(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;

    fn all_ocean_geo(n: usize) -> GeoIndex {
        let mesh = Mesh::fibonacci(n, 0.5, 42).unwrap();
        let elevation = vec![-0.3f32; mesh.num_regions];
        let ocean = vec![true; mesh.num_regions];
        GeoIndex::build(&mesh, &elevation, &ocean)
    }

    /// Land everywhere north of the equator up to 30 degrees.
    fn monsoon_geo(n: usize) -> GeoIndex {
        let mesh = Mesh::fibonacci(n, 0.5, 42).unwrap();
        let elevation: Vec<f32> = mesh
            .positions
            .iter()
            .map(|p| {
                let lat = p.latitude_deg();
                if (0.0..30.0).contains(&lat) {
                    0.2
                } else {
                    -0.3
                }
            })
            .collect();
        let ocean: Vec<bool> = elevation.iter().map(|&e| e < 0.0).collect();
        GeoIndex::build(&mesh, &elevation, &ocean)
    }

    #[test]
    fn ocean_world_itcz_hugs_the_five_degree_floor() {
        let geo = all_ocean_geo(3000);
        let curve = compute_itcz(&geo, Season::Summer);
        for lon in (-180..180).step_by(20) {
            let lat = curve.lat_at(lon as f64);
            assert!(
                (4.5..=6.5).contains(&lat),
                "ocean-world ITCZ at lon {lon} should sit near +5, got {lat}"
            );
        }
    }

    #[test]
    fn summer_land_pulls_the_itcz_poleward() {
        let ocean_curve = compute_itcz(&all_ocean_geo(3000), Season::Summer);
        let monsoon_curve = compute_itcz(&monsoon_geo(3000), Season::Summer);
        let mean = |c: &ItczCurve| c.table().iter().sum::<f32>() / TABLE_SIZE as f32;
        assert!(
            mean(&monsoon_curve) > mean(&ocean_curve) + 3.0,
            "land should pull the ITCZ north: {} vs {}",
            mean(&monsoon_curve),
            mean(&ocean_curve)
        );
    }

    #[test]
    fn winter_curve_mirrors_into_the_southern_hemisphere() {
        let geo = all_ocean_geo(2000);
        let winter = compute_itcz(&geo, Season::Winter);
        for lon in (-180..180).step_by(30) {
            let lat = winter.lat_at(lon as f64);
            assert!((-20.0..=-4.5).contains(&lat), "winter ITCZ must be southern: {lat}");
        }
    }

    #[test]
    fn curve_is_bounded_and_periodic() {
        let geo = monsoon_geo(2000);
        let curve = compute_itcz(&geo, Season::Summer);
        // Catmull-Rom may overshoot the control band by a hair.
        for &v in curve.table() {
            assert!((4.0..=21.0).contains(&v), "table value {v} outside the band");
        }
        let a = curve.lat_at(-180.0);
        let b = curve.lat_at(180.0);
        assert!((a - b).abs() < 1e-4, "curve must wrap: {a} vs {b}");
    }
}

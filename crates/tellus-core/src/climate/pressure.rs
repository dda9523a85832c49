//! Seasonal sea-level pressure synthesis in hPa: the classic belt structure
//! (ITCZ trough, subtropical highs, subpolar lows, polar highs), a
//! continental thermal term, a barometric elevation term, and a little
//! noise, then smoothed to the mesh's ~75 km scale.

use crate::climate::geo_index::GeoIndex;
use crate::climate::itcz::ItczCurve;
use crate::climate::Season;
use crate::fields::{elevation_to_km, laplacian_smooth, smoothstep};
use crate::mesh::Mesh;
use crate::noise_field::NoiseField;

pub const BASELINE_HPA: f32 = 1013.0;

#[allow(clippy::too_many_arguments)]
pub fn pressure_field(
    mesh: &Mesh,
    geo: &GeoIndex,
    itcz: &ItczCurve,
    continentality: &[f32],
    elevation: &[f32],
    noise: &NoiseField,
    season: Season,
) -> Vec<f32> {
    let n = mesh.num_regions;
    let sign = season.hemisphere_sign();
    let subtropic_center = 30.0 + 5.0 * sign;
    let mut field = Vec::with_capacity(n);

    for r in 0..n {
        let p = mesh.positions[r];
        let lat = p.latitude_deg() as f32;
        let lon = p.longitude_deg();
        let mut hpa = BASELINE_HPA;

        // ITCZ trough follows the land-warped curve.
        let itcz_lat = itcz.lat_at(lon);
        hpa += -15.0 * gaussian(lat - itcz_lat, 8.0);

        // Subtropical highs weaken over land.
        let land_frac = geo.sample(lat as f64, lon, 10.0).land_fraction;
        let high = 12.0 * (1.0 - 0.3 * land_frac);
        hpa += high * gaussian(lat - subtropic_center, 10.0);
        hpa += high * gaussian(lat + subtropic_center, 10.0);

        // Subpolar lows and polar highs.
        hpa += -10.0 * gaussian(lat - 60.0, 10.0);
        hpa += -10.0 * gaussian(lat + 60.0, 10.0);
        hpa += 8.0 * gaussian(lat - 85.0, 8.0);
        hpa += 8.0 * gaussian(lat + 85.0, 8.0);

        // Continental thermal term: summer lows, winter highs, mid-latitude
        // interiors only.
        let shape = smoothstep(15.0, 45.0, lat.abs()) * (1.0 - smoothstep(60.0, 90.0, lat.abs()));
        let modifier = smoothstep(0.2, 0.5, continentality[r]) * shape;
        let summer_hemisphere = lat * sign >= 0.0;
        hpa += modifier * if summer_hemisphere { -10.0 } else { 14.0 };

        // Barometric elevation term and synoptic noise.
        hpa += -3.0 * elevation_to_km(elevation[r]);
        hpa += 2.0 * noise.fbm(p, 2.0, 3);

        field.push(hpa);
    }

    // Smooth to roughly 75 km regardless of mesh density.
    let passes = ((75.0 / mesh.avg_edge_km()).round() as usize).clamp(1, 8);
    laplacian_smooth(mesh, &mut field, passes, 0.5);
    field
}

#[inline]
fn gaussian(x: f32, sigma: f32) -> f32 {
    (-0.5 * (x / sigma) * (x / sigma)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::itcz::compute_itcz;

    fn ocean_world(n: usize) -> (Mesh, GeoIndex, Vec<f32>, Vec<f32>) {
        let mesh = Mesh::fibonacci(n, 0.5, 42).unwrap();
        let elevation = vec![-0.3f32; mesh.num_regions];
        let ocean = vec![true; mesh.num_regions];
        let geo = GeoIndex::build(&mesh, &elevation, &ocean);
        let continentality = vec![0.0f32; mesh.num_regions];
        (mesh, geo, elevation, continentality)
    }

    fn band_mean(mesh: &Mesh, field: &[f32], lo: f32, hi: f32) -> f32 {
        let vals: Vec<f32> = (0..mesh.num_regions)
            .filter(|&r| {
                let lat = mesh.positions[r].latitude_deg() as f32;
                lat >= lo && lat < hi
            })
            .map(|r| field[r])
            .collect();
        vals.iter().sum::<f32>() / vals.len().max(1) as f32
    }

    #[test]
    fn belt_structure_is_present_on_an_ocean_world() {
        let (mesh, geo, elevation, cont) = ocean_world(3000);
        let noise = NoiseField::new(42);
        let itcz = compute_itcz(&geo, Season::Summer);
        let p = pressure_field(&mesh, &geo, &itcz, &cont, &elevation, &noise, Season::Summer);

        let trough = band_mean(&mesh, &p, 0.0, 10.0);
        let subtropics = band_mean(&mesh, &p, 30.0, 40.0);
        let subpolar = band_mean(&mesh, &p, 55.0, 65.0);
        assert!(
            subtropics > trough + 5.0,
            "subtropical high {subtropics:.1} should top the trough {trough:.1}"
        );
        assert!(
            subtropics > subpolar + 5.0,
            "subtropical high {subtropics:.1} should top the subpolar low {subpolar:.1}"
        );
    }

    #[test]
    fn pressures_stay_in_a_sane_synoptic_range() {
        let (mesh, geo, elevation, cont) = ocean_world(2000);
        let noise = NoiseField::new(7);
        let itcz = compute_itcz(&geo, Season::Winter);
        let p = pressure_field(&mesh, &geo, &itcz, &cont, &elevation, &noise, Season::Winter);
        for (r, &v) in p.iter().enumerate() {
            assert!(
                (960.0..=1060.0).contains(&v),
                "cell {r} pressure {v} hPa is implausible"
            );
        }
    }

    #[test]
    fn continental_interior_flips_sign_with_season() {
        let mesh = Mesh::fibonacci(3000, 0.5, 9).unwrap();
        // A big northern mid-latitude continent.
        let elevation: Vec<f32> = mesh
            .positions
            .iter()
            .map(|p| {
                let lat = p.latitude_deg();
                if (30.0..70.0).contains(&lat) {
                    0.2
                } else {
                    -0.3
                }
            })
            .collect();
        let ocean: Vec<bool> = elevation.iter().map(|&e| e < 0.0).collect();
        let geo = GeoIndex::build(&mesh, &elevation, &ocean);
        let cont: Vec<f32> = (0..mesh.num_regions).map(|r| if ocean[r] { 0.0 } else { 0.8 }).collect();
        let noise = NoiseField::new(9);

        let summer_itcz = compute_itcz(&geo, Season::Summer);
        let winter_itcz = compute_itcz(&geo, Season::Winter);
        let ps = pressure_field(&mesh, &geo, &summer_itcz, &cont, &elevation, &noise, Season::Summer);
        let pw = pressure_field(&mesh, &geo, &winter_itcz, &cont, &elevation, &noise, Season::Winter);

        let interior_summer = band_mean(&mesh, &ps, 45.0, 60.0);
        let interior_winter = band_mean(&mesh, &pw, 45.0, 60.0);
        assert!(
            interior_winter > interior_summer + 5.0,
            "continental interior must be high in winter ({interior_winter:.1}) and low in summer ({interior_summer:.1})"
        );
    }
}

//! Geographic index: a 36x72 latitude/longitude binning of the mesh used
//! for cap-averaged land fraction and elevation queries (ITCZ and pressure
//! synthesis sample it heavily).

use crate::fields::elevation_to_km;
use crate::mesh::Mesh;
use crate::sphere::Vec3;

pub const LAT_BINS: usize = 36;
pub const LON_BINS: usize = 72;

pub struct GeoSample {
    pub land_fraction: f32,
    pub mean_elevation_km: f32,
}

pub struct GeoIndex {
    land: Vec<u32>,
    total: Vec<u32>,
    elev_km_sum: Vec<f32>,
    centers: Vec<Vec3>,
}

impl GeoIndex {
    pub fn build(mesh: &Mesh, elevation: &[f32], ocean: &[bool]) -> Self {
        let bins = LAT_BINS * LON_BINS;
        let mut land = vec![0u32; bins];
        let mut total = vec![0u32; bins];
        let mut elev_km_sum = vec![0.0f32; bins];

        for r in 0..mesh.num_regions {
            let p = mesh.positions[r];
            let b = bin_of(p.latitude_deg(), p.longitude_deg());
            total[b] += 1;
            if !ocean[r] {
                land[b] += 1;
                elev_km_sum[b] += elevation_to_km(elevation[r]);
            }
        }

        let centers = (0..bins)
            .map(|b| {
                let (lat, lon) = bin_center(b);
                latlon_to_vec3(lat, lon)
            })
            .collect();

        Self { land, total, elev_km_sum, centers }
    }

    /// Land fraction and mean land elevation within a great-circle cap of
    /// `radius_deg` around (lat, lon). Empty caps read as open ocean.
    pub fn sample(&self, lat_deg: f64, lon_deg: f64, radius_deg: f64) -> GeoSample {
        let center = latlon_to_vec3(lat_deg, lon_deg);
        let cos_radius = radius_deg.to_radians().cos();

        let mut land = 0u64;
        let mut total = 0u64;
        let mut elev = 0.0f64;

        // Only latitude rows that can intersect the cap.
        let row_lo = (((lat_deg - radius_deg + 90.0) / 5.0).floor().max(0.0)) as usize;
        let row_hi = (((lat_deg + radius_deg + 90.0) / 5.0).ceil() as usize).min(LAT_BINS - 1);
        for row in row_lo..=row_hi {
            for col in 0..LON_BINS {
                let b = row * LON_BINS + col;
                if self.total[b] == 0 || self.centers[b].dot(center) < cos_radius {
                    continue;
                }
                land += self.land[b] as u64;
                total += self.total[b] as u64;
                elev += self.elev_km_sum[b] as f64;
            }
        }

        if total == 0 {
            return GeoSample { land_fraction: 0.0, mean_elevation_km: 0.0 };
        }
        GeoSample {
            land_fraction: land as f32 / total as f32,
            mean_elevation_km: if land > 0 { (elev / land as f64) as f32 } else { 0.0 },
        }
    }
}

fn bin_of(lat_deg: f64, lon_deg: f64) -> usize {
    let row = (((lat_deg + 90.0) / 5.0) as usize).min(LAT_BINS - 1);
    let col = (((lon_deg + 180.0) / 5.0) as usize).min(LON_BINS - 1);
    row * LON_BINS + col
}

fn bin_center(b: usize) -> (f64, f64) {
    let row = b / LON_BINS;
    let col = b % LON_BINS;
    (row as f64 * 5.0 - 90.0 + 2.5, col as f64 * 5.0 - 180.0 + 2.5)
}

fn latlon_to_vec3(lat_deg: f64, lon_deg: f64) -> Vec3 {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    Vec3::new(lat.cos() * lon.cos(), lat.sin(), lat.cos() * lon.sin())
}

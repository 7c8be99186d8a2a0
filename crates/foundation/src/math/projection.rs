//! Spherical Web-Mercator (EPSG:3857), the internal projection of slippy maps.
//!
//! Coordinates are meters on a sphere with the WGS84 semi-major axis. Forward
//! projection clamps latitude to [`MAX_MERCATOR_LAT`]; inverse projection does
//! not wrap longitude, so an extent panned past the antimeridian yields
//! longitudes outside [-180, 180] that the caller must clamp.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// WGS84 semi-major axis (meters), used as the sphere radius.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude at which the Web-Mercator square ends (degrees).
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

/// Half the world width in projected meters.
pub const MERCATOR_HALF_WORLD_M: f64 = EARTH_RADIUS_M * std::f64::consts::PI;

pub fn lon_lat_to_mercator(lon_deg: f64, lat_deg: f64) -> [f64; 2] {
    let lat = lat_deg.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let x = EARTH_RADIUS_M * lon_deg.to_radians();
    let y = EARTH_RADIUS_M * (FRAC_PI_4 + lat / 2.0).tan().ln();
    [x, y]
}

pub fn mercator_to_lon_lat(x: f64, y: f64) -> [f64; 2] {
    let lon = (x / EARTH_RADIUS_M).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS_M).exp().atan() - FRAC_PI_2).to_degrees();
    [lon, lat]
}

/// Visible map extent in projected meters: `[min_x, min_y, max_x, max_y]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MercatorExtent {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl MercatorExtent {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Self { min, max }
    }

    /// Extent of a `width_px` x `height_px` viewport centered on `center`
    /// at `resolution` meters per pixel.
    pub fn from_center(center: [f64; 2], resolution: f64, width_px: u32, height_px: u32) -> Self {
        let half_w = resolution * width_px as f64 / 2.0;
        let half_h = resolution * height_px as f64 / 2.0;
        Self {
            min: [center[0] - half_w, center[1] - half_h],
            max: [center[0] + half_w, center[1] + half_h],
        }
    }

    /// Resolution (meters per pixel) of a 256px tile pyramid at `zoom`.
    pub fn resolution_at_zoom(zoom: f64) -> f64 {
        2.0 * MERCATOR_HALF_WORLD_M / 256.0 / 2f64.powf(zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        MAX_MERCATOR_LAT, MERCATOR_HALF_WORLD_M, MercatorExtent, lon_lat_to_mercator,
        mercator_to_lon_lat,
    };

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn origin_maps_to_origin() {
        let [x, y] = lon_lat_to_mercator(0.0, 0.0);
        assert_close(x, 0.0, 1e-9);
        assert_close(y, 0.0, 1e-9);
    }

    #[test]
    fn antimeridian_is_half_world() {
        let [x, _] = lon_lat_to_mercator(180.0, 0.0);
        assert_close(x, MERCATOR_HALF_WORLD_M, 1e-6);
        let [_, y] = lon_lat_to_mercator(0.0, MAX_MERCATOR_LAT);
        assert_close(y, MERCATOR_HALF_WORLD_M, 1e-3);
    }

    #[test]
    fn inverse_recovers_warsaw() {
        let [x, y] = lon_lat_to_mercator(21.012, 52.229);
        let [lon, lat] = mercator_to_lon_lat(x, y);
        assert_close(lon, 21.012, 1e-9);
        assert_close(lat, 52.229, 1e-9);
    }

    #[test]
    fn inverse_does_not_wrap_longitude() {
        let [lon, _] = mercator_to_lon_lat(MERCATOR_HALF_WORLD_M * 1.5, 0.0);
        assert_close(lon, 270.0, 1e-9);
    }

    #[test]
    fn extent_from_center() {
        let e = MercatorExtent::from_center([100.0, -50.0], 2.0, 10, 4);
        assert_eq!(e.min, [90.0, -54.0]);
        assert_eq!(e.max, [110.0, -46.0]);
        assert_close(
            MercatorExtent::resolution_at_zoom(0.0) * 256.0,
            2.0 * MERCATOR_HALF_WORLD_M,
            1e-6,
        );
    }
}

use foundation::bounds::GeoBounds;
use foundation::math::{
    MAX_MERCATOR_LAT, MercatorExtent, lon_lat_to_mercator, mercator_to_lon_lat,
};

/// Initial map center (lon, lat) and zoom.
pub const DEFAULT_CENTER: [f64; 2] = [21.012, 52.229];
pub const DEFAULT_ZOOM: f64 = 12.0;

/// Minimum zoom used when flying to an asset.
pub const FLY_TO_MIN_ZOOM: f64 = 14.0;

/// Map camera in Web-Mercator: projected center plus meters per pixel.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub center: [f64; 2],
    pub resolution: f64,
    pub width_px: u32,
    pub height_px: u32,
}

impl Viewport {
    pub fn from_lon_lat_zoom(lon: f64, lat: f64, zoom: f64, width_px: u32, height_px: u32) -> Self {
        Self {
            center: lon_lat_to_mercator(lon, lat),
            resolution: MercatorExtent::resolution_at_zoom(zoom),
            width_px,
            height_px,
        }
    }

    pub fn initial(width_px: u32, height_px: u32) -> Self {
        Self::from_lon_lat_zoom(
            DEFAULT_CENTER[0],
            DEFAULT_CENTER[1],
            DEFAULT_ZOOM,
            width_px,
            height_px,
        )
    }

    pub fn zoom(&self) -> f64 {
        (MercatorExtent::resolution_at_zoom(0.0) / self.resolution).log2()
    }

    pub fn extent(&self) -> MercatorExtent {
        MercatorExtent::from_center(self.center, self.resolution, self.width_px, self.height_px)
    }

    /// Pan by a pixel offset (screen y grows downward).
    pub fn pan_px(self, dx: f64, dy: f64) -> Self {
        Self {
            center: [
                self.center[0] + dx * self.resolution,
                self.center[1] - dy * self.resolution,
            ],
            ..self
        }
    }

    pub fn zoom_to(self, zoom: f64) -> Self {
        Self {
            resolution: MercatorExtent::resolution_at_zoom(zoom),
            ..self
        }
    }

    /// Centers on `lon, lat`, zooming in to at least [`FLY_TO_MIN_ZOOM`].
    pub fn fly_to(self, lon: f64, lat: f64) -> Self {
        Self {
            center: lon_lat_to_mercator(lon, lat),
            resolution: self
                .resolution
                .min(MercatorExtent::resolution_at_zoom(FLY_TO_MIN_ZOOM)),
            ..self
        }
    }

    /// Visible extent as lon/lat, clamped to the projectable world.
    ///
    /// Longitudes are not wrapped, so a view panned across the antimeridian
    /// is cut at +/-180 instead of producing an inverted box.
    pub fn to_bounds(&self) -> Option<GeoBounds> {
        let extent = self.extent();
        let [lon_a, lat_a] = mercator_to_lon_lat(extent.min[0], extent.min[1]);
        let [lon_b, lat_b] = mercator_to_lon_lat(extent.max[0], extent.max[1]);

        let clamp_lon = |v: f64| v.clamp(-180.0, 180.0);
        let clamp_lat = |v: f64| v.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);

        GeoBounds::new(
            clamp_lon(lon_a.min(lon_b)),
            clamp_lat(lat_a.min(lat_b)),
            clamp_lon(lon_a.max(lon_b)),
            clamp_lat(lat_a.max(lat_b)),
        )
        .ok()
    }

    /// The `bbox` wire parameter for this view.
    pub fn bbox_param(&self) -> Option<String> {
        self.to_bounds().map(|b| b.to_param_string())
    }
}

/// Geographic bounding box in degrees (WGS84 longitude/latitude).
///
/// Invariant: `min_lon <= max_lon` and `min_lat <= max_lat`. Construction
/// through [`GeoBounds::new`] or [`GeoBounds::parse`] enforces it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BoundsParseError {
    #[error("expected 4 comma-separated values, got {0}")]
    WrongArity(usize),
    #[error("value {0} is not a number")]
    NotANumber(usize),
    #[error("value {0} is not finite")]
    NonFinite(usize),
    #[error("bounds are inverted (min greater than max)")]
    Inverted,
}

impl GeoBounds {
    pub fn new(
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
    ) -> Result<Self, BoundsParseError> {
        for (idx, v) in [min_lon, min_lat, max_lon, max_lat].into_iter().enumerate() {
            if !v.is_finite() {
                return Err(BoundsParseError::NonFinite(idx));
            }
        }
        if min_lon > max_lon || min_lat > max_lat {
            return Err(BoundsParseError::Inverted);
        }
        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }

    /// Parses the `minLon,minLat,maxLon,maxLat` wire form.
    ///
    /// Inverted boxes (including dateline-crossing ones) are rejected rather
    /// than swapped.
    pub fn parse(raw: &str) -> Result<Self, BoundsParseError> {
        let parts: Vec<&str> = raw.split(',').collect();
        if parts.len() != 4 {
            return Err(BoundsParseError::WrongArity(parts.len()));
        }

        let mut values = [0.0f64; 4];
        for (idx, part) in parts.iter().enumerate() {
            let v: f64 = part
                .trim()
                .parse()
                .map_err(|_| BoundsParseError::NotANumber(idx))?;
            values[idx] = v;
        }

        Self::new(values[0], values[1], values[2], values[3])
    }

    /// Closed-interval containment on all four edges.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    pub fn to_param_string(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

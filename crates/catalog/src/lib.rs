//! Read-only in-memory catalog of geolocated assets.
//!
//! The store is built once from a static dataset and never mutated. Lookups
//! by id go through a sorted index; iteration always follows the order the
//! dataset listed the assets in.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Building,
    Road,
    Poi,
}

impl AssetKind {
    pub const ALL: [AssetKind; 3] = [AssetKind::Building, AssetKind::Road, AssetKind::Poi];

    /// Exact, case-sensitive match against the wire names.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "building" => Some(Self::Building),
            "road" => Some(Self::Road),
            "poi" => Some(Self::Poi),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Road => "road",
            Self::Poi => "poi",
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AssetKind,
    /// `None` means unknown, never zero.
    #[serde(default)]
    pub height: Option<f64>,
    /// `[lon, lat]` in degrees.
    pub centroid: [f64; 2],
}

impl Asset {
    pub fn lon(&self) -> f64 {
        self.centroid[0]
    }

    pub fn lat(&self) -> f64 {
        self.centroid[1]
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate asset id: {0}")]
    DuplicateId(String),
    #[error("asset {id} has an invalid centroid [{lon}, {lat}]")]
    InvalidCentroid { id: String, lon: f64, lat: f64 },
    #[error("asset dataset corrupt: {0}")]
    Corrupt(String),
    #[error("asset dataset error: {0}")]
    Io(String),
}

/// Read-only access to an asset collection.
pub trait AssetSource {
    /// All assets in load order.
    fn assets(&self) -> &[Asset];
    fn get(&self, id: &str) -> Option<&Asset>;
}

impl AssetSource for [Asset] {
    fn assets(&self) -> &[Asset] {
        self
    }

    fn get(&self, id: &str) -> Option<&Asset> {
        self.iter().find(|a| a.id == id)
    }
}

impl AssetSource for Vec<Asset> {
    fn assets(&self) -> &[Asset] {
        self
    }

    fn get(&self, id: &str) -> Option<&Asset> {
        AssetSource::get(self.as_slice(), id)
    }
}

#[derive(Debug)]
pub struct AssetStore {
    assets: Vec<Asset>,
    by_id: BTreeMap<String, usize>,
    fingerprint: String,
}

impl AssetStore {
    pub fn from_assets(assets: Vec<Asset>) -> Result<Self, CatalogError> {
        let mut by_id = BTreeMap::new();
        for (idx, asset) in assets.iter().enumerate() {
            validate_centroid(asset)?;
            if by_id.insert(asset.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateId(asset.id.clone()));
            }
        }

        let canonical =
            serde_json::to_vec(&assets).map_err(|e| CatalogError::Corrupt(e.to_string()))?;
        let fingerprint = blake3::hash(&canonical).to_hex().to_string();

        Ok(Self {
            assets,
            by_id,
            fingerprint,
        })
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, CatalogError> {
        let assets: Vec<Asset> =
            serde_json::from_slice(bytes).map_err(|e| CatalogError::Corrupt(e.to_string()))?;
        Self::from_assets(assets)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| CatalogError::Io(format!("{path:?}: {e}")))?;
        let store = Self::from_json_slice(&bytes)?;
        info!(
            path = %path.display(),
            assets = store.len(),
            fingerprint = %store.fingerprint(),
            "asset store loaded"
        );
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// blake3 digest of the canonical JSON form; changes whenever the data does.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Counts per kind, including kinds with no assets.
    pub fn count_by_kind(&self) -> BTreeMap<AssetKind, usize> {
        let mut counts: BTreeMap<AssetKind, usize> =
            AssetKind::ALL.iter().map(|k| (*k, 0)).collect();
        for asset in &self.assets {
            *counts.entry(asset.kind).or_insert(0) += 1;
        }
        counts
    }
}

impl AssetSource for AssetStore {
    fn assets(&self) -> &[Asset] {
        &self.assets
    }

    fn get(&self, id: &str) -> Option<&Asset> {
        self.by_id.get(id).map(|idx| &self.assets[*idx])
    }
}

fn validate_centroid(asset: &Asset) -> Result<(), CatalogError> {
    let [lon, lat] = asset.centroid;
    let ok = lon.is_finite()
        && lat.is_finite()
        && (-180.0..=180.0).contains(&lon)
        && (-90.0..=90.0).contains(&lat);
    if ok {
        Ok(())
    } else {
        Err(CatalogError::InvalidCentroid {
            id: asset.id.clone(),
            lon,
            lat,
        })
    }
}

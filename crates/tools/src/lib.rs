//! Offline dataset operations behind the `geoops` CLI.

use std::collections::BTreeMap;
use std::path::Path;

use catalog::{Asset, AssetKind, AssetStore, CatalogError};
use query::{IgnoredParam, QueryParams, QueryResult, RawQueryParams};
use serde::Serialize;

/// Summary of a dataset that passed load-time validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetReport {
    pub assets: usize,
    pub by_kind: BTreeMap<AssetKind, usize>,
    pub fingerprint: String,
}

impl DatasetReport {
    pub fn for_store(store: &AssetStore) -> Self {
        Self {
            assets: store.len(),
            by_kind: store.count_by_kind(),
            fingerprint: store.fingerprint().to_string(),
        }
    }
}

pub fn validate(path: &Path) -> Result<DatasetReport, CatalogError> {
    let store = AssetStore::load(path)?;
    Ok(DatasetReport::for_store(&store))
}

/// Runs a query with the same permissive parsing the server applies.
pub fn run_query(store: &AssetStore, raw: &RawQueryParams) -> (QueryResult, Vec<IgnoredParam>) {
    let parsed = QueryParams::from_raw(raw);
    (query::query(store, &parsed.params), parsed.ignored)
}

pub fn lookup<'a>(store: &'a AssetStore, id: &str) -> Option<&'a Asset> {
    query::find_by_id(store, id)
}

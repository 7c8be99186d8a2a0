use catalog::{Asset, AssetSource};
use serde::{Deserialize, Serialize};

use crate::params::{KindFilter, QueryParams};

/// One page of matching assets plus the unpaginated match count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub items: Vec<Asset>,
    pub total: usize,
}

/// Pre-lowered predicates so the scan does no per-asset setup.
struct Predicates<'a> {
    params: &'a QueryParams,
    q_lower: Option<String>,
}

impl<'a> Predicates<'a> {
    fn new(params: &'a QueryParams) -> Self {
        Self {
            params,
            q_lower: params.q.as_ref().map(|q| q.to_lowercase()),
        }
    }

    fn matches(&self, asset: &Asset) -> bool {
        let p = self.params;

        if let Some(bbox) = &p.bbox
            && !bbox.contains(asset.lon(), asset.lat())
        {
            return false;
        }

        match &p.kind {
            Some(KindFilter::Known(kind)) if asset.kind != *kind => return false,
            Some(KindFilter::Unrecognized(_)) => return false,
            _ => {}
        }

        // Unknown height never satisfies a bound.
        if let Some(min) = p.min_height
            && !asset.height.is_some_and(|h| h >= min)
        {
            return false;
        }
        if let Some(max) = p.max_height
            && !asset.height.is_some_and(|h| h <= max)
        {
            return false;
        }

        if let Some(q) = &self.q_lower
            && !asset.name.to_lowercase().contains(q.as_str())
        {
            return false;
        }

        true
    }
}

/// Filters `source` with every predicate in `params` (AND-combined) and
/// returns the requested page.
///
/// Ordering contract:
/// - Items keep the source's load order; nothing is sorted spatially.
/// - `total` counts every match regardless of `limit`/`offset`.
/// - An `offset` at or past `total` yields an empty page.
pub fn query<S: AssetSource + ?Sized>(source: &S, params: &QueryParams) -> QueryResult {
    let predicates = Predicates::new(params);
    let page_end = params.offset.saturating_add(params.limit);

    let mut items = Vec::new();
    let mut total = 0usize;
    for asset in source.assets() {
        if !predicates.matches(asset) {
            continue;
        }
        if total >= params.offset && total < page_end {
            items.push(asset.clone());
        }
        total += 1;
    }

    QueryResult { items, total }
}

/// Single-asset lookup, independent of any spatial filter.
pub fn find_by_id<'a, S: AssetSource + ?Sized>(source: &'a S, id: &str) -> Option<&'a Asset> {
    source.get(id)
}

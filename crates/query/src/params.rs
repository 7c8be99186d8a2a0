//! Request parameter parsing.
//!
//! Every optional filter is parsed on its own into a [`Parsed`] value. A
//! parameter that is present but unusable never fails the request: it turns
//! into "filter not applied" and is reported in [`ParsedQuery::ignored`] so
//! callers can log it.

use catalog::AssetKind;
use foundation::bounds::GeoBounds;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: usize = 100;
pub const MAX_LIMIT: usize = 1000;

/// Untyped request parameters, named as on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQueryParams {
    pub bbox: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub min_height: Option<String>,
    pub max_height: Option<String>,
    pub q: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl RawQueryParams {
    /// Builds from decoded query-string pairs. The first occurrence of a
    /// repeated key wins; unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut raw = Self::default();
        for (k, v) in pairs {
            let slot = match k.as_ref() {
                "bbox" => &mut raw.bbox,
                "type" => &mut raw.kind,
                "minHeight" => &mut raw.min_height,
                "maxHeight" => &mut raw.max_height,
                "q" => &mut raw.q,
                "limit" => &mut raw.limit,
                "offset" => &mut raw.offset,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(v.into());
            }
        }
        raw
    }
}

/// Outcome of parsing one optional parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    Absent,
    Valid(T),
    Invalid { raw: String, reason: String },
}

impl<T> Parsed<T> {
    /// Invalid input disables the filter, same as absent input.
    pub fn into_option(self) -> Option<T> {
        match self {
            Parsed::Valid(v) => Some(v),
            Parsed::Absent | Parsed::Invalid { .. } => None,
        }
    }

    fn from_raw(raw: Option<&str>, parse: impl FnOnce(&str) -> Result<T, String>) -> Self {
        // The map client omits empty filters; an empty value means "not set".
        let Some(raw) = raw.filter(|s| !s.is_empty()) else {
            return Parsed::Absent;
        };
        match parse(raw) {
            Ok(v) => Parsed::Valid(v),
            Err(reason) => Parsed::Invalid {
                raw: raw.to_string(),
                reason,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KindFilter {
    Known(AssetKind),
    /// Matches nothing.
    Unrecognized(String),
}

impl KindFilter {
    pub fn parse(raw: &str) -> Self {
        match AssetKind::parse(raw) {
            Some(k) => KindFilter::Known(k),
            None => KindFilter::Unrecognized(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            KindFilter::Known(k) => k.as_str(),
            KindFilter::Unrecognized(raw) => raw,
        }
    }
}

impl From<AssetKind> for KindFilter {
    fn from(kind: AssetKind) -> Self {
        KindFilter::Known(kind)
    }
}

/// Typed filter and page request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    pub bbox: Option<GeoBounds>,
    pub kind: Option<KindFilter>,
    pub min_height: Option<f64>,
    pub max_height: Option<f64>,
    pub q: Option<String>,
    /// Always within `[1, MAX_LIMIT]`.
    pub limit: usize,
    pub offset: usize,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            bbox: None,
            kind: None,
            min_height: None,
            max_height: None,
            q: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredParam {
    pub name: &'static str,
    pub raw: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    pub params: QueryParams,
    pub ignored: Vec<IgnoredParam>,
}

impl QueryParams {
    pub fn from_raw(raw: &RawQueryParams) -> ParsedQuery {
        let mut ignored = Vec::new();

        let bbox = note(
            &mut ignored,
            "bbox",
            Parsed::from_raw(raw.bbox.as_deref(), |s| {
                GeoBounds::parse(s).map_err(|e| e.to_string())
            }),
        );
        let kind = note(
            &mut ignored,
            "type",
            Parsed::from_raw(raw.kind.as_deref(), |s| Ok(KindFilter::parse(s))),
        );
        let min_height = note(
            &mut ignored,
            "minHeight",
            Parsed::from_raw(raw.min_height.as_deref(), parse_finite),
        );
        let max_height = note(
            &mut ignored,
            "maxHeight",
            Parsed::from_raw(raw.max_height.as_deref(), parse_finite),
        );
        let q = note(
            &mut ignored,
            "q",
            Parsed::from_raw(raw.q.as_deref(), |s| Ok(s.to_string())),
        );
        let limit = note(
            &mut ignored,
            "limit",
            Parsed::from_raw(raw.limit.as_deref(), parse_count),
        )
        .unwrap_or(DEFAULT_LIMIT as f64);
        let offset = note(
            &mut ignored,
            "offset",
            Parsed::from_raw(raw.offset.as_deref(), parse_count),
        )
        .unwrap_or(0.0);

        ParsedQuery {
            params: QueryParams {
                bbox,
                kind,
                min_height,
                max_height,
                q,
                limit: clamp_limit(limit),
                offset: clamp_offset(offset),
            },
            ignored,
        }
    }

    /// Wire parameters for this query, in a stable order.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(b) = &self.bbox {
            pairs.push(("bbox", b.to_param_string()));
        }
        if let Some(k) = &self.kind {
            pairs.push(("type", k.as_str().to_string()));
        }
        if let Some(h) = self.min_height {
            pairs.push(("minHeight", h.to_string()));
        }
        if let Some(h) = self.max_height {
            pairs.push(("maxHeight", h.to_string()));
        }
        if let Some(q) = &self.q {
            pairs.push(("q", q.clone()));
        }
        pairs.push(("limit", self.limit.to_string()));
        pairs.push(("offset", self.offset.to_string()));
        pairs
    }
}

fn note<T>(ignored: &mut Vec<IgnoredParam>, name: &'static str, parsed: Parsed<T>) -> Option<T> {
    if let Parsed::Invalid { raw, reason } = &parsed {
        ignored.push(IgnoredParam {
            name,
            raw: raw.clone(),
            reason: reason.clone(),
        });
    }
    parsed.into_option()
}

fn parse_finite(raw: &str) -> Result<f64, String> {
    let v: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("{raw:?} is not a number"))?;
    if !v.is_finite() {
        return Err(format!("{raw:?} is not finite"));
    }
    Ok(v)
}

// Infinite counts are accepted here and clamped by the caller.
fn parse_count(raw: &str) -> Result<f64, String> {
    let v: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("{raw:?} is not a number"))?;
    if v.is_nan() {
        return Err(format!("{raw:?} is not a number"));
    }
    Ok(v)
}

pub fn clamp_limit(requested: f64) -> usize {
    requested.clamp(1.0, MAX_LIMIT as f64).trunc() as usize
}

pub fn clamp_offset(requested: f64) -> usize {
    // Float-to-int casts saturate, so +inf lands on usize::MAX.
    requested.max(0.0).trunc() as usize
}

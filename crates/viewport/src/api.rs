//! Transport seam between the client state machines and the asset API.

use std::future::Future;
use std::pin::Pin;

use catalog::Asset;
use query::{QueryParams, QueryResult};
use reqwest::{StatusCode, Url};

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub const DEFAULT_API_BASE: &str = "http://localhost:4000/api/";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("invalid API base url: {0}")]
    InvalidBaseUrl(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("response decode failed: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Asset API as seen by the client.
///
/// Methods return boxed futures for dyn-compatibility.
pub trait AssetsApi: Send + Sync {
    fn list(&self, params: QueryParams) -> BoxFuture<'_, Result<QueryResult, ApiError>>;

    /// `Ok(None)` is the not-found outcome; `Err` is reserved for transport
    /// and protocol failures.
    fn get(&self, id: String) -> BoxFuture<'_, Result<Option<Asset>, ApiError>>;
}

/// [`AssetsApi`] over HTTP against the asset server.
#[derive(Debug, Clone)]
pub struct HttpAssetsApi {
    http: reqwest::Client,
    base: Url,
}

impl HttpAssetsApi {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, ApiError> {
        let mut base =
            Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }
        // Segments are appended, so the base must end in a slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn assets_url(&self, id: Option<&str>) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidBaseUrl(self.base.to_string()))?;
            segments.pop_if_empty().push("assets");
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }
}

impl AssetsApi for HttpAssetsApi {
    fn list(&self, params: QueryParams) -> BoxFuture<'_, Result<QueryResult, ApiError>> {
        Box::pin(async move {
            let url = self.assets_url(None)?;
            let resp = self
                .http
                .get(url)
                .query(&params.to_query_pairs())
                .send()
                .await?;
            if !resp.status().is_success() {
                return Err(ApiError::Status(resp.status().as_u16()));
            }
            Ok(resp.json::<QueryResult>().await?)
        })
    }

    fn get(&self, id: String) -> BoxFuture<'_, Result<Option<Asset>, ApiError>> {
        Box::pin(async move {
            let url = self.assets_url(Some(&id))?;
            let resp = self.http.get(url).send().await?;
            if resp.status() == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !resp.status().is_success() {
                return Err(ApiError::Status(resp.status().as_u16()));
            }
            Ok(Some(resp.json::<Asset>().await?))
        })
    }
}

use std::sync::Arc;
use std::time::Duration;

use mikiri_core::error::{MikiriError, Result};
use mikiri_core::resolve::{ResolveQuery, ResolvedVersion, VersionResolver};
use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

/// Outbound verification calls in flight at once. Keeps a large catalogue
/// from hammering the external service.
pub const MAX_IN_FLIGHT: usize = 5;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the catalogue version-resolution lookup.
///
/// `GET {base_url}/titles/{catalogue_id}/version` with the known axis
/// passed as query parameters; 404 means the catalogue has nothing.
pub struct ResolverClient {
    http: reqwest::Client,
    base_url: String,
}

impl ResolverClient {
    /// A client with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns `MikiriError::Resolver` if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// A client with an explicit per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `MikiriError::Resolver` if the underlying HTTP client
    /// cannot be constructed.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| MikiriError::Resolver(err.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResolved {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    build: Option<String>,
}

impl VersionResolver for ResolverClient {
    async fn resolve(&self, query: &ResolveQuery) -> Result<Option<ResolvedVersion>> {
        let url = format!("{}/titles/{}/version", self.base_url, query.catalogue_id);
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(ref version) = query.known_version {
            params.push(("version", version.clone()));
        }
        if let Some(ref build) = query.known_build {
            params.push(("build", build.clone()));
        }
        if let Some(date) = query.date_version {
            params.push(("date", date.format("%Y-%m-%d").to_string()));
        }

        debug!(catalogue_id = %query.catalogue_id, "resolving version axes");
        let response = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|err| MikiriError::Resolver(err.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            return Err(MikiriError::Resolver(format!("catalogue answered {status}")));
        }

        let body: WireResolved = response
            .json()
            .await
            .map_err(|err| MikiriError::Resolver(format!("malformed resolution body: {err}")))?;

        if body.version.is_none() && body.build.is_none() {
            return Ok(None);
        }
        Ok(Some(ResolvedVersion {
            version: body.version,
            build: body.build,
        }))
    }
}

/// Resolves a batch of queries with a bounded fan-out, preserving input
/// order in the output. Individual failures stay individual; one bad
/// lookup never poisons the batch.
pub async fn resolve_batch<R>(
    resolver: Arc<R>,
    queries: Vec<ResolveQuery>,
    limit: usize,
) -> Vec<Result<Option<ResolvedVersion>>>
where
    R: VersionResolver + 'static,
{
    let total = queries.len();
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut tasks = JoinSet::new();

    for (index, query) in queries.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let resolver = Arc::clone(&resolver);
        tasks.spawn(async move {
            let outcome = match semaphore.acquire_owned().await {
                Ok(_permit) => resolver.resolve(&query).await,
                Err(_) => Err(MikiriError::Resolver("semaphore closed".into())),
            };
            (index, outcome)
        });
    }

    let mut results: Vec<Result<Option<ResolvedVersion>>> = Vec::with_capacity(total);
    results.resize_with(total, || Err(MikiriError::Resolver("task dropped".into())));
    while let Some(joined) = tasks.join_next().await {
        if let Ok((index, outcome)) = joined {
            results[index] = outcome;
        }
    }
    results
}

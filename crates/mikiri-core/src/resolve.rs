//! Cross-resolution lookup seam.
//!
//! When a listing carries only one trusted axis (version without build,
//! build without version) or a date-shaped version, an external
//! catalogue can sometimes fill in the rest. The lookup is side-effect
//! free and retry-safe; failure only degrades confidence, never the
//! cycle.

use std::future::Future;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A resolution query, keyed by an external catalogue id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveQuery {
    /// External catalogue id of the tracked title.
    pub catalogue_id: String,
    /// Version axis, when already known.
    #[serde(default)]
    pub known_version: Option<String>,
    /// Build axis, when already known.
    #[serde(default)]
    pub known_build: Option<String>,
    /// Date-shaped version to resolve into a real version/build pair.
    #[serde(default)]
    pub date_version: Option<NaiveDate>,
}

impl ResolveQuery {
    /// `true` when exactly one of version/build is known — the only
    /// state in which a lookup is worth making (besides date versions).
    #[must_use]
    pub fn has_single_axis(&self) -> bool {
        self.known_version.is_some() != self.known_build.is_some()
    }
}

/// What the catalogue answered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedVersion {
    /// Resolved version, when the catalogue knew one.
    pub version: Option<String>,
    /// Resolved build, when the catalogue knew one.
    pub build: Option<String>,
}

/// External version/build resolution seam.
pub trait VersionResolver: Send + Sync {
    /// Resolves the missing axis for the query, or `None` when the
    /// catalogue has nothing.
    fn resolve(
        &self,
        query: &ResolveQuery,
    ) -> impl Future<Output = Result<Option<ResolvedVersion>>> + Send;
}

/// The explicit "no resolver configured" implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl VersionResolver for NoResolver {
    async fn resolve(&self, _query: &ResolveQuery) -> Result<Option<ResolvedVersion>> {
        Ok(None)
    }
}

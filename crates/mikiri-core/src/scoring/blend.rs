use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::VersionInfo;

/// Weight of raw similarity when a classifier verdict says "update".
pub const SIMILARITY_WEIGHT: f32 = 0.4;
/// Weight of the classifier confidence when it says "update".
pub const CLASSIFIER_WEIGHT: f32 = 0.6;
/// Damping applied when the classifier says "not an update".
pub const NON_UPDATE_DAMPING: f32 = 0.3;

/// Fallback boost for a detected version pattern.
pub const BOOST_VERSION: f32 = 0.15;
/// Fallback boost for a detected update keyword.
pub const BOOST_UPDATE_KEYWORD: f32 = 0.1;
/// Fallback boost for a detected build number.
pub const BOOST_BUILD: f32 = 0.05;

/// One candidate as submitted to the external classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyCandidate {
    /// Raw listing title.
    pub title: String,
    /// Similarity to the subject title.
    pub similarity: f32,
    /// Listing link.
    pub link: String,
    /// Listing date, when known.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// A classification request: one subject title against its candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyRequest {
    /// The tracked title the candidates were matched against.
    pub subject: String,
    /// Free-text context (current version, source site).
    #[serde(default)]
    pub context: Option<String>,
    /// All matched candidates, not only ambiguous ones.
    pub candidates: Vec<ClassifyCandidate>,
}

/// Per-candidate verdict returned by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateVerdict {
    /// Whether the candidate is an update of the subject.
    pub is_update: bool,
    /// Classifier confidence in `[0.0, 1.0]`.
    pub confidence: f32,
    /// Free-text rationale.
    #[serde(default)]
    pub reason: Option<String>,
}

/// External update/no-update classification seam.
///
/// Implementations are network clients with bounded timeouts; a failed
/// or absent classifier must never fail a cycle — the engine falls back
/// to [`blend_heuristic`].
pub trait UpdateClassifier: Send + Sync {
    /// Classifies every candidate in the request. The returned vector
    /// is positional: verdict `i` belongs to candidate `i`.
    fn classify(
        &self,
        req: &ClassifyRequest,
    ) -> impl Future<Output = Result<Vec<CandidateVerdict>>> + Send;
}

/// The explicit "no classifier configured" implementation. Always
/// returns no verdicts, which sends the engine down the heuristic path.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClassifier;

impl UpdateClassifier for NoClassifier {
    async fn classify(&self, _req: &ClassifyRequest) -> Result<Vec<CandidateVerdict>> {
        Ok(Vec::new())
    }
}

/// Blends raw similarity with a classifier verdict.
///
/// A positive verdict mixes the two signals; a negative verdict damps
/// the similarity hard to suppress false positives.
#[must_use]
pub fn blend_with_verdict(similarity: f32, verdict: &CandidateVerdict) -> f32 {
    if verdict.is_update {
        (SIMILARITY_WEIGHT * similarity + CLASSIFIER_WEIGHT * verdict.confidence).clamp(0.0, 1.0)
    } else {
        similarity * NON_UPDATE_DAMPING
    }
}

/// Regex-only fallback: similarity plus fixed increments per detected
/// signal, capped at 1.0.
#[must_use]
pub fn blend_heuristic(similarity: f32, info: &VersionInfo) -> f32 {
    let mut score = similarity;
    if info.version.is_some() {
        score += BOOST_VERSION;
    }
    if info.update_kind.is_some() {
        score += BOOST_UPDATE_KEYWORD;
    }
    if info.build.is_some() {
        score += BOOST_BUILD;
    }
    score.min(1.0)
}

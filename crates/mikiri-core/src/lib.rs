//! # Mikiri Core
//!
//! The heart of the Mikiri reconciliation engine. Decides, per tracked
//! game title, whether a freshly observed listing is a genuinely newer
//! release, a different edition, an unrelated post, or a sequel worth
//! tracking separately.
//!
//! ## Quick Start
//!
//! ```rust
//! use mikiri_core::extract::VersionExtractor;
//!
//! let extractor = VersionExtractor::new().unwrap();
//! let info = extractor.extract("Game Name v1.1-CODEX");
//!
//! assert_eq!(info.version.as_deref(), Some("v1.1"));
//! assert_eq!(info.group.as_deref(), Some("CODEX"));
//! ```

pub mod compare;
pub mod engine;
pub mod error;
pub mod extract;
pub mod resolve;
pub mod scoring;
pub mod types;

// Re-export primary API
pub use compare::{Comparison, compare};
pub use engine::{CycleContext, DecisionEngine, EngineConfig, RelationDetector};
pub use error::{MikiriError, Result};
pub use extract::{TitleNormalizer, VersionExtractor};
pub use resolve::{NoResolver, ResolveQuery, ResolvedVersion, VersionResolver};
pub use scoring::{
    CandidateVerdict, ClassifyCandidate, ClassifyRequest, NoClassifier, SimilarityScorer,
    UpdateClassifier,
};
pub use types::{
    CandidateListing, CycleReport, Decision, PendingUpdate, RelatedSuggestion, TitleDecision,
    TrackedTitle, UpdateEvent, UpdateHistoryEntry, VersionInfo,
};

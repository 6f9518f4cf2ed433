//! Structured data types shared across the engine.

mod decision;
mod title;
mod version;

pub use decision::{
    ApprovalSource, ChangeKind, CycleReport, Decision, PendingUpdate, RelatedSuggestion,
    RelationKind, TitleDecision, UpdateEvent, UpdateHistoryEntry,
};
pub use title::{
    CandidateListing, RepackPreference, TrackedTitle, TrackingPrefs, TrackingProvenance,
    VerifiedAxis,
};
pub use version::{ReleaseTag, ReleaseTier, UpdateKind, VersionInfo};

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::title::TrackedTitle;
use super::version::VersionInfo;

/// What kind of transition an approved update represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Major,
    Minor,
    Patch,
    Build,
    /// Calendar-ordered date-version transition.
    Date,
    /// The release moved up the priority hierarchy (e.g. first release
    /// to PROPER, or date-stamped scheme to a real version).
    TierUpgrade,
    /// No comparable difference.
    None,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
            Self::Patch => write!(f, "patch"),
            Self::Build => write!(f, "build"),
            Self::Date => write!(f, "date"),
            Self::TierUpgrade => write!(f, "tier upgrade"),
            Self::None => write!(f, "none"),
        }
    }
}

/// How an update entered the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalSource {
    /// Cleared the auto-approval gate.
    Auto,
    /// Confirmed by a human from the pending queue.
    Manual,
}

/// An approved, immutable version transition. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateHistoryEntry {
    /// Version label the title moved to.
    pub version: String,
    /// Transition kind.
    pub change: ChangeKind,
    /// Significance on the major=10 .. build=2 scale.
    pub significance: u8,
    /// When the transition was approved.
    pub date: DateTime<Utc>,
    /// Listing link the update came from.
    pub link: String,
    /// Version label before the transition, when known.
    pub previous_version: Option<String>,
    /// Approval provenance.
    pub approval: ApprovalSource,
}

/// A matched candidate that did not clear auto-approval.
///
/// Destroyed on confirm (promoted to history) or reject (discarded).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingUpdate {
    /// Extracted signal for the candidate.
    pub info: VersionInfo,
    /// Candidate listing title.
    pub title: String,
    /// Candidate listing link.
    pub link: String,
    /// Candidate image, when present.
    #[serde(default)]
    pub image: Option<String>,
    /// Version label before the would-be transition.
    pub previous_version: Option<String>,
    /// Blended confidence at detection time.
    pub confidence: f32,
    /// Human-readable reason the update was not auto-approved.
    pub reason: String,
    /// Rationale from the external classifier, when one ran.
    #[serde(default)]
    pub classifier_reason: Option<String>,
}

/// The detected relationship between a tracked title and a moderately
/// similar listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Sequel,
    Dlc,
    Expansion,
    Remaster,
    Edition,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequel => write!(f, "sequel"),
            Self::Dlc => write!(f, "DLC"),
            Self::Expansion => write!(f, "expansion"),
            Self::Remaster => write!(f, "remaster"),
            Self::Edition => write!(f, "edition"),
        }
    }
}

/// A suggested related title awaiting review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedSuggestion {
    /// Id of the tracked title the relation was detected against.
    pub base_id: String,
    /// Listing title of the related game.
    pub title: String,
    /// Listing link.
    pub link: String,
    /// Detected relationship kind.
    pub relation: RelationKind,
    /// Raw title similarity that put the listing in the fuzzy band.
    pub similarity: f32,
    /// Detector confidence in the classification.
    pub confidence: f32,
    /// Set when a user dismissed the suggestion.
    #[serde(default)]
    pub dismissed: bool,
}

/// A notification-worthy event descriptor handed to the delivery
/// subsystem. The engine describes, never delivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEvent {
    /// Tracked title display name.
    pub title: String,
    /// Version label of the detected update.
    pub version: Option<String>,
    /// Listing link.
    pub link: String,
    /// Listing image, when present.
    #[serde(default)]
    pub image: Option<String>,
    /// Download links attached to the listing.
    #[serde(default)]
    pub download_links: Vec<String>,
    /// `true` while the update is still awaiting confirmation.
    pub pending: bool,
}

/// Engine verdict for one tracked title in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    /// The update was applied and recorded.
    AutoApproved {
        entry: UpdateHistoryEntry,
        event: UpdateEvent,
    },
    /// The update was queued for explicit confirmation.
    PendingConfirmation {
        update: PendingUpdate,
        event: UpdateEvent,
    },
    /// A related-title suggestion was queued.
    SequelSuggestion { suggestion: RelatedSuggestion },
    /// A new tracked title was created for a detected sequel.
    Tracked { title: Box<TrackedTitle> },
    /// A candidate matched but was vetoed.
    Rejected { reason: String },
    /// Nothing matched this cycle.
    NoOp,
}

impl Decision {
    /// Returns `true` for the two update-detected outcomes.
    #[must_use]
    pub fn is_update(&self) -> bool {
        matches!(
            self,
            Self::AutoApproved { .. } | Self::PendingConfirmation { .. }
        )
    }

    /// Returns `true` for the two relation outcomes.
    #[must_use]
    pub fn is_relation(&self) -> bool {
        matches!(self, Self::SequelSuggestion { .. } | Self::Tracked { .. })
    }
}

/// A decision paired with the tracked title it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleDecision {
    /// Tracked title id.
    pub id: String,
    /// The verdict.
    pub decision: Decision,
}

/// Per-cycle counters surfaced to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Titles run through the engine.
    pub checked: usize,
    /// Auto-approved plus pending updates found.
    pub updates_found: usize,
    /// Sequel/relation suggestions raised.
    pub sequels_found: usize,
    /// Titles that failed at the per-title boundary.
    pub errors: usize,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "checked {} titles: {} updates, {} sequels, {} errors",
            self.checked, self.updates_found, self.sequels_found, self.errors
        )
    }
}

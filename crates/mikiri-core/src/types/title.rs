use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::decision::{PendingUpdate, RelatedSuggestion, RelationKind, UpdateHistoryEntry};
use super::version::{ReleaseTag, ReleaseTier, VersionInfo};

/// One verified axis (version or build) with its own trust flag.
///
/// Version-trust and build-trust are independent: either, both, or
/// neither may be trusted at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedAxis {
    /// The verified value, if any.
    pub value: Option<String>,
    /// Whether the value came from a trusted confirmation.
    pub trusted: bool,
}

impl VerifiedAxis {
    /// A trusted axis holding the given value.
    #[must_use]
    pub fn trusted(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            trusted: true,
        }
    }

    /// Returns `true` when the axis holds a trusted value.
    #[must_use]
    pub fn is_trusted(&self) -> bool {
        self.trusted && self.value.is_some()
    }
}

/// Repack handling for one tracked title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepackPreference {
    /// Repacks rank like everything else.
    Neutral,
    /// Repack listings are dropped before ranking.
    Avoid,
    /// Repack listings get a ranking boost.
    Prefer,
}

impl Default for RepackPreference {
    fn default() -> Self {
        Self::Neutral
    }
}

/// Per-title preference knobs consumed by the decision engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingPrefs {
    /// Blended-confidence threshold for auto-approval. Falls back to the
    /// engine default when unset.
    #[serde(default)]
    pub auto_approve_threshold: Option<f32>,

    /// Lower bound of the sequel-detection similarity band. Falls back
    /// to the engine default when unset.
    #[serde(default)]
    pub sequel_sensitivity: Option<f32>,

    /// Repack avoid/prefer flag.
    #[serde(default)]
    pub repack: RepackPreference,

    /// Candidates from this release group always rank first.
    #[serde(default)]
    pub preferred_group: Option<String>,

    /// Create new tracked titles for detected sequels without asking.
    #[serde(default)]
    pub auto_track_sequels: bool,
}

/// Where an auto-created tracked title came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingProvenance {
    /// Id of the tracked title the relation was detected against.
    pub derived_from: String,
    /// The detected relationship kind.
    pub relation: RelationKind,
    /// The listing link that triggered the detection.
    pub link: String,
}

/// A user's subscription to one game.
///
/// Created on subscription, mutated by the decision engine (auto path)
/// or explicit confirmation (pending path), soft-deleted but never
/// hard-purged by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedTitle {
    /// Stable external id.
    pub id: String,

    /// Display title (cleaned for matching).
    pub title: String,

    /// Original, uncleaned title as first observed.
    pub original_title: String,

    /// Source site the title was subscribed from.
    #[serde(default)]
    pub source: String,

    /// Canonical link of the current release.
    #[serde(default)]
    pub link: Option<String>,

    /// Externally verified catalogue name, when a lookup confirmed one.
    #[serde(default)]
    pub verified_name: Option<String>,

    /// External catalogue id, key for cross-resolution lookups.
    #[serde(default)]
    pub catalogue_id: Option<String>,

    /// Verified version axis.
    #[serde(default)]
    pub version: VerifiedAxis,

    /// Verified build axis.
    #[serde(default)]
    pub build: VerifiedAxis,

    /// Release-priority class of the current state.
    #[serde(default)]
    pub release_class: ReleaseTier,

    /// When the title was last run through a cycle.
    #[serde(default)]
    pub last_checked: Option<DateTime<Utc>>,

    /// Ordered, append-only update history.
    #[serde(default)]
    pub history: Vec<UpdateHistoryEntry>,

    /// Detected updates awaiting explicit confirmation.
    #[serde(default)]
    pub pending_updates: Vec<PendingUpdate>,

    /// Suggested related titles awaiting review.
    #[serde(default)]
    pub pending_relations: Vec<RelatedSuggestion>,

    /// Set when an auto-approved update has not been seen by the user.
    #[serde(default)]
    pub unseen_update: bool,

    /// Sort priority, bumped on every approved update.
    #[serde(default)]
    pub sort_priority: i64,

    /// Soft-delete flag; deleted titles are skipped, never purged.
    #[serde(default)]
    pub deleted: bool,

    /// Preference knobs.
    #[serde(default)]
    pub prefs: TrackingPrefs,

    /// Provenance, set only on engine-created sequel entries.
    #[serde(default)]
    pub provenance: Option<TrackingProvenance>,
}

impl TrackedTitle {
    /// Creates a fresh subscription with no verified state.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id: id.into(),
            original_title: title.clone(),
            title,
            source: String::new(),
            link: None,
            verified_name: None,
            catalogue_id: None,
            version: VerifiedAxis::default(),
            build: VerifiedAxis::default(),
            release_class: ReleaseTier::First,
            last_checked: None,
            history: Vec::new(),
            pending_updates: Vec::new(),
            pending_relations: Vec::new(),
            unseen_update: false,
            sort_priority: 0,
            deleted: false,
            prefs: TrackingPrefs::default(),
            provenance: None,
        }
    }

    /// The current state as a `VersionInfo`, for feeding the comparator.
    #[must_use]
    pub fn current_info(&self) -> VersionInfo {
        let mut info = VersionInfo::empty();
        info.version = self.version.value.clone();
        info.build = self.build.value.clone();
        if self.release_class == ReleaseTier::Proper {
            info.release_tag = Some(ReleaseTag::Proper);
        }
        info.confidence = 1.0;
        info.needs_confirmation = false;
        info
    }

    /// Returns `true` when at least one axis is trusted.
    #[must_use]
    pub fn has_trusted_axis(&self) -> bool {
        self.version.is_trusted() || self.build.is_trusted()
    }

    /// Links the engine must not re-process for this title: the current
    /// link plus everything already in history or pending.
    #[must_use]
    pub fn known_links(&self) -> Vec<&str> {
        let mut links: Vec<&str> = Vec::new();
        if let Some(ref l) = self.link {
            links.push(l);
        }
        links.extend(self.history.iter().map(|h| h.link.as_str()));
        links.extend(self.pending_updates.iter().map(|p| p.link.as_str()));
        links.extend(self.pending_relations.iter().map(|r| r.link.as_str()));
        links
    }
}

/// One externally observed release post, considered as a possible
/// update. Ephemeral; never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateListing {
    /// Raw post title as scraped.
    pub title: String,

    /// Post link; the stable key of a listing.
    pub link: String,

    /// Post date, when the source exposes one.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,

    /// Cover/teaser image link.
    #[serde(default)]
    pub image: Option<String>,

    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,

    /// Source site.
    #[serde(default)]
    pub source: String,

    /// Download links attached to the post.
    #[serde(default)]
    pub download_links: Vec<String>,
}

impl CandidateListing {
    /// A bare listing with just a title and link.
    #[must_use]
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            date: None,
            image: None,
            description: None,
            source: String::new(),
            download_links: Vec::new(),
        }
    }
}

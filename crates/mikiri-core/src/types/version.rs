use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Release-type tag carried by a listing title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseTag {
    /// A PROPER re-release fixing a broken earlier one.
    Proper,
    /// A repacked release (smaller installer, same payload).
    Repack,
    /// A straight rip.
    Rip,
    /// A crack-only fix release.
    CrackFix,
    /// A directory/naming fix release.
    DirFix,
    /// A multi-language release.
    Multi,
}

impl fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proper => write!(f, "PROPER"),
            Self::Repack => write!(f, "REPACK"),
            Self::Rip => write!(f, "RIP"),
            Self::CrackFix => write!(f, "CRACKFIX"),
            Self::DirFix => write!(f, "DIRFIX"),
            Self::Multi => write!(f, "MULTI"),
        }
    }
}

/// Update-type keyword carried by a listing title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateKind {
    Update,
    Patch,
    Hotfix,
    Dlc,
    Expansion,
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Update => write!(f, "update"),
            Self::Patch => write!(f, "patch"),
            Self::Hotfix => write!(f, "hotfix"),
            Self::Dlc => write!(f, "DLC"),
            Self::Expansion => write!(f, "expansion"),
        }
    }
}

/// Release-priority tier. Ordering is the acceptance hierarchy:
/// a transition that lowers the tier is rejected before any numeric
/// comparison happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseTier {
    /// Unversioned first release.
    First,
    /// Unversioned but PROPER-tagged.
    Proper,
    /// Carries a version or build number.
    Versioned,
}

impl Default for ReleaseTier {
    fn default() -> Self {
        Self::First
    }
}

impl fmt::Display for ReleaseTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => write!(f, "first release"),
            Self::Proper => write!(f, "proper"),
            Self::Versioned => write!(f, "versioned"),
        }
    }
}

/// The structured signal extracted from one raw listing title.
///
/// Version and build are independently optional; both absent is a legal
/// "no structured signal" result. A date-shaped version keeps its raw
/// token in `version` and additionally carries the parsed calendar date
/// in `date_version` so it is compared by calendar order, never
/// component order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Version string as matched (e.g. "v1.1", "1.0.17a", "2024-01-15").
    pub version: Option<String>,

    /// Build/revision number as matched (digits only).
    pub build: Option<String>,

    /// Release-type tag (PROPER, REPACK, ...).
    pub release_tag: Option<ReleaseTag>,

    /// Update-type keyword (update, patch, hotfix, ...).
    pub update_kind: Option<UpdateKind>,

    /// Scene/release group name (e.g. "CODEX", "FitGirl").
    pub group: Option<String>,

    /// Parsed calendar date when the version is date-shaped.
    pub date_version: Option<NaiveDate>,

    /// Confidence score in `[0.0, 1.0]` from the extraction heuristics.
    pub confidence: f32,

    /// Signal is too weak to act on without a human looking at it.
    pub needs_confirmation: bool,
}

impl VersionInfo {
    /// Creates an empty `VersionInfo` with zero confidence.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            version: None,
            build: None,
            release_tag: None,
            update_kind: None,
            group: None,
            date_version: None,
            confidence: 0.0,
            needs_confirmation: true,
        }
    }

    /// Returns `true` if the listing carried any structured signal at all.
    #[must_use]
    pub fn has_signal(&self) -> bool {
        self.version.is_some()
            || self.build.is_some()
            || self.release_tag.is_some()
            || self.update_kind.is_some()
    }

    /// Returns `true` when the version token is date-shaped.
    #[must_use]
    pub fn is_date_version(&self) -> bool {
        self.date_version.is_some()
    }

    /// The release-priority tier this signal occupies.
    #[must_use]
    pub fn tier(&self) -> ReleaseTier {
        if self.version.is_some() || self.build.is_some() {
            ReleaseTier::Versioned
        } else if self.release_tag == Some(ReleaseTag::Proper) {
            ReleaseTier::Proper
        } else {
            ReleaseTier::First
        }
    }

    /// A displayable version label: the version, else the build, else
    /// the release tag, else "unversioned".
    #[must_use]
    pub fn display_version(&self) -> String {
        if let Some(ref v) = self.version {
            v.clone()
        } else if let Some(ref b) = self.build {
            format!("build {b}")
        } else if let Some(tag) = self.release_tag {
            tag.to_string()
        } else {
            "unversioned".to_string()
        }
    }
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VersionInfo({}", self.display_version())?;
        if let Some(ref g) = self.group {
            write!(f, ", group={g}")?;
        }
        if let Some(tag) = self.release_tag {
            write!(f, ", tag={tag}")?;
        }
        write!(f, ", conf={:.2})", self.confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_info_has_no_signal() {
        let info = VersionInfo::empty();
        assert!(!info.has_signal());
        assert!(info.needs_confirmation);
        assert_eq!(info.tier(), ReleaseTier::First);
        assert_eq!(info.display_version(), "unversioned");
    }

    #[test]
    fn tier_prefers_version_over_tag() {
        let mut info = VersionInfo::empty();
        info.release_tag = Some(ReleaseTag::Proper);
        assert_eq!(info.tier(), ReleaseTier::Proper);

        info.version = Some("v1.0".into());
        assert_eq!(info.tier(), ReleaseTier::Versioned);
    }

    #[test]
    fn build_only_is_versioned_tier() {
        let mut info = VersionInfo::empty();
        info.build = Some("12345".into());
        assert_eq!(info.tier(), ReleaseTier::Versioned);
        assert_eq!(info.display_version(), "build 12345");
    }

    #[test]
    fn tier_ordering_is_the_hierarchy() {
        assert!(ReleaseTier::Versioned > ReleaseTier::Proper);
        assert!(ReleaseTier::Proper > ReleaseTier::First);
    }

    #[test]
    fn version_info_serialization_roundtrip() {
        let mut info = VersionInfo::empty();
        info.version = Some("v1.2.3".into());
        info.build = Some("4821".into());
        info.release_tag = Some(ReleaseTag::Proper);
        info.update_kind = Some(UpdateKind::Hotfix);
        info.group = Some("CODEX".into());
        info.confidence = 0.97;
        info.needs_confirmation = false;

        let json = serde_json::to_string(&info).unwrap();
        let back: VersionInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(info, back);
    }

    #[test]
    fn date_version_flag() {
        let mut info = VersionInfo::empty();
        assert!(!info.is_date_version());
        info.version = Some("2024-01-15".into());
        info.date_version = NaiveDate::from_ymd_opt(2024, 1, 15);
        assert!(info.is_date_version());
        assert_eq!(info.tier(), ReleaseTier::Versioned);
    }
}

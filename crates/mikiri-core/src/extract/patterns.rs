use regex::Regex;

use crate::error::Result;
use crate::types::{ReleaseTag, UpdateKind};

/// Scene/release groups seen often enough to trust on sight.
pub const KNOWN_GROUPS: &[&str] = &[
    "CODEX", "SKIDROW", "PLAZA", "RELOADED", "EMPRESS", "RUNE", "TENOKE", "FLT", "HOODLUM",
    "CPY", "RAZOR1911", "PROPHET", "DARKSIDERS", "TINYISO", "SIMPLEX", "CHRONOS", "GOLDBERG",
    "FITGIRL", "DODI", "ELAMIGOS", "GOG", "XATAB", "KAOSKREW",
];

/// Groups whose releases are repacks by definition.
pub const REPACK_GROUPS: &[&str] = &["FITGIRL", "DODI", "ELAMIGOS", "XATAB", "KAOSKREW"];

/// Returns `true` if `name` is a known scene/release group.
#[must_use]
pub fn is_known_group(name: &str) -> bool {
    KNOWN_GROUPS.iter().any(|g| g.eq_ignore_ascii_case(name))
}

/// Returns `true` if `name` is a known repack group.
#[must_use]
pub fn is_repack_group(name: &str) -> bool {
    REPACK_GROUPS.iter().any(|g| g.eq_ignore_ascii_case(name))
}

/// The ordered pattern families the extractor walks. Order matters:
/// date shapes are checked before plain semantic versions so a
/// date-shaped token is not mistaken for a deep version number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    DateVersion,
    SemanticVersion,
    Build,
    SceneGroup,
    ReleaseTag,
    UpdateKind,
}

/// Extraction order for the pattern families.
pub const FAMILY_ORDER: &[Family] = &[
    Family::DateVersion,
    Family::SemanticVersion,
    Family::Build,
    Family::SceneGroup,
    Family::ReleaseTag,
    Family::UpdateKind,
];

/// Pre-compiled pattern set for the extractor and normalizer.
pub struct PatternSet {
    pub(crate) re_semver: Regex,
    pub(crate) re_bare_v: Regex,
    pub(crate) re_build: Regex,
    pub(crate) re_date_iso: Regex,
    pub(crate) re_date_compact: Regex,
    pub(crate) re_date_locale: Regex,
    pub(crate) re_group_suffix: Regex,
    pub(crate) re_release_tag: Regex,
    pub(crate) re_update_kind: Regex,
}

impl PatternSet {
    /// Compiles the pattern set.
    ///
    /// # Errors
    ///
    /// Returns `MikiriError::RegexError` if any pattern fails to compile
    /// (should never happen with the static patterns defined here).
    pub fn new() -> Result<Self> {
        Ok(Self {
            re_semver: Regex::new(r"(?i)\bv(\d+(?:\.\d+)*[a-z]?)\b|\b(\d+(?:\.\d+)+[a-z]?)\b")?,
            re_bare_v: Regex::new(r"(?i)\bv(\d+)\b")?,
            re_build: Regex::new(r"(?i)\b(?:build|rev(?:ision)?)[\s#.]*(\d{1,10})\b|\bb(\d{3,10})\b|#(\d{3,10})\b")?,
            re_date_iso: Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b")?,
            re_date_compact: Regex::new(r"\b(\d{8})\b")?,
            re_date_locale: Regex::new(r"\b(\d{2})\.(\d{2})\.(\d{2})\b")?,
            re_group_suffix: Regex::new(r"-([A-Za-z0-9]{2,20})\s*$")?,
            re_release_tag: Regex::new(
                r"(?i)\b(proper|repack|crackfix|dirfix|multi\d*|rip)\b",
            )?,
            re_update_kind: Regex::new(r"(?i)\b(hotfix|patch|update|dlc|expansion)\b")?,
        })
    }

    /// Maps a matched release-tag keyword to its enum value.
    pub(crate) fn release_tag_of(keyword: &str) -> Option<ReleaseTag> {
        let kw = keyword.to_lowercase();
        match kw.as_str() {
            "proper" => Some(ReleaseTag::Proper),
            "repack" => Some(ReleaseTag::Repack),
            "rip" => Some(ReleaseTag::Rip),
            "crackfix" => Some(ReleaseTag::CrackFix),
            "dirfix" => Some(ReleaseTag::DirFix),
            s if s.starts_with("multi") => Some(ReleaseTag::Multi),
            _ => None,
        }
    }

    /// Maps a matched update-kind keyword to its enum value.
    pub(crate) fn update_kind_of(keyword: &str) -> Option<UpdateKind> {
        match keyword.to_lowercase().as_str() {
            "update" => Some(UpdateKind::Update),
            "patch" => Some(UpdateKind::Patch),
            "hotfix" => Some(UpdateKind::Hotfix),
            "dlc" => Some(UpdateKind::Dlc),
            "expansion" => Some(UpdateKind::Expansion),
            _ => None,
        }
    }
}

use chrono::NaiveDate;

use crate::error::Result;
use crate::types::VersionInfo;

use super::patterns::{FAMILY_ORDER, Family, PatternSet, is_known_group};

/// Below this confidence the extracted signal is flagged for a human.
pub const CONFIRMATION_THRESHOLD: f32 = 0.7;

/// Pulls the structured version signal out of one raw listing title.
///
/// Walks the ordered pattern families, taking the first hit per family.
/// Never fails: malformed input yields a low-confidence, best-effort
/// `VersionInfo` with `needs_confirmation` set.
pub struct VersionExtractor {
    patterns: PatternSet,
}

impl VersionExtractor {
    /// Constructs an extractor with pre-compiled patterns.
    ///
    /// # Errors
    ///
    /// Returns `MikiriError::RegexError` if a pattern fails to compile
    /// (should never happen with the static patterns defined here).
    pub fn new() -> Result<Self> {
        Ok(Self {
            patterns: PatternSet::new()?,
        })
    }

    /// Extracts a `VersionInfo` from the given raw title.
    #[must_use]
    pub fn extract(&self, raw: &str) -> VersionInfo {
        let trimmed = raw.trim();
        let mut info = VersionInfo::empty();
        if trimmed.is_empty() {
            return info;
        }

        for family in FAMILY_ORDER {
            match family {
                Family::DateVersion => {
                    if let Some((token, date)) = self.extract_date(trimmed) {
                        info.version = Some(token);
                        info.date_version = Some(date);
                    }
                }
                Family::SemanticVersion => self.extract_semver(trimmed, &mut info),
                Family::Build => {
                    info.build = self.extract_build(trimmed);
                }
                Family::SceneGroup => {
                    info.group = self.extract_group(trimmed);
                }
                Family::ReleaseTag => {
                    info.release_tag = self
                        .patterns
                        .re_release_tag
                        .captures(trimmed)
                        .and_then(|c| PatternSet::release_tag_of(&c[1]));
                }
                Family::UpdateKind => {
                    info.update_kind = self
                        .patterns
                        .re_update_kind
                        .captures(trimmed)
                        .and_then(|c| PatternSet::update_kind_of(&c[1]));
                }
            }
        }

        info.confidence = self.confidence(&info);
        info.needs_confirmation = info.confidence < CONFIRMATION_THRESHOLD;
        info
    }

    /// Finds a date-shaped version token. `DD.MM.YY` tokens must
    /// range-validate before being treated as dates; otherwise they fall
    /// through and the semantic-version family picks them up as an
    /// ordinary version.
    fn extract_date(&self, input: &str) -> Option<(String, NaiveDate)> {
        if let Some(caps) = self.patterns.re_date_iso.captures(input) {
            let y: i32 = caps[1].parse().ok()?;
            let m: u32 = caps[2].parse().ok()?;
            let d: u32 = caps[3].parse().ok()?;
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                return Some((caps[0].to_string(), date));
            }
        }

        if let Some(caps) = self.patterns.re_date_compact.captures(input) {
            let digits = &caps[1];
            let y: i32 = digits[0..4].parse().ok()?;
            let m: u32 = digits[4..6].parse().ok()?;
            let d: u32 = digits[6..8].parse().ok()?;
            if (2000..=2099).contains(&y) {
                if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                    return Some((digits.to_string(), date));
                }
            }
        }

        if let Some(caps) = self.patterns.re_date_locale.captures(input) {
            let d: u32 = caps[1].parse().ok()?;
            let m: u32 = caps[2].parse().ok()?;
            let y: i32 = caps[3].parse::<i32>().ok()? + 2000;
            if (1..=31).contains(&d) && (1..=12).contains(&m) {
                if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                    return Some((caps[0].to_string(), date));
                }
            }
        }

        None
    }

    /// Fills the version slot from the semantic-version family. A real
    /// numeric version wins over a previously found date token.
    fn extract_semver(&self, input: &str, info: &mut VersionInfo) {
        // Mask the date token so it is not re-matched as a deep version.
        let masked;
        let search: &str = if let Some(ref token) = info.version {
            masked = input.replacen(token.as_str(), " ", 1);
            &masked
        } else {
            input
        };

        if let Some(m) = self.patterns.re_semver.find(search) {
            info.version = Some(m.as_str().to_string());
            info.date_version = None;
            return;
        }

        if info.version.is_none() {
            if let Some(m) = self.patterns.re_bare_v.find(search) {
                info.version = Some(m.as_str().to_string());
            }
        }
    }

    fn extract_build(&self, input: &str) -> Option<String> {
        self.patterns.re_build.captures(input).and_then(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().to_string())
        })
    }

    /// Scene group: trailing `-GROUP` tag, else any known group name
    /// appearing as its own token (covers "[FitGirl Repack]" forms).
    fn extract_group(&self, input: &str) -> Option<String> {
        if let Some(caps) = self.patterns.re_group_suffix.captures(input) {
            let tag = &caps[1];
            let all_caps = tag.len() >= 3
                && tag.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
            if is_known_group(tag) || all_caps {
                return Some(tag.to_string());
            }
        }

        input
            .split(|c: char| !c.is_alphanumeric())
            .find(|token| !token.is_empty() && is_known_group(token))
            .map(str::to_string)
    }

    /// Confidence heuristics: starts near 1.0 for a clean semantic
    /// version, drops with weaker signal shapes, small boosts for a
    /// known group and for version+build both present.
    fn confidence(&self, info: &VersionInfo) -> f32 {
        let mut conf: f32 = if info.date_version.is_some() {
            0.75
        } else if let Some(ref v) = info.version {
            if v.contains('.') { 0.95 } else { 0.85 }
        } else if info.build.is_some() {
            0.8
        } else if info.release_tag.is_some() || info.update_kind.is_some() {
            0.55
        } else {
            0.2
        };

        if info.group.as_deref().is_some_and(is_known_group) {
            conf += 0.03;
        }
        if info.version.is_some() && info.build.is_some() {
            conf += 0.05;
        }

        conf.min(1.0)
    }
}

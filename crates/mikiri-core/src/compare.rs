//! Version comparator and release-priority hierarchy.
//!
//! The hierarchy gates acceptance before any numbers are looked at:
//! versioned release > PROPER-tagged release > unversioned first
//! release. A transition that lowers the tier is rejected outright.
//! Within an equal tier, semantic versions compare component by
//! component, builds numerically, date-versions by calendar order.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{ChangeKind, ReleaseTier, VersionInfo};

/// Significance of a major-component change.
pub const SIG_MAJOR: u8 = 10;
/// Significance of a minor-component change.
pub const SIG_MINOR: u8 = 7;
/// Significance of a patch-component change.
pub const SIG_PATCH: u8 = 4;
/// Significance of a build change or deeper component.
pub const SIG_BUILD: u8 = 2;
/// Significance of a calendar-ordered date transition.
pub const SIG_DATE: u8 = 4;
/// Significance of a hierarchy upgrade.
pub const SIG_TIER_UPGRADE: u8 = 7;

/// A date-version younger than this is deferred when the current
/// version is already a proper numeric release.
pub const DATE_SETTLE_DAYS: i64 = 2;

/// Verdict of one current-vs-candidate comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// The candidate represents a newer release.
    pub is_newer: bool,
    /// What kind of transition it is.
    pub change: ChangeKind,
    /// Significance on the major=10 .. build=2 scale.
    pub significance: u8,
    /// The candidate sits below the current tier and is rejected
    /// regardless of numbers.
    pub skip_due_to_hierarchy: bool,
    /// The candidate is a very fresh date-version while the current
    /// release is a proper numeric one; wait for a regular release.
    pub should_wait_for_regular: bool,
    /// Set when the numeric jump looks implausible; such transitions
    /// are never auto-approved.
    pub suspicious: Option<String>,
}

impl Comparison {
    fn none() -> Self {
        Self {
            is_newer: false,
            change: ChangeKind::None,
            significance: 0,
            skip_due_to_hierarchy: false,
            should_wait_for_regular: false,
            suspicious: None,
        }
    }

    fn newer(change: ChangeKind, significance: u8) -> Self {
        Self {
            is_newer: true,
            change,
            significance,
            ..Self::none()
        }
    }
}

/// One dot-separated version component: leading digits plus an optional
/// trailing letter run ("17a").
#[derive(Debug, Clone, PartialEq, Eq)]
struct Component {
    num: u64,
    alpha: String,
    raw: String,
}

/// Compares the current state against a candidate's extracted signal.
///
/// `today` anchors the date-version settle policy; pass it from the
/// cycle context, never from ambient clock reads inside the engine.
#[must_use]
pub fn compare(current: &VersionInfo, candidate: &VersionInfo, today: NaiveDate) -> Comparison {
    let cur_tier = current.tier();
    let cand_tier = candidate.tier();

    if cand_tier < cur_tier {
        return Comparison {
            skip_due_to_hierarchy: true,
            ..Comparison::none()
        };
    }
    if cand_tier > cur_tier {
        return Comparison::newer(ChangeKind::TierUpgrade, SIG_TIER_UPGRADE);
    }
    if cand_tier != ReleaseTier::Versioned {
        // Equal unversioned tiers carry nothing to compare.
        return Comparison::none();
    }

    match (current.date_version, candidate.date_version) {
        (Some(cur_date), Some(cand_date)) => compare_dates(cur_date, cand_date),
        (None, Some(cand_date)) if current.version.is_some() => {
            // Current is a proper numeric release; a fresh datestamp is
            // probably a nightly that a regular version will follow.
            if (cand_date - today).num_days().abs() < DATE_SETTLE_DAYS {
                Comparison {
                    should_wait_for_regular: true,
                    ..Comparison::none()
                }
            } else {
                Comparison::none()
            }
        }
        (None, Some(_)) => Comparison::none(),
        (Some(_), None) if candidate.version.is_some() => {
            // A real numeric version supersedes a date-stamped scheme.
            Comparison::newer(ChangeKind::TierUpgrade, SIG_TIER_UPGRADE)
        }
        (Some(_), None) => compare_builds(current, candidate),
        (None, None) => compare_numeric(current, candidate),
    }
}

fn compare_dates(cur: NaiveDate, cand: NaiveDate) -> Comparison {
    if cand > cur {
        Comparison::newer(ChangeKind::Date, SIG_DATE)
    } else {
        Comparison::none()
    }
}

/// Component-wise semantic comparison, falling through to builds when
/// the versions are equal or only one side has one.
fn compare_numeric(current: &VersionInfo, candidate: &VersionInfo) -> Comparison {
    match (&current.version, &candidate.version) {
        (Some(cur), Some(cand)) => {
            let cur_comps = parse_components(cur);
            let cand_comps = parse_components(cand);
            let suspicious = suspicion(&cur_comps, &cand_comps);

            let mut cmp = match version_ordering(&cur_comps, &cand_comps) {
                (Ordering::Less, index) => {
                    let (change, significance) = change_at(index);
                    Comparison::newer(change, significance)
                }
                _ => compare_builds(current, candidate),
            };
            cmp.suspicious = suspicious;
            cmp
        }
        _ => compare_builds(current, candidate),
    }
}

fn compare_builds(current: &VersionInfo, candidate: &VersionInfo) -> Comparison {
    let cur: Option<u64> = current.build.as_deref().and_then(|b| b.parse().ok());
    let cand: Option<u64> = candidate.build.as_deref().and_then(|b| b.parse().ok());
    match (cur, cand) {
        (Some(c), Some(n)) if n > c => Comparison::newer(ChangeKind::Build, SIG_BUILD),
        _ => Comparison::none(),
    }
}

/// First differing component wins; the shorter version is padded with
/// zero components.
fn version_ordering(cur: &[Component], cand: &[Component]) -> (Ordering, usize) {
    let len = cur.len().max(cand.len());
    let zero = Component {
        num: 0,
        alpha: String::new(),
        raw: "0".to_string(),
    };

    for i in 0..len {
        let a = cur.get(i).unwrap_or(&zero);
        let b = cand.get(i).unwrap_or(&zero);
        let ord = a.num.cmp(&b.num).then_with(|| a.alpha.cmp(&b.alpha));
        if ord != Ordering::Equal {
            return (ord, i);
        }
    }
    (Ordering::Equal, len)
}

fn change_at(index: usize) -> (ChangeKind, u8) {
    match index {
        0 => (ChangeKind::Major, SIG_MAJOR),
        1 => (ChangeKind::Minor, SIG_MINOR),
        2 => (ChangeKind::Patch, SIG_PATCH),
        _ => (ChangeKind::Build, SIG_BUILD),
    }
}

fn parse_components(version: &str) -> Vec<Component> {
    version
        .trim()
        .trim_start_matches(['v', 'V'])
        .split('.')
        .map(|part| {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            let alpha: String = part.chars().skip_while(char::is_ascii_digit).collect();
            Component {
                num: digits.parse().unwrap_or(0),
                alpha: alpha.to_lowercase(),
                raw: part.to_string(),
            }
        })
        .collect()
}

/// Flags implausible jumps: zero-padding scheme changes, component-count
/// growth, a major jump of more than 2 in one step, a minor jump of
/// more than 20 under the same major.
fn suspicion(cur: &[Component], cand: &[Component]) -> Option<String> {
    if cur.is_empty() || cand.is_empty() || cur == cand {
        return None;
    }

    if cand.len() > cur.len() + 1 {
        return Some(format!(
            "version scheme grew from {} to {} components",
            cur.len(),
            cand.len()
        ));
    }

    for (a, b) in cur.iter().zip(cand.iter()) {
        let a_padded = a.raw.len() > 1 && a.raw.starts_with('0');
        let b_padded = b.raw.len() > 1 && b.raw.starts_with('0');
        if a.num == b.num && a_padded != b_padded {
            return Some(format!(
                "zero-padding scheme changed ({} vs {})",
                a.raw, b.raw
            ));
        }
    }

    if cand[0].num > cur[0].num + 2 {
        return Some(format!(
            "major version jumped from {} to {}",
            cur[0].num, cand[0].num
        ));
    }

    if cand[0].num == cur[0].num && cur.len() > 1 && cand.len() > 1 {
        let (cur_minor, cand_minor) = (cur[1].num, cand[1].num);
        if cand_minor > cur_minor + 20 {
            return Some(format!(
                "minor version jumped from {cur_minor} to {cand_minor} under the same major"
            ));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReleaseTag;

    fn versioned(version: &str) -> VersionInfo {
        let mut info = VersionInfo::empty();
        info.version = Some(version.to_string());
        info
    }

    fn with_build(build: &str) -> VersionInfo {
        let mut info = VersionInfo::empty();
        info.build = Some(build.to_string());
        info
    }

    fn dated(date: NaiveDate) -> VersionInfo {
        let mut info = VersionInfo::empty();
        info.version = Some(date.format("%Y-%m-%d").to_string());
        info.date_version = Some(date);
        info
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn minor_bump_is_newer() {
        let cmp = compare(&versioned("1.2.3"), &versioned("1.3.0"), today());
        assert!(cmp.is_newer);
        assert_eq!(cmp.change, ChangeKind::Minor);
        assert_eq!(cmp.significance, SIG_MINOR);
        assert!(cmp.suspicious.is_none());
    }

    #[test]
    fn major_bump_significance() {
        let cmp = compare(&versioned("1.9.9"), &versioned("2.0.0"), today());
        assert!(cmp.is_newer);
        assert_eq!(cmp.change, ChangeKind::Major);
        assert_eq!(cmp.significance, SIG_MAJOR);
    }

    #[test]
    fn patch_and_deep_components() {
        let cmp = compare(&versioned("1.2.3"), &versioned("1.2.4"), today());
        assert_eq!(cmp.change, ChangeKind::Patch);
        assert_eq!(cmp.significance, SIG_PATCH);

        let cmp = compare(&versioned("1.2.3.4"), &versioned("1.2.3.5"), today());
        assert_eq!(cmp.change, ChangeKind::Build);
        assert_eq!(cmp.significance, SIG_BUILD);
    }

    #[test]
    fn older_candidate_is_not_newer() {
        let cmp = compare(&versioned("1.3.0"), &versioned("1.2.9"), today());
        assert!(!cmp.is_newer);
        assert_eq!(cmp.change, ChangeKind::None);
    }

    #[test]
    fn shorter_version_pads_with_zeros() {
        let cmp = compare(&versioned("1.2"), &versioned("1.2.1"), today());
        assert!(cmp.is_newer);
        assert_eq!(cmp.change, ChangeKind::Patch);
        assert!(cmp.suspicious.is_none(), "{:?}", cmp.suspicious);
    }

    #[test]
    fn letter_suffix_breaks_ties() {
        let cmp = compare(&versioned("1.0.17"), &versioned("1.0.17a"), today());
        assert!(cmp.is_newer);

        let cmp = compare(&versioned("1.0.17a"), &versioned("1.0.17b"), today());
        assert!(cmp.is_newer);
    }

    #[test]
    fn build_numbers_compare_numerically() {
        let cmp = compare(&with_build("100"), &with_build("150"), today());
        assert!(cmp.is_newer);
        assert_eq!(cmp.change, ChangeKind::Build);
        assert_eq!(cmp.significance, SIG_BUILD);

        let cmp = compare(&with_build("150"), &with_build("100"), today());
        assert!(!cmp.is_newer);

        // Numeric, not lexicographic: 99 < 150.
        let cmp = compare(&with_build("99"), &with_build("150"), today());
        assert!(cmp.is_newer);
    }

    #[test]
    fn hierarchy_rejects_tier_downgrade() {
        // Once versioned, no unversioned candidate is ever accepted,
        // PROPER tag or not.
        let mut proper = VersionInfo::empty();
        proper.release_tag = Some(ReleaseTag::Proper);

        let cmp = compare(&versioned("1.0"), &proper, today());
        assert!(cmp.skip_due_to_hierarchy);
        assert!(!cmp.is_newer);

        let bare = VersionInfo::empty();
        let cmp = compare(&versioned("1.0"), &bare, today());
        assert!(cmp.skip_due_to_hierarchy);
    }

    #[test]
    fn proper_over_first_release_is_a_tier_upgrade() {
        let first = VersionInfo::empty();
        let mut proper = VersionInfo::empty();
        proper.release_tag = Some(ReleaseTag::Proper);

        let cmp = compare(&first, &proper, today());
        assert!(cmp.is_newer);
        assert_eq!(cmp.change, ChangeKind::TierUpgrade);
        assert_eq!(cmp.significance, SIG_TIER_UPGRADE);
    }

    #[test]
    fn versioned_over_unversioned_is_a_tier_upgrade() {
        let first = VersionInfo::empty();
        let cmp = compare(&first, &versioned("v1.0"), today());
        assert!(cmp.is_newer);
        assert_eq!(cmp.change, ChangeKind::TierUpgrade);
    }

    #[test]
    fn equal_unversioned_tiers_are_silent() {
        let cmp = compare(&VersionInfo::empty(), &VersionInfo::empty(), today());
        assert!(!cmp.is_newer);
        assert!(!cmp.skip_due_to_hierarchy);
    }

    #[test]
    fn dates_compare_by_calendar_order() {
        let jan = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let feb = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();

        let cmp = compare(&dated(jan), &dated(feb), today());
        assert!(cmp.is_newer);
        assert_eq!(cmp.change, ChangeKind::Date);

        let cmp = compare(&dated(feb), &dated(jan), today());
        assert!(!cmp.is_newer);
    }

    #[test]
    fn fresh_date_over_numeric_release_waits() {
        let fresh = today();
        let cmp = compare(&versioned("1.2.0"), &dated(fresh), today());
        assert!(cmp.should_wait_for_regular);
        assert!(!cmp.is_newer);

        let old = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let cmp = compare(&versioned("1.2.0"), &dated(old), today());
        assert!(!cmp.should_wait_for_regular);
    }

    #[test]
    fn numeric_release_supersedes_date_scheme() {
        let jan = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let cmp = compare(&dated(jan), &versioned("v1.0"), today());
        assert!(cmp.is_newer);
        assert_eq!(cmp.change, ChangeKind::TierUpgrade);
    }

    #[test]
    fn padding_scheme_change_is_suspicious() {
        let cmp = compare(&versioned("6.06"), &versioned("6.6.0.0"), today());
        assert!(cmp.suspicious.is_some(), "6.06 -> 6.6.0.0 must be suspicious");
        assert!(!cmp.is_newer);
    }

    #[test]
    fn component_growth_is_suspicious() {
        let cmp = compare(&versioned("1.2"), &versioned("1.2.0.1"), today());
        assert!(cmp.suspicious.is_some());
    }

    #[test]
    fn big_major_jump_is_suspicious() {
        let cmp = compare(&versioned("1.0"), &versioned("5.0"), today());
        assert!(cmp.is_newer);
        assert!(cmp.suspicious.is_some());

        let cmp = compare(&versioned("1.0"), &versioned("3.0"), today());
        assert!(cmp.suspicious.is_none());
    }

    #[test]
    fn big_minor_jump_is_suspicious() {
        let cmp = compare(&versioned("1.4"), &versioned("1.40"), today());
        assert!(cmp.is_newer);
        assert!(cmp.suspicious.is_some());

        let cmp = compare(&versioned("1.4"), &versioned("1.20"), today());
        assert!(cmp.suspicious.is_none());
    }

    #[test]
    fn v_prefix_is_ignored_in_comparison() {
        let cmp = compare(&versioned("v1.0"), &versioned("1.1"), today());
        assert!(cmp.is_newer);
        assert_eq!(cmp.change, ChangeKind::Minor);
    }

    #[test]
    fn comparison_serializes() {
        let cmp = compare(&versioned("1.0"), &versioned("1.1"), today());
        let json = serde_json::to_string(&cmp).unwrap();
        assert!(json.contains("\"minor\""));
    }
}

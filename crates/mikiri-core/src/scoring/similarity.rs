use std::collections::HashSet;

use crate::error::Result;
use crate::extract::TitleNormalizer;

/// Exact normalized match.
pub const SCORE_EXACT: f32 = 1.0;
/// One title contains the other; the surplus is not a sequel marker.
pub const SCORE_SUBSTRING: f32 = 0.85;
/// One title contains the other; the surplus marks a different game
/// (trailing number, roman numeral, non-trivial subtitle).
pub const SCORE_SEQUEL_SURPLUS: f32 = 0.3;

/// Computes 0..1 similarity between two titles, sequel-number aware.
///
/// Symmetric: `score(a, b) == score(b, a)`.
pub struct SimilarityScorer {
    normalizer: TitleNormalizer,
}

impl SimilarityScorer {
    /// Constructs a scorer with its own normalizer.
    ///
    /// # Errors
    ///
    /// Returns `MikiriError::RegexError` if the normalizer patterns fail
    /// to compile.
    pub fn new() -> Result<Self> {
        Ok(Self {
            normalizer: TitleNormalizer::new()?,
        })
    }

    /// Scores two raw titles.
    #[must_use]
    pub fn score(&self, a: &str, b: &str) -> f32 {
        let na = self.normalizer.normalize(a);
        let nb = self.normalizer.normalize(b);
        self.score_normalized(&na, &nb)
    }

    /// Scores two already-normalized titles.
    #[must_use]
    pub fn score_normalized(&self, na: &str, nb: &str) -> f32 {
        if na.is_empty() || nb.is_empty() {
            return 0.0;
        }
        if na == nb {
            return SCORE_EXACT;
        }

        let (short, long) = if na.len() <= nb.len() { (na, nb) } else { (nb, na) };
        if let Some(surplus) = substring_surplus(short, long) {
            return if is_sequel_surplus(&surplus) {
                SCORE_SEQUEL_SURPLUS
            } else {
                SCORE_SUBSTRING
            };
        }

        // Same base, different trailing number: siblings in a series,
        // not the same game ("borderlands 2" vs "borderlands 3").
        if let (Some((base_a, num_a)), Some((base_b, num_b))) =
            (split_trailing_number(na), split_trailing_number(nb))
        {
            if base_a == base_b && num_a != num_b {
                return SCORE_SEQUEL_SURPLUS;
            }
        }

        jaccard(na, nb)
    }

    /// Access to the scorer's normalizer, for callers that need the
    /// canonical form itself.
    #[must_use]
    pub fn normalizer(&self) -> &TitleNormalizer {
        &self.normalizer
    }
}

/// If `short` occurs in `long` on token boundaries, returns the leftover
/// text of `long` with the occurrence removed.
fn substring_surplus(short: &str, long: &str) -> Option<String> {
    let idx = long.find(short)?;
    let end = idx + short.len();

    let left_ok = idx == 0 || long.as_bytes()[idx - 1] == b' ';
    let right_ok = end == long.len() || long.as_bytes()[end] == b' ';
    if !left_ok || !right_ok {
        return None;
    }

    let surplus = format!("{} {}", &long[..idx], &long[end..]);
    Some(surplus.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// A surplus marks a different game when it is a number, a roman
/// numeral, or long enough to be a subtitle.
fn is_sequel_surplus(surplus: &str) -> bool {
    if surplus.is_empty() {
        return false;
    }
    if surplus.split_whitespace().any(|t| t.parse::<u32>().is_ok()) {
        return true;
    }
    if matches!(
        surplus,
        "i" | "ii" | "iii" | "iv" | "v" | "vi" | "vii" | "viii" | "ix" | "x"
    ) {
        return true;
    }
    surplus.len() >= 4
}

/// Splits off a trailing numeric token: "borderlands 2" -> ("borderlands", "2").
fn split_trailing_number(title: &str) -> Option<(&str, &str)> {
    let (base, last) = title.rsplit_once(' ')?;
    if last.chars().all(|c| c.is_ascii_digit()) {
        Some((base, last))
    } else {
        None
    }
}

/// Jaccard overlap of tokens longer than one character.
fn jaccard(a: &str, b: &str) -> f32 {
    let ta: HashSet<&str> = a.split_whitespace().filter(|t| t.len() > 1).collect();
    let tb: HashSet<&str> = b.split_whitespace().filter(|t| t.len() > 1).collect();
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }

    let intersection = ta.intersection(&tb).count() as f32;
    let union = ta.union(&tb).count() as f32;
    intersection / union
}

use crate::error::Result;
use crate::extract::TitleNormalizer;
use crate::types::RelationKind;

/// Keywords marking downloadable-content releases.
const DLC_WORDS: &[&str] = &["dlc", "expansion", "season pass", "add-on", "addon"];

/// Keywords marking re-releases of an existing game.
const REMASTER_WORDS: &[&str] = &[
    "remaster",
    "remastered",
    "definitive",
    "redux",
    "anniversary",
];

/// Keywords marking edition variants.
const EDITION_WORDS: &[&str] = &["edition", "goty", "game of the year", "complete"];

/// A classified relationship between a tracked title and a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    /// What the listing is relative to the base title.
    pub kind: RelationKind,
    /// Detector confidence in the classification.
    pub confidence: f32,
}

/// Classifies medium-similarity non-matches as sequel/edition/DLC
/// candidates.
///
/// Keyword checks run against the raw titles (the normalizer strips
/// edition words, so they only survive in raw text); structural checks
/// (trailing numbers, subtitles) run against the normalized forms.
pub struct RelationDetector {
    normalizer: TitleNormalizer,
}

impl RelationDetector {
    /// Constructs a detector with its own normalizer.
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

    /// Classifies `candidate_raw` relative to `base_title`, or `None`
    /// when no heuristic fires.
    #[must_use]
    pub fn detect(&self, base_title: &str, candidate_raw: &str) -> Option<Relation> {
        let base_lower = base_title.to_lowercase();
        let cand_lower = candidate_raw.to_lowercase();

        if contains_any(&cand_lower, DLC_WORDS) && !contains_any(&base_lower, DLC_WORDS) {
            let kind = if contains_any(&cand_lower, &["expansion"]) {
                RelationKind::Expansion
            } else {
                RelationKind::Dlc
            };
            return Some(Relation {
                kind,
                confidence: 0.8,
            });
        }

        if contains_any(&cand_lower, REMASTER_WORDS) && !contains_any(&base_lower, REMASTER_WORDS)
        {
            return Some(Relation {
                kind: RelationKind::Remaster,
                confidence: 0.75,
            });
        }

        let base = self.normalizer.normalize(base_title);
        let cand = self.normalizer.normalize(candidate_raw);
        if base.is_empty() || cand.is_empty() || base == cand {
            return None;
        }

        // Base plus a surplus: a trailing number is a sequel, a longer
        // tail is a subtitle (colon form included, the normalizer turns
        // ':' into a separator).
        if let Some(surplus) = prefix_surplus(&base, &cand) {
            if surplus.split_whitespace().any(|t| t.parse::<u32>().is_ok()) {
                return Some(Relation {
                    kind: RelationKind::Sequel,
                    confidence: 0.85,
                });
            }
            if surplus.len() >= 4 {
                return Some(Relation {
                    kind: RelationKind::Sequel,
                    confidence: 0.7,
                });
            }
        }

        // Same base, different trailing numbers: siblings in a series.
        if let (Some((stem_a, num_a)), Some((stem_b, num_b))) =
            (split_trailing_number(&base), split_trailing_number(&cand))
        {
            if stem_a == stem_b && num_a != num_b {
                return Some(Relation {
                    kind: RelationKind::Sequel,
                    confidence: 0.8,
                });
            }
        }

        if contains_any(&cand_lower, EDITION_WORDS) && !contains_any(&base_lower, EDITION_WORDS) {
            return Some(Relation {
                kind: RelationKind::Edition,
                confidence: 0.6,
            });
        }

        None
    }
}

/// Token-aware keyword check; multi-word entries match as substrings.
fn contains_any(haystack: &str, words: &[&str]) -> bool {
    words.iter().any(|word| {
        if word.contains(' ') {
            haystack.contains(word)
        } else {
            haystack
                .split(|c: char| !c.is_alphanumeric())
                .any(|token| token == *word)
        }
    })
}

/// If `cand` starts with `base` on a token boundary, returns the tail.
fn prefix_surplus(base: &str, cand: &str) -> Option<String> {
    let rest = cand.strip_prefix(base)?;
    let rest = rest.strip_prefix(' ')?;
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

fn split_trailing_number(title: &str) -> Option<(&str, &str)> {
    let (stem, last) = title.rsplit_once(' ')?;
    if last.chars().all(|c| c.is_ascii_digit()) {
        Some((stem, last))
    } else {
        None
    }
}

use regex::Regex;

use crate::error::Result;

use super::patterns::is_known_group;

/// Number words the normalizer rewrites to digits.
const NUMBER_WORDS: &[(&str, &str)] = &[
    ("one", "1"),
    ("two", "2"),
    ("three", "3"),
    ("four", "4"),
    ("five", "5"),
    ("six", "6"),
    ("seven", "7"),
    ("eight", "8"),
    ("nine", "9"),
    ("ten", "10"),
];

/// Roman numerals I..X, matched per token after separator splitting.
const ROMAN_NUMERALS: &[(&str, &str)] = &[
    ("i", "1"),
    ("ii", "2"),
    ("iii", "3"),
    ("iv", "4"),
    ("v", "5"),
    ("vi", "6"),
    ("vii", "7"),
    ("viii", "8"),
    ("ix", "9"),
    ("x", "10"),
];

/// Boils a raw release-post title down to a canonical comparison string.
///
/// The output is lowercase, digit-normalized, and free of release noise
/// (scene tags, bracketed metadata, edition words, version tokens).
/// `normalize` is pure and idempotent: feeding its output back in
/// returns the same string.
pub struct TitleNormalizer {
    re_brackets: Regex,
    re_version_token: Regex,
    re_build_token: Regex,
    re_date_token: Regex,
    re_group_word: Regex,
    re_release_word: Regex,
    re_update_word: Regex,
    re_edition_phrase: Regex,
    re_edition_word: Regex,
    re_group_suffix: Regex,
}

impl TitleNormalizer {
    /// Compiles the normalizer's patterns.
    ///
    /// # Errors
    ///
    /// Returns `MikiriError::RegexError` if any pattern fails to compile
    /// (should never happen with the static patterns defined here).
    pub fn new() -> Result<Self> {
        Ok(Self {
            re_brackets: Regex::new(r"\[[^\]]*\]|\([^)]*\)|\{[^}]*\}")?,
            re_version_token: Regex::new(r"(?i)\bv\d+(?:\.\d+)*[a-z]?\b|\b\d+(?:\.\d+)+[a-z]?\b")?,
            re_build_token: Regex::new(r"(?i)\b(?:build|rev(?:ision)?)[\s#.]*\d{1,10}\b|\bb\d{3,10}\b")?,
            re_date_token: Regex::new(r"\b\d{4}-\d{2}-\d{2}\b|\b\d{8}\b")?,
            re_group_word: Regex::new(
                r"(?i)\b(codex|skidrow|plaza|reloaded|empress|rune|tenoke|flt|hoodlum|cpy|razor1911|prophet|darksiders|tinyiso|simplex|chronos|goldberg|fitgirl|dodi|elamigos|gog|xatab|kaoskrew)\b",
            )?,
            re_release_word: Regex::new(
                r"(?i)\b(proper|repack|crackfix|dirfix|multi\d*|rip|crack(?:ed)?|drm[\s-]*free|standalone|portable|pre[\s-]*installed)\b",
            )?,
            re_update_word: Regex::new(r"(?i)\b(update|patch|hotfix)\b")?,
            re_edition_phrase: Regex::new(
                r"(?i)\b(?:gold|complete|premium|standard|limited|special|ultimate|digital|deluxe|definitive|enhanced|anniversary|collector'?s?)\s+edition\b",
            )?,
            re_edition_word: Regex::new(
                r"(?i)\b(edition|goty|game\s+of\s+the\s+year|definitive|remastered|remaster|redux|deluxe)\b",
            )?,
            re_group_suffix: Regex::new(r"-([A-Za-z0-9]{2,20})\s*$")?,
        })
    }

    /// Normalizes a raw title into its canonical comparison form.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> String {
        let mut work = raw.trim().to_string();

        work = self.re_brackets.replace_all(&work, " ").to_string();
        work = self.strip_scene_suffix(&work);
        work = self.re_build_token.replace_all(&work, " ").to_string();
        work = self.re_date_token.replace_all(&work, " ").to_string();
        work = self.re_version_token.replace_all(&work, " ").to_string();
        work = self.re_group_word.replace_all(&work, " ").to_string();
        work = self.re_release_word.replace_all(&work, " ").to_string();
        work = self.re_update_word.replace_all(&work, " ").to_string();
        work = self.re_edition_phrase.replace_all(&work, " ").to_string();
        work = self.re_edition_word.replace_all(&work, " ").to_string();

        let lowered = work.to_lowercase().replace('&', " and ");

        // Apostrophes vanish ("Baldur's" -> "baldurs"); every other
        // non-alphanumeric character becomes a separator.
        let separated: String = lowered
            .chars()
            .filter(|c| *c != '\'' && *c != '\u{2019}')
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();

        separated
            .split_whitespace()
            .map(normalize_token)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// A lighter cleanup that keeps the original casing, for display
    /// purposes (naming auto-tracked sequels, notification payloads).
    #[must_use]
    pub fn display_title(&self, raw: &str) -> String {
        let mut work = raw.trim().to_string();
        work = self.re_brackets.replace_all(&work, " ").to_string();
        work = self.strip_scene_suffix(&work);
        work = self.re_build_token.replace_all(&work, " ").to_string();
        work = self.re_version_token.replace_all(&work, " ").to_string();
        work = self.re_release_word.replace_all(&work, " ").to_string();
        work = self.re_update_word.replace_all(&work, " ").to_string();

        work.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .trim_matches(|c: char| c == '-' || c == ':' || c == ',' || c == ' ')
            .to_string()
    }

    /// Strips a trailing `-GROUP` scene tag. Only known groups or
    /// all-caps tags are treated as groups so hyphenated title words
    /// ("Spider-Man") survive.
    fn strip_scene_suffix(&self, input: &str) -> String {
        if let Some(caps) = self.re_group_suffix.captures(input) {
            let tag = &caps[1];
            let all_caps = tag.len() >= 3
                && tag.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
            if is_known_group(tag) || all_caps {
                let start = caps.get(0).map_or(input.len(), |m| m.start());
                return input[..start].to_string();
            }
        }
        input.to_string()
    }
}

/// Rewrites a single separated token: number words and roman numerals
/// become digits, everything else passes through.
fn normalize_token(token: &str) -> &str {
    for (word, digit) in NUMBER_WORDS {
        if token == *word {
            return digit;
        }
    }
    for (roman, digit) in ROMAN_NUMERALS {
        if token == *roman {
            return digit;
        }
    }
    token
}

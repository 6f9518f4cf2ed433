//! Title normalization and version/build extraction.
//!
//! The normalizer boils a noisy release-post title down to a canonical
//! comparison string; the extractor pulls the structured signal
//! (version, build, tags, group) out of the same raw text.

pub mod normalize;
pub mod patterns;
pub mod version;

pub use normalize::TitleNormalizer;
pub use patterns::PatternSet;
pub use version::VersionExtractor;

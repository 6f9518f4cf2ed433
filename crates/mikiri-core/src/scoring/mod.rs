//! Similarity scoring and confidence blending.

pub mod blend;
pub mod similarity;

pub use blend::{
    CandidateVerdict, ClassifyCandidate, ClassifyRequest, NoClassifier, UpdateClassifier,
    blend_heuristic, blend_with_verdict,
};
pub use similarity::SimilarityScorer;

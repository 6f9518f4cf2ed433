//! The orchestrating decision engine.
//!
//! Runs every tracked title against the cycle's candidate set, invoking
//! the normalizer, extractor, scorer, comparator, and blender, and
//! emits one [`Decision`](crate::types::Decision) per title.

pub mod context;
pub mod decision;
pub mod relate;

pub use context::CycleContext;
pub use decision::{DecisionEngine, EngineConfig};
pub use relate::{Relation, RelationDetector};

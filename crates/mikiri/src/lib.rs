//! # Mikiri
//!
//! Umbrella crate for the Mikiri reconciliation engine: re-exports the
//! core engine ([`mikiri_core`]) and the HTTP service clients
//! ([`mikiri_classify`]).
//!
//! ```rust
//! use mikiri::{DecisionEngine, EngineConfig};
//!
//! let engine = DecisionEngine::new(EngineConfig::default()).unwrap();
//! assert_eq!(engine.config().match_threshold, 0.8);
//! ```

pub use mikiri_core::*;

pub use mikiri_classify as classify;

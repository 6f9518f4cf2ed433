//! # Mikiri Classify
//!
//! HTTP implementations of the Mikiri engine's two optional external
//! seams: the update/no-update classifier and the catalogue
//! version-resolution lookup. Both are bounded-timeout network clients;
//! any failure is surfaced as an error for the engine to fall back on,
//! never a panic or a hung cycle.

pub mod client;
pub mod resolve;

pub use client::ClassifierClient;
pub use resolve::{MAX_IN_FLIGHT, ResolverClient, resolve_batch};

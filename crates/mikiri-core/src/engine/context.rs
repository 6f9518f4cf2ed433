use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};

use crate::types::CycleReport;

/// Cycle-scoped mutable state, passed explicitly instead of living in
/// process-wide globals.
///
/// The processed-links set prevents one discovered listing from
/// triggering duplicate notifications via both the direct-update and
/// sequel paths within a single run. A fresh context per cycle is the
/// "cleared at the start of every cycle" rule.
#[derive(Debug, Clone)]
pub struct CycleContext {
    /// Wall-clock anchor for the cycle; every timestamp the engine
    /// writes comes from here.
    pub now: DateTime<Utc>,
    /// Calendar anchor for date-version policies.
    pub today: NaiveDate,
    /// Per-cycle counters.
    pub report: CycleReport,
    processed_links: HashSet<String>,
}

impl CycleContext {
    /// Starts a fresh cycle anchored at `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            today: now.date_naive(),
            report: CycleReport::default(),
            processed_links: HashSet::new(),
        }
    }

    /// Marks a listing link as handled this cycle. Returns `true` on
    /// first sight, `false` if it was already marked.
    pub fn mark_processed(&mut self, link: &str) -> bool {
        self.processed_links.insert(link.to_string())
    }

    /// Whether a listing link was already handled this cycle.
    #[must_use]
    pub fn is_processed(&self, link: &str) -> bool {
        self.processed_links.contains(link)
    }
}

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::compare::{Comparison, compare};
use crate::error::{MikiriError, Result};
use crate::extract::patterns::is_repack_group;
use crate::extract::{TitleNormalizer, VersionExtractor};
use crate::resolve::{NoResolver, ResolveQuery, VersionResolver};
use crate::scoring::similarity::SCORE_SEQUEL_SURPLUS;
use crate::scoring::{
    CandidateVerdict, ClassifyCandidate, ClassifyRequest, NoClassifier, SimilarityScorer,
    UpdateClassifier, blend_heuristic, blend_with_verdict,
};
use crate::types::{
    ApprovalSource, CandidateListing, Decision, PendingUpdate, RelatedSuggestion,
    RepackPreference, TitleDecision, TrackedTitle, TrackingProvenance, UpdateEvent,
    UpdateHistoryEntry, VerifiedAxis, VersionInfo,
};

use super::context::CycleContext;
use super::relate::RelationDetector;

/// Engine knobs with their defaults. Per-title preferences override the
/// thresholds where `TrackingPrefs` carries a value.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Minimum similarity for a candidate to pass a match gate.
    pub match_threshold: f32,
    /// Similarity bar for the trusted-axis auto-approve arm.
    pub high_similarity: f32,
    /// Default blended-confidence bar for auto-approval.
    pub auto_approve_threshold: f32,
    /// Default lower bound of the sequel-detection band.
    pub sequel_band_lower: f32,
    /// A negative classifier verdict at or above this confidence drops
    /// the candidate outright.
    pub classifier_reject_confidence: f32,
    /// Create tracked titles for detected sequels without asking.
    pub auto_track_sequels: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.8,
            high_similarity: 0.85,
            auto_approve_threshold: 0.85,
            sequel_band_lower: 0.5,
            classifier_reject_confidence: 0.7,
            auto_track_sequels: false,
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the match-gate similarity threshold.
    #[must_use]
    pub fn with_match_threshold(mut self, threshold: f32) -> Self {
        self.match_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Sets the blended-confidence auto-approve bar.
    #[must_use]
    pub fn with_auto_approve_threshold(mut self, threshold: f32) -> Self {
        self.auto_approve_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Enables or disables fully-automatic sequel tracking.
    #[must_use]
    pub fn with_auto_track_sequels(mut self, enabled: bool) -> Self {
        self.auto_track_sequels = enabled;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.sequel_band_lower >= self.match_threshold {
            return Err(MikiriError::InvalidConfig(format!(
                "sequel band lower bound {} must sit below the match threshold {}",
                self.sequel_band_lower, self.match_threshold
            )));
        }
        Ok(())
    }
}

/// Normalized titles of every live tracked entry, for cross-title
/// duplicate checks on the sequel path.
pub struct TitleIndex {
    entries: Vec<(String, String)>,
}

impl TitleIndex {
    /// Builds the index over all non-deleted titles.
    #[must_use]
    pub fn build(normalizer: &TitleNormalizer, titles: &[TrackedTitle]) -> Self {
        Self {
            entries: titles
                .iter()
                .filter(|t| !t.deleted)
                .map(|t| (t.id.clone(), normalizer.normalize(&t.title)))
                .collect(),
        }
    }

    /// `true` when some other tracked entry already matches the listing
    /// directly — it will pick the listing up as its own update.
    fn matches_other(
        &self,
        scorer: &SimilarityScorer,
        self_id: &str,
        listing_title: &str,
        threshold: f32,
    ) -> bool {
        let cand = scorer.normalizer().normalize(listing_title);
        self.entries.iter().any(|(id, norm)| {
            id != self_id && scorer.score_normalized(norm, &cand) >= threshold
        })
    }
}

/// A matched candidate with everything the ranking needs.
struct Scored<'a> {
    listing: &'a CandidateListing,
    similarity: f32,
    info: VersionInfo,
    blended: f32,
    verdict: Option<CandidateVerdict>,
    cmp: Comparison,
}

/// The orchestrating state machine. Per tracked title and cycle:
/// `NoMatch -> CandidateFound -> {AutoApproved | PendingConfirmation |
/// Rejected}`, with the sequel path for medium-similarity non-matches.
///
/// The classifier and resolver seams are optional; the engine functions
/// (less precisely) without either.
pub struct DecisionEngine<C = NoClassifier, R = NoResolver> {
    config: EngineConfig,
    extractor: VersionExtractor,
    scorer: SimilarityScorer,
    relate: RelationDetector,
    classifier: Option<C>,
    resolver: Option<R>,
}

impl DecisionEngine<NoClassifier, NoResolver> {
    /// A heuristic-only engine: no classifier, no resolver.
    ///
    /// # Errors
    ///
    /// Returns `MikiriError::InvalidConfig` for inconsistent thresholds
    /// or `MikiriError::RegexError` if pattern compilation fails.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_services(config, None, None)
    }
}

impl<C, R> DecisionEngine<C, R>
where
    C: UpdateClassifier,
    R: VersionResolver,
{
    /// An engine wired to optional external services.
    ///
    /// # Errors
    ///
    /// Returns `MikiriError::InvalidConfig` for inconsistent thresholds
    /// or `MikiriError::RegexError` if pattern compilation fails.
    pub fn with_services(
        config: EngineConfig,
        classifier: Option<C>,
        resolver: Option<R>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            extractor: VersionExtractor::new()?,
            scorer: SimilarityScorer::new()?,
            relate: RelationDetector::new()?,
            classifier,
            resolver,
        })
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs one reconciliation cycle: every live title against the
    /// already-fetched candidate set, sequentially.
    ///
    /// One title's failure never aborts the batch: it is tallied in the
    /// report and the title's last-checked timestamp still advances.
    pub async fn run_cycle(
        &self,
        titles: &mut [TrackedTitle],
        candidates: &[CandidateListing],
        ctx: &mut CycleContext,
    ) -> Vec<TitleDecision> {
        let index = TitleIndex::build(self.scorer.normalizer(), titles);
        let mut decisions = Vec::with_capacity(titles.len());

        for title in titles.iter_mut() {
            if title.deleted {
                continue;
            }
            ctx.report.checked += 1;

            let decision = match self.process_title(title, candidates, &index, ctx).await {
                Ok(decision) => decision,
                Err(err) => {
                    warn!(id = %title.id, error = %err, "title processing failed");
                    ctx.report.errors += 1;
                    title.last_checked = Some(ctx.now);
                    Decision::NoOp
                }
            };

            if decision.is_update() {
                ctx.report.updates_found += 1;
            } else if decision.is_relation() {
                ctx.report.sequels_found += 1;
            }
            decisions.push(TitleDecision {
                id: title.id.clone(),
                decision,
            });
        }

        info!(
            checked = ctx.report.checked,
            updates = ctx.report.updates_found,
            sequels = ctx.report.sequels_found,
            errors = ctx.report.errors,
            "cycle complete"
        );
        decisions
    }

    /// Runs a single tracked title through the state machine.
    ///
    /// # Errors
    ///
    /// Per-title failures surface here so `run_cycle` can tally them
    /// without aborting the batch.
    pub async fn process_title(
        &self,
        title: &mut TrackedTitle,
        candidates: &[CandidateListing],
        index: &TitleIndex,
        ctx: &mut CycleContext,
    ) -> Result<Decision> {
        title.last_checked = Some(ctx.now);

        let matched = self.gather(title, candidates, ctx);
        if matched.is_empty() {
            return Ok(self.scan_relations(title, candidates, index, ctx));
        }
        debug!(id = %title.id, hits = matched.len(), "candidates passed the match gates");

        let current = title.current_info();
        let mut staged: Vec<(&CandidateListing, f32, VersionInfo)> = matched
            .into_iter()
            .map(|(listing, similarity)| {
                (listing, similarity, self.extractor.extract(&listing.title))
            })
            .collect();

        self.resolve_missing_axes(title, &mut staged).await;
        let verdicts = self.classify(title, &current, &staged).await;

        let mut scored: Vec<Scored<'_>> = staged
            .into_iter()
            .enumerate()
            .map(|(i, (listing, similarity, info))| {
                let verdict = verdicts.as_ref().map(|v| v[i].clone());
                let mut blended = match &verdict {
                    Some(v) => blend_with_verdict(similarity, v),
                    None => blend_heuristic(similarity, &info),
                };
                if title.prefs.repack == RepackPreference::Prefer && is_repack_listing(&info) {
                    blended = (blended + 0.05).min(1.0);
                }
                let cmp = compare(&current, &info, ctx.today);
                Scored {
                    listing,
                    similarity,
                    info,
                    blended,
                    verdict,
                    cmp,
                }
            })
            .collect();

        // A confident "not an update" buries the candidate outright.
        let before = scored.len();
        scored.retain(|s| {
            !matches!(&s.verdict, Some(v)
                if !v.is_update && v.confidence >= self.config.classifier_reject_confidence)
        });
        if scored.is_empty() {
            return Ok(Decision::Rejected {
                reason: format!("classifier rejected all {before} matched candidates"),
            });
        }

        self.rank(title, &mut scored);
        let best = scored.swap_remove(0);
        self.decide(title, &current, best, ctx)
    }

    /// Tiered match gates: cleaned title, then externally verified name,
    /// then original title. The first gate with any hit wins and later
    /// gates are skipped.
    fn gather<'a>(
        &self,
        title: &TrackedTitle,
        candidates: &'a [CandidateListing],
        ctx: &CycleContext,
    ) -> Vec<(&'a CandidateListing, f32)> {
        let known: HashSet<&str> = title.known_links().into_iter().collect();
        let gates = [
            Some(title.title.as_str()),
            title.verified_name.as_deref(),
            Some(title.original_title.as_str()),
        ];

        for gate in gates.into_iter().flatten() {
            let hits: Vec<(&CandidateListing, f32)> = candidates
                .iter()
                .filter(|listing| {
                    !known.contains(listing.link.as_str()) && !ctx.is_processed(&listing.link)
                })
                .filter(|listing| {
                    !(title.prefs.repack == RepackPreference::Avoid
                        && is_repack_listing(&self.extractor.extract(&listing.title)))
                })
                .filter_map(|listing| {
                    let similarity = self.scorer.score(gate, &listing.title);
                    (similarity >= self.config.match_threshold).then_some((listing, similarity))
                })
                .collect();
            if !hits.is_empty() {
                return hits;
            }
        }
        Vec::new()
    }

    /// Cross-resolution: when a candidate carries exactly one axis or a
    /// date-shaped version and the title has a catalogue id, ask the
    /// catalogue to fill in the rest. Failure degrades, never aborts.
    async fn resolve_missing_axes(
        &self,
        title: &TrackedTitle,
        staged: &mut [(&CandidateListing, f32, VersionInfo)],
    ) {
        let (Some(resolver), Some(catalogue_id)) = (&self.resolver, &title.catalogue_id) else {
            return;
        };

        for (_, _, info) in staged.iter_mut() {
            let query = ResolveQuery {
                catalogue_id: catalogue_id.clone(),
                known_version: info.version.clone(),
                known_build: info.build.clone(),
                date_version: info.date_version,
            };
            if !query.has_single_axis() && query.date_version.is_none() {
                continue;
            }

            match resolver.resolve(&query).await {
                Ok(Some(resolved)) => {
                    if let Some(version) = resolved.version {
                        if info.version.is_none() || info.is_date_version() {
                            info.version = Some(version);
                            info.date_version = None;
                        }
                    }
                    if let Some(build) = resolved.build {
                        if info.build.is_none() {
                            info.build = Some(build);
                        }
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(id = %title.id, error = %err, "version resolution failed; continuing without");
                }
            }
        }
    }

    /// Submits every matched candidate to the classifier, when one is
    /// configured. Any failure falls back to the regex-only path.
    async fn classify(
        &self,
        title: &TrackedTitle,
        current: &VersionInfo,
        staged: &[(&CandidateListing, f32, VersionInfo)],
    ) -> Option<Vec<CandidateVerdict>> {
        let classifier = self.classifier.as_ref()?;

        let request = ClassifyRequest {
            subject: title.title.clone(),
            context: Some(format!("current release: {}", current.display_version())),
            candidates: staged
                .iter()
                .map(|(listing, similarity, _)| ClassifyCandidate {
                    title: listing.title.clone(),
                    similarity: *similarity,
                    link: listing.link.clone(),
                    date: listing.date,
                })
                .collect(),
        };

        match classifier.classify(&request).await {
            Ok(verdicts) if verdicts.len() == staged.len() => Some(verdicts),
            Ok(verdicts) => {
                warn!(
                    id = %title.id,
                    expected = staged.len(),
                    got = verdicts.len(),
                    "classifier verdict count mismatch; falling back to heuristics"
                );
                None
            }
            Err(err) => {
                warn!(id = %title.id, error = %err, "classifier unavailable; falling back to heuristics");
                None
            }
        }
    }

    /// Ranking: preferred release group first, then blended confidence,
    /// tie-broken by the trusted-axis comparator verdict, then raw
    /// similarity.
    fn rank(&self, title: &TrackedTitle, scored: &mut [Scored<'_>]) {
        let preferred = |s: &Scored<'_>| -> bool {
            match (&title.prefs.preferred_group, &s.info.group) {
                (Some(want), Some(have)) => want.eq_ignore_ascii_case(have),
                _ => false,
            }
        };
        let trusted_newer =
            |s: &Scored<'_>| -> bool { title.has_trusted_axis() && s.cmp.is_newer };

        scored.sort_by(|a, b| {
            preferred(b)
                .cmp(&preferred(a))
                .then_with(|| {
                    b.blended
                        .partial_cmp(&a.blended)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| trusted_newer(b).cmp(&trusted_newer(a)))
                .then_with(|| {
                    b.similarity
                        .partial_cmp(&a.similarity)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
        });
    }

    /// The terminal step: auto-approve, pend, or reject the best
    /// candidate.
    fn decide(
        &self,
        title: &mut TrackedTitle,
        current: &VersionInfo,
        best: Scored<'_>,
        ctx: &mut CycleContext,
    ) -> Result<Decision> {
        if best.cmp.skip_due_to_hierarchy {
            return Ok(Decision::Rejected {
                reason: format!(
                    "candidate sits below the current {} tier",
                    current.tier()
                ),
            });
        }
        if best.cmp.should_wait_for_regular {
            return Ok(Decision::Rejected {
                reason: "date-stamped release is too fresh; waiting for a regular version".into(),
            });
        }

        if let Some(ref why) = best.cmp.suspicious {
            let reason = format!("version jump looks implausible: {why}");
            return Ok(self.pend(title, best, reason, ctx));
        }

        let threshold = title
            .prefs
            .auto_approve_threshold
            .unwrap_or(self.config.auto_approve_threshold);
        let trusted_newer = title.has_trusted_axis()
            && best.cmp.is_newer
            && best.similarity >= self.config.high_similarity;
        let exact_newer = best.similarity >= 1.0 && best.cmp.is_newer;
        let confident = best.blended >= threshold
            && (best.cmp.is_newer || !title.has_trusted_axis());

        if trusted_newer || exact_newer || confident {
            return Ok(self.approve(title, best, ctx));
        }

        if best.info.has_signal() {
            let reason = self.pending_reason(title, &best, threshold);
            return Ok(self.pend(title, best, reason, ctx));
        }

        Ok(Decision::Rejected {
            reason: "candidate carries no structured signal".into(),
        })
    }

    fn pending_reason(&self, title: &TrackedTitle, best: &Scored<'_>, threshold: f32) -> String {
        if title.has_trusted_axis() && !best.cmp.is_newer {
            format!(
                "could not confirm {} is newer than the current {}",
                best.info.display_version(),
                title.current_info().display_version()
            )
        } else if best.similarity < self.config.high_similarity {
            format!(
                "similarity {:.2} is below the auto-approve bar",
                best.similarity
            )
        } else {
            format!(
                "blended confidence {:.2} is below the threshold {threshold:.2}",
                best.blended
            )
        }
    }

    /// Applies an approved update: history entry, trusted axes, class,
    /// link, priority bump, unseen flag — and describes it for delivery.
    fn approve(
        &self,
        title: &mut TrackedTitle,
        best: Scored<'_>,
        ctx: &mut CycleContext,
    ) -> Decision {
        ctx.mark_processed(&best.listing.link);

        let previous = title
            .version
            .value
            .clone()
            .or_else(|| title.build.value.clone().map(|b| format!("build {b}")));
        let entry = UpdateHistoryEntry {
            version: best.info.display_version(),
            change: best.cmp.change,
            significance: best.cmp.significance,
            date: ctx.now,
            link: best.listing.link.clone(),
            previous_version: previous,
            approval: ApprovalSource::Auto,
        };
        title.history.push(entry.clone());

        if let Some(ref version) = best.info.version {
            title.version = VerifiedAxis::trusted(version.clone());
        }
        if let Some(ref build) = best.info.build {
            title.build = VerifiedAxis::trusted(build.clone());
        }
        title.release_class = title.release_class.max(best.info.tier());
        title.link = Some(best.listing.link.clone());
        title.unseen_update = true;
        title.sort_priority += 1;

        info!(
            id = %title.id,
            version = %entry.version,
            change = %entry.change,
            "update auto-approved"
        );

        let event = UpdateEvent {
            title: title.title.clone(),
            version: best.info.has_signal().then(|| best.info.display_version()),
            link: best.listing.link.clone(),
            image: best.listing.image.clone(),
            download_links: best.listing.download_links.clone(),
            pending: false,
        };
        Decision::AutoApproved { entry, event }
    }

    /// Queues a detected update for explicit confirmation.
    fn pend(
        &self,
        title: &mut TrackedTitle,
        best: Scored<'_>,
        reason: String,
        ctx: &mut CycleContext,
    ) -> Decision {
        ctx.mark_processed(&best.listing.link);

        let update = PendingUpdate {
            info: best.info.clone(),
            title: best.listing.title.clone(),
            link: best.listing.link.clone(),
            image: best.listing.image.clone(),
            previous_version: title.version.value.clone(),
            confidence: best.blended,
            reason: reason.clone(),
            classifier_reason: best.verdict.and_then(|v| v.reason),
        };
        title.pending_updates.push(update.clone());

        info!(id = %title.id, reason = %reason, "update queued for confirmation");

        let event = UpdateEvent {
            title: title.title.clone(),
            version: best.info.has_signal().then(|| best.info.display_version()),
            link: best.listing.link.clone(),
            image: best.listing.image.clone(),
            download_links: best.listing.download_links.clone(),
            pending: true,
        };
        Decision::PendingConfirmation { update, event }
    }

    /// The sequel path: medium-similarity non-matches are classified as
    /// sequel/edition/DLC candidates. A listing another tracked entry
    /// matches directly is left for that entry instead.
    fn scan_relations(
        &self,
        title: &mut TrackedTitle,
        candidates: &[CandidateListing],
        index: &TitleIndex,
        ctx: &mut CycleContext,
    ) -> Decision {
        let lower = title
            .prefs
            .sequel_sensitivity
            .unwrap_or(self.config.sequel_band_lower);
        let known: HashSet<&str> = title.known_links().into_iter().collect();

        for listing in candidates {
            if ctx.is_processed(&listing.link) || known.contains(listing.link.as_str()) {
                continue;
            }

            let similarity = self.scorer.score(&title.title, &listing.title);
            let in_band = (similarity >= lower && similarity < self.config.match_threshold)
                || (similarity - SCORE_SEQUEL_SURPLUS).abs() < f32::EPSILON;
            if !in_band {
                continue;
            }

            if index.matches_other(
                &self.scorer,
                &title.id,
                &listing.title,
                self.config.match_threshold,
            ) {
                debug!(link = %listing.link, "listing belongs to another tracked title");
                continue;
            }

            let Some(relation) = self.relate.detect(&title.title, &listing.title) else {
                continue;
            };
            ctx.mark_processed(&listing.link);

            if title.prefs.auto_track_sequels || self.config.auto_track_sequels {
                let tracked = self.track_sequel(title, listing, &relation);
                info!(
                    base = %title.id,
                    new = %tracked.id,
                    relation = %relation.kind,
                    "auto-tracking detected relation"
                );
                return Decision::Tracked {
                    title: Box::new(tracked),
                };
            }

            let suggestion = RelatedSuggestion {
                base_id: title.id.clone(),
                title: listing.title.clone(),
                link: listing.link.clone(),
                relation: relation.kind,
                similarity,
                confidence: relation.confidence,
                dismissed: false,
            };
            title.pending_relations.push(suggestion.clone());
            info!(
                base = %title.id,
                relation = %relation.kind,
                similarity,
                "relation suggested for review"
            );
            return Decision::SequelSuggestion { suggestion };
        }

        Decision::NoOp
    }

    /// Builds a new tracked title for an auto-tracked sequel, with full
    /// provenance recorded.
    fn track_sequel(
        &self,
        base: &TrackedTitle,
        listing: &CandidateListing,
        relation: &super::relate::Relation,
    ) -> TrackedTitle {
        let display = self.scorer.normalizer().display_title(&listing.title);
        let mut tracked = TrackedTitle::new(format!("related:{}", listing.link), display);
        tracked.original_title = listing.title.clone();
        tracked.source = listing.source.clone();
        tracked.link = Some(listing.link.clone());
        tracked.prefs = base.prefs.clone();
        tracked.provenance = Some(TrackingProvenance {
            derived_from: base.id.clone(),
            relation: relation.kind,
            link: listing.link.clone(),
        });
        tracked
    }
}

/// Repack detection for the avoid/prefer preference.
fn is_repack_listing(info: &VersionInfo) -> bool {
    info.release_tag == Some(crate::types::ReleaseTag::Repack)
        || info.group.as_deref().is_some_and(is_repack_group)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::types::{ChangeKind, ReleaseTier};

    fn ctx() -> CycleContext {
        CycleContext::new(chrono::Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
    }

    fn engine() -> DecisionEngine {
        DecisionEngine::new(EngineConfig::default()).unwrap()
    }

    fn tracked(id: &str, name: &str) -> TrackedTitle {
        TrackedTitle::new(id, name)
    }

    fn versioned_title(id: &str, name: &str, version: &str) -> TrackedTitle {
        let mut t = tracked(id, name);
        t.version = VerifiedAxis::trusted(version);
        t.release_class = ReleaseTier::Versioned;
        t
    }

    async fn run_one(
        engine: &DecisionEngine,
        title: &mut TrackedTitle,
        candidates: &[CandidateListing],
        ctx: &mut CycleContext,
    ) -> Decision {
        let index = TitleIndex::build(engine.scorer.normalizer(), std::slice::from_ref(title));
        engine
            .process_title(title, candidates, &index, ctx)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn scenario_a_exact_match_auto_approves() {
        let e = engine();
        let mut title = versioned_title("gs-1", "Game Name", "v1.0");
        let candidates = vec![CandidateListing::new(
            "Game Name v1.1-CODEX",
            "https://b/game-name-v11",
        )];
        let mut c = ctx();

        let decision = run_one(&e, &mut title, &candidates, &mut c).await;
        let Decision::AutoApproved { entry, event } = decision else {
            panic!("expected auto-approval, got {decision:?}");
        };
        assert_eq!(entry.version, "v1.1");
        assert_eq!(entry.previous_version.as_deref(), Some("v1.0"));
        assert_eq!(entry.change, ChangeKind::Minor);
        assert!(!event.pending);

        assert_eq!(title.version.value.as_deref(), Some("v1.1"));
        assert!(title.version.trusted);
        assert_eq!(title.history.len(), 1);
        assert!(title.unseen_update);
        assert_eq!(title.sort_priority, 1);
        assert_eq!(title.link.as_deref(), Some("https://b/game-name-v11"));
    }

    #[tokio::test]
    async fn scenario_b_proper_upgrades_first_release() {
        let e = engine();
        let mut title = tracked("gs-2", "Game Name");
        let candidates = vec![CandidateListing::new(
            "Game Name PROPER",
            "https://b/game-name-proper",
        )];
        let mut c = ctx();

        let decision = run_one(&e, &mut title, &candidates, &mut c).await;
        let Decision::AutoApproved { entry, .. } = decision else {
            panic!("expected auto-approval, got {decision:?}");
        };
        assert_eq!(entry.change, ChangeKind::TierUpgrade);
        assert_eq!(entry.significance, 7);
        assert_eq!(title.release_class, ReleaseTier::Proper);
    }

    #[tokio::test]
    async fn scenario_c_sequel_goes_to_the_relation_path() {
        let e = engine();
        let mut title = tracked("gs-3", "Mythic Quest");
        let candidates = vec![CandidateListing::new(
            "Mythic Quest II",
            "https://b/mythic-quest-2",
        )];
        let mut c = ctx();

        let decision = run_one(&e, &mut title, &candidates, &mut c).await;
        let Decision::SequelSuggestion { suggestion } = decision else {
            panic!("expected sequel suggestion, got {decision:?}");
        };
        assert_eq!(suggestion.relation, crate::types::RelationKind::Sequel);
        assert!((suggestion.similarity - 0.3).abs() < 0.01);
        assert_eq!(title.pending_relations.len(), 1);
        assert!(title.history.is_empty());
    }

    struct FixedClassifier {
        verdicts: Vec<CandidateVerdict>,
    }

    impl UpdateClassifier for FixedClassifier {
        async fn classify(&self, _req: &ClassifyRequest) -> Result<Vec<CandidateVerdict>> {
            Ok(self.verdicts.clone())
        }
    }

    struct FailingClassifier;

    impl UpdateClassifier for FailingClassifier {
        async fn classify(&self, _req: &ClassifyRequest) -> Result<Vec<CandidateVerdict>> {
            Err(MikiriError::Classifier("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn scenario_d_negative_verdict_suppresses_candidate() {
        let classifier = FixedClassifier {
            verdicts: vec![CandidateVerdict {
                is_update: false,
                confidence: 0.9,
                reason: Some("same version relisted".into()),
            }],
        };
        let e: DecisionEngine<FixedClassifier, NoResolver> =
            DecisionEngine::with_services(EngineConfig::default(), Some(classifier), None)
                .unwrap();
        let mut title = versioned_title("gs-4", "Game Name", "v1.0");
        let candidates = vec![CandidateListing::new(
            "Game Name v1.1-CODEX",
            "https://b/game-name-v11",
        )];
        let mut c = ctx();
        let index = TitleIndex::build(e.scorer.normalizer(), std::slice::from_ref(&title));

        let decision = e
            .process_title(&mut title, &candidates, &index, &mut c)
            .await
            .unwrap();
        assert!(matches!(decision, Decision::Rejected { .. }), "{decision:?}");
        assert!(title.history.is_empty());
        assert!(title.pending_updates.is_empty());
    }

    #[tokio::test]
    async fn classifier_failure_falls_back_to_heuristics() {
        let e: DecisionEngine<FailingClassifier, NoResolver> =
            DecisionEngine::with_services(EngineConfig::default(), Some(FailingClassifier), None)
                .unwrap();
        let mut title = versioned_title("gs-5", "Game Name", "v1.0");
        let candidates = vec![CandidateListing::new(
            "Game Name v1.1-CODEX",
            "https://b/game-name-v11",
        )];
        let mut c = ctx();
        let index = TitleIndex::build(e.scorer.normalizer(), std::slice::from_ref(&title));

        let decision = e
            .process_title(&mut title, &candidates, &index, &mut c)
            .await
            .unwrap();
        assert!(matches!(decision, Decision::AutoApproved { .. }), "{decision:?}");
    }

    #[tokio::test]
    async fn hierarchy_downgrade_is_rejected() {
        let e = engine();
        let mut title = versioned_title("gs-6", "Game Name", "v1.0");
        let candidates = vec![CandidateListing::new(
            "Game Name PROPER",
            "https://b/game-name-proper",
        )];
        let mut c = ctx();

        let decision = run_one(&e, &mut title, &candidates, &mut c).await;
        assert!(matches!(decision, Decision::Rejected { .. }), "{decision:?}");
        assert!(title.history.is_empty());
        assert_eq!(title.version.value.as_deref(), Some("v1.0"));
    }

    #[tokio::test]
    async fn suspicious_jump_is_pended_never_approved() {
        let e = engine();
        let mut title = versioned_title("gs-7", "Game Name", "6.06");
        let candidates = vec![CandidateListing::new(
            "Game Name v6.6.0.0",
            "https://b/game-name-v6600",
        )];
        let mut c = ctx();

        let decision = run_one(&e, &mut title, &candidates, &mut c).await;
        let Decision::PendingConfirmation { update, event } = decision else {
            panic!("expected pending confirmation, got {decision:?}");
        };
        assert!(update.reason.contains("implausible"));
        assert!(event.pending);
        assert!(title.history.is_empty());
        assert_eq!(title.pending_updates.len(), 1);
        assert_eq!(title.version.value.as_deref(), Some("6.06"));
    }

    #[tokio::test]
    async fn rerun_with_no_new_candidates_is_idempotent() {
        let e = engine();
        let mut title = versioned_title("gs-8", "Game Name", "v1.0");
        let candidates = vec![CandidateListing::new(
            "Game Name v1.1-CODEX",
            "https://b/game-name-v11",
        )];

        let mut c1 = ctx();
        let first = run_one(&e, &mut title, &candidates, &mut c1).await;
        assert!(matches!(first, Decision::AutoApproved { .. }));
        assert_eq!(title.history.len(), 1);

        // Same candidate set, fresh cycle: the link is now known.
        let mut c2 = ctx();
        let second = run_one(&e, &mut title, &candidates, &mut c2).await;
        assert!(matches!(second, Decision::NoOp), "{second:?}");
        assert_eq!(title.history.len(), 1);
        assert!(title.pending_updates.is_empty());
    }

    #[tokio::test]
    async fn pending_link_is_not_requeued() {
        let e = engine();
        let mut title = versioned_title("gs-9", "Game Name", "6.06");
        let candidates = vec![CandidateListing::new(
            "Game Name v6.6.0.0",
            "https://b/game-name-v6600",
        )];

        let mut c1 = ctx();
        run_one(&e, &mut title, &candidates, &mut c1).await;
        assert_eq!(title.pending_updates.len(), 1);

        let mut c2 = ctx();
        let second = run_one(&e, &mut title, &candidates, &mut c2).await;
        assert!(matches!(second, Decision::NoOp), "{second:?}");
        assert_eq!(title.pending_updates.len(), 1);
    }

    struct FixedResolver;

    impl VersionResolver for FixedResolver {
        async fn resolve(
            &self,
            query: &ResolveQuery,
        ) -> Result<Option<crate::resolve::ResolvedVersion>> {
            assert_eq!(query.catalogue_id, "cat-77");
            Ok(Some(crate::resolve::ResolvedVersion {
                version: Some("v1.5".into()),
                build: None,
            }))
        }
    }

    #[tokio::test]
    async fn resolver_fills_the_missing_axis() {
        let e: DecisionEngine<NoClassifier, FixedResolver> =
            DecisionEngine::with_services(EngineConfig::default(), None, Some(FixedResolver))
                .unwrap();
        let mut title = versioned_title("gs-10", "Game Name", "v1.4");
        title.catalogue_id = Some("cat-77".into());
        let candidates = vec![CandidateListing::new(
            "Game Name Build 500",
            "https://b/game-name-b500",
        )];
        let mut c = ctx();
        let index = TitleIndex::build(e.scorer.normalizer(), std::slice::from_ref(&title));

        let decision = e
            .process_title(&mut title, &candidates, &index, &mut c)
            .await
            .unwrap();
        let Decision::AutoApproved { entry, .. } = decision else {
            panic!("expected auto-approval, got {decision:?}");
        };
        assert_eq!(entry.version, "v1.5");
        assert_eq!(title.version.value.as_deref(), Some("v1.5"));
        assert_eq!(title.build.value.as_deref(), Some("500"));
    }

    #[tokio::test]
    async fn auto_track_creates_a_new_title_with_provenance() {
        let e =
            DecisionEngine::new(EngineConfig::default().with_auto_track_sequels(true)).unwrap();
        let mut title = tracked("gs-11", "Mythic Quest");
        let candidates = vec![CandidateListing::new(
            "Mythic Quest II",
            "https://b/mythic-quest-2",
        )];
        let mut c = ctx();

        let decision = run_one(&e, &mut title, &candidates, &mut c).await;
        let Decision::Tracked { title: new_title } = decision else {
            panic!("expected auto-tracked title, got {decision:?}");
        };
        let provenance = new_title.provenance.as_ref().unwrap();
        assert_eq!(provenance.derived_from, "gs-11");
        assert_eq!(provenance.relation, crate::types::RelationKind::Sequel);
        assert_eq!(new_title.original_title, "Mythic Quest II");
    }

    #[tokio::test]
    async fn cycle_dedups_listing_across_paths() {
        let e = engine();
        let mut titles = vec![
            versioned_title("gs-12", "Game Name", "v1.0"),
            tracked("gs-13", "Game Name Origins"),
        ];
        let candidates = vec![CandidateListing::new(
            "Game Name v1.1-CODEX",
            "https://b/game-name-v11",
        )];
        let mut c = ctx();

        let decisions = e.run_cycle(&mut titles, &candidates, &mut c).await;
        assert_eq!(decisions.len(), 2);
        assert!(matches!(decisions[0].decision, Decision::AutoApproved { .. }));
        // The listing was consumed by the direct path; the second
        // title's sequel scan must not raise a duplicate.
        assert!(matches!(decisions[1].decision, Decision::NoOp));
        assert_eq!(c.report.checked, 2);
        assert_eq!(c.report.updates_found, 1);
        assert_eq!(c.report.sequels_found, 0);
    }

    #[tokio::test]
    async fn listing_owned_by_another_title_is_not_suggested() {
        let e = engine();
        let mut titles = vec![
            tracked("gs-14", "Mythic Quest"),
            tracked("gs-15", "Mythic Quest 2"),
        ];
        let candidates = vec![CandidateListing::new(
            "Mythic Quest 2 v1.0",
            "https://b/mythic-quest-2-v10",
        )];
        let mut c = ctx();

        let decisions = e.run_cycle(&mut titles, &candidates, &mut c).await;
        // The base title leaves the listing for the sequel entry, which
        // takes it as its own update.
        assert!(matches!(decisions[0].decision, Decision::NoOp), "{:?}", decisions[0]);
        assert!(decisions[1].decision.is_update(), "{:?}", decisions[1]);
        assert!(titles[0].pending_relations.is_empty());
    }

    #[tokio::test]
    async fn deleted_titles_are_skipped() {
        let e = engine();
        let mut titles = vec![versioned_title("gs-16", "Game Name", "v1.0")];
        titles[0].deleted = true;
        let candidates = vec![CandidateListing::new(
            "Game Name v1.1-CODEX",
            "https://b/game-name-v11",
        )];
        let mut c = ctx();

        let decisions = e.run_cycle(&mut titles, &candidates, &mut c).await;
        assert!(decisions.is_empty());
        assert_eq!(c.report.checked, 0);
    }

    #[tokio::test]
    async fn repack_avoidance_filters_candidates() {
        let e = engine();
        let mut title = versioned_title("gs-17", "Game Name", "v1.0");
        title.prefs.repack = RepackPreference::Avoid;
        let candidates = vec![CandidateListing::new(
            "Game Name v1.1 [FitGirl Repack]",
            "https://b/game-name-v11-fitgirl",
        )];
        let mut c = ctx();

        let decision = run_one(&e, &mut title, &candidates, &mut c).await;
        assert!(matches!(decision, Decision::NoOp), "{decision:?}");
        assert!(title.history.is_empty());
    }

    #[tokio::test]
    async fn preferred_group_wins_the_ranking() {
        let e = engine();
        let mut title = versioned_title("gs-18", "Game Name", "v1.0");
        title.prefs.preferred_group = Some("RUNE".into());
        let candidates = vec![
            CandidateListing::new("Game Name v1.1-CODEX", "https://b/v11-codex"),
            CandidateListing::new("Game Name v1.1-RUNE", "https://b/v11-rune"),
        ];
        let mut c = ctx();

        let decision = run_one(&e, &mut title, &candidates, &mut c).await;
        let Decision::AutoApproved { entry, .. } = decision else {
            panic!("expected auto-approval, got {decision:?}");
        };
        assert_eq!(entry.link, "https://b/v11-rune");
    }

    #[tokio::test]
    async fn last_checked_advances_even_without_matches() {
        let e = engine();
        let mut title = tracked("gs-19", "Game Name");
        let mut c = ctx();

        let decision = run_one(&e, &mut title, &[], &mut c).await;
        assert!(matches!(decision, Decision::NoOp));
        assert_eq!(title.last_checked, Some(c.now));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EngineConfig {
            sequel_band_lower: 0.9,
            ..EngineConfig::default()
        };
        assert!(matches!(
            DecisionEngine::new(config),
            Err(MikiriError::InvalidConfig(_))
        ));
    }
}

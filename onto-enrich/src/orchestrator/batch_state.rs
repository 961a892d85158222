//! Per-batch admission state
//!
//! Pure bookkeeping for the adaptive circuit breaker and the pacing rule, so
//! both can be tested without any I/O. The orchestrator asks [`BatchState::decide`]
//! what to do with each entity, performs it, then reports the result back
//! through [`BatchState::apply`].

use serde::Serialize;

/// Budget used once the batch has seen enough cache hits
pub const ELEVATED_MAX_ENTITIES: usize = 18;

/// Cache hits needed to raise the budget
pub const CACHE_HITS_FOR_ELEVATION: usize = 5;

/// What to do with the next entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Serve the cached record
    UseCached,
    /// Query the sources
    RunAdapters,
    /// Budget exhausted; emit a placeholder
    SkipByBreaker,
}

/// How an entity was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    CacheHit,
    /// Sources were queried (matched or not)
    Enriched,
    /// The entity's pipeline failed and a placeholder was substituted
    Failed,
    SkippedByBreaker,
}

impl Outcome {
    /// Whether this outcome spent adapter budget
    pub fn is_adapter_backed(&self) -> bool {
        matches!(self, Outcome::Enriched | Outcome::Failed)
    }
}

/// Batch counters reported after a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub cache_hits: usize,
    pub adapter_backed: usize,
    pub skipped_by_breaker: usize,
    pub failed: usize,
}

/// Running state of one batch
#[derive(Debug, Clone)]
pub struct BatchState {
    base_max: usize,
    total: usize,
    /// Latched once an uncached entity meets an exhausted budget
    tripped: bool,
    summary: BatchSummary,
}

impl BatchState {
    /// `base_max` is the configured budget; `total` is the batch length
    pub fn new(base_max: usize, total: usize) -> Self {
        Self {
            base_max,
            total,
            tripped: false,
            summary: BatchSummary::default(),
        }
    }

    /// Current adapter-backed budget
    ///
    /// Raised to [`ELEVATED_MAX_ENTITIES`] after [`CACHE_HITS_FOR_ELEVATION`]
    /// cache hits; a larger configured budget is never lowered.
    pub fn budget(&self) -> usize {
        if self.summary.cache_hits >= CACHE_HITS_FOR_ELEVATION {
            self.base_max.max(ELEVATED_MAX_ENTITIES)
        } else {
            self.base_max
        }
    }

    pub fn breaker_open(&self) -> bool {
        self.summary.adapter_backed >= self.budget()
    }

    /// Whether the breaker has short-circuited the rest of the batch
    pub fn tripped(&self) -> bool {
        self.tripped
    }

    /// Admission decision for the next entity
    ///
    /// Cached records are served while the breaker is untripped, even when
    /// the budget is spent. The first uncached entity that finds the budget
    /// spent trips the breaker, and every later entity is skipped.
    pub fn decide(&self, cache_hit: bool) -> Decision {
        if self.tripped {
            Decision::SkipByBreaker
        } else if cache_hit {
            Decision::UseCached
        } else if self.breaker_open() {
            Decision::SkipByBreaker
        } else {
            Decision::RunAdapters
        }
    }

    /// Record the outcome for the entity at `index`
    ///
    /// Returns whether to pause before the next entity: only after
    /// adapter-backed work, and never after the last entity.
    pub fn apply(&mut self, index: usize, outcome: Outcome) -> bool {
        self.summary.processed += 1;

        match outcome {
            Outcome::CacheHit => self.summary.cache_hits += 1,
            Outcome::Enriched => self.summary.adapter_backed += 1,
            Outcome::Failed => {
                self.summary.adapter_backed += 1;
                self.summary.failed += 1;
            }
            Outcome::SkippedByBreaker => {
                self.summary.skipped_by_breaker += 1;
                self.tripped = true;
            }
        }

        outcome.is_adapter_backed() && index + 1 < self.total
    }

    pub fn summary(&self) -> BatchSummary {
        self.summary
    }
}

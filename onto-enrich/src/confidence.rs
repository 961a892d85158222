//! Confidence aggregation
//!
//! Additive, source-local scoring: every source that yields a usable link
//! adds its fixed weight, and the total is clamped to 100. With the default
//! weights (30 + 25 + 25 + 20) full agreement across all four sources is
//! exactly 100.

use crate::types::SourceKind;

/// Upper bound of the confidence scale
pub const MAX_CONFIDENCE: u8 = 100;

/// Per-source confidence weights
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceWeights {
    pub wikipedia: u8,
    pub wikidata: u8,
    pub knowledge_graph: u8,
    pub product_ontology: u8,
}

impl Default for SourceWeights {
    fn default() -> Self {
        Self {
            wikipedia: 30,
            wikidata: 25,
            knowledge_graph: 25,
            product_ontology: 20,
        }
    }
}

impl SourceWeights {
    pub fn weight(&self, kind: SourceKind) -> u8 {
        match kind {
            SourceKind::Wikipedia => self.wikipedia,
            SourceKind::Wikidata => self.wikidata,
            SourceKind::KnowledgeGraph => self.knowledge_graph,
            SourceKind::ProductOntology => self.product_ontology,
        }
    }
}

/// Running confidence tally for one entity
#[derive(Debug, Clone)]
pub struct ConfidenceAggregator {
    weights: SourceWeights,
    total: u32,
    contributed: Vec<SourceKind>,
}

impl ConfidenceAggregator {
    pub fn new(weights: SourceWeights) -> Self {
        Self {
            weights,
            total: 0,
            contributed: Vec::with_capacity(4),
        }
    }

    /// Record a contributing source
    ///
    /// A source counts once per entity; repeated calls for the same kind are
    /// ignored.
    pub fn add(&mut self, kind: SourceKind) {
        if self.contributed.contains(&kind) {
            return;
        }
        self.contributed.push(kind);
        self.total += u32::from(self.weights.weight(kind));
    }

    /// Clamped confidence (0-100)
    pub fn confidence(&self) -> u8 {
        self.total.min(u32::from(MAX_CONFIDENCE)) as u8
    }

    /// Number of contributing sources (0-4)
    pub fn sources(&self) -> u8 {
        self.contributed.len() as u8
    }

    /// Contributing sources in the order they were added
    pub fn contributed(&self) -> &[SourceKind] {
        &self.contributed
    }
}

impl Default for ConfidenceAggregator {
    fn default() -> Self {
        Self::new(SourceWeights::default())
    }
}

/// Aggregate a set of contributing sources into `(confidence, sources)`
pub fn aggregate(contributed: &[SourceKind], weights: SourceWeights) -> (u8, u8) {
    let mut aggregator = ConfidenceAggregator::new(weights);
    for kind in contributed {
        aggregator.add(*kind);
    }
    (aggregator.confidence(), aggregator.sources())
}

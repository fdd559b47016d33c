//! Named metrics computed over oracle feeds.

use serde::{Deserialize, Serialize};

use crate::consensus::{Consensus, ConsensusAggregator};
use crate::feed::OracleFeed;
use crate::types::{Result, TruthError};

/// A named computation over an ordered, non-empty list of feeds.
///
/// `coherence` and `exhaustion` are filled in after evaluation and analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HonestMetric {
    /// Unique metric ID
    pub id: String,
    /// Display name
    pub name: String,
    /// What the metric measures
    pub description: String,
    /// Feeds the metric is computed from
    pub inputs: Vec<OracleFeed>,
    /// Source agreement (-1.0 - 1.0), set by [`HonestMetric::evaluate`]
    #[serde(default)]
    pub coherence: Option<f64>,
    /// Momentum exhaustion (0.0 - 1.0)
    #[serde(default)]
    pub exhaustion: Option<f64>,
}

impl HonestMetric {
    /// Create a metric with a generated ID.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        inputs: Vec<OracleFeed>,
    ) -> Result<Self> {
        if inputs.is_empty() {
            return Err(TruthError::EmptyInput);
        }

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            inputs,
            coherence: None,
            exhaustion: None,
        })
    }

    /// Set an explicit ID.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Attach an exhaustion reading, clamped to [0, 1].
    pub fn with_exhaustion(mut self, exhaustion: f64) -> Self {
        self.exhaustion = exhaustion.is_finite().then(|| exhaustion.clamp(0.0, 1.0));
        self
    }

    /// Aggregate the inputs and record the resulting coherence.
    pub fn evaluate(
        &mut self,
        aggregator: &ConsensusAggregator,
        now_millis: i64,
    ) -> Result<Consensus> {
        let consensus = aggregator.aggregate_at(&self.inputs, now_millis)?;
        self.coherence = Some(consensus.coherence.clamp(-1.0, 1.0));
        Ok(consensus)
    }

    /// Source identifiers of the inputs, in order.
    pub fn sources(&self) -> Vec<String> {
        self.inputs.iter().map(|f| f.source.clone()).collect()
    }
}

//! Eigenstate computation for the Honest Oracle.
//!
//! Maps a market snapshot onto six bounded dimensions, scores how strongly
//! they agree, and derives a BUY/SELL/HOLD verdict:
//!
//! ```text
//! ┌──────────────┐   ┌────────────┐   ┌───────────┐   ┌───────────┐
//! │ TruthEngine  │──►│ Normalizer │──►│ Coherence │──►│ Eigenstate│
//! │ (consensus)  │   │ (6 dims)   │   │ + decide  │   │           │
//! └──────────────┘   └────────────┘   └───────────┘   └───────────┘
//! ```
//!
//! - **Real dimensions**: price, volume, momentum (observed market fields)
//! - **Imaginary dimensions**: sentiment (derived), temporal and spatial
//!   (slow oscillations of the injected timestamp)
//!
//! The [`analysis`] module adds MACD-based momentum exhaustion for records.

pub mod analysis;
pub mod coherence;
pub mod dimensions;
pub mod pipeline;
pub mod types;

// Re-export main types
pub use coherence::{
    CoherenceConfig, CoherenceEngine, CoherenceMode, DecisionRule, DimensionWeights,
};
pub use dimensions::{DimensionNormalizer, MarketSnapshot, NormalizerConfig};
pub use pipeline::EigenstatePipeline;
pub use types::*;

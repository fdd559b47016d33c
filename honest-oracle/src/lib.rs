//! Honest Oracle service.
//!
//! Wires the truth, eigenstate and ledger crates to live market sources:
//!
//! - **Sources**: [`FeedSource`] implementations queried concurrently, each
//!   bounded by a timeout
//! - **Cache**: per-asset eigenstates with a short TTL, replaced whole on
//!   refresh and served stale when a refresh fails
//! - **Records**: eigenstate verdicts sealed into hash-verified ledger
//!   records, with MACD exhaustion over the consensus price history
//!
//! # Example
//!
//! ```ignore
//! let service = OracleService::new(OracleConfig::default())?
//!     .with_source(Arc::new(MockFeedSource::new("binance", 97_000.0)))
//!     .with_source(Arc::new(MockFeedSource::new("pyth", 97_010.0)));
//!
//! let eigenstate = service.eigenstate("btc").await?;
//! let record = service.record("btc").await?;
//! ```

pub mod cache;
pub mod config;
pub mod service;
pub mod source;
pub mod types;

// Re-export main types
pub use cache::{CachedEigenstate, EigenstateCache};
pub use config::{OracleConfig, ServiceConfig};
pub use service::{merge_quotes, OracleService};
pub use source::{FeedSource, MarketQuote, MockFeedSource, SourceError};
pub use types::{OracleError, Result};

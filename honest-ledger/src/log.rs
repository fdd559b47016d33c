//! Bounded in-memory log of verified records.

use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use honest_eigenstate::Decision;

use crate::record::HonestRecord;
use crate::types::{LedgerError, Result};

/// Maximum records in the log before pruning.
const MAX_RECORDS: usize = 10_000;

/// Append-only record log (newest first).
///
/// Only records that verify are accepted. Once full, the oldest records
/// are dropped.
#[derive(Clone)]
pub struct RecordLog {
    records: Arc<RwLock<VecDeque<HonestRecord>>>,
    max_records: usize,
}

impl RecordLog {
    /// Create a new record log.
    pub fn new() -> Self {
        Self::with_max_records(MAX_RECORDS)
    }

    /// Create with custom capacity.
    pub fn with_max_records(max_records: usize) -> Self {
        Self {
            records: Arc::new(RwLock::new(VecDeque::new())),
            max_records,
        }
    }

    /// Append a record after re-verifying its hash. Returns the hash.
    pub async fn append(&self, record: HonestRecord) -> Result<String> {
        let computed = record.compute_hash()?;
        if computed != record.record_hash {
            warn!(metric_id = %record.metric_id, "Refusing unverified record");
            return Err(LedgerError::HashMismatch {
                stored: record.record_hash,
                computed,
            });
        }

        let hash = record.record_hash.clone();
        info!(metric_id = %record.metric_id, record_hash = %hash, "Record appended");

        let mut records = self.records.write().await;
        records.push_front(record);

        // Prune if over limit
        while records.len() > self.max_records {
            records.pop_back();
        }

        Ok(hash)
    }

    /// Get recent records.
    pub async fn recent(&self, limit: usize) -> Vec<HonestRecord> {
        let records = self.records.read().await;
        records.iter().take(limit).cloned().collect()
    }

    /// Get a record by hash.
    pub async fn get_by_hash(&self, record_hash: &str) -> Option<HonestRecord> {
        let records = self.records.read().await;
        records.iter().find(|r| r.record_hash == record_hash).cloned()
    }

    /// Get records for a metric.
    pub async fn get_by_metric(&self, metric_id: &str, limit: usize) -> Vec<HonestRecord> {
        let records = self.records.read().await;
        records
            .iter()
            .filter(|r| r.metric_id == metric_id)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Get statistics.
    pub async fn stats(&self) -> RecordStats {
        let records = self.records.read().await;

        let count_decision = |d: Decision| {
            records
                .iter()
                .filter(|r| r.translation.decision() == Some(d))
                .count()
        };

        let coherences: Vec<f64> = records.iter().filter_map(|r| r.coherence).collect();
        let avg_coherence = if coherences.is_empty() {
            None
        } else {
            Some(coherences.iter().sum::<f64>() / coherences.len() as f64)
        };

        RecordStats {
            total_records: records.len(),
            buy: count_decision(Decision::Buy),
            sell: count_decision(Decision::Sell),
            hold: count_decision(Decision::Hold),
            avg_coherence,
        }
    }

    /// Clear the log.
    pub async fn clear(&self) {
        let mut records = self.records.write().await;
        records.clear();
    }

    /// Get count.
    pub async fn count(&self) -> usize {
        let records = self.records.read().await;
        records.len()
    }
}

impl Default for RecordLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics from the record log.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordStats {
    /// Records held
    pub total_records: usize,
    /// Verdict records per decision
    pub buy: usize,
    pub sell: usize,
    pub hold: usize,
    /// Mean coherence over records that carry one
    pub avg_coherence: Option<f64>,
}

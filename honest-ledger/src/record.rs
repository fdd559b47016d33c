//! Hash-stamped records.
//!
//! A record's hash covers a canonical encoding of every other field:
//!
//! ```text
//! recordHash = hex(sha256("honest-record/v1\n" || json(canonical)))
//!
//! canonical = { metricId, metricValue, translation, timestamp,
//!               coherence, exhaustion, sources }   // fixed order, null when absent
//! ```
//!
//! Records are never trusted on load: [`verify_record`] recomputes the hash,
//! and [`import_from_json`] refuses anything that does not verify.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use honest_eigenstate::Eigenstate;
use honest_truth::{Clock, SystemClock};

use crate::translation::Translation;
use crate::types::{LedgerError, Result};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Domain separator mixed into every record hash.
pub const RECORD_HASH_DOMAIN: &[u8] = b"honest-record/v1\n";

/// Fields that must be present in imported JSON.
const REQUIRED_FIELDS: [&str; 5] = [
    "metricId",
    "metricValue",
    "translation",
    "timestamp",
    "recordHash",
];

/// A tamper-evident snapshot of one computed metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct HonestRecord {
    pub metric_id: String,
    pub metric_value: f64,
    pub translation: Translation,
    /// Epoch ms
    pub timestamp: i64,
    /// Hex SHA-256 over the canonical form
    pub record_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coherence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exhaustion: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

/// Hashed view of a record. Field order is part of the format.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CanonicalRecord<'a> {
    metric_id: &'a str,
    metric_value: f64,
    translation: &'a Translation,
    timestamp: i64,
    coherence: Option<f64>,
    exhaustion: Option<f64>,
    sources: Option<&'a [String]>,
}

impl HonestRecord {
    /// Record an eigenstate verdict.
    ///
    /// The metric ID is `eigenstate:{ASSET}` and the value is the coherence.
    /// When the eigenstate carries a certificate, its Merkle root is the
    /// single source.
    pub fn from_eigenstate(eigenstate: &Eigenstate, exhaustion: Option<f64>) -> Result<Self> {
        let mut draft = RecordDraft::new(
            format!("eigenstate:{}", eigenstate.asset),
            eigenstate.coherence,
            Translation::from(eigenstate),
        )
        .at(eigenstate.timestamp)
        .with_coherence(eigenstate.coherence);

        if let Some(exhaustion) = exhaustion {
            draft = draft.with_exhaustion(exhaustion);
        }
        if let Some(certificate) = &eigenstate.truth_certificate {
            draft = draft.with_sources(vec![certificate.merkle_root.clone()]);
        }

        create_record(draft)
    }

    fn canonical(&self) -> CanonicalRecord<'_> {
        CanonicalRecord {
            metric_id: &self.metric_id,
            metric_value: self.metric_value,
            translation: &self.translation,
            timestamp: self.timestamp,
            coherence: self.coherence,
            exhaustion: self.exhaustion,
            sources: self.sources.as_deref(),
        }
    }

    /// Recompute the hash from the current field values.
    pub fn compute_hash(&self) -> Result<String> {
        let json = serde_json::to_vec(&self.canonical())?;
        let mut hasher = Sha256::new();
        hasher.update(RECORD_HASH_DOMAIN);
        hasher.update(&json);
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Inputs to [`create_record`].
#[derive(Debug, Clone)]
pub struct RecordDraft {
    pub metric_id: String,
    pub metric_value: f64,
    pub translation: Translation,
    pub timestamp: Option<i64>,
    pub coherence: Option<f64>,
    pub exhaustion: Option<f64>,
    pub sources: Option<Vec<String>>,
}

impl RecordDraft {
    /// Start a draft with the required fields.
    pub fn new(metric_id: impl Into<String>, metric_value: f64, translation: Translation) -> Self {
        Self {
            metric_id: metric_id.into(),
            metric_value,
            translation,
            timestamp: None,
            coherence: None,
            exhaustion: None,
            sources: None,
        }
    }

    /// Fix the timestamp instead of reading the clock.
    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_coherence(mut self, coherence: f64) -> Self {
        self.coherence = Some(coherence);
        self
    }

    pub fn with_exhaustion(mut self, exhaustion: f64) -> Self {
        self.exhaustion = Some(exhaustion);
        self
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = Some(sources);
        self
    }
}

/// Build and hash a record, stamping it with the system clock if needed.
pub fn create_record(draft: RecordDraft) -> Result<HonestRecord> {
    create_record_with_clock(draft, &SystemClock)
}

/// Build and hash a record, reading `clock` when the draft has no timestamp.
pub fn create_record_with_clock(draft: RecordDraft, clock: &dyn Clock) -> Result<HonestRecord> {
    validate_draft(&draft)?;

    let mut record = HonestRecord {
        metric_id: draft.metric_id,
        metric_value: draft.metric_value,
        translation: draft.translation,
        timestamp: draft.timestamp.unwrap_or_else(|| clock.now_millis()),
        record_hash: String::new(),
        coherence: draft.coherence,
        exhaustion: draft.exhaustion,
        sources: draft.sources,
    };
    record.record_hash = record.compute_hash()?;

    debug!(
        metric_id = %record.metric_id,
        record_hash = %record.record_hash,
        schema = record.translation.schema(),
        "Record created"
    );

    Ok(record)
}

fn validate_draft(draft: &RecordDraft) -> Result<()> {
    if draft.metric_id.trim().is_empty() {
        return Err(LedgerError::MissingField("metricId".to_string()));
    }
    if !draft.metric_value.is_finite() {
        return Err(LedgerError::NonFiniteValue("metricValue".to_string()));
    }
    if let Some(field) = draft.translation.non_finite_field() {
        return Err(LedgerError::NonFiniteValue(field.to_string()));
    }
    check_range("coherence", draft.coherence, -1.0, 1.0)?;
    check_range("exhaustion", draft.exhaustion, 0.0, 1.0)?;
    Ok(())
}

fn check_range(field: &str, value: Option<f64>, low: f64, high: f64) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() => Err(LedgerError::NonFiniteValue(field.to_string())),
        Some(v) if !(low..=high).contains(&v) => Err(LedgerError::OutOfRange {
            field: field.to_string(),
            value: v,
        }),
        _ => Ok(()),
    }
}

/// Whether the stored hash matches the record's own fields.
pub fn verify_record(record: &HonestRecord) -> bool {
    record
        .compute_hash()
        .map(|computed| computed == record.record_hash)
        .unwrap_or(false)
}

/// Serialize a record for storage or transport.
pub fn export_to_json(record: &HonestRecord) -> Result<String> {
    Ok(serde_json::to_string(record)?)
}

/// Parse a record, returning `None` unless it is complete and verifies.
pub fn import_from_json(json: &str) -> Option<HonestRecord> {
    match try_import_from_json(json) {
        Ok(record) => Some(record),
        Err(err) => {
            warn!(error = %err, "Rejected record import");
            None
        }
    }
}

/// Parse a record, reporting why it was rejected.
pub fn try_import_from_json(json: &str) -> Result<HonestRecord> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    for field in REQUIRED_FIELDS {
        match value.get(field) {
            None | Some(serde_json::Value::Null) => {
                return Err(LedgerError::MissingField(field.to_string()));
            }
            Some(_) => {}
        }
    }

    let record: HonestRecord = serde_json::from_value(value)?;
    let computed = record.compute_hash()?;
    if computed != record.record_hash {
        return Err(LedgerError::HashMismatch {
            stored: record.record_hash,
            computed,
        });
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::VerdictTranslation;
    use honest_eigenstate::{CoherenceEngine, Decision, EigenstateDimensions};
    use honest_truth::{CertificateSummary, ManualClock};

    const NOW: i64 = 1_767_225_600_000;

    fn verdict() -> Translation {
        Translation::Verdict(VerdictTranslation {
            decision: Decision::Buy,
            coherence: 0.635,
            phase_angle: 41.6335,
            dimensions: EigenstateDimensions {
                price: 0.9,
                volume: 0.5,
                momentum: 0.8,
                sentiment: 0.7,
                temporal: 0.1,
                spatial: 0.1,
            },
        })
    }

    fn record() -> HonestRecord {
        create_record(
            RecordDraft::new("btc-price", 97_000.125, verdict())
                .at(NOW)
                .with_coherence(0.635)
                .with_exhaustion(0.2)
                .with_sources(vec!["binance".to_string(), "pyth".to_string()]),
        )
        .unwrap()
    }

    #[test]
    fn test_created_record_verifies() {
        let record = record();
        assert_eq!(record.record_hash.len(), 64);
        assert!(verify_record(&record));
        assert_eq!(record.record_hash, self::record().record_hash);
    }

    #[test]
    fn test_any_mutation_breaks_verification() {
        let base = record();

        let mut r = base.clone();
        r.metric_value += 1.0;
        assert!(!verify_record(&r));

        let mut r = base.clone();
        r.metric_id = "eth-price".to_string();
        assert!(!verify_record(&r));

        let mut r = base.clone();
        r.timestamp += 1;
        assert!(!verify_record(&r));

        let mut r = base.clone();
        r.coherence = None;
        assert!(!verify_record(&r));

        let mut r = base.clone();
        r.sources = Some(vec!["pyth".to_string(), "binance".to_string()]);
        assert!(!verify_record(&r));

        let mut r = base;
        r.translation = Translation::note("forged");
        assert!(!verify_record(&r));
    }

    #[test]
    fn test_absent_optionals_hash_differently_from_present() {
        let bare =
            create_record(RecordDraft::new("m", 1.0, Translation::note("x")).at(NOW)).unwrap();
        let with = create_record(
            RecordDraft::new("m", 1.0, Translation::note("x"))
                .at(NOW)
                .with_sources(vec![]),
        )
        .unwrap();

        assert!(verify_record(&bare));
        assert!(verify_record(&with));
        assert_ne!(bare.record_hash, with.record_hash);
    }

    #[test]
    fn test_export_import_round_trip() {
        let record = record();
        let json = export_to_json(&record).unwrap();
        assert!(json.contains("\"metricId\""));
        assert!(json.contains("\"recordHash\""));

        assert_eq!(import_from_json(&json), Some(record));
    }

    #[test]
    fn test_import_rejects_edited_hash() {
        let mut value = serde_json::to_value(record()).unwrap();
        value["recordHash"] = serde_json::Value::String("0".repeat(64));
        let json = value.to_string();

        assert_eq!(import_from_json(&json), None);
        assert!(matches!(
            try_import_from_json(&json),
            Err(LedgerError::HashMismatch { .. })
        ));
    }

    #[test]
    fn test_import_rejects_edited_value() {
        let mut value = serde_json::to_value(record()).unwrap();
        value["metricValue"] = serde_json::json!(1.0);
        assert_eq!(import_from_json(&value.to_string()), None);
    }

    #[test]
    fn test_import_requires_fields() {
        let mut value = serde_json::to_value(record()).unwrap();
        value.as_object_mut().unwrap().remove("timestamp");
        assert_eq!(
            try_import_from_json(&value.to_string()),
            Err(LedgerError::MissingField("timestamp".to_string()))
        );

        assert!(matches!(
            try_import_from_json("not json"),
            Err(LedgerError::Serialization(_))
        ));
    }

    #[test]
    fn test_invalid_drafts_are_rejected() {
        let draft = || RecordDraft::new("m", 1.0, Translation::note("x")).at(NOW);

        assert_eq!(
            create_record(RecordDraft::new("m", f64::NAN, Translation::note("x"))),
            Err(LedgerError::NonFiniteValue("metricValue".to_string()))
        );
        assert!(matches!(
            create_record(draft().with_coherence(1.5)),
            Err(LedgerError::OutOfRange { .. })
        ));
        assert!(matches!(
            create_record(draft().with_exhaustion(-0.1)),
            Err(LedgerError::OutOfRange { .. })
        ));
        assert_eq!(
            create_record(RecordDraft::new("  ", 1.0, Translation::note("x"))),
            Err(LedgerError::MissingField("metricId".to_string()))
        );
    }

    #[test]
    fn test_timestamp_defaults_to_clock() {
        let clock = ManualClock::new(NOW);
        let draft = RecordDraft::new("m", 1.0, Translation::note("x"));
        let record = create_record_with_clock(draft, &clock).unwrap();
        assert_eq!(record.timestamp, NOW);
    }

    #[test]
    fn test_from_eigenstate() {
        let mut eigenstate = CoherenceEngine::new().evaluate(
            "btc",
            NOW,
            EigenstateDimensions {
                price: 0.9,
                volume: 0.5,
                momentum: 0.8,
                sentiment: 0.7,
                temporal: 0.1,
                spatial: 0.1,
            },
            None,
        );
        eigenstate.truth_certificate = Some(CertificateSummary {
            consensus_value: 97_000.0,
            consistency_score: 0.95,
            merkle_root: "ab".repeat(32),
            source_count: 3,
        });

        let record = HonestRecord::from_eigenstate(&eigenstate, Some(0.3)).unwrap();
        assert_eq!(record.metric_id, "eigenstate:BTC");
        assert_eq!(record.metric_value, eigenstate.coherence);
        assert_eq!(record.timestamp, NOW);
        assert_eq!(record.exhaustion, Some(0.3));
        assert_eq!(record.sources, Some(vec!["ab".repeat(32)]));
        assert_eq!(record.translation.decision(), Some(Decision::Buy));
        assert!(verify_record(&record));
    }
}

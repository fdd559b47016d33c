//! Flat attribute view of a record for certificate minting.
//!
//! This is a presentation projection. It is not hashed and carries no
//! integrity guarantee of its own beyond quoting the record hash.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::record::HonestRecord;
use crate::translation::Translation;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// One `trait_type` / `value` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct MetadataAttribute {
    pub trait_type: String,
    #[cfg_attr(feature = "typescript", ts(type = "string | number"))]
    pub value: Value,
}

impl MetadataAttribute {
    fn new(trait_type: &str, value: Value) -> Self {
        Self {
            trait_type: trait_type.to_string(),
            value,
        }
    }
}

/// Certificate metadata document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct CertificateMetadata {
    pub name: String,
    pub description: String,
    pub attributes: Vec<MetadataAttribute>,
}

impl CertificateMetadata {
    /// Look up an attribute value by trait type.
    pub fn attribute(&self, trait_type: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|a| a.trait_type == trait_type)
            .map(|a| &a.value)
    }
}

/// Project a record into certificate metadata.
pub fn to_certificate_metadata(record: &HonestRecord) -> CertificateMetadata {
    let short_hash: String = record.record_hash.chars().take(12).collect();

    let mut attributes = vec![
        MetadataAttribute::new("Metric", json!(record.metric_id)),
        MetadataAttribute::new("Value", json!(record.metric_value)),
        MetadataAttribute::new("Timestamp", json!(record.timestamp)),
        MetadataAttribute::new("Record Hash", json!(record.record_hash)),
        MetadataAttribute::new("Schema", json!(record.translation.schema())),
    ];

    if let Translation::Verdict(verdict) = &record.translation {
        attributes.push(MetadataAttribute::new("Decision", json!(verdict.decision.as_str())));
        attributes.push(MetadataAttribute::new("Phase Angle", json!(verdict.phase_angle)));
    }
    if let Some(coherence) = record.coherence {
        attributes.push(MetadataAttribute::new("Coherence", json!(coherence)));
    }
    if let Some(exhaustion) = record.exhaustion {
        attributes.push(MetadataAttribute::new("Exhaustion", json!(exhaustion)));
    }
    if let Some(sources) = &record.sources {
        attributes.push(MetadataAttribute::new("Source Count", json!(sources.len())));
    }

    CertificateMetadata {
        name: format!("Honest Record {short_hash}"),
        description: format!("Verified record of {} at {}", record.metric_id, record.timestamp),
        attributes,
    }
}

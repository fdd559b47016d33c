//! Versioned translation payloads.
//!
//! The translation is hashed as part of a record, so every variant has a
//! fixed shape and a `schema` tag. New shapes get a new tag; existing tags
//! never change meaning.

use serde::{Deserialize, Serialize};

use honest_eigenstate::{Decision, Eigenstate, EigenstateDimensions};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// What a record's value was translated into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(tag = "schema")]
pub enum Translation {
    /// Eigenstate verdict
    #[serde(rename = "verdict/v1")]
    Verdict(VerdictTranslation),

    /// Free-form annotation
    #[serde(rename = "note/v1")]
    Note { text: String },
}

impl Translation {
    /// Schema tag as written to JSON.
    pub fn schema(&self) -> &'static str {
        match self {
            Self::Verdict(_) => "verdict/v1",
            Self::Note { .. } => "note/v1",
        }
    }

    /// Create a note.
    pub fn note(text: impl Into<String>) -> Self {
        Self::Note { text: text.into() }
    }

    /// Decision carried by a verdict.
    pub fn decision(&self) -> Option<Decision> {
        match self {
            Self::Verdict(v) => Some(v.decision),
            Self::Note { .. } => None,
        }
    }

    /// Name of the first non-finite number inside the payload.
    pub(crate) fn non_finite_field(&self) -> Option<&'static str> {
        let Self::Verdict(v) = self else {
            return None;
        };
        if !v.coherence.is_finite() {
            return Some("translation.coherence");
        }
        if !v.phase_angle.is_finite() {
            return Some("translation.phaseAngle");
        }
        if v.dimensions.as_array().iter().any(|d| !d.is_finite()) {
            return Some("translation.dimensions");
        }
        None
    }
}

impl From<&Eigenstate> for Translation {
    fn from(eigenstate: &Eigenstate) -> Self {
        Self::Verdict(VerdictTranslation {
            decision: eigenstate.decision,
            coherence: eigenstate.coherence,
            phase_angle: eigenstate.phase_angle,
            dimensions: eigenstate.dimensions,
        })
    }
}

/// Verdict payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct VerdictTranslation {
    pub decision: Decision,
    pub coherence: f64,
    pub phase_angle: f64,
    pub dimensions: EigenstateDimensions,
}

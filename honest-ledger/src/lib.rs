//! Ledger for the Honest Oracle.
//!
//! Turns computed metrics and eigenstate verdicts into canonical records
//! whose SHA-256 hash is recomputed, never trusted, on every load:
//!
//! ```text
//! Eigenstate ──► Translation ──► RecordDraft ──► create_record ──► HonestRecord
//!                                                                   │
//!                     RecordLog ◄── append (re-verify) ◄────────────┤
//!                     JSON      ◄── export / import (re-verify) ◄───┤
//!                     metadata  ◄── to_certificate_metadata ◄───────┘
//! ```

pub mod log;
pub mod metadata;
pub mod record;
pub mod translation;
pub mod types;

// Re-export main types
pub use log::{RecordLog, RecordStats};
pub use metadata::{to_certificate_metadata, CertificateMetadata, MetadataAttribute};
pub use record::{
    create_record, create_record_with_clock, export_to_json, import_from_json, try_import_from_json,
    verify_record, HonestRecord, RecordDraft, RECORD_HASH_DOMAIN,
};
pub use translation::{Translation, VerdictTranslation};
pub use types::{LedgerError, Result};

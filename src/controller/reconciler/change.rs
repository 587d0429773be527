//! # Change Detection
//!
//! Decides whether a desired-state document needs to be pushed to Spinnaker by
//! comparing its SHA-256 fingerprint with the one recorded at the last
//! completed apply.

use crate::crd::Document;
use sha2::{Digest, Sha256};

/// Why an apply is needed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Nothing has ever been applied
    Initial,
    /// The document differs from the last applied one
    Drift,
}

/// Result of [`should_apply`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeDecision {
    /// Fingerprint of the current document
    pub hash: String,
    /// `None` when the document matches the last applied fingerprint
    pub change: Option<Change>,
}

impl ChangeDecision {
    #[must_use]
    pub fn needed(&self) -> bool {
        self.change.is_some()
    }
}

/// Hex-encoded SHA-256 of the document's serialized JSON bytes
#[must_use]
pub fn content_hash(document: &Document) -> String {
    // Serializing an in-memory JSON map cannot fail
    let bytes = serde_json::to_vec(document).unwrap_or_default();
    format!("{:x}", Sha256::digest(&bytes))
}

/// Compare `document` against the fingerprint recorded at the last apply
#[must_use]
pub fn should_apply(document: &Document, last_hash: &str) -> ChangeDecision {
    let hash = content_hash(document);
    let change = if last_hash.is_empty() {
        Some(Change::Initial)
    } else if hash != last_hash {
        Some(Change::Drift)
    } else {
        None
    };
    ChangeDecision { hash, change }
}

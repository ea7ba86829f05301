//! Data models shared across the pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An uploaded file exactly as the caller handed it over: raw bytes plus the
/// declared file name. Nothing is trusted about the contents at this point.
#[derive(Debug, Clone)]
pub struct RawUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl RawUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        RawUpload {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Lowercased file extension, if the name has one.
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }
}

/// The submission form. `name` and `description` stay off-chain; only
/// `category` is carried into the attested payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub name: String,
    pub description: String,
    pub category: String,
}

/// Options for the attestation write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitOptions {
    /// Unix timestamp after which the attestation expires. Zero means never.
    pub expiration: u64,
    pub revocable: bool,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        SubmitOptions {
            expiration: 0,
            revocable: true,
        }
    }
}

/// Confirmation of a landed attestation, display-ready.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttestationReceipt {
    pub uid: String,
    pub tx_hash: String,
    pub recipient: String,
}

/// One attestation as reported by the indexer. `data` is the raw hex payload;
/// `decoded` is populated when the payload parses under the dataset schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttestationRecord {
    pub id: String,
    pub attester: String,
    pub recipient: String,
    pub schema_id: String,
    pub data: String,
    pub time_created: DateTime<Utc>,
    pub revoked: bool,
    pub decoded: Option<DatasetAttestation>,
}

/// Decoded view of a dataset attestation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetAttestation {
    pub owner: String,
    pub fingerprint: String,
    pub category: String,
}

/// Outcome reported by the external training service. The service is opaque
/// to this crate; whatever it computed is passed through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingOutcome {
    #[serde(rename = "status")]
    pub accepted: bool,
    pub accuracy: Option<f64>,
}

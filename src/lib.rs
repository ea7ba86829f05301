//! Dataset fingerprinting and on-chain attestation pipeline.
//!
//! Takes an uploaded tabular file through a fixed sequence of stages:
//!
//! 1. [`normalize`](normalize::normalize) parses the upload and re-serializes
//!    it into one canonical text form, so line endings, BOMs, and trailing
//!    newlines stop mattering.
//! 2. [`fingerprint`](fingerprint::fingerprint) derives a 31-character
//!    content identifier from the canonical text (SHA-256, base32).
//! 3. [`schema::encode`] packs owner, fingerprint, and category into the
//!    payload declared by [`schema::DATASET_SCHEMA`], failing closed on any
//!    divergence from the signature.
//! 4. [`services::eas::EasClient`] submits the payload as an attestation and
//!    waits for the receipt.
//!
//! [`pipeline::submit_dataset`] runs the whole sequence;
//! [`pipeline::prepare`] runs only the pure local stages. The read path
//! ([`services::indexer::IndexerClient`]) and the training hand-off
//! ([`services::trainer::TrainingClient`]) sit beside the pipeline rather
//! than inside it.
//!
//! All endpoints and key material come from [`Config`]; nothing is baked in.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod services;

pub use config::Config;
pub use error::{AttestError, QueryError, SubmissionError};
pub use models::{
    AttestationReceipt, AttestationRecord, DatasetAttestation, DatasetMetadata, RawUpload,
    SubmitOptions, TrainingOutcome,
};
pub use pipeline::{
    prepare, submit_dataset, submit_dataset_with_progress, PipelineStage, PreparedAttestation,
};
pub use services::eas::EasClient;
pub use services::indexer::IndexerClient;
pub use services::trainer::TrainingClient;

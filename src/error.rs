//! Error types for the attestation pipeline

use thiserror::Error;

/// Unified error type for every pipeline stage.
///
/// The first four variants map one-to-one onto the pipeline's local failure
/// modes and are raised before any network call is made. `Submission` and
/// `Query` wrap the reasons surfaced by the external collaborators so a
/// caller can display them individually rather than as one opaque failure.
#[derive(Debug, Error)]
pub enum AttestError {
    /// The upload could not be parsed as a tabular file.
    #[error("malformed upload: {0}")]
    MalformedInput(String),

    /// Normalization produced no content to fingerprint.
    #[error("upload is empty after normalization")]
    EmptyInput,

    /// A value does not fit its fixed-width destination slot.
    #[error("encoded value is {len} bytes, exceeds the {limit}-byte slot")]
    SizeExceeded { len: usize, limit: usize },

    /// The field list diverges from the declared schema signature. This is a
    /// programming or configuration error, not a user mistake; it should
    /// never be reached in normal operation.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The attestation write failed; see [`SubmissionError`] for the reason.
    #[error("submission failed: {0}")]
    Submission(#[from] SubmissionError),

    /// The indexer read failed; see [`QueryError`] for the reason.
    #[error("attestation query failed: {0}")]
    Query(#[from] QueryError),

    /// The external training service failed or returned garbage.
    #[error("training service: {0}")]
    Training(String),
}

/// Distinct reasons an attestation write can fail. No variant is retried
/// automatically; retry is the caller's decision.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("no attester key configured")]
    NoSigner,

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("signing rejected: {0}")]
    Rejected(String),

    #[error("transaction reverted by the registry: {0}")]
    Reverted(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("confirmation failed: {0}")]
    Confirmation(String),

    #[error("receipt contains no attestation uid")]
    MissingUid,
}

/// Distinct reasons an indexer query can fail. An empty result set is not an
/// error and never produces one of these.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("transport: {0}")]
    Transport(String),

    #[error("indexer rejected the query: {0}")]
    Indexer(String),

    #[error("malformed indexer response: {0}")]
    Decode(String),
}

impl AttestError {
    /// Whether the error should be shown to the end user as-is.
    /// `SchemaMismatch` is the exception: it signals an internal invariant
    /// violation and belongs in logs, not in a form banner.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, AttestError::SchemaMismatch(_))
    }

    /// Whether retrying the same operation can reasonably succeed.
    /// Re-uploading a fixed file clears `MalformedInput`; network-dependent
    /// failures may clear on their own. `EmptyInput` and `SizeExceeded` need
    /// a different file or a schema change, and `SchemaMismatch` needs a
    /// code fix.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AttestError::MalformedInput(_)
                | AttestError::Submission(_)
                | AttestError::Query(_)
                | AttestError::Training(_)
        )
    }
}

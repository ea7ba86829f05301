//! The submission pipeline: upload to confirmed attestation.
//!
//! Stages run strictly in order and fail fast; nothing is submitted unless
//! normalization, fingerprinting, and payload encoding all succeeded. The
//! local stages are pure, so [`prepare`] can be called to preview the
//! fingerprint and payload without touching the network.

use alloy::primitives::Address;
use serde::Serialize;

use crate::error::AttestError;
use crate::fingerprint::{self, Fingerprint};
use crate::models::{AttestationReceipt, DatasetMetadata, RawUpload, SubmitOptions};
use crate::normalize::{self, CanonicalTable};
use crate::schema::{self, AttestationField};
use crate::services::eas::EasClient;

/// Progress marker reported once per stage of one submission. Each call
/// carries its own progress; concurrent submissions do not share state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Normalizing,
    Fingerprinting,
    Encoding,
    Submitting,
    Confirmed,
}

/// Everything the local stages produce: the canonical table, its
/// fingerprint, and the encoded payload ready for submission.
#[derive(Debug, Clone)]
pub struct PreparedAttestation {
    pub table: CanonicalTable,
    pub fingerprint: Fingerprint,
    pub payload: Vec<u8>,
}

/// The dataset schema fields for one upload, in signature order.
pub fn dataset_fields(
    owner: Address,
    fingerprint: &Fingerprint,
    category: &str,
) -> Vec<AttestationField> {
    vec![
        AttestationField::address("owner", owner),
        AttestationField::bytes32("hash", fingerprint.to_bytes32()),
        AttestationField::text("category", category),
    ]
}

/// Run the local stages only: normalize, fingerprint, encode.
pub fn prepare(
    upload: &RawUpload,
    metadata: &DatasetMetadata,
    owner: Address,
) -> Result<PreparedAttestation, AttestError> {
    prepare_inner(upload, metadata, owner, &mut |_| {})
}

fn prepare_inner(
    upload: &RawUpload,
    metadata: &DatasetMetadata,
    owner: Address,
    on_stage: &mut dyn FnMut(PipelineStage),
) -> Result<PreparedAttestation, AttestError> {
    on_stage(PipelineStage::Normalizing);
    let table = normalize::normalize(upload)?;
    tracing::debug!(file_name = %upload.file_name, rows = table.rows().len(), "upload normalized");

    on_stage(PipelineStage::Fingerprinting);
    let fingerprint = fingerprint::fingerprint(&table)?;
    tracing::info!(fingerprint = fingerprint.encoded(), "content fingerprint derived");

    on_stage(PipelineStage::Encoding);
    let fields = dataset_fields(owner, &fingerprint, &metadata.category);
    let payload = schema::encode(schema::DATASET_SCHEMA, &fields)?;

    Ok(PreparedAttestation {
        table,
        fingerprint,
        payload,
    })
}

/// Run the full pipeline and submit the attestation with `owner` as
/// recipient.
pub async fn submit_dataset(
    eas: &EasClient,
    upload: &RawUpload,
    metadata: &DatasetMetadata,
    owner: Address,
    options: &SubmitOptions,
) -> Result<AttestationReceipt, AttestError> {
    submit_dataset_with_progress(eas, upload, metadata, owner, options, |_| {}).await
}

/// Same as [`submit_dataset`], reporting each stage through `on_stage` as it
/// begins (and `Confirmed` once the receipt is in hand).
pub async fn submit_dataset_with_progress(
    eas: &EasClient,
    upload: &RawUpload,
    metadata: &DatasetMetadata,
    owner: Address,
    options: &SubmitOptions,
    mut on_stage: impl FnMut(PipelineStage),
) -> Result<AttestationReceipt, AttestError> {
    let prepared = prepare_inner(upload, metadata, owner, &mut on_stage)?;

    on_stage(PipelineStage::Submitting);
    let receipt = eas.submit(owner, prepared.payload, options).await?;

    on_stage(PipelineStage::Confirmed);
    tracing::info!(
        uid = %receipt.uid,
        fingerprint = prepared.fingerprint.encoded(),
        category = %metadata.category,
        "dataset attested"
    );
    Ok(receipt)
}

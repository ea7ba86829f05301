//! Client for the external training service.
//!
//! The service is a black box: this crate uploads the canonical table and
//! passes back whatever outcome the service reports. No training semantics
//! live here.

use reqwest::multipart::{Form, Part};
use reqwest::Client;

use crate::config::Config;
use crate::error::AttestError;
use crate::models::TrainingOutcome;
use crate::normalize::CanonicalTable;

pub struct TrainingClient {
    http: Client,
    endpoint: String,
}

impl TrainingClient {
    pub fn new(config: &Config) -> Self {
        TrainingClient {
            http: Client::new(),
            endpoint: format!("{}/api/process-file", config.trainer_url.trim_end_matches('/')),
        }
    }

    /// Upload a normalized table and return the reported outcome.
    ///
    /// The canonical form is uploaded rather than the raw bytes so the
    /// service sees exactly the content that was fingerprinted.
    pub async fn train(
        &self,
        file_name: &str,
        table: &CanonicalTable,
    ) -> Result<TrainingOutcome, AttestError> {
        let part = Part::bytes(table.text().as_bytes().to_vec())
            .file_name(file_name.to_string())
            .mime_str("text/csv")
            .map_err(|e| AttestError::Training(e.to_string()))?;
        let form = Form::new().part("file", part);

        tracing::info!(file_name, rows = table.rows().len(), "uploading table for training");

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AttestError::Training(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AttestError::Training(format!("{status}: {text}")));
        }

        let outcome: TrainingOutcome = response
            .json()
            .await
            .map_err(|e| AttestError::Training(e.to_string()))?;

        tracing::info!(
            accepted = outcome.accepted,
            accuracy = ?outcome.accuracy,
            "training service responded"
        );
        Ok(outcome)
    }
}

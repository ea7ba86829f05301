//! Attestation reads against the GraphQL indexer.

use alloy::primitives::Address;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{AttestError, QueryError};
use crate::fingerprint;
use crate::models::{AttestationRecord, DatasetAttestation};
use crate::schema;

const RECIPIENT_QUERY: &str = "\
query AttestationsForRecipient($recipient: String!) {
  attestations(where: { recipient: { equals: $recipient } }) {
    id
    attester
    recipient
    schemaId
    data
    timeCreated
    revoked
  }
}";

/// Client for the indexer's GraphQL endpoint.
pub struct IndexerClient {
    http: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<AttestationsData>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct AttestationsData {
    attestations: Vec<RawAttestation>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAttestation {
    id: String,
    attester: String,
    recipient: String,
    schema_id: String,
    data: String,
    time_created: i64,
    revoked: bool,
}

impl IndexerClient {
    pub fn new(config: &Config) -> Self {
        IndexerClient {
            http: Client::new(),
            endpoint: config.indexer_url.clone(),
        }
    }

    /// Fetch every attestation whose recipient is `recipient`.
    ///
    /// An empty result set is a normal outcome and returns `Ok(vec![])`;
    /// only transport failures, indexer-side errors, and undecodable
    /// responses are errors. Records whose payload does not parse under the
    /// dataset schema are still returned, just without a decoded view.
    pub async fn attestations_for_recipient(
        &self,
        recipient: Address,
    ) -> Result<Vec<AttestationRecord>, AttestError> {
        // The indexer's `equals` filter is case-sensitive and it stores
        // checksummed addresses, which is exactly what Display produces.
        let body = serde_json::json!({
            "query": RECIPIENT_QUERY,
            "variables": { "recipient": recipient.to_string() },
        });

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| QueryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(QueryError::Indexer(format!("{status}: {text}")).into());
        }

        let envelope: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| QueryError::Decode(e.to_string()))?;

        if let Some(errors) = envelope.errors {
            let joined = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(QueryError::Indexer(joined).into());
        }

        let data = envelope
            .data
            .ok_or_else(|| QueryError::Decode("response carries neither data nor errors".to_string()))?;

        tracing::debug!(
            recipient = %recipient,
            count = data.attestations.len(),
            "attestation query complete"
        );

        Ok(data.attestations.into_iter().map(into_record).collect())
    }
}

fn into_record(raw: RawAttestation) -> AttestationRecord {
    let decoded = decode_dataset_payload(&raw.data);
    let time_created =
        DateTime::from_timestamp(raw.time_created, 0).unwrap_or(DateTime::UNIX_EPOCH);
    AttestationRecord {
        id: raw.id,
        attester: raw.attester,
        recipient: raw.recipient,
        schema_id: raw.schema_id,
        data: raw.data,
        time_created,
        revoked: raw.revoked,
        decoded,
    }
}

/// Try to read a payload under the dataset schema. Foreign payloads are
/// expected in shared indexers, so failure here is not an error.
fn decode_dataset_payload(data: &str) -> Option<DatasetAttestation> {
    let bytes = hex::decode(data.trim_start_matches("0x")).ok()?;
    let fields = schema::decode(schema::DATASET_SCHEMA, &bytes).ok()?;

    let mut owner = None;
    let mut hash = None;
    let mut category = None;
    for field in fields {
        match field.value {
            schema::FieldValue::Address(addr) => owner = Some(addr.to_string()),
            schema::FieldValue::Bytes32(slot) => {
                hash = Some(fingerprint::unpack_bytes32(&slot))
            }
            schema::FieldValue::Text(text) => category = Some(text),
        }
    }

    Some(DatasetAttestation {
        owner: owner?,
        fingerprint: hash?,
        category: category?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::pack_bytes32;
    use crate::schema::AttestationField;

    const RECIPIENT: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn client_for(server: &mockito::Server) -> IndexerClient {
        let config = Config {
            chain_id: 8453,
            rpc_url: "https://mainnet.base.org".to_string(),
            eas_address: "0x4200000000000000000000000000000000000021".to_string(),
            schema_uid: "0x1111111111111111111111111111111111111111111111111111111111111111"
                .to_string(),
            indexer_url: server.url(),
            trainer_url: "http://localhost:8000".to_string(),
            private_key: None,
        };
        IndexerClient::new(&config)
    }

    fn dataset_payload_hex() -> String {
        let owner: Address = RECIPIENT.parse().unwrap();
        let fields = vec![
            AttestationField::address("owner", owner),
            AttestationField::bytes32("hash", pack_bytes32("4A3PRCFUBVUDMLP2DMBMUAQ6QHIT3FL").unwrap()),
            AttestationField::text("category", "Identity"),
        ];
        format!(
            "0x{}",
            hex::encode(schema::encode(schema::DATASET_SCHEMA, &fields).unwrap())
        )
    }

    #[test]
    fn test_display_produces_checksummed_address() {
        let addr: Address = RECIPIENT.to_lowercase().parse().unwrap();
        assert_eq!(addr.to_string(), RECIPIENT);
    }

    #[tokio::test]
    async fn test_query_decodes_dataset_attestations() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "data": {
                "attestations": [
                    {
                        "id": "0xaaa1",
                        "attester": RECIPIENT,
                        "recipient": RECIPIENT,
                        "schemaId": "0x1111111111111111111111111111111111111111111111111111111111111111",
                        "data": dataset_payload_hex(),
                        "timeCreated": 1700000000,
                        "revoked": false
                    },
                    {
                        "id": "0xaaa2",
                        "attester": RECIPIENT,
                        "recipient": RECIPIENT,
                        "schemaId": "0x2222222222222222222222222222222222222222222222222222222222222222",
                        "data": "0xdeadbeef",
                        "timeCreated": 1700000001,
                        "revoked": true
                    }
                ]
            }
        });
        let mock = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "variables": { "recipient": RECIPIENT }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = client_for(&server);
        let records = client
            .attestations_for_recipient(RECIPIENT.parse().unwrap())
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        let decoded = records[0].decoded.as_ref().unwrap();
        assert_eq!(decoded.fingerprint, "4A3PRCFUBVUDMLP2DMBMUAQ6QHIT3FL");
        assert_eq!(decoded.category, "Identity");
        assert_eq!(decoded.owner, RECIPIENT);
        assert_eq!(records[0].time_created.timestamp(), 1700000000);
        // Foreign payload stays raw.
        assert!(records[1].decoded.is_none());
        assert!(records[1].revoked);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_no_attestations_is_ok_and_empty() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":{"attestations":[]}}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let records = client
            .attestations_for_recipient(RECIPIENT.parse().unwrap())
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_graphql_errors_surface_as_indexer_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"errors":[{"message":"rate limited"}]}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .attestations_for_recipient(RECIPIENT.parse().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AttestError::Query(QueryError::Indexer(ref msg)) if msg.contains("rate limited")
        ));
    }

    #[tokio::test]
    async fn test_http_failure_surfaces_as_indexer_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .attestations_for_recipient(RECIPIENT.parse().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AttestError::Query(QueryError::Indexer(_))));
    }

    #[tokio::test]
    async fn test_garbage_response_surfaces_as_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("not json at all")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .attestations_for_recipient(RECIPIENT.parse().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AttestError::Query(QueryError::Decode(_))));
    }
}

//! Dify-style knowledge base sink.
//!
//! Each chunk becomes one document created through
//! `POST {host}/v1/datasets/{dataset_id}/document/create_by_text`.

use std::time::Duration;

use kbprep_core::{Metadata, SinkConfig, Submission};
use serde::{Deserialize, Serialize};

use crate::traits::{Sink, SinkError, SubmitReceipt};

/// Creates one remote document per submitted chunk.
#[derive(Debug)]
pub struct DifySink {
    /// Fully resolved create-by-text URL for the target dataset.
    endpoint: String,
    api_key: String,
    indexing_technique: String,
    /// Shared HTTP client (connection pooling, request timeout).
    client: reqwest::Client,
}

impl DifySink {
    /// Build a sink from resolved configuration.
    ///
    /// Missing credentials or dataset id produce [`SinkError::Config`]
    /// before any request is made.
    pub fn new(config: &SinkConfig) -> Result<Self, SinkError> {
        let (api_key, dataset_id) = config.credentials()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            endpoint: format!(
                "{}/v1/datasets/{}/document/create_by_text",
                config.host.trim_end_matches('/'),
                dataset_id
            ),
            api_key: api_key.to_string(),
            indexing_technique: config.indexing_technique.clone(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Serialize)]
struct CreateByTextRequest<'a> {
    text: &'a str,
    title: &'a str,
    meta: &'a Metadata,
    indexing_technique: &'a str,
}

#[derive(Deserialize)]
struct CreateByTextResponse {
    document: Option<DocumentRef>,
}

#[derive(Deserialize)]
struct DocumentRef {
    id: Option<String>,
}

#[async_trait::async_trait]
impl Sink for DifySink {
    async fn submit(&self, submission: &Submission) -> Result<SubmitReceipt, SinkError> {
        let request = CreateByTextRequest {
            text: &submission.text,
            title: &submission.title,
            meta: &submission.metadata,
            indexing_technique: &self.indexing_technique,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() >= 300 {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SinkError::Api {
                status: status.as_u16(),
                body,
            });
        }

        // The document id is informational; an unexpected body is still a success.
        let document_id = response
            .json::<CreateByTextResponse>()
            .await
            .ok()
            .and_then(|r| r.document)
            .and_then(|d| d.id);

        tracing::debug!(
            endpoint = %self.endpoint,
            title = %submission.title,
            document_id = document_id.as_deref().unwrap_or("-"),
            "document created"
        );

        Ok(SubmitReceipt { document_id })
    }

    fn name(&self) -> &str {
        "dify"
    }
}

use std::time::Duration;

use async_trait::async_trait;
use parla_domain::{
    decode_items, AssessmentDecoder, AssessmentService, AudioPayload, CompletionReport,
    ContentProvider, ItemFilter, JsonAssessmentDecoder, PracticeError, ProgressSnapshot,
    ProgressStore, PronunciationResult, VocabularyItem,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use tracing::{debug, info, instrument};

use crate::error::ServiceError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Shared base URL and client for the HTTP collaborators.
#[derive(Clone, Debug)]
pub struct Endpoint {
    client: Client,
    base_url: String,
}

impl Endpoint {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>, ServiceError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Fetches vocabulary sets from `GET {base}/sets/{set_id}/items`.
#[derive(Clone, Debug)]
pub struct HttpContentProvider {
    endpoint: Endpoint,
}

impl HttpContentProvider {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl ContentProvider for HttpContentProvider {
    #[instrument(skip(self), fields(base = %self.endpoint.base_url()))]
    async fn fetch_items(&self, filter: &ItemFilter) -> Result<Vec<VocabularyItem>, PracticeError> {
        let url = self.endpoint.url(&format!("sets/{}/items", filter.set_id));
        let mut request = self.endpoint.client.get(url);
        if let Some(limit) = filter.limit {
            request = request.query(&[("limit", limit)]);
        }
        let body = self.endpoint.send(request).await?;
        let items = decode_items(&body)?;
        info!(count = items.len(), "vocabulary set fetched");
        Ok(items)
    }
}

/// Uploads recordings to `POST {base}/assessments?word=...` as the raw request body.
pub struct HttpAssessmentService {
    endpoint: Endpoint,
    decoder: Box<dyn AssessmentDecoder + Send + Sync>,
}

impl HttpAssessmentService {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            decoder: Box::new(JsonAssessmentDecoder),
        }
    }

    pub fn with_decoder(mut self, decoder: Box<dyn AssessmentDecoder + Send + Sync>) -> Self {
        self.decoder = decoder;
        self
    }
}

#[async_trait]
impl AssessmentService for HttpAssessmentService {
    #[instrument(skip(self, audio), fields(bytes = audio.bytes.len()))]
    async fn assess(
        &self,
        audio: &AudioPayload,
        word: &str,
    ) -> Result<PronunciationResult, PracticeError> {
        if audio.is_empty() {
            return Err(PracticeError::assessment_failed("recording is empty"));
        }
        let request = self
            .endpoint
            .client
            .post(self.endpoint.url("assessments"))
            .query(&[("word", word)])
            .header(CONTENT_TYPE, audio.media_type.as_str())
            .body(audio.bytes.clone());
        let body = self
            .endpoint
            .send(request)
            .await
            .map_err(|err| PracticeError::assessment_failed(err.to_string()))?;
        let result = self
            .decoder
            .decode(&body)
            .map_err(|err| PracticeError::assessment_failed(err.to_string()))?;
        debug!(overall = ?result.scores.overall, "assessment decoded");
        Ok(result)
    }
}

/// Reports outcomes to `POST {base}/progress` and reads `GET {base}/progress/{set_id}`.
#[derive(Clone, Debug)]
pub struct HttpProgressStore {
    endpoint: Endpoint,
}

impl HttpProgressStore {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl ProgressStore for HttpProgressStore {
    async fn report_completion(&self, item_id: &str, correct: bool) -> Result<(), PracticeError> {
        let report = CompletionReport {
            item_id: item_id.to_string(),
            correct,
        };
        let request = self
            .endpoint
            .client
            .post(self.endpoint.url("progress"))
            .json(&report);
        self.endpoint.send(request).await?;
        Ok(())
    }

    async fn get_progress(&self, set_id: &str) -> Result<ProgressSnapshot, PracticeError> {
        let request = self
            .endpoint
            .client
            .get(self.endpoint.url(&format!("progress/{set_id}")));
        let body = self.endpoint.send(request).await?;
        let snapshot = serde_json::from_slice(&body).map_err(ServiceError::from)?;
        Ok(snapshot)
    }
}

//! The model-client adapter: opaque text / image / video generation calls.
//!
//! The pipeline treats model calls as black boxes with a request/response
//! contract. Transient-failure retry lives here, in the adapter, never in
//! the state machine: callers only ever see a hard success or a propagated
//! fatal [`tf_core::Error::Model`].

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use tf_core::config::ModelConfig;
use tf_core::{Error, Result};

/// A text generation request.
#[derive(Debug, Clone, Serialize)]
pub struct TextRequest {
    pub model: String,
    pub prompt: String,
    pub seed: u64,
}

/// An image generation request; the artifact lands at `output`.
#[derive(Debug, Clone, Serialize)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    pub seed: u64,
    #[serde(skip)]
    pub output: PathBuf,
}

/// A video generation request; the artifact lands at `output`.
#[derive(Debug, Clone, Serialize)]
pub struct VideoRequest {
    pub model: String,
    pub prompt: String,
    pub seed: u64,
    /// Seed image the clip should start from (continuity chaining).
    #[serde(skip)]
    pub seed_image: Option<PathBuf>,
    #[serde(skip)]
    pub output: PathBuf,
}

/// Opaque generation API, one method per modality.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate text; returns the raw completion.
    async fn complete(&self, request: TextRequest) -> Result<String>;

    /// Generate an image, writing it to `request.output`.
    async fn render_image(&self, request: ImageRequest) -> Result<PathBuf>;

    /// Generate a video clip, writing it to `request.output`.
    async fn render_video(&self, request: VideoRequest) -> Result<PathBuf>;
}

/// HTTP-backed [`ModelClient`] with bounded retry and linear backoff.
pub struct HttpModelClient {
    client: reqwest::Client,
    config: ModelConfig,
}

impl HttpModelClient {
    /// Build a client from the model configuration.
    pub fn new(config: ModelConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {e}");
                reqwest::Client::new()
            });
        Self { client, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// POST a JSON body, retrying transient failures up to the configured
    /// bound with linear backoff.
    async fn post_with_retry<T: Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        let url = self.url(path);
        let mut last_err = String::new();

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_secs(u64::from(attempt))).await;
                tracing::warn!("retrying {url} (attempt {})", attempt + 1);
            }

            let mut req = self.client.post(&url).json(body);
            if let Some(ref key) = self.config.api_key {
                req = req.bearer_auth(key);
            }

            match req.send().await {
                Ok(resp) if resp.status().is_success() => return Ok(resp),
                Ok(resp) if resp.status().is_server_error() => {
                    last_err = format!("{url} returned {}", resp.status());
                }
                Ok(resp) => {
                    // Client errors are not transient; fail immediately.
                    let status = resp.status();
                    let text = resp.text().await.unwrap_or_default();
                    return Err(Error::model(format!("{url} returned {status}: {text}")));
                }
                Err(e) => {
                    last_err = format!("{url} failed: {e}");
                }
            }
        }

        Err(Error::model(format!(
            "{last_err} (after {} attempts)",
            self.config.max_retries + 1
        )))
    }

    /// Download the response body to `output`.
    async fn save_artifact(resp: reqwest::Response, output: &PathBuf) -> Result<PathBuf> {
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::model(format!("artifact download failed: {e}")))?;
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output, &bytes)?;
        Ok(output.clone())
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn complete(&self, request: TextRequest) -> Result<String> {
        let resp = self.post_with_retry("/v1/text", &request).await?;
        resp.text()
            .await
            .map_err(|e| Error::model(format!("text response read failed: {e}")))
    }

    async fn render_image(&self, request: ImageRequest) -> Result<PathBuf> {
        let resp = self.post_with_retry("/v1/images", &request).await?;
        Self::save_artifact(resp, &request.output).await
    }

    async fn render_video(&self, request: VideoRequest) -> Result<PathBuf> {
        // The seed image travels as a separate field so the server can chain
        // from it; requests without one start the clip from the prompt alone.
        #[derive(Serialize)]
        struct VideoBody<'a> {
            #[serde(flatten)]
            request: &'a VideoRequest,
            seed_image: Option<String>,
        }
        let body = VideoBody {
            request: &request,
            seed_image: request
                .seed_image
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
        };
        let resp = self.post_with_retry("/v1/videos", &body).await?;
        Self::save_artifact(resp, &request.output).await
    }
}

/// Strip a Markdown code fence from a model completion, if present.
///
/// Models frequently wrap JSON answers in ```json fences; agents call this
/// before parsing.
pub(crate) fn strip_code_fence(completion: &str) -> &str {
    let trimmed = completion.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let mut cfg = ModelConfig::default();
        cfg.base_url = "http://localhost:8000/".into();
        let client = HttpModelClient::new(cfg);
        assert_eq!(client.url("/v1/text"), "http://localhost:8000/v1/text");
    }

    #[test]
    fn strip_code_fence_variants() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_model_error() {
        let mut cfg = ModelConfig::default();
        cfg.base_url = "http://127.0.0.1:1".into(); // nothing listens here
        cfg.max_retries = 0;
        cfg.timeout_secs = 1;
        let client = HttpModelClient::new(cfg);
        let err = client
            .complete(TextRequest {
                model: "text-default".into(),
                prompt: "hello".into(),
                seed: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Model(_)));
    }
}

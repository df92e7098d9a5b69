//! Minimal client for OpenAI-compatible JSON endpoints.

use crate::StoreError;
use reqwest::Client;
use serde_json::Value;
use url::Url;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Clone)]
pub struct OpenAiClient {
    base_url: Url,
    api_key: String,
    client: Client,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, StoreError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            api_key: api_key.into(),
            client: Client::new(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        Ok(self.base_url.join(path)?)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, StoreError> {
        let response = self
            .client
            .post(self.endpoint(path)?)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(StoreError::BackendResponse {
                backend: "openai".to_string(),
                details: format!("{status}: {details}"),
            });
        }

        Ok(response.json().await?)
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::{config::GeminiConfig, domain::Classification};

use super::{
    inference::{build_request, parse_response, ModelList, GEMINI_API_BASE},
    IssueClassifier,
};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
    base: Url,
}

impl GeminiClient {
    pub fn new(http: Client, config: GeminiConfig) -> Result<Self> {
        let base = Url::parse(GEMINI_API_BASE).context("invalid Gemini API base url")?;
        Ok(Self { http, config, base })
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .context("GEMINI_API_KEY must be configured for AI classification")
    }

    fn endpoint(&self, segment: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Gemini API base url cannot carry a path"))?
            .pop_if_empty()
            .push("models")
            .push(segment);
        Ok(url)
    }

    /// Names of the models that accept `generateContent` calls.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let api_key = self.api_key()?;
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Gemini API base url cannot carry a path"))?
            .pop_if_empty()
            .push("models");
        url.query_pairs_mut().append_pair("pageSize", "100");

        let list: ModelList = self
            .http
            .get(url)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(list
            .models
            .into_iter()
            .filter(|model| model.supports_generate_content())
            .map(|model| model.name)
            .collect())
    }
}

#[async_trait]
impl IssueClassifier for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn classify(&self, description: &str) -> Result<Classification> {
        let api_key = self.api_key()?;
        let url = self.endpoint(&format!("{}:generateContent", self.config.model))?;

        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .json(&build_request(description))
            .send()
            .await?
            .error_for_status()?;

        parse_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_key: Option<&str>) -> GeminiClient {
        GeminiClient::new(
            Client::new(),
            GeminiConfig {
                api_key: api_key.map(str::to_string),
                model: "gemini-1.5-flash".to_string(),
                request_timeout: std::time::Duration::from_secs(20),
            },
        )
        .unwrap()
    }

    #[test]
    fn builds_generate_content_endpoint() {
        let url = client(Some("k"))
            .endpoint("gemini-1.5-flash:generateContent")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn classify_without_key_fails_before_any_request() {
        let err = client(None).classify("leak").await.unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }
}

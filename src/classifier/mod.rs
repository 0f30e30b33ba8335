mod client;
pub mod inference;
pub mod keywords;

use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::{
    config::{AppConfig, ClassifierMode},
    domain::Classification,
};

pub use client::GeminiClient;
pub use keywords::KeywordClassifier;

/// A strategy that maps an issue description to a [`Classification`].
#[async_trait]
pub trait IssueClassifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn classify(&self, description: &str) -> Result<Classification>;
}

/// Tries `primary` first and answers with keyword rules whenever it fails
/// or does not answer within `deadline`.
pub struct FallbackClassifier<P> {
    primary: P,
    fallback: KeywordClassifier,
    deadline: Duration,
}

impl<P: IssueClassifier> FallbackClassifier<P> {
    pub fn new(primary: P, deadline: Duration) -> Self {
        Self {
            primary,
            fallback: KeywordClassifier::new(),
            deadline,
        }
    }
}

#[async_trait]
impl<P: IssueClassifier> IssueClassifier for FallbackClassifier<P> {
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    async fn classify(&self, description: &str) -> Result<Classification> {
        let attempt = tokio::time::timeout(self.deadline, self.primary.classify(description))
            .await
            .unwrap_or_else(|_| Err(anyhow!("no answer within {:?}", self.deadline)));
        match attempt {
            Ok(classification) => Ok(classification),
            Err(err) => {
                tracing::warn!(
                    target: "classifier",
                    strategy = self.primary.name(),
                    error = %err,
                    "classification failed; using keyword rules"
                );
                self.fallback.classify(description).await
            }
        }
    }
}

pub fn build_classifier(config: &AppConfig, http: Client) -> Result<Arc<dyn IssueClassifier>> {
    match config.classifier_mode {
        ClassifierMode::Keyword => Ok(Arc::new(KeywordClassifier::new())),
        ClassifierMode::Gemini if config.gemini.is_configured() => {
            let gemini = GeminiClient::new(http, config.gemini.clone())?;
            Ok(Arc::new(FallbackClassifier::new(
                gemini,
                config.gemini.request_timeout,
            )))
        }
        ClassifierMode::Gemini => {
            tracing::warn!(
                target: "classifier",
                "CLASSIFIER_MODE=gemini but GEMINI_API_KEY is not set; using keyword rules"
            );
            Ok(Arc::new(KeywordClassifier::new()))
        }
    }
}

/// Logs the Gemini models usable for classification. Failures only warn.
pub async fn log_available_models(config: &AppConfig, http: Client) {
    if !config.gemini.is_configured() {
        tracing::warn!(target: "gemini", "GEMINI_API_KEY not found; AI classification unavailable");
        return;
    }
    tracing::info!(target: "gemini", model = %config.gemini.model, "Gemini API key configured");

    let deadline = config.gemini.request_timeout;
    let listing = match GeminiClient::new(http, config.gemini.clone()) {
        Ok(client) => tokio::time::timeout(deadline, client.list_models())
            .await
            .unwrap_or_else(|_| Err(anyhow!("model listing timed out after {deadline:?}"))),
        Err(err) => Err(err),
    };
    match listing {
        Ok(models) => {
            for model in models {
                tracing::info!(target: "gemini", model = %model, "available model");
            }
        }
        Err(err) => {
            tracing::warn!(target: "gemini", error = %err, "could not list Gemini models");
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::bail;

    use super::*;
    use crate::domain::{Category, Severity};

    struct Unavailable;

    #[async_trait]
    impl IssueClassifier for Unavailable {
        fn name(&self) -> &'static str {
            "unavailable"
        }

        async fn classify(&self, _description: &str) -> Result<Classification> {
            bail!("upstream returned 503")
        }
    }

    struct Stalled;

    #[async_trait]
    impl IssueClassifier for Stalled {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn classify(&self, _description: &str) -> Result<Classification> {
            std::future::pending().await
        }
    }

    struct Fixed;

    #[async_trait]
    impl IssueClassifier for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn classify(&self, _description: &str) -> Result<Classification> {
            Ok(Classification::new(Category::Landscaping, Severity::Low, 0.5))
        }
    }

    fn config(mode: &str, api_key: Option<&str>) -> AppConfig {
        AppConfig::from_lookup(|key| match key {
            "CLASSIFIER_MODE" => Some(mode.to_string()),
            "GEMINI_API_KEY" => api_key.map(str::to_string),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn fallback_uses_keywords_when_primary_fails() {
        let classifier = FallbackClassifier::new(Unavailable, Duration::from_secs(5));
        let result = classifier.classify("Pipe burst, urgent").await.unwrap();
        assert_eq!(result.category, Category::Plumbing);
        assert_eq!(result.severity, Severity::High);
        assert_eq!(classifier.name(), "unavailable");
    }

    #[tokio::test]
    async fn fallback_answers_when_primary_never_replies() {
        let classifier = FallbackClassifier::new(Stalled, Duration::from_millis(50));
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            classifier.classify("Flickering bulb in the corridor"),
        )
        .await
        .expect("fallback must not wait on a stalled primary")
        .unwrap();
        assert_eq!(result.category, Category::Electrical);
        assert_eq!(result.severity, Severity::Medium);
    }

    #[tokio::test]
    async fn fallback_passes_through_primary_result() {
        let classifier = FallbackClassifier::new(Fixed, Duration::from_secs(5));
        let result = classifier.classify("Pipe burst, urgent").await.unwrap();
        assert_eq!(result.category, Category::Landscaping);
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn selects_strategy_from_config() {
        let http = Client::new();
        let keyword = build_classifier(&config("keyword", Some("k")), http.clone());
        assert_eq!(keyword.unwrap().name(), "keyword");

        let gemini = build_classifier(&config("gemini", Some("k")), http.clone());
        assert_eq!(gemini.unwrap().name(), "gemini");

        let missing_key = build_classifier(&config("gemini", None), http);
        assert_eq!(missing_key.unwrap().name(), "keyword");
    }
}

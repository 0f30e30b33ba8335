use anyhow::{bail, Context, Result};
use reqwest::Response;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::domain::{
    types::{default_suggestion, DEFAULT_CONFIDENCE},
    Category, Classification, Severity,
};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/";
const SYSTEM_PROMPT: &str = r#"You triage facility issues reported on a university campus.
Classify the report into exactly one category and one severity.
Categories: plumbing, electrical, safety, cleanliness, infrastructure, landscaping, other.
Severities: high (danger to people or urgent), medium, low (minor or cosmetic).
Respond with a JSON object only, for example:
{"category": "plumbing", "severity": "high", "confidence": 0.9, "suggestion": "Send a plumber to shut off the fountain supply"}"#;

pub fn build_request(description: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part {
                text: SYSTEM_PROMPT.into(),
            }],
        },
        contents: vec![Content {
            role: Some("user".into()),
            parts: vec![Part {
                text: description.to_string(),
            }],
        }],
        generation_config: GenerationConfig {
            temperature: 0.2,
            max_output_tokens: 256,
            response_mime_type: "application/json".into(),
        },
    }
}

pub async fn parse_response(response: Response) -> Result<Classification> {
    let completion: GenerateContentResponse = response.json().await?;
    let text = completion
        .candidates
        .into_iter()
        .next()
        .context("Gemini response did not contain any candidates")?
        .content
        .and_then(|content| content.parts.into_iter().next())
        .map(|part| part.text)
        .context("Gemini response missing candidate text")?;

    parse_classification(&text)
}

/// Turns the model's JSON reply into a [`Classification`], rejecting labels
/// outside the closed category and severity sets.
pub fn parse_classification(raw: &str) -> Result<Classification> {
    let verdict: ModelVerdict = serde_json::from_str(strip_code_fence(raw))
        .context("Gemini reply was not a classification object")?;

    let category = parse_label::<Category>(&verdict.category)
        .with_context(|| format!("unknown category {:?}", verdict.category))?;
    let severity = parse_label::<Severity>(&verdict.severity)
        .with_context(|| format!("unknown severity {:?}", verdict.severity))?;

    let confidence = match verdict.confidence {
        Some(value) if value.is_finite() => value.clamp(0.0, 1.0),
        Some(value) => bail!("confidence {value} is not a finite number"),
        None => DEFAULT_CONFIDENCE,
    };

    let suggestion = verdict
        .suggestion
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default_suggestion(category, severity));

    Ok(Classification {
        category,
        severity,
        confidence,
        suggestion,
    })
}

fn parse_label<T: DeserializeOwned>(label: &str) -> Result<T> {
    let normalized = label.trim().to_ascii_lowercase();
    Ok(serde_json::from_value(serde_json::Value::String(normalized))?)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[derive(Debug, Deserialize)]
struct ModelVerdict {
    category: String,
    severity: String,
    confidence: Option<f64>,
    suggestion: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub system_instruction: Content,
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: i32,
    pub response_mime_type: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelList {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    pub fn supports_generate_content(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|method| method == "generateContent")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_gemini_field_names() {
        let body = serde_json::to_value(build_request("Broken light in hall B")).unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Broken light in hall B");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
    }

    #[test]
    fn parses_model_reply_with_mixed_case_labels() {
        let result = parse_classification(
            r#"{"category": "Electrical", "severity": "HIGH", "confidence": 0.93, "suggestion": "Cut power to the outlet"}"#,
        )
        .unwrap();
        assert_eq!(result.category, Category::Electrical);
        assert_eq!(result.severity, Severity::High);
        assert_eq!(result.confidence, 0.93);
        assert_eq!(result.suggestion, "Cut power to the outlet");
    }

    #[test]
    fn fills_missing_fields_and_clamps_confidence() {
        let result = parse_classification(
            "```json\n{\"category\": \"landscaping\", \"severity\": \"low\", \"confidence\": 3.5}\n```",
        )
        .unwrap();
        assert_eq!(result.confidence, 1.0);
        assert_eq!(
            result.suggestion,
            "Issue categorized as landscaping with low priority"
        );

        let result =
            parse_classification(r#"{"category": "other", "severity": "medium"}"#).unwrap();
        assert_eq!(result.confidence, 0.8);
    }

    #[test]
    fn rejects_labels_outside_closed_sets() {
        assert!(parse_classification(r#"{"category": "hvac", "severity": "low"}"#).is_err());
        assert!(parse_classification(r#"{"category": "other", "severity": "extreme"}"#).is_err());
        assert!(parse_classification("not json at all").is_err());
    }

    #[test]
    fn model_list_filters_generate_content() {
        let list: ModelList = serde_json::from_str(
            r#"{"models": [
                {"name": "models/gemini-1.5-flash", "supportedGenerationMethods": ["generateContent", "countTokens"]},
                {"name": "models/text-embedding-004", "supportedGenerationMethods": ["embedContent"]}
            ]}"#,
        )
        .unwrap();
        let names: Vec<_> = list
            .models
            .iter()
            .filter(|m| m.supports_generate_content())
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, vec!["models/gemini-1.5-flash"]);
    }
}

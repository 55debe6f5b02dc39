//! Model-backed extraction strategy over an OpenAI-compatible chat API.
//!
//! Sends the normalized document text with a strict JSON schema derived
//! from the record shape, so a well-behaved service can only answer with a
//! parseable [`ExtractionRecord`]. Long documents are reduced to a
//! prefix/suffix pair around a truncation marker; openings and closings of
//! underwriting packages carry most of the summary figures.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use creparse_core::error::ModelError;
use creparse_core::extract::ModelStrategy;
use creparse_core::models::config::{CreConfig, ModelConfig};
use creparse_core::models::record::ExtractionRecord;
use creparse_core::schema;

const TRUNCATION_MARKER: &str = "\n...[document content truncated]...\n";

const SYSTEM_PROMPT: &str = "\
You are an expert commercial real estate analyst. Extract detailed CRE financial and operational metrics.

CRITICAL REQUIREMENTS:
1. For EVERY extracted value, include the exact source_text snippet from the document that supports it.
2. If a field is not mentioned, set value to null and source_text to null (unit should be null when value is null).
3. Always include a unit when the document provides one (e.g., USD, USD/SF/yr, %, acres, SF). If not stated, set unit to null.
4. Use null for missing information, not empty strings.
5. Convert currency values to numbers (remove $ and commas).
6. Convert percentages to numbers (e.g., 5.5% -> 5.5) and set unit to \"%\".
7. For dates, use YYYY-MM-DD format when possible.
8. For lists, include up to 5-10 items as allowed and provide source_text for each item.
9. Source_text must be an exact snippet from the document (25-200 characters).

Return a valid JSON object matching the specified schema with complete source_text coverage for every non-null value.";

/// Extraction engine backed by an OpenAI-compatible chat completions API.
pub struct OpenAiExtractor {
    client: reqwest::Client,
    api_key: Option<String>,
    config: ModelConfig,
}

impl OpenAiExtractor {
    /// Build an extractor from explicit settings and an optional API key.
    /// Without a key the extractor reports itself as unconfigured and the
    /// coordinator routes around it.
    pub fn new(config: ModelConfig, api_key: Option<String>) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ModelError::ServiceUnavailable(e.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.is_empty()),
            config,
        })
    }

    /// Build an extractor reading credentials from the environment.
    pub fn from_env(config: ModelConfig) -> Result<Self, ModelError> {
        Self::new(config, CreConfig::api_key())
    }

    /// Reduce oversize text to a prefix/suffix pair around the truncation
    /// marker, keeping within the configured character budget.
    fn prepare_text<'a>(&self, text: &'a str) -> std::borrow::Cow<'a, str> {
        let max_chars = self.config.max_prompt_chars;
        if text.len() <= max_chars {
            return std::borrow::Cow::Borrowed(text);
        }
        let mid = max_chars / 2;
        let head_end = floor_char_boundary(text, mid);
        let tail_start = ceil_char_boundary(text, text.len() - mid);
        debug!(
            original_chars = text.len(),
            budget = max_chars,
            "truncating document text for the model prompt"
        );
        std::borrow::Cow::Owned(format!(
            "{}{}{}",
            &text[..head_end],
            TRUNCATION_MARKER,
            &text[tail_start..]
        ))
    }

    fn user_prompt(text: &str) -> String {
        format!(
            "Extract structured CRE data from the following document text. For each value, return value, unit, and source_text.\n\
             \n\
             Key fields to capture include (not limited to): total project cost, expected exit valuation, stabilized NOI, operating expenses,\n\
             acres, land square feet, gross building area, net rentable area, and expected rents.\n\
             \n\
             Document text:\n\
             {text}\n\
             \n\
             Remember: EVERY non-null value must have a corresponding source_text snippet from the document."
        )
    }

    async fn request(&self, api_key: &str, text: &str) -> Result<ExtractionRecord, ModelError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "response_format": {
                "type": "json_schema",
                "json_schema": schema::json_schema(),
            },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": Self::user_prompt(text) },
            ],
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::ServiceUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(%status, "model service returned an error");
            return Err(ModelError::ServiceUnavailable(format!(
                "{status}: {detail}"
            )));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| ModelError::MalformedResponse(e.to_string()))?;
        parse_completion(&completion)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

fn parse_completion(completion: &ChatCompletion) -> Result<ExtractionRecord, ModelError> {
    let content = completion
        .choices
        .first()
        .and_then(|c| c.message.content.as_deref())
        .ok_or_else(|| ModelError::MalformedResponse("empty completion".to_string()))?;
    serde_json::from_str(content).map_err(|e| ModelError::MalformedResponse(e.to_string()))
}

fn floor_char_boundary(text: &str, mut i: usize) -> usize {
    while i > 0 && !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(text: &str, mut i: usize) -> usize {
    while i < text.len() && !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

#[async_trait]
impl ModelStrategy for OpenAiExtractor {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn extract(&self, text: &str) -> Result<ExtractionRecord, ModelError> {
        // Blank input never hits the network; the empty record is already
        // the right answer.
        if text.trim().is_empty() {
            return Ok(ExtractionRecord::empty());
        }
        let api_key = self.api_key.as_deref().ok_or(ModelError::NotConfigured)?;
        let prepared = self.prepare_text(text);
        self.request(api_key, &prepared).await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn extractor(max_prompt_chars: usize) -> OpenAiExtractor {
        let config = ModelConfig {
            max_prompt_chars,
            ..ModelConfig::default()
        };
        OpenAiExtractor::new(config, Some("test-key".to_string())).unwrap()
    }

    #[test]
    fn test_short_text_passes_through_unchanged() {
        let e = extractor(100);
        assert_eq!(e.prepare_text("Cap Rate: 6.5%"), "Cap Rate: 6.5%");
    }

    #[test]
    fn test_long_text_keeps_prefix_and_suffix_around_marker() {
        let e = extractor(20);
        let text = "A".repeat(30) + &"Z".repeat(30);
        let prepared = e.prepare_text(&text);
        assert!(prepared.starts_with("AAAAAAAAAA"));
        assert!(prepared.ends_with("ZZZZZZZZZZ"));
        assert!(prepared.contains(TRUNCATION_MARKER));
        assert_eq!(prepared.len(), 20 + TRUNCATION_MARKER.len());
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let e = extractor(9);
        let text = "é".repeat(40);
        let prepared = e.prepare_text(&text);
        assert!(prepared.contains(TRUNCATION_MARKER));
        // Slicing multibyte text must stay on character boundaries.
        assert!(prepared.chars().all(|c| c == 'é' || TRUNCATION_MARKER.contains(c)));
    }

    #[test]
    fn test_missing_key_reports_unconfigured() {
        let e = OpenAiExtractor::new(ModelConfig::default(), None).unwrap();
        assert!(!e.is_configured());
        let e = OpenAiExtractor::new(ModelConfig::default(), Some(String::new())).unwrap();
        assert!(!e.is_configured());
    }

    #[tokio::test]
    async fn test_blank_input_short_circuits_without_credentials() {
        let e = OpenAiExtractor::new(ModelConfig::default(), None).unwrap();
        let record = e.extract("   \n ").await.unwrap();
        assert_eq!(record, ExtractionRecord::empty());
    }

    #[tokio::test]
    async fn test_nonblank_input_without_credentials_errors() {
        let e = OpenAiExtractor::new(ModelConfig::default(), None).unwrap();
        let err = e.extract("Cap Rate: 6.5%").await.unwrap_err();
        assert!(matches!(err, ModelError::NotConfigured));
    }

    #[test]
    fn test_parse_completion_roundtrip() {
        let record_json = serde_json::to_string(&ExtractionRecord::empty()).unwrap();
        let completion = ChatCompletion {
            choices: vec![Choice {
                message: Message {
                    content: Some(record_json),
                },
            }],
        };
        let record = parse_completion(&completion).unwrap();
        assert_eq!(record, ExtractionRecord::empty());
    }

    #[test]
    fn test_parse_completion_rejects_empty_choices() {
        let completion = ChatCompletion { choices: vec![] };
        assert!(matches!(
            parse_completion(&completion),
            Err(ModelError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_completion_rejects_non_schema_payload() {
        let completion = ChatCompletion {
            choices: vec![Choice {
                message: Message {
                    content: Some("{\"property_details\": 42}".to_string()),
                },
            }],
        };
        assert!(matches!(
            parse_completion(&completion),
            Err(ModelError::MalformedResponse(_))
        ));
    }
}

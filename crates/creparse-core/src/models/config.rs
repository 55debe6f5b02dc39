//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};

/// Environment variable holding the model service API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Main configuration for the creparse pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreConfig {
    /// Strategy selection and fallback policy.
    pub extraction: ExtractionConfig,

    /// Model strategy settings.
    pub model: ModelConfig,
}

/// Strategy selection switches consumed by the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Prefer the model strategy when credentials are configured.
    pub use_model_strategy: bool,

    /// Fall back to the regex strategy when the model strategy fails.
    pub enable_fallback: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            use_model_strategy: true,
            enable_fallback: true,
        }
    }
}

/// Model strategy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model identifier sent to the service.
    pub model: String,

    /// Base URL of the OpenAI-compatible endpoint.
    pub base_url: String,

    /// Maximum tokens to request for the response.
    pub max_tokens: u32,

    /// Character budget for the prompt text; longer documents are reduced
    /// to a prefix/suffix pair around a truncation marker.
    pub max_prompt_chars: usize,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4-turbo-preview".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            max_tokens: 4096,
            max_prompt_chars: 16_000,
            timeout_secs: 120,
        }
    }
}

impl CreConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }

    /// API key from the environment, if configured.
    pub fn api_key() -> Option<String> {
        std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CreConfig::default();
        assert!(config.extraction.use_model_strategy);
        assert!(config.extraction.enable_fallback);
        assert_eq!(config.model.max_prompt_chars, 16_000);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: CreConfig =
            serde_json::from_str(r#"{"extraction": {"enable_fallback": false}}"#).unwrap();
        assert!(config.extraction.use_model_strategy);
        assert!(!config.extraction.enable_fallback);
        assert_eq!(config.model.max_tokens, 4096);
    }
}

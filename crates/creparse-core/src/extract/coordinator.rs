//! Strategy selection and fallback around the extraction engines.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CreError, ExtractionError, ModelError};
use crate::extract::regex_strategy::RegexExtractionStrategy;
use crate::extract::scorer::CompletenessScorer;
use crate::models::config::ExtractionConfig;
use crate::models::record::ExtractionRecord;

/// A model-backed extraction engine (structured generation over an LLM).
#[async_trait]
pub trait ModelStrategy: Send + Sync {
    /// Whether the engine has everything it needs to run (credentials etc.).
    fn is_configured(&self) -> bool;

    async fn extract(&self, text: &str) -> Result<ExtractionRecord, ModelError>;
}

/// Which engine produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyLabel {
    Model,
    Regex,
    RegexFallback,
}

impl StrategyLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyLabel::Model => "model",
            StrategyLabel::Regex => "regex",
            StrategyLabel::RegexFallback => "regex_fallback",
        }
    }
}

/// A scored record together with the engine that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatedExtraction {
    pub record: ExtractionRecord,
    pub strategy: StrategyLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StrategyPlan {
    RegexOnly,
    ModelPreferred { fallback: bool },
}

/// Runs the configured extraction engines against normalized text and
/// always returns a scored record (or a hard error when the model engine
/// fails with fallback disabled).
pub struct ExtractionCoordinator<M> {
    regex: RegexExtractionStrategy,
    scorer: CompletenessScorer,
    model: Option<M>,
    use_model_strategy: bool,
    enable_fallback: bool,
}

impl<M: ModelStrategy> ExtractionCoordinator<M> {
    pub fn new(config: &ExtractionConfig, model: Option<M>) -> Self {
        Self {
            regex: RegexExtractionStrategy::new(),
            scorer: CompletenessScorer::new(),
            model,
            use_model_strategy: config.use_model_strategy,
            enable_fallback: config.enable_fallback,
        }
    }

    fn plan(&self) -> StrategyPlan {
        let model_ready = self
            .model
            .as_ref()
            .map(|m| m.is_configured())
            .unwrap_or(false);
        if self.use_model_strategy && model_ready {
            StrategyPlan::ModelPreferred {
                fallback: self.enable_fallback,
            }
        } else {
            StrategyPlan::RegexOnly
        }
    }

    fn run_regex(&self, text: &str, label: StrategyLabel) -> CoordinatedExtraction {
        let record = self.scorer.score(self.regex.extract(text));
        CoordinatedExtraction {
            record,
            strategy: label,
        }
    }

    pub async fn extract(&self, text: &str) -> Result<CoordinatedExtraction, CreError> {
        match self.plan() {
            StrategyPlan::RegexOnly => {
                debug!(strategy = StrategyLabel::Regex.as_str(), "running extraction");
                Ok(self.run_regex(text, StrategyLabel::Regex))
            }
            StrategyPlan::ModelPreferred { fallback } => {
                let Some(model) = self.model.as_ref() else {
                    return Ok(self.run_regex(text, StrategyLabel::Regex));
                };
                debug!(strategy = StrategyLabel::Model.as_str(), "running extraction");
                match model.extract(text).await {
                    Ok(record) => Ok(CoordinatedExtraction {
                        record: self.scorer.score(record),
                        strategy: StrategyLabel::Model,
                    }),
                    Err(source) if fallback => {
                        warn!(error = %source, "model extraction failed, falling back to patterns");
                        Ok(self.run_regex(text, StrategyLabel::RegexFallback))
                    }
                    Err(source) => {
                        Err(ExtractionError::FallbackDisabled { source }.into())
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::record::{FieldValue, Scalar};

    struct StubModel {
        configured: bool,
        result: Result<ExtractionRecord, ModelError>,
    }

    #[async_trait]
    impl ModelStrategy for StubModel {
        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn extract(&self, _text: &str) -> Result<ExtractionRecord, ModelError> {
            self.result.clone()
        }
    }

    fn model_record() -> ExtractionRecord {
        let mut record = ExtractionRecord::empty();
        record.financial_metrics.cap_rate =
            FieldValue::cited(Scalar::Float(6.5), "Cap Rate: 6.5%");
        record
    }

    fn config(use_model: bool, fallback: bool) -> ExtractionConfig {
        ExtractionConfig {
            use_model_strategy: use_model,
            enable_fallback: fallback,
        }
    }

    #[tokio::test]
    async fn test_regex_only_when_model_disabled() {
        let coordinator = ExtractionCoordinator::new(
            &config(false, true),
            Some(StubModel {
                configured: true,
                result: Ok(model_record()),
            }),
        );
        let out = coordinator.extract("Cap Rate: 7.25%").await.unwrap();
        assert_eq!(out.strategy, StrategyLabel::Regex);
        assert_eq!(
            out.record.financial_metrics.cap_rate.value,
            Some(Scalar::Float(7.25))
        );
    }

    #[tokio::test]
    async fn test_unconfigured_model_downgrades_to_regex() {
        let coordinator = ExtractionCoordinator::new(
            &config(true, true),
            Some(StubModel {
                configured: false,
                result: Ok(model_record()),
            }),
        );
        let out = coordinator.extract("Cap Rate: 7.25%").await.unwrap();
        assert_eq!(out.strategy, StrategyLabel::Regex);
    }

    #[tokio::test]
    async fn test_model_success_is_scored_and_labeled() {
        let coordinator = ExtractionCoordinator::new(
            &config(true, true),
            Some(StubModel {
                configured: true,
                result: Ok(model_record()),
            }),
        );
        let out = coordinator.extract("irrelevant").await.unwrap();
        assert_eq!(out.strategy, StrategyLabel::Model);
        assert_eq!(out.record.extraction_metadata.fields_with_citations, 1);
        assert!(out.record.extraction_metadata.confidence_score > 0.0);
    }

    #[tokio::test]
    async fn test_model_failure_falls_back_to_patterns() {
        let coordinator = ExtractionCoordinator::new(
            &config(true, true),
            Some(StubModel {
                configured: true,
                result: Err(ModelError::ServiceUnavailable("503".to_string())),
            }),
        );
        let out = coordinator.extract("Cap Rate: 7.25%").await.unwrap();
        assert_eq!(out.strategy, StrategyLabel::RegexFallback);
        assert_eq!(
            out.record.financial_metrics.cap_rate.value,
            Some(Scalar::Float(7.25))
        );
    }

    #[tokio::test]
    async fn test_model_failure_without_fallback_is_an_error() {
        let coordinator = ExtractionCoordinator::new(
            &config(true, false),
            Some(StubModel {
                configured: true,
                result: Err(ModelError::ServiceUnavailable("503".to_string())),
            }),
        );
        let err = coordinator.extract("Cap Rate: 7.25%").await.unwrap_err();
        assert!(matches!(
            err,
            CreError::Extraction(ExtractionError::FallbackDisabled { .. })
        ));
    }

    #[tokio::test]
    async fn test_no_model_engine_at_all() {
        let coordinator: ExtractionCoordinator<StubModel> =
            ExtractionCoordinator::new(&config(true, true), None);
        let out = coordinator.extract("Lender: First National Bank").await.unwrap();
        assert_eq!(out.strategy, StrategyLabel::Regex);
        assert_eq!(
            out.record.loan_details.lender.value,
            Some(Scalar::Text("First National Bank".to_string()))
        );
    }

    #[tokio::test]
    async fn test_strategy_label_wire_names() {
        assert_eq!(
            serde_json::to_string(&StrategyLabel::RegexFallback).unwrap(),
            "\"regex_fallback\""
        );
        assert_eq!(StrategyLabel::Model.as_str(), "model");
    }
}

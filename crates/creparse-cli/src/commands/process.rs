//! Process command - extract data from a single document file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info};

use creparse_core::models::config::CreConfig;
use creparse_core::models::record::ExtractionRecord;
use creparse_core::schema::{self, FieldNode};
use creparse_core::{ExtractionCoordinator, StrategyLabel, parse_file};
use creparse_llm::OpenAiExtractor;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF, DOCX, or XLSX)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Skip the model strategy and use only pattern extraction
    #[arg(long)]
    regex_only: bool,

    /// Fail instead of falling back to patterns when the model strategy errors
    #[arg(long)]
    no_fallback: bool,

    /// Show confidence and citation coverage after extraction
    #[arg(long)]
    show_confidence: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

/// Wire shape of a single-document result.
#[derive(Serialize)]
pub struct ExtractionOutput {
    pub file: String,
    pub strategy: StrategyLabel,
    pub data: ExtractionRecord,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );

    pb.set_message("Reading document...");
    pb.set_position(20);

    let document = parse_file(&args.input)?;
    debug!(
        format = document.format.name(),
        pages = document.page_count,
        chars = document.full_text.len(),
        "document decoded"
    );

    pb.set_message("Extracting fields...");
    pb.set_position(50);

    let coordinator = build_coordinator(
        &config,
        &CoordinatorOverrides {
            regex_only: args.regex_only,
            no_fallback: args.no_fallback,
        },
    )?;
    let result = coordinator.extract(&document.full_text).await?;

    pb.set_position(100);
    pb.finish_with_message("Done");

    let output = ExtractionOutput {
        file: args.input.display().to_string(),
        strategy: result.strategy,
        data: result.record,
    };
    let rendered = format_output(&output, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &rendered)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", rendered);
    }

    if args.show_confidence {
        let meta = &output.data.extraction_metadata;
        println!();
        println!(
            "{} Strategy: {}",
            style("ℹ").blue(),
            output.strategy.as_str()
        );
        println!(
            "{} Confidence: {:.2}% ({} fields missing)",
            style("ℹ").blue(),
            meta.confidence_score,
            meta.missing_fields.len()
        );
        println!(
            "{} Citation coverage: {:.2}%",
            style("ℹ").blue(),
            meta.citation_coverage_percent
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn load_config(config_path: Option<&str>) -> anyhow::Result<CreConfig> {
    Ok(match config_path {
        Some(path) => CreConfig::from_file(std::path::Path::new(path))?,
        None => CreConfig::default(),
    })
}

/// CLI switches applied on top of the loaded configuration.
pub struct CoordinatorOverrides {
    pub regex_only: bool,
    pub no_fallback: bool,
}

/// Build the coordinator for one invocation, applying CLI overrides on top
/// of the loaded configuration.
pub fn build_coordinator(
    config: &CreConfig,
    overrides: &CoordinatorOverrides,
) -> anyhow::Result<ExtractionCoordinator<OpenAiExtractor>> {
    let mut extraction = config.extraction.clone();
    if overrides.regex_only {
        extraction.use_model_strategy = false;
    }
    if overrides.no_fallback {
        extraction.enable_fallback = false;
    }

    let model = if extraction.use_model_strategy {
        Some(OpenAiExtractor::from_env(config.model.clone())?)
    } else {
        None
    };

    Ok(ExtractionCoordinator::new(&extraction, model))
}

pub fn format_output(output: &ExtractionOutput, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(output)?),
        OutputFormat::Text => Ok(format_text(output)),
    }
}

fn format_text(output: &ExtractionOutput) -> String {
    let mut text = String::new();

    text.push_str(&format!("File: {}\n", output.file));
    text.push_str(&format!("Strategy: {}\n", output.strategy.as_str()));
    text.push('\n');

    let mut group = "";
    for (def, node) in output.data.fields() {
        if def.group != group {
            group = def.group;
            text.push_str(&format!("{}:\n", group));
        }
        match node {
            FieldNode::Leaf(value) => {
                if let Some(scalar) = &value.value {
                    let unit = value
                        .unit
                        .as_deref()
                        .map(|u| format!(" {u}"))
                        .unwrap_or_default();
                    text.push_str(&format!("  {}: {}{}\n", def.name, scalar, unit));
                }
            }
            FieldNode::List(entries) => {
                let filled = entries.iter().filter(|e| e.filled).count();
                if filled > 0 {
                    text.push_str(&format!("  {}: {} items\n", def.name, filled));
                }
            }
        }
    }

    let meta = &output.data.extraction_metadata;
    let filled = meta.fields_with_citations + meta.fields_without_citations;
    text.push('\n');
    text.push_str("Summary:\n");
    text.push_str(&format!(
        "  Filled: {} values, {}/{} fields ({:.2}% confidence)\n",
        filled,
        schema::total_fillable() - meta.missing_fields.len(),
        schema::total_fillable(),
        meta.confidence_score
    ));
    text.push_str(&format!(
        "  Cited:  {} values ({:.2}% of filled)\n",
        meta.fields_with_citations, meta.citation_coverage_percent
    ));

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use creparse_core::models::record::{FieldValue, Scalar};
    use creparse_core::{CompletenessScorer, RegexExtractionStrategy};

    fn sample_output() -> ExtractionOutput {
        let strategy = RegexExtractionStrategy::new();
        let record = strategy.extract("Cap Rate: 6.5%\nLender: First National Bank\n");
        ExtractionOutput {
            file: "deal.pdf".to_string(),
            strategy: StrategyLabel::Regex,
            data: CompletenessScorer::new().score(record),
        }
    }

    #[test]
    fn test_json_output_carries_strategy_and_metadata() {
        let rendered = format_output(&sample_output(), OutputFormat::Json).unwrap();
        let json: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(json["strategy"], "regex");
        assert_eq!(json["data"]["financial_metrics"]["cap_rate"]["value"], 6.5);
        assert!(json["data"]["extraction_metadata"]["confidence_score"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_text_output_skips_null_fields() {
        let rendered = format_output(&sample_output(), OutputFormat::Text).unwrap();
        assert!(rendered.contains("cap_rate: 6.5"));
        assert!(rendered.contains("lender: First National Bank"));
        assert!(!rendered.contains("noi_annual"));
    }

    #[test]
    fn test_text_output_lists_show_item_counts() {
        let mut output = sample_output();
        output.data.tenant_information.major_tenants.push(
            creparse_core::models::record::TenantEntry::cited("Acme Corp", "Tenant: Acme Corp"),
        );
        output.data.property_details.year_built =
            FieldValue::cited(Scalar::Int(1998), "Year Built: 1998");
        output.data = CompletenessScorer::new().score(output.data);
        let rendered = format_output(&output, OutputFormat::Text).unwrap();
        assert!(rendered.contains("major_tenants: 1 items"));
        assert!(rendered.contains("year_built: 1998"));
    }
}

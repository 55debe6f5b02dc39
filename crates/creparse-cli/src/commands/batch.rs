//! Batch processing command for multiple document files.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use creparse_core::CoordinatedExtraction;
use creparse_core::models::config::CreConfig;

use super::process::{
    CoordinatorOverrides, ExtractionOutput, OutputFormat, build_coordinator, load_config,
};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Stop at the first failing file instead of collecting its error
    #[arg(long)]
    fail_fast: bool,

    /// Skip the model strategy and use only pattern extraction
    #[arg(long)]
    regex_only: bool,
}

/// Result of processing a single file, success or failure, in input order.
pub struct BatchItem {
    pub path: PathBuf,
    pub extraction: Option<CoordinatedExtraction>,
    pub error: Option<String>,
    pub processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    let files = collect_files(&args.input)?;
    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let coordinator = build_batch_coordinator(&config, &args)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    // Every file gets an entry, kept in input order so batch output lines
    // up with the request.
    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let file_start = Instant::now();
        let outcome = process_one(&path, &coordinator).await;
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match outcome {
            Ok(extraction) => {
                results.push(BatchItem {
                    path,
                    extraction: Some(extraction),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.fail_fast {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
                warn!("Failed to process {}: {}", path.display(), error_msg);
                results.push(BatchItem {
                    path,
                    extraction: None,
                    error: Some(error_msg),
                    processing_time_ms,
                });
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.extraction.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(ref output_dir) = args.output_dir {
        for item in &successful {
            let Some(extraction) = &item.extraction else {
                continue;
            };
            let stem = item
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("document");
            let extension = match args.format {
                OutputFormat::Json => "json",
                OutputFormat::Text => "txt",
            };
            let output_path = output_dir.join(format!("{}.{}", stem, extension));

            let output = ExtractionOutput {
                file: item.path.display().to_string(),
                strategy: extraction.strategy,
                data: extraction.record.clone(),
            };
            let content = super::process::format_output(&output, args.format)?;
            fs::write(&output_path, content)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for item in &failed {
            println!(
                "  - {}: {}",
                item.path.display(),
                item.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn build_batch_coordinator(
    config: &CreConfig,
    args: &BatchArgs,
) -> anyhow::Result<creparse_core::ExtractionCoordinator<creparse_llm::OpenAiExtractor>> {
    // Reuse the single-file coordinator wiring; batch only adds iteration.
    // Fallback stays on so one model outage cannot fail a whole batch.
    let overrides = CoordinatorOverrides {
        regex_only: args.regex_only,
        no_fallback: false,
    };
    build_coordinator(config, &overrides)
}

async fn process_one(
    path: &PathBuf,
    coordinator: &creparse_core::ExtractionCoordinator<creparse_llm::OpenAiExtractor>,
) -> anyhow::Result<CoordinatedExtraction> {
    let document = creparse_core::parse_file(path)?;
    Ok(coordinator.extract(&document.full_text).await?)
}

/// Expand a glob pattern to candidate files, in match order. Unsupported
/// extensions are kept here on purpose: they surface as per-file error
/// rows instead of disappearing from the batch report.
pub fn collect_files(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let files = glob(pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();
    Ok(files)
}

/// One row per input file, successes and failures alike.
pub fn write_summary(path: &PathBuf, results: &[BatchItem]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "strategy",
        "confidence_score",
        "citation_coverage_percent",
        "missing_fields",
        "processing_time_ms",
        "processed_at",
        "error",
    ])?;

    let processed_at = Utc::now().to_rfc3339();
    for item in results {
        let filename = item
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(extraction) = &item.extraction {
            let meta = &extraction.record.extraction_metadata;
            wtr.write_record([
                filename,
                "success",
                extraction.strategy.as_str(),
                &format!("{:.2}", meta.confidence_score),
                &format!("{:.2}", meta.citation_coverage_percent),
                &meta.missing_fields.len().to_string(),
                &item.processing_time_ms.to_string(),
                &processed_at,
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                &item.processing_time_ms.to_string(),
                &processed_at,
                item.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use creparse_core::models::record::ExtractionRecord;
    use creparse_core::{CompletenessScorer, StrategyLabel};

    fn success_item(name: &str) -> BatchItem {
        let record = CompletenessScorer::new().score(ExtractionRecord::empty());
        BatchItem {
            path: PathBuf::from(name),
            extraction: Some(CoordinatedExtraction {
                record,
                strategy: StrategyLabel::Regex,
            }),
            error: None,
            processing_time_ms: 12,
        }
    }

    fn failed_item(name: &str, error: &str) -> BatchItem {
        BatchItem {
            path: PathBuf::from(name),
            extraction: None,
            error: Some(error.to_string()),
            processing_time_ms: 3,
        }
    }

    #[test]
    fn test_collect_files_keeps_unsupported_files_for_error_reporting() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.pdf", "b.txt", "c.docx"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested")).unwrap();
        let pattern = format!("{}/*", dir.path().display());
        let files = collect_files(&pattern).unwrap();
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| p.file_name().and_then(|s| s.to_str()))
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.txt", "c.docx"]);
    }

    #[tokio::test]
    async fn test_unsupported_file_becomes_a_per_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.txt");
        fs::write(&path, b"Cap Rate: 6.5%").unwrap();

        let config = CreConfig::default();
        let coordinator = build_batch_coordinator(
            &config,
            &BatchArgs {
                input: String::new(),
                output_dir: None,
                format: OutputFormat::Json,
                summary: false,
                fail_fast: false,
                regex_only: true,
            },
        )
        .unwrap();

        let err = process_one(&path, &coordinator).await.unwrap_err();
        assert!(err.to_string().contains("unsupported file format"));
    }

    #[test]
    fn test_summary_keeps_input_order_with_error_rows_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let summary = dir.path().join("summary.csv");
        let results = vec![
            success_item("first.pdf"),
            failed_item("second.csv", "unsupported file format: csv"),
            success_item("third.docx"),
        ];

        write_summary(&summary, &results).unwrap();

        let content = fs::read_to_string(&summary).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("first.pdf,success,regex,"));
        assert!(lines[2].starts_with("second.csv,error,"));
        assert!(lines[2].contains("unsupported file format: csv"));
        assert!(lines[3].starts_with("third.docx,success,"));
    }
}

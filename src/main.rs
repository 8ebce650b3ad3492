// src/main.rs
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tokio::task::JoinSet;

use compliance_extractor::catalog::ImportBatch;
use compliance_extractor::config::ExtractConfig;
use compliance_extractor::extractors::DocumentFormat;
use compliance_extractor::storage::StorageManager;
use compliance_extractor::utils::{self, text_debug, AppError, ExtractError};
use compliance_extractor::{DocumentParser, ParseResult};

/// Command Line Interface for compliance mapping extraction
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log extraction details at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract controls and mappings from one document
    Extract {
        /// Input document (.pdf, .xlsx, .xls or .csv)
        input: PathBuf,

        /// Document type label, e.g. "BSI Zuordnungstabelle" or "C5 Cross-Reference"
        #[arg(short = 't', long, default_value = "BSI Zuordnungstabelle")]
        doc_type: String,

        /// Label recorded on imported mappings (defaults to the file name)
        #[arg(short, long)]
        source_document: Option<String>,

        /// Output directory for extracted content
        #[arg(short, long, default_value = "./output")]
        output_dir: PathBuf,

        /// Print the result JSON to stdout instead of writing files
        #[arg(long)]
        stdout: bool,

        /// Debug mode - save an annotated view of the extracted text
        #[arg(short, long)]
        debug: bool,

        /// Maximum characters of raw text kept in the result
        #[arg(long)]
        raw_text_limit: Option<usize>,
    },

    /// Extract several documents concurrently
    Batch {
        /// Input documents
        inputs: Vec<PathBuf>,

        /// Document type label applied to every input
        #[arg(short = 't', long, default_value = "BSI Zuordnungstabelle")]
        doc_type: String,

        /// Output directory for extracted content
        #[arg(short, long, default_value = "./output")]
        output_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments
    let cli = Cli::parse();

    // 2. Setup Logging (RUST_LOG wins over --verbose)
    utils::logging::setup_logging(cli.verbose);
    tracing::info!("Starting processing for args: {:?}", cli);

    match cli.command {
        Commands::Extract {
            input,
            doc_type,
            source_document,
            output_dir,
            stdout,
            debug,
            raw_text_limit,
        } => {
            let mut config = ExtractConfig::from_env();
            if let Some(limit) = raw_text_limit {
                tracing::debug!("Setting raw text limit to {} from command-line argument", limit);
                config.raw_text_limit = limit;
            }
            let parser = DocumentParser::with_config(config);
            let (filename, result) = extract_file(&parser, &input, &doc_type)?;

            if stdout {
                let json = serde_json::to_string_pretty(&result)
                    .map_err(|e| AppError::Processing(e.to_string()))?;
                println!("{}", json);
            } else {
                let storage = StorageManager::new(&output_dir)?;
                let source_document = source_document.unwrap_or_else(|| filename.clone());
                save_outputs(&storage, &filename, &doc_type, &source_document, &result)?;

                if debug {
                    let debug_dir = storage.document_dir(&file_stem(&input))?.join("debug");
                    std::fs::create_dir_all(&debug_dir)?;
                    text_debug::save_annotated_text(
                        &result.raw_text,
                        &debug_dir.join("raw_text_annotated.html"),
                    )?;
                }
            }

            if !result.success {
                return Err(AppError::Processing(
                    result.error.unwrap_or_else(|| "extraction failed".to_string()),
                ));
            }
            Ok(())
        }
        Commands::Batch {
            inputs,
            doc_type,
            output_dir,
        } => run_batch(inputs, doc_type, output_dir).await,
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

fn extract_file(
    parser: &DocumentParser,
    input: &Path,
    doc_type: &str,
) -> Result<(String, ParseResult), AppError> {
    if !input.is_file() {
        return Err(AppError::Config(format!(
            "Input is not a file: {}",
            input.display()
        )));
    }
    let filename = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if DocumentFormat::from_filename(&filename).is_none() {
        return Err(ExtractError::UnsupportedFormat(filename.to_lowercase()).into());
    }
    let content = std::fs::read(input)?;
    tracing::info!("Read {} ({} bytes)", input.display(), content.len());

    let result = parser.parse(&content, &filename, doc_type);
    Ok((filename, result))
}

fn save_outputs(
    storage: &StorageManager,
    filename: &str,
    doc_type: &str,
    source_document: &str,
    result: &ParseResult,
) -> Result<(), AppError> {
    let stem = file_stem(Path::new(filename));
    storage.save_result(&stem, result)?;
    storage.save_result_metadata(&stem, filename, doc_type, result)?;
    if result.success {
        let batch = ImportBatch::from_result(result, doc_type, source_document);
        storage.save_import_batch(&stem, &batch)?;
    }
    Ok(())
}

async fn run_batch(inputs: Vec<PathBuf>, doc_type: String, output_dir: PathBuf) -> Result<(), AppError> {
    if inputs.is_empty() {
        return Err(AppError::Config("No input files specified".to_string()));
    }

    let storage = StorageManager::new(&output_dir)?;
    let parser = DocumentParser::with_config(ExtractConfig::from_env());
    tracing::info!("Batch processing {} file(s)", inputs.len());

    // Each document is an independent invocation; nothing is shared but the config.
    let mut tasks = JoinSet::new();
    for (idx, input) in inputs.iter().cloned().enumerate() {
        let parser = parser.clone();
        let doc_type = doc_type.clone();
        tasks.spawn_blocking(move || (idx, extract_file(&parser, &input, &doc_type)));
    }

    let mut outcomes = Vec::with_capacity(inputs.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => return Err(AppError::Processing(format!("Extraction task failed: {}", e))),
        }
    }
    outcomes.sort_by_key(|(idx, _)| *idx);

    let mut success_count = 0;
    let mut failure_count = 0;
    for (idx, outcome) in outcomes {
        let input = &inputs[idx];
        match outcome {
            Ok((filename, result)) => {
                save_outputs(&storage, &filename, &doc_type, &filename, &result)?;
                if result.success {
                    tracing::info!(
                        "[{}/{}] {}: {} controls, {} mappings",
                        idx + 1,
                        inputs.len(),
                        input.display(),
                        result.controls.len(),
                        result.mappings.len()
                    );
                    success_count += 1;
                } else {
                    tracing::error!(
                        "[{}/{}] {}: {}",
                        idx + 1,
                        inputs.len(),
                        input.display(),
                        result.error.as_deref().unwrap_or("unknown error")
                    );
                    failure_count += 1;
                }
            }
            Err(e) => {
                tracing::error!("[{}/{}] {}: {}", idx + 1, inputs.len(), input.display(), e);
                failure_count += 1;
            }
        }
    }

    tracing::info!("Processing finished. Success: {}, Failures: {}", success_count, failure_count);

    if success_count == 0 && failure_count > 0 {
        return Err(AppError::Processing(format!(
            "Failed to extract any of {} documents",
            failure_count
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_input_is_rejected_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("Notes.TXT");
        std::fs::write(&input, "A.5.1,ISMS.1.A3").unwrap();

        let err = extract_file(&DocumentParser::new(), &input, "BSI").unwrap_err();
        match err {
            AppError::Extraction(ExtractError::UnsupportedFormat(name)) => assert_eq!(name, "notes.txt"),
            other => panic!("expected unsupported format, got {:?}", other),
        }
    }

    #[test]
    fn missing_input_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_file(&DocumentParser::new(), &dir.path().join("gone.csv"), "BSI").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}

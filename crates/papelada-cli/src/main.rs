//! Command-line driver for the papelada document ingestion pipeline.
//!
//! Reads a PDF or image, runs OCR with the production backends, streams
//! progress to stderr, and prints the recognized text (or the JSON outcome)
//! to stdout.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use papelada::ocr::TesseractBackend;
use papelada::pdf::{PageRasterizer, PdfPages, PdfiumRasterizer, RasterError};
use papelada::progress::ChannelSink;
use papelada::{DocumentInput, DocumentPipeline, PipelineConfig, ProcessStatus, RecognitionOutcome};

#[derive(Parser)]
#[command(name = "papelada", version, about = "Extract text from PDFs and images via OCR")]
struct Cli {
    /// Input document (PDF or image)
    file: PathBuf,

    /// Recognition language, ISO 639-2 (defaults to Portuguese)
    #[arg(short, long)]
    language: Option<String>,

    /// Oversampling scale for PDF page rasterization
    #[arg(long)]
    scale: Option<f32>,

    /// Load pipeline configuration from a TOML file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the outcome as JSON instead of plain text
    #[arg(long)]
    json: bool,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

/// Stands in for the pdfium rasterizer when the library is not installed;
/// image-only usage still works, and PDF input surfaces the original
/// binding error.
struct UnavailableRasterizer(RasterError);

#[async_trait]
impl PageRasterizer for UnavailableRasterizer {
    async fn open(&self, _bytes: &[u8]) -> std::result::Result<Box<dyn PdfPages>, RasterError> {
        Err(self.0.clone())
    }
}

fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(language) = &cli.language {
        config.recognition.language = language.clone();
    }
    if let Some(scale) = cli.scale {
        config.render_scale = scale;
    }
    config.validate().context("invalid pipeline configuration")?;
    Ok(config)
}

async fn run(cli: Cli) -> Result<ProcessStatus> {
    let config = build_config(&cli)?;

    let bytes = tokio::fs::read(&cli.file)
        .await
        .with_context(|| format!("failed to read {}", cli.file.display()))?;
    let name = cli
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.file.display().to_string());

    // Media type is inferred from the extension; the pipeline rejects
    // anything that is neither PDF nor image before allocating resources.
    let document = DocumentInput::new(name, "", bytes);

    let rasterizer: Arc<dyn PageRasterizer> = match PdfiumRasterizer::new() {
        Ok(rasterizer) => Arc::new(rasterizer),
        Err(err) => {
            debug!(error = %err, "pdfium unavailable; PDF input will fail");
            Arc::new(UnavailableRasterizer(err))
        }
    };
    let backend = Arc::new(TesseractBackend::new().context("recognition engine unavailable")?);

    let pipeline = DocumentPipeline::new(rasterizer, backend, config);

    let (sink, mut progress) = ChannelSink::new();
    let printer = {
        let quiet = cli.quiet;
        tokio::spawn(async move {
            while let Some(update) = progress.recv().await {
                if !quiet {
                    eprintln!("[{:>3}%] {}", update.overall_percent, update.message);
                }
            }
        })
    };

    let token = CancellationToken::new();
    {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("interrupted, cancelling");
                token.cancel();
            }
        });
    }

    let status = pipeline.process(document, Arc::new(sink), token).await;
    printer.await.ok();
    Ok(status)
}

fn report(status: ProcessStatus, json: bool) -> Result<ExitCode> {
    match status {
        ProcessStatus::Cancelled => {
            eprintln!("cancelled");
            Ok(ExitCode::from(130))
        }
        ProcessStatus::Completed(outcome) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
                return Ok(match outcome {
                    RecognitionOutcome::Failed { .. } => ExitCode::FAILURE,
                    _ => ExitCode::SUCCESS,
                });
            }
            match outcome {
                RecognitionOutcome::Success { text } => {
                    println!("{text}");
                    Ok(ExitCode::SUCCESS)
                }
                RecognitionOutcome::Empty => {
                    eprintln!("no text recognized in document");
                    Ok(ExitCode::SUCCESS)
                }
                RecognitionOutcome::Failed { error, detail } => {
                    eprintln!("error ({error}): {detail}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;
    let status = run(cli).await?;
    report(status, json)
}

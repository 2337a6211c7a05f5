//! File Uploadr - validate and store uploaded files
//!
//! Stages the given files (or stdin) the way a web transport would and runs
//! them through the configured upload handler.

use anyhow::Context;
use bytes::Bytes;
use clap::Parser;
use file_uploadr::upload::staging::StagedFile;
use file_uploadr::upload::{FieldUpload, PostSizeLimit, UploadEntry, UploadHandler, UploadRequest};
use file_uploadr::Config;
use std::io::{Cursor, Read};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// File Uploadr - validating single-field upload handler
#[derive(Parser, Debug)]
#[command(name = "file-uploadr")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Upload field name
    #[arg(short, long, default_value = "file")]
    field: String,

    /// Save directory when no configuration file is given
    #[arg(long, conflicts_with = "config")]
    save_path: Option<String>,

    /// Request body ceiling, e.g. "8m" (overrides the configuration)
    #[arg(long)]
    post_max_size: Option<String>,

    /// Declared MIME type of the uploaded content
    #[arg(short = 't', long = "type", default_value = "application/octet-stream")]
    mime_type: String,

    /// Read one raw-body upload from stdin instead of FILES
    #[arg(long, conflicts_with = "files")]
    stdin: bool,

    /// Declared file name for --stdin uploads
    #[arg(long, requires = "stdin")]
    name: Option<String>,

    /// Print Prometheus metrics to stderr after processing
    #[arg(long)]
    print_metrics: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Files to upload
    files: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting File Uploadr v{}", env!("CARGO_PKG_VERSION"));

    let (handler, mut limit) = match &args.config {
        Some(path) => {
            let config = Config::load(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?;
            info!("Loaded configuration from {:?}", path);
            let handler = config
                .handler(&args.field)
                .with_context(|| format!("no handler configured for field '{}'", args.field))?;
            (handler, config.post_size_limit())
        }
        None => {
            let mut handler = UploadHandler::new(args.field.as_str());
            if let Some(save_path) = &args.save_path {
                handler = handler.with_save_path(save_path.as_str());
            }
            (handler, PostSizeLimit::UNLIMITED)
        }
    };
    if let Some(raw) = &args.post_max_size {
        limit = PostSizeLimit::parse(raw);
    }

    let mut staged = Vec::new();
    let mut request = if args.stdin {
        let mut body = Vec::new();
        std::io::stdin()
            .read_to_end(&mut body)
            .context("reading upload body from stdin")?;
        let entry = UploadEntry::raw_body(args.name.clone().unwrap_or_default());

        UploadRequest::new()
            .with_field(args.field.as_str(), FieldUpload::Single(entry))
            .with_content_length(body.len() as u64)
            .with_content_type(args.mime_type.as_str())
            .with_body(Cursor::new(body))
    } else {
        if args.files.is_empty() {
            anyhow::bail!("no input files given (pass FILES or --stdin)");
        }

        let mut entries = Vec::with_capacity(args.files.len());
        let mut total = 0u64;
        for path in &args.files {
            let data = std::fs::read(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let file = StagedFile::from_bytes(Bytes::from(data))
                .with_context(|| format!("staging {}", path.display()))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            total += file.size();
            entries.push(file.entry(name, args.mime_type.as_str()));
            staged.push(file);
        }

        UploadRequest::new()
            .with_field(args.field.as_str(), FieldUpload::Multiple(entries))
            .with_content_length(total)
    };

    let results = handler.process(&mut request, limit);
    drop(staged);

    println!("{}", serde_json::to_string_pretty(&results)?);

    #[cfg(feature = "metrics")]
    {
        if args.print_metrics {
            eprintln!("{}", file_uploadr::metrics::render());
        }
    }

    if results.iter().any(|r| !r.is_success()) {
        std::process::exit(1);
    }

    Ok(())
}

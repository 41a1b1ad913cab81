//! CLI binary for pngx-upload.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `UploadConfig`, renders progress with indicatif, and returns the exit
//! codes scripts rely on: 0 for success (or a cancelled/dry run), 1 for
//! invalid arguments, failed connectivity, or zero successful uploads.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pngx_upload::{
    BatchRunner, HfDatasetSource, PaperlessClient, UploadConfig, UploadProgressCallback,
};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per sample.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    /// The bar length is set by `on_run_start` once the index range is known.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Contacting dataset hub…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl UploadProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} documents  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
        self.bar.set_length(total as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Uploading");
    }

    fn on_item_start(&self, index: usize, _total: usize) {
        self.bar.set_message(format!("sample {}", index + 1));
    }

    fn on_item_uploaded(&self, index: usize, _total: usize, title: &str, task_id: &str) {
        let shown: String = title.chars().take(50).collect();
        self.bar.println(format!(
            "  {} {:>5}  {}  {}",
            green("✓"),
            index + 1,
            shown,
            dim(&format!("task {task_id}")),
        ));
        self.bar.inc(1);
    }

    fn on_item_error(&self, index: usize, _total: usize, error: &str) {
        let shown: String = error.chars().take(80).collect();
        self.bar
            .println(format!("  {} {:>5}  {}", red("✗"), index + 1, red(&shown)));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, batch: usize, attempted: usize, successful: usize, failed: usize) {
        self.bar.println(dim(&format!(
            "  batch {batch} done — {attempted} attempted, {successful} ok, {failed} failed"
        )));
    }

    fn on_run_complete(&self, _successful: usize, _failed: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Upload 50 samples to a local instance
  pngx-upload --url http://localhost:8000 --token your_token_here

  # Upload 25 samples, skipping the confirmation prompt
  pngx-upload --url https://paperless.example.com --token abc123 --max 25 --yes

  # Resume from index 100
  pngx-upload --url http://localhost:8000 --token abc123 --start 100 --max 50

  # Assign a document type and two tags
  pngx-upload --url http://localhost:8000 --token abc123 \
      --document-type 4 --tag 11 --tag 12

  # Connectivity check only
  pngx-upload --url http://localhost:8000 --token abc123 --dry-run

SUGGESTED TAGS:
  Create these in Paperless-NGX first and pass their ids via --tag:
    German Handwriting, FHSWF Dataset, Machine Learning,
    Training Data, Handwriting Recognition

ENVIRONMENT VARIABLES:
  PAPERLESS_URL    Paperless-NGX base URL (same as --url)
  PAPERLESS_TOKEN  API token (same as --token)
"#;

/// Upload the fhswf German handwriting dataset to Paperless-NGX.
#[derive(Parser, Debug)]
#[command(
    name = "pngx-upload",
    version,
    about = "Upload the fhswf German handwriting dataset to Paperless-NGX",
    long_about = "Downloads samples of the fhswf/german_handwriting dataset from the Hugging Face \
datasets-server, converts each image to JPEG, and uploads it as a document to a running \
Paperless-NGX instance. Sequential, rate-limited, with per-sample error isolation.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Paperless-NGX base URL (e.g. http://localhost:8000).
    #[arg(long, env = "PAPERLESS_URL")]
    url: String,

    /// Paperless-NGX API token.
    #[arg(long, env = "PAPERLESS_TOKEN", hide_env_values = true)]
    token: String,

    /// Maximum number of documents to upload.
    #[arg(long, default_value_t = 50,
          value_parser = clap::value_parser!(u32).range(1..))]
    max: u32,

    /// Starting index in the dataset (0-indexed).
    #[arg(long, default_value_t = 0)]
    start: u32,

    /// Document type id to assign to uploaded documents.
    #[arg(long)]
    document_type: Option<u32>,

    /// Correspondent id to assign to uploaded documents.
    #[arg(long)]
    correspondent: Option<u32>,

    /// Tag id to assign; repeat the flag for multiple tags.
    #[arg(long = "tag")]
    tags: Vec<u32>,

    /// Batch size for progress reporting.
    #[arg(long, default_value_t = 10,
          value_parser = clap::value_parser!(u32).range(1..))]
    batch_size: u32,

    /// Hugging Face dataset to pull from.
    #[arg(long, default_value = "fhswf/german_handwriting")]
    dataset: String,

    /// Dataset configuration name.
    #[arg(long, default_value = "default")]
    config_name: String,

    /// Dataset split.
    #[arg(long, default_value = "train")]
    split: String,

    /// Title prefix for derived and synthetic titles.
    #[arg(long, default_value = "German Handwriting")]
    title_prefix: String,

    /// Test the connection only; never uploads.
    #[arg(long)]
    dry_run: bool,

    /// Skip the interactive confirmation prompt.
    #[arg(short, long)]
    yes: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Show only the last 8 characters of the token.
///
/// Counts characters, not bytes, so multi-byte tokens cannot split a char
/// boundary.
fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() > 8 {
        let visible: String = chars[chars.len() - 8..].iter().collect();
        format!("{}{visible}", "*".repeat(chars.len() - 8))
    } else {
        "*".repeat(chars.len())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Invalid arguments exit 1 (matching the connectivity/no-uploads
    // failure paths); an explicit --help or --version still exits 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e)
            if matches!(
                e.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) =>
        {
            e.print().ok();
            return Ok(());
        }
        Err(e) => {
            e.print().ok();
            std::process::exit(1);
        }
    };

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar carries the per-sample feedback, so library INFO
    // logs are suppressed unless --verbose asks for them.
    let show_progress = !cli.quiet && !cli.dry_run;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    // ── Build config (validates URL scheme, bounds) ──────────────────────
    let mut builder = UploadConfig::builder(&cli.url, &cli.token)
        .max_documents(cli.max as usize)
        .start_index(cli.start as usize)
        .batch_size(cli.batch_size as usize)
        .tag_ids(cli.tags.iter().copied())
        .title_prefix(&cli.title_prefix);
    if let Some(dt) = cli.document_type {
        builder = builder.document_type(dt);
    }
    if let Some(c) = cli.correspondent {
        builder = builder.correspondent(c);
    }
    if show_progress {
        builder = builder.progress_callback(CliProgressCallback::new_dynamic());
    }
    let config = match builder.build() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} {e}", red("Error:"));
            std::process::exit(1);
        }
    };

    // ── Configuration summary ────────────────────────────────────────────
    if !cli.quiet {
        println!("{}", bold("fhswf German Handwriting Dataset → Paperless-NGX"));
        println!("{}", "=".repeat(60));
        println!("Paperless-NGX URL:    {}", config.base_url);
        println!("API token:            {}", mask_token(&config.token));
        println!("Dataset:              {} ({})", cli.dataset, cli.split);
        println!("Documents to process: {}", config.max_documents);
        println!("Starting index:       {}", config.start_index);
        println!("Batch size:           {}", config.batch_size);
        if let Some(dt) = config.document_type {
            println!("Document type id:     {dt}");
        }
        if let Some(c) = config.correspondent {
            println!("Correspondent id:     {c}");
        }
        if !config.tag_ids.is_empty() {
            println!("Tag ids:              {:?}", config.tag_ids);
        }
        println!("Dry run:              {}", if cli.dry_run { "yes" } else { "no" });
        println!();
    }

    let client = PaperlessClient::new(&config.base_url, &config.token, config.request_timeout_secs)
        .context("Failed to build Paperless client")?;

    // ── Dry-run: probe only, never upload ────────────────────────────────
    if cli.dry_run {
        println!("DRY RUN: testing connection only…");
        if client.test_connection().await {
            println!("{} Connection test successful", green("✓"));
            println!("{} Ready to upload (remove --dry-run to proceed)", green("✓"));
            return Ok(());
        }
        eprintln!("{} Connection test failed", red("✗"));
        std::process::exit(1);
    }

    // ── Interactive confirmation ─────────────────────────────────────────
    if !cli.yes {
        println!("This will:");
        println!("  1. Pull '{}' samples from the Hugging Face datasets-server", cli.dataset);
        println!("  2. Convert each handwriting image to JPEG");
        println!("  3. Upload each image as a document to {}", config.base_url);
        println!("  4. Use the transcription text as the document title");
        println!();
        print!("Do you want to continue? (y/N): ");
        io::stdout().flush().ok();

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer).ok();
        if !answer.trim().eq_ignore_ascii_case("y") {
            println!("Operation cancelled.");
            return Ok(());
        }
    }

    // ── Connect the dataset source and run ───────────────────────────────
    let source = HfDatasetSource::connect(
        &cli.dataset,
        &cli.config_name,
        &cli.split,
        config.request_timeout_secs,
    )
    .await
    .context("Failed to reach the Hugging Face datasets-server")?;

    let mut runner = BatchRunner::new(source, client, config);
    let report = match runner.run().await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{} {e}", red("✗"));
            std::process::exit(1);
        }
    };

    // ── Final summary ────────────────────────────────────────────────────
    if !cli.quiet {
        println!();
        println!("{}", "=".repeat(60));
        println!("{}", bold("UPLOAD COMPLETED"));
        println!("{}", "=".repeat(60));
        println!("Total documents processed: {}", report.attempted);
        println!("Successful uploads:        {}", report.successful);
        println!("Failed uploads:            {}", report.failed);
        println!("Success rate:              {:.1}%", report.success_rate());
        println!("Duration:                  {}ms", report.duration_ms);
        if report.is_success() {
            println!();
            println!("Documents should appear in Paperless-NGX shortly.");
            println!("Check the Tasks page for consumption status.");
        }
    }

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_token_shows_last_eight_chars() {
        assert_eq!(mask_token("abcdefghijkl"), "****efghijkl");
    }

    #[test]
    fn mask_token_fully_masks_short_tokens() {
        assert_eq!(mask_token("abc"), "***");
        assert_eq!(mask_token(""), "");
    }

    #[test]
    fn mask_token_counts_chars_not_bytes() {
        // Multi-byte tokens must not split a char boundary.
        assert_eq!(mask_token("€€€"), "***");
        let long = "ü".repeat(12);
        assert_eq!(mask_token(&long), format!("****{}", "ü".repeat(8)));
    }

    #[test]
    fn zero_max_is_rejected_at_parse_time() {
        let result = Cli::try_parse_from([
            "pngx-upload", "--url", "http://x", "--token", "t", "--max", "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn negative_start_is_rejected_at_parse_time() {
        let result = Cli::try_parse_from([
            "pngx-upload", "--url", "http://x", "--token", "t", "--start", "-1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn zero_batch_size_is_rejected_at_parse_time() {
        let result = Cli::try_parse_from([
            "pngx-upload", "--url", "http://x", "--token", "t", "--batch-size", "0",
        ]);
        assert!(result.is_err());
    }
}

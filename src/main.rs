//! butler - resumable, integrity-verified downloads.
//!
//! Status records are written to standard output, one JSON object per line;
//! logs go to standard error.

use anyhow::{anyhow, Result};
use butler::progress::{JsonLines, ProgressBarOpts, ProgressDisplay, StatusSink};
use butler::{Download, DownloaderBuilder, Error};
use clap::{Args, Parser, Subcommand, ValueEnum};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Resumable, integrity-verified HTTP downloads
#[derive(Parser)]
#[command(name = "butler")]
#[command(author, about, long_about = None)]
struct Cli {
    /// Log every step to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the version
    Version,
    /// Download a file, resuming any partial copy at the destination
    Dl(DlArgs),
}

#[derive(Args)]
struct DlArgs {
    /// URL to download
    url: String,

    /// Destination file, or an existing directory
    dest: PathBuf,

    /// Also check MD5 digests (reads the whole file again)
    #[arg(long)]
    thorough: bool,

    /// Maximum number of attempts
    #[arg(long, default_value_t = 3)]
    attempts: u32,

    /// Retries of transient HTTP failures within a single attempt
    #[arg(long, default_value_t = 0)]
    transport_retries: u32,

    /// Extra request header, as "Name: value"
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Status output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json, env = "BUTLER_OUTPUT")]
    output: OutputFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    /// One JSON record per line
    Json,
    /// Progress bar
    Human,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Version => {
            println!("butler version {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Dl(args) => Ok(dl(args).await),
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default = if verbose { "butler=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("BUTLER_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("could not install logger: {}", e))
}

async fn dl(args: DlArgs) -> ExitCode {
    let status: Box<dyn StatusSink> = match args.output {
        OutputFormat::Json => Box::new(JsonLines::stdout()),
        OutputFormat::Human => Box::new(ProgressDisplay::new(ProgressBarOpts::default())),
    };

    let download = match Download::new(&args.url, &args.dest) {
        Ok(download) => download,
        Err(e) => return die(status.as_ref(), e),
    };

    let headers = match parse_headers(&args.headers) {
        Ok(headers) => headers,
        Err(e) => return die(status.as_ref(), e),
    };

    let downloader = DownloaderBuilder::new()
        .attempts(args.attempts)
        .thorough(args.thorough)
        .transport_retries(args.transport_retries)
        .headers(headers)
        .build();

    match downloader.download(&download, status.as_ref()).await {
        Ok(summary) => {
            status.message(format!(
                "downloaded {} ({} bytes)",
                summary.download().destination.display(),
                summary.size()
            ));
            status.finish();
            ExitCode::SUCCESS
        }
        Err(e) => die(status.as_ref(), e),
    }
}

/// Emit a fatal error record; the caller exits right after.
fn die(status: &dyn StatusSink, error: Error) -> ExitCode {
    status.error(error.to_string());
    status.finish();
    ExitCode::FAILURE
}

fn parse_headers(raw: &[String]) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    for header in raw {
        let (name, value) = header.split_once(':').ok_or_else(|| {
            Error::InvalidHeader(format!("header \"{}\" is not of the form \"Name: value\"", header))
        })?;
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|e| Error::InvalidHeader(format!("invalid header name \"{}\": {}", name, e)))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|e| Error::InvalidHeader(format!("invalid header value for {}: {}", name, e)))?;
        headers.append(name, value);
    }
    Ok(headers)
}

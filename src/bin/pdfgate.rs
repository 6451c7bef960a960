//! CLI binary for edgequake-pdfgate.
//!
//! A thin shim over the library crate that maps flags and environment
//! variables to `GatewayConfig`, then either serves HTTP or runs a single
//! local file through the same normaliser.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use edgequake_pdfgate::{extract_local, server, AppState, GatewayConfig, InferenceClient};
use std::io::{self, Write};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
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

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve on port 3000 with the key from the environment
  DEEPSEEK_API_KEY=sk-... pdfgate

  # Serve a browser form from ./public on port 8080
  pdfgate serve --port 8080 --static-dir public

  # Analyse one local file and print the answer
  pdfgate extract bill.pdf

  # Same, printing the JSON the HTTP endpoint would return
  pdfgate extract --json bill.pdf

HTTP API:
  GET  /health     → {"status":"ok"}
  POST /process    multipart field "pdfFile" (application/pdf, ≤ 10 MiB)
                   200 {"choices":[{"message":{"content":"..."}}]}
                   400/500 {"error":"...","details":"..."}

ENVIRONMENT VARIABLES:
  DEEPSEEK_API_KEY          Bearer token for the remote API (required)
  PORT                      Listen port (default 3000)
  PDFGATE_ENDPOINT          Chat-completions URL
  PDFGATE_MODEL             Model identifier
  PDFGATE_UPLOAD_DIR        Transient upload directory (default ./uploads)
  PDFGATE_STATIC_DIR        Serve static assets from this directory
  RUST_LOG                  tracing filter, overrides -v
"#;

/// Forward uploaded PDFs to an LLM API and return its answer.
#[derive(Parser, Debug)]
#[command(
    name = "pdfgate",
    version,
    about = "Forward uploaded PDFs to an LLM API and return its answer",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,

    /// Bearer token for the remote API.
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Chat-completions endpoint URL.
    #[arg(long, env = "PDFGATE_ENDPOINT", global = true)]
    endpoint: Option<String>,

    /// Model identifier sent with every request.
    #[arg(long, env = "PDFGATE_MODEL", global = true)]
    model: Option<String>,

    /// Text file whose contents replace the built-in instruction.
    #[arg(long, env = "PDFGATE_INSTRUCTION_FILE", global = true)]
    instruction_file: Option<PathBuf>,

    /// Remote call timeout in seconds.
    #[arg(long, env = "PDFGATE_API_TIMEOUT", default_value_t = 60, global = true)]
    api_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFGATE_VERBOSE", global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP gateway (default).
    Serve,
    /// Analyse one local PDF and print the result.
    Extract {
        /// Path to a PDF file.
        input: PathBuf,

        /// Print the JSON envelope instead of the bare content.
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args, Debug)]
struct ServeArgs {
    /// Listen port.
    #[arg(long, env = "PORT", default_value_t = 3000, global = true)]
    port: u16,

    /// Listen address.
    #[arg(long, env = "PDFGATE_HOST", default_value = "0.0.0.0", global = true)]
    host: IpAddr,

    /// Directory for transient uploads; created if missing.
    #[arg(long, env = "PDFGATE_UPLOAD_DIR", default_value = "uploads", global = true)]
    upload_dir: PathBuf,

    /// Serve static assets from this directory for unmatched GET paths.
    #[arg(long, env = "PDFGATE_STATIC_DIR", global = true)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Some(Command::Extract { ref input, json }) => run_extract(&cli, input, json).await,
        Some(Command::Serve) | None => run_serve(&cli).await,
    }
}

/// Map shared flags onto the builder.
async fn build_config(cli: &Cli, serve: Option<&ServeArgs>) -> Result<GatewayConfig> {
    let mut builder = GatewayConfig::builder()
        .api_key(cli.api_key.clone().unwrap_or_default())
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref endpoint) = cli.endpoint {
        builder = builder.endpoint(endpoint);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref path) = cli.instruction_file {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read instruction file {}", path.display()))?;
        builder = builder.instruction(text.trim());
    }
    if let Some(args) = serve {
        builder = builder.upload_dir(&args.upload_dir);
        if let Some(ref dir) = args.static_dir {
            builder = builder.static_dir(dir);
        }
    }

    builder.build().context("Invalid configuration")
}

async fn run_serve(cli: &Cli) -> Result<()> {
    let args = &cli.serve;
    let config = build_config(cli, Some(args)).await?;
    tracing::debug!("{:?}", config);

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create upload directory {}",
                config.upload_dir.display()
            )
        })?;

    let state = AppState::new(config).context("Failed to build HTTP client")?;
    let addr = SocketAddr::new(args.host, args.port);
    server::serve(addr, state, shutdown_signal())
        .await
        .with_context(|| format!("Server on {addr} failed"))
}

async fn run_extract(cli: &Cli, input: &Path, json: bool) -> Result<()> {
    let config = build_config(cli, None).await?;
    let client = InferenceClient::new(&config).context("Failed to build HTTP client")?;

    match extract_local(input, &config, &client).await {
        Ok(result) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            if json {
                let body =
                    serde_json::to_string_pretty(&result).context("Failed to serialise result")?;
                writeln!(handle, "{body}").context("Failed to write to stdout")?;
            } else {
                writeln!(handle, "{}", result.content()).context("Failed to write to stdout")?;
            }
            eprintln!("{} {}", green("✔"), dim(&input.display().to_string()));
            Ok(())
        }
        Err(e) => {
            if json {
                let body = serde_json::to_string_pretty(&e.to_envelope())
                    .context("Failed to serialise error")?;
                println!("{body}");
            }
            eprintln!("{} {}: {}", red("✘"), e.summary(), e);
            if e.is_timeout() {
                eprintln!("{}", dim("  raise --api-timeout for large documents"));
            }
            std::process::exit(1);
        }
    }
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down gracefully..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down gracefully..."),
    }
}

//! Server binary for contract-risk.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalyzerConfig` / `StoreConfig`, resolves the model provider and serves
//! the HTTP API.

use anyhow::{Context, Result};
use clap::Parser;
use contract_risk::config::{StoreConfig, DEFAULT_TABLE};
use contract_risk::pipeline::analyze::resolve_provider;
use contract_risk::{
    serve, AnalyzerConfig, IngestError, IngestionPipeline, LlmBackend, RecordStore, SupabaseStore,
};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve on the default port with OpenAI
  export OPENAI_API_KEY=sk-...
  export SUPABASE_URL=https://xyz.supabase.co SUPABASE_KEY=...
  contract-risk

  # Another provider and model, larger prompt excerpt
  contract-risk --provider anthropic --model claude-sonnet-4-20250514 --prompt-budget 6000

  # Analyse a contract
  curl -F file=@msa.pdf http://127.0.0.1:8000/upload

ENVIRONMENT VARIABLES:
  SUPABASE_URL            Record store base URL (required for uploads)
  SUPABASE_KEY            Record store service key (required for uploads)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Log filter, e.g. contract_risk=debug,tower_http=debug
"#;

/// Analyse vendor contracts for risky clauses with a language model.
#[derive(Parser, Debug)]
#[command(
    name = "contract-risk",
    version,
    about = "Serve a PDF upload endpoint that flags risky vendor-contract clauses",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "CONTRACT_RISK_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to bind.
    #[arg(short, long, env = "CONTRACT_RISK_PORT", default_value_t = 8000)]
    port: u16,

    /// LLM model ID (default: gpt-4).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Total model attempts per upload.
    #[arg(long, env = "CONTRACT_RISK_MAX_ATTEMPTS", default_value_t = 3)]
    max_attempts: u32,

    /// Characters of contract text embedded in the prompt.
    #[arg(long, env = "CONTRACT_RISK_PROMPT_BUDGET", default_value_t = 3500)]
    prompt_budget: usize,

    /// Characters of contract text kept in the stored record.
    #[arg(long, env = "CONTRACT_RISK_RAW_TEXT_LIMIT", default_value_t = 5000)]
    raw_text_limit: usize,

    /// Max model output tokens.
    #[arg(long, env = "CONTRACT_RISK_MAX_TOKENS", default_value_t = 1024)]
    max_tokens: usize,

    /// Per-call model timeout in seconds.
    #[arg(long, env = "CONTRACT_RISK_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Record-store table.
    #[arg(long, env = "CONTRACT_RISK_TABLE", default_value = DEFAULT_TABLE)]
    table: String,

    /// Upload size limit in MiB.
    #[arg(long, env = "CONTRACT_RISK_MAX_UPLOAD_MB", default_value_t = 20)]
    max_upload_mb: usize,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CONTRACT_RISK_VERBOSE")]
    verbose: bool,
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

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    info!("Analyzer config: {:?}", config);

    let provider = resolve_provider(&config).context("Failed to initialise LLM provider")?;
    let backend = Arc::new(LlmBackend::new(provider, &config));

    // A missing store does not stop the server; uploads fail fast instead.
    let pipeline = match StoreConfig::from_env() {
        Ok(store_config) => {
            let store_config = store_config.with_table(&cli.table);
            info!("Record store: {:?}", store_config);
            let store: Arc<dyn RecordStore> = Arc::new(
                SupabaseStore::new(&store_config).context("Failed to build record store")?,
            );
            IngestionPipeline::new(config, backend, store)
        }
        Err(IngestError::ConfigurationMissing { missing }) => {
            warn!(
                "Record store not configured (missing {}); uploads will be rejected",
                missing.join(", ")
            );
            IngestionPipeline::with_missing_store(config, backend, missing)
        }
        Err(e) => return Err(e).context("Failed to read record store settings"),
    };

    // ── Serve ────────────────────────────────────────────────────────────
    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", cli.host, cli.port))?;

    serve(addr, Arc::new(pipeline), cli.max_upload_mb * 1024 * 1024)
        .await
        .context("Server error")?;

    Ok(())
}

/// Map CLI arguments to `AnalyzerConfig`.
fn build_config(cli: &Cli) -> Result<AnalyzerConfig> {
    let mut builder = AnalyzerConfig::builder()
        .max_attempts(cli.max_attempts)
        .prompt_budget(cli.prompt_budget)
        .raw_text_limit(cli.raw_text_limit)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }

    builder.build().context("Invalid configuration")
}

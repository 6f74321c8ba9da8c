//! Emissions assistant: interactive console for natural-language
//! questions about industry emissions data.

use std::io::Write as _;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use ea_assistant::assistant::Assistant;
use ea_assistant::config::AssistantConfig;
use ea_assistant::inference::OllamaClient;
use ea_assistant::pipeline::Pipeline;
use ea_assistant::registry::OperationRegistry;
use ea_assistant::session::ChatSession;
use ea_data_tools::{EmissionTable, SvgTrendRenderer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never interleave with replies.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "ea-assistant starting");

    // ── Load config ─────────────────────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "emissions.toml".to_string());

    let config = AssistantConfig::from_file(&config_path)
        .with_context(|| format!("loading config from {config_path}"))?;

    // ── Load data ───────────────────────────────────────────────
    let table = EmissionTable::from_path(&config.data_path)
        .with_context(|| format!("loading emissions data from {}", config.data_path.display()))?;
    tracing::info!(
        path = %config.data_path.display(),
        rows = table.len(),
        industries = table.industries().len(),
        "emissions table loaded"
    );

    // ── Pipeline ────────────────────────────────────────────────
    let registry = OperationRegistry::with_defaults();
    tracing::info!(operation_count = registry.len(), "operation registry initialized");

    let renderer = SvgTrendRenderer::new(&config.plot_dir);
    tracing::info!(
        host = %config.ollama.host,
        model = %config.ollama.model,
        "using ollama backend"
    );
    let client = OllamaClient::new(config.ollama.clone());

    let pipeline = Pipeline::new(&registry, &table, &renderer, &client);
    let assistant = Assistant::new(pipeline, config.narrative.clone());

    // ── REPL ────────────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session = ChatSession::new();

    println!("Ask about industry emissions (type 'exit' to quit).");
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received");
                break;
            }
        };
        let Some(line) = line else { break };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case("exit") || query.eq_ignore_ascii_case("quit") {
            break;
        }

        let (next, _) = assistant
            .respond(session, query, &mut |fragment: &str| {
                print!("{fragment}");
                let _ = std::io::stdout().flush();
            })
            .await;
        session = next;
        println!();
    }

    tracing::info!(turns = session.len(), "ea-assistant stopped");
    Ok(())
}

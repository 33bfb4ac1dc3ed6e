//! Draft Assistant Binary
//!
//! Builds the template index once at startup and runs tool calls against it.
//! Tool output is JSON on stdout; logs go to stderr.

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use draft_assistant::batch::run_batch;
use draft_assistant::{call_tool, get_tool_definitions, DraftAssistant};
use template_core::config::EmbeddingProvider;
use template_core::{Metric, RetrievalConfig};

#[derive(Parser, Debug)]
#[command(name = "draft-assistant")]
#[command(version, about = "Semantic email template retrieval for draft composition")]
struct Args {
    /// JSON template catalog (overrides TEMPLATE_CATALOG)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Embedding provider: hash or candle (overrides EMBEDDING_PROVIDER)
    #[arg(long, global = true)]
    provider: Option<EmbeddingProvider>,

    /// Distance metric: cosine or l2 (overrides SEARCH_METRIC)
    #[arg(long, global = true)]
    metric: Option<Metric>,

    /// Minimum best-match similarity (overrides MATCH_THRESHOLD)
    #[arg(long, global = true)]
    threshold: Option<f32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Top-k templates for a request
    Search {
        query: String,
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Single best template
    Best { query: String },
    /// Distinct template categories
    Categories,
    /// Templates in one category
    Category { name: String },
    /// Draft request for the best template; values as name=value
    Draft {
        query: String,
        #[arg(short = 'v', long = "var")]
        vars: Vec<String>,
    },
    /// Print tool definitions
    Tools,
    /// Invoke a tool with JSON arguments
    Call {
        tool: String,
        #[arg(default_value = "{}")]
        arguments: String,
    },
    /// Search every line of stdin concurrently
    Batch {
        #[arg(short, long)]
        k: Option<usize>,
    },
}

fn load_config(args: &Args) -> anyhow::Result<RetrievalConfig> {
    let mut config = RetrievalConfig::from_env().context("invalid environment configuration")?;
    if let Some(path) = &args.catalog {
        config.catalog_path = Some(path.clone());
    }
    if let Some(provider) = args.provider {
        config.provider = provider;
    }
    if let Some(metric) = args.metric {
        config.metric = metric;
    }
    if args.threshold.is_some() {
        config.match_threshold = args.threshold;
    }
    Ok(config)
}

fn parse_vars(vars: &[String]) -> anyhow::Result<serde_json::Map<String, Value>> {
    vars.iter()
        .map(|pair| {
            let (name, value) = pair
                .split_once('=')
                .with_context(|| format!("expected name=value, got '{}'", pair))?;
            Ok((name.trim().to_string(), Value::String(value.to_string())))
        })
        .collect()
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_command(assistant: &DraftAssistant, command: Command) -> anyhow::Result<Value> {
    let output = match command {
        Command::Search { query, k } => call_tool(
            assistant,
            "vector_search_email",
            json!({ "query": query, "k": k }),
        ),
        Command::Best { query } => call_tool(assistant, "best_template", json!({ "query": query })),
        Command::Categories => call_tool(assistant, "list_template_categories", json!({})),
        Command::Category { name } => call_tool(
            assistant,
            "get_template_by_category",
            json!({ "category": name }),
        ),
        Command::Draft { query, vars } => call_tool(
            assistant,
            "generate_email_content",
            json!({ "query": query, "variables": parse_vars(&vars)? }),
        ),
        Command::Tools => serde_json::to_value(get_tool_definitions())?,
        Command::Call { tool, arguments } => {
            let arguments: Value =
                serde_json::from_str(&arguments).context("tool arguments must be JSON")?;
            call_tool(assistant, &tool, arguments)
        }
        Command::Batch { k } => {
            let queries: Vec<String> = std::io::stdin()
                .lock()
                .lines()
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .filter(|line| !line.trim().is_empty())
                .collect();
            let k = k.unwrap_or_else(|| assistant.default_k());
            serde_json::to_value(run_batch(assistant, queries, k).await)?
        }
    };
    Ok(output)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout carries tool output only
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(&args)?;
    let output = match args.command {
        Command::Tools => serde_json::to_value(get_tool_definitions())?,
        command => {
            let assistant =
                DraftAssistant::from_config(&config).context("failed to build template index")?;
            tracing::info!(
                "Starting {} v{} with {} templates",
                assistant.name(),
                assistant.version(),
                assistant.service().len()
            );
            run_command(&assistant, command).await?
        }
    };

    print_json(&output)
}

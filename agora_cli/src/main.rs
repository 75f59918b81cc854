use clap::Parser;
use owo_colors::{OwoColorize, Stream, Style};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};
use commands::*;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        owo_colors::set_override(false);
    }

    // Logs go to stderr so structured output on stdout stays parseable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_log_filter(cli.verbose).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(&cli).await {
        eprintln!(
            "{}: {}",
            "Error".if_supports_color(Stream::Stderr, |t| t.style(Style::new().red().bold())),
            e
        );
        process::exit(1);
    }
}

async fn run(cli: &Cli) -> commands::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let registry = agora_core::build_default_registry(&config)?;

    let result = match &cli.command {
        Commands::Search {
            query,
            domain,
            sources,
            limit,
            context,
        } => {
            let limit = limit.unwrap_or(config.search.default_limit);
            search::run(
                cli,
                &registry,
                query,
                domain.as_deref(),
                sources.as_deref(),
                limit,
                *context,
            )
            .await
        }
        Commands::Get { source, id, domain } => {
            get::run(cli, &registry, source, id, domain.as_deref()).await
        }
        Commands::Domains => domains::run(cli, &registry),
        Commands::Health => health::run(cli, &registry).await,
        Commands::Resources { query } => resources::run(cli, &registry, query.as_deref()).await,
    };

    registry.cleanup_all().await;
    result
}

fn default_log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "agora_cli=info,agora_core=warn",
        1 => "agora_cli=info,agora_core=info",
        _ => "agora_cli=debug,agora_core=debug",
    }
}

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "agora")]
#[command(about = "Agora - domain-scoped search across many providers")]
#[command(version)]
#[command(after_help = "\x1b[1;36mQuick Start:\x1b[0m
  agora domains                           List domains and their providers
  agora search \"attention\" -d research    Search within the research domain
  agora search \"rust\" -s wikipedia,arxiv  Search named providers only
  agora get arxiv 1706.03762              Fetch one record
  agora health                            Provider and domain health

\x1b[1;36mMore Info:\x1b[0m
  agora <command> --help                  Get help for any command")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,

    /// Configuration file (YAML, or TOML with a .toml extension)
    #[arg(long, global = true, env = "AGORA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search across providers, optionally within one domain
    ///
    /// Without --domain every registered provider is queried.
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  agora search \"transformers\"
  agora search \"market share\" --domain strategic
  agora search \"attention\" -d research --context
  agora search \"rust\" -s wikipedia --limit 3")]
    Search {
        /// The search query
        query: String,
        /// Domain to search in (e.g. research, strategic, general)
        #[arg(short, long)]
        domain: Option<String>,
        /// Comma-separated list of providers to restrict the search to
        #[arg(short, long, conflicts_with = "context")]
        sources: Option<String>,
        /// Maximum number of results per source
        #[arg(short, long)]
        limit: Option<usize>,
        /// Print a packed context block instead of the result list
        #[arg(long)]
        context: bool,
    },

    /// Get one record by provider and id
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  agora get wikipedia \"Rust (programming language)\"
  agora get arxiv 1706.03762
  agora get business_db market-share --domain strategic")]
    Get {
        /// Registered provider name
        source: String,
        /// Provider-specific resource id
        id: String,
        /// Domain whose providers to use
        #[arg(short, long)]
        domain: Option<String>,
    },

    /// List domains with their security level and bound providers
    #[command(alias = "ls")]
    Domains,

    /// Show health of every provider, globally and per domain
    Health,

    /// List resources advertised by each provider
    Resources {
        /// Optional filter handed to the providers
        query: Option<String>,
    },
}

#[derive(Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Pretty,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Plain text output
    Text,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_flags() {
        let cli = Cli::try_parse_from([
            "agora", "search", "attention", "-d", "research", "-s", "arxiv", "--limit", "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Search {
                query,
                domain,
                sources,
                limit,
                context,
            } => {
                assert_eq!(query, "attention");
                assert_eq!(domain.as_deref(), Some("research"));
                assert_eq!(sources.as_deref(), Some("arxiv"));
                assert_eq!(limit, Some(3));
                assert!(!context);
            }
            _ => panic!("expected search"),
        }
        assert_eq!(cli.output, OutputFormat::Pretty);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["agora", "health", "--output", "json", "-vv", "--no-color"])
            .unwrap();
        assert!(matches!(cli.command, Commands::Health));
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.verbose, 2);
        assert!(cli.no_color);
    }

    #[test]
    fn test_context_rejects_sources() {
        let err = Cli::try_parse_from(["agora", "search", "q", "--context", "-s", "arxiv"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);

        let cli = Cli::try_parse_from(["agora", "search", "q", "--context", "-d", "research"]);
        assert!(cli.is_ok());
    }

    #[test]
    fn test_get_requires_id() {
        assert!(Cli::try_parse_from(["agora", "get", "arxiv"]).is_err());
    }
}

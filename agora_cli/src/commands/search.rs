use crate::cli::Cli;
use crate::commands::{parse_sources, spinner, Result};
use crate::output::{format_output, OutputData};
use agora_core::domains::config::GENERAL;
use agora_core::DomainRegistry;

/// Run a search, globally or within one domain.
///
/// `--context` packs the ranked results with the domain's context rules;
/// it uses the `general` domain when none is named. clap rejects
/// `--sources` together with `--context`.
pub async fn run(
    cli: &Cli,
    registry: &DomainRegistry,
    query: &str,
    domain: Option<&str>,
    sources: Option<&str>,
    limit: usize,
    context: bool,
) -> Result<()> {
    let progress = spinner(match domain {
        Some(domain) => format!("Searching {} for '{}'...", domain, query),
        None => format!("Searching all providers for '{}'...", query),
    });

    let data = if context {
        let domain = domain.unwrap_or(GENERAL);
        let context = registry.search_domain_context(domain, query, limit).await;
        OutputData::Context {
            query: query.to_string(),
            domain: domain.to_string(),
            context,
        }
    } else {
        let sources = sources.map(parse_sources);
        let results = match domain {
            Some(domain) => {
                registry
                    .search_domain(domain, query, limit, sources.as_deref())
                    .await
            }
            None => {
                registry
                    .global()
                    .search_all(query, limit, sources.as_deref())
                    .await
            }
        };
        tracing::info!(query = %query, results = results.len(), "Search finished");
        OutputData::SearchResults {
            query: query.to_string(),
            domain: domain.map(str::to_string),
            results,
        }
    };
    progress.finish_and_clear();

    format_output(&data, &cli.output)
}

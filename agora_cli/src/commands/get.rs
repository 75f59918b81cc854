use crate::cli::Cli;
use crate::commands::{spinner, CommandError, Result};
use crate::output::{format_output, OutputData};
use agora_core::DomainRegistry;

pub async fn run(
    cli: &Cli,
    registry: &DomainRegistry,
    source: &str,
    id: &str,
    domain: Option<&str>,
) -> Result<()> {
    let progress = spinner(format!("Fetching {} from {}...", id, source));
    let record = match domain {
        Some(domain) => registry.get_content_domain(domain, source, id).await,
        None => registry.global().get_content(source, id).await,
    };
    progress.finish_and_clear();

    let record = record.ok_or_else(|| CommandError::NotFound(source.to_string(), id.to_string()))?;
    format_output(
        &OutputData::Record {
            source: source.to_string(),
            id: id.to_string(),
            record,
        },
        &cli.output,
    )
}

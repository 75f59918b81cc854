use crate::cli::Cli;
use crate::commands::{spinner, Result};
use crate::output::{format_output, OutputData};
use agora_core::DomainRegistry;

pub async fn run(cli: &Cli, registry: &DomainRegistry, query: Option<&str>) -> Result<()> {
    let progress = spinner("Listing resources...".to_string());
    let listings = registry.global().list_all_resources(query).await;
    progress.finish_and_clear();

    format_output(&OutputData::Resources(listings), &cli.output)
}

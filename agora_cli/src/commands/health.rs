use crate::cli::Cli;
use crate::commands::{spinner, Result};
use crate::output::{format_output, OutputData};
use agora_core::DomainRegistry;

/// Initialize every provider, then report health. Health checks do not
/// initialize providers themselves.
pub async fn run(cli: &Cli, registry: &DomainRegistry) -> Result<()> {
    let progress = spinner("Checking providers...".to_string());
    registry.initialize_all().await;
    let health = registry.health_check_all().await;
    progress.finish_and_clear();

    format_output(&OutputData::Health(health), &cli.output)
}

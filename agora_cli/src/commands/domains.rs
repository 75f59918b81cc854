use crate::cli::Cli;
use crate::commands::Result;
use crate::output::{format_output, OutputData};
use agora_core::DomainRegistry;

pub fn run(cli: &Cli, registry: &DomainRegistry) -> Result<()> {
    format_output(&OutputData::Domains(registry.domain_summaries()), &cli.output)
}

use crate::cli::OutputFormat;
use crate::commands::Result;
use agora_core::domains::{DomainSummary, RegistryHealth};
use agora_core::{CanonicalResult, RawRecord, ResourceDescriptor, SynthesisContext};
use serde::Serialize;
use std::collections::BTreeMap;

mod pretty;
pub use pretty::format_pretty;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OutputData {
    SearchResults {
        query: String,
        domain: Option<String>,
        results: Vec<CanonicalResult>,
    },
    Context {
        query: String,
        domain: String,
        context: SynthesisContext,
    },
    Record {
        source: String,
        id: String,
        record: RawRecord,
    },
    Domains(Vec<DomainSummary>),
    Health(RegistryHealth),
    Resources(BTreeMap<String, Vec<ResourceDescriptor>>),
}

pub fn format_output(data: &OutputData, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(data)?);
        }
        OutputFormat::Text => {
            print!("{}", format_text(data)?);
        }
        OutputFormat::Pretty => {
            print!("{}", format_pretty(data));
        }
    }
    Ok(())
}

fn format_text(data: &OutputData) -> Result<String> {
    let mut out = String::new();
    match data {
        OutputData::SearchResults { results, .. } => {
            for result in results {
                out.push_str(&format!(
                    "[{:.2}] {} ({})\n",
                    result.relevance_score, result.title, result.source
                ));
                if let Some(url) = &result.url {
                    out.push_str(&format!("       {}\n", url));
                }
            }
        }
        OutputData::Context { context, .. } => {
            out.push_str(&context.text);
            out.push('\n');
        }
        OutputData::Record { record, .. } => {
            out.push_str(&serde_json::to_string_pretty(record)?);
            out.push('\n');
        }
        OutputData::Domains(domains) => {
            for summary in domains {
                let providers: Vec<&str> = summary
                    .providers
                    .iter()
                    .map(|b| b.provider_name.as_str())
                    .collect();
                out.push_str(&format!(
                    "{}: {} [{}] {}\n",
                    summary.domain,
                    summary.description,
                    summary.security_level,
                    providers.join(",")
                ));
            }
        }
        OutputData::Health(health) => {
            out.push_str(&format!(
                "global: {}\n",
                health.global_manager.manager_status
            ));
            for (name, status) in &health.global_manager.providers {
                out.push_str(&format!("  {}: {}\n", name, status.status));
            }
            out.push_str(&serde_json::to_string_pretty(&health.domains)?);
            out.push('\n');
        }
        OutputData::Resources(listings) => {
            for (provider, resources) in listings {
                for resource in resources {
                    out.push_str(&format!("{}\t{}\t{}\n", provider, resource.uri, resource.name));
                }
            }
        }
    }
    Ok(out)
}

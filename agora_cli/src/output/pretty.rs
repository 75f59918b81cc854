//! Pretty formatter for terminal output.
//!
//! Search results render as numbered cards; listings render as tables.

use super::OutputData;
use agora_core::domains::{DomainHealth, DomainSummary, RegistryHealth};
use agora_core::{CanonicalResult, HealthState, ManagerHealth, RawRecord, ResourceDescriptor};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};
use owo_colors::{OwoColorize, Stream, Style};
use serde_json::Value;
use std::collections::BTreeMap;

/// Terminal width for formatting (default fallback)
const DEFAULT_WIDTH: usize = 80;

/// Indent for card content (after number)
const CARD_INDENT: usize = 6;

/// Longest snippet shown on a card
const SNIPPET_CHARS: usize = 240;

pub fn format_pretty(data: &OutputData) -> String {
    let width = terminal_width();
    match data {
        OutputData::SearchResults {
            query,
            domain,
            results,
        } => {
            let label = match domain {
                Some(domain) => format!("'{}' in {}", query, domain),
                None => format!("'{}'", query),
            };
            format_results(&label, results, width)
        }
        OutputData::Context {
            query,
            domain,
            context,
        } => {
            let label = format!("Context for '{}' in {}", query, domain);
            let mut out = format_section_header(&label, Some(context.included), width);
            out.push_str("\n\n");
            out.push_str(&context.text);
            out.push('\n');
            if context.truncated {
                out.push('\n');
                out.push_str(&paint(
                    "Some results did not fit the context budget.",
                    Style::new().yellow(),
                ));
                out.push('\n');
            }
            out
        }
        OutputData::Record { source, id, record } => format_record(source, id, record, width),
        OutputData::Domains(domains) => format_domains(domains),
        OutputData::Health(health) => format_health(health, width),
        OutputData::Resources(listings) => format_resources(listings),
    }
}

// ============================================================================
// Cards
// ============================================================================

fn format_results(label: &str, results: &[CanonicalResult], width: usize) -> String {
    let mut out = format_section_header(label, Some(results.len()), width);
    out.push('\n');

    if results.is_empty() {
        out.push_str(&format!("\n   {}\n", paint("No results", Style::new().dimmed())));
        return out;
    }

    for (i, result) in results.iter().enumerate() {
        out.push('\n');
        out.push_str(&format_card(result, i + 1, width));
    }
    out
}

fn format_card(result: &CanonicalResult, index: usize, width: usize) -> String {
    let indent = " ".repeat(CARD_INDENT);
    let content_width = width.saturating_sub(CARD_INDENT + 2).max(20);
    let mut out = format!(
        " {:>3}. {}\n",
        paint(&index.to_string(), Style::new().cyan().bold()),
        paint(&truncate_str(&result.title, content_width), Style::new().bold())
    );

    if let Some(url) = &result.url {
        out.push_str(&format!(
            "{}{}\n",
            indent,
            paint(&format_hyperlink(url, url), Style::new().blue().underline())
        ));
    }

    let snippet = clean_snippet(&result.content);
    if !snippet.is_empty() {
        out.push_str(&format!(
            "{}{}\n",
            indent,
            truncate_str(&snippet, SNIPPET_CHARS.min(content_width * 2))
        ));
    }

    out.push_str(&format!(
        "{}{}\n",
        indent,
        paint(
            &format!("{} · relevance {:.2}", result.source, result.relevance_score),
            Style::new().dimmed()
        )
    ));
    out
}

fn format_record(source: &str, id: &str, record: &RawRecord, width: usize) -> String {
    let mut out = format_section_header(&format!("{} / {}", source, id), None, width);
    out.push_str("\n\n");

    let key_width = record.keys().map(|k| k.len()).max().unwrap_or(0);
    for (key, value) in record {
        let rendered = match value {
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(format_cell_value)
                .collect::<Vec<_>>()
                .join(", "),
            other => format_cell_value(other),
        };
        out.push_str(&format!(
            "  {:<width$}  {}\n",
            paint(key, Style::new().cyan()),
            rendered,
            width = key_width
        ));
    }
    out
}

// ============================================================================
// Tables
// ============================================================================

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(paint(h, Style::new().cyan().bold())))
            .collect::<Vec<_>>(),
    );
    table
}

fn format_domains(domains: &[DomainSummary]) -> String {
    let mut table = new_table(&["domain", "security", "providers", "description"]);
    for summary in domains {
        let providers = summary
            .providers
            .iter()
            .map(|b| format!("{} ({})", b.provider_name, b.priority))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(paint(&summary.domain, Style::new().bold())),
            Cell::new(summary.security_level.to_string()),
            Cell::new(if providers.is_empty() {
                paint("none", Style::new().dimmed())
            } else {
                providers
            }),
            Cell::new(&summary.description),
        ]);
    }
    format!("{}\n", table)
}

fn format_health(health: &RegistryHealth, width: usize) -> String {
    let mut out = format_manager_health("global", &health.global_manager, width);
    for (domain, status) in &health.domains {
        out.push('\n');
        match status {
            DomainHealth::Manager(manager) => {
                out.push_str(&format_manager_health(domain, manager, width));
            }
            DomainHealth::NotFound { error, .. } => {
                out.push_str(&format_section_header(domain, None, width));
                out.push_str(&format!("\n   {}\n", paint(error, Style::new().red())));
            }
        }
    }
    out
}

fn format_manager_health(label: &str, health: &ManagerHealth, width: usize) -> String {
    let mut out = format_section_header(
        &format!("{} [{}]", label, health.manager_status),
        None,
        width,
    );
    out.push('\n');
    if health.providers.is_empty() {
        out.push_str(&format!("   {}\n", paint("no providers", Style::new().dimmed())));
        return out;
    }

    let mut table = new_table(&["provider", "status", "checked", "detail"]);
    for (name, status) in &health.providers {
        let detail = status.error.as_deref().unwrap_or(&status.description);
        table.add_row(vec![
            Cell::new(name),
            Cell::new(paint(&status.status.to_string(), state_style(status.status))),
            Cell::new(status.timestamp.format("%H:%M:%S").to_string()),
            Cell::new(truncate_str(detail, 60)),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

fn format_resources(listings: &BTreeMap<String, Vec<ResourceDescriptor>>) -> String {
    let mut table = new_table(&["provider", "uri", "name", "type"]);
    for (provider, resources) in listings {
        for resource in resources {
            table.add_row(vec![
                Cell::new(provider),
                Cell::new(&resource.uri),
                Cell::new(&resource.name),
                Cell::new(&resource.mime_type),
            ]);
        }
    }
    format!("{}\n", table)
}

// ============================================================================
// Helpers
// ============================================================================

/// Apply `style` when stdout supports color and `--no-color` was not given.
fn paint(text: &str, style: Style) -> String {
    text.if_supports_color(Stream::Stdout, |t| t.style(style))
        .to_string()
}

fn state_style(state: HealthState) -> Style {
    match state {
        HealthState::Healthy => Style::new().green(),
        HealthState::NotInitialized => Style::new().yellow(),
        HealthState::Error => Style::new().red().bold(),
    }
}

fn format_section_header(label: &str, count: Option<usize>, width: usize) -> String {
    let count_str = match count {
        Some(n) => format!(" ({} results)", n),
        None => String::new(),
    };

    let header_text = format!("{}{}", label, count_str);
    let line_len = (width.saturating_sub(header_text.chars().count() + 4)).min(60);
    let line = "─".repeat(line_len);

    format!(
        "{} {} {}",
        paint("──", Style::new().cyan()),
        paint(&header_text, Style::new().green().bold()),
        paint(&line, Style::new().cyan())
    )
}

fn format_cell_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => truncate_str(s, 80),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(_) => "{...}".to_string(),
    }
}

fn truncate_str(s: &str, max_len: usize) -> String {
    // Take first line only
    let first_line = s.lines().next().unwrap_or(s);

    if first_line.chars().count() <= max_len {
        first_line.to_string()
    } else {
        let truncated: String = first_line.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn clean_snippet(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(DEFAULT_WIDTH)
}

/// Format a URL as a clickable hyperlink using OSC 8 escape sequences.
fn format_hyperlink(url: &str, display_text: &str) -> String {
    format!("\x1b]8;;{}\x07{}\x1b]8;;\x07", url, display_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::SynthesisContext;

    fn result(title: &str, content: &str) -> CanonicalResult {
        CanonicalResult {
            source: "wikipedia".to_string(),
            title: title.to_string(),
            content: content.to_string(),
            url: None,
            relevance_score: 0.75,
            metadata: RawRecord::new(),
        }
    }

    #[test]
    fn test_format_card() {
        let card = format_card(&result("Rust", "A  systems\nlanguage"), 1, 80);
        assert!(card.contains("Rust"));
        assert!(card.contains("A systems language"));
        assert!(card.contains("relevance 0.75"));
    }

    #[test]
    fn test_empty_results_message() {
        let out = format_pretty(&OutputData::SearchResults {
            query: "nothing".to_string(),
            domain: Some("strategic".to_string()),
            results: Vec::new(),
        });
        assert!(out.contains("'nothing' in strategic"));
        assert!(out.contains("No results"));
    }

    #[test]
    fn test_context_truncation_notice() {
        let out = format_pretty(&OutputData::Context {
            query: "q".to_string(),
            domain: "research".to_string(),
            context: SynthesisContext {
                text: "Source: a".to_string(),
                included: 1,
                truncated: true,
            },
        });
        assert!(out.contains("Source: a"));
        assert!(out.contains("did not fit"));
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("abcdefghij", 6), "abc...");
        assert_eq!(truncate_str("first\nsecond", 20), "first");
    }
}

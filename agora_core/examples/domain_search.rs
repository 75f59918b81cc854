use agora_core::{build_default_registry, AgoraConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AgoraConfig::from_yaml_str(
        r#"
search:
  timeout_ms: 5000
domains:
  legal:
    description: Legal research
    allowed_sources: [wikipedia]
    security_level: restricted
"#,
    )?;
    let registry = build_default_registry(&config)?;

    println!("Domains:");
    for summary in registry.domain_summaries() {
        println!(
            "  - {} [{}]: {:?}",
            summary.domain,
            summary.security_level,
            registry.domain_sources(&summary.domain)
        );
    }

    let results = registry
        .search_domain("strategic", "market share", 5, None)
        .await;
    println!("\nStrategic results:");
    for r in &results {
        println!("  {:.2} [{}] {}", r.relevance_score, r.source, r.title);
    }

    let context = registry
        .search_domain_context("research", "attention mechanisms", 3)
        .await;
    println!(
        "\nResearch context ({} results, truncated: {}):\n{}",
        context.included, context.truncated, context.text
    );

    let health = registry.health_check_all().await;
    println!("\nHealth:\n{}", serde_json::to_string_pretty(&health)?);

    registry.cleanup_all().await;
    Ok(())
}

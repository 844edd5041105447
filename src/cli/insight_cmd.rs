//! `sentra insight`: fetch a privacy insight for a domain from the backend.

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::events::SentraEvent;
use anyhow::{bail, Result};
use std::sync::Arc;
use std::time::Duration;

pub async fn run(
    domain: &str,
    links: &[String],
    config: EngineConfig,
    json: bool,
) -> Result<()> {
    // Generous upper bound: every poll attempt plus the summary round trip.
    let deadline = Duration::from_millis(
        config.poll_interval_ms * u64::from(config.max_poll_attempts)
            + config.request_timeout_ms * 2,
    );

    let engine = Arc::new(Engine::new(config)?);
    engine.start_dispatcher();
    let mut rx = engine.events().subscribe();

    let request = serde_json::json!({
        "id": "cli",
        "method": "request_insight",
        "params": { "tab": 0, "domain": domain, "links": links },
    });
    let response = engine.handle_request(&request.to_string());
    tracing::debug!("request_insight ack: {}", response.trim());

    let insight = tokio::time::timeout(deadline, async {
        loop {
            match rx.recv().await {
                Ok(SentraEvent::InsightReady { insight, .. }) => break Ok(insight),
                Ok(_) => continue,
                Err(e) => break Err(anyhow::anyhow!("event stream closed: {e}")),
            }
        }
    })
    .await;

    let insight = match insight {
        Ok(result) => result?,
        Err(_) => bail!("timed out waiting for the analysis backend"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&insight)?);
        return Ok(());
    }

    println!("{} — risk: {:?}", insight.domain, insight.risk_level);
    println!("{}", insight.summary);
    if !insight.key_concerns.is_empty() {
        println!("\nKey concerns:");
        for item in &insight.key_concerns {
            println!("  • {} — {}", item.title, item.details);
        }
    }
    if !insight.collected_data.is_empty() {
        println!("\nLikely collected:");
        for item in &insight.collected_data {
            println!("  • {}: {}", item.title, item.details);
        }
    }
    if !insight.recommendations.is_empty() {
        println!("\nRecommendations:");
        for rec in &insight.recommendations {
            println!("  • {rec}");
        }
    }
    println!("\nRetention: {}", insight.retention);
    Ok(())
}

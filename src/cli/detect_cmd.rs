//! `sentra detect`: evaluate signup intent for a page snapshot.

use crate::cli::load_page;
use crate::config::EngineConfig;
use crate::detect::intent::{self, PageEvent};
use anyhow::Result;

pub async fn run(
    source: &str,
    page_url: Option<&str>,
    focus: Option<&str>,
    click: Option<&str>,
    config: &EngineConfig,
    json: bool,
) -> Result<()> {
    let page = load_page(source, page_url).await?;

    let event = match (click, focus) {
        (Some(target), _) => PageEvent::Click {
            target: target.to_string(),
        },
        (None, Some(target)) => PageEvent::FocusIn {
            target: target.to_string(),
        },
        (None, None) => PageEvent::RouteChange,
    };

    let outcome =
        intent::evaluate_with_threshold(&page, &event, false, config.confidence_threshold);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "detected": outcome.detected,
                "surface": outcome.surface,
                "confidence": outcome.confidence,
                "signals": outcome.signals.fired(),
                "auth_click": outcome.auth_click,
            }))?
        );
        return Ok(());
    }

    println!(
        "intent: {}  surface: {}  confidence: {:.1}",
        outcome.detected, outcome.surface, outcome.confidence
    );
    if outcome.detected {
        println!("signals: {}", outcome.signals.fired().join(", "));
    }
    Ok(())
}

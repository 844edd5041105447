//! `sentra cached`: look up finished analyses for a set of domains.

use crate::backend::client::AnalysisClient;
use crate::config::EngineConfig;
use crate::overlay::insight::PrivacyInsight;
use anyhow::Result;

pub async fn run(domains: &[String], config: &EngineConfig, json: bool) -> Result<()> {
    let client = AnalysisClient::new(&config.backend_base_url, config.request_timeout_ms);
    let cached = client.cached(domains).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&cached)?);
        return Ok(());
    }

    if cached.matched.is_empty() {
        println!("No cached analyses for the requested domains.");
        return Ok(());
    }
    for (domain, analysis) in &cached.matched {
        let insight = PrivacyInsight::from_analysis(domain, analysis);
        println!("{} — risk: {:?}", domain, insight.risk_level);
        println!("  {}", insight.summary);
    }
    Ok(())
}

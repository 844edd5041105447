// Copyright 2026 Sentra Contributors
// SPDX-License-Identifier: Apache-2.0

//! Typed HTTP client for the analysis backend.
//!
//! Three endpoints: `/process` (kick off / poll an analysis of candidate
//! policy URLs; answers 202 while the extraction job is still running),
//! `/overlay_summary/top_risks` (precomputed top-risk summary for a domain)
//! and `/cached` (batch lookup of finished analyses). Just HTTP; retry and
//! backoff policy belongs to the orchestrator.

use crate::backend::BackendError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// One `/process` attempt, as the orchestrator sees it.
#[derive(Debug)]
pub enum ProcessStatus {
    /// 202: the analysis job is still running; poll again later.
    Pending,
    /// 200: full raw analysis body.
    Ready(Value),
}

/// One attribute in a top-risks summary.
///
/// `explanation` is the human-readable rationale and is what insight items
/// render; `evidence` is the quoted policy language and is carried for the
/// dashboard only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAttribute {
    pub title: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub evidence: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub sensitivity_level: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetentionPolicy {
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Mitigation {
    pub mitigation: String,
}

/// Top-risks summary, either fetched from `/overlay_summary/top_risks` or
/// embedded in a `/process` body under `overlay_summary`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TopRisksSummary {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub top_high_risk_attributes: Vec<RiskAttribute>,
    #[serde(default)]
    pub data_retention_policy: Option<RetentionPolicy>,
    #[serde(default)]
    pub mitigations: Vec<Mitigation>,
    #[serde(default)]
    pub has_cached_analysis: bool,
}

impl TopRisksSummary {
    /// At least one high-risk attribute, the bar for skipping the separate
    /// top-risks round trip.
    pub fn has_high_risk(&self) -> bool {
        !self.top_high_risk_attributes.is_empty()
    }
}

/// `/cached` response: domain → finished raw analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CachedAnalyses {
    #[serde(default)]
    pub matched: HashMap<String, Value>,
}

/// Analysis backend client.
#[derive(Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    base_url: String,
}

impl AnalysisClient {
    pub fn new(base_url: &str, timeout_ms: u64) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Kick off or poll an analysis over candidate policy URLs, passed as
    /// repeated `url=` query parameters.
    pub async fn process(&self, urls: &[String]) -> Result<ProcessStatus, BackendError> {
        let query: Vec<(&str, &str)> = urls.iter().map(|u| ("url", u.as_str())).collect();
        let resp = self
            .http
            .get(format!("{}/process", self.base_url))
            .query(&query)
            .send()
            .await?;

        match resp.status().as_u16() {
            202 => Ok(ProcessStatus::Pending),
            200 => {
                let body: Value = resp.json().await?;
                Ok(ProcessStatus::Ready(body))
            }
            status => Err(BackendError::Status(status)),
        }
    }

    /// Fetch the precomputed top-risks summary for a domain.
    pub async fn top_risks(&self, domain: &str) -> Result<TopRisksSummary, BackendError> {
        let resp = self
            .http
            .get(format!("{}/overlay_summary/top_risks", self.base_url))
            .query(&[("domain", domain)])
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            return Err(BackendError::Status(status));
        }
        Ok(resp.json().await?)
    }

    /// Batch lookup of finished analyses for a set of domains.
    pub async fn cached(&self, domains: &[String]) -> Result<CachedAnalyses, BackendError> {
        let query: Vec<(&str, &str)> = domains.iter().map(|d| ("domain", d.as_str())).collect();
        let resp = self
            .http
            .get(format!("{}/cached", self.base_url))
            .query(&query)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            return Err(BackendError::Status(status));
        }
        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_parse_with_missing_fields() {
        let raw = r#"{
            "domain": "example.com",
            "top_high_risk_attributes": [
                {"title": "Fingerprint", "explanation": "Device fingerprinting", "color": "red", "sensitivity_level": 13}
            ]
        }"#;
        let summary: TopRisksSummary = serde_json::from_str(raw).unwrap();
        assert!(summary.has_high_risk());
        assert_eq!(summary.top_high_risk_attributes[0].evidence, "");
        assert!(summary.data_retention_policy.is_none());
        assert!(summary.mitigations.is_empty());
    }

    #[test]
    fn test_empty_summary_has_no_high_risk() {
        let summary = TopRisksSummary::default();
        assert!(!summary.has_high_risk());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = AnalysisClient::new("http://localhost:8000/api/", 1000);
        assert_eq!(client.base_url, "http://localhost:8000/api");
    }
}

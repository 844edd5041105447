// Copyright 2026 Sentra Contributors
// SPDX-License-Identifier: Apache-2.0

//! The render-ready privacy insight and the pure transforms that build it.
//!
//! Three sources, in preference order: a top-risks summary (embedded in the
//! `/process` body or fetched separately), a generic walk of the raw
//! analysis, and, when everything else failed, a fallback with safe
//! generic recommendations. The overlay always has *something* to render.

use crate::backend::client::TopRisksSummary;
use crate::overlay::severity::{attribute_severity, format_attribute_name, SeverityColor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Overall risk classification shown in the overlay header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Unknown,
}

/// One titled line item (collected-data entry or key concern).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightItem {
    pub title: String,
    pub details: String,
}

/// The render-ready payload handed to the overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivacyInsight {
    pub domain: String,
    pub risk_level: RiskLevel,
    pub summary: String,
    pub collected_data: Vec<InsightItem>,
    pub key_concerns: Vec<InsightItem>,
    pub recommendations: Vec<String>,
    pub retention: String,
    pub generated_at: DateTime<Utc>,
}

/// Safe recommendations used whenever the backend gave us nothing better.
const GENERIC_RECOMMENDATIONS: &[&str] = &[
    "Use a unique password for this account",
    "Sign up with an email alias where possible",
    "Review the privacy settings right after creating the account",
    "Check what data you can delete from your account later",
];

/// Analysis sections whose `types` lists name collected attributes.
const TYPED_SECTIONS: &[&str] = &[
    "personal_identifiers",
    "device_data",
    "precise_location",
    "device_fingerprinting",
    "user_content",
    "third_party_data",
    "sensitive_data",
    "children_data",
];

impl PrivacyInsight {
    /// Placeholder rendered while the overlay is in its loading phase.
    pub fn placeholder(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            risk_level: RiskLevel::Unknown,
            summary: format!("Analyzing the privacy practices of {domain}…"),
            collected_data: Vec::new(),
            key_concerns: Vec::new(),
            recommendations: Vec::new(),
            retention: String::new(),
            generated_at: Utc::now(),
        }
    }

    /// Fallback when no analysis could be produced (poll exhaustion, empty
    /// summaries). Not an error state: generic but genuinely useful advice.
    pub fn fallback(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            risk_level: RiskLevel::Unknown,
            summary: format!(
                "No detailed analysis is available for {domain} yet. General signup precautions apply."
            ),
            collected_data: Vec::new(),
            key_concerns: Vec::new(),
            recommendations: GENERIC_RECOMMENDATIONS.iter().map(|s| s.to_string()).collect(),
            retention: "Retention practices for this site are not known.".to_string(),
            generated_at: Utc::now(),
        }
    }

    /// Fallback for a terminal backend failure. Same shape, error-flavored
    /// summary; still renders as a usable card.
    pub fn fallback_with_error(domain: &str, error: &str) -> Self {
        let mut insight = Self::fallback(domain);
        insight.summary = format!(
            "The privacy analysis for {domain} could not be completed ({error}). General signup precautions apply."
        );
        insight
    }

    /// Build from a top-risks summary. Key-concern details always come from
    /// the attribute's `explanation`; the quoted `evidence` never leaks into
    /// the overlay.
    pub fn from_summary(domain: &str, summary: &TopRisksSummary) -> Self {
        let key_concerns: Vec<InsightItem> = summary
            .top_high_risk_attributes
            .iter()
            .map(|attr| InsightItem {
                title: attr.title.clone(),
                details: attr.explanation.clone(),
            })
            .collect();

        let risk_level = if key_concerns.is_empty() {
            RiskLevel::Low
        } else {
            RiskLevel::High
        };

        let retention = summary
            .data_retention_policy
            .as_ref()
            .map(|p| p.explanation.clone())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Retention practices for this site are not known.".to_string());

        let mut recommendations: Vec<String> = summary
            .mitigations
            .iter()
            .map(|m| m.mitigation.clone())
            .filter(|m| !m.is_empty())
            .collect();
        if recommendations.is_empty() {
            recommendations = GENERIC_RECOMMENDATIONS.iter().map(|s| s.to_string()).collect();
        }

        Self {
            domain: domain.to_string(),
            risk_level,
            summary: match key_concerns.len() {
                0 => format!("No high-risk data practices were flagged for {domain}."),
                n => format!("{n} high-risk data practices were flagged for {domain}."),
            },
            collected_data: Vec::new(),
            key_concerns,
            recommendations,
            retention,
            generated_at: Utc::now(),
        }
    }

    /// Generic transform of a raw analysis body: walk the data-collection
    /// sections, rank attributes by the severity table, and compose a
    /// retention summary. Used only when neither summary source produced a
    /// usable result.
    pub fn from_analysis(domain: &str, analysis: &Value) -> Self {
        let data_collection = &analysis["data_collection"];

        let mut collected_data = Vec::new();
        let mut red_attrs: Vec<(String, u8, String)> = Vec::new();
        let mut has_yellow = false;

        for section_key in TYPED_SECTIONS {
            let section = &data_collection[*section_key];
            let Some(types) = section["types"].as_array() else {
                continue;
            };
            let attrs: Vec<&str> = types.iter().filter_map(|t| t.as_str()).collect();
            if attrs.is_empty() {
                continue;
            }

            let evidence = section["evidence"].as_str().unwrap_or("");
            collected_data.push(InsightItem {
                title: format_attribute_name(section_key),
                details: attrs
                    .iter()
                    .map(|a| format_attribute_name(a))
                    .collect::<Vec<_>>()
                    .join(", "),
            });

            for attr in attrs {
                match attribute_severity(attr) {
                    (SeverityColor::Red, rank) => {
                        // Same attribute may appear under several sections;
                        // the first section's evidence wins.
                        if !red_attrs.iter().any(|(a, _, _)| a == attr) {
                            red_attrs.push((attr.to_string(), rank, evidence.to_string()));
                        }
                    }
                    (SeverityColor::Yellow, _) => has_yellow = true,
                    (SeverityColor::Green, _) => {}
                }
            }
        }

        // Highest-sensitivity red attributes become the key concerns (top 3).
        red_attrs.sort_by(|a, b| b.1.cmp(&a.1));
        let key_concerns: Vec<InsightItem> = red_attrs
            .iter()
            .take(3)
            .map(|(attr, _, evidence)| InsightItem {
                title: format_attribute_name(attr),
                details: evidence.clone(),
            })
            .collect();

        let risk_level = if !red_attrs.is_empty() {
            RiskLevel::High
        } else if has_yellow {
            RiskLevel::Medium
        } else if collected_data.is_empty() {
            RiskLevel::Unknown
        } else {
            RiskLevel::Low
        };

        Self {
            domain: domain.to_string(),
            risk_level,
            summary: match (collected_data.len(), red_attrs.len()) {
                (0, _) => format!("The policies of {domain} disclose little about data collection."),
                (_, 0) => format!("{domain} collects data, with no high-risk practices flagged."),
                (_, n) => format!("{domain} collects data with {n} high-risk practices flagged."),
            },
            collected_data,
            key_concerns,
            recommendations: GENERIC_RECOMMENDATIONS.iter().map(|s| s.to_string()).collect(),
            retention: retention_summary(&analysis["data_retention"]),
            generated_at: Utc::now(),
        }
    }
}

/// Compose a one-line retention summary from the raw `data_retention`
/// section.
fn retention_summary(retention: &Value) -> String {
    if retention.is_null() {
        return "Retention practices for this site are not known.".to_string();
    }
    if retention["indefinite_retention"].as_bool() == Some(true) {
        return "Data may be retained indefinitely.".to_string();
    }
    if let Some(duration) = retention["retention_duration"].as_str() {
        if !duration.is_empty() {
            let deletion = if retention["deletion_rights_available"].as_bool() == Some(true) {
                " Deletion can be requested."
            } else {
                ""
            };
            return format!("Data is retained for {duration}.{deletion}");
        }
    }
    if retention["retention_period_specified"].as_bool() == Some(false) {
        return "No retention period is specified in the policy.".to_string();
    }
    "Retention practices for this site are not known.".to_string()
}

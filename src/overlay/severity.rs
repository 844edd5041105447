// Copyright 2026 Sentra Contributors
// SPDX-License-Identifier: Apache-2.0

//! Attribute severity table.
//!
//! Maps the backend's data-collection attribute identifiers to a traffic-
//! light color and a sensitivity rank. Used when deriving an insight from a
//! raw analysis that carries no precomputed summary: attributes are ranked
//! by sensitivity and the red share drives the overall risk level.

/// Traffic-light severity color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityColor {
    Green,
    Yellow,
    Red,
}

/// attribute identifier → (color, sensitivity rank). Higher rank = more
/// sensitive. Unknown attributes fall back to (Green, 1).
const ATTRIBUTE_SEVERITY: &[(&str, SeverityColor, u8)] = &[
    ("name", SeverityColor::Yellow, 3),
    ("email", SeverityColor::Yellow, 4),
    ("phone_number", SeverityColor::Yellow, 5),
    ("physical_address", SeverityColor::Red, 1),
    ("date_of_birth", SeverityColor::Yellow, 2),
    ("government_id", SeverityColor::Red, 9),
    ("financial_account", SeverityColor::Red, 10),
    ("biometric", SeverityColor::Red, 2),
    ("photo", SeverityColor::Yellow, 9),
    ("gender", SeverityColor::Yellow, 18),
    ("nationality", SeverityColor::Yellow, 17),
    ("race_ethnicity", SeverityColor::Red, 17),
    ("ip_address", SeverityColor::Yellow, 6),
    ("device_id", SeverityColor::Yellow, 8),
    ("browser_info", SeverityColor::Green, 2),
    ("os", SeverityColor::Green, 3),
    ("screen_resolution", SeverityColor::Green, 4),
    ("language", SeverityColor::Green, 5),
    ("timezone", SeverityColor::Green, 6),
    ("fingerprint", SeverityColor::Red, 13),
    ("precise_gps", SeverityColor::Red, 11),
    ("coarse_location", SeverityColor::Green, 7),
    ("wifi_cell", SeverityColor::Red, 12),
    ("ip_derived", SeverityColor::Yellow, 7),
    ("posts", SeverityColor::Yellow, 12),
    ("messages", SeverityColor::Red, 14),
    ("photos", SeverityColor::Yellow, 10),
    ("videos", SeverityColor::Yellow, 11),
    ("search_history", SeverityColor::Red, 15),
    ("purchase_history", SeverityColor::Yellow, 13),
    ("contacts", SeverityColor::Red, 16),
    ("social_media", SeverityColor::Yellow, 14),
    ("advertisers", SeverityColor::Yellow, 15),
    ("analytics", SeverityColor::Green, 1),
    ("data_brokers", SeverityColor::Yellow, 16),
    ("affiliates", SeverityColor::Green, 8),
    ("health", SeverityColor::Red, 3),
    ("genetic", SeverityColor::Red, 1),
    ("political", SeverityColor::Red, 5),
    ("religious", SeverityColor::Red, 6),
    ("sexual_orientation", SeverityColor::Red, 4),
    ("union_membership", SeverityColor::Red, 7),
    ("criminal", SeverityColor::Red, 8),
    ("age_under_13", SeverityColor::Red, 18),
    ("age_13_to_17", SeverityColor::Red, 19),
    ("parental_consent_required", SeverityColor::Red, 20),
];

/// Severity of a backend attribute identifier.
pub fn attribute_severity(attr: &str) -> (SeverityColor, u8) {
    ATTRIBUTE_SEVERITY
        .iter()
        .find(|(name, _, _)| *name == attr)
        .map(|&(_, color, rank)| (color, rank))
        .unwrap_or((SeverityColor::Green, 1))
}

/// Convert an underscore-separated attribute identifier to Title Case, the
/// presentation form used in insight items ("parental_consent_required" →
/// "Parental Consent Required").
pub fn format_attribute_name(attr: &str) -> String {
    attr.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_attribute() {
        assert_eq!(
            attribute_severity("financial_account"),
            (SeverityColor::Red, 10)
        );
        assert_eq!(attribute_severity("analytics"), (SeverityColor::Green, 1));
    }

    #[test]
    fn test_unknown_attribute_defaults_green() {
        assert_eq!(attribute_severity("shoe_size"), (SeverityColor::Green, 1));
    }

    #[test]
    fn test_format_attribute_name() {
        assert_eq!(
            format_attribute_name("parental_consent_required"),
            "Parental Consent Required"
        );
        assert_eq!(format_attribute_name("email"), "Email");
        assert_eq!(format_attribute_name("ip_address"), "Ip Address");
    }
}

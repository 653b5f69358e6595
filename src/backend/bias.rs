//! Fairness statistics
//!
//! `GET /bias_stats` returns label counts keyed risk level first
//! (`{"High": {"Female": 12, ...}, ...}`). Charts want one row per group
//! with a column per risk level, so the counts are pivoted here. Payloads
//! already keyed by group first are accepted as-is.

use super::dto::{BiasStats, NestedCounts};
use crate::queue::RiskLevel;
use serde::Serialize;
use std::collections::BTreeMap;

/// Risk-level counts for one group (a gender or an age bucket)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BiasRow {
    pub name: String,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

/// Chart-ready fairness report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BiasReport {
    pub gender: Vec<BiasRow>,
    pub age: Vec<BiasRow>,
}

impl From<&BiasStats> for BiasReport {
    fn from(stats: &BiasStats) -> Self {
        Self {
            gender: bias_rows(&stats.gender_risk),
            age: bias_rows(&stats.age_risk),
        }
    }
}

/// Pivot nested counts into one row per group; missing counts are zero
pub fn bias_rows(counts: &NestedCounts) -> Vec<BiasRow> {
    let keyed_by_risk = !counts.is_empty() && counts.keys().all(|k| is_risk_label(k));

    let mut groups: BTreeMap<String, BiasRow> = BTreeMap::new();
    for (outer, inner) in counts {
        for (key, count) in inner {
            let (group, risk) = if keyed_by_risk {
                (key.as_str(), outer.as_str())
            } else {
                (outer.as_str(), key.as_str())
            };

            let row = groups.entry(group.to_string()).or_insert_with(|| BiasRow {
                name: group.to_string(),
                high: 0,
                medium: 0,
                low: 0,
            });

            match RiskLevel::parse(risk) {
                Some(RiskLevel::High) => row.high += count,
                Some(RiskLevel::Medium) => row.medium += count,
                Some(RiskLevel::Low) => row.low += count,
                _ => {}
            }
        }
    }

    groups.into_values().collect()
}

fn is_risk_label(label: &str) -> bool {
    matches!(
        RiskLevel::parse(label),
        Some(RiskLevel::High | RiskLevel::Medium | RiskLevel::Low)
    )
}

//! Dashboard statistics over a history snapshot.
//!
//! Everything here is a pure function of the records passed in; the
//! history store is never touched.

use crate::models::{DashboardStats, DiagnosisRecord, DiseaseCount};
use std::collections::HashMap;

/// Compute the dashboard counters.
///
/// `diseases_detected` is `total - healthy`, so results that are not a
/// plant at all are counted there too. `disease_counts` only includes
/// plant results that are not healthy.
pub fn compute_stats(history: &[DiagnosisRecord]) -> DashboardStats {
    let total_analyses = history.len();
    let healthy_plants = history.iter().filter(|r| r.result.is_healthy()).count();

    let mut disease_counts: HashMap<String, usize> = HashMap::new();
    for record in history.iter().filter(|r| r.result.is_disease()) {
        *disease_counts
            .entry(record.result.disease_name.clone())
            .or_default() += 1;
    }

    DashboardStats {
        total_analyses,
        healthy_plants,
        diseases_detected: total_analyses - healthy_plants,
        disease_counts,
    }
}

/// Disease breakdown sorted by count (highest first).
///
/// Ties keep the order in which the names first appear in `history`,
/// i.e. the most recently seen disease wins.
pub fn rank_diseases(history: &[DiagnosisRecord]) -> Vec<DiseaseCount> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for record in history.iter().filter(|r| r.result.is_disease()) {
        let name = record.result.disease_name.as_str();
        let count = counts.entry(name).or_default();
        if *count == 0 {
            order.push(name);
        }
        *count += 1;
    }

    let total: usize = counts.values().sum();
    let mut ranked: Vec<DiseaseCount> = order
        .into_iter()
        .map(|name| {
            let count = counts[name];
            DiseaseCount {
                name: name.to_string(),
                count,
                percentage: percentage(count, total),
            }
        })
        .collect();

    // Stable sort keeps first-encountered order among equal counts.
    ranked.sort_by_key(|d| std::cmp::Reverse(d.count));
    ranked
}

/// Share of healthy results, 0-100.
pub fn healthy_percentage(stats: &DashboardStats) -> f64 {
    percentage(stats.healthy_plants, stats.total_analyses)
}

/// The `n` most recent records.
pub fn recent_activity(history: &[DiagnosisRecord], n: usize) -> &[DiagnosisRecord] {
    &history[..n.min(history.len())]
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 * 100.0) / total as f64
    }
}

/// Generate a text summary of dashboard statistics.
pub fn generate_summary_text(stats: &DashboardStats, ranked: &[DiseaseCount]) -> String {
    let mut lines = Vec::new();

    lines.push(format!("Total Analyses: {}", stats.total_analyses));
    lines.push(format!(
        "- 🌿 Healthy Plants: {} ({:.0}%)",
        stats.healthy_plants,
        healthy_percentage(stats)
    ));
    lines.push(format!("- ⚠️ Diseases Detected: {}", stats.diseases_detected));

    if !ranked.is_empty() {
        lines.push(String::new());
        lines.push("By Disease:".to_string());
        for disease in ranked {
            lines.push(format!(
                "- {}: {} ({:.0}%)",
                disease.name, disease.count, disease.percentage
            ));
        }
    }

    lines.join("\n")
}

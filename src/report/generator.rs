//! Markdown and JSON rendering.
//!
//! This module turns diagnoses, the history and dashboard statistics
//! into text for the terminal or an output file.

use crate::analysis::healthy_percentage;
use crate::models::{
    Confidence, DashboardStats, Diagnosis, DiagnosisRecord, DiseaseCount, DiseaseInfo,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Everything shown on the dashboard, in one serializable value.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    #[serde(flatten)]
    pub stats: DashboardStats,
    pub healthy_percentage: f64,
    pub disease_breakdown: Vec<DiseaseCount>,
    pub recent_activity: Vec<RecentActivity>,
}

/// A recent diagnosis without its (large) image payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub id: u64,
    pub date: DateTime<Utc>,
    pub disease_name: String,
}

impl Dashboard {
    pub fn new(stats: DashboardStats, ranked: Vec<DiseaseCount>, recent: &[DiagnosisRecord]) -> Self {
        Self {
            healthy_percentage: healthy_percentage(&stats),
            stats,
            disease_breakdown: ranked,
            recent_activity: recent
                .iter()
                .map(|r| RecentActivity {
                    id: r.id,
                    date: r.date,
                    disease_name: r.result.disease_name.clone(),
                })
                .collect(),
        }
    }
}

/// Render a single diagnosis.
pub fn generate_diagnosis_markdown(diagnosis: &Diagnosis, record_id: Option<u64>) -> String {
    let mut output = String::new();

    if !diagnosis.is_plant {
        output.push_str("## ⚠️ Not a Plant Leaf\n\n");
        output.push_str(
            "The image does not appear to be a plant leaf. \
             Please provide a clear photo of a leaf for analysis.\n",
        );
        return output;
    }

    output.push_str(&format!("## {}\n\n", diagnosis.disease_name));
    if diagnosis.confidence != Confidence::NotApplicable {
        output.push_str(&format!(
            "{} **{} Confidence**\n\n",
            diagnosis.confidence.emoji(),
            diagnosis.confidence
        ));
    }

    output.push_str("### Description\n\n");
    output.push_str(&diagnosis.description);
    output.push_str("\n\n");

    output.push_str(&generate_list_section("Possible Causes", &diagnosis.possible_causes));
    output.push_str(&generate_list_section(
        "Recommended Treatments",
        &diagnosis.recommended_treatments,
    ));

    if let Some(id) = record_id {
        output.push_str(&format!("*Saved to history as #{}*\n", id));
    }

    output
}

fn generate_list_section(title: &str, items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }

    let mut section = format!("### {}\n\n", title);
    for item in items {
        section.push_str(&format!("- {}\n", item));
    }
    section.push('\n');
    section
}

/// Render the history list, newest first.
pub fn generate_history_markdown(history: &[DiagnosisRecord]) -> String {
    let mut output = String::new();

    output.push_str("# Analysis History\n\n");

    if history.is_empty() {
        output.push_str("No history found. Your past analyses will appear here once you diagnose a plant.\n");
        return output;
    }

    output.push_str("| # | Date | Diagnosis | Confidence |\n");
    output.push_str("|:---|:---|:---|:---:|\n");

    for record in history {
        output.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            record.id,
            record.date.format("%Y-%m-%d %H:%M:%S UTC"),
            record.result.disease_name,
            record.result.confidence
        ));
    }

    output
}

/// Render one past diagnosis in full.
pub fn generate_record_markdown(record: &DiagnosisRecord) -> String {
    let mut output = format!(
        "# Diagnosis #{}\n\n*Analyzed on {}*\n\n",
        record.id,
        record.date.format("%Y-%m-%d %H:%M:%S UTC")
    );
    output.push_str(&generate_diagnosis_markdown(&record.result, None));
    output
}

/// Render the dashboard.
pub fn generate_dashboard_markdown(dashboard: &Dashboard) -> String {
    let mut output = String::new();
    let stats = &dashboard.stats;

    output.push_str("# Dashboard\n\n");

    if stats.total_analyses == 0 {
        output.push_str("Your dashboard awaits. Analyze a plant leaf to see your stats here!\n");
        return output;
    }

    output.push_str("| 📊 Total Analyses | 🌿 Healthy Plants | ⚠️ Diseases Detected |\n");
    output.push_str("|:---:|:---:|:---:|\n");
    output.push_str(&format!(
        "| **{}** | **{}** ({:.0}%) | **{}** |\n\n",
        stats.total_analyses,
        stats.healthy_plants,
        dashboard.healthy_percentage,
        stats.diseases_detected
    ));

    output.push_str("## Disease Breakdown\n\n");
    if dashboard.disease_breakdown.is_empty() {
        output.push_str("No diseases have been detected yet. All diagnosed plants are healthy!\n\n");
    } else {
        output.push_str("| Disease | Count | Share |\n");
        output.push_str("|:---|:---:|:---|\n");
        for disease in &dashboard.disease_breakdown {
            output.push_str(&format!(
                "| {} | {} | {} {:.0}% |\n",
                disease.name,
                disease.count,
                share_bar(disease.percentage),
                disease.percentage
            ));
        }
        output.push('\n');
    }

    output.push_str("## Recent Activity\n\n");
    for item in &dashboard.recent_activity {
        output.push_str(&format!(
            "- {} ({})\n",
            item.disease_name,
            item.date.format("%Y-%m-%d")
        ));
    }

    output
}

/// Ten-cell bar for a 0-100 share.
fn share_bar(percentage: f64) -> String {
    let filled = ((percentage / 10.0).round() as usize).min(10);
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

/// Render the common disease library.
pub fn generate_library_markdown(diseases: &[DiseaseInfo]) -> String {
    let mut output = String::new();

    output.push_str("# Common Plant Diseases\n\n");

    if diseases.is_empty() {
        output.push_str("The model returned no diseases.\n");
        return output;
    }

    for disease in diseases {
        output.push_str(&format!("### {}\n\n{}\n\n", disease.name, disease.description));
    }

    output
}

/// Generate a pretty-printed JSON document.
pub fn generate_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

/// Write rendered output to a file.
pub fn write_output(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)?;
    Ok(())
}

//! Data models for plant leaf diagnoses.
//!
//! This module contains the structures persisted in the history blob
//! and the derived statistics shown on the dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Disease name the model uses when no disease is detected.
pub const HEALTHY_LABEL: &str = "Healthy";

/// Confidence level reported by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "High"),
            Confidence::Medium => write!(f, "Medium"),
            Confidence::Low => write!(f, "Low"),
            Confidence::NotApplicable => write!(f, "N/A"),
        }
    }
}

impl Confidence {
    /// Returns an emoji representation of the confidence level.
    pub fn emoji(&self) -> &'static str {
        match self {
            Confidence::High => "🟢",
            Confidence::Medium => "🟡",
            Confidence::Low => "🟠",
            Confidence::NotApplicable => "⚪",
        }
    }
}

/// Structured outcome of analyzing one leaf image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    /// Whether the image shows a plant leaf at all.
    pub is_plant: bool,
    /// Common name of the disease, or "Healthy".
    pub disease_name: String,
    /// How sure the model is of the diagnosis.
    pub confidence: Confidence,
    /// Short plain-language description.
    pub description: String,
    /// Common causes, most likely first.
    #[serde(default)]
    pub possible_causes: Vec<String>,
    /// Actionable treatment steps.
    #[serde(default)]
    pub recommended_treatments: Vec<String>,
}

impl Diagnosis {
    /// True when the disease name is the healthy sentinel (case-insensitive).
    pub fn is_healthy(&self) -> bool {
        self.disease_name.eq_ignore_ascii_case(HEALTHY_LABEL)
    }

    /// True for a plant leaf with an actual disease.
    pub fn is_disease(&self) -> bool {
        self.is_plant && !self.is_healthy()
    }
}

/// A diagnosis plus its persistence metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisRecord {
    /// Unique id, derived from the insertion time in milliseconds.
    pub id: u64,
    /// Insertion time.
    pub date: DateTime<Utc>,
    /// Self-contained data URL of the analyzed image.
    pub image_url: String,
    /// The diagnosis itself.
    pub result: Diagnosis,
}

/// Dashboard statistics derived from a history snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Number of records in the history.
    pub total_analyses: usize,
    /// Records whose disease name is "Healthy".
    pub healthy_plants: usize,
    /// `total_analyses - healthy_plants`.
    pub diseases_detected: usize,
    /// Occurrences per disease name. Unordered; see `rank_diseases`.
    pub disease_counts: HashMap<String, usize>,
}

/// One row of the ranked disease breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseCount {
    pub name: String,
    pub count: usize,
    /// Share of all disease occurrences, 0-100.
    pub percentage: f64,
}

/// Entry of the common plant disease library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseInfo {
    pub name: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnosis(is_plant: bool, name: &str) -> Diagnosis {
        Diagnosis {
            is_plant,
            disease_name: name.to_string(),
            confidence: Confidence::High,
            description: String::new(),
            possible_causes: vec![],
            recommended_treatments: vec![],
        }
    }

    #[test]
    fn test_healthy_is_case_insensitive() {
        assert!(diagnosis(true, "Healthy").is_healthy());
        assert!(diagnosis(true, "HEALTHY").is_healthy());
        assert!(diagnosis(true, "healthy").is_healthy());
        assert!(!diagnosis(true, "Healthy-ish").is_healthy());
    }

    #[test]
    fn test_is_disease() {
        assert!(diagnosis(true, "Leaf Blight").is_disease());
        assert!(!diagnosis(true, "healthy").is_disease());
        assert!(!diagnosis(false, "Not a Plant Leaf").is_disease());
    }

    #[test]
    fn test_confidence_serialization() {
        assert_eq!(
            serde_json::to_string(&Confidence::NotApplicable).unwrap(),
            "\"N/A\""
        );
        let parsed: Confidence = serde_json::from_str("\"Medium\"").unwrap();
        assert_eq!(parsed, Confidence::Medium);
        assert!(serde_json::from_str::<Confidence>("\"Certain\"").is_err());
    }

    #[test]
    fn test_record_uses_camel_case_layout() {
        let json = r#"{
            "id": 1718000000000,
            "date": "2024-06-10T06:13:20.000Z",
            "imageUrl": "data:image/png;base64,AAAA",
            "result": {
                "isPlant": true,
                "diseaseName": "Powdery Mildew",
                "confidence": "Low",
                "description": "White fungal growth.",
                "possibleCauses": ["Humidity"],
                "recommendedTreatments": []
            }
        }"#;

        let record: DiagnosisRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, 1_718_000_000_000);
        assert_eq!(record.image_url, "data:image/png;base64,AAAA");
        assert_eq!(record.result.disease_name, "Powdery Mildew");
        assert_eq!(record.result.confidence, Confidence::Low);
        assert_eq!(record.result.possible_causes, vec!["Humidity"]);

        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("imageUrl").is_some());
        assert!(value["result"].get("recommendedTreatments").is_some());
    }
}

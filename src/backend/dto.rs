//! Triage backend request/response types
//!
//! Field names match the backend's JSON exactly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of `POST /predict`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    #[serde(rename = "Age")]
    pub age: u32,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "BP_Systolic")]
    pub bp_systolic: i64,
    #[serde(rename = "BP_Diastolic")]
    pub bp_diastolic: i64,
    #[serde(rename = "Heart_Rate")]
    pub heart_rate: i64,
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "O2_Saturation")]
    pub o2_saturation: i64,
    #[serde(rename = "Symptoms")]
    pub symptoms: String,
    #[serde(rename = "Medical_Notes")]
    pub medical_notes: String,
    #[serde(rename = "Pre_Existing_Conditions")]
    pub pre_existing_conditions: String,
}

/// Response of `POST /predict`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    #[serde(rename = "Predicted_Risk")]
    pub predicted_risk: String,
    #[serde(rename = "Risk_Confidence", default)]
    pub risk_confidence: Option<f64>,
    #[serde(rename = "Department", default)]
    pub department: Option<String>,
    #[serde(rename = "Assigned_Doctor", default)]
    pub assigned_doctor: Option<String>,
    #[serde(rename = "Assigned_Doctor_ID", default, skip_serializing_if = "Option::is_none")]
    pub assigned_doctor_id: Option<String>,
    #[serde(rename = "Doctor_Status", default, skip_serializing_if = "Option::is_none")]
    pub doctor_status: Option<String>,
    #[serde(default)]
    pub explanation: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub comparison_stats: BTreeMap<String, String>,
    #[serde(rename = "Medical_Notes", default, skip_serializing_if = "Option::is_none")]
    pub medical_notes: Option<String>,
    #[serde(
        rename = "Pre_Existing_Conditions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pre_existing_conditions: Option<String>,
    #[serde(rename = "Symptoms", default, skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<String>,
}

/// Vitals pulled out of an uploaded document; only matched fields are present
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedVitals {
    #[serde(rename = "Age", default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(rename = "Gender", default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(rename = "BP_Systolic", default, skip_serializing_if = "Option::is_none")]
    pub bp_systolic: Option<i64>,
    #[serde(rename = "BP_Diastolic", default, skip_serializing_if = "Option::is_none")]
    pub bp_diastolic: Option<i64>,
    #[serde(rename = "Heart_Rate", default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<i64>,
    #[serde(rename = "Temperature", default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(rename = "O2_Saturation", default, skip_serializing_if = "Option::is_none")]
    pub o2_saturation: Option<i64>,
}

/// Response of `POST /upload_doc`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentExtraction {
    #[serde(default)]
    pub extracted_text_preview: String,
    #[serde(default)]
    pub extracted_data: ExtractedVitals,
    #[serde(default)]
    pub medical_notes: String,
}

/// One turn of a chat conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<ChatMessage>,
}

/// Response of `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Nested label counts as returned by `GET /bias_stats`
pub type NestedCounts = BTreeMap<String, BTreeMap<String, u64>>;

/// Response of `GET /bias_stats`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BiasStats {
    #[serde(default)]
    pub gender_risk: NestedCounts,
    #[serde(default)]
    pub age_risk: NestedCounts,
}

/// Per-department summary from `GET /get_department_stats`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentStats {
    pub total: u32,
    pub available: u32,
    #[serde(default)]
    pub specs: Vec<String>,
}

/// A doctor as listed by `GET /get_doctor_list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub dept: String,
    pub status: String,
    #[serde(default)]
    pub spec: Option<String>,
}

/// Doctor availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    Available,
    Busy,
}

impl Availability {
    pub fn toggled(self) -> Self {
        match self {
            Availability::Available => Availability::Busy,
            Availability::Busy => Availability::Available,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Available => "Available",
            Availability::Busy => "Busy",
        }
    }
}

impl std::str::FromStr for Availability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "available" => Ok(Availability::Available),
            "busy" => Ok(Availability::Busy),
            other => Err(format!("Unknown availability: {}", other)),
        }
    }
}

/// Body of `POST /toggle_availability`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityUpdate {
    pub doctor_name: String,
    pub status: Availability,
}

/// Response of `POST /toggle_availability`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub status: String,
    pub new_state: Availability,
}

/// Response of `GET /health` on the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendHealth {
    pub status: String,
    #[serde(default)]
    pub models_loaded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_request_wire_names() {
        let request = PredictRequest {
            age: 45,
            gender: "Female".into(),
            bp_systolic: 130,
            bp_diastolic: 85,
            heart_rate: 90,
            temperature: 37.5,
            o2_saturation: 97,
            symptoms: "headache".into(),
            medical_notes: String::new(),
            pre_existing_conditions: "asthma".into(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["Age"], 45);
        assert_eq!(json["Temperature"], 37.5);
        assert_eq!(json["O2_Saturation"], 97);
        assert_eq!(json["Pre_Existing_Conditions"], "asthma");
    }

    #[test]
    fn test_predict_response_parses() {
        let json = r#"{
            "Predicted_Risk": "High",
            "Risk_Confidence": 88.2,
            "Department": "Cardiology",
            "Assigned_Doctor": "Dr. Heart",
            "Assigned_Doctor_ID": "doc_1",
            "Doctor_Status": "Notified",
            "explanation": ["Heart_Rate", "O2 Saturation (91%)"],
            "comparison_stats": {"BP_Percentile": "Higher than 80.0% of patients"},
            "Medical_Notes": "",
            "Pre_Existing_Conditions": "",
            "Symptoms": "chest pain"
        }"#;

        let response: PredictResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.predicted_risk, "High");
        assert_eq!(response.assigned_doctor.as_deref(), Some("Dr. Heart"));
        assert_eq!(response.explanation.len(), 2);
        assert_eq!(response.comparison_stats.len(), 1);
    }

    #[test]
    fn test_extraction_with_partial_fields() {
        let json = r#"{
            "extracted_text_preview": "Age: 50",
            "extracted_data": {"Age": 50, "Temperature": 38.1},
            "medical_notes": "Age: 50 Temp: 38.1"
        }"#;

        let extraction: DocumentExtraction = serde_json::from_str(json).unwrap();
        assert_eq!(extraction.extracted_data.age, Some(50));
        assert_eq!(extraction.extracted_data.temperature, Some(38.1));
        assert!(extraction.extracted_data.heart_rate.is_none());
    }

    #[test]
    fn test_availability() {
        assert_eq!(Availability::Available.toggled(), Availability::Busy);
        assert_eq!("busy".parse::<Availability>().unwrap(), Availability::Busy);
        assert_eq!(
            serde_json::to_string(&Availability::Available).unwrap(),
            "\"Available\""
        );
    }
}

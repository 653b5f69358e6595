//! Core data types for the live triage queue
//!
//! This module defines the fundamental types used throughout the queue layer:
//! - `PatientId`: Opaque patient identity (JSON number or string)
//! - `RiskLevel`: Risk classification with its severity rank
//! - `PatientRecord`: One patient as delivered by the triage backend
//! - `VitalsSample`: A timestamped vitals snapshot taken from a record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Opaque patient identifier
///
/// The backend hands out integer ids for seeded and simulated patients and
/// millisecond-timestamp strings for form submissions. The two forms are
/// distinct identities: `123` and `"123"` never match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatientId {
    Number(i64),
    Text(String),
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatientId::Number(n) => write!(f, "{}", n),
            PatientId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for PatientId {
    fn from(n: i64) -> Self {
        PatientId::Number(n)
    }
}

impl From<&str> for PatientId {
    fn from(s: &str) -> Self {
        PatientId::Text(s.to_string())
    }
}

impl From<String> for PatientId {
    fn from(s: String) -> Self {
        PatientId::Text(s)
    }
}

/// Severity rank used for ordering: lower sorts first
pub type Severity = u8;

/// Rank of records with no usable risk classification
pub const UNSET_SEVERITY: Severity = 2;

/// Risk classification of a patient
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
    /// Any other non-empty label, kept verbatim
    Other(String),
}

impl RiskLevel {
    /// Parse a risk label. Matching is case-insensitive; blank labels
    /// mean "no classification" and yield `None`.
    pub fn parse(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return None;
        }

        let level = match trimmed.to_ascii_lowercase().as_str() {
            "high" => RiskLevel::High,
            "medium" => RiskLevel::Medium,
            "low" => RiskLevel::Low,
            _ => RiskLevel::Other(trimmed.to_string()),
        };
        Some(level)
    }

    /// Severity rank: High(0) < Medium(1) < everything else(2)
    pub fn severity(&self) -> Severity {
        match self {
            RiskLevel::High => 0,
            RiskLevel::Medium => 1,
            RiskLevel::Low | RiskLevel::Other(_) => UNSET_SEVERITY,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RiskLevel::High => "High",
            RiskLevel::Medium => "Medium",
            RiskLevel::Low => "Low",
            RiskLevel::Other(label) => label,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RiskLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Deserialize an optional risk label, mapping `null` and blank strings to `None`
pub fn deserialize_risk<'de, D>(deserializer: D) -> Result<Option<RiskLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(RiskLevel::parse))
}

fn deserialize_explanation<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<String>> = Option::deserialize(deserializer)?;
    Ok(raw.unwrap_or_default())
}

/// A patient as delivered by the triage backend
///
/// Field names follow the backend's wire format. Fields this crate does not
/// interpret are kept in `extra` so a record can be relayed unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(rename = "Patient_ID")]
    pub id: PatientId,

    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Years; the backend may send it as a float
    #[serde(rename = "Age", default, skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,

    #[serde(rename = "Gender", default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(rename = "Heart_Rate", default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,

    #[serde(rename = "BP_Systolic", default, skip_serializing_if = "Option::is_none")]
    pub bp_systolic: Option<f64>,

    #[serde(rename = "BP_Diastolic", default, skip_serializing_if = "Option::is_none")]
    pub bp_diastolic: Option<f64>,

    #[serde(rename = "Temperature", default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(rename = "O2_Saturation", default, skip_serializing_if = "Option::is_none")]
    pub o2_saturation: Option<f64>,

    #[serde(rename = "Symptoms", default, skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<String>,

    /// User-entered classification
    #[serde(
        rename = "Risk_Level",
        default,
        deserialize_with = "deserialize_risk",
        skip_serializing_if = "Option::is_none"
    )]
    pub risk_level: Option<RiskLevel>,

    /// Model-derived classification, takes precedence over `risk_level`
    #[serde(
        rename = "Predicted_Risk",
        default,
        deserialize_with = "deserialize_risk",
        skip_serializing_if = "Option::is_none"
    )]
    pub predicted_risk: Option<RiskLevel>,

    /// Model confidence, 0-100
    #[serde(rename = "Risk_Confidence", default, skip_serializing_if = "Option::is_none")]
    pub risk_confidence: Option<f64>,

    #[serde(rename = "Assigned_Doctor", default, skip_serializing_if = "Option::is_none")]
    pub assigned_doctor: Option<String>,

    #[serde(rename = "Department", default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    #[serde(rename = "Medical_Notes", default, skip_serializing_if = "Option::is_none")]
    pub medical_notes: Option<String>,

    #[serde(
        rename = "Pre_Existing_Conditions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pre_existing_conditions: Option<String>,

    /// Contributing factors reported by the risk model
    #[serde(
        default,
        deserialize_with = "deserialize_explanation",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub explanation: Vec<String>,

    /// Backend fields not interpreted here
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PatientRecord {
    /// Create a record with only an identity set
    pub fn new(id: impl Into<PatientId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            age: None,
            gender: None,
            heart_rate: None,
            bp_systolic: None,
            bp_diastolic: None,
            temperature: None,
            o2_saturation: None,
            symptoms: None,
            risk_level: None,
            predicted_risk: None,
            risk_confidence: None,
            assigned_doctor: None,
            department: None,
            medical_notes: None,
            pre_existing_conditions: None,
            explanation: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Builder method: set the display name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder method: set the user-entered risk level
    pub fn risk_level(mut self, label: &str) -> Self {
        self.risk_level = RiskLevel::parse(label);
        self
    }

    /// Builder method: set the model-derived risk level
    pub fn predicted_risk(mut self, label: &str) -> Self {
        self.predicted_risk = RiskLevel::parse(label);
        self
    }

    /// Builder method: set the assigned doctor
    pub fn assigned_to(mut self, doctor: impl Into<String>) -> Self {
        self.assigned_doctor = Some(doctor.into());
        self
    }

    /// Builder method: set heart rate, temperature, O2 saturation and systolic BP
    pub fn vitals(mut self, heart_rate: f64, temperature: f64, o2: f64, systolic: f64) -> Self {
        self.heart_rate = Some(heart_rate);
        self.temperature = Some(temperature);
        self.o2_saturation = Some(o2);
        self.bp_systolic = Some(systolic);
        self
    }

    /// The classification that counts: predicted risk, else user-entered risk
    pub fn effective_risk(&self) -> Option<&RiskLevel> {
        self.predicted_risk.as_ref().or(self.risk_level.as_ref())
    }

    /// Severity rank of the effective risk (unset ranks with Low)
    pub fn severity(&self) -> Severity {
        self.effective_risk()
            .map(RiskLevel::severity)
            .unwrap_or(UNSET_SEVERITY)
    }

    pub fn is_high_risk(&self) -> bool {
        matches!(self.effective_risk(), Some(RiskLevel::High))
    }

    /// Exact match on the assigned doctor's name
    pub fn is_assigned_to(&self, doctor: &str) -> bool {
        self.assigned_doctor.as_deref() == Some(doctor)
    }

    /// Name for display, "Anonymous" when absent
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => "Anonymous",
        }
    }
}

/// A timestamped vitals snapshot belonging to one patient's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalsSample {
    /// When the snapshot was received
    pub time: DateTime<Utc>,
    pub heart_rate: Option<f64>,
    pub temperature: Option<f64>,
    pub o2_saturation: Option<f64>,
    pub bp_systolic: Option<f64>,
}

impl VitalsSample {
    /// Take a sample of the record's current vitals
    pub fn from_record(record: &PatientRecord, time: DateTime<Utc>) -> Self {
        Self {
            time,
            heart_rate: record.heart_rate,
            temperature: record.temperature,
            o2_saturation: record.o2_saturation,
            bp_systolic: record.bp_systolic,
        }
    }

    /// Wall-clock label used on trend charts (24h `HH:MM:SS`)
    pub fn time_label(&self) -> String {
        self.time.format("%H:%M:%S").to_string()
    }
}

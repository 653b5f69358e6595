//! Triage intake
//!
//! Raw form fields are validated into a `PredictRequest` before anything is
//! sent upstream. A successful prediction is combined with the request into a
//! new `PatientRecord` ready to be admitted to the queue.

use super::dto::{DocumentExtraction, PredictRequest, PredictResponse};
use crate::queue::PatientRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Intake validation errors. Nothing that fails here reaches the backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntakeError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} must be a number (got {value:?})")]
    NotNumeric { field: &'static str, value: String },

    #[error("Only PDF files are accepted (got {0})")]
    NotPdf(String),

    #[error("Prediction could not be turned into a record: {0}")]
    InvalidPrediction(String),
}

/// Raw triage form as typed by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeForm {
    pub age: String,
    pub gender: String,
    pub bp_systolic: String,
    pub bp_diastolic: String,
    pub heart_rate: String,
    pub temperature: String,
    pub o2_saturation: String,
    pub symptoms: String,
    pub medical_notes: String,
    pub pre_existing_conditions: String,
}

impl Default for IntakeForm {
    fn default() -> Self {
        Self {
            age: String::new(),
            gender: "Male".to_string(),
            bp_systolic: String::new(),
            bp_diastolic: String::new(),
            heart_rate: String::new(),
            temperature: String::new(),
            o2_saturation: String::new(),
            symptoms: String::new(),
            medical_notes: String::new(),
            pre_existing_conditions: String::new(),
        }
    }
}

impl IntakeForm {
    /// Parse every numeric field, reporting the first one that fails
    pub fn validate(&self) -> Result<PredictRequest, IntakeError> {
        let gender = self.gender.trim();
        if gender.is_empty() {
            return Err(IntakeError::Missing("Gender"));
        }

        let temperature: f64 = parse_field("Temperature", &self.temperature)?;
        if !temperature.is_finite() {
            return Err(IntakeError::NotNumeric {
                field: "Temperature",
                value: self.temperature.clone(),
            });
        }

        Ok(PredictRequest {
            age: parse_field("Age", &self.age)?,
            gender: gender.to_string(),
            bp_systolic: parse_field("BP_Systolic", &self.bp_systolic)?,
            bp_diastolic: parse_field("BP_Diastolic", &self.bp_diastolic)?,
            heart_rate: parse_field("Heart_Rate", &self.heart_rate)?,
            temperature,
            o2_saturation: parse_field("O2_Saturation", &self.o2_saturation)?,
            symptoms: self.symptoms.clone(),
            medical_notes: self.medical_notes.clone(),
            pre_existing_conditions: self.pre_existing_conditions.clone(),
        })
    }

    /// Overwrite fields found in a document; its full text becomes the notes
    pub fn merge_extracted(&mut self, extraction: &DocumentExtraction) {
        let data = &extraction.extracted_data;

        if let Some(age) = data.age {
            self.age = age.to_string();
        }
        if let Some(gender) = &data.gender {
            self.gender = gender.clone();
        }
        if let Some(v) = data.bp_systolic {
            self.bp_systolic = v.to_string();
        }
        if let Some(v) = data.bp_diastolic {
            self.bp_diastolic = v.to_string();
        }
        if let Some(v) = data.heart_rate {
            self.heart_rate = v.to_string();
        }
        if let Some(v) = data.temperature {
            self.temperature = v.to_string();
        }
        if let Some(v) = data.o2_saturation {
            self.o2_saturation = v.to_string();
        }

        self.medical_notes = extraction.medical_notes.clone();
    }
}

fn parse_field<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T, IntakeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IntakeError::Missing(field));
    }
    trimmed.parse().map_err(|_| IntakeError::NotNumeric {
        field,
        value: raw.to_string(),
    })
}

/// Reject uploads that are not PDF files
pub fn ensure_pdf(file_name: &str) -> Result<(), IntakeError> {
    let is_pdf = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    if is_pdf {
        Ok(())
    } else {
        Err(IntakeError::NotPdf(file_name.to_string()))
    }
}

/// Build the queue record for a triaged patient
///
/// Request fields come first, the prediction overwrites anything it also
/// reports, and the id is the submission time in milliseconds as a string.
pub fn record_from_prediction(
    request: &PredictRequest,
    response: &PredictResponse,
    submitted_at: DateTime<Utc>,
) -> Result<PatientRecord, IntakeError> {
    let invalid = |e: serde_json::Error| IntakeError::InvalidPrediction(e.to_string());

    let mut merged = match serde_json::to_value(request).map_err(invalid)? {
        Value::Object(map) => map,
        _ => return Err(IntakeError::InvalidPrediction("request is not an object".into())),
    };

    merged.insert(
        "Patient_ID".to_string(),
        Value::String(submitted_at.timestamp_millis().to_string()),
    );

    if let Value::Object(prediction) = serde_json::to_value(response).map_err(invalid)? {
        merged.extend(prediction);
    }

    serde_json::from_value(Value::Object(merged)).map_err(invalid)
}

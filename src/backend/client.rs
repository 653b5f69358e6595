//! Triage Backend REST Client
//!
//! HTTP client for the triage backend. Every call classifies transport
//! failures the same way: timeouts, refused connections, non-success
//! statuses and undecodable bodies each get their own error variant.

use super::dto::{
    AvailabilityResponse, AvailabilityUpdate, BackendHealth, BiasStats, ChatRequest,
    ChatResponse, DepartmentStats, DocumentExtraction, Doctor, PredictRequest, PredictResponse,
    Availability,
};
use super::TriageBackend;
use crate::config::BackendConfig;
use crate::queue::{snapshot_from_value, PatientRecord};
use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Triage backend REST client
#[derive(Clone)]
pub struct TriageClient {
    client: Client,
    base_url: String,
}

impl TriageClient {
    /// Create a client for the configured backend
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(BackendError::Request)?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(classify)?;

        decode(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: Option<&B>) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.client.post(self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(classify)?;
        decode(response).await
    }
}

#[async_trait]
impl TriageBackend for TriageClient {
    async fn health(&self) -> Result<BackendHealth, BackendError> {
        self.get_json("/health").await
    }

    async fn fetch_patients(&self) -> Result<Vec<PatientRecord>, BackendError> {
        let value: Value = self.get_json("/patients").await?;
        snapshot_from_value(value).map_err(|e| BackendError::Malformed(e.to_string()))
    }

    async fn simulate_arrival(&self) -> Result<Option<PatientRecord>, BackendError> {
        let value: Value = self.post_json::<Value, _>("/simulate_arrival", None).await?;

        // An empty object means the backend has no profiles to draw from
        match &value {
            Value::Object(map) if map.is_empty() => return Ok(None),
            _ => {}
        }

        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| BackendError::Malformed(e.to_string()))
    }

    async fn predict(&self, request: &PredictRequest) -> Result<PredictResponse, BackendError> {
        self.post_json("/predict", Some(request)).await
    }

    async fn upload_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<DocumentExtraction, BackendError> {
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .map_err(BackendError::Request)?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/upload_doc"))
            .multipart(form)
            .send()
            .await
            .map_err(classify)?;

        decode(response).await
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, BackendError> {
        self.post_json("/chat", Some(request)).await
    }

    async fn bias_stats(&self) -> Result<BiasStats, BackendError> {
        self.get_json("/bias_stats").await
    }

    async fn department_stats(&self) -> Result<BTreeMap<String, DepartmentStats>, BackendError> {
        self.get_json("/get_department_stats").await
    }

    async fn doctor_list(&self) -> Result<BTreeMap<String, Vec<Doctor>>, BackendError> {
        self.get_json("/get_doctor_list").await
    }

    async fn set_availability(
        &self,
        doctor_name: &str,
        status: Availability,
    ) -> Result<AvailabilityResponse, BackendError> {
        let body = AvailabilityUpdate {
            doctor_name: doctor_name.to_string(),
            status,
        };
        self.post_json("/toggle_availability", Some(&body)).await
    }
}

fn classify(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else if e.is_connect() {
        BackendError::Unavailable
    } else {
        BackendError::Request(e)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(BackendError::ApiError {
            status: status.as_u16(),
            message: text,
        });
    }

    let bytes = response.bytes().await.map_err(classify)?;
    serde_json::from_slice(&bytes).map_err(|e| BackendError::Malformed(e.to_string()))
}

// ============================================
// Errors
// ============================================

/// Errors that can occur when communicating with the triage backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Triage backend unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Malformed response: {0}")]
    Malformed(String),
}

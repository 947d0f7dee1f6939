//! HTTP client for the analysis service

use super::{AnalysisRequest, AnalysisService, ServiceError};
use crate::config::Config;
use crate::session::Report;
use reqwest::blocking::multipart::{Form, Part};
use std::time::Duration;

/// Maximum bytes of an error body kept in the error message
const MAX_ERROR_BODY: usize = 300;

/// Analysis service reached over HTTP
///
/// - `POST {base}/heal` multipart upload, returns the report JSON
/// - `GET {base}/download` returns the cleaned artifact
pub struct HttpAnalysisService {
    client: reqwest::blocking::Client,
    base_url: String,
    timeout_secs: u64,
}

impl HttpAnalysisService {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, ServiceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ServiceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::info!(
            "Analysis service client ready: {} (timeout {}s)",
            base_url,
            timeout_secs
        );

        Ok(Self {
            client,
            base_url,
            timeout_secs,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ServiceError> {
        Self::new(config.service_url.clone(), config.request_timeout_secs)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn build_form(request: &AnalysisRequest) -> Result<Form, ServiceError> {
        let file = Part::bytes(request.file.bytes().to_vec())
            .file_name(request.file.name().to_string())
            .mime_str("text/csv")
            .map_err(|e| ServiceError::Network(format!("Invalid upload part: {}", e)))?;

        let mut form = Form::new()
            .part("file", file)
            .text("selected_columns", request.selected_columns_json());

        if let Some(target) = &request.target_column {
            form = form.text("target_column", target.clone());
        }
        Ok(form)
    }

    fn map_send_error(&self, e: reqwest::Error) -> ServiceError {
        if e.is_timeout() {
            ServiceError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            ServiceError::Network(e.to_string())
        }
    }

    /// Turn a non-success status into `ServiceError::Api`
    fn check_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, ServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = crate::util::truncate_utf8_safe(body.trim(), MAX_ERROR_BODY).to_string();

        Err(ServiceError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl AnalysisService for HttpAnalysisService {
    fn name(&self) -> &str {
        &self.base_url
    }

    fn analyze(&self, request: &AnalysisRequest) -> Result<Report, ServiceError> {
        let url = self.endpoint("heal");
        tracing::debug!(
            "POST {} ({} bytes, {} columns, target {:?})",
            url,
            request.file.len(),
            request.selected_columns.len(),
            request.target_column
        );

        let form = Self::build_form(request)?;
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .map_err(|e| self.map_send_error(e))?;
        let response = Self::check_status(response)?;

        let body = response
            .bytes()
            .map_err(|e| self.map_send_error(e))?;
        Report::from_json(&body).map_err(|e| ServiceError::Decode(e.to_string()))
    }

    fn download_cleaned(&self) -> Result<Vec<u8>, ServiceError> {
        let url = self.endpoint("download");
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| self.map_send_error(e))?;
        let response = Self::check_status(response)?;

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| self.map_send_error(e))
    }
}

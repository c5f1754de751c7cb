use crate::auth::AuthMode;
use crate::entrata_models::NormalizedLeadPayload;
use crate::errors::AppError;
use serde::Serialize;
use std::time::Duration;

/// Body of a successful Entrata response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UpstreamResponse {
    Json(serde_json::Value),
    Text(String),
}

impl UpstreamResponse {
    /// JSON when the body parses, otherwise the raw text.
    pub fn from_body(body: String) -> Self {
        match serde_json::from_str(&body) {
            Ok(value) => UpstreamResponse::Json(value),
            Err(_) => UpstreamResponse::Text(body),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, UpstreamResponse::Text(text) if text.trim().is_empty())
    }
}

/// Client for the Entrata leads endpoint.
///
/// One POST per lead; failures are classified and returned, never retried.
#[derive(Clone)]
pub struct EntrataClient {
    client: reqwest::Client,
    leads_url: String,
    auth: AuthMode,
}

impl EntrataClient {
    /// Creates a new `EntrataClient`.
    ///
    /// # Arguments
    ///
    /// * `leads_url` - Fully resolved Entrata leads URL.
    /// * `auth` - Selected authentication mode.
    /// * `timeout` - Total request timeout.
    pub fn new(leads_url: String, auth: AuthMode, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::Configuration(format!("Failed to create Entrata client: {}", e))
            })?;

        Ok(Self {
            client,
            leads_url,
            auth,
        })
    }

    pub fn leads_url(&self) -> &str {
        &self.leads_url
    }

    pub fn auth(&self) -> &AuthMode {
        &self.auth
    }

    /// Sends a lead to Entrata.
    ///
    /// # Returns
    ///
    /// * `Ok(UpstreamResponse)` - 2xx response body, parsed as JSON when possible.
    /// * `Err(AppError::UpstreamRejected)` - non-2xx, raw body preserved.
    /// * `Err(AppError::UpstreamUnreachable)` - transport failure or timeout.
    pub async fn send_lead(
        &self,
        payload: &NormalizedLeadPayload,
    ) -> Result<UpstreamResponse, AppError> {
        tracing::info!(
            "Posting lead to Entrata: {} (auth={})",
            self.leads_url,
            self.auth.label()
        );

        let request = self
            .client
            .post(&self.leads_url)
            .header("Content-Type", "application/json")
            .json(payload);

        let response = self
            .auth
            .apply(request)
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnreachable(format!("Entrata request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::UpstreamUnreachable(format!("Failed to read Entrata response: {}", e)))?;

        if !status.is_success() {
            tracing::warn!("Entrata returned {}: {}", status, body);
            return Err(AppError::UpstreamRejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!("✓ Entrata accepted lead ({})", status);
        Ok(UpstreamResponse::from_body(body))
    }
}

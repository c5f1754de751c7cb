/// Lead forwarding workflow shared by every lead route.
///
/// 1. Resolve fields through the alias tables
/// 2. Validate required fields (no upstream call on failure)
/// 3. Build the Entrata payload for the configured method
/// 4. POST once and classify the response
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

use crate::auth::AuthMode;
use crate::config::{Config, UpstreamMethod};
use crate::entrata_client::{EntrataClient, UpstreamResponse};
use crate::entrata_models::NormalizedLeadPayload;
use crate::errors::AppError;
use crate::lead_models::IncomingLead;

#[derive(Clone)]
pub struct LeadForwarder {
    client: EntrataClient,
    method: UpstreamMethod,
    default_property_id: Option<String>,
    default_lead_source: Option<String>,
}

impl LeadForwarder {
    /// Builds the forwarder from configuration.
    ///
    /// Fails with `AppError::Configuration` when no credential set is usable,
    /// so a misconfigured deployment never starts serving.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let auth = AuthMode::select(config)?;
        let client = EntrataClient::new(
            config.leads_url.clone(),
            auth,
            Duration::from_secs(config.timeout_secs),
        )?;

        tracing::info!(
            "✓ Entrata forwarder ready: {} via {} ({})",
            config.method,
            client.auth().label(),
            client.leads_url()
        );

        Ok(Self {
            client,
            method: config.method,
            default_property_id: config.default_property_id.clone(),
            default_lead_source: config.default_lead_source.clone(),
        })
    }

    pub fn method(&self) -> UpstreamMethod {
        self.method
    }

    /// Resolves, validates and maps a lead without sending it.
    pub fn prepare(
        &self,
        incoming: &IncomingLead,
        now: DateTime<Utc>,
    ) -> Result<NormalizedLeadPayload, AppError> {
        let lead = incoming
            .resolve(self.default_property_id.as_deref())
            .validate()?;

        tracing::debug!(
            "Lead resolved: property={}, email={}",
            lead.property_id,
            lead.email
        );

        NormalizedLeadPayload::build(
            &lead,
            self.client.auth(),
            self.method,
            self.default_lead_source.as_deref(),
            now,
        )
    }

    /// Forwards one lead to Entrata. Single attempt.
    pub async fn forward(&self, incoming: IncomingLead) -> Result<UpstreamResponse, AppError> {
        let span = tracing::info_span!("forward_lead", trace_id = %Uuid::new_v4());

        async move {
            let payload = self.prepare(&incoming, Utc::now())?;
            let start = std::time::Instant::now();
            let result = self.client.send_lead(&payload).await;
            tracing::info!(
                "Entrata call finished in {}ms (ok={})",
                start.elapsed().as_millis(),
                result.is_ok()
            );
            result
        }
        .instrument(span)
        .await
    }
}

use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::normalize::is_truthy;

/// Default Entrata API host when `ENTRATA_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "https://apis.entrata.com";

/// Default outbound timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Which Entrata leads method the payload targets.
///
/// Chosen once per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpstreamMethod {
    #[default]
    SendLeads,
    CreateLead,
}

impl UpstreamMethod {
    pub fn name(&self) -> &'static str {
        match self {
            UpstreamMethod::SendLeads => "sendLeads",
            UpstreamMethod::CreateLead => "createLead",
        }
    }

    pub fn version(&self) -> &'static str {
        match self {
            UpstreamMethod::SendLeads => "r2",
            UpstreamMethod::CreateLead => "r1",
        }
    }
}

impl fmt::Display for UpstreamMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UpstreamMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sendleads" => Ok(UpstreamMethod::SendLeads),
            "createlead" => Ok(UpstreamMethod::CreateLead),
            other => anyhow::bail!(
                "ENTRATA_METHOD must be sendLeads or createLead, got '{}'",
                other
            ),
        }
    }
}

/// Where an API key travels when API key auth is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiKeyPlacement {
    /// `X-Api-Key` transport header.
    #[default]
    Header,
    /// Inside the payload auth block.
    Inline,
}

impl FromStr for ApiKeyPlacement {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "header" => Ok(ApiKeyPlacement::Header),
            "inline" | "body" => Ok(ApiKeyPlacement::Inline),
            other => anyhow::bail!(
                "ENTRATA_API_KEY_PLACEMENT must be header or inline, got '{}'",
                other
            ),
        }
    }
}

/// Immutable service configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Fully resolved URL that leads are POSTed to.
    pub leads_url: String,
    pub api_key: Option<String>,
    pub api_key_placement: ApiKeyPlacement,
    pub username: Option<String>,
    pub password: Option<String>,
    pub basic_auth_in_body: bool,
    pub method: UpstreamMethod,
    pub default_property_id: Option<String>,
    pub default_lead_source: Option<String>,
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match var("PORT") {
            Some(port) => port
                .parse::<u16>()
                .ok()
                .filter(|port| *port > 0)
                .ok_or_else(|| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            None => 3000,
        };

        let leads_url = resolve_leads_url(
            var("ENTRATA_BASE_URL").as_deref(),
            var("ENTRATA_ORG").as_deref(),
            var("ENTRATA_LEADS_URL").as_deref(),
        )?;

        let api_key_placement = var("ENTRATA_API_KEY_PLACEMENT")
            .map(|v| v.parse::<ApiKeyPlacement>())
            .transpose()?
            .unwrap_or_default();

        let method = var("ENTRATA_METHOD")
            .map(|v| v.parse::<UpstreamMethod>())
            .transpose()?
            .unwrap_or_default();

        let timeout_secs = match var("ENTRATA_TIMEOUT_SECS") {
            Some(secs) => secs
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| anyhow::anyhow!("ENTRATA_TIMEOUT_SECS must be a positive number"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let config = Self {
            port,
            leads_url,
            api_key: var("ENTRATA_API_KEY"),
            api_key_placement,
            username: var("ENTRATA_USERNAME"),
            password: var("ENTRATA_PASSWORD"),
            basic_auth_in_body: var("ENTRATA_BASIC_AUTH_IN_BODY")
                .map(|v| is_truthy(&v))
                .unwrap_or(false),
            method,
            default_property_id: var("ENTRATA_DEFAULT_PROPERTY_ID"),
            default_lead_source: var("ENTRATA_DEFAULT_LEAD_SOURCE"),
            timeout_secs,
        };

        // Log successful configuration load (without sensitive values)
        tracing::debug!("Entrata leads URL: {}", config.leads_url);
        tracing::debug!("Entrata method: {}", config.method);
        tracing::debug!(
            "Credentials present: api_key={}, basic={}",
            config.api_key.is_some(),
            config.username.is_some() && config.password.is_some()
        );
        if let Some(ref property_id) = config.default_property_id {
            tracing::info!("Default property ID configured: {}", property_id);
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

/// Works out the leads endpoint.
///
/// An explicit override wins. Otherwise the base URL is joined with the
/// org-scoped path when an org is known, or the generic `/ext/leads` path.
pub fn resolve_leads_url(
    base_url: Option<&str>,
    org: Option<&str>,
    override_url: Option<&str>,
) -> anyhow::Result<String> {
    let url = match override_url {
        Some(url) => url.to_string(),
        None => {
            let base = base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');
            match org {
                Some(org) => format!("{}/ext/orgs/{}/v1/leads", base, org),
                None => format!("{}/ext/leads", base),
            }
        }
    };

    let parsed = Url::parse(&url).map_err(|e| anyhow::anyhow!("Invalid leads URL '{}': {}", url, e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("Entrata URL must start with http:// or https://");
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("ENTRATA_API_KEY", "k")])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.leads_url, "https://apis.entrata.com/ext/leads");
        assert_eq!(config.method, UpstreamMethod::SendLeads);
        assert_eq!(config.api_key_placement, ApiKeyPlacement::Header);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(!config.basic_auth_in_body);
    }

    #[test]
    fn test_org_scoped_url() {
        let config = Config::from_lookup(lookup(&[
            ("ENTRATA_BASE_URL", "https://apis.entrata.com/"),
            ("ENTRATA_ORG", "acme"),
        ]))
        .unwrap();
        assert_eq!(
            config.leads_url,
            "https://apis.entrata.com/ext/orgs/acme/v1/leads"
        );
    }

    #[test]
    fn test_override_url_wins() {
        let config = Config::from_lookup(lookup(&[
            ("ENTRATA_ORG", "acme"),
            ("ENTRATA_LEADS_URL", "https://acme.entrata.com/api/v1/leads"),
        ]))
        .unwrap();
        assert_eq!(config.leads_url, "https://acme.entrata.com/api/v1/leads");
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = Config::from_lookup(lookup(&[("ENTRATA_API_KEY", "   ")])).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Config::from_lookup(lookup(&[("PORT", "abc")])).is_err());
        assert!(Config::from_lookup(lookup(&[("PORT", "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[("PORT", "65536")])).is_err());
        assert!(Config::from_lookup(lookup(&[("ENTRATA_METHOD", "deleteLead")])).is_err());
        assert!(Config::from_lookup(lookup(&[("ENTRATA_TIMEOUT_SECS", "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[("ENTRATA_BASE_URL", "ftp://x")])).is_err());
    }

    #[test]
    fn test_method_parsing_is_case_insensitive() {
        assert_eq!(
            "CreateLead".parse::<UpstreamMethod>().unwrap(),
            UpstreamMethod::CreateLead
        );
        assert_eq!(
            "inline".parse::<ApiKeyPlacement>().unwrap(),
            ApiKeyPlacement::Inline
        );
    }
}

use serde::Serialize;

use crate::config::{ApiKeyPlacement, Config};
use crate::errors::AppError;

/// Header Entrata reads the API key from.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// How requests authenticate against Entrata.
///
/// Selected once from [`Config`] at startup.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// Key in the `X-Api-Key` header, bare `{type: apikey}` block.
    ApiKeyHeader { key: String },
    /// Key inside the payload auth block, no key header.
    ApiKeyInline { key: String },
    /// `Authorization: Basic` header, optionally echoed in the auth block.
    Basic {
        username: String,
        password: String,
        in_body: bool,
    },
}

// Credentials stay out of logs.
impl std::fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMode::ApiKeyHeader { .. } => f.write_str("ApiKeyHeader"),
            AuthMode::ApiKeyInline { .. } => f.write_str("ApiKeyInline"),
            AuthMode::Basic { in_body, .. } => {
                f.debug_struct("Basic").field("in_body", in_body).finish()
            }
        }
    }
}

/// The `auth` object at the top of an Entrata request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthBlock {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl AuthMode {
    /// Picks the auth mode from configured credentials.
    ///
    /// An API key always wins; otherwise a complete username/password pair is
    /// required.
    pub fn select(config: &Config) -> Result<Self, AppError> {
        if let Some(key) = &config.api_key {
            let key = key.clone();
            return Ok(match config.api_key_placement {
                ApiKeyPlacement::Header => AuthMode::ApiKeyHeader { key },
                ApiKeyPlacement::Inline => AuthMode::ApiKeyInline { key },
            });
        }

        match (&config.username, &config.password) {
            (Some(username), Some(password)) => Ok(AuthMode::Basic {
                username: username.clone(),
                password: password.clone(),
                in_body: config.basic_auth_in_body,
            }),
            _ => Err(AppError::Configuration(
                "ENTRATA_API_KEY or ENTRATA_USERNAME and ENTRATA_PASSWORD required".to_string(),
            )),
        }
    }

    pub fn auth_block(&self) -> AuthBlock {
        match self {
            AuthMode::ApiKeyHeader { .. } => AuthBlock {
                kind: "apikey",
                key: None,
                username: None,
                password: None,
            },
            AuthMode::ApiKeyInline { key } => AuthBlock {
                kind: "apikey",
                key: Some(key.clone()),
                username: None,
                password: None,
            },
            AuthMode::Basic {
                username,
                password,
                in_body,
            } => AuthBlock {
                kind: "basic",
                key: None,
                username: in_body.then(|| username.clone()),
                password: in_body.then(|| password.clone()),
            },
        }
    }

    /// Attaches the transport-level credential, if this mode has one.
    pub fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            AuthMode::ApiKeyHeader { key } => request.header(API_KEY_HEADER, key),
            AuthMode::ApiKeyInline { .. } => request,
            AuthMode::Basic {
                username, password, ..
            } => request.basic_auth(username, Some(password)),
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            AuthMode::ApiKeyHeader { .. } => "apikey-header",
            AuthMode::ApiKeyInline { .. } => "apikey-inline",
            AuthMode::Basic { .. } => "basic",
        }
    }
}

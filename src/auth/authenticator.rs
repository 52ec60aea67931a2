//! Authenticator implementation
//!
//! Handles applying authentication to requests and performing the one-time
//! session login for session-based endpoints.

use super::types::{AuthConfig, Location, SessionToken};
use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Authenticator handles applying authentication to HTTP requests
pub struct Authenticator {
    /// Auth configuration
    config: AuthConfig,
    /// Session artifact for session auth, populated on first use
    session: Arc<RwLock<Option<SessionToken>>>,
    /// HTTP client for the login request
    http_client: Client,
}

impl Authenticator {
    /// Create a new authenticator with the given config
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            session: Arc::new(RwLock::new(None)),
            http_client: Client::new(),
        }
    }

    /// Create an authenticator with a custom HTTP client
    pub fn with_client(config: AuthConfig, http_client: Client) -> Self {
        Self {
            config,
            session: Arc::new(RwLock::new(None)),
            http_client,
        }
    }

    /// Eagerly establish the session artifact where the scheme needs one.
    ///
    /// For non-session schemes this is a no-op. Called once by the engine
    /// during its authenticating phase so that credential failures surface
    /// before the first data request.
    pub async fn prime(&self) -> Result<()> {
        if matches!(self.config, AuthConfig::Session { .. }) {
            self.get_or_login().await?;
        }
        Ok(())
    }

    /// Apply authentication to a request builder
    pub async fn apply(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        match &self.config {
            AuthConfig::None => Ok(req),

            AuthConfig::Basic { username, password } => {
                // Built by hand rather than with basic_auth so that the header
                // matches what the upstream scripts send byte for byte.
                let credentials = BASE64.encode(format!("{username}:{password}"));
                Ok(req.header("Authorization", format!("Basic {credentials}")))
            }

            AuthConfig::ApiKey {
                location,
                header_name,
                query_param,
                prefix,
                value,
            } => {
                let val = format!("{}{}", prefix.as_deref().unwrap_or(""), value);
                match location {
                    Location::Header => {
                        let header = header_name.as_deref().unwrap_or("Authorization");
                        Ok(req.header(header, val))
                    }
                    Location::Query => {
                        let param = query_param.as_deref().unwrap_or("api_key");
                        Ok(req.query(&[(param, val)]))
                    }
                }
            }

            AuthConfig::Bearer { token } => Ok(req.bearer_auth(token)),

            AuthConfig::Session {
                token_header,
                token_prefix,
                ..
            } => {
                let session = self.get_or_login().await?;
                let val = format!(
                    "{}{}",
                    token_prefix.as_deref().unwrap_or(""),
                    session.token
                );
                Ok(req.header(token_header.as_str(), val))
            }
        }
    }

    /// Get the run-scoped session token, logging in on first use
    async fn get_or_login(&self) -> Result<SessionToken> {
        {
            let cached = self.session.read().await;
            if let Some(token) = cached.as_ref() {
                return Ok(token.clone());
            }
        }

        let mut cached = self.session.write().await;

        // Double-check after acquiring write lock (another task might have logged in)
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        let token = self.login().await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    /// Perform the login request and extract the session token
    async fn login(&self) -> Result<SessionToken> {
        let AuthConfig::Session {
            login_url,
            login_method,
            login_body,
            token_path,
            ..
        } = &self.config
        else {
            return Err(Error::auth("Login not supported for this auth scheme"));
        };

        let response = self
            .http_client
            .request(login_method.clone(), login_url)
            .json(login_body)
            .send()
            .await
            .map_err(Error::Http)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::auth(format!(
                "Login request failed with status {status}: {body}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::auth(format!("Unparseable login response: {e}")))?;

        let token = extract_json_path(&body, token_path).ok_or_else(|| {
            Error::auth(format!("Could not extract session token from path: {token_path}"))
        })?;

        Ok(SessionToken::new(token))
    }

    /// Clear the session artifact (useful for testing)
    pub async fn clear_session(&self) {
        let mut cached = self.session.write().await;
        *cached = None;
    }

    /// Get the current auth config
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

/// Extract a scalar from JSON using a simple dotted path expression.
/// Supports basic paths like "$.response.token" or "response.token".
pub fn extract_json_path(value: &Value, path: &str) -> Option<String> {
    match extract_json_value(value, path)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Extract an arbitrary JSON value using a simple dotted path expression.
pub fn extract_json_value(value: &Value, path: &str) -> Option<Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() {
        return Some(value.clone());
    }

    let mut current = value;
    for part in path.split('.') {
        match current {
            Value::Object(map) => {
                current = map.get(part)?;
            }
            _ => return None,
        }
    }

    Some(current.clone())
}

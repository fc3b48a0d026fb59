//! Logitech cloud authentication client.
//!
//! Async HTTP client using `reqwest`; posts the account credentials as JSON
//! and pulls the login token out of the nested result object.

use std::fmt;

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use harmony_protocol::constants::AUTH_URL;
use harmony_protocol::types::LoginToken;

/// Errors from the credential exchange. None of them carries a token.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("auth endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response has no GetUserAuthTokenResult object")]
    MissingResult,

    #[error("response has no UserAuthToken")]
    MissingToken,
}

/// Account credentials for the Logitech cloud.
#[derive(Clone)]
pub struct Credential {
    pub identity: String,
    pub secret: String,
}

impl Credential {
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("identity", &self.identity)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize)]
struct AuthRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthResponse {
    #[serde(rename = "GetUserAuthTokenResult")]
    result: Option<AuthResult>,
}

#[derive(Deserialize)]
struct AuthResult {
    #[serde(rename = "UserAuthToken")]
    token: Option<String>,
}

/// Client for the credential exchange endpoint.
pub struct AuthClient {
    http: reqwest::Client,
    auth_url: String,
}

impl AuthClient {
    /// Creates a client for the default Logitech endpoint.
    pub fn new() -> Result<Self, CredentialError> {
        Self::with_url(AUTH_URL)
    }

    /// Creates a client for a custom endpoint.
    pub fn with_url(url: impl Into<String>) -> Result<Self, CredentialError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            auth_url: url.into(),
        })
    }

    /// Exchanges account credentials for a login token.
    pub async fn exchange(&self, credential: &Credential) -> Result<LoginToken, CredentialError> {
        let body = serde_json::to_vec(&AuthRequest {
            email: &credential.identity,
            password: &credential.secret,
        })?;

        let resp = self
            .http
            .post(&self.auth_url)
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/json; charset=utf-8"),
            )
            .body(body)
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();

        if status.as_u16() != 200 {
            error!(status = status.as_u16(), body = %text, "auth endpoint rejected credentials");
            return Err(CredentialError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let token = parse_token(&text).inspect_err(|e| {
            error!(error = %e, body = %text, "malformed auth response");
        })?;
        debug!(identity = %credential.identity, "received login token");
        Ok(token)
    }
}

/// Pulls `GetUserAuthTokenResult.UserAuthToken` out of a response body.
fn parse_token(body: &str) -> Result<LoginToken, CredentialError> {
    let resp: AuthResponse = serde_json::from_str(body)?;
    let result = resp.result.ok_or(CredentialError::MissingResult)?;
    match result.token {
        Some(token) if !token.is_empty() => Ok(LoginToken::new(token)),
        _ => Err(CredentialError::MissingToken),
    }
}

//! First hop: authorization code -> Microsoft access token.

use async_trait::async_trait;
use mcid_core::{pt, IntoJsonError};
use serde::Deserialize;

use crate::{
    config::{ProviderConfig, SCOPE_SEPARATOR},
    errors::CodeExchangeError,
    traits::{HttpTransport, UpstreamAuthenticator},
    types::{SecretString, UpstreamToken},
    urls,
};

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    scope: Option<String>,
    token_type: Option<String>,
}

#[derive(Deserialize)]
struct OAuthErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

/// Exchanges authorization codes at the Microsoft token endpoint
/// (see [`urls::token_url`]).
#[derive(Debug, Clone)]
pub struct LiveAuthenticator<T> {
    transport: T,
    config: ProviderConfig,
    token_url: String,
}

impl<T: HttpTransport> LiveAuthenticator<T> {
    pub fn new(transport: T, config: ProviderConfig) -> Self {
        let token_url = urls::token_url(&config);
        Self {
            transport,
            config,
            token_url,
        }
    }

    /// Use another token endpoint than the one derived from the config.
    #[must_use]
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }
}

#[async_trait]
impl<T: HttpTransport> UpstreamAuthenticator for LiveAuthenticator<T> {
    async fn exchange_code(&self, code: &str) -> Result<UpstreamToken, CodeExchangeError> {
        pt!("Exchanging Microsoft authorization code");
        let scope = self.config.formatted_scopes();
        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("scope", scope.as_str()),
        ];
        let response = self.transport.post_form(&self.token_url, &form).await?;

        if !response.is_success() {
            let details = serde_json::from_str::<OAuthErrorResponse>(&response.body).ok();
            let (error, description) = details
                .map(|n| (n.error, n.error_description))
                .unwrap_or_default();
            return Err(CodeExchangeError::Status {
                status: response.status,
                error,
                description,
            });
        }

        let parsed = serde_json::from_str::<TokenResponse>(&response.body);
        let token: TokenResponse = parsed.json(response.body)?;
        let access_token = token
            .access_token
            .filter(|n| !n.is_empty())
            .ok_or(CodeExchangeError::MissingAccessToken)?;

        Ok(UpstreamToken {
            access_token: SecretString::new(access_token),
            refresh_token: token.refresh_token.map(SecretString::new),
            expires_in: token.expires_in,
            approved_scopes: token
                .scope
                .map(|n| {
                    n.split(SCOPE_SEPARATOR)
                        .filter(|n| !n.is_empty())
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
            token_type: token.token_type,
        })
    }
}

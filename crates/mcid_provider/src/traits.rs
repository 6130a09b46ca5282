//! Seams of the provider: the HTTP transport, the first hop,
//! and the identity provider contract itself.

use async_trait::async_trait;
use mcid_core::RequestError;

use crate::{
    errors::{CodeExchangeError, Result},
    types::{AuthenticatedUser, UpstreamToken, UserRecord},
};

/// A response that made it back, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The HTTP capability the provider needs.
///
/// Implemented for [`reqwest::Client`]; connection pooling,
/// TLS and timeouts are the implementation's business.
/// Must be safe to share between concurrent logins.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// `POST` a JSON body, accepting JSON back.
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> std::result::Result<HttpResponse, RequestError>;

    /// `POST` an `application/x-www-form-urlencoded` body.
    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> std::result::Result<HttpResponse, RequestError>;

    /// `GET` with an `Authorization: Bearer <token>` header.
    async fn get_bearer(
        &self,
        url: &str,
        token: &str,
    ) -> std::result::Result<HttpResponse, RequestError>;
}

/// The first OAuth hop: trading an authorization code
/// for a Microsoft access token.
#[async_trait]
pub trait UpstreamAuthenticator: Send + Sync {
    async fn exchange_code(&self, code: &str)
        -> std::result::Result<UpstreamToken, CodeExchangeError>;
}

/// What a web framework needs from an OAuth identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Unique provider identifier.
    fn identifier(&self) -> &'static str;

    /// Where to redirect the user to sign in.
    fn authorize_url(&self, state: &str) -> String;

    /// Finish the login from the `code` the user was redirected back with.
    async fn user(&self, code: &str) -> Result<AuthenticatedUser>;

    /// Log in with an already obtained Microsoft access token.
    async fn user_from_token(&self, token: &str) -> Result<UserRecord>;
}

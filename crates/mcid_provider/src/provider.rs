//! The Microsoft → Minecraft identity provider

use async_trait::async_trait;
use mcid_core::info;

use crate::{
    config::{Endpoints, ProviderConfig},
    errors::Result,
    exchange::TokenExchange,
    traits::{HttpTransport, IdentityProvider, UpstreamAuthenticator},
    types::{AuthenticatedUser, UserRecord},
    upstream::LiveAuthenticator,
    urls,
};

/// Unique provider identifier.
pub const IDENTIFIER: &str = "MICROSOFT";

/// Signs users in with their Microsoft account and
/// resolves them to their Minecraft profile.
///
/// The first hop (authorization code -> Microsoft token) is
/// whatever [`UpstreamAuthenticator`] it's built with,
/// [`LiveAuthenticator`] by default.
pub struct MinecraftProvider<T, U> {
    config: ProviderConfig,
    upstream: U,
    exchange: TokenExchange<T>,
}

impl<T: HttpTransport + Clone> MinecraftProvider<T, LiveAuthenticator<T>> {
    /// Both hops share `transport`.
    pub fn new(config: ProviderConfig, transport: T) -> Self {
        let upstream = LiveAuthenticator::new(transport.clone(), config.clone());
        Self::with_upstream(config, upstream, TokenExchange::new(transport))
    }
}

impl MinecraftProvider<reqwest::Client, LiveAuthenticator<reqwest::Client>> {
    /// Uses the shared [`mcid_core::CLIENT`].
    #[must_use]
    pub fn with_default_client(config: ProviderConfig) -> Self {
        Self::new(config, mcid_core::CLIENT.clone())
    }
}

impl<T: HttpTransport, U: UpstreamAuthenticator> MinecraftProvider<T, U> {
    pub fn with_upstream(config: ProviderConfig, upstream: U, exchange: TokenExchange<T>) -> Self {
        Self {
            config,
            upstream,
            exchange,
        }
    }

    /// Point the Xbox Live/Minecraft chain at other endpoints.
    #[must_use]
    pub fn with_endpoints(self, endpoints: Endpoints) -> Self
    where
        T: Clone,
    {
        let exchange = TokenExchange::with_endpoints(self.exchange.transport().clone(), endpoints);
        Self { exchange, ..self }
    }

    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    #[must_use]
    pub fn exchange(&self) -> &TokenExchange<T> {
        &self.exchange
    }

    #[must_use]
    pub fn upstream(&self) -> &U {
        &self.upstream
    }

    #[must_use]
    pub fn authorize_url(&self, state: &str) -> String {
        urls::authorize_url(&self.config, state)
    }

    #[must_use]
    pub fn token_url(&self) -> String {
        urls::token_url(&self.config)
    }

    /// Finish a login: exchange the `code` the user came back
    /// with, then walk the Xbox Live → Minecraft chain.
    ///
    /// # Errors
    /// [`crate::ProviderError::CodeExchange`] if the code is rejected,
    /// [`crate::ProviderError::Exchange`] if any step of the chain fails.
    pub async fn user_from_code(&self, code: &str) -> Result<AuthenticatedUser> {
        info!("Finishing Microsoft sign-in ({IDENTIFIER})");
        let upstream = self.upstream.exchange_code(code).await?;
        let user = self
            .exchange
            .authenticate(upstream.access_token.expose_secret())
            .await?;
        Ok(AuthenticatedUser { user, upstream })
    }

    /// Walk the Xbox Live → Minecraft chain with a Microsoft
    /// access token obtained elsewhere.
    ///
    /// # Errors
    /// [`crate::ProviderError::Exchange`] if any step fails.
    pub async fn user_from_token(&self, token: &str) -> Result<UserRecord> {
        Ok(self.exchange.authenticate(token).await?)
    }
}

#[async_trait]
impl<T: HttpTransport, U: UpstreamAuthenticator> IdentityProvider for MinecraftProvider<T, U> {
    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn authorize_url(&self, state: &str) -> String {
        MinecraftProvider::authorize_url(self, state)
    }

    async fn user(&self, code: &str) -> Result<AuthenticatedUser> {
        self.user_from_code(code).await
    }

    async fn user_from_token(&self, token: &str) -> Result<UserRecord> {
        MinecraftProvider::user_from_token(self, token).await
    }
}

//! # mcid_provider
//!
//! A "Sign in with Microsoft" identity provider that resolves
//! users to their Minecraft: Java Edition profile.
//!
//! Signing in takes five requests:
//! 1. Authorization code -> Microsoft access token ([`LiveAuthenticator`])
//! 2. Microsoft token -> Xbox Live user token
//! 3. Xbox Live user token -> XSTS token
//! 4. XSTS token + user hash -> Minecraft access token
//! 5. Minecraft access token -> profile
//!
//! Steps 2 to 5 are the [`TokenExchange`] chain.
//!
//! ```no_run
//! use mcid_provider::{MinecraftProvider, ProviderConfig};
//!
//! # async fn run() -> mcid_provider::Result<()> {
//! let config = ProviderConfig::new("client-id", "client-secret", "https://example.com/cb");
//! let provider = MinecraftProvider::with_default_client(config);
//!
//! // Redirect the user here...
//! let url = provider.authorize_url("random-state");
//! # let code = "";
//! // ...and finish with the `code` they come back with.
//! let user = provider.user_from_code(code).await?;
//! println!("{} ({})", user.name(), user.id());
//! # Ok(())
//! # }
//! ```

mod config;
mod errors;
mod exchange;
mod provider;
mod traits;
mod transport;
mod types;
mod upstream;
pub mod urls;

#[cfg(test)]
mod testing;

pub use config::{
    Endpoints, ProviderConfig, DEFAULT_SCOPES, DEFAULT_TENANT, MINECRAFT_LOGIN_WITH_XBOX,
    MINECRAFT_PROFILE, SCOPE_SEPARATOR, XBOX_USER_AUTHENTICATE, XBOX_XSTS_AUTHORIZE,
};
pub use errors::{
    CodeExchangeError, ConfigError, ExchangeError, ProviderError, Result, Step, XboxIssue,
};
pub use exchange::{identity_token, TokenExchange};
pub use provider::{MinecraftProvider, IDENTIFIER};
pub use traits::{HttpResponse, HttpTransport, IdentityProvider, UpstreamAuthenticator};
pub use types::{AuthenticatedUser, SecretString, UpstreamToken, UserRecord};
pub use upstream::LiveAuthenticator;

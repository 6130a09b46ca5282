use std::collections::HashMap;

use mcid_core::IntoJsonError;
use serde::{Deserialize, Serialize};

use crate::{errors::ConfigError, types::SecretString};

/// Tenant used when none is configured.
pub const DEFAULT_TENANT: &str = "consumers";
/// Scopes requested on the first hop when none are configured.
pub const DEFAULT_SCOPES: &[&str] = &["XboxLive.signin"];
pub const SCOPE_SEPARATOR: &str = " ";

pub const XBOX_USER_AUTHENTICATE: &str = "https://user.auth.xboxlive.com/user/authenticate";
pub const XBOX_XSTS_AUTHORIZE: &str = "https://xsts.auth.xboxlive.com/xsts/authorize";
pub const MINECRAFT_LOGIN_WITH_XBOX: &str =
    "https://api.minecraftservices.com/authentication/login_with_xbox";
pub const MINECRAFT_PROFILE: &str = "https://api.minecraftservices.com/minecraft/profile";

/// Configuration of the Microsoft OAuth client.
///
/// # Why `Option`?
///
/// `tenant` and `scopes` may be left out of the config file,
/// in which case they resolve to [`DEFAULT_TENANT`]
/// and [`DEFAULT_SCOPES`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Application (client) ID from the Azure app registration.
    pub client_id: String,
    pub client_secret: SecretString,
    /// Where Microsoft sends the user back to with `?code=`.
    pub redirect_uri: String,

    /// Branded sign-in tenant. See [`crate::urls`] for
    /// how it affects the first hop endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
}

impl ProviderConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<SecretString>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            tenant: None,
            scopes: None,
        }
    }

    #[must_use]
    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    #[must_use]
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    /// Config keys this provider reads on top of
    /// `client_id`, `client_secret` and `redirect_uri`.
    #[must_use]
    pub fn additional_config_keys() -> &'static [&'static str] {
        &["tenant"]
    }

    /// Parse and validate a JSON config.
    ///
    /// # Errors
    /// If the JSON is invalid, or a required key is missing or empty.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).json(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Build from a flat key/value map, as handed over by
    /// web frameworks. Unknown keys are ignored.
    /// `scopes`, if present, is split on whitespace.
    ///
    /// # Errors
    /// If a required key is missing or empty.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &'static str| map.get(key).ok_or(ConfigError::MissingKey(key));

        let config = Self {
            client_id: get("client_id")?.clone(),
            client_secret: SecretString::new(get("client_secret")?.as_str()),
            redirect_uri: get("redirect_uri")?.clone(),
            tenant: map.get("tenant").cloned(),
            scopes: map
                .get("scopes")
                .map(|n| n.split_whitespace().map(str::to_owned).collect()),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::EmptyKey("client_id"));
        }
        if self.client_secret.is_empty() {
            return Err(ConfigError::EmptyKey("client_secret"));
        }
        if self.redirect_uri.trim().is_empty() {
            return Err(ConfigError::EmptyKey("redirect_uri"));
        }
        Ok(())
    }

    /// The configured tenant. An empty string counts as unset.
    #[must_use]
    pub fn tenant(&self) -> Option<&str> {
        self.tenant.as_deref().filter(|n| !n.trim().is_empty())
    }

    #[must_use]
    pub fn resolved_tenant(&self) -> &str {
        self.tenant().unwrap_or(DEFAULT_TENANT)
    }

    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        match &self.scopes {
            Some(scopes) if !scopes.is_empty() => scopes.iter().map(String::as_str).collect(),
            _ => DEFAULT_SCOPES.to_vec(),
        }
    }

    /// Scopes joined with [`SCOPE_SEPARATOR`], ready for a query string.
    #[must_use]
    pub fn formatted_scopes(&self) -> String {
        self.scopes().join(SCOPE_SEPARATOR)
    }
}

/// URLs of the Xbox Live → Minecraft chain.
///
/// Defaults to the production services; point it somewhere
/// else for proxies or tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub xbox_user_authenticate: String,
    pub xsts_authorize: String,
    pub minecraft_login: String,
    pub minecraft_profile: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            xbox_user_authenticate: XBOX_USER_AUTHENTICATE.to_owned(),
            xsts_authorize: XBOX_XSTS_AUTHORIZE.to_owned(),
            minecraft_login: MINECRAFT_LOGIN_WITH_XBOX.to_owned(),
            minecraft_profile: MINECRAFT_PROFILE.to_owned(),
        }
    }
}

impl Endpoints {
    /// All four endpoints on one host, keeping the production paths.
    ///
    /// ```
    /// let endpoints = mcid_provider::Endpoints::with_base("http://127.0.0.1:8080/");
    /// assert_eq!(endpoints.xsts_authorize, "http://127.0.0.1:8080/xsts/authorize");
    /// ```
    #[must_use]
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            xbox_user_authenticate: format!("{base}/user/authenticate"),
            xsts_authorize: format!("{base}/xsts/authorize"),
            minecraft_login: format!("{base}/authentication/login_with_xbox"),
            minecraft_profile: format!("{base}/minecraft/profile"),
        }
    }
}

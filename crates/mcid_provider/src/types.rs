//! Core types for the provider

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::ExchangeError;

/// A string that is wiped from memory when dropped
/// and never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", mcid_core::print::redact_secret(&self.0))
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// The result of the first OAuth hop: a Microsoft access token
/// and whatever else the token endpoint handed out with it.
#[derive(Debug, Clone)]
pub struct UpstreamToken {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    /// Seconds until `access_token` expires.
    pub expires_in: Option<u64>,
    /// Scopes the user actually approved.
    pub approved_scopes: Vec<String>,
    pub token_type: Option<String>,
}

impl UpstreamToken {
    /// A bare access token, e.g. one obtained by some other flow.
    pub fn bare(access_token: impl Into<SecretString>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_in: None,
            approved_scopes: Vec::new(),
            token_type: None,
        }
    }
}

/// A Minecraft player, normalized from the raw
/// `/minecraft/profile` response.
///
/// `id` and `name` are copied verbatim, the full response
/// stays available through [`UserRecord::raw`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    id: String,
    name: String,
    raw: Map<String, Value>,
}

impl UserRecord {
    /// Map a raw profile.
    ///
    /// # Errors
    /// [`ExchangeError::Mapping`] if `id` or `name`
    /// is absent (or isn't a string).
    pub fn from_profile(raw: Map<String, Value>) -> Result<Self, ExchangeError> {
        let id = required_str(&raw, "id")?;
        let name = required_str(&raw, "name")?;
        Ok(Self { id, name, raw })
    }

    /// The player's UUID (without dashes, as Minecraft sends it).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The player's in-game name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    #[must_use]
    pub fn skins(&self) -> &[Value] {
        self.array_field("skins")
    }

    #[must_use]
    pub fn capes(&self) -> &[Value] {
        self.array_field("capes")
    }

    #[must_use]
    pub fn into_raw(self) -> Map<String, Value> {
        self.raw
    }

    fn array_field(&self, key: &str) -> &[Value] {
        self.raw
            .get(key)
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice)
    }
}

fn required_str(raw: &Map<String, Value>, field: &'static str) -> Result<String, ExchangeError> {
    raw.get(field)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or(ExchangeError::Mapping { field })
}

/// A logged in user together with the Microsoft token
/// they logged in with.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: UserRecord,
    pub upstream: UpstreamToken,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn id(&self) -> &str {
        self.user.id()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.user.name()
    }

    #[must_use]
    pub fn token(&self) -> &SecretString {
        &self.upstream.access_token
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<&SecretString> {
        self.upstream.refresh_token.as_ref()
    }
}

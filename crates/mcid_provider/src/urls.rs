//! First hop URLs (Microsoft sign-in).
//!
//! For the `consumers` tenant (also what an unset tenant resolves to)
//! the classic Live endpoints are used:
//!
//! - `https://login.live.com/oauth20_authorize.srf`
//! - `https://login.live.com/oauth20_token.srf`
//!
//! Any other tenant goes to the Microsoft identity platform
//! endpoints instead, with the tenant as path segment:
//!
//! - `https://login.microsoftonline.com/{tenant}/oauth2/v2.0/authorize`
//! - `https://login.microsoftonline.com/{tenant}/oauth2/v2.0/token`

use crate::config::{ProviderConfig, DEFAULT_TENANT};

pub const LIVE_AUTHORIZE_URL: &str = "https://login.live.com/oauth20_authorize.srf";
pub const LIVE_TOKEN_URL: &str = "https://login.live.com/oauth20_token.srf";
pub const IDENTITY_PLATFORM_BASE: &str = "https://login.microsoftonline.com";

/// The tenant to put in an identity platform URL, or `None`
/// when the Live endpoints serve it.
fn platform_tenant(config: &ProviderConfig) -> Option<&str> {
    let tenant = config.resolved_tenant().trim();
    (!tenant.eq_ignore_ascii_case(DEFAULT_TENANT)).then_some(tenant)
}

#[must_use]
pub fn authorize_endpoint(config: &ProviderConfig) -> String {
    match platform_tenant(config) {
        Some(tenant) => identity_platform_url(tenant, "authorize"),
        None => LIVE_AUTHORIZE_URL.to_owned(),
    }
}

#[must_use]
pub fn token_url(config: &ProviderConfig) -> String {
    match platform_tenant(config) {
        Some(tenant) => identity_platform_url(tenant, "token"),
        None => LIVE_TOKEN_URL.to_owned(),
    }
}

fn identity_platform_url(tenant: &str, action: &str) -> String {
    format!(
        "{IDENTITY_PLATFORM_BASE}/{}/oauth2/v2.0/{action}",
        urlencoding::encode(tenant)
    )
}

/// The URL to send the user to, with `state` echoed back
/// on the redirect.
#[must_use]
pub fn authorize_url(config: &ProviderConfig, state: &str) -> String {
    let scope = config.formatted_scopes();
    let fields = [
        ("client_id", config.client_id.as_str()),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("scope", scope.as_str()),
        ("response_type", "code"),
        ("state", state),
    ];
    build_url_from_base(&authorize_endpoint(config), &fields)
}

fn build_url_from_base(base: &str, fields: &[(&str, &str)]) -> String {
    let query = fields
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}{query}")
}

//! # mcid_core
//!
//! Shared plumbing for the Minecraft identity provider crates:
//! terminal/file logging with secret redaction ([`print`]),
//! error helpers for JSON and HTTP failures, and the shared
//! HTTP [`CLIENT`].

use std::sync::LazyLock;

mod error;
pub mod print;

pub use error::{IntoJsonError, JsonError, RequestError};

/// User agent sent with every request made through [`CLIENT`].
pub const USER_AGENT: &str = concat!("mcid/", env!("CARGO_PKG_VERSION"));

/// A lazily built, shared [`reqwest::Client`].
///
/// Cloning a `reqwest::Client` is cheap (it's an `Arc` internally),
/// so hand out `CLIENT.clone()` freely instead of building new ones.
pub static CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| build_client(USER_AGENT));

/// Falls back to a default client (without `user_agent`)
/// if the builder fails.
fn build_client(user_agent: &str) -> reqwest::Client {
    match reqwest::Client::builder().user_agent(user_agent).build() {
        Ok(client) => client,
        Err(error) => {
            crate::err!("Couldn't build HTTP client, using defaults: {error}");
            reqwest::Client::default()
        }
    }
}

//! Error types for the provider

use std::fmt::Display;

use mcid_core::{JsonError, RequestError};

/// One hop of the Xbox Live → Minecraft token chain.
///
/// Steps always run in this order, each one consuming
/// the output of the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// A: Microsoft token -> Xbox Live user token + user hash
    XboxUser,
    /// B: Xbox Live user token -> XSTS token
    Xsts,
    /// C: user hash + XSTS token -> Minecraft access token
    MinecraftLogin,
    /// D: Minecraft access token -> profile
    Profile,
}

impl Step {
    pub const ALL: [Step; 4] = [
        Step::XboxUser,
        Step::Xsts,
        Step::MinecraftLogin,
        Step::Profile,
    ];

    /// The step's letter, `'A'` to `'D'`.
    #[must_use]
    pub fn letter(self) -> char {
        match self {
            Step::XboxUser => 'A',
            Step::Xsts => 'B',
            Step::MinecraftLogin => 'C',
            Step::Profile => 'D',
        }
    }

    /// 1-based position in the chain.
    #[must_use]
    pub fn number(self) -> usize {
        match self {
            Step::XboxUser => 1,
            Step::Xsts => 2,
            Step::MinecraftLogin => 3,
            Step::Profile => 4,
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Step::XboxUser => "Xbox Live user authentication",
            Step::Xsts => "Xbox Live security token",
            Step::MinecraftLogin => "Minecraft login",
            Step::Profile => "Minecraft profile",
        }
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "step {} ({})", self.letter(), self.description())
    }
}

/// Why Xbox Live refused an account, decoded from the
/// `XErr` field of a 401 response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XboxIssue {
    /// The Microsoft account has no Xbox profile yet.
    NoXboxAccount,
    /// Xbox Live isn't available in the account's country.
    CountryUnavailable,
    /// Adult verification is needed (South Korea).
    AdultVerificationRequired,
    /// Child account, needs to be added to a Microsoft family.
    ChildAccount,
    Other(u64),
}

impl XboxIssue {
    #[must_use]
    pub fn from_xerr(code: u64) -> Self {
        match code {
            2_148_916_233 => XboxIssue::NoXboxAccount,
            2_148_916_235 => XboxIssue::CountryUnavailable,
            2_148_916_236 | 2_148_916_237 => XboxIssue::AdultVerificationRequired,
            2_148_916_238 => XboxIssue::ChildAccount,
            n => XboxIssue::Other(n),
        }
    }
}

impl Display for XboxIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            XboxIssue::NoXboxAccount => write!(f, "this Microsoft account has no Xbox profile"),
            XboxIssue::CountryUnavailable => write!(f, "Xbox Live is not available in this country"),
            XboxIssue::AdultVerificationRequired => write!(f, "adult verification is required"),
            XboxIssue::ChildAccount => {
                write!(f, "child account, must be added to a Microsoft family")
            }
            XboxIssue::Other(code) => write!(f, "Xbox Live error {code}"),
        }
    }
}

/// Failure of the Xbox Live → Minecraft token chain.
///
/// The first failing step aborts the whole chain,
/// nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("{step}: {source}")]
    Transport {
        step: Step,
        #[source]
        source: RequestError,
    },

    #[error("{step}: server returned HTTP {status}")]
    UpstreamStatus {
        step: Step,
        status: u16,
        body: String,
        /// `XErr` code, if Xbox Live sent one.
        xerr: Option<u64>,
    },

    #[error("{step}: {source}")]
    Decode {
        step: Step,
        #[source]
        source: JsonError,
    },

    #[error("{step}: response is missing `{field}`")]
    MissingField { step: Step, field: &'static str },

    #[error("Minecraft profile is missing `{field}`")]
    Mapping { field: &'static str },
}

impl ExchangeError {
    /// The step the chain stopped at.
    #[must_use]
    pub fn step(&self) -> Step {
        match self {
            ExchangeError::Transport { step, .. }
            | ExchangeError::UpstreamStatus { step, .. }
            | ExchangeError::Decode { step, .. }
            | ExchangeError::MissingField { step, .. } => *step,
            ExchangeError::Mapping { .. } => Step::Profile,
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ExchangeError::UpstreamStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Decoded Xbox Live account problem, if the failure carried an `XErr` code.
    #[must_use]
    pub fn xbox_issue(&self) -> Option<XboxIssue> {
        match self {
            ExchangeError::UpstreamStatus {
                xerr: Some(code), ..
            } => Some(XboxIssue::from_xerr(*code)),
            _ => None,
        }
    }

    /// The Minecraft profile endpoint answers 404
    /// when the account doesn't own the game.
    #[must_use]
    pub fn is_missing_ownership(&self) -> bool {
        matches!(
            self,
            ExchangeError::UpstreamStatus {
                step: Step::Profile,
                status: 404,
                ..
            }
        )
    }
}

/// Failure of the first hop: trading an authorization code
/// for a Microsoft access token.
#[derive(Debug, thiserror::Error)]
pub enum CodeExchangeError {
    #[error(transparent)]
    Transport(#[from] RequestError),

    #[error("token endpoint returned HTTP {status}{}", oauth_error_suffix(.error, .description))]
    Status {
        status: u16,
        error: Option<String>,
        description: Option<String>,
    },

    #[error(transparent)]
    Decode(#[from] JsonError),

    #[error("token response is missing `access_token`")]
    MissingAccessToken,
}

fn oauth_error_suffix(error: &Option<String>, description: &Option<String>) -> String {
    match (error, description) {
        (Some(error), Some(description)) => format!(": {error} ({description})"),
        (Some(error), None) => format!(": {error}"),
        (None, Some(description)) => format!(": {description}"),
        (None, None) => String::new(),
    }
}

/// Problems with the provider configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing config key `{0}`")]
    MissingKey(&'static str),
    #[error("config key `{0}` is empty")]
    EmptyKey(&'static str),
    #[error("invalid config: {0}")]
    Json(#[from] JsonError),
}

/// Everything that can go wrong while turning an authorization
/// code (or a Microsoft token) into a [`crate::UserRecord`].
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("couldn't exchange the authorization code: {0}")]
    CodeExchange(#[from] CodeExchangeError),

    #[error("Minecraft login failed at {0}")]
    Exchange(#[from] ExchangeError),
}

/// Convenient type alias for Results of the provider
pub type Result<T> = std::result::Result<T, ProviderError>;

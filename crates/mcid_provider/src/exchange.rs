//! The Xbox Live → Minecraft token chain.
//!
//! ```text
//! Microsoft access token
//!    -> A: POST user.auth.xboxlive.com   (Xbox Live user token + user hash)
//!    -> B: POST xsts.auth.xboxlive.com   (XSTS token)
//!    -> C: POST api.minecraftservices.com/authentication/login_with_xbox
//!    -> D: GET  api.minecraftservices.com/minecraft/profile
//!    -> UserRecord
//! ```

use mcid_core::{err, info, pt, IntoJsonError};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Map, Value};

use crate::{
    config::Endpoints,
    errors::{ExchangeError, Step},
    traits::{HttpResponse, HttpTransport},
    types::UserRecord,
};

const RPS_TICKET_PREFIX: &str = "d=";
const XBOX_SITE_NAME: &str = "user.auth.xboxlive.com";
const XBOX_RELYING_PARTY: &str = "http://auth.xboxlive.com";
const MINECRAFT_RELYING_PARTY: &str = "rp://api.minecraftservices.com/";
const SANDBOX_ID: &str = "RETAIL";
const TOKEN_TYPE: &str = "JWT";
const IDENTITY_TOKEN_PREFIX: &str = "XBL3.0 x=";

/// Build the `identityToken` Minecraft expects in step C.
///
/// ```
/// assert_eq!(
///     mcid_provider::identity_token("abc123", "tok456"),
///     "XBL3.0 x=abc123;tok456"
/// );
/// ```
#[must_use]
pub fn identity_token(user_hash: &str, xsts_token: &str) -> String {
    format!("{IDENTITY_TOKEN_PREFIX}{user_hash};{xsts_token}")
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct XboxTokenResponse {
    token: Option<String>,
    display_claims: Option<DisplayClaims>,
}

#[derive(Deserialize)]
struct DisplayClaims {
    xui: Option<Vec<UserClaims>>,
}

#[derive(Deserialize)]
struct UserClaims {
    uhs: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct XboxErrorResponse {
    x_err: Option<u64>,
}

#[derive(Deserialize)]
struct MinecraftLoginResponse {
    access_token: Option<String>,
}

/// Output of step A.
struct XboxUserToken {
    token: String,
    user_hash: String,
}

/// Runs the four step token chain over an injected [`HttpTransport`].
///
/// Holds no state between calls, so one instance can serve
/// any number of concurrent logins.
#[derive(Debug, Clone)]
pub struct TokenExchange<T> {
    transport: T,
    endpoints: Endpoints,
}

impl<T: HttpTransport> TokenExchange<T> {
    pub fn new(transport: T) -> Self {
        Self::with_endpoints(transport, Endpoints::default())
    }

    pub fn with_endpoints(transport: T, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Trade a Microsoft access token for the player's
    /// Minecraft profile.
    ///
    /// # Errors
    /// The first failing step aborts the chain:
    /// - [`ExchangeError::Transport`]: the request never got an answer
    /// - [`ExchangeError::UpstreamStatus`]: non-2xx answer
    /// - [`ExchangeError::Decode`]: body isn't the expected JSON
    /// - [`ExchangeError::MissingField`]: a token/claim is missing
    /// - [`ExchangeError::Mapping`]: profile lacks `id` or `name`
    pub async fn authenticate(&self, upstream_token: &str) -> Result<UserRecord, ExchangeError> {
        info!("Logging into Minecraft through Xbox Live...");
        match self.run(upstream_token).await {
            Ok(user) => {
                info!("Logged in as {}", user.name());
                Ok(user)
            }
            Err(error) => {
                err!("Minecraft login failed at {error}");
                Err(error)
            }
        }
    }

    async fn run(&self, upstream_token: &str) -> Result<UserRecord, ExchangeError> {
        let xbox = self.xbox_user_token(upstream_token).await?;
        let xsts_token = self.xsts_token(&xbox.token).await?;
        let access_token = self.minecraft_login(&xbox.user_hash, &xsts_token).await?;
        let profile = self.profile(&access_token).await?;
        UserRecord::from_profile(profile)
    }

    async fn xbox_user_token(&self, upstream_token: &str) -> Result<XboxUserToken, ExchangeError> {
        let step = Step::XboxUser;
        log_step(step);
        let body = json!({
            "Properties": {
                "AuthMethod": "RPS",
                "SiteName": XBOX_SITE_NAME,
                "RpsTicket": format!("{RPS_TICKET_PREFIX}{upstream_token}")
            },
            "RelyingParty": XBOX_RELYING_PARTY,
            "TokenType": TOKEN_TYPE
        });
        let response = self
            .transport
            .post_json(&self.endpoints.xbox_user_authenticate, &body)
            .await
            .map_err(|source| ExchangeError::Transport { step, source })?;

        let response: XboxTokenResponse = decode(step, response)?;
        let token = response.token.ok_or(ExchangeError::MissingField {
            step,
            field: "Token",
        })?;
        let claim = response
            .display_claims
            .and_then(|n| n.xui)
            .and_then(|n| n.into_iter().next())
            .ok_or(ExchangeError::MissingField {
                step,
                field: "DisplayClaims.xui",
            })?;
        let user_hash = claim.uhs.ok_or(ExchangeError::MissingField {
            step,
            field: "DisplayClaims.xui[0].uhs",
        })?;

        Ok(XboxUserToken { token, user_hash })
    }

    async fn xsts_token(&self, xbox_token: &str) -> Result<String, ExchangeError> {
        let step = Step::Xsts;
        log_step(step);
        let body = json!({
            "Properties": {
                "SandboxId": SANDBOX_ID,
                "UserTokens": [xbox_token]
            },
            "RelyingParty": MINECRAFT_RELYING_PARTY,
            "TokenType": TOKEN_TYPE
        });
        let response = self
            .transport
            .post_json(&self.endpoints.xsts_authorize, &body)
            .await
            .map_err(|source| ExchangeError::Transport { step, source })?;

        let response: XboxTokenResponse = decode(step, response)?;
        response.token.ok_or(ExchangeError::MissingField {
            step,
            field: "Token",
        })
    }

    async fn minecraft_login(
        &self,
        user_hash: &str,
        xsts_token: &str,
    ) -> Result<String, ExchangeError> {
        let step = Step::MinecraftLogin;
        log_step(step);
        let body = json!({ "identityToken": identity_token(user_hash, xsts_token) });
        let response = self
            .transport
            .post_json(&self.endpoints.minecraft_login, &body)
            .await
            .map_err(|source| ExchangeError::Transport { step, source })?;

        let response: MinecraftLoginResponse = decode(step, response)?;
        response.access_token.ok_or(ExchangeError::MissingField {
            step,
            field: "access_token",
        })
    }

    async fn profile(&self, access_token: &str) -> Result<Map<String, Value>, ExchangeError> {
        let step = Step::Profile;
        log_step(step);
        let response = self
            .transport
            .get_bearer(&self.endpoints.minecraft_profile, access_token)
            .await
            .map_err(|source| ExchangeError::Transport { step, source })?;
        decode(step, response)
    }
}

fn log_step(step: Step) {
    pt!(
        "{} ({}/{})",
        step.description(),
        step.number(),
        Step::ALL.len()
    );
}

fn decode<R: DeserializeOwned>(step: Step, response: HttpResponse) -> Result<R, ExchangeError> {
    let success = response.is_success();
    let HttpResponse { status, body } = response;
    if !success {
        let xerr = serde_json::from_str::<XboxErrorResponse>(&body)
            .ok()
            .and_then(|n| n.x_err);
        return Err(ExchangeError::UpstreamStatus {
            step,
            status,
            body,
            xerr,
        });
    }
    let parsed = serde_json::from_str::<R>(&body);
    parsed
        .json(body)
        .map_err(|source| ExchangeError::Decode { step, source })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use mcid_core::RequestError;
    use serde_json::json;

    use super::*;
    use crate::{
        config::{
            MINECRAFT_LOGIN_WITH_XBOX, MINECRAFT_PROFILE, XBOX_USER_AUTHENTICATE,
            XBOX_XSTS_AUTHORIZE,
        },
        testing::{ScriptedTransport, Sent},
    };

    fn xbox_response(token: &str, uhs: &str) -> Value {
        json!({
            "IssueInstant": "2024-01-01T00:00:00.0000000Z",
            "NotAfter": "2024-01-15T00:00:00.0000000Z",
            "Token": token,
            "DisplayClaims": { "xui": [{ "uhs": uhs }] }
        })
    }

    fn happy_chain() -> ScriptedTransport {
        ScriptedTransport::new()
            .respond(XBOX_USER_AUTHENTICATE, 200, xbox_response("xbl-token", "abc123"))
            .respond(XBOX_XSTS_AUTHORIZE, 200, xbox_response("tok456", "abc123"))
            .respond(
                MINECRAFT_LOGIN_WITH_XBOX,
                200,
                json!({
                    "username": "d6e0b7a4-0000-0000-0000-000000000000",
                    "access_token": "mc-access",
                    "token_type": "Bearer",
                    "expires_in": 86400
                }),
            )
            .respond(
                MINECRAFT_PROFILE,
                200,
                json!({
                    "id": "069a79f444e94726a5befca90e38aaf5",
                    "name": "Notch",
                    "skins": [],
                    "capes": []
                }),
            )
    }

    #[tokio::test]
    async fn returns_profile_id_and_name_verbatim() {
        let exchange = TokenExchange::new(happy_chain());
        let user = exchange.authenticate("ms-token").await.unwrap();

        assert_eq!(user.id(), "069a79f444e94726a5befca90e38aaf5");
        assert_eq!(user.name(), "Notch");
        assert!(user.get("skins").is_some());
        assert_eq!(
            exchange.transport().urls(),
            [
                XBOX_USER_AUTHENTICATE,
                XBOX_XSTS_AUTHORIZE,
                MINECRAFT_LOGIN_WITH_XBOX,
                MINECRAFT_PROFILE
            ]
        );
    }

    #[tokio::test]
    async fn sends_expected_request_shapes() {
        let exchange = TokenExchange::new(happy_chain());
        exchange.authenticate("ms-token").await.unwrap();
        let sent = exchange.transport().sent();

        assert_eq!(
            sent[0],
            Sent::Json {
                url: XBOX_USER_AUTHENTICATE.to_owned(),
                body: json!({
                    "Properties": {
                        "AuthMethod": "RPS",
                        "SiteName": "user.auth.xboxlive.com",
                        "RpsTicket": "d=ms-token"
                    },
                    "RelyingParty": "http://auth.xboxlive.com",
                    "TokenType": "JWT"
                })
            }
        );
        assert_eq!(
            sent[1],
            Sent::Json {
                url: XBOX_XSTS_AUTHORIZE.to_owned(),
                body: json!({
                    "Properties": {
                        "SandboxId": "RETAIL",
                        "UserTokens": ["xbl-token"]
                    },
                    "RelyingParty": "rp://api.minecraftservices.com/",
                    "TokenType": "JWT"
                })
            }
        );
        assert_eq!(
            sent[3],
            Sent::Bearer {
                url: MINECRAFT_PROFILE.to_owned(),
                token: "mc-access".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn identity_token_is_hash_semicolon_xsts() {
        let exchange = TokenExchange::new(happy_chain());
        exchange.authenticate("ms-token").await.unwrap();

        let Sent::Json { url, body } = &exchange.transport().sent()[2] else {
            panic!("step C should be a JSON post");
        };
        assert_eq!(url, MINECRAFT_LOGIN_WITH_XBOX);
        assert_eq!(body, &json!({ "identityToken": "XBL3.0 x=abc123;tok456" }));
    }

    #[tokio::test]
    async fn missing_xui_stops_before_xsts() {
        let transport = happy_chain().respond(
            XBOX_USER_AUTHENTICATE,
            200,
            json!({ "Token": "xbl-token", "DisplayClaims": {} }),
        );
        let exchange = TokenExchange::new(transport);
        let err = exchange.authenticate("ms-token").await.unwrap_err();

        assert!(matches!(
            err,
            ExchangeError::MissingField {
                step: Step::XboxUser,
                field: "DisplayClaims.xui"
            }
        ));
        assert_eq!(exchange.transport().urls(), [XBOX_USER_AUTHENTICATE]);
    }

    #[tokio::test]
    async fn empty_xui_is_missing_too() {
        let transport = happy_chain().respond(
            XBOX_USER_AUTHENTICATE,
            200,
            json!({ "Token": "xbl-token", "DisplayClaims": { "xui": [] } }),
        );
        let err = TokenExchange::new(transport)
            .authenticate("ms-token")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::MissingField {
                step: Step::XboxUser,
                field: "DisplayClaims.xui"
            }
        ));
    }

    #[tokio::test]
    async fn missing_xbox_token_stops_before_xsts() {
        let transport = happy_chain().respond(
            XBOX_USER_AUTHENTICATE,
            200,
            json!({ "DisplayClaims": { "xui": [{ "uhs": "abc123" }] } }),
        );
        let exchange = TokenExchange::new(transport);
        let err = exchange.authenticate("ms-token").await.unwrap_err();

        assert!(matches!(
            err,
            ExchangeError::MissingField {
                step: Step::XboxUser,
                field: "Token"
            }
        ));
        assert_eq!(exchange.transport().urls(), [XBOX_USER_AUTHENTICATE]);
    }

    #[tokio::test]
    async fn missing_user_hash_stops_before_xsts() {
        let transport = happy_chain().respond(
            XBOX_USER_AUTHENTICATE,
            200,
            json!({ "Token": "xbl-token", "DisplayClaims": { "xui": [{}] } }),
        );
        let exchange = TokenExchange::new(transport);
        let err = exchange.authenticate("ms-token").await.unwrap_err();

        assert!(matches!(
            err,
            ExchangeError::MissingField {
                step: Step::XboxUser,
                field: "DisplayClaims.xui[0].uhs"
            }
        ));
        assert_eq!(exchange.transport().urls(), [XBOX_USER_AUTHENTICATE]);
    }

    #[tokio::test]
    async fn missing_xsts_token() {
        let transport = happy_chain().respond(
            XBOX_XSTS_AUTHORIZE,
            200,
            json!({ "DisplayClaims": { "xui": [{ "uhs": "abc123" }] } }),
        );
        let exchange = TokenExchange::new(transport);
        let err = exchange.authenticate("ms-token").await.unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::MissingField {
                step: Step::Xsts,
                field: "Token"
            }
        ));
        assert_eq!(exchange.transport().sent().len(), 2);
    }

    #[tokio::test]
    async fn unauthorized_login_stops_before_profile() {
        let transport = happy_chain().respond(
            MINECRAFT_LOGIN_WITH_XBOX,
            401,
            json!({ "error": "UnauthorizedOperationException" }),
        );
        let exchange = TokenExchange::new(transport);
        let err = exchange.authenticate("ms-token").await.unwrap_err();

        assert!(matches!(
            err,
            ExchangeError::UpstreamStatus {
                step: Step::MinecraftLogin,
                status: 401,
                ..
            }
        ));
        assert!(!exchange
            .transport()
            .urls()
            .iter()
            .any(|n| n == MINECRAFT_PROFILE));
        assert_eq!(exchange.transport().sent().len(), 3);
    }

    #[tokio::test]
    async fn missing_access_token() {
        let transport = happy_chain().respond(
            MINECRAFT_LOGIN_WITH_XBOX,
            200,
            json!({ "username": "x", "token_type": "Bearer" }),
        );
        let err = TokenExchange::new(transport)
            .authenticate("ms-token")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::MissingField {
                step: Step::MinecraftLogin,
                field: "access_token"
            }
        ));
    }

    #[tokio::test]
    async fn profile_without_id_fails_mapping() {
        let transport = happy_chain().respond(MINECRAFT_PROFILE, 200, json!({ "name": "Notch" }));
        let err = TokenExchange::new(transport)
            .authenticate("ms-token")
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::Mapping { field: "id" }));
    }

    #[tokio::test]
    async fn profile_404_means_no_ownership() {
        let transport = happy_chain().respond(
            MINECRAFT_PROFILE,
            404,
            json!({
                "path": "/minecraft/profile",
                "errorType": "NOT_FOUND",
                "error": "NOT_FOUND"
            }),
        );
        let err = TokenExchange::new(transport)
            .authenticate("ms-token")
            .await
            .unwrap_err();
        assert!(err.is_missing_ownership());
        assert_eq!(err.step(), Step::Profile);
    }

    #[tokio::test]
    async fn xsts_refusal_carries_xerr() {
        let transport = happy_chain().respond(
            XBOX_XSTS_AUTHORIZE,
            401,
            json!({
                "Identity": "0",
                "XErr": 2148916238u64,
                "Message": "",
                "Redirect": "https://start.ui.xboxlive.com/AddChildToFamily"
            }),
        );
        let err = TokenExchange::new(transport)
            .authenticate("ms-token")
            .await
            .unwrap_err();
        assert_eq!(err.step(), Step::Xsts);
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.xbox_issue(), Some(crate::XboxIssue::ChildAccount));
    }

    #[tokio::test]
    async fn invalid_json_is_decode_error() {
        let transport = happy_chain().respond_raw(XBOX_XSTS_AUTHORIZE, 200, "<html>oops</html>");
        let err = TokenExchange::new(transport)
            .authenticate("ms-token")
            .await
            .unwrap_err();
        let ExchangeError::Decode { step, source } = err else {
            panic!("expected a decode error");
        };
        assert_eq!(step, Step::Xsts);
        assert_eq!(source.json, "<html>oops</html>");
    }

    #[tokio::test]
    async fn non_object_profile_is_decode_error() {
        let transport = happy_chain().respond(MINECRAFT_PROFILE, 200, json!(["Notch"]));
        let err = TokenExchange::new(transport)
            .authenticate("ms-token")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::Decode {
                step: Step::Profile,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn transport_failure_aborts_immediately() {
        let transport = happy_chain().fail(XBOX_USER_AUTHENTICATE, "connection refused");
        let exchange = TokenExchange::new(transport);
        let err = exchange.authenticate("ms-token").await.unwrap_err();

        assert!(matches!(
            err,
            ExchangeError::Transport {
                step: Step::XboxUser,
                ..
            }
        ));
        assert_eq!(exchange.transport().sent().len(), 1);
    }

    /// Derives every answer from the request itself, so concurrent
    /// chains can only end up with their own profile if nothing leaks.
    struct EchoChain;

    #[async_trait]
    impl HttpTransport for EchoChain {
        async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse, RequestError> {
            tokio::task::yield_now().await;
            let response = if url == XBOX_USER_AUTHENTICATE {
                let ticket = body["Properties"]["RpsTicket"].as_str().unwrap_or_default();
                let user = ticket.trim_start_matches("d=");
                xbox_response(&format!("xbl-{user}"), &format!("uhs-{user}"))
            } else if url == XBOX_XSTS_AUTHORIZE {
                let token = body["Properties"]["UserTokens"][0].as_str().unwrap_or_default();
                xbox_response(&format!("xsts-{token}"), "unused")
            } else {
                let identity = body["identityToken"].as_str().unwrap_or_default();
                json!({ "access_token": format!("mc-{identity}") })
            };
            Ok(HttpResponse::new(200, response.to_string()))
        }

        async fn post_form(
            &self,
            _url: &str,
            _form: &[(&str, &str)],
        ) -> Result<HttpResponse, RequestError> {
            Err(RequestError::other("not used"))
        }

        async fn get_bearer(&self, _url: &str, token: &str) -> Result<HttpResponse, RequestError> {
            tokio::task::yield_now().await;
            let profile = json!({ "id": token, "name": token });
            Ok(HttpResponse::new(200, profile.to_string()))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_logins_stay_separate() {
        let exchange = Arc::new(TokenExchange::new(EchoChain));

        let handles: Vec<_> = ["alice", "bob", "carol", "dave"]
            .into_iter()
            .map(|user| {
                let exchange = Arc::clone(&exchange);
                tokio::spawn(async move { (user, exchange.authenticate(user).await) })
            })
            .collect();

        for handle in handles {
            let (user, result) = handle.await.unwrap();
            let record = result.unwrap();
            let expected = format!("mc-XBL3.0 x=uhs-{user};xsts-xbl-{user}");
            assert_eq!(record.id(), expected);
            assert_eq!(record.name(), expected);
        }
    }
}

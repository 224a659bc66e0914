//! OAuth2 client-credentials session.
//!
//! [`OAuthSession`] owns the bearer token used on every Battle.net call.
//! The token is acquired lazily (or eagerly via
//! [`authenticate`](OAuthSession::authenticate)), renewed shortly before its
//! advertised expiry, and re-acquired once when a call comes back `401`.
//! It lives only in memory.

use std::fmt;
use std::time::{Duration, Instant};

use covdb_core::retry::{FailureClass, RetryPolicy, RetryState};
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::ApiError;

/// Default token endpoint. Tokens issued here are valid for every region.
pub const DEFAULT_TOKEN_URL: &str = "https://eu.battle.net/oauth/token";

/// Renew this long before the advertised expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Client id/secret pair for one worker identity.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Successful response from the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// A response whose body has been read in full.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: String,
}

impl ApiResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    /// `None` when the endpoint did not advertise a lifetime; such tokens
    /// are only replaced after a 401.
    expires_at: Option<Instant>,
}

impl AccessToken {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// Authenticated HTTP session against the Battle.net API.
pub struct OAuthSession {
    client: reqwest::Client,
    token_url: String,
    credentials: Credentials,
    policy: RetryPolicy,
    token: Mutex<Option<AccessToken>>,
}

impl OAuthSession {
    /// Create a session. No request is made until the first call.
    pub fn new(
        client: reqwest::Client,
        token_url: impl Into<String>,
        credentials: Credentials,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            credentials,
            policy,
            token: Mutex::new(None),
        }
    }

    /// Acquire a token now, so bad credentials fail at startup.
    pub async fn authenticate(&self) -> Result<(), ApiError> {
        let mut guard = self.token.lock().await;
        *guard = Some(self.fetch_token().await?);
        Ok(())
    }

    /// GET `url` with the bearer token, applying the retry policy, and read
    /// the whole body.
    ///
    /// - `401`: the token is re-acquired and the request retried, up to the
    ///   policy's auth budget. A `401` that survives is returned as-is.
    /// - `429`: retried after `Retry-After` (or the backoff delay) up to the
    ///   rate-limit budget, then returned as-is.
    /// - transport errors, including a body that fails mid-read: retried with
    ///   exponential backoff up to the transport budget, then returned as
    ///   [`ApiError::Request`].
    ///
    /// Every other response is handed back untouched.
    pub async fn call(&self, url: &str) -> Result<ApiResponse, ApiError> {
        let mut retries = RetryState::new();
        let mut bearer = self.bearer().await?;

        loop {
            let response = match self.client.get(url).bearer_auth(&bearer).send().await {
                Ok(response) => response,
                Err(e) => {
                    if self.transport_backoff(&mut retries, url, &e).await {
                        continue;
                    }
                    return Err(e.into());
                }
            };

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED
                && retries
                    .try_consume(FailureClass::Auth, &self.policy)
                    .is_some()
            {
                tracing::info!(url, "Access token rejected, re-authenticating");
                bearer = self.reauthenticate().await?;
                continue;
            }
            if status == StatusCode::TOO_MANY_REQUESTS {
                if let Some(attempt) = retries.try_consume(FailureClass::RateLimit, &self.policy) {
                    let delay = retry_after(&response)
                        .unwrap_or_else(|| self.policy.delay_for(attempt))
                        .min(self.policy.max_delay);
                    tracing::warn!(
                        url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limited, backing off",
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
            }

            match response.text().await {
                Ok(body) => return Ok(ApiResponse { status, body }),
                Err(e) => {
                    if self.transport_backoff(&mut retries, url, &e).await {
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }
    }

    // ---- private helpers ----

    /// Sleep before the next transport retry. `false` once the budget is spent.
    async fn transport_backoff(
        &self,
        retries: &mut RetryState,
        url: &str,
        error: &reqwest::Error,
    ) -> bool {
        let Some(attempt) = retries.try_consume(FailureClass::Transport, &self.policy) else {
            return false;
        };
        let delay = self.policy.delay_for(attempt);
        tracing::warn!(
            url,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Transport error, retrying",
        );
        tokio::time::sleep(delay).await;
        true
    }

    /// Current token, fetching a new one if none is held or it expired.
    async fn bearer(&self) -> Result<String, ApiError> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref().filter(|t| !t.is_expired()) {
            return Ok(token.value.clone());
        }
        let token = self.fetch_token().await?;
        let value = token.value.clone();
        *guard = Some(token);
        Ok(value)
    }

    /// Replace the held token unconditionally.
    async fn reauthenticate(&self) -> Result<String, ApiError> {
        let mut guard = self.token.lock().await;
        let token = self.fetch_token().await?;
        let value = token.value.clone();
        *guard = Some(token);
        Ok(value)
    }

    /// Perform the client-credentials grant.
    async fn fetch_token(&self) -> Result<AccessToken, ApiError> {
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Token {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = response.json::<TokenResponse>().await?;
        tracing::debug!(
            client_id = %self.credentials.client_id,
            expires_in = parsed.expires_in,
            "Acquired access token",
        );

        Ok(AccessToken {
            value: parsed.access_token,
            expires_at: parsed
                .expires_in
                .map(|secs| Instant::now() + Duration::from_secs(secs).saturating_sub(EXPIRY_MARGIN)),
        })
    }
}

/// Parse a `Retry-After` header expressed in seconds.
fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_redacts_secret() {
        let creds = Credentials {
            client_id: "worker-1".into(),
            client_secret: "hunter2".into(),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("worker-1"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn token_without_lifetime_never_expires() {
        let token = AccessToken {
            value: "t".into(),
            expires_at: None,
        };
        assert!(!token.is_expired());
    }

    #[test]
    fn token_past_deadline_is_expired() {
        let token = AccessToken {
            value: "t".into(),
            expires_at: Some(Instant::now() - Duration::from_secs(1)),
        };
        assert!(token.is_expired());
    }

    #[test]
    fn token_response_tolerates_extra_fields() {
        let parsed: TokenResponse = serde_json::from_str(
            r#"{"access_token":"abc","token_type":"bearer","expires_in":86399,"sub":"x"}"#,
        )
        .unwrap();
        assert_eq!(parsed.access_token, "abc");
        assert_eq!(parsed.expires_in, Some(86399));
    }
}

//! Credential store.
//!
//! Owns the bearer token and API key (persisted through the [`LocalStore`])
//! and the `csrf_token` cookie, which lives in an in-process cookie jar and is
//! mirrored into the `X-CSRF-Token` header on mutating requests.

use crate::client::{ApiError, Payload, RequestExecutor};
use crate::storage::{LocalStore, StorageError, API_KEY_KEY, TOKEN_KEY};
use cookie::{Cookie, CookieJar, SameSite};
use parking_lot::Mutex;
use reqwest::Method;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const API_KEY_HEADER: &str = "X-API-KEY";
pub const CSRF_HEADER: &str = "X-CSRF-Token";
pub const CSRF_COOKIE: &str = "csrf_token";
pub const CSRF_PATH: &str = "/csrf/csrf-token";

/// Credentials attached to outgoing requests. Empty values are never exposed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub bearer_token: Option<String>,
    pub api_key: Option<String>,
    pub csrf_token: Option<String>,
}

/// Tokens issued by a successful login or token refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSet {
    pub bearer_token: String,
    pub api_key: Option<String>,
    pub csrf_token: Option<String>,
}

/// Everything one request needs, captured under a single jar lock so the
/// CSRF header always matches the cookie sent with it.
#[derive(Debug, Clone)]
pub struct CredentialSnapshot {
    pub credentials: Credentials,
    pub cookie_header: Option<String>,
    pub generation: u64,
}

pub struct CredentialStore {
    store: Arc<dyn LocalStore>,
    jar: Mutex<CookieJar>,
    generation: AtomicU64,
    clears: AtomicU64,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self {
            store,
            jar: Mutex::new(CookieJar::new()),
            generation: AtomicU64::new(0),
            clears: AtomicU64::new(0),
        }
    }

    /// Current credentials. No I/O beyond the local store.
    pub fn read(&self) -> Credentials {
        Credentials {
            bearer_token: self.stored(TOKEN_KEY),
            api_key: self.stored(API_KEY_KEY),
            csrf_token: self.csrf_cookie(),
        }
    }

    pub fn snapshot(&self, secure: bool) -> CredentialSnapshot {
        let (cookie_header, csrf_token) = {
            let jar = self.jar.lock();
            let sendable: Vec<&Cookie<'static>> = jar
                .iter()
                .filter(|c| secure || c.secure() != Some(true))
                .collect();
            let header = sendable
                .iter()
                .map(|c| format!("{}={}", c.name(), c.value()))
                .collect::<Vec<_>>()
                .join("; ");
            let csrf = sendable
                .iter()
                .find(|c| c.name() == CSRF_COOKIE)
                .map(|c| c.value().to_string())
                .filter(|v| !v.is_empty());
            ((!header.is_empty()).then_some(header), csrf)
        };

        CredentialSnapshot {
            credentials: Credentials {
                bearer_token: self.stored(TOKEN_KEY),
                api_key: self.stored(API_KEY_KEY),
                csrf_token,
            },
            cookie_header,
            generation: self.generation.load(Ordering::SeqCst),
        }
    }

    /// Persist a new token set and start a new credential generation.
    pub fn set(&self, tokens: &TokenSet, secure: bool) -> Result<(), StorageError> {
        self.store.apply(&[
            (TOKEN_KEY, Some(tokens.bearer_token.as_str())),
            (API_KEY_KEY, tokens.api_key.as_deref().filter(|k| !k.is_empty())),
        ])?;
        if let Some(csrf) = tokens.csrf_token.as_deref().filter(|t| !t.is_empty()) {
            self.store_csrf(csrf, secure);
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(generation, has_api_key = tokens.api_key.is_some(), "Credentials stored");
        Ok(())
    }

    /// Write the `csrf_token` cookie: path `/`, `SameSite=Strict`, `Secure`
    /// iff the origin is https.
    pub fn store_csrf(&self, token: &str, secure: bool) {
        let cookie = Cookie::build((CSRF_COOKIE, token.to_string()))
            .path("/")
            .same_site(SameSite::Strict)
            .secure(secure)
            .build();
        self.jar.lock().add(cookie);
    }

    /// Record a `Set-Cookie` header from a response.
    ///
    /// `Max-Age=0` or an empty value deletes the cookie.
    pub fn absorb_set_cookie(&self, raw: &str, secure: bool) {
        let mut cookie = match Cookie::parse(raw.to_string()) {
            Ok(cookie) => cookie,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed Set-Cookie header");
                return;
            }
        };

        let expired = cookie
            .max_age()
            .is_some_and(|age| age.is_zero() || age.is_negative());
        let mut jar = self.jar.lock();
        if expired || cookie.value().is_empty() {
            jar.remove(Cookie::from(cookie.name().to_string()));
        } else {
            cookie.set_secure(secure);
            jar.add(cookie);
        }
    }

    /// Remove every credential. Never fails; storage errors are logged.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.wipe();
    }

    /// Clear only if `generation` is still current.
    ///
    /// Returns `true` for the caller that performed the clear, so concurrent
    /// 401s from the same session tear it down once.
    pub fn expire(&self, generation: u64) -> bool {
        if self
            .generation
            .compare_exchange(generation, generation + 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.wipe();
            true
        } else {
            false
        }
    }

    fn wipe(&self) {
        if let Err(e) = self.store.apply(&[(TOKEN_KEY, None), (API_KEY_KEY, None)]) {
            tracing::warn!(error = %e, "Failed to remove persisted credentials");
        }
        self.jar.lock().remove(Cookie::from(CSRF_COOKIE));
        self.clears.fetch_add(1, Ordering::SeqCst);
        tracing::info!("Credentials cleared");
    }

    /// Number of times credentials have been wiped.
    pub fn clear_count(&self) -> u64 {
        self.clears.load(Ordering::SeqCst)
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn csrf_cookie(&self) -> Option<String> {
        self.jar
            .lock()
            .get(CSRF_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }

    /// The CSRF cookie as it would be sent to an origin of the given scheme.
    /// A `Secure` cookie is invisible to a plain-http backend.
    pub fn csrf_token_for(&self, secure: bool) -> Option<String> {
        self.jar
            .lock()
            .get(CSRF_COOKIE)
            .filter(|c| secure || c.secure() != Some(true))
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn has_session(&self) -> bool {
        self.stored(TOKEN_KEY).is_some()
    }

    fn stored(&self, key: &str) -> Option<String> {
        self.store.get(key).filter(|v| !v.is_empty())
    }

    /// GET `/csrf/csrf-token` and keep the token it hands out.
    ///
    /// A token delivered through `Set-Cookie` wins; otherwise the
    /// `{csrf_token}` body field is stored as the cookie. Any failure other
    /// than an expired session is reported as a network error.
    pub async fn refresh_csrf(&self, executor: &RequestExecutor) -> Result<String, ApiError> {
        let secure = executor.registry().get_active().is_secure();
        let before = self.csrf_token_for(secure);

        let payload = executor
            .dispatch(Method::GET, CSRF_PATH, None, executor.defaults())
            .await
            .map_err(|e| match e {
                ApiError::AuthExpired => e,
                other => ApiError::Network(format!("CSRF token unavailable: {}", other)),
            })?;

        let from_body = match payload {
            Payload::Json(value) => value
                .get("csrf_token")
                .and_then(|v| v.as_str())
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            Payload::Binary(_) => None,
        };
        let from_cookie = self.csrf_token_for(secure);

        let token = match (from_cookie, from_body) {
            (Some(cookie), _) if Some(&cookie) != before.as_ref() => cookie,
            (_, Some(body)) => {
                self.store_csrf(&body, secure);
                body
            }
            (Some(cookie), None) => cookie,
            (None, None) => {
                return Err(ApiError::Network(
                    "CSRF token unavailable: response carried no token".into(),
                ))
            }
        };

        tracing::debug!("CSRF token refreshed");
        Ok(token)
    }
}

//! Stateless session management
//!
//! This module issues and verifies the signed session token carried in an
//! HTTP-only cookie. Tokens are self-contained HS256 credentials holding the
//! user's identity and an expiry; the server keeps no session state, so any
//! instance holding the signing secret can verify any token. The trade-off is
//! that a token cannot be revoked before its natural expiry; the 7-day TTL
//! bounds that window.

use std::sync::Arc;

use anyhow::Result;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::clock::Clock;

use crate::error::PortalError;
use crate::models::{Role, User};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Default session lifetime: 7 days
const DEFAULT_TTL_SECONDS: u64 = 604_800;

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Secret used to sign and verify session tokens
    pub secret: String,
    /// Session lifetime in seconds
    pub ttl_seconds: u64,
    /// Whether cookies are marked `Secure`; on in production deployments
    pub secure_cookies: bool,
}

impl SessionConfig {
    /// Create a new SessionConfig from environment variables
    ///
    /// # Environment Variables
    /// - `SESSION_SECRET`: Signing secret (required)
    /// - `SESSION_TTL_SECONDS`: Session lifetime in seconds (default: 604800)
    /// - `COOKIE_SECURE`: Mark cookies `Secure` (default: false)
    ///
    /// A missing or empty `SESSION_SECRET` is a deployment mistake, not a
    /// runtime condition, so it fails here rather than on first request.
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("SESSION_SECRET")
            .map_err(|_| anyhow::anyhow!("SESSION_SECRET environment variable not set"))?;

        if secret.trim().is_empty() {
            anyhow::bail!("SESSION_SECRET must not be empty");
        }

        let ttl_seconds = std::env::var("SESSION_TTL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TTL_SECONDS);

        let secure_cookies = std::env::var("COOKIE_SECURE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(false);

        Ok(SessionConfig {
            secret,
            ttl_seconds,
            secure_cookies,
        })
    }
}

/// Claims embedded in a session token
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    /// User ID
    sub: Uuid,
    /// Display name
    name: String,
    /// Email address
    email: String,
    /// User role
    role: Role,
    /// Issued at time
    iat: i64,
    /// Expiration time
    exp: i64,
}

/// Identity derived from a verified session token
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Session manager
#[derive(Clone)]
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_seconds: u64,
    secure_cookies: bool,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    /// Initialize a new session manager
    pub fn new(config: SessionConfig, clock: Arc<dyn Clock>) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        // Expiry is checked against the injected clock in `verify`, not by
        // the library against process time.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        SessionManager {
            encoding_key,
            decoding_key,
            validation,
            ttl_seconds: config.ttl_seconds,
            secure_cookies: config.secure_cookies,
            clock,
        }
    }

    /// Sign a session token for `user` and wrap it in the session cookie.
    ///
    /// Setting the returned cookie overwrites any previous session.
    pub fn issue(&self, user: &SessionUser) -> Result<Cookie<'static>> {
        let now = self.clock.now().timestamp();
        let claims = SessionClaims {
            sub: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now,
            exp: now + self.ttl_seconds as i64,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(self.build_cookie(token))
    }

    /// Verify a raw token and return the embedded identity.
    ///
    /// Malformed tokens, bad signatures, and expired tokens all yield `None`;
    /// no caller has a legitimate use for knowing which, and collapsing them
    /// avoids leaking verification internals.
    pub fn verify(&self, token: &str) -> Option<SessionUser> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation).ok()?;
        let claims = data.claims;

        if claims.exp <= self.clock.now().timestamp() {
            return None;
        }

        Some(SessionUser {
            id: claims.sub,
            name: claims.name,
            email: claims.email,
            role: claims.role,
        })
    }

    /// Identity from the session cookie, if a valid session exists.
    pub fn current_user(&self, jar: &CookieJar) -> Option<SessionUser> {
        let cookie = jar.get(SESSION_COOKIE)?;
        self.verify(cookie.value())
    }

    /// Like [`current_user`](Self::current_user), but fails with
    /// `Unauthorized` when there is no valid session.
    pub fn require_user(&self, jar: &CookieJar) -> Result<SessionUser, PortalError> {
        self.current_user(jar).ok_or(PortalError::Unauthorized)
    }

    /// [`require_user`](Self::require_user), then an admin role check.
    pub fn require_admin(&self, jar: &CookieJar) -> Result<SessionUser, PortalError> {
        let user = self.require_user(jar)?;
        if user.role != Role::Admin {
            return Err(PortalError::Forbidden);
        }
        Ok(user)
    }

    /// Removal cookie that clears the session. Idempotent: setting it with
    /// no active session is a no-op.
    pub fn clear_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::new(SESSION_COOKIE, "");
        self.apply_policy(&mut cookie);
        cookie.set_max_age(time::Duration::ZERO);
        cookie
    }

    fn build_cookie(&self, token: String) -> Cookie<'static> {
        let mut cookie = Cookie::new(SESSION_COOKIE, token);
        self.apply_policy(&mut cookie);
        cookie.set_max_age(time::Duration::seconds(self.ttl_seconds as i64));
        cookie
    }

    fn apply_policy(&self, cookie: &mut Cookie<'static>) {
        cookie.set_http_only(true);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_path("/");
        cookie.set_secure(self.secure_cookies);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use common::clock::ManualClock;
    use serial_test::serial;

    fn manager_with_clock(secret: &str, ttl_seconds: u64) -> (SessionManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let config = SessionConfig {
            secret: secret.to_string(),
            ttl_seconds,
            secure_cookies: false,
        };
        (SessionManager::new(config, clock.clone()), clock)
    }

    fn sample_user() -> SessionUser {
        SessionUser {
            id: Uuid::new_v4(),
            name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            role: Role::User,
        }
    }

    #[test]
    fn verify_round_trips_issued_token() {
        let (manager, _clock) = manager_with_clock("test-secret", 3600);
        let user = sample_user();

        let cookie = manager.issue(&user).unwrap();
        let verified = manager.verify(cookie.value()).expect("token should verify");

        assert_eq!(verified, user);
    }

    #[test]
    fn expired_token_is_rejected() {
        let (manager, clock) = manager_with_clock("test-secret", 60);
        let cookie = manager.issue(&sample_user()).unwrap();

        clock.advance(Duration::seconds(59));
        assert!(manager.verify(cookie.value()).is_some());

        clock.advance(Duration::seconds(2));
        assert!(manager.verify(cookie.value()).is_none());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let (manager, _clock) = manager_with_clock("secret-a", 3600);
        let (other, _clock2) = manager_with_clock("secret-b", 3600);

        let cookie = other.issue(&sample_user()).unwrap();
        assert!(manager.verify(cookie.value()).is_none());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let (manager, _clock) = manager_with_clock("test-secret", 3600);
        let cookie = manager.issue(&sample_user()).unwrap();

        let mut token = cookie.value().to_string();
        token.pop();
        token.push('x');
        assert!(manager.verify(&token).is_none());
        assert!(manager.verify("not-a-token").is_none());
        assert!(manager.verify("").is_none());
    }

    #[test]
    fn cleared_cookie_yields_no_user() {
        let (manager, _clock) = manager_with_clock("test-secret", 3600);
        let user = sample_user();

        let jar = CookieJar::new().add(manager.issue(&user).unwrap());
        assert!(manager.current_user(&jar).is_some());

        let jar = jar.add(manager.clear_cookie());
        assert!(manager.current_user(&jar).is_none());
    }

    #[test]
    fn session_cookie_attributes() {
        let (manager, _clock) = manager_with_clock("test-secret", 3600);
        let cookie = manager.issue(&sample_user()).unwrap();

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(3600)));

        let cleared = manager.clear_cookie();
        assert_eq!(cleared.value(), "");
        assert_eq!(cleared.max_age(), Some(time::Duration::ZERO));
    }

    #[test]
    fn require_admin_checks_role() {
        let (manager, _clock) = manager_with_clock("test-secret", 3600);

        let member = sample_user();
        let jar = CookieJar::new().add(manager.issue(&member).unwrap());
        assert!(matches!(
            manager.require_admin(&jar),
            Err(PortalError::Forbidden)
        ));

        let admin = SessionUser {
            role: Role::Admin,
            ..sample_user()
        };
        let jar = CookieJar::new().add(manager.issue(&admin).unwrap());
        let verified = manager.require_admin(&jar).unwrap();
        assert_eq!(verified, admin);
    }

    #[test]
    fn require_user_without_session_is_unauthorized() {
        let (manager, _clock) = manager_with_clock("test-secret", 3600);
        let jar = CookieJar::new();

        assert!(matches!(
            manager.require_user(&jar),
            Err(PortalError::Unauthorized)
        ));
    }

    #[test]
    #[serial]
    fn config_requires_secret() {
        unsafe {
            std::env::remove_var("SESSION_SECRET");
        }
        assert!(SessionConfig::from_env().is_err());

        unsafe {
            std::env::set_var("SESSION_SECRET", "   ");
        }
        assert!(SessionConfig::from_env().is_err());

        unsafe {
            std::env::set_var("SESSION_SECRET", "a-real-secret");
        }
        let config = SessionConfig::from_env().unwrap();
        assert_eq!(config.ttl_seconds, DEFAULT_TTL_SECONDS);
        assert!(!config.secure_cookies);

        unsafe {
            std::env::remove_var("SESSION_SECRET");
        }
    }
}

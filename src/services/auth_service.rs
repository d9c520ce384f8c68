//! Authentication seam for Syncmarks.
//!
//! Token issuance and refresh belong to the external credential service;
//! the sync core only needs to turn an opaque `x-auth-token` header into
//! an authenticated user id. Tokens are `base64url(user_id:expiry)` plus a
//! base64url HMAC-SHA256 signature over the payload, sharing a secret with
//! the credential service. `issue` exists for tests and tooling.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use ring::hmac;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::errors::AuthError;

/// Trait defining token verification and (test/tooling) issuance.
pub trait AuthServiceTrait {
    /// Verifies a raw header value and resolves the authenticated user id.
    ///
    /// # Errors
    /// `AuthError::MissingToken` when the header is absent,
    /// `AuthError::Expired` when the signature verifies but the expiry has
    /// passed, `AuthError::InvalidToken` for anything else.
    fn verify(&self, token: Option<&str>) -> Result<i64, AuthError>;

    /// Issues a signed token for a user, valid for `ttl_secs` from now.
    fn issue(&self, user_id: i64, ttl_secs: i64) -> String;
}

/// HMAC-SHA256 token verifier sharing a secret with the credential service.
pub struct AuthService {
    key: hmac::Key,
}

impl AuthService {
    /// Creates an `AuthService` from the shared secret.
    ///
    /// The caller should zeroize its copy of the secret after this returns.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret),
        }
    }

    /// Returns the current UNIX timestamp in seconds.
    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }
}

impl AuthServiceTrait for AuthService {
    fn verify(&self, token: Option<&str>) -> Result<i64, AuthError> {
        let token = token.ok_or(AuthError::MissingToken)?;
        let (payload_b64, signature_b64) =
            token.split_once('.').ok_or(AuthError::InvalidToken)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| AuthError::InvalidToken)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| AuthError::InvalidToken)?;

        hmac::verify(&self.key, &payload, &signature).map_err(|_| AuthError::InvalidToken)?;

        let payload = std::str::from_utf8(&payload).map_err(|_| AuthError::InvalidToken)?;
        let (user_id, expires_at) = payload.split_once(':').ok_or(AuthError::InvalidToken)?;
        let user_id: i64 = user_id.parse().map_err(|_| AuthError::InvalidToken)?;
        let expires_at: i64 = expires_at.parse().map_err(|_| AuthError::InvalidToken)?;

        if expires_at <= Self::now() {
            return Err(AuthError::Expired);
        }
        Ok(user_id)
    }

    fn issue(&self, user_id: i64, ttl_secs: i64) -> String {
        let payload = format!("{}:{}", user_id, Self::now() + ttl_secs);
        let signature = hmac::sign(&self.key, payload.as_bytes());
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload.as_bytes()),
            URL_SAFE_NO_PAD.encode(signature.as_ref())
        )
    }
}

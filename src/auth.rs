//! Caller identity and capability checks.
//!
//! The HTTP layer hands the service an opaque `{id, role}` pair carried by an
//! HMAC-SHA256 signed bearer token. Token minting has no endpoint here; it is
//! exposed as a library call for operator tooling and tests.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(AppError::Unauthorized),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// Service-boundary permissions. Replaces role/action string matching with a
/// closed set the compiler checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    ManageOrders,
    ManageProducts,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Option<Uuid>,
    pub role: Role,
}

impl Actor {
    pub fn guest() -> Self {
        Self {
            user_id: None,
            role: Role::User,
        }
    }

    pub fn user(id: Uuid) -> Self {
        Self {
            user_id: Some(id),
            role: Role::User,
        }
    }

    pub fn admin(id: Uuid) -> Self {
        Self {
            user_id: Some(id),
            role: Role::Admin,
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::ManageOrders | Capability::ManageProducts => self.role == Role::Admin,
        }
    }

    pub fn require(&self, capability: Capability) -> Result<()> {
        if self.has(capability) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Label recorded in order transaction history.
    pub fn audit_label(&self) -> String {
        match self.user_id {
            Some(id) => id.to_string(),
            None => "Guest".to_string(),
        }
    }
}

/// Mints and verifies compact `payload.signature` bearer tokens, payload
/// being `user_id:role:expiry_unix`.
#[derive(Clone)]
pub struct AuthTokens {
    mac: Arc<HmacSha256>,
}

impl AuthTokens {
    pub fn new(secret: &str) -> Self {
        // HMAC accepts keys of any length.
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC key of any length is valid");
        Self { mac: Arc::new(mac) }
    }

    pub fn mint(&self, user_id: Uuid, role: Role, ttl: Duration) -> String {
        let expires = (Utc::now() + ttl).timestamp();
        let payload = format!("{user_id}:{role}:{expires}");
        let signature = self.sign(payload.as_bytes());
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload),
            URL_SAFE_NO_PAD.encode(signature)
        )
    }

    pub fn verify(&self, token: &str) -> Result<Actor> {
        let (payload_b64, signature_b64) = token.split_once('.').ok_or(AppError::Unauthorized)?;
        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| AppError::Unauthorized)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| AppError::Unauthorized)?;

        let mut mac = (*self.mac).clone();
        mac.update(&payload);
        mac.verify_slice(&signature)
            .map_err(|_| AppError::Unauthorized)?;

        let payload = String::from_utf8(payload).map_err(|_| AppError::Unauthorized)?;
        let mut parts = payload.split(':');
        let user_id = parts
            .next()
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or(AppError::Unauthorized)?;
        let role = parts.next().ok_or(AppError::Unauthorized)?.parse::<Role>()?;
        let expires = parts
            .next()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or(AppError::Unauthorized)?;
        if parts.next().is_some() || expires < Utc::now().timestamp() {
            return Err(AppError::Unauthorized);
        }

        Ok(Actor {
            user_id: Some(user_id),
            role,
        })
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = (*self.mac).clone();
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Absent header means an anonymous guest; a present but unverifiable token
/// is rejected outright.
#[async_trait]
impl FromRequestParts<AppState> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
            return Ok(Actor::guest());
        };
        let value = value.to_str().map_err(|_| AppError::Unauthorized)?;
        let token = value.strip_prefix("Bearer ").ok_or(AppError::Unauthorized)?;
        state.tokens.verify(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> AuthTokens {
        AuthTokens::new("test-secret")
    }

    #[test]
    fn mint_verify_round_trip() {
        let id = Uuid::new_v4();
        let token = tokens().mint(id, Role::Admin, Duration::minutes(5));
        let actor = tokens().verify(&token).unwrap();
        assert_eq!(actor.user_id, Some(id));
        assert_eq!(actor.role, Role::Admin);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = tokens().mint(Uuid::new_v4(), Role::User, Duration::minutes(5));
        let mut tampered = token.clone();
        tampered.pop();
        assert!(matches!(
            tokens().verify(&tampered),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = tokens().mint(Uuid::new_v4(), Role::User, Duration::seconds(-1));
        assert!(matches!(tokens().verify(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = tokens().mint(Uuid::new_v4(), Role::User, Duration::minutes(5));
        let other = AuthTokens::new("another-secret");
        assert!(matches!(other.verify(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn capabilities_are_admin_only() {
        let admin = Actor::admin(Uuid::new_v4());
        let user = Actor::user(Uuid::new_v4());
        assert!(admin.has(Capability::ManageOrders));
        assert!(!user.has(Capability::ManageOrders));
        assert!(user.require(Capability::ManageProducts).is_err());
    }

    #[test]
    fn guest_audit_label() {
        assert_eq!(Actor::guest().audit_label(), "Guest");
    }
}

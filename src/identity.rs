//! Request identity resolution.
//!
//! Turns the `Authorization: Bearer <jwt>` header of a request into the
//! [`OwnerId`] carried in the token's `sub` claim. CORS preflight
//! (`OPTIONS`) requests resolve to no identity without inspecting headers.
//!
//! Signature verification (HS256) is opt-in via `[auth] verify_signature`.
//! When disabled the claims are read unverified, which is only suitable
//! for local development.

use anyhow::{bail, Result};
use axum::http::{header::AUTHORIZATION, HeaderMap, Method};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::warn;

use second_brain_core::{BrainError, OwnerId};

use crate::config::AuthConfig;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
struct JwtHeader {
    alg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: Option<String>,
    exp: Option<f64>,
}

#[derive(Clone)]
pub struct IdentityResolver {
    secret: Option<Vec<u8>>,
}

impl IdentityResolver {
    /// Build from `[auth]`, reading the HS256 secret from the environment
    /// when verification is enabled.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        if !config.verify_signature {
            warn!("bearer token signatures are NOT verified (auth.verify_signature = false)");
            return Ok(Self::unverified());
        }
        match std::env::var(&config.secret_env) {
            Ok(secret) if !secret.is_empty() => Ok(Self::with_secret(secret.into_bytes())),
            _ => bail!(
                "auth.verify_signature is enabled but {} is not set",
                config.secret_env
            ),
        }
    }

    pub fn unverified() -> Self {
        Self { secret: None }
    }

    pub fn with_secret(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: Some(secret.into()),
        }
    }

    /// Resolve the caller of a request.
    ///
    /// Returns `Ok(None)` for `OPTIONS`, the owner for a valid bearer
    /// token, and [`BrainError::Unauthenticated`] otherwise.
    pub fn resolve(
        &self,
        method: &Method,
        headers: &HeaderMap,
    ) -> Result<Option<OwnerId>, BrainError> {
        if *method == Method::OPTIONS {
            return Ok(None);
        }

        let value = headers
            .get(AUTHORIZATION)
            .ok_or_else(|| unauthenticated("missing Authorization header"))?
            .to_str()
            .map_err(|_| unauthenticated("Authorization header is not valid ASCII"))?;

        let token = extract_bearer_token(value)
            .ok_or_else(|| unauthenticated("Authorization header must be 'Bearer <token>'"))?;

        self.decode(token).map(Some)
    }

    fn decode(&self, token: &str) -> Result<OwnerId, BrainError> {
        let mut segments = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(unauthenticated("malformed token"));
        };

        if let Some(secret) = &self.secret {
            let header: JwtHeader = decode_segment(header_b64)?;
            if header.alg.as_deref() != Some("HS256") {
                return Err(unauthenticated("unsupported token algorithm"));
            }
            let signature = URL_SAFE_NO_PAD
                .decode(signature_b64.trim_end_matches('='))
                .map_err(|_| unauthenticated("malformed token signature"))?;
            let mut mac = HmacSha256::new_from_slice(secret)
                .map_err(|_| unauthenticated("invalid signing secret"))?;
            mac.update(header_b64.as_bytes());
            mac.update(b".");
            mac.update(payload_b64.as_bytes());
            mac.verify_slice(&signature)
                .map_err(|_| unauthenticated("invalid token signature"))?;
        }

        let claims: Claims = decode_segment(payload_b64)?;

        if let Some(exp) = claims.exp {
            if exp < chrono::Utc::now().timestamp() as f64 {
                return Err(unauthenticated("token expired"));
            }
        }

        match claims.sub {
            Some(sub) if !sub.trim().is_empty() => Ok(OwnerId::new(sub)),
            _ => Err(unauthenticated("token has no sub claim")),
        }
    }
}

fn unauthenticated(msg: &str) -> BrainError {
    BrainError::Unauthenticated(msg.to_string())
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, BrainError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|_| unauthenticated("malformed token encoding"))?;
    serde_json::from_slice(&bytes).map_err(|_| unauthenticated("malformed token claims"))
}

/// Extract the token from a `Bearer <token>` header value.
///
/// The scheme is matched case-insensitively.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let header = header.trim();
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Encode `claims` as an HS256-signed token.
pub fn encode_hs256(claims: &serde_json::Value, secret: &[u8]) -> Result<String> {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|_| anyhow::anyhow!("invalid signing secret"))?;
    mac.update(header.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{header}.{payload}.{signature}"))
}

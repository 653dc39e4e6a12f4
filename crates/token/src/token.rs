// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HMAC-signed bearer tokens handed to a sandbox on spawn so its RPC/stream
//! calls back into the control plane can be authenticated, per spec §4.2.

use corral_core::{AgentId, Clock};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

const ISSUER: &str = "project-tab-backend";
const DEFAULT_TTL_MS: i64 = 60 * 60 * 1_000;
const CLOCK_TOLERANCE_SECS: u64 = 5;

/// Claims carried by a sandbox bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "agentId")]
    pub agent_id: AgentId,
    #[serde(rename = "sandboxId", default, skip_serializing_if = "Option::is_none")]
    pub sandbox_id: Option<String>,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub sub: String,
    pub jti: String,
}

/// A freshly issued token and when it expires.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at_ms: i64,
}

/// Failure modes surfaced by `validate_token`/`renew_token`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is expired")]
    Expired,
    #[error("token signature is invalid")]
    BadSignature,
    #[error("token is missing required claim `{0}`")]
    MissingClaim(&'static str),
    #[error("token is malformed: {0}")]
    Malformed(String),
    #[error("token agent `{token_agent}` does not match expected agent `{expected}`")]
    AgentMismatch {
        token_agent: String,
        expected: String,
    },
}

/// Issues and validates sandbox bearer tokens.
pub struct TokenService {
    secret: Vec<u8>,
    clock: Arc<dyn Clock>,
    default_ttl_ms: i64,
}

impl TokenService {
    pub fn new(secret: impl Into<Vec<u8>>, clock: Arc<dyn Clock>) -> Self {
        Self {
            secret: secret.into(),
            clock,
            default_ttl_ms: DEFAULT_TTL_MS,
        }
    }

    pub fn with_default_ttl_ms(mut self, ttl_ms: i64) -> Self {
        self.default_ttl_ms = ttl_ms;
        self
    }

    /// Issue a token for `agent_id`, optionally scoped to a sandbox id and
    /// with an explicit TTL (falls back to the service default, one hour).
    pub fn issue_token(
        &self,
        agent_id: AgentId,
        sandbox_id: Option<String>,
        ttl_ms: Option<i64>,
    ) -> Result<IssuedToken, TokenError> {
        let now_ms = self.clock.now_ms();
        let ttl_ms = ttl_ms.unwrap_or(self.default_ttl_ms);
        let expires_at_ms = now_ms + ttl_ms;

        let claims = Claims {
            sub: agent_id.to_string(),
            agent_id,
            sandbox_id,
            iat: now_ms / 1_000,
            exp: expires_at_ms / 1_000,
            iss: ISSUER.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|e| TokenError::Malformed(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at_ms,
        })
    }

    /// Validate a token's signature, issuer, and expiry, returning its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.leeway = CLOCK_TOLERANCE_SECS;

        let data = decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map_err(|e| classify_decode_error(e))?;

        Ok(data.claims)
    }

    /// Validate `old_token`, confirm it belongs to `agent_id`, and issue a
    /// replacement with a strictly later expiry.
    pub fn renew_token(
        &self,
        old_token: &str,
        agent_id: &AgentId,
    ) -> Result<IssuedToken, TokenError> {
        let claims = self.validate_token(old_token)?;
        if &claims.agent_id != agent_id {
            return Err(TokenError::AgentMismatch {
                token_agent: claims.agent_id.to_string(),
                expected: agent_id.to_string(),
            });
        }

        let now_ms = self.clock.now_ms();
        let min_expires_at_ms = (claims.exp * 1_000).max(now_ms) + 1;
        let ttl_ms = (min_expires_at_ms - now_ms).max(self.default_ttl_ms);

        self.issue_token(claims.agent_id, claims.sandbox_id, Some(ttl_ms))
    }
}

fn classify_decode_error(error: jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature => TokenError::BadSignature,
        ErrorKind::MissingRequiredClaim(claim) => TokenError::MissingClaim(match claim.as_str() {
            "exp" => "exp",
            "iat" => "iat",
            "sub" => "sub",
            "iss" => "iss",
            _ => "unknown",
        }),
        _ => TokenError::Malformed(error.to_string()),
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;

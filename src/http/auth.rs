//! JWT issuing and the authenticated-user extractor.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::header;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::app_config::AuthConfig;
use crate::domain::model::User;
use crate::http::AppState;
use crate::utils::error::{JournalError, Result};

pub const MISSING_HEADER_MESSAGE: &str = "Missing/invalid Authorization header";
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid token";

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub iat: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

/// HS256 簽發與驗證
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: Option<u64>,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl_secs: config.token_ttl_secs,
        }
    }

    pub fn issue(&self, user_id: i64) -> Result<String> {
        let now = Utc::now().timestamp().max(0) as u64;
        let claims = Claims {
            user_id,
            iat: now,
            exp: self.ttl_secs.map(|ttl| now + ttl),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// 沒有 exp 的 token 永久有效；有 exp 時照常檢查過期
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims = HashSet::new();
        validation.validate_aud = false;
        validation.leeway = 0;

        Ok(decode::<Claims>(token, &self.decoding, &validation)?.claims)
    }
}

/// 從 `Authorization: Bearer <token>` 取出 token
pub fn bearer_token(value: Option<&str>) -> Option<&str> {
    let parts: Vec<&str> = value?.split_whitespace().collect();
    match parts.as_slice() {
        ["Bearer", token] => Some(*token),
        _ => None,
    }
}

/// 已驗證身分的使用者
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = JournalError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let Some(token) = bearer_token(header_value) else {
            tracing::debug!("Missing or invalid Authorization header");
            return Err(JournalError::AuthError {
                message: MISSING_HEADER_MESSAGE.to_string(),
            });
        };

        let invalid = || JournalError::AuthError {
            message: INVALID_TOKEN_MESSAGE.to_string(),
        };

        let claims = state.tokens.verify(token).map_err(|e| {
            tracing::debug!("JWT validation failed: {}", e);
            invalid()
        })?;

        match state.store.find_user(claims.user_id).await? {
            Some(user) => Ok(AuthUser(user)),
            None => {
                tracing::debug!("Token refers to unknown user {}", claims.user_id);
                Err(invalid())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer(ttl: Option<u64>) -> TokenSigner {
        TokenSigner::new(&AuthConfig {
            jwt_secret: "test-secret-key-for-testing-only".to_string(),
            token_ttl_secs: ttl,
        })
    }

    #[test]
    fn test_issue_and_verify() {
        let signer = signer(None);
        let token = signer.issue(42).unwrap();
        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.exp, None);
    }

    #[test]
    fn test_rejects_other_secret() {
        let token = signer(None).issue(1).unwrap();
        let other = TokenSigner::new(&AuthConfig {
            jwt_secret: "another".to_string(),
            token_ttl_secs: None,
        });
        assert!(other.verify(&token).is_err());
        assert!(other.verify("not-a-token").is_err());
    }

    #[test]
    fn test_rejects_expired_token() {
        let signer = signer(Some(60));
        let claims = Claims {
            user_id: 1,
            iat: 1_000,
            exp: Some(1_060),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &signer.encoding).unwrap();
        assert!(signer.verify(&token).is_err());

        let fresh = signer.issue(1).unwrap();
        assert!(signer.verify(&fresh).unwrap().exp.is_some());
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(Some("bearer abc")), None);
        assert_eq!(bearer_token(Some("Bearer")), None);
        assert_eq!(bearer_token(Some("Bearer a b")), None);
        assert_eq!(bearer_token(None), None);
    }
}

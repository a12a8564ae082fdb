//! Session token issuance and validation (HS256).

use anyhow::anyhow;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::shared::errors::{ApiError, ApiResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
    pub jti: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

pub struct TokenManager {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenManager {
    pub fn from_config(config: AuthConfig) -> ApiResult<Self> {
        if config.jwt_secret.len() < 32 {
            return Err(ApiError::Internal(anyhow!(
                "JWT secret must be at least 32 characters"
            )));
        }
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        Ok(Self {
            config,
            encoding_key,
            decoding_key,
        })
    }

    /// Issue a session token for the account. Expiry is `token_ttl_hours`
    /// from now (24h in the default configuration).
    pub fn issue(&self, account_id: &str, email: &str) -> ApiResult<String> {
        let now = Utc::now();
        let expiry = now + Duration::hours(self.config.token_ttl_hours);
        let claims = Claims {
            sub: account_id.to_string(),
            iss: self.config.token_issuer.clone(),
            aud: self.config.token_audience.clone(),
            exp: expiry.timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
        };
        let header = Header::new(Algorithm::HS256);
        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(anyhow!("failed to encode session token: {e}")))
    }

    /// Validate signature, expiry, issuer and audience. Any failure is None;
    /// callers treat None as "unauthenticated", never as a crash.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.token_issuer]);
        validation.set_audience(&[&self.config.token_audience]);
        validation.leeway = self.config.leeway_seconds;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .ok()
            .map(|data| data.claims)
    }
}

pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
}

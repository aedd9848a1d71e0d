use anyhow::{Result, anyhow};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::iam::AuthenticatedUser;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub iat: usize,
    pub exp: usize,
}

/// The signed-in user attached to a request once its session checks out.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub email: String,
}

impl TryFrom<SessionClaims> for SessionUser {
    type Error = anyhow::Error;

    fn try_from(claims: SessionClaims) -> Result<Self> {
        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|_| anyhow!("Invalid user ID in session"))?;
        Ok(Self {
            user_id,
            email: claims.email,
        })
    }
}

/// HS256 keys for session tokens.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: i64,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    pub fn issue(&self, user: &AuthenticatedUser) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            iat: now.try_into()?,
            exp: (now + self.ttl_seconds).try_into()?,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| anyhow!("Session signing failed: {}", e))
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        let validation = Validation::new(Algorithm::HS256);
        let token_data = decode::<SessionClaims>(token, &self.decoding, &validation)
            .map_err(|e| anyhow!("Session validation failed: {}", e))?;
        Ok(token_data.claims)
    }
}

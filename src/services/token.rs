use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

const DEFAULT_TTL_SECONDS: u64 = 86_400;

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_seconds: u64,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET").map_err(|_| anyhow!("JWT_SECRET must be set"))?;
        let ttl_seconds = std::env::var("JWT_TTL_SECONDS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_TTL_SECONDS);

        Ok(Self {
            secret,
            ttl_seconds,
        })
    }
}

/// Bearer token payload. `sub` carries the organizer's email, which is also
/// how events reference their owner.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub role: String,
    pub iat: usize,
    pub exp: usize,
}

pub fn issue_token(email: &str, role: &str, config: &JwtConfig) -> Result<String> {
    let now = unix_seconds()?;
    let exp = now
        .checked_add(config.ttl_seconds)
        .ok_or_else(|| anyhow!("token expiry overflow"))?;

    let claims = TokenClaims {
        sub: email.to_string(),
        role: role.to_string(),
        iat: now as usize,
        exp: exp as usize,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn verify_token(token: &str, config: &JwtConfig) -> Result<TokenClaims> {
    let data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;

    Ok(data.claims)
}

fn unix_seconds() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .map_err(|_| anyhow!("invalid system clock"))
}

//! Verification of owner access tokens.
//!
//! Tokens are issued by the account service that owns login; this service
//! only checks them. They are HS256-signed and carry the owner id as `sub`.
//! [`issue_token`] exists for local tooling and tests.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use reel_core::types::DbId;

/// Claims the service reads from an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerClaims {
    pub sub: DbId,
    pub exp: i64,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared HMAC secret.
    pub secret: String,
    /// When set, tokens must carry this `iss`.
    pub issuer: Option<String>,
    /// Clock skew tolerated on `exp`, in seconds.
    pub leeway_secs: u64,
}

const DEFAULT_LEEWAY_SECS: u64 = 30;

impl JwtConfig {
    /// | Env Var            | Required | Default |
    /// |--------------------|----------|---------|
    /// | `JWT_SECRET`       | **yes**  | --      |
    /// | `JWT_ISSUER`       | no       | (any)   |
    /// | `JWT_LEEWAY_SECS`  | no       | `30`    |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is missing or empty.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_default();
        assert!(!secret.is_empty(), "JWT_SECRET must be set and non-empty");

        let issuer = std::env::var("JWT_ISSUER").ok().filter(|s| !s.trim().is_empty());
        let leeway_secs = match std::env::var("JWT_LEEWAY_SECS") {
            Ok(raw) => raw.parse().expect("JWT_LEEWAY_SECS must be a valid u64"),
            Err(_) => DEFAULT_LEEWAY_SECS,
        };

        Self {
            secret,
            issuer,
            leeway_secs,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway_secs;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        validation
    }
}

/// Check signature, expiry and issuer, returning the owner the token is for.
pub fn verify_token(token: &str, config: &JwtConfig) -> Result<OwnerClaims, jsonwebtoken::errors::Error> {
    let key = DecodingKey::from_secret(config.secret.as_bytes());
    Ok(decode::<OwnerClaims>(token, &key, &config.validation())?.claims)
}

/// Sign a token for `owner_id` valid for `ttl_secs`.
pub fn issue_token(
    owner_id: DbId,
    ttl_secs: i64,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = OwnerClaims {
        sub: owner_id,
        exp: now + ttl_secs,
        iat: now,
        iss: config.issuer.clone(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

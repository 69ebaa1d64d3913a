//! Ed25519 access tokens via `jwt_simple`.
//!
//! One token kind only: a 7-day access token whose subject is the user id
//! and whose custom claims carry the tenant (`client_id`) and display name.

use base64::Engine;
use jwt_simple::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

const DEFAULT_EXPIRY_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub client_id: String,
    pub name: String,
}

/// Verified claims handed to the auth middleware.
#[derive(Debug, Clone)]
pub struct Claims {
    pub sub: String,
    pub client_id: String,
    pub name: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Clone)]
pub struct JwtKeys {
    key_pair: Arc<Ed25519KeyPair>,
    public_key: Arc<Ed25519PublicKey>,
    pub access_token_expiry: i64,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

impl JwtKeys {
    /// Loads the signing key from `JWT_PRIVATE_KEY` (base64 Ed25519 bytes).
    /// Panics on a missing or malformed key; the process cannot serve
    /// requests without one.
    pub fn from_env(
        access_token_expiry: i64,
        issuer: Option<String>,
        audience: Option<String>,
    ) -> Self {
        let encoded = std::env::var("JWT_PRIVATE_KEY").expect("JWT_PRIVATE_KEY must be set");
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&encoded)
            .expect("JWT_PRIVATE_KEY must be valid base64");
        let key_pair =
            Ed25519KeyPair::from_bytes(&bytes).expect("JWT_PRIVATE_KEY must be an Ed25519 key");

        let mut keys = Self::from_key_pair(key_pair);
        keys.access_token_expiry = access_token_expiry;
        keys.issuer = issuer;
        keys.audience = audience;
        keys
    }

    pub fn from_key_pair(key_pair: Ed25519KeyPair) -> Self {
        let public_key = key_pair.public_key();
        Self {
            key_pair: Arc::new(key_pair),
            public_key: Arc::new(public_key),
            access_token_expiry: DEFAULT_EXPIRY_SECS,
            issuer: None,
            audience: None,
        }
    }

    /// Returns `(private_b64, public_b64)` for provisioning and tests.
    pub fn generate_key_pair() -> (String, String) {
        let key_pair = Ed25519KeyPair::generate();
        let engine = &base64::engine::general_purpose::STANDARD;
        (
            engine.encode(key_pair.to_bytes()),
            engine.encode(key_pair.public_key().to_bytes()),
        )
    }

    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        client_id: Uuid,
        name: &str,
    ) -> Result<String, jwt_simple::Error> {
        let custom = AccessClaims {
            client_id: client_id.to_string(),
            name: name.to_string(),
        };

        let mut claims = jwt_simple::claims::Claims::with_custom_claims(
            custom,
            Duration::from_secs(self.access_token_expiry as u64),
        )
        .with_subject(user_id.to_string());

        if let Some(issuer) = &self.issuer {
            claims = claims.with_issuer(issuer);
        }
        if let Some(audience) = &self.audience {
            claims = claims.with_audience(audience);
        }

        self.key_pair.sign(claims)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<Claims, jwt_simple::Error> {
        let options = VerificationOptions {
            allowed_issuers: self.issuer.clone().map(|i| HashSet::from([i])),
            allowed_audiences: self.audience.clone().map(|a| HashSet::from([a])),
            ..Default::default()
        };

        let verified = self
            .public_key
            .verify_token::<AccessClaims>(token, Some(options))?;

        Ok(Claims {
            sub: verified.subject.unwrap_or_default(),
            client_id: verified.custom.client_id,
            name: verified.custom.name,
            exp: verified.expires_at.map(|t| t.as_secs() as i64).unwrap_or(0),
            iat: verified.issued_at.map(|t| t.as_secs() as i64).unwrap_or(0),
        })
    }
}

//! Session Token Decoding
//!
//! Reads the claims carried by backend-issued session tokens. The gateway
//! holds no signing secret, so decoding never proves authenticity: trust in
//! a token comes from the backend's `/protected` check.

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Deserializer, Serialize};

/// Claims embedded in a session token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    /// Backend user identifier, issued either as a number or a string
    #[serde(deserialize_with = "user_id_from_any")]
    pub user_id: String,
    #[serde(default)]
    pub username: String,
    /// Elevated privileges; absent means false
    #[serde(default)]
    pub admin: bool,
    /// Token expiration timestamp (epoch seconds)
    #[serde(default)]
    pub exp: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
#[error("malformed session token: {0}")]
pub struct DecodeError(#[from] jsonwebtoken::errors::Error);

/// Decode the payload of a session token without verifying it.
///
/// Signature, expiry and audience checks are all disabled; only the shape
/// of the payload is validated.
pub fn decode_unverified(token: &str) -> Result<SessionClaims, DecodeError> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<SessionClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims)
}

fn user_id_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

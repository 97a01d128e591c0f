//! crates/question_paper_core/src/identity.rs
//!
//! Bearer-token verification against the identity provider's published key set.
//!
//! Keys are fetched on every call. A token is accepted only when its key id
//! resolves to a published key, the signature verifies, `exp` lies in the
//! future and, if an `aud` claim is present, it names our client id.

use chrono::Utc;
use jsonwebtoken::{decode, decode_header, errors::ErrorKind, DecodingKey, Validation};
use std::sync::Arc;

use crate::domain::TokenClaims;
use crate::ports::SigningKeySource;

/// Why a token was rejected. Callers only ever surface "invalid token";
/// the reason is kept for logs and tests.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenRejection {
    #[error("signing keys could not be fetched: {0}")]
    KeySetUnavailable(String),
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("token header has no key id")]
    MissingKeyId,
    #[error("no published key with id {0}")]
    UnknownKey(String),
    #[error("signature verification failed")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token was not issued for this audience")]
    AudienceMismatch,
}

pub struct TokenVerifier {
    keys: Arc<dyn SigningKeySource>,
    client_id: String,
}

impl TokenVerifier {
    pub fn new(keys: Arc<dyn SigningKeySource>, client_id: impl Into<String>) -> Self {
        Self {
            keys,
            client_id: client_id.into(),
        }
    }

    pub async fn verify(&self, token: &str) -> Result<TokenClaims, TokenRejection> {
        let key_set = self
            .keys
            .signing_keys()
            .await
            .map_err(|e| TokenRejection::KeySetUnavailable(e.to_string()))?;

        let header = decode_header(token).map_err(|e| TokenRejection::Malformed(e.to_string()))?;
        let kid = header.kid.ok_or(TokenRejection::MissingKeyId)?;
        let jwk = key_set
            .find(&kid)
            .ok_or_else(|| TokenRejection::UnknownKey(kid.clone()))?;
        let key = DecodingKey::from_jwk(jwk).map_err(|e| TokenRejection::Malformed(e.to_string()))?;

        // Expiry and audience are checked below with exact semantics.
        let mut validation = Validation::new(header.alg);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<TokenClaims>(token, &key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenRejection::InvalidSignature,
                _ => TokenRejection::Malformed(e.to_string()),
            })?
            .claims;

        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenRejection::Expired);
        }
        if let Some(aud) = &claims.aud {
            if *aud != self.client_id {
                return Err(TokenRejection::AudienceMismatch);
            }
        }

        Ok(claims)
    }
}

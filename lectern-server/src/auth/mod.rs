//! Bearer token verification.
//!
//! Lectern never issues tokens. The identity provider signs HS256 JWTs with
//! a shared secret; this module validates them and produces the
//! [`Principal`] the rest of the server trusts.

pub mod middleware;

use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use lectern_core::domain::identity::{Principal, Role};

/// Claims expected on inbound tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id, rendered as a string by the issuer.
    pub sub: String,
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier").finish_non_exhaustive()
    }
}

impl TokenVerifier {
    /// When `issuer` is set, tokens must carry a matching `iss` claim.
    pub fn new(secret: &str, issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
            // set_issuer only installs the allow-list; the claim itself must
            // be marked required or a token without `iss` slips through.
            validation.required_spec_claims.insert("iss".to_string());
        }

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }

    /// Validate a token and produce the request principal.
    ///
    /// Expiry is enforced by the decoder; a non-numeric subject or an unknown
    /// role rejects the token as well.
    pub fn verify(&self, token: &str) -> Result<Principal, jsonwebtoken::errors::Error> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        let user_id: i64 = claims.sub.parse().map_err(|_| {
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::InvalidSubject)
        })?;
        let role: Role = claims.role.parse().map_err(|_| {
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::InvalidToken)
        })?;

        Ok(Principal {
            user_id,
            email: claims.email,
            role,
        })
    }
}

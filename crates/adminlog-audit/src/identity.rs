//! Caller identity resolution from bearer credentials.
//!
//! Token issuance lives elsewhere; this module only needs to strip the bearer
//! prefix and read the subject claim. [`TokenResolver`] is the seam, and
//! [`JwtResolver`] is the HS256 implementation used by the server.

use crate::config::IdentityPolicy;
use crate::error::IdentityError;
use axum::http::{HeaderMap, header};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

/// Default scheme marker in front of the credential.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Extracts a subject identifier from a bearer credential.
pub trait TokenResolver: Send + Sync {
    /// Strip the bearer prefix from a raw `Authorization` header value.
    fn strip_bearer<'a>(&self, header_value: &'a str) -> Result<&'a str, IdentityError>;

    /// Decode a credential and return its subject claim.
    fn subject(&self, token: &str) -> Result<String, IdentityError>;
}

/// Claims read from an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

/// HS256 JWT resolver with a shared secret.
pub struct JwtResolver {
    key: DecodingKey,
    validation: Validation,
    prefix: String,
}

impl JwtResolver {
    /// Create a resolver using the default `Bearer ` prefix.
    pub fn new(secret: &str) -> Self {
        Self::with_prefix(secret, BEARER_PREFIX)
    }

    /// Create a resolver with a custom scheme prefix.
    pub fn with_prefix(secret: &str, prefix: impl Into<String>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` is checked when present but not demanded.
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            prefix: prefix.into(),
        }
    }
}

impl TokenResolver for JwtResolver {
    fn strip_bearer<'a>(&self, header_value: &'a str) -> Result<&'a str, IdentityError> {
        header_value
            .strip_prefix(self.prefix.as_str())
            .ok_or(IdentityError::MissingBearerPrefix)
    }

    fn subject(&self, token: &str) -> Result<String, IdentityError> {
        decode::<SubjectClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))
    }
}

/// Resolve the caller identity for an audit record.
///
/// An absent `Authorization` header is never an error. A present header that
/// cannot be resolved follows `policy`: lenient yields `None`, strict returns
/// the error.
pub fn resolve_identity(
    headers: &HeaderMap,
    resolver: &dyn TokenResolver,
    policy: IdentityPolicy,
) -> Result<Option<String>, IdentityError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let resolved = value
        .to_str()
        .map_err(|_| IdentityError::UnreadableHeader)
        .and_then(|raw| resolver.strip_bearer(raw))
        .and_then(|token| resolver.subject(token));

    match (resolved, policy) {
        (Ok(subject), _) => Ok(Some(subject)),
        (Err(e), IdentityPolicy::Lenient) => {
            tracing::warn!(error = %e, "Could not resolve caller identity for audit log");
            Ok(None)
        }
        (Err(e), IdentityPolicy::Strict) => Err(e),
    }
}

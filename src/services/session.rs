use crate::core::context::{Actor, ActorContext};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while resolving the caller's identity
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Authorization header must be 'Bearer <token>'")]
    MalformedHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

/// Claims issued by the hosted auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Verifies HS256 access tokens and turns them into an [`ActorContext`]
pub struct SessionVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl SessionVerifier {
    pub fn new(jwt_secret: &str, audience: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        Self {
            key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<Actor, SessionError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;

        Ok(Actor {
            id: data.claims.sub,
            email: data.claims.email,
        })
    }

    /// Resolve an `Authorization` header value.
    ///
    /// No header means an anonymous caller; a header that is present but
    /// not a valid bearer token is an error.
    pub fn context_from_header(&self, header: Option<&str>) -> Result<ActorContext, SessionError> {
        let Some(value) = header else {
            return Ok(ActorContext::anonymous());
        };

        let token = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(SessionError::MalformedHeader)?;

        let actor = self.verify(token)?;
        tracing::debug!("Authenticated actor {}", actor.id);
        Ok(ActorContext::with_actor(actor))
    }
}

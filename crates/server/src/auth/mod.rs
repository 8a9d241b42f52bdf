pub mod jwt;
pub mod middleware;

use crate::config::Config;
use crate::error::SessionError;

/// Resolves bearer tokens to usernames.
#[derive(Clone, Debug)]
pub struct Authenticator {
    secret: String,
}

impl Authenticator {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.jwt_secret.clone())
    }

    pub fn authenticate(&self, token: &str) -> Result<String, SessionError> {
        jwt::verify_token(token, &self.secret)
            .map(|claims| claims.sub)
            .filter(|username| !username.is_empty())
            .ok_or(SessionError::Unauthenticated)
    }
}

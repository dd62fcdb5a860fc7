//! Request and access token types.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::decoder::string_value;
use super::error::AuthenticationError;
use super::secret::SecureString;

/// Response key of the token.
pub const OAUTH_TOKEN: &str = "oauth_token";
/// Response key of the token secret.
pub const OAUTH_TOKEN_SECRET: &str = "oauth_token_secret";
const ACCESS_TOKEN: &str = "access_token";

/// Short-lived token obtained before the user authorization.
///
/// It is saved in the [`RequestTokenStorage`](crate::RequestTokenStorage)
/// between the authorization redirect and the access token exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestToken {
    token: String,
    secret: SecureString,
}

impl RequestToken {
    /// Creates a request token.
    pub fn new(token: impl Into<String>, secret: impl Into<SecureString>) -> Self {
        Self {
            token: token.into(),
            secret: secret.into(),
        }
    }

    /// Reads the token from a decoded request token response.
    pub(crate) fn from_response(response: &Map<String, Value>) -> Result<Self, AuthenticationError> {
        let token = string_value(response, OAUTH_TOKEN).filter(|token| !token.is_empty());
        let secret = string_value(response, OAUTH_TOKEN_SECRET);

        match (token, secret) {
            (Some(token), Some(secret)) => Ok(Self::new(token, secret)),
            (None, _) => Err(AuthenticationError::InvalidRequestToken {
                reason: format!("missing '{OAUTH_TOKEN}'"),
            }),
            (_, None) => Err(AuthenticationError::InvalidRequestToken {
                reason: format!("missing '{OAUTH_TOKEN_SECRET}'"),
            }),
        }
    }

    /// Returns the token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the token secret.
    pub fn secret(&self) -> &SecureString {
        &self.secret
    }
}

impl fmt::Debug for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestToken")
            .field("token", &self.token)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Credential used to call the provider on behalf of the user.
///
/// Besides the token and its secret, the whole provider response is kept:
/// providers often return user identifiers along with the grant.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    token: String,
    #[serde(default)]
    secret: SecureString,
    #[serde(default)]
    raw: Map<String, Value>,
}

impl AccessToken {
    /// Creates an access token.
    pub fn new(token: impl Into<String>, secret: impl Into<SecureString>) -> Self {
        Self {
            token: token.into(),
            secret: secret.into(),
            raw: Map::new(),
        }
    }

    /// Reads the token from a decoded access token response.
    ///
    /// Accepts `oauth_token`, or `access_token` as a fallback; the secret
    /// defaults to empty.
    pub(crate) fn from_response(response: Map<String, Value>) -> Result<Self, AuthenticationError> {
        let token = string_value(&response, OAUTH_TOKEN)
            .or_else(|| string_value(&response, ACCESS_TOKEN))
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AuthenticationError::InvalidAccessToken {
                reason: format!("missing '{OAUTH_TOKEN}'"),
            })?;
        let secret = string_value(&response, OAUTH_TOKEN_SECRET).unwrap_or_default();

        Ok(Self {
            token,
            secret: secret.into(),
            raw: response,
        })
    }

    /// Returns the token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the token secret, empty if the provider sent none.
    pub fn secret(&self) -> &SecureString {
        &self.secret
    }

    /// Returns the raw provider response.
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    /// Returns a value of the raw provider response.
    pub fn get(&self, key: &str) -> Option<String> {
        string_value(&self.raw, key)
    }
}

impl From<&str> for AccessToken {
    fn from(token: &str) -> Self {
        Self::new(token, SecureString::default())
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("secret", &"[REDACTED]")
            .field("raw", &self.raw.keys().collect::<Vec<_>>())
            .finish()
    }
}

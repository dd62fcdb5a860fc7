use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

use super::token::OAUTH_TOKEN;

/// Parameter carrying the verifier.
pub const OAUTH_VERIFIER: &str = "oauth_verifier";

/// Parameters that signal a refused authorization in the callback.
pub(crate) const DENIAL_PARAMETERS: [&str; 3] = ["denied", "error", "oauth_problem"];

/// Parameters of the callback request sent back by the provider.
///
/// ```rust
/// use oauth1_owner::CallbackParameters;
///
/// let callback = CallbackParameters::from_query("oauth_token=token&oauth_verifier=code")?;
/// assert_eq!(callback.oauth_token(), Some("token"));
/// assert_eq!(callback.oauth_verifier(), Some("code"));
/// # Ok::<(), serde_urlencoded::de::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackParameters(IndexMap<String, String>);

impl CallbackParameters {
    /// Parses a URL-encoded query string.
    ///
    /// # Errors
    ///
    /// Fails if the query cannot be deserialized.
    pub fn from_query(query: &str) -> Result<Self, serde_urlencoded::de::Error> {
        serde_urlencoded::from_str(query.trim_start_matches('?')).map(Self)
    }

    /// Reads the query of a callback URL.
    pub fn from_url(url: &Url) -> Self {
        url.query_pairs()
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect()
    }

    /// Adds or replaces a parameter.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Returns a parameter value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Returns the request token of the callback.
    pub fn oauth_token(&self) -> Option<&str> {
        self.get(OAUTH_TOKEN)
    }

    /// Returns the verifier of the callback.
    pub fn oauth_verifier(&self) -> Option<&str> {
        self.get(OAUTH_VERIFIER)
    }

    /// Returns the first error-signaling parameter and its value.
    pub(crate) fn denial(&self) -> Option<(&str, &str)> {
        DENIAL_PARAMETERS
            .iter()
            .find_map(|name| self.get(name).map(|value| (*name, value)))
    }
}

impl<K, V> FromIterator<(K, V)> for CallbackParameters
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

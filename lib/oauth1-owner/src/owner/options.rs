//! Resource owner options and builder.

use std::fmt;

use indexmap::IndexMap;
use serde::Deserialize;
use url::Url;

use super::error::ConfigurationError;
use super::secret::SecureString;
use super::signature::SignatureMethod;

/// Option holding the user information endpoint.
pub const INFOS_URL: &str = "infos_url";
/// Option holding the consumer key.
pub const CLIENT_ID: &str = "client_id";
/// Option holding the consumer secret.
pub const CLIENT_SECRET: &str = "client_secret";
/// Option holding the requested scope.
pub const SCOPE: &str = "scope";
/// Option holding the request token endpoint.
pub const REQUEST_TOKEN_URL: &str = "request_token_url";
/// Option holding the user authorization endpoint.
pub const AUTHORIZATION_URL: &str = "authorization_url";
/// Option holding the access token endpoint.
pub const ACCESS_TOKEN_URL: &str = "access_token_url";
/// Option holding the name of the registered user response type.
pub const USER_RESPONSE_CLASS: &str = "user_response_class";
/// Option holding the realm of the `Authorization` header.
pub const REALM: &str = "realm";
/// Option holding the signature method.
pub const SIGNATURE_METHOD: &str = "signature_method";

/// Immutable options of one resource owner.
///
/// Use [`OptionsBuilder`] to create instances, or deserialize them from a
/// string map:
///
/// ```rust
/// use oauth1_owner::Options;
///
/// let options = Options::from_pairs([
///     ("infos_url", "http://user.info/"),
///     ("client_id", "clientid"),
///     ("client_secret", "clientsecret"),
///     ("request_token_url", "http://user.request/"),
///     ("authorization_url", "http://user.auth/"),
///     ("access_token_url", "http://user.access/"),
/// ])?;
///
/// assert_eq!(options.option("infos_url")?, "http://user.info/");
/// assert!(options.option("non_existing").is_err());
/// # Ok::<(), oauth1_owner::ConfigurationError>(())
/// ```
#[derive(Clone, Deserialize)]
#[serde(try_from = "IndexMap<String, String>")]
pub struct Options {
    client_id: String,
    client_secret: SecureString,
    infos_url: Url,
    request_token_url: Url,
    authorization_url: Url,
    access_token_url: Url,
    scope: String,
    realm: Option<String>,
    signature_method: SignatureMethod,
    user_response_class: Option<String>,
}

impl Options {
    /// Creates a builder.
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::default()
    }

    /// Builds options from `(name, value)` pairs.
    ///
    /// # Errors
    ///
    /// Fails on unknown names, invalid values, or missing required options.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self, ConfigurationError>
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .try_fold(OptionsBuilder::default(), |builder, (name, value)| {
                builder.with_option(name.as_ref(), value)
            })?
            .build()
    }

    /// Loads options from a YAML mapping.
    ///
    /// # Errors
    ///
    /// Fails if the document is not a string mapping, or on invalid options.
    #[cfg(feature = "yaml")]
    pub fn from_yaml(document: &str) -> Result<Self, ConfigurationError> {
        let pairs: IndexMap<String, String> =
            serde_saphyr::from_str(document).map_err(|err| ConfigurationError::InvalidDocument {
                reason: err.to_string(),
            })?;
        Self::try_from(pairs)
    }

    /// Returns the configured value of an option.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownOption`] if the name is not a
    /// recognized option, and [`ConfigurationError::MissingOption`] if an
    /// optional option has no value.
    pub fn option(&self, name: &str) -> Result<&str, ConfigurationError> {
        let value = match name {
            INFOS_URL => Some(self.infos_url.as_str()),
            CLIENT_ID => Some(self.client_id.as_str()),
            CLIENT_SECRET => Some(self.client_secret.as_str()),
            SCOPE => Some(self.scope.as_str()),
            REQUEST_TOKEN_URL => Some(self.request_token_url.as_str()),
            AUTHORIZATION_URL => Some(self.authorization_url.as_str()),
            ACCESS_TOKEN_URL => Some(self.access_token_url.as_str()),
            SIGNATURE_METHOD => Some(self.signature_method.as_str()),
            REALM => self.realm.as_deref(),
            USER_RESPONSE_CLASS => self.user_response_class.as_deref(),
            _ => {
                return Err(ConfigurationError::UnknownOption {
                    name: name.to_string(),
                });
            }
        };

        value.ok_or_else(|| ConfigurationError::MissingOption {
            name: name.to_string(),
        })
    }

    /// Returns the consumer key.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the consumer secret.
    pub fn client_secret(&self) -> &SecureString {
        &self.client_secret
    }

    /// Returns the user information endpoint.
    pub fn infos_url(&self) -> &Url {
        &self.infos_url
    }

    /// Returns the request token endpoint.
    pub fn request_token_url(&self) -> &Url {
        &self.request_token_url
    }

    /// Returns the user authorization endpoint.
    pub fn authorization_url(&self) -> &Url {
        &self.authorization_url
    }

    /// Returns the access token endpoint.
    pub fn access_token_url(&self) -> &Url {
        &self.access_token_url
    }

    /// Returns the requested scope, possibly empty.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Returns the realm used in the `Authorization` header.
    pub fn realm(&self) -> Option<&str> {
        self.realm.as_deref()
    }

    /// Returns the signature method.
    pub fn signature_method(&self) -> SignatureMethod {
        self.signature_method
    }

    /// Returns the name of the registered user response type.
    pub fn user_response_class(&self) -> Option<&str> {
        self.user_response_class.as_deref()
    }
}

impl TryFrom<IndexMap<String, String>> for Options {
    type Error = ConfigurationError;

    fn try_from(value: IndexMap<String, String>) -> Result<Self, Self::Error> {
        Self::from_pairs(value)
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("infos_url", &self.infos_url)
            .field("request_token_url", &self.request_token_url)
            .field("authorization_url", &self.authorization_url)
            .field("access_token_url", &self.access_token_url)
            .field("scope", &self.scope)
            .field("realm", &self.realm)
            .field("signature_method", &self.signature_method)
            .field("user_response_class", &self.user_response_class)
            .finish()
    }
}

/// Builder for [`Options`].
#[derive(Clone, Default)]
pub struct OptionsBuilder {
    client_id: Option<String>,
    client_secret: Option<SecureString>,
    infos_url: Option<Url>,
    request_token_url: Option<Url>,
    authorization_url: Option<Url>,
    access_token_url: Option<Url>,
    scope: Option<String>,
    realm: Option<String>,
    signature_method: Option<SignatureMethod>,
    user_response_class: Option<String>,
}

impl OptionsBuilder {
    /// Sets an option by name.
    ///
    /// # Errors
    ///
    /// Fails on unknown names and invalid values.
    pub fn with_option(self, name: &str, value: impl Into<String>) -> Result<Self, ConfigurationError> {
        let value = value.into();
        match name {
            INFOS_URL => self.with_infos_url(value),
            CLIENT_ID => Ok(self.with_client_id(value)),
            CLIENT_SECRET => Ok(self.with_client_secret(value)),
            SCOPE => Ok(self.with_scope(value)),
            REQUEST_TOKEN_URL => self.with_request_token_url(value),
            AUTHORIZATION_URL => self.with_authorization_url(value),
            ACCESS_TOKEN_URL => self.with_access_token_url(value),
            USER_RESPONSE_CLASS => Ok(self.with_user_response_class(value)),
            REALM => Ok(self.with_realm(value)),
            SIGNATURE_METHOD => Ok(self.with_signature_method(value.parse()?)),
            _ => Err(ConfigurationError::UnknownOption {
                name: name.to_string(),
            }),
        }
    }

    /// Sets the consumer key.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the consumer secret.
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<SecureString>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Sets the user information endpoint.
    pub fn with_infos_url(mut self, url: impl AsRef<str>) -> Result<Self, ConfigurationError> {
        self.infos_url = Some(parse_url(INFOS_URL, url.as_ref())?);
        Ok(self)
    }

    /// Sets the request token endpoint.
    pub fn with_request_token_url(mut self, url: impl AsRef<str>) -> Result<Self, ConfigurationError> {
        self.request_token_url = Some(parse_url(REQUEST_TOKEN_URL, url.as_ref())?);
        Ok(self)
    }

    /// Sets the user authorization endpoint.
    pub fn with_authorization_url(mut self, url: impl AsRef<str>) -> Result<Self, ConfigurationError> {
        self.authorization_url = Some(parse_url(AUTHORIZATION_URL, url.as_ref())?);
        Ok(self)
    }

    /// Sets the access token endpoint.
    pub fn with_access_token_url(mut self, url: impl AsRef<str>) -> Result<Self, ConfigurationError> {
        self.access_token_url = Some(parse_url(ACCESS_TOKEN_URL, url.as_ref())?);
        Ok(self)
    }

    /// Sets the requested scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Sets the realm of the `Authorization` header.
    #[must_use]
    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }

    /// Sets the signature method.
    #[must_use]
    pub fn with_signature_method(mut self, method: SignatureMethod) -> Self {
        self.signature_method = Some(method);
        self
    }

    /// Selects a registered user response type by name.
    #[must_use]
    pub fn with_user_response_class(mut self, name: impl Into<String>) -> Self {
        self.user_response_class = Some(name.into());
        self
    }

    /// Builds the options.
    ///
    /// # Errors
    ///
    /// Fails if a required option is missing.
    pub fn build(self) -> Result<Options, ConfigurationError> {
        let Self {
            client_id,
            client_secret,
            infos_url,
            request_token_url,
            authorization_url,
            access_token_url,
            scope,
            realm,
            signature_method,
            user_response_class,
        } = self;

        Ok(Options {
            client_id: required(CLIENT_ID, client_id)?,
            client_secret: required(CLIENT_SECRET, client_secret)?,
            infos_url: required(INFOS_URL, infos_url)?,
            request_token_url: required(REQUEST_TOKEN_URL, request_token_url)?,
            authorization_url: required(AUTHORIZATION_URL, authorization_url)?,
            access_token_url: required(ACCESS_TOKEN_URL, access_token_url)?,
            scope: scope.unwrap_or_default(),
            realm,
            signature_method: signature_method.unwrap_or_default(),
            user_response_class,
        })
    }
}

impl fmt::Debug for OptionsBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsBuilder")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("infos_url", &self.infos_url)
            .field("request_token_url", &self.request_token_url)
            .field("authorization_url", &self.authorization_url)
            .field("access_token_url", &self.access_token_url)
            .finish_non_exhaustive()
    }
}

fn parse_url(name: &str, value: &str) -> Result<Url, ConfigurationError> {
    Url::parse(value).map_err(|err| ConfigurationError::InvalidUrl {
        name: name.to_string(),
        reason: err.to_string(),
    })
}

fn required<T>(name: &str, value: Option<T>) -> Result<T, ConfigurationError> {
    value.ok_or_else(|| ConfigurationError::MissingOption {
        name: name.to_string(),
    })
}

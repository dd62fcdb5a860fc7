//! Typed user information built from the provider response.

use std::fmt;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::error::{ConfigurationError, MalformedResponse};
use super::paths::{EMAIL, IDENTIFIER, NICKNAME, PROFILE_PICTURE, Paths, REALNAME};
use super::token::AccessToken;

/// Name under which [`PathUserResponse`] is registered.
pub const PATH_USER_RESPONSE: &str = "path";

/// Everything a user response is built from.
#[derive(Clone)]
pub struct UserResponseData {
    raw: Map<String, Value>,
    access_token: AccessToken,
    paths: Paths,
    resource_owner: String,
}

impl UserResponseData {
    /// Creates the data of a user response.
    pub fn new(
        raw: Map<String, Value>,
        access_token: AccessToken,
        paths: Paths,
        resource_owner: impl Into<String>,
    ) -> Self {
        Self {
            raw,
            access_token,
            paths,
            resource_owner: resource_owner.into(),
        }
    }

    /// Returns the decoded provider response.
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    /// Returns the access token used to fetch the response.
    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    /// Returns the paths of the resource owner.
    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    /// Returns the name of the resource owner.
    pub fn resource_owner(&self) -> &str {
        &self.resource_owner
    }

    /// Resolves a logical field through its path.
    pub fn resolve(&self, field: &str) -> Option<String> {
        self.paths.resolve(field, &self.raw)
    }

    /// Resolves a field the response type cannot do without.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedResponse::MissingField`] if the field is unresolved.
    pub fn require(&self, field: &str) -> Result<String, MalformedResponse> {
        self.resolve(field)
            .ok_or_else(|| MalformedResponse::MissingField {
                field: field.to_string(),
            })
    }
}

impl fmt::Debug for UserResponseData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserResponseData")
            .field("raw", &self.raw)
            .field("access_token", &self.access_token)
            .field("paths", &self.paths)
            .field("resource_owner", &self.resource_owner)
            .finish()
    }
}

/// User information returned by a resource owner.
///
/// Accessors resolve the logical fields through the configured paths;
/// implementations may override any of them.
pub trait UserResponse: fmt::Debug + Send + Sync {
    /// Returns the data the response is built from.
    fn data(&self) -> &UserResponseData;

    /// Returns the unique user identifier.
    fn username(&self) -> Option<String> {
        self.data().resolve(IDENTIFIER)
    }

    /// Returns the user nickname.
    fn nickname(&self) -> Option<String> {
        self.data().resolve(NICKNAME)
    }

    /// Returns the user real name.
    fn real_name(&self) -> Option<String> {
        self.data().resolve(REALNAME)
    }

    /// Returns the user email.
    fn email(&self) -> Option<String> {
        self.data().resolve(EMAIL)
    }

    /// Returns the URL of the user profile picture.
    fn profile_picture(&self) -> Option<String> {
        self.data().resolve(PROFILE_PICTURE)
    }

    /// Returns the access token used to fetch the response.
    fn access_token(&self) -> &AccessToken {
        self.data().access_token()
    }

    /// Returns the decoded provider response.
    fn raw(&self) -> &Map<String, Value> {
        self.data().raw()
    }

    /// Returns the paths used to resolve fields.
    fn paths(&self) -> &Paths {
        self.data().paths()
    }

    /// Returns the name of the resource owner.
    fn resource_owner(&self) -> &str {
        self.data().resource_owner()
    }
}

/// Builds a user response from its data.
pub type UserResponseFactory = fn(UserResponseData) -> Result<Box<dyn UserResponse>, MalformedResponse>;

/// Default user response, resolving every field through the paths.
#[derive(Debug, Clone)]
pub struct PathUserResponse {
    data: UserResponseData,
}

impl PathUserResponse {
    /// Creates the response.
    pub fn new(data: UserResponseData) -> Self {
        Self { data }
    }

    /// [`UserResponseFactory`] of this type.
    ///
    /// # Errors
    ///
    /// Never fails: unresolved fields are `None`.
    pub fn factory(data: UserResponseData) -> Result<Box<dyn UserResponse>, MalformedResponse> {
        Ok(Box::new(Self::new(data)))
    }
}

impl UserResponse for PathUserResponse {
    fn data(&self) -> &UserResponseData {
        &self.data
    }
}

/// Named user response factories.
///
/// The `user_response_class` option selects a factory by name; resolution
/// happens once, when the resource owner is built.
///
/// ```rust
/// use oauth1_owner::{PathUserResponse, UserResponseRegistry};
///
/// let registry = UserResponseRegistry::default().register("twitter", PathUserResponse::factory);
///
/// assert!(registry.resolve(Some("twitter")).is_ok());
/// assert!(registry.resolve(None).is_ok());
/// assert!(registry.resolve(Some("unknown")).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct UserResponseRegistry {
    factories: IndexMap<String, UserResponseFactory>,
}

impl UserResponseRegistry {
    /// Registers a factory, replacing any factory with the same name.
    #[must_use]
    pub fn register(mut self, name: impl Into<String>, factory: UserResponseFactory) -> Self {
        self.factories.insert(name.into(), factory);
        self
    }

    /// Returns the factory registered under `name`, or the default one for `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownUserResponse`] for unregistered names.
    pub fn resolve(&self, name: Option<&str>) -> Result<UserResponseFactory, ConfigurationError> {
        let name = name.unwrap_or(PATH_USER_RESPONSE);
        self.factories
            .get(name)
            .copied()
            .ok_or_else(|| ConfigurationError::UnknownUserResponse {
                name: name.to_string(),
            })
    }
}

impl Default for UserResponseRegistry {
    fn default() -> Self {
        Self {
            factories: IndexMap::new(),
        }
        .register(PATH_USER_RESPONSE, PathUserResponse::factory)
    }
}

use super::error::ConfigurationError;
use super::http::HttpClient;
use super::options::Options;
use super::paths::Paths;
use super::response::UserResponseRegistry;
use super::storage::RequestTokenStorage;
use super::ResourceOwner;

/// Builder for [`ResourceOwner`] instances.
///
/// The user response type named by the `user_response_class` option is
/// looked up in the registry when [`build`](Self::build) is called, so an
/// unknown type is reported before any request is sent.
///
/// # Example
///
/// ```rust
/// use oauth1_owner::{InMemoryTokenStorage, Options, Paths, ResourceOwner, ReqwestHttpClient};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let options = Options::builder()
///     .with_client_id("clientid")
///     .with_client_secret("clientsecret")
///     .with_infos_url("https://api.example.com/account")?
///     .with_request_token_url("https://api.example.com/oauth/request_token")?
///     .with_authorization_url("https://api.example.com/oauth/authorize")?
///     .with_access_token_url("https://api.example.com/oauth/access_token")?
///     .build()?;
///
/// let storage = InMemoryTokenStorage::new();
/// let owner = ResourceOwner::builder("example", options)
///     .with_paths(Paths::new().with("identifier", "id").with("nickname", "screen_name"))
///     .build(ReqwestHttpClient::default(), storage.session("session-id"))?;
///
/// assert_eq!(owner.name(), "example");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ResourceOwnerBuilder {
    name: String,
    options: Options,
    paths: Paths,
    registry: UserResponseRegistry,
}

impl ResourceOwnerBuilder {
    pub(super) fn new(name: String, options: Options) -> Self {
        Self {
            name,
            options,
            paths: Paths::default(),
            registry: UserResponseRegistry::default(),
        }
    }

    /// Adds paths to the user response mapping.
    #[must_use]
    pub fn with_paths(mut self, paths: Paths) -> Self {
        self.paths.merge(paths);
        self
    }

    /// Uses a registry holding custom user response types.
    #[must_use]
    pub fn with_registry(mut self, registry: UserResponseRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Builds the resource owner with its HTTP client and request token storage.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownUserResponse`] if the configured
    /// user response type is not registered.
    pub fn build<C, S>(self, http: C, storage: S) -> Result<ResourceOwner<C, S>, ConfigurationError>
    where
        C: HttpClient,
        S: RequestTokenStorage,
    {
        let Self {
            name,
            options,
            paths,
            registry,
        } = self;

        let user_response = registry.resolve(options.user_response_class())?;

        Ok(ResourceOwner {
            name,
            options,
            paths,
            http,
            storage,
            user_response,
        })
    }
}

use std::fmt;

use ::http::Method;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

mod builder;
pub use self::builder::ResourceOwnerBuilder;

mod callback;
pub use self::callback::{CallbackParameters, OAUTH_VERIFIER};

mod decoder;
pub use self::decoder::{decode, is_json};
use self::decoder::string_value;

mod error;
pub use self::error::{
    AuthenticationError, ConfigurationError, MalformedResponse, ResourceOwnerError, StorageMiss,
    TransportError,
};

mod http;
#[cfg(feature = "reqwest")]
pub use self::http::ReqwestHttpClient;
pub use self::http::{HttpClient, HttpRequest, HttpResponse};

mod options;
pub use self::options::{
    ACCESS_TOKEN_URL, AUTHORIZATION_URL, CLIENT_ID, CLIENT_SECRET, INFOS_URL, Options,
    OptionsBuilder, REALM, REQUEST_TOKEN_URL, SCOPE, SIGNATURE_METHOD, USER_RESPONSE_CLASS,
};

mod paths;
pub use self::paths::{EMAIL, FieldPath, IDENTIFIER, NICKNAME, PROFILE_PICTURE, Paths, REALNAME};

mod request;
pub use self::request::SignedRequestBuilder;

mod response;
pub use self::response::{
    PATH_USER_RESPONSE, PathUserResponse, UserResponse, UserResponseData, UserResponseFactory,
    UserResponseRegistry,
};

mod secret;
pub use self::secret::SecureString;

mod signature;
pub use self::signature::{SignatureMethod, base_string, percent_encode};

mod storage;
pub use self::storage::{InMemoryTokenStorage, RequestTokenStorage, SessionTokenStorage};

mod token;
pub use self::token::{AccessToken, OAUTH_TOKEN, OAUTH_TOKEN_SECRET, RequestToken};

#[cfg(test)]
mod integration_tests;

const OAUTH_CALLBACK: &str = "oauth_callback";
const OAUTH_CALLBACK_CONFIRMED: &str = "oauth_callback_confirmed";
const PROVIDER_ERROR_KEYS: [&str; 2] = ["error", "oauth_problem"];

/// A generic OAuth 1.0a resource owner.
///
/// Drives the three-legged flow against one provider:
///
/// 1. [`authorization_url`](Self::authorization_url) obtains a request token,
///    stores it, and returns the URL the user must be redirected to.
/// 2. [`access_token`](Self::access_token) exchanges the verifier of the
///    callback for an access token.
/// 3. [`user_information`](Self::user_information) fetches the user profile
///    and maps it through the configured [`Paths`].
///
/// The HTTP client and the request token storage are injected; the storage
/// must be scoped to the end-user session driving the flow.
///
/// # Example
///
/// ```rust,no_run
/// use oauth1_owner::{CallbackParameters, InMemoryTokenStorage, Options, ResourceOwner, ReqwestHttpClient};
///
/// # async fn example(options: Options, storage: InMemoryTokenStorage) -> Result<(), Box<dyn std::error::Error>> {
/// let owner = ResourceOwner::builder("twitter", options)
///     .build(ReqwestHttpClient::default(), storage.session("session-id"))?;
///
/// // Redirect the user to this URL
/// let url = owner.authorization_url("https://app.example.com/callback", &[]).await?;
///
/// // Later, in the callback handler
/// let callback = CallbackParameters::from_query("oauth_token=token&oauth_verifier=verifier")?;
/// let access_token = owner
///     .access_token(&callback, "https://app.example.com/callback", &[])
///     .await?;
///
/// let user = owner.user_information(&access_token, &[]).await?;
/// println!("Hello {:?}", user.nickname());
/// # Ok(())
/// # }
/// ```
pub struct ResourceOwner<C, S> {
    name: String,
    options: Options,
    paths: Paths,
    http: C,
    storage: S,
    user_response: UserResponseFactory,
}

impl ResourceOwner<(), ()> {
    /// Creates a builder for a resource owner with the given name and options.
    pub fn builder(name: impl Into<String>, options: Options) -> ResourceOwnerBuilder {
        ResourceOwnerBuilder::new(name.into(), options)
    }
}

impl<C, S> ResourceOwner<C, S>
where
    C: HttpClient,
    S: RequestTokenStorage,
{
    /// Returns the name of the resource owner.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the resource owner.
    ///
    /// Request tokens already stored under the previous name are not migrated.
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        warn!(
            from = %self.name,
            to = %name,
            "renaming resource owner, stored request tokens keep the previous name"
        );
        self.name = name;
    }

    /// Returns the configured value of an option.
    ///
    /// # Errors
    ///
    /// Fails on unknown or unconfigured options.
    pub fn option(&self, name: &str) -> Result<&str, ConfigurationError> {
        self.options.option(name)
    }

    /// Returns the options.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Adds paths to the user response mapping, overriding existing fields.
    pub fn add_paths(&mut self, paths: Paths) {
        self.paths.merge(paths);
    }

    /// Returns the paths of the user response mapping.
    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    /// Returns the request token storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns `true` if the callback carries a request token for this flow.
    pub fn handles(&self, callback: &CallbackParameters) -> bool {
        callback.oauth_token().is_some()
    }

    /// Obtains a request token and returns the authorization URL.
    ///
    /// A non-empty `scope` option is sent as a `scope` parameter of the
    /// request token call. The request token is saved in the storage before
    /// returning, replacing the one of any abandoned flow. The returned URL
    /// is the `authorization_url` option with an `oauth_token` query
    /// parameter.
    ///
    /// # Errors
    ///
    /// - [`ResourceOwnerError::Transport`] if the provider cannot be reached
    /// - [`ResourceOwnerError::Authentication`] if the provider reports an
    ///   error, does not confirm the callback, or answers without a token
    pub async fn authorization_url(
        &self,
        redirect_uri: &str,
        extra: &[(&str, &str)],
    ) -> Result<Url, ResourceOwnerError> {
        let request = self
            .signed_request(Method::POST, self.options.request_token_url().clone())
            .with_parameter(OAUTH_CALLBACK, redirect_uri)
            .with_parameters(scope_parameter(self.options.scope()))
            .with_parameters(extra.iter().copied())
            .build()?;

        let response = self.token_response(request).await?;
        if string_value(&response, OAUTH_CALLBACK_CONFIRMED).is_some_and(|confirmed| confirmed != "true") {
            warn!(owner = %self.name, "callback not confirmed by provider");
            return Err(AuthenticationError::CallbackNotConfirmed.into());
        }

        let request_token = RequestToken::from_response(&response)?;
        let mut url = self.options.authorization_url().clone();
        url.query_pairs_mut()
            .append_pair(OAUTH_TOKEN, request_token.token());

        self.storage.save(&self.name, request_token).await;
        debug!(owner = %self.name, %url, "request token stored");

        Ok(url)
    }

    /// Exchanges the callback verifier for an access token.
    ///
    /// The stored request token is consumed: a second exchange with the same
    /// callback fails.
    ///
    /// # Errors
    ///
    /// - [`ResourceOwnerError::Transport`] if the provider cannot be reached
    /// - [`ResourceOwnerError::Authentication`] if the user denied access, the
    ///   callback is incomplete, no request token is stored, or the provider
    ///   answers with an error or without a token
    pub async fn access_token(
        &self,
        callback: &CallbackParameters,
        redirect_uri: &str,
        extra: &[(&str, &str)],
    ) -> Result<AccessToken, ResourceOwnerError> {
        if let Some((parameter, message)) = callback.denial() {
            warn!(owner = %self.name, parameter, "authorization denied");
            return Err(AuthenticationError::AccessDenied {
                message: message.to_string(),
            }
            .into());
        }

        let token = required_parameter(OAUTH_TOKEN, callback.oauth_token())?;
        let verifier = required_parameter(OAUTH_VERIFIER, callback.oauth_verifier())?;

        let request_token = self
            .storage
            .fetch(&self.name, token)
            .await
            .map_err(AuthenticationError::from)?;
        if request_token.token() != token {
            warn!(owner = %self.name, "callback token does not match the latest request token");
            return Err(AuthenticationError::TokenMismatch {
                expected: request_token.token().to_string(),
                actual: token.to_string(),
            }
            .into());
        }

        debug!(owner = %self.name, redirect_uri, "exchanging verifier");
        let request = self
            .signed_request(Method::POST, self.options.access_token_url().clone())
            .with_token(request_token.token(), request_token.secret().clone())
            .with_parameter(OAUTH_VERIFIER, verifier)
            .with_parameters(extra.iter().copied())
            .build()?;

        let response = self.token_response(request).await?;
        let access_token = AccessToken::from_response(response)?;

        Ok(access_token)
    }

    /// Fetches the user information with an access token.
    ///
    /// # Errors
    ///
    /// - [`ResourceOwnerError::Transport`] if the provider cannot be reached
    /// - [`ResourceOwnerError::MalformedResponse`] if the response cannot be
    ///   decoded, or lacks a field the user response type requires
    pub async fn user_information(
        &self,
        access_token: &AccessToken,
        extra: &[(&str, &str)],
    ) -> Result<Box<dyn UserResponse>, ResourceOwnerError> {
        let request = self
            .signed_request(Method::GET, self.options.infos_url().clone())
            .with_token(access_token.token(), access_token.secret().clone())
            .with_parameters(extra.iter().copied())
            .build()?;

        let response = self.send(request).await?;
        let raw = decoder::decode(&response.body, response.content_type())?;

        let data = UserResponseData::new(raw, access_token.clone(), self.paths.clone(), &self.name);
        let user = (self.user_response)(data)?;

        Ok(user)
    }

    fn signed_request(&self, method: Method, url: Url) -> SignedRequestBuilder {
        SignedRequestBuilder::new(
            method,
            url,
            self.options.client_id(),
            self.options.client_secret().clone(),
        )
        .with_signature_method(self.options.signature_method())
        .with_realm(self.options.realm())
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = self.http.send(request).await?;
        if !response.status.is_success() {
            warn!(owner = %self.name, status = %response.status, "provider answered with an error status");
        }
        Ok(response)
    }

    /// Sends a token request and decodes a response free of provider errors.
    async fn token_response(&self, request: HttpRequest) -> Result<Map<String, Value>, ResourceOwnerError> {
        let response = self.send(request).await?;
        let decoded =
            decoder::decode(&response.body, response.content_type()).map_err(AuthenticationError::from)?;

        if let Some(message) = provider_error(&decoded) {
            warn!(owner = %self.name, %message, "provider rejected the token request");
            return Err(AuthenticationError::ProviderError { message }.into());
        }

        Ok(decoded)
    }
}

impl<C, S> fmt::Debug for ResourceOwner<C, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceOwner")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}

fn provider_error(response: &Map<String, Value>) -> Option<String> {
    PROVIDER_ERROR_KEYS.iter().find_map(|key| {
        response
            .get(*key)
            .map(|value| string_value(response, key).unwrap_or_else(|| value.to_string()))
    })
}

fn scope_parameter(scope: &str) -> Option<(&'static str, &str)> {
    (!scope.is_empty()).then_some((SCOPE, scope))
}

fn required_parameter<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str, AuthenticationError> {
    value
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AuthenticationError::MissingCallbackParameter {
            name: name.to_string(),
        })
}

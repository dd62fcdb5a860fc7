//! # OAuth1 Owner
//!
//! Client side of the OAuth 1.0a three-legged flow, for any provider that
//! follows the generic protocol.
//!
//! A [`ResourceOwner`] drives the flow against one provider:
//! - obtain a request token and build the authorization redirect URL
//! - exchange the verifier of the callback for an [`AccessToken`]
//! - fetch the user profile and map it into a [`UserResponse`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use oauth1_owner::{
//!     CallbackParameters, InMemoryTokenStorage, Options, Paths, ReqwestHttpClient, ResourceOwner,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = Options::builder()
//!     .with_client_id("consumer-key")
//!     .with_client_secret("consumer-secret")
//!     .with_request_token_url("https://api.twitter.com/oauth/request_token")?
//!     .with_authorization_url("https://api.twitter.com/oauth/authenticate")?
//!     .with_access_token_url("https://api.twitter.com/oauth/access_token")?
//!     .with_infos_url("https://api.twitter.com/1.1/account/verify_credentials.json")?
//!     .build()?;
//!
//! // One storage for the application, one handle per user session
//! let storage = InMemoryTokenStorage::new();
//!
//! let owner = ResourceOwner::builder("twitter", options)
//!     .with_paths(
//!         Paths::new()
//!             .with("identifier", "id_str")
//!             .with("nickname", "screen_name")
//!             .with("realname", "name"),
//!     )
//!     .build(ReqwestHttpClient::default(), storage.session("session-id"))?;
//!
//! // Step 1: redirect the user
//! let redirect = owner.authorization_url("https://app.example.com/login/check-twitter", &[]).await?;
//! println!("Go to {redirect}");
//!
//! // Step 2: in the callback handler
//! let callback = CallbackParameters::from_query("oauth_token=token&oauth_verifier=verifier")?;
//! let access_token = owner
//!     .access_token(&callback, "https://app.example.com/login/check-twitter", &[])
//!     .await?;
//!
//! // Step 3: fetch the user profile
//! let user = owner.user_information(&access_token, &[]).await?;
//! println!("Welcome {:?}", user.nickname());
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! [`Options`] can be built with [`OptionsBuilder`], from `(name, value)`
//! pairs, deserialized with `serde`, or loaded from YAML with the `yaml`
//! feature. Unknown names, invalid URLs and unsupported signature methods
//! are rejected at construction.
//!
//! ## Custom user responses
//!
//! The `user_response_class` option selects a user response type registered
//! in a [`UserResponseRegistry`]. The default `path` type resolves every
//! field through the configured [`Paths`].
//!
//! ## Error Handling
//!
//! All flow operations return [`ResourceOwnerError`], which separates
//! configuration mistakes, authentication failures, undecodable user
//! information and network failures.
//!
//! ## Features
//!
//! - `reqwest` (default): [`ReqwestHttpClient`], an [`HttpClient`] backed by `reqwest`
//! - `yaml`: [`Options::from_yaml`]

mod owner;

pub use self::owner::{
    ACCESS_TOKEN_URL, AUTHORIZATION_URL, AccessToken, AuthenticationError, CLIENT_ID,
    CLIENT_SECRET, CallbackParameters, ConfigurationError, EMAIL, FieldPath, HttpClient,
    HttpRequest, HttpResponse, IDENTIFIER, INFOS_URL, InMemoryTokenStorage, MalformedResponse,
    NICKNAME, OAUTH_TOKEN, OAUTH_TOKEN_SECRET, OAUTH_VERIFIER, Options, OptionsBuilder,
    PATH_USER_RESPONSE, PROFILE_PICTURE, PathUserResponse, Paths, REALM, REALNAME,
    REQUEST_TOKEN_URL, RequestToken, RequestTokenStorage, ResourceOwner, ResourceOwnerBuilder,
    ResourceOwnerError, SCOPE, SIGNATURE_METHOD, SecureString, SessionTokenStorage,
    SignatureMethod, SignedRequestBuilder, StorageMiss, TransportError, USER_RESPONSE_CLASS,
    UserResponse, UserResponseData, UserResponseFactory, UserResponseRegistry, base_string,
    decode, is_json, percent_encode,
};

#[cfg(feature = "reqwest")]
pub use self::owner::ReqwestHttpClient;

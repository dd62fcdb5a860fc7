//! Error types for the OAuth1 resource owner flow.

/// Configuration errors: a setup bug, never retryable.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
pub enum ConfigurationError {
    /// The option name is not a recognized option.
    #[display("Unknown option '{name}'")]
    UnknownOption {
        /// The requested option name.
        name: String,
    },

    /// The option is recognized but has no value for this resource owner.
    #[display("Option '{name}' is not configured")]
    MissingOption {
        /// The requested option name.
        name: String,
    },

    /// A URL option cannot be parsed as an absolute URL.
    #[display("Invalid URL for option '{name}': {reason}")]
    InvalidUrl {
        /// The option name.
        name: String,
        /// Description of why the URL is invalid.
        reason: String,
    },

    /// The configured signature method is not supported.
    #[display("Unsupported signature method '{method}'")]
    UnsupportedSignatureMethod {
        /// The configured method.
        method: String,
    },

    /// No user response factory is registered under the configured name.
    #[display("Unknown user response type '{name}'")]
    UnknownUserResponse {
        /// The configured type name.
        name: String,
    },

    /// A configuration document could not be read.
    #[display("Invalid configuration document: {reason}")]
    InvalidDocument {
        /// Description of the parsing failure.
        reason: String,
    },
}

/// No request token is stored for the given resource owner and token.
///
/// Happens when the session expired, or when the callback is forged or replayed.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
#[display("No request token '{token}' stored for resource owner '{owner}'")]
pub struct StorageMiss {
    /// Name of the resource owner.
    pub owner: String,
    /// The request token that was looked up.
    pub token: String,
}

/// The response body cannot be decoded with the strategy selected by its content type.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
pub enum MalformedResponse {
    /// Body is not valid JSON.
    #[display("Invalid JSON response: {reason}\n{body}")]
    InvalidJson {
        /// The underlying parser message.
        reason: String,
        /// The raw response body.
        body: String,
    },

    /// Body is valid JSON but not an object.
    #[display("JSON response is not an object:\n{body}")]
    NotAnObject {
        /// The raw response body.
        body: String,
    },

    /// A field required by the user response type is absent.
    #[display("Missing required field '{field}' in user information response")]
    MissingField {
        /// The logical field name.
        field: String,
    },

    /// Body is not a valid URL-encoded form.
    #[display("Invalid form-encoded response: {reason}\n{body}")]
    InvalidForm {
        /// The underlying parser message.
        reason: String,
        /// The raw response body.
        body: String,
    },
}

/// Authentication failures, always terminal for the current flow attempt.
///
/// The caller must restart the flow from the request token step.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum AuthenticationError {
    /// The provider explicitly reported an error.
    #[display("OAuth error: \"{message}\"")]
    #[from(skip)]
    ProviderError {
        /// The provider error message.
        message: String,
    },

    /// The request token response cannot be interpreted as a token.
    #[display("Not a valid request token: {reason}")]
    #[from(skip)]
    InvalidRequestToken {
        /// Description of what is missing.
        reason: String,
    },

    /// The access token response cannot be interpreted as a token grant.
    #[display("Not a valid access token: {reason}")]
    #[from(skip)]
    InvalidAccessToken {
        /// Description of what is missing.
        reason: String,
    },

    /// The provider did not confirm the callback URL.
    #[display("Defined OAuth callback was not confirmed")]
    #[from(skip)]
    CallbackNotConfirmed,

    /// A required parameter is absent from the callback.
    #[display("Missing callback parameter '{name}'")]
    #[from(skip)]
    MissingCallbackParameter {
        /// The parameter name.
        name: String,
    },

    /// The user refused the authorization on the provider side.
    #[display("Authorization denied: {message}")]
    #[from(skip)]
    AccessDenied {
        /// Value of the error-signaling parameter.
        message: String,
    },

    /// The stored request token does not match the callback one.
    #[display("Request token mismatch: expected '{expected}', got '{actual}'")]
    #[from(skip)]
    TokenMismatch {
        /// Token stored during the first step.
        expected: String,
        /// Token received in the callback.
        actual: String,
    },

    /// No request token found in the storage.
    RequestTokenNotFound(StorageMiss),

    /// The token response could not be decoded.
    MalformedResponse(MalformedResponse),
}

/// The HTTP client failed to deliver the request or read the response.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
#[display("HTTP transport error: {message}")]
pub struct TransportError {
    /// Description of the transport failure.
    pub message: String,
}

impl TransportError {
    /// Creates a transport error from any displayable cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        Self::new(error.to_string())
    }
}

/// Errors returned by the resource owner operations.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum ResourceOwnerError {
    /// Invalid configuration.
    Configuration(ConfigurationError),

    /// Protocol-level authentication failure.
    Authentication(AuthenticationError),

    /// Undecodable user information response.
    MalformedResponse(MalformedResponse),

    /// Network failure.
    Transport(TransportError),
}

impl ResourceOwnerError {
    /// Returns `true` if this error is an authentication failure.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}

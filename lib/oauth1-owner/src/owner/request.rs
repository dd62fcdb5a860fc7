//! Builder of OAuth1-signed request descriptors.

use std::fmt;

use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method};
use url::Url;
use url::form_urlencoded;

use super::error::TransportError;
use super::http::HttpRequest;
use super::secret::SecureString;
use super::signature::{self, SignatureMethod};

const OAUTH_PREFIX: &str = "oauth_";
const OAUTH_VERSION: &str = "1.0";

/// Builds an OAuth1-signed [`HttpRequest`].
///
/// `oauth_*` parameters are sent in the `Authorization` header, other
/// parameters in the form body for `POST` or in the query for other methods.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use oauth1_owner::SignedRequestBuilder;
/// use url::Url;
///
/// let url = Url::parse("http://photos.example.net/photos")?;
/// let request = SignedRequestBuilder::new(Method::GET, url, "dpf43f3p2l4k3l03", "kd94hf93k423kf44")
///     .with_token("nnch734d00sl2jdk", "pfkkdhi9sl3r4s00")
///     .with_parameter("size", "original")
///     .build()?;
///
/// assert_eq!(request.url.query(), Some("size=original"));
/// assert!(request.headers.contains_key(http::header::AUTHORIZATION));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct SignedRequestBuilder {
    method: Method,
    url: Url,
    consumer_key: String,
    consumer_secret: SecureString,
    token: Option<(String, SecureString)>,
    signature_method: SignatureMethod,
    realm: Option<String>,
    parameters: Vec<(String, String)>,
    nonce: Option<String>,
    timestamp: Option<i64>,
}

impl SignedRequestBuilder {
    /// Creates a builder for the given consumer credentials.
    pub fn new(
        method: Method,
        url: Url,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<SecureString>,
    ) -> Self {
        Self {
            method,
            url,
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            token: None,
            signature_method: SignatureMethod::default(),
            realm: None,
            parameters: Vec::new(),
            nonce: None,
            timestamp: None,
        }
    }

    /// Signs with a token and its secret.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, secret: impl Into<SecureString>) -> Self {
        self.token = Some((token.into(), secret.into()));
        self
    }

    /// Sets the signature method.
    #[must_use]
    pub fn with_signature_method(mut self, method: SignatureMethod) -> Self {
        self.signature_method = method;
        self
    }

    /// Sets the realm of the `Authorization` header.
    #[must_use]
    pub fn with_realm(mut self, realm: Option<impl Into<String>>) -> Self {
        self.realm = realm.map(Into::into);
        self
    }

    /// Adds a request parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }

    /// Adds request parameters.
    #[must_use]
    pub fn with_parameters<K, V>(mut self, parameters: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.parameters
            .extend(parameters.into_iter().map(|(name, value)| (name.into(), value.into())));
        self
    }

    /// Uses a fixed nonce instead of a random one.
    #[must_use]
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Uses a fixed timestamp (Unix seconds) instead of the current time.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Returns the protocol and request parameters, without the signature.
    fn signed_parameters(&self) -> Vec<(String, String)> {
        let nonce = self
            .nonce
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
        let timestamp = self
            .timestamp
            .unwrap_or_else(|| jiff::Timestamp::now().as_second());

        let mut parameters = vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), nonce),
            (
                "oauth_signature_method".to_string(),
                self.signature_method.as_str().to_string(),
            ),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_version".to_string(), OAUTH_VERSION.to_string()),
        ];
        if let Some((token, _)) = &self.token {
            parameters.push(("oauth_token".to_string(), token.clone()));
        }
        parameters.extend(self.parameters.iter().cloned());

        parameters
    }

    /// Computes the signature and builds the request.
    ///
    /// # Errors
    ///
    /// Fails if the request cannot be signed, or if the `Authorization`
    /// header cannot be represented.
    pub fn build(self) -> Result<HttpRequest, TransportError> {
        let mut parameters = self.signed_parameters();

        let base = signature::base_string(
            &self.method,
            &self.url,
            parameters
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        );
        let token_secret = self
            .token
            .as_ref()
            .map(|(_, secret)| secret.as_str())
            .unwrap_or_default();
        let oauth_signature = self
            .signature_method
            .sign(&base, self.consumer_secret.as_str(), token_secret)
            .map_err(|err| TransportError::new(format!("cannot sign request: {err}")))?;
        parameters.push(("oauth_signature".to_string(), oauth_signature));

        let (protocol, extra): (Vec<_>, Vec<_>) = parameters
            .into_iter()
            .partition(|(name, _)| name.starts_with(OAUTH_PREFIX));

        let mut headers = HeaderMap::new();
        let mut authorization = HeaderValue::from_str(&authorization_header(
            self.realm.as_deref(),
            &protocol,
        ))
        .map_err(|err| TransportError::new(format!("invalid Authorization header: {err}")))?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);

        let mut url = self.url;
        let mut body = None;
        if self.method == Method::POST {
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            );
            body = Some(
                form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(&extra)
                    .finish(),
            );
        } else if !extra.is_empty() {
            url.query_pairs_mut().extend_pairs(&extra);
        }

        Ok(HttpRequest {
            method: self.method,
            url,
            headers,
            body,
        })
    }
}

impl fmt::Debug for SignedRequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedRequestBuilder")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"[REDACTED]")
            .field(
                "token",
                &self.token.as_ref().map(|(token, _)| (token, "[REDACTED]")),
            )
            .field("signature_method", &self.signature_method)
            .field("realm", &self.realm)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Renders `OAuth realm="…", name="value", …` with sorted, encoded parameters.
///
/// The realm is a plain quoted-string, only `\` and `"` are escaped.
fn authorization_header(realm: Option<&str>, parameters: &[(String, String)]) -> String {
    let mut pairs = parameters
        .iter()
        .map(|(name, value)| {
            format!(
                "{}=\"{}\"",
                signature::percent_encode(name),
                signature::percent_encode(value)
            )
        })
        .collect::<Vec<_>>();
    pairs.sort();

    if let Some(realm) = realm {
        pairs.insert(0, format!("realm=\"{}\"", quote(realm)));
    }

    format!("OAuth {}", pairs.join(", "))
}

fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

//! HTTP client capability used by the resource owner.

use std::future::Future;

use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
#[cfg(feature = "reqwest")]
use tracing::debug;
use url::Url;

use super::error::TransportError;

/// An HTTP request ready to be sent.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// The HTTP method.
    pub method: Method,
    /// The target URL, query included.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// Form-encoded body, if any.
    pub body: Option<String>,
}

/// The HTTP response as seen by the resource owner.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// The response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// The response body.
    pub body: String,
}

impl HttpResponse {
    /// Creates a `200 OK` response with the given body and no headers.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Sets the `Content-Type` header.
    ///
    /// Invalid header values are ignored.
    #[must_use]
    pub fn with_content_type(mut self, content_type: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(content_type) {
            self.headers.insert(CONTENT_TYPE, value);
        }
        self
    }

    /// Sets the response status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Returns the `Content-Type` header, if present and readable.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }
}

/// Sends HTTP requests on behalf of the resource owner.
///
/// Timeouts and cancellation are the responsibility of the implementation.
///
/// # Example
///
/// ```rust
/// use oauth1_owner::{HttpClient, HttpRequest, HttpResponse, TransportError};
///
/// struct Offline;
///
/// impl HttpClient for Offline {
///     async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
///         Err(TransportError::new("offline"))
///     }
/// }
/// ```
pub trait HttpClient: Send + Sync {
    /// Sends the request and reads the whole response body.
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// [`HttpClient`] backed by a `reqwest` client.
///
/// Configure timeouts, proxies and TLS on the `reqwest::Client` given to
/// [`ReqwestHttpClient::new`].
#[cfg(feature = "reqwest")]
#[derive(Debug, Clone, Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
    /// Wraps a configured `reqwest` client.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "reqwest")]
impl HttpClient for ReqwestHttpClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!(?request, "sending...");
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        debug!(?response, "...receiving");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_read_content_type() {
        let response = HttpResponse::new("{}").with_content_type("application/json; charset=utf-8");
        assert_eq!(response.content_type(), Some("application/json; charset=utf-8"));
        assert_eq!(response.status, StatusCode::OK);
    }

    #[test]
    fn should_have_no_content_type_by_default() {
        let response = HttpResponse::new("oauth_token=token");
        assert!(response.content_type().is_none());
    }

    #[test]
    fn should_ignore_invalid_content_type() {
        let response = HttpResponse::new("").with_content_type("text/plain\n");
        assert!(response.content_type().is_none());
    }
}

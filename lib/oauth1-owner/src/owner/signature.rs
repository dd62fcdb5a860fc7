//! OAuth 1.0 request signing (RFC 5849, section 3.4).

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use http::Method;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use url::Url;

use super::error::ConfigurationError;

/// Everything except the RFC 3986 unreserved characters.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

type HmacSha1 = Hmac<Sha1>;

/// Signature methods supported for signing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SignatureMethod {
    /// `HMAC-SHA1`, the default.
    #[default]
    #[serde(rename = "HMAC-SHA1")]
    HmacSha1,
    /// `PLAINTEXT`, only to be used over TLS.
    #[serde(rename = "PLAINTEXT")]
    Plaintext,
}

impl SignatureMethod {
    /// Returns the value of the `oauth_signature_method` parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HmacSha1 => "HMAC-SHA1",
            Self::Plaintext => "PLAINTEXT",
        }
    }

    /// Computes the signature of a signature base string.
    ///
    /// # Errors
    ///
    /// Fails if the MAC rejects the signing key.
    pub fn sign(
        self,
        base_string: &str,
        consumer_secret: &str,
        token_secret: &str,
    ) -> Result<String, InvalidLength> {
        let key = signing_key(consumer_secret, token_secret);
        match self {
            Self::HmacSha1 => {
                let mut mac = HmacSha1::new_from_slice(key.as_bytes())?;
                mac.update(base_string.as_bytes());
                Ok(STANDARD.encode(mac.finalize().into_bytes()))
            }
            Self::Plaintext => Ok(key),
        }
    }
}

impl fmt::Display for SignatureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureMethod {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "HMAC-SHA1" => Ok(Self::HmacSha1),
            "PLAINTEXT" => Ok(Self::Plaintext),
            _ => Err(ConfigurationError::UnsupportedSignatureMethod {
                method: value.to_string(),
            }),
        }
    }
}

/// Percent-encodes a value, keeping only unreserved characters.
pub fn percent_encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

/// Builds the signing key: `encode(consumer secret)&encode(token secret)`.
pub fn signing_key(consumer_secret: &str, token_secret: &str) -> String {
    format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    )
}

/// Base string URI: lowercase scheme and host, no default port, no query nor fragment.
pub fn normalize_url(url: &Url) -> String {
    let scheme = url.scheme().to_ascii_lowercase();
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    // `Url::port` is `None` for the scheme default port
    match url.port() {
        Some(port) => format!("{scheme}://{host}:{port}{}", url.path()),
        None => format!("{scheme}://{host}{}", url.path()),
    }
}

/// Encodes, sorts and joins the request parameters.
pub fn normalize_parameters<K, V>(parameters: impl IntoIterator<Item = (K, V)>) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs = parameters
        .into_iter()
        .map(|(name, value)| (percent_encode(name.as_ref()), percent_encode(value.as_ref())))
        .collect::<Vec<_>>();
    pairs.sort();

    pairs
        .into_iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Builds the signature base string of a request.
///
/// Query parameters of `url` are part of the signed parameters.
pub fn base_string<K, V>(method: &Method, url: &Url, parameters: impl IntoIterator<Item = (K, V)>) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut all = url
        .query_pairs()
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect::<Vec<_>>();
    all.extend(
        parameters
            .into_iter()
            .map(|(name, value)| (name.as_ref().to_string(), value.as_ref().to_string())),
    );

    format!(
        "{}&{}&{}",
        percent_encode(method.as_str()),
        percent_encode(&normalize_url(url)),
        percent_encode(&normalize_parameters(all))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photos_parameters() -> Vec<(&'static str, &'static str)> {
        vec![
            ("oauth_consumer_key", "dpf43f3p2l4k3l03"),
            ("oauth_token", "nnch734d00sl2jdk"),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", "1191242096"),
            ("oauth_nonce", "kllo9940pd9333jh"),
            ("oauth_version", "1.0"),
        ]
    }

    #[test]
    fn should_percent_encode_reserved_characters() {
        insta::assert_snapshot!(percent_encode("Ladies + Gentlemen"), @"Ladies%20%2B%20Gentlemen");
        insta::assert_snapshot!(percent_encode("An encoded string!"), @"An%20encoded%20string%21");
        insta::assert_snapshot!(percent_encode("-._~"), @"-._~");
        insta::assert_snapshot!(percent_encode("☃"), @"%E2%98%83");
    }

    #[test]
    fn should_normalize_url() {
        let url = Url::parse("HTTP://Example.COM:80/resource?id=123#frag").expect("valid URL");
        insta::assert_snapshot!(normalize_url(&url), @"http://example.com/resource");

        let url = Url::parse("https://www.example.net:8080/?q=1").expect("valid URL");
        insta::assert_snapshot!(normalize_url(&url), @"https://www.example.net:8080/");
    }

    #[test]
    fn should_sort_parameters_by_name_then_value() {
        let normalized = normalize_parameters([("b", "2"), ("a", "3"), ("a", "1"), ("c", "")]);
        insta::assert_snapshot!(normalized, @"a=1&a=3&b=2&c=");
    }

    #[test]
    fn should_build_base_string_with_query_parameters() {
        let url = Url::parse("http://photos.example.net/photos?file=vacation.jpg&size=original")
            .expect("valid URL");
        let base = base_string(&Method::GET, &url, photos_parameters());

        insta::assert_snapshot!(base, @"GET&http%3A%2F%2Fphotos.example.net%2Fphotos&file%3Dvacation.jpg%26oauth_consumer_key%3Ddpf43f3p2l4k3l03%26oauth_nonce%3Dkllo9940pd9333jh%26oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1191242096%26oauth_token%3Dnnch734d00sl2jdk%26oauth_version%3D1.0%26size%3Doriginal");
    }

    #[test]
    fn should_sign_with_hmac_sha1() {
        let url = Url::parse("http://photos.example.net/photos?file=vacation.jpg&size=original")
            .expect("valid URL");
        let base = base_string(&Method::GET, &url, photos_parameters());

        let signature = SignatureMethod::HmacSha1.sign(&base, "kd94hf93k423kf44", "pfkkdhi9sl3r4s00")
            .expect("Should sign");
        assert_eq!(signature, "tR3+Ty81lMeYAr/Fid0kMTYa/WM=");
    }

    #[test]
    fn should_sign_with_plaintext() {
        let signature = SignatureMethod::Plaintext.sign("ignored", "kd94hf93k423kf44", "")
            .expect("Should sign");
        assert_eq!(signature, "kd94hf93k423kf44&");

        let signature = SignatureMethod::Plaintext.sign("ignored", "a&b", "c d")
            .expect("Should sign");
        assert_eq!(signature, "a%26b&c%20d");
    }

    #[test]
    fn should_parse_signature_method() {
        assert_eq!("HMAC-SHA1".parse::<SignatureMethod>(), Ok(SignatureMethod::HmacSha1));
        assert_eq!("plaintext".parse::<SignatureMethod>(), Ok(SignatureMethod::Plaintext));
        assert!("RSA-SHA1".parse::<SignatureMethod>().is_err());
    }
}

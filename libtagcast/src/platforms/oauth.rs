//! OAuth 1.0a request signing (HMAC-SHA1)
//!
//! Builds the `Authorization: OAuth ...` header for a request. Every
//! parameter that ends up in the request (query or form body) must be passed
//! in so it is covered by the signature.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;

use crate::credentials::Credentials;
use crate::error::{PlatformError, Result};

type HmacSha1 = Hmac<Sha1>;

const NONCE_LEN: usize = 32;

/// RFC 3986 percent-encoding, leaving only `A-Z a-z 0-9 - . _ ~` as is
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Authorization header for a request made now, with a fresh nonce
pub fn authorization_header(
    credentials: &Credentials,
    method: &str,
    url: &str,
    request_params: &[(&str, &str)],
) -> Result<String> {
    let nonce: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect();
    let timestamp = chrono::Utc::now().timestamp();

    authorization_header_with(credentials, method, url, request_params, &nonce, timestamp)
}

/// Authorization header with a caller-supplied nonce and timestamp
pub fn authorization_header_with(
    credentials: &Credentials,
    method: &str,
    url: &str,
    request_params: &[(&str, &str)],
    nonce: &str,
    timestamp: i64,
) -> Result<String> {
    let timestamp = timestamp.to_string();
    let mut oauth_params = vec![
        ("oauth_consumer_key", credentials.consumer_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp.as_str()),
        ("oauth_token", credentials.access_token.as_str()),
        ("oauth_version", "1.0"),
    ];

    let mut all_params = oauth_params.clone();
    all_params.extend_from_slice(request_params);

    let base = signature_base_string(method, url, &all_params);
    let signature = sign(
        &base,
        credentials.consumer_secret(),
        credentials.access_token_secret(),
    )?;
    oauth_params.push(("oauth_signature", signature.as_str()));

    let fields: Vec<String> = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect();

    Ok(format!("OAuth {}", fields.join(", ")))
}

/// `METHOD&encoded-url&encoded-parameter-string`
pub fn signature_base_string(method: &str, url: &str, params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let parameter_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(url),
        percent_encode(&parameter_string)
    )
}

/// Base64 HMAC-SHA1 of the base string, keyed by both secrets
pub fn sign(base: &str, consumer_secret: &str, token_secret: &str) -> Result<String> {
    let key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );

    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| PlatformError::Authentication(format!("Invalid signing key: {}", e)))?;
    mac.update(base.as_bytes());

    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

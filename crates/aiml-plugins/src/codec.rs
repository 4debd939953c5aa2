//! Enabled-plugin state tokens
//!
//! Encodes the set of enabled plugin ids into an opaque ASCII token that can
//! live in a URL parameter or a cookie, and decodes it back. Tokens come from
//! clients and are untrusted: decoding never fails loudly.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use tracing::debug;

/// Encode plugin ids as URL-safe base64 over a JSON array of strings.
///
/// Deterministic: the same sequence always yields the same token.
pub fn encode_enabled<I, S>(ids: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let json = serde_json::Value::Array(
        ids.into_iter()
            .map(|id| serde_json::Value::String(id.as_ref().to_string()))
            .collect(),
    )
    .to_string();

    URL_SAFE.encode(json)
}

/// Decode a token produced by [`encode_enabled`].
///
/// `None` means "no usable preference": the token was absent, blank or
/// malformed, and the caller should fall back to its default policy.
/// `Some(vec![])` means the user explicitly enabled nothing.
///
/// Tokens written with the standard base64 alphabet are accepted too.
pub fn decode_enabled(token: Option<&str>) -> Option<Vec<String>> {
    let token = token.map(str::trim).filter(|t| !t.is_empty())?;

    let bytes = match URL_SAFE.decode(token).or_else(|_| STANDARD.decode(token)) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Discarding enabled-plugins token with bad encoding: {}", e);
            return None;
        }
    };

    match serde_json::from_slice::<Vec<String>>(&bytes) {
        Ok(ids) => Some(ids),
        Err(e) => {
            debug!("Discarding enabled-plugins token with bad payload: {}", e);
            None
        }
    }
}

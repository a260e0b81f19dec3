//! Guard for endpoints that only answer script requests.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::REFERER, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use super::flash;

/// Flash shown when an ajax endpoint is opened directly.
pub const NO_ACCESS: &str = "Geen toegang!";

/// Whether the request was made by a script (jQuery or htmx).
#[must_use]
pub fn is_ajax(headers: &HeaderMap) -> bool {
    let xhr = headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));

    xhr || headers.contains_key("hx-request")
}

/// Local path of the `Referer` header, or `/`.
///
/// Only the path is kept so the redirect never leaves the site.
#[must_use]
pub fn back_path(headers: &HeaderMap) -> String {
    headers
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|referer| {
            let after_scheme = referer.split_once("://").map_or(referer, |(_, rest)| rest);
            after_scheme.find('/').and_then(|i| after_scheme.get(i..)).map(str::to_string)
        })
        .filter(|path| path.starts_with('/') && !path.starts_with("//"))
        .unwrap_or_else(|| "/".to_string())
}

/// Extractor that only accepts ajax requests.
///
/// Anything else is redirected back with a [`NO_ACCESS`] flash.
pub struct Ajax;

/// Redirect back for non-ajax requests.
pub struct NotAjax(String);

impl IntoResponse for NotAjax {
    fn into_response(self) -> Response {
        Redirect::to(&self.0).into_response()
    }
}

impl<S> FromRequestParts<S> for Ajax
where
    S: Send + Sync,
{
    type Rejection = NotAjax;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if is_ajax(&parts.headers) {
            return Ok(Self);
        }

        if let Some(session) = parts.extensions.get::<Session>()
            && let Err(e) = flash::set_errors(session, vec![NO_ACCESS.to_string()]).await
        {
            tracing::error!("Failed to set flash: {e}");
        }

        Err(NotAjax(back_path(&parts.headers)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_is_ajax() {
        let mut headers = HeaderMap::new();
        assert!(!is_ajax(&headers));

        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
        assert!(is_ajax(&headers));

        let mut htmx = HeaderMap::new();
        htmx.insert("hx-request", HeaderValue::from_static("true"));
        assert!(is_ajax(&htmx));
    }

    #[test]
    fn test_back_path_keeps_only_path() {
        let mut headers = HeaderMap::new();
        assert_eq!(back_path(&headers), "/");

        headers.insert(
            REFERER,
            HeaderValue::from_static("https://wiringa.nl/account/favorites?x=1"),
        );
        assert_eq!(back_path(&headers), "/account/favorites?x=1");

        headers.insert(REFERER, HeaderValue::from_static("https://evil.example"));
        assert_eq!(back_path(&headers), "/");
    }
}

//! `Prefer` header parsing (RFC 7240) and wait-duration resolution.

use axum::http::HeaderMap;

/// Plain-header alternative to `Prefer: wait=`; its raw value is the wait in
/// milliseconds, with no directive syntax.
pub(crate) const TIMEOUT_HEADER: &str = "timeout";

/// Look up a preference value in the request's `Prefer` header.
///
/// The header value is split on `;`; a trimmed segment yields a key/value
/// pair only when it contains exactly one `=`. Malformed segments are
/// skipped. When the same preference appears more than once the last
/// occurrence wins.
///
/// ```
/// use axum::http::HeaderMap;
/// use axum_prefer_wait::resolve_preference;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("prefer", "handling=lenient; wait=42; respond-async".parse().unwrap());
/// assert_eq!(resolve_preference(&headers, "wait"), Some("42".to_string()));
/// ```
pub fn resolve_preference(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefer = headers.get("prefer")?.to_str().ok()?;
    let mut found = None;
    for segment in prefer.split(';') {
        let mut parts = segment.trim().split('=');
        let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            continue;
        };
        if key == name {
            found = Some(value.to_string());
        }
    }
    found
}

/// Wait duration requested by the client, in milliseconds.
///
/// `Prefer: wait=N` takes precedence; the plain `Timeout` header is consulted
/// only when no `wait` directive parses as an integer. Values that are not
/// base-10 integers are treated as absent. Negative values are preserved so
/// the caller's clamping can classify them as "do not wait".
pub fn requested_wait(headers: &HeaderMap) -> Option<i64> {
    if let Some(value) = resolve_preference(headers, "wait")
        && let Ok(wait) = value.parse::<i64>()
    {
        return Some(wait);
    }
    headers
        .get(TIMEOUT_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

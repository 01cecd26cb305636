pub mod api;
pub mod pages;

pub use api::*;
pub use pages::*;

use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::Response;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "certigen_session";

/// Returns the caller's session id, minting one (plus the Set-Cookie value to
/// send back) on first contact. Ids that do not parse as UUIDs are replaced
/// rather than used as map keys.
pub fn ensure_session(headers: &HeaderMap) -> (String, Option<String>) {
    if let Some(id) = cookie_session_id(headers) {
        return (id, None);
    }
    let id = crate::naming::generate_session_id();
    let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id);
    (id, Some(cookie))
}

fn cookie_session_id(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .filter_map(|pair| pair.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .find(|v| Uuid::parse_str(v).is_ok())
        .map(str::to_string)
}

pub fn attach_cookie(mut resp: Response, cookie: Option<String>) -> Response {
    if let Some(cookie) = cookie {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            resp.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    resp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mints_an_id_when_no_cookie_present() {
        let headers = HeaderMap::new();
        let (id, cookie) = ensure_session(&headers);
        assert!(Uuid::parse_str(&id).is_ok());
        let cookie = cookie.unwrap();
        assert!(cookie.starts_with("certigen_session="));
        assert!(cookie.contains("HttpOnly"));
    }

    #[test]
    fn reuses_a_valid_cookie() {
        let id = crate::naming::generate_session_id();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            format!("other=1; certigen_session={}", id).parse().unwrap(),
        );
        let (seen, cookie) = ensure_session(&headers);
        assert_eq!(seen, id);
        assert!(cookie.is_none());
    }

    #[test]
    fn rejects_a_forged_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "certigen_session=../../etc/passwd".parse().unwrap(),
        );
        let (id, cookie) = ensure_session(&headers);
        assert!(Uuid::parse_str(&id).is_ok());
        assert!(cookie.is_some());
    }
}

//! Route guard middleware and request helpers
//!
//! The guard is a coarse pre-route check for page navigation: unauthenticated
//! requests to protected prefixes are redirected to the login page, and
//! already-authenticated requests to the auth pages are sent to the
//! dashboard. It exists for fast redirects, not as the source of truth —
//! handlers re-check authorization through the session manager.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::models::Role;
use crate::state::AppState;

/// Path prefixes that require a session
const PROTECTED_PREFIXES: &[&str] = &["/dashboard", "/admin"];

/// Path prefixes that only make sense without a session
const AUTH_PREFIXES: &[&str] = &["/login", "/signup"];

/// Coarse session check for page prefixes
pub async fn route_guard(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path();
    let jar = CookieJar::from_headers(req.headers());
    let user = state.sessions.current_user(&jar);

    if let Some(prefix) = matching_prefix(path, PROTECTED_PREFIXES) {
        match &user {
            None => return Redirect::to("/login").into_response(),
            Some(u) if prefix == "/admin" && u.role != Role::Admin => {
                return Redirect::to("/dashboard").into_response();
            }
            Some(_) => {}
        }
    } else if matching_prefix(path, AUTH_PREFIXES).is_some() && user.is_some() {
        return Redirect::to("/dashboard").into_response();
    }

    next.run(req).await
}

fn matching_prefix<'a>(path: &str, prefixes: &[&'a str]) -> Option<&'a str> {
    prefixes.iter().copied().find(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// Client address for throttle keys: first `X-Forwarded-For` hop when the
/// request came through the proxy, otherwise the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn prefix_matches_whole_segments_only() {
        assert_eq!(matching_prefix("/admin", PROTECTED_PREFIXES), Some("/admin"));
        assert_eq!(
            matching_prefix("/admin/inquiries", PROTECTED_PREFIXES),
            Some("/admin")
        );
        assert_eq!(
            matching_prefix("/dashboard", PROTECTED_PREFIXES),
            Some("/dashboard")
        );
        assert_eq!(matching_prefix("/administrator", PROTECTED_PREFIXES), None);
        assert_eq!(matching_prefix("/", PROTECTED_PREFIXES), None);
    }

    #[test]
    fn client_ip_prefers_forwarded_header() {
        let peer: SocketAddr = "10.0.0.1:40000".parse().unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers, peer), "203.0.113.7");

        let empty = HeaderMap::new();
        assert_eq!(client_ip(&empty, peer), "10.0.0.1");

        let mut blank = HeaderMap::new();
        blank.insert("x-forwarded-for", HeaderValue::from_static("  "));
        assert_eq!(client_ip(&blank, peer), "10.0.0.1");
    }
}

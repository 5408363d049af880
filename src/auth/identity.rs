//! Resolving the caller's identity from an inbound request.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::cookie::SESSION_COOKIE_NAME;
use crate::auth::token::TokenCodec;
use crate::domain::UserId;

/// Claims carried by a valid session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
}

/// Per-request authentication outcome, inserted into request extensions by
/// [`crate::auth::middleware::resolve_identity`].
#[derive(Debug, Clone, Default)]
pub struct RequestIdentity(pub Option<Identity>);

impl RequestIdentity {
    pub fn get(&self) -> Option<&Identity> {
        self.0.as_ref()
    }
}

/// Find and validate the session token carried by `headers`.
///
/// A bearer token takes precedence over the `jwt` cookie; when a bearer token is present but
/// invalid the cookie is not consulted. Absent and invalid tokens both yield `None`.
pub fn extract_identity(headers: &HeaderMap, codec: &TokenCodec) -> Option<Identity> {
    let (token, source) = match bearer_token(headers) {
        Some(token) => (token, "bearer"),
        None => (cookie_token(headers)?, "cookie"),
    };

    match codec.parse(&token) {
        Ok(identity) => Some(identity),
        Err(err) => {
            debug!(source, reason = %err, "discarding invalid session token");
            None
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    let value = jar.get(SESSION_COOKIE_NAME)?.value().trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::COOKIE, HeaderValue};

    const SECRET: &str = "identity-test-secret-0123456789abcdef";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET).unwrap()
    }

    fn identity(email: &str) -> Identity {
        Identity { user_id: UserId::new(), email: email.to_string() }
    }

    fn headers(pairs: &[(axum::http::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn no_credentials_is_none() {
        assert_eq!(extract_identity(&HeaderMap::new(), &codec()), None);
    }

    #[test]
    fn bearer_header_resolves_identity() {
        let codec = codec();
        let alice = identity("alice@example.com");
        let token = codec.mint(&alice).unwrap().token;

        let resolved = extract_identity(&headers(&[(AUTHORIZATION, format!("Bearer {token}").as_str())]), &codec);
        assert_eq!(resolved, Some(alice));
    }

    #[test]
    fn cookie_resolves_identity() {
        let codec = codec();
        let alice = identity("alice@example.com");
        let token = codec.mint(&alice).unwrap().token;

        let resolved =
            extract_identity(&headers(&[(COOKIE, format!("theme=dark; jwt={token}").as_str())]), &codec);
        assert_eq!(resolved, Some(alice));
    }

    #[test]
    fn bearer_wins_over_cookie() {
        let codec = codec();
        let alice = identity("alice@example.com");
        let bob = identity("bob@example.com");
        let bearer = codec.mint(&alice).unwrap().token;
        let cookie = codec.mint(&bob).unwrap().token;

        let resolved = extract_identity(
            &headers(&[
                (AUTHORIZATION, format!("Bearer {bearer}").as_str()),
                (COOKIE, format!("jwt={cookie}").as_str()),
            ]),
            &codec,
        );
        assert_eq!(resolved, Some(alice));
    }

    #[test]
    fn invalid_bearer_does_not_fall_back_to_cookie() {
        let codec = codec();
        let cookie = codec.mint(&identity("bob@example.com")).unwrap().token;

        let resolved = extract_identity(
            &headers(&[(AUTHORIZATION, "Bearer not.a.token"), (COOKIE, format!("jwt={cookie}").as_str())]),
            &codec,
        );
        assert_eq!(resolved, None);
    }

    #[test]
    fn malformed_authorization_falls_back_to_cookie() {
        let codec = codec();
        let bob = identity("bob@example.com");
        let cookie = codec.mint(&bob).unwrap().token;

        for header in ["Basic dXNlcjpwYXNz", "Bearer", "Bearer    ", "token-without-scheme"] {
            let resolved = extract_identity(
                &headers(&[(AUTHORIZATION, header), (COOKIE, format!("jwt={cookie}").as_str())]),
                &codec,
            );
            assert_eq!(resolved, Some(bob.clone()), "{header}");
        }
    }

    #[test]
    fn garbage_never_panics() {
        let codec = codec();
        for value in ["", "jwt=", "jwt=;", "jwt===", "jwt=a.b.c", "=; ;=", "jwt=\u{7f}"] {
            if let Ok(value) = HeaderValue::from_str(value) {
                let mut map = HeaderMap::new();
                map.insert(COOKIE, value);
                assert_eq!(extract_identity(&map, &codec), None);
            }
        }

        let mut map = HeaderMap::new();
        map.insert(AUTHORIZATION, HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap());
        assert_eq!(extract_identity(&map, &codec), None);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let foreign = TokenCodec::new("some-other-secret-0123456789abcdef").unwrap();
        let token = foreign.mint(&identity("eve@example.com")).unwrap().token;
        assert_eq!(
            extract_identity(&headers(&[(AUTHORIZATION, format!("Bearer {token}").as_str())]), &codec()),
            None
        );
    }
}

//! Session cookie construction.

use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::auth::token::TOKEN_LIFETIME_SECS;
use crate::config::{AuthConfig, SameSitePolicy};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE_NAME: &str = "jwt";

/// Cookie attributes resolved from deployment configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCookieSettings {
    pub secure: bool,
    pub same_site: SameSitePolicy,
}

impl Default for SessionCookieSettings {
    fn default() -> Self {
        Self { secure: false, same_site: SameSitePolicy::Lax }
    }
}

impl SessionCookieSettings {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self { secure: config.cookie_secure, same_site: config.effective_same_site() }
    }

    /// Cookie carrying `token` for the lifetime of the token.
    pub fn session_cookie(&self, token: &str) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, token.to_string()))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site())
            .max_age(time::Duration::seconds(TOKEN_LIFETIME_SECS))
            .build()
    }

    /// Cookie instructing the browser to drop the session cookie.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.session_cookie("");
        cookie.make_removal();
        cookie
    }

    fn same_site(&self) -> SameSite {
        match self.same_site {
            SameSitePolicy::Strict => SameSite::Strict,
            SameSitePolicy::Lax => SameSite::Lax,
            SameSitePolicy::None => SameSite::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_attributes() {
        let settings = SessionCookieSettings { secure: true, same_site: SameSitePolicy::None };
        let cookie = settings.session_cookie("abc.def.ghi");

        assert_eq!(cookie.name(), "jwt");
        assert_eq!(cookie.value(), "abc.def.ghi");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(1)));
    }

    #[test]
    fn removal_cookie_expires_immediately() {
        let cookie = SessionCookieSettings::default().removal_cookie();
        let rendered = cookie.to_string();

        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        assert!(rendered.contains("Path=/"));
    }

    #[test]
    fn settings_follow_config_defaults() {
        let secure = AuthConfig { cookie_secure: true, ..Default::default() };
        assert_eq!(SessionCookieSettings::from_config(&secure).same_site, SameSitePolicy::None);

        let plain = AuthConfig::default();
        let settings = SessionCookieSettings::from_config(&plain);
        assert!(!settings.secure);
        assert_eq!(settings.same_site, SameSitePolicy::Lax);
    }
}

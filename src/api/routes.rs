use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{middleware::resolve_identity, AccountService, SessionCookieSettings};
use crate::config::ServerConfig;
use crate::errors::{Error, Result};
use crate::storage::DbPool;

use super::{
    docs,
    handlers::{
        get_me_handler, health_handler, login_handler, logout_handler, register_handler,
        update_me_handler,
    },
};

#[derive(Clone)]
pub struct ApiState {
    pub accounts: Arc<AccountService>,
    pub cookies: SessionCookieSettings,
    pub pool: DbPool,
}

impl ApiState {
    pub fn new(accounts: Arc<AccountService>, cookies: SessionCookieSettings, pool: DbPool) -> Self {
        Self { accounts, cookies, pool }
    }
}

pub fn build_router(state: ApiState, server: &ServerConfig) -> Result<Router> {
    let identity_layer =
        middleware::from_fn_with_state(state.accounts.codec().clone(), resolve_identity);

    let api = Router::new()
        .route("/health", get(health_handler))
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/users/me", get(get_me_handler).put(update_me_handler))
        .route("/users/logout", post(logout_handler))
        .layer(identity_layer)
        .with_state(state);

    let router = api
        .merge(docs::docs_router())
        .layer(cors_layer(server.frontend_origin.as_deref())?)
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            crate::request_span!(request.method(), request.uri().path())
        }));

    Ok(router)
}

/// Credentialed CORS for the configured frontend origin; no cross-origin access otherwise.
fn cors_layer(frontend_origin: Option<&str>) -> Result<CorsLayer> {
    let Some(origin) = frontend_origin else {
        return Ok(CorsLayer::new());
    };

    let origin = HeaderValue::from_str(origin)
        .map_err(|e| Error::config(format!("Invalid frontend origin '{}': {}", origin, e)))?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_rejects_unparseable_origin() {
        assert!(cors_layer(Some("https://app.example.com\n")).is_err());
        assert!(cors_layer(Some("https://app.example.com")).is_ok());
        assert!(cors_layer(None).is_ok());
    }
}

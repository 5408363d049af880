//! Axum middleware resolving the caller identity for every request.

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use tracing::field;

use crate::auth::identity::{extract_identity, RequestIdentity};
use crate::auth::token::TokenCodec;

/// Attach a [`RequestIdentity`] to the request.
///
/// Never rejects: handlers that need an identity turn `None` into `Unauthorized`.
pub async fn resolve_identity(
    State(codec): State<Arc<TokenCodec>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let identity = extract_identity(request.headers(), &codec);

    if let Some(identity) = &identity {
        tracing::Span::current().record("user_id", field::display(&identity.user_id));
    }

    request.extensions_mut().insert(RequestIdentity(identity));
    next.run(request).await
}

use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{Identity, RequestIdentity};
use crate::errors::Error;

/// Caller-visible failure: an HTTP status, a stable error kind and a message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
    field: Option<String>,
}

impl ApiError {
    pub fn new<S: Into<String>>(status: StatusCode, kind: &'static str, message: S) -> Self {
        Self { status, kind, message: message.into(), field: None }
    }

    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

/// JSON error payload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Stable error kind, e.g. `invalid_credentials`
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = ErrorBody { error: self.kind.to_string(), message: self.message, field: self.field };
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        if err.is_internal() {
            tracing::error!(error = %err, source = ?std::error::Error::source(&err), "request failed");
            return ApiError::internal();
        }

        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let kind = err.kind();

        match err {
            Error::Validation { message, field } => {
                Self { status, kind, message, field }
            }
            other => Self::new(status, kind, other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

/// `Json` extractor whose rejections use the structured error body.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Caller identity resolved by the identity middleware; rejects with `unauthorized` otherwise.
///
/// Runs on request parts, so a missing identity is reported before any body is read.
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity(pub Identity);

impl<S> FromRequestParts<S> for AuthenticatedIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestIdentity>()
            .and_then(|identity| identity.get().cloned())
            .map(AuthenticatedIdentity)
            .ok_or_else(|| ApiError::from(Error::Unauthorized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body(error: ApiError) -> (StatusCode, ErrorBody) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn taxonomy_maps_to_status_and_kind() {
        let cases = [
            (Error::invalid_credential_input("empty"), 400, "invalid_credential_input"),
            (Error::validation("bad"), 400, "validation_failed"),
            (Error::password_policy("short"), 400, "password_policy_violation"),
            (Error::InvalidCredentials, 401, "invalid_credentials"),
            (Error::Unauthorized, 401, "unauthorized"),
            (Error::account_not_found("id"), 404, "account_not_found"),
            (Error::duplicate_account("a@x.com"), 409, "duplicate_account"),
        ];

        for (err, status, kind) in cases {
            let (actual_status, body) = body(ApiError::from(err)).await;
            assert_eq!(actual_status.as_u16(), status);
            assert_eq!(body.error, kind);
        }
    }

    #[tokio::test]
    async fn internal_errors_are_opaque() {
        let err = Error::store(sqlx::Error::PoolTimedOut, "Failed to fetch account at /var/db");
        let (status, body) = body(ApiError::from(err)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "internal_error");
        assert_eq!(body.message, "Internal server error");
    }

    #[tokio::test]
    async fn authenticated_identity_requires_resolved_identity() {
        let (mut parts, ()) = axum::http::Request::builder().body(()).unwrap().into_parts();
        let err = AuthenticatedIdentity::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.kind(), "unauthorized");

        parts.extensions.insert(RequestIdentity(None));
        let err = AuthenticatedIdentity::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let identity = Identity { user_id: crate::domain::UserId::new(), email: "a@x.com".into() };
        parts.extensions.insert(RequestIdentity(Some(identity.clone())));
        let AuthenticatedIdentity(resolved) =
            AuthenticatedIdentity::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(resolved, identity);
    }

    #[tokio::test]
    async fn validation_keeps_field() {
        let (_, body) =
            body(ApiError::from(Error::validation_field("Invalid email format", "email"))).await;
        assert_eq!(body.message, "Invalid email format");
        assert_eq!(body.field.as_deref(), Some("email"));
    }
}

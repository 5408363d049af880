use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use axum_extra::extract::cookie::Cookie;
use serde::Serialize;
use tracing::error;

use crate::api::error::{ApiError, ApiJson, ErrorBody};
use crate::api::routes::ApiState;
use crate::auth::{
    AuthOutcome, AuthResponse, LoginRequest, MessageResponse, RegisterRequest, RequestIdentity,
};

/// JSON body plus a `Set-Cookie` header
pub struct WithCookie<T> {
    status: StatusCode,
    cookie: Cookie<'static>,
    body: T,
}

impl<T: Serialize> IntoResponse for WithCookie<T> {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();

        match HeaderValue::from_str(&self.cookie.to_string()) {
            Ok(cookie_value) => {
                response.headers_mut().append(header::SET_COOKIE, cookie_value);
            }
            Err(e) => {
                error!(cookie = %self.cookie.name(), error = %e, "session cookie is not a valid header value");
            }
        }

        response
    }
}

fn session_response(
    state: &ApiState,
    status: StatusCode,
    outcome: AuthOutcome,
    message: &str,
) -> WithCookie<AuthResponse> {
    let cookie = state.cookies.session_cookie(&outcome.token.token);
    WithCookie {
        status,
        cookie,
        body: AuthResponse {
            user: outcome.account,
            message: message.to_string(),
            token: outcome.token.token,
        },
    }
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse,
         headers(("Set-Cookie" = String, description = "Session cookie (jwt)"))),
        (status = 400, description = "Invalid fields or password policy violation", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<WithCookie<AuthResponse>, ApiError> {
    let outcome = state.accounts.register(payload).await?;

    Ok(session_response(
        &state,
        StatusCode::CREATED,
        outcome,
        "Registered successfully. Token set in cookie.",
    ))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse,
         headers(("Set-Cookie" = String, description = "Session cookie (jwt)"))),
        (status = 400, description = "Email or password missing", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<WithCookie<AuthResponse>, ApiError> {
    let outcome = state.accounts.login(payload).await?;

    Ok(session_response(&state, StatusCode::OK, outcome, "Login successful. Token set in cookie."))
}

#[utoipa::path(
    post,
    path = "/users/logout",
    responses(
        (status = 200, description = "Session cookie cleared", body = MessageResponse,
         headers(("Set-Cookie" = String, description = "Expired session cookie")))
    ),
    tag = "users"
)]
pub async fn logout_handler(
    State(state): State<ApiState>,
    Extension(identity): Extension<RequestIdentity>,
) -> WithCookie<MessageResponse> {
    state.accounts.logout(identity.get());

    WithCookie {
        status: StatusCode::OK,
        cookie: state.cookies.removal_cookie(),
        body: MessageResponse::new("Logout successful"),
    }
}

use axum::{extract::State, Json};

use crate::api::error::{ApiError, ApiJson, AuthenticatedIdentity, ErrorBody};
use crate::api::routes::ApiState;
use crate::auth::{AccountResponse, ProfilePatch};

#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Current account", body = AccountResponse),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorBody),
        (status = 404, description = "Account no longer exists", body = ErrorBody)
    ),
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    tag = "users"
)]
pub async fn get_me_handler(
    State(state): State<ApiState>,
    AuthenticatedIdentity(identity): AuthenticatedIdentity,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state.accounts.get_profile(Some(&identity)).await?;
    Ok(Json(account))
}

#[utoipa::path(
    put,
    path = "/users/me",
    request_body = ProfilePatch,
    responses(
        (status = 200, description = "Updated account", body = AccountResponse),
        (status = 400, description = "Invalid fields or password policy violation", body = ErrorBody),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorBody),
        (status = 404, description = "Account no longer exists", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    ),
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    tag = "users"
)]
pub async fn update_me_handler(
    State(state): State<ApiState>,
    AuthenticatedIdentity(identity): AuthenticatedIdentity,
    ApiJson(patch): ApiJson<ProfilePatch>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state.accounts.update_profile(Some(&identity), patch).await?;
    Ok(Json(account))
}

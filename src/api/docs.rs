use axum::Router;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::SESSION_COOKIE_NAME;

#[derive(OpenApi)]
#[openapi(
    info(title = "usergate", description = "Account registration, login and profile API"),
    paths(
        crate::api::handlers::health::health_handler,
        crate::api::handlers::auth::register_handler,
        crate::api::handlers::auth::login_handler,
        crate::api::handlers::auth::logout_handler,
        crate::api::handlers::users::get_me_handler,
        crate::api::handlers::users::update_me_handler,
    ),
    components(
        schemas(
            crate::auth::RegisterRequest,
            crate::auth::LoginRequest,
            crate::auth::ProfilePatch,
            crate::auth::AccountResponse,
            crate::auth::AuthResponse,
            crate::auth::MessageResponse,
            crate::api::error::ErrorBody,
            crate::api::handlers::health::HealthResponse,
            crate::domain::UserId
        )
    ),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "users", description = "Current account profile and logout"),
        (name = "health", description = "Liveness and database connectivity")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{
            ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme,
        };

        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build(),
            ),
        );
        components.add_security_scheme(
            "cookieAuth",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE_NAME))),
        );
    }
}

pub fn docs_router() -> Router {
    SwaggerUi::new("/user-docs").url("/api-docs/openapi.json", ApiDoc::openapi()).into()
}

use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::lucky_draw::spin,
        handlers::lucky_draw::claim,
        handlers::lucky_draw::get_rewards,
        handlers::lucky_draw::get_remaining_spins,
        handlers::lucky_draw::get_history,
        handlers::user::get_rewards,
        handlers::user::get_stats,
    ),
    components(
        schemas(
            RewardResponse,
            SpinResponse,
            ClaimRewardRequest,
            ClaimRewardResponse,
            UserRewardStatus,
            UserRewardResponse,
            UserRewardPageResponse,
            UserRewardQuery,
            RemainingSpinsResponse,
            SpinHistoryItem,
            UserRewardStats,
            HealthResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "lucky_draw", description = "Lucky draw API"),
        (name = "user", description = "User reward API"),
        (name = "health", description = "Health check"),
    ),
    info(
        title = "Events Rewards API",
        version = "1.0.0",
        description = "Daily lucky draw and reward claiming REST API"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

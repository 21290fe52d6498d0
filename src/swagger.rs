use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{RewardKind, TicketStatus};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::spin::get_rewards,
        handlers::spin::get_tickets,
        handlers::spin::execute,
        handlers::spin::claim,
        handlers::event::get_events,
        handlers::admin::grant_tickets,
    ),
    components(
        schemas(
            ApiError,
            EventResponse,
            RewardKind,
            RewardQuery,
            EligibleRewardResponse,
            WonRewardResponse,
            TicketStatus,
            TicketQuery,
            SpinTicketResponse,
            SpinResultResponse,
            PaginatedResponse<SpinTicketResponse>,
            GrantTicketsRequest,
            GrantTicketsResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "spin", description = "Spin ticket and reward draw API"),
        (name = "event", description = "Spin event window API"),
        (name = "admin", description = "Ticket administration API"),
    ),
    info(
        title = "Spinwheel Backend API",
        version = "1.0.0",
        description = "Weighted lottery backend REST API documentation"
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

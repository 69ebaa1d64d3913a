//! OpenAPI documentation configuration.
//!
//! Generates the OpenAPI specification with `utoipa` and serves it via
//! Swagger UI.

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mako API",
        version = "1.0.0",
        description = "Multi-tenant backend gluing OpenAI assistants to WhatsApp Business.\n\n\
        ## Features\n\
        - Email/password and Facebook OAuth login\n\
        - Tenant-scoped assistants backed by the OpenAI Assistants API\n\
        - Knowledge files with self-healing vector stores\n\
        - Conversation runs with polling and cancellation\n\
        - WhatsApp Business number onboarding with per-plan limits\n\n\
        ## Authentication\n\
        Most endpoints require a JWT bearer token.\n\
        1. Register, login, or complete the Facebook OAuth flow to get a token\n\
        2. Include it in requests: `Authorization: Bearer <token>`",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/", description = "Current server")
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Authentication", description = "Login, registration, and OAuth"),
        (name = "Client", description = "Tenant profile and usage"),
        (name = "Assistants", description = "Assistant management"),
        (name = "Files", description = "Assistant knowledge files"),
        (name = "Runs", description = "Conversation runs and threads"),
        (name = "Facebook", description = "Graph API proxies"),
        (name = "WhatsApp", description = "Number onboarding and assignment")
    ),
    paths(
        crate::handlers::health::health_check_simple,
        crate::handlers::health::health_check,
        crate::handlers::health::ready_check,
        crate::handlers::health::live_check,

        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::facebook_start,
        crate::handlers::auth::facebook_callback,

        crate::handlers::client::get_profile,
        crate::handlers::client::get_stats,

        crate::handlers::assistants::create_assistant,
        crate::handlers::assistants::list_assistants,
        crate::handlers::assistants::get_assistant,
        crate::handlers::assistants::update_assistant,
        crate::handlers::assistants::delete_assistant,

        crate::handlers::files::upload_files,
        crate::handlers::files::list_files,
        crate::handlers::files::delete_file,

        crate::handlers::runs::start_run,
        crate::handlers::runs::poll_run,
        crate::handlers::runs::cancel_run,
        crate::handlers::runs::post_thread_message,

        crate::handlers::facebook::get_profile,
        crate::handlers::facebook::list_businesses,
        crate::handlers::facebook::list_wabas,
        crate::handlers::facebook::list_waba_numbers,

        crate::handlers::whatsapp::list_numbers,
        crate::handlers::whatsapp::register_number,
        crate::handlers::whatsapp::assign_assistant,
        crate::handlers::whatsapp::unassign_assistant,
        crate::handlers::whatsapp::delete_number,
    ),
    components(
        schemas(
            crate::error::ApiError,
            crate::pagination::PaginationMeta,

            crate::handlers::health::ServiceHealth,
            crate::handlers::health::ReadinessReport,
            crate::handlers::health::Checks,
            crate::handlers::health::ProbeResult,

            crate::handlers::auth::RegisterRequest,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::AuthResponse,

            crate::models::Client,
            crate::models::User,
            crate::handlers::client::ProfileResponse,
            crate::handlers::client::StatsResponse,

            crate::models::Assistant,
            crate::core::tool_config::ToolConfig,
            crate::core::tool_config::FileSearchConfig,
            crate::core::tool_config::CodeInterpreterConfig,
            crate::handlers::assistants::CreateAssistantRequest,
            crate::handlers::assistants::UpdateAssistantRequest,

            crate::models::AssistantFile,
            crate::handlers::files::FileUploadResult,
            crate::handlers::files::FileUploadResponse,
            crate::handlers::files::FileListEntry,
            crate::handlers::files::FileListResponse,

            crate::core::runs::RunView,
            crate::core::runs::RunMessage,
            crate::handlers::runs::StartRunRequest,
            crate::handlers::runs::ThreadMessageRequest,

            crate::remote::graph::Business,
            crate::remote::graph::Waba,
            crate::remote::graph::PhoneNumber,
            crate::handlers::facebook::FacebookProfileResponse,
            crate::handlers::facebook::BusinessListResponse,
            crate::handlers::facebook::WabaListResponse,
            crate::handlers::facebook::PhoneNumberListResponse,

            crate::models::WhatsappNumber,
            crate::handlers::whatsapp::NumberEntry,
            crate::handlers::whatsapp::PlanUsage,
            crate::handlers::whatsapp::NumberListResponse,
            crate::handlers::whatsapp::RegisterNumberRequest,
            crate::handlers::whatsapp::AssignAssistantRequest,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "JWT access token obtained from /auth/login, /auth/register, or the \
                            Facebook OAuth flow.\n\
                            Include in requests as: `Authorization: Bearer <token>`",
                        ))
                        .build(),
                ),
            );
        }

        openapi.security = Some(vec![]);
    }
}

pub fn swagger_router() -> Router {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

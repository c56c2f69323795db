use super::dto::{
    ErrorResponse, HealthResponse, PromptRequest, PromptResponse, SettingsResponse,
    SettingsSavedResponse,
};
use super::routes;
use crate::agent::AgentStep;
use crate::application::tooling::ConnectionStatus;
use crate::config::{AgentSettings, SettingsUpdate};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::settings::settings_get_handler,
        routes::settings::settings_post_handler,
        routes::prompt::prompt_handler,
        routes::health::health_handler
    ),
    components(
        schemas(
            AgentSettings,
            SettingsUpdate,
            SettingsResponse,
            SettingsSavedResponse,
            PromptRequest,
            PromptResponse,
            AgentStep,
            HealthResponse,
            ConnectionStatus,
            ErrorResponse
        )
    ),
    modifiers(&AdminKeyScheme),
    tags(
        (name = "settings", description = "Directus and AI endpoint settings"),
        (name = "agent", description = "Run the tool-calling agent"),
        (name = "health", description = "Liveness and tool-server state")
    )
)]
pub(super) struct ApiDoc;

struct AdminKeyScheme;

impl Modify for AdminKeyScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "admin_key",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

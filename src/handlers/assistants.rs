//! Assistant management handlers.
//!
//! The remote assistant is the source of truth for model behavior; the local
//! row carries ownership and the tool configuration. Creation talks to the
//! remote API first so a remote failure never leaves a dangling local row.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use diesel::prelude::*;
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    core::tool_config::ToolConfig,
    error::{get_db_conn, ApiError, ApiResult, RemoteService, ServiceError},
    middleware::AuthContext,
    models::{Assistant, NewAssistant},
    pagination::{PaginatedResponse, PaginationParams},
    remote::openai::{AssistantSpec, AssistantUpdate},
    schema::assistants,
    AppState,
};

const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAssistantRequest {
    #[schema(example = "Support bot")]
    #[validate(length(min = 2, max = 120, message = "Name must be 2-120 characters"))]
    pub name: String,
    #[schema(example = "Answer politely, cite the handbook.")]
    pub instructions: Option<String>,
    #[schema(example = "gpt-4o-mini")]
    pub model: Option<String>,
    pub tool_config: Option<ToolConfig>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateAssistantRequest {
    #[validate(length(min = 2, max = 120, message = "Name must be 2-120 characters"))]
    pub name: Option<String>,
    pub instructions: Option<String>,
    pub model: Option<String>,
}

/// Loads an assistant owned by the caller's tenant. A foreign or missing id
/// is the same `NotFound` either way.
pub(crate) fn find_owned_assistant(
    conn: &mut PgConnection,
    client_id: Uuid,
    assistant_id: Uuid,
) -> Result<Assistant, ServiceError> {
    assistants::table
        .filter(assistants::id.eq(assistant_id))
        .filter(assistants::client_id.eq(client_id))
        .select(Assistant::as_select())
        .first(conn)
        .optional()?
        .ok_or(ServiceError::NotFound("assistant"))
}

#[utoipa::path(
    post,
    path = "/assistants",
    tag = "Assistants",
    request_body = CreateAssistantRequest,
    responses(
        (status = 200, description = "Assistant created", body = Assistant),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 502, description = "Remote API failure", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_assistant(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateAssistantRequest>,
) -> ApiResult<Json<Assistant>> {
    payload
        .validate()
        .map_err(|e| ServiceError::Validation(format!("Validation error: {e}")))?;

    let model = payload
        .model
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let tool_config = payload.tool_config.unwrap_or_default();

    let spec = AssistantSpec {
        name: Some(payload.name.clone()),
        instructions: payload.instructions.clone(),
        model: model.clone(),
        tools: tool_config.to_tools(),
        tool_resources: tool_config.to_tool_resources(),
    };

    let remote = state
        .openai
        .create_assistant(&spec)
        .await
        .map_err(|e| e.into_service_error(RemoteService::OpenAi))?;

    let mut conn = get_db_conn(&state.db_pool)?;

    let stored_config = if tool_config == ToolConfig::default() {
        None
    } else {
        Some(tool_config.to_value())
    };

    let assistant: Assistant = diesel::insert_into(assistants::table)
        .values(&NewAssistant {
            client_id: auth.client_id,
            openai_id: remote.id.clone(),
            name: payload.name,
            instructions: payload.instructions,
            model,
            tool_config: stored_config,
        })
        .get_result(&mut conn)?;

    info!(
        assistant_id = %assistant.id,
        openai_id = %remote.id,
        client_id = %auth.client_id,
        "Assistant created"
    );

    Ok(Json(assistant))
}

#[utoipa::path(
    get,
    path = "/assistants",
    tag = "Assistants",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated list of assistants", body = PaginatedResponse<Assistant>),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_assistants(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<Json<PaginatedResponse<Assistant>>> {
    let mut conn = get_db_conn(&state.db_pool)?;

    let total_count: i64 = assistants::table
        .filter(assistants::client_id.eq(auth.client_id))
        .count()
        .get_result(&mut conn)?;

    let data: Vec<Assistant> = assistants::table
        .filter(assistants::client_id.eq(auth.client_id))
        .order(assistants::created_at.desc())
        .limit(pagination.limit())
        .offset(pagination.offset())
        .select(Assistant::as_select())
        .load(&mut conn)?;

    Ok(Json(PaginatedResponse::from_params(
        data,
        &pagination,
        total_count,
    )))
}

#[utoipa::path(
    get,
    path = "/assistants/{id}",
    tag = "Assistants",
    params(("id" = Uuid, Path, description = "Assistant id")),
    responses(
        (status = 200, description = "Assistant detail", body = Assistant),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Not found", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_assistant(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Assistant>> {
    let mut conn = get_db_conn(&state.db_pool)?;
    let assistant = find_owned_assistant(&mut conn, auth.client_id, id)?;
    Ok(Json(assistant))
}

#[utoipa::path(
    patch,
    path = "/assistants/{id}",
    tag = "Assistants",
    params(("id" = Uuid, Path, description = "Assistant id")),
    request_body = UpdateAssistantRequest,
    responses(
        (status = 200, description = "Assistant updated", body = Assistant),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Not found", body = ApiError),
        (status = 502, description = "Remote API failure", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_assistant(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAssistantRequest>,
) -> ApiResult<Json<Assistant>> {
    payload
        .validate()
        .map_err(|e| ServiceError::Validation(format!("Validation error: {e}")))?;

    let mut conn = get_db_conn(&state.db_pool)?;
    let assistant = find_owned_assistant(&mut conn, auth.client_id, id)?;

    let update = AssistantUpdate {
        name: payload.name.clone(),
        instructions: payload.instructions.clone(),
        model: payload.model.clone(),
        ..Default::default()
    };
    state
        .openai
        .update_assistant(&assistant.openai_id, &update)
        .await
        .map_err(|e| e.into_service_error(RemoteService::OpenAi))?;

    let updated: Assistant = diesel::update(assistants::table.filter(assistants::id.eq(id)))
        .set((
            payload
                .name
                .map(|n| assistants::name.eq(n))
                .unwrap_or_else(|| assistants::name.eq(assistant.name.clone())),
            payload
                .instructions
                .map(|i| assistants::instructions.eq(Some(i)))
                .unwrap_or_else(|| assistants::instructions.eq(assistant.instructions.clone())),
            payload
                .model
                .map(|m| assistants::model.eq(m))
                .unwrap_or_else(|| assistants::model.eq(assistant.model.clone())),
            assistants::updated_at.eq(diesel::dsl::now),
        ))
        .get_result(&mut conn)?;

    info!(assistant_id = %id, "Assistant updated");

    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/assistants/{id}",
    tag = "Assistants",
    params(("id" = Uuid, Path, description = "Assistant id")),
    responses(
        (status = 204, description = "Assistant deleted"),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Not found", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_assistant(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<axum::http::StatusCode> {
    let mut conn = get_db_conn(&state.db_pool)?;
    let assistant = find_owned_assistant(&mut conn, auth.client_id, id)?;

    // Remote cleanup is best-effort; the local delete is authoritative and
    // must not be blocked by a flaky upstream.
    let config = ToolConfig::from_value(assistant.tool_config.as_ref());
    if let Some(store_id) = config.vector_store_id() {
        if let Err(e) = state.openai.delete_vector_store(store_id).await {
            warn!(assistant_id = %id, vector_store_id = store_id, error = %e, "Vector store cleanup failed");
        }
    }
    if let Err(e) = state.openai.delete_assistant(&assistant.openai_id).await {
        warn!(assistant_id = %id, error = %e, "Remote assistant cleanup failed");
    }

    diesel::delete(assistants::table.filter(assistants::id.eq(id))).execute(&mut conn)?;

    info!(assistant_id = %id, "Assistant deleted");

    Ok(axum::http::StatusCode::NO_CONTENT)
}

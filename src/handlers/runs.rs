//! Run lifecycle handlers. Thin HTTP shells over `core::runs`.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    core::runs::{self, RunMessage, RunView},
    error::{get_db_conn, ApiError, ApiResult, ServiceError},
    middleware::AuthContext,
    AppState,
};

use super::assistants::find_owned_assistant;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StartRunRequest {
    #[schema(example = "What does the handbook say about returns?")]
    #[validate(length(min = 1, max = 32768, message = "Message must be 1-32768 characters"))]
    pub message: String,
    /// Continue an existing conversation instead of opening a new one.
    #[schema(example = "thread_abc123")]
    pub thread_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ThreadMessageRequest {
    #[validate(length(min = 1, max = 32768, message = "Message must be 1-32768 characters"))]
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/assistants/{id}/runs",
    tag = "Runs",
    params(("id" = Uuid, Path, description = "Assistant id")),
    request_body = StartRunRequest,
    responses(
        (status = 200, description = "Run started", body = RunView),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Assistant or thread not found", body = ApiError),
        (status = 502, description = "Remote API failure", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn start_run(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StartRunRequest>,
) -> ApiResult<Json<RunView>> {
    payload
        .validate()
        .map_err(|e| ServiceError::Validation(format!("Validation error: {e}")))?;

    let mut conn = get_db_conn(&state.db_pool)?;
    let assistant = find_owned_assistant(&mut conn, auth.client_id, id)?;

    let view = runs::start_run(
        state.openai.as_ref(),
        &mut *conn,
        auth.client_id,
        &assistant,
        payload.thread_id.as_deref(),
        &payload.message,
    )
    .await?;

    Ok(Json(view))
}

#[utoipa::path(
    get,
    path = "/assistants/{id}/runs/{run_id}",
    tag = "Runs",
    params(
        ("id" = Uuid, Path, description = "Assistant id"),
        ("run_id" = String, Path, description = "Remote run id")
    ),
    responses(
        (status = 200, description = "Current run state", body = RunView),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Run not found", body = ApiError),
        (status = 502, description = "Remote API failure", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn poll_run(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, run_id)): Path<(Uuid, String)>,
) -> ApiResult<Json<RunView>> {
    let mut conn = get_db_conn(&state.db_pool)?;
    let assistant = find_owned_assistant(&mut conn, auth.client_id, id)?;

    let view = runs::poll_run(
        state.openai.as_ref(),
        &mut *conn,
        auth.client_id,
        assistant.id,
        &run_id,
    )
    .await?;

    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/assistants/{id}/runs/{run_id}/cancel",
    tag = "Runs",
    params(
        ("id" = Uuid, Path, description = "Assistant id"),
        ("run_id" = String, Path, description = "Remote run id")
    ),
    responses(
        (status = 200, description = "Cancellation requested", body = RunView),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Run not found", body = ApiError),
        (status = 502, description = "Remote API failure", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn cancel_run(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, run_id)): Path<(Uuid, String)>,
) -> ApiResult<Json<RunView>> {
    let mut conn = get_db_conn(&state.db_pool)?;
    let assistant = find_owned_assistant(&mut conn, auth.client_id, id)?;

    let view = runs::cancel_run(
        state.openai.as_ref(),
        &mut *conn,
        auth.client_id,
        assistant.id,
        &run_id,
    )
    .await?;

    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/assistants/{id}/threads/{thread_id}/messages",
    tag = "Runs",
    params(
        ("id" = Uuid, Path, description = "Assistant id"),
        ("thread_id" = String, Path, description = "Remote thread id")
    ),
    request_body = ThreadMessageRequest,
    responses(
        (status = 200, description = "Message posted", body = RunMessage),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Thread not found", body = ApiError),
        (status = 502, description = "Remote API failure", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn post_thread_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, thread_id)): Path<(Uuid, String)>,
    Json(payload): Json<ThreadMessageRequest>,
) -> ApiResult<Json<RunMessage>> {
    payload
        .validate()
        .map_err(|e| ServiceError::Validation(format!("Validation error: {e}")))?;

    let mut conn = get_db_conn(&state.db_pool)?;
    let assistant = find_owned_assistant(&mut conn, auth.client_id, id)?;

    let message = runs::post_to_thread(
        state.openai.as_ref(),
        &mut *conn,
        auth.client_id,
        assistant.id,
        &thread_id,
        &payload.message,
    )
    .await?;

    Ok(Json(message))
}

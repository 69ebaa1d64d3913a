//! Assistant knowledge-file handlers.
//!
//! Files live remotely (uploaded with purpose `assistants`, then attached to
//! the assistant's vector store); `assistant_files` is a local index so
//! listings don't need a remote round trip per row.

use axum::{
    extract::{Multipart, Path, State},
    Extension, Json,
};
use diesel::prelude::*;
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    core::vector_store::ensure_vector_store,
    error::{get_db_conn, ApiError, ApiResult, ServiceError},
    middleware::AuthContext,
    models::{AssistantFile, NewAssistantFile},
    schema::assistant_files,
    AppState,
};

use super::assistants::find_owned_assistant;

#[derive(Debug, Serialize, ToSchema)]
pub struct FileUploadResult {
    #[schema(example = "handbook.pdf")]
    pub filename: String,
    #[schema(example = "success")]
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<AssistantFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FileUploadResponse {
    pub results: Vec<FileUploadResult>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FileListEntry {
    #[serde(flatten)]
    pub file: AssistantFile,
    /// Indexing status from the vector store, when the remote answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "completed")]
    pub index_status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FileListResponse {
    pub data: Vec<FileListEntry>,
}

#[utoipa::path(
    post,
    path = "/assistants/{id}/files",
    tag = "Files",
    params(("id" = Uuid, Path, description = "Assistant id")),
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Per-file upload results", body = FileUploadResponse),
        (status = 400, description = "No files in request", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Assistant not found", body = ApiError),
        (status = 503, description = "Vector store unavailable", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_files(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<Json<FileUploadResponse>> {
    let mut conn = get_db_conn(&state.db_pool)?;
    let assistant = find_owned_assistant(&mut conn, auth.client_id, id)?;

    let store_id = ensure_vector_store(state.openai.as_ref(), &mut *conn, &assistant).await?;

    let mut uploads: Vec<(String, Vec<u8>)> = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let Some(filename) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServiceError::Validation(format!("Failed to read {filename}: {e}")))?;
        uploads.push((filename, bytes.to_vec()));
    }

    if uploads.is_empty() {
        return Err(ServiceError::Validation(
            "Request contains no files".to_string(),
        ));
    }

    let mut results = Vec::with_capacity(uploads.len());
    for (filename, bytes) in uploads {
        let size = bytes.len() as i64;
        match attach_one(&state, &store_id, &filename, bytes).await {
            Ok(openai_file_id) => {
                let row: AssistantFile = diesel::insert_into(assistant_files::table)
                    .values(&NewAssistantFile {
                        assistant_id: assistant.id,
                        openai_file_id,
                        filename: filename.clone(),
                        bytes: size,
                    })
                    .get_result(&mut conn)?;

                info!(assistant_id = %id, filename = %filename, "File attached");
                results.push(FileUploadResult {
                    filename,
                    status: "success".to_string(),
                    file: Some(row),
                    error: None,
                });
            }
            Err(message) => {
                warn!(assistant_id = %id, filename = %filename, error = %message, "File attach failed");
                results.push(FileUploadResult {
                    filename,
                    status: "failed".to_string(),
                    file: None,
                    error: Some(message),
                });
            }
        }
    }

    Ok(Json(FileUploadResponse { results }))
}

/// Upload then attach a single file; a failed attach deletes the uploaded
/// remote file so it doesn't linger unreferenced.
async fn attach_one(
    state: &AppState,
    store_id: &str,
    filename: &str,
    bytes: Vec<u8>,
) -> Result<String, String> {
    let uploaded = state
        .openai
        .upload_file(filename, bytes)
        .await
        .map_err(|e| format!("upload failed: {e}"))?;

    match state
        .openai
        .attach_vector_store_file(store_id, &uploaded.id)
        .await
    {
        Ok(_) => Ok(uploaded.id),
        Err(e) => {
            if let Err(cleanup) = state.openai.delete_file(&uploaded.id).await {
                warn!(file_id = %uploaded.id, error = %cleanup, "Orphaned file cleanup failed");
            }
            Err(format!("attach failed: {e}"))
        }
    }
}

#[utoipa::path(
    get,
    path = "/assistants/{id}/files",
    tag = "Files",
    params(("id" = Uuid, Path, description = "Assistant id")),
    responses(
        (status = 200, description = "Files attached to the assistant", body = FileListResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Assistant not found", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_files(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<FileListResponse>> {
    let mut conn = get_db_conn(&state.db_pool)?;
    let assistant = find_owned_assistant(&mut conn, auth.client_id, id)?;

    let rows: Vec<AssistantFile> = assistant_files::table
        .filter(assistant_files::assistant_id.eq(assistant.id))
        .order(assistant_files::created_at.desc())
        .select(AssistantFile::as_select())
        .load(&mut conn)?;

    // Indexing status is decoration; the listing works without the remote.
    let config = crate::core::tool_config::ToolConfig::from_value(assistant.tool_config.as_ref());
    let statuses = match config.vector_store_id() {
        Some(store_id) => match state.openai.list_vector_store_files(store_id).await {
            Ok(remote) => remote
                .into_iter()
                .map(|f| (f.id, f.status))
                .collect::<std::collections::HashMap<_, _>>(),
            Err(e) => {
                warn!(assistant_id = %id, error = %e, "Vector store file listing failed");
                Default::default()
            }
        },
        None => Default::default(),
    };

    let data = rows
        .into_iter()
        .map(|file| {
            let index_status = statuses.get(&file.openai_file_id).cloned().flatten();
            FileListEntry { file, index_status }
        })
        .collect();

    Ok(Json(FileListResponse { data }))
}

#[utoipa::path(
    delete,
    path = "/assistants/{id}/files/{file_id}",
    tag = "Files",
    params(
        ("id" = Uuid, Path, description = "Assistant id"),
        ("file_id" = Uuid, Path, description = "Local file row id")
    ),
    responses(
        (status = 204, description = "File removed"),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Assistant or file not found", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_file(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, file_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<axum::http::StatusCode> {
    let mut conn = get_db_conn(&state.db_pool)?;
    let assistant = find_owned_assistant(&mut conn, auth.client_id, id)?;

    let row: AssistantFile = assistant_files::table
        .filter(assistant_files::id.eq(file_id))
        .filter(assistant_files::assistant_id.eq(assistant.id))
        .select(AssistantFile::as_select())
        .first(&mut conn)
        .optional()?
        .ok_or(ServiceError::NotFound("file"))?;

    // Remote detach and delete are best-effort; the local index row always
    // goes away.
    let config = crate::core::tool_config::ToolConfig::from_value(assistant.tool_config.as_ref());
    if let Some(store_id) = config.vector_store_id() {
        if let Err(e) = state
            .openai
            .remove_vector_store_file(store_id, &row.openai_file_id)
            .await
        {
            warn!(file_id = %row.openai_file_id, error = %e, "Vector store detach failed");
        }
    }
    if let Err(e) = state.openai.delete_file(&row.openai_file_id).await {
        warn!(file_id = %row.openai_file_id, error = %e, "Remote file delete failed");
    }

    diesel::delete(assistant_files::table.filter(assistant_files::id.eq(file_id)))
        .execute(&mut conn)?;

    info!(assistant_id = %id, file_id = %file_id, "File removed");

    Ok(axum::http::StatusCode::NO_CONTENT)
}

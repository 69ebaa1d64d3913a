//! WhatsApp number onboarding and assistant assignment.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    core::plan::Plan,
    error::{get_db_conn, ApiError, ApiResult, RemoteService, ServiceError},
    middleware::AuthContext,
    models::{NewWhatsappNumber, WhatsappNumber},
    schema::{assistants, clients, whatsapp_numbers},
    AppState,
};

use super::assistants::find_owned_assistant;
use super::auth::facebook_access_token;

#[derive(Debug, Serialize, ToSchema)]
pub struct NumberEntry {
    #[serde(flatten)]
    pub number: WhatsappNumber,
    #[schema(example = "Support bot")]
    pub assistant_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlanUsage {
    #[schema(example = "FREE")]
    pub plan: String,
    #[schema(example = 1)]
    pub used: i64,
    #[schema(example = 1)]
    pub limit: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NumberListResponse {
    pub data: Vec<NumberEntry>,
    pub usage: PlanUsage,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterNumberRequest {
    #[schema(example = "102345678901234")]
    #[validate(length(min = 1, message = "waba_id is required"))]
    pub waba_id: String,
    #[schema(example = "109876543210987")]
    #[validate(length(min = 1, message = "phone_number_id is required"))]
    pub phone_number_id: String,
    #[schema(example = "Main line")]
    #[validate(length(min = 1, message = "display_name is required"))]
    pub display_name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignAssistantRequest {
    pub assistant_id: Uuid,
}

fn client_plan(conn: &mut PgConnection, client_id: Uuid) -> Result<Plan, ServiceError> {
    let plan: String = clients::table
        .filter(clients::id.eq(client_id))
        .select(clients::plan)
        .first(conn)
        .optional()?
        .ok_or(ServiceError::NotFound("client"))?;
    Ok(Plan::from_str_lenient(&plan))
}

fn find_owned_number(
    conn: &mut PgConnection,
    client_id: Uuid,
    number_id: Uuid,
) -> Result<WhatsappNumber, ServiceError> {
    whatsapp_numbers::table
        .filter(whatsapp_numbers::id.eq(number_id))
        .filter(whatsapp_numbers::client_id.eq(client_id))
        .select(WhatsappNumber::as_select())
        .first(conn)
        .optional()?
        .ok_or(ServiceError::NotFound("whatsapp number"))
}

#[utoipa::path(
    get,
    path = "/whatsapp/numbers",
    tag = "WhatsApp",
    responses(
        (status = 200, description = "Registered numbers with plan usage", body = NumberListResponse),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_numbers(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<NumberListResponse>> {
    let mut conn = get_db_conn(&state.db_pool)?;
    let plan = client_plan(&mut conn, auth.client_id)?;

    let rows: Vec<(WhatsappNumber, Option<String>)> = whatsapp_numbers::table
        .left_join(
            assistants::table.on(assistants::id.nullable().eq(whatsapp_numbers::assistant_id)),
        )
        .filter(whatsapp_numbers::client_id.eq(auth.client_id))
        .order(whatsapp_numbers::created_at.desc())
        .select((WhatsappNumber::as_select(), assistants::name.nullable()))
        .load(&mut conn)?;

    let used = rows.len() as i64;
    let data = rows
        .into_iter()
        .map(|(number, assistant_name)| NumberEntry {
            number,
            assistant_name,
        })
        .collect();

    Ok(Json(NumberListResponse {
        data,
        usage: PlanUsage {
            plan: plan.as_str().to_string(),
            used,
            limit: plan.whatsapp_number_limit(),
        },
    }))
}

#[utoipa::path(
    post,
    path = "/whatsapp/numbers",
    tag = "WhatsApp",
    request_body = RegisterNumberRequest,
    responses(
        (status = 200, description = "Number registered", body = WhatsappNumber),
        (status = 400, description = "Validation error or unverified number", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 409, description = "Plan limit reached or number already registered", body = ApiError),
        (status = 502, description = "Graph API failure", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn register_number(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<RegisterNumberRequest>,
) -> ApiResult<Json<WhatsappNumber>> {
    payload
        .validate()
        .map_err(|e| ServiceError::Validation(format!("Validation error: {e}")))?;

    let mut conn = get_db_conn(&state.db_pool)?;

    let plan = client_plan(&mut conn, auth.client_id)?;
    let current: i64 = whatsapp_numbers::table
        .filter(whatsapp_numbers::client_id.eq(auth.client_id))
        .count()
        .get_result(&mut conn)?;
    plan.check_whatsapp_capacity(current)?;

    let token = facebook_access_token(&mut conn, auth.user_id)?;
    let remote = state
        .graph
        .phone_number(&payload.phone_number_id, &token)
        .await
        .map_err(|e| e.into_service_error(RemoteService::Graph))?;

    if !remote.is_verified() {
        return Err(ServiceError::Validation(
            "Phone number is not verified with WhatsApp".to_string(),
        ));
    }

    let number: WhatsappNumber = diesel::insert_into(whatsapp_numbers::table)
        .values(&NewWhatsappNumber {
            client_id: auth.client_id,
            phone_number_id: payload.phone_number_id,
            waba_id: payload.waba_id,
            display_name: payload.display_name,
            phone_number: remote.display_phone_number,
            status: "active".to_string(),
        })
        .get_result(&mut conn)
        .map_err(|e| match e {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => ServiceError::conflict("NUMBER_EXISTS", "This number is already registered"),
            other => ServiceError::Database(other),
        })?;

    info!(
        number_id = %number.id,
        client_id = %auth.client_id,
        "WhatsApp number registered"
    );

    Ok(Json(number))
}

#[utoipa::path(
    post,
    path = "/whatsapp/numbers/{id}/assistant",
    tag = "WhatsApp",
    params(("id" = Uuid, Path, description = "Number id")),
    request_body = AssignAssistantRequest,
    responses(
        (status = 200, description = "Assistant assigned", body = WhatsappNumber),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Number or assistant not found", body = ApiError),
        (status = 409, description = "Number or assistant already assigned", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn assign_assistant(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignAssistantRequest>,
) -> ApiResult<Json<WhatsappNumber>> {
    let mut conn = get_db_conn(&state.db_pool)?;

    let number = find_owned_number(&mut conn, auth.client_id, id)?;
    // Both sides must belong to the caller before they can be wired up.
    find_owned_assistant(&mut conn, auth.client_id, payload.assistant_id)?;

    if number.assistant_id.is_some() {
        return Err(ServiceError::conflict(
            "NUMBER_ALREADY_ASSIGNED",
            "This number already has an assistant; unassign it first",
        ));
    }

    // One assistant serves at most one number.
    let bound_elsewhere: i64 = whatsapp_numbers::table
        .filter(whatsapp_numbers::assistant_id.eq(payload.assistant_id))
        .filter(whatsapp_numbers::id.ne(id))
        .count()
        .get_result(&mut conn)?;
    if bound_elsewhere > 0 {
        return Err(ServiceError::conflict(
            "ASSISTANT_ALREADY_ASSIGNED",
            "This assistant is already connected to another number; unassign it first",
        ));
    }

    let updated: WhatsappNumber =
        diesel::update(whatsapp_numbers::table.filter(whatsapp_numbers::id.eq(id)))
            .set((
                whatsapp_numbers::assistant_id.eq(Some(payload.assistant_id)),
                whatsapp_numbers::updated_at.eq(diesel::dsl::now),
            ))
            .get_result(&mut conn)?;

    info!(
        number_id = %id,
        assistant_id = %payload.assistant_id,
        "Assistant assigned to number"
    );

    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/whatsapp/numbers/{id}/assistant",
    tag = "WhatsApp",
    params(("id" = Uuid, Path, description = "Number id")),
    responses(
        (status = 200, description = "Assistant unassigned", body = WhatsappNumber),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Number not found", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn unassign_assistant(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<WhatsappNumber>> {
    let mut conn = get_db_conn(&state.db_pool)?;
    find_owned_number(&mut conn, auth.client_id, id)?;

    let updated: WhatsappNumber =
        diesel::update(whatsapp_numbers::table.filter(whatsapp_numbers::id.eq(id)))
            .set((
                whatsapp_numbers::assistant_id.eq(None::<Uuid>),
                whatsapp_numbers::updated_at.eq(diesel::dsl::now),
            ))
            .get_result(&mut conn)?;

    info!(number_id = %id, "Assistant unassigned from number");

    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/whatsapp/numbers/{id}",
    tag = "WhatsApp",
    params(("id" = Uuid, Path, description = "Number id")),
    responses(
        (status = 204, description = "Number removed"),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Number not found", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_number(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<axum::http::StatusCode> {
    let mut conn = get_db_conn(&state.db_pool)?;
    find_owned_number(&mut conn, auth.client_id, id)?;

    diesel::delete(whatsapp_numbers::table.filter(whatsapp_numbers::id.eq(id)))
        .execute(&mut conn)?;

    info!(number_id = %id, "WhatsApp number removed");

    Ok(axum::http::StatusCode::NO_CONTENT)
}

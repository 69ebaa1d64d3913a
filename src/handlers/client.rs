//! Tenant profile and usage handlers.

use axum::{extract::State, Extension, Json};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{get_db_conn, ApiError, ApiResult, ServiceError},
    middleware::AuthContext,
    models::{Client, User},
    schema::{assistants, clients, users, whatsapp_numbers},
    AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub client: Client,
    pub user: User,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    #[schema(example = 3)]
    pub assistants: i64,
    #[schema(example = 2)]
    pub members: i64,
    #[schema(example = 1)]
    pub whatsapp_numbers: i64,
    #[schema(example = "FREE")]
    pub plan: String,
}

#[utoipa::path(
    get,
    path = "/client/profile",
    tag = "Client",
    responses(
        (status = 200, description = "Current client and user", body = ProfileResponse),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ProfileResponse>> {
    let mut conn = get_db_conn(&state.db_pool)?;

    let client: Client = clients::table
        .filter(clients::id.eq(auth.client_id))
        .select(Client::as_select())
        .first(&mut conn)
        .optional()?
        .ok_or(ServiceError::NotFound("client"))?;

    let user: User = users::table
        .filter(users::id.eq(auth.user_id))
        .filter(users::client_id.eq(auth.client_id))
        .select(User::as_select())
        .first(&mut conn)
        .optional()?
        .ok_or(ServiceError::NotFound("user"))?;

    Ok(Json(ProfileResponse { client, user }))
}

#[utoipa::path(
    get,
    path = "/client/stats",
    tag = "Client",
    responses(
        (status = 200, description = "Resource counts for the tenant", body = StatsResponse),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<StatsResponse>> {
    let mut conn = get_db_conn(&state.db_pool)?;

    let plan: String = clients::table
        .filter(clients::id.eq(auth.client_id))
        .select(clients::plan)
        .first(&mut conn)
        .optional()?
        .ok_or(ServiceError::NotFound("client"))?;

    let assistant_count: i64 = assistants::table
        .filter(assistants::client_id.eq(auth.client_id))
        .count()
        .get_result(&mut conn)?;

    let member_count: i64 = users::table
        .filter(users::client_id.eq(auth.client_id))
        .count()
        .get_result(&mut conn)?;

    let number_count: i64 = whatsapp_numbers::table
        .filter(whatsapp_numbers::client_id.eq(auth.client_id))
        .count()
        .get_result(&mut conn)?;

    Ok(Json(StatsResponse {
        assistants: assistant_count,
        members: member_count,
        whatsapp_numbers: number_count,
        plan,
    }))
}

//! Graph API proxy handlers.
//!
//! Thin pass-throughs over the Graph client using the caller's stored
//! Facebook access token. Kept separate from onboarding so the front-end can
//! browse businesses and WABAs before committing to a number.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{get_db_conn, ApiError, ApiResult, RemoteService},
    middleware::AuthContext,
    remote::graph::{Business, PhoneNumber, Waba},
    AppState,
};

use super::auth::facebook_access_token;

#[derive(Debug, Serialize, ToSchema)]
pub struct FacebookProfileResponse {
    #[schema(example = "10158012345678901")]
    pub id: String,
    #[schema(example = "Jane Doe")]
    pub name: String,
    pub email: Option<String>,
    pub picture_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BusinessListResponse {
    pub data: Vec<Business>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WabaListResponse {
    pub data: Vec<Waba>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PhoneNumberListResponse {
    pub data: Vec<PhoneNumber>,
}

#[utoipa::path(
    get,
    path = "/facebook/profile",
    tag = "Facebook",
    responses(
        (status = 200, description = "Linked Facebook profile", body = FacebookProfileResponse),
        (status = 400, description = "Facebook not linked", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 502, description = "Graph API failure", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<FacebookProfileResponse>> {
    let mut conn = get_db_conn(&state.db_pool)?;
    let token = facebook_access_token(&mut conn, auth.user_id)?;

    let profile = state
        .graph
        .profile(&token)
        .await
        .map_err(|e| e.into_service_error(RemoteService::Graph))?;

    Ok(Json(FacebookProfileResponse {
        picture_url: profile.picture_url().map(|s| s.to_string()),
        id: profile.id,
        name: profile.name,
        email: profile.email,
    }))
}

#[utoipa::path(
    get,
    path = "/facebook/businesses",
    tag = "Facebook",
    responses(
        (status = 200, description = "Businesses the user manages", body = BusinessListResponse),
        (status = 400, description = "Facebook not linked", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 502, description = "Graph API failure", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_businesses(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<BusinessListResponse>> {
    let mut conn = get_db_conn(&state.db_pool)?;
    let token = facebook_access_token(&mut conn, auth.user_id)?;

    let data = state
        .graph
        .businesses(&token)
        .await
        .map_err(|e| e.into_service_error(RemoteService::Graph))?;

    Ok(Json(BusinessListResponse { data }))
}

#[utoipa::path(
    get,
    path = "/facebook/businesses/{business_id}/wabas",
    tag = "Facebook",
    params(("business_id" = String, Path, description = "Business id")),
    responses(
        (status = 200, description = "WhatsApp Business Accounts owned by the business", body = WabaListResponse),
        (status = 400, description = "Facebook not linked", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 502, description = "Graph API failure", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_wabas(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(business_id): Path<String>,
) -> ApiResult<Json<WabaListResponse>> {
    let mut conn = get_db_conn(&state.db_pool)?;
    let token = facebook_access_token(&mut conn, auth.user_id)?;

    let data = state
        .graph
        .owned_wabas(&business_id, &token)
        .await
        .map_err(|e| e.into_service_error(RemoteService::Graph))?;

    Ok(Json(WabaListResponse { data }))
}

#[utoipa::path(
    get,
    path = "/facebook/wabas/{waba_id}/numbers",
    tag = "Facebook",
    params(("waba_id" = String, Path, description = "WhatsApp Business Account id")),
    responses(
        (status = 200, description = "Phone numbers registered on the WABA", body = PhoneNumberListResponse),
        (status = 400, description = "Facebook not linked", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 502, description = "Graph API failure", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_waba_numbers(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(waba_id): Path<String>,
) -> ApiResult<Json<PhoneNumberListResponse>> {
    let mut conn = get_db_conn(&state.db_pool)?;
    let token = facebook_access_token(&mut conn, auth.user_id)?;

    let data = state
        .graph
        .phone_numbers(&waba_id, &token)
        .await
        .map_err(|e| e.into_service_error(RemoteService::Graph))?;

    Ok(Json(PhoneNumberListResponse { data }))
}

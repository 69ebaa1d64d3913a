//! Authentication handlers: email/password and Facebook OAuth.

use axum::{
    extract::{Query, State},
    response::Redirect,
    Json,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::password::{validate_password, PasswordService},
    error::{get_db_conn, ApiError, ApiResult, RemoteService, ServiceError},
    models::{provider, Client, NewClient, NewUser, NewUserProvider, User, UserProvider},
    schema::{clients, user_providers, users},
    AppState,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "Jane Doe")]
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[schema(example = "Acme Inc")]
    pub company_name: Option<String>,
    #[schema(example = "jane@example.com")]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[schema(example = "hunter2hunter2")]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "jane@example.com")]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
    pub client: Client,
}

fn issue_token(state: &AppState, user: &User) -> Result<String, ServiceError> {
    state
        .jwt_keys
        .generate_access_token(user.id, user.client_id, &user.name)
        .map_err(|e| {
            error!(error = %e, "Token generation failed");
            ServiceError::Internal("token generation failed".to_string())
        })
}

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registration successful", body = AuthResponse),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 409, description = "Email already registered", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    payload
        .validate()
        .map_err(|e| ServiceError::Validation(format!("Validation error: {e}")))?;
    validate_password(&payload.password).map_err(ServiceError::Validation)?;

    let email = payload.email.to_lowercase();

    let password_hash = PasswordService::hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "Password hashing failed");
        ServiceError::Internal("failed to process password".to_string())
    })?;

    let mut conn = get_db_conn(&state.db_pool)?;

    let existing: i64 = user_providers::table
        .filter(user_providers::provider.eq(provider::EMAIL))
        .filter(user_providers::provider_id.eq(&email))
        .count()
        .get_result(&mut conn)?;
    if existing > 0 {
        return Err(ServiceError::conflict(
            "USER_EXISTS",
            "An account with this email already exists",
        ));
    }

    let client_name = payload.company_name.unwrap_or_else(|| payload.name.clone());

    let (client, user) = conn.transaction::<_, diesel::result::Error, _>(|conn| {
        let client: Client = diesel::insert_into(clients::table)
            .values(&NewClient {
                name: client_name,
                plan: "FREE".to_string(),
            })
            .get_result(conn)?;

        let user: User = diesel::insert_into(users::table)
            .values(&NewUser {
                client_id: client.id,
                name: payload.name,
                email: Some(email.clone()),
            })
            .get_result(conn)?;

        diesel::insert_into(user_providers::table)
            .values(&NewUserProvider {
                user_id: user.id,
                provider: provider::EMAIL.to_string(),
                provider_id: email.clone(),
                password_hash: Some(password_hash),
                access_token: None,
            })
            .execute(conn)?;

        Ok((client, user))
    })
    .map_err(|e| match e {
        diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        ) => ServiceError::conflict("USER_EXISTS", "An account with this email already exists"),
        other => ServiceError::Database(other),
    })?;

    let token = issue_token(&state, &user)?;

    info!(user_id = %user.id, client_id = %client.id, "User registered");

    Ok(Json(AuthResponse {
        token,
        user,
        client,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Invalid credentials", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    payload
        .validate()
        .map_err(|e| ServiceError::Validation(format!("Validation error: {e}")))?;

    let email = payload.email.to_lowercase();
    let mut conn = get_db_conn(&state.db_pool)?;

    let row: Option<(UserProvider, User)> = user_providers::table
        .inner_join(users::table)
        .filter(user_providers::provider.eq(provider::EMAIL))
        .filter(user_providers::provider_id.eq(&email))
        .select((UserProvider::as_select(), User::as_select()))
        .first(&mut conn)
        .optional()?;

    let (user_provider, user) = row.ok_or_else(|| {
        warn!(email = %email, "Login attempt for unknown email");
        ServiceError::Unauthorized("Invalid email or password")
    })?;

    let hash = user_provider
        .password_hash
        .as_deref()
        .ok_or(ServiceError::Unauthorized("Invalid email or password"))?;

    let valid = PasswordService::verify_password(&payload.password, hash).map_err(|e| {
        error!(error = %e, "Password verification failed");
        ServiceError::Internal("password verification failed".to_string())
    })?;
    if !valid {
        warn!(user_id = %user.id, "Failed login attempt");
        return Err(ServiceError::Unauthorized("Invalid email or password"));
    }

    let client: Client = clients::table
        .filter(clients::id.eq(user.client_id))
        .select(Client::as_select())
        .first(&mut conn)?;

    let token = issue_token(&state, &user)?;

    info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        token,
        user,
        client,
    }))
}

#[derive(Debug, Deserialize)]
pub struct FacebookStartParams {
    /// Front-end URL to send the user back to after the OAuth round trip.
    pub redirect: String,
}

fn check_redirect_allowed(state: &AppState, redirect: &str) -> Result<(), ServiceError> {
    let allowed = state
        .config
        .facebook
        .allowed_redirects
        .iter()
        .any(|a| redirect == a || redirect.starts_with(&format!("{a}/")));
    if allowed {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!(
            "Redirect target {redirect} is not allowed"
        )))
    }
}

#[utoipa::path(
    get,
    path = "/auth/facebook",
    tag = "Authentication",
    params(("redirect" = String, Query, description = "Front-end URL to return to")),
    responses(
        (status = 303, description = "Redirect to the Facebook login dialog"),
        (status = 400, description = "Redirect target not allowed", body = ApiError)
    )
)]
pub async fn facebook_start(
    State(state): State<AppState>,
    Query(params): Query<FacebookStartParams>,
) -> ApiResult<Redirect> {
    check_redirect_allowed(&state, &params.redirect)?;

    // The state parameter round-trips the validated front-end target.
    let url = crate::remote::graph::login_dialog_url(&state.config.facebook, &params.redirect);
    Ok(Redirect::to(&url))
}

#[derive(Debug, Deserialize)]
pub struct FacebookCallbackParams {
    pub code: String,
    pub state: String,
}

#[utoipa::path(
    get,
    path = "/auth/facebook/callback",
    tag = "Authentication",
    params(
        ("code" = String, Query, description = "OAuth authorization code"),
        ("state" = String, Query, description = "Front-end URL from the start leg")
    ),
    responses(
        (status = 303, description = "Redirect back to the front-end with ?token="),
        (status = 400, description = "Redirect target not allowed", body = ApiError),
        (status = 502, description = "Facebook rejected the exchange", body = ApiError)
    )
)]
pub async fn facebook_callback(
    State(state): State<AppState>,
    Query(params): Query<FacebookCallbackParams>,
) -> ApiResult<Redirect> {
    // Re-validated so a tampered state cannot bounce the token elsewhere.
    check_redirect_allowed(&state, &params.state)?;

    let token = state
        .graph
        .exchange_code(&params.code)
        .await
        .map_err(|e| e.into_service_error(RemoteService::Graph))?;

    let profile = state
        .graph
        .profile(&token.access_token)
        .await
        .map_err(|e| e.into_service_error(RemoteService::Graph))?;

    let mut conn = get_db_conn(&state.db_pool)?;

    let existing: Option<(UserProvider, User)> = user_providers::table
        .inner_join(users::table)
        .filter(user_providers::provider.eq(provider::FACEBOOK))
        .filter(user_providers::provider_id.eq(&profile.id))
        .select((UserProvider::as_select(), User::as_select()))
        .first(&mut conn)
        .optional()?;

    let user = match existing {
        Some((user_provider, user)) => {
            diesel::update(
                user_providers::table.filter(user_providers::id.eq(user_provider.id)),
            )
            .set(user_providers::access_token.eq(Some(&token.access_token)))
            .execute(&mut conn)?;
            user
        }
        None => {
            let email = profile.email.clone().map(|e| e.to_lowercase());
            let profile_name = profile.name.clone();
            let access_token = token.access_token.clone();
            let provider_id = profile.id.clone();

            conn.transaction::<_, diesel::result::Error, _>(move |conn| {
                let client: Client = diesel::insert_into(clients::table)
                    .values(&NewClient {
                        name: profile_name.clone(),
                        plan: "FREE".to_string(),
                    })
                    .get_result(conn)?;

                let user: User = diesel::insert_into(users::table)
                    .values(&NewUser {
                        client_id: client.id,
                        name: profile_name,
                        email,
                    })
                    .get_result(conn)?;

                diesel::insert_into(user_providers::table)
                    .values(&NewUserProvider {
                        user_id: user.id,
                        provider: provider::FACEBOOK.to_string(),
                        provider_id,
                        password_hash: None,
                        access_token: Some(access_token),
                    })
                    .execute(conn)?;

                Ok(user)
            })?
        }
    };

    let jwt = issue_token(&state, &user)?;

    info!(user_id = %user.id, "Facebook login completed");

    let separator = if params.state.contains('?') { '&' } else { '?' };
    Ok(Redirect::to(&format!(
        "{}{}token={}",
        params.state,
        separator,
        urlencoding::encode(&jwt)
    )))
}

/// Stored Facebook access token for a user, required by the Graph proxy
/// endpoints and WhatsApp onboarding.
pub fn facebook_access_token(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<String, ServiceError> {
    let token: Option<Option<String>> = user_providers::table
        .filter(user_providers::user_id.eq(user_id))
        .filter(user_providers::provider.eq(provider::FACEBOOK))
        .select(user_providers::access_token)
        .first(conn)
        .optional()?;

    token
        .flatten()
        .ok_or_else(|| ServiceError::Validation("Facebook account is not linked".to_string()))
}

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Queryable, Selectable, Serialize, Clone, ToSchema)]
#[diesel(table_name = crate::schema::clients)]
pub struct Client {
    pub id: Uuid,
    #[schema(example = "Acme Inc")]
    pub name: String,
    #[schema(example = "FREE")]
    pub plan: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::clients)]
pub struct NewClient {
    pub name: String,
    pub plan: String,
}

#[derive(Debug, Queryable, Selectable, Serialize, Clone, ToSchema)]
#[diesel(table_name = crate::schema::users)]
pub struct User {
    pub id: Uuid,
    pub client_id: Uuid,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@example.com")]
    pub email: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser {
    pub client_id: Uuid,
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::user_providers)]
pub struct UserProvider {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    pub provider_id: String,
    #[allow(dead_code)]
    pub password_hash: Option<String>,
    pub access_token: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::user_providers)]
pub struct NewUserProvider {
    pub user_id: Uuid,
    pub provider: String,
    pub provider_id: String,
    pub password_hash: Option<String>,
    pub access_token: Option<String>,
}

#[derive(Debug, Queryable, Selectable, Serialize, Clone, ToSchema)]
#[diesel(table_name = crate::schema::assistants)]
pub struct Assistant {
    pub id: Uuid,
    pub client_id: Uuid,
    #[schema(example = "asst_abc123")]
    pub openai_id: String,
    #[schema(example = "Support bot")]
    pub name: String,
    pub instructions: Option<String>,
    #[schema(example = "gpt-4o-mini")]
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<serde_json::Value>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::assistants)]
pub struct NewAssistant {
    pub client_id: Uuid,
    pub openai_id: String,
    pub name: String,
    pub instructions: Option<String>,
    pub model: String,
    pub tool_config: Option<serde_json::Value>,
}

#[derive(Debug, Queryable, Selectable, Serialize, Clone, ToSchema)]
#[diesel(table_name = crate::schema::assistant_files)]
pub struct AssistantFile {
    pub id: Uuid,
    pub assistant_id: Uuid,
    #[schema(example = "file-abc123")]
    pub openai_file_id: String,
    #[schema(example = "handbook.pdf")]
    pub filename: String,
    pub bytes: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::assistant_files)]
pub struct NewAssistantFile {
    pub assistant_id: Uuid,
    pub openai_file_id: String,
    pub filename: String,
    pub bytes: i64,
}

/// Local cache row for a remote run. The remote side owns the state; this
/// row exists for ownership checks and status history.
#[derive(Debug, Queryable, Selectable, Serialize, Clone, ToSchema)]
#[diesel(table_name = crate::schema::assistant_runs)]
pub struct AssistantRun {
    pub id: Uuid,
    pub client_id: Uuid,
    pub assistant_id: Uuid,
    #[schema(example = "thread_abc123")]
    pub thread_id: String,
    #[schema(example = "run_abc123")]
    pub run_id: String,
    #[schema(example = "queued")]
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::assistant_runs)]
pub struct NewAssistantRun {
    pub client_id: Uuid,
    pub assistant_id: Uuid,
    pub thread_id: String,
    pub run_id: String,
    pub status: String,
}

#[derive(Debug, Queryable, Selectable, Serialize, Clone, ToSchema)]
#[diesel(table_name = crate::schema::whatsapp_numbers)]
pub struct WhatsappNumber {
    pub id: Uuid,
    pub client_id: Uuid,
    #[schema(example = "109876543210987")]
    pub phone_number_id: String,
    #[schema(example = "102345678901234")]
    pub waba_id: String,
    #[schema(example = "Main line")]
    pub display_name: String,
    #[schema(example = "+1 555 010 2030")]
    pub phone_number: String,
    #[schema(example = "active")]
    pub status: String,
    pub assistant_id: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::whatsapp_numbers)]
pub struct NewWhatsappNumber {
    pub client_id: Uuid,
    pub phone_number_id: String,
    pub waba_id: String,
    pub display_name: String,
    pub phone_number: String,
    pub status: String,
}

/// Identity providers a user can authenticate with.
pub mod provider {
    pub const EMAIL: &str = "EMAIL";
    pub const FACEBOOK: &str = "FACEBOOK";
}

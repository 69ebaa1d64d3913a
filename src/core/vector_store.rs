//! Vector-store reconciliation.
//!
//! An assistant's file search is backed by exactly one remote vector store,
//! referenced from its stored tool configuration. The remote side can lose
//! that store (deleted out-of-band, project migration), so before any file
//! operation the reference is verified and, when dangling, healed: a fresh
//! store is created, the local configuration is updated, and the new id is
//! pushed to the remote assistant so retrieval keeps working.

use diesel::prelude::*;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::tool_config::ToolConfig;
use crate::error::{RemoteService, ServiceError};
use crate::models::Assistant;
use crate::remote::openai::AssistantUpdate;
use crate::remote::OpenAiApi;

/// Persistence seam for the merged tool configuration. `Send` so trait
/// objects can be held across awaits inside handler futures.
pub trait ToolConfigStore: Send {
    fn save_tool_config(
        &mut self,
        assistant_id: Uuid,
        config: &serde_json::Value,
    ) -> Result<(), ServiceError>;
}

impl ToolConfigStore for PgConnection {
    fn save_tool_config(
        &mut self,
        assistant_id: Uuid,
        config: &serde_json::Value,
    ) -> Result<(), ServiceError> {
        use crate::schema::assistants::dsl;

        diesel::update(dsl::assistants.filter(dsl::id.eq(assistant_id)))
            .set((
                dsl::tool_config.eq(Some(config)),
                dsl::updated_at.eq(diesel::dsl::now),
            ))
            .execute(self)?;
        Ok(())
    }
}

/// Returns the id of a vector store that is verified to exist remotely and
/// is recorded in the assistant's tool configuration.
///
/// A clean remote 404 on the stored id triggers self-healing; any other
/// verification failure propagates, since recreating on a transient error
/// would orphan a store that still holds the tenant's files.
pub async fn ensure_vector_store(
    api: &dyn OpenAiApi,
    store: &mut dyn ToolConfigStore,
    assistant: &Assistant,
) -> Result<String, ServiceError> {
    let config = ToolConfig::from_value(assistant.tool_config.as_ref());

    if let Some(existing_id) = config.vector_store_id() {
        match api.get_vector_store(existing_id).await {
            Ok(_) => return Ok(existing_id.to_string()),
            Err(e) if e.is_not_found() => {
                warn!(
                    assistant_id = %assistant.id,
                    vector_store_id = existing_id,
                    "Stored vector store no longer exists remotely, recreating"
                );
            }
            Err(e) => return Err(e.into_service_error(RemoteService::OpenAi)),
        }
    }

    let name = format!("vs_{}", assistant.id);
    let created = api.create_vector_store(&name).await.map_err(|e| {
        ServiceError::dependency(
            RemoteService::OpenAi,
            format!("vector store creation failed: {e}"),
        )
    })?;

    let merged = config.with_vector_store(&created.id);
    store.save_tool_config(assistant.id, &merged.to_value())?;

    // The remote assistant must point at the new store or file search keeps
    // reading the dead one.
    let update = AssistantUpdate {
        tools: Some(merged.to_tools()),
        tool_resources: merged.to_tool_resources(),
        ..Default::default()
    };
    api.update_assistant(&assistant.openai_id, &update)
        .await
        .map_err(|e| {
            ServiceError::dependency(
                RemoteService::OpenAi,
                format!("vector store propagation failed: {e}"),
            )
        })?;

    info!(
        assistant_id = %assistant.id,
        vector_store_id = %created.id,
        "Vector store provisioned"
    );
    Ok(created.id)
}

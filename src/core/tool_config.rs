//! Typed assistant tool configuration.
//!
//! Stored as jsonb on the assistant row and rendered into the remote
//! `tools` / `tool_resources` payloads. Unknown keys round-trip through the
//! flattened map so a newer writer's config survives an older reader.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ToolConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_interpreter: Option<CodeInterpreterConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_search: Option<FileSearchConfig>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CodeInterpreterConfig {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FileSearchConfig {
    #[serde(default)]
    pub vector_store_ids: Vec<String>,
}

impl ToolConfig {
    pub fn from_value(value: Option<&serde_json::Value>) -> Self {
        value
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!(self)
    }

    /// The single vector store backing file search, when one is configured.
    pub fn vector_store_id(&self) -> Option<&str> {
        self.file_search
            .as_ref()
            .and_then(|fs| fs.vector_store_ids.first())
            .map(|s| s.as_str())
    }

    /// Returns a copy with file search pointed at `store_id`, preserving
    /// every other setting.
    pub fn with_vector_store(&self, store_id: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.file_search = Some(FileSearchConfig {
            vector_store_ids: vec![store_id.into()],
        });
        next
    }

    /// Remote `tools` array for the assistants API.
    pub fn to_tools(&self) -> Vec<serde_json::Value> {
        let mut tools = Vec::new();
        if self.code_interpreter.is_some() {
            tools.push(serde_json::json!({"type": "code_interpreter"}));
        }
        if self.file_search.is_some() {
            tools.push(serde_json::json!({"type": "file_search"}));
        }
        tools
    }

    /// Remote `tool_resources` object; `None` when nothing needs resources.
    pub fn to_tool_resources(&self) -> Option<serde_json::Value> {
        let ids = self
            .file_search
            .as_ref()
            .map(|fs| fs.vector_store_ids.clone())?;
        Some(serde_json::json!({
            "file_search": { "vector_store_ids": ids }
        }))
    }
}

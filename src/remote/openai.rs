//! OpenAI Assistants API client.
//!
//! Thin request/response layer over the v2 assistants endpoints. No retry
//! logic lives here; callers decide what a failure means for their flow.

use async_trait::async_trait;
use reqwest::multipart;
use serde::{Deserialize, Serialize};

use super::{extract_error_message, RemoteApiError, RemoteResult};
use crate::config::OpenAiConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteAssistant {
    pub id: String,
    pub name: Option<String>,
    pub model: String,
    pub instructions: Option<String>,
    #[serde(default)]
    pub tools: Vec<serde_json::Value>,
    #[serde(default)]
    pub tool_resources: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteVectorStore {
    pub id: String,
    pub name: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteVectorStoreFile {
    pub id: String,
    pub status: Option<String>,
    #[serde(default)]
    pub last_error: Option<RemoteError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteFile {
    pub id: String,
    pub filename: String,
    pub bytes: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteThread {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteMessage {
    pub id: String,
    pub role: String,
    pub created_at: i64,
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

impl RemoteMessage {
    /// Concatenated text of all text-typed content parts.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| c.text.as_ref().map(|t| t.value.as_str()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageContent {
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub text: Option<MessageText>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageText {
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteRun {
    pub id: String,
    pub thread_id: String,
    pub status: String,
    pub created_at: i64,
    #[serde(default)]
    pub last_error: Option<RemoteError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteError {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Body for assistant create; `tools`/`tool_resources` are pre-rendered by
/// the caller from its tool configuration.
#[derive(Debug, Clone, Serialize, Default)]
pub struct AssistantSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub model: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_resources: Option<serde_json::Value>,
}

/// Partial assistant update; absent fields are left untouched remotely.
#[derive(Debug, Clone, Serialize, Default)]
pub struct AssistantUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_resources: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageAttachment {
    pub file_id: String,
    pub tools: Vec<serde_json::Value>,
}

impl MessageAttachment {
    pub fn file_search(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            tools: vec![serde_json::json!({"type": "file_search"})],
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListEnvelope<T> {
    data: Vec<T>,
}

#[async_trait]
pub trait OpenAiApi: Send + Sync {
    async fn create_assistant(&self, spec: &AssistantSpec) -> RemoteResult<RemoteAssistant>;
    async fn get_assistant(&self, assistant_id: &str) -> RemoteResult<RemoteAssistant>;
    async fn update_assistant(
        &self,
        assistant_id: &str,
        update: &AssistantUpdate,
    ) -> RemoteResult<RemoteAssistant>;
    async fn delete_assistant(&self, assistant_id: &str) -> RemoteResult<()>;

    async fn create_vector_store(&self, name: &str) -> RemoteResult<RemoteVectorStore>;
    async fn get_vector_store(&self, store_id: &str) -> RemoteResult<RemoteVectorStore>;
    async fn delete_vector_store(&self, store_id: &str) -> RemoteResult<()>;

    async fn attach_vector_store_file(
        &self,
        store_id: &str,
        file_id: &str,
    ) -> RemoteResult<RemoteVectorStoreFile>;
    async fn remove_vector_store_file(&self, store_id: &str, file_id: &str) -> RemoteResult<()>;
    async fn list_vector_store_files(
        &self,
        store_id: &str,
    ) -> RemoteResult<Vec<RemoteVectorStoreFile>>;

    async fn upload_file(&self, filename: &str, bytes: Vec<u8>) -> RemoteResult<RemoteFile>;
    async fn delete_file(&self, file_id: &str) -> RemoteResult<()>;
    async fn list_files(&self) -> RemoteResult<Vec<RemoteFile>>;

    async fn create_thread(&self) -> RemoteResult<RemoteThread>;
    async fn post_message(
        &self,
        thread_id: &str,
        content: &str,
        attachments: &[MessageAttachment],
    ) -> RemoteResult<RemoteMessage>;
    async fn list_messages(&self, thread_id: &str) -> RemoteResult<Vec<RemoteMessage>>;

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> RemoteResult<RemoteRun>;
    async fn get_run(&self, thread_id: &str, run_id: &str) -> RemoteResult<RemoteRun>;
    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> RemoteResult<RemoteRun>;
}

pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn expect_ok(response: reqwest::Response) -> RemoteResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RemoteApiError::Status {
            status: status.as_u16(),
            message: extract_error_message(&body),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> RemoteResult<T> {
        let response = self.request(reqwest::Method::GET, path).send().await?;
        Ok(Self::expect_ok(response).await?.json().await?)
    }

    async fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> RemoteResult<T> {
        let response = self
            .request(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await?;
        Ok(Self::expect_ok(response).await?.json().await?)
    }

    async fn delete(&self, path: &str) -> RemoteResult<()> {
        let response = self.request(reqwest::Method::DELETE, path).send().await?;
        Self::expect_ok(response).await?;
        Ok(())
    }
}

#[async_trait]
impl OpenAiApi for OpenAiClient {
    async fn create_assistant(&self, spec: &AssistantSpec) -> RemoteResult<RemoteAssistant> {
        self.post_json("/assistants", spec).await
    }

    async fn get_assistant(&self, assistant_id: &str) -> RemoteResult<RemoteAssistant> {
        self.get_json(&format!("/assistants/{assistant_id}")).await
    }

    async fn update_assistant(
        &self,
        assistant_id: &str,
        update: &AssistantUpdate,
    ) -> RemoteResult<RemoteAssistant> {
        self.post_json(&format!("/assistants/{assistant_id}"), update)
            .await
    }

    async fn delete_assistant(&self, assistant_id: &str) -> RemoteResult<()> {
        self.delete(&format!("/assistants/{assistant_id}")).await
    }

    async fn create_vector_store(&self, name: &str) -> RemoteResult<RemoteVectorStore> {
        self.post_json("/vector_stores", &serde_json::json!({ "name": name }))
            .await
    }

    async fn get_vector_store(&self, store_id: &str) -> RemoteResult<RemoteVectorStore> {
        self.get_json(&format!("/vector_stores/{store_id}")).await
    }

    async fn delete_vector_store(&self, store_id: &str) -> RemoteResult<()> {
        self.delete(&format!("/vector_stores/{store_id}")).await
    }

    async fn attach_vector_store_file(
        &self,
        store_id: &str,
        file_id: &str,
    ) -> RemoteResult<RemoteVectorStoreFile> {
        self.post_json(
            &format!("/vector_stores/{store_id}/files"),
            &serde_json::json!({ "file_id": file_id }),
        )
        .await
    }

    async fn remove_vector_store_file(&self, store_id: &str, file_id: &str) -> RemoteResult<()> {
        self.delete(&format!("/vector_stores/{store_id}/files/{file_id}"))
            .await
    }

    async fn list_vector_store_files(
        &self,
        store_id: &str,
    ) -> RemoteResult<Vec<RemoteVectorStoreFile>> {
        let envelope: ListEnvelope<RemoteVectorStoreFile> = self
            .get_json(&format!("/vector_stores/{store_id}/files"))
            .await?;
        Ok(envelope.data)
    }

    async fn upload_file(&self, filename: &str, bytes: Vec<u8>) -> RemoteResult<RemoteFile> {
        let part = multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = multipart::Form::new()
            .text("purpose", "assistants")
            .part("file", part);

        let response = self
            .request(reqwest::Method::POST, "/files")
            .multipart(form)
            .send()
            .await?;
        Ok(Self::expect_ok(response).await?.json().await?)
    }

    async fn delete_file(&self, file_id: &str) -> RemoteResult<()> {
        self.delete(&format!("/files/{file_id}")).await
    }

    async fn list_files(&self) -> RemoteResult<Vec<RemoteFile>> {
        let envelope: ListEnvelope<RemoteFile> =
            self.get_json("/files?purpose=assistants").await?;
        Ok(envelope.data)
    }

    async fn create_thread(&self) -> RemoteResult<RemoteThread> {
        self.post_json("/threads", &serde_json::json!({})).await
    }

    async fn post_message(
        &self,
        thread_id: &str,
        content: &str,
        attachments: &[MessageAttachment],
    ) -> RemoteResult<RemoteMessage> {
        let mut body = serde_json::json!({
            "role": "user",
            "content": content,
        });
        if !attachments.is_empty() {
            body["attachments"] = serde_json::json!(attachments);
        }
        self.post_json(&format!("/threads/{thread_id}/messages"), &body)
            .await
    }

    async fn list_messages(&self, thread_id: &str) -> RemoteResult<Vec<RemoteMessage>> {
        let envelope: ListEnvelope<RemoteMessage> = self
            .get_json(&format!("/threads/{thread_id}/messages?order=asc&limit=100"))
            .await?;
        Ok(envelope.data)
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> RemoteResult<RemoteRun> {
        self.post_json(
            &format!("/threads/{thread_id}/runs"),
            &serde_json::json!({ "assistant_id": assistant_id }),
        )
        .await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> RemoteResult<RemoteRun> {
        self.get_json(&format!("/threads/{thread_id}/runs/{run_id}"))
            .await
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> RemoteResult<RemoteRun> {
        self.post_json(
            &format!("/threads/{thread_id}/runs/{run_id}/cancel"),
            &serde_json::json!({}),
        )
        .await
    }
}

//! Run lifecycle tracking.
//!
//! Runs execute remotely; locally we keep a cache row per run so that poll
//! and cancel requests can be ownership-checked without leaking whether a
//! foreign run id exists. The cache row is written best-effort after the
//! remote run is created and the local status trails the remote one, updated
//! on every poll.

use diesel::prelude::*;
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{RemoteService, ServiceError};
use crate::models::{Assistant, AssistantRun, NewAssistantRun};
use crate::remote::OpenAiApi;

/// Remote run states. Unknown strings from newer API versions are carried
/// through verbatim rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Completed,
    Failed,
    Cancelling,
    Cancelled,
    Expired,
    Incomplete,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Expired => "expired",
            RunStatus::Incomplete => "incomplete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(RunStatus::Queued),
            "in_progress" => Some(RunStatus::InProgress),
            "requires_action" => Some(RunStatus::RequiresAction),
            "completed" => Some(RunStatus::Completed),
            "failed" => Some(RunStatus::Failed),
            "cancelling" => Some(RunStatus::Cancelling),
            "cancelled" => Some(RunStatus::Cancelled),
            "expired" => Some(RunStatus::Expired),
            "incomplete" => Some(RunStatus::Incomplete),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed
                | RunStatus::Failed
                | RunStatus::Cancelled
                | RunStatus::Expired
                | RunStatus::Incomplete
        )
    }
}

/// Persistence seam for the run cache. `Send` so trait objects can be held
/// across awaits inside handler futures.
pub trait RunStore: Send {
    fn insert_run(&mut self, run: &NewAssistantRun) -> Result<(), ServiceError>;
    fn find_run(
        &mut self,
        client_id: Uuid,
        assistant_id: Uuid,
        run_id: &str,
    ) -> Result<Option<AssistantRun>, ServiceError>;
    fn thread_known(
        &mut self,
        client_id: Uuid,
        assistant_id: Uuid,
        thread_id: &str,
    ) -> Result<bool, ServiceError>;
    fn update_status(&mut self, run_id: &str, status: &str) -> Result<(), ServiceError>;
}

impl RunStore for PgConnection {
    fn insert_run(&mut self, run: &NewAssistantRun) -> Result<(), ServiceError> {
        use crate::schema::assistant_runs::dsl;

        diesel::insert_into(dsl::assistant_runs)
            .values(run)
            .execute(self)?;
        Ok(())
    }

    fn find_run(
        &mut self,
        client_id: Uuid,
        assistant_id: Uuid,
        run_id: &str,
    ) -> Result<Option<AssistantRun>, ServiceError> {
        use crate::schema::assistant_runs::dsl;

        Ok(dsl::assistant_runs
            .filter(dsl::client_id.eq(client_id))
            .filter(dsl::assistant_id.eq(assistant_id))
            .filter(dsl::run_id.eq(run_id))
            .select(AssistantRun::as_select())
            .first(self)
            .optional()?)
    }

    fn thread_known(
        &mut self,
        client_id: Uuid,
        assistant_id: Uuid,
        thread_id: &str,
    ) -> Result<bool, ServiceError> {
        use crate::schema::assistant_runs::dsl;
        use diesel::dsl::count_star;

        let count: i64 = dsl::assistant_runs
            .filter(dsl::client_id.eq(client_id))
            .filter(dsl::assistant_id.eq(assistant_id))
            .filter(dsl::thread_id.eq(thread_id))
            .select(count_star())
            .first(self)?;
        Ok(count > 0)
    }

    fn update_status(&mut self, run_id: &str, status: &str) -> Result<(), ServiceError> {
        use crate::schema::assistant_runs::dsl;

        diesel::update(dsl::assistant_runs.filter(dsl::run_id.eq(run_id)))
            .set((
                dsl::status.eq(status),
                dsl::updated_at.eq(diesel::dsl::now),
            ))
            .execute(self)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RunView {
    #[schema(example = "run_abc123")]
    pub run_id: String,
    #[schema(example = "thread_abc123")]
    pub thread_id: String,
    #[schema(example = "in_progress")]
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Assistant replies produced by this run; present once completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<RunMessage>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RunMessage {
    pub id: String,
    #[schema(example = "assistant")]
    pub role: String,
    pub text: String,
    pub created_at: i64,
}

/// Post `message` to a thread (existing or fresh) and start a run on it.
///
/// An explicit `thread_id` must already be known for this tenant and this
/// assistant; the remote API is never asked about a thread the cache cannot
/// vouch for. The cache
/// insert after the remote run starts is best-effort: the run is already
/// burning tokens remotely, so a local insert failure is logged and the
/// response still carries the run id.
pub async fn start_run(
    api: &dyn OpenAiApi,
    store: &mut dyn RunStore,
    client_id: Uuid,
    assistant: &Assistant,
    thread_id: Option<&str>,
    message: &str,
) -> Result<RunView, ServiceError> {
    let thread_id = match thread_id {
        Some(id) => {
            if !store.thread_known(client_id, assistant.id, id)? {
                return Err(ServiceError::NotFound("thread"));
            }
            id.to_string()
        }
        None => api
            .create_thread()
            .await
            .map_err(|e| e.into_service_error(RemoteService::OpenAi))?
            .id,
    };

    api.post_message(&thread_id, message, &[])
        .await
        .map_err(|e| e.into_service_error(RemoteService::OpenAi))?;

    let run = api
        .create_run(&thread_id, &assistant.openai_id)
        .await
        .map_err(|e| e.into_service_error(RemoteService::OpenAi))?;

    let cache_row = NewAssistantRun {
        client_id,
        assistant_id: assistant.id,
        thread_id: thread_id.clone(),
        run_id: run.id.clone(),
        status: run.status.clone(),
    };
    if let Err(e) = store.insert_run(&cache_row) {
        warn!(
            run_id = %run.id,
            error = %e,
            "Failed to cache run row; run continues remotely"
        );
    }

    Ok(RunView {
        run_id: run.id,
        thread_id,
        status: run.status,
        last_error: None,
        messages: None,
    })
}

/// Fetch the current remote state of a cached run.
///
/// Unknown run ids fail with `NotFound` before any remote call is made.
pub async fn poll_run(
    api: &dyn OpenAiApi,
    store: &mut dyn RunStore,
    client_id: Uuid,
    assistant_id: Uuid,
    run_id: &str,
) -> Result<RunView, ServiceError> {
    let row = store
        .find_run(client_id, assistant_id, run_id)?
        .ok_or(ServiceError::NotFound("run"))?;

    let remote = api
        .get_run(&row.thread_id, run_id)
        .await
        .map_err(|e| e.into_service_error(RemoteService::OpenAi))?;

    if remote.status != row.status {
        store.update_status(run_id, &remote.status)?;
    }

    let messages = if RunStatus::parse(&remote.status) == Some(RunStatus::Completed) {
        match api.list_messages(&row.thread_id).await {
            Ok(all) => Some(
                all.into_iter()
                    .filter(|m| m.role == "assistant" && m.created_at >= remote.created_at)
                    .map(|m| RunMessage {
                        text: m.text(),
                        id: m.id,
                        role: m.role,
                        created_at: m.created_at,
                    })
                    .collect(),
            ),
            Err(e) => {
                warn!(run_id, error = %e, "Failed to fetch run messages");
                None
            }
        }
    } else {
        None
    };

    Ok(RunView {
        run_id: remote.id,
        thread_id: row.thread_id,
        status: remote.status,
        last_error: remote
            .last_error
            .and_then(|e| e.message),
        messages,
    })
}

/// Ask the remote to cancel a cached run.
///
/// The local row is set to `cancelled` immediately even though the remote
/// usually reports `cancelling` first; the next poll reconciles.
pub async fn cancel_run(
    api: &dyn OpenAiApi,
    store: &mut dyn RunStore,
    client_id: Uuid,
    assistant_id: Uuid,
    run_id: &str,
) -> Result<RunView, ServiceError> {
    let row = store
        .find_run(client_id, assistant_id, run_id)?
        .ok_or(ServiceError::NotFound("run"))?;

    let remote = api
        .cancel_run(&row.thread_id, run_id)
        .await
        .map_err(|e| e.into_service_error(RemoteService::OpenAi))?;

    store.update_status(run_id, RunStatus::Cancelled.as_str())?;

    Ok(RunView {
        run_id: remote.id,
        thread_id: row.thread_id,
        status: remote.status,
        last_error: None,
        messages: None,
    })
}

/// Post a follow-up user message to a thread belonging to this tenant's
/// assistant. The thread must be known under the same assistant it was
/// started with; a sibling assistant's id does not grant access.
pub async fn post_to_thread(
    api: &dyn OpenAiApi,
    store: &mut dyn RunStore,
    client_id: Uuid,
    assistant_id: Uuid,
    thread_id: &str,
    message: &str,
) -> Result<RunMessage, ServiceError> {
    if !store.thread_known(client_id, assistant_id, thread_id)? {
        return Err(ServiceError::NotFound("thread"));
    }

    let posted = api
        .post_message(thread_id, message, &[])
        .await
        .map_err(|e| e.into_service_error(RemoteService::OpenAi))?;

    Ok(RunMessage {
        text: posted.text(),
        id: posted.id,
        role: posted.role,
        created_at: posted.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::openai::{
        AssistantSpec, AssistantUpdate, MessageAttachment, MessageContent, MessageText,
        RemoteAssistant, RemoteFile, RemoteMessage, RemoteRun, RemoteThread, RemoteVectorStore,
        RemoteVectorStoreFile,
    };
    use crate::remote::RemoteResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeRuns {
        remote_status: String,
        run_created_at: i64,
        thread_messages: Vec<RemoteMessage>,
        remote_calls: AtomicU32,
        cancels: Mutex<Vec<String>>,
        posted: Mutex<Vec<(String, String)>>,
    }

    fn text_message(id: &str, role: &str, created_at: i64, text: &str) -> RemoteMessage {
        RemoteMessage {
            id: id.to_string(),
            role: role.to_string(),
            created_at,
            content: vec![MessageContent {
                content_type: "text".to_string(),
                text: Some(MessageText {
                    value: text.to_string(),
                }),
            }],
        }
    }

    #[async_trait]
    impl OpenAiApi for FakeRuns {
        async fn create_thread(&self) -> RemoteResult<RemoteThread> {
            self.remote_calls.fetch_add(1, Ordering::SeqCst);
            Ok(RemoteThread {
                id: "thread_new".to_string(),
            })
        }

        async fn post_message(
            &self,
            thread_id: &str,
            content: &str,
            _attachments: &[MessageAttachment],
        ) -> RemoteResult<RemoteMessage> {
            self.remote_calls.fetch_add(1, Ordering::SeqCst);
            self.posted
                .lock()
                .unwrap()
                .push((thread_id.to_string(), content.to_string()));
            Ok(text_message("msg_user", "user", 100, content))
        }

        async fn create_run(&self, thread_id: &str, _: &str) -> RemoteResult<RemoteRun> {
            self.remote_calls.fetch_add(1, Ordering::SeqCst);
            Ok(RemoteRun {
                id: "run_new".to_string(),
                thread_id: thread_id.to_string(),
                status: "queued".to_string(),
                created_at: self.run_created_at,
                last_error: None,
            })
        }

        async fn get_run(&self, thread_id: &str, run_id: &str) -> RemoteResult<RemoteRun> {
            self.remote_calls.fetch_add(1, Ordering::SeqCst);
            Ok(RemoteRun {
                id: run_id.to_string(),
                thread_id: thread_id.to_string(),
                status: self.remote_status.clone(),
                created_at: self.run_created_at,
                last_error: None,
            })
        }

        async fn cancel_run(&self, thread_id: &str, run_id: &str) -> RemoteResult<RemoteRun> {
            self.remote_calls.fetch_add(1, Ordering::SeqCst);
            self.cancels.lock().unwrap().push(run_id.to_string());
            Ok(RemoteRun {
                id: run_id.to_string(),
                thread_id: thread_id.to_string(),
                status: "cancelling".to_string(),
                created_at: self.run_created_at,
                last_error: None,
            })
        }

        async fn list_messages(&self, _: &str) -> RemoteResult<Vec<RemoteMessage>> {
            self.remote_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.thread_messages.clone())
        }

        async fn create_assistant(&self, _: &AssistantSpec) -> RemoteResult<RemoteAssistant> {
            unimplemented!()
        }
        async fn get_assistant(&self, _: &str) -> RemoteResult<RemoteAssistant> {
            unimplemented!()
        }
        async fn update_assistant(
            &self,
            _: &str,
            _: &AssistantUpdate,
        ) -> RemoteResult<RemoteAssistant> {
            unimplemented!()
        }
        async fn delete_assistant(&self, _: &str) -> RemoteResult<()> {
            unimplemented!()
        }
        async fn create_vector_store(&self, _: &str) -> RemoteResult<RemoteVectorStore> {
            unimplemented!()
        }
        async fn get_vector_store(&self, _: &str) -> RemoteResult<RemoteVectorStore> {
            unimplemented!()
        }
        async fn delete_vector_store(&self, _: &str) -> RemoteResult<()> {
            unimplemented!()
        }
        async fn attach_vector_store_file(
            &self,
            _: &str,
            _: &str,
        ) -> RemoteResult<RemoteVectorStoreFile> {
            unimplemented!()
        }
        async fn remove_vector_store_file(&self, _: &str, _: &str) -> RemoteResult<()> {
            unimplemented!()
        }
        async fn list_vector_store_files(
            &self,
            _: &str,
        ) -> RemoteResult<Vec<RemoteVectorStoreFile>> {
            unimplemented!()
        }
        async fn upload_file(&self, _: &str, _: Vec<u8>) -> RemoteResult<RemoteFile> {
            unimplemented!()
        }
        async fn delete_file(&self, _: &str) -> RemoteResult<()> {
            unimplemented!()
        }
        async fn list_files(&self) -> RemoteResult<Vec<RemoteFile>> {
            unimplemented!()
        }
    }

    #[derive(Default)]
    struct MemoryRuns {
        rows: Vec<AssistantRun>,
        fail_insert: bool,
        inserts: u32,
        status_updates: Vec<(String, String)>,
    }

    impl MemoryRuns {
        fn with_row(client_id: Uuid, assistant_id: Uuid, thread_id: &str, run_id: &str) -> Self {
            let now = chrono::Utc::now().naive_utc();
            Self {
                rows: vec![AssistantRun {
                    id: Uuid::new_v4(),
                    client_id,
                    assistant_id,
                    thread_id: thread_id.to_string(),
                    run_id: run_id.to_string(),
                    status: "queued".to_string(),
                    created_at: now,
                    updated_at: now,
                }],
                ..Default::default()
            }
        }
    }

    impl RunStore for MemoryRuns {
        fn insert_run(&mut self, run: &NewAssistantRun) -> Result<(), ServiceError> {
            if self.fail_insert {
                return Err(ServiceError::Internal("insert failed".to_string()));
            }
            self.inserts += 1;
            let now = chrono::Utc::now().naive_utc();
            self.rows.push(AssistantRun {
                id: Uuid::new_v4(),
                client_id: run.client_id,
                assistant_id: run.assistant_id,
                thread_id: run.thread_id.clone(),
                run_id: run.run_id.clone(),
                status: run.status.clone(),
                created_at: now,
                updated_at: now,
            });
            Ok(())
        }

        fn find_run(
            &mut self,
            client_id: Uuid,
            assistant_id: Uuid,
            run_id: &str,
        ) -> Result<Option<AssistantRun>, ServiceError> {
            Ok(self
                .rows
                .iter()
                .find(|r| {
                    r.client_id == client_id
                        && r.assistant_id == assistant_id
                        && r.run_id == run_id
                })
                .cloned())
        }

        fn thread_known(
            &mut self,
            client_id: Uuid,
            assistant_id: Uuid,
            thread_id: &str,
        ) -> Result<bool, ServiceError> {
            Ok(self.rows.iter().any(|r| {
                r.client_id == client_id
                    && r.assistant_id == assistant_id
                    && r.thread_id == thread_id
            }))
        }

        fn update_status(&mut self, run_id: &str, status: &str) -> Result<(), ServiceError> {
            self.status_updates
                .push((run_id.to_string(), status.to_string()));
            for row in &mut self.rows {
                if row.run_id == run_id {
                    row.status = status.to_string();
                }
            }
            Ok(())
        }
    }

    fn test_assistant(client_id: Uuid) -> Assistant {
        let now = chrono::Utc::now().naive_utc();
        Assistant {
            id: Uuid::new_v4(),
            client_id,
            openai_id: "asst_remote".to_string(),
            name: "Support bot".to_string(),
            instructions: None,
            model: "gpt-4o-mini".to_string(),
            tool_config: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_round_trip() {
        for s in [
            "queued",
            "in_progress",
            "requires_action",
            "completed",
            "failed",
            "cancelling",
            "cancelled",
            "expired",
            "incomplete",
        ] {
            assert_eq!(RunStatus::parse(s).unwrap().as_str(), s);
        }
        assert!(RunStatus::parse("paused").is_none());
    }

    #[test]
    fn test_terminal_states() {
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Expired.is_terminal());
        assert!(!RunStatus::Queued.is_terminal());
        assert!(!RunStatus::Cancelling.is_terminal());
    }

    #[tokio::test]
    async fn start_run_on_fresh_thread() {
        let api = FakeRuns::default();
        let mut store = MemoryRuns::default();
        let client_id = Uuid::new_v4();
        let assistant = test_assistant(client_id);

        let view = start_run(&api, &mut store, client_id, &assistant, None, "hello")
            .await
            .unwrap();

        assert_eq!(view.thread_id, "thread_new");
        assert_eq!(view.run_id, "run_new");
        assert_eq!(view.status, "queued");
        assert_eq!(store.inserts, 1);
        assert_eq!(
            *api.posted.lock().unwrap(),
            vec![("thread_new".to_string(), "hello".to_string())]
        );
    }

    #[tokio::test]
    async fn start_run_rejects_foreign_thread_without_remote_calls() {
        let api = FakeRuns::default();
        let mut store = MemoryRuns::default();
        let client_id = Uuid::new_v4();
        let assistant = test_assistant(client_id);

        let err = start_run(
            &api,
            &mut store,
            client_id,
            &assistant,
            Some("thread_someone_elses"),
            "hello",
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound("thread")));
        assert_eq!(api.remote_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn start_run_survives_cache_insert_failure() {
        let api = FakeRuns::default();
        let mut store = MemoryRuns {
            fail_insert: true,
            ..Default::default()
        };
        let client_id = Uuid::new_v4();
        let assistant = test_assistant(client_id);

        let view = start_run(&api, &mut store, client_id, &assistant, None, "hello")
            .await
            .unwrap();

        assert_eq!(view.run_id, "run_new");
    }

    #[tokio::test]
    async fn poll_unknown_run_never_reaches_remote() {
        let api = FakeRuns::default();
        let client_id = Uuid::new_v4();
        let assistant_id = Uuid::new_v4();
        let mut store = MemoryRuns::default();

        let err = poll_run(&api, &mut store, client_id, assistant_id, "run_foreign")
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound("run")));
        assert_eq!(api.remote_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn poll_merges_remote_status() {
        let client_id = Uuid::new_v4();
        let assistant_id = Uuid::new_v4();
        let api = FakeRuns {
            remote_status: "in_progress".to_string(),
            ..Default::default()
        };
        let mut store = MemoryRuns::with_row(client_id, assistant_id, "thread_1", "run_1");

        let view = poll_run(&api, &mut store, client_id, assistant_id, "run_1")
            .await
            .unwrap();

        assert_eq!(view.status, "in_progress");
        assert!(view.messages.is_none());
        assert_eq!(
            store.status_updates,
            vec![("run_1".to_string(), "in_progress".to_string())]
        );
    }

    #[tokio::test]
    async fn completed_poll_attaches_only_new_assistant_messages() {
        let client_id = Uuid::new_v4();
        let assistant_id = Uuid::new_v4();
        let api = FakeRuns {
            remote_status: "completed".to_string(),
            run_created_at: 200,
            thread_messages: vec![
                text_message("msg_old", "assistant", 150, "from an earlier run"),
                text_message("msg_q", "user", 200, "question"),
                text_message("msg_a", "assistant", 210, "answer"),
            ],
            ..Default::default()
        };
        let mut store = MemoryRuns::with_row(client_id, assistant_id, "thread_1", "run_1");

        let view = poll_run(&api, &mut store, client_id, assistant_id, "run_1")
            .await
            .unwrap();

        let messages = view.messages.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, "msg_a");
        assert_eq!(messages[0].text, "answer");
    }

    #[tokio::test]
    async fn cancel_persists_cancelled_while_remote_reports_cancelling() {
        let client_id = Uuid::new_v4();
        let assistant_id = Uuid::new_v4();
        let api = FakeRuns::default();
        let mut store = MemoryRuns::with_row(client_id, assistant_id, "thread_1", "run_1");

        let view = cancel_run(&api, &mut store, client_id, assistant_id, "run_1")
            .await
            .unwrap();

        assert_eq!(view.status, "cancelling");
        assert_eq!(
            store.status_updates,
            vec![("run_1".to_string(), "cancelled".to_string())]
        );
        assert_eq!(*api.cancels.lock().unwrap(), vec!["run_1".to_string()]);
    }

    #[tokio::test]
    async fn cancel_unknown_run_never_reaches_remote() {
        let api = FakeRuns::default();
        let mut store = MemoryRuns::default();

        let err = cancel_run(&api, &mut store, Uuid::new_v4(), Uuid::new_v4(), "run_x")
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound("run")));
        assert_eq!(api.remote_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn post_to_thread_gates_on_ownership() {
        let api = FakeRuns::default();
        let client_id = Uuid::new_v4();
        let assistant_id = Uuid::new_v4();
        let mut store = MemoryRuns::with_row(client_id, assistant_id, "thread_1", "run_1");

        let msg = post_to_thread(&api, &mut store, client_id, assistant_id, "thread_1", "follow-up")
            .await
            .unwrap();
        assert_eq!(msg.role, "user");

        let err = post_to_thread(
            &api,
            &mut store,
            Uuid::new_v4(),
            assistant_id,
            "thread_1",
            "probe",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("thread")));
    }

    #[tokio::test]
    async fn thread_is_bound_to_its_assistant_within_a_tenant() {
        let api = FakeRuns::default();
        let client_id = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let sibling = Uuid::new_v4();
        let mut store = MemoryRuns::with_row(client_id, owner, "thread_1", "run_1");

        // Same tenant, wrong assistant: both the follow-up post and the
        // explicit-thread start must refuse.
        let err = post_to_thread(&api, &mut store, client_id, sibling, "thread_1", "probe")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("thread")));

        let mut other_assistant = test_assistant(client_id);
        other_assistant.id = sibling;
        let err = start_run(
            &api,
            &mut store,
            client_id,
            &other_assistant,
            Some("thread_1"),
            "probe",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("thread")));
        assert_eq!(api.remote_calls.load(Ordering::SeqCst), 0);
    }
}

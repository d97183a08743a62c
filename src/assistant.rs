//! Assistant - chat with the local LLM
//!
//! Chat goes through an [`LlmBackend`]. The default [`DemoBackend`] waits a
//! fixed interval and echoes the prompt back; [`OllamaBackend`] talks to a
//! local Ollama server. The store is locked only around the bookkeeping, never
//! across the backend call, so other commands keep working while a reply is
//! pending. Every pending call can be aborted through a `CancellationToken`.

use crate::config::{AppConfig, LlmBackendKind, PlaceholderTimings};
use crate::model::{LlmStatus, Message, Role};
use crate::SharedStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

const GREETING: &str = "Hello! I'm Jarvis, your local AI assistant.";

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("LLM backend error: {0}")]
    Backend(String),
    #[error("Request cancelled")]
    Cancelled,
}

/// Result of an LLM health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmHealth {
    pub running: bool,
    pub model: String,
}

/// One turn of conversation as sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for ChatTurn {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn chat(&self, model: &str, turns: &[ChatTurn]) -> Result<String, AssistantError>;
    async fn status(&self, model: &str) -> Result<LlmHealth, AssistantError>;
}

/// Canned replies after a fixed delay.
pub struct DemoBackend {
    reply_delay: Duration,
    status_delay: Duration,
}

impl DemoBackend {
    pub fn new(timings: PlaceholderTimings) -> Self {
        Self {
            reply_delay: timings.reply,
            status_delay: timings.status_check,
        }
    }

    pub fn demo_reply(prompt: &str) -> String {
        format!(
            "I understand you said: \"{prompt}\". This is a local demo response. In production, this would connect to your local Ollama instance."
        )
    }
}

#[async_trait]
impl LlmBackend for DemoBackend {
    async fn chat(&self, _model: &str, turns: &[ChatTurn]) -> Result<String, AssistantError> {
        tokio::time::sleep(self.reply_delay).await;
        let reply = turns
            .iter()
            .rev()
            .find(|t| t.role == Role::User)
            .map_or_else(|| GREETING.to_string(), |t| Self::demo_reply(&t.content));
        Ok(reply)
    }

    async fn status(&self, model: &str) -> Result<LlmHealth, AssistantError> {
        tokio::time::sleep(self.status_delay).await;
        Ok(LlmHealth {
            running: true,
            model: model.to_string(),
        })
    }
}

/// Non-streaming client for a local Ollama server.
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Deserialize)]
struct OllamaMessage {
    content: String,
}

#[derive(Deserialize)]
struct OllamaTags {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

impl OllamaBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Pick the configured model if the server has it (with or without a
    /// `:tag` suffix), otherwise whatever the server lists first.
    fn resolve_model(wanted: &str, available: &[OllamaModel]) -> String {
        available
            .iter()
            .find(|m| m.name == wanted || m.name.split(':').next() == Some(wanted))
            .or_else(|| available.first())
            .map(|m| m.name.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn chat(&self, model: &str, turns: &[ChatTurn]) -> Result<String, AssistantError> {
        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&OllamaChatRequest {
                model,
                messages: turns,
                stream: false,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Backend(format!("{status}: {body}")));
        }

        let body: OllamaChatResponse = response.json().await?;
        Ok(body.message.content)
    }

    async fn status(&self, model: &str) -> Result<LlmHealth, AssistantError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        let tags: OllamaTags = response.json().await?;
        let model = Self::resolve_model(model, &tags.models);
        Ok(LlmHealth {
            running: !model.is_empty(),
            model,
        })
    }
}

pub fn backend_from_config(config: &AppConfig) -> Arc<dyn LlmBackend> {
    match config.llm_backend {
        LlmBackendKind::Demo => Arc::new(DemoBackend::new(config.timings)),
        LlmBackendKind::Ollama => Arc::new(OllamaBackend::new(config.ollama_url.clone())),
    }
}

/// Drives chat and status checks against the store. The model name comes
/// from the current settings on every call.
pub struct Assistant {
    backend: Arc<dyn LlmBackend>,
}

impl Assistant {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    /// Record the user's message, wait for the backend, record the reply.
    ///
    /// Cancelling restores the LLM status from before the chat started and
    /// leaves the user's message in the history without a reply. A call
    /// superseded by a newer one no longer touches the status.
    pub async fn send_message(
        &self,
        store: &SharedStore,
        content: String,
        cancel: &CancellationToken,
    ) -> Result<String, AssistantError> {
        let (session, model, turns) = {
            let mut store = store.lock().await;
            store.push_message(Role::User, content);
            let session = store.begin_chat();
            let turns: Vec<ChatTurn> = store.messages().iter().map(ChatTurn::from).collect();
            (session, store.settings().llm_model, turns)
        };

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(AssistantError::Cancelled),
            reply = self.backend.chat(&model, &turns) => reply,
        };

        let mut store = store.lock().await;
        match result {
            Ok(reply) => {
                store.push_message(Role::Assistant, reply.clone());
                store.end_chat(session, Some(LlmStatus::Ready));
                Ok(reply)
            }
            Err(AssistantError::Cancelled) => {
                tracing::info!(session, "chat request cancelled");
                store.end_chat(session, None);
                Err(AssistantError::Cancelled)
            }
            Err(e) => {
                tracing::error!(error = %e, "chat request failed");
                store.end_chat(session, Some(LlmStatus::Error));
                Err(e)
            }
        }
    }

    /// Probe the backend and publish the result as the store's LLM status.
    pub async fn check_status(&self, store: &SharedStore) -> LlmHealth {
        let model = {
            let mut store = store.lock().await;
            store.set_llm_status(LlmStatus::Loading);
            store.settings().llm_model
        };

        let health = match self.backend.status(&model).await {
            Ok(health) => health,
            Err(e) => {
                tracing::warn!(error = %e, "LLM status check failed");
                LlmHealth {
                    running: false,
                    model: String::new(),
                }
            }
        };

        let mut store = store.lock().await;
        if health.running {
            store.set_llm_status(LlmStatus::Ready);
            store.set_llm_model(health.model.clone());
        } else {
            store.set_llm_status(LlmStatus::Offline);
        }
        health
    }

    /// Raw chat without touching the store's history.
    pub async fn chat(&self, model: &str, turns: &[ChatTurn]) -> Result<String, AssistantError> {
        self.backend.chat(model, turns).await
    }

    pub async fn health(&self, model: &str) -> Result<LlmHealth, AssistantError> {
        self.backend.status(model).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AppStore;
    use crate::storage::MemoryStore;
    use tokio::sync::Mutex;

    struct BrokenBackend;

    #[async_trait]
    impl LlmBackend for BrokenBackend {
        async fn chat(&self, _model: &str, _turns: &[ChatTurn]) -> Result<String, AssistantError> {
            Err(AssistantError::Backend("connection refused".to_string()))
        }
        async fn status(&self, _model: &str) -> Result<LlmHealth, AssistantError> {
            Err(AssistantError::Backend("connection refused".to_string()))
        }
    }

    fn shared_store() -> SharedStore {
        let mut store = AppStore::new(Arc::new(MemoryStore::new()));
        store.initialize();
        Arc::new(Mutex::new(store))
    }

    fn demo() -> Assistant {
        Assistant::new(Arc::new(DemoBackend::new(PlaceholderTimings::default())))
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_message_records_both_turns() {
        let store = shared_store();
        let reply = demo()
            .send_message(&store, "remind me".to_string(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            reply,
            "I understand you said: \"remind me\". This is a local demo response. In production, this would connect to your local Ollama instance."
        );
        let store = store.lock().await;
        let messages = store.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert!(messages[1].id > messages[0].id);
        assert_eq!(store.llm_status(), LlmStatus::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_message_waits_reply_delay() {
        let store = shared_store();
        let started = tokio::time::Instant::now();
        demo()
            .send_message(&store, "hi".to_string(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_message_restores_status() {
        let store = shared_store();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = demo().send_message(&store, "never mind".to_string(), &cancel).await;
        assert!(matches!(result, Err(AssistantError::Cancelled)));

        let store = store.lock().await;
        assert_eq!(store.messages().len(), 1);
        assert_eq!(store.llm_status(), LlmStatus::Offline);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_then_cancelled_chat_restores_status() {
        let store = shared_store();
        let assistant = Arc::new(demo());
        let (first, second) = (CancellationToken::new(), CancellationToken::new());

        let spawn_chat = |text: &str, token: &CancellationToken| {
            let (assistant, store, token) = (assistant.clone(), store.clone(), token.clone());
            let text = text.to_string();
            tokio::spawn(async move { assistant.send_message(&store, text, &token).await })
        };

        let a = spawn_chat("first", &first);
        tokio::time::sleep(Duration::from_millis(100)).await;
        let b = spawn_chat("second", &second);
        tokio::time::sleep(Duration::from_millis(100)).await;

        first.cancel();
        assert!(matches!(a.await.unwrap(), Err(AssistantError::Cancelled)));
        assert_eq!(store.lock().await.llm_status(), LlmStatus::Loading);

        second.cancel();
        assert!(matches!(b.await.unwrap(), Err(AssistantError::Cancelled)));
        let store = store.lock().await;
        assert_eq!(store.llm_status(), LlmStatus::Offline);
        assert_eq!(store.messages().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_check_does_not_clobber_pending_chat() {
        let store = shared_store();
        let assistant = Arc::new(demo());

        let chat = {
            let (assistant, store) = (assistant.clone(), store.clone());
            tokio::spawn(async move {
                assistant
                    .send_message(&store, "hi".to_string(), &CancellationToken::new())
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        let health = assistant.check_status(&store).await;
        assert!(health.running);
        assert_eq!(store.lock().await.llm_status(), LlmStatus::Loading);

        chat.await.unwrap().unwrap();
        assert_eq!(store.lock().await.llm_status(), LlmStatus::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backend_failure_sets_error() {
        let store = shared_store();
        let assistant = Assistant::new(Arc::new(BrokenBackend));
        let result = assistant
            .send_message(&store, "hello".to_string(), &CancellationToken::new())
            .await;
        assert!(result.is_err());
        assert_eq!(store.lock().await.llm_status(), LlmStatus::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_status() {
        let store = shared_store();
        let health = demo().check_status(&store).await;
        assert!(health.running);
        {
            let guard = store.lock().await;
            assert_eq!(guard.llm_status(), LlmStatus::Ready);
            assert_eq!(guard.llm_model(), "llama2");
        }

        let health = Assistant::new(Arc::new(BrokenBackend)).check_status(&store).await;
        assert!(!health.running);
        assert_eq!(store.lock().await.llm_status(), LlmStatus::Offline);
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_greets_without_user_turn() {
        let reply = demo().chat("llama2", &[]).await.unwrap();
        assert_eq!(reply, GREETING);
    }

    #[test]
    fn test_resolve_ollama_model() {
        let models = vec![
            OllamaModel { name: "mistral:latest".to_string() },
            OllamaModel { name: "llama2:7b".to_string() },
        ];
        assert_eq!(OllamaBackend::resolve_model("llama2", &models), "llama2:7b");
        assert_eq!(OllamaBackend::resolve_model("llama2", &models[..1]), "mistral:latest");
        assert_eq!(OllamaBackend::resolve_model("llama2", &[]), "");
    }
}

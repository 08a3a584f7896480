//! Conversational mapping advisor.
//!
//! Relays free-form questions about an uploaded ledger to the completion
//! client, with a system prompt assembled from whatever reference material
//! the host application loaded: the target chart summary, established
//! mapping patterns, and the session's uploaded ledger.

use std::collections::BTreeMap;
use std::sync::Arc;

use ledgermap_core::session::UploadStore;
use ledgermap_interaction::{ChatMessage, CompletionClient};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::MappingError;
use crate::prompt;

// Messages containing one of these route to ledger analysis when the session
// has an uploaded ledger.
const LEDGER_QUERY_KEYWORDS: &[&str] = &[
    "map", "mapping", "analyze", "analysis", "suggest", "recommend", "accounts", "data",
];

/// Summary of the target chart of accounts, usually deserialized from a
/// reference file by the host application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceChart {
    #[serde(default)]
    pub total_accounts: usize,
    /// Class name -> sub-classes. Ordered so rendered prompts are stable.
    #[serde(default)]
    pub account_classes: BTreeMap<String, AccountClass>,
}

/// One account class of the reference chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountClass {
    /// Sub-class name -> accounts in it.
    #[serde(default)]
    pub sub_classes: BTreeMap<String, Vec<ReferenceAccount>>,
}

/// A single account of the reference chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceAccount {
    pub account_code: String,
    pub description: String,
}

/// An established source -> target mapping used as a worked example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingPattern {
    pub source_code: String,
    pub target_code: String,
    pub confidence: u8,
    pub source_description: String,
    pub target_description: String,
    pub mapping_type: String,
    pub notes: String,
}

/// One advisor chat turn.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// The new user message.
    pub message: String,
    /// Prior conversation, most recent last.
    pub conversation: Vec<ChatMessage>,
    /// Session id of an uploaded ledger, when the caller has one.
    pub session_id: Option<String>,
    /// Arbitrary mapping context the UI carries along.
    pub mapping_context: Option<serde_json::Value>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_conversation(mut self, conversation: Vec<ChatMessage>) -> Self {
        self.conversation = conversation;
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_mapping_context(mut self, context: serde_json::Value) -> Self {
        self.mapping_context = Some(context);
        self
    }
}

/// Conversational service over the completion client.
pub struct MappingAdvisor {
    client: Arc<dyn CompletionClient>,
    uploads: Arc<dyn UploadStore>,
    chart: Option<ReferenceChart>,
    patterns: Vec<MappingPattern>,
}

impl MappingAdvisor {
    pub fn new(client: Arc<dyn CompletionClient>, uploads: Arc<dyn UploadStore>) -> Self {
        Self {
            client,
            uploads,
            chart: None,
            patterns: Vec::new(),
        }
    }

    /// Attaches a target chart summary for the system prompt.
    pub fn with_reference_chart(mut self, chart: ReferenceChart) -> Self {
        self.chart = Some(chart);
        self
    }

    /// Attaches established mapping patterns for the system prompt.
    pub fn with_mapping_patterns(mut self, patterns: Vec<MappingPattern>) -> Self {
        self.patterns = patterns;
        self
    }

    /// Answers one chat turn.
    ///
    /// Messages that look like ledger-analysis queries are routed to
    /// [`MappingAdvisor::analyze`] when the session has an uploaded ledger;
    /// everything else goes through the general advisor system prompt.
    ///
    /// # Errors
    ///
    /// [`MappingError::EmptyMessage`] for a whitespace-only message,
    /// [`MappingError::Completion`] when the upstream call fails.
    pub async fn chat(&self, request: &ChatRequest) -> Result<String, MappingError> {
        if request.message.trim().is_empty() {
            return Err(MappingError::EmptyMessage);
        }

        let ledger = match request.session_id.as_deref() {
            Some(session_id) => self.uploads.get(session_id).await,
            None => None,
        };

        if let (Some(session_id), Some(_)) = (request.session_id.as_deref(), ledger.as_ref()) {
            if is_ledger_query(&request.message) {
                debug!(session_id, "routing chat message to ledger analysis");
                return self.analyze(session_id, &request.message).await;
            }
        }

        let system = prompt::render_advisor_system(
            self.chart.as_ref(),
            &self.patterns,
            ledger.as_ref(),
            request.mapping_context.as_ref(),
        )?;

        let mut messages = request.conversation.clone();
        messages.push(ChatMessage::user(request.message.clone()));

        info!(turns = messages.len(), "advisor chat turn");
        Ok(self.client.complete(&messages, Some(&system)).await?)
    }

    /// Runs the ledger-analysis prompt for a session's uploaded ledger.
    ///
    /// # Errors
    ///
    /// [`MappingError::SessionNotFound`] when no ledger was uploaded under
    /// `session_id`.
    pub async fn analyze(&self, session_id: &str, query: &str) -> Result<String, MappingError> {
        let ledger = self
            .uploads
            .get(session_id)
            .await
            .ok_or_else(|| MappingError::SessionNotFound(session_id.to_string()))?;

        info!(session_id, filename = %ledger.filename, "analyzing uploaded ledger");
        let analysis_prompt = prompt::render_analysis_prompt(&ledger, query)?;
        let messages = [ChatMessage::user(analysis_prompt)];
        Ok(self.client.complete(&messages, None).await?)
    }
}

fn is_ledger_query(message: &str) -> bool {
    let lower = message.to_lowercase();
    LEDGER_QUERY_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ledgermap_core::Account;
    use ledgermap_core::session::{InMemoryUploadStore, UploadedLedger};
    use ledgermap_interaction::UpstreamError;
    use std::sync::Mutex;

    /// Echoes a canned reply and records the (messages, system) pairs it saw.
    struct RecordingClient {
        reply: String,
        calls: Mutex<Vec<(Vec<ChatMessage>, Option<String>)>>,
    }

    impl RecordingClient {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(Vec<ChatMessage>, Option<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionClient for RecordingClient {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            system: Option<&str>,
        ) -> Result<String, UpstreamError> {
            self.calls
                .lock()
                .unwrap()
                .push((messages.to_vec(), system.map(str::to_string)));
            Ok(self.reply.clone())
        }
    }

    fn uploaded_ledger() -> UploadedLedger {
        UploadedLedger::new(
            "gl_export.csv",
            vec![Account::new("1010", "Operating Cash")],
            vec!["GL_Account".to_string(), "GL_Description".to_string()],
            Vec::new(),
        )
    }

    fn advisor(client: Arc<RecordingClient>) -> (MappingAdvisor, Arc<InMemoryUploadStore>) {
        let uploads = Arc::new(InMemoryUploadStore::new());
        (MappingAdvisor::new(client, uploads.clone()), uploads)
    }

    #[tokio::test]
    async fn blank_messages_are_rejected() {
        let client = Arc::new(RecordingClient::new("hello"));
        let (advisor, _) = advisor(client);

        let err = advisor.chat(&ChatRequest::new("   ")).await.unwrap_err();
        assert!(matches!(err, MappingError::EmptyMessage));
    }

    #[tokio::test]
    async fn chat_relays_conversation_and_system_prompt() {
        let client = Arc::new(RecordingClient::new("happy to help"));
        let (advisor, _) = advisor(client.clone());

        let request = ChatRequest::new("hello there")
            .with_conversation(vec![
                ChatMessage::user("hi"),
                ChatMessage::assistant("hello, how can I help with your mappings?"),
            ]);

        let reply = advisor.chat(&request).await.unwrap();
        assert_eq!(reply, "happy to help");

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        let (messages, system) = &calls[0];
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].content, "hello there");
        assert!(system.as_deref().unwrap().contains("accounting cross-reference mapping"));
    }

    #[tokio::test]
    async fn chat_embeds_uploaded_ledger_context_for_known_sessions() {
        let client = Arc::new(RecordingClient::new("ok"));
        let (advisor, uploads) = advisor(client.clone());
        uploads.put("session-1", uploaded_ledger()).await;

        // "hello" avoids the analysis keywords, so this stays a plain chat
        // turn with ledger context in the system prompt.
        let request = ChatRequest::new("hello!").with_session_id("session-1");
        advisor.chat(&request).await.unwrap();

        let calls = client.calls();
        let system = calls[0].1.as_deref().unwrap();
        assert!(system.contains("UPLOADED SOURCE FILE CONTEXT"));
        assert!(system.contains("gl_export.csv"));
    }

    #[tokio::test]
    async fn ledger_queries_route_to_analysis() {
        let client = Arc::new(RecordingClient::new("analysis text"));
        let (advisor, uploads) = advisor(client.clone());
        uploads.put("session-1", uploaded_ledger()).await;

        let request = ChatRequest::new("please map my accounts").with_session_id("session-1");
        let reply = advisor.chat(&request).await.unwrap();
        assert_eq!(reply, "analysis text");

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        let (messages, system) = &calls[0];
        // Analysis goes out as a single user prompt with no system prompt.
        assert!(system.is_none());
        assert_eq!(messages.len(), 1);
        assert!(messages[0].content.contains("Based on the uploaded file 'gl_export.csv'"));
        assert!(messages[0].content.contains("please map my accounts"));
    }

    #[tokio::test]
    async fn ledger_queries_without_an_upload_fall_back_to_chat() {
        let client = Arc::new(RecordingClient::new("general reply"));
        let (advisor, _) = advisor(client.clone());

        let request = ChatRequest::new("please map my accounts").with_session_id("missing");
        advisor.chat(&request).await.unwrap();

        let calls = client.calls();
        // No upload for the session: handled as a plain chat turn.
        assert!(calls[0].1.is_some());
    }

    #[tokio::test]
    async fn analyze_unknown_session_is_a_typed_error() {
        let client = Arc::new(RecordingClient::new("unused"));
        let (advisor, _) = advisor(client);

        let err = advisor.analyze("nope", "what do we have?").await.unwrap_err();
        match err {
            MappingError::SessionNotFound(id) => assert_eq!(id, "nope"),
            other => panic!("expected SessionNotFound, got {other:?}"),
        }
    }
}

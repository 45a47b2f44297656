//! Question flows that end in a remote suggestion.
//!
//! [`Wizard`] walks a fixed list of questions forward only and submits the
//! collected answers once. [`ChatSession`] is the open-ended variant: every
//! user message is sent with the recent history and the reply is appended.

use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::{json, Map, Value};

use crate::api::{ApiClient, Endpoint};
use crate::error::PortalError;
use crate::i18n::Lang;
use crate::model::{first_text, ChatMessage, MessageContent, Recipe};
use crate::store::{load_json, save_json, StateStore};

/// Messages of history sent along with a chat request.
pub const HISTORY_CONTEXT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardStep {
    pub key: String,
    /// Allowed answers; empty means free text.
    pub options: Vec<String>,
}

impl WizardStep {
    pub fn new(key: impl Into<String>, options: &[&str]) -> Self {
        Self {
            key: key.into(),
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardState {
    /// Waiting for the answer to the step at this index
    Asking(usize),
    /// Every step answered, nothing sent yet
    Ready,
    Submitting,
    Done(MessageContent),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRequest {
    pub prompt: String,
    pub answers: Vec<(String, String)>,
    pub lang: Lang,
}

#[async_trait]
pub trait SuggestionService: Send + Sync {
    async fn suggest(&self, request: &SuggestionRequest) -> Result<MessageContent, PortalError>;
}

/// Forward-only question flow.
#[derive(Debug, Clone)]
pub struct Wizard {
    steps: Vec<WizardStep>,
    answers: Vec<(String, String)>,
    state: WizardState,
    error: Option<String>,
}

impl Wizard {
    pub fn new(steps: Vec<WizardStep>) -> Result<Self, PortalError> {
        if steps.is_empty() {
            return Err(PortalError::Wizard("a wizard needs at least one step".to_string()));
        }
        Ok(Self {
            steps,
            answers: Vec::new(),
            state: WizardState::Asking(0),
            error: None,
        })
    }

    /// Questions of the health-conditioned recipe generator.
    pub fn recipe_generator() -> Self {
        Self {
            steps: vec![
                WizardStep::new("condition", &["diabetes", "hypertension", "heart", "celiac", "none"]),
                WizardStep::new("meal", &["breakfast", "lunch", "dinner", "snack"]),
                WizardStep::new("preference", &["vegetarian", "low-carb", "high-protein", "any"]),
            ],
            answers: Vec::new(),
            state: WizardState::Asking(0),
            error: None,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn current_step(&self) -> Option<&WizardStep> {
        match self.state {
            WizardState::Asking(i) => self.steps.get(i),
            _ => None,
        }
    }

    pub fn answers(&self) -> &[(String, String)] {
        &self.answers
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    /// Record the answer to the current step and advance exactly one step.
    pub fn answer(&mut self, value: &str) -> Result<&WizardState, PortalError> {
        let WizardState::Asking(index) = self.state else {
            return Err(PortalError::Wizard("no question is waiting for an answer".to_string()));
        };
        let step = &self.steps[index];
        let value = value.trim();
        if value.is_empty() {
            return Err(PortalError::Wizard(format!("empty answer for '{}'", step.key)));
        }
        if !step.options.is_empty() && !step.options.iter().any(|o| o == value) {
            return Err(PortalError::Wizard(format!(
                "'{}' is not an option for '{}'",
                value, step.key
            )));
        }

        self.answers.push((step.key.clone(), value.to_string()));
        self.error = None;
        self.state = if index + 1 == self.steps.len() {
            WizardState::Ready
        } else {
            WizardState::Asking(index + 1)
        };
        Ok(&self.state)
    }

    /// All answers as one prompt, e.g. `condition: diabetes; meal: lunch`.
    pub fn payload(&self) -> String {
        self.answers
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Send the collected answers. On failure the last question is asked again.
    pub async fn submit<S: SuggestionService + ?Sized>(
        &mut self,
        service: &S,
        lang: Lang,
    ) -> Result<MessageContent, PortalError> {
        if self.state != WizardState::Ready {
            return Err(PortalError::Wizard("wizard is not ready to submit".to_string()));
        }

        let request = SuggestionRequest {
            prompt: self.payload(),
            answers: self.answers.clone(),
            lang,
        };
        self.state = WizardState::Submitting;
        info!("Submitting wizard: {}", request.prompt);

        match service.suggest(&request).await {
            Ok(reply) => {
                self.state = WizardState::Done(reply.clone());
                Ok(reply)
            }
            Err(e) => {
                warn!("Wizard submission failed: {}", e);
                self.error = Some(e.user_message(lang).to_string());
                self.answers.pop();
                self.state = WizardState::Asking(self.steps.len() - 1);
                Err(e)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<String>,
    pub lang: Lang,
}

#[async_trait]
pub trait ChatService: Send + Sync {
    async fn reply(&self, request: &ChatRequest) -> Result<MessageContent, PortalError>;
}

/// Free-text conversation persisted in the client-state store.
pub struct ChatSession<'s> {
    store: &'s dyn StateStore,
    key: &'static str,
    messages: Vec<ChatMessage>,
    limit: Option<usize>,
    pending: bool,
    error: Option<String>,
}

impl<'s> ChatSession<'s> {
    pub fn load(store: &'s dyn StateStore, key: &'static str, limit: Option<usize>) -> Self {
        let messages = load_json(store, key).unwrap_or_default();
        let mut session = Self {
            store,
            key,
            messages,
            limit,
            pending: false,
            error: None,
        };
        session.enforce_limit();
        session
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Append a user message, ask the service, append its reply.
    pub async fn send<C: ChatService + ?Sized>(
        &mut self,
        text: &str,
        service: &C,
        lang: Lang,
    ) -> Result<&ChatMessage, PortalError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PortalError::Wizard("message is empty".to_string()));
        }

        let history = self
            .messages
            .iter()
            .rev()
            .take(HISTORY_CONTEXT)
            .rev()
            .map(|m| m.summary(lang))
            .collect();
        self.push(ChatMessage::user(text));

        let request = ChatRequest {
            message: text.to_string(),
            history,
            lang,
        };
        self.pending = true;
        self.error = None;
        let result = service.reply(&request).await;
        self.pending = false;

        match result {
            Ok(content) => {
                self.push(ChatMessage::assistant(content));
                self.messages
                    .last()
                    .ok_or_else(|| PortalError::Wizard("chat history is empty".to_string()))
            }
            Err(e) => {
                warn!("Chat request failed: {}", e);
                self.error = Some(e.user_message(lang).to_string());
                Err(e)
            }
        }
    }

    pub fn clear(&mut self) -> Result<(), PortalError> {
        self.messages.clear();
        self.error = None;
        self.store.remove(self.key)
    }

    fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.enforce_limit();
        if let Err(e) = save_json(self.store, self.key, &self.messages) {
            warn!("Could not persist chat history '{}': {}", self.key, e);
        }
    }

    fn enforce_limit(&mut self) {
        if let Some(limit) = self.limit {
            if self.messages.len() > limit {
                let excess = self.messages.len() - limit;
                self.messages.drain(..excess);
            }
        }
    }
}

/// Chat backed by one of the assistant endpoints.
#[derive(Debug, Clone)]
pub struct RemoteChat {
    client: ApiClient,
    endpoint: Endpoint,
}

impl RemoteChat {
    pub fn health_assistant(client: ApiClient) -> Self {
        Self {
            client,
            endpoint: Endpoint::HealthAssistant,
        }
    }

    pub fn what_to_cook(client: ApiClient) -> Self {
        Self {
            client,
            endpoint: Endpoint::WhatToCook,
        }
    }
}

#[async_trait]
impl ChatService for RemoteChat {
    async fn reply(&self, request: &ChatRequest) -> Result<MessageContent, PortalError> {
        let body = match self.endpoint {
            Endpoint::WhatToCook => json!({
                "ingredients": request.message,
                "lang": request.lang.code(),
            }),
            _ => json!({
                "message": request.message,
                "history": request.history,
                "lang": request.lang.code(),
            }),
        };
        let response = self.client.post(self.endpoint, &body).await?;
        parse_reply(&response)
    }
}

#[async_trait]
impl SuggestionService for ApiClient {
    async fn suggest(&self, request: &SuggestionRequest) -> Result<MessageContent, PortalError> {
        let answers: Map<String, Value> = request
            .answers
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        let body = json!({
            "prompt": request.prompt,
            "answers": answers,
            "lang": request.lang.code(),
        });
        let response = self.post(Endpoint::AiRecipes, &body).await?;
        parse_reply(&response)
    }
}

/// Interpret an assistant response as a recipe, a suggestions block or text.
pub fn parse_reply(body: &Value) -> Result<MessageContent, PortalError> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let message = first_text(body, &["error", "message"])
            .unwrap_or_else(|| "request was not successful".to_string());
        return Err(PortalError::Api(message));
    }

    let data = body.get("data").unwrap_or(body);
    if let Value::String(text) = data {
        return Ok(MessageContent::Text { text: text.clone() });
    }

    let recipe = data
        .get("recipe")
        .or_else(|| data.get("recipes").and_then(|r| r.get(0)))
        .and_then(Recipe::from_value);
    if let Some(recipe) = recipe {
        debug!("Reply carries recipe '{}'", recipe.id);
        return Ok(MessageContent::Recipe { recipe });
    }

    let suggestions = data.get("suggestions").unwrap_or(data);
    let recommended = strings(suggestions.get("recommended"));
    let avoid = strings(suggestions.get("avoid"));
    if !recommended.is_empty() || !avoid.is_empty() {
        return Ok(MessageContent::Suggestions {
            recommended,
            avoid,
            note: first_text(suggestions, &["note", "summary"]),
        });
    }

    first_text(data, &["reply", "response", "message", "text", "content"])
        .map(|text| MessageContent::Text { text })
        .ok_or_else(|| PortalError::Malformed("assistant reply has no usable content".to_string()))
}

fn strings(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    other => first_text(other, &["name", "item", "title"]),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, MEDICAL_CHAT_KEY};
    use std::sync::Mutex;

    struct EchoService;

    #[async_trait]
    impl SuggestionService for EchoService {
        async fn suggest(&self, request: &SuggestionRequest) -> Result<MessageContent, PortalError> {
            Ok(MessageContent::Text {
                text: request.prompt.clone(),
            })
        }
    }

    #[async_trait]
    impl ChatService for EchoService {
        async fn reply(&self, request: &ChatRequest) -> Result<MessageContent, PortalError> {
            Ok(MessageContent::Text {
                text: format!("{} ({} earlier)", request.message, request.history.len()),
            })
        }
    }

    struct TimeoutService;

    #[async_trait]
    impl SuggestionService for TimeoutService {
        async fn suggest(&self, _request: &SuggestionRequest) -> Result<MessageContent, PortalError> {
            Err(PortalError::Timeout(90))
        }
    }

    #[async_trait]
    impl ChatService for TimeoutService {
        async fn reply(&self, _request: &ChatRequest) -> Result<MessageContent, PortalError> {
            Err(PortalError::Timeout(90))
        }
    }

    /// Records what it was asked.
    #[derive(Default)]
    struct RecordingService {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SuggestionService for RecordingService {
        async fn suggest(&self, request: &SuggestionRequest) -> Result<MessageContent, PortalError> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            Ok(MessageContent::Text {
                text: "ok".to_string(),
            })
        }
    }

    fn two_step_wizard() -> Wizard {
        Wizard::new(vec![
            WizardStep::new("condition", &["diabetes", "none"]),
            WizardStep::new("meal", &[]),
        ])
        .unwrap()
    }

    #[test]
    fn test_wizard_advances_one_step_per_answer() {
        let mut wizard = two_step_wizard();
        assert_eq!(wizard.current_step().unwrap().key, "condition");
        assert_eq!(wizard.answer("diabetes").unwrap(), &WizardState::Asking(1));
        assert_eq!(wizard.answer("light lunch").unwrap(), &WizardState::Ready);
        assert!(wizard.answer("more").is_err());
        assert_eq!(wizard.payload(), "condition: diabetes; meal: light lunch");
    }

    #[test]
    fn test_wizard_rejects_unknown_option() {
        let mut wizard = two_step_wizard();
        assert!(wizard.answer("gout").is_err());
        assert!(wizard.answer("  ").is_err());
        assert_eq!(wizard.state(), &WizardState::Asking(0));
        assert!(Wizard::new(Vec::new()).is_err());
    }

    #[tokio::test]
    async fn test_wizard_submit_success() {
        let service = RecordingService::default();
        let mut wizard = two_step_wizard();
        assert!(wizard.submit(&service, Lang::En).await.is_err());

        wizard.answer("none").unwrap();
        wizard.answer("dinner").unwrap();
        wizard.submit(&service, Lang::En).await.unwrap();

        assert!(matches!(wizard.state(), WizardState::Done(_)));
        assert_eq!(
            service.prompts.lock().unwrap().as_slice(),
            &["condition: none; meal: dinner".to_string()]
        );
    }

    #[tokio::test]
    async fn test_wizard_failure_returns_to_last_step() {
        let mut wizard = two_step_wizard();
        wizard.answer("none").unwrap();
        wizard.answer("dinner").unwrap();

        let result = wizard.submit(&TimeoutService, Lang::Ar).await;

        assert!(matches!(result, Err(PortalError::Timeout(_))));
        assert_eq!(wizard.state(), &WizardState::Asking(1));
        assert_eq!(wizard.answers().len(), 1);
        assert!(wizard.error().is_some());

        wizard.answer("lunch").unwrap();
        let reply = wizard.submit(&EchoService, Lang::Ar).await.unwrap();
        assert_eq!(
            reply,
            MessageContent::Text {
                text: "condition: none; meal: lunch".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_chat_appends_and_persists() {
        let store = MemoryStore::new();
        {
            let mut chat = ChatSession::load(&store, MEDICAL_CHAT_KEY, None);
            chat.send("Is oatmeal ok?", &EchoService, Lang::En).await.unwrap();
            let reply = chat.send("And honey?", &EchoService, Lang::En).await.unwrap();
            assert_eq!(reply.summary(Lang::En), "And honey? (2 earlier)");
        }

        let chat = ChatSession::load(&store, MEDICAL_CHAT_KEY, None);
        assert_eq!(chat.messages().len(), 4);
    }

    #[tokio::test]
    async fn test_chat_failure_keeps_user_message() {
        let store = MemoryStore::new();
        let mut chat = ChatSession::load(&store, MEDICAL_CHAT_KEY, None);
        assert!(chat.send("hello", &TimeoutService, Lang::En).await.is_err());
        assert_eq!(chat.messages().len(), 1);
        assert!(chat.error().unwrap().contains("too long"));
        assert!(!chat.is_pending());
        assert!(chat.send("   ", &EchoService, Lang::En).await.is_err());
    }

    #[tokio::test]
    async fn test_chat_history_limit() {
        let store = MemoryStore::new();
        let mut chat = ChatSession::load(&store, MEDICAL_CHAT_KEY, Some(3));
        for text in ["one", "two", "three"] {
            chat.send(text, &EchoService, Lang::En).await.unwrap();
        }
        assert_eq!(chat.messages().len(), 3);
        assert_eq!(chat.messages()[1].summary(Lang::En), "three");
    }

    #[test]
    fn test_parse_reply_shapes() {
        let recipe = parse_reply(&json!({"success": true, "data": {"recipe": {"title": "Oat bowl"}}}));
        assert!(matches!(recipe, Ok(MessageContent::Recipe { .. })));

        let suggestions = parse_reply(&json!({
            "suggestions": {"recommended": ["Oats", {"name": "Lentils"}], "avoid": ["Sugar"]}
        }))
        .unwrap();
        assert_eq!(
            suggestions,
            MessageContent::Suggestions {
                recommended: vec!["Oats".to_string(), "Lentils".to_string()],
                avoid: vec!["Sugar".to_string()],
                note: None,
            }
        );

        let text = parse_reply(&json!({"reply": "Drink water"})).unwrap();
        assert_eq!(text, MessageContent::Text { text: "Drink water".to_string() });

        assert!(matches!(parse_reply(&json!({})), Err(PortalError::Malformed(_))));
        assert!(matches!(
            parse_reply(&json!({"success": false, "message": "busy"})),
            Err(PortalError::Api(_))
        ));
    }
}

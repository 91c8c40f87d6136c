//! End-to-end integration tests for the RagChat assistant.
//!
//! These tests drive whole conversations through the real pipeline: service
//! discovery, the local corpus search backend, prompt composition, and the
//! controller, with only the language model scripted.

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};

use ragchat_assistant::{ConversationController, Session};
use ragchat_config::{AppConfig, PromptProfile, TurnConfig};
use ragchat_core::error::CompletionError;
use ragchat_core::event::{DomainEvent, EventBus};
use ragchat_core::message::Role;
use ragchat_core::provider::{CompletionProvider, CompletionRequest, CompletionResponse, Usage};
use ragchat_core::search::{SearchRecord, ServiceDescriptor, ServiceDirectory};
use ragchat_core::Error;
use ragchat_providers::{CorpusSearchProvider, StaticDirectory};

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock completion backend that returns scripted texts in sequence.
struct ScriptedProvider {
    responses: Mutex<Vec<Result<String, CompletionError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let mut prompts = self.prompts.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let index = prompts.len();
        if index >= responses.len() {
            panic!(
                "ScriptedProvider exhausted: call #{}, have {}",
                index,
                responses.len()
            );
        }
        prompts.push(request.prompt);
        responses[index].clone().map(|text| CompletionResponse {
            text,
            model: request.model,
            usage: Some(Usage {
                prompt_tokens: 100,
                completion_tokens: 20,
                total_tokens: 120,
            }),
        })
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────

const MODEL: &str = "mistral-large2";

fn record(chunk: &str) -> SearchRecord {
    let mut record = SearchRecord::new();
    record.insert("chunk".into(), serde_json::Value::String(chunk.into()));
    record
}

fn ems_corpus() -> CorpusSearchProvider {
    let mut corpora = HashMap::new();
    corpora.insert(
        "ems_protocols".to_string(),
        vec![
            record("Helmet removal: leave the helmet in place unless the airway cannot be managed. Trauma, Page 12 (Spinal Care)"),
            record("DNR orders: a valid Michigan do-not-resuscitate order must be honored. Legal, Page 3 (DNR)"),
            record("Cardiac arrest: begin compressions immediately and attach the AED. Cardiac, Page 7 (Arrest)"),
            record("Stroke: perform a stroke scale and note the last known well time. Medical, Page 9 (Stroke)"),
            record("Burns: cool the burn with clean water for twenty minutes. Trauma, Page 20 (Burns)"),
        ],
    );
    CorpusSearchProvider::from_records(corpora)
}

fn directory() -> StaticDirectory {
    StaticDirectory::new(vec![ServiceDescriptor::new("ems_protocols", "chunk")])
}

fn models() -> Vec<String> {
    ragchat_config::DEFAULT_MODELS
        .iter()
        .map(|m| m.to_string())
        .collect()
}

fn turn() -> TurnConfig {
    TurnConfig {
        service: "ems_protocols".into(),
        model: MODEL.into(),
        num_chat_messages: 5,
        num_retrieved_chunks: 3,
        use_chat_history: true,
        debug: false,
    }
}

async fn start(
    provider: Arc<ScriptedProvider>,
    events: Arc<EventBus>,
) -> (ConversationController, Session) {
    let controller = ConversationController::new(
        provider,
        Arc::new(ems_corpus()),
        PromptProfile::default(),
        models(),
        events.clone(),
    );
    let session = Session::start(&directory(), "Hello! Ask me about EMS protocols.", events)
        .await
        .unwrap();
    (controller, session)
}

// ── E2E: Conversations ───────────────────────────────────────────────────

#[tokio::test]
async fn e2e_single_question_grounded_in_corpus() {
    let provider = Arc::new(ScriptedProvider::texts(&[
        "Leave the helmet in place unless the airway cannot be managed.\n\n**Sources**\n*Trauma, Page 12 (Spinal Care)*",
    ]));
    let (controller, mut session) = start(provider.clone(), Arc::new(EventBus::default())).await;

    let answer = controller
        .handle_turn("Is it okay to remove a helmet?", &turn(), &mut session)
        .await
        .unwrap();

    assert!(answer.content().contains("helmet in place"));
    assert_eq!(provider.calls(), 1);

    let prompt = &provider.prompts()[0];
    assert!(prompt.contains("Helmet removal: leave the helmet in place"));
    assert!(!prompt.contains("Burns:"));
    assert!(prompt.contains("<question>\nIs it okay to remove a helmet?\n</question>"));
    assert!(prompt.contains("<chat_history>\n\n</chat_history>"));
    assert!(prompt.trim_end().ends_with("Answer:"));
}

#[tokio::test]
async fn e2e_follow_up_questions_are_reformulated() {
    let provider = Arc::new(ScriptedProvider::texts(&[
        "Leave the helmet on.",
        "DNR order for a patient with a helmet",
        "Honor a valid DNR.",
        "cardiac arrest compressions for a patient with a DNR order",
        "Begin compressions and attach the AED unless a valid DNR exists.",
    ]));
    let (controller, mut session) = start(provider.clone(), Arc::new(EventBus::default())).await;
    let config = turn();

    for question in [
        "Is it okay to remove a helmet?",
        "What about DNR orders?",
        "what about cardiac arrest?",
    ] {
        controller
            .handle_turn(question, &config, &mut session)
            .await
            .unwrap();
    }

    assert_eq!(provider.calls(), 5);
    let prompts = provider.prompts();

    // Third turn: reformulation sees both earlier topics
    let summary_prompt = &prompts[3];
    assert!(summary_prompt.contains("user: Is it okay to remove a helmet?"));
    assert!(summary_prompt.contains("user: What about DNR orders?"));
    assert!(summary_prompt.contains("<question>\nwhat about cardiac arrest?\n</question>"));

    // The reformulated query found the cardiac arrest protocol
    let answer_prompt = &prompts[4];
    assert!(answer_prompt.contains("Cardiac arrest: begin compressions"));
    assert!(answer_prompt.contains("<question>\nwhat about cardiac arrest?\n</question>"));

    let transcript = session.transcript();
    assert_eq!(transcript.len(), 7);
    assert!(transcript.is_alternating());
    assert_eq!(transcript.messages()[0].role(), Role::Assistant);
}

#[tokio::test]
async fn e2e_new_conversation_forgets_history() {
    let provider = Arc::new(ScriptedProvider::texts(&[
        "Leave the helmet on.",
        "Cool the burn with water.",
    ]));
    let (controller, mut session) = start(provider.clone(), Arc::new(EventBus::default())).await;

    controller
        .handle_turn("Is it okay to remove a helmet?", &turn(), &mut session)
        .await
        .unwrap();
    session.reset();
    controller
        .handle_turn("How long should I cool burns?", &turn(), &mut session)
        .await
        .unwrap();

    // No summarizer call after the reset: still one call per turn
    assert_eq!(provider.calls(), 2);
    assert!(!provider.prompts()[1].contains("helmet"));
    assert_eq!(session.transcript().len(), 3);
}

#[tokio::test]
async fn e2e_unanswerable_question_gets_empty_documents() {
    let provider = Arc::new(ScriptedProvider::texts(&[
        "I don't know the answer to that question.",
    ]));
    let (controller, mut session) = start(provider.clone(), Arc::new(EventBus::default())).await;

    let answer = controller
        .handle_turn("What days do we have off?", &turn(), &mut session)
        .await
        .unwrap();

    assert_eq!(answer.content(), ragchat_assistant::REFUSAL);
    assert!(provider.prompts()[0].contains("<documents>\n\n</documents>"));
}

#[tokio::test]
async fn e2e_model_failure_keeps_question_unanswered() {
    let provider = Arc::new(ScriptedProvider::new(vec![Err(
        CompletionError::RateLimited {
            retry_after_secs: 30,
        },
    )]));
    let events = Arc::new(EventBus::default());
    let mut rx = events.subscribe();
    let (controller, mut session) = start(provider, events).await;

    let err = controller
        .handle_turn("Is it okay to remove a helmet?", &turn(), &mut session)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Completion(CompletionError::RateLimited { .. })));
    assert_eq!(session.transcript().len(), 2);
    assert_eq!(session.transcript().last().unwrap().role(), Role::User);

    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        kinds.push(match event.as_ref() {
            DomainEvent::ServicesDiscovered { .. } => "discovered",
            DomainEvent::TurnStarted { .. } => "started",
            DomainEvent::TurnFailed { .. } => "failed",
            DomainEvent::TurnCompleted { .. } => "completed",
            _ => "other",
        });
    }
    assert_eq!(kinds, vec!["discovered", "started", "failed"]);
}

#[tokio::test]
async fn e2e_debug_mode_exposes_context() {
    let provider = Arc::new(ScriptedProvider::texts(&["Leave the helmet on."]));
    let events = Arc::new(EventBus::default());
    let mut rx = events.subscribe();
    let (controller, mut session) = start(provider, events).await;
    let mut config = turn();
    config.debug = true;

    controller
        .handle_turn("Is it okay to remove a helmet?", &config, &mut session)
        .await
        .unwrap();

    let mut context = None;
    while let Ok(event) = rx.try_recv() {
        if let DomainEvent::ContextRetrieved { context: c, .. } = event.as_ref() {
            context = Some(c.clone());
        }
    }
    assert!(context.unwrap().contains("Helmet removal"));
}

// ── E2E: Configuration to backends ───────────────────────────────────────

#[tokio::test]
async fn e2e_config_file_builds_corpus_backends() {
    let dir = tempfile::tempdir().unwrap();
    let corpus_dir = dir.path().join("corpus");
    std::fs::create_dir_all(&corpus_dir).unwrap();

    let mut file = std::fs::File::create(corpus_dir.join("hr_handbook.jsonl")).unwrap();
    writeln!(file, r#"{{"text": "Holidays: the office is closed on New Year's Day and Labor Day."}}"#).unwrap();
    writeln!(file, "not json").unwrap();
    writeln!(file, r#"{{"text": "Expenses: submit receipts within thirty days."}}"#).unwrap();

    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[completion]
provider = "ollama"

[search]
backend = "corpus"
corpus_dir = "{}"

[[search.services]]
name = "hr_handbook"
search_column = "text"

[chat]
default_model = "mistral-large2"
num_retrieved_chunks = 2

[prompt]
assistant_description = "for company policy questions."
corpus_name = "Employee Handbook"
"#,
            corpus_dir.display().to_string().replace('\\', "/")
        ),
    )
    .unwrap();

    let config = AppConfig::load_from(&config_path).unwrap();
    let backends = ragchat_providers::build_from_config(&config).unwrap();
    assert_eq!(backends.search.name(), "corpus");

    let services = backends.directory.list_services().await.unwrap();
    assert_eq!(services, vec![ServiceDescriptor::new("hr_handbook", "text")]);

    let provider = Arc::new(ScriptedProvider::texts(&["The office closes on Labor Day."]));
    let events = Arc::new(EventBus::default());
    let controller = ConversationController::new(
        provider.clone(),
        backends.search.clone(),
        config.prompt.clone(),
        config.models.clone(),
        events.clone(),
    );
    let mut session = Session::start(backends.directory.as_ref(), config.chat.greeting.clone(), events)
        .await
        .unwrap();

    let turn = config.turn_defaults(session.default_service().unwrap());
    controller
        .handle_turn("Which holidays is the office closed?", &turn, &mut session)
        .await
        .unwrap();

    let prompt = &provider.prompts()[0];
    assert!(prompt.contains("You are an expert AI assistant for company policy questions."));
    assert!(prompt.contains("*Employee Handbook*"));
    assert!(prompt.contains("Holidays: the office is closed"));
    assert!(!prompt.contains("Expenses:"));
}

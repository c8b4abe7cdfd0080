use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;

use carlot_agent::{
    AgentRuntime, CatalogContext, CompletionRequest, LlmClient, PresentationMode, TurnKind,
};
use carlot_core::config::AppConfig;
use carlot_core::conversation::Session;
use carlot_core::domain::catalog::{CatalogStatistics, FieldMetadata, PriceRange, YearRange};
use carlot_core::domain::vehicle::{Vehicle, VehicleId};
use carlot_core::search::{Filter, ResultPage};
use carlot_db::{
    CatalogClient, CatalogRepository, CatalogService, DemoCatalog, InMemoryVehicleRepository,
    RepositoryError,
};

const SEARCH: &str = r#"{"needs_search": true, "intent_type": "search", "confidence": 0.9}"#;
const CHAT: &str = r#"{"needs_search": false, "intent_type": "conversation", "confidence": 0.8}"#;

#[derive(Clone, Default)]
struct ScriptedLlm {
    responses: Arc<Mutex<VecDeque<anyhow::Result<String>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedLlm {
    fn reply(self, response: &str) -> Self {
        self.responses.lock().expect("lock").push_back(Ok(response.to_string()));
        self
    }

    fn fail(self) -> Self {
        self.responses.lock().expect("lock").push_back(Err(anyhow!("backend unavailable")));
        self
    }

    fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<String> {
        self.requests.lock().expect("lock").push(request.clone());
        self.responses
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("script exhausted")))
    }
}

struct BrokenRepository;

#[async_trait]
impl CatalogRepository for BrokenRepository {
    async fn search(&self, _filter: &Filter) -> Result<ResultPage, RepositoryError> {
        Err(RepositoryError::Decode("database is locked".to_string()))
    }

    async fn find_by_id(&self, _id: VehicleId) -> Result<Option<Vehicle>, RepositoryError> {
        Err(RepositoryError::Decode("database is locked".to_string()))
    }

    async fn list_brands(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(Vec::new())
    }

    async fn price_range(&self) -> Result<Option<PriceRange>, RepositoryError> {
        Ok(None)
    }

    async fn year_range(&self) -> Result<Option<YearRange>, RepositoryError> {
        Ok(None)
    }

    async fn statistics(&self) -> Result<CatalogStatistics, RepositoryError> {
        Err(RepositoryError::Decode("database is locked".to_string()))
    }

    async fn field_metadata(&self) -> Result<Vec<FieldMetadata>, RepositoryError> {
        Ok(Vec::new())
    }
}

fn client(repository: Arc<dyn CatalogRepository>) -> CatalogClient {
    CatalogClient::new(Arc::new(CatalogService::new(repository)))
}

async fn runtime_over(
    repository: Arc<dyn CatalogRepository>,
    llm: &ScriptedLlm,
) -> AgentRuntime {
    AgentRuntime::bootstrap(&AppConfig::default(), Arc::new(llm.clone()), client(repository))
        .await
        .expect("runtime")
}

async fn demo_runtime(llm: &ScriptedLlm) -> (AgentRuntime, Arc<InMemoryVehicleRepository>) {
    let repository = Arc::new(InMemoryVehicleRepository::new(DemoCatalog::vehicles()));
    (runtime_over(repository.clone(), llm).await, repository)
}

#[tokio::test]
async fn bootstrap_loads_catalog_context() {
    let (runtime, _) = demo_runtime(&ScriptedLlm::default()).await;

    assert_eq!(runtime.context().total, DemoCatalog::vehicles().len() as u64);
    assert!(runtime.context().brands.contains(&"Toyota".to_string()));
    assert!(runtime.context().price_range.is_some());
}

#[tokio::test]
async fn exit_in_any_case_ends_the_session_without_searching() {
    let llm = ScriptedLlm::default().reply("Goodbye, come back soon!");
    let (runtime, _) = demo_runtime(&llm).await;
    let mut session = Session::new();

    let outcome = runtime.handle_turn(&mut session, "  EXIT ").await;

    assert_eq!(outcome.kind, TurnKind::Farewell);
    assert!(outcome.end_session);
    assert_eq!(outcome.reply, "Goodbye, come back soon!");
    assert!(outcome.presentation.is_none());
    let requests = llm.requests();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].json_mode);
}

#[tokio::test]
async fn red_cars_under_forty_thousand_end_to_end() {
    let llm = ScriptedLlm::default()
        .reply(SEARCH)
        .reply(r#"{"cor": "Vermelho", "preco_max": 40000}"#)
        .reply("Here are the red cars I found.");
    let (runtime, _) = demo_runtime(&llm).await;
    let mut session = Session::new();

    let outcome = runtime.handle_turn(&mut session, "red cars under 40000").await;

    assert_eq!(outcome.kind, TurnKind::Search);
    assert_eq!(outcome.reply, "Here are the red cars I found.");
    let presentation = outcome.presentation.expect("presentation");
    assert_eq!(presentation.mode, PresentationMode::Detailed);
    assert!(presentation.total > 0);
    for id in &presentation.rendered_ids {
        let vehicle = DemoCatalog::vehicles()
            .into_iter()
            .find(|vehicle| vehicle.id == *id)
            .expect("rendered id exists");
        assert_eq!(vehicle.color, "Vermelho");
        assert!(vehicle.price <= rust_decimal::Decimal::from(40_000));
    }

    let phrasing = llm.requests().pop().expect("phrasing request");
    assert!(phrasing.system.is_some_and(|system| system.contains("Toyota")));
    let prompt = &phrasing.messages.last().expect("prompt").content;
    assert!(prompt.contains("1. "));
    assert_eq!(session.last_listing(), presentation.rendered_ids.as_slice());
}

#[tokio::test]
async fn list_everything_falls_back_to_deterministic_summary() {
    let llm = ScriptedLlm::default()
        .reply(SEARCH)
        .reply(r#"{"marca": "Ferrari", "numero_portas": 2}"#)
        .fail();
    let (runtime, _) = demo_runtime(&llm).await;
    let mut session = Session::new();

    let outcome = runtime.handle_turn(&mut session, "list everything").await;

    let total = DemoCatalog::vehicles().len();
    assert_eq!(outcome.filter.as_ref().map(|fields| fields.len()), Some(1));
    let presentation = outcome.presentation.expect("presentation");
    assert_eq!(presentation.mode, PresentationMode::Summary);
    assert_eq!(presentation.shown, 10);
    assert!(outcome.reply.contains(&format!("(showing 10 of {total})")));
    assert!(outcome.reply.contains("10. "));
}

#[tokio::test]
async fn item_reference_resolves_against_last_listing() {
    let llm = ScriptedLlm::default()
        .reply(SEARCH)
        .reply("{}")
        .fail()
        .reply(SEARCH)
        .fail();
    let (runtime, _) = demo_runtime(&llm).await;
    let mut session = Session::new();

    let listing = runtime.handle_turn(&mut session, "show me all available cars").await;
    let listed = listing.presentation.expect("listing").rendered_ids;

    let detail = runtime.handle_turn(&mut session, "tell me about item 2").await;

    let presentation = detail.presentation.expect("detail presentation");
    assert_eq!(presentation.mode, PresentationMode::Detailed);
    assert_eq!(presentation.rendered_ids, vec![listed[1]]);
    assert_eq!(session.last_listing(), listed.as_slice());
}

#[tokio::test]
async fn reference_to_removed_record_reports_not_found() {
    let llm = ScriptedLlm::default()
        .reply(SEARCH)
        .reply("{}")
        .fail()
        .reply(SEARCH);
    let (runtime, repository) = demo_runtime(&llm).await;
    let mut session = Session::new();

    let listing = runtime.handle_turn(&mut session, "show me all available cars").await;
    let first = listing.presentation.expect("listing").rendered_ids[0];
    repository.remove(first).await.expect("vehicle removed");

    let outcome = runtime.handle_turn(&mut session, "item 1").await;

    assert!(outcome.reply.contains("couldn't find that car"));
    assert!(outcome.presentation.is_none());
}

#[tokio::test]
async fn reference_beyond_last_listing_reports_not_found() {
    let llm = ScriptedLlm::default()
        .reply(SEARCH)
        .reply(r#"{"cor": "Vermelho", "preco_max": 40000}"#)
        .fail()
        .reply(SEARCH);
    let (runtime, _) = demo_runtime(&llm).await;
    let mut session = Session::new();

    let listing = runtime.handle_turn(&mut session, "red cars under 40000").await;
    let listed = listing.presentation.expect("listing").rendered_ids;
    assert!(!listed.is_empty() && listed.len() < 9);

    let outcome = runtime.handle_turn(&mut session, "tell me about item 9").await;

    assert!(outcome.reply.contains("couldn't find that car"), "reply: {}", outcome.reply);
    assert!(outcome.presentation.is_none());
    assert_eq!(session.last_listing(), listed.as_slice());
}

#[tokio::test]
async fn absurd_price_bound_yields_no_results() {
    let llm = ScriptedLlm::default()
        .reply(SEARCH)
        .reply(r#"{"preco_max": 1e28}"#)
        .fail();
    let (runtime, _) = demo_runtime(&llm).await;
    let mut session = Session::new();

    let outcome = runtime.handle_turn(&mut session, "cars under a zillion").await;

    assert_eq!(outcome.kind, TurnKind::Search);
    let presentation = outcome.presentation.expect("presentation");
    assert_eq!(presentation.mode, PresentationMode::NoResults);
    assert!(session.last_listing().is_empty());
}

#[tokio::test]
async fn invalid_filter_yields_no_results() {
    let llm = ScriptedLlm::default()
        .reply(SEARCH)
        .reply(r#"{"ano_min": 2023, "ano_max": 2020}"#)
        .fail();
    let (runtime, _) = demo_runtime(&llm).await;
    let mut session = Session::new();

    let outcome = runtime.handle_turn(&mut session, "cars between 2023 and 2020").await;

    let presentation = outcome.presentation.expect("presentation");
    assert_eq!(presentation.mode, PresentationMode::NoResults);
    assert!(outcome.reply.contains("couldn't find any cars"));
}

#[tokio::test]
async fn storage_failure_is_reported_and_session_continues() {
    let llm = ScriptedLlm::default()
        .reply(SEARCH)
        .reply(r#"{"marca": "Fiat"}"#)
        .reply(CHAT)
        .reply("Hi there!");
    let runtime = runtime_over(Arc::new(BrokenRepository), &llm).await;
    let mut session = Session::new();

    assert_eq!(runtime.context(), &CatalogContext::default());

    let failed = runtime.handle_turn(&mut session, "find a fiat").await;
    assert_eq!(
        failed.reply,
        "I couldn't complete that search right now. Please try again in a moment."
    );
    assert!(!failed.end_session);

    let next = runtime.handle_turn(&mut session, "hello").await;
    assert_eq!(next.kind, TurnKind::Conversation);
    assert_eq!(next.reply, "Hi there!");
    assert_eq!(session.history.len(), 4);
}

#[tokio::test]
async fn conversation_phrasing_failure_apologizes() {
    let llm = ScriptedLlm::default().reply(CHAT).fail();
    let (runtime, _) = demo_runtime(&llm).await;
    let mut session = Session::new();

    let outcome = runtime.handle_turn(&mut session, "good morning").await;

    assert_eq!(outcome.kind, TurnKind::Conversation);
    assert!(outcome.reply.starts_with("Sorry"));
}

#[tokio::test]
async fn metrics_request_answers_from_field_metadata() {
    let llm = ScriptedLlm::default();
    let (runtime, _) = demo_runtime(&llm).await;
    let mut session = Session::new();

    let outcome = runtime.handle_turn(&mut session, "which fields do you have?").await;

    assert_eq!(outcome.kind, TurnKind::Metrics);
    assert!(outcome.reply.contains("Price (decimal)"));
    assert!(llm.requests().is_empty());
}

#[tokio::test]
async fn greeting_falls_back_when_backend_is_down() {
    let llm = ScriptedLlm::default().fail();
    let (runtime, _) = demo_runtime(&llm).await;
    let mut session = Session::new();

    let outcome = runtime.greet(&mut session).await;

    assert_eq!(outcome.kind, TurnKind::Greeting);
    assert!(outcome.reply.contains("Carlot"));
    assert_eq!(session.history.len(), 1);
}

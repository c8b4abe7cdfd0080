//! One conversational turn: classify, extract, validate, query, present, phrase.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use carlot_core::config::AppConfig;
use carlot_core::conversation::{ChatMessage, Session};
use carlot_core::domain::catalog::{CountBucket, PriceRange, YearRange};
use carlot_core::errors::{ApplicationError, DomainError, InterfaceError};
use carlot_core::keywords::{is_exit_phrase, is_metrics_request};
use carlot_core::search::{Filter, FilterLimits, ResultPage};
use carlot_core::text::{sanitize_text, NormalizedText};
use carlot_db::{CatalogClient, StorageError};

use crate::extraction::{ExtractionSource, FilterExtractor};
use crate::intent::{IntentClassification, IntentClassifier};
use crate::llm::{CompletionRequest, LlmClient};
use crate::presentation::{format_price_range, Presentation, PresentationPolicy};
use crate::prompts::PromptLibrary;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("prompt templates failed to compile: {0}")]
    Prompts(#[from] tera::Error),
}

/// Catalog facts loaded once at startup.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CatalogContext {
    pub total: u64,
    pub brands: Vec<String>,
    pub price_range: Option<PriceRange>,
    pub year_range: Option<YearRange>,
    pub by_brand: Vec<CountBucket>,
}

impl CatalogContext {
    pub async fn load(client: &CatalogClient) -> Result<Self, StorageError> {
        let statistics = client.statistics().await?;
        Ok(Self {
            total: statistics.total,
            brands: client.list_brands().await?,
            price_range: statistics.price_range,
            year_range: client.year_range().await?,
            by_brand: statistics.by_brand,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    Greeting,
    Farewell,
    Conversation,
    Search,
    Metrics,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub correlation_id: String,
    pub kind: TurnKind,
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<IntentClassification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presentation: Option<Presentation>,
    pub end_session: bool,
}

impl TurnOutcome {
    fn new(correlation_id: String, kind: TurnKind, reply: String) -> Self {
        Self {
            correlation_id,
            kind,
            reply,
            classification: None,
            filter: None,
            presentation: None,
            end_session: false,
        }
    }
}

pub struct AgentRuntime {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLibrary>,
    classifier: IntentClassifier,
    extractor: FilterExtractor,
    policy: PresentationPolicy,
    catalog: CatalogClient,
    context: CatalogContext,
    limits: FilterLimits,
    app_name: String,
    history_window: usize,
    temperature: f32,
    max_tokens: u32,
}

impl AgentRuntime {
    /// Builds the runtime and loads the catalog context. A context load failure
    /// is logged and leaves the context empty.
    pub async fn bootstrap(
        config: &AppConfig,
        llm: Arc<dyn LlmClient>,
        catalog: CatalogClient,
    ) -> Result<Self, BootstrapError> {
        let context = match CatalogContext::load(&catalog).await {
            Ok(context) => context,
            Err(error) => {
                warn!(
                    event_name = "runtime.context_unavailable",
                    error = %error,
                    "catalog context could not be loaded"
                );
                CatalogContext::default()
            }
        };
        Self::with_context(config, llm, catalog, context)
    }

    pub fn with_context(
        config: &AppConfig,
        llm: Arc<dyn LlmClient>,
        catalog: CatalogClient,
        context: CatalogContext,
    ) -> Result<Self, BootstrapError> {
        let prompts = Arc::new(PromptLibrary::new()?);
        Ok(Self {
            classifier: IntentClassifier::new(llm.clone(), prompts.clone(), &config.llm),
            extractor: FilterExtractor::new(
                llm.clone(),
                prompts.clone(),
                &config.llm,
                &config.search,
            ),
            llm,
            prompts,
            policy: PresentationPolicy::from(&config.search),
            catalog,
            context,
            limits: config.search.filter_limits(),
            app_name: config.conversation.app_name.clone(),
            history_window: config.conversation.history_window,
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
        })
    }

    pub fn context(&self) -> &CatalogContext {
        &self.context
    }

    pub async fn greet(&self, session: &mut Session) -> TurnOutcome {
        let correlation_id = Uuid::new_v4().to_string();
        let reply = match self.prompts.greeting(&self.app_name) {
            Ok(prompt) => self.phrase(&[], prompt).await,
            Err(error) => Err(ApplicationError::Completion(error.to_string())),
        }
        .unwrap_or_else(|error| {
            warn!(event_name = "runtime.greeting_fallback", %correlation_id, error = %error);
            format!("Hello! I'm {}. How can I help you find a car today?", self.app_name)
        });

        session.history.push_assistant(reply.clone());
        TurnOutcome::new(correlation_id, TurnKind::Greeting, reply)
    }

    pub async fn farewell(&self, session: &mut Session) -> TurnOutcome {
        let correlation_id = Uuid::new_v4().to_string();
        let prior = session.history.recent(self.history_window).to_vec();
        let reply = match self.prompts.farewell(&self.app_name) {
            Ok(prompt) => self.phrase(&prior, prompt).await,
            Err(error) => Err(ApplicationError::Completion(error.to_string())),
        }
        .unwrap_or_else(|error| {
            warn!(event_name = "runtime.farewell_fallback", %correlation_id, error = %error);
            "Thanks for stopping by. Goodbye!".to_string()
        });

        session.history.push_assistant(reply.clone());
        let mut outcome = TurnOutcome::new(correlation_id, TurnKind::Farewell, reply);
        outcome.end_session = true;
        outcome
    }

    /// Handles one user utterance. Exit phrases produce the farewell turn and
    /// never reach the search pipeline.
    pub async fn handle_turn(&self, session: &mut Session, utterance: &str) -> TurnOutcome {
        let utterance = sanitize_text(utterance);
        let text = NormalizedText::new(&utterance);

        if is_exit_phrase(&text) {
            session.history.push_user(utterance);
            return self.farewell(session).await;
        }

        let correlation_id = Uuid::new_v4().to_string();
        let prior = session.history.recent(self.history_window).to_vec();
        session.history.push_user(utterance.clone());
        info!(event_name = "turn.started", %correlation_id, "handling user turn");

        let outcome = if is_metrics_request(&text) {
            self.metrics_turn(correlation_id).await
        } else {
            let classification = self.classifier.classify(&utterance).await;
            if classification.needs_search {
                self.search_turn(session, correlation_id, &utterance, &prior, classification).await
            } else {
                self.conversation_turn(correlation_id, &prior, &utterance, classification).await
            }
        };

        session.history.push_assistant(outcome.reply.clone());
        info!(
            event_name = "turn.completed",
            correlation_id = %outcome.correlation_id,
            kind = ?outcome.kind,
            "user turn completed"
        );
        outcome
    }

    async fn metrics_turn(&self, correlation_id: String) -> TurnOutcome {
        let reply = match self.catalog.field_metadata().await {
            Ok(fields) => {
                let lines: Vec<String> = fields
                    .iter()
                    .filter(|field| field.name != "id")
                    .map(|field| format!("- {} ({})", field.label, field.data_type))
                    .collect();
                format!("Each car in the catalog has these fields:\n{}", lines.join("\n"))
            }
            Err(error) => self.user_error(&correlation_id, storage_failure(error)),
        };
        TurnOutcome::new(correlation_id, TurnKind::Metrics, reply)
    }

    async fn conversation_turn(
        &self,
        correlation_id: String,
        prior: &[ChatMessage],
        utterance: &str,
        classification: IntentClassification,
    ) -> TurnOutcome {
        let reply = match self.phrase(prior, utterance.to_string()).await {
            Ok(reply) => reply,
            Err(error) => {
                warn!(event_name = "turn.phrasing_failed", %correlation_id, error = %error);
                "Sorry, I'm having trouble answering right now. You can still ask me to search \
                 the catalog."
                    .to_string()
            }
        };
        let mut outcome = TurnOutcome::new(correlation_id, TurnKind::Conversation, reply);
        outcome.classification = Some(classification);
        outcome
    }

    async fn search_turn(
        &self,
        session: &mut Session,
        correlation_id: String,
        utterance: &str,
        prior: &[ChatMessage],
        classification: IntentClassification,
    ) -> TurnOutcome {
        let extracted =
            self.extractor.extract(utterance, &classification, &self.context.brands).await;
        let is_reference = extracted.source == ExtractionSource::Reference;

        let page = match self.resolve_page(session, &correlation_id, &extracted.fields).await {
            Ok(page) => page,
            Err(error) => {
                let reply = self.user_error(&correlation_id, error);
                let mut outcome = TurnOutcome::new(correlation_id, TurnKind::Search, reply);
                outcome.classification = Some(classification);
                outcome.filter = Some(extracted.fields);
                return outcome;
            }
        };

        let presentation = self.policy.present(utterance, &page);
        if !is_reference && !presentation.rendered_ids.is_empty() {
            session.record_listing(presentation.rendered_ids.clone());
        }

        let reply = match self.prompts.search_results(utterance, &presentation) {
            Ok(prompt) => self.phrase(prior, prompt).await,
            Err(error) => Err(ApplicationError::Completion(error.to_string())),
        }
        .unwrap_or_else(|error| {
            warn!(event_name = "turn.phrasing_fallback", %correlation_id, error = %error);
            presentation.fallback_text()
        });

        let mut outcome = TurnOutcome::new(correlation_id, TurnKind::Search, reply);
        outcome.classification = Some(classification);
        outcome.filter = Some(extracted.fields);
        outcome.presentation = Some(presentation);
        outcome
    }

    /// Runs the extracted fields against the catalog. An empty field map or a
    /// validation failure yields an empty page rather than an error.
    async fn resolve_page(
        &self,
        session: &Session,
        correlation_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<ResultPage, ApplicationError> {
        if fields.is_empty() {
            return Ok(ResultPage::empty(self.limits.default_limit, 0));
        }

        let filter = match Filter::from_map_with(fields, &self.limits) {
            Ok(filter) => filter,
            Err(error) => {
                warn!(
                    event_name = "turn.invalid_filter",
                    %correlation_id,
                    field = error.field,
                    error = %error,
                    "extracted filter failed validation"
                );
                return Ok(ResultPage::empty(self.limits.default_limit, 0));
            }
        };

        match filter.item_number() {
            Some(item_number) => self.resolve_reference(session, &filter, item_number).await,
            None => self.catalog.search(&filter).await.map_err(storage_failure),
        }
    }

    /// "item N" points into the last listing shown; only a session with no
    /// listing yet falls back to the default page of the catalog.
    async fn resolve_reference(
        &self,
        session: &Session,
        filter: &Filter,
        item_number: u32,
    ) -> Result<ResultPage, ApplicationError> {
        let not_found = |id: String| DomainError::NotFound { entity: "vehicle", id };

        let vehicle = if session.last_listing().is_empty() {
            self.catalog
                .search(filter)
                .await
                .map_err(storage_failure)?
                .into_items()
                .into_iter()
                .nth(item_number as usize - 1)
                .ok_or_else(|| not_found(format!("item {item_number}")))?
        } else {
            let id = session
                .listing_entry(item_number)
                .ok_or_else(|| not_found(format!("item {item_number}")))?;
            self.catalog.get_by_id(id).await.map_err(|error| match error {
                StorageError::NotFound(id) => not_found(id.to_string()).into(),
                other => storage_failure(other),
            })?
        };

        Ok(ResultPage::new(1, vec![vehicle], 1, 0))
    }

    async fn phrase(
        &self,
        prior: &[ChatMessage],
        prompt: String,
    ) -> Result<String, ApplicationError> {
        let system = self
            .prompts
            .system(
                &self.app_name,
                self.context.total,
                &self.context.brands,
                &format_price_range(self.context.price_range.as_ref()),
            )
            .map_err(|e| ApplicationError::Completion(e.to_string()))?;

        let mut messages = prior.to_vec();
        messages.push(ChatMessage::user(prompt));
        let request = CompletionRequest {
            system: Some(system),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            json_mode: false,
        };

        let reply = self
            .llm
            .complete(&request)
            .await
            .map(|reply| sanitize_text(&reply))
            .map_err(|e| ApplicationError::Completion(e.to_string()))?;
        if reply.is_empty() {
            return Err(ApplicationError::Completion("empty completion".to_string()));
        }
        Ok(reply)
    }

    fn user_error(&self, correlation_id: &str, error: ApplicationError) -> String {
        let interface: InterfaceError = error.into_interface(correlation_id);
        warn!(
            event_name = "turn.failed",
            correlation_id = interface.correlation_id(),
            error = %interface,
            "turn failed"
        );
        interface.user_message().to_string()
    }
}

fn storage_failure(error: StorageError) -> ApplicationError {
    ApplicationError::Storage(error.to_string())
}

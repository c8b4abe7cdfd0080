//! Conversational search runtime.
//!
//! Each turn runs a fixed pipeline:
//! 1. **Intent** (`intent`) - decide whether the utterance needs a catalog search
//! 2. **Extraction** (`extraction`) - turn the utterance into raw filter fields
//! 3. **Validation** - `carlot_core::search::Filter` is the only way into the query layer
//! 4. **Query** - `carlot_db::CatalogClient`
//! 5. **Presentation** (`presentation`) - choose detailed or summary rendering
//! 6. **Phrasing** - the completion backend words the reply around the rendered entries
//!
//! The completion backend only classifies, extracts and phrases. It never
//! decides which records match or how many are shown.

pub mod extraction;
pub mod intent;
pub mod llm;
pub mod presentation;
pub mod prompts;
pub mod runtime;

#[cfg(test)]
mod testing;

pub use extraction::{ExtractedFilter, ExtractionSource, FilterExtractor};
pub use intent::{IntentClassification, IntentClassifier, IntentType};
pub use llm::{build_client, CompletionRequest, LlmClient, OpenAiCompatibleClient};
pub use presentation::{Presentation, PresentationMode, PresentationPolicy};
pub use prompts::PromptLibrary;
pub use runtime::{AgentRuntime, BootstrapError, CatalogContext, TurnKind, TurnOutcome};

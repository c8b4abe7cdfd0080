use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use carlot_core::config::{LlmConfig, SearchConfig};
use carlot_core::errors::ExtractionError;
use carlot_core::keywords::{detect_color, is_list_all_request, item_reference, wants_detail};
use carlot_core::search::canonical_key;
use carlot_core::text::NormalizedText;

use crate::intent::IntentClassification;
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompts::PromptLibrary;

/// Survive a list-all collapse regardless of the utterance.
const LIST_ALL_KEPT: &[&str] = &["color", "detailed_info", "specific_request"];
/// Survive a list-all collapse only when the utterance itself carries a number.
const LIST_ALL_KEPT_WITH_DIGITS: &[&str] = &["price_min", "price_max", "year_min", "year_max"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    Reference,
    Remote,
    Fallback,
}

/// Raw filter fields, not yet validated.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExtractedFilter {
    pub fields: Map<String, Value>,
    pub source: ExtractionSource,
}

/// Parses the extraction payload into canonical keys, dropping nulls.
pub fn parse_extraction(raw: &str) -> Result<Map<String, Value>, ExtractionError> {
    let value: Value =
        serde_json::from_str(raw.trim()).map_err(|e| ExtractionError::Malformed(e.to_string()))?;
    let Value::Object(object) = value else {
        return Err(ExtractionError::Malformed(format!("expected a JSON object, got {value}")));
    };

    let mut fields = Map::new();
    for (key, value) in object {
        if value.is_null() {
            continue;
        }
        let key = canonical_key(&key).map(str::to_string).unwrap_or(key);
        fields.entry(key).or_insert(value);
    }
    Ok(fields)
}

/// Color and detail flags read straight from the utterance.
pub fn deterministic_hints(text: &NormalizedText) -> Map<String, Value> {
    let mut hints = Map::new();
    if let Some(color) = detect_color(text) {
        hints.insert("color".to_string(), Value::from(color));
    }
    if wants_detail(text) {
        hints.insert("detailed_info".to_string(), Value::Bool(true));
        hints.insert("specific_request".to_string(), Value::Bool(true));
    }
    hints
}

/// Drops every field a "list everything" request should not narrow by.
pub fn collapse_list_all(
    fields: Map<String, Value>,
    text: &NormalizedText,
    list_all_limit: u32,
) -> Map<String, Value> {
    let keep_ranges = text.has_digit();
    let mut collapsed: Map<String, Value> = fields
        .into_iter()
        .filter(|(key, _)| {
            LIST_ALL_KEPT.contains(&key.as_str())
                || (keep_ranges && LIST_ALL_KEPT_WITH_DIGITS.contains(&key.as_str()))
        })
        .collect();
    collapsed.insert("limit".to_string(), Value::from(list_all_limit));
    collapsed
}

pub struct FilterExtractor {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLibrary>,
    temperature: f32,
    max_tokens: u32,
    list_all_limit: u32,
}

impl FilterExtractor {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptLibrary>,
        llm_config: &LlmConfig,
        search_config: &SearchConfig,
    ) -> Self {
        Self {
            llm,
            prompts,
            temperature: llm_config.structured_temperature,
            max_tokens: llm_config.max_tokens,
            list_all_limit: search_config.list_all_limit,
        }
    }

    pub async fn extract(
        &self,
        utterance: &str,
        classification: &IntentClassification,
        known_brands: &[String],
    ) -> ExtractedFilter {
        let text = NormalizedText::new(utterance);

        if let Some(item_number) = item_reference(&text) {
            let mut fields = Map::new();
            fields.insert("limit".to_string(), Value::from(self.list_all_limit));
            fields.insert("specific_request".to_string(), Value::Bool(true));
            fields.insert("item_number".to_string(), Value::from(item_number));
            return ExtractedFilter { fields, source: ExtractionSource::Reference };
        }

        let hints = deterministic_hints(&text);
        let list_all = is_list_all_request(&text, known_brands);

        match self.extract_remote(utterance, known_brands).await {
            Ok(mut fields) => {
                fields.extend(hints);
                if list_all {
                    fields = collapse_list_all(fields, &text, self.list_all_limit);
                }
                debug!(
                    event_name = "extraction.remote",
                    intent_type = ?classification.intent_type,
                    list_all,
                    field_count = fields.len(),
                    "extracted filter fields"
                );
                ExtractedFilter { fields, source: ExtractionSource::Remote }
            }
            Err(error) => {
                warn!(
                    event_name = "extraction.fallback",
                    error = %error,
                    "remote extraction failed, using deterministic hints"
                );
                let mut fields = hints;
                if list_all || !fields.is_empty() {
                    fields.insert("limit".to_string(), Value::from(self.list_all_limit));
                }
                ExtractedFilter { fields, source: ExtractionSource::Fallback }
            }
        }
    }

    pub async fn extract_remote(
        &self,
        utterance: &str,
        known_brands: &[String],
    ) -> Result<Map<String, Value>, ExtractionError> {
        let prompt = self
            .prompts
            .extraction(utterance, known_brands)
            .map_err(|e| ExtractionError::Remote(e.to_string()))?;
        let request = CompletionRequest::prompt(prompt, self.temperature, self.max_tokens).json();
        let raw = self
            .llm
            .complete(&request)
            .await
            .map_err(|e| ExtractionError::Remote(e.to_string()))?;
        parse_extraction(&raw)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use serde_json::{json, Value};

    use carlot_core::config::AppConfig;
    use carlot_core::errors::ExtractionError;
    use carlot_core::search::Filter;

    use super::{parse_extraction, ExtractionSource, FilterExtractor};
    use crate::intent::{IntentClassification, IntentType};
    use crate::prompts::PromptLibrary;
    use crate::testing::ScriptedLlm;

    fn extractor(llm: ScriptedLlm) -> FilterExtractor {
        let config = AppConfig::default();
        let prompts = Arc::new(PromptLibrary::new().expect("templates"));
        FilterExtractor::new(Arc::new(llm), prompts, &config.llm, &config.search)
    }

    fn search_intent() -> IntentClassification {
        IntentClassification {
            needs_search: true,
            intent_type: IntentType::Search,
            confidence: 0.9,
        }
    }

    fn brands() -> Vec<String> {
        ["Fiat", "Honda", "Toyota", "Volkswagen"].iter().map(|brand| brand.to_string()).collect()
    }

    #[test]
    fn payload_aliases_are_canonicalized_and_nulls_dropped() {
        let fields = parse_extraction(r#"{"marca": "Toyota", "cor": null, "preco_max": 50000}"#)
            .expect("valid payload");

        assert_eq!(Value::Object(fields), json!({"brand": "Toyota", "price_max": 50000}));
        assert!(matches!(parse_extraction("[]"), Err(ExtractionError::Malformed(_))));
        assert!(matches!(parse_extraction("brand: Toyota"), Err(ExtractionError::Malformed(_))));
    }

    #[tokio::test]
    async fn red_cars_under_forty_thousand() {
        let llm = ScriptedLlm::new([Ok(r#"{"cor": "Vermelho", "preco_max": 40000}"#.to_string())]);

        let extracted =
            extractor(llm).extract("red cars under 40000", &search_intent(), &brands()).await;
        let filter = Filter::from_map(&extracted.fields).expect("valid filter");

        assert_eq!(extracted.source, ExtractionSource::Remote);
        assert_eq!(filter.color(), Some("Vermelho"));
        assert_eq!(filter.price_max(), Some(Decimal::from(40_000)));
        assert_eq!(filter.limit(), 20);
    }

    #[tokio::test]
    async fn list_everything_ignores_hallucinated_fields() {
        let llm = ScriptedLlm::new([Ok(
            r#"{"marca": "Ferrari", "combustivel": "Diesel", "numero_portas": 2}"#.to_string()
        )]);

        let extracted =
            extractor(llm).extract("list everything", &search_intent(), &brands()).await;

        assert_eq!(Value::Object(extracted.fields), json!({"limit": 50}));
    }

    #[tokio::test]
    async fn list_all_keeps_color_and_numeric_ranges_from_the_utterance() {
        let llm = ScriptedLlm::new([Ok(
            r#"{"color": "Vermelho", "price_max": 30000, "transmission": "manual"}"#.to_string(),
        )]);

        let extracted = extractor(llm)
            .extract("list all red cars under 30000", &search_intent(), &brands())
            .await;

        assert_eq!(
            Value::Object(extracted.fields),
            json!({"color": "Vermelho", "price_max": 30000, "limit": 50})
        );
    }

    #[tokio::test]
    async fn naming_a_brand_disables_list_all_collapse() {
        let llm = ScriptedLlm::new([Ok(r#"{"marca": "Toyota"}"#.to_string())]);

        let extracted =
            extractor(llm).extract("list all toyota cars", &search_intent(), &brands()).await;

        assert_eq!(Value::Object(extracted.fields), json!({"brand": "Toyota"}));
    }

    #[tokio::test]
    async fn deterministic_hints_override_remote_values() {
        let llm = ScriptedLlm::new([Ok(r#"{"cor": "Azul", "detailed_info": false}"#.to_string())]);

        let extracted = extractor(llm)
            .extract("carros brancos com detalhes", &search_intent(), &brands())
            .await;
        let filter = Filter::from_map(&extracted.fields).expect("valid filter");

        assert_eq!(filter.color(), Some("Branco"));
        assert!(filter.detailed_info());
        assert!(filter.specific_request());
    }

    #[tokio::test]
    async fn item_reference_short_circuits_remote_call() {
        let llm = ScriptedLlm::new([]);
        let extractor = extractor(llm.clone());

        let extracted = extractor.extract("show me item 5", &search_intent(), &brands()).await;

        assert_eq!(extracted.source, ExtractionSource::Reference);
        assert_eq!(
            Value::Object(extracted.fields),
            json!({"limit": 50, "specific_request": true, "item_number": 5})
        );
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn remote_failure_uses_hints_or_nothing() {
        let extractor = extractor(ScriptedLlm::new([
            Err("timeout".to_string()),
            Err("timeout".to_string()),
            Err("timeout".to_string()),
        ]));

        let colored = extractor.extract("any black ones?", &search_intent(), &brands()).await;
        assert_eq!(colored.source, ExtractionSource::Fallback);
        assert_eq!(Value::Object(colored.fields), json!({"color": "Preto", "limit": 50}));

        let everything = extractor.extract("show all", &search_intent(), &brands()).await;
        assert_eq!(Value::Object(everything.fields), json!({"limit": 50}));

        let nothing = extractor.extract("something cheap", &search_intent(), &brands()).await;
        assert!(nothing.fields.is_empty());
    }

    #[tokio::test]
    async fn extraction_is_idempotent_for_a_fixed_response() {
        let response = r#"{"marca": "Honda", "ano_min": 2019, "transmissao": "Automático"}"#;
        let llm = ScriptedLlm::new([Ok(response.to_string()), Ok(response.to_string())]);
        let extractor = extractor(llm);

        let first =
            extractor.extract("automatic honda from 2019", &search_intent(), &brands()).await;
        let second =
            extractor.extract("automatic honda from 2019", &search_intent(), &brands()).await;

        assert_eq!(first, second);
        let filter = Filter::from_map(&first.fields).expect("valid filter");
        assert_eq!(filter.brand(), Some("Honda"));
        assert_eq!(filter.year_min(), Some(2019));
    }
}

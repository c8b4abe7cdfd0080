use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use carlot_core::config::LlmConfig;
use carlot_core::errors::ClassificationError;
use carlot_core::keywords::has_search_keyword;
use carlot_core::text::NormalizedText;

use crate::llm::{CompletionRequest, LlmClient};
use crate::prompts::PromptLibrary;

const KEYWORD_CONFIDENCE: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    Search,
    Question,
    Conversation,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntentClassification {
    pub needs_search: bool,
    pub intent_type: IntentType,
    pub confidence: f32,
}

/// Keyword classification used when the remote classifier is unavailable.
pub fn classify_with_keywords(text: &NormalizedText) -> IntentClassification {
    let needs_search = has_search_keyword(text);
    IntentClassification {
        needs_search,
        intent_type: if needs_search { IntentType::Search } else { IntentType::Conversation },
        confidence: KEYWORD_CONFIDENCE,
    }
}

/// Parses the classifier payload. Anything but a well-typed JSON object fails.
pub fn parse_classification(raw: &str) -> Result<IntentClassification, ClassificationError> {
    let parsed: IntentClassification = serde_json::from_str(raw.trim())
        .map_err(|e| ClassificationError::Malformed(e.to_string()))?;
    if !(0.0..=1.0).contains(&parsed.confidence) {
        return Err(ClassificationError::Malformed(format!(
            "confidence {} is outside 0.0..=1.0",
            parsed.confidence
        )));
    }
    Ok(parsed)
}

pub struct IntentClassifier {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLibrary>,
    temperature: f32,
    max_tokens: u32,
}

impl IntentClassifier {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLibrary>, config: &LlmConfig) -> Self {
        Self {
            llm,
            prompts,
            temperature: config.structured_temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Never fails: remote errors fall back to keyword matching.
    pub async fn classify(&self, utterance: &str) -> IntentClassification {
        match self.classify_remote(utterance).await {
            Ok(classification) => {
                debug!(
                    event_name = "intent.classified",
                    intent_type = ?classification.intent_type,
                    needs_search = classification.needs_search,
                    confidence = classification.confidence,
                    "classified utterance"
                );
                classification
            }
            Err(error) => {
                warn!(
                    event_name = "intent.fallback",
                    error = %error,
                    "remote classification failed, using keywords"
                );
                classify_with_keywords(&NormalizedText::new(utterance))
            }
        }
    }

    pub async fn classify_remote(
        &self,
        utterance: &str,
    ) -> Result<IntentClassification, ClassificationError> {
        let prompt = self
            .prompts
            .classification(utterance)
            .map_err(|e| ClassificationError::Remote(e.to_string()))?;
        let request = CompletionRequest::prompt(prompt, self.temperature, self.max_tokens).json();
        let raw = self
            .llm
            .complete(&request)
            .await
            .map_err(|e| ClassificationError::Remote(e.to_string()))?;
        parse_classification(&raw)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use carlot_core::config::AppConfig;
    use carlot_core::errors::ClassificationError;
    use carlot_core::text::NormalizedText;

    use super::{classify_with_keywords, parse_classification, IntentClassifier, IntentType};
    use crate::prompts::PromptLibrary;
    use crate::testing::ScriptedLlm;

    fn classifier(llm: ScriptedLlm) -> IntentClassifier {
        let prompts = Arc::new(PromptLibrary::new().expect("templates"));
        IntentClassifier::new(Arc::new(llm), prompts, &AppConfig::default().llm)
    }

    #[test]
    fn strict_parse_rejects_malformed_payloads() {
        let valid = r#"{"needs_search": true, "intent_type": "search", "confidence": 0.9}"#;
        let parsed = parse_classification(valid).expect("valid payload");
        assert!(parsed.needs_search);
        assert_eq!(parsed.intent_type, IntentType::Search);

        for raw in [
            "sure, it is a search",
            r#"{"needs_search": "yes", "intent_type": "search", "confidence": 0.9}"#,
            r#"{"needs_search": true, "intent_type": "shopping", "confidence": 0.9}"#,
            r#"{"needs_search": true, "intent_type": "search", "confidence": 1.5}"#,
            r#"[true, "search", 0.9]"#,
        ] {
            assert!(
                matches!(parse_classification(raw), Err(ClassificationError::Malformed(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn keyword_fallback_detects_search_words_in_both_languages() {
        let english = classify_with_keywords(&NormalizedText::new("Can you find me a car?"));
        assert!(english.needs_search);
        assert_eq!(english.intent_type, IntentType::Search);
        assert_eq!(english.confidence, 0.5);

        let portuguese = classify_with_keywords(&NormalizedText::new("Quero um carro vermelho"));
        assert!(portuguese.needs_search);

        let chat = classify_with_keywords(&NormalizedText::new("good morning!"));
        assert!(!chat.needs_search);
        assert_eq!(chat.intent_type, IntentType::Conversation);
    }

    #[tokio::test]
    async fn remote_result_is_used_when_well_formed() {
        let llm = ScriptedLlm::new([Ok(
            r#"{"needs_search": false, "intent_type": "question", "confidence": 0.8}"#.to_string(),
        )]);
        let classifier = classifier(llm.clone());

        let classification = classifier.classify("what is a flex engine?").await;

        assert_eq!(classification.intent_type, IntentType::Question);
        let requests = llm.requests();
        assert!(requests[0].json_mode);
        assert_eq!(requests[0].temperature, AppConfig::default().llm.structured_temperature);
    }

    #[tokio::test]
    async fn remote_failure_falls_back_to_keywords() {
        let classifier = classifier(ScriptedLlm::new([Err("connection refused".to_string())]));

        let classification = classifier.classify("listar carros disponíveis").await;

        assert!(classification.needs_search);
        assert_eq!(classification.confidence, 0.5);
    }
}

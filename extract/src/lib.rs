pub mod normalize;
pub mod provider;
pub mod schema;

use provider::ExtractionProvider;
use sentinel_core::model::Bundle;
use std::sync::Arc;
use tracing::warn;

const MAX_RETRIES: u32 = 2;
const PROMPT_CHAR_BUDGET: usize = 12_000;

pub struct Extractor {
    provider: Arc<dyn ExtractionProvider>,
}

impl Extractor {
    pub fn new(provider: Arc<dyn ExtractionProvider>) -> Self {
        Self { provider }
    }

    /// Extracts a `Bundle` from `text`. Never returns an error: a persistently malformed model
    /// response yields an empty bundle with a logged warning, per contract.
    pub async fn extract(&self, text: &str) -> Bundle {
        let truncated = truncate_to_budget(text, PROMPT_CHAR_BUDGET);
        let prompt = build_prompt(truncated);

        for attempt in 0..=MAX_RETRIES {
            let response = match self.provider.complete(&prompt).await {
                Ok(response) => response,
                Err(err) => {
                    warn!(attempt, error = %err, "extraction provider call failed");
                    continue;
                }
            };

            match schema::parse_raw_extraction(&response) {
                Ok(raw) => return normalize::normalize(raw),
                Err(err) => {
                    warn!(attempt, error = %err, "extraction response failed schema validation");
                }
            }
        }

        warn!("extraction exhausted retries, returning empty bundle");
        Bundle::default()
    }
}

fn truncate_to_budget(text: &str, budget: usize) -> &str {
    if text.len() <= budget {
        text
    } else {
        let mut end = budget;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        &text[..end]
    }
}

fn build_prompt(text: &str) -> String {
    format!(
        "Extract entities and relationships from the following text as a JSON object with the \
         exact shape {{\"nodes\": [{{\"id\": string, \"label\": string, \"properties\": object}}], \
         \"edges\": [{{\"source\": string, \"target\": string, \"relation\": string, \
         \"properties\": object, \"confidence\": number}}]}}. Only output the JSON object, \
         nothing else.\n\nText:\n{text}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use provider::ProviderError;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StubProvider {
        response: String,
    }

    #[async_trait]
    impl ExtractionProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
            Ok(self.response.clone())
        }
    }

    struct AlwaysBrokenProvider {
        calls: AtomicU32,
    }

    #[async_trait]
    impl ExtractionProvider for AlwaysBrokenProvider {
        fn name(&self) -> &str {
            "broken"
        }

        async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("not json".to_string())
        }
    }

    #[tokio::test]
    async fn parses_a_well_formed_response() {
        let provider = StubProvider {
            response: r#"{"nodes":[{"id":"tesla","label":"Company"}],
                          "edges":[{"source":"tesla","target":"elon","relation":"founded by","confidence":0.95}]}"#
                .to_string(),
        };
        let extractor = Extractor::new(Arc::new(provider));
        let bundle = extractor.extract("Tesla was founded by Elon Musk.").await;

        assert_eq!(bundle.edges.len(), 1);
        assert_eq!(bundle.edges[0].relation, "FOUNDED_BY");
    }

    #[tokio::test]
    async fn persistent_schema_failure_returns_empty_bundle_after_retries() {
        let provider = Arc::new(AlwaysBrokenProvider {
            calls: AtomicU32::new(0),
        });
        let extractor = Extractor::new(provider.clone());
        let bundle = extractor.extract("some text").await;

        assert!(bundle.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), MAX_RETRIES + 1);
    }
}

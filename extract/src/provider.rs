use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),
    #[error("provider returned an error status: {0}")]
    BadStatus(String),
}

/// The language model endpoint, abstracted so tests can supply a deterministic stub instead of a
/// live model.
#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Calls an OpenAI-compatible chat completions endpoint.
pub struct HttpExtractionProvider {
    client: reqwest::Client,
    base_url: String,
    model_name: String,
}

impl HttpExtractionProvider {
    pub fn new(model_name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model_name: model_name.into(),
        }
    }
}

#[async_trait]
impl ExtractionProvider for HttpExtractionProvider {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        #[derive(serde::Serialize)]
        struct Request<'a> {
            model: &'a str,
            messages: [Message<'a>; 1],
            response_format: ResponseFormat,
        }

        #[derive(serde::Serialize)]
        struct Message<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(serde::Serialize)]
        struct ResponseFormat {
            #[serde(rename = "type")]
            kind: &'static str,
        }

        #[derive(serde::Deserialize)]
        struct Response {
            choices: Vec<Choice>,
        }

        #[derive(serde::Deserialize)]
        struct Choice {
            message: ResponseMessage,
        }

        #[derive(serde::Deserialize)]
        struct ResponseMessage {
            content: String,
        }

        let body = Request {
            model: &self.model_name,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
            response_format: ResponseFormat { kind: "json_object" },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .json(&body)
            .timeout(Duration::from_secs(60))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::BadStatus(response.status().to_string()));
        }

        let parsed: Response = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::BadStatus("empty choices array".to_string()))
    }
}

/// Picks the provider named by `model_name`. `model_base_url` defaults to a local endpoint
/// convention (`http://localhost:11434/v1`) when absent, mirroring an Ollama-style local server.
pub fn select_provider(model_name: &str, model_base_url: Option<&str>) -> HttpExtractionProvider {
    let base_url = model_base_url.unwrap_or("http://localhost:11434/v1");
    HttpExtractionProvider::new(model_name, base_url)
}

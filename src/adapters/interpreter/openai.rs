//! OpenAI-compatible step interpreter.
//!
//! Sends the step prompt and the raw user reply to a chat-completions
//! endpoint and expects a strict JSON verdict back. Any failure surfaces as
//! `ExternalService`; scenes then fall back to deterministic validation.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::InterpreterConfig;
use crate::domain::foundation::DialogError;
use crate::ports::{InterpretRequest, Interpretation, StepInterpreter};

const SYSTEM_PROMPT: &str = "Ты — валидатор шагов диалога записи в ветеринарную клинику. \
Тебе дают вопрос текущего шага и ответ пользователя. Классифицируй ответ:\n\
- \"answer\" — пользователь отвечает на вопрос шага (в validated_value положи \
нормализованное значение, если формат известен, иначе null);\n\
- \"off_topic\" — пользователь сменил тему (в reply_message предложи короткую \
вежливую реплику, возвращающую к вопросу);\n\
- \"refuse\" — пользователь хочет прекратить оформление.\n\
Отвечай ТОЛЬКО JSON вида \
{\"intent\": \"answer|off_topic|refuse\", \"validated_value\": string|null, \"reply_message\": string|null} \
без пояснений и без markdown.";

/// Configuration for the interpreter client.
#[derive(Debug, Clone)]
pub struct OpenAiInterpreterConfig {
    api_key: Secret<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl OpenAiInterpreterConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds from the app config section; `None` when disabled or keyless.
    pub fn from_config(config: &InterpreterConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let api_key = config.api_key.as_ref()?;
        Some(Self {
            api_key: api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout: config.timeout(),
        })
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Chat-completions adapter for the `StepInterpreter` port.
pub struct OpenAiInterpreter {
    config: OpenAiInterpreterConfig,
    client: Client,
}

impl OpenAiInterpreter {
    pub fn new(config: OpenAiInterpreterConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { config, client }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn user_prompt(request: &InterpretRequest) -> String {
        let mut prompt = format!(
            "Шаг: {}\nВопрос шага: {}\n",
            request.step_id, request.step_label
        );
        if let Some(hint) = &request.format_hint {
            prompt.push_str(&format!("Ожидаемый формат: {}\n", hint));
        }
        prompt.push_str(&format!("Ответ пользователя: {}", request.user_message));
        prompt
    }
}

#[async_trait]
impl StepInterpreter for OpenAiInterpreter {
    async fn interpret(&self, request: InterpretRequest) -> Result<Interpretation, DialogError> {
        let body = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::user_prompt(&request),
                },
            ],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DialogError::external("interpreter", "request timed out")
                } else {
                    DialogError::external("interpreter", e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DialogError::external(
                "interpreter",
                format!("status {}: {}", status, body),
            ));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| DialogError::external("interpreter", format!("bad response: {}", e)))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| DialogError::external("interpreter", "no choices in response"))?;

        parse_verdict(&content)
    }
}

/// Parses the model's JSON verdict, tolerating a markdown code fence.
fn parse_verdict(content: &str) -> Result<Interpretation, DialogError> {
    let trimmed = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    serde_json::from_str(trimmed)
        .map_err(|e| DialogError::external("interpreter", format!("unparseable verdict: {}", e)))
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

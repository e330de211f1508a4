use crate::config::app_config::AdvisorConfig;
use crate::domain::ports::AdviceProvider;
use crate::utils::error::{JournalError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub const MISSING_KEY_MESSAGE: &str = "Gemini API key not configured";

/// 呼叫 Gemini generateContent 產生交易建議
#[derive(Debug, Clone)]
pub struct GeminiAdvisor {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl GeminiAdvisor {
    pub fn new(config: &AdvisorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs()))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.effective_api_key().map(str::to_string),
        })
    }

    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String> {
        let payload = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });

        tracing::debug!("Calling advisor endpoint: {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", api_key)])
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        extract_text(&body)
    }
}

/// 取出 candidates[0].content 的文字；沒有文字段落時回傳 content 的 JSON
fn extract_text(body: &Value) -> Result<String> {
    let content = body
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .ok_or_else(|| JournalError::ValidationError {
            message: "response has no candidates[0].content".to_string(),
        })?;

    let texts: Vec<&str> = content
        .get("parts")
        .and_then(Value::as_array)
        .map(|parts| parts.iter().filter_map(|p| p.get("text").and_then(Value::as_str)).collect())
        .unwrap_or_default();

    if texts.is_empty() {
        Ok(content.to_string())
    } else {
        Ok(texts.join("\n"))
    }
}

#[async_trait]
impl AdviceProvider for GeminiAdvisor {
    async fn advise(&self, prompt: &str) -> String {
        let Some(api_key) = self.api_key.as_deref() else {
            return MISSING_KEY_MESSAGE.to_string();
        };

        match self.generate(api_key, prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("⚠️ Advisor call failed: {}", e);
                format!("Error calling Gemini API: {}", e)
            }
        }
    }
}

pub fn tips_prompt<'a>(reasons: impl IntoIterator<Item = &'a str>) -> String {
    format!(
        "Generate trading tips from these profit reasons:\n{}",
        reasons.into_iter().collect::<Vec<_>>().join("\n")
    )
}

pub fn lessons_prompt<'a>(reasons: impl IntoIterator<Item = &'a str>) -> String {
    format!(
        "Generate trading lessons from these loss reasons:\n{}",
        reasons.into_iter().collect::<Vec<_>>().join("\n")
    )
}

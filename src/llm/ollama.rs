use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::config::LlmConfig;
use crate::llm::{
    models::{ChatMessage, ChatOptions, Sampling},
    LlmAdapter, LlmError,
};

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

pub struct OllamaAdapter {
    client: Client,
    chat_url: String,
    version_url: String,
    model: String,
    sampling: Sampling,
}

impl OllamaAdapter {
    pub fn new(config: &LlmConfig) -> Self {
        let base_url = config.host.trim_end_matches('/');
        Self {
            client: Client::new(),
            chat_url: format!("{}/api/chat", base_url),
            version_url: format!("{}/api/version", base_url),
            model: config.model.clone(),
            sampling: Sampling {
                temperature: config.temperature,
                num_predict: config.max_tokens,
                top_p: config.top_p,
                top_k: config.top_k,
            },
        }
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    pub fn version_url(&self) -> &str {
        &self.version_url
    }

    pub async fn fetch_version(&self) -> Result<String, LlmError> {
        let response = self
            .client
            .get(&self.version_url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|_| LlmError::UnexpectedFormat)?;
        Ok(json["version"].as_str().unwrap_or("unknown").to_string())
    }
}

#[async_trait]
impl LlmAdapter for OllamaAdapter {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn is_available(&self) -> bool {
        match self.client.get(&self.version_url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => response.status().as_u16() == 200,
            Err(e) => {
                debug!("Ollama health probe failed: {}", e);
                false
            }
        }
    }

    async fn version(&self) -> Option<String> {
        match self.fetch_version().await {
            Ok(version) => {
                info!("Ollama version: {}", version);
                Some(version)
            }
            Err(e) => {
                warn!("Could not verify Ollama version: {}", e);
                None
            }
        }
    }

    async fn chat(&self, messages: &[ChatMessage], options: ChatOptions) -> Result<String, LlmError> {
        let body = json!({
            "model": self.model,
            "messages": messages,
            "options": self.sampling.with_overrides(options),
            "stream": false
        });

        debug!("POST {} ({} messages)", self.chat_url, messages.len());
        let response = self
            .client
            .post(&self.chat_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body });
        }

        let text = response
            .text()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        match extract_content(&text) {
            Some(content) => Ok(content),
            None => {
                error!("Unexpected response format from Ollama: {}", text);
                Err(LlmError::UnexpectedFormat)
            }
        }
    }
}

/// Pulls the reply text out of a response body.
///
/// Accepts `{"message": {"content"}}` and `{"response"}`, then falls back to
/// the first top-level string or nested `content` field in document order.
/// A body that is not JSON is searched for the first complete `{...}` object.
pub fn extract_content(body: &str) -> Option<String> {
    let value = match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(_) => first_json_object(body)?,
    };
    content_from_value(&value).map(|c| c.trim().to_string())
}

fn content_from_value(value: &Value) -> Option<&str> {
    let map = value.as_object()?;

    if let Some(content) = map.get("message").and_then(|m| m.get("content")).and_then(Value::as_str) {
        return Some(content);
    }
    if let Some(content) = map.get("response").and_then(Value::as_str) {
        return Some(content);
    }

    map.values().find_map(|v| match v {
        Value::String(s) => Some(s.as_str()),
        Value::Object(inner) => inner.get("content").and_then(Value::as_str),
        _ => None,
    })
}

/// Scans `text` for the first brace-balanced fragment that parses as a JSON object.
fn first_json_object(text: &str) -> Option<Value> {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(len) = balanced_len(&text[start..]) {
            if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(&text[start..start + len]) {
                return Some(value);
            }
        }
        search_from = start + 1;
    }
    None
}

/// Byte length of the brace-balanced prefix of `fragment`, skipping braces inside strings.
fn balanced_len(fragment: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in fragment.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_message_shape() {
        assert_eq!(extract_content(r#"{"message": {"role": "assistant", "content": " hi "}}"#).as_deref(), Some("hi"));
    }

    #[test]
    fn flat_response_shape() {
        assert_eq!(extract_content(r#"{"model": "gemma3:1b", "response": "hi"}"#).as_deref(), Some("hi"));
    }

    #[test]
    fn message_shape_wins_over_response() {
        let body = r#"{"response": "flat", "message": {"content": "nested"}}"#;
        assert_eq!(extract_content(body).as_deref(), Some("nested"));
    }

    #[test]
    fn falls_back_to_first_string_field_in_document_order() {
        assert_eq!(extract_content(r#"{"done": true, "text": "first", "other": "second"}"#).as_deref(), Some("first"));
    }

    #[test]
    fn falls_back_to_nested_content_field() {
        let body = r#"{"count": 3, "choice": {"content": "deep"}, "note": "later"}"#;
        assert_eq!(extract_content(body).as_deref(), Some("deep"));
    }

    #[test]
    fn extracts_object_embedded_in_raw_text() {
        let body = "garbage before {\"message\": {\"content\": \"a } inside\"}} trailing {";
        assert_eq!(extract_content(body).as_deref(), Some("a } inside"));
    }

    #[test]
    fn skips_unparseable_fragments() {
        let body = "{not json} then {\"response\": \"ok\"}";
        assert_eq!(extract_content(body).as_deref(), Some("ok"));
    }

    #[test]
    fn gives_up_when_nothing_usable() {
        assert_eq!(extract_content("plain words"), None);
        assert_eq!(extract_content(r#"{"done": true, "count": 1}"#), None);
        assert_eq!(extract_content("[1, 2, 3]"), None);
        assert_eq!(extract_content("{\"open\": \"never closed\""), None);
    }

    #[test]
    fn endpoints_strip_trailing_slash() {
        let config = LlmConfig {
            host: "http://localhost:11434/".to_string(),
            ..LlmConfig::default()
        };
        let adapter = OllamaAdapter::new(&config);
        assert_eq!(adapter.chat_url(), "http://localhost:11434/api/chat");
        assert_eq!(adapter.version_url(), "http://localhost:11434/api/version");
    }
}

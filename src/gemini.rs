//! Gemini API client — generateContent turns, function calling, and
//! response helpers.

use anyhow::{anyhow, Context, Result};
use reqwest::Client as HttpClient;
use serde_json::{json, Value};

use crate::constants::{
    DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, DEFAULT_TEMPERATURE, MAX_TOOL_LOOPS,
};
use crate::util::env_first;

/// A single function call extracted from a Gemini response.
#[derive(Clone, Debug)]
pub struct FunctionCall {
    pub name: String,
    pub args: Value,
}

/// Thin wrapper around the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiClient {
    pub model: String,
    pub base_url: String,
    temperature: f64,
    http_client: HttpClient,
}

impl GeminiClient {
    pub fn new() -> Self {
        let model = env_first(&["GEMINI_MODEL", "LEADLINE_GEMINI_MODEL"])
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
        let base_url = env_first(&["GEMINI_BASE_URL"])
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());
        let temperature = env_first(&["GEMINI_TEMPERATURE"])
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_TEMPERATURE);
        GeminiClient {
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature,
            http_client: HttpClient::new(),
        }
    }

    pub async fn generate(
        &self,
        key: &str,
        contents: &[Value],
        tools: Option<&[Value]>,
    ) -> Result<Value> {
        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "temperature": self.temperature,
            },
        });
        if let Some(tools) = tools {
            body["tools"] = json!([{ "functionDeclarations": tools }]);
        }
        self.request(key, body).await
    }

    async fn request(&self, key: &str, body: Value) -> Result<Value> {
        // The API key travels as a query parameter, not a bearer header.
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, key
        );

        let response = self
            .http_client
            .post(url)
            .json(&body)
            .send()
            .await
            .context("send Gemini request")?;
        let status = response.status();
        let text = response.text().await.context("read Gemini response")?;
        let json: Value = serde_json::from_str(&text).unwrap_or_else(|_| json!({"raw": text}));
        if !status.is_success() {
            if let Some(message) = json
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
            {
                return Err(anyhow!("Gemini error {status}: {message}"));
            }
            return Err(anyhow!("Gemini error {status}: {json}"));
        }
        Ok(json)
    }
}

/// Pull the parts of the first candidate's content from a Gemini response.
pub fn extract_parts(response: &Value) -> Vec<Value> {
    response
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .cloned()
        .unwrap_or_default()
}

/// Concatenate all text parts into a single string.
pub fn extract_text(parts: &[Value]) -> String {
    let mut chunks = Vec::new();
    for part in parts {
        if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
            chunks.push(text.to_string());
        }
    }
    chunks.join("\n")
}

/// Collect all function-call parts into structured [`FunctionCall`] values.
pub fn extract_function_calls(parts: &[Value]) -> Vec<FunctionCall> {
    let mut calls = Vec::new();
    for part in parts {
        let Some(call) = part.get("functionCall") else {
            continue;
        };
        let name = match call.get("name").and_then(|n| n.as_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        let args = call.get("args").cloned().unwrap_or_else(|| json!({}));
        calls.push(FunctionCall { name, args });
    }
    calls
}

/// A user turn holding plain text.
pub fn user_turn(text: &str) -> Value {
    json!({
        "role": "user",
        "parts": [{ "text": text }],
    })
}

/// A model turn echoing the parts the model produced, so the conversation
/// history stays intact across the tool round-trip.
pub fn model_turn(parts: &[Value]) -> Value {
    json!({
        "role": "model",
        "parts": parts,
    })
}

/// A user turn carrying a function result back to the model.
pub fn function_response_turn(name: &str, result: &str) -> Value {
    json!({
        "role": "user",
        "parts": [{
            "functionResponse": {
                "name": name,
                "response": { "result": result },
            },
        }],
    })
}

/// Returns `true` when the tool-call loop has hit the configured ceiling.
pub fn tool_loop_limit_reached(tool_loops: usize) -> bool {
    tool_loops >= MAX_TOOL_LOOPS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_final_text() {
        let response = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "text": "All done." }],
                },
            }],
        });
        let parts = extract_parts(&response);
        assert_eq!(extract_text(&parts), "All done.");
        assert!(extract_function_calls(&parts).is_empty());
    }

    #[test]
    fn extracts_function_calls() {
        let response = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{
                        "functionCall": { "name": "check_leads_today", "args": {} },
                    }],
                },
            }],
        });
        let parts = extract_parts(&response);
        let calls = extract_function_calls(&parts);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "check_leads_today");
        assert_eq!(calls[0].args, json!({}));
    }

    #[test]
    fn missing_candidates_yield_no_parts() {
        assert!(extract_parts(&json!({})).is_empty());
        assert!(extract_parts(&json!({"candidates": []})).is_empty());
    }

    #[test]
    fn function_response_turn_wraps_the_result() {
        let turn = function_response_turn("check_leads_today", "2 leads");
        assert_eq!(turn["role"], "user");
        assert_eq!(
            turn["parts"][0]["functionResponse"]["name"],
            "check_leads_today"
        );
        assert_eq!(
            turn["parts"][0]["functionResponse"]["response"]["result"],
            "2 leads"
        );
    }

    #[test]
    fn loop_ceiling_trips_at_the_limit() {
        assert!(!tool_loop_limit_reached(MAX_TOOL_LOOPS - 1));
        assert!(tool_loop_limit_reached(MAX_TOOL_LOOPS));
        assert!(tool_loop_limit_reached(MAX_TOOL_LOOPS + 1));
    }
}

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};
use taskrank_config::LlmProviderConfig;

const MAX_ATTEMPTS: usize = 2;

/// Sends a chat completion request and returns the JSON object the model produced.
///
/// The request timeout comes from the provider config. A timed-out call surfaces as an
/// ordinary transport error.
pub async fn complete_json(cfg: &LlmProviderConfig, messages: &[Value]) -> Result<Value> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let mut last_err = None;

	for attempt in 1..=MAX_ATTEMPTS {
		let body = serde_json::json!({
			"model": cfg.model,
			"temperature": cfg.temperature,
			"response_format": { "type": "json_object" },
			"messages": messages,
		});
		let res = client
			.post(&url)
			.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
			.json(&body)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;

		match parse_completion_json(json) {
			Ok(parsed) => return Ok(parsed),
			Err(err) => {
				tracing::debug!(attempt, error = %err, "Chat completion returned unusable content.");

				last_err = Some(err);
			},
		}
	}

	Err(last_err.unwrap_or_else(|| Error::InvalidResponse {
		message: "Chat completion response is not valid JSON.".to_string(),
	}))
}

pub fn parse_completion_json(json: Value) -> Result<Value> {
	if let Some(content) = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
	{
		let parsed: Value = serde_json::from_str(strip_code_fence(content)).map_err(|_| {
			Error::InvalidResponse {
				message: "Chat completion content is not valid JSON.".to_string(),
			}
		})?;

		return Ok(parsed);
	}

	if json.is_object() && json.get("choices").is_none() {
		return Ok(json);
	}

	Err(Error::InvalidResponse {
		message: "Chat completion response is missing JSON content.".to_string(),
	})
}

fn strip_code_fence(content: &str) -> &str {
	let trimmed = content.trim();
	let Some(inner) = trimmed.strip_prefix("```") else { return trimmed };
	let inner = inner.strip_prefix("json").unwrap_or(inner);

	inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_choice_content_json() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "{\"keywords\": {}}" } }
			]
		});
		let parsed = parse_completion_json(json).expect("parse failed");

		assert!(parsed.get("keywords").is_some());
	}

	#[test]
	fn strips_markdown_code_fences() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "```json\n{\"keywords\": {\"fix\": [\"repair\"]}}\n```" } }
			]
		});
		let parsed = parse_completion_json(json).expect("parse failed");

		assert_eq!(parsed["keywords"]["fix"][0], "repair");
	}

	#[test]
	fn rejects_non_json_content() {
		let json = serde_json::json!({
			"choices": [ { "message": { "content": "Sure! Here are some synonyms." } } ]
		});

		assert!(parse_completion_json(json).is_err());
	}
}

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{
	Error, Result,
	query::{QueryIntent, QueryParser},
};
use taskrank_domain::{language, segment};

/// What a semantic expander is asked to work on.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExpansionRequest {
	pub query: String,
	pub core_keywords: Vec<String>,
	pub languages: Vec<String>,
	pub max_expansions_per_keyword: u32,
}
impl ExpansionRequest {
	pub fn from_intent(intent: &QueryIntent, max_expansions_per_keyword: u32) -> Self {
		Self {
			query: intent.residual.clone(),
			core_keywords: intent.core_keywords.clone(),
			languages: intent.languages.clone(),
			max_expansions_per_keyword,
		}
	}

	/// Upper bound on expansions kept per core keyword, across all target languages.
	pub fn per_keyword_limit(&self) -> usize {
		self.max_expansions_per_keyword as usize * self.languages.len().max(1)
	}
}

/// Raw property values reported by an expander. Validated before use.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RecognizedProperties {
	#[serde(default, deserialize_with = "string_list")]
	pub priority: Vec<String>,
	#[serde(default, deserialize_with = "string_list")]
	pub status: Vec<String>,
	#[serde(default, deserialize_with = "string_list")]
	pub due: Vec<String>,
	#[serde(default, deserialize_with = "string_list")]
	pub folders: Vec<String>,
	#[serde(default, deserialize_with = "string_list")]
	pub tags: Vec<String>,
	#[serde(default, deserialize_with = "string_list")]
	pub notes: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpansionResponse {
	pub expanded_keywords: Vec<String>,
	pub properties: RecognizedProperties,
	/// Query words the expander read as properties rather than topics.
	pub consumed_keywords: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExpansionOutput {
	keywords: BTreeMap<String, Value>,
	properties: RecognizedProperties,
	#[serde(deserialize_with = "string_list")]
	consumed: Vec<String>,
}

pub fn build_expansion_messages(request: &ExpansionRequest) -> Vec<Value> {
	let schema = serde_json::json!({
		"keywords": { "<keyword>": ["string"] },
		"properties": {
			"priority": ["1|2|3|4|none|any"],
			"status": ["string"],
			"due": ["overdue|today|tomorrow|week|next-week|month|next-month|future|any|none|YYYY-MM-DD"],
			"folders": ["string"],
			"tags": ["string"],
			"notes": ["string"]
		},
		"consumed": ["string"]
	});
	let schema_text = serde_json::to_string_pretty(&schema)
		.unwrap_or_else(|_| "{\"keywords\": {}, \"properties\": {}, \"consumed\": []}".to_string());
	let languages = request
		.languages
		.iter()
		.map(|code| language::language_name(code))
		.collect::<Vec<_>>()
		.join(", ");
	let system_prompt = "You expand search keywords for a personal task list. \
Output must be valid JSON only and must match the provided schema exactly. \
For each keyword, list short synonyms or translations that keep its meaning. \
If a keyword describes a task property such as priority, status or due date rather than a topic, \
report the property and list the keyword under consumed. Do not add explanations or extra fields.";
	let user_prompt = format!(
		"Return JSON matching this exact schema:\n{schema}\nConstraints:\n- MAX_EXPANSIONS_PER_KEYWORD_PER_LANGUAGE = {max}\n- LANGUAGES = {languages}\nKeywords:\n{keywords}\nQuery:\n{query}",
		schema = schema_text,
		max = request.max_expansions_per_keyword,
		languages = languages,
		keywords = request.core_keywords.join(", "),
		query = request.query,
	);

	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}

/// Reads the expander's JSON object, keeping at most `per_keyword_limit` expansions for each
/// keyword.
pub fn parse_expansion_output(value: Value, per_keyword_limit: usize) -> Result<ExpansionResponse> {
	if !value.is_object() {
		return Err(Error::Provider { message: "Expansion output must be a JSON object.".to_string() });
	}

	let output: ExpansionOutput = serde_json::from_value(value).map_err(|err| Error::Provider {
		message: format!("Expansion output does not match the schema: {err}."),
	})?;
	let mut expanded_keywords = Vec::new();

	for values in output.keywords.values() {
		expanded_keywords.extend(flatten_strings(values).into_iter().take(per_keyword_limit));
	}

	Ok(ExpansionResponse {
		expanded_keywords,
		properties: output.properties,
		consumed_keywords: output.consumed,
	})
}

/// Folds an expander response into a deterministic intent.
///
/// Consumed keywords leave both keyword sets. Recognized properties only fill categories the
/// deterministic parse left empty.
pub fn merge_expansion(
	parser: &QueryParser,
	mut intent: QueryIntent,
	response: ExpansionResponse,
	per_keyword_limit: usize,
) -> QueryIntent {
	let consumed: HashSet<String> = response
		.consumed_keywords
		.iter()
		.map(|word| segment::normalize(word.trim()))
		.filter(|word| !word.is_empty())
		.collect();
	let is_consumed = |keyword: &str| {
		consumed.contains(keyword)
			|| consumed.iter().any(|word| {
				segment::contains_logographic(word) && word.contains(keyword)
			})
	};

	intent.core_keywords.retain(|keyword| !is_consumed(keyword));
	let recognized = parser.extractor_for(&intent.languages).resolve_recognized(&response.properties);

	intent.properties.fill_missing(recognized);

	let core: HashSet<&str> = intent.core_keywords.iter().map(String::as_str).collect();
	let mut seen = HashSet::new();
	let cap = intent.core_keywords.len() * per_keyword_limit;
	let expanded: Vec<String> = response
		.expanded_keywords
		.iter()
		.map(|word| segment::normalize(word.trim()))
		.filter(|word| {
			!word.is_empty() && !core.contains(word.as_str()) && !is_consumed(word) && seen.insert(word.clone())
		})
		.take(cap)
		.collect();

	intent.expanded_keywords = expanded;

	if !consumed.is_empty() {
		intent.residual = strip_consumed(&intent.residual, &consumed);
		intent.vague = parser.is_vague(&intent.residual, &intent.core_keywords);
	}

	intent
}

fn strip_consumed(residual: &str, consumed: &HashSet<String>) -> String {
	let mut text = residual.to_string();

	for word in consumed.iter().filter(|word| segment::contains_logographic(word)) {
		text = text.replace(word.as_str(), " ");
	}

	text.split_whitespace()
		.filter(|token| !consumed.contains(*token))
		.collect::<Vec<_>>()
		.join(" ")
}

fn string_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
	D: Deserializer<'de>,
{
	let value = Value::deserialize(deserializer)?;

	Ok(flatten_strings(&value))
}

fn flatten_strings(value: &Value) -> Vec<String> {
	match value {
		Value::String(text) if !text.trim().is_empty() => vec![text.trim().to_string()],
		Value::Number(number) => vec![number.to_string()],
		Value::Array(items) => items.iter().flat_map(flatten_strings).collect(),
		_ => Vec::new(),
	}
}

//! Deterministic property extraction.
//!
//! Recognized forms, in the order they are consumed:
//! - `#tag`
//! - `trigger:value` for priority, status, due, folder, tag and note triggers
//! - `trigger value` for priority, status and due, only when the value parses
//! - `p1`..`p4` priority shorthand
//! - standalone due words such as "overdue"
//!
//! Every consumed expression is cut from the query so its words never become keywords.

use std::collections::HashMap;

use regex::Regex;

use crate::{
	query::{DueFilter, PropertyFilters, RecognizedProperties},
	status::StatusTable,
};
use taskrank_config::{Query, TriggerWords};
use taskrank_domain::{Priority, StatusCategory, segment};

const VALUE_PATTERN: &str = r#"("[^"]*"|[^\s"]+)"#;
const VALUE_SEPARATORS: [char; 3] = [',', '，', '|'];

#[derive(Clone, Debug, Default)]
pub struct Extracted {
	pub filters: PropertyFilters,
	pub residual: String,
}

#[derive(Clone, Debug, Default)]
struct Qualifier {
	colon: Option<Regex>,
	spaced: Option<Regex>,
}
impl Qualifier {
	fn new(triggers: &[String], spaced: bool) -> Self {
		let Some(head) = trigger_head(triggers) else { return Self::default() };
		let colon = Regex::new(&format!(r"(?i){head}\s*[:：]\s*{VALUE_PATTERN}")).ok();
		let spaced =
			if spaced { Regex::new(&format!(r"(?i){head}\s+{VALUE_PATTERN}")).ok() } else { None };

		Self { colon, spaced }
	}
}

#[derive(Clone, Debug)]
pub struct PropertyExtractor {
	priority: Qualifier,
	status: Qualifier,
	due: Qualifier,
	folder: Qualifier,
	tag: Qualifier,
	note: Qualifier,
	shorthand: Option<Regex>,
	standalone_due: Option<Regex>,
	priority_values: HashMap<String, String>,
	due_values: HashMap<String, String>,
	statuses: StatusTable,
}
impl PropertyExtractor {
	/// Trigger words come from the configured languages, or from every language with triggers
	/// when none is configured.
	pub fn new(cfg: &Query, statuses: StatusTable) -> Self {
		let active: Vec<&TriggerWords> = if cfg.languages.is_empty() {
			cfg.triggers.values().collect()
		} else {
			cfg.languages.iter().filter_map(|lang| cfg.triggers.get(lang)).collect()
		};
		let collect = |pick: fn(&TriggerWords) -> &Vec<String>| -> Vec<String> {
			active.iter().flat_map(|words| pick(words).iter().cloned()).collect()
		};
		let mut priority_values = HashMap::new();
		let mut due_values = HashMap::new();

		for words in &active {
			priority_values.extend(words.priority_values.clone());
			due_values.extend(words.due_values.clone());
		}

		let shorthand = alternation(&collect(|words| &words.priority_shorthand))
			.and_then(|alt| Regex::new(&format!(r"(?i)\b(?:{alt})([1-4])\b")).ok());
		let standalone_due = standalone_pattern(&collect(|words| &words.due_standalone))
			.and_then(|pattern| Regex::new(&pattern).ok());

		Self {
			priority: Qualifier::new(&collect(|words| &words.priority), true),
			status: Qualifier::new(&collect(|words| &words.status), true),
			due: Qualifier::new(&collect(|words| &words.due), true),
			folder: Qualifier::new(&collect(|words| &words.folder), false),
			tag: Qualifier::new(&collect(|words| &words.tag), false),
			note: Qualifier::new(&collect(|words| &words.note), false),
			shorthand,
			standalone_due,
			priority_values,
			due_values,
			statuses,
		}
	}

	pub fn extract(&self, raw: &str) -> Extracted {
		let mut filters = PropertyFilters::default();
		let normalized = segment::normalize(raw);
		let (tags, text) = segment::split_tags(&normalized);

		push_unique(&mut filters.tags, tags);

		let text = self.take_qualified(&text, |qualifier| qualifier.colon.as_ref(), &mut filters);
		let text = self.take_qualified(&text, |qualifier| qualifier.spaced.as_ref(), &mut filters);
		let (text, levels) = take_matches(&text, self.shorthand.as_ref(), |digit| {
			digit.parse::<u8>().ok().map(|level| vec![Priority::from_level(level)])
		});

		push_unique(&mut filters.priority, levels);

		let (text, due) =
			take_matches(&text, self.standalone_due.as_ref(), |word| self.parse_due_value(word));

		push_unique(&mut filters.due, due);

		Extracted { filters, residual: collapse_whitespace(&text) }
	}

	/// Accepts a numeric level, `p1`..`p4`, a configured alias, "none", or "any"/"all" for
	/// "has a priority".
	pub fn parse_priority_value(&self, value: &str) -> Option<Vec<Priority>> {
		let value = value.trim().to_lowercase();
		let value = self.priority_values.get(&value).cloned().unwrap_or(value);

		match value.as_str() {
			"any" | "all" => Some(Priority::LEVELS.to_vec()),
			"none" => Some(vec![Priority::None]),
			other => {
				let digits = other.strip_prefix('p').unwrap_or(other);

				digits
					.parse::<u8>()
					.ok()
					.filter(|level| (1..=4).contains(level))
					.map(|level| vec![Priority::from_level(level)])
			},
		}
	}

	/// "any" and "all" are recognized but lift the constraint, so they yield an empty list.
	pub fn parse_status_value(&self, value: &str) -> Option<Vec<StatusCategory>> {
		let trimmed = value.trim();

		if matches!(trimmed.to_lowercase().as_str(), "any" | "all") {
			return Some(Vec::new());
		}

		self.statuses.resolve(trimmed).map(|category| vec![category])
	}

	pub fn parse_due_value(&self, value: &str) -> Option<Vec<DueFilter>> {
		let value = value.trim().to_lowercase();
		let value = self.due_values.get(&value).cloned().unwrap_or(value);

		DueFilter::parse(&value).map(|filter| vec![filter])
	}

	/// Validates properties reported by a semantic expander. Invalid values are dropped.
	pub fn resolve_recognized(&self, recognized: &RecognizedProperties) -> PropertyFilters {
		let mut filters = PropertyFilters::default();

		for value in &recognized.priority {
			push_unique(&mut filters.priority, self.parse_priority_value(value).unwrap_or_default());
		}
		for value in &recognized.status {
			push_unique(&mut filters.status, self.parse_status_value(value).unwrap_or_default());
		}
		for value in &recognized.due {
			push_unique(&mut filters.due, self.parse_due_value(value).unwrap_or_default());
		}

		push_unique(&mut filters.folders, plain_values(&recognized.folders));
		push_unique(
			&mut filters.tags,
			plain_values(&recognized.tags)
				.into_iter()
				.map(|tag| tag.trim_start_matches('#').to_string())
				.filter(|tag| !tag.is_empty())
				.collect(),
		);
		push_unique(&mut filters.notes, plain_values(&recognized.notes));

		filters
	}

	fn take_qualified(
		&self,
		text: &str,
		form: fn(&Qualifier) -> Option<&Regex>,
		filters: &mut PropertyFilters,
	) -> String {
		let (text, priority) =
			take_matches(text, form(&self.priority), |raw| parse_list(raw, |v| self.parse_priority_value(v)));

		push_unique(&mut filters.priority, priority);

		let (text, status) =
			take_matches(&text, form(&self.status), |raw| parse_list(raw, |v| self.parse_status_value(v)));

		push_unique(&mut filters.status, status);

		let (text, due) =
			take_matches(&text, form(&self.due), |raw| parse_list(raw, |v| self.parse_due_value(v)));

		push_unique(&mut filters.due, due);

		let (text, folders) = take_matches(&text, form(&self.folder), |raw| non_empty(split_values(raw)));

		push_unique(&mut filters.folders, folders);

		let (text, tags) = take_matches(&text, form(&self.tag), |raw| {
			non_empty(
				split_values(raw)
					.into_iter()
					.map(|tag| tag.trim_start_matches('#').to_string())
					.filter(|tag| !tag.is_empty())
					.collect(),
			)
		});

		push_unique(&mut filters.tags, tags);

		let (text, notes) = take_matches(&text, form(&self.note), |raw| non_empty(split_values(raw)));

		push_unique(&mut filters.notes, notes);

		text
	}
}

/// Builds the leading part of a qualifier pattern. Alphabetic triggers must start a word;
/// logographic triggers may follow other text directly.
fn trigger_head(triggers: &[String]) -> Option<String> {
	let (logographic, alphabetic): (Vec<String>, Vec<String>) =
		triggers.iter().cloned().partition(|word| segment::contains_logographic(word));
	let mut parts = Vec::new();

	if let Some(alt) = alternation(&alphabetic) {
		parts.push(format!(r"(?:^|\s)(?:{alt})"));
	}
	if let Some(alt) = alternation(&logographic) {
		parts.push(format!("(?:{alt})"));
	}

	if parts.is_empty() { None } else { Some(format!("(?:{})", parts.join("|"))) }
}

fn standalone_pattern(words: &[String]) -> Option<String> {
	let mut words: Vec<&String> = words.iter().filter(|word| !word.is_empty()).collect();

	if words.is_empty() {
		return None;
	}

	words.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));

	let parts: Vec<String> = words
		.into_iter()
		.map(|word| {
			if segment::contains_logographic(word) {
				regex::escape(word)
			} else {
				format!(r"\b{}\b", regex::escape(word))
			}
		})
		.collect();

	Some(format!("(?i)(?:{})", parts.join("|")))
}

/// Longest alternatives first so "priority" is tried before "p".
fn alternation(words: &[String]) -> Option<String> {
	let mut words: Vec<&String> = words.iter().filter(|word| !word.is_empty()).collect();

	if words.is_empty() {
		return None;
	}

	words.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
	words.dedup();

	Some(words.into_iter().map(|word| regex::escape(word)).collect::<Vec<_>>().join("|"))
}

/// Runs `re` over `text`, keeping every match whose value parses. Kept matches are replaced
/// by a space; rejected ones stay in the text untouched.
fn take_matches<T>(
	text: &str,
	re: Option<&Regex>,
	mut parse: impl FnMut(&str) -> Option<Vec<T>>,
) -> (String, Vec<T>) {
	let Some(re) = re else { return (text.to_string(), Vec::new()) };
	let mut values = Vec::new();
	let mut rest = String::with_capacity(text.len());
	let mut last = 0_usize;

	for caps in re.captures_iter(text) {
		let Some(whole) = caps.get(0) else { continue };
		let value = caps.get(1).map_or(whole.as_str(), |m| m.as_str());
		let Some(parsed) = parse(value) else { continue };

		values.extend(parsed);
		rest.push_str(&text[last..whole.start()]);
		rest.push(' ');

		last = whole.end();
	}

	rest.push_str(&text[last..]);

	(rest, values)
}

/// Every listed value must parse, otherwise the whole expression is rejected.
fn parse_list<T>(raw: &str, parse: impl Fn(&str) -> Option<Vec<T>>) -> Option<Vec<T>> {
	let parts = split_values(raw);

	if parts.is_empty() {
		return None;
	}

	let mut out = Vec::new();

	for part in parts {
		out.extend(parse(part.as_str())?);
	}

	Some(out)
}

fn split_values(raw: &str) -> Vec<String> {
	raw.trim()
		.trim_matches('"')
		.split(VALUE_SEPARATORS)
		.map(|part| part.trim().to_lowercase())
		.filter(|part| !part.is_empty())
		.collect()
}

fn plain_values(values: &[String]) -> Vec<String> {
	values.iter().flat_map(|value| split_values(value)).collect()
}

fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
	if values.is_empty() { None } else { Some(values) }
}

fn push_unique<T: PartialEq>(out: &mut Vec<T>, values: Vec<T>) {
	for value in values {
		if !out.contains(&value) {
			out.push(value);
		}
	}
}

fn collapse_whitespace(text: &str) -> String {
	text.split_whitespace().collect::<Vec<_>>().join(" ")
}

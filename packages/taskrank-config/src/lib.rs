mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, DueDateWeights, Executor, Expansion, Filter, LANG_ENGLISH, LANG_MANDARIN,
	LlmProviderConfig, PriorityWeights, Query, STATUS_CANCELLED, STATUS_COMPLETED,
	STATUS_IN_PROGRESS, STATUS_OPEN, STATUS_OTHER, Scoring, Service, Sort, Status,
	StatusCategoryDef, TriggerWords, builtin_status_categories, builtin_triggers,
};

use std::{collections::HashSet, fs, path::Path};

pub const SORT_CRITERIA: [&str; 6] =
	["relevance", "due_date", "priority", "status", "created", "alphabetical"];

/// Reads and parses a config file. Values are not clamped here; call [`normalize`] and report
/// the returned notes once logging is up.
pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	Ok(cfg)
}

pub fn from_toml_str(raw: &str) -> Result<Config> {
	toml::from_str(raw).map_err(|err| Error::ParseInline { source: err })
}

/// Clamps user-editable values into their valid ranges and returns one note per change.
///
/// Nothing here rejects: odd values are repaired and reported. Running it twice is a no-op.
pub fn normalize(cfg: &mut Config) -> Vec<String> {
	let mut notes = Vec::new();

	normalize_scoring(&mut cfg.scoring, &mut notes);
	normalize_filter(&mut cfg.filter, &mut notes);
	normalize_sort(&mut cfg.sort, &mut notes);
	normalize_status(&mut cfg.status, &mut notes);
	normalize_query(&mut cfg.query, &mut notes);

	if cfg.executor.chunk_size == 0 {
		notes.push("executor.chunk_size must be at least 1; using 1.".to_string());

		cfg.executor.chunk_size = 1;
	}
	if cfg.expansion.enabled && cfg.expansion.provider.api_key.trim().is_empty() {
		notes.push("expansion.provider.api_key is empty; semantic expansion disabled.".to_string());

		cfg.expansion.enabled = false;
	}
	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}

	notes
}

fn normalize_scoring(scoring: &mut Scoring, notes: &mut Vec<String>) {
	for (label, value) in [
		("scoring.relevance_coefficient", &mut scoring.relevance_coefficient),
		("scoring.due_date_coefficient", &mut scoring.due_date_coefficient),
		("scoring.priority_coefficient", &mut scoring.priority_coefficient),
		("scoring.status_coefficient", &mut scoring.status_coefficient),
		("scoring.core_bonus", &mut scoring.core_bonus),
		("scoring.due_date.overdue", &mut scoring.due_date.overdue),
		("scoring.due_date.today", &mut scoring.due_date.today),
		("scoring.due_date.this_week", &mut scoring.due_date.this_week),
		("scoring.due_date.this_month", &mut scoring.due_date.this_month),
		("scoring.due_date.future", &mut scoring.due_date.future),
		("scoring.due_date.none", &mut scoring.due_date.none),
		("scoring.priority.p1", &mut scoring.priority.p1),
		("scoring.priority.p2", &mut scoring.priority.p2),
		("scoring.priority.p3", &mut scoring.priority.p3),
		("scoring.priority.p4", &mut scoring.priority.p4),
		("scoring.priority.none", &mut scoring.priority.none),
	] {
		clamp_non_negative(label, value, notes);
	}
}

fn normalize_filter(filter: &mut Filter, notes: &mut Vec<String>) {
	clamp_fraction("filter.quality_fraction", &mut filter.quality_fraction, notes);
	clamp_fraction("filter.min_relevance_fraction", &mut filter.min_relevance_fraction, notes);

	filter.stop_words = normalize_words(std::mem::take(&mut filter.stop_words));
}

fn normalize_sort(sort: &mut Sort, notes: &mut Vec<String>) {
	let mut seen = HashSet::new();
	let mut criteria = Vec::with_capacity(sort.criteria.len());

	for raw in &sort.criteria {
		let name = raw.trim().to_ascii_lowercase().replace('-', "_");

		if !SORT_CRITERIA.contains(&name.as_str()) {
			notes.push(format!("sort.criteria contains unknown criterion '{raw}'; dropped."));

			continue;
		}
		if !seen.insert(name.clone()) {
			notes.push(format!("sort.criteria lists '{name}' more than once; kept the first."));

			continue;
		}

		criteria.push(name);
	}

	sort.criteria = criteria;
}

fn normalize_status(status: &mut Status, notes: &mut Vec<String>) {
	for (key, def) in builtin_status_categories() {
		status.categories.entry(key).or_insert(def);
	}

	for (key, def) in status.categories.iter_mut() {
		clamp_non_negative(&format!("status.categories.{key}.score"), &mut def.score, notes);

		def.symbols.retain(|symbol| !symbol.is_empty());
		def.aliases = normalize_words(std::mem::take(&mut def.aliases));

		if def.display_name.trim().is_empty() {
			def.display_name = key.clone();
		}
	}
}

fn normalize_query(query: &mut Query, notes: &mut Vec<String>) {
	query.languages = normalize_words(std::mem::take(&mut query.languages));
	query.generic_words = normalize_words(std::mem::take(&mut query.generic_words));

	if !query.vague_ratio.is_finite() {
		notes.push("query.vague_ratio must be a finite number; using 0.7.".to_string());

		query.vague_ratio = 0.7;
	}

	clamp_fraction("query.vague_ratio", &mut query.vague_ratio, notes);

	for words in query.triggers.values_mut() {
		for list in [
			&mut words.priority,
			&mut words.priority_shorthand,
			&mut words.status,
			&mut words.due,
			&mut words.due_standalone,
			&mut words.folder,
			&mut words.tag,
			&mut words.note,
		] {
			*list = normalize_words(std::mem::take(list));
		}

		words.priority_values = std::mem::take(&mut words.priority_values)
			.into_iter()
			.map(|(alias, value)| (alias.trim().to_lowercase(), value.trim().to_lowercase()))
			.filter(|(alias, _)| !alias.is_empty())
			.collect();
		words.due_values = std::mem::take(&mut words.due_values)
			.into_iter()
			.map(|(alias, value)| (alias.trim().to_lowercase(), value.trim().to_lowercase()))
			.filter(|(alias, _)| !alias.is_empty())
			.collect();
	}
}

fn clamp_non_negative(label: &str, value: &mut f32, notes: &mut Vec<String>) {
	if !value.is_finite() {
		notes.push(format!("{label} must be a finite number; using 0."));

		*value = 0.0;
	} else if *value < 0.0 {
		notes.push(format!("{label} must be zero or greater; using 0."));

		*value = 0.0;
	}
}

fn clamp_fraction(label: &str, value: &mut f32, notes: &mut Vec<String>) {
	clamp_non_negative(label, value, notes);

	if *value > 1.0 {
		notes.push(format!("{label} must be 1.0 or less; using 1.0."));

		*value = 1.0;
	}
}

fn normalize_words(words: Vec<String>) -> Vec<String> {
	let mut seen = HashSet::new();
	let mut out = Vec::with_capacity(words.len());

	for word in words {
		let word = word.trim().to_lowercase();

		if word.is_empty() {
			continue;
		}
		if seen.insert(word.clone()) {
			out.push(word);
		}
	}

	out
}

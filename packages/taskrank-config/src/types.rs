use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

pub const STATUS_OPEN: &str = "open";
pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_CANCELLED: &str = "cancelled";
pub const STATUS_OTHER: &str = "other";

pub const LANG_ENGLISH: &str = "eng";
pub const LANG_MANDARIN: &str = "cmn";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
	pub service: Service,
	pub scoring: Scoring,
	pub filter: Filter,
	pub sort: Sort,
	pub status: Status,
	pub query: Query,
	pub expansion: Expansion,
	pub executor: Executor,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Service {
	pub log_level: String,
}
impl Default for Service {
	fn default() -> Self {
		Self { log_level: "info".to_string() }
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Scoring {
	pub relevance_coefficient: f32,
	pub due_date_coefficient: f32,
	pub priority_coefficient: f32,
	pub status_coefficient: f32,
	/// Extra weight for matches on literal query terms, on top of the 1.0 for all keywords.
	pub core_bonus: f32,
	pub due_date: DueDateWeights,
	pub priority: PriorityWeights,
}
impl Default for Scoring {
	fn default() -> Self {
		Self {
			relevance_coefficient: 20.0,
			due_date_coefficient: 4.0,
			priority_coefficient: 1.0,
			status_coefficient: 1.0,
			core_bonus: 0.2,
			due_date: DueDateWeights::default(),
			priority: PriorityWeights::default(),
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DueDateWeights {
	pub overdue: f32,
	pub today: f32,
	pub this_week: f32,
	pub this_month: f32,
	pub future: f32,
	pub none: f32,
}
impl DueDateWeights {
	pub fn max(&self) -> f32 {
		[self.overdue, self.today, self.this_week, self.this_month, self.future, self.none]
			.into_iter()
			.fold(0.0, f32::max)
	}
}
impl Default for DueDateWeights {
	fn default() -> Self {
		Self {
			overdue: 1.5,
			today: 1.25,
			this_week: 1.0,
			this_month: 0.5,
			future: 0.2,
			none: 0.1,
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PriorityWeights {
	pub p1: f32,
	pub p2: f32,
	pub p3: f32,
	pub p4: f32,
	pub none: f32,
}
impl PriorityWeights {
	pub fn max(&self) -> f32 {
		[self.p1, self.p2, self.p3, self.p4, self.none].into_iter().fold(0.0, f32::max)
	}
}
impl Default for PriorityWeights {
	fn default() -> Self {
		Self { p1: 1.0, p2: 0.75, p3: 0.5, p4: 0.2, none: 0.1 }
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Filter {
	/// 0.0 selects the adaptive cutoff; anything above is a fraction of the max possible score.
	pub quality_fraction: f32,
	/// Fraction of the relevance maximum (core_bonus + 1) a keyword query must reach.
	pub min_relevance_fraction: f32,
	pub use_builtin_stop_words: bool,
	pub stop_words: Vec<String>,
	pub max_tasks_for_display: usize,
	pub max_tasks_for_ai: usize,
}
impl Default for Filter {
	fn default() -> Self {
		Self {
			quality_fraction: 0.0,
			min_relevance_fraction: 0.0,
			use_builtin_stop_words: true,
			stop_words: Vec::new(),
			max_tasks_for_display: 50,
			max_tasks_for_ai: 100,
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Sort {
	/// Tie-break criteria by name: relevance, due_date, priority, status, created, alphabetical.
	pub criteria: Vec<String>,
}
impl Default for Sort {
	fn default() -> Self {
		Self {
			criteria: vec![
				"relevance".to_string(),
				"due_date".to_string(),
				"priority".to_string(),
			],
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Status {
	pub categories: BTreeMap<String, StatusCategoryDef>,
}
impl Default for Status {
	fn default() -> Self {
		Self { categories: builtin_status_categories() }
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StatusCategoryDef {
	pub display_name: String,
	/// Checkbox characters mapped to this category, e.g. "x" in `- [x]`.
	pub symbols: Vec<String>,
	pub aliases: Vec<String>,
	/// Relevance weight fed into the status sub-score.
	pub score: f32,
	/// Position used when sorting by status. Independent of `score`.
	pub order: u32,
}
impl Default for StatusCategoryDef {
	fn default() -> Self {
		Self {
			display_name: String::new(),
			symbols: Vec::new(),
			aliases: Vec::new(),
			score: 0.5,
			order: 100,
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Query {
	/// ISO 639-3 codes. Empty means detect from the query text.
	pub languages: Vec<String>,
	pub max_expansions_per_keyword: u32,
	/// Share of core keywords that must be generic for a query to count as vague.
	pub vague_ratio: f32,
	pub generic_words: Vec<String>,
	pub triggers: BTreeMap<String, TriggerWords>,
}
impl Default for Query {
	fn default() -> Self {
		Self {
			languages: vec![LANG_ENGLISH.to_string(), LANG_MANDARIN.to_string()],
			max_expansions_per_keyword: 5,
			vague_ratio: 0.7,
			generic_words: Vec::new(),
			triggers: builtin_triggers(),
		}
	}
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TriggerWords {
	pub priority: Vec<String>,
	/// Prefixes for the `p1`..`p4` shorthand.
	pub priority_shorthand: Vec<String>,
	/// Value aliases mapped to "1".."4", "none", "any" or "all".
	pub priority_values: BTreeMap<String, String>,
	pub status: Vec<String>,
	pub due: Vec<String>,
	/// Words read as a due filter even without a qualifier, e.g. "overdue".
	pub due_standalone: Vec<String>,
	/// Value aliases mapped to canonical due keywords.
	pub due_values: BTreeMap<String, String>,
	pub folder: Vec<String>,
	pub tag: Vec<String>,
	pub note: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Expansion {
	pub enabled: bool,
	pub provider: LlmProviderConfig,
}
impl Default for Expansion {
	fn default() -> Self {
		Self { enabled: false, provider: LlmProviderConfig::default() }
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}
impl Default for LlmProviderConfig {
	fn default() -> Self {
		Self {
			provider_id: "openai".to_string(),
			api_base: "https://api.openai.com".to_string(),
			api_key: String::new(),
			path: "/v1/chat/completions".to_string(),
			model: "gpt-4o-mini".to_string(),
			temperature: 0.1,
			timeout_ms: 10_000,
			default_headers: Map::new(),
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Executor {
	pub chunk_size: usize,
}
impl Default for Executor {
	fn default() -> Self {
		Self { chunk_size: 500 }
	}
}

pub fn builtin_status_categories() -> BTreeMap<String, StatusCategoryDef> {
	let mut out = BTreeMap::new();

	for (key, display_name, symbols, aliases, score, order) in [
		(STATUS_OPEN, "Open", &[" "][..], &["open", "todo", "pending"][..], 1.0, 1),
		(STATUS_IN_PROGRESS, "In progress", &["/"][..], &["in-progress", "doing", "wip"][..], 0.75, 2),
		(STATUS_COMPLETED, "Completed", &["x", "X"][..], &["done", "completed", "finished"][..], 0.2, 6),
		(STATUS_CANCELLED, "Cancelled", &["-"][..], &["cancelled", "canceled", "dropped"][..], 0.1, 7),
		(STATUS_OTHER, "Other", &[][..], &["other"][..], 0.5, 8),
	] {
		out.insert(
			key.to_string(),
			StatusCategoryDef {
				display_name: display_name.to_string(),
				symbols: symbols.iter().map(|symbol| symbol.to_string()).collect(),
				aliases: aliases.iter().map(|alias| alias.to_string()).collect(),
				score,
				order,
			},
		);
	}

	out
}

pub fn builtin_triggers() -> BTreeMap<String, TriggerWords> {
	let mut out = BTreeMap::new();

	out.insert(
		LANG_ENGLISH.to_string(),
		TriggerWords {
			priority: strings(&["priority", "p"]),
			priority_shorthand: strings(&["p"]),
			priority_values: pairs(&[
				("highest", "1"),
				("urgent", "1"),
				("high", "2"),
				("medium", "3"),
				("low", "4"),
			]),
			status: strings(&["status", "s"]),
			due: strings(&["due", "d"]),
			due_standalone: strings(&["overdue"]),
			due_values: pairs(&[
				("this-week", "week"),
				("this-month", "month"),
				("later", "future"),
			]),
			folder: strings(&["folder"]),
			tag: strings(&["tag", "tags"]),
			note: strings(&["note", "file"]),
		},
	);
	out.insert(
		LANG_MANDARIN.to_string(),
		TriggerWords {
			priority: strings(&["优先级"]),
			priority_shorthand: Vec::new(),
			priority_values: pairs(&[
				("最高", "1"),
				("紧急", "1"),
				("高", "2"),
				("中", "3"),
				("低", "4"),
				("无", "none"),
				("全部", "all"),
			]),
			status: strings(&["状态"]),
			due: strings(&["截止", "到期"]),
			due_standalone: strings(&["逾期", "过期"]),
			due_values: pairs(&[
				("逾期", "overdue"),
				("今天", "today"),
				("明天", "tomorrow"),
				("本周", "week"),
				("下周", "next-week"),
				("本月", "month"),
				("下月", "next-month"),
				("未来", "future"),
				("无", "none"),
				("全部", "all"),
			]),
			folder: strings(&["文件夹"]),
			tag: strings(&["标签"]),
			note: strings(&["笔记"]),
		},
	);

	out
}

fn strings(values: &[&str]) -> Vec<String> {
	values.iter().map(|value| value.to_string()).collect()
}

fn pairs(values: &[(&str, &str)]) -> BTreeMap<String, String> {
	values.iter().map(|(key, value)| (key.to_string(), value.to_string())).collect()
}

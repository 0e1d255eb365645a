//! Query understanding: property extraction, keyword segmentation, and vagueness.

pub mod expansion;
pub mod properties;

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use time::Date;

pub use expansion::{ExpansionRequest, ExpansionResponse, RecognizedProperties};
pub use properties::PropertyExtractor;
use crate::status::StatusTable;
use taskrank_config::{LANG_ENGLISH, Query};
use taskrank_domain::{
	DueBucket, Priority, StatusCategory, TaskRecord, language, lexicon::GenericWords, segment,
};

/// Structured interpretation of one query string.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct QueryIntent {
	pub raw: String,
	/// Query text left after property expressions were removed.
	pub residual: String,
	pub core_keywords: Vec<String>,
	/// Semantic equivalents of the core keywords. Never contains a core keyword.
	pub expanded_keywords: Vec<String>,
	pub properties: PropertyFilters,
	pub vague: bool,
	pub languages: Vec<String>,
}
impl QueryIntent {
	/// Core keywords followed by expansions, de-duplicated.
	pub fn all_keywords(&self) -> Vec<String> {
		let mut seen = HashSet::new();

		self.core_keywords
			.iter()
			.chain(self.expanded_keywords.iter())
			.filter(|keyword| seen.insert(keyword.as_str()))
			.cloned()
			.collect()
	}
}

/// Property constraints. Values inside one category are OR-ed; categories are AND-ed. An
/// empty list places no constraint.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PropertyFilters {
	pub priority: Vec<Priority>,
	pub status: Vec<StatusCategory>,
	pub due: Vec<DueFilter>,
	pub folders: Vec<String>,
	pub tags: Vec<String>,
	pub notes: Vec<String>,
}
impl PropertyFilters {
	pub fn is_empty(&self) -> bool {
		self.count() == 0
	}

	/// Number of categories carrying a constraint.
	pub fn count(&self) -> usize {
		[
			self.priority.is_empty(),
			self.status.is_empty(),
			self.due.is_empty(),
			self.folders.is_empty(),
			self.tags.is_empty(),
			self.notes.is_empty(),
		]
		.into_iter()
		.filter(|empty| !empty)
		.count()
	}

	/// Copies categories that are unset here from `other`. Categories already set win.
	pub fn fill_missing(&mut self, other: PropertyFilters) {
		if self.priority.is_empty() {
			self.priority = other.priority;
		}
		if self.status.is_empty() {
			self.status = other.status;
		}
		if self.due.is_empty() {
			self.due = other.due;
		}
		if self.folders.is_empty() {
			self.folders = other.folders;
		}
		if self.tags.is_empty() {
			self.tags = other.tags;
		}
		if self.notes.is_empty() {
			self.notes = other.notes;
		}
	}

	/// Structural match against one task. `today` anchors relative due filters.
	pub fn matches(&self, fields: FilterFields<'_>, today: Date) -> bool {
		if !self.priority.is_empty() && !self.priority.contains(&fields.priority) {
			return false;
		}
		if !self.status.is_empty() && !self.status.contains(fields.status) {
			return false;
		}
		if !self.due.is_empty() && !self.due.iter().any(|filter| filter.matches(fields.due, today)) {
			return false;
		}

		let location = fields.location;

		if !self.folders.is_empty()
			&& !self.folders.iter().any(|wanted| {
				location.folder.contains(wanted.as_str()) || path_has_folder(&location.path, wanted)
			}) {
			return false;
		}
		if !self.tags.is_empty()
			&& !self
				.tags
				.iter()
				.any(|wanted| location.tags.iter().any(|tag| tag_matches(tag, wanted)))
		{
			return false;
		}
		if !self.notes.is_empty()
			&& !self.notes.iter().any(|wanted| location.note.contains(wanted.as_str()))
		{
			return false;
		}

		true
	}
}

/// Lower-cased folder, path, note and tag text read by location filters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskLocation {
	pub folder: String,
	pub path: String,
	pub note: String,
	pub tags: Vec<String>,
}
impl TaskLocation {
	pub fn from_task(task: &TaskRecord) -> Self {
		Self {
			folder: task.folder.to_lowercase(),
			path: task.path.to_lowercase(),
			note: task.note_name().to_lowercase(),
			tags: task.all_tags().map(str::to_lowercase).collect(),
		}
	}
}

/// One task as seen by [`PropertyFilters::matches`].
#[derive(Clone, Copy, Debug)]
pub struct FilterFields<'a> {
	pub priority: Priority,
	pub status: &'a StatusCategory,
	pub due: Option<Date>,
	pub location: &'a TaskLocation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DueFilter {
	/// Has any due date.
	Any,
	/// Has no due date.
	None,
	Overdue,
	Today,
	Tomorrow,
	ThisWeek,
	NextWeek,
	ThisMonth,
	NextMonth,
	Future,
	On(#[serde(with = "taskrank_domain::date_serde")] Date),
}
impl DueFilter {
	/// Parses a canonical due keyword or an ISO date.
	pub fn parse(value: &str) -> Option<Self> {
		let value = value.trim().to_lowercase().replace('_', "-");

		match value.as_str() {
			"any" | "all" => Some(Self::Any),
			"none" => Some(Self::None),
			"overdue" => Some(Self::Overdue),
			"today" => Some(Self::Today),
			"tomorrow" => Some(Self::Tomorrow),
			"week" | "this-week" => Some(Self::ThisWeek),
			"next-week" => Some(Self::NextWeek),
			"month" | "this-month" => Some(Self::ThisMonth),
			"next-month" => Some(Self::NextMonth),
			"future" => Some(Self::Future),
			raw if raw.len() == 10 => taskrank_domain::date_serde::parse(raw).map(Self::On),
			_ => None,
		}
	}

	/// Week and month windows roll forward from `today`, the same windows used for due
	/// buckets.
	pub fn matches(self, due: Option<Date>, today: Date) -> bool {
		let Some(due) = due else { return matches!(self, Self::None) };
		let days = (due - today).whole_days();

		match self {
			Self::Any => true,
			Self::None => false,
			Self::Overdue => days < 0,
			Self::Today => days == 0,
			Self::Tomorrow => days == 1,
			Self::ThisWeek => (0..=DueBucket::WEEK_DAYS).contains(&days),
			Self::NextWeek => (DueBucket::WEEK_DAYS + 1..=DueBucket::WEEK_DAYS * 2).contains(&days),
			Self::ThisMonth => (0..=DueBucket::MONTH_DAYS).contains(&days),
			Self::NextMonth =>
				(DueBucket::MONTH_DAYS + 1..=DueBucket::MONTH_DAYS * 2).contains(&days),
			Self::Future => days > DueBucket::MONTH_DAYS,
			Self::On(date) => due == date,
		}
	}
}

/// Deterministic query parsing. Holds everything derived from configuration once.
#[derive(Clone, Debug)]
pub struct QueryParser {
	/// Triggers of the configured languages, or of every language when none is configured.
	extractor: PropertyExtractor,
	/// One extractor per trigger language, used when the language is detected per query.
	per_language: BTreeMap<String, PropertyExtractor>,
	generic: GenericWords,
	languages: Vec<String>,
	vague_ratio: f32,
}
impl QueryParser {
	pub fn new(cfg: &Query, statuses: StatusTable) -> Self {
		let per_language = if cfg.languages.is_empty() {
			cfg.triggers
				.keys()
				.map(|lang| {
					let single = Query { languages: vec![lang.clone()], ..cfg.clone() };

					(lang.clone(), PropertyExtractor::new(&single, statuses.clone()))
				})
				.collect()
		} else {
			BTreeMap::new()
		};

		Self {
			extractor: PropertyExtractor::new(cfg, statuses),
			per_language,
			generic: GenericWords::new(&cfg.generic_words),
			languages: cfg.languages.clone(),
			vague_ratio: cfg.vague_ratio,
		}
	}

	/// Extractor for a resolved language list. Detected languages without triggers fall back
	/// to English.
	pub fn extractor_for(&self, languages: &[String]) -> &PropertyExtractor {
		if !self.languages.is_empty() {
			return &self.extractor;
		}

		languages
			.first()
			.and_then(|lang| self.per_language.get(lang))
			.or_else(|| self.per_language.get(LANG_ENGLISH))
			.unwrap_or(&self.extractor)
	}

	/// Extracts properties first; keywords come only from the text those expressions did not
	/// claim.
	pub fn parse(&self, raw: &str) -> QueryIntent {
		let languages = if self.languages.is_empty() {
			vec![language::detect_language(raw)]
		} else {
			self.languages.clone()
		};
		let extracted = self.extractor_for(&languages).extract(raw);
		let core_keywords = segment::segment(&extracted.residual);
		let vague = self.is_vague(&extracted.residual, &core_keywords);

		QueryIntent {
			raw: raw.to_string(),
			residual: extracted.residual,
			core_keywords,
			expanded_keywords: Vec::new(),
			properties: extracted.filters,
			vague,
			languages,
		}
	}

	/// A query is vague when generic terms make up at least `vague_ratio` of what remains
	/// after property extraction.
	pub fn is_vague(&self, residual: &str, core_keywords: &[String]) -> bool {
		if core_keywords.is_empty() {
			return false;
		}

		self.generic.generic_share(residual) >= self.vague_ratio
	}
}

fn path_has_folder(path: &str, wanted: &str) -> bool {
	let mut segments: Vec<&str> = path.split(['/', '\\']).collect();

	segments.pop();

	segments.iter().any(|segment| segment.contains(wanted))
}

fn tag_matches(tag: &str, wanted: &str) -> bool {
	tag == wanted || tag.strip_prefix(wanted).is_some_and(|rest| rest.starts_with('/'))
}

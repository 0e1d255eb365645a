//! Filter stages: structural match, stop-word suppression, quality threshold, and minimum
//! relevance.

use serde::Serialize;

use crate::{
	query::QueryIntent,
	ranking::scoring,
};
use taskrank_domain::lexicon::StopWords;

/// Keyword sets after stop-word suppression. `all` starts with the core keywords.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct KeywordSets {
	pub core: Vec<String>,
	pub all: Vec<String>,
}
impl KeywordSets {
	pub fn from_intent(intent: &QueryIntent, stop_words: &StopWords) -> Self {
		Self { core: stop_words.strip(&intent.core_keywords), all: stop_words.strip(&intent.all_keywords()) }
	}

	pub fn is_empty(&self) -> bool {
		self.all.is_empty()
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityMode {
	Adaptive,
	Explicit,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct QualityThreshold {
	pub mode: QualityMode,
	pub threshold: f32,
	pub adaptive_cutoff: f32,
	pub max_possible: f32,
}

/// Whether keywords should gate the result set.
///
/// A vague query that also names a property reads as "show me tasks with this property", so
/// its leftover words stop acting as a filter.
pub fn keyword_driven(intent: &QueryIntent, keywords: &KeywordSets) -> bool {
	!keywords.is_empty() && !(intent.vague && !intent.properties.is_empty())
}

pub fn contains_any_keyword(text: &str, keywords: &[String]) -> bool {
	keywords.iter().any(|keyword| text.contains(keyword.as_str()))
}

/// Share of the top observed composite a task must reach in adaptive mode. Longer keyword
/// lists spread matches thinner, so they get a stricter cutoff.
pub fn adaptive_ratio(keyword_count: usize) -> f32 {
	match keyword_count {
		0 => 0.0,
		1..=3 => 0.1,
		4..=7 => 0.15,
		8..=19 => 0.2,
		_ => 0.3,
	}
}

/// A zero fraction selects adaptive mode. A positive fraction is scaled by the max possible
/// score and never falls below the adaptive cutoff, so raising it can only remove tasks.
pub fn quality_threshold(
	fraction: f32,
	max_possible: f32,
	top_observed: Option<f32>,
	keyword_count: usize,
) -> QualityThreshold {
	let top = top_observed.filter(|score| score.is_finite()).unwrap_or(0.0).max(0.0);
	let adaptive_cutoff = adaptive_ratio(keyword_count) * top;

	if fraction > 0.0 {
		QualityThreshold {
			mode: QualityMode::Explicit,
			threshold: (fraction * max_possible).max(adaptive_cutoff),
			adaptive_cutoff,
			max_possible,
		}
	} else {
		QualityThreshold {
			mode: QualityMode::Adaptive,
			threshold: adaptive_cutoff,
			adaptive_cutoff,
			max_possible,
		}
	}
}

/// `None` when the stage does nothing: a zero fraction or a query not driven by keywords.
pub fn relevance_threshold(fraction: f32, core_bonus: f32, keyword_driven: bool) -> Option<f32> {
	if fraction <= 0.0 || !keyword_driven {
		return None;
	}

	Some(fraction * scoring::max_relevance(core_bonus))
}

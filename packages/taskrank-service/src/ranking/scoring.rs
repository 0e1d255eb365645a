//! Pure sub-score functions. The batch executor and the tests both call these.

use serde::Serialize;
use time::Date;

use crate::status::StatusTable;
use taskrank_config::{DueDateWeights, PriorityWeights, Scoring};
use taskrank_domain::{DueBucket, Priority, StatusCategory};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
	pub relevance: f32,
	pub due_date: f32,
	pub priority: f32,
	pub status: f32,
	pub composite: f32,
}

/// Share of `keywords` found in `text` by substring containment. `text` must already be
/// normalized.
pub fn match_ratio(text: &str, keywords: &[String]) -> f32 {
	if keywords.is_empty() {
		return 0.0;
	}

	let hits = keywords.iter().filter(|keyword| text.contains(keyword.as_str())).count();

	hits as f32 / keywords.len() as f32
}

/// `core_ratio * core_bonus + all_ratio`, bounded by `[0, core_bonus + 1]`.
pub fn relevance_score(text: &str, core: &[String], all: &[String], core_bonus: f32) -> f32 {
	match_ratio(text, core) * core_bonus + match_ratio(text, all)
}

pub fn max_relevance(core_bonus: f32) -> f32 {
	core_bonus + 1.0
}

pub fn due_bucket_weight(bucket: DueBucket, weights: &DueDateWeights) -> f32 {
	match bucket {
		DueBucket::Overdue => weights.overdue,
		DueBucket::Today => weights.today,
		DueBucket::ThisWeek => weights.this_week,
		DueBucket::ThisMonth => weights.this_month,
		DueBucket::Future => weights.future,
		DueBucket::None => weights.none,
	}
}

pub fn due_date_score(due: Option<Date>, today: Date, weights: &DueDateWeights) -> f32 {
	due_bucket_weight(DueBucket::classify(due, today), weights)
}

pub fn priority_score(priority: Priority, weights: &PriorityWeights) -> f32 {
	match priority {
		Priority::P1 => weights.p1,
		Priority::P2 => weights.p2,
		Priority::P3 => weights.p3,
		Priority::P4 => weights.p4,
		Priority::None => weights.none,
	}
}

pub fn status_score(status: &StatusCategory, statuses: &StatusTable) -> f32 {
	statuses.score(status)
}

pub fn composite_score(
	relevance: f32,
	due_date: f32,
	priority: f32,
	status: f32,
	scoring: &Scoring,
) -> f32 {
	relevance * scoring.relevance_coefficient
		+ due_date * scoring.due_date_coefficient
		+ priority * scoring.priority_coefficient
		+ status * scoring.status_coefficient
}

/// Highest composite any task could reach for this query. The relevance term only counts
/// when keywords drive the query.
pub fn max_possible_score(scoring: &Scoring, statuses: &StatusTable, keyword_driven: bool) -> f32 {
	let relevance = if keyword_driven { max_relevance(scoring.core_bonus) } else { 0.0 };

	composite_score(
		relevance,
		scoring.due_date.max(),
		scoring.priority.max(),
		statuses.max_score(),
		scoring,
	)
}

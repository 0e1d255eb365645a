pub mod executor;
pub mod filter;
pub mod scoring;
pub mod sort;

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{
	Error, Result, TaskRanker,
	query::{
		QueryIntent,
		expansion::{self, ExpansionRequest},
	},
};
use executor::{CancellationToken, ChunkRunner, ScoreArena, TaskColumns};
use filter::{KeywordSets, QualityThreshold};
use scoring::ScoreBreakdown;
use sort::SortKey;
use taskrank_domain::TaskRecord;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
	/// Deterministic parsing only.
	Simple,
	/// Deterministic parsing plus semantic expansion when an expander is configured.
	#[default]
	Smart,
	/// Smart, plus a longer result list handed to a conversational assistant.
	Chat,
}
impl SearchMode {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Simple => "simple",
			Self::Smart => "smart",
			Self::Chat => "chat",
		}
	}
}
impl FromStr for SearchMode {
	type Err = Error;

	fn from_str(value: &str) -> Result<Self> {
		match value.trim().to_ascii_lowercase().as_str() {
			"simple" => Ok(Self::Simple),
			"smart" => Ok(Self::Smart),
			"chat" => Ok(Self::Chat),
			other => Err(Error::InvalidRequest {
				message: format!("unknown search mode '{other}', expected simple, smart or chat."),
			}),
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionStatus {
	#[default]
	Skipped,
	Applied,
	FellBack,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterStage {
	Structural,
	Quality,
	Relevance,
}

#[derive(Clone, Debug, Default)]
pub struct RankRequest {
	pub query: String,
	pub tasks: Vec<TaskRecord>,
	pub mode: SearchMode,
	/// Reference day for due buckets. Defaults to the current UTC date.
	pub today: Option<Date>,
	pub display_limit: Option<usize>,
	pub ai_limit: Option<usize>,
	pub cancel: Option<CancellationToken>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RankedTask {
	pub task: TaskRecord,
	pub score: ScoreBreakdown,
}

#[derive(Clone, Debug, Serialize)]
pub struct RankResponse {
	pub query_id: Uuid,
	pub intent: QueryIntent,
	pub display: Vec<RankedTask>,
	/// Filled in chat mode only.
	pub for_ai: Vec<RankedTask>,
	pub total_matches: usize,
	pub diagnostics: RankDiagnostics,
}

/// Stage-by-stage account of one ranking pass.
#[derive(Clone, Debug, Serialize)]
pub struct RankDiagnostics {
	pub query_id: Uuid,
	pub mode: SearchMode,
	pub expansion: ExpansionStatus,
	pub keywords: KeywordSets,
	pub keyword_driven: bool,
	pub total_tasks: usize,
	pub after_structural: usize,
	pub after_quality: usize,
	pub after_relevance: usize,
	pub top_candidate_score: Option<f32>,
	pub quality: QualityThreshold,
	pub relevance_threshold: Option<f32>,
	/// First stage that emptied a non-empty set.
	pub eliminated_by: Option<FilterStage>,
	pub yields: usize,
}

/// Ordered snapshot positions with their scores.
#[derive(Clone, Debug, Serialize)]
pub struct Ranking {
	pub order: Vec<usize>,
	pub scores: Vec<ScoreBreakdown>,
	pub diagnostics: RankDiagnostics,
}

impl TaskRanker {
	pub async fn rank(&self, req: RankRequest) -> Result<RankResponse> {
		let query_id = Uuid::new_v4();
		let today = req.today.unwrap_or_else(|| OffsetDateTime::now_utc().date());
		let (intent, expansion) = self.resolve_intent(&req.query, req.mode, query_id).await;
		let mut ranking =
			self.rank_intent(&intent, &req.tasks, today, req.cancel.as_ref(), query_id).await?;

		ranking.diagnostics.mode = req.mode;
		ranking.diagnostics.expansion = expansion;

		let display_limit = req.display_limit.unwrap_or(self.cfg.filter.max_tasks_for_display);
		let ai_limit = match req.mode {
			SearchMode::Chat => req.ai_limit.unwrap_or(self.cfg.filter.max_tasks_for_ai),
			SearchMode::Simple | SearchMode::Smart => 0,
		};
		let ranked: Vec<RankedTask> = ranking
			.order
			.iter()
			.zip(&ranking.scores)
			.take(display_limit.max(ai_limit))
			.filter_map(|(&idx, &score)| {
				req.tasks.get(idx).map(|task| RankedTask { task: task.clone(), score })
			})
			.collect();
		let for_ai = ranked.iter().take(ai_limit).cloned().collect();
		let display = ranked.into_iter().take(display_limit).collect();

		tracing::info!(
			query_id = %query_id,
			mode = req.mode.as_str(),
			total_tasks = req.tasks.len(),
			matches = ranking.order.len(),
			"Ranked tasks."
		);

		Ok(RankResponse {
			query_id,
			intent,
			display,
			for_ai,
			total_matches: ranking.order.len(),
			diagnostics: ranking.diagnostics,
		})
	}

	/// Parses the query and, in smart and chat modes, asks the semantic expander to enrich
	/// it. Expander failure is never fatal: the deterministic intent is used as is.
	pub async fn resolve_intent(
		&self,
		raw: &str,
		mode: SearchMode,
		query_id: Uuid,
	) -> (QueryIntent, ExpansionStatus) {
		let intent = self.parser.parse(raw);
		let Some(expander) = self.expander.as_ref() else {
			return (intent, ExpansionStatus::Skipped);
		};

		if mode == SearchMode::Simple || intent.core_keywords.is_empty() {
			return (intent, ExpansionStatus::Skipped);
		}

		let request = ExpansionRequest::from_intent(&intent, self.cfg.query.max_expansions_per_keyword);

		match expander.expand(&request).await {
			Ok(response) => {
				tracing::debug!(
					query_id = %query_id,
					expanded = response.expanded_keywords.len(),
					consumed = response.consumed_keywords.len(),
					"Semantic expansion applied."
				);

				let merged = expansion::merge_expansion(
					&self.parser,
					intent,
					response,
					request.per_keyword_limit(),
				);

				(merged, ExpansionStatus::Applied)
			},
			Err(err) => {
				tracing::warn!(
					query_id = %query_id,
					error = %err,
					"Semantic expansion failed; falling back to unexpanded keywords."
				);

				(intent, ExpansionStatus::FellBack)
			},
		}
	}

	/// Runs filtering, scoring and sorting for an already resolved intent.
	pub async fn rank_intent(
		&self,
		intent: &QueryIntent,
		tasks: &[TaskRecord],
		today: Date,
		cancel: Option<&CancellationToken>,
		query_id: Uuid,
	) -> Result<Ranking> {
		let scoring_cfg = &self.cfg.scoring;
		let filter_cfg = &self.cfg.filter;
		let mut runner =
			ChunkRunner::new(self.scheduler.as_ref(), cancel, self.cfg.executor.chunk_size, query_id);
		let keywords = KeywordSets::from_intent(intent, &self.stop_words);
		let keyword_driven = filter::keyword_driven(intent, &keywords);
		let mut columns = TaskColumns::with_capacity(tasks.len());

		runner
			.for_each_chunk(tasks.len(), |range| {
				columns.extend_from(&tasks[range], &self.statuses, today)
			})
			.await?;

		let mut candidates = Vec::new();

		runner
			.for_each_chunk(tasks.len(), |range| {
				for idx in range {
					if !intent.properties.matches(columns.filter_fields(idx), today) {
						continue;
					}
					if keyword_driven && !filter::contains_any_keyword(&columns.text[idx], &keywords.all)
					{
						continue;
					}

					candidates.push(idx);
				}
			})
			.await?;

		let after_structural = candidates.len();
		let mut arena = ScoreArena::new(tasks.len());

		runner
			.for_each_chunk(candidates.len(), |range| {
				arena.score_batch(&candidates[range], &columns, &keywords, scoring_cfg)
			})
			.await?;

		let top_score = candidates
			.iter()
			.map(|&idx| arena.composite[idx])
			.filter(|score| score.is_finite())
			.reduce(f32::max);
		let max_possible =
			scoring::max_possible_score(scoring_cfg, &self.statuses, keyword_driven);
		let quality = filter::quality_threshold(
			filter_cfg.quality_fraction,
			max_possible,
			top_score,
			if keyword_driven { keywords.all.len() } else { 0 },
		);
		let relevance_threshold = filter::relevance_threshold(
			filter_cfg.min_relevance_fraction,
			scoring_cfg.core_bonus,
			keyword_driven,
		);
		let mut after_quality = 0_usize;
		let mut kept = Vec::with_capacity(candidates.len());

		runner
			.for_each_chunk(candidates.len(), |range| {
				for &idx in &candidates[range] {
					if arena.composite[idx] < quality.threshold {
						continue;
					}

					after_quality += 1;

					if relevance_threshold.is_some_and(|min| arena.relevance[idx] < min) {
						continue;
					}

					kept.push(idx);
				}
			})
			.await?;

		let after_relevance = kept.len();

		runner.check()?;

		let key = |idx: usize| SortKey {
			composite: arena.composite[idx],
			relevance: arena.relevance[idx],
			due: columns.due[idx],
			priority: columns.priority[idx],
			status_order: columns.status_order[idx],
			created: columns.created[idx],
			text: columns.text[idx].as_str(),
		};

		// `sort_by` is stable, so full ties keep snapshot order.
		kept.sort_by(|&a, &b| self.sort_spec.compare(&key(a), &key(b)));

		let scores = kept.iter().map(|&idx| arena.breakdown(idx)).collect();
		let eliminated_by = if tasks.is_empty() {
			None
		} else if after_structural == 0 {
			Some(FilterStage::Structural)
		} else if after_quality == 0 {
			Some(FilterStage::Quality)
		} else if after_relevance == 0 {
			Some(FilterStage::Relevance)
		} else {
			None
		};

		tracing::debug!(
			query_id = %query_id,
			total = tasks.len(),
			after_structural,
			after_quality,
			after_relevance,
			threshold = quality.threshold,
			keyword_driven,
			"Filter stages complete."
		);

		if let Some(stage) = eliminated_by {
			tracing::debug!(query_id = %query_id, stage = ?stage, "All tasks filtered out.");
		}

		Ok(Ranking {
			order: kept,
			scores,
			diagnostics: RankDiagnostics {
				query_id,
				mode: SearchMode::default(),
				expansion: ExpansionStatus::default(),
				keywords,
				keyword_driven,
				total_tasks: tasks.len(),
				after_structural,
				after_quality,
				after_relevance,
				top_candidate_score: top_score,
				quality,
				relevance_threshold,
				eliminated_by,
				yields: runner.yields(),
			},
		})
	}
}

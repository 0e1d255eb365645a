//! Column-oriented, chunked execution.
//!
//! Task fields are copied once into flat arrays and every sub-score is computed by a tight
//! loop over one array. Work is cut into chunks; between chunks the runner yields to the host
//! scheduler and checks for cancellation, so a large snapshot never monopolizes the thread.

use std::{
	ops::Range,
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
};

use time::Date;
use uuid::Uuid;

use crate::{
	BoxFuture, Error, Result,
	query::{FilterFields, TaskLocation},
	ranking::{
		filter::KeywordSets,
		scoring::{self, ScoreBreakdown},
	},
	status::StatusTable,
};
use taskrank_config::{DueDateWeights, PriorityWeights, Scoring};
use taskrank_domain::{DueBucket, Priority, StatusCategory, TaskRecord, segment};

/// Host capability for giving control back between chunks.
pub trait Scheduler
where
	Self: Send + Sync,
{
	fn yield_now(&self) -> BoxFuture<'_, ()>;
}

/// Never yields. For hosts with nothing else to run.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopScheduler;
impl Scheduler for NoopScheduler {
	fn yield_now(&self) -> BoxFuture<'_, ()> {
		Box::pin(std::future::ready(()))
	}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TokioScheduler;
impl Scheduler for TokioScheduler {
	fn yield_now(&self) -> BoxFuture<'_, ()> {
		Box::pin(tokio::task::yield_now())
	}
}

/// Shared flag a host flips to abandon an in-flight query.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
	flag: Arc<AtomicBool>,
}
impl CancellationToken {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.flag.store(true, Ordering::Release);
	}

	pub fn is_cancelled(&self) -> bool {
		self.flag.load(Ordering::Acquire)
	}
}

pub struct ChunkRunner<'a> {
	scheduler: &'a dyn Scheduler,
	cancel: Option<&'a CancellationToken>,
	chunk_size: usize,
	query_id: Uuid,
	yields: usize,
}
impl<'a> ChunkRunner<'a> {
	pub fn new(
		scheduler: &'a dyn Scheduler,
		cancel: Option<&'a CancellationToken>,
		chunk_size: usize,
		query_id: Uuid,
	) -> Self {
		Self { scheduler, cancel, chunk_size: chunk_size.max(1), query_id, yields: 0 }
	}

	pub fn yields(&self) -> usize {
		self.yields
	}

	pub fn check(&self) -> Result<()> {
		if self.cancel.is_some_and(CancellationToken::is_cancelled) {
			tracing::info!(query_id = %self.query_id, "Ranking cancelled.");

			return Err(Error::Cancelled { query_id: self.query_id });
		}

		Ok(())
	}

	/// Calls `f` once per chunk of `0..len`, yielding and checking for cancellation between
	/// chunks.
	pub async fn for_each_chunk<F>(&mut self, len: usize, mut f: F) -> Result<()>
	where
		F: FnMut(Range<usize>),
	{
		let mut start = 0_usize;

		while start < len {
			self.check()?;

			let end = start.saturating_add(self.chunk_size).min(len);

			f(start..end);

			start = end;

			if start < len {
				self.scheduler.yield_now().await;

				self.yields += 1;
			}
		}

		self.check()
	}
}

/// Flat per-field arrays, indexed by snapshot position.
#[derive(Clone, Debug, Default)]
pub struct TaskColumns {
	/// Normalized text used for keyword containment and alphabetical order.
	pub text: Vec<String>,
	pub due: Vec<Option<Date>>,
	pub due_bucket: Vec<DueBucket>,
	pub priority: Vec<Priority>,
	pub status: Vec<StatusCategory>,
	pub status_score: Vec<f32>,
	pub status_order: Vec<u32>,
	pub created: Vec<Option<Date>>,
	pub location: Vec<TaskLocation>,
}
impl TaskColumns {
	pub fn with_capacity(len: usize) -> Self {
		Self {
			text: Vec::with_capacity(len),
			due: Vec::with_capacity(len),
			due_bucket: Vec::with_capacity(len),
			priority: Vec::with_capacity(len),
			status: Vec::with_capacity(len),
			status_score: Vec::with_capacity(len),
			status_order: Vec::with_capacity(len),
			created: Vec::with_capacity(len),
			location: Vec::with_capacity(len),
		}
	}

	pub fn extend_from(&mut self, tasks: &[TaskRecord], statuses: &StatusTable, today: Date) {
		for task in tasks {
			let status = statuses.entry(&task.status);

			self.text.push(segment::normalize(&task.text));
			self.due.push(task.due);
			self.due_bucket.push(DueBucket::classify(task.due, today));
			self.priority.push(task.priority);
			self.status.push(task.status.clone());
			self.status_score.push(status.score);
			self.status_order.push(status.order);
			self.created.push(task.created);
			self.location.push(TaskLocation::from_task(task));
		}
	}

	pub fn filter_fields(&self, idx: usize) -> FilterFields<'_> {
		FilterFields {
			priority: self.priority[idx],
			status: &self.status[idx],
			due: self.due[idx],
			location: &self.location[idx],
		}
	}
}

/// Sub-scores for one query, one slot per snapshot position. Only candidate slots are
/// written.
#[derive(Clone, Debug, Default)]
pub struct ScoreArena {
	pub relevance: Vec<f32>,
	pub due_date: Vec<f32>,
	pub priority: Vec<f32>,
	pub status: Vec<f32>,
	pub composite: Vec<f32>,
}
impl ScoreArena {
	pub fn new(len: usize) -> Self {
		Self {
			relevance: vec![0.0; len],
			due_date: vec![0.0; len],
			priority: vec![0.0; len],
			status: vec![0.0; len],
			composite: vec![0.0; len],
		}
	}

	pub fn breakdown(&self, slot: usize) -> ScoreBreakdown {
		ScoreBreakdown {
			relevance: self.relevance[slot],
			due_date: self.due_date[slot],
			priority: self.priority[slot],
			status: self.status[slot],
			composite: self.composite[slot],
		}
	}

	/// Scores every slot in `slots`, one component at a time.
	pub fn score_batch(
		&mut self,
		slots: &[usize],
		columns: &TaskColumns,
		keywords: &KeywordSets,
		scoring: &Scoring,
	) {
		relevance_batch(slots, &columns.text, keywords, scoring.core_bonus, &mut self.relevance);
		due_date_batch(slots, &columns.due_bucket, &scoring.due_date, &mut self.due_date);
		priority_batch(slots, &columns.priority, &scoring.priority, &mut self.priority);
		status_batch(slots, &columns.status_score, &mut self.status);

		for &slot in slots {
			self.composite[slot] = scoring::composite_score(
				self.relevance[slot],
				self.due_date[slot],
				self.priority[slot],
				self.status[slot],
				scoring,
			);
		}
	}
}

pub fn relevance_batch(
	slots: &[usize],
	text: &[String],
	keywords: &KeywordSets,
	core_bonus: f32,
	out: &mut [f32],
) {
	if keywords.is_empty() {
		for &slot in slots {
			out[slot] = 0.0;
		}

		return;
	}

	for &slot in slots {
		out[slot] = scoring::relevance_score(&text[slot], &keywords.core, &keywords.all, core_bonus);
	}
}

pub fn due_date_batch(
	slots: &[usize],
	buckets: &[DueBucket],
	weights: &DueDateWeights,
	out: &mut [f32],
) {
	for &slot in slots {
		out[slot] = scoring::due_bucket_weight(buckets[slot], weights);
	}
}

pub fn priority_batch(
	slots: &[usize],
	priorities: &[Priority],
	weights: &PriorityWeights,
	out: &mut [f32],
) {
	for &slot in slots {
		out[slot] = scoring::priority_score(priorities[slot], weights);
	}
}

pub fn status_batch(slots: &[usize], status_scores: &[f32], out: &mut [f32]) {
	for &slot in slots {
		out[slot] = status_scores[slot];
	}
}

#[cfg(test)]
mod tests {
	use time::macros::date;

	use super::*;
	use taskrank_config::Status;

	#[tokio::test]
	async fn runner_visits_every_index_once() {
		let scheduler = NoopScheduler;
		let mut runner = ChunkRunner::new(&scheduler, None, 3, Uuid::nil());
		let mut seen = Vec::new();

		runner.for_each_chunk(8, |range| seen.extend(range)).await.expect("run failed");

		assert_eq!(seen, (0..8).collect::<Vec<_>>());
		assert_eq!(runner.yields(), 2);
	}

	#[tokio::test]
	async fn zero_chunk_size_is_treated_as_one() {
		let scheduler = NoopScheduler;
		let mut runner = ChunkRunner::new(&scheduler, None, 0, Uuid::nil());
		let mut calls = 0;

		runner.for_each_chunk(3, |_| calls += 1).await.expect("run failed");

		assert_eq!(calls, 3);
	}

	#[tokio::test]
	async fn cancelled_runner_stops_with_an_error() {
		let scheduler = TokioScheduler;
		let token = CancellationToken::new();
		let mut runner = ChunkRunner::new(&scheduler, Some(&token), 2, Uuid::nil());
		let mut calls = 0;
		let result = runner
			.for_each_chunk(10, |_| {
				calls += 1;

				if calls == 2 {
					token.cancel();
				}
			})
			.await;

		assert!(matches!(result, Err(Error::Cancelled { .. })));
		assert_eq!(calls, 2);
	}

	#[test]
	fn columns_carry_status_score_and_order_separately() {
		let statuses = StatusTable::from_config(&Status::default());
		let mut task = TaskRecord::new("Done thing");

		task.status = StatusCategory::Completed;
		task.folder = "Work/Q3".to_string();
		task.tags = vec!["#Release".to_string()];

		let mut columns = TaskColumns::with_capacity(1);

		columns.extend_from(&[task], &statuses, date!(2026 - 03 - 10));

		assert_eq!(columns.text, vec!["done thing"]);
		assert_eq!(columns.status_score, vec![0.2]);
		assert_eq!(columns.status_order, vec![6]);
		assert_eq!(columns.due_bucket, vec![DueBucket::None]);
		assert_eq!(columns.location[0].folder, "work/q3");
		assert_eq!(columns.location[0].tags, vec!["release"]);
		assert_eq!(columns.filter_fields(0).status, &StatusCategory::Completed);
	}
}

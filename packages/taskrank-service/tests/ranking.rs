use std::{collections::HashSet, sync::Arc};

use time::{Date, Duration, macros::date};
use uuid::Uuid;

use taskrank_config::Config;
use taskrank_domain::{Priority, StatusCategory, TaskRecord, segment};
use taskrank_service::{
	BoxFuture, CancellationToken, Error, FilterFields, FilterStage, NoopScheduler, QueryIntent,
	RankRequest, Scheduler, SearchMode, TaskLocation, TaskRanker,
	ranking::{
		filter::{self, KeywordSets},
		scoring,
		sort::SortKey,
	},
};

const TODAY: Date = date!(2026 - 03 - 10);

fn ranker(cfg: Config) -> TaskRanker {
	TaskRanker::new(cfg).with_scheduler(Arc::new(NoopScheduler))
}

fn task(line: u32, text: &str) -> TaskRecord {
	let mut task = TaskRecord::new(text);

	task.line = line;

	task
}

fn synthetic_tasks(count: usize) -> Vec<TaskRecord> {
	let words = ["report", "fix", "bug", "payment", "login", "review", "write", "plan", "call", "email"];
	let mut state: u64 = 0x5eed;

	(0..count)
		.map(|idx| {
			state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);

			let a = (state >> 33) as usize;
			let mut task = task(
				idx as u32,
				&format!("{} {} item", words[a % words.len()], words[(a / 7) % words.len()]),
			);

			task.priority = Priority::from_level((a % 5) as u8);
			task.due = match a % 6 {
				0 => None,
				n => Some(TODAY + Duration::days(n as i64 * 5 - 12)),
			};
			task.status = match a % 4 {
				0 => StatusCategory::Open,
				1 => StatusCategory::InProgress,
				2 => StatusCategory::Completed,
				_ => StatusCategory::Cancelled,
			};
			task.created = Some(date!(2026 - 01 - 01) + Duration::days((a % 60) as i64));

			task
		})
		.collect()
}

/// Straight-line reimplementation of the pipeline, one task at a time.
fn naive_rank(ranker: &TaskRanker, intent: &QueryIntent, tasks: &[TaskRecord]) -> Vec<(usize, f32)> {
	let cfg = &ranker.cfg;
	let keywords = KeywordSets::from_intent(intent, ranker.stop_words());
	let driven = filter::keyword_driven(intent, &keywords);
	let texts: Vec<String> = tasks.iter().map(|task| segment::normalize(&task.text)).collect();
	let mut scored = Vec::new();

	for (idx, task) in tasks.iter().enumerate() {
		let location = TaskLocation::from_task(task);
		let fields = FilterFields {
			priority: task.priority,
			status: &task.status,
			due: task.due,
			location: &location,
		};

		if !intent.properties.matches(fields, TODAY) {
			continue;
		}
		if driven && !filter::contains_any_keyword(&texts[idx], &keywords.all) {
			continue;
		}

		let relevance =
			scoring::relevance_score(&texts[idx], &keywords.core, &keywords.all, cfg.scoring.core_bonus);
		let due = scoring::due_date_score(task.due, TODAY, &cfg.scoring.due_date);
		let priority = scoring::priority_score(task.priority, &cfg.scoring.priority);
		let status = scoring::status_score(&task.status, ranker.statuses());
		let composite = scoring::composite_score(relevance, due, priority, status, &cfg.scoring);

		scored.push((idx, relevance, composite));
	}

	let top = scored.iter().map(|(_, _, composite)| *composite).reduce(f32::max);
	let max_possible = scoring::max_possible_score(&cfg.scoring, ranker.statuses(), driven);
	let quality = filter::quality_threshold(
		cfg.filter.quality_fraction,
		max_possible,
		top,
		if driven { keywords.all.len() } else { 0 },
	);
	let min_relevance = filter::relevance_threshold(
		cfg.filter.min_relevance_fraction,
		cfg.scoring.core_bonus,
		driven,
	);

	scored.retain(|(_, relevance, composite)| {
		*composite >= quality.threshold && min_relevance.is_none_or(|min| *relevance >= min)
	});
	scored.sort_by(|a, b| {
		let key = |(idx, relevance, composite): (usize, f32, f32)| SortKey {
			composite,
			relevance,
			due: tasks[idx].due,
			priority: tasks[idx].priority,
			status_order: ranker.statuses().order(&tasks[idx].status),
			created: tasks[idx].created,
			text: texts[idx].as_str(),
		};

		ranker.sort_spec().compare(&key(*a), &key(*b))
	});

	scored.into_iter().map(|(idx, _, composite)| (idx, composite)).collect()
}

async fn lines(ranker: &TaskRanker, query: &str, tasks: &[TaskRecord]) -> Vec<u32> {
	let response = ranker
		.rank(RankRequest {
			query: query.to_string(),
			tasks: tasks.to_vec(),
			today: Some(TODAY),
			display_limit: Some(usize::MAX),
			..Default::default()
		})
		.await
		.expect("rank failed");

	response.display.iter().map(|ranked| ranked.task.line).collect()
}

#[tokio::test]
async fn chunked_execution_matches_naive_ranking() {
	let tasks = synthetic_tasks(240);

	for query in ["fix report p:1,2,3", "", "review the plan", "due:week bug"] {
		for chunk_size in [1, 7, tasks.len()] {
			let mut cfg = Config::default();

			cfg.executor.chunk_size = chunk_size;
			cfg.filter.quality_fraction = 0.2;
			cfg.filter.min_relevance_fraction = 0.3;
			cfg.sort.criteria = ["relevance", "due_date", "priority", "status", "created", "alphabetical"]
				.iter()
				.map(|name| name.to_string())
				.collect();

			let ranker = ranker(cfg);
			let intent = ranker.parse_query(query);
			let ranking = ranker
				.rank_intent(&intent, &tasks, TODAY, None, Uuid::nil())
				.await
				.expect("rank failed");
			let chunked: Vec<(usize, f32)> = ranking
				.order
				.iter()
				.zip(&ranking.scores)
				.map(|(&idx, score)| (idx, score.composite))
				.collect();

			assert_eq!(chunked, naive_rank(&ranker, &intent, &tasks), "query {query:?}, chunk {chunk_size}");
		}
	}
}

#[tokio::test]
async fn raising_the_quality_fraction_only_removes_tasks() {
	let tasks = synthetic_tasks(400);
	let mut previous: Option<HashSet<u32>> = None;

	for fraction in [0.0, 0.1, 0.3, 0.5, 0.7, 0.9] {
		let mut cfg = Config::default();

		cfg.filter.quality_fraction = fraction;

		let current: HashSet<u32> = lines(&ranker(cfg), "fix payment", &tasks).await.into_iter().collect();

		if let Some(previous) = &previous {
			assert!(current.is_subset(previous), "fraction {fraction} added tasks");
		}

		previous = Some(current);
	}
}

#[tokio::test]
async fn ranking_is_deterministic() {
	let tasks = synthetic_tasks(300);
	let ranker = ranker(Config::default());
	let first = ranker
		.rank(RankRequest {
			query: "write report".to_string(),
			tasks: tasks.clone(),
			today: Some(TODAY),
			..Default::default()
		})
		.await
		.expect("rank failed");
	let second = ranker
		.rank(RankRequest {
			query: "write report".to_string(),
			tasks,
			today: Some(TODAY),
			..Default::default()
		})
		.await
		.expect("rank failed");
	let view = |response: &taskrank_service::RankResponse| {
		response.display.iter().map(|ranked| (ranked.task.line, ranked.score)).collect::<Vec<_>>()
	};

	assert_eq!(view(&first), view(&second));
	assert_ne!(first.query_id, second.query_id);
}

#[tokio::test]
async fn min_relevance_is_a_no_op_without_keywords() {
	let tasks = synthetic_tasks(200);
	let mut strict = Config::default();

	strict.filter.min_relevance_fraction = 0.9;

	let relaxed = lines(&ranker(Config::default()), "p2", &tasks).await;
	let filtered = lines(&ranker(strict), "p2", &tasks).await;

	assert!(!relaxed.is_empty());
	assert_eq!(relaxed, filtered);
}

#[tokio::test]
async fn negative_coefficients_are_clamped_before_ranking() {
	let mut cfg = Config::default();

	cfg.scoring.priority_coefficient = -5.0;

	let ranker = ranker(cfg);
	let mut urgent = task(0, "Pay rent");

	urgent.priority = Priority::P1;

	let tasks = vec![urgent, task(1, "Call bank")];
	let mut ranked = lines(&ranker, "", &tasks).await;

	ranked.sort_unstable();

	assert_eq!(ranker.cfg.scoring.priority_coefficient, 0.0);
	assert_eq!(ranked, vec![0, 1]);
}

#[tokio::test]
async fn relative_due_queries_work_at_the_last_representable_date() {
	let today = date!(9999 - 12 - 31);
	let mut due_today = task(0, "Archive logs");

	due_today.due = Some(today);

	let response = ranker(Config::default())
		.rank(RankRequest {
			query: "due:tomorrow".to_string(),
			tasks: vec![due_today, task(1, "Rotate keys")],
			today: Some(today),
			..Default::default()
		})
		.await
		.expect("rank failed");

	assert!(response.display.is_empty());
	assert_eq!(response.diagnostics.eliminated_by, Some(FilterStage::Structural));
}

#[tokio::test]
async fn location_filters_read_extracted_columns() {
	let mut in_work = task(0, "Draft roadmap");
	let mut tagged = task(1, "Draft budget");

	in_work.path = "Work/Planning.md".to_string();
	in_work.folder = "Work".to_string();
	tagged.note_tags = vec!["#Finance".to_string()];

	let tasks = vec![in_work, tagged, task(2, "Draft letter")];
	let ranker = ranker(Config::default());

	assert_eq!(lines(&ranker, "folder:work", &tasks).await, vec![0]);
	assert_eq!(lines(&ranker, "#finance", &tasks).await, vec![1]);
	assert_eq!(lines(&ranker, "note:planning", &tasks).await, vec![0]);
}

#[tokio::test]
async fn full_ties_keep_snapshot_order() {
	let tasks: Vec<TaskRecord> =
		["delta", "alpha", "charlie", "bravo"].iter().enumerate().map(|(idx, text)| task(idx as u32, text)).collect();

	assert_eq!(lines(&ranker(Config::default()), "", &tasks).await, vec![0, 1, 2, 3]);

	let mut cfg = Config::default();

	cfg.sort.criteria = vec!["alphabetical".to_string()];

	assert_eq!(lines(&ranker(cfg), "", &tasks).await, vec![1, 3, 2, 0]);
}

#[tokio::test]
async fn property_only_query_returns_the_single_match() {
	let yesterday = TODAY - Duration::days(1);
	let mut tasks = Vec::new();
	let mut target = task(0, "Renew passport");

	target.priority = Priority::P1;
	target.due = Some(yesterday);
	target.status = StatusCategory::Open;
	tasks.push(target);

	for line in 1..10_u32 {
		let mut other = task(line, &format!("Unrelated chore {line}"));

		match line % 3 {
			0 => {
				other.priority = Priority::P1;
				other.due = Some(TODAY);
			},
			1 => {
				other.priority = Priority::P1;
				other.due = Some(yesterday);
				other.status = StatusCategory::Completed;
			},
			_ => {
				other.priority = Priority::P2;
				other.due = Some(yesterday);
			},
		}

		tasks.push(other);
	}

	for fraction in [0.0, 0.5, 1.0] {
		let mut cfg = Config::default();

		cfg.filter.min_relevance_fraction = fraction;

		assert_eq!(lines(&ranker(cfg), "p1 overdue s:open", &tasks).await, vec![0]);
	}
}

#[tokio::test]
async fn adaptive_mode_keeps_results_for_large_sets() {
	let tasks = synthetic_tasks(5_000);
	let response = ranker(Config::default())
		.rank(RankRequest {
			query: "review".to_string(),
			tasks,
			today: Some(TODAY),
			..Default::default()
		})
		.await
		.expect("rank failed");

	assert!(response.diagnostics.top_candidate_score.is_some_and(|score| score > 0.0));
	assert!(!response.display.is_empty());
	assert!(response.display.len() <= 50);
	assert!(response.total_matches >= response.display.len());
}

#[tokio::test]
async fn vague_query_with_a_property_ignores_its_words() {
	let mut a = task(0, "Pay rent");
	let mut b = task(1, "Call the bank");
	let c = task(2, "Water plants");

	a.priority = Priority::P1;
	b.priority = Priority::P1;

	let ranker = ranker(Config::default());
	let intent = ranker.parse_query("what should I do p1");

	assert!(intent.vague);

	let mut found = lines(&ranker, "what should I do p1", &[a, b, c]).await;

	found.sort_unstable();

	assert_eq!(found, vec![0, 1]);
}

#[tokio::test]
async fn trigger_words_without_values_remain_keywords() {
	let tasks = vec![task(0, "Payment priority system rollout"), task(1, "Unrelated")];
	let ranker = ranker(Config::default());
	let intent = ranker.parse_query("payment priority system");

	assert!(intent.properties.is_empty());
	assert!(intent.core_keywords.contains(&"priority".to_string()));
	assert_eq!(lines(&ranker, "payment priority system", &tasks).await, vec![0]);
}

#[tokio::test]
async fn empty_results_report_the_eliminating_stage() {
	let tasks = vec![task(0, "Plan trip"), task(1, "Book hotel")];
	let response = ranker(Config::default())
		.rank(RankRequest {
			query: "p1".to_string(),
			tasks,
			today: Some(TODAY),
			..Default::default()
		})
		.await
		.expect("rank failed");

	assert!(response.display.is_empty());
	assert_eq!(response.diagnostics.after_structural, 0);
	assert_eq!(response.diagnostics.eliminated_by, Some(FilterStage::Structural));
}

#[tokio::test]
async fn chat_mode_fills_the_ai_list() {
	let tasks = synthetic_tasks(300);
	let request = |mode| RankRequest {
		query: "item".to_string(),
		tasks: tasks.clone(),
		mode,
		today: Some(TODAY),
		display_limit: Some(5),
		ai_limit: Some(20),
		..Default::default()
	};
	let ranker = ranker(Config::default());
	let chat = ranker.rank(request(SearchMode::Chat)).await.expect("rank failed");
	let smart = ranker.rank(request(SearchMode::Smart)).await.expect("rank failed");

	assert_eq!(chat.display.len(), 5);
	assert_eq!(chat.for_ai.len(), 20);
	assert_eq!(chat.for_ai[0].task.line, chat.display[0].task.line);
	assert!(smart.for_ai.is_empty());
}

#[tokio::test]
async fn cancelled_queries_return_no_results() {
	let token = CancellationToken::new();

	token.cancel();

	let result = ranker(Config::default())
		.rank(RankRequest {
			query: "fix".to_string(),
			tasks: synthetic_tasks(50),
			today: Some(TODAY),
			cancel: Some(token),
			..Default::default()
		})
		.await;

	assert!(matches!(result, Err(Error::Cancelled { .. })));
}

struct CancelOnYield {
	token: CancellationToken,
}
impl Scheduler for CancelOnYield {
	fn yield_now(&self) -> BoxFuture<'_, ()> {
		self.token.cancel();

		Box::pin(std::future::ready(()))
	}
}

#[tokio::test]
async fn cancellation_is_observed_at_the_next_chunk_boundary() {
	let token = CancellationToken::new();
	let mut cfg = Config::default();

	cfg.executor.chunk_size = 10;

	let ranker =
		TaskRanker::new(cfg).with_scheduler(Arc::new(CancelOnYield { token: token.clone() }));
	let result = ranker
		.rank(RankRequest {
			query: "fix".to_string(),
			tasks: synthetic_tasks(100),
			today: Some(TODAY),
			cancel: Some(token),
			..Default::default()
		})
		.await;

	assert!(matches!(result, Err(Error::Cancelled { .. })));
}

#[derive(Default)]
struct CountingScheduler {
	yields: std::sync::atomic::AtomicUsize,
}
impl Scheduler for CountingScheduler {
	fn yield_now(&self) -> BoxFuture<'_, ()> {
		self.yields.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

		Box::pin(tokio::task::yield_now())
	}
}

#[tokio::test]
async fn large_snapshots_yield_between_chunks() {
	let scheduler = Arc::new(CountingScheduler::default());
	let mut cfg = Config::default();

	cfg.executor.chunk_size = 64;

	let ranker = TaskRanker::new(cfg).with_scheduler(scheduler.clone());
	let response = ranker
		.rank(RankRequest {
			query: String::new(),
			tasks: synthetic_tasks(1_000),
			today: Some(TODAY),
			..Default::default()
		})
		.await
		.expect("rank failed");
	let observed = scheduler.yields.load(std::sync::atomic::Ordering::SeqCst);

	// Four passes over 1000 tasks in chunks of 64: 15 yields each.
	assert_eq!(observed, 60);
	assert_eq!(response.diagnostics.yields, observed);
}

use std::fs;

use clap::Parser;
use time::macros::date;

use taskrank::{Args, load_tasks, render_table};
use taskrank_config::Config;
use taskrank_service::{RankRequest, SearchMode, TaskRanker};

fn write_snapshot(name: &str, body: &str) -> std::path::PathBuf {
	let path = std::env::temp_dir().join(format!("taskrank-{}-{name}.json", std::process::id()));

	fs::write(&path, body).expect("Failed to write snapshot.");

	path
}

#[test]
fn parses_every_flag() {
	let args = Args::try_parse_from([
		"taskrank",
		"--config",
		"cfg.toml",
		"--tasks",
		"tasks.json",
		"--query",
		"p1 overdue",
		"--mode",
		"chat",
		"--limit",
		"5",
		"--ai-limit",
		"20",
		"--today",
		"2026-03-10",
		"--json",
	])
	.expect("Failed to parse args.");

	assert_eq!(args.mode, SearchMode::Chat);
	assert_eq!(args.limit, Some(5));
	assert_eq!(args.ai_limit, Some(20));
	assert_eq!(args.today, Some(date!(2026 - 03 - 10)));
	assert!(args.json);
}

#[test]
fn rejects_unknown_modes_and_bad_dates() {
	assert!(Args::try_parse_from(["taskrank", "-t", "t.json", "--mode", "fuzzy"]).is_err());
	assert!(Args::try_parse_from(["taskrank", "-t", "t.json", "--today", "soon"]).is_err());
}

#[test]
fn loads_plain_and_wrapped_snapshots() {
	let plain = write_snapshot("plain", r#"[{"text": "Pay rent", "priority": 1}]"#);
	let wrapped = write_snapshot("wrapped", r#"{"tasks": [{"text": "Pay rent"}, {"text": "Call mom"}]}"#);

	assert_eq!(load_tasks(&plain).expect("load failed").len(), 1);
	assert_eq!(load_tasks(&wrapped).expect("load failed").len(), 2);

	let _ = fs::remove_file(plain);
	let _ = fs::remove_file(wrapped);
}

#[test]
fn wrongly_typed_task_fields_keep_the_snapshot() {
	let path = write_snapshot(
		"lenient",
		r#"{"tasks": [{"text": "Pay rent", "status": null, "due": 20260101}, {"text": "Call mom", "line": -1}]}"#,
	);
	let tasks = load_tasks(&path).expect("load failed");

	assert_eq!(tasks.len(), 2);
	assert_eq!(tasks[0].due, None);
	assert_eq!(tasks[1].line, 0);

	let _ = fs::remove_file(path);
}

#[test]
fn malformed_snapshots_are_errors() {
	let path = write_snapshot("broken", "{ not json");

	assert!(load_tasks(&path).is_err());

	let _ = fs::remove_file(path);
}

#[tokio::test]
async fn table_lists_tasks_or_explains_an_empty_result() {
	let tasks: Vec<taskrank_domain::TaskRecord> = serde_json::from_value(serde_json::json!([
		{ "text": "Pay rent", "priority": 1, "due": "2026-03-09", "path": "Home.md", "line": 3 },
		{ "text": "Water plants" }
	]))
	.expect("Failed to parse tasks.");
	let ranker = TaskRanker::new(Config::default());
	let request = |query: &str| RankRequest {
		query: query.to_string(),
		tasks: tasks.clone(),
		today: Some(date!(2026 - 03 - 10)),
		..Default::default()
	};
	let listed = render_table(&ranker.rank(request("p1")).await.expect("rank failed"));
	let empty = render_table(&ranker.rank(request("p3")).await.expect("rank failed"));

	assert!(listed.contains("Pay rent"));
	assert!(listed.contains("(Home.md:3)"));
	assert!(listed.contains("1 of 1 matching tasks shown."));
	assert!(empty.starts_with("No matching tasks (2 checked). Removed at: structural."));
}

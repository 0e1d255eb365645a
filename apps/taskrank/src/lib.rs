use std::{
	fmt::Write as _,
	fs,
	path::{Path, PathBuf},
};

use clap::Parser;
use color_eyre::eyre;
use serde::Deserialize;
use time::Date;
use tracing_subscriber::EnvFilter;

use taskrank_config::Config;
use taskrank_domain::{TaskRecord, date_serde};
use taskrank_service::{RankRequest, RankResponse, RankedTask, SearchMode, TaskRanker};

#[derive(Debug, Parser)]
#[command(
	version = taskrank_cli::VERSION,
	rename_all = "kebab",
	styles = taskrank_cli::styles(),
)]
pub struct Args {
	/// TOML configuration. Built-in defaults apply when omitted.
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: Option<PathBuf>,
	/// JSON task snapshot: an array of tasks or an object with a "tasks" array.
	#[arg(long, short = 't', value_name = "FILE")]
	pub tasks: PathBuf,
	#[arg(long, short = 'q', value_name = "QUERY", default_value = "")]
	pub query: String,
	#[arg(long, short = 'm', value_name = "MODE", default_value = "smart", value_parser = parse_mode)]
	pub mode: SearchMode,
	#[arg(long, value_name = "N")]
	pub limit: Option<usize>,
	#[arg(long, value_name = "N")]
	pub ai_limit: Option<usize>,
	/// Reference date for due buckets. Defaults to today in UTC.
	#[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
	pub today: Option<Date>,
	#[arg(long)]
	pub json: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TaskSnapshot {
	List(Vec<TaskRecord>),
	Wrapped { tasks: Vec<TaskRecord> },
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = match &args.config {
		Some(path) => taskrank_config::load(path)?,
		None => Config::default(),
	};
	// Tracing starts before normalization so its adjustment warnings are emitted.
	let level = match config.service.log_level.trim() {
		"" => "info",
		level => level,
	};
	let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	let tasks = load_tasks(&args.tasks)?;

	tracing::debug!(tasks = tasks.len(), expansion = config.expansion.enabled, "Loaded task snapshot.");

	let ranker = TaskRanker::new(config);
	let response = ranker
		.rank(RankRequest {
			query: args.query,
			tasks,
			mode: args.mode,
			today: args.today,
			display_limit: args.limit,
			ai_limit: args.ai_limit,
			cancel: None,
		})
		.await?;

	if args.json {
		let json = serde_json::to_string_pretty(&response)?;

		println!("{json}");
	} else {
		print!("{}", render_table(&response));
	}

	Ok(())
}

pub fn load_tasks(path: &Path) -> color_eyre::Result<Vec<TaskRecord>> {
	let raw = fs::read_to_string(path)
		.map_err(|err| eyre::eyre!("Failed to read task snapshot {}: {err}", path.display()))?;
	let snapshot: TaskSnapshot = serde_json::from_str(&raw)
		.map_err(|err| eyre::eyre!("Failed to parse task snapshot {}: {err}", path.display()))?;

	Ok(match snapshot {
		TaskSnapshot::List(tasks) | TaskSnapshot::Wrapped { tasks } => tasks,
	})
}

/// Plain-text listing. An empty result explains which stage removed everything.
pub fn render_table(response: &RankResponse) -> String {
	let mut out = String::new();

	if response.display.is_empty() {
		let diagnostics = &response.diagnostics;
		let stage = diagnostics
			.eliminated_by
			.map(|stage| format!("{stage:?}").to_lowercase())
			.unwrap_or_else(|| "none".to_string());
		let top = diagnostics
			.top_candidate_score
			.map(|score| format!("{score:.2}"))
			.unwrap_or_else(|| "-".to_string());
		let _ = writeln!(
			out,
			"No matching tasks ({} checked). Removed at: {stage}. Top candidate score: {top}. Quality threshold: {:.2}.",
			diagnostics.total_tasks, diagnostics.quality.threshold,
		);

		return out;
	}

	let _ = writeln!(out, "{:>3}  {:>7}  {:<4}  {:<10}  {:<11}  TASK", "#", "SCORE", "PRI", "DUE", "STATUS");

	for (idx, ranked) in response.display.iter().enumerate() {
		let _ = writeln!(out, "{}", render_row(idx + 1, ranked));
	}

	let _ = writeln!(
		out,
		"{} of {} matching tasks shown.",
		response.display.len(),
		response.total_matches
	);

	out
}

fn render_row(position: usize, ranked: &RankedTask) -> String {
	let task = &ranked.task;
	let priority = task.priority.level().map(|level| format!("p{level}")).unwrap_or_else(|| "-".to_string());
	let due = task
		.due
		.and_then(|due| due.format(date_serde::ISO_DATE).ok())
		.unwrap_or_else(|| "-".to_string());
	let location =
		if task.path.is_empty() { String::new() } else { format!("  ({}:{})", task.path, task.line) };

	format!(
		"{position:>3}  {:>7.2}  {priority:<4}  {due:<10}  {:<11}  {}{location}",
		ranked.score.composite,
		task.status.key(),
		task.text,
	)
}

fn parse_mode(raw: &str) -> Result<SearchMode, String> {
	raw.parse::<SearchMode>().map_err(|err| err.to_string())
}

fn parse_date(raw: &str) -> Result<Date, String> {
	date_serde::parse(raw).ok_or_else(|| format!("expected a date like 2026-03-10, got '{raw}'"))
}

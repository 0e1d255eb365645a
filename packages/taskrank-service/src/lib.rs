pub mod query;
pub mod ranking;
pub mod status;

mod error;

use std::{future::Future, pin::Pin, sync::Arc};

pub use error::{Error, Result};
pub use query::{
	DueFilter, ExpansionRequest, ExpansionResponse, FilterFields, PropertyFilters, QueryIntent,
	QueryParser, RecognizedProperties, TaskLocation,
};
pub use ranking::{
	ExpansionStatus, FilterStage, RankDiagnostics, RankRequest, RankResponse, RankedTask, Ranking,
	SearchMode,
	executor::{CancellationToken, NoopScheduler, Scheduler, TokioScheduler},
	scoring::ScoreBreakdown,
	sort::{SortCriterion, SortSpec},
};
pub use status::StatusTable;

use taskrank_config::{Config, LlmProviderConfig};
use taskrank_domain::lexicon::StopWords;
use taskrank_providers::chat;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Optional collaborator that adds synonyms and reads properties out of free text.
pub trait SemanticExpander
where
	Self: Send + Sync,
{
	fn expand<'a>(
		&'a self,
		request: &'a ExpansionRequest,
	) -> BoxFuture<'a, color_eyre::Result<ExpansionResponse>>;
}

/// Expander backed by an OpenAI-compatible chat completion endpoint.
pub struct LlmSemanticExpander {
	cfg: LlmProviderConfig,
}
impl LlmSemanticExpander {
	pub fn new(cfg: LlmProviderConfig) -> Self {
		Self { cfg }
	}
}
impl SemanticExpander for LlmSemanticExpander {
	fn expand<'a>(
		&'a self,
		request: &'a ExpansionRequest,
	) -> BoxFuture<'a, color_eyre::Result<ExpansionResponse>> {
		Box::pin(async move {
			let messages = query::expansion::build_expansion_messages(request);
			let value = chat::complete_json(&self.cfg, &messages).await?;
			let response =
				query::expansion::parse_expansion_output(value, request.per_keyword_limit())?;

			Ok(response)
		})
	}
}

pub struct TaskRanker {
	pub cfg: Config,
	parser: QueryParser,
	statuses: StatusTable,
	stop_words: StopWords,
	sort_spec: SortSpec,
	expander: Option<Arc<dyn SemanticExpander>>,
	scheduler: Arc<dyn Scheduler>,
}
impl TaskRanker {
	/// Normalizes the config, logging each adjustment, and builds the ranker. The LLM expander
	/// is attached when `expansion.enabled` survives normalization.
	pub fn new(mut cfg: Config) -> Self {
		for note in taskrank_config::normalize(&mut cfg) {
			tracing::warn!(adjustment = %note, "Configuration value adjusted.");
		}

		let statuses = StatusTable::from_config(&cfg.status);
		let parser = QueryParser::new(&cfg.query, statuses.clone());
		let stop_words = StopWords::new(cfg.filter.use_builtin_stop_words, &cfg.filter.stop_words);
		let sort_spec = SortSpec::resolve(&cfg.sort.criteria);
		let expander: Option<Arc<dyn SemanticExpander>> = if cfg.expansion.enabled {
			Some(Arc::new(LlmSemanticExpander::new(cfg.expansion.provider.clone())))
		} else {
			None
		};

		Self {
			cfg,
			parser,
			statuses,
			stop_words,
			sort_spec,
			expander,
			scheduler: Arc::new(TokioScheduler),
		}
	}

	pub fn with_expander(mut self, expander: Arc<dyn SemanticExpander>) -> Self {
		self.expander = Some(expander);

		self
	}

	pub fn without_expander(mut self) -> Self {
		self.expander = None;

		self
	}

	pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
		self.scheduler = scheduler;

		self
	}

	/// Deterministic parse only; never calls the expander.
	pub fn parse_query(&self, raw: &str) -> QueryIntent {
		self.parser.parse(raw)
	}

	pub fn statuses(&self) -> &StatusTable {
		&self.statuses
	}

	pub fn sort_spec(&self) -> &SortSpec {
		&self.sort_spec
	}

	pub fn stop_words(&self) -> &StopWords {
		&self.stop_words
	}
}

use std::collections::HashMap;

use taskrank_config::{STATUS_OTHER, Status};
use taskrank_domain::StatusCategory;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatusEntry {
	pub score: f32,
	pub order: u32,
}

/// Resolved view of the configured status categories.
///
/// Score and sort order stay separate: a category can rank low by score but still sort first.
#[derive(Clone, Debug)]
pub struct StatusTable {
	entries: HashMap<String, StatusEntry>,
	names: HashMap<String, StatusCategory>,
	symbols: HashMap<String, StatusCategory>,
	fallback: StatusEntry,
	max_score: f32,
}
impl StatusTable {
	pub fn from_config(cfg: &Status) -> Self {
		let mut entries = HashMap::new();
		let mut names = HashMap::new();
		let mut symbols = HashMap::new();

		for (key, def) in &cfg.categories {
			let category = StatusCategory::from_key(key);

			entries.insert(category.key().to_string(), StatusEntry { score: def.score, order: def.order });
			names.insert(category.key().to_string(), category.clone());
			names.insert(category.key().replace('_', "-"), category.clone());

			for alias in &def.aliases {
				names.entry(alias.to_lowercase()).or_insert_with(|| category.clone());
			}
			for symbol in &def.symbols {
				symbols.entry(symbol.clone()).or_insert_with(|| category.clone());
			}
		}

		let fallback =
			entries.get(STATUS_OTHER).copied().unwrap_or(StatusEntry { score: 0.5, order: u32::MAX });
		let max_score = entries.values().map(|entry| entry.score).fold(0.0, f32::max);

		Self { entries, names, symbols, fallback, max_score }
	}

	/// Unknown categories fall back to the "other" entry.
	pub fn entry(&self, category: &StatusCategory) -> StatusEntry {
		self.entries.get(category.key()).copied().unwrap_or(self.fallback)
	}

	pub fn score(&self, category: &StatusCategory) -> f32 {
		self.entry(category).score
	}

	pub fn order(&self, category: &StatusCategory) -> u32 {
		self.entry(category).order
	}

	pub fn max_score(&self) -> f32 {
		self.max_score
	}

	/// Resolves a query value: a category key, an alias, or a checkbox symbol.
	pub fn resolve(&self, value: &str) -> Option<StatusCategory> {
		if let Some(category) = self.symbols.get(value) {
			return Some(category.clone());
		}

		let lowered = value.trim().to_lowercase();

		self.names
			.get(&lowered)
			.or_else(|| self.names.get(&lowered.replace('-', "_")))
			.or_else(|| self.symbols.get(&lowered))
			.cloned()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn resolves_keys_aliases_and_symbols() {
		let table = StatusTable::from_config(&Status::default());

		assert_eq!(table.resolve("open"), Some(StatusCategory::Open));
		assert_eq!(table.resolve("WIP"), Some(StatusCategory::InProgress));
		assert_eq!(table.resolve("in-progress"), Some(StatusCategory::InProgress));
		assert_eq!(table.resolve("X"), Some(StatusCategory::Completed));
		assert_eq!(table.resolve("/"), Some(StatusCategory::InProgress));
		assert_eq!(table.resolve("someday"), None);
	}

	#[test]
	fn unknown_categories_use_the_other_entry() {
		let table = StatusTable::from_config(&Status::default());
		let custom = StatusCategory::Custom("waiting".to_string());

		assert_eq!(table.score(&custom), table.score(&StatusCategory::Other));
		assert_eq!(table.order(&custom), 8);
	}

	#[test]
	fn max_score_is_the_highest_category_score() {
		let table = StatusTable::from_config(&Status::default());

		assert_eq!(table.max_score(), 1.0);
	}
}

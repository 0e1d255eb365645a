use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::Date;

use taskrank_config::{
	STATUS_CANCELLED, STATUS_COMPLETED, STATUS_IN_PROGRESS, STATUS_OPEN, STATUS_OTHER,
};

/// Read-only snapshot of one checklist item, as handed over by the indexer.
///
/// Only `text` is required. Any other field holding an unusable value reads as absent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
	pub text: String,
	#[serde(default, deserialize_with = "crate::lenient::deserialize")]
	pub status: StatusCategory,
	#[serde(default, deserialize_with = "crate::lenient::deserialize")]
	pub priority: Priority,
	#[serde(default, with = "crate::date_serde::option")]
	pub due: Option<Date>,
	#[serde(default, with = "crate::date_serde::option")]
	pub created: Option<Date>,
	#[serde(default, with = "crate::date_serde::option")]
	pub completed: Option<Date>,
	#[serde(default, deserialize_with = "crate::lenient::deserialize")]
	pub path: String,
	#[serde(default, deserialize_with = "crate::lenient::deserialize")]
	pub line: u32,
	#[serde(default, deserialize_with = "crate::lenient::deserialize")]
	pub folder: String,
	#[serde(default, deserialize_with = "crate::lenient::deserialize")]
	pub tags: Vec<String>,
	#[serde(default, deserialize_with = "crate::lenient::deserialize")]
	pub note_tags: Vec<String>,
}
impl TaskRecord {
	pub fn new(text: impl Into<String>) -> Self {
		Self {
			text: text.into(),
			status: StatusCategory::Open,
			priority: Priority::None,
			due: None,
			created: None,
			completed: None,
			path: String::new(),
			line: 0,
			folder: String::new(),
			tags: Vec::new(),
			note_tags: Vec::new(),
		}
	}

	/// File name of the source note without directories or extension.
	pub fn note_name(&self) -> &str {
		let name = self.path.rsplit(['/', '\\']).next().unwrap_or(self.path.as_str());

		name.strip_suffix(".md").unwrap_or(name)
	}

	pub fn all_tags(&self) -> impl Iterator<Item = &str> {
		self.tags.iter().chain(self.note_tags.iter()).map(|tag| tag.trim_start_matches('#'))
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "PriorityRepr", into = "Option<u8>")]
pub enum Priority {
	P1,
	P2,
	P3,
	P4,
	#[default]
	None,
}
impl Priority {
	pub const LEVELS: [Self; 4] = [Self::P1, Self::P2, Self::P3, Self::P4];

	pub fn from_level(level: u8) -> Self {
		match level {
			1 => Self::P1,
			2 => Self::P2,
			3 => Self::P3,
			4 => Self::P4,
			_ => Self::None,
		}
	}

	pub fn level(self) -> Option<u8> {
		match self {
			Self::P1 => Some(1),
			Self::P2 => Some(2),
			Self::P3 => Some(3),
			Self::P4 => Some(4),
			Self::None => None,
		}
	}

	/// Sort rank: 1 is most urgent, "none" sorts after every level.
	pub fn rank(self) -> u8 {
		self.level().unwrap_or(5)
	}
}
impl From<PriorityRepr> for Priority {
	fn from(repr: PriorityRepr) -> Self {
		match repr {
			PriorityRepr::Level(level) => u8::try_from(level).map(Self::from_level).unwrap_or_default(),
			PriorityRepr::Text(text) => {
				let text = text.trim().to_ascii_lowercase();
				let digits = text.strip_prefix('p').unwrap_or(&text);

				digits.parse::<u8>().map(Self::from_level).unwrap_or_default()
			},
			PriorityRepr::Missing(()) => Self::None,
		}
	}
}
impl From<Priority> for Option<u8> {
	fn from(priority: Priority) -> Self {
		priority.level()
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PriorityRepr {
	Level(i64),
	Text(String),
	Missing(()),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusCategory {
	Open,
	InProgress,
	Completed,
	Cancelled,
	#[default]
	Other,
	Custom(String),
}
impl StatusCategory {
	pub fn from_key(key: &str) -> Self {
		let key = key.trim().to_ascii_lowercase().replace('-', "_");

		match key.as_str() {
			STATUS_OPEN => Self::Open,
			STATUS_IN_PROGRESS | "inprogress" => Self::InProgress,
			STATUS_COMPLETED => Self::Completed,
			STATUS_CANCELLED => Self::Cancelled,
			STATUS_OTHER | "" => Self::Other,
			_ => Self::Custom(key),
		}
	}

	pub fn key(&self) -> &str {
		match self {
			Self::Open => STATUS_OPEN,
			Self::InProgress => STATUS_IN_PROGRESS,
			Self::Completed => STATUS_COMPLETED,
			Self::Cancelled => STATUS_CANCELLED,
			Self::Other => STATUS_OTHER,
			Self::Custom(key) => key.as_str(),
		}
	}
}
impl From<String> for StatusCategory {
	fn from(value: String) -> Self {
		Self::from_key(&value)
	}
}
impl From<StatusCategory> for String {
	fn from(value: StatusCategory) -> Self {
		value.key().to_string()
	}
}
impl Display for StatusCategory {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.key())
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueBucket {
	Overdue,
	Today,
	ThisWeek,
	ThisMonth,
	Future,
	None,
}
impl DueBucket {
	pub const WEEK_DAYS: i64 = 7;
	pub const MONTH_DAYS: i64 = 30;

	/// Buckets are rolling windows measured from `today`, which callers capture once per query.
	pub fn classify(due: Option<Date>, today: Date) -> Self {
		let Some(due) = due else { return Self::None };
		let days = (due - today).whole_days();

		if days < 0 {
			Self::Overdue
		} else if days == 0 {
			Self::Today
		} else if days <= Self::WEEK_DAYS {
			Self::ThisWeek
		} else if days <= Self::MONTH_DAYS {
			Self::ThisMonth
		} else {
			Self::Future
		}
	}
}

#[cfg(test)]
mod tests {
	use time::macros::date;

	use super::*;

	#[test]
	fn classifies_due_buckets_relative_to_today() {
		let today = date!(2026 - 03 - 10);

		assert_eq!(DueBucket::classify(Some(date!(2026 - 03 - 09)), today), DueBucket::Overdue);
		assert_eq!(DueBucket::classify(Some(today), today), DueBucket::Today);
		assert_eq!(DueBucket::classify(Some(date!(2026 - 03 - 17)), today), DueBucket::ThisWeek);
		assert_eq!(DueBucket::classify(Some(date!(2026 - 03 - 18)), today), DueBucket::ThisMonth);
		assert_eq!(DueBucket::classify(Some(date!(2026 - 04 - 10)), today), DueBucket::Future);
		assert_eq!(DueBucket::classify(None, today), DueBucket::None);
	}

	#[test]
	fn unknown_status_keys_become_custom() {
		assert_eq!(StatusCategory::from_key("In-Progress"), StatusCategory::InProgress);
		assert_eq!(
			StatusCategory::from_key("Important"),
			StatusCategory::Custom("important".to_string())
		);
		assert_eq!(StatusCategory::from_key(" "), StatusCategory::Other);
	}

	#[test]
	fn priority_rank_puts_none_last() {
		assert!(Priority::P1.rank() < Priority::P4.rank());
		assert!(Priority::P4.rank() < Priority::None.rank());
	}

	#[test]
	fn note_name_strips_directories_and_extension() {
		let mut task = TaskRecord::new("x");

		task.path = "Projects/Work/Weekly Review.md".to_string();

		assert_eq!(task.note_name(), "Weekly Review");
	}
}

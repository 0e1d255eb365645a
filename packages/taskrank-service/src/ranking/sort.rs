use std::cmp::Ordering;

use serde::Serialize;
use time::Date;

use taskrank_domain::Priority;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortCriterion {
	Relevance,
	DueDate,
	Priority,
	Status,
	Created,
	Alphabetical,
}
impl SortCriterion {
	pub fn from_name(name: &str) -> Option<Self> {
		match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
			"relevance" => Some(Self::Relevance),
			"due_date" | "due" => Some(Self::DueDate),
			"priority" => Some(Self::Priority),
			"status" => Some(Self::Status),
			"created" => Some(Self::Created),
			"alphabetical" => Some(Self::Alphabetical),
			_ => None,
		}
	}
}

/// Everything the comparator reads for one task.
#[derive(Clone, Copy, Debug)]
pub struct SortKey<'a> {
	pub composite: f32,
	pub relevance: f32,
	pub due: Option<Date>,
	pub priority: Priority,
	pub status_order: u32,
	pub created: Option<Date>,
	pub text: &'a str,
}

/// Ordered tie-break criteria applied after the composite score.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SortSpec {
	criteria: Vec<SortCriterion>,
}
impl SortSpec {
	/// Unknown names and repeats are dropped. Relevance is always eligible, so it is
	/// prepended when the list leaves it out.
	pub fn resolve(names: &[String]) -> Self {
		let mut criteria = Vec::with_capacity(names.len() + 1);

		for name in names {
			match SortCriterion::from_name(name) {
				Some(criterion) if !criteria.contains(&criterion) => criteria.push(criterion),
				Some(_) => {},
				None => tracing::warn!(criterion = %name, "Unknown sort criterion ignored."),
			}
		}

		if !criteria.contains(&SortCriterion::Relevance) {
			criteria.insert(0, SortCriterion::Relevance);
		}

		Self { criteria }
	}

	pub fn criteria(&self) -> &[SortCriterion] {
		&self.criteria
	}

	pub fn compare(&self, a: &SortKey<'_>, b: &SortKey<'_>) -> Ordering {
		let mut ordering = cmp_f32_desc(a.composite, b.composite);

		for criterion in &self.criteria {
			if ordering != Ordering::Equal {
				break;
			}

			ordering = match criterion {
				SortCriterion::Relevance => cmp_f32_desc(a.relevance, b.relevance),
				SortCriterion::DueDate => cmp_option_asc(a.due, b.due),
				SortCriterion::Priority => a.priority.rank().cmp(&b.priority.rank()),
				SortCriterion::Status => a.status_order.cmp(&b.status_order),
				SortCriterion::Created => cmp_option_desc(a.created, b.created),
				SortCriterion::Alphabetical => a.text.cmp(b.text),
			};
		}

		ordering
	}
}
impl Default for SortSpec {
	fn default() -> Self {
		Self::resolve(&[])
	}
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

/// Earliest first; missing values last.
fn cmp_option_asc<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
	match (a, b) {
		(Some(a), Some(b)) => a.cmp(&b),
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => Ordering::Equal,
	}
}

/// Latest first; missing values last.
fn cmp_option_desc<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
	match (a, b) {
		(Some(a), Some(b)) => b.cmp(&a),
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => Ordering::Equal,
	}
}

#[cfg(test)]
mod tests {
	use time::macros::date;

	use super::*;

	fn key(composite: f32, text: &str) -> SortKey<'_> {
		SortKey {
			composite,
			relevance: 0.0,
			due: None,
			priority: Priority::None,
			status_order: 1,
			created: None,
			text,
		}
	}

	#[test]
	fn resolve_dedupes_and_prepends_relevance() {
		let spec = SortSpec::resolve(&[
			"priority".to_string(),
			"bogus".to_string(),
			"Due-Date".to_string(),
			"priority".to_string(),
		]);

		assert_eq!(
			spec.criteria(),
			&[SortCriterion::Relevance, SortCriterion::Priority, SortCriterion::DueDate]
		);
	}

	#[test]
	fn composite_dominates_tie_breaks() {
		let spec = SortSpec::resolve(&["alphabetical".to_string()]);

		assert_eq!(spec.compare(&key(2.0, "b"), &key(1.0, "a")), Ordering::Less);
		assert_eq!(spec.compare(&key(1.0, "a"), &key(1.0, "b")), Ordering::Less);
	}

	#[test]
	fn due_dates_sort_earliest_first_with_missing_last() {
		let spec = SortSpec::resolve(&["due_date".to_string()]);
		let mut a = key(1.0, "a");
		let mut b = key(1.0, "b");

		a.due = Some(date!(2026 - 03 - 01));
		b.due = Some(date!(2026 - 02 - 01));

		assert_eq!(spec.compare(&a, &b), Ordering::Greater);

		b.due = None;

		assert_eq!(spec.compare(&a, &b), Ordering::Less);
	}

	#[test]
	fn created_sorts_newest_first() {
		let spec = SortSpec::resolve(&["created".to_string()]);
		let mut a = key(1.0, "a");
		let mut b = key(1.0, "b");

		a.created = Some(date!(2026 - 01 - 01));
		b.created = Some(date!(2026 - 02 - 01));

		assert_eq!(spec.compare(&a, &b), Ordering::Greater);
	}

	#[test]
	fn nan_sorts_last() {
		assert_eq!(cmp_f32_desc(f32::NAN, 1.0), Ordering::Greater);
		assert_eq!(cmp_f32_desc(2.0, 1.0), Ordering::Less);
	}
}

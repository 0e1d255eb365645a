pub mod option;

use serde::{Deserialize, Deserializer, Serializer};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

pub const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn parse(raw: &str) -> Option<Date> {
	let trimmed = raw.trim();
	// Accept full timestamps by keeping the date part.
	let date_part = trimmed.get(..10).unwrap_or(trimmed);

	Date::parse(date_part, ISO_DATE).ok()
}

pub fn serialize<S>(value: &Date, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	let formatted = value.format(ISO_DATE).map_err(serde::ser::Error::custom)?;

	serializer.serialize_str(&formatted)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;

	parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
}

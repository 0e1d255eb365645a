use serde::{Deserializer, Serializer};
use time::Date;

pub fn serialize<S>(value: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	match value {
		Some(value) => crate::date_serde::serialize(value, serializer),
		None => serializer.serialize_none(),
	}
}

/// Anything other than an ISO date string reads as `None`.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw: Option<String> = crate::lenient::deserialize(deserializer)?;

	Ok(raw.as_deref().and_then(crate::date_serde::parse))
}

//! Field-level fallbacks for task snapshots: an unusable value becomes the field's default.

use serde::{Deserialize, Deserializer, de::IgnoredAny};

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
	Value(T),
	Unusable(IgnoredAny),
}

/// Use with `#[serde(default, deserialize_with = "crate::lenient::deserialize")]`.
pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de> + Default,
{
	Ok(match Lenient::<T>::deserialize(deserializer)? {
		Lenient::Value(value) => value,
		Lenient::Unusable(_) => T::default(),
	})
}

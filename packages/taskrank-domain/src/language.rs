use taskrank_config::LANG_ENGLISH;

/// Detects the query language as an ISO 639-3 code, falling back to English.
///
/// An unreliable guess only counts when the query is written in a non-Latin script.
pub fn detect_language(text: &str) -> String {
	let Some(info) = whatlang::detect(text) else { return LANG_ENGLISH.to_string() };

	if info.is_reliable() || info.script() != whatlang::Script::Latin {
		return info.lang().code().to_string();
	}

	LANG_ENGLISH.to_string()
}

/// Human-readable language name for prompts, e.g. "eng" -> "English".
pub fn language_name(code: &str) -> String {
	whatlang::Lang::from_code(code)
		.map(|lang| lang.eng_name().to_string())
		.unwrap_or_else(|| code.to_string())
}

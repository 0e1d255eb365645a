//! Mixed-script tokenization.
//!
//! Alphabetic scripts are split on word boundaries. Scripts written without spaces between
//! words (Han, kana, Thai, ...) cannot be split reliably without a dictionary, so each run is
//! over-segmented into single characters plus adjacent bigrams. Matching downstream is
//! substring containment, so the extra tokens cost precision but never recall.

use std::{
	collections::HashSet,
	sync::LazyLock,
};

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_script::{Script, UnicodeScript};
use unicode_segmentation::UnicodeSegmentation;

static TAG_RE: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"(?:^|\s)#([\p{L}\p{N}_/\-]+)").ok());

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Run {
	Alphabetic(String),
	Logographic(String),
}

/// Ordered, de-duplicated, lower-cased tokens. Tags (`#name`) come first with the marker
/// stripped.
pub fn segment(text: &str) -> Vec<String> {
	let mut out = Vec::new();
	let mut seen = HashSet::new();
	let normalized = normalize(text);
	let (tags, rest) = split_tags(&normalized);

	for tag in tags {
		push_token(&mut out, &mut seen, tag);
	}

	for run in runs(&rest) {
		match run {
			Run::Alphabetic(run) =>
				for word in run.unicode_words() {
					push_token(&mut out, &mut seen, word.to_string());
				},
			Run::Logographic(run) => {
				let chars: Vec<char> = run.chars().collect();

				for (idx, ch) in chars.iter().enumerate() {
					push_token(&mut out, &mut seen, ch.to_string());

					if let Some(next) = chars.get(idx + 1) {
						push_token(&mut out, &mut seen, format!("{ch}{next}"));
					}
				}
			},
		}
	}

	out
}

/// NFKC-folds and lower-cases text so full-width forms match their ASCII counterparts.
pub fn normalize(text: &str) -> String {
	text.nfkc().collect::<String>().to_lowercase()
}

/// Splits tag tokens out of already-normalized text, returning the tags and the remaining
/// text with each tag replaced by a space.
pub fn split_tags(text: &str) -> (Vec<String>, String) {
	let mut tags = Vec::new();
	let mut rest = String::with_capacity(text.len());
	let mut last = 0_usize;
	let Some(tag_re) = TAG_RE.as_ref() else { return (tags, text.to_string()) };

	for caps in tag_re.captures_iter(text) {
		let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else { continue };

		tags.push(name.as_str().to_string());
		rest.push_str(&text[last..whole.start()]);
		rest.push(' ');

		last = whole.end();
	}

	rest.push_str(&text[last..]);

	(tags, rest)
}

/// Groups text into alternating alphabetic and logographic runs. Whitespace and punctuation
/// stay inside alphabetic runs and are dropped later by word segmentation.
pub fn runs(text: &str) -> Vec<Run> {
	let mut out = Vec::new();
	let mut alphabetic = String::new();
	let mut logographic = String::new();

	for ch in text.chars() {
		if is_logographic(ch) {
			if !alphabetic.is_empty() {
				out.push(Run::Alphabetic(std::mem::take(&mut alphabetic)));
			}

			logographic.push(ch);
		} else {
			if !logographic.is_empty() {
				out.push(Run::Logographic(std::mem::take(&mut logographic)));
			}

			alphabetic.push(ch);
		}
	}

	if !alphabetic.is_empty() {
		out.push(Run::Alphabetic(alphabetic));
	}
	if !logographic.is_empty() {
		out.push(Run::Logographic(logographic));
	}

	out
}

pub fn is_logographic(ch: char) -> bool {
	matches!(
		ch.script(),
		Script::Han
			| Script::Hiragana
			| Script::Katakana
			| Script::Thai
			| Script::Lao
			| Script::Khmer
			| Script::Myanmar
	)
}

pub fn contains_logographic(text: &str) -> bool {
	text.chars().any(is_logographic)
}

fn push_token(out: &mut Vec<String>, seen: &mut HashSet<String>, token: String) {
	if token.trim().is_empty() {
		return;
	}
	if seen.insert(token.clone()) {
		out.push(token);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_input_yields_no_tokens() {
		assert!(segment("").is_empty());
		assert!(segment("   \t ").is_empty());
	}

	#[test]
	fn alphabetic_text_splits_on_punctuation_and_dedupes() {
		assert_eq!(segment("Fix the bug, then FIX tests!"), vec!["fix", "the", "bug", "then", "tests"]);
	}

	#[test]
	fn logographic_runs_emit_characters_and_bigrams() {
		assert_eq!(segment("修复错误"), vec!["修", "修复", "复", "复错", "错", "错误", "误"]);
	}

	#[test]
	fn tags_come_first_without_marker() {
		assert_eq!(segment("write report #work/q3 today"), vec!["work/q3", "write", "report", "today"]);
	}

	#[test]
	fn mixed_scripts_are_segmented_per_run() {
		let tokens = segment("API文档 update");

		assert_eq!(tokens, vec!["api", "文", "文档", "档", "update"]);
	}

	#[test]
	fn fullwidth_latin_is_folded() {
		assert_eq!(segment("ＦＩＸ"), vec!["fix"]);
	}
}

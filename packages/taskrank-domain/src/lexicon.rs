use std::collections::HashSet;

use unicode_segmentation::UnicodeSegmentation;

use crate::segment::{self, Run};

const STOP_WORDS_ENG: &[&str] = &[
	"a", "an", "the", "and", "or", "but", "of", "to", "in", "on", "at", "for", "with", "by",
	"from", "is", "are", "was", "were", "be", "been", "being", "it", "its", "this", "that",
	"these", "those", "i", "me", "my", "we", "our", "you", "your", "he", "she", "they", "them",
	"their", "as", "into", "about", "than", "then", "so", "if", "there", "here", "up", "out",
	"just", "also", "very", "too", "please",
];
const STOP_WORDS_CMN: &[&str] = &[
	"的", "了", "和", "与", "是", "在", "我", "有", "就", "不", "也", "很", "到", "着", "这",
	"那", "吗", "呢", "吧", "啊", "把", "被", "给", "你", "他", "她", "它", "们", "我的",
];
const GENERIC_WORDS_ENG: &[&str] = &[
	"what", "which", "how", "when", "where", "why", "who", "should", "could", "would", "can",
	"do", "does", "did", "doing", "need", "needs", "have", "has", "task", "tasks", "thing",
	"things", "stuff", "work", "todo", "todos", "item", "items", "anything", "something",
	"everything", "any", "all", "some", "show", "list", "find", "get", "give", "tell", "me",
	"my", "i", "next", "now", "focus", "important", "priorities",
];
const GENERIC_WORDS_CMN: &[&str] = &[
	"什么", "哪些", "哪个", "怎么", "如何", "任务", "事情", "事", "应该", "需要", "做", "可以",
	"有", "我", "吗", "呢", "要", "哪", "该", "现在", "下一步", "重要",
];

/// Words dropped from keyword sets before relevance scoring. Task text is never filtered.
#[derive(Clone, Debug, Default)]
pub struct StopWords {
	words: HashSet<String>,
}
impl StopWords {
	pub fn new(use_builtin: bool, extra: &[String]) -> Self {
		let mut words = HashSet::new();

		if use_builtin {
			words.extend(STOP_WORDS_ENG.iter().chain(STOP_WORDS_CMN).map(|word| word.to_string()));
		}

		words.extend(extra.iter().map(|word| word.trim().to_lowercase()));

		Self { words }
	}

	pub fn contains(&self, token: &str) -> bool {
		self.words.contains(token)
	}

	/// Removes stop words, keeping order.
	pub fn strip(&self, tokens: &[String]) -> Vec<String> {
		tokens.iter().filter(|token| !self.contains(token)).cloned().collect()
	}
}

/// Interrogative and filler terms that carry no topic of their own.
#[derive(Clone, Debug)]
pub struct GenericWords {
	words: HashSet<String>,
	logographic: Vec<String>,
}
impl GenericWords {
	pub fn new(extra: &[String]) -> Self {
		let words: HashSet<String> = GENERIC_WORDS_ENG
			.iter()
			.chain(GENERIC_WORDS_CMN)
			.map(|word| word.to_string())
			.chain(extra.iter().map(|word| word.trim().to_lowercase()))
			.filter(|word| !word.is_empty())
			.collect();
		let mut logographic: Vec<String> =
			words.iter().filter(|word| segment::contains_logographic(word)).cloned().collect();

		// Longest first so "下一步" wins over a shorter overlapping entry.
		logographic.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));

		Self { words, logographic }
	}

	pub fn contains(&self, token: &str) -> bool {
		self.words.contains(token)
	}

	/// Share of the text's content covered by generic terms, in [0, 1].
	///
	/// Alphabetic words count one unit each. Logographic runs count one unit per character,
	/// since they have no reliable word boundaries.
	pub fn generic_share(&self, text: &str) -> f32 {
		let normalized = segment::normalize(text);
		let (tags, rest) = segment::split_tags(&normalized);
		let mut total = tags.len();
		let mut generic = 0_usize;

		for run in segment::runs(&rest) {
			match run {
				Run::Alphabetic(run) =>
					for word in run.unicode_words() {
						total += 1;

						if self.contains(word) {
							generic += 1;
						}
					},
				Run::Logographic(run) => {
					let (covered, len) = self.covered_chars(&run);

					total += len;
					generic += covered;
				},
			}
		}

		if total == 0 {
			return 0.0;
		}

		generic as f32 / total as f32
	}

	fn covered_chars(&self, run: &str) -> (usize, usize) {
		let chars: Vec<char> = run.chars().collect();
		let mut covered = vec![false; chars.len()];

		for word in &self.logographic {
			let needle: Vec<char> = word.chars().collect();

			if needle.is_empty() || needle.len() > chars.len() {
				continue;
			}

			for start in 0..=(chars.len() - needle.len()) {
				if chars[start..start + needle.len()] == needle[..] {
					covered[start..start + needle.len()].iter_mut().for_each(|flag| *flag = true);
				}
			}
		}

		(covered.iter().filter(|flag| **flag).count(), chars.len())
	}
}

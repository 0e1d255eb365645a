pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Expansion provider failures. The ranker recovers from every one of them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Chat completion request failed: {0}")]
	Http(#[from] reqwest::Error),
	#[error("Invalid provider header name: {0}")]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error("Invalid provider header value: {0}")]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("Invalid provider config: {message}")]
	InvalidConfig { message: String },
	#[error("Unusable chat completion: {message}")]
	InvalidResponse { message: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Query {query_id} was cancelled.")]
	Cancelled { query_id: uuid::Uuid },
	#[error("Provider error: {message}")]
	Provider { message: String },
}
impl From<taskrank_providers::Error> for Error {
	fn from(err: taskrank_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

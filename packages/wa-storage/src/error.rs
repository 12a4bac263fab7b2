#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Not found: {0}")]
	NotFound(String),
}
impl Error {
	/// Whether the server cancelled the statement because it ran past `statement_timeout`.
	pub fn is_statement_timeout(&self) -> bool {
		match self {
			Self::Sqlx(sqlx::Error::Database(err)) => err.code().as_deref() == Some("57014"),
			_ => false,
		}
	}
}

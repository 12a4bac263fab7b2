pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The request was rejected before any store access.
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Role assignments unavailable: {message}")]
	RoleAssignments { message: String },
	#[error("Task store unavailable: {message}")]
	StoreUnavailable { message: String },
	#[error("Task store timed out after {timeout_ms} ms.")]
	StoreTimeout { timeout_ms: u64 },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		match err {
			sqlx::Error::PoolTimedOut
			| sqlx::Error::PoolClosed
			| sqlx::Error::WorkerCrashed
			| sqlx::Error::Io(_)
			| sqlx::Error::Tls(_) => Self::StoreUnavailable { message: err.to_string() },
			_ => Self::Storage { message: err.to_string() },
		}
	}
}

impl From<wa_storage::Error> for Error {
	fn from(err: wa_storage::Error) -> Self {
		match err {
			wa_storage::Error::Sqlx(inner) => inner.into(),
			wa_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			wa_storage::Error::NotFound(message) => Self::NotFound { message },
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pool_failures_map_to_unavailable() {
		assert!(matches!(Error::from(sqlx::Error::PoolTimedOut), Error::StoreUnavailable { .. }));
		assert!(matches!(
			Error::from(wa_storage::Error::Sqlx(sqlx::Error::RowNotFound)),
			Error::Storage { .. }
		));
		assert!(matches!(
			Error::from(wa_storage::Error::InvalidArgument("batch".to_string())),
			Error::InvalidRequest { .. }
		));
	}
}

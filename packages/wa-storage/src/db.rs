use std::time::Duration;

use sqlx::{PgPool, Postgres, Transaction, postgres::PgPoolOptions, pool::PoolConnection};

use crate::{Result, schema};

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &wa_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	pub fn from_pool(pool: PgPool) -> Self {
		Self { pool }
	}

	/// Checks a connection out of the pool. The guard goes back to the pool when dropped, on
	/// every exit path.
	pub async fn acquire(&self) -> Result<PoolConnection<Postgres>> {
		Ok(self.pool.acquire().await?)
	}

	/// Opens a transaction whose statements the server cancels once they run past `timeout`.
	///
	/// The limit is transaction-local, so the connection goes back to the pool with its session
	/// settings untouched. A cancelled statement fails with SQLSTATE `57014`.
	pub async fn begin_bounded(&self, timeout: Duration) -> Result<Transaction<'static, Postgres>> {
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT set_config('statement_timeout', $1, true)")
			.bind(format!("{}ms", timeout.as_millis().max(1)))
			.execute(&mut *tx)
			.await?;

		Ok(tx)
	}

	pub async fn ensure_schema(&self) -> Result<()> {
		let sql = schema::render_schema();
		let lock_id: i64 = 5_316_884;
		// Concurrent bootstraps serialise here; the lock is released on commit or rollback.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}
}

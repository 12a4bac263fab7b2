//! Parameterised statements whose placeholders are paired with their values at construction.
//!
//! [`Statement::push_param`] writes `$n` and records `(n, value)` in one step, so the bind order
//! always matches the placeholder order. Every execution path, including [`Statement::explain`],
//! binds through the same routine.

use futures_util::TryStreamExt;
use sqlx::{
	PgConnection, Postgres, Row,
	postgres::{PgArguments, PgRow},
	query::Query,
};

use crate::Result;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SqlValue {
	Text(String),
	/// Binds as a native `text[]`, never as a joined string.
	TextArray(Vec<String>),
	Int(i64),
	Bool(bool),
}
impl SqlValue {
	fn bind_to<'q>(
		&'q self,
		query: Query<'q, Postgres, PgArguments>,
	) -> Query<'q, Postgres, PgArguments> {
		match self {
			Self::Text(value) => query.bind(value.as_str()),
			Self::TextArray(values) => query.bind(values.as_slice()),
			Self::Int(value) => query.bind(*value),
			Self::Bool(value) => query.bind(*value),
		}
	}
}
impl From<&str> for SqlValue {
	fn from(value: &str) -> Self {
		Self::Text(value.to_string())
	}
}
impl From<String> for SqlValue {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}
impl From<Vec<String>> for SqlValue {
	fn from(values: Vec<String>) -> Self {
		Self::TextArray(values)
	}
}
impl From<i64> for SqlValue {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}
impl From<bool> for SqlValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
	pub placeholder: usize,
	pub value: SqlValue,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExplainMode {
	/// Planner estimates only; the statement is not executed.
	Plan,
	/// Executes the statement and reports actual timings and buffer usage.
	#[default]
	Analyze,
}
impl ExplainMode {
	fn prefix(&self) -> &'static str {
		match self {
			Self::Plan => "EXPLAIN ",
			Self::Analyze => "EXPLAIN (ANALYZE, BUFFERS) ",
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Statement {
	sql: String,
	params: Vec<Param>,
}
impl Statement {
	pub fn new(sql: impl Into<String>) -> Self {
		Self { sql: sql.into(), params: Vec::new() }
	}

	pub fn push(&mut self, sql: &str) -> &mut Self {
		self.sql.push_str(sql);

		self
	}

	pub fn push_param(&mut self, value: impl Into<SqlValue>) -> &mut Self {
		let placeholder = self.params.len() + 1;

		self.sql.push('$');
		self.sql.push_str(&placeholder.to_string());
		self.params.push(Param { placeholder, value: value.into() });

		self
	}

	pub fn sql(&self) -> &str {
		&self.sql
	}

	pub fn params(&self) -> &[Param] {
		&self.params
	}

	/// Streams every row to `consumer` without buffering the result set. Returns the number of
	/// rows seen. A consumer error stops the stream and is returned as-is.
	pub async fn fetch_each<F>(&self, conn: &mut PgConnection, mut consumer: F) -> Result<u64>
	where
		F: FnMut(PgRow) -> Result<()>,
	{
		let mut rows = self.query().fetch(conn);
		let mut seen = 0;

		while let Some(row) = rows.try_next().await? {
			consumer(row)?;

			seen += 1;
		}

		Ok(seen)
	}

	/// Runs a statement whose first column of its single row is a `bigint`, e.g. `count(*)`.
	pub async fn fetch_count(&self, conn: &mut PgConnection) -> Result<i64> {
		let row = self.query().fetch_one(conn).await?;

		Ok(row.try_get::<i64, _>(0)?)
	}

	/// Re-runs this statement under the store's plan directive and returns the plan text, one
	/// line per row.
	pub async fn explain(&self, conn: &mut PgConnection, mode: ExplainMode) -> Result<Vec<String>> {
		let explained =
			Self { sql: format!("{}{}", mode.prefix(), self.sql), params: self.params.clone() };
		let mut lines = Vec::new();

		explained
			.fetch_each(conn, |row| {
				lines.push(row.try_get::<String, _>(0)?);

				Ok(())
			})
			.await?;

		Ok(lines)
	}

	fn query(&self) -> Query<'_, Postgres, PgArguments> {
		let mut query = sqlx::query(self.sql.as_str());

		for param in &self.params {
			query = param.value.bind_to(query);
		}

		query
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn placeholders_are_numbered_in_push_order() {
		let mut statement = Statement::new("SELECT task_id FROM tasks WHERE state = ANY(");

		statement
			.push_param(vec!["ASSIGNED".to_string()])
			.push(") AND jurisdiction = ")
			.push_param("IA")
			.push(" LIMIT ")
			.push_param(25_i64);

		assert_eq!(
			statement.sql(),
			"SELECT task_id FROM tasks WHERE state = ANY($1) AND jurisdiction = $2 LIMIT $3"
		);
		assert_eq!(
			statement.params().iter().map(|param| param.placeholder).collect::<Vec<_>>(),
			vec![1, 2, 3]
		);
		assert_eq!(statement.params()[0].value, SqlValue::TextArray(vec!["ASSIGNED".to_string()]));
		assert_eq!(statement.params()[2].value, SqlValue::Int(25));
	}

	#[test]
	fn array_values_are_not_inlined() {
		let mut statement = Statement::new("SELECT 1 WHERE signatures && ");

		statement.push_param(vec!["r:ia:*'; DROP TABLE tasks; --".to_string()]);

		assert_eq!(statement.sql(), "SELECT 1 WHERE signatures && $1");
		assert!(!statement.sql().contains("DROP"));
	}

	#[test]
	fn explain_prefixes_match_mode() {
		assert_eq!(ExplainMode::Plan.prefix(), "EXPLAIN ");
		assert_eq!(ExplainMode::default().prefix(), "EXPLAIN (ANALYZE, BUFFERS) ");
	}
}

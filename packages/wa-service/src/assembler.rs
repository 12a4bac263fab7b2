use std::{future::Future, time::Duration};

use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use wa_storage::{db::Db, models::TaskRow};

use crate::{Error, Result, builder::TaskSearchPlan};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SearchResult {
	/// Every task matching the scope and filters, not only the returned page.
	pub total_count: i64,
	pub tasks: Vec<TaskSummary>,
}
impl SearchResult {
	pub fn task_ids(&self) -> Vec<&str> {
		self.tasks.iter().map(|task| task.task_id.as_str()).collect()
	}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaskSummary {
	pub task_id: String,
	pub task_name: String,
	pub task_type: Option<String>,
	pub title: Option<String>,
	pub state: String,
	pub assignee: Option<String>,
	pub jurisdiction: String,
	pub region: Option<String>,
	pub location: Option<String>,
	pub location_name: Option<String>,
	pub case_id: String,
	pub case_type_id: Option<String>,
	pub case_category: Option<String>,
	pub case_name: Option<String>,
	pub work_type: Option<String>,
	pub role_category: Option<String>,
	pub security_classification: String,
	pub major_priority: i32,
	pub minor_priority: i32,
	#[serde(with = "wa_domain::time_serde::option")]
	pub priority_date: Option<OffsetDateTime>,
	#[serde(with = "wa_domain::time_serde::option")]
	pub due_date_time: Option<OffsetDateTime>,
	#[serde(serialize_with = "wa_domain::time_serde::serialize")]
	pub created: OffsetDateTime,
}
impl From<TaskRow> for TaskSummary {
	fn from(row: TaskRow) -> Self {
		Self {
			task_id: row.task_id,
			task_name: row.task_name,
			task_type: row.task_type,
			title: row.title,
			state: row.state,
			assignee: row.assignee,
			jurisdiction: row.jurisdiction,
			region: row.region,
			location: row.location,
			location_name: row.location_name,
			case_id: row.case_id,
			case_type_id: row.case_type_id,
			case_category: row.case_category,
			case_name: row.case_name,
			work_type: row.work_type,
			role_category: row.role_category,
			security_classification: row.security_classification,
			major_priority: row.major_priority,
			minor_priority: row.minor_priority,
			priority_date: row.priority_date,
			due_date_time: row.due_date_time,
			created: row.created,
		}
	}
}

/// Runs the count and window reads concurrently, each on its own pooled connection and each
/// bounded by `timeout` on both the client and the server. Any failure fails the whole search.
///
/// The two reads are not snapshot-consistent: a concurrent write can land between them.
pub async fn assemble(
	db: &Db,
	plan: &TaskSearchPlan,
	timeout: Duration,
) -> Result<SearchResult> {
	let count = bounded(timeout, async {
		let mut tx = db.begin_bounded(timeout).await?;
		let total_count = plan.count.fetch_count(&mut tx).await?;

		tx.commit().await?;

		Ok::<_, wa_storage::Error>(total_count)
	});
	let window = bounded(timeout, async {
		let mut tx = db.begin_bounded(timeout).await?;
		let mut tasks = Vec::new();

		plan.window
			.fetch_each(&mut tx, |row| {
				tasks.push(TaskSummary::from(TaskRow::from_row(&row)?));

				Ok(())
			})
			.await?;
		tx.commit().await?;

		Ok::<_, wa_storage::Error>(tasks)
	});
	let (total_count, tasks) = tokio::try_join!(count, window)?;

	Ok(SearchResult { total_count, tasks })
}

/// Bounds a store call by `timeout`. The call is expected to run on a connection from
/// [`Db::begin_bounded`] with the same limit, so the server cancels the statement too and the
/// connection can go back to the pool.
pub(crate) async fn bounded<T, F>(timeout: Duration, read: F) -> Result<T>
where
	F: Future<Output = wa_storage::Result<T>>,
{
	let timed_out = || Error::StoreTimeout {
		timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
	};

	match tokio::time::timeout(timeout, read).await {
		Ok(Ok(value)) => Ok(value),
		Ok(Err(err)) if err.is_statement_timeout() => Err(timed_out()),
		Ok(Err(err)) => Err(err.into()),
		Err(_) => Err(timed_out()),
	}
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	fn summary(task_id: &str) -> TaskSummary {
		TaskSummary {
			task_id: task_id.to_string(),
			task_name: "Review the appeal".to_string(),
			task_type: None,
			title: None,
			state: "ASSIGNED".to_string(),
			assignee: None,
			jurisdiction: "IA".to_string(),
			region: None,
			location: None,
			location_name: None,
			case_id: "1".to_string(),
			case_type_id: None,
			case_category: None,
			case_name: None,
			work_type: None,
			role_category: None,
			security_classification: "PUBLIC".to_string(),
			major_priority: 5000,
			minor_priority: 500,
			priority_date: None,
			due_date_time: Some(datetime!(2026-03-01 12:00 UTC)),
			created: datetime!(2026-01-01 09:00 UTC),
		}
	}

	#[test]
	fn search_result_serializes_total_and_tasks() {
		let result = SearchResult { total_count: 7, tasks: vec![summary("a"), summary("b")] };
		let value = serde_json::to_value(&result).expect("Failed to serialize result.");

		assert_eq!(result.task_ids(), vec!["a", "b"]);
		assert_eq!(value["total_count"], 7);
		assert_eq!(value["tasks"][0]["task_id"], "a");
		assert_eq!(value["tasks"][0]["due_date_time"], "2026-03-01T12:00:00Z");
		assert_eq!(value["tasks"][0]["created"], "2026-01-01T09:00:00Z");
		assert!(value["tasks"][0]["priority_date"].is_null());
	}

	#[tokio::test]
	async fn slow_reads_time_out() {
		let pending = std::future::pending::<wa_storage::Result<()>>();
		let err =
			bounded(Duration::from_millis(10), pending).await.expect_err("Expected a timeout.");

		assert!(matches!(err, Error::StoreTimeout { timeout_ms: 10 }));
	}

	#[tokio::test]
	async fn read_errors_are_mapped() {
		let err = bounded(Duration::from_secs(1), async {
			Err::<(), _>(wa_storage::Error::NotFound("task".to_string()))
		})
		.await
		.expect_err("Expected the read error.");

		assert!(matches!(err, Error::NotFound { .. }));
	}
}

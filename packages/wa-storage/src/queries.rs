use sqlx::{Executor, Postgres};

use crate::{
	Result,
	models::{TASK_COLUMNS, TaskRoleRow, TaskRow},
};

pub async fn insert_task<'e, E>(executor: E, task: &TaskRow) -> Result<()>
where
	E: Executor<'e, Database = Postgres>,
{
	sqlx::query(
		"\
INSERT INTO tasks (
	task_id,
	task_name,
	task_type,
	title,
	state,
	assignee,
	jurisdiction,
	region,
	location,
	location_name,
	case_id,
	case_type_id,
	case_category,
	case_name,
	work_type,
	role_category,
	security_classification,
	major_priority,
	minor_priority,
	priority_date,
	due_date_time,
	created
)
VALUES (
	$1,
	$2,
	$3,
	$4,
	$5,
	$6,
	$7,
	$8,
	$9,
	$10,
	$11,
	$12,
	$13,
	$14,
	$15,
	$16,
	$17,
	$18,
	$19,
	$20,
	$21,
	$22
)",
	)
	.bind(task.task_id.as_str())
	.bind(task.task_name.as_str())
	.bind(task.task_type.as_deref())
	.bind(task.title.as_deref())
	.bind(task.state.as_str())
	.bind(task.assignee.as_deref())
	.bind(task.jurisdiction.as_str())
	.bind(task.region.as_deref())
	.bind(task.location.as_deref())
	.bind(task.location_name.as_deref())
	.bind(task.case_id.as_str())
	.bind(task.case_type_id.as_deref())
	.bind(task.case_category.as_deref())
	.bind(task.case_name.as_deref())
	.bind(task.work_type.as_deref())
	.bind(task.role_category.as_deref())
	.bind(task.security_classification.as_str())
	.bind(task.major_priority)
	.bind(task.minor_priority)
	.bind(task.priority_date)
	.bind(task.due_date_time)
	.bind(task.created)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn upsert_task_role<'e, E>(executor: E, role: &TaskRoleRow) -> Result<()>
where
	E: Executor<'e, Database = Postgres>,
{
	sqlx::query(
		"\
INSERT INTO task_roles (task_id, role_name, permissions, authorisations, role_category)
VALUES ($1, $2, $3, $4, $5)
ON CONFLICT (task_id, role_name) DO UPDATE
SET
	permissions = EXCLUDED.permissions,
	authorisations = EXCLUDED.authorisations,
	role_category = EXCLUDED.role_category",
	)
	.bind(role.task_id.as_str())
	.bind(role.role_name.as_str())
	.bind(role.permissions.as_slice())
	.bind(role.authorisations.as_slice())
	.bind(role.role_category.as_deref())
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn load_task<'e, E>(executor: E, task_id: &str) -> Result<Option<TaskRow>>
where
	E: Executor<'e, Database = Postgres>,
{
	let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE task_id = $1");
	let row = sqlx::query_as::<_, TaskRow>(sql.as_str())
		.bind(task_id)
		.fetch_optional(executor)
		.await?;

	Ok(row)
}

pub async fn load_task_roles<'e, E>(executor: E, task_id: &str) -> Result<Vec<TaskRoleRow>>
where
	E: Executor<'e, Database = Postgres>,
{
	let rows = sqlx::query_as::<_, TaskRoleRow>(
		"\
SELECT task_id, role_name, permissions, authorisations, role_category
FROM task_roles
WHERE task_id = $1
ORDER BY role_name",
	)
	.bind(task_id)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Next page of task ids in key order, strictly after `after` when given.
pub async fn task_ids_after<'e, E>(
	executor: E,
	after: Option<&str>,
	limit: i64,
) -> Result<Vec<String>>
where
	E: Executor<'e, Database = Postgres>,
{
	let ids = sqlx::query_scalar::<_, String>(
		"\
SELECT task_id
FROM tasks
WHERE $1::text IS NULL OR task_id > $1
ORDER BY task_id
LIMIT $2",
	)
	.bind(after)
	.bind(limit)
	.fetch_all(executor)
	.await?;

	Ok(ids)
}

pub async fn load_task_signatures<'e, E>(executor: E, task_id: &str) -> Result<Option<Vec<String>>>
where
	E: Executor<'e, Database = Postgres>,
{
	let signatures =
		sqlx::query_scalar::<_, Vec<String>>("SELECT signatures FROM tasks WHERE task_id = $1")
			.bind(task_id)
			.fetch_optional(executor)
			.await?;

	Ok(signatures)
}

/// Replaces the stored signature set of one task. Returns `false` when the task does not exist.
pub async fn update_task_signatures<'e, E>(
	executor: E,
	task_id: &str,
	signatures: &[String],
) -> Result<bool>
where
	E: Executor<'e, Database = Postgres>,
{
	let result = sqlx::query("UPDATE tasks SET signatures = $2 WHERE task_id = $1")
		.bind(task_id)
		.bind(signatures)
		.execute(executor)
		.await?;

	Ok(result.rows_affected() > 0)
}

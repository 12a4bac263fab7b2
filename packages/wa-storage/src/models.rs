use time::OffsetDateTime;

/// Columns selected for a task row, in [`TaskRow`] field order. `signatures` is only read by the
/// signature writer and is not listed.
pub const TASK_COLUMNS: &str = "\
task_id, task_name, task_type, title, state, assignee, jurisdiction, region, location, \
location_name, case_id, case_type_id, case_category, case_name, work_type, role_category, \
security_classification, major_priority, minor_priority, priority_date, due_date_time, created";

#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct TaskRow {
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
	pub priority_date: Option<OffsetDateTime>,
	pub due_date_time: Option<OffsetDateTime>,
	pub created: OffsetDateTime,
}

/// Permissions one role holds on one task, as configured upstream.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct TaskRoleRow {
	pub task_id: String,
	pub role_name: String,
	pub permissions: Vec<String>,
	pub authorisations: Vec<String>,
	pub role_category: Option<String>,
}

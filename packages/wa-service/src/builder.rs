//! Translates a validated client query and a user's signature sets into SQL.
//!
//! The count and window statements share one WHERE routine, so a page can never be scoped
//! differently from its total.

use std::collections::{BTreeMap, BTreeSet};

use wa_domain::{Permission, RoleSignature};
use wa_storage::{models::TASK_COLUMNS, statement::Statement};

use crate::query::ValidatedQuery;

/// Product decision for explicit empty filter sets.
pub const EMPTY_FILTER_RULE: EmptyFilterRule = EmptyFilterRule::MatchNothing;

/// How a filter dimension that is present but empty is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmptyFilterRule {
	/// The empty set is bound as-is and matches no row.
	MatchNothing,
	/// The dimension is dropped, the same as when it is absent.
	Unconstrained,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskSearchPlan {
	pub count: Statement,
	pub window: Statement,
}

pub struct TaskSearchQueryBuilder<'a> {
	query: &'a ValidatedQuery,
	signatures: &'a BTreeMap<Permission, BTreeSet<RoleSignature>>,
	excluded_case_ids: &'a BTreeSet<String>,
	empty_filter_rule: EmptyFilterRule,
}
impl<'a> TaskSearchQueryBuilder<'a> {
	/// `signatures` holds one set per required permission; a task must overlap every set.
	pub fn new(
		query: &'a ValidatedQuery,
		signatures: &'a BTreeMap<Permission, BTreeSet<RoleSignature>>,
		excluded_case_ids: &'a BTreeSet<String>,
	) -> Self {
		Self { query, signatures, excluded_case_ids, empty_filter_rule: EMPTY_FILTER_RULE }
	}

	pub fn with_empty_filter_rule(mut self, rule: EmptyFilterRule) -> Self {
		self.empty_filter_rule = rule;

		self
	}

	pub fn build(&self) -> TaskSearchPlan {
		let mut count = Statement::new("SELECT count(*) FROM tasks");

		self.push_where(&mut count);

		let mut window = Statement::new(format!("SELECT {TASK_COLUMNS} FROM tasks"));

		self.push_where(&mut window);
		self.push_order(&mut window);
		window
			.push(" LIMIT ")
			.push_param(self.query.max_results)
			.push(" OFFSET ")
			.push_param(self.query.first_result);

		TaskSearchPlan { count, window }
	}

	fn push_where(&self, statement: &mut Statement) {
		let filter = &self.query.filter;
		let mut clauses = Clauses { statement, started: false };

		for signatures in self.signatures.values() {
			let values: Vec<String> =
				signatures.iter().map(|signature| signature.as_str().to_string()).collect();

			clauses.clause().push("signatures && ").push_param(values).push("::text[]");
		}

		for (column, values) in [
			("state", &filter.states),
			("jurisdiction", &filter.jurisdictions),
			("region", &filter.regions),
			("location", &filter.locations),
			("case_id", &filter.case_ids),
			("work_type", &filter.work_types),
			("role_category", &filter.role_categories),
			("assignee", &filter.assignees),
		] {
			let Some(values) = values else {
				continue;
			};

			if values.is_empty() && self.empty_filter_rule == EmptyFilterRule::Unconstrained {
				continue;
			}

			clauses.clause().push(column).push(" = ANY(").push_param(values.clone()).push(")");
		}

		if filter.available_only {
			clauses.clause().push("assignee IS NULL");
		}

		if !self.excluded_case_ids.is_empty() {
			let excluded = self.excluded_case_ids.iter().cloned().collect::<Vec<_>>();

			clauses.clause().push("NOT (case_id = ANY(").push_param(excluded).push("))");
		}
	}

	fn push_order(&self, statement: &mut Statement) {
		statement.push(" ORDER BY ");

		for key in &self.query.sort {
			statement
				.push(key.column.as_sql())
				.push(" ")
				.push(key.direction.as_sql())
				.push(" NULLS LAST, ");
		}

		statement.push("task_id ASC");
	}
}

struct Clauses<'s> {
	statement: &'s mut Statement,
	started: bool,
}
impl Clauses<'_> {
	fn clause(&mut self) -> &mut Statement {
		self.statement.push(if self.started { " AND " } else { " WHERE " });

		self.started = true;

		&mut *self.statement
	}
}

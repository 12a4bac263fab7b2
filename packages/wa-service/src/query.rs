//! Client search requests and their validation.
//!
//! Validation runs before any store access; every rejection is [`Error::InvalidRequest`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use wa_domain::Permission;

use crate::{Error, Result};

/// Every accepted sort spelling and the task column it orders by. Lookup is case-sensitive.
pub const SORT_COLUMNS: [(&str, SortColumn); 23] = [
	("dueDate", SortColumn::DueDateTime),
	("due_date", SortColumn::DueDateTime),
	("dueDateTime", SortColumn::DueDateTime),
	("caseCategory", SortColumn::CaseCategory),
	("case_category", SortColumn::CaseCategory),
	("caseTypeCategory", SortColumn::CaseCategory),
	("caseName", SortColumn::CaseName),
	("case_name", SortColumn::CaseName),
	("caseId", SortColumn::CaseId),
	("case_id", SortColumn::CaseId),
	("locationName", SortColumn::LocationName),
	("location_name", SortColumn::LocationName),
	("taskTitle", SortColumn::Title),
	("task_title", SortColumn::Title),
	("majorPriority", SortColumn::MajorPriority),
	("major_priority", SortColumn::MajorPriority),
	("minorPriority", SortColumn::MinorPriority),
	("minor_priority", SortColumn::MinorPriority),
	("priorityDate", SortColumn::PriorityDate),
	("priority_date", SortColumn::PriorityDate),
	("created", SortColumn::Created),
	("assignee", SortColumn::Assignee),
	("state", SortColumn::State),
];

/// Filter dimensions. `None` means the dimension is absent; `Some(vec![])` is an explicit empty
/// set and is resolved by [`crate::EmptyFilterRule`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientFilter {
	pub states: Option<Vec<String>>,
	pub jurisdictions: Option<Vec<String>>,
	pub regions: Option<Vec<String>>,
	pub locations: Option<Vec<String>>,
	pub case_ids: Option<Vec<String>>,
	pub work_types: Option<Vec<String>>,
	pub role_categories: Option<Vec<String>>,
	pub assignees: Option<Vec<String>>,
	/// Extra permissions the caller must hold on every returned task.
	pub permissions: Option<Vec<Permission>>,
	/// Only tasks without an assignee.
	pub available_only: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
	pub first_result: Option<i64>,
	pub max_results: Option<i64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
	#[default]
	#[serde(alias = "ASC")]
	Asc,
	#[serde(alias = "DESC")]
	Desc,
}
impl SortDirection {
	pub fn as_sql(&self) -> &'static str {
		match self {
			Self::Asc => "ASC",
			Self::Desc => "DESC",
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortBy {
	pub column: String,
	#[serde(default)]
	pub direction: SortDirection,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SortColumn {
	DueDateTime,
	CaseCategory,
	CaseName,
	CaseId,
	LocationName,
	Title,
	MajorPriority,
	MinorPriority,
	PriorityDate,
	Created,
	Assignee,
	State,
}
impl SortColumn {
	pub fn parse(name: &str) -> Option<Self> {
		SORT_COLUMNS.iter().find(|(spelling, _)| *spelling == name).map(|(_, column)| *column)
	}

	pub fn as_sql(&self) -> &'static str {
		match self {
			Self::DueDateTime => "due_date_time",
			Self::CaseCategory => "case_category",
			Self::CaseName => "case_name",
			Self::CaseId => "case_id",
			Self::LocationName => "location_name",
			Self::Title => "title",
			Self::MajorPriority => "major_priority",
			Self::MinorPriority => "minor_priority",
			Self::PriorityDate => "priority_date",
			Self::Created => "created",
			Self::Assignee => "assignee",
			Self::State => "state",
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientQuery {
	pub filter: ClientFilter,
	pub pagination: Pagination,
	pub sort_by: Vec<SortBy>,
}
impl ClientQuery {
	/// Resolves defaults and rejects malformed requests.
	///
	/// `first_result` defaults to 0 and `max_results` to `cfg.default_page_size`; the page size
	/// must stay within `1..=cfg.max_page_size`. The states filter is mandatory.
	pub fn validate(&self, cfg: &wa_config::Search) -> Result<ValidatedQuery> {
		if self.filter.states.is_none() {
			return Err(invalid("filter.states is required."));
		}

		let first_result = self.pagination.first_result.unwrap_or(0);

		if first_result < 0 {
			return Err(invalid("pagination.first_result must be zero or greater."));
		}

		let max_page_size = i64::from(cfg.max_page_size);
		let max_results = self.pagination.max_results.unwrap_or(i64::from(cfg.default_page_size));

		if !(1..=max_page_size).contains(&max_results) {
			return Err(invalid(format!(
				"pagination.max_results must be between 1 and {max_page_size}."
			)));
		}

		let mut seen = BTreeSet::new();
		let mut sort = Vec::with_capacity(self.sort_by.len());

		for sort_by in &self.sort_by {
			let Some(column) = SortColumn::parse(&sort_by.column) else {
				return Err(invalid(format!("Unknown sort column '{}'.", sort_by.column)));
			};

			// A repeated column cannot change the order; keep the first direction.
			if seen.insert(column.as_sql()) {
				sort.push(SortKey { column, direction: sort_by.direction });
			}
		}

		if sort.is_empty() {
			sort.push(SortKey { column: SortColumn::DueDateTime, direction: SortDirection::Asc });
		}

		let extra_permissions =
			self.filter.permissions.iter().flatten().copied().collect::<BTreeSet<_>>();

		Ok(ValidatedQuery {
			filter: self.filter.clone(),
			extra_permissions,
			first_result,
			max_results,
			sort,
		})
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortKey {
	pub column: SortColumn,
	pub direction: SortDirection,
}

/// A query that passed validation, with defaults applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedQuery {
	pub filter: ClientFilter,
	pub extra_permissions: BTreeSet<Permission>,
	pub first_result: i64,
	pub max_results: i64,
	/// Never empty. `task_id` is appended by the builder, not stored here.
	pub sort: Vec<SortKey>,
}
impl ValidatedQuery {
	/// The search permission plus every permission the filter asks for.
	pub fn required_permissions(&self, permission: Permission) -> BTreeSet<Permission> {
		let mut required = self.extra_permissions.clone();

		required.insert(permission);

		required
	}
}

fn invalid(message: impl Into<String>) -> Error {
	Error::InvalidRequest { message: message.into() }
}

use std::collections::{BTreeMap, BTreeSet, HashSet};

use time::OffsetDateTime;
use unicode_normalization::UnicodeNormalization;

use crate::role::{Classification, GrantType, RoleAssignment, RoleCategory, RoleType};

/// Request-scoped aggregate of one actor's role assignments.
#[derive(Clone, Debug)]
pub struct User {
	pub actor_id: String,
	pub role_assignments: Vec<RoleAssignment>,
}
impl User {
	pub fn new(actor_id: impl Into<String>, role_assignments: Vec<RoleAssignment>) -> Self {
		Self { actor_id: actor_id.into(), role_assignments }
	}

	pub fn classify(&self, now: OffsetDateTime) -> ClassifiedRoles {
		classify(&self.role_assignments, now)
	}
}

/// The access-relevant projection of a role assignment. Text values are canonical and
/// authorisations are sorted, so two access-equivalent assignments compare equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccessRole {
	pub role_type: RoleType,
	pub role_name: String,
	pub classification: Classification,
	pub grant_type: GrantType,
	pub role_category: RoleCategory,
	pub jurisdiction: Option<String>,
	pub region: Option<String>,
	pub location: Option<String>,
	pub case_id: Option<String>,
	pub authorisations: Vec<String>,
}
impl AccessRole {
	pub fn from_assignment(assignment: &RoleAssignment) -> Self {
		let authorisations = assignment
			.authorisations
			.iter()
			.map(|value| canonical_value(value))
			.filter(|value| !value.is_empty())
			.collect::<BTreeSet<_>>()
			.into_iter()
			.collect();
		let (region, location, case_id) = match assignment.role_type {
			RoleType::Case => (None, None, assignment.case_id().map(canonical_value)),
			_ => (
				assignment.region().map(canonical_value),
				assignment.location().map(canonical_value),
				None,
			),
		};

		Self {
			role_type: assignment.role_type,
			role_name: canonical_value(&assignment.role_name),
			classification: assignment.classification,
			grant_type: assignment.grant_type,
			role_category: assignment.role_category,
			jurisdiction: assignment.jurisdiction().map(canonical_value),
			region,
			location,
			case_id,
			authorisations,
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassifiedRoles {
	pub organisational: Vec<AccessRole>,
	pub case: BTreeMap<String, Vec<AccessRole>>,
	/// Cases the actor is explicitly excluded from, regardless of any other grant.
	pub excluded_case_ids: BTreeSet<String>,
	/// Assignments dropped because they cannot be scoped (unknown role type, case role without a
	/// case id).
	pub rejected: usize,
	/// Assignments dropped because `now` is outside their validity window.
	pub inactive: usize,
}
impl ClassifiedRoles {
	pub fn roles(&self) -> impl Iterator<Item = &AccessRole> {
		self.organisational.iter().chain(self.case.values().flatten())
	}

	pub fn len(&self) -> usize {
		self.organisational.len() + self.case.values().map(Vec::len).sum::<usize>()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Partitions assignments into organisational and case roles, dropping exact duplicates.
///
/// Duplicates are detected on [`AccessRole`] with one hash-set insert per assignment. Only the
/// distinct roles are sorted, so the output does not depend on input order.
pub fn classify(assignments: &[RoleAssignment], now: OffsetDateTime) -> ClassifiedRoles {
	let mut organisational = HashSet::new();
	let mut case: BTreeMap<String, HashSet<AccessRole>> = BTreeMap::new();
	let mut excluded_case_ids = BTreeSet::new();
	let mut rejected = 0;
	let mut inactive = 0;

	for assignment in assignments {
		if !assignment.is_active_at(now) {
			inactive += 1;

			continue;
		}

		let role = AccessRole::from_assignment(assignment);

		match role.role_type {
			RoleType::Organisation => {
				organisational.insert(role);
			},
			RoleType::Case => {
				let Some(case_id) = role.case_id.clone() else {
					rejected += 1;

					continue;
				};

				if role.grant_type == GrantType::Excluded {
					excluded_case_ids.insert(case_id);

					continue;
				}

				case.entry(case_id).or_default().insert(role);
			},
			RoleType::Unknown => rejected += 1,
		}
	}

	ClassifiedRoles {
		organisational: sorted(organisational),
		case: case.into_iter().map(|(case_id, roles)| (case_id, sorted(roles))).collect(),
		excluded_case_ids,
		rejected,
		inactive,
	}
}

fn sorted(roles: HashSet<AccessRole>) -> Vec<AccessRole> {
	let mut roles = roles.into_iter().collect::<Vec<_>>();

	roles.sort_unstable();

	roles
}

/// NFKC, trimmed, lower-cased. Shared by access keys and signature slots.
pub(crate) fn canonical_value(value: &str) -> String {
	value.nfkc().collect::<String>().trim().to_lowercase()
}

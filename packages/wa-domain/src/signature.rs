//! Canonical role signatures.
//!
//! A signature is the `:`-joined tuple of the access-relevant fields of one grant. The same
//! encoder produces both the signatures stored against tasks and the signatures computed for a
//! searching user, so a task is visible when the two sets overlap.
//!
//! Slots that do not constrain access hold [`WILDCARD`]. Field values are canonicalised (NFKC,
//! trimmed, lower-cased) and escaped: `\` becomes `\\`, `:` becomes `\:`, and a literal `*`
//! becomes `\*`.

use std::{
	collections::BTreeSet,
	fmt::{Display, Formatter},
	iter,
};

use serde::{Deserialize, Serialize};

use crate::{
	classifier::{AccessRole, ClassifiedRoles, canonical_value},
	role::{Classification, GrantType, Permission, RoleCategory, RoleType},
};

pub const WILDCARD: &str = "*";
/// Grant types that confer task visibility. Tasks never store signatures for other grant types.
pub const ACCESS_GRANT_TYPES: [GrantType; 3] =
	[GrantType::Standard, GrantType::Specific, GrantType::Challenged];

const DELIMITER: char = ':';
const ESCAPE: char = '\\';

/// The two interchangeable signature shapes.
///
/// `Legacy` prefixes organisational signatures with `o` and case signatures with `c`, and only
/// writes the slots that apply to each role type. `Uniform` writes every slot under a single `r`
/// prefix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SignatureFormat {
	Legacy,
	#[default]
	Uniform,
}
impl SignatureFormat {
	pub fn from_uniform_flag(uniform: bool) -> Self {
		if uniform { Self::Uniform } else { Self::Legacy }
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSignature(String);
impl RoleSignature {
	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn into_string(self) -> String {
		self.0
	}
}
impl Display for RoleSignature {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		self.0.fmt(f)
	}
}

/// One grant, in canonical field order. `None` slots encode as [`WILDCARD`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignatureFields<'a> {
	pub role_type: RoleType,
	pub jurisdiction: Option<&'a str>,
	pub region: Option<&'a str>,
	pub location: Option<&'a str>,
	pub case_id: Option<&'a str>,
	pub role_name: &'a str,
	pub role_category: Option<RoleCategory>,
	pub grant_type: GrantType,
	pub classification: Classification,
	pub authorisation: Option<&'a str>,
	pub permission: Permission,
}

/// Where a task sits, as far as access is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskAccessContext<'a> {
	pub jurisdiction: Option<&'a str>,
	pub region: Option<&'a str>,
	pub location: Option<&'a str>,
	pub case_id: Option<&'a str>,
	pub classification: Classification,
}

/// What a role needs to hold to act on a task: the task-side descriptor of one role grant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessRequirement {
	pub role_name: String,
	pub permissions: BTreeSet<Permission>,
	/// Any one of these is sufficient. Empty means no authorisation is required.
	pub authorisations: Vec<String>,
	pub role_category: Option<RoleCategory>,
}

pub fn encode(fields: &SignatureFields<'_>, format: SignatureFormat) -> RoleSignature {
	let mut out = String::with_capacity(128);
	let is_case = fields.role_type == RoleType::Case;
	// Organisational roles never carry a case id; case roles are not narrowed by region or
	// location.
	let region = if is_case { None } else { fields.region };
	let location = if is_case { None } else { fields.location };
	let case_id = if is_case { fields.case_id } else { None };

	match format {
		SignatureFormat::Uniform => {
			out.push('r');
			push_slot(&mut out, fields.jurisdiction);
			push_slot(&mut out, region);
			push_slot(&mut out, location);
			push_slot(&mut out, case_id);
		},
		SignatureFormat::Legacy if is_case => {
			out.push('c');
			push_slot(&mut out, fields.jurisdiction);
			push_slot(&mut out, case_id);
		},
		SignatureFormat::Legacy => {
			out.push('o');
			push_slot(&mut out, fields.jurisdiction);
			push_slot(&mut out, region);
			push_slot(&mut out, location);
		},
	}

	push_slot(&mut out, Some(fields.role_name));
	push_code(&mut out, fields.role_category.map(|category| category.as_str()));
	push_code(&mut out, Some(fields.grant_type.as_str()));
	push_code(&mut out, Some(fields.classification.as_str()));
	push_slot(&mut out, fields.authorisation);
	push_code(&mut out, Some(fields.permission.as_str()));

	RoleSignature(out)
}

/// Signatures a user presents when searching for tasks they hold `permission` on.
pub fn user_signatures(
	roles: &ClassifiedRoles,
	permission: Permission,
	format: SignatureFormat,
) -> BTreeSet<RoleSignature> {
	let mut out = BTreeSet::new();

	for role in roles.roles() {
		push_role_signatures(&mut out, role, permission, format);
	}

	out
}

/// Signatures stored against a task: every shape under which some role may see it.
pub fn task_signatures(
	task: &TaskAccessContext<'_>,
	requirements: &[AccessRequirement],
	format: SignatureFormat,
) -> BTreeSet<RoleSignature> {
	let mut out = BTreeSet::new();

	for requirement in requirements {
		let authorisations: Vec<Option<&str>> = if requirement.authorisations.is_empty() {
			vec![None]
		} else {
			requirement.authorisations.iter().map(|value| Some(value.as_str())).collect()
		};

		for &permission in &requirement.permissions {
			for grant_type in ACCESS_GRANT_TYPES {
				for &authorisation in &authorisations {
					for role_type in [RoleType::Organisation, RoleType::Case] {
						for (jurisdiction, region, location, case_id) in
							attribute_variants(task, role_type)
						{
							out.insert(encode(
								&SignatureFields {
									role_type,
									jurisdiction,
									region,
									location,
									case_id,
									role_name: requirement.role_name.as_str(),
									role_category: requirement.role_category,
									grant_type,
									classification: task.classification,
									authorisation,
									permission,
								},
								format,
							));
						}
					}
				}
			}
		}
	}

	out
}

fn push_role_signatures(
	out: &mut BTreeSet<RoleSignature>,
	role: &AccessRole,
	permission: Permission,
	format: SignatureFormat,
) {
	let authorisations = iter::once(None)
		.chain(role.authorisations.iter().map(|value| Some(value.as_str())))
		.collect::<Vec<_>>();

	for &classification in role.classification.visible_levels() {
		for &authorisation in &authorisations {
			for role_category in [None, Some(role.role_category)] {
				out.insert(encode(
					&SignatureFields {
						role_type: role.role_type,
						jurisdiction: role.jurisdiction.as_deref(),
						region: role.region.as_deref(),
						location: role.location.as_deref(),
						case_id: role.case_id.as_deref(),
						role_name: role.role_name.as_str(),
						role_category,
						grant_type: role.grant_type,
						classification,
						authorisation,
						permission,
					},
					format,
				));
			}
		}
	}
}

type AttributeVariant<'a> = (Option<&'a str>, Option<&'a str>, Option<&'a str>, Option<&'a str>);

/// Every combination of concrete and wildcard attribute slots a user role of `role_type` could
/// present for this task.
fn attribute_variants<'a>(
	task: &TaskAccessContext<'a>,
	role_type: RoleType,
) -> Vec<AttributeVariant<'a>> {
	let mut out = Vec::new();

	match role_type {
		RoleType::Case => {
			let Some(case_id) = task.case_id else {
				return out;
			};

			for jurisdiction in with_wildcard(task.jurisdiction) {
				out.push((jurisdiction, None, None, Some(case_id)));
			}
		},
		_ =>
			for jurisdiction in with_wildcard(task.jurisdiction) {
				for region in with_wildcard(task.region) {
					for location in with_wildcard(task.location) {
						out.push((jurisdiction, region, location, None));
					}
				}
			},
	}

	out
}

fn with_wildcard(value: Option<&str>) -> Vec<Option<&str>> {
	match value.filter(|value| !value.trim().is_empty()) {
		Some(value) => vec![Some(value), None],
		None => vec![None],
	}
}

fn push_slot(out: &mut String, value: Option<&str>) {
	out.push(DELIMITER);

	let Some(value) = value else {
		out.push_str(WILDCARD);

		return;
	};
	let canonical = canonical_value(value);

	if canonical == WILDCARD {
		out.push(ESCAPE);
		out.push_str(WILDCARD);

		return;
	}

	for ch in canonical.chars() {
		if ch == DELIMITER || ch == ESCAPE {
			out.push(ESCAPE);
		}

		out.push(ch);
	}
}

// Enum codes are fixed lower-case identifiers and never need escaping.
fn push_code(out: &mut String, code: Option<&str>) {
	out.push(DELIMITER);
	out.push_str(code.unwrap_or(WILDCARD));
}

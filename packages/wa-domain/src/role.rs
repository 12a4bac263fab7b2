use std::{
	collections::BTreeMap,
	fmt::{Display, Formatter},
	str::FromStr,
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const ATTR_JURISDICTION: &str = "jurisdiction";
pub const ATTR_REGION: &str = "region";
pub const ATTR_PRIMARY_LOCATION: &str = "primaryLocation";
pub const ATTR_BASE_LOCATION: &str = "baseLocation";
pub const ATTR_CASE_ID: &str = "caseId";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownVariant {
	kind: &'static str,
	value: String,
}
impl Display for UnknownVariant {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "unknown {} '{}'", self.kind, self.value)
	}
}

impl std::error::Error for UnknownVariant {}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorIdType {
	Idam,
	#[default]
	#[serde(other)]
	Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleType {
	Organisation,
	Case,
	#[serde(other)]
	Unknown,
}
impl RoleType {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Organisation => "organisation",
			Self::Case => "case",
			Self::Unknown => "unknown",
		}
	}
}

/// Sensitivity level. A role of a given level can see tasks at that level and every level below.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
	Public,
	Private,
	Restricted,
	#[serde(other)]
	Unknown,
}
impl Classification {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Public => "public",
			Self::Private => "private",
			Self::Restricted => "restricted",
			Self::Unknown => "unknown",
		}
	}

	pub fn visible_levels(&self) -> &'static [Classification] {
		match self {
			Self::Public => &[Self::Public],
			Self::Private => &[Self::Public, Self::Private],
			Self::Restricted => &[Self::Public, Self::Private, Self::Restricted],
			Self::Unknown => &[],
		}
	}
}
impl FromStr for Classification {
	type Err = UnknownVariant;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_uppercase().as_str() {
			"PUBLIC" => Ok(Self::Public),
			"PRIVATE" => Ok(Self::Private),
			"RESTRICTED" => Ok(Self::Restricted),
			"UNKNOWN" => Ok(Self::Unknown),
			_ => Err(UnknownVariant { kind: "classification", value: s.to_string() }),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GrantType {
	Basic,
	Specific,
	Standard,
	Challenged,
	Excluded,
	#[serde(other)]
	Unknown,
}
impl GrantType {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Basic => "basic",
			Self::Specific => "specific",
			Self::Standard => "standard",
			Self::Challenged => "challenged",
			Self::Excluded => "excluded",
			Self::Unknown => "unknown",
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleCategory {
	Judicial,
	Staff,
	LegalOperations,
	#[default]
	#[serde(other)]
	Unknown,
}
impl RoleCategory {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Judicial => "judicial",
			Self::Staff => "staff",
			Self::LegalOperations => "legal_operations",
			Self::Unknown => "unknown",
		}
	}
}
impl FromStr for RoleCategory {
	type Err = UnknownVariant;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_uppercase().as_str() {
			"JUDICIAL" => Ok(Self::Judicial),
			"STAFF" => Ok(Self::Staff),
			"LEGAL_OPERATIONS" => Ok(Self::LegalOperations),
			"UNKNOWN" => Ok(Self::Unknown),
			_ => Err(UnknownVariant { kind: "role category", value: s.to_string() }),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
	Read,
	Own,
	Execute,
	Manage,
	Cancel,
	Refer,
	Complete,
	Claim,
	Assign,
	Unassign,
}
impl Permission {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Read => "read",
			Self::Own => "own",
			Self::Execute => "execute",
			Self::Manage => "manage",
			Self::Cancel => "cancel",
			Self::Refer => "refer",
			Self::Complete => "complete",
			Self::Claim => "claim",
			Self::Assign => "assign",
			Self::Unassign => "unassign",
		}
	}
}
impl FromStr for Permission {
	type Err = UnknownVariant;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_uppercase().as_str() {
			"READ" => Ok(Self::Read),
			"OWN" => Ok(Self::Own),
			"EXECUTE" => Ok(Self::Execute),
			"MANAGE" => Ok(Self::Manage),
			"CANCEL" => Ok(Self::Cancel),
			"REFER" => Ok(Self::Refer),
			"COMPLETE" => Ok(Self::Complete),
			"CLAIM" => Ok(Self::Claim),
			"ASSIGN" => Ok(Self::Assign),
			"UNASSIGN" => Ok(Self::Unassign),
			_ => Err(UnknownVariant { kind: "permission", value: s.to_string() }),
		}
	}
}

impl Display for Permission {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		self.as_str().fmt(f)
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
	pub id: String,
	pub actor_id: String,
	#[serde(default)]
	pub actor_id_type: ActorIdType,
	pub role_type: RoleType,
	pub role_name: String,
	pub classification: Classification,
	pub grant_type: GrantType,
	#[serde(default)]
	pub role_category: RoleCategory,
	#[serde(default)]
	pub attributes: BTreeMap<String, String>,
	#[serde(default)]
	pub authorisations: Vec<String>,
	#[serde(default, with = "crate::time_serde::option")]
	pub begin_time: Option<OffsetDateTime>,
	#[serde(default, with = "crate::time_serde::option")]
	pub end_time: Option<OffsetDateTime>,
}
impl RoleAssignment {
	pub fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes.get(name).map(|value| value.trim()).filter(|value| !value.is_empty())
	}

	pub fn jurisdiction(&self) -> Option<&str> {
		self.attribute(ATTR_JURISDICTION)
	}

	pub fn region(&self) -> Option<&str> {
		self.attribute(ATTR_REGION)
	}

	pub fn location(&self) -> Option<&str> {
		self.attribute(ATTR_PRIMARY_LOCATION).or_else(|| self.attribute(ATTR_BASE_LOCATION))
	}

	pub fn case_id(&self) -> Option<&str> {
		self.attribute(ATTR_CASE_ID)
	}

	/// Open bounds are unbounded; `begin_time` is inclusive and `end_time` exclusive.
	pub fn is_active_at(&self, now: OffsetDateTime) -> bool {
		if self.begin_time.map(|begin| begin > now).unwrap_or(false) {
			return false;
		}

		self.end_time.map(|end| end > now).unwrap_or(true)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn classification_levels_are_cumulative() {
		assert_eq!(Classification::Public.visible_levels(), &[Classification::Public]);
		assert_eq!(Classification::Restricted.visible_levels().len(), 3);
		assert!(Classification::Unknown.visible_levels().is_empty());
	}

	#[test]
	fn permission_parses_case_insensitively() {
		assert_eq!("Read".parse::<Permission>(), Ok(Permission::Read));
		assert_eq!(" EXECUTE ".parse::<Permission>(), Ok(Permission::Execute));

		let err = "teleport".parse::<Permission>().expect_err("expected unknown permission");

		assert_eq!(err.to_string(), "unknown permission 'teleport'");
	}

	#[test]
	fn unknown_enum_strings_deserialize_to_unknown() {
		let raw = serde_json::json!({
			"id": "1",
			"actorId": "a",
			"roleType": "ORGANISATION",
			"roleName": "r",
			"classification": "TOP_SECRET",
			"grantType": "SOMETHING_NEW",
			"roleCategory": "ADMIN",
		});
		let assignment: RoleAssignment =
			serde_json::from_value(raw).expect("Failed to parse role assignment.");

		assert_eq!(assignment.classification, Classification::Unknown);
		assert_eq!(assignment.grant_type, GrantType::Unknown);
		assert_eq!(assignment.role_category, RoleCategory::Unknown);
		assert_eq!(assignment.actor_id_type, ActorIdType::Unknown);
	}
}

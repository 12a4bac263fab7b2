pub mod classifier;
pub mod role;
pub mod signature;
pub mod time_serde;

pub use classifier::{AccessRole, ClassifiedRoles, User, classify};
pub use role::{
	ActorIdType, Classification, GrantType, Permission, RoleAssignment, RoleCategory, RoleType,
	UnknownVariant,
};
pub use signature::{
	ACCESS_GRANT_TYPES, AccessRequirement, RoleSignature, SignatureFields, SignatureFormat,
	TaskAccessContext, WILDCARD, encode, task_signatures, user_signatures,
};

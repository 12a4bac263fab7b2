pub mod assembler;
pub mod builder;
pub mod query;
pub mod search;
pub mod signatures;

mod error;

pub use assembler::{SearchResult, TaskSummary};
pub use builder::{EMPTY_FILTER_RULE, EmptyFilterRule, TaskSearchPlan, TaskSearchQueryBuilder};
pub use error::{Error, Result};
pub use query::{ClientFilter, ClientQuery, Pagination, SortBy, SortColumn, SortDirection};
pub use signatures::BackfillReport;

use std::{collections::BTreeMap, future::Future, pin::Pin, sync::Arc};

use wa_config::Config;
use wa_domain::{RoleAssignment, SignatureFormat};
use wa_storage::db::Db;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Source of a user's role assignments. Failures are fatal to the request that needed them.
pub trait RoleAssignmentProvider
where
	Self: Send + Sync,
{
	fn role_assignments<'a>(
		&'a self,
		actor_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<RoleAssignment>>>;
}

/// In-memory assignments keyed by actor id. Unknown actors have no assignments.
#[derive(Clone, Debug, Default)]
pub struct StaticRoleAssignments {
	by_actor: BTreeMap<String, Vec<RoleAssignment>>,
}
impl StaticRoleAssignments {
	pub fn new(assignments: Vec<RoleAssignment>) -> Self {
		let mut by_actor: BTreeMap<String, Vec<RoleAssignment>> = BTreeMap::new();

		for assignment in assignments {
			by_actor.entry(assignment.actor_id.clone()).or_default().push(assignment);
		}

		Self { by_actor }
	}

	/// Parses a JSON array of role assignments.
	pub fn from_json(raw: &str) -> Result<Self> {
		let assignments: Vec<RoleAssignment> = serde_json::from_str(raw).map_err(|err| {
			Error::RoleAssignments { message: format!("Failed to parse role assignments: {err}.") }
		})?;

		Ok(Self::new(assignments))
	}
}

impl RoleAssignmentProvider for StaticRoleAssignments {
	fn role_assignments<'a>(
		&'a self,
		actor_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<RoleAssignment>>> {
		let assignments = self.by_actor.get(actor_id).cloned().unwrap_or_default();

		Box::pin(async move { Ok(assignments) })
	}
}

pub struct TaskSearchService {
	pub cfg: Config,
	pub db: Db,
	pub roles: Arc<dyn RoleAssignmentProvider>,
}
impl TaskSearchService {
	pub fn new(cfg: Config, db: Db, roles: Arc<dyn RoleAssignmentProvider>) -> Self {
		Self { cfg, db, roles }
	}

	/// Encoding shared by the signature writer and the search path.
	pub fn signature_format(&self) -> SignatureFormat {
		SignatureFormat::from_uniform_flag(self.cfg.search.uniform_role_signatures)
	}
}

use std::{
	collections::{BTreeMap, BTreeSet},
	time::{Duration, Instant},
};

use time::OffsetDateTime;
use wa_domain::{ClassifiedRoles, Permission, RoleSignature, User, user_signatures};
use wa_storage::statement::ExplainMode;

use crate::{
	Result, TaskSearchService,
	assembler::{self, SearchResult},
	builder::{TaskSearchPlan, TaskSearchQueryBuilder},
	query::{ClientQuery, ValidatedQuery},
};

impl TaskSearchService {
	/// Searches the tasks `actor_id` holds `permission` on.
	///
	/// The query is validated before role assignments are loaded or the store is touched.
	pub async fn search(
		&self,
		actor_id: &str,
		query: &ClientQuery,
		permission: Permission,
	) -> Result<SearchResult> {
		let validated = query.validate(&self.cfg.search)?;
		let assignments = self.roles.role_assignments(actor_id).await?;
		let user = User::new(actor_id, assignments);

		self.run_search(&user, &validated, permission).await
	}

	pub async fn search_for_user(
		&self,
		user: &User,
		query: &ClientQuery,
		permission: Permission,
	) -> Result<SearchResult> {
		let validated = query.validate(&self.cfg.search)?;

		self.run_search(user, &validated, permission).await
	}

	/// Returns the store's plan for the window statement the search would run.
	pub async fn explain(
		&self,
		user: &User,
		query: &ClientQuery,
		permission: Permission,
		mode: ExplainMode,
	) -> Result<Vec<String>> {
		let validated = query.validate(&self.cfg.search)?;
		let plan = self.plan(user, &validated, permission);
		let timeout = self.statement_timeout();

		assembler::bounded(timeout, async {
			let mut tx = self.db.begin_bounded(timeout).await?;
			let lines = plan.window.explain(&mut tx, mode).await?;

			tx.commit().await?;

			Ok::<_, wa_storage::Error>(lines)
		})
		.await
	}

	async fn run_search(
		&self,
		user: &User,
		validated: &ValidatedQuery,
		permission: Permission,
	) -> Result<SearchResult> {
		let started = Instant::now();
		let plan = self.plan(user, validated, permission);
		let result = assembler::assemble(&self.db, &plan, self.statement_timeout()).await?;

		tracing::info!(
			actor_id = %user.actor_id,
			permission = %permission,
			total = result.total_count,
			returned = result.tasks.len(),
			elapsed_ms = started.elapsed().as_millis() as u64,
			"Task search completed."
		);

		Ok(result)
	}

	fn plan(
		&self,
		user: &User,
		validated: &ValidatedQuery,
		permission: Permission,
	) -> TaskSearchPlan {
		let classified = user.classify(OffsetDateTime::now_utc());

		log_classification(&user.actor_id, &classified);

		let format = self.signature_format();
		let signatures = validated
			.required_permissions(permission)
			.into_iter()
			.map(|required| (required, user_signatures(&classified, required, format)))
			.collect::<BTreeMap<Permission, BTreeSet<RoleSignature>>>();

		tracing::debug!(
			actor_id = %user.actor_id,
			roles = classified.len(),
			excluded_cases = classified.excluded_case_ids.len(),
			signatures = signatures.values().map(BTreeSet::len).sum::<usize>(),
			"Encoded user signatures."
		);

		TaskSearchQueryBuilder::new(validated, &signatures, &classified.excluded_case_ids).build()
	}

	fn statement_timeout(&self) -> Duration {
		Duration::from_millis(self.cfg.search.statement_timeout_ms)
	}
}

fn log_classification(actor_id: &str, classified: &ClassifiedRoles) {
	if classified.rejected > 0 {
		tracing::warn!(
			actor_id = %actor_id,
			rejected = classified.rejected,
			"Ignoring role assignments without the attributes their role type requires."
		);
	}
	if classified.inactive > 0 {
		tracing::debug!(
			actor_id = %actor_id,
			inactive = classified.inactive,
			"Ignoring role assignments outside their validity window."
		);
	}
}

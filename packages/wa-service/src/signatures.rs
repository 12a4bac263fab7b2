//! Writes the signature set stored against each task.
//!
//! The writer and the search path read the same `search.uniform_role_signatures` switch. After
//! flipping it, run [`TaskSearchService::backfill_signatures`] so stored tasks match what users
//! present.

use std::{collections::BTreeSet, time::Duration};

use serde::Serialize;
use sqlx::PgConnection;
use wa_domain::{
	AccessRequirement, Classification, Permission, RoleCategory, SignatureFormat,
	TaskAccessContext, task_signatures,
};
use wa_storage::{
	models::{TaskRoleRow, TaskRow},
	queries,
};

use crate::{Error, Result, TaskSearchService, assembler};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
	pub tasks_updated: u64,
	pub signatures_written: u64,
}

impl TaskSearchService {
	/// Recomputes and stores the signatures of one task. Returns the number stored.
	pub async fn refresh_task_signatures(&self, task_id: &str) -> Result<usize> {
		let format = self.signature_format();
		let timeout = Duration::from_millis(self.cfg.search.statement_timeout_ms);
		let written = assembler::bounded(timeout, async {
			let mut tx = self.db.begin_bounded(timeout).await?;
			let written = refresh_one(&mut *tx, task_id, format).await?;

			tx.commit().await?;

			Ok::<_, wa_storage::Error>(written)
		})
		.await?;
		let Some(written) = written else {
			return Err(Error::NotFound { message: format!("task {task_id}") });
		};

		tracing::info!(task_id, signatures = written, "Refreshed task signatures.");

		Ok(written)
	}

	/// Re-encodes every stored task in `task_id` order, one transaction per batch.
	pub async fn backfill_signatures(&self, batch_size: u32) -> Result<BackfillReport> {
		if batch_size == 0 {
			return Err(Error::InvalidRequest {
				message: "batch_size must be greater than zero.".to_string(),
			});
		}

		let format = self.signature_format();
		let timeout = Duration::from_millis(self.cfg.search.statement_timeout_ms);
		let mut report = BackfillReport::default();
		let mut after: Option<String> = None;

		loop {
			let batch = assembler::bounded(timeout, async {
				let mut tx = self.db.begin_bounded(timeout).await?;
				let ids =
					queries::task_ids_after(&mut *tx, after.as_deref(), i64::from(batch_size))
						.await?;
				let mut batch = BackfillReport::default();

				for task_id in &ids {
					if let Some(written) = refresh_one(&mut *tx, task_id, format).await? {
						batch.tasks_updated += 1;
						batch.signatures_written += written as u64;
					}
				}

				tx.commit().await?;

				Ok::<_, wa_storage::Error>((ids.last().cloned(), batch))
			})
			.await?;
			let (last, batch) = batch;

			report.tasks_updated += batch.tasks_updated;
			report.signatures_written += batch.signatures_written;

			let Some(last) = last else {
				break;
			};

			tracing::debug!(
				last_task_id = %last,
				tasks_updated = report.tasks_updated,
				"Backfilled signature batch."
			);

			after = Some(last);
		}

		tracing::info!(
			tasks_updated = report.tasks_updated,
			signatures_written = report.signatures_written,
			"Signature backfill completed."
		);

		Ok(report)
	}
}

/// Signatures for `task` under the grants in `roles`, sorted.
///
/// Unparseable permissions are skipped. An unparseable classification is stored as `unknown`,
/// which no user can match.
pub fn encode_task(
	task: &TaskRow,
	roles: &[TaskRoleRow],
	format: SignatureFormat,
) -> Vec<String> {
	let classification =
		task.security_classification.parse::<Classification>().unwrap_or_else(|err| {
			tracing::warn!(
				task_id = %task.task_id,
				error = %err,
				"Unrecognised task classification."
			);

			Classification::Unknown
		});
	let context = TaskAccessContext {
		jurisdiction: Some(task.jurisdiction.as_str()),
		region: task.region.as_deref(),
		location: task.location.as_deref(),
		case_id: Some(task.case_id.as_str()),
		classification,
	};
	let requirements =
		roles.iter().map(|role| access_requirement(&task.task_id, role)).collect::<Vec<_>>();

	task_signatures(&context, &requirements, format)
		.into_iter()
		.map(|signature| signature.into_string())
		.collect()
}

fn access_requirement(task_id: &str, role: &TaskRoleRow) -> AccessRequirement {
	let mut permissions = BTreeSet::new();

	for raw in &role.permissions {
		match raw.parse::<Permission>() {
			Ok(permission) => {
				permissions.insert(permission);
			},
			Err(err) => tracing::warn!(
				task_id,
				role_name = %role.role_name,
				error = %err,
				"Skipping unrecognised task permission."
			),
		}
	}

	let role_category = role.role_category.as_deref().map(|raw| {
		raw.parse::<RoleCategory>().unwrap_or_else(|err| {
			tracing::warn!(
				task_id,
				role_name = %role.role_name,
				error = %err,
				"Unrecognised role category."
			);

			RoleCategory::Unknown
		})
	});

	AccessRequirement {
		role_name: role.role_name.clone(),
		permissions,
		authorisations: role.authorisations.clone(),
		role_category,
	}
}

async fn refresh_one(
	conn: &mut PgConnection,
	task_id: &str,
	format: SignatureFormat,
) -> wa_storage::Result<Option<usize>> {
	let Some(task) = queries::load_task(&mut *conn, task_id).await? else {
		return Ok(None);
	};
	let roles = queries::load_task_roles(&mut *conn, task_id).await?;
	let signatures = encode_task(&task, &roles, format);

	queries::update_task_signatures(&mut *conn, task_id, &signatures).await?;

	Ok(Some(signatures.len()))
}

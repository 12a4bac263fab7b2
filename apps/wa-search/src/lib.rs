use std::{fs, path::PathBuf, sync::Arc};

use clap::{Args as ClapArgs, Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use tracing_subscriber::EnvFilter;

use wa_config::Config;
use wa_domain::{Permission, User};
use wa_service::{ClientQuery, RoleAssignmentProvider, StaticRoleAssignments, TaskSearchService};
use wa_storage::{db::Db, statement::ExplainMode};

#[derive(Debug, Parser)]
#[command(
	version = wa_cli::VERSION,
	rename_all = "kebab",
	styles = wa_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Searches tasks for an actor and prints the result as JSON.
	Search(SearchArgs),
	/// Prints the store's plan for the page a search would read.
	Explain {
		#[command(flatten)]
		search: SearchArgs,
		/// Executes the statement and reports actual timings.
		#[arg(long)]
		analyze: bool,
	},
	/// Recomputes the stored signatures of one task.
	RefreshTask {
		#[arg(long, value_name = "ID")]
		task_id: String,
	},
	/// Re-encodes every stored task. Run after changing `search.uniform_role_signatures`.
	BackfillSignatures {
		#[arg(long, value_name = "N", default_value_t = 500)]
		batch_size: u32,
	},
}

#[derive(Debug, ClapArgs)]
pub struct SearchArgs {
	#[arg(long, value_name = "ID")]
	pub actor_id: String,
	/// JSON array of role assignments.
	#[arg(long, value_name = "FILE")]
	pub roles: PathBuf,
	/// JSON client query.
	#[arg(long, value_name = "FILE")]
	pub query: PathBuf,
	#[arg(long, value_name = "PERMISSION", default_value = "read")]
	pub permission: Permission,
}
impl SearchArgs {
	fn load_roles(&self) -> color_eyre::Result<StaticRoleAssignments> {
		let raw = fs::read_to_string(&self.roles)
			.wrap_err_with(|| format!("Failed to read {}.", self.roles.display()))?;

		Ok(StaticRoleAssignments::from_json(&raw)?)
	}

	fn load_query(&self) -> color_eyre::Result<ClientQuery> {
		let raw = fs::read_to_string(&self.query)
			.wrap_err_with(|| format!("Failed to read {}.", self.query.display()))?;

		serde_json::from_str(&raw)
			.wrap_err_with(|| format!("Failed to parse {}.", self.query.display()))
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = wa_config::load(&args.config)?;
	init_tracing(&config)?;
	let db = Db::connect(&config.storage.postgres).await?;
	db.ensure_schema().await?;
	tracing::info!(
		config = %args.config.display(),
		uniform_role_signatures = config.search.uniform_role_signatures,
		"Task store ready."
	);

	match args.command {
		Command::Search(search) => {
			let roles = Arc::new(search.load_roles()?);
			let query = search.load_query()?;
			let service = TaskSearchService::new(config, db, roles);
			let result = service.search(&search.actor_id, &query, search.permission).await?;

			println!("{}", serde_json::to_string_pretty(&result)?);
		},
		Command::Explain { search, analyze } => {
			let roles = search.load_roles()?;
			let query = search.load_query()?;
			let user = User::new(
				search.actor_id.as_str(),
				roles.role_assignments(&search.actor_id).await?,
			);
			let service = TaskSearchService::new(config, db, Arc::new(roles));
			let mode = if analyze { ExplainMode::Analyze } else { ExplainMode::Plan };
			let plan = service.explain(&user, &query, search.permission, mode).await?;

			tracing::info!(
				actor_id = %search.actor_id,
				?mode,
				lines = plan.len(),
				"Explained search."
			);

			for line in plan {
				println!("{line}");
			}
		},
		Command::RefreshTask { task_id } => {
			let service = unscoped_service(config, db);
			let written = service.refresh_task_signatures(&task_id).await?;

			println!("{}", serde_json::json!({ "task_id": task_id, "signatures": written }));
		},
		Command::BackfillSignatures { batch_size } => {
			let service = unscoped_service(config, db);
			let report = service.backfill_signatures(batch_size).await?;

			println!("{}", serde_json::to_string_pretty(&report)?);
		},
	}

	Ok(())
}

/// The signature writer never resolves users, so it runs without role assignments.
fn unscoped_service(config: Config, db: Db) -> TaskSearchService {
	TaskSearchService::new(config, db, Arc::new(StaticRoleAssignments::default()))
}

fn init_tracing(config: &Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
	Ok(())
}

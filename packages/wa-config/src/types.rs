use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub search: Search,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	/// Selects the uniform role signature shape. The task signature writer and the search path
	/// both read this value; flipping it requires a signature backfill.
	pub uniform_role_signatures: bool,
	pub default_page_size: u32,
	pub max_page_size: u32,
	pub statement_timeout_ms: u64,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			uniform_role_signatures: true,
			default_page_size: 25,
			max_page_size: 500,
			statement_timeout_ms: 10_000,
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

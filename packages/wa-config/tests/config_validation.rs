use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use wa_config::{Config, Error};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_toml_with_search(entries: &[(&str, Value)]) -> String {
	let mut value: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let root = value.as_table_mut().expect("Template config must be a table.");
	let search = root
		.get_mut("search")
		.and_then(Value::as_table_mut)
		.expect("Template config must include [search].");

	for (key, entry) in entries {
		search.insert((*key).to_string(), entry.clone());
	}

	toml::to_string(&value).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("wa_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse test config.")
}

#[test]
fn sample_config_loads() {
	let path = write_temp_config(SAMPLE_CONFIG_TEMPLATE_TOML.to_string());
	let result = wa_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Expected sample config to load.");

	assert!(cfg.search.uniform_role_signatures);
	assert_eq!(cfg.search.default_page_size, 25);
	assert_eq!(cfg.storage.postgres.pool_max_conns, 4);
}

#[test]
fn search_section_defaults_when_missing() {
	let payload = "\
[service]
log_level = \"debug\"

[storage.postgres]
dsn = \"postgres://localhost/wa\"
pool_max_conns = 1
";
	let cfg: Config = toml::from_str(payload).expect("Failed to parse config.");

	assert!(cfg.search.uniform_role_signatures);
	assert_eq!(cfg.search.default_page_size, 25);
	assert_eq!(cfg.search.max_page_size, 500);
	assert_eq!(cfg.search.statement_timeout_ms, 10_000);
	assert!(wa_config::validate(&cfg).is_ok());
}

#[test]
fn legacy_signature_format_is_read_from_config() {
	let payload =
		sample_toml_with_search(&[("uniform_role_signatures", Value::Boolean(false))]);
	let cfg: Config = toml::from_str(&payload).expect("Failed to parse config.");

	assert!(!cfg.search.uniform_role_signatures);
}

#[test]
fn default_page_size_must_not_exceed_max() {
	let payload = sample_toml_with_search(&[
		("default_page_size", Value::Integer(100)),
		("max_page_size", Value::Integer(50)),
	]);
	let path = write_temp_config(payload);
	let result = wa_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected page size validation error.");

	assert!(
		err.to_string().contains(
			"search.default_page_size must be less than or equal to search.max_page_size."
		),
		"Unexpected error: {err}"
	);
}

#[test]
fn statement_timeout_must_be_positive() {
	let mut cfg = base_config();

	cfg.search.statement_timeout_ms = 0;

	let err = wa_config::validate(&cfg).expect_err("Expected timeout validation error.");

	assert!(
		err.to_string().contains("search.statement_timeout_ms must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn pool_size_must_be_positive() {
	let mut cfg = base_config();

	cfg.storage.postgres.pool_max_conns = 0;

	assert!(matches!(wa_config::validate(&cfg), Err(Error::Validation { .. })));
}

#[test]
fn missing_file_reports_read_error() {
	let mut path = env::temp_dir();

	path.push("wa_config_test_missing_file.toml");

	let err = wa_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }));
}

#[test]
fn blank_log_level_normalizes_to_info() {
	let payload = SAMPLE_CONFIG_TEMPLATE_TOML.replace("log_level = \"info\"", "log_level = \"  \"");
	let path = write_temp_config(payload);
	let result = wa_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	assert_eq!(result.expect("Expected config to load.").service.log_level, "info");
}

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use time::macros::datetime;

use wa_config::Postgres;
use wa_storage::{
	db::Db,
	models::{TaskRoleRow, TaskRow},
	queries,
	statement::{ExplainMode, Statement},
};
use wa_testkit::TestDatabase;

fn task(task_id: &str, case_id: &str) -> TaskRow {
	TaskRow {
		task_id: task_id.to_string(),
		task_name: "Review the appeal".to_string(),
		task_type: Some("reviewTheAppeal".to_string()),
		title: Some("Review the appeal".to_string()),
		state: "UNASSIGNED".to_string(),
		assignee: None,
		jurisdiction: "IA".to_string(),
		region: Some("1".to_string()),
		location: Some("765324".to_string()),
		location_name: Some("Taylor House".to_string()),
		case_id: case_id.to_string(),
		case_type_id: Some("Asylum".to_string()),
		case_category: Some("Protection".to_string()),
		case_name: Some("Bob Smith".to_string()),
		work_type: Some("decision_making_work".to_string()),
		role_category: Some("LEGAL_OPERATIONS".to_string()),
		security_classification: "PUBLIC".to_string(),
		major_priority: 5000,
		minor_priority: 500,
		priority_date: None,
		due_date_time: Some(datetime!(2026-03-01 12:00 UTC)),
		created: datetime!(2026-01-01 09:00 UTC),
	}
}

async fn connect(test_db: &TestDatabase) -> Db {
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	db
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set WA_PG_DSN to run."]
async fn schema_bootstrap_is_idempotent() {
	let Some(base_dsn) = wa_testkit::env_dsn() else {
		eprintln!("Skipping schema_bootstrap_is_idempotent; set WA_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;

	db.ensure_schema().await.expect("Second bootstrap should be a no-op.");

	for table in ["tasks", "task_roles"] {
		let count: i64 = sqlx::query_scalar(
			"SELECT count(*) FROM information_schema.tables WHERE table_name = $1",
		)
		.bind(table)
		.fetch_one(&db.pool)
		.await
		.expect("Failed to query schema tables.");

		assert_eq!(count, 1, "Expected table {table} to exist.");
	}

	let index: String = sqlx::query_scalar(
		"SELECT indexdef FROM pg_indexes WHERE indexname = 'idx_tasks_signatures'",
	)
	.fetch_one(&db.pool)
	.await
	.expect("Failed to query signature index.");

	assert!(index.contains("gin"), "Expected a GIN index, got {index}.");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set WA_PG_DSN to run."]
async fn task_rows_and_grants_round_trip() {
	let Some(base_dsn) = wa_testkit::env_dsn() else {
		eprintln!("Skipping task_rows_and_grants_round_trip; set WA_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;
	let row = task("task-1", "1623278362430412");

	queries::insert_task(&db.pool, &row).await.expect("Failed to insert task.");

	let grant = TaskRoleRow {
		task_id: "task-1".to_string(),
		role_name: "tribunal-caseworker".to_string(),
		permissions: vec!["read".to_string(), "execute".to_string()],
		authorisations: Vec::new(),
		role_category: Some("LEGAL_OPERATIONS".to_string()),
	};

	queries::upsert_task_role(&db.pool, &grant).await.expect("Failed to insert grant.");
	queries::upsert_task_role(
		&db.pool,
		&TaskRoleRow { permissions: vec!["read".to_string()], ..grant.clone() },
	)
	.await
	.expect("Failed to update grant.");

	let loaded = queries::load_task(&db.pool, "task-1").await.expect("Failed to load task.");

	assert_eq!(loaded, Some(row));

	let grants =
		queries::load_task_roles(&db.pool, "task-1").await.expect("Failed to load grants.");

	assert_eq!(grants.len(), 1);
	assert_eq!(grants[0].permissions, vec!["read".to_string()]);

	let updated = queries::update_task_signatures(&db.pool, "task-1", &["r:ia".to_string()])
		.await
		.expect("Failed to update signatures.");

	assert!(updated);
	assert_eq!(
		queries::load_task_signatures(&db.pool, "task-1").await.expect("Failed to load."),
		Some(vec!["r:ia".to_string()])
	);
	assert!(
		!queries::update_task_signatures(&db.pool, "missing", &[])
			.await
			.expect("Failed to update signatures.")
	);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set WA_PG_DSN to run."]
async fn task_ids_page_in_key_order() {
	let Some(base_dsn) = wa_testkit::env_dsn() else {
		eprintln!("Skipping task_ids_page_in_key_order; set WA_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;

	for id in ["c", "a", "e", "b", "d"] {
		queries::insert_task(&db.pool, &task(id, "1")).await.expect("Failed to insert task.");
	}

	let first = queries::task_ids_after(&db.pool, None, 2).await.expect("Failed to page.");
	let second =
		queries::task_ids_after(&db.pool, Some("b"), 2).await.expect("Failed to page.");
	let last = queries::task_ids_after(&db.pool, Some("d"), 2).await.expect("Failed to page.");

	assert_eq!(first, vec!["a", "b"]);
	assert_eq!(second, vec!["c", "d"]);
	assert_eq!(last, vec!["e"]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set WA_PG_DSN to run."]
async fn statements_stream_count_and_explain_with_the_same_binds() {
	let Some(base_dsn) = wa_testkit::env_dsn() else {
		eprintln!("Skipping statements_stream_count_and_explain; set WA_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;

	for (id, case_id) in [("t1", "1"), ("t2", "2"), ("t3", "3")] {
		queries::insert_task(&db.pool, &task(id, case_id)).await.expect("Failed to insert task.");
	}

	let excluded = vec!["2".to_string()];
	let mut window = Statement::new("SELECT task_id FROM tasks WHERE NOT (case_id = ANY(");

	window.push_param(excluded.clone()).push(")) ORDER BY task_id LIMIT ").push_param(10_i64);

	let mut count = Statement::new("SELECT count(*) FROM tasks WHERE NOT (case_id = ANY(");

	count.push_param(excluded).push("))");

	let mut conn = db.acquire().await.expect("Failed to acquire connection.");
	let mut ids = Vec::new();
	let seen = window
		.fetch_each(&mut conn, |row| {
			ids.push(sqlx::Row::try_get::<String, _>(&row, 0)?);

			Ok(())
		})
		.await
		.expect("Failed to stream rows.");

	assert_eq!(seen, 2);
	assert_eq!(ids, vec!["t1", "t3"]);
	assert_eq!(count.fetch_count(&mut conn).await.expect("Failed to count."), 2);

	let plan = window.explain(&mut conn, ExplainMode::Plan).await.expect("Failed to explain.");

	assert!(!plan.is_empty());

	let analyzed =
		window.explain(&mut conn, ExplainMode::Analyze).await.expect("Failed to explain.");

	assert!(analyzed.iter().any(|line| line.contains("actual")));

	drop(conn);
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set WA_PG_DSN to run."]
async fn bounded_transactions_are_cancelled_by_the_server() {
	let Some(base_dsn) = wa_testkit::env_dsn() else {
		eprintln!("Skipping bounded_transactions_are_cancelled_by_the_server; set WA_PG_DSN.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let pool = PgPoolOptions::new()
		.max_connections(1)
		.connect(test_db.dsn())
		.await
		.expect("Failed to connect to Postgres.");
	let db = Db::from_pool(pool);
	let mut tx =
		db.begin_bounded(Duration::from_millis(100)).await.expect("Failed to begin transaction.");
	let err = Statement::new("SELECT count(*) FROM pg_sleep(4)")
		.fetch_count(&mut tx)
		.await
		.expect_err("Expected the server to cancel the statement.");

	assert!(err.is_statement_timeout());

	drop(tx);

	let mut conn = db.acquire().await.expect("Failed to acquire connection.");
	let setting: String = sqlx::query_scalar("SELECT current_setting('statement_timeout')")
		.fetch_one(&mut *conn)
		.await
		.expect("Failed to read statement_timeout.");

	assert_eq!(setting, "0");

	drop(conn);
	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

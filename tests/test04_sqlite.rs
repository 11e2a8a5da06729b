#![cfg(feature = "sqlite")]

use std::time::Duration;

use sql_helper::prelude::*;
use tempfile::tempdir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn unique_db_path(prefix: &str) -> String {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(format!("{prefix}.db"));
    // Leak the tempdir so the file persists for the duration of the test binary.
    std::mem::forget(dir);
    path.to_string_lossy().into_owned()
}

async fn create_products(
    helper: &SqlHelper<SqliteDriver>,
    db: &str,
) -> Result<(), SqlHelperError> {
    helper
        .execute_non_query(
            db,
            CommandType::Text,
            "CREATE TABLE products (id INTEGER PRIMARY KEY, name TEXT NOT NULL, price REAL, discontinued INTEGER)",
            &mut [],
        )
        .await?;

    let rows = [
        (1, "Chai", 18.0, false),
        (2, "Chang", 19.0, false),
        (3, "Aniseed Syrup", 10.0, true),
    ];
    for (id, name, price, discontinued) in rows {
        let mut params = vec![
            DbParameter::new("p1", id),
            DbParameter::new("p2", name),
            DbParameter::new("p3", price),
            DbParameter::new("p4", discontinued),
        ];
        helper
            .execute_non_query(
                db,
                CommandType::Text,
                "INSERT INTO products (id, name, price, discontinued) VALUES (?1, ?2, ?3, ?4)",
                &mut params,
            )
            .await?;
    }
    Ok(())
}

#[test]
fn sqlite_connection_string_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let db = unique_db_path("products");
        let helper = SqlHelper::new(SqliteDriver);
        create_products(&helper, &db).await?;

        let count = helper
            .execute_scalar(&db, CommandType::Text, "SELECT COUNT(*) FROM products", &mut [])
            .await?;
        assert_eq!(count, Some(RowValues::Int(3)));

        let mut params = vec![DbParameter::new("@max", 18.5)];
        let data = helper
            .execute_dataset(
                &db,
                CommandType::Text,
                "SELECT id, name FROM products WHERE price <= @max ORDER BY id",
                &mut params,
            )
            .await?;
        let table = data.table().ok_or("no result set")?;
        assert_eq!(table.len(), 2);
        assert_eq!(table.results[0].get("name"), Some(&RowValues::Text("Chai".into())));
        assert_eq!(table.results[1].get("NAME"), Some(&RowValues::Text("Aniseed Syrup".into())));

        let none = helper
            .execute_scalar(
                &db,
                CommandType::Text,
                "SELECT name FROM products WHERE id = :id",
                &mut [DbParameter::new(":id", 42)],
            )
            .await?;
        assert_eq!(none, None);

        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    Ok(())
}

#[tokio::test]
async fn sqlite_cursor_over_caller_connection() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let db = unique_db_path("cursor");
    let helper = SqlHelper::new(SqliteDriver);
    create_products(&helper, &db).await?;

    let mut conn = helper.connect(&db)?;
    let mut cursor = helper
        .execute_reader(
            &mut conn,
            CommandType::Text,
            "SELECT name FROM products WHERE discontinued = $flag ORDER BY id",
            &mut [DbParameter::new("$flag", false)],
        )
        .await?;
    assert_eq!(cursor.behavior(), CommandBehavior::Default);

    let mut names = Vec::new();
    while let Some(row) = cursor.next_row().await? {
        names.push(row.get_by_index(0).and_then(RowValues::as_text).map(str::to_string));
    }
    cursor.close().await?;
    assert_eq!(names, vec![Some("Chai".to_string()), Some("Chang".to_string())]);
    assert!(conn.is_open());

    conn.close().await?;
    assert_eq!(conn.state(), ConnectionState::Closed);

    Ok(())
}

#[tokio::test]
async fn sqlite_transaction_commit_and_rollback() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let db = unique_db_path("tx");
    let helper = SqlHelper::new(SqliteDriver);
    create_products(&helper, &db).await?;
    let mut conn = helper.connect(&db)?;

    let mut tx = begin_transaction(&mut conn).await?;
    let rows = helper
        .execute_non_query(
            &mut tx,
            CommandType::Text,
            "UPDATE products SET price = price * 2 WHERE discontinued = 0",
            &mut [],
        )
        .await?;
    assert_eq!(rows, 2);
    tx.rollback().await?;

    let mut tx = begin_transaction(&mut conn).await?;
    helper
        .execute_non_query(
            &mut tx,
            CommandType::Text,
            "DELETE FROM products WHERE discontinued = 1",
            &mut [],
        )
        .await?;
    tx.commit().await?;

    // a fresh connection sees the committed delete and not the rolled back update
    let total = helper
        .execute_scalar(&db, CommandType::Text, "SELECT SUM(price) FROM products", &mut [])
        .await?;
    assert_eq!(total, Some(RowValues::Float(37.0)));

    Ok(())
}

#[tokio::test]
async fn sqlite_has_no_stored_procedures() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let db = unique_db_path("noproc");
    let helper = SqlHelper::new(SqliteDriver);

    let err = helper
        .execute_non_query(&db, CommandType::StoredProcedure, "AddOrder", &mut [])
        .await
        .unwrap_err();
    assert!(err.is_unimplemented());

    let err = helper
        .execute_scalar_sp(&db, "OrderCount", &[RowValues::Int(1)])
        .await
        .unwrap_err();
    let SqlHelperError::DiscoveryError { source, .. } = err else {
        panic!("expected a discovery error");
    };
    assert!(source.is_unimplemented());

    Ok(())
}

#[tokio::test]
async fn sqlite_command_timeout_does_not_outlive_the_command() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let db = unique_db_path("busy");
    let plain = SqlHelper::new(SqliteDriver);
    let timed = SqlHelper::with_options(
        SqliteDriver,
        HelperOptions::builder()
            .command_timeout(Duration::from_millis(250))
            .finish(),
    );
    let mut conn = plain.connect(&db)?;

    let before = plain
        .execute_scalar(&mut conn, CommandType::Text, "PRAGMA busy_timeout", &mut [])
        .await?;
    assert_ne!(before, Some(RowValues::Int(250)));

    let during = timed
        .execute_scalar(&mut conn, CommandType::Text, "PRAGMA busy_timeout", &mut [])
        .await?;
    assert_eq!(during, Some(RowValues::Int(250)));

    let after = plain
        .execute_scalar(&mut conn, CommandType::Text, "PRAGMA busy_timeout", &mut [])
        .await?;
    assert_eq!(after, before);

    conn.close().await?;
    Ok(())
}

#[tokio::test]
async fn sqlite_errors_surface_unchanged() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let db = unique_db_path("errors");
    let options = HelperOptions::builder()
        .command_timeout(Duration::from_secs(2))
        .finish();
    let helper = SqlHelper::with_options(SqliteDriver, options);

    let err = helper
        .execute_dataset(&db, CommandType::Text, "SELECT * FROM missing_table", &mut [])
        .await
        .unwrap_err();
    assert!(matches!(err, SqlHelperError::SqliteError(_)));

    let err = helper
        .execute_scalar(
            &db,
            CommandType::Text,
            "SELECT :a",
            &mut [DbParameter::new("@b", 1)],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SqlHelperError::ParameterError(_)));

    let err = helper.connect("").unwrap_err();
    assert!(matches!(err, SqlHelperError::ConfigError(_)));

    Ok(())
}

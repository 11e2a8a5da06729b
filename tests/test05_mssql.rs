#![cfg(feature = "mssql")]

//! Runs against a live SQL Server when `SQL_HELPER_MSSQL` holds an ADO.NET connection
//! string, e.g. `server=tcp:localhost,1433;user id=sa;password=...;TrustServerCertificate=true`.

use sql_helper::prelude::*;

fn connection_string() -> Option<String> {
    std::env::var("SQL_HELPER_MSSQL").ok().filter(|s| !s.is_empty())
}

const SETUP: &str = "
IF OBJECT_ID('dbo.helper_orders', 'U') IS NOT NULL DROP TABLE dbo.helper_orders;
CREATE TABLE dbo.helper_orders (id int PRIMARY KEY, product nvarchar(40) NOT NULL, qty int NOT NULL);
INSERT INTO dbo.helper_orders (id, product, qty) VALUES (1, N'Chai', 10), (2, N'Chang', 5), (3, N'Chai', 7);
";

const CREATE_PROC: &str = "
CREATE OR ALTER PROCEDURE dbo.helper_total_for
    @product nvarchar(40),
    @total int OUTPUT
AS
BEGIN
    SELECT id, qty FROM dbo.helper_orders WHERE product = @product ORDER BY id;
    SELECT @total = SUM(qty) FROM dbo.helper_orders WHERE product = @product;
    RETURN 3;
END
";

#[test]
fn mssql_stored_procedure_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let Some(cs) = connection_string() else {
        eprintln!("SQL_HELPER_MSSQL not set; skipping");
        return Ok(());
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let helper = SqlHelper::new(MssqlDriver);
        helper
            .execute_non_query(&cs, CommandType::Text, SETUP, &mut [])
            .await?;
        helper
            .execute_non_query(&cs, CommandType::Text, CREATE_PROC, &mut [])
            .await?;

        let signature = helper
            .get_parameter_set(&cs, "dbo.helper_total_for", true)
            .await?;
        let names: Vec<&str> = signature.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["@RETURN_VALUE", "@product", "@total"]);
        assert_eq!(signature[2].direction, ParameterDirection::InputOutput);
        assert_eq!(signature[1].param_type.size, Some(40));

        let mut params = signature;
        params[1].value = Some(RowValues::Text("Chai".into()));
        let data = helper
            .execute_dataset(
                &cs,
                CommandType::StoredProcedure,
                "dbo.helper_total_for",
                &mut params,
            )
            .await?;
        assert_eq!(data.table().map(ResultSet::len), Some(2));
        assert_eq!(params[0].value, Some(RowValues::Int(3)));
        assert_eq!(params[2].value, Some(RowValues::Int(17)));

        // positional form: one value for the one parameter left after the return value
        let err = helper
            .execute_dataset_sp(&cs, "dbo.helper_total_for", &[RowValues::Text("Chai".into())])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SqlHelperError::ArgumentCountMismatch {
                expected: 2,
                actual: 1
            }
        ));

        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    Ok(())
}

#[test]
fn mssql_text_commands_and_transactions() -> Result<(), Box<dyn std::error::Error>> {
    let Some(cs) = connection_string() else {
        eprintln!("SQL_HELPER_MSSQL not set; skipping");
        return Ok(());
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let helper = SqlHelper::new(MssqlDriver);
        helper
            .execute_non_query(&cs, CommandType::Text, SETUP, &mut [])
            .await?;

        let mut conn = helper.connect(&cs)?;
        let mut tx = begin_transaction(&mut conn).await?;
        let rows = helper
            .execute_non_query(
                &mut tx,
                CommandType::Text,
                "DELETE FROM dbo.helper_orders WHERE product = @P1",
                &mut [DbParameter::new("@product", "Chai")],
            )
            .await?;
        assert_eq!(rows, 2);
        tx.rollback().await?;

        let count = helper
            .execute_scalar(
                &mut conn,
                CommandType::Text,
                "SELECT COUNT(*) FROM dbo.helper_orders",
                &mut [],
            )
            .await?;
        assert_eq!(count, Some(RowValues::Int(3)));

        let cursor = helper
            .execute_reader(
                &mut conn,
                CommandType::Text,
                "SELECT product FROM dbo.helper_orders WHERE qty > @P1 ORDER BY id",
                &mut [DbParameter::new("@qty", 6)],
            )
            .await?;
        let rows = cursor.into_result_set().await?;
        assert_eq!(rows.len(), 2);

        conn.close().await?;

        let err = helper
            .get_parameter_set(&cs, "dbo.no_such_procedure", false)
            .await
            .unwrap_err();
        assert!(matches!(err, SqlHelperError::DiscoveryError { .. }));

        // a table is not a procedure, and nothing is cached for it
        let err = helper
            .get_parameter_set(&cs, "dbo.helper_orders", false)
            .await
            .unwrap_err();
        assert!(matches!(err, SqlHelperError::DiscoveryError { .. }));
        assert!(
            helper
                .cache()
                .get_cached_parameter_set(&cs, "dbo.helper_orders")
                .is_none()
        );

        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    Ok(())
}

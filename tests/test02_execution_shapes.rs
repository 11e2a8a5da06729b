use std::time::Duration;

use sql_helper::prelude::*;
use sql_helper::test_utils::{StubDriver, create_test_table};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn order_signature() -> Vec<DbParameter> {
    vec![
        DbParameter::return_value(),
        DbParameter::unbound("@customer", ParameterDirection::Input, ParamType::named("int")),
        DbParameter::unbound(
            "@product",
            ParameterDirection::Input,
            ParamType::named("nvarchar").with_size(40),
        ),
        DbParameter::unbound("@rush", ParameterDirection::Input, ParamType::named("bit")),
    ]
}

fn orders_table() -> ResultSet {
    create_test_table(
        &["OrderID", "ProductName"],
        vec![
            vec![RowValues::Int(10248), RowValues::Text("Queso Cabrales".into())],
            vec![RowValues::Int(10249), RowValues::Text("Tofu".into())],
        ],
    )
}

#[tokio::test]
async fn positional_values_bind_in_signature_order() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let driver = StubDriver::new()
        .with_procedure("AddOrder", order_signature())
        .with_rows_affected(1);
    let helper = SqlHelper::new(driver.clone());

    let rows = helper
        .execute_non_query_sp(
            "db1",
            "AddOrder",
            &[
                RowValues::Int(7),
                RowValues::Text("Tofu".into()),
                RowValues::Bool(true),
            ],
        )
        .await?;
    assert_eq!(rows, 1);

    let executed = driver.executed();
    assert_eq!(executed.len(), 1);
    let cmd = &executed[0];
    assert_eq!(cmd.shape, "non_query");
    assert_eq!(cmd.text, "AddOrder");
    assert_eq!(cmd.command_type, CommandType::StoredProcedure);

    let bound: Vec<(&str, Option<&RowValues>)> = cmd
        .parameters
        .iter()
        .map(|p| (p.name.as_str(), p.value.as_ref()))
        .collect();
    assert_eq!(
        bound,
        vec![
            ("@customer", Some(&RowValues::Int(7))),
            ("@product", Some(&RowValues::Text("Tofu".into()))),
            ("@rush", Some(&RowValues::Bool(true))),
        ]
    );

    Ok(())
}

#[tokio::test]
async fn count_mismatch_executes_nothing() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let driver = StubDriver::new().with_procedure("AddOrder", order_signature());
    let helper = SqlHelper::new(driver.clone());

    let err = helper
        .execute_non_query_sp("db1", "AddOrder", &[RowValues::Int(7), RowValues::Null])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SqlHelperError::ArgumentCountMismatch {
            expected: 3,
            actual: 2
        }
    ));
    assert!(driver.executed().is_empty());
    // only the discovery connection was opened
    assert_eq!(driver.opens(), 1);
    assert_eq!(driver.commands_created(), 0);

    let err = helper
        .execute_scalar_sp(
            "db1",
            "AddOrder",
            &[
                RowValues::Int(1),
                RowValues::Int(2),
                RowValues::Int(3),
                RowValues::Int(4),
            ],
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SqlHelperError::ArgumentCountMismatch {
            expected: 3,
            actual: 4
        }
    ));
    assert!(driver.executed().is_empty());

    Ok(())
}

#[tokio::test]
async fn no_values_means_no_discovery() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let driver = StubDriver::new().with_table(orders_table());
    let helper = SqlHelper::new(driver.clone());

    let data = helper
        .execute_dataset_sp("db1", "Ten Most Expensive Products", &[])
        .await?;

    assert_eq!(data.len(), 1);
    assert!(driver.derivations().is_empty());
    let executed = driver.executed();
    assert_eq!(executed[0].command_type, CommandType::StoredProcedure);
    assert!(executed[0].parameters.is_empty());

    Ok(())
}

#[tokio::test]
async fn unassigned_input_output_is_sent_as_null() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let driver = StubDriver::new();
    let helper = SqlHelper::new(driver.clone());

    let mut params = vec![
        DbParameter::new("@id", 3),
        DbParameter::input_output("@total", ParamType::named("money")),
        DbParameter::output("@count", ParamType::named("int")),
        DbParameter::input_output("@seed", ParamType::named("int")).with_value(5),
    ];
    helper
        .execute_non_query("db1", CommandType::StoredProcedure, "UpdateTotals", &mut params)
        .await?;

    let sent = &driver.executed()[0].parameters;
    assert_eq!(sent[0].value, Some(RowValues::Int(3)));
    assert_eq!(sent[1].value, Some(RowValues::Null));
    assert_eq!(sent[2].value, None);
    assert_eq!(sent[3].value, Some(RowValues::Int(5)));

    // the caller sees the attached values afterwards
    assert_eq!(params[1].value, Some(RowValues::Null));
    assert_eq!(params[2].value, None);

    Ok(())
}

#[tokio::test]
async fn output_values_are_written_back() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let driver = StubDriver::new()
        .with_output("@RETURN_VALUE", RowValues::Int(0))
        .with_output("@count", RowValues::Int(12))
        .with_output("@id", RowValues::Int(999));
    let helper = SqlHelper::new(driver.clone());

    let mut params = vec![
        DbParameter::return_value(),
        DbParameter::new("@id", 3),
        DbParameter::output("@count", ParamType::named("int")),
    ];
    let mut conn = helper.connect("db1")?;
    helper
        .execute_non_query(&mut conn, CommandType::StoredProcedure, "CountOrders", &mut params)
        .await?;

    assert_eq!(params[0].value, Some(RowValues::Int(0)));
    // inputs are never overwritten
    assert_eq!(params[1].value, Some(RowValues::Int(3)));
    assert_eq!(params[2].value, Some(RowValues::Int(12)));

    // the same parameters can be attached again
    helper
        .execute_non_query(&mut conn, CommandType::StoredProcedure, "CountOrders", &mut params)
        .await?;
    assert_eq!(driver.executed().len(), 2);

    Ok(())
}

#[tokio::test]
async fn scalar_is_first_value_or_none() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let empty = StubDriver::new();
    let helper = SqlHelper::new(empty);
    let value = helper
        .execute_scalar("db1", CommandType::Text, "SELECT TOP 1 1 FROM Orders WHERE 1 = 0", &mut [])
        .await?;
    assert_eq!(value, None);

    let driver = StubDriver::new()
        .with_procedure("OrderCount", vec![DbParameter::unbound(
            "@customer",
            ParameterDirection::Input,
            ParamType::named("int"),
        )])
        .with_scalar(RowValues::Int(42));
    let helper = SqlHelper::new(driver.clone());
    let value = helper
        .execute_scalar_sp("db1", "OrderCount", &[RowValues::Int(7)])
        .await?;
    assert_eq!(value, Some(RowValues::Int(42)));
    assert_eq!(driver.executed()[0].shape, "scalar");

    Ok(())
}

#[tokio::test]
async fn dataset_holds_every_table() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let summary = create_test_table(&["Total"], vec![vec![RowValues::Float(1250.5)]]);
    let driver = StubDriver::new()
        .with_table(orders_table())
        .with_table(summary);
    let helper = SqlHelper::new(driver);

    let mut params = vec![DbParameter::new("@P1", 7)];
    let data = helper
        .execute_dataset(
            "db1",
            CommandType::Text,
            "SELECT * FROM Orders WHERE CustomerID = @P1; SELECT SUM(Freight) AS Total FROM Orders",
            &mut params,
        )
        .await?;

    assert_eq!(data.len(), 2);
    let orders = data.table().ok_or("missing first table")?;
    assert_eq!(orders.len(), 2);
    assert_eq!(
        orders.results[1].get("productname"),
        Some(&RowValues::Text("Tofu".into()))
    );
    assert_eq!(data.tables[1].first_value(), Some(&RowValues::Float(1250.5)));

    Ok(())
}

#[tokio::test]
async fn cursor_streams_rows_in_order() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let driver = StubDriver::new()
        .with_procedure("GetOrders", vec![DbParameter::unbound(
            "@prodid",
            ParameterDirection::Input,
            ParamType::named("int"),
        )])
        .with_table(orders_table());
    let helper = SqlHelper::new(driver.clone());

    let mut cursor = helper
        .execute_reader_sp("db1", "GetOrders", &[RowValues::Int(24)])
        .await?;

    let mut ids = Vec::new();
    while let Some(row) = cursor.next_row().await? {
        ids.push(row.get("OrderID").and_then(RowValues::as_int).copied());
    }
    assert_eq!(ids, vec![Some(10248), Some(10249)]);
    // exhausted, and stays exhausted
    assert!(cursor.next_row().await?.is_none());
    cursor.close().await?;

    assert_eq!(driver.executed()[0].shape, "reader");

    Ok(())
}

#[tokio::test]
async fn generic_execute_dispatches_by_shape() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let driver = StubDriver::new().with_rows_affected(3);
    let helper = SqlHelper::new(driver.clone());

    let outcome = helper
        .execute(
            "db1",
            ExecutionShape::NonQuery,
            CommandType::Text,
            "DELETE FROM Orders WHERE ShippedDate IS NULL",
            &mut [],
        )
        .await?;
    assert!(matches!(outcome, ExecutionOutcome::RowsAffected(3)));

    let err = outcome_mismatch(&helper).await.unwrap_err();
    assert!(matches!(err, SqlHelperError::Other(_)));

    Ok(())
}

async fn outcome_mismatch(helper: &SqlHelper<StubDriver>) -> Result<DataSet, SqlHelperError> {
    helper
        .execute(
            "db1",
            ExecutionShape::Scalar,
            CommandType::Text,
            "SELECT 1",
            &mut [],
        )
        .await?
        .into_data_set()
}

#[tokio::test]
async fn unsupported_operations_touch_nothing() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let driver = StubDriver::new();
    let helper = SqlHelper::new(driver.clone());

    let err = helper
        .execute_delete_query("db1", "DELETE FROM Orders WHERE OrderID = 1", 17)
        .await
        .unwrap_err();
    assert!(err.is_unimplemented());

    let err = helper
        .execute_xml_reader(
            "db1",
            CommandType::Text,
            "SELECT * FROM Orders FOR XML AUTO",
            &mut [],
        )
        .await
        .unwrap_err();
    assert!(err.is_unimplemented());

    assert_eq!(driver.opens(), 0);
    assert!(driver.executed().is_empty());

    Ok(())
}

#[tokio::test]
async fn command_timeout_reaches_the_driver() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let driver = StubDriver::new();
    let options = HelperOptions::builder()
        .command_timeout(Duration::from_secs(30))
        .finish();
    let helper = SqlHelper::with_options(driver.clone(), options);

    helper
        .execute_non_query("db1", CommandType::Text, "UPDATE Orders SET Freight = 0", &mut [])
        .await?;

    let executed = driver.executed();
    assert_eq!(executed[0].timeout, Some(Duration::from_secs(30)));
    assert_eq!(executed[0].command_type, CommandType::Text);
    assert!(!executed[0].in_transaction);

    Ok(())
}

//! SQL Server driver built on tiberius.
//!
//! - `config`: ADO.NET connection string parsing
//! - `client`: TCP connect and TDS login
//! - `params`: binding `RowValues` onto tiberius queries
//! - `query`: result set collection and value extraction
//! - `procedure`: the `EXEC` batch used to run stored procedures
//! - `derive`: stored procedure signatures from the catalog views
//! - `connection`: `MssqlDriver` / `MssqlConnection`

pub mod client;
pub mod config;
pub mod connection;
pub mod derive;
pub mod params;
pub mod procedure;
pub mod query;

pub use client::{MssqlClient, create_mssql_client};
pub use config::parse_connection_string;
pub use connection::{MssqlConnection, MssqlDriver};
pub use query::build_result_sets;

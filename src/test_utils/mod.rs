//! Test doubles for exercising the helper without a database server.

mod stub;
pub mod test_helpers;

pub use stub::{ExecutedCommand, StubConnection, StubDriver};
pub use test_helpers::create_test_table;

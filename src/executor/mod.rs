mod cursor;
mod dispatch;
mod targets;

pub use cursor::RowCursor;
pub use dispatch::{ExecutionOutcome, ExecutionShape, execute};
pub use targets::ConnectionTarget;
pub(crate) use targets::{Lease, LeasedConnection};

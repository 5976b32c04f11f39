//! Persistence layer for generated statements.
//!
//! [`QueryExecutor`] is the seam between the gateway and the database.
//! [`MySqlExecutor`] is the production implementation; [`StatementGuard`]
//! optionally screens statements before they reach it.

mod guard;
mod mysql;
mod traits;

pub use guard::{changes_data, GuardVerdict, StatementGuard};
pub use mysql::{mask_database_url, MySqlExecutor};
pub use traits::{QueryExecutor, Row};

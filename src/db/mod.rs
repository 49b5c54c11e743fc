//! Database module: the handle every route shares.
//!
//! Layout:
//! - `models.rs`: row projections returned by the catalog and raw queries
//! - `queries.rs`: fixed SQL text used by the status and chart routes
//! - `mysql.rs`: the MySQL-backed [`Database`] implementation

pub mod models;
pub mod mysql;
pub mod queries;

use futures::future::BoxFuture;

use crate::error::AdminError;

pub use models::{QueryOutcome, Record, TableDescriptor, UnsafeIdent};
pub use mysql::MySqlDatabase;

/// Operations the HTTP layer issues against the database.
///
/// There is exactly one implementation in production, wrapping one shared
/// connection. Nothing here retries or reconnects.
pub trait Database: Send + Sync {
    /// Number of tables in the connected schema (`SHOW TABLES`).
    fn table_count(&self) -> BoxFuture<'_, Result<usize, AdminError>>;

    /// Catalog statistics for every table of `schema`. Counts and sizes are
    /// the engine's estimates, not live `COUNT(*)` results.
    fn catalog<'a>(
        &'a self,
        schema: &'a str,
    ) -> BoxFuture<'a, Result<Vec<TableDescriptor>, AdminError>>;

    /// Run arbitrary SQL text and decode whatever rows it yields.
    fn fetch_records<'a>(
        &'a self,
        sql: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Record>, AdminError>>;

    /// Run arbitrary SQL text, reporting either rows or an affected-row summary.
    fn execute<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, Result<QueryOutcome, AdminError>>;

    /// `SELECT * FROM <table>` with the identifier spliced in verbatim.
    fn select_all<'a>(
        &'a self,
        table: &'a UnsafeIdent,
    ) -> BoxFuture<'a, Result<Vec<Record>, AdminError>>;

    /// `INSERT INTO <table> SET col = ?, ...` for one record. Column names are
    /// quoted; the table identifier is spliced in verbatim.
    fn insert<'a>(
        &'a self,
        table: &'a UnsafeIdent,
        record: &'a Record,
    ) -> BoxFuture<'a, Result<(), AdminError>>;
}

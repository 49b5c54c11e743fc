use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use futures::TryStreamExt;
use futures::future::{BoxFuture, FutureExt};
use serde_json::{Number, Value};
use std::time::Duration;
use sqlx::mysql::{
    MySqlArguments, MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlQueryResult, MySqlRow,
};
use sqlx::query::Query;
use sqlx::{Column, Either, Executor, MySql, Row, TypeInfo, ValueRef};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::db::models::{ExecSummary, format_timestamp};
use crate::db::queries::{SHOW_TABLES, TABLE_CATALOG};
use crate::db::{Database, QueryOutcome, Record, TableDescriptor, UnsafeIdent};
use crate::error::AdminError;

/// The process-wide database handle.
///
/// Backed by a pool capped at one connection, opened once at startup. When
/// that first connection fails the handle stays disconnected for the life of
/// the process and every call reports [`AdminError::NotConnected`].
#[derive(Clone)]
pub struct MySqlDatabase {
    pool: Option<MySqlPool>,
}

impl MySqlDatabase {
    /// Connect once. Failure is logged and yields a disconnected handle.
    pub async fn connect(cfg: &Config) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&cfg.db_host)
            .port(cfg.db_port)
            .username(&cfg.db_user)
            .password(&cfg.db_password)
            .database(&cfg.db_name);

        match pool_options().connect_with(options).await
        {
            Ok(pool) => {
                info!(host = %cfg.db_host, database = %cfg.db_name, "connected to database");
                Self { pool: Some(pool) }
            }
            Err(e) => {
                error!(
                    host = %cfg.db_host,
                    database = %cfg.db_name,
                    error = %e,
                    "error connecting to database; continuing without a connection"
                );
                Self { pool: None }
            }
        }
    }

    pub fn disconnected() -> Self {
        Self { pool: None }
    }

    pub fn is_connected(&self) -> bool {
        self.pool.is_some()
    }

    fn pool(&self) -> Result<&MySqlPool, AdminError> {
        self.pool.as_ref().ok_or(AdminError::NotConnected)
    }

    async fn run_records(&self, sql: &str) -> Result<Vec<Record>, AdminError> {
        let rows = sqlx::raw_sql(sql).fetch_all(self.pool()?).await?;
        rows.iter()
            .map(row_to_record)
            .collect::<Result<Vec<_>, _>>()
            .map_err(AdminError::from)
    }

    async fn run_execute(&self, sql: &str) -> Result<QueryOutcome, AdminError> {
        let results: Vec<Either<MySqlQueryResult, MySqlRow>> = self
            .pool()?
            .fetch_many(sqlx::raw_sql(sql))
            .try_collect()
            .await?;

        let mut rows = Vec::new();
        let mut summary = None;
        for item in results {
            match item {
                Either::Left(done) => summary = Some(done),
                Either::Right(row) => rows.push(row_to_record(&row)?),
            }
        }

        // A statement that produced no rows but changed some reports a summary;
        // an empty SELECT stays an empty row list.
        match summary {
            Some(done) if rows.is_empty() && done.rows_affected() > 0 => {
                Ok(QueryOutcome::Summary(ExecSummary {
                    affected_rows: done.rows_affected(),
                    insert_id: done.last_insert_id(),
                }))
            }
            _ => Ok(QueryOutcome::Rows(rows)),
        }
    }

    async fn run_insert(&self, table: &UnsafeIdent, record: &Record) -> Result<(), AdminError> {
        let sql = insert_statement(table, record);
        debug!(table = %table, columns = record.len(), "inserting record");
        let query = record
            .values()
            .fold(sqlx::query(&sql), |query, value| bind_json(query, value));
        query.execute(self.pool()?).await?;
        Ok(())
    }
}

impl Database for MySqlDatabase {
    fn table_count(&self) -> BoxFuture<'_, Result<usize, AdminError>> {
        async move { Ok(self.run_records(SHOW_TABLES).await?.len()) }.boxed()
    }

    fn catalog<'a>(
        &'a self,
        schema: &'a str,
    ) -> BoxFuture<'a, Result<Vec<TableDescriptor>, AdminError>> {
        async move {
            let tables = sqlx::query_as::<_, TableDescriptor>(TABLE_CATALOG)
                .bind(schema)
                .fetch_all(self.pool()?)
                .await?;
            Ok(tables)
        }
        .boxed()
    }

    fn fetch_records<'a>(
        &'a self,
        sql: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Record>, AdminError>> {
        self.run_records(sql).boxed()
    }

    fn execute<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, Result<QueryOutcome, AdminError>> {
        self.run_execute(sql).boxed()
    }

    fn select_all<'a>(
        &'a self,
        table: &'a UnsafeIdent,
    ) -> BoxFuture<'a, Result<Vec<Record>, AdminError>> {
        async move {
            let sql = format!("SELECT * FROM {table}");
            self.run_records(&sql).await
        }
        .boxed()
    }

    fn insert<'a>(
        &'a self,
        table: &'a UnsafeIdent,
        record: &'a Record,
    ) -> BoxFuture<'a, Result<(), AdminError>> {
        self.run_insert(table, record).boxed()
    }
}

/// Queries wait on the single connection without a deadline, and the pool
/// never retires that connection on its own.
const ACQUIRE_WAIT: Duration = Duration::from_secs(365 * 24 * 60 * 60);

fn pool_options() -> MySqlPoolOptions {
    MySqlPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(ACQUIRE_WAIT)
        .idle_timeout(None)
        .max_lifetime(None)
        .test_before_acquire(false)
}

fn insert_statement(table: &UnsafeIdent, record: &Record) -> String {
    let assignments = record
        .keys()
        .map(|column| format!("{} = ?", quote_identifier(column)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO {table} SET {assignments}")
}

fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn bind_json<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &Value,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(u) = n.as_u64() {
                query.bind(u)
            } else {
                query.bind(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => query.bind(s.clone()),
        other => query.bind(other.to_string()),
    }
}

fn row_to_record(row: &MySqlRow) -> Result<Record, sqlx::Error> {
    let mut record = Record::with_capacity(row.columns().len());
    for column in row.columns() {
        let value = decode_column(row, column.ordinal(), column.type_info().name())?;
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

/// Decode one column into JSON. Raw statements use the text protocol, so the
/// non-numeric types are read back as their textual form.
fn decode_column(row: &MySqlRow, idx: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(Value::Null);
    }

    let value = match type_name {
        "BOOLEAN" => Value::Bool(row.try_get::<bool, _>(idx)?),
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => Value::from(row.try_get::<u64, _>(idx)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            Value::from(row.try_get::<i64, _>(idx)?)
        }
        "YEAR" => Value::from(row.try_get_unchecked::<u16, _>(idx)?),
        "FLOAT" => float_value(f64::from(row.try_get::<f32, _>(idx)?)),
        "DOUBLE" => float_value(row.try_get::<f64, _>(idx)?),
        // Exact decimal text, never rounded through f64.
        "DECIMAL" => Value::String(row.try_get_unchecked::<String, _>(idx)?),
        "DATETIME" => Value::String(format_timestamp(
            &row.try_get::<NaiveDateTime, _>(idx)?.and_utc(),
        )),
        "TIMESTAMP" => Value::String(format_timestamp(&row.try_get::<DateTime<Utc>, _>(idx)?)),
        "DATE" => Value::String(row.try_get::<NaiveDate, _>(idx)?.to_string()),
        "JSON" => {
            let text = row.try_get_unchecked::<String, _>(idx)?;
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        }
        "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
        | "GEOMETRY" => {
            let bytes = row.try_get_unchecked::<Vec<u8>, _>(idx)?;
            Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
        _ => Value::String(row.try_get_unchecked::<String, _>(idx)?),
    };
    Ok(value)
}

fn float_value(n: f64) -> Value {
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

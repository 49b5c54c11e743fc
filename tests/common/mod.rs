#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use bizdb_admin::AdminError;
use bizdb_admin::config::Config;
use bizdb_admin::db::{Database, QueryOutcome, Record, TableDescriptor, UnsafeIdent};
use bizdb_admin::router::{AdminState, admin_router};
use futures::future::{BoxFuture, FutureExt, ready};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

/// In-memory stand-in for the MySQL handle. Table names are matched
/// case-insensitively, as on a server with `lower_case_table_names=1`.
#[derive(Default)]
pub struct MemoryDatabase {
    tables: Mutex<BTreeMap<String, Vec<Record>>>,
    calls: Mutex<Vec<String>>,
    canned: Mutex<Vec<Record>>,
    catalog: Mutex<Vec<TableDescriptor>>,
    failing_tables: Mutex<HashSet<String>>,
    insert_failures: Mutex<HashSet<(String, usize)>>,
    insert_counts: Mutex<HashMap<String, usize>>,
    broken: bool,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with a database error.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn with_table(self, name: &str, rows: Vec<Record>) -> Self {
        self.tables.lock().unwrap().insert(name.to_lowercase(), rows);
        self
    }

    pub fn with_canned_rows(self, rows: Vec<Record>) -> Self {
        *self.canned.lock().unwrap() = rows;
        self
    }

    pub fn with_catalog(self, catalog: Vec<TableDescriptor>) -> Self {
        *self.catalog.lock().unwrap() = catalog;
        self
    }

    pub fn fail_reads_of(self, table: &str) -> Self {
        self.failing_tables
            .lock()
            .unwrap()
            .insert(table.to_lowercase());
        self
    }

    /// Fail the `nth` (0-based) insert into `table`.
    pub fn fail_insert(self, table: &str, nth: usize) -> Self {
        self.insert_failures
            .lock()
            .unwrap()
            .insert((table.to_lowercase(), nth));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn rows(&self, table: &str) -> Vec<Record> {
        self.tables
            .lock()
            .unwrap()
            .get(&table.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.lock().unwrap().keys().cloned().collect()
    }

    fn record_call(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn fail<T: Send + 'static>(&self, what: &str) -> BoxFuture<'_, Result<T, AdminError>> {
        ready(Err(AdminError::DatabaseError(sqlx::Error::Protocol(
            format!("injected failure: {what}"),
        ))))
        .boxed()
    }
}

impl Database for MemoryDatabase {
    fn table_count(&self) -> BoxFuture<'_, Result<usize, AdminError>> {
        self.record_call("SHOW TABLES".to_string());
        if self.broken {
            return self.fail("SHOW TABLES");
        }
        let count = self.tables.lock().unwrap().len();
        ready(Ok(count)).boxed()
    }

    fn catalog<'a>(
        &'a self,
        schema: &'a str,
    ) -> BoxFuture<'a, Result<Vec<TableDescriptor>, AdminError>> {
        self.record_call(format!("CATALOG {schema}"));
        if self.broken {
            return self.fail("catalog");
        }
        ready(Ok(self.catalog.lock().unwrap().clone())).boxed()
    }

    fn fetch_records<'a>(
        &'a self,
        sql: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Record>, AdminError>> {
        self.record_call(sql.to_string());
        if self.broken {
            return self.fail(sql);
        }
        ready(Ok(self.canned.lock().unwrap().clone())).boxed()
    }

    fn execute<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, Result<QueryOutcome, AdminError>> {
        self.record_call(sql.to_string());
        if self.broken {
            return self.fail(sql);
        }
        ready(Ok(QueryOutcome::Rows(self.canned.lock().unwrap().clone()))).boxed()
    }

    fn select_all<'a>(
        &'a self,
        table: &'a UnsafeIdent,
    ) -> BoxFuture<'a, Result<Vec<Record>, AdminError>> {
        let sql = format!("SELECT * FROM {table}");
        self.record_call(sql.clone());
        let key = table.as_str().to_lowercase();
        if self.broken || self.failing_tables.lock().unwrap().contains(&key) {
            return self.fail(&sql);
        }
        match self.tables.lock().unwrap().get(&key) {
            Some(rows) => ready(Ok(rows.clone())).boxed(),
            None => self.fail(&format!("table {table} doesn't exist")),
        }
    }

    fn insert<'a>(
        &'a self,
        table: &'a UnsafeIdent,
        record: &'a Record,
    ) -> BoxFuture<'a, Result<(), AdminError>> {
        self.record_call(format!("INSERT INTO {table}"));
        let key = table.as_str().to_lowercase();
        let nth = {
            let mut counts = self.insert_counts.lock().unwrap();
            let n = counts.entry(key.clone()).or_default();
            let nth = *n;
            *n += 1;
            nth
        };
        if self.broken || self.insert_failures.lock().unwrap().contains(&(key.clone(), nth)) {
            return self.fail(&format!("insert #{nth} into {table}"));
        }
        let mut tables = self.tables.lock().unwrap();
        match tables.get_mut(&key) {
            Some(rows) => {
                rows.push(record.clone());
                ready(Ok(())).boxed()
            }
            None => {
                drop(tables);
                self.fail(&format!("table {table} doesn't exist"))
            }
        }
    }
}

/// Temporary directories and a config pointing into them.
pub struct TestEnv {
    pub dir: TempDir,
    pub cfg: Config,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let uploads = dir.path().join("uploads");
        std::fs::create_dir_all(&uploads).expect("failed to create upload dir");
        let cfg = Config {
            backup_dir: dir.path().join("backups"),
            schema_path: dir.path().join("schema.sql"),
            upload_dir: uploads,
            mysqldump_bin: "/nonexistent/mysqldump".to_string(),
            mysql_bin: "/nonexistent/mysql".to_string(),
            db_name: "shop".to_string(),
            db_user: "shop_admin".to_string(),
            ..Config::default()
        };
        Self { dir, cfg }
    }

    pub fn app(&self, db: Arc<MemoryDatabase>) -> Router {
        admin_router(AdminState::new(db, Arc::new(self.cfg.clone())))
    }

    pub fn uploads_left(&self) -> usize {
        std::fs::read_dir(&self.cfg.upload_dir)
            .expect("upload dir exists")
            .count()
    }
}

pub fn record(pairs: &[(&str, Value)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.expect("request failed");
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    (status, body.to_vec())
}

pub async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, req).await;
    let value = serde_json::from_slice(&body).expect("response body was not JSON");
    (status, value)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("failed to build request")
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

pub fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .expect("failed to build request")
}

const BOUNDARY: &str = "bizdb-test-boundary";

pub fn post_multipart(uri: &str, field: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("failed to build request")
}

pub fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use sqlx::FromRow;
use std::fmt;

/// One decoded result row, keyed by column name in result-set order.
pub type Record = Map<String, Value>;

/// Catalog projection of one table, as reported by `information_schema`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct TableDescriptor {
    pub name: String,
    pub records: Option<u64>,
    pub size: Option<u64>,
    #[serde(rename = "lastUpdated", serialize_with = "serialize_opt_timestamp")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Wire form of every datetime the API returns: RFC 3339, UTC, milliseconds.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Inverse of [`format_timestamp`]; anything not in exactly that form is `None`.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.3fZ").ok()
}

fn serialize_opt_timestamp<S: Serializer>(
    ts: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match ts {
        Some(ts) => serializer.serialize_str(&format_timestamp(ts)),
        None => serializer.serialize_none(),
    }
}

/// Result of an ad-hoc statement: rows for queries, a summary otherwise.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum QueryOutcome {
    Rows(Vec<Record>),
    Summary(ExecSummary),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecSummary {
    pub affected_rows: u64,
    pub insert_id: u64,
}

/// A table identifier taken from user input and spliced into SQL unescaped.
///
/// Constructing one is the only way to reach [`crate::db::Database::select_all`]
/// and [`crate::db::Database::insert`], so every such call site is explicit
/// about passing unchecked text into a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsafeIdent(String);

impl UnsafeIdent {
    pub fn new_unchecked(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnsafeIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

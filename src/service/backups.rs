use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

use crate::error::AdminError;
use crate::service::mysql_cli::MysqlCli;

/// One `.sql` file in the backups directory.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BackupRecord {
    pub filename: String,
    pub size: u64,
    pub date: DateTime<Utc>,
    pub status: BackupStatus,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackupStatus {
    Completed,
}

/// `backup_<ISO timestamp with ':' and '.' replaced by '-'>.sql`
pub fn backup_filename(now: DateTime<Utc>) -> String {
    format!("backup_{}.sql", now.format("%Y-%m-%dT%H-%M-%S-%3fZ"))
}

/// Join `name` onto `dir` only when it names a plain file inside it.
pub fn resolve_in(dir: &Path, name: &str) -> Option<PathBuf> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Some(dir.join(name)),
        _ => None,
    }
}

/// Resolve an existing backup file, or report it missing.
pub async fn existing_backup(dir: &Path, name: &str) -> Result<PathBuf, AdminError> {
    let path = resolve_in(dir, name).ok_or(AdminError::NotFound("Backup file"))?;
    if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
        Ok(path)
    } else {
        Err(AdminError::NotFound("Backup file"))
    }
}

/// Dump the database into a fresh timestamped file under `dir`.
pub async fn create(cli: &MysqlCli, dir: &Path) -> Result<BackupRecord, AdminError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AdminError::BackupFailed(format!("create {}: {e}", dir.display())))?;

    let filename = backup_filename(Utc::now());
    let path = dir.join(&filename);

    if let Err(e) = cli.dump(&path).await {
        if let Err(rm) = tokio::fs::remove_file(&path).await {
            warn!(path = %path.display(), error = %rm, "failed to remove partial backup");
        }
        return Err(AdminError::BackupFailed(e.to_string()));
    }

    let meta = tokio::fs::metadata(&path)
        .await
        .map_err(|e| AdminError::BackupFailed(format!("stat {}: {e}", path.display())))?;
    info!(filename = %filename, size = meta.len(), "backup created");

    Ok(BackupRecord {
        filename,
        size: meta.len(),
        date: Utc::now(),
        status: BackupStatus::Completed,
    })
}

/// List `.sql` files in `dir`, newest first. A missing directory is an empty list.
pub async fn list(dir: &Path) -> Result<Vec<BackupRecord>, AdminError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut backups = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !is_sql_file(&path) {
            continue;
        }
        let meta = entry.metadata().await?;
        if !meta.is_file() {
            continue;
        }
        backups.push(BackupRecord {
            filename: entry.file_name().to_string_lossy().into_owned(),
            size: meta.len(),
            date: meta.modified()?.into(),
            status: BackupStatus::Completed,
        });
    }

    // Stable: ties keep directory iteration order.
    backups.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(backups)
}

fn is_sql_file(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("sql")
}

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use thiserror::Error as ThisError;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::Config;

#[derive(Debug, ThisError)]
pub enum CliError {
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Bridge to the `mysqldump` / `mysql` command line tools.
///
/// Every value reaches the child as its own argv entry; nothing goes through a
/// shell. The password is handed over in `MYSQL_PWD` so it never shows up in
/// the process list.
#[derive(Debug, Clone)]
pub struct MysqlCli {
    dump_bin: String,
    client_bin: String,
    host: String,
    port: u16,
    user: String,
    password: String,
    database: String,
}

impl MysqlCli {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            dump_bin: cfg.mysqldump_bin.clone(),
            client_bin: cfg.mysql_bin.clone(),
            host: cfg.db_host.clone(),
            port: cfg.db_port,
            user: cfg.db_user.clone(),
            password: cfg.db_password.clone(),
            database: cfg.db_name.clone(),
        }
    }

    /// Dump the configured database into `out`, creating or truncating it.
    pub async fn dump(&self, out: &Path) -> Result<(), CliError> {
        let file = tokio::fs::File::create(out)
            .await
            .map_err(|source| self.spawn_error(&self.dump_bin, source))?
            .into_std()
            .await;

        let mut cmd = self.command(&self.dump_bin);
        cmd.stdin(Stdio::null()).stdout(Stdio::from(file));
        info!(program = %self.dump_bin, out = %out.display(), "dumping database");
        self.run(&self.dump_bin, cmd).await
    }

    /// Feed the SQL script at `input` into the configured database.
    pub async fn load(&self, input: &Path) -> Result<(), CliError> {
        let file = tokio::fs::File::open(input)
            .await
            .map_err(|source| self.spawn_error(&self.client_bin, source))?
            .into_std()
            .await;

        let mut cmd = self.command(&self.client_bin);
        cmd.stdin(Stdio::from(file)).stdout(Stdio::null());
        info!(program = %self.client_bin, input = %input.display(), "loading SQL script");
        self.run(&self.client_bin, cmd).await
    }

    fn command(&self, program: &str) -> Command {
        let mut cmd = Command::new(program);
        cmd.arg("--host")
            .arg(&self.host)
            .arg("--port")
            .arg(self.port.to_string())
            .arg("--user")
            .arg(&self.user)
            .arg(&self.database)
            .stderr(Stdio::piped());
        if !self.password.is_empty() {
            cmd.env("MYSQL_PWD", &self.password);
        }
        cmd
    }

    async fn run(&self, program: &str, mut cmd: Command) -> Result<(), CliError> {
        // Not `output()`: stdout may already point at the dump file.
        let child = cmd
            .spawn()
            .map_err(|source| self.spawn_error(program, source))?;
        let output = child
            .wait_with_output()
            .await
            .map_err(|source| self.spawn_error(program, source))?;
        if output.status.success() {
            debug!(program, "command finished");
            return Ok(());
        }
        Err(CliError::Exit {
            program: program.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    fn spawn_error(&self, program: &str, source: std::io::Error) -> CliError {
        CliError::Spawn {
            program: program.to_string(),
            source,
        }
    }
}

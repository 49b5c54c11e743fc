use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Environment variables consulted when resolving [`Config`].
const ENV_KEYS: &[&str] = &[
    "DB_HOST",
    "DB_USER",
    "DB_PASSWORD",
    "DB_NAME",
    "DB_PORT",
    "PORT",
    "JWT_SECRET",
    "CORS_ORIGINS",
    "LOGLEVEL",
    "BACKUP_DIR",
    "SCHEMA_PATH",
    "UPLOAD_DIR",
    "UPLOAD_LIMIT_BYTES",
    "MYSQLDUMP_BIN",
    "MYSQL_BIN",
];

/// Runtime configuration, resolved once at startup from defaults overlaid with
/// the process environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(deserialize_with = "lossy_string")]
    pub db_host: String,
    #[serde(deserialize_with = "lossy_string")]
    pub db_user: String,
    #[serde(deserialize_with = "lossy_string")]
    pub db_password: String,
    #[serde(deserialize_with = "lossy_string")]
    pub db_name: String,
    pub db_port: u16,

    /// HTTP listen port.
    pub port: u16,
    /// Declared for deployment parity; no route performs authentication.
    #[serde(deserialize_with = "lossy_string")]
    pub jwt_secret: String,
    /// Comma separated list of allowed CORS origins. `*` allows any origin.
    pub cors_origins: String,
    pub loglevel: String,

    pub backup_dir: PathBuf,
    pub schema_path: PathBuf,
    pub upload_dir: PathBuf,
    pub upload_limit_bytes: usize,

    pub mysqldump_bin: String,
    pub mysql_bin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_host: "localhost".to_string(),
            db_user: "root".to_string(),
            db_password: String::new(),
            db_name: "clothing_business".to_string(),
            db_port: 3306,
            port: 3000,
            jwt_secret: "your-secret-key".to_string(),
            cors_origins: "http://localhost:3000".to_string(),
            loglevel: "info".to_string(),
            backup_dir: PathBuf::from("backups"),
            schema_path: PathBuf::from("schema.sql"),
            upload_dir: std::env::temp_dir(),
            upload_limit_bytes: 32 * 1024 * 1024,
            mysqldump_bin: "mysqldump".to_string(),
            mysql_bin: "mysql".to_string(),
        }
    }
}

impl Config {
    /// Resolve configuration from built-in defaults and the environment.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::raw().only(ENV_KEYS))
            .extract()
    }

    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Env values such as `DB_PASSWORD=123456` arrive as numbers; keep them as text.
fn lossy_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Signed(i64),
        Unsigned(u64),
        Float(f64),
        Flag(bool),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Signed(n) => n.to_string(),
        Raw::Unsigned(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
        Raw::Flag(b) => b.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let cfg = Config {
            cors_origins: "http://a.test, http://b.test,,".to_string(),
            ..Config::default()
        };
        assert_eq!(
            cfg.cors_origin_list(),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn numeric_secrets_stay_textual() {
        let cfg: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Serialized::default("db_password", 123456))
            .merge(Serialized::default("db_port", 3307))
            .extract()
            .expect("config should extract");
        assert_eq!(cfg.db_password, "123456");
        assert_eq!(cfg.db_port, 3307);
        assert_eq!(cfg.db_name, "clothing_business");
    }
}

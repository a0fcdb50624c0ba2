//! The configuration model: named credentials and database entries loaded
//! from `$HOME/.config/connect/config.yaml`, plus the DSN string each
//! resolved entry formats into.
//!
//! Ported from `pkg/config.go`'s `Config`/`ConnectionInfo`/`User` and
//! `LoadConfig`/`ConfigPath`.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseEntry {
    pub host: String,
    #[serde(default)]
    pub port: u16,
    pub alias: String,
    pub database: String,
    #[serde(default)]
    pub tunnel: String,
    #[serde(default = "default_driver")]
    pub driver: String,
}

fn default_driver() -> String {
    "mysql".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Options {
    #[serde(default)]
    pub autolimit: i64,
    #[serde(default = "default_histsize")]
    pub histsize: usize,
    #[serde(default = "default_tabsize")]
    pub tabsize: usize,
}

fn default_histsize() -> usize {
    10_000
}

fn default_tabsize() -> usize {
    4
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub credentials: HashMap<String, Credential>,
    #[serde(default)]
    pub databases: HashMap<String, DatabaseEntry>,
    #[serde(default)]
    pub options: Options,
}

impl Config {
    /// Load and parse the YAML file at `path`.
    pub fn load(path: &std::path::Path) -> Result<Config, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// `$HOME/.config/connect/<filename>`.
pub fn config_path(filename: &str) -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(".config").join("connect").join(filename))
}

/// A fully resolved connection, ready to format into a driver DSN.
/// Ported from `pkg/config.go`'s `Connection`.
pub struct Connection {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl Connection {
    /// `user:pass@tcp(host:port)/db`, or `user:pass@unix(path)/db` when
    /// `host` names a socket path (contains `/`) rather than a hostname —
    /// matching the scheme split used for tunnel addresses.
    pub fn dsn(&self) -> String {
        let creds = if self.username.is_empty() && self.password.is_empty() {
            String::new()
        } else {
            format!("{}:{}@", self.username, self.password)
        };
        let address = if self.host.contains('/') {
            format!("unix({})", self.host)
        } else {
            format!("tcp({}:{})", self.host, self.port)
        };
        format!("{creds}{address}/{}", self.database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dsn_without_credentials() {
        let conn = Connection {
            username: String::new(),
            password: String::new(),
            host: "127.0.0.1".into(),
            port: 3306,
            database: String::new(),
        };
        assert_eq!(conn.dsn(), "tcp(127.0.0.1:3306)/");
    }

    #[test]
    fn dsn_with_credentials_over_tcp() {
        let conn = Connection {
            username: "username".into(),
            password: "password".into(),
            host: "host.docker.internal".into(),
            port: 3306,
            database: "dbname".into(),
        };
        assert_eq!(conn.dsn(), "username:password@tcp(host.docker.internal:3306)/dbname");
    }

    #[test]
    fn dsn_over_unix_socket() {
        let conn = Connection {
            username: "admin".into(),
            password: "admin".into(),
            host: "/var/run/mysql.sock".into(),
            port: 0,
            database: "mysql".into(),
        };
        assert_eq!(conn.dsn(), "admin:admin@unix(/var/run/mysql.sock)/mysql");
    }

    #[test]
    fn config_path_lands_under_dot_config_connect() {
        let path = config_path("config.yaml").unwrap();
        assert!(path.ends_with(".config/connect/config.yaml"));
    }

    #[test]
    fn loads_minimal_yaml() {
        let yaml = r#"
credentials:
  default:
    username: admin
    password: secret
databases:
  mydb:
    host: 127.0.0.1
    port: 3306
    alias: mydb
    database: app
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.credentials["default"].username, "admin");
        assert_eq!(cfg.databases["mydb"].port, 3306);
        assert_eq!(cfg.databases["mydb"].driver, "mysql");
        assert_eq!(cfg.options.histsize, 10_000);
    }
}

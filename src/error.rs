//! Typed errors for each component, per the error-handling design: most
//! variants are recoverable in place (logged and absorbed by the caller);
//! a few are fatal and terminate the session or the process.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("input I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("terminal setup failed: {0}")]
    TerminalSetup(std::io::Error),
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("no more commands")]
    Exhausted,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: std::path::PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("could not determine home directory")]
    NoHomeDir,
}

#[derive(Debug, Error)]
pub enum TunnelError {
    #[error("unable to connect to ssh agent: {0}")]
    Agent(std::io::Error),
    #[error("ssh handshake failed: {0}")]
    Handshake(ssh2::Error),
    #[error("ssh authentication failed")]
    AuthFailed,
    #[error("unable to connect to ssh server: {0}")]
    SshDial(std::io::Error),
    #[error("unable to connect to remote address: {0}")]
    RemoteDial(ssh2::Error),
    #[error("failed to start local listener: {0}")]
    Listen(std::io::Error),
    #[error("invalid address {0:?}: expected host:port")]
    InvalidAddress(String),
    #[error("forwarding I/O error: {0}")]
    Copy(#[from] std::io::Error),
}

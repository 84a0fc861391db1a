//! Command-line configuration for the server and the publisher.
//!
//! Every flag can also be given through a `QUIRE_*` environment variable.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::builder::NonEmptyStringValueParser;
use clap::Parser;
use zeroize::Zeroizing;

use quire_store::SortOrder;

use crate::context::DEFAULT_UPDATE_LIMIT;
use crate::error::{Result, ServerError};

/// Configuration for `quire-server`.
#[derive(Debug, Clone, Parser)]
#[command(name = "quire-server", version, about = "Serve and accept encrypted content updates")]
pub struct ServerConfig {
    /// File holding the shared update secret.
    #[arg(long, env = "QUIRE_PASSFILE")]
    pub passfile: PathBuf,

    /// SQLite database path.
    #[arg(long, env = "QUIRE_DB")]
    pub db: PathBuf,

    /// Address to listen on.
    #[arg(long, env = "QUIRE_ADDR", default_value = "0.0.0.0:8080")]
    pub addr: SocketAddr,

    /// Listing order: newest or oldest.
    #[arg(long, env = "QUIRE_ORDER", default_value = "newest")]
    pub order: SortOrder,

    /// Largest accepted update body, in bytes.
    #[arg(long, env = "QUIRE_MAX_UPDATE_BYTES", default_value_t = DEFAULT_UPDATE_LIMIT)]
    pub max_update_bytes: usize,

    /// Emit logs as JSON lines.
    #[arg(long, env = "QUIRE_JSON_LOGS")]
    pub json_logs: bool,
}

/// Configuration for `quire-publish`.
#[derive(Debug, Clone, Parser)]
#[command(name = "quire-publish", version, about = "Push a new record to a quire server")]
pub struct PublishConfig {
    /// File holding the shared update secret.
    #[arg(long, env = "QUIRE_PASSFILE")]
    pub passfile: PathBuf,

    /// Base URL of the server, e.g. http://localhost:8080.
    #[arg(long, short = 'a', env = "QUIRE_SERVER", value_parser = NonEmptyStringValueParser::new())]
    pub addr: String,

    /// File whose contents become the record body.
    #[arg(long, short = 'f')]
    pub file: PathBuf,

    /// Name to store the record under.
    #[arg(long, short = 'n', value_parser = NonEmptyStringValueParser::new())]
    pub name: String,

    /// Record title.
    #[arg(long, short = 't', value_parser = NonEmptyStringValueParser::new())]
    pub title: String,

    /// Emit logs as JSON lines.
    #[arg(long, env = "QUIRE_JSON_LOGS")]
    pub json_logs: bool,
}

/// Read the shared secret from `path`.
///
/// The file's bytes are used verbatim. An empty file is an error.
pub fn load_secret(path: &Path) -> Result<Zeroizing<Vec<u8>>> {
    let bytes = Zeroizing::new(
        fs::read(path)
            .map_err(|e| ServerError::Config(format!("reading {}: {}", path.display(), e)))?,
    );
    if bytes.is_empty() {
        return Err(ServerError::Config(format!(
            "secret file {} is empty",
            path.display()
        )));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let config =
            ServerConfig::try_parse_from(["quire-server", "--passfile", "p", "--db", "d.db"])
                .unwrap();
        assert_eq!(config.addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.order, SortOrder::NewestFirst);
        assert_eq!(config.max_update_bytes, DEFAULT_UPDATE_LIMIT);
        assert!(!config.json_logs);
    }

    #[test]
    fn test_server_flags() {
        let config = ServerConfig::try_parse_from([
            "quire-server",
            "--passfile",
            "p",
            "--db",
            "d.db",
            "--addr",
            "127.0.0.1:9000",
            "--order",
            "oldest",
            "--max-update-bytes",
            "1024",
            "--json-logs",
        ])
        .unwrap();
        assert_eq!(config.max_update_bytes, 1024);
        assert_eq!(config.addr.port(), 9000);
        assert_eq!(config.order, SortOrder::OldestFirst);
        assert!(config.json_logs);
    }

    #[test]
    fn test_server_rejects_bad_order() {
        assert!(ServerConfig::try_parse_from([
            "quire-server",
            "--passfile",
            "p",
            "--db",
            "d.db",
            "--order",
            "sideways",
        ])
        .is_err());
    }

    #[test]
    fn test_publish_requires_name() {
        assert!(PublishConfig::try_parse_from([
            "quire-publish",
            "--passfile",
            "p",
            "-a",
            "http://localhost:8080",
            "-f",
            "body.html",
            "-t",
            "Title",
        ])
        .is_err());

        let config = PublishConfig::try_parse_from([
            "quire-publish",
            "--passfile",
            "p",
            "-a",
            "http://localhost:8080",
            "-f",
            "body.html",
            "-n",
            "post",
            "-t",
            "Title",
        ])
        .unwrap();
        assert_eq!(config.name, "post");
    }

    #[test]
    fn test_load_secret() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret");

        std::fs::write(&path, [0u8, 1, 2, 255]).unwrap();
        assert_eq!(load_secret(&path).unwrap().as_slice(), &[0u8, 1, 2, 255]);

        std::fs::write(&path, b"").unwrap();
        assert!(matches!(load_secret(&path), Err(ServerError::Config(_))));

        assert!(matches!(
            load_secret(&dir.path().join("missing")),
            Err(ServerError::Config(_))
        ));
    }
}

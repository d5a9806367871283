//! Environment-driven configuration for the API binary.

use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_LISTEN: &str = "0.0.0.0:8002";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `GRAPHMAP_LISTEN`.
    pub listen: SocketAddr,
    /// `GRAPHMAP_SQLITE_PATH`; only honoured with the `sqlite` feature.
    pub sqlite_path: Option<PathBuf>,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, std::net::AddrParseError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, std::net::AddrParseError> {
        let listen = lookup("GRAPHMAP_LISTEN")
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string())
            .parse()?;
        let sqlite_path = lookup("GRAPHMAP_SQLITE_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        Ok(Self {
            listen,
            sqlite_path,
        })
    }
}

//! Server configuration.
//!
//! Layers apply in order, later ones overriding earlier ones:
//! 1. built-in defaults,
//! 2. a TOML file (every key optional),
//! 3. environment variables with a prefix, e.g. `MORTAR_ADDR`.
//!
//! ```rust,no_run
//! use mortar::Config;
//!
//! # fn main() -> Result<(), mortar::Error> {
//! let config = Config::from_file("mortar.toml")?.with_env("MORTAR")?;
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Error;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Address the server binds to.
    pub addr: SocketAddr,
    /// How long in-flight connections may run after a shutdown signal before
    /// they are aborted.
    pub shutdown_grace_secs: u64,
    /// `tracing-subscriber` filter directive for binaries that install one.
    pub log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            shutdown_grace_secs: 30,
            log: "info".to_owned(),
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self, Error> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    /// Overrides fields from `{PREFIX}_ADDR`, `{PREFIX}_SHUTDOWN_GRACE_SECS`
    /// and `{PREFIX}_LOG`.
    pub fn with_env(self, prefix: &str) -> Result<Self, Error> {
        self.with_vars(prefix, |key| std::env::var(key).ok())
    }

    /// Same as [`with_env`](Self::with_env) with an explicit variable lookup.
    pub fn with_vars(
        mut self,
        prefix: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Error> {
        let var = |name: &str| {
            let key = format!("{prefix}_{name}");
            lookup(&key).map(|value| (key, value))
        };

        if let Some((key, value)) = var("ADDR") {
            self.addr = value.parse().map_err(|e| Error::Config(format!("{key}: {e}")))?;
        }
        if let Some((key, value)) = var("SHUTDOWN_GRACE_SECS") {
            self.shutdown_grace_secs =
                value.parse().map_err(|e| Error::Config(format!("{key}: {e}")))?;
        }
        if let Some((_, value)) = var("LOG") {
            self.log = value;
        }
        Ok(self)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn empty_file_is_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn file_overrides_some_fields() {
        let config = Config::from_toml("addr = \"127.0.0.1:8080\"\nshutdown_grace_secs = 5\n").unwrap();
        assert_eq!(config.addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.shutdown_grace(), Duration::from_secs(5));
        assert_eq!(config.log, "info");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(Config::from_toml("port = 1"), Err(Error::Config(_))));
    }

    #[test]
    fn env_overrides_file() {
        let vars = HashMap::from([
            ("APP_ADDR", "10.0.0.1:9000"),
            ("APP_LOG", "mortar=debug"),
        ]);
        let config = Config::from_toml("addr = \"127.0.0.1:8080\"")
            .unwrap()
            .with_vars("APP", |k| vars.get(k).map(|v| (*v).to_owned()))
            .unwrap();

        assert_eq!(config.addr, "10.0.0.1:9000".parse().unwrap());
        assert_eq!(config.log, "mortar=debug");
        assert_eq!(config.shutdown_grace_secs, 30);
    }

    #[test]
    fn bad_env_value_names_the_variable() {
        let err = Config::default()
            .with_vars("APP", |k| (k == "APP_SHUTDOWN_GRACE_SECS").then(|| "soon".to_owned()))
            .unwrap_err();
        assert!(err.to_string().contains("APP_SHUTDOWN_GRACE_SECS"));
    }
}

//! TOML config-file overlay (SPEC_FULL.md §3 "Config"): every field is also
//! a CLI flag, and a CLI flag always wins over the file when both are given.

use std::path::PathBuf;

use engine::HubConfig;
use serde::Deserialize;

const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_METRICS_ADDR: &str = "0.0.0.0:9090";

/// Mirrors `HubConfig` plus the two listener addresses the hub itself
/// doesn't need to know about. Every field is optional so a file can set
/// only the values it cares about.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub server_addr: Option<String>,
    pub metrics_addr: Option<String>,
    pub max_books: Option<usize>,
    pub engine_path: Option<PathBuf>,
    pub default_venue: Option<String>,
    pub default_symbol: Option<String>,
    pub excess: Option<bool>,
    pub accounts_file: Option<PathBuf>,
}

/// Resolved settings the `cli` binary needs to start the hub and the HTTP
/// server: `HubConfig` plus the two bind addresses.
pub struct ResolvedConfig {
    pub hub: HubConfig,
    pub server_addr: String,
    pub metrics_addr: String,
}

/// Merges CLI-supplied overrides over an optional file config, falling back
/// to `HubConfig::default()`/the listener defaults for anything neither
/// source set.
#[must_use]
pub fn resolve(file: Option<FileConfig>, cli: &crate::Cli) -> ResolvedConfig {
    let file = file.unwrap_or_default();
    let defaults = HubConfig::default();

    let hub = HubConfig {
        max_books: cli.maxbooks.or(file.max_books).unwrap_or(defaults.max_books),
        engine_path: cli.engine_path.clone().or(file.engine_path).unwrap_or(defaults.engine_path),
        default_venue: cli.venue.clone().or(file.default_venue).unwrap_or(defaults.default_venue),
        default_symbol: cli.symbol.clone().or(file.default_symbol).unwrap_or(defaults.default_symbol),
        excess: cli.excess.or(file.excess).unwrap_or(defaults.excess),
        accounts_file: cli.accounts.clone().or(file.accounts_file).or(defaults.accounts_file),
    };

    let server_addr = cli
        .port
        .map(|port| format!("0.0.0.0:{port}"))
        .or(file.server_addr)
        .unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_owned());
    let metrics_addr = cli
        .metrics_port
        .map(|port| format!("0.0.0.0:{port}"))
        .or(file.metrics_addr)
        .unwrap_or_else(|| DEFAULT_METRICS_ADDR.to_owned());

    ResolvedConfig { hub, server_addr, metrics_addr }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn cli_flags_override_file_config() {
        let cli = crate::Cli::parse_from(["disorderbook", "--maxbooks", "5", "--venue", "EX1"]);
        let file = FileConfig {
            max_books: Some(100),
            default_venue: Some("OTHER".to_owned()),
            default_symbol: Some("BAR".to_owned()),
            ..FileConfig::default()
        };

        let resolved = resolve(Some(file), &cli);

        assert_eq!(resolved.hub.max_books, 5);
        assert_eq!(resolved.hub.default_venue, "EX1");
        assert_eq!(resolved.hub.default_symbol, "BAR");
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cli = crate::Cli::parse_from(["disorderbook"]);
        let resolved = resolve(None, &cli);

        assert_eq!(resolved.hub.max_books, 100);
        assert_eq!(resolved.hub.default_venue, "TESTEX");
        assert_eq!(resolved.server_addr, "0.0.0.0:8000");
    }
}

//! Hub configuration (SPEC_FULL.md §3 "Config"): settable by CLI flags and
//! optionally overlaid on a TOML config file by the `cli` crate.

use std::path::PathBuf;

use serde::Deserialize;

const DEFAULT_MAX_BOOKS: usize = 100;
const DEFAULT_VENUE: &str = "TESTEX";
const DEFAULT_SYMBOL: &str = "FOOBAR";
const DEFAULT_ENGINE_PATH: &str = "./disorderBook.exe";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub max_books: usize,
    pub engine_path: PathBuf,
    pub default_venue: String,
    pub default_symbol: String,
    pub excess: bool,
    pub accounts_file: Option<PathBuf>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_books: DEFAULT_MAX_BOOKS,
            engine_path: PathBuf::from(DEFAULT_ENGINE_PATH),
            default_venue: DEFAULT_VENUE.to_owned(),
            default_symbol: DEFAULT_SYMBOL.to_owned(),
            excess: false,
            accounts_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = HubConfig::default();
        assert_eq!(config.max_books, 100);
        assert_eq!(config.default_venue, "TESTEX");
        assert_eq!(config.default_symbol, "FOOBAR");
        assert!(!config.excess);
    }
}

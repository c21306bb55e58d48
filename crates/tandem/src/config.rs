use crate::{Error, Result};

/// Tunables shared by every collection of a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Rows requested per page when the caller does not fix a limit.
    pub page_size: usize,

    /// Keys per batch-get call in indexed mode.
    pub batch_get_chunk: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            page_size: 1000,
            batch_get_chunk: 100,
        }
    }
}

impl Config {
    /// Reads `TANDEM_PAGE_SIZE` and `TANDEM_BATCH_GET_CHUNK`, falling back to
    /// the defaults for unset variables.
    pub fn from_env() -> Result<Config> {
        Config::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let mut config = Config::default();

        if let Some(value) = lookup("TANDEM_PAGE_SIZE") {
            config.page_size = parse_positive("TANDEM_PAGE_SIZE", &value)?;
        }

        if let Some(value) = lookup("TANDEM_BATCH_GET_CHUNK") {
            config.batch_get_chunk = parse_positive("TANDEM_BATCH_GET_CHUNK", &value)?;
        }

        Ok(config)
    }
}

fn parse_positive(name: &str, value: &str) -> Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::invalid_argument(format!(
            "{name} must be a positive integer; got `{value}`"
        ))),
    }
}

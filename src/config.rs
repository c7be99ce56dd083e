use std::env;
use std::str::FromStr;

/// Runtime knobs the repository layer reads.
///
/// `cache_enabled` gates every cache interaction; the other fields tune
/// the cache bound and the connection's busy timeout.
#[derive(Clone, Debug)]
pub struct Configuration {
    pub cache_enabled: bool,
    pub cache_capacity: usize,
    pub busy_timeout_ms: u64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_capacity: 1024,
            busy_timeout_ms: 500,
        }
    }
}

impl Configuration {
    /// Load from the environment, falling back to defaults for anything
    /// unset or unparsable. A `.env` file is honored when present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Self {
            cache_enabled: parse_bool(
                env::var("REPOLITE_CACHE").ok(),
                defaults.cache_enabled,
            ),
            cache_capacity: parse_or(
                env::var("REPOLITE_CACHE_CAPACITY").ok(),
                defaults.cache_capacity,
            ),
            busy_timeout_ms: parse_or(
                env::var("REPOLITE_BUSY_TIMEOUT_MS").ok(),
                defaults.busy_timeout_ms,
            ),
        }
    }

    pub fn without_cache(mut self) -> Self {
        self.cache_enabled = false;
        self
    }
}

fn parse_bool(raw: Option<String>, default: bool) -> bool {
    match raw {
        Some(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        None => default,
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

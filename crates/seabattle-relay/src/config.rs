//! Relay configuration from environment variables.

use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MIN_KEY_BITS: u64 = 1024;
/// Floor for `SEABATTLE_MIN_KEY_BITS`
pub const MIN_KEY_BITS: u64 = 256;
pub const DEFAULT_MAX_MATCHES: usize = 256;
pub const DEFAULT_MATCH_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    /// Smallest Paillier modulus accepted from a joining player
    pub min_key_bits: u64,
    pub max_matches: usize,
    /// Matches older than this are dropped when a new one is created
    pub match_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            min_key_bits: DEFAULT_MIN_KEY_BITS,
            max_matches: DEFAULT_MAX_MATCHES,
            match_ttl: DEFAULT_MATCH_TTL,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT);
        let mut min_key_bits = parse_or(&lookup, "SEABATTLE_MIN_KEY_BITS", DEFAULT_MIN_KEY_BITS);
        if min_key_bits < MIN_KEY_BITS {
            tracing::warn!(
                "SEABATTLE_MIN_KEY_BITS={} is below the floor, using {}",
                min_key_bits,
                MIN_KEY_BITS
            );
            min_key_bits = MIN_KEY_BITS;
        }
        let mut max_matches = parse_or(&lookup, "SEABATTLE_MAX_MATCHES", DEFAULT_MAX_MATCHES);
        if max_matches == 0 {
            tracing::warn!("SEABATTLE_MAX_MATCHES=0 would refuse every match, using 1");
            max_matches = 1;
        }
        let ttl_secs = parse_or(
            &lookup,
            "SEABATTLE_MATCH_TTL_SECS",
            DEFAULT_MATCH_TTL.as_secs(),
        );
        Self {
            port,
            min_key_bits,
            max_matches,
            match_ttl: Duration::from_secs(ttl_secs),
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparsable {}={:?}, using {}", key, raw, default);
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(config(&[]), Config::default());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("PORT", "8080"),
            ("SEABATTLE_MIN_KEY_BITS", "2048"),
            ("SEABATTLE_MAX_MATCHES", "10"),
            ("SEABATTLE_MATCH_TTL_SECS", "90"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.min_key_bits, 2048);
        assert_eq!(config.max_matches, 10);
        assert_eq!(config.match_ttl, Duration::from_secs(90));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config(&[
            ("PORT", "http"),
            ("SEABATTLE_MIN_KEY_BITS", "64"),
            ("SEABATTLE_MAX_MATCHES", "0"),
        ]);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.min_key_bits, MIN_KEY_BITS);
        assert_eq!(config.max_matches, 1);
    }
}

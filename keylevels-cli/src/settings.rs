use keylevels_data::deribit::{DERIBIT_BASE_URL, FetchConfig};
use smol_str::SmolStr;
use std::path::PathBuf;

/// Process settings, read from environment variables with defaults.
///
/// * `KEYLEVELS_CURRENCIES`: comma separated currencies (default: `BTC,ETH`)
/// * `KEYLEVELS_HOURS_BACK`: trade tape lookback in hours (default: 24)
/// * `KEYLEVELS_CHUNK_HOURS`: trade tape chunk size in hours (default: 4)
/// * `KEYLEVELS_JSON_OUT`: directory to write JSON exports to (default: disabled)
/// * `KEYLEVELS_LOG_JSON`: emit JSON formatted logs when `1` or `true`
/// * `DERIBIT_BASE_URL`: REST API base url
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub currencies: Vec<SmolStr>,
    pub hours_back: u32,
    pub chunk_hours: u32,
    pub json_out: Option<PathBuf>,
    pub log_json: bool,
    pub base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currencies: vec![SmolStr::new_static("BTC"), SmolStr::new_static("ETH")],
            hours_back: 24,
            chunk_hours: 4,
            json_out: None,
            log_json: false,
            base_url: DERIBIT_BASE_URL.to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let currencies = lookup("KEYLEVELS_CURRENCIES")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|currency| !currency.is_empty())
                    .map(|currency| SmolStr::new(currency.to_uppercase()))
                    .collect::<Vec<_>>()
            })
            .filter(|currencies| !currencies.is_empty())
            .unwrap_or(defaults.currencies);

        Self {
            currencies,
            hours_back: lookup("KEYLEVELS_HOURS_BACK")
                .and_then(|value| value.parse().ok())
                .unwrap_or(defaults.hours_back),
            chunk_hours: lookup("KEYLEVELS_CHUNK_HOURS")
                .and_then(|value| value.parse().ok())
                .filter(|hours| *hours > 0)
                .unwrap_or(defaults.chunk_hours),
            json_out: lookup("KEYLEVELS_JSON_OUT")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            log_json: lookup("KEYLEVELS_LOG_JSON")
                .is_some_and(|value| matches!(value.trim(), "1" | "true")),
            base_url: lookup("DERIBIT_BASE_URL").unwrap_or(defaults.base_url),
        }
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            base_url: self.base_url.clone(),
            hours_back: self.hours_back,
            chunk_hours: self.chunk_hours,
            ..FetchConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_settings_from_lookup() {
        struct TestCase {
            input: Vec<(&'static str, &'static str)>,
            expected: Settings,
        }

        let tests = vec![
            TestCase {
                // TC0: nothing set
                input: vec![],
                expected: Settings::default(),
            },
            TestCase {
                // TC1: everything set
                input: vec![
                    ("KEYLEVELS_CURRENCIES", " btc , sol,"),
                    ("KEYLEVELS_HOURS_BACK", "12"),
                    ("KEYLEVELS_CHUNK_HOURS", "2"),
                    ("KEYLEVELS_JSON_OUT", "/tmp/levels"),
                    ("KEYLEVELS_LOG_JSON", "true"),
                    ("DERIBIT_BASE_URL", "https://test.deribit.com/api/v2"),
                ],
                expected: Settings {
                    currencies: vec![SmolStr::new("BTC"), SmolStr::new("SOL")],
                    hours_back: 12,
                    chunk_hours: 2,
                    json_out: Some(PathBuf::from("/tmp/levels")),
                    log_json: true,
                    base_url: "https://test.deribit.com/api/v2".to_string(),
                },
            },
            TestCase {
                // TC2: invalid values fall back to defaults
                input: vec![
                    ("KEYLEVELS_CURRENCIES", " , "),
                    ("KEYLEVELS_HOURS_BACK", "-3"),
                    ("KEYLEVELS_CHUNK_HOURS", "0"),
                    ("KEYLEVELS_JSON_OUT", ""),
                    ("KEYLEVELS_LOG_JSON", "yes please"),
                ],
                expected: Settings::default(),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let env = test
                .input
                .into_iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect::<HashMap<_, _>>();

            let actual = Settings::from_lookup(|key| env.get(key).cloned());
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_fetch_config_carries_lookback() {
        let settings = Settings {
            hours_back: 6,
            chunk_hours: 1,
            ..Settings::default()
        };

        let config = settings.fetch_config();
        assert_eq!(config.hours_back, 6);
        assert_eq!(config.chunk_hours, 1);
        assert_eq!(config.base_url, DERIBIT_BASE_URL);
        assert_eq!(config.max_retries, 3);
    }
}

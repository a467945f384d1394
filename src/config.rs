use std::env;
use std::path::PathBuf;

use thiserror::Error;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ACADEMIC_YEAR: &str = "2024-2025";

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub log_level: String,
    /// Printed on report letterheads.
    pub academic_year: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} is set but empty")]
    Blank { key: &'static str },
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            data_dir: PathBuf::from(setting("PLACEMENT_DATA_DIR", DEFAULT_DATA_DIR)?),
            log_level: setting("PLACEMENT_LOG_LEVEL", DEFAULT_LOG_LEVEL)?,
            academic_year: setting("PLACEMENT_ACADEMIC_YEAR", DEFAULT_ACADEMIC_YEAR)?,
        })
    }
}

fn setting(key: &'static str, default: &str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => Err(ConfigError::Blank { key }),
        Ok(value) => Ok(value.trim().to_string()),
        Err(_) => Ok(default.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("PLACEMENT_DATA_DIR");
        env::remove_var("PLACEMENT_LOG_LEVEL");
        env::remove_var("PLACEMENT_ACADEMIC_YEAR");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.academic_year, "2024-2025");
    }

    #[test]
    fn blank_values_are_rejected() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PLACEMENT_DATA_DIR", "  ");
        let err = AppConfig::load().expect_err("blank data dir fails");
        assert_eq!(err.to_string(), "PLACEMENT_DATA_DIR is set but empty");
        reset_env();
    }

    #[test]
    fn env_overrides_defaults() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PLACEMENT_ACADEMIC_YEAR", "2025-2026");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.academic_year, "2025-2026");
        reset_env();
    }
}

use anyhow::{Context, Result};
use calmcp_provider_caldav::CalDavSettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// CalDAV connection settings
    #[serde(default)]
    pub caldav: CalDavConfig,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct CalDavConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Calendar home collection; skips discovery when set
    pub calendar_home: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl CalDavConfig {
    /// Override file values with CALDAV_* variables from `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let set = |target: &mut Option<String>, name: &str| {
            if let Some(value) = var(name).filter(|v| !v.trim().is_empty()) {
                *target = Some(value);
            }
        };

        set(&mut self.url, "CALDAV_URL");
        set(&mut self.username, "CALDAV_USERNAME");
        set(&mut self.password, "CALDAV_PASSWORD");
        set(&mut self.calendar_home, "CALDAV_CALENDAR_HOME");

        let mut timeout = None;
        set(&mut timeout, "CALDAV_TIMEOUT_SECS");
        if let Some(secs) = timeout.and_then(|t| t.trim().parse().ok()) {
            self.timeout_secs = Some(secs);
        }
    }

    pub fn into_settings(self) -> Result<CalDavSettings> {
        let url = self
            .url
            .context("No CalDAV server URL configured. Set CALDAV_URL or [caldav].url in the config file")?;
        let username = self
            .username
            .context("No CalDAV username configured. Set CALDAV_USERNAME or [caldav].username in the config file")?;

        Ok(CalDavSettings {
            url,
            username,
            password: self.password,
            calendar_home: self.calendar_home,
            timeout: Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        })
    }
}

/// Get the config directory path (~/.config/calmcp)
pub fn config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("calmcp");
    Ok(config_dir)
}

/// Get the default config file path (~/.config/calmcp/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Read a config file. A missing default file is fine; a missing explicit one is not.
pub fn load_config(path: &Path, explicit: bool) -> Result<Config> {
    if !path.exists() {
        if explicit {
            anyhow::bail!("Config file not found at {}", path.display());
        }
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

    Ok(config)
}

/// Resolve connection settings: config file, then environment (which `.env` feeds).
pub fn load_settings(explicit_path: Option<&Path>) -> Result<CalDavSettings> {
    let config = match explicit_path {
        Some(path) => load_config(path, true)?,
        None => load_config(&config_path()?, false)?,
    };

    let mut caldav = config.caldav;
    caldav.apply_env(|name| std::env::var(name).ok());
    caldav.into_settings()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_file_values_with_env_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[caldav]\nurl = \"https://dav.example.com/\"\nusername = \"alice\"\ntimeout_secs = 5"
        )
        .unwrap();

        let mut caldav = load_config(file.path(), true).unwrap().caldav;
        caldav.apply_env(env(&[("CALDAV_USERNAME", "bob"), ("CALDAV_PASSWORD", "secret")]));
        let settings = caldav.into_settings().unwrap();

        assert_eq!(settings.url, "https://dav.example.com/");
        assert_eq!(settings.username, "bob");
        assert_eq!(settings.password.as_deref(), Some("secret"));
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.calendar_home, None);
    }

    #[test]
    fn test_missing_default_file_is_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("config.toml"), false).unwrap();
        assert!(config.caldav.url.is_none());

        assert!(load_config(&dir.path().join("config.toml"), true).is_err());
    }

    #[test]
    fn test_url_and_username_are_required() {
        let mut caldav = CalDavConfig::default();
        caldav.apply_env(env(&[("CALDAV_URL", "https://dav.example.com/")]));
        let err = caldav.into_settings().unwrap_err();
        assert!(err.to_string().contains("CALDAV_USERNAME"), "got: {}", err);

        let mut caldav = CalDavConfig::default();
        caldav.apply_env(env(&[
            ("CALDAV_URL", "https://dav.example.com/"),
            ("CALDAV_USERNAME", "alice"),
            ("CALDAV_TIMEOUT_SECS", "soon"),
        ]));
        let settings = caldav.into_settings().unwrap();
        assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_invalid_toml_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[caldav\nurl = 1").unwrap();

        let err = load_config(file.path(), true).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}

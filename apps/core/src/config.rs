use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PROFILE: &str = "code";
pub const MIN_TIMEOUT_MS: u64 = 3_000;
const APP_DIR_NAME: &str = "vscrecent";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to encode config: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("{0}")]
    Invalid(String),
}

/// One editor profile. Several profiles (`[code]`, `[cursor]`, ...) share a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub code: String,
    /// Primary editor executable, e.g. `code` or a full path.
    pub command: String,
    /// Login-shell wrapper such as `zsh -l -c`; empty runs the command directly.
    pub terminal: String,
    pub database: PathBuf,
    pub auto_detect_database: bool,
    /// Directory name under the platform app-data dir, e.g. `Code`.
    pub ide_dir: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self::for_code(DEFAULT_PROFILE)
    }
}

impl Config {
    pub fn for_code(code: &str) -> Self {
        let code = code.trim().to_lowercase();
        let ide_dir = capitalize(&code);
        Self {
            command: code.clone(),
            terminal: default_terminal().to_string(),
            database: database_path_for(&ide_dir),
            auto_detect_database: true,
            ide_dir,
            timeout_ms: Some(MIN_TIMEOUT_MS),
            code,
        }
    }

    /// Configured timeout, never below [`MIN_TIMEOUT_MS`].
    pub fn effective_timeout(&self) -> Duration {
        let millis = self
            .timeout_ms
            .filter(|value| *value >= MIN_TIMEOUT_MS)
            .unwrap_or(MIN_TIMEOUT_MS);
        Duration::from_millis(millis)
    }

    fn resolve_database(mut self) -> Self {
        if self.auto_detect_database {
            self.database = database_path_for(&self.ide_dir);
        }
        self
    }
}

pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.code.trim().is_empty() {
        return Err(ConfigError::Invalid("profile code is required".into()));
    }

    if cfg.command.trim().is_empty() {
        return Err(ConfigError::Invalid("editor command is required".into()));
    }

    if cfg.database.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("database path is required".into()));
    }

    Ok(())
}

pub fn stable_app_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
        .join("config.toml")
}

/// `<appData>/<ide_dir>/User/globalStorage/state.vscdb`
pub fn database_path_for(ide_dir: &str) -> PathBuf {
    dirs::config_dir()
        .unwrap_or_default()
        .join(ide_dir)
        .join("User")
        .join("globalStorage")
        .join("state.vscdb")
}

/// Reads the `[code]` table of `path`, filling missing keys with that profile's
/// defaults. A missing file or table yields the defaults.
pub fn load_profile(path: &Path, code: &str) -> Result<Config, ConfigError> {
    let defaults = Config::for_code(code);
    let file = read_table(path)?;
    let Some(toml::Value::Table(overrides)) = file.get(&defaults.code).cloned() else {
        return Ok(defaults.resolve_database());
    };

    let mut merged = match toml::Value::try_from(&defaults)? {
        toml::Value::Table(table) => table,
        _ => toml::Table::new(),
    };
    merged.extend(overrides);
    let cfg: Config = toml::Value::Table(merged).try_into()?;
    Ok(cfg.resolve_database())
}

pub fn save_profile(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    validate(cfg)?;
    let mut file = read_table(path)?;
    file.insert(cfg.code.clone(), toml::Value::try_from(cfg)?);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let encoded = toml::to_string_pretty(&file)?;
    std::fs::write(path, encoded).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), profile = %cfg.code, "saved config profile");
    Ok(())
}

fn read_table(path: &Path) -> Result<toml::Table, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(raw) => Ok(raw.parse::<toml::Table>()?),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(toml::Table::new()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn default_terminal() -> &'static str {
    if cfg!(target_os = "windows") {
        ""
    } else if cfg!(target_os = "macos") {
        "zsh -l -c"
    } else {
        "bash -l -c"
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{capitalize, Config, MIN_TIMEOUT_MS};
    use std::time::Duration;

    #[test]
    fn capitalizes_profile_code() {
        assert_eq!(capitalize("cursor"), "Cursor");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn timeout_has_floor() {
        let mut cfg = Config::default();
        cfg.timeout_ms = None;
        assert_eq!(cfg.effective_timeout(), Duration::from_millis(MIN_TIMEOUT_MS));
        cfg.timeout_ms = Some(500);
        assert_eq!(cfg.effective_timeout(), Duration::from_millis(MIN_TIMEOUT_MS));
        cfg.timeout_ms = Some(10_000);
        assert_eq!(cfg.effective_timeout(), Duration::from_millis(10_000));
    }
}

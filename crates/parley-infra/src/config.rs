//! Configuration loader for Parley.
//!
//! Reads `parley.toml` and deserializes it into [`ParleyConfig`]. A missing
//! file means defaults, so a fresh install runs with nothing but an API key
//! in the environment.

use std::path::{Path, PathBuf};

use anyhow::Context;
use parley_types::config::ParleyConfig;

/// Config file name inside the data directory.
pub const CONFIG_FILE_NAME: &str = "parley.toml";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `PARLEY_DATA_DIR` environment variable
/// 2. `~/.parley`
/// 3. `.parley` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PARLEY_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".parley");
    }

    PathBuf::from(".parley")
}

/// Resolve the config file path.
///
/// An explicit path (the `--config` flag, which clap also fills from
/// `PARLEY_CONFIG`) wins; otherwise `parley.toml` in `data_dir`.
pub fn resolve_config_path(explicit: Option<&Path>, data_dir: &Path) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| data_dir.join(CONFIG_FILE_NAME))
}

/// Load configuration from `config_path`.
///
/// A missing file yields [`ParleyConfig::default()`]. A file that cannot be
/// read or parsed is an error; the caller decides whether to fall back, and
/// reports it once logging is up.
pub async fn load_config(config_path: &Path) -> anyhow::Result<ParleyConfig> {
    let content = match tokio::fs::read_to_string(config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ParleyConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", config_path.display()));
        }
    };

    toml::from_str::<ParleyConfig>(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::config::{HistoryScope, StoreBackend};
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(CONFIG_FILE_NAME)).await.unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.llm.model, "gemini-1.5-flash");
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(
            &path,
            r#"
[server]
port = 8080

[store]
backend = "memory"

[assistant]
system_prompt = "You are the Acme Store assistant. Only answer questions about Acme products."
history_window = 20
scope = "broadcast"

[llm]
temperature = 0.2
"#,
        )
        .await
        .unwrap();

        let config = load_config(&path).await.unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.assistant.history_window, Some(20));
        assert_eq!(config.assistant.scope, HistoryScope::Broadcast);
        assert!((config.llm.temperature - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.llm.max_tokens, 1000);
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(&path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let err = load_config(&path).await.unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("failed to parse"));
        assert!(message.contains(CONFIG_FILE_NAME));
    }

    #[tokio::test]
    async fn load_config_wrong_type_returns_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(&path, "[server]\nport = \"not a number\"\n")
            .await
            .unwrap();

        assert!(load_config(&path).await.is_err());
    }

    #[tokio::test]
    async fn load_config_directory_returns_read_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_config(tmp.path()).await.unwrap_err();
        assert!(format!("{err:#}").contains("failed to read"));
    }

    #[test]
    fn resolve_config_path_prefers_explicit() {
        let data_dir = Path::new("/var/lib/parley");
        assert_eq!(
            resolve_config_path(Some(Path::new("/etc/parley.toml")), data_dir),
            PathBuf::from("/etc/parley.toml")
        );
        assert_eq!(
            resolve_config_path(None, data_dir),
            PathBuf::from("/var/lib/parley/parley.toml")
        );
    }
}

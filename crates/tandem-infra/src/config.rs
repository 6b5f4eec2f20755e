//! Global configuration loader for Tandem.
//!
//! Reads `config.toml` from the data directory (`~/.tandem/` in production)
//! and deserializes it into [`GlobalConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use tandem_types::config::GlobalConfig;

/// Resolve the data directory: `TANDEM_DATA_DIR` env var, else `~/.tandem`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("TANDEM_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tandem")
}

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_global_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.transport.api_url, "http://127.0.0.1:8081");
        assert_eq!(config.transport.timeout_secs, 30);
    }

    #[tokio::test]
    async fn load_global_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(
            &config_path,
            r#"
[transport]
api_url = "https://gateway.example.com"
token = "secret-token"
timeout_secs = 10
"#,
        )
        .await
        .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.transport.api_url, "https://gateway.example.com");
        assert_eq!(config.transport.token, "secret-token");
        assert_eq!(config.transport.timeout_secs, 10);
    }

    #[tokio::test]
    async fn load_global_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(&config_path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.transport.api_url, GlobalConfig::default().transport.api_url);
    }

    #[test]
    fn resolve_data_dir_honors_env() {
        unsafe { std::env::set_var("TANDEM_DATA_DIR", "/tmp/tandem-test") };
        assert_eq!(resolve_data_dir(), PathBuf::from("/tmp/tandem-test"));
        unsafe { std::env::remove_var("TANDEM_DATA_DIR") };
    }
}

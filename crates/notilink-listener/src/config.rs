use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use notilink_bridge::config::Config;
use tokio::{fs, io::AsyncWriteExt};

/// Environment variable that overrides the configured server URL.
pub const SERVER_URL_ENV: &str = "NOTILINK_SERVER_URL";

/// Why the listener configuration could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No home or application data directory could be resolved for the
    /// current user.
    #[error("no configuration directory for the current user")]
    DirectoriesNotFound,
    #[error("config file i/o failed: {0}")]
    IoError(#[from] std::io::Error),
    /// `config.toml` is not valid TOML or has fields of the wrong type.
    #[error("invalid config file: {0}")]
    DeserializeError(#[from] toml::de::Error),
    #[error("failed to render default config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

fn config_path() -> Result<PathBuf, ConfigError> {
    ProjectDirs::from("dev", "notilink", "notilink")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .ok_or(ConfigError::DirectoriesNotFound)
}

/// Loads the listener configuration from the user's configuration directory,
/// then applies environment overrides.
pub async fn load_config() -> Result<Config, ConfigError> {
    let config = load_config_from(&config_path()?).await?;
    Ok(apply_env_overrides(config, std::env::var(SERVER_URL_ENV).ok()))
}

/// Reads the configuration stored at `path`. A missing file is created with
/// the defaults, which are returned.
pub(crate) async fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    match fs::read_to_string(path).await {
        Ok(contents) => {
            log::info!("Loaded configuration from {}", path.display());
            Ok(toml::from_str(&contents)?)
        }
        Err(error) if error.kind() == ErrorKind::NotFound => {
            log::info!("No configuration at {}, writing defaults", path.display());
            let config = Config::default();
            write_default(path, &config).await?;
            Ok(config)
        }
        Err(error) => Err(error.into()),
    }
}

async fn write_default(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).await?;
    }
    let mut file = fs::File::create_new(path).await?;
    let contents = toml::to_string_pretty(config)?;
    file.write_all(contents.as_bytes()).await?;
    file.sync_all().await?;
    Ok(())
}

fn apply_env_overrides(mut config: Config, server_url: Option<String>) -> Config {
    if let Some(server_url) = server_url.filter(|url| !url.trim().is_empty()) {
        log::info!("Using server URL from {SERVER_URL_ENV}");
        config.server_url = server_url;
    }
    config
}

#[cfg(test)]
mod tests {
    use notilink_bridge::connection::TransportPreference;

    use super::*;

    #[tokio::test]
    async fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = load_config_from(&path).await.unwrap();
        assert_eq!(config.server_url, "");
        assert!(path.exists());

        let reloaded = load_config_from(&path).await.unwrap();
        assert_eq!(reloaded.transport.reconnect_delay_ms, 1000);
    }

    #[tokio::test]
    async fn existing_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            server_url = "https://socket.example.com"
            current_user_id = "0055w00000BxS2V"

            [transport]
            preference = "polling"
            "#,
        )
        .unwrap();

        let config = load_config_from(&path).await.unwrap();
        assert_eq!(config.server_url, "https://socket.example.com");
        assert_eq!(config.current_user_id.as_deref(), Some("0055w00000BxS2V"));
        assert_eq!(
            config.transport.preference,
            TransportPreference::PreferPolling
        );
    }

    #[tokio::test]
    async fn invalid_file_is_a_deserialize_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "server_url = [").unwrap();

        assert!(matches!(
            load_config_from(&path).await,
            Err(ConfigError::DeserializeError(_))
        ));
    }

    #[test]
    fn environment_overrides_the_server_url() {
        let config = Config {
            server_url: "https://from-file.example.com".to_string(),
            ..Default::default()
        };

        let kept = apply_env_overrides(config.clone(), Some("  ".to_string()));
        assert_eq!(kept.server_url, "https://from-file.example.com");

        let overridden =
            apply_env_overrides(config, Some("https://from-env.example.com".to_string()));
        assert_eq!(overridden.server_url, "https://from-env.example.com");
    }
}

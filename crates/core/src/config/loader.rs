use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment variable prefix for overrides, e.g. `VID2AUDIO_SERVER__PORT=9000`.
const ENV_PREFIX: &str = "VID2AUDIO_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from file if it exists, otherwise from defaults plus environment.
///
/// Used when no config path was given explicitly.
pub fn load_config_or_default(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        return load_config(path);
    }

    Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[server]
port = 9000

[downloader]
flavor = "yt_dlp"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.downloader.flavor, super::super::DownloaderFlavor::YtDlp);
    }

    #[test]
    fn test_load_config_from_str_empty_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.server.port, 5000);
        assert!(!config.workspace.reset_on_new_task);
    }

    #[test]
    fn test_load_config_from_str_bad_type() {
        let toml = r#"
[server]
port = "not a number"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_or_default_missing_file() {
        let config = load_config_or_default(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.transcoder.ffmpeg_path.to_str().unwrap(), "ffmpeg");
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[server]
host = "127.0.0.1"
port = 3000

[workspace]
root = "/tmp/v2a-test"
reset_on_new_task = true

[transcoder]
timeout_secs = 60
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert!(config.workspace.reset_on_new_task);
        assert_eq!(config.transcoder.timeout_secs, 60);
        // Untouched sections keep their defaults
        assert_eq!(config.downloader.timeout_secs, 1800);
    }
}

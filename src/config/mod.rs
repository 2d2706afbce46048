//! Server configuration.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── error.rs     # ConfigError
//! ├── section.rs   # [serve] section of live-reload.toml
//! └── mod.rs       # ServeConfig (this file)
//! ```
//!
//! # Precedence
//!
//! CLI arguments > config file > built-in defaults.
//!
//! The resulting [`ServeConfig`] is built once in `main` and shared as
//! `Arc<ServeConfig>`; it never changes while the server runs.

mod error;
mod section;

pub use error::ConfigError;
pub use section::{ConfigFile, ServeSection};

use crate::cli::Cli;
use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Config file picked up from the working directory when `-C` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "live-reload.toml";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8000;

/// Default WebSocket port for live reload
pub const DEFAULT_WS_PORT: u16 = 35729;

/// Default host: loopback only
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default debounce window
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Immutable process-wide settings.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    /// Host for both the HTTP and the WebSocket listener.
    /// Names such as `localhost` are resolved when binding.
    pub host: String,

    /// HTTP port (0 = any free port).
    pub port: u16,

    /// WebSocket port (0 = any free port).
    pub ws_port: u16,

    /// Served root: absolute and canonical.
    pub root: PathBuf,

    /// Quiet period after the last change before a reload is broadcast.
    pub debounce: Duration,

    /// Config file that was loaded, if any.
    pub config_path: Option<PathBuf>,
}

impl ServeConfig {
    /// Load configuration from CLI arguments and the optional config file.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let config_path = match &cli.config {
            Some(path) => Some(cwd.join(path)),
            None => Some(cwd.join(DEFAULT_CONFIG_FILE)).filter(|path| path.is_file()),
        };

        let file = match &config_path {
            Some(path) => ConfigFile::from_path(path)?,
            None => ConfigFile::default(),
        };

        // Relative `root` in the file is resolved against the file's directory
        let file_dir = config_path
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(cwd.as_path())
            .to_path_buf();

        let mut config = Self::merge(file.serve, cli, &cwd, &file_dir)?;
        config.config_path = config_path;
        Ok(config)
    }

    /// Merge file section and CLI arguments, then validate.
    fn merge(
        section: ServeSection,
        cli: &Cli,
        cwd: &Path,
        file_dir: &Path,
    ) -> Result<Self, ConfigError> {
        let root = match (&cli.dir, &section.root) {
            (Some(dir), _) => cwd.join(dir),
            (None, Some(dir)) => file_dir.join(dir),
            (None, None) => cwd.to_path_buf(),
        };

        let config = Self {
            host: cli
                .host
                .clone()
                .or(section.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(section.port).unwrap_or(DEFAULT_PORT),
            ws_port: cli.ws_port.or(section.ws_port).unwrap_or(DEFAULT_WS_PORT),
            root,
            debounce: Duration::from_millis(
                cli.debounce_ms
                    .or(section.debounce_ms)
                    .unwrap_or(DEFAULT_DEBOUNCE_MS),
            ),
            config_path: None,
        };

        config.validate()
    }

    /// Check invariants and canonicalize the served root.
    fn validate(mut self) -> Result<Self, ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Validation("host must not be empty".into()));
        }

        if self.port != 0 && self.port == self.ws_port {
            return Err(ConfigError::Validation(format!(
                "HTTP port and WebSocket port are both {}",
                self.port
            )));
        }

        let root = self
            .root
            .canonicalize()
            .map_err(|err| ConfigError::Io(self.root.clone(), err))?;

        if !root.is_dir() {
            return Err(ConfigError::Validation(format!(
                "`{}` is not a directory",
                root.display()
            )));
        }

        self.root = root;
        Ok(self)
    }

    /// Configuration for an in-process server on ephemeral ports.
    #[cfg(test)]
    pub fn for_root(root: &Path) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: 0,
            ws_port: 0,
            root: root.canonicalize().unwrap(),
            debounce: Duration::from_millis(50),
            config_path: None,
        }
    }
}

impl ConfigFile {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }
}

/// Parse a config snippet and return its `[serve]` section.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ServeSection {
    ConfigFile::from_str(content).unwrap().serve
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["live-reload"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let temp = TempDir::new().unwrap();
        let config =
            ServeConfig::merge(ServeSection::default(), &cli(&[]), temp.path(), temp.path())
                .unwrap();

        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.ws_port, DEFAULT_WS_PORT);
        assert_eq!(config.debounce, Duration::from_millis(DEFAULT_DEBOUNCE_MS));
        assert_eq!(config.root, temp.path().canonicalize().unwrap());
    }

    #[test]
    fn test_cli_overrides_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("public")).unwrap();
        fs::create_dir(temp.path().join("site")).unwrap();

        let section = test_parse_config("[serve]\nport = 3000\nws_port = 3001\nroot = \"public\"");
        let config = ServeConfig::merge(
            section,
            &cli(&["--port", "4000", "site"]),
            temp.path(),
            temp.path(),
        )
        .unwrap();

        assert_eq!(config.port, 4000);
        // Not given on the command line: file value wins
        assert_eq!(config.ws_port, 3001);
        assert_eq!(config.root, temp.path().join("site").canonicalize().unwrap());
    }

    #[test]
    fn test_file_root_relative_to_file() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("project");
        fs::create_dir_all(project.join("public")).unwrap();

        let section = test_parse_config("[serve]\nroot = \"public\"");
        let config = ServeConfig::merge(section, &cli(&[]), temp.path(), &project).unwrap();

        assert_eq!(config.root, project.join("public").canonicalize().unwrap());
    }

    #[test]
    fn test_missing_root_is_error() {
        let temp = TempDir::new().unwrap();
        let result = ServeConfig::merge(
            ServeSection::default(),
            &cli(&["does-not-exist"]),
            temp.path(),
            temp.path(),
        );
        assert!(matches!(result, Err(ConfigError::Io(..))));
    }

    #[test]
    fn test_root_must_be_directory() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("index.html"), "<p>hi</p>").unwrap();

        let result = ServeConfig::merge(
            ServeSection::default(),
            &cli(&["index.html"]),
            temp.path(),
            temp.path(),
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_host_name_kept_for_binding() {
        let temp = TempDir::new().unwrap();
        let section = test_parse_config("[serve]\nhost = \"0.0.0.0\"");
        let config = ServeConfig::merge(
            section,
            &cli(&["--host", "localhost"]),
            temp.path(),
            temp.path(),
        )
        .unwrap();
        assert_eq!(config.host, "localhost");
    }

    #[test]
    fn test_empty_host_rejected() {
        let temp = TempDir::new().unwrap();
        let section = test_parse_config("[serve]\nhost = \"\"");
        let result = ServeConfig::merge(section, &cli(&[]), temp.path(), temp.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_same_ports_rejected() {
        let temp = TempDir::new().unwrap();
        let result = ServeConfig::merge(
            ServeSection::default(),
            &cli(&["--port", "9000", "--ws-port", "9000"]),
            temp.path(),
            temp.path(),
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_ephemeral_ports_allowed() {
        let temp = TempDir::new().unwrap();
        let config = ServeConfig::merge(
            ServeSection::default(),
            &cli(&["--port", "0", "--ws-port", "0"]),
            temp.path(),
            temp.path(),
        )
        .unwrap();
        assert_eq!(config.port, 0);
        assert_eq!(config.ws_port, 0);
    }

    #[test]
    fn test_from_str_invalid_toml() {
        assert!(ConfigFile::from_str("[serve\nport = 1").is_err());
    }

    #[test]
    fn test_from_path_missing_file() {
        let result = ConfigFile::from_path(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::Io(..))));
    }
}

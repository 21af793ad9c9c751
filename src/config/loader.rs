//! Configuration file loader.

use std::path::{Path, PathBuf};

use super::types::Config;

/// Loads the configuration from the first available search path.
///
/// TOML is the native format; files ending in `.json` are parsed as JSON
/// for compatibility with older setups.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Search paths in order of priority.
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader with the default search order: `.treewatch.toml` in
    /// the current directory, then the user config directory.
    #[must_use]
    pub fn new() -> Self {
        let mut search_paths = vec![PathBuf::from(".treewatch.toml")];
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("treewatch").join("config.toml"));
        }
        Self { search_paths }
    }

    /// Create a loader pinned to a specific config file.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            search_paths: vec![path],
        }
    }

    /// Load and validate the configuration from the first file that exists.
    ///
    /// # Errors
    ///
    /// Returns an error if no search path exists, or if the file cannot be
    /// read, parsed, or validated.
    pub fn load(&self) -> Result<Config, ConfigError> {
        for path in &self.search_paths {
            if path.exists() {
                tracing::debug!(path = %path.display(), "Loading config file");
                let config = Self::load_from_path(path)?;
                config.validate()?;
                return Ok(config);
            }
        }
        Err(ConfigError::NotFound {
            searched: self
                .search_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::JsonParseError {
                path: path.to_path_buf(),
                source: e,
            })
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })
        }
    }

    /// The search paths, for diagnostics.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    JsonParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("No config file found (searched: {searched})")]
    NotFound { searched: String },

    #[error("You must monitor at least one directory")]
    NoMonitors,

    #[error("Monitor for {directory} has an empty action")]
    EmptyAction { directory: PathBuf },

    #[error("Duplicate monitor root: {directory}")]
    DuplicateRoot { directory: PathBuf },

    #[error("Monitor roots overlap: {outer} contains {inner}")]
    OverlappingRoots { outer: PathBuf, inner: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_search_paths() {
        let loader = ConfigLoader::new();
        assert!(!loader.search_paths().is_empty());
        assert!(loader.search_paths()[0].ends_with(".treewatch.toml"));
    }

    #[test]
    fn test_missing_config_is_an_error() {
        let loader = ConfigLoader::with_path(PathBuf::from("/nonexistent/path.toml"));
        assert!(matches!(loader.load(), Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_parse_toml_config() {
        let toml_str = r#"
            [[monitor]]
            directory = "/proj"
            exclude = [".git", "node_modules"]
            action = ["echo", "hi"]

            [[monitor]]
            directory = "/other"
            action = ["make", "build"]
            on_watch_error = "best-effort"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.monitor.len(), 2);
        assert_eq!(config.monitor[0].directory, Path::new("/proj"));
        assert_eq!(config.monitor[0].exclude, vec![".git", "node_modules"]);
        assert_eq!(config.monitor[0].action, vec!["echo", "hi"]);
        config.validate().unwrap();
    }

    #[test]
    fn test_load_json_config_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        write!(
            file,
            r#"{{"monitor":[{{"directory":"/proj","exclude":[".git"],"action":["echo","hi"]}}]}}"#
        )
        .unwrap();

        let config = ConfigLoader::with_path(file.path().to_path_buf())
            .load()
            .unwrap();
        assert_eq!(config.monitor.len(), 1);
        assert_eq!(config.monitor[0].action, vec!["echo", "hi"]);
    }

    #[test]
    fn test_load_rejects_invalid_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[[monitor]]\ndirectory = \"/proj\"\naction = []\n").unwrap();

        let result = ConfigLoader::with_path(file.path().to_path_buf()).load();
        assert!(matches!(result, Err(ConfigError::EmptyAction { .. })));
    }

    #[test]
    fn test_load_rejects_unparseable_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not toml at all [[[").unwrap();

        let result = ConfigLoader::with_path(file.path().to_path_buf()).load();
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }
}

use crate::error::{AppError, Result};
use crate::language::ExtensionTable;
use crate::select::FileFilter;
use log;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILENAME: &str = ".codebundle.toml";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub select: SelectConfig,
    #[serde(default)]
    pub languages: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SelectConfig {
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_exclude_files")]
    pub exclude_files: Vec<String>,
    #[serde(default)]
    pub exclude_dirs: Vec<String>,
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            exclude_files: default_exclude_files(),
            exclude_dirs: Vec::new(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    ["py", "java", "js", "cpp", "c", "rb", "go", "rs"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_exclude_files() -> Vec<String> {
    vec!["__init__.py".to_string()]
}

/// Values passed on the command line; `None` keeps the configured value.
#[derive(Debug, Clone, Default)]
pub struct SelectOverrides {
    pub extensions: Option<Vec<String>>,
    pub exclude_files: Option<Vec<String>>,
    pub exclude_dirs: Option<Vec<String>>,
}

impl Config {
    pub fn expand_path(raw: &Path) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&raw.to_string_lossy()).as_ref())
    }

    /// Explicit path wins; otherwise `<root>/.codebundle.toml` when present.
    pub fn resolve_config_path(
        root: &Path,
        cli_config_file: Option<&PathBuf>,
        cli_disable_config: bool,
    ) -> Result<Option<PathBuf>> {
        if cli_disable_config {
            log::debug!("Config file loading disabled via CLI flag.");
            return Ok(None);
        }

        match cli_config_file {
            Some(raw) => {
                let path = Self::expand_path(raw);
                if !path.is_file() {
                    return Err(AppError::Config(format!(
                        "Specified config file not found at path: {}",
                        path.display()
                    )));
                }
                log::debug!("Using specified config file path: {}", path.display());
                Ok(Some(path))
            }
            None => {
                let default_path = root.join(DEFAULT_CONFIG_FILENAME);
                if default_path.is_file() {
                    log::debug!("Using default config file path: {}", default_path.display());
                    Ok(Some(default_path))
                } else {
                    log::debug!(
                        "No config file specified and default not found at: {}",
                        default_path.display()
                    );
                    Ok(None)
                }
            }
        }
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let toml_content = fs::read_to_string(config_path).map_err(|e| AppError::FileRead {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&toml_content).map_err(|e| {
            AppError::TomlParse(format!(
                "Error parsing config file '{}': {}. Check TOML syntax and structure.",
                config_path.display(),
                e
            ))
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str::<Config>(content)?)
    }

    pub fn apply_overrides(mut self, overrides: SelectOverrides) -> Self {
        log::trace!("Applying CLI overrides to config: {:?}", overrides);
        if let Some(extensions) = overrides.extensions {
            self.select.extensions = extensions;
        }
        if let Some(exclude_files) = overrides.exclude_files {
            self.select.exclude_files = exclude_files;
        }
        if let Some(exclude_dirs) = overrides.exclude_dirs {
            self.select.exclude_dirs = exclude_dirs;
        }
        self
    }

    pub fn file_filter(&self) -> Result<FileFilter> {
        let filter = FileFilter::new(&self.select.extensions)
            .exclude_names(self.select.exclude_files.iter().cloned())
            .exclude_dirs(self.select.exclude_dirs.iter().cloned());
        if filter.allowed_extensions().is_empty() {
            return Err(AppError::InvalidArgument(
                "At least one file extension must be allowed.".to_string(),
            ));
        }
        Ok(filter)
    }

    pub fn classifier(&self) -> ExtensionTable {
        ExtensionTable::with_overrides(&self.languages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::detect_language_with;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_bundled_languages() {
        let config = Config::default();
        assert_eq!(config.select.extensions.len(), 8);
        assert!(config.select.extensions.contains(&"rs".to_string()));
        assert_eq!(config.select.exclude_files, vec!["__init__.py"]);
        assert!(config.select.exclude_dirs.is_empty());
    }

    #[test]
    fn parses_partial_file() {
        let config = Config::from_toml_str(
            r#"
            [select]
            exclude_dirs = [".git", "target"]

            [languages]
            jsx = "JavaScript"
            "#,
        )
        .unwrap();
        assert_eq!(config.select.extensions, default_extensions());
        assert_eq!(config.select.exclude_dirs, vec![".git", "target"]);
        assert_eq!(
            detect_language_with(&config.classifier(), "view.jsx"),
            "javascript"
        );
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = Config::from_toml_str("[select]\nextension = [\"rs\"]\n").unwrap_err();
        assert!(matches!(err, AppError::TomlParse(_)));
    }

    #[test]
    fn overrides_replace_lists() {
        let config = Config::default().apply_overrides(SelectOverrides {
            extensions: Some(vec!["toml".to_string()]),
            exclude_files: None,
            exclude_dirs: Some(vec!["vendor".to_string()]),
        });
        assert_eq!(config.select.extensions, vec!["toml"]);
        assert_eq!(config.select.exclude_files, vec!["__init__.py"]);
        assert_eq!(config.select.exclude_dirs, vec!["vendor"]);
    }

    #[test]
    fn empty_extension_list_is_rejected() {
        let config = Config::default().apply_overrides(SelectOverrides {
            extensions: Some(vec![String::new()]),
            ..SelectOverrides::default()
        });
        assert!(matches!(
            config.file_filter(),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn resolves_default_file_in_root() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Config::resolve_config_path(dir.path(), None, false).unwrap(), None);

        let path = dir.path().join(DEFAULT_CONFIG_FILENAME);
        fs::write(&path, "[select]\nextensions = [\"md\"]\n").unwrap();
        assert_eq!(
            Config::resolve_config_path(dir.path(), None, false).unwrap(),
            Some(path.clone())
        );
        assert_eq!(Config::resolve_config_path(dir.path(), None, true).unwrap(), None);

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.select.extensions, vec!["md"]);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Config::resolve_config_path(dir.path(), Some(&missing), false),
            Err(AppError::Config(_))
        ));
    }
}

use razor_editor_syntax::TagHelperDescriptor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to read tag helper manifest at {manifest_path}: {source}")]
    ManifestReadError {
        manifest_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse tag helper manifest at {manifest_path}: {source}")]
    ManifestParseError {
        manifest_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSection {
    /// Quiet period before a background reparse starts.
    pub debounce_ms: u64,
}

impl Default for ParserSection {
    fn default() -> Self {
        Self { debounce_ms: 50 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// A separate TOML file with more `[[tag_helpers]]` entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_helper_manifest: Option<PathBuf>,
    #[serde(default)]
    pub parser: ParserSection,
    /// Descriptors declared inline.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_helpers: Vec<TagHelperDescriptor>,
}

/// Layout of a tag helper manifest file.
#[derive(Debug, Default, Deserialize)]
struct Manifest {
    #[serde(default)]
    tag_helpers: Vec<TagHelperDescriptor>,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let mut config: Config = read_toml(
            config_path,
            |source| ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            },
            |source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            },
        )?;

        // Expand shell variables and tilde in the manifest location
        config.tag_helper_manifest = config
            .tag_helper_manifest
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/razor-editor");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.parser.debounce_ms)
    }

    /// Inline descriptors followed by those from the manifest, if any.
    pub fn resolve_tag_helpers(&self) -> Result<Vec<TagHelperDescriptor>, ConfigError> {
        let mut descriptors = self.tag_helpers.clone();
        let Some(manifest_path) = &self.tag_helper_manifest else {
            return Ok(descriptors);
        };

        let manifest: Manifest = read_toml(
            manifest_path,
            |source| ConfigError::ManifestReadError {
                manifest_path: manifest_path.clone(),
                source,
            },
            |source| ConfigError::ManifestParseError {
                manifest_path: manifest_path.clone(),
                source,
            },
        )?;
        descriptors.extend(manifest.tag_helpers);
        Ok(descriptors)
    }

    /// `~` and `$VAR` expansion; `None` when a variable is undefined.
    fn expand_path(path: &Path) -> Option<PathBuf> {
        shellexpand::full(&path.to_string_lossy())
            .ok()
            .map(|expanded| PathBuf::from(expanded.as_ref()))
    }
}

fn read_toml<T: serde::de::DeserializeOwned>(
    path: &Path,
    on_read: impl FnOnce(std::io::Error) -> ConfigError,
    on_parse: impl FnOnce(toml::de::Error) -> ConfigError,
) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(on_read)?;
    toml::from_str(&content).map_err(on_parse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/razor-editor/config.toml"));
    }

    #[test]
    fn test_defaults_when_sections_are_missing() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.parser.debounce_ms, 50);
        assert_eq!(config.debounce(), Duration::from_millis(50));
        assert!(config.tag_helpers.is_empty());
        assert_eq!(config.tag_helper_manifest, None);
    }

    #[test]
    fn test_inline_tag_helpers() {
        let config_content = r#"
[parser]
debounce_ms = 10

[[tag_helpers]]
tag_name = "p"
type_name = "PTagHelper"

[[tag_helpers]]
tag_name = "input"
type_name = "InputTagHelper"
assembly_name = "Microsoft.AspNetCore.Mvc.TagHelpers"

[[tag_helpers.attributes]]
name = "asp-for"
property_name = "For"
type_name = "ModelExpression"
"#;

        let config: Config = toml::from_str(config_content).unwrap();

        assert_eq!(config.debounce(), Duration::from_millis(10));
        assert_eq!(
            config.tag_helpers,
            vec![
                TagHelperDescriptor::new("p", "PTagHelper"),
                TagHelperDescriptor::new("input", "InputTagHelper")
                    .with_assembly("Microsoft.AspNetCore.Mvc.TagHelpers")
                    .with_attribute("asp-for", "For", "ModelExpression"),
            ]
        );
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path).unwrap();

        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_manifest_path_with_env_var() {
        unsafe {
            env::set_var("RAZOR_MANIFEST_ROOT", "/custom/helpers");
        }

        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_file,
            "tag_helper_manifest = \"$RAZOR_MANIFEST_ROOT/manifest.toml\"\n",
        )
        .unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();
        assert_eq!(
            config.tag_helper_manifest,
            Some(PathBuf::from("/custom/helpers/manifest.toml"))
        );

        unsafe {
            env::remove_var("RAZOR_MANIFEST_ROOT");
        }
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_invalid_config_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[parser]\ndebounce_ms = \"soon\"\n").unwrap();

        let error = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(error, ConfigError::ConfigParseError { .. }));
        assert!(error.to_string().contains("config.toml"));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let test_config = Config {
            parser: ParserSection { debounce_ms: 5 },
            tag_helpers: vec![TagHelperDescriptor::new("*", "CatchAllTagHelper")],
            tag_helper_manifest: Some(PathBuf::from("/tmp/helpers.toml")),
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_manifest_descriptors_follow_inline_ones() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = temp_dir.path().join("helpers.toml");
        std::fs::write(
            &manifest,
            "[[tag_helpers]]\ntag_name = \"form\"\ntype_name = \"FormTagHelper\"\n",
        )
        .unwrap();
        let config = Config {
            tag_helpers: vec![TagHelperDescriptor::new("p", "PTagHelper")],
            tag_helper_manifest: Some(manifest),
            ..Config::default()
        };

        let names: Vec<_> = config
            .resolve_tag_helpers()
            .unwrap()
            .into_iter()
            .map(|d| d.tag_name)
            .collect();

        assert_eq!(names, vec!["p", "form"]);
    }

    #[test]
    fn test_missing_manifest_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            tag_helper_manifest: Some(temp_dir.path().join("missing.toml")),
            ..Config::default()
        };

        let error = config.resolve_tag_helpers().unwrap_err();

        assert!(matches!(error, ConfigError::ManifestReadError { .. }));
    }

    #[test]
    fn test_malformed_manifest_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = temp_dir.path().join("helpers.toml");
        std::fs::write(&manifest, "[[tag_helpers]]\ntag_name = 3\n").unwrap();
        let config = Config {
            tag_helper_manifest: Some(manifest),
            ..Config::default()
        };

        let error = config.resolve_tag_helpers().unwrap_err();

        assert!(matches!(error, ConfigError::ManifestParseError { .. }));
    }
}

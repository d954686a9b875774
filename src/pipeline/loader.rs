// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 atlas contributors

//! Pipeline description loading
//!
//! Reads a config file into an untyped value. YAML is the native format;
//! JSON and TOML files are accepted by extension.

use serde_yaml::Value;
use std::path::Path;

use crate::errors::{AtlasError, ConfigValidationError};

/// Default config file name in a project root
pub const CONFIG_FILE: &str = "atlas-config.yaml";

/// Config file names looked up in a project root, in order
pub const CONFIG_CANDIDATES: [&str; 4] = [
    CONFIG_FILE,
    "atlas-config.yml",
    "atlas-config.json",
    "atlas-config.toml",
];

/// Serialization format of a description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionFormat {
    Yaml,
    Json,
    Toml,
}

impl DescriptionFormat {
    /// Guess the format from a file extension, defaulting to YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::Json,
            Some("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }

    /// Parse text into an untyped description
    pub fn parse(self, content: &str) -> Result<Value, AtlasError> {
        let value = match self {
            Self::Yaml => serde_yaml::from_str(content)?,
            Self::Json => serde_json::from_str(content)?,
            Self::Toml => toml::from_str(content)?,
        };
        Ok(value)
    }
}

/// Load a description from disk without validating it
pub fn load_description(path: &Path) -> Result<Value, AtlasError> {
    if !path.exists() {
        return Err(AtlasError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| AtlasError::read(path, e))?;

    DescriptionFormat::from_path(path)
        .parse(&content)
        .map_err(|e| {
            ConfigValidationError::Unparseable {
                path: path.to_path_buf(),
                message: Some(e.to_string()),
            }
            .into()
        })
}

/// First existing config file in `root`, or the default path
pub fn find_config(root: &Path) -> std::path::PathBuf {
    CONFIG_CANDIDATES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
        .unwrap_or_else(|| root.join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats_from_extension() {
        assert_eq!(
            DescriptionFormat::from_path(Path::new("atlas-config.json")),
            DescriptionFormat::Json
        );
        assert_eq!(
            DescriptionFormat::from_path(Path::new("atlas-config.toml")),
            DescriptionFormat::Toml
        );
        assert_eq!(
            DescriptionFormat::from_path(Path::new("atlas-config.yaml")),
            DescriptionFormat::Yaml
        );
    }

    #[test]
    fn test_toml_and_json_descriptions() {
        let toml = r#"
[pipeline.stages.train]
script = "train.py"
root = true
"#;
        let value = DescriptionFormat::Toml.parse(toml).unwrap();
        assert_eq!(
            value["pipeline"]["stages"]["train"]["script"].as_str(),
            Some("train.py")
        );

        let json = r#"{"pipeline": {"stages": {"a": {"script": "a.sh", "root": true}}}}"#;
        let value = DescriptionFormat::Json.parse(json).unwrap();
        assert_eq!(value["pipeline"]["stages"]["a"]["root"].as_bool(), Some(true));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_description(&dir.path().join(CONFIG_FILE));
        assert!(matches!(result, Err(AtlasError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_unparseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "pipeline: [unclosed").unwrap();

        let err = load_description(&path).unwrap_err();
        assert!(matches!(
            err,
            AtlasError::Config(ConfigValidationError::Unparseable { .. })
        ));
        assert!(err.to_string().starts_with("Failed to parse"));
    }

    #[test]
    fn test_find_config_prefers_yaml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("atlas-config.json"), "{}").unwrap();
        assert_eq!(find_config(dir.path()), dir.path().join("atlas-config.json"));

        std::fs::write(dir.path().join(CONFIG_FILE), "").unwrap();
        assert_eq!(find_config(dir.path()), dir.path().join(CONFIG_FILE));
    }
}

//! Engine settings and the TOML run configuration.
//!
//! ```toml
//! [settings]
//! profile = true
//!
//! [[mods]]
//! name = "Core"
//! target_version = "1.0.0"
//!
//! [[packages]]
//! name = "MyMod"
//! patches = ["patches/main.json"]
//!
//! [[documents]]
//! package = "Core"
//! name = "Things.xml"
//! path = "defs/things.json"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use modcheck_xml::{Document, DocumentError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec;
use crate::error::DecodeError;
use crate::phase::{Package, SourceDocument};
use crate::registry::ModList;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Emit the `verbose*` log messages.
    pub verbose: bool,
    /// Emit the per-operation timing report at phase end.
    pub profile: bool,
    /// Track operation ownership and timing. Turned off for the phase when
    /// the ownership table does not match the packages.
    pub instrument: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            verbose: false,
            profile: false,
            instrument: true,
        }
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid configuration in {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid patch file {}: {source}", path.display())]
    Patch {
        path: PathBuf,
        source: DecodeError,
    },

    #[error("invalid document {}: {source}", path.display())]
    Document {
        path: PathBuf,
        source: DocumentError,
    },
}

/// A package and the patch files it ships, in application order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageSource {
    pub name: String,
    #[serde(default)]
    pub patches: Vec<PathBuf>,
}

/// A JsonML document to patch, and the package it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DocumentSource {
    pub package: String,
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub settings: EngineSettings,
    #[serde(default)]
    pub mods: ModList,
    #[serde(default)]
    pub packages: Vec<PackageSource>,
    #[serde(default)]
    pub documents: Vec<DocumentSource>,
    /// Directory relative paths resolve against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

fn read(path: &Path) -> Result<String, SettingsError> {
    fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = read(path)?;
        let mut config = Self::from_toml_str(&text).map_err(|source| SettingsError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Reads and decodes every package's patch files.
    pub fn load_packages(&self) -> Result<Vec<Package>, SettingsError> {
        self.packages
            .iter()
            .map(|source| {
                let mut operations = Vec::new();
                for patch in &source.patches {
                    let path = self.resolve(patch);
                    let ops = codec::from_json_str(&read(&path)?)
                        .map_err(|source| SettingsError::Patch { path, source })?;
                    operations.extend(ops);
                }
                tracing::debug!(package = %source.name, operations = operations.len(), "loaded patches");
                Ok(Package::new(&source.name, operations))
            })
            .collect()
    }

    /// Reads every document. Top-level definitions remember the document they
    /// came from.
    pub fn load_documents(&self) -> Result<Vec<SourceDocument>, SettingsError> {
        self.documents
            .iter()
            .map(|source| {
                let path = self.resolve(&source.path);
                let value: serde_json::Value =
                    serde_json::from_str(&read(&path)?).map_err(|e| SettingsError::Json {
                        path: path.clone(),
                        source: e,
                    })?;
                let document = load_document(&value, &source.name)
                    .map_err(|e| SettingsError::Document { path, source: e })?;
                Ok(SourceDocument::new(&source.package, &source.name, document))
            })
            .collect()
    }
}

fn load_document(value: &serde_json::Value, name: &str) -> Result<Document, DocumentError> {
    let mut document = Document::from_jsonml(value)?;
    let source = document.add_source(name);
    if let Some(root) = document.root_element() {
        for child in document.children(root).to_vec() {
            document.set_source(child, Some(source))?;
        }
    }
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ModRegistry;

    #[test]
    fn parses_full_config() {
        let config = RunConfig::from_toml_str(
            r#"
            [settings]
            profile = true

            [[mods]]
            name = "Core"
            target_version = "1.0.0"

            [[mods]]
            name = "HugsLib"
            target_version = "1.0.0"
            sync_version = "6.1.1"

            [[packages]]
            name = "MyMod"
            patches = ["patches/a.json", "patches/b.json"]

            [[documents]]
            package = "Core"
            name = "Things.xml"
            path = "defs/things.json"
            "#,
        )
        .unwrap();
        assert!(config.settings.profile);
        assert!(config.settings.instrument);
        assert!(!config.settings.verbose);
        assert_eq!(config.mods.load_index("HugsLib"), Some(1));
        assert_eq!(config.mods.sync_version("HugsLib"), Some("6.1.1"));
        assert_eq!(config.packages[0].patches.len(), 2);
        assert_eq!(config.documents[0].name, "Things.xml");
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = RunConfig::from_toml_str("").unwrap();
        assert_eq!(config.settings, EngineSettings::default());
        assert!(config.mods.is_empty());
        assert!(config.packages.is_empty());
    }

    #[test]
    fn relative_paths_resolve_against_base_dir() {
        let config = RunConfig {
            base_dir: PathBuf::from("/data/run"),
            ..RunConfig::default()
        };
        assert_eq!(config.resolve(Path::new("a.json")), PathBuf::from("/data/run/a.json"));
        assert_eq!(config.resolve(Path::new("/abs/a.json")), PathBuf::from("/abs/a.json"));
    }

    #[test]
    fn loaded_definitions_carry_their_source() {
        let doc = load_document(
            &serde_json::json!(["Defs", ["ThingDef", ["defName", "Wall"]]]),
            "Things.xml",
        )
        .unwrap();
        let def = doc.select_str("/Defs/ThingDef").unwrap()[0];
        let source = doc.source(def).unwrap();
        assert_eq!(doc.source_name(source), Some("Things.xml"));
    }
}

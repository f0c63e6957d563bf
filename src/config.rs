//! Configuration for graph construction and validation
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schemagraph.toml)
//! - Environment variables (SCHEMAGRAPH__*)
//!
//! ## Example config file (schemagraph.toml):
//! ```toml
//! [graph]
//! root_name = "VegaLite"
//! definition_tags = ["definitions", "refs", "defs"]
//! ignored_keywords = ["id", "default"]
//!
//! [validation]
//! enum_equality = "strict"
//! max_depth = 256
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaGraphConfig {
    /// Graph construction settings
    #[serde(default)]
    pub graph: GraphConfig,

    /// Validation settings
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Graph construction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Name under which the document root appears in `definitions()`
    #[serde(default = "default_root_name")]
    pub root_name: String,

    /// Containers in the root document whose entries are named definitions
    #[serde(default = "default_definition_tags")]
    pub definition_tags: Vec<String>,

    /// Extra keywords that never produce an unrecognized-keyword warning
    #[serde(default)]
    pub ignored_keywords: Vec<String>,
}

/// How `enum` compares a value against its literals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnumEquality {
    /// Numbers compare numerically and booleans equal 1/0,
    /// so `true` matches an enum containing `1`
    #[default]
    Loose,
    /// Numbers compare numerically, booleans only match booleans
    Strict,
}

/// Validation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Equality used by `enum`
    #[serde(default)]
    pub enum_equality: EnumEquality,

    /// Maximum number of nested node validations before giving up
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

// Default value functions
fn default_root_name() -> String {
    "Root".to_string()
}

fn default_definition_tags() -> Vec<String> {
    vec!["definitions".to_string()]
}

fn default_max_depth() -> usize {
    512
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            root_name: default_root_name(),
            definition_tags: default_definition_tags(),
            ignored_keywords: Vec::new(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enum_equality: EnumEquality::default(),
            max_depth: default_max_depth(),
        }
    }
}

impl SchemaGraphConfig {
    /// Load configuration, layering an explicit file over the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_locations = [
            "schemagraph.toml",
            ".schemagraph.toml",
            "config/schemagraph.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "schemagraph", "schemagraph") {
            let xdg_config = config_dir.config_dir().join("schemagraph.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // SCHEMAGRAPH__VALIDATION__MAX_DEPTH=64
        builder = builder.add_source(
            Environment::with_prefix("SCHEMAGRAPH")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

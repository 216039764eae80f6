use std::{fmt, path::Path};

use anyhow::{Context, Result};

use crate::domain::Task;

/// Task file formats. YAML and TOML are behind their cargo features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    #[cfg(feature = "yaml")]
    Yaml,
    #[cfg(feature = "toml")]
    Toml,
}

impl DocumentFormat {
    /// Pick a format from the file extension, if it is one this build reads.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(DocumentFormat::Json),
            #[cfg(feature = "yaml")]
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            #[cfg(feature = "toml")]
            "toml" => Some(DocumentFormat::Toml),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Json => write!(f, "json"),
            #[cfg(feature = "yaml")]
            DocumentFormat::Yaml => write!(f, "yaml"),
            #[cfg(feature = "toml")]
            DocumentFormat::Toml => write!(f, "toml"),
        }
    }
}

pub fn parse_task_str(contents: &str, format: DocumentFormat) -> Result<Task> {
    match format {
        DocumentFormat::Json => {
            serde_json::from_str::<Task>(contents).with_context(|| "failed to parse JSON task file")
        }
        #[cfg(feature = "yaml")]
        DocumentFormat::Yaml => {
            serde_yaml::from_str::<Task>(contents).with_context(|| "failed to parse YAML task file")
        }
        #[cfg(feature = "toml")]
        DocumentFormat::Toml => {
            toml::from_str::<Task>(contents).with_context(|| "failed to parse TOML task file")
        }
    }
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rag_logging::rag_info;
use serde::{Deserialize, Serialize};
use wikirag_engine::ExportConfig;

use super::logging::LogDestination;

pub const DEFAULT_SETTINGS_FILE: &str = "wikirag.ron";

/// Contents of `wikirag.ron`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliSettings {
    /// Root of the directory-backed wiki.
    pub wiki_root: PathBuf,
    pub log_destination: LogDestination,
    pub log_file: PathBuf,
    pub export: ExportConfig,
}

impl Default for CliSettings {
    fn default() -> Self {
        Self {
            wiki_root: PathBuf::from("wiki"),
            log_destination: LogDestination::Terminal,
            log_file: PathBuf::from("wikirag.log"),
            export: ExportConfig::default(),
        }
    }
}

/// Read settings from `path`. A missing file yields the defaults unless the
/// path was given explicitly.
pub fn load_settings(path: &Path, explicit: bool) -> Result<CliSettings> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !explicit => {
            return Ok(CliSettings::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("reading settings from {path:?}"));
        }
    };
    parse_settings(&content).with_context(|| format!("parsing settings from {path:?}"))
}

pub fn parse_settings(content: &str) -> Result<CliSettings> {
    let settings = ron::from_str(content)?;
    rag_info!("Loaded settings");
    Ok(settings)
}

/// Command-line overrides applied on top of the file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub wiki_root: Option<PathBuf>,
    pub database: Option<PathBuf>,
}

impl CliSettings {
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(root) = overrides.wiki_root {
            self.wiki_root = root;
        }
        if let Some(database) = overrides.database {
            self.export.queue.database = database;
        }
    }
}

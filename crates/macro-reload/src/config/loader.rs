use std::path::{Path, PathBuf};

use super::parser::{parse_str, Block};
use super::section::Section;
use super::{ConfigSource, ParsedConfig};
use crate::error::ConfigError;

/// Reads the main config file and everything it includes.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: PathBuf,
}

impl ConfigLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory that holds the main config file.
    pub fn config_dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn read_file(
        &self,
        path: &Path,
        stack: &mut Vec<PathBuf>,
        sections: &mut Vec<Section>,
    ) -> Result<(), ConfigError> {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if stack.contains(&canonical) {
            return Err(ConfigError::RecursiveInclude(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        log::debug!("Reading config file {}", path.display());

        stack.push(canonical);
        for block in parse_str(&content, path)? {
            match block {
                Block::Section(section) => sections.push(section),
                Block::Include(pattern) => {
                    let dir = path.parent().unwrap_or_else(|| Path::new("."));
                    for include in resolve_include(dir, &pattern)? {
                        self.read_file(&include, stack, sections)?;
                    }
                }
            }
        }
        stack.pop();
        Ok(())
    }
}

impl ConfigSource for ConfigLoader {
    fn read_full_config(&self) -> Result<ParsedConfig, ConfigError> {
        let mut sections = Vec::new();
        self.read_file(&self.path, &mut Vec::new(), &mut sections)?;
        Ok(ParsedConfig::from_sections(sections))
    }
}

/// Expands an include pattern relative to `dir`, sorted by path.
///
/// A pattern without glob characters must name an existing file; a glob that
/// matches nothing is not an error.
fn resolve_include(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, ConfigError> {
    let full = dir.join(pattern);
    let full_str = full.to_string_lossy();

    if !pattern.contains(['*', '?', '[']) {
        if !full.is_file() {
            return Err(ConfigError::MissingInclude(full));
        }
        return Ok(vec![full]);
    }

    let entries = glob::glob(&full_str).map_err(|e| ConfigError::InvalidInclude {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) if path.is_file() => Some(path),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Skipping unreadable include match: {}", e);
                None
            }
        })
        .collect();
    paths.sort();
    Ok(paths)
}

//! Config source: section model, file parser, include loader and settings.

pub mod loader;
pub mod parser;
pub mod section;
pub mod settings;

pub use loader::ConfigLoader;
pub use section::Section;
pub use settings::{EngineOptions, ReloadSettings, SETTINGS_SECTION};

use crate::error::ConfigError;

/// Anything that can produce a fresh view of the full configuration.
pub trait ConfigSource: Send {
    fn read_full_config(&self) -> Result<ParsedConfig, ConfigError>;
}

/// All sections of a config, in file order, duplicates merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedConfig {
    sections: Vec<Section>,
}

impl ParsedConfig {
    /// Builds a config, folding repeated keys into their first occurrence.
    pub fn from_sections(sections: impl IntoIterator<Item = Section>) -> Self {
        let mut merged: Vec<Section> = Vec::new();
        for section in sections {
            match merged.iter_mut().find(|s| s.key() == section.key()) {
                Some(existing) => existing.merge(section),
                None => merged.push(section),
            }
        }
        Self { sections: merged }
    }

    /// Parses config text directly; includes are not followed.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let blocks = parser::parse_str(text, std::path::Path::new("<memory>"))?;
        Ok(Self::from_sections(blocks.into_iter().filter_map(
            |block| match block {
                parser::Block::Section(section) => Some(section),
                parser::Block::Include(_) => None,
            },
        )))
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Sections of one family that carry an instance name.
    pub fn sections_of<'a>(&'a self, family: &'a str) -> impl Iterator<Item = &'a Section> + 'a {
        self.sections
            .iter()
            .filter(move |s| s.section_type() == family && s.instance().is_some())
    }

    pub fn has_section(&self, key: &str) -> bool {
        self.section(key).is_some()
    }

    pub fn section(&self, key: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.key() == key)
    }
}

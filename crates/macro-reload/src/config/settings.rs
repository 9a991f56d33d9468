use super::{ParsedConfig, Section};
use crate::error::ConfigError;

/// Section holding engine toggles and global `variable_*` values.
pub const SETTINGS_SECTION: &str = "macro_reload";

/// Template engine extensions, each enabled by a boolean option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub do_extension: bool,
    pub loop_controls_extension: bool,
    pub bool_filter: bool,
    pub yes_no_filter: bool,
    pub on_off_filter: bool,
    pub from_json_filter: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            do_extension: true,
            loop_controls_extension: true,
            bool_filter: true,
            yes_no_filter: true,
            on_off_filter: true,
            from_json_filter: true,
        }
    }
}

/// Startup settings read from `[macro_reload]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadSettings {
    pub engine: EngineOptions,
    /// Adds the `printer` status object to every rendering context.
    pub expose_printer: bool,
    /// Registers the `print` helper.
    pub expose_print: bool,
}

impl Default for ReloadSettings {
    fn default() -> Self {
        Self {
            engine: EngineOptions::default(),
            expose_printer: true,
            expose_print: true,
        }
    }
}

impl ReloadSettings {
    /// Reads the settings section; a missing section yields the defaults.
    pub fn from_config(config: &ParsedConfig) -> Result<Self, ConfigError> {
        match config.section(SETTINGS_SECTION) {
            Some(section) => Self::from_section(section),
            None => Ok(Self::default()),
        }
    }

    pub fn from_section(section: &Section) -> Result<Self, ConfigError> {
        Ok(Self {
            engine: EngineOptions {
                do_extension: section.get_bool("do_extension", true)?,
                loop_controls_extension: section.get_bool("loop_controls_extension", true)?,
                bool_filter: section.get_bool("bool_filter", true)?,
                yes_no_filter: section.get_bool("yes_no_filter", true)?,
                on_off_filter: section.get_bool("on_off_filter", true)?,
                from_json_filter: section.get_bool("from_json_filter", true)?,
            },
            expose_printer: section.get_bool("expose_printer", true)?,
            expose_print: section.get_bool("expose_print", true)?,
        })
    }
}

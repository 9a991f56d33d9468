//! Test harness for isolated printer runs.
//!
//! The `TestHarness` owns a temporary config directory with a `printer.cfg`
//! and starts a `Printer` against it. Tests rewrite the config between
//! `MACRO_RELOAD` calls to drive reloads.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use macro_reload::template::ContextFactory;
use macro_reload::{ConfigLoader, ExecutionError, Printer, Result};

/// Everything a single command produced.
#[derive(Debug, Default)]
pub struct RunOutput {
    pub responses: Vec<String>,
    pub executed: Vec<String>,
}

pub struct TestHarness {
    temp_dir: TempDir,
    /// Path to `printer.cfg` within the temp dir.
    pub config_path: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join("printer.cfg");
        std::fs::write(&config_path, "").expect("Failed to write printer.cfg");
        Self {
            temp_dir,
            config_path,
        }
    }

    /// Create a harness with `printer.cfg` already holding `text`.
    pub fn with_config(text: &str) -> Self {
        let harness = Self::new();
        harness.write_config(text);
        harness
    }

    pub fn config_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write_config(&self, text: &str) {
        std::fs::write(&self.config_path, text).expect("Failed to write printer.cfg");
    }

    /// Write a file relative to the config directory, creating parents.
    pub fn write_file(&self, relative: &str, text: &str) {
        let path = self.temp_dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create directory");
        }
        std::fs::write(path, text).expect("Failed to write file");
    }

    pub fn try_start(&self) -> Result<Printer> {
        Printer::start(Box::new(ConfigLoader::new(&self.config_path)))
    }

    pub fn start(&self) -> Printer {
        self.try_start().expect("Printer failed to start")
    }

    pub fn start_with(&self, context: Box<dyn ContextFactory>) -> Printer {
        Printer::start_with(Box::new(ConfigLoader::new(&self.config_path)), Some(context))
            .expect("Printer failed to start")
    }
}

/// Run one line, panicking on error, and drain its output.
pub fn run(printer: &mut Printer, line: &str) -> RunOutput {
    try_run(printer, line).unwrap_or_else(|e| panic!("'{}' failed: {}", line, e))
}

pub fn try_run(printer: &mut Printer, line: &str) -> std::result::Result<RunOutput, ExecutionError> {
    let result = printer.run_line(line);
    let output = RunOutput {
        responses: printer.take_responses(),
        executed: printer.take_executed(),
    };
    result.map(|()| output)
}

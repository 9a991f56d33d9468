use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReloadError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Watch error: {0}")]
    Watch(#[from] WatchError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Include file '{0}' does not exist")]
    MissingInclude(PathBuf),

    #[error("Invalid include pattern '{pattern}': {reason}")]
    InvalidInclude { pattern: String, reason: String },

    #[error("Recursive include of '{0}'")]
    RecursiveInclude(PathBuf),

    #[error("Name of section '{0}' contains illegal whitespace")]
    IllegalWhitespace(String),

    #[error("{path}:{line}: {message}")]
    Syntax {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Option '{option}' in section '{section}' must be specified")]
    MissingOption { section: String, option: String },

    #[error("Option '{option}' in section '{section}' is not a valid boolean: '{value}'")]
    InvalidBool {
        section: String,
        option: String,
        value: String,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LiteralError {
    #[error("invalid syntax at position {position}")]
    Syntax { position: usize },

    #[error("integer literal '{0}' is out of range")]
    OutOfRange(String),

    #[error("{0} values cannot be encoded")]
    Unsupported(&'static str),

    #[error("mapping keys must be strings, found {0}")]
    NonStringKey(&'static str),

    #[error("float {0} is not finite")]
    NonFinite(f64),

    #[error("value does not survive an encoding round trip")]
    NotLossless,

    #[error("encoding failed: {0}")]
    Encode(String),
}

impl From<serde_json::Error> for LiteralError {
    fn from(err: serde_json::Error) -> Self {
        LiteralError::Encode(err.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("syntax error in '{name}': {message}")]
    Syntax { name: String, message: String },

    #[error("failed to render '{name}': {message}")]
    Render { name: String, message: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("command {0} already registered")]
    AlreadyRegistered(String),

    #[error("mux command {command} {key}={value} already registered")]
    MuxAlreadyRegistered {
        command: String,
        key: String,
        value: String,
    },

    #[error("mux command {command} already registered with key {existing}, not {requested}")]
    MuxKeyMismatch {
        command: String,
        existing: String,
        requested: String,
    },

    #[error("'{target}' and '{command}' must both be traditional or both be extended G-code")]
    RenameKindMismatch { command: String, target: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("object '{0}' already registered")]
    AlreadyLoaded(String),

    #[error("object '{0}' not found")]
    NotFound(String),

    #[error("object '{key}' is not a {expected}")]
    WrongKind { key: String, expected: &'static str },
}

/// Failure confined to a single macro or template during a sweep.
#[derive(Error, Debug)]
pub enum EntityError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Unknown command: \"{0}\"")]
    UnknownCommand(String),

    #[error("Malformed command '{0}'")]
    Malformed(String),

    #[error("Error on '{command}': missing {param}")]
    MissingParameter { command: String, param: String },

    #[error("Error on '{command}': unable to parse '{value}' for {param}")]
    InvalidParameter {
        command: String,
        param: String,
        value: String,
    },

    #[error("Macro {0} called recursively")]
    Recursive(String),

    #[error("Unknown macro variable '{variable}' in {macro_name}")]
    UnknownVariable { macro_name: String, variable: String },

    #[error("Unable to parse '{value}' as a literal: {source}")]
    InvalidValue {
        value: String,
        #[source]
        source: LiteralError,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Reload failed: {0}")]
    Reload(Box<ReloadError>),
}

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to watch '{path}': {message}")]
    Watch { path: PathBuf, message: String },

    #[error("Watch channel closed unexpectedly")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, ReloadError>;

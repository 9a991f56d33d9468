pub mod config;
pub mod coordinator;
pub mod error;
pub mod gcode;
pub mod host;
pub mod literal;
pub mod printer;
pub mod reconcile;
pub mod registry;
pub mod report;
pub mod template;
pub mod variables;
pub mod watcher;

pub use config::{ConfigLoader, ConfigSource, ParsedConfig, ReloadSettings, Section};
pub use coordinator::ReloadCoordinator;
pub use error::{
    ConfigError, EntityError, ExecutionError, LiteralError, ReloadError, Result, TemplateError,
    WatchError,
};
pub use host::Host;
pub use literal::Literal;
pub use printer::Printer;
pub use reconcile::{ReloadRequest, VariableMode};
pub use report::{ChangeKind, ReloadReport};
pub use template::{HandlebarsEngine, TemplateEngine};
pub use watcher::{ConfigChange, ConfigWatcher, WatcherThread};

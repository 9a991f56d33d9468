//! G-code command parsing and the dispatch tables.

pub mod command;
pub mod dispatch;

pub use command::{is_traditional, GCodeCommand};
pub use dispatch::{Builtin, GCodeDispatch, Handler, Registration};

/// Mux command that exposes macro variables.
pub const SET_VARIABLE_COMMAND: &str = "SET_GCODE_VARIABLE";
/// Mux key of [`SET_VARIABLE_COMMAND`].
pub const SET_VARIABLE_KEY: &str = "MACRO";
pub const SET_VARIABLE_HELP: &str = "Set the value of a G-Code macro variable";

use std::collections::HashMap;

use crate::error::CommandError;

/// Commands implemented by the host itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    MacroReload,
    Help,
    Respond,
}

/// What runs when a command token is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handler {
    Builtin(Builtin),
    /// Motion or heater command handled outside the macro layer.
    Native(String),
    /// Dispatches on one parameter through the mux table.
    Mux(String),
    /// `SET_GCODE_VARIABLE` target, by registry key.
    SetVariable(String),
    /// User macro, by registry key.
    Macro(String),
}

/// Everything bound to one command token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub handler: Handler,
    pub help: Option<String>,
    pub when_not_ready: bool,
}

#[derive(Debug, Clone, Default)]
struct MuxCommand {
    key: String,
    values: HashMap<String, Handler>,
}

/// Command tables: ready handlers, base (pre-ready) handlers, help text and
/// multiplexed commands.
#[derive(Debug, Clone, Default)]
pub struct GCodeDispatch {
    is_ready: bool,
    ready_handlers: HashMap<String, Handler>,
    base_handlers: HashMap<String, Handler>,
    help: HashMap<String, String>,
    mux_commands: HashMap<String, MuxCommand>,
}

impl GCodeDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.is_ready = ready;
    }

    pub fn is_ready(&self) -> bool {
        self.is_ready
    }

    pub fn register_command(
        &mut self,
        command: &str,
        handler: Handler,
        when_not_ready: bool,
        desc: Option<&str>,
    ) -> Result<(), CommandError> {
        let command = command.to_uppercase();
        if self.ready_handlers.contains_key(&command) {
            return Err(CommandError::AlreadyRegistered(command));
        }
        if when_not_ready {
            self.base_handlers.insert(command.clone(), handler.clone());
        }
        if let Some(desc) = desc {
            self.help.insert(command.clone(), desc.to_string());
        }
        self.ready_handlers.insert(command, handler);
        Ok(())
    }

    /// Removes a token from all three tables and returns what was bound.
    pub fn unregister_command(&mut self, command: &str) -> Option<Registration> {
        let command = command.to_uppercase();
        let handler = self.ready_handlers.remove(&command);
        let when_not_ready = self.base_handlers.remove(&command).is_some();
        let help = self.help.remove(&command);
        handler.map(|handler| Registration {
            handler,
            help,
            when_not_ready,
        })
    }

    /// Moves whatever is bound at `from` to `to`, help text included.
    ///
    /// Fails without touching anything if `to` is taken. Returns `false` when
    /// nothing was bound at `from`.
    pub fn move_command(
        &mut self,
        from: &str,
        to: &str,
        fallback_help: Option<&str>,
    ) -> Result<bool, CommandError> {
        if self.is_registered(to) {
            return Err(CommandError::AlreadyRegistered(to.to_uppercase()));
        }
        let Some(registration) = self.unregister_command(from) else {
            return Ok(false);
        };
        let help = registration.help.as_deref().or(fallback_help);
        self.register_command(to, registration.handler, registration.when_not_ready, help)?;
        Ok(true)
    }

    pub fn lookup(&self, command: &str) -> Option<&Handler> {
        let command = command.to_uppercase();
        if self.is_ready {
            self.ready_handlers.get(&command)
        } else {
            self.base_handlers.get(&command)
        }
    }

    pub fn is_registered(&self, command: &str) -> bool {
        self.ready_handlers.contains_key(&command.to_uppercase())
    }

    /// True if the token appears in any table.
    pub fn is_known(&self, command: &str) -> bool {
        let command = command.to_uppercase();
        self.ready_handlers.contains_key(&command)
            || self.base_handlers.contains_key(&command)
            || self.help.contains_key(&command)
    }

    pub fn help(&self, command: &str) -> Option<&str> {
        self.help.get(&command.to_uppercase()).map(String::as_str)
    }

    pub fn set_help(&mut self, command: &str, desc: &str) {
        self.help.insert(command.to_uppercase(), desc.to_string());
    }

    pub fn remove_help(&mut self, command: &str) -> Option<String> {
        self.help.remove(&command.to_uppercase())
    }

    /// Help entries sorted by command.
    pub fn help_entries(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<_> = self
            .help
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        entries.sort();
        entries
    }

    pub fn register_mux_command(
        &mut self,
        command: &str,
        key: &str,
        value: &str,
        handler: Handler,
        desc: Option<&str>,
    ) -> Result<(), CommandError> {
        let command = command.to_uppercase();
        if !self.mux_commands.contains_key(&command) {
            self.register_command(&command, Handler::Mux(command.clone()), false, desc)?;
            self.mux_commands.insert(
                command.clone(),
                MuxCommand {
                    key: key.to_string(),
                    values: HashMap::new(),
                },
            );
        }

        let Some(mux) = self.mux_commands.get_mut(&command) else {
            return Ok(());
        };
        if mux.key != key {
            return Err(CommandError::MuxKeyMismatch {
                command,
                existing: mux.key.clone(),
                requested: key.to_string(),
            });
        }
        if mux.values.contains_key(value) {
            return Err(CommandError::MuxAlreadyRegistered {
                command,
                key: key.to_string(),
                value: value.to_string(),
            });
        }
        mux.values.insert(value.to_string(), handler);
        Ok(())
    }

    /// Checks whether a mux value could be registered.
    pub fn check_mux_value(&self, command: &str, key: &str, value: &str) -> Result<(), CommandError> {
        let command = command.to_uppercase();
        match self.mux_commands.get(&command) {
            Some(mux) if mux.key != key => Err(CommandError::MuxKeyMismatch {
                command,
                existing: mux.key.clone(),
                requested: key.to_string(),
            }),
            Some(mux) if mux.values.contains_key(value) => Err(CommandError::MuxAlreadyRegistered {
                command,
                key: key.to_string(),
                value: value.to_string(),
            }),
            Some(_) => Ok(()),
            None if self.is_registered(&command) => {
                Err(CommandError::AlreadyRegistered(command))
            }
            None => Ok(()),
        }
    }

    pub fn mux_has_value(&self, command: &str, value: &str) -> bool {
        self.mux_commands
            .get(&command.to_uppercase())
            .is_some_and(|mux| mux.values.contains_key(value))
    }

    pub fn unregister_mux_value(&mut self, command: &str, value: &str) -> Option<Handler> {
        self.mux_commands
            .get_mut(&command.to_uppercase())
            .and_then(|mux| mux.values.remove(value))
    }

    /// Handler bound to `value`.
    pub fn mux_lookup(&self, command: &str, value: &str) -> Option<&Handler> {
        self.mux_commands
            .get(&command.to_uppercase())
            .and_then(|mux| mux.values.get(value))
    }

    pub fn mux_key(&self, command: &str) -> Option<&str> {
        self.mux_commands
            .get(&command.to_uppercase())
            .map(|mux| mux.key.as_str())
    }
}

//! Host process state shared by the reconcilers and the command loop.

use serde_json::{Map, Value};

use crate::gcode::GCodeDispatch;
use crate::registry::Registry;

#[derive(Debug, Clone, Default)]
pub struct Host {
    pub objects: Registry,
    pub gcode: GCodeDispatch,
}

impl Host {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status of every live object, keyed by section name.
    pub fn status(&self) -> Value {
        let mut status = Map::new();
        for key in self.objects.keys() {
            if let Some(entity) = self.objects.lookup(key) {
                status.insert(key.clone(), entity.status());
            }
        }
        Value::Object(status)
    }
}

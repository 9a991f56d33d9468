use crate::error::ConfigError;

/// One `[type name]` block of the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    section_type: String,
    instance: Option<String>,
    options: Vec<(String, String)>,
}

impl Section {
    /// Builds an empty section from a raw header such as `gcode_macro FOO`.
    ///
    /// Headers with more than one space-separated word after the type are
    /// rejected.
    pub fn new(header: &str) -> Result<Self, ConfigError> {
        let name = header.trim();
        let mut parts = name.split_whitespace();
        let section_type = parts.next().unwrap_or_default().to_string();
        let instance = parts.next().map(str::to_string);
        if parts.next().is_some() {
            return Err(ConfigError::IllegalWhitespace(name.to_string()));
        }

        // Normalize inner whitespace so "macro   foo" keys as "macro foo".
        let name = match &instance {
            Some(instance) => format!("{} {}", section_type, instance),
            None => section_type.clone(),
        };

        Ok(Self {
            name,
            section_type,
            instance,
            options: Vec::new(),
        })
    }

    /// Full key, `type` or `type instance`.
    pub fn key(&self) -> &str {
        &self.name
    }

    pub fn section_type(&self) -> &str {
        &self.section_type
    }

    pub fn instance(&self) -> Option<&str> {
        self.instance.as_deref()
    }

    /// Sets an option, replacing an earlier value for the same key in place.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let key = key.trim().to_lowercase();
        let value = value.into();
        match self.options.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.options.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_lowercase();
        self.options
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns a required option.
    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key).ok_or_else(|| ConfigError::MissingOption {
            section: self.name.clone(),
            option: key.to_string(),
        })
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = self.get(key) else {
            return Ok(default);
        };
        match raw.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidBool {
                section: self.name.clone(),
                option: key.to_string(),
                value: raw.to_string(),
            }),
        }
    }

    /// Options whose key starts with `prefix`, in file order.
    pub fn options_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.options
            .iter()
            .filter(move |(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn options(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Folds the options of a later duplicate section into this one.
    pub fn merge(&mut self, other: Section) {
        for (key, value) in other.options {
            self.set(&key, value);
        }
    }
}

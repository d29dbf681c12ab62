//! Environment-variable configuration loader.
//!
//! ```text
//! #[derive(Bindable, Default)]
//! struct ServerConfig {
//!     #[bind(tags(config_format = "snake", config_default = "8080"))]
//!     listen_port: u16,
//!     #[bind(tags(config_format = "snake"))]
//!     database_url: Option<String>,
//! }
//!
//! // Reads APP_LISTEN_PORT and APP_DATABASE_URL.
//! let config: ServerConfig = EnvProcessor::new().with_prefix("APP").process()?;
//! ```

use std::fmt;

use crate::assign::assign_to_field;
use crate::errors::ConfigError;
use crate::metadata::{Bindable, extract};
use crate::stringcase::to_screaming_snake;
use crate::validate::Validate;

/// Selects how a field name is turned into an environment variable name.
pub const FORMAT_TAG: &str = "config_format";

/// Value used when no environment variable matches the formatted field name.
pub const DEFAULT_TAG: &str = "config_default";

/// `listen_port` (or `ListenPort`) becomes `LISTEN_PORT`.
pub const FORMAT_SNAKE: &str = "snake";

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Fills a struct from environment variables, then validates it.
pub struct EnvProcessor {
    prefix: Option<String>,
    lookup: Lookup,
}

impl Default for EnvProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EnvProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvProcessor").field("prefix", &self.prefix).finish_non_exhaustive()
    }
}

impl EnvProcessor {
    pub fn new() -> Self {
        Self {
            prefix: None,
            lookup: Box::new(|name| std::env::var(name).ok()),
        }
    }

    /// Given a field `value` and the prefix `TEST`, the processor looks for `TEST_VALUE`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    /// Replaces the process environment with another source of variables.
    pub fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.lookup = Box::new(lookup);
        self
    }

    /// Environment variable name for a field formatted with `format`.
    ///
    /// # Panics
    ///
    /// Panics with `invalid config format` for any format other than [`FORMAT_SNAKE`].
    pub fn variable_name(&self, field: &str, format: &str) -> String {
        match format {
            FORMAT_SNAKE => {
                let name = to_screaming_snake(field);
                match &self.prefix {
                    Some(prefix) => format!("{prefix}_{name}"),
                    None => name,
                }
            }
            other => panic!("invalid config format ({other})"),
        }
    }

    /// Builds a `T` from its `Default`, assigns every field tagged with [`FORMAT_TAG`], and runs
    /// [`Validate::validate`] on the result.
    ///
    /// Fields are visited in declaration order; the first failing assignment is returned.
    ///
    /// # Panics
    ///
    /// Panics when a field carries an unknown [`FORMAT_TAG`] value.
    pub fn process<T>(&self) -> Result<T, ConfigError>
    where
        T: Bindable + Default + Validate,
    {
        let metadata = extract::<T>();
        let mut config = T::default();

        for descriptor in metadata.iter() {
            let Some(format) = descriptor.tag(FORMAT_TAG) else {
                continue;
            };
            let variable = self.variable_name(&descriptor.name, format);

            if let Some(value) = (self.lookup)(&variable) {
                log::debug!("config field {} set from {variable}", descriptor.name);
                assign_to_field(&mut config, &descriptor.name, &value).map_err(|source| ConfigError::EnvVar {
                    field: descriptor.name.clone(),
                    value,
                    source,
                })?;
            } else if let Some(default) = descriptor.tag(DEFAULT_TAG) {
                log::debug!("config field {} set from its default", descriptor.name);
                assign_to_field(&mut config, &descriptor.name, default).map_err(|source| ConfigError::Default {
                    field: descriptor.name.clone(),
                    value: default.to_owned(),
                    source,
                })?;
            }
        }

        config.validate().map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

//! Priority bounds configuration
//!
//! Bounds are fixed for the lifetime of a scheduler instance. They default to
//! the classic 0..=7 range with new tasks at 1, and can be overridden from a
//! kernel command line.

use core::fmt;

use super::types::{Priority, PRIORITY_DEFAULT, PRIORITY_MAX, PRIORITY_MIN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A `prio_*=` token carried something that is not an integer.
    BadValue(&'static str),
    /// `min <= default <= max` does not hold.
    BadBounds {
        min: Priority,
        default: Priority,
        max: Priority,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::BadValue(key) => write!(f, "malformed value for {}", key),
            ConfigError::BadBounds { min, default, max } => write!(
                f,
                "priority bounds must satisfy min <= default <= max (got {} / {} / {})",
                min, default, max
            ),
        }
    }
}

/// Priority bounds for one scheduler instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedConfig {
    pub priority_min: Priority,
    pub priority_default: Priority,
    pub priority_max: Priority,
}

impl SchedConfig {
    pub const fn new() -> Self {
        Self {
            priority_min: PRIORITY_MIN,
            priority_default: PRIORITY_DEFAULT,
            priority_max: PRIORITY_MAX,
        }
    }

    pub const fn with_bounds(min: Priority, default: Priority, max: Priority) -> Self {
        Self {
            priority_min: min,
            priority_default: default,
            priority_max: max,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.priority_min <= self.priority_default && self.priority_default <= self.priority_max
        {
            Ok(())
        } else {
            Err(ConfigError::BadBounds {
                min: self.priority_min,
                default: self.priority_default,
                max: self.priority_max,
            })
        }
    }

    #[inline]
    pub fn contains(&self, priority: Priority) -> bool {
        (self.priority_min..=self.priority_max).contains(&priority)
    }

    /// Build a configuration from `prio_min=`, `prio_max=` and
    /// `prio_default=` tokens. Other tokens are left for their own parsers.
    pub fn from_cmdline(cmdline: &str) -> Result<Self, ConfigError> {
        let mut config = Self::new();

        for arg in cmdline.split_whitespace() {
            if let Some(value) = arg.strip_prefix("prio_min=") {
                config.priority_min = parse_priority("prio_min", value)?;
                crate::kdebug!("Sched config: prio_min={}", config.priority_min);
            } else if let Some(value) = arg.strip_prefix("prio_max=") {
                config.priority_max = parse_priority("prio_max", value)?;
                crate::kdebug!("Sched config: prio_max={}", config.priority_max);
            } else if let Some(value) = arg.strip_prefix("prio_default=") {
                config.priority_default = parse_priority("prio_default", value)?;
                crate::kdebug!("Sched config: prio_default={}", config.priority_default);
            }
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for SchedConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_priority(key: &'static str, value: &str) -> Result<Priority, ConfigError> {
    value.parse::<Priority>().map_err(|_| ConfigError::BadValue(key))
}

//! calgrid configuration.
//!
//! Settings are layered: built-in defaults, then the optional TOML file at
//! `~/.config/calgrid/config.toml`, then `CALGRID__SECTION__KEY` environment
//! variables (e.g. `CALGRID__LAYOUT__MONTH_MAX_VISIBLE=5`).

use std::path::{Path, PathBuf};

use chrono::Weekday;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::{CalGridError, CalGridResult};
use crate::layout::{DEFAULT_CONTAINED_INSET, DEFAULT_MAX_VISIBLE, DEFAULT_PALETTE_SIZE};
use crate::recurrence::DEFAULT_MAX_OCCURRENCES;

static DEFAULT_TIMEZONE: &str = "UTC";
static DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// IANA timezone the views render in
    pub timezone: String,
    pub layout: LayoutSettings,
    pub recurrence: RecurrenceSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub palette_size: usize,
    pub month_max_visible: usize,
    /// Left inset of contained events, in percent
    pub contained_inset: f64,
    /// First day of the week in month grids ("mon", "sun", ...)
    pub week_start: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurrenceSettings {
    pub default_max_occurrences: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing` filter directive, overridden by RUST_LOG
    pub level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            timezone: DEFAULT_TIMEZONE.to_string(),
            layout: LayoutSettings::default(),
            recurrence: RecurrenceSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for LayoutSettings {
    fn default() -> Self {
        LayoutSettings {
            palette_size: DEFAULT_PALETTE_SIZE,
            month_max_visible: DEFAULT_MAX_VISIBLE,
            contained_inset: DEFAULT_CONTAINED_INSET,
            week_start: "mon".to_string(),
        }
    }
}

impl Default for RecurrenceSettings {
    fn default() -> Self {
        RecurrenceSettings {
            default_max_occurrences: DEFAULT_MAX_OCCURRENCES,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Settings {
    pub fn config_path() -> CalGridResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalGridError::Config("Could not determine config directory".into()))?
            .join("calgrid");

        Ok(config_dir.join("config.toml"))
    }

    /// Load settings from the default config path and the environment.
    pub fn load() -> CalGridResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load settings from `path` (which may not exist) and the environment.
    pub fn load_from(path: &Path) -> CalGridResult<Self> {
        Config::builder()
            .add_source(
                File::from(path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix("CALGRID")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|config| config.try_deserialize::<Settings>())
            .map_err(|e| CalGridError::Config(e.to_string()))
    }

    /// The configured timezone.
    pub fn timezone(&self) -> CalGridResult<chrono_tz::Tz> {
        self.timezone
            .parse()
            .map_err(|_| CalGridError::UnknownTimezone(self.timezone.clone()))
    }

    pub fn week_start(&self) -> CalGridResult<Weekday> {
        let week_start = &self.layout.week_start;
        week_start
            .parse()
            .map_err(|_| CalGridError::Config(format!("Invalid week_start '{week_start}'")))
    }

    pub fn to_toml(&self) -> CalGridResult<String> {
        toml::to_string_pretty(self).map_err(|e| CalGridError::Serialization(e.to_string()))
    }

    /// Create a config file with every option commented out.
    pub fn create_default_config(path: &Path) -> CalGridResult<()> {
        let defaults = Settings::default();
        let contents = format!(
            "\
# calgrid configuration

# Timezone views render in (IANA name):
# timezone = \"{}\"

[layout]
# palette_size = {}
# month_max_visible = {}
# contained_inset = {:.1}
# week_start = \"{}\"

[recurrence]
# default_max_occurrences = {}

[logging]
# level = \"{}\"
",
            defaults.timezone,
            defaults.layout.palette_size,
            defaults.layout.month_max_visible,
            defaults.layout.contained_inset,
            defaults.layout.week_start,
            defaults.recurrence.default_max_occurrences,
            defaults.logging.level,
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalGridError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)?;

        Ok(())
    }
}

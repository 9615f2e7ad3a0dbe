//! Meeting editor configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{MeetingError, MeetingResult};

/// Default timeout for downloading a free/busy document.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 90;

const ENV_PREFIX: &str = "MEETFB";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderUnits {
    #[default]
    Minutes,
    Hours,
    Days,
}

/// Configuration at ~/.config/meetfb/config.toml
///
/// Every key can be overridden from the environment with a `MEETFB_`
/// prefix, e.g. `MEETFB_TIMEZONE=Europe/Berlin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeetingConfig {
    /// Free/busy URL template; `%u` is replaced by the user part of the
    /// attendee address and `%d` by the domain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_busy_template: Option<String>,

    /// IANA zone busy periods are displayed in
    pub timezone: String,

    pub default_reminder_interval: i32,

    pub default_reminder_units: ReminderUnits,

    pub fetch_timeout_secs: u64,

    /// The user's own addresses, used to find them in an attendee list
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<String>,
}

impl Default for MeetingConfig {
    fn default() -> Self {
        MeetingConfig {
            free_busy_template: None,
            timezone: "UTC".to_string(),
            default_reminder_interval: 15,
            default_reminder_units: ReminderUnits::Minutes,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            identities: Vec::new(),
        }
    }
}

impl MeetingConfig {
    pub fn config_path() -> MeetingResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| MeetingError::Config("Could not determine config directory".into()))?
            .join("meetfb");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location. A missing file yields defaults.
    pub fn load() -> MeetingResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from `path` (optional) layered under `MEETFB_*` environment variables.
    pub fn load_from(path: &Path) -> MeetingResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("identities"),
            )
            .build()
            .map_err(|e| MeetingError::Config(e.to_string()))?;

        let config: MeetingConfig = settings
            .try_deserialize()
            .map_err(|e| MeetingError::Config(e.to_string()))?;

        config.timezone()?;
        Ok(config)
    }

    pub fn timezone(&self) -> MeetingResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| MeetingError::Config(format!("Unknown timezone '{}'", self.timezone)))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Save to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> MeetingResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| MeetingError::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)
            .map_err(|e| MeetingError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> MeetingResult<()> {
        let contents = format!(
            "\
# meetfb configuration

# Where to look for free/busy data when the calendar server has none.
# %u is the user part of the address, %d the domain:
# free_busy_template = \"https://%d/freebusy/%u.ifb\"

# Zone busy periods are shown in:
# timezone = \"UTC\"

# Seconds to wait for a free/busy download:
# fetch_timeout_secs = {}

# Your own addresses:
# identities = [\"me@example.com\"]
",
            DEFAULT_FETCH_TIMEOUT_SECS
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MeetingError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| MeetingError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

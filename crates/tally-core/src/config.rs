//! Report options and the defaults file
//!
//! [`ReportOptions`] is what every report call takes. [`TallyConfig`] is the
//! optional `config.toml` that supplies defaults for those options.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::bucket::{Bucketing, Granularity};
use crate::error::{CoreError, Result};

/// Per-call report options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOptions {
    #[serde(default)]
    pub granularity: Granularity,
    /// Attach the contributing observations to every bucket
    #[serde(default)]
    pub include_raw: bool,
    /// Zone in which calendar periods are drawn
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
}

fn default_timezone() -> Tz {
    Tz::UTC
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            granularity: Granularity::Day,
            include_raw: false,
            timezone: Tz::UTC,
        }
    }
}

impl ReportOptions {
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_raw(mut self, include_raw: bool) -> Self {
        self.include_raw = include_raw;
        self
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn bucketing(&self) -> Bucketing {
        Bucketing::new(self.granularity, self.timezone)
    }
}

/// Parse an IANA zone name such as `America/Chicago`
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| CoreError::InvalidTimezone {
            zone: name.to_string(),
        })
}

/// Defaults loaded from `<config_dir>/tally/config.toml`
///
/// ```toml
/// granularity = "week"
/// timezone = "America/Chicago"
/// include_raw = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TallyConfig {
    pub granularity: Granularity,
    /// IANA zone name; UTC when absent
    pub timezone: Option<String>,
    pub include_raw: bool,
}

impl TallyConfig {
    /// Default location of the config file, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tally").join("config.toml"))
    }

    /// Load from `path`. A missing file yields defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(CoreError::ConfigRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Self = toml::from_str(&content).map_err(|e| CoreError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        // Surface a bad zone at load time rather than on the first report
        if let Some(zone) = &config.timezone {
            parse_timezone(zone).map_err(|_| CoreError::ConfigParse {
                path: path.to_path_buf(),
                message: format!("unknown time zone {zone:?}"),
            })?;
        }

        Ok(config)
    }

    pub fn report_options(&self) -> Result<ReportOptions> {
        let timezone = match &self.timezone {
            Some(zone) => parse_timezone(zone)?,
            None => Tz::UTC,
        };
        Ok(ReportOptions {
            granularity: self.granularity,
            include_raw: self.include_raw,
            timezone,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let options = ReportOptions::default();
        assert_eq!(options.granularity, Granularity::Day);
        assert!(!options.include_raw);
        assert_eq!(options.timezone, Tz::UTC);
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(
            parse_timezone("America/New_York").unwrap(),
            chrono_tz::America::New_York
        );
        assert!(matches!(
            parse_timezone("Mars/Olympus_Mons"),
            Err(CoreError::InvalidTimezone { .. })
        ));
    }

    #[test]
    fn test_missing_config_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = TallyConfig::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, TallyConfig::default());
    }

    #[test]
    fn test_load_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "granularity = \"month\"\ntimezone = \"Europe/Paris\"\ninclude_raw = true").unwrap();

        let config = TallyConfig::load(file.path()).unwrap();
        let options = config.report_options().unwrap();
        assert_eq!(options.granularity, Granularity::Month);
        assert_eq!(options.timezone, chrono_tz::Europe::Paris);
        assert!(options.include_raw);
    }

    #[test]
    fn test_bad_zone_in_config_is_reported() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "timezone = \"Nowhere/Special\"").unwrap();

        let err = TallyConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, CoreError::ConfigParse { .. }));
    }

    #[test]
    fn test_unknown_key_is_reported() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "granularity = \"day\"\ncolour = \"blue\"").unwrap();

        assert!(TallyConfig::load(file.path()).is_err());
    }
}

use crate::algorithms::Assignment;
use crate::error::Error;
use config::Config as eConfig;
use eyre::Result;
use serde::Deserialize;
use serde_derive::Serialize;

/// Settings for a reduction run
///
/// Settings can be built in code, starting from [Settings::default], or read from a
/// TOML file with [read]. Every field has a default, so a file only needs to list
/// what it changes.
#[derive(Debug, Deserialize, Clone, Serialize, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub config: Config,
    #[serde(default)]
    pub log: Log,
}

#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
pub struct Config {
    /// Maximum number of E/M cycles
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Relative change of the clustering functional below which the run has converged
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Model components with a weight at or below this value are pruned
    #[serde(default)]
    pub min_weight: f64,
    #[serde(default)]
    pub assignment: Assignment,
    /// Report every cycle at `info` level instead of `debug`
    #[serde(default)]
    pub verbose: bool,
}

impl Config {
    /// Check that the numeric settings are usable
    ///
    /// At least one cycle, and a finite non-negative tolerance and pruning threshold.
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_iterations == 0 {
            return Err(Error::InvalidSettings(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !(self.tolerance >= 0.0) || !self.tolerance.is_finite() {
            return Err(Error::InvalidSettings(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        if !(self.min_weight >= 0.0) || !self.min_weight.is_finite() {
            return Err(Error::InvalidSettings(format!(
                "min_weight must be finite and non-negative, got {}",
                self.min_weight
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            min_weight: 0.0,
            assignment: Assignment::default(),
            verbose: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
pub struct Log {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file, written in addition to stdout
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_max_iterations(&mut self, max_iterations: usize) -> &mut Self {
        self.config.max_iterations = max_iterations;
        self
    }

    pub fn set_tolerance(&mut self, tolerance: f64) -> &mut Self {
        self.config.tolerance = tolerance;
        self
    }

    pub fn set_min_weight(&mut self, min_weight: f64) -> &mut Self {
        self.config.min_weight = min_weight;
        self
    }

    pub fn set_assignment(&mut self, assignment: Assignment) -> &mut Self {
        self.config.assignment = assignment;
        self
    }

    pub fn set_verbose(&mut self, verbose: bool) -> &mut Self {
        self.config.verbose = verbose;
        self
    }

    pub fn set_log_level(&mut self, level: &str) -> &mut Self {
        self.log.level = level.to_string();
        self
    }

    /// Check that the numeric settings are usable, see [Config::validate]
    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;
        Ok(())
    }

    /// Write the settings as pretty-printed JSON
    pub fn write(&self, path: &str) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }
}

/// Read settings from a TOML file
///
/// Environment variables prefixed with `GMREDUCE_` override the file, with `__`
/// separating nested keys, e.g. `GMREDUCE_CONFIG__MAX_ITERATIONS=100`.
pub fn read(path: &str) -> Result<Settings> {
    let parsed = eConfig::builder()
        .add_source(config::File::with_name(path).format(config::FileFormat::Toml))
        .add_source(
            config::Environment::with_prefix("GMREDUCE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let settings: Settings = parsed.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

// *********************************
// Default values for deserializing
// *********************************
fn default_max_iterations() -> usize {
    50
}

fn default_tolerance() -> f64 {
    1e-4
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.config.max_iterations, 50);
        assert_eq!(settings.config.tolerance, 1e-4);
        assert_eq!(settings.config.min_weight, 0.0);
        assert_eq!(settings.config.assignment, Assignment::Hard);
        assert!(!settings.config.verbose);
        assert_eq!(settings.log.level, "info");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_setters_chain() {
        let mut settings = Settings::new();
        settings
            .set_max_iterations(10)
            .set_tolerance(1e-6)
            .set_assignment(Assignment::Soft)
            .set_verbose(true);
        assert_eq!(settings.config.max_iterations, 10);
        assert_eq!(settings.config.tolerance, 1e-6);
        assert_eq!(settings.config.assignment, Assignment::Soft);
        assert!(settings.config.verbose);
    }

    #[test]
    fn test_invalid_values() {
        let mut settings = Settings::new();
        settings.set_max_iterations(0);
        assert!(settings.validate().is_err());

        let mut settings = Settings::new();
        settings.set_tolerance(f64::NAN);
        assert!(settings.validate().is_err());

        let mut settings = Settings::new();
        settings.set_min_weight(-1.0);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_config_errors_are_typed() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.tolerance = f64::INFINITY;
        assert!(matches!(config.validate(), Err(Error::InvalidSettings(_))));

        config.tolerance = -1e-4;
        assert!(matches!(config.validate(), Err(Error::InvalidSettings(_))));

        config.tolerance = 0.0;
        config.min_weight = f64::NAN;
        assert!(matches!(config.validate(), Err(Error::InvalidSettings(_))));
    }
}

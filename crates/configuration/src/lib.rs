use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{AnalysisConfig, PeriodUnit, PositionSizeType};

/// Environment variable prefix, e.g. `TRADESTATS__INITIAL_CAPITAL=25000`.
pub const ENV_PREFIX: &str = "TRADESTATS";

/// Default configuration file looked up in the working directory (`tradestats.toml`).
pub const DEFAULT_CONFIG_FILE: &str = "tradestats";

/// Loads the analysis configuration.
///
/// Sources are layered in order: built-in defaults, then the TOML file (the given path,
/// which must exist, or an optional `tradestats.toml`), then `TRADESTATS__*` environment
/// variables. The merged result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config = builder.try_deserialize::<AnalysisConfig>()?;
    config.validate().map_err(ConfigError::ValidationError)?;

    tracing::debug!(?config, "Analysis configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_toml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn file_overrides_defaults() {
        let file = write_toml(
            r#"
            initial_capital = 25000.0
            position_size_type = "percentage"
            position_size = 10.0
            period_unit = "week"
            period_length = 2
            "#,
        );

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.initial_capital, 25_000.0);
        assert_eq!(config.position_size_type, PositionSizeType::Percentage);
        assert_eq!(config.period_unit, PeriodUnit::Week);
        assert_eq!(config.period_length, 2);
        // Untouched keys fall back to defaults.
        assert_eq!(config.bin_size_in_std_dev, 0.5);
    }

    #[test]
    fn invalid_values_fail_validation() {
        let file = write_toml("commission_rate = 1.5\n");

        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }
}

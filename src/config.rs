use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Top level runtime settings, layered from defaults, an optional file and
/// `WARDROBE__*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub analysis: AnalysisSettings,
    pub matching: MatchingSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Square side length images are resized to before pixel analysis.
    pub resolution: u32,
    pub max_concurrency: usize,
    pub timeout_ms: u64,
    pub pattern_thresholds: PatternThresholds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternThresholds {
    pub default: f32,
    pub solid: f32,
    pub floral: f32,
    /// Largest gray-level spread allowed in the surround of a polka dot.
    /// Rejects speckle on noisy fabric; raise it to accept dots printed on
    /// steep gradients.
    pub polka_ring_spread: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSettings {
    pub min_match_score: f32,
    pub default_weather: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            analysis: AnalysisSettings::default(),
            matching: MatchingSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            resolution: 128,
            max_concurrency: 4,
            timeout_ms: 5_000,
            pattern_thresholds: PatternThresholds::default(),
        }
    }
}

impl Default for PatternThresholds {
    fn default() -> Self {
        Self {
            default: 0.3,
            solid: 0.7,
            floral: 0.4,
            polka_ring_spread: 40.0,
        }
    }
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            min_match_score: 0.3,
            default_weather: "mild".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings: compiled defaults, then `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Settings::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("WARDROBE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), AppError> {
        let analysis = &self.analysis;
        if analysis.resolution < 16 {
            return Err(AppError::InvalidSettings(
                "Analysis resolution must be at least 16".to_string(),
            ));
        }

        if analysis.max_concurrency == 0 {
            return Err(AppError::InvalidSettings(
                "Max concurrency must be greater than 0".to_string(),
            ));
        }

        if analysis.timeout_ms == 0 {
            return Err(AppError::InvalidSettings(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if analysis.pattern_thresholds.polka_ring_spread.is_nan()
            || analysis.pattern_thresholds.polka_ring_spread <= 0.0
        {
            return Err(AppError::InvalidSettings(
                "pattern_thresholds.polka_ring_spread must be positive".to_string(),
            ));
        }

        let thresholds = [
            ("pattern_thresholds.default", analysis.pattern_thresholds.default),
            ("pattern_thresholds.solid", analysis.pattern_thresholds.solid),
            ("pattern_thresholds.floral", analysis.pattern_thresholds.floral),
            ("min_match_score", self.matching.min_match_score),
        ];
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(AppError::InvalidSettings(format!(
                    "{name} must be between 0.0 and 1.0"
                )));
            }
        }

        Ok(())
    }
}

impl AnalysisSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.analysis.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_validation_rejects_bad_thresholds() {
        let mut settings = Settings::default();
        settings.analysis.pattern_thresholds.solid = 1.5;
        assert!(matches!(
            settings.validate(),
            Err(AppError::InvalidSettings(_))
        ));

        let mut settings = Settings::default();
        settings.analysis.max_concurrency = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.analysis.pattern_thresholds.polka_ring_spread = 0.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let settings = Settings::load(None).expect("defaults should load");
        assert_eq!(settings.analysis.resolution, 128);
        assert_eq!(settings.matching.default_weather, "mild");
    }
}

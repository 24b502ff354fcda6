//! Settings struct with TOML-based sections.

use serde::{Deserialize, Serialize};

use crate::validation::ValidationSettings;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Frame-time reconstruction settings.
    #[serde(default)]
    pub reconstruction: ReconstructionSettings,

    /// Acceptance tolerances.
    #[serde(default)]
    pub validation: ValidationSettings,
}

/// Frame-time reconstruction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconstructionSettings {
    /// Pad or truncate reconstructed timestamp arrays to the physical video
    /// frame count. Disable only for diagnostics; downstream consumers
    /// index frames by position.
    #[serde(default = "default_true")]
    pub apply_correction: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ReconstructionSettings {
    fn default() -> Self {
        Self {
            apply_correction: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_tuned_tolerances() {
        let settings = Settings::default();
        assert!(settings.reconstruction.apply_correction);
        assert_eq!(settings.validation.nominal_frame_rate, 60.0);
        assert_eq!(settings.validation.frame_rate_tolerance, 0.05);
        assert_eq!(settings.validation.max_lost_frame_percentage, 0.05);
        assert_eq!(settings.validation.max_expected_minus_actual_frames, 20);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [validation]
            max_expected_minus_actual_frames = 40
            "#,
        )
        .unwrap();
        assert_eq!(settings.validation.max_expected_minus_actual_frames, 40);
        assert_eq!(settings.validation.nominal_frame_rate, 60.0);
        assert!(settings.reconstruction.apply_correction);
    }

    #[test]
    fn settings_round_trip_through_toml() {
        let settings = Settings::default();
        let text = toml::to_string(&settings).unwrap();
        let restored: Settings = toml::from_str(&text).unwrap();
        assert_eq!(
            restored.validation.frame_rate_tolerance,
            settings.validation.frame_rate_tolerance
        );
    }
}

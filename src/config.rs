use std::path::Path;

use crate::alignment::dtw::{Distance, DtwAlgorithm};
use crate::error::AlignError;
use crate::features::mfcc::MfccNormalization;

/// Full configuration surface of the alignment engine.
///
/// Values are plain data: parsing of configuration strings happens in the
/// caller, and no default is ever substituted for a missing value after
/// validation has run.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct AlignerConfig {
    pub mfcc: MfccConfig,
    pub dtw: DtwConfig,
    pub adjust: AdjustConfig,
    pub mask: MaskConfig,
    /// When true, nonspeech frames are excised from both feature matrices
    /// before DTW and path indices are translated back afterward.
    pub mask_nonspeech: bool,
}

impl AlignerConfig {
    pub fn load(path: &Path) -> Result<Self, AlignError> {
        let data =
            std::fs::read_to_string(path).map_err(|e| AlignError::io("read config file", e))?;
        serde_json::from_str(&data).map_err(|e| AlignError::json("parse config file", e))
    }

    /// Eager validation: runs before any computation starts.
    pub fn validate(&self) -> Result<(), AlignError> {
        self.mfcc.validate()?;
        self.dtw.validate()?;
        self.adjust.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct MfccConfig {
    /// Analysis window length in seconds.
    pub window_length: f64,
    /// Analysis window shift in seconds.
    pub window_shift: f64,
    /// Number of cepstral coefficients retained per frame.
    pub num_coefficients: usize,
    /// Number of triangular mel filters.
    pub num_filters: usize,
    /// FFT size; must be a power of two.
    pub fft_order: usize,
    /// Lower bound of the mel filterbank, in Hz.
    pub lower_frequency: f64,
    /// Upper bound of the mel filterbank, in Hz.
    pub upper_frequency: f64,
    /// Pre-emphasis factor applied before framing.
    pub emphasis_factor: f64,
    /// Optional column normalization, applied identically to the real
    /// and the synthesized feature matrices.
    pub normalization: MfccNormalization,
}

impl Default for MfccConfig {
    fn default() -> Self {
        Self {
            window_length: 0.100,
            window_shift: 0.040,
            num_coefficients: 13,
            num_filters: 40,
            fft_order: 512,
            lower_frequency: 133.3333,
            upper_frequency: 6855.4976,
            emphasis_factor: 0.97,
            normalization: MfccNormalization::None,
        }
    }
}

impl MfccConfig {
    pub fn validate(&self) -> Result<(), AlignError> {
        if self.window_length <= 0.0 {
            return Err(AlignError::configuration(format!(
                "window_length must be positive, got {}",
                self.window_length
            )));
        }
        if self.window_shift <= 0.0 {
            return Err(AlignError::configuration(format!(
                "window_shift must be positive, got {}",
                self.window_shift
            )));
        }
        if self.num_coefficients == 0 || self.num_coefficients > self.num_filters {
            return Err(AlignError::configuration(format!(
                "num_coefficients must be in [1, num_filters = {}], got {}",
                self.num_filters, self.num_coefficients
            )));
        }
        if self.fft_order == 0 || !self.fft_order.is_power_of_two() {
            return Err(AlignError::configuration(format!(
                "fft_order must be a power of two, got {}",
                self.fft_order
            )));
        }
        if self.lower_frequency < 0.0 || self.lower_frequency >= self.upper_frequency {
            return Err(AlignError::configuration(format!(
                "frequency band [{}, {}] is not valid",
                self.lower_frequency, self.upper_frequency
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct DtwConfig {
    pub algorithm: DtwAlgorithm,
    /// Band margin in seconds; converted to a frame delta at runtime.
    pub margin: f64,
    pub distance: Distance,
}

impl Default for DtwConfig {
    fn default() -> Self {
        Self {
            algorithm: DtwAlgorithm::Margin,
            margin: 60.0,
            distance: Distance::Euclidean,
        }
    }
}

impl DtwConfig {
    pub fn validate(&self) -> Result<(), AlignError> {
        if self.algorithm == DtwAlgorithm::Margin && self.margin <= 0.0 {
            return Err(AlignError::configuration(format!(
                "dtw margin must be positive, got {}",
                self.margin
            )));
        }
        Ok(())
    }

    /// Band width in frames for the given window shift.
    pub fn delta_frames(&self, window_shift: f64) -> usize {
        (2.0 * self.margin / window_shift) as usize
    }
}

/// Replacement sentinel: long nonspeech intervals are removed from the
/// output instead of being kept as marker fragments.
pub const NONSPEECH_REMOVE: &str = "REMOVE";

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct AdjustConfig {
    /// One of "auto", "rate", "rateaggressive", "percent", "aftercurrent",
    /// "beforenext", "offset".
    pub algorithm: String,
    /// The algorithm parameter; required by every algorithm except "auto".
    pub value: Option<f64>,
    /// Minimum length in seconds for a nonspeech interval to be treated
    /// as a gap; `None` disables long-nonspeech processing.
    pub nonspeech_min: Option<f64>,
    /// Text of injected nonspeech fragments, or [`NONSPEECH_REMOVE`].
    pub nonspeech_string: Option<String>,
    /// Tolerance when testing whether a boundary falls inside a
    /// nonspeech interval.
    pub nonspeech_tolerance: f64,
    /// When true, zero-length fragments are enlarged to a minimal
    /// duration borrowed from their neighbors.
    pub no_zero: bool,
    /// Minimal duration for the no-zero fixing, in seconds.
    pub no_zero_duration: f64,
}

impl Default for AdjustConfig {
    fn default() -> Self {
        Self {
            algorithm: "auto".to_string(),
            value: None,
            nonspeech_min: None,
            nonspeech_string: None,
            nonspeech_tolerance: 0.030,
            no_zero: false,
            no_zero_duration: 0.001,
        }
    }
}

impl AdjustConfig {
    pub fn validate(&self) -> Result<(), AlignError> {
        self.resolve_algorithm().map(|_| ())
    }

    /// Resolve the algorithm string and its parameter into a typed value.
    /// A missing or out-of-range parameter is a configuration error,
    /// raised here so that partial adjustment can never occur.
    pub fn resolve_algorithm(&self) -> Result<crate::adjust::AdjustAlgorithm, AlignError> {
        use crate::adjust::AdjustAlgorithm;
        let require_value = || {
            self.value.ok_or_else(|| {
                AlignError::configuration(format!(
                    "adjust algorithm '{}' requires a value parameter",
                    self.algorithm
                ))
            })
        };
        match self.algorithm.as_str() {
            "auto" => Ok(AdjustAlgorithm::Auto),
            "offset" => Ok(AdjustAlgorithm::Offset {
                value: require_value()?,
            }),
            "percent" => {
                let value = require_value()?;
                if !(0.0..=100.0).contains(&value) {
                    return Err(AlignError::configuration(format!(
                        "percent value must be in [0, 100], got {value}"
                    )));
                }
                Ok(AdjustAlgorithm::Percent { value })
            }
            "aftercurrent" => Ok(AdjustAlgorithm::AfterCurrent {
                value: require_value()?,
            }),
            "beforenext" => Ok(AdjustAlgorithm::BeforeNext {
                value: require_value()?,
            }),
            "rate" | "rateaggressive" => {
                let max_rate = require_value()?;
                if max_rate <= 0.0 {
                    return Err(AlignError::configuration(format!(
                        "rate value must be positive, got {max_rate}"
                    )));
                }
                Ok(AdjustAlgorithm::Rate {
                    max_rate,
                    aggressive: self.algorithm == "rateaggressive",
                })
            }
            other => Err(AlignError::configuration(format!(
                "unknown adjust algorithm '{other}'"
            ))),
        }
    }
}

/// Parameters of the energy-based nonspeech mask.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    /// Offset above the minimum frame log energy below which a frame is
    /// classified as nonspeech.
    pub log_energy_threshold: f64,
    /// Extend every speech run by this many frames on its left side.
    pub extend_speech_before: usize,
    /// Extend every speech run by this many frames on its right side.
    pub extend_speech_after: usize,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            log_energy_threshold: 0.699,
            extend_speech_before: 0,
            extend_speech_after: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AlignerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mfcc.num_coefficients, 13);
        assert_eq!(config.mfcc.num_filters, 40);
        assert_eq!(config.dtw.algorithm, DtwAlgorithm::Margin);
        assert!(!config.mask_nonspeech);
    }

    #[test]
    fn mfcc_rejects_more_coefficients_than_filters() {
        let config = MfccConfig {
            num_coefficients: 41,
            ..MfccConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AlignError::Configuration { .. })
        ));
    }

    #[test]
    fn mfcc_rejects_non_power_of_two_fft_order() {
        let config = MfccConfig {
            fft_order: 500,
            ..MfccConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn dtw_delta_frames_spans_twice_the_margin() {
        let config = DtwConfig {
            margin: 60.0,
            ..DtwConfig::default()
        };
        assert_eq!(config.delta_frames(0.040), 3000);
    }

    #[test]
    fn adjust_rate_without_value_is_rejected() {
        let config = AdjustConfig {
            algorithm: "rate".to_string(),
            value: None,
            ..AdjustConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AlignError::Configuration { .. })
        ));
    }

    #[test]
    fn adjust_percent_out_of_range_is_rejected() {
        let config = AdjustConfig {
            algorithm: "percent".to_string(),
            value: Some(150.0),
            ..AdjustConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_loads_from_file() {
        let path = std::env::temp_dir().join("dtw_align_rs_config.json");
        std::fs::write(&path, r#"{ "dtw": { "margin": 30.0 } }"#).expect("write config");
        let config = AlignerConfig::load(&path).expect("load config");
        assert_eq!(config.dtw.margin, 30.0);
        assert_eq!(config.mfcc.num_coefficients, 13);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn config_load_fails_on_missing_file() {
        let err = AlignerConfig::load(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(matches!(err, AlignError::Io { .. }));
    }

    #[test]
    fn config_parses_from_json() {
        let json = r#"{
            "mfcc": { "window_length": 0.025, "window_shift": 0.010 },
            "dtw": { "algorithm": "exact" },
            "adjust": { "algorithm": "rate", "value": 14.0 }
        }"#;
        let config: AlignerConfig = serde_json::from_str(json).expect("valid config json");
        assert_eq!(config.mfcc.window_length, 0.025);
        assert_eq!(config.dtw.algorithm, DtwAlgorithm::Exact);
        assert!(config.validate().is_ok());
    }
}

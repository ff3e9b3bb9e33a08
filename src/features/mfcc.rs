use std::f64::consts::PI;

use rustfft::{num_complex::Complex, FftPlanner};

use crate::config::MfccConfig;
use crate::error::AlignError;
use crate::features::filterbank::MelFilterbank;
use crate::features::FeatureMatrix;

/// Floor applied before taking logs, so silence does not produce -inf.
const LOG_FLOOR: f64 = 1e-10;

/// Optional post-processing of the extracted coefficients. Both waves of
/// an alignment go through the same extractor, so the convention always
/// matches between the real and the synthesized feature matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MfccNormalization {
    None,
    /// Subtract the per-coefficient mean over all frames (cepstral mean
    /// subtraction). The energy row is left untouched.
    MeanSubtract,
    /// Scale each frame's coefficient vector to unit L2 norm, energy row
    /// excluded.
    L2,
}

/// Mel-frequency cepstral coefficient extractor.
///
/// Pipeline per frame: pre-emphasis, Hamming window, power spectrum via
/// real FFT at `fft_order`, triangular mel filterbank, natural log,
/// DCT-II. Coefficient 0 is replaced by the frame's total log energy.
/// Output is deterministic for identical input and configuration.
pub struct MfccExtractor {
    config: MfccConfig,
}

impl MfccExtractor {
    pub fn new(config: MfccConfig) -> Result<Self, AlignError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MfccConfig {
        &self.config
    }

    pub fn extract(&self, samples: &[f64], sample_rate: u32) -> Result<FeatureMatrix, AlignError> {
        if samples.is_empty() {
            return Err(AlignError::invalid_audio("sample buffer is empty"));
        }
        if sample_rate == 0 {
            return Err(AlignError::invalid_audio("sample rate must be positive"));
        }

        let cfg = &self.config;
        let window_len = ((cfg.window_length * sample_rate as f64).round() as usize).max(1);
        let window_shift = ((cfg.window_shift * sample_rate as f64).round() as usize).max(1);

        let emphasized = pre_emphasize(samples, cfg.emphasis_factor);

        // A signal shorter than one window still produces exactly one
        // (zero-padded) frame; trailing partial frames are zero-padded too.
        let num_frames = if emphasized.len() <= window_len {
            1
        } else {
            1 + (emphasized.len() - window_len).div_ceil(window_shift)
        };

        let hamming = hamming_window(window_len);
        let filterbank = MelFilterbank::new(
            cfg.num_filters,
            cfg.fft_order,
            sample_rate,
            cfg.lower_frequency,
            cfg.upper_frequency,
        );

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(cfg.fft_order);
        let num_bins = cfg.fft_order / 2 + 1;

        let mut buffer = vec![Complex::new(0.0, 0.0); cfg.fft_order];
        let mut power = vec![0.0f64; num_bins];
        let mut mel_energies = vec![0.0f64; cfg.num_filters];
        let mut coefficients = vec![0.0f64; cfg.num_coefficients];

        let mut features = FeatureMatrix::with_capacity(cfg.num_coefficients, num_frames);
        for frame_index in 0..num_frames {
            let start = frame_index * window_shift;
            let end = (start + window_len).min(emphasized.len());
            let frame = &emphasized[start..end];

            let log_energy = frame
                .iter()
                .map(|&x| x * x)
                .sum::<f64>()
                .max(LOG_FLOOR)
                .ln();

            // Window, truncate to the FFT order, zero-pad the rest.
            buffer.fill(Complex::new(0.0, 0.0));
            for (slot, (&x, &w)) in buffer
                .iter_mut()
                .zip(frame.iter().zip(hamming.iter()))
                .take(cfg.fft_order)
            {
                *slot = Complex::new(x * w, 0.0);
            }
            fft.process(&mut buffer);
            for (bin, p) in power.iter_mut().enumerate() {
                *p = buffer[bin].norm_sqr();
            }

            filterbank.apply(&power, &mut mel_energies);
            for e in mel_energies.iter_mut() {
                *e = e.max(LOG_FLOOR).ln();
            }

            dct_ii(&mel_energies, &mut coefficients);
            coefficients[0] = log_energy;
            features.push_frame(&coefficients);
        }

        normalize(&mut features, cfg.normalization);
        Ok(features)
    }
}

fn normalize(features: &mut FeatureMatrix, mode: MfccNormalization) {
    let num_frames = features.num_frames();
    let num_coefficients = features.num_coefficients();
    match mode {
        MfccNormalization::None => {}
        MfccNormalization::MeanSubtract => {
            let mut means = vec![0.0f64; num_coefficients];
            for frame in features.frames() {
                for (k, &v) in frame.iter().enumerate() {
                    means[k] += v;
                }
            }
            for mean in &mut means {
                *mean /= num_frames as f64;
            }
            for i in 0..num_frames {
                let frame = features.frame_mut(i);
                for k in 1..num_coefficients {
                    frame[k] -= means[k];
                }
            }
        }
        MfccNormalization::L2 => {
            for i in 0..num_frames {
                let frame = features.frame_mut(i);
                let norm = frame[1..]
                    .iter()
                    .map(|x| x * x)
                    .sum::<f64>()
                    .sqrt()
                    .max(1e-12);
                for v in &mut frame[1..] {
                    *v /= norm;
                }
            }
        }
    }
}

fn pre_emphasize(samples: &[f64], factor: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(samples.len());
    let mut prev = 0.0;
    for &x in samples {
        out.push(x - factor * prev);
        prev = x;
    }
    out
}

fn hamming_window(len: usize) -> Vec<f64> {
    if len == 1 {
        return vec![1.0];
    }
    (0..len)
        .map(|n| 0.54 - 0.46 * (2.0 * PI * n as f64 / (len - 1) as f64).cos())
        .collect()
}

/// DCT-II with orthonormal scaling, keeping `out.len()` coefficients.
fn dct_ii(input: &[f64], out: &mut [f64]) {
    let n = input.len() as f64;
    for (k, coeff) in out.iter_mut().enumerate() {
        let sum: f64 = input
            .iter()
            .enumerate()
            .map(|(i, &x)| x * (PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n)).cos())
            .sum();
        let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
        *coeff = sum * scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_sine(seconds: f64, freq: f64, sample_rate: u32) -> Vec<f64> {
        let len = (seconds * sample_rate as f64) as usize;
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f64 / sample_rate as f64).sin())
            .collect()
    }

    fn extractor() -> MfccExtractor {
        MfccExtractor::new(MfccConfig::default()).expect("default config")
    }

    #[test]
    fn rejects_empty_samples() {
        let err = extractor().extract(&[], 16_000).unwrap_err();
        assert!(matches!(err, AlignError::InvalidAudio { .. }));
    }

    #[test]
    fn rejects_zero_sample_rate() {
        let err = extractor().extract(&[0.0; 160], 0).unwrap_err();
        assert!(matches!(err, AlignError::InvalidAudio { .. }));
    }

    #[test]
    fn invalid_config_rejected_at_construction() {
        let config = MfccConfig {
            window_shift: 0.0,
            ..MfccConfig::default()
        };
        assert!(matches!(
            MfccExtractor::new(config),
            Err(AlignError::Configuration { .. })
        ));
    }

    #[test]
    fn signal_shorter_than_window_yields_one_frame() {
        // 10 ms of audio against a 100 ms window
        let samples = make_sine(0.010, 440.0, 16_000);
        let features = extractor().extract(&samples, 16_000).unwrap();
        assert_eq!(features.num_frames(), 1);
        assert_eq!(features.num_coefficients(), 13);
    }

    #[test]
    fn frame_count_matches_window_and_shift() {
        // 1 s at the default 100 ms / 40 ms framing:
        // 1 + ceil((16000 - 1600) / 640) = 1 + 23
        let samples = make_sine(1.0, 440.0, 16_000);
        let features = extractor().extract(&samples, 16_000).unwrap();
        assert_eq!(features.num_frames(), 24);
    }

    #[test]
    fn extraction_is_deterministic() {
        let samples = make_sine(0.5, 440.0, 16_000);
        let a = extractor().extract(&samples, 16_000).unwrap();
        let b = extractor().extract(&samples, 16_000).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn mean_subtraction_centers_coefficients() {
        let samples = make_sine(1.0, 440.0, 16_000);
        let config = MfccConfig {
            normalization: MfccNormalization::MeanSubtract,
            ..MfccConfig::default()
        };
        let features = MfccExtractor::new(config).unwrap().extract(&samples, 16_000).unwrap();
        for k in 1..features.num_coefficients() {
            let mean: f64 = features.frames().map(|f| f[k]).sum::<f64>()
                / features.num_frames() as f64;
            assert!(mean.abs() < 1e-9, "coefficient {k} not centered: {mean}");
        }
    }

    #[test]
    fn l2_normalization_gives_unit_columns() {
        let samples = make_sine(1.0, 440.0, 16_000);
        let config = MfccConfig {
            normalization: MfccNormalization::L2,
            ..MfccConfig::default()
        };
        let features = MfccExtractor::new(config).unwrap().extract(&samples, 16_000).unwrap();
        for frame in features.frames() {
            let norm: f64 = frame[1..].iter().map(|x| x * x).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn louder_frames_have_higher_energy() {
        let mut samples = make_sine(1.0, 440.0, 16_000);
        let half = samples.len() / 2;
        for x in samples.iter_mut().take(half) {
            *x *= 0.01;
        }
        let features = extractor().extract(&samples, 16_000).unwrap();
        let n = features.num_frames();
        assert!(features.energy(2) < features.energy(n - 4));
    }
}

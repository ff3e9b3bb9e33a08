use crate::config::MaskConfig;
use crate::features::FeatureMatrix;
use crate::types::Interval;

/// Frame-level nonspeech classification derived from log energy.
///
/// `true` marks a nonspeech frame. Used by the boundary adjuster, and by
/// the DTW stage only when mask excision is enabled.
#[derive(Debug, Clone)]
pub struct NonspeechMask {
    mask: Vec<bool>,
}

/// Classify frames by energy threshold, then extend every speech run by
/// the configured number of frames on each side.
pub fn compute_mask(features: &FeatureMatrix, config: &MaskConfig) -> NonspeechMask {
    let num_frames = features.num_frames();
    if num_frames == 0 {
        return NonspeechMask { mask: Vec::new() };
    }

    let min_energy = (0..num_frames)
        .map(|i| features.energy(i))
        .fold(f64::INFINITY, f64::min);
    let threshold = min_energy + config.log_energy_threshold;

    let mut speech: Vec<bool> = (0..num_frames)
        .map(|i| features.energy(i) >= threshold)
        .collect();

    if config.extend_speech_before > 0 || config.extend_speech_after > 0 {
        let original = speech.clone();
        for (i, &is_speech) in original.iter().enumerate() {
            if !is_speech {
                continue;
            }
            let lo = i.saturating_sub(config.extend_speech_before);
            let hi = (i + config.extend_speech_after).min(num_frames - 1);
            for s in speech.iter_mut().take(hi + 1).skip(lo) {
                *s = true;
            }
        }
    }

    NonspeechMask {
        mask: speech.into_iter().map(|s| !s).collect(),
    }
}

impl NonspeechMask {
    pub fn len(&self) -> usize {
        self.mask.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    pub fn is_nonspeech(&self, frame: usize) -> bool {
        self.mask[frame]
    }

    /// Indices of speech frames, in order.
    pub fn speech_frames(&self) -> Vec<usize> {
        self.mask
            .iter()
            .enumerate()
            .filter(|(_, &m)| !m)
            .map(|(i, _)| i)
            .collect()
    }

    /// Maximal nonspeech runs as time intervals, keeping only runs of at
    /// least `min_length` seconds when a minimum is given.
    pub fn nonspeech_intervals(&self, window_shift: f64, min_length: Option<f64>) -> Vec<Interval> {
        let mut intervals = Vec::new();
        let mut run_start: Option<usize> = None;
        for (i, &nonspeech) in self.mask.iter().enumerate() {
            match (nonspeech, run_start) {
                (true, None) => run_start = Some(i),
                (false, Some(start)) => {
                    intervals.push(Interval::new(
                        start as f64 * window_shift,
                        i as f64 * window_shift,
                    ));
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = run_start {
            intervals.push(Interval::new(
                start as f64 * window_shift,
                self.mask.len() as f64 * window_shift,
            ));
        }
        if let Some(min) = min_length {
            intervals.retain(|i| i.length() >= min);
        }
        intervals
    }
}

/// Excise nonspeech frames from a feature matrix.
///
/// Returns the reduced matrix and the map from reduced frame index back
/// to the original frame index, used to translate DTW path indices.
pub fn excise_nonspeech(
    features: &FeatureMatrix,
    mask: &NonspeechMask,
) -> (FeatureMatrix, Vec<usize>) {
    let keep = mask.speech_frames();
    (features.select_frames(&keep), keep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MaskConfig;

    fn matrix_with_energies(energies: &[f64]) -> FeatureMatrix {
        let mut m = FeatureMatrix::with_capacity(2, energies.len());
        for &e in energies {
            m.push_frame(&[e, 0.0]);
        }
        m
    }

    #[test]
    fn quiet_frames_are_nonspeech() {
        let m = matrix_with_energies(&[-10.0, -10.0, -2.0, -2.0, -10.0]);
        let mask = compute_mask(&m, &MaskConfig::default());
        assert!(mask.is_nonspeech(0));
        assert!(mask.is_nonspeech(1));
        assert!(!mask.is_nonspeech(2));
        assert!(!mask.is_nonspeech(3));
        assert!(mask.is_nonspeech(4));
    }

    #[test]
    fn extension_grows_speech_runs() {
        let m = matrix_with_energies(&[-10.0, -10.0, -2.0, -10.0, -10.0]);
        let config = MaskConfig {
            extend_speech_before: 1,
            extend_speech_after: 1,
            ..MaskConfig::default()
        };
        let mask = compute_mask(&m, &config);
        assert!(mask.is_nonspeech(0));
        assert!(!mask.is_nonspeech(1));
        assert!(!mask.is_nonspeech(2));
        assert!(!mask.is_nonspeech(3));
        assert!(mask.is_nonspeech(4));
    }

    #[test]
    fn nonspeech_intervals_respect_min_length() {
        let m = matrix_with_energies(&[-10.0, -2.0, -10.0, -10.0, -10.0, -2.0]);
        let mask = compute_mask(&m, &MaskConfig::default());
        let all = mask.nonspeech_intervals(0.040, None);
        assert_eq!(all.len(), 2);
        let long = mask.nonspeech_intervals(0.040, Some(0.100));
        assert_eq!(long.len(), 1);
        assert_eq!(long[0].begin, 0.080);
        assert_eq!(long[0].end, 0.200);
    }

    #[test]
    fn excision_maps_back_to_original_indices() {
        let m = matrix_with_energies(&[-10.0, -2.0, -2.0, -10.0, -2.0]);
        let mask = compute_mask(&m, &MaskConfig::default());
        let (reduced, map) = excise_nonspeech(&m, &mask);
        assert_eq!(reduced.num_frames(), 3);
        assert_eq!(map, vec![1, 2, 4]);
    }
}

/// Triangular mel-scale filterbank applied to a one-sided power spectrum.
///
/// Filters are precomputed as dense per-bin weight rows spanning
/// `[lower_frequency, upper_frequency]`, the upper bound clamped to the
/// Nyquist frequency.
pub struct MelFilterbank {
    weights: Vec<Vec<f64>>,
}

impl MelFilterbank {
    pub fn new(
        num_filters: usize,
        fft_order: usize,
        sample_rate: u32,
        lower_frequency: f64,
        upper_frequency: f64,
    ) -> Self {
        let num_bins = fft_order / 2 + 1;
        let nyquist = sample_rate as f64 / 2.0;
        let upper = upper_frequency.min(nyquist);
        let mel_low = hz_to_mel(lower_frequency);
        let mel_high = hz_to_mel(upper);

        // num_filters + 2 equally spaced mel points give num_filters triangles.
        let hz_points: Vec<f64> = (0..num_filters + 2)
            .map(|i| {
                mel_to_hz(mel_low + (mel_high - mel_low) * i as f64 / (num_filters + 1) as f64)
            })
            .collect();
        let bin_hz = sample_rate as f64 / fft_order as f64;

        let mut weights = vec![vec![0.0; num_bins]; num_filters];
        for (f, row) in weights.iter_mut().enumerate() {
            let start = hz_points[f];
            let center = hz_points[f + 1];
            let end = hz_points[f + 2];
            for (bin, w) in row.iter_mut().enumerate() {
                let freq = bin as f64 * bin_hz;
                if freq >= start && freq < center && center > start {
                    *w = (freq - start) / (center - start);
                } else if freq >= center && freq <= end && end > center {
                    *w = (end - freq) / (end - center);
                }
            }
        }

        Self { weights }
    }

    pub fn num_filters(&self) -> usize {
        self.weights.len()
    }

    /// Per-filter energies for one power spectrum frame.
    pub fn apply(&self, power_spectrum: &[f64], out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.weights.len());
        for (energy, row) in out.iter_mut().zip(&self.weights) {
            *energy = row
                .iter()
                .zip(power_spectrum.iter())
                .map(|(w, p)| w * p)
                .sum();
        }
    }
}

#[inline]
fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

#[inline]
fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mel_scale_round_trips() {
        for hz in [133.3333, 1000.0, 6855.4976] {
            let back = mel_to_hz(hz_to_mel(hz));
            assert!((back - hz).abs() < 1e-6, "round trip failed for {hz}");
        }
    }

    #[test]
    fn filterbank_has_expected_shape() {
        let fb = MelFilterbank::new(40, 512, 16_000, 133.3333, 6855.4976);
        assert_eq!(fb.num_filters(), 40);
        assert_eq!(fb.weights[0].len(), 257);
    }

    #[test]
    fn filters_respond_inside_their_band_only() {
        let fb = MelFilterbank::new(10, 256, 16_000, 0.0, 8000.0);
        // a flat spectrum excites every filter
        let spectrum = vec![1.0; 129];
        let mut energies = vec![0.0; 10];
        fb.apply(&spectrum, &mut energies);
        assert!(energies.iter().all(|&e| e > 0.0));
    }

    #[test]
    fn upper_frequency_clamped_to_nyquist() {
        // requesting a band above Nyquist must not index past the spectrum
        let fb = MelFilterbank::new(8, 128, 8_000, 100.0, 20_000.0);
        let spectrum = vec![1.0; 65];
        let mut energies = vec![0.0; 8];
        fb.apply(&spectrum, &mut energies);
        assert!(energies.iter().all(|e| e.is_finite()));
    }
}

pub mod fragment_list;

pub use fragment_list::{FragmentList, ListFragment};

use crate::config::{AdjustConfig, NONSPEECH_REMOVE};
use crate::error::AlignError;
use crate::types::{Fragment, Interval};

/// Boundary adjustment algorithm with its resolved parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdjustAlgorithm {
    Auto,
    Offset { value: f64 },
    Percent { value: f64 },
    AfterCurrent { value: f64 },
    BeforeNext { value: f64 },
    Rate { max_rate: f64, aggressive: bool },
}

/// Post-processes the raw DTW fragment boundaries.
///
/// Phase order: zero-length fixing, long-nonspeech injection, the
/// selected algorithm, then smoothing (pinning the list extremes to the
/// audio range and dropping nonspeech markers as configured). The
/// configuration is resolved before the first mutation, so a bad
/// parameter can never leave a partially adjusted list.
pub struct BoundaryAdjuster {
    config: AdjustConfig,
}

impl BoundaryAdjuster {
    pub fn new(config: AdjustConfig) -> Result<Self, AlignError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// `time_values` holds the head begin, the `k + 1` raw boundaries and
    /// the audio end; `nonspeech` the masked intervals of the real wave.
    pub fn adjust(
        &self,
        fragments: &[Fragment],
        time_values: &[f64],
        nonspeech: &[Interval],
        window_shift: f64,
        audio_length: f64,
    ) -> Result<FragmentList, AlignError> {
        let algorithm = self.config.resolve_algorithm()?;
        let mut list = FragmentList::from_time_values(fragments, time_values)?;

        self.process_zero_length(&mut list, window_shift);
        self.process_long_nonspeech(&mut list, nonspeech);

        tracing::debug!(?algorithm, "adjusting boundaries");
        match algorithm {
            AdjustAlgorithm::Auto => {}
            AdjustAlgorithm::Offset { value } => list.offset(value),
            AdjustAlgorithm::Percent { value } => {
                // Interpolate from the raw boundary toward the next
                // speech onset: value 0 must be an exact no-op and value
                // 100 anchors at the nonspeech interval's end.
                self.adjust_on_nonspeech(&mut list, nonspeech, |end, nsi| {
                    end + (nsi.end - end) * value / 100.0
                });
            }
            AdjustAlgorithm::AfterCurrent { value } => {
                self.adjust_on_nonspeech(&mut list, nonspeech, |_, nsi| {
                    (nsi.begin + value.max(0.0)).min(nsi.end)
                });
            }
            AdjustAlgorithm::BeforeNext { value } => {
                self.adjust_on_nonspeech(&mut list, nonspeech, |_, nsi| {
                    (nsi.end - value.max(0.0)).max(nsi.begin)
                });
            }
            AdjustAlgorithm::Rate { max_rate, aggressive } => {
                self.apply_rate(&mut list, max_rate, aggressive);
            }
        }

        self.smooth(&mut list, audio_length);
        Ok(list)
    }

    fn process_zero_length(&self, list: &mut FragmentList, window_shift: f64) {
        if !self.config.no_zero {
            return;
        }
        // the effective duration is a whole number of window shifts
        let duration = (self.config.no_zero_duration / window_shift).ceil() * window_shift;
        let max_index = list.len() - 1;
        list.fix_zero_length_fragments(duration, 1, max_index);
        if list.has_zero_length_fragments(1, max_index) {
            tracing::warn!("fragment list still has zero-length fragments after fixing");
        }
    }

    fn process_long_nonspeech(&self, list: &mut FragmentList, nonspeech: &[Interval]) {
        let Some(ns_min) = self.config.nonspeech_min else {
            return;
        };
        let long: Vec<Interval> = nonspeech
            .iter()
            .filter(|i| i.length() >= ns_min)
            .copied()
            .collect();
        let max_index = list.len() - 1;
        let pairs: Vec<_> = list
            .fragments_ending_inside_nonspeech(&long, self.config.nonspeech_tolerance)
            .into_iter()
            .filter(|&(_, i)| i >= 1 && i < max_index)
            .collect();
        list.inject_nonspeech_fragments(&pairs);
    }

    /// Apply `new_time(current_end, nonspeech_interval)` to every
    /// boundary falling inside a nonspeech interval. An interval with two
    /// or more boundaries inside it is skipped, and the final boundary is
    /// never moved.
    fn adjust_on_nonspeech(
        &self,
        list: &mut FragmentList,
        nonspeech: &[Interval],
        new_time: impl Fn(f64, &Interval) -> f64,
    ) {
        let pairs = list.fragments_ending_inside_nonspeech(nonspeech, self.config.nonspeech_tolerance);
        for (nsi, index) in pairs {
            let value = new_time(list.get(index).interval.end, &nsi);
            list.move_transition_point(index, value);
        }
    }

    fn apply_rate(&self, list: &mut FragmentList, max_rate: f64, aggressive: bool) {
        let faster: Vec<usize> = list
            .regular_fragments()
            .filter(|(_, f)| f.rate().is_some_and(|r| r >= max_rate + 0.001))
            .map(|(i, _)| i)
            .collect();
        if faster.is_empty() {
            return;
        }
        tracing::warn!(
            fragments = ?faster,
            max_rate,
            "fragments exceed the maximum character rate"
        );
        for index in &faster {
            list.fix_fragment_rate(*index, max_rate, aggressive);
        }
        let still_faster: Vec<usize> = list
            .regular_fragments()
            .filter(|(_, f)| f.rate().is_some_and(|r| r >= max_rate + 0.001))
            .map(|(i, _)| i)
            .collect();
        if !still_faster.is_empty() {
            tracing::warn!(
                fragments = ?still_faster,
                max_rate,
                "fragments still exceed the maximum character rate after adjustment"
            );
        }
    }

    fn smooth(&self, list: &mut FragmentList, audio_length: f64) {
        list.pin_extremes(0.0, audio_length);
        let keep_markers = self
            .config
            .nonspeech_string
            .as_deref()
            .is_some_and(|s| s != NONSPEECH_REMOVE);
        list.remove_nonspeech_fragments(keep_markers);
    }
}

use std::thread;

use crate::adjust::FragmentList;
use crate::alignment::boundaries::{compute_boundaries, fallback_boundaries, synth_anchors};
use crate::config::AlignerConfig;
use crate::error::AlignError;
use crate::features::mask::{compute_mask, excise_nonspeech};
use crate::pipeline::traits::{BoundaryPolicy, FeatureExtractor, SequenceAligner};
use crate::types::{AlignmentInput, FragmentKind, SyncMap, TimedFragment};

/// End-to-end forced aligner: real and synthesized waves in, sync map
/// out. Each call owns its buffers; an aligner can serve calls from
/// multiple threads.
pub struct SyncAligner {
    config: AlignerConfig,
    window_shift: f64,
    feature_extractor: Box<dyn FeatureExtractor>,
    sequence_aligner: Box<dyn SequenceAligner>,
    boundary_policy: Box<dyn BoundaryPolicy>,
}

pub(crate) struct SyncAlignerParts {
    pub config: AlignerConfig,
    pub window_shift: f64,
    pub feature_extractor: Box<dyn FeatureExtractor>,
    pub sequence_aligner: Box<dyn SequenceAligner>,
    pub boundary_policy: Box<dyn BoundaryPolicy>,
}

impl SyncAligner {
    pub(crate) fn from_parts(parts: SyncAlignerParts) -> Self {
        Self {
            config: parts.config,
            window_shift: parts.window_shift,
            feature_extractor: parts.feature_extractor,
            sequence_aligner: parts.sequence_aligner,
            boundary_policy: parts.boundary_policy,
        }
    }

    pub fn align(&self, input: &AlignmentInput) -> Result<SyncMap, AlignError> {
        if input.samples.is_empty() {
            return Err(AlignError::invalid_audio("real sample buffer is empty"));
        }
        if input.sample_rate_hz == 0 {
            return Err(AlignError::invalid_audio("sample rate must be positive"));
        }
        if input.synth_samples.is_empty() {
            return Err(AlignError::invalid_audio(
                "synthesized sample buffer is empty",
            ));
        }
        if input.fragments.is_empty() {
            return Err(AlignError::configuration("no fragments to align"));
        }

        let audio_length = input.samples.len() as f64 / input.sample_rate_hz as f64;
        let reported: f64 = input.fragments.iter().map(|f| f.synth_duration).sum();
        let synth_length = input.synth_samples.len() as f64 / input.sample_rate_hz as f64;
        if (reported - synth_length).abs() > self.config.mfcc.window_length {
            tracing::warn!(
                reported_s = reported,
                synth_wave_s = synth_length,
                "reported fragment durations disagree with the synthesized wave"
            );
        }

        // The two extractions are independent; run them side by side.
        let (real_features, synth_features) = thread::scope(|scope| {
            let real = scope.spawn(|| {
                self.feature_extractor
                    .extract(&input.samples, input.sample_rate_hz)
            });
            let synth = self
                .feature_extractor
                .extract(&input.synth_samples, input.sample_rate_hz);
            let real = real.join().expect("feature extraction thread panicked");
            real.and_then(|real| synth.map(|synth| (real, synth)))
        })?;

        let real_mask = compute_mask(&real_features, &self.config.mask);
        let nonspeech = real_mask.nonspeech_intervals(self.window_shift, None);
        let anchors = synth_anchors(&input.fragments);
        let tail_frame = real_features.num_frames();

        let boundary_frames = if self.config.mask_nonspeech {
            let synth_mask = compute_mask(&synth_features, &self.config.mask);
            let (real_masked, real_map) = excise_nonspeech(&real_features, &real_mask);
            let (synth_masked, synth_map) = excise_nonspeech(&synth_features, &synth_mask);
            if real_masked.num_frames() == 0 || synth_masked.num_frames() == 0 {
                tracing::warn!("masking removed every frame, using evenly spaced boundaries");
                fallback_boundaries(tail_frame, input.fragments.len())
            } else {
                let path = self
                    .sequence_aligner
                    .align_path(&real_masked, &synth_masked)?;
                // back to full-wave indices; the path must still cover
                // the signal from its very first frame
                let mut translated: Vec<(usize, usize)> = path
                    .iter()
                    .map(|&(i, j)| (real_map[i], synth_map[j]))
                    .collect();
                if let Some(first) = translated.first_mut() {
                    first.0 = 0;
                }
                compute_boundaries(&translated, &anchors, self.window_shift, tail_frame)
            }
        } else {
            let path = self
                .sequence_aligner
                .align_path(&real_features, &synth_features)?;
            compute_boundaries(&path, &anchors, self.window_shift, tail_frame)
        };

        let mut time_values = Vec::with_capacity(boundary_frames.len() + 2);
        time_values.push(0.0);
        time_values.extend(
            boundary_frames
                .iter()
                .map(|&frame| (frame as f64 * self.window_shift).min(audio_length)),
        );
        time_values.push(audio_length);

        let list = self.boundary_policy.adjust(
            &input.fragments,
            &time_values,
            &nonspeech,
            self.window_shift,
            audio_length,
        )?;
        Ok(to_sync_map(&list))
    }
}

/// Zero-length HEAD/TAIL sentinels are dropped; everything else is kept
/// so the map covers the full audio range.
fn to_sync_map(list: &FragmentList) -> SyncMap {
    let fragments = list
        .fragments()
        .filter(|f| {
            !(matches!(f.kind, FragmentKind::Head | FragmentKind::Tail)
                && f.interval.has_zero_length())
        })
        .map(|f| TimedFragment {
            id: f.id.clone(),
            kind: f.kind,
            interval: f.interval,
        })
        .collect();
    SyncMap { fragments }
}

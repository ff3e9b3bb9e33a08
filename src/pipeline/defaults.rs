use crate::adjust::{BoundaryAdjuster, FragmentList};
use crate::alignment::dtw::{compute_path, Distance, DtwAlgorithm};
use crate::config::{AdjustConfig, DtwConfig, MfccConfig};
use crate::error::AlignError;
use crate::features::{FeatureMatrix, MfccExtractor};
use crate::pipeline::traits::{BoundaryPolicy, FeatureExtractor, SequenceAligner};
use crate::types::{Fragment, Interval};

pub struct MfccFeatureExtractor {
    inner: MfccExtractor,
}

impl MfccFeatureExtractor {
    pub fn new(config: MfccConfig) -> Result<Self, AlignError> {
        Ok(Self {
            inner: MfccExtractor::new(config)?,
        })
    }
}

impl FeatureExtractor for MfccFeatureExtractor {
    fn extract(&self, samples: &[f64], sample_rate_hz: u32) -> Result<FeatureMatrix, AlignError> {
        self.inner.extract(samples, sample_rate_hz)
    }
}

pub struct DtwSequenceAligner {
    algorithm: DtwAlgorithm,
    delta: usize,
    distance: Distance,
}

impl DtwSequenceAligner {
    pub fn new(config: &DtwConfig, window_shift: f64) -> Self {
        Self {
            algorithm: config.algorithm,
            delta: config.delta_frames(window_shift),
            distance: config.distance,
        }
    }
}

impl SequenceAligner for DtwSequenceAligner {
    fn align_path(
        &self,
        real: &FeatureMatrix,
        synth: &FeatureMatrix,
    ) -> Result<Vec<(usize, usize)>, AlignError> {
        compute_path(real, synth, self.algorithm, self.delta, self.distance)
    }
}

pub struct DefaultBoundaryPolicy {
    inner: BoundaryAdjuster,
}

impl DefaultBoundaryPolicy {
    pub fn new(config: AdjustConfig) -> Result<Self, AlignError> {
        Ok(Self {
            inner: BoundaryAdjuster::new(config)?,
        })
    }
}

impl BoundaryPolicy for DefaultBoundaryPolicy {
    fn adjust(
        &self,
        fragments: &[Fragment],
        time_values: &[f64],
        nonspeech: &[Interval],
        window_shift: f64,
        audio_length: f64,
    ) -> Result<FragmentList, AlignError> {
        self.inner
            .adjust(fragments, time_values, nonspeech, window_shift, audio_length)
    }
}

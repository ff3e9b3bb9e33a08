use crate::adjust::FragmentList;
use crate::error::AlignError;
use crate::features::FeatureMatrix;
use crate::types::{Fragment, Interval};

/// Turns a PCM sample buffer into a feature matrix.
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, samples: &[f64], sample_rate_hz: u32) -> Result<FeatureMatrix, AlignError>;
}

/// Finds the minimum-cost monotonic path between two feature sequences.
pub trait SequenceAligner: Send + Sync {
    fn align_path(
        &self,
        real: &FeatureMatrix,
        synth: &FeatureMatrix,
    ) -> Result<Vec<(usize, usize)>, AlignError>;
}

/// Post-processes raw fragment boundaries into the final fragment list.
pub trait BoundaryPolicy: Send + Sync {
    fn adjust(
        &self,
        fragments: &[Fragment],
        time_values: &[f64],
        nonspeech: &[Interval],
        window_shift: f64,
        audio_length: f64,
    ) -> Result<FragmentList, AlignError>;
}

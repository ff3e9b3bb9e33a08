use crate::config::AlignerConfig;
use crate::error::AlignError;
use crate::pipeline::defaults::{DefaultBoundaryPolicy, DtwSequenceAligner, MfccFeatureExtractor};
use crate::pipeline::runtime::{SyncAligner, SyncAlignerParts};
use crate::pipeline::traits::{BoundaryPolicy, FeatureExtractor, SequenceAligner};

/// Builds a [`SyncAligner`], with optional strategy overrides at each
/// seam of the pipeline. Configuration is validated once, here, before
/// any computation can start.
pub struct SyncAlignerBuilder {
    config: AlignerConfig,
    feature_extractor: Option<Box<dyn FeatureExtractor>>,
    sequence_aligner: Option<Box<dyn SequenceAligner>>,
    boundary_policy: Option<Box<dyn BoundaryPolicy>>,
}

impl SyncAlignerBuilder {
    pub fn new(config: AlignerConfig) -> Self {
        Self {
            config,
            feature_extractor: None,
            sequence_aligner: None,
            boundary_policy: None,
        }
    }

    pub fn with_feature_extractor(mut self, feature_extractor: Box<dyn FeatureExtractor>) -> Self {
        self.feature_extractor = Some(feature_extractor);
        self
    }

    pub fn with_sequence_aligner(mut self, sequence_aligner: Box<dyn SequenceAligner>) -> Self {
        self.sequence_aligner = Some(sequence_aligner);
        self
    }

    pub fn with_boundary_policy(mut self, boundary_policy: Box<dyn BoundaryPolicy>) -> Self {
        self.boundary_policy = Some(boundary_policy);
        self
    }

    pub fn build(self) -> Result<SyncAligner, AlignError> {
        self.config.validate()?;
        let window_shift = self.config.mfcc.window_shift;

        let feature_extractor: Box<dyn FeatureExtractor> = match self.feature_extractor {
            Some(feature_extractor) => feature_extractor,
            None => Box::new(MfccFeatureExtractor::new(self.config.mfcc.clone())?),
        };
        let sequence_aligner: Box<dyn SequenceAligner> = match self.sequence_aligner {
            Some(sequence_aligner) => sequence_aligner,
            None => Box::new(DtwSequenceAligner::new(&self.config.dtw, window_shift)),
        };
        let boundary_policy: Box<dyn BoundaryPolicy> = match self.boundary_policy {
            Some(boundary_policy) => boundary_policy,
            None => Box::new(DefaultBoundaryPolicy::new(self.config.adjust.clone())?),
        };

        Ok(SyncAligner::from_parts(SyncAlignerParts {
            config: self.config,
            window_shift,
            feature_extractor,
            sequence_aligner,
            boundary_policy,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AdjustConfig, MfccConfig};

    #[test]
    fn build_succeeds_with_default_config() {
        let aligner = SyncAlignerBuilder::new(AlignerConfig::default()).build();
        assert!(aligner.is_ok());
    }

    #[test]
    fn build_fails_on_invalid_mfcc_config() {
        let config = AlignerConfig {
            mfcc: MfccConfig {
                window_length: -1.0,
                ..MfccConfig::default()
            },
            ..AlignerConfig::default()
        };
        let result = SyncAlignerBuilder::new(config).build();
        assert!(matches!(result, Err(AlignError::Configuration { .. })));
    }

    #[test]
    fn build_fails_on_missing_adjust_parameter() {
        let config = AlignerConfig {
            adjust: AdjustConfig {
                algorithm: "percent".to_string(),
                value: None,
                ..AdjustConfig::default()
            },
            ..AlignerConfig::default()
        };
        let result = SyncAlignerBuilder::new(config).build();
        assert!(matches!(result, Err(AlignError::Configuration { .. })));
    }
}

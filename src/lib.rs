pub mod adjust;
pub mod alignment;
pub mod config;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod types;

pub use adjust::{AdjustAlgorithm, BoundaryAdjuster};
pub use alignment::dtw::{Distance, DtwAlgorithm};
pub use config::{AdjustConfig, AlignerConfig, DtwConfig, MaskConfig, MfccConfig};
pub use error::AlignError;
pub use features::{FeatureMatrix, MfccExtractor, MfccNormalization};
pub use pipeline::builder::SyncAlignerBuilder;
pub use pipeline::runtime::SyncAligner;
pub use pipeline::traits::{BoundaryPolicy, FeatureExtractor, SequenceAligner};
pub use types::{AlignmentInput, Fragment, FragmentKind, Interval, SyncMap, TimedFragment};

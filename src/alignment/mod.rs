pub mod boundaries;
pub mod dtw;

pub use dtw::{compute_path, Distance, DtwAlgorithm};

pub mod loudness;
pub mod penalty;
pub mod weighting;

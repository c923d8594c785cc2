pub mod analysis;
pub mod config;
pub mod decoding;
pub mod effects;
pub mod errors;
pub mod output;
pub mod playback;
pub mod processor;
pub mod types;

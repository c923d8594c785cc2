use std::collections::HashMap;

use rayon::prelude::*;

use crate::audio::analysis::loudness::{KWeightedMeter, MeterBackend};
use crate::audio::analysis::penalty;
use crate::audio::decoding;
use crate::audio::errors::AudioProcessorError;
use crate::audio::types::AnalysisResult;

/// Decodes a file and measures it with the built-in K-weighted meter.
pub fn analyze_file(path: &str) -> Result<AnalysisResult, AudioProcessorError> {
    analyze_file_with_backend(path, &KWeightedMeter::new())
}

/// Decodes a file and measures it with the given backend. The whole pipeline
/// runs synchronously and may block for the duration of the buffer; callers
/// with long recordings should wrap this in a blocking task.
pub fn analyze_file_with_backend(
    path: &str,
    meter: &dyn MeterBackend,
) -> Result<AnalysisResult, AudioProcessorError> {
    log::info!("Analysis: Starting loudness analysis for: {}", path);
    let decoded =
        decoding::decode_file(path).map_err(|e| AudioProcessorError::AnalysisDecodingError {
            path: path.to_string(),
            source: e,
        })?;
    let integrated_lufs = meter
        .measure(&decoded.channels, decoded.sample_rate)
        .map_err(|e| AudioProcessorError::AnalysisLoudnessError {
            path: path.to_string(),
            source: e,
        })?;
    log::info!(
        "Analysis: '{}' measured at {:.2} LUFS ({:.1}s, {} Hz)",
        path,
        integrated_lufs,
        decoded.duration_seconds(),
        decoded.sample_rate
    );
    Ok(AnalysisResult {
        integrated_lufs,
        penalties: penalty::penalties(integrated_lufs),
        duration_seconds: decoded.duration_seconds(),
        sample_rate: decoded.sample_rate,
    })
}

/// Analyzes many files in parallel; each path maps to its own result so one
/// bad file never sinks the batch.
pub fn analyze_files_batch(paths: Vec<String>) -> HashMap<String, Result<AnalysisResult, String>> {
    log::info!(
        "Analysis Batch: Starting batch analysis for {} files",
        paths.len()
    );
    let results: HashMap<String, Result<AnalysisResult, String>> = paths
        .par_iter()
        .map(|path| match analyze_file(path) {
            Ok(result) => (path.clone(), Ok(result)),
            Err(e) => {
                log::error!("Loudness analysis failed for path '{}': {}", path, e);
                (path.clone(), Err(e.to_string()))
            }
        })
        .collect();
    log::info!("Analysis Batch: Finished batch analysis.");
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_surfaces_decoding_error() {
        let result = analyze_file("/nonexistent/missing.flac");
        assert!(matches!(
            result,
            Err(AudioProcessorError::AnalysisDecodingError { .. })
        ));
    }

    #[test]
    fn batch_reports_per_path_failures() {
        let results = analyze_files_batch(vec!["/nonexistent/a.wav".to_string()]);
        assert_eq!(results.len(), 1);
        assert!(results["/nonexistent/a.wav"].is_err());
    }
}

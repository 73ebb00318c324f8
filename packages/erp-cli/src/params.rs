use std::path::{Path, PathBuf};

use erp_rs::types::Recording;
use erp_rs::{dataset, EdfReader};

/// Resolve the input recording: an explicit path, or the bundled
/// sample dataset (generated on first use).
pub fn resolve_input(file: &Option<String>) -> Result<PathBuf, String> {
    match file {
        Some(path) => {
            validate_file(path)?;
            Ok(PathBuf::from(path))
        }
        None => dataset::sample_data_path().map_err(|e| e.to_string()),
    }
}

/// Validate a single file path: existence and supported extension.
pub fn validate_file(file_path: &str) -> Result<(), String> {
    if !Path::new(file_path).exists() {
        return Err(format!("Input file not found: {}", file_path));
    }

    let ext = Path::new(file_path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    if !ext.eq_ignore_ascii_case("edf") {
        return Err(format!(
            "Unsupported file extension '{}'. Supported: edf",
            ext
        ));
    }

    Ok(())
}

/// Validate demo parameters shared across the pipeline stages.
pub fn validate_demo_params(
    low: f64,
    high: f64,
    order: usize,
    tmin: f64,
    tmax: f64,
    label: &str,
) -> Result<(), String> {
    if low <= 0.0 {
        return Err(format!("Low cutoff (--low) must be positive, got {}", low));
    }
    if low >= high {
        return Err(format!(
            "Low cutoff ({}) must be below high cutoff ({})",
            low, high
        ));
    }
    if order == 0 || order > 8 {
        return Err(format!(
            "Filter order (--order) must be in 1..=8, got {}",
            order
        ));
    }
    if tmin >= tmax {
        return Err(format!(
            "Epoch start ({}) must be below epoch end ({})",
            tmin, tmax
        ));
    }
    if label.is_empty() {
        return Err("Condition label (--label) must not be empty".to_string());
    }
    Ok(())
}

/// Open an EDF file and load it fully into memory.
pub fn load_recording(path: &Path) -> Result<Recording, String> {
    EdfReader::open(path)
        .and_then(|mut reader| reader.read_recording())
        .map_err(|e| e.to_string())
}

//! Sample dataset helper.
//!
//! The demo pipeline runs against a small audiovisual recording. The
//! file is resolved from `$ERP_SAMPLE_PATH` or the platform data
//! directory, and synthesized deterministically on first use so the
//! demo works offline.

use std::f64::consts::PI;
use std::path::PathBuf;

use crate::edf::{EdfSignalHeader, EdfWriter};
use crate::error::{ErpError, Result};

pub const SAMPLE_FILE_NAME: &str = "sample_audvis.edf";
pub const SAMPLE_STIM_CHANNEL: &str = "STI 014";
pub const SAMPLE_PATH_ENV: &str = "ERP_SAMPLE_PATH";

const SFREQ: usize = 256;
const N_RECORDS: usize = 60;
const N_EEG_CHANNELS: usize = 10;

/// Events every two seconds, offset into the record so that a
/// -0.2..0.5 s epoch window always fits. Codes cycle 1..=4.
const EVENT_SPACING: usize = 2 * SFREQ;
const EVENT_OFFSET: usize = SFREQ;
const STIM_PULSE_SAMPLES: usize = 10;

/// Resolve the sample recording, generating it if it does not exist.
///
/// `$ERP_SAMPLE_PATH` overrides the location; otherwise the file lives
/// under the platform data directory (`~/.local/share/erp-rs` on
/// Linux).
pub fn sample_data_path() -> Result<PathBuf> {
    let path = match std::env::var(SAMPLE_PATH_ENV) {
        Ok(custom) => PathBuf::from(custom),
        Err(_) => {
            let base = dirs::data_dir()
                .ok_or_else(|| {
                    ErpError::InvalidParameter(
                        "No data directory on this platform; set $ERP_SAMPLE_PATH".to_string(),
                    )
                })?
                .join("erp-rs");
            base.join(SAMPLE_FILE_NAME)
        }
    };

    if !path.exists() {
        log::info!("Sample dataset missing; generating {}", path.display());
        generate_sample(&path)?;
    }

    Ok(path)
}

/// Trigger code for the k-th event of the sample recording.
fn event_code(event_idx: usize) -> i32 {
    (event_idx % 4) as i32 + 1
}

/// Background EEG for one channel at one global sample: a mixture of
/// alpha, theta and slow drift with channel-dependent phase, in µV.
/// The frequencies are deliberately not commensurate with the event
/// spacing so the background averages out of the evoked response.
fn background(ch_idx: usize, sample_idx: usize) -> f64 {
    let t = sample_idx as f64 / SFREQ as f64;
    let phase = ch_idx as f64 * 0.7;
    10.0 * (2.0 * PI * 9.7 * t + phase).sin()
        + 6.0 * (2.0 * PI * 6.3 * t + 2.0 * phase).sin()
        + 4.0 * (2.0 * PI * 0.31 * t + phase).sin()
}

/// Stereotyped evoked deflection added after each event: a positive
/// peak near 100 ms whose polarity alternates with stimulus side and
/// whose amplitude falls off across channels.
fn evoked_response(ch_idx: usize, code: i32, dt: f64) -> f64 {
    if !(0.0..=0.4).contains(&dt) {
        return 0.0;
    }
    let amplitude = 15.0 * (1.0 - ch_idx as f64 / N_EEG_CHANNELS as f64);
    let side = if code % 2 == 1 { 1.0 } else { -1.0 };
    let peak = ((dt - 0.1) / 0.05).powi(2);
    side * amplitude * (-peak).exp()
}

fn stim_value(sample_idx: usize) -> f64 {
    if sample_idx < EVENT_OFFSET {
        return 0.0;
    }
    let since_start = sample_idx - EVENT_OFFSET;
    let event_idx = since_start / EVENT_SPACING;
    let within = since_start % EVENT_SPACING;
    if within < STIM_PULSE_SAMPLES {
        event_code(event_idx) as f64
    } else {
        0.0
    }
}

fn eeg_value(ch_idx: usize, sample_idx: usize) -> f64 {
    let mut value = background(ch_idx, sample_idx);
    if sample_idx >= EVENT_OFFSET {
        let since_start = sample_idx - EVENT_OFFSET;
        let event_idx = since_start / EVENT_SPACING;
        let dt = (since_start % EVENT_SPACING) as f64 / SFREQ as f64;
        value += evoked_response(ch_idx, event_code(event_idx), dt);
    }
    value
}

fn eeg_signal_header(label: &str) -> EdfSignalHeader {
    EdfSignalHeader {
        label: label.to_string(),
        transducer_type: "AgAgCl electrode".to_string(),
        physical_dimension: "uV".to_string(),
        physical_minimum: -200.0,
        physical_maximum: 200.0,
        digital_minimum: -32768,
        digital_maximum: 32767,
        prefiltering: "".to_string(),
        samples_per_record: SFREQ,
    }
}

fn stim_signal_header() -> EdfSignalHeader {
    // Identity gain so trigger codes survive digitization exactly.
    EdfSignalHeader {
        label: SAMPLE_STIM_CHANNEL.to_string(),
        transducer_type: "trigger".to_string(),
        physical_dimension: "".to_string(),
        physical_minimum: -32768.0,
        physical_maximum: 32767.0,
        digital_minimum: -32768,
        digital_maximum: 32767,
        prefiltering: "".to_string(),
        samples_per_record: SFREQ,
    }
}

/// Write the synthetic audiovisual sample recording to `path`.
pub fn generate_sample(path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut signal_headers: Vec<EdfSignalHeader> = (0..N_EEG_CHANNELS)
        .map(|i| eeg_signal_header(&format!("EEG {:03}", i + 1)))
        .collect();
    signal_headers.push(stim_signal_header());

    let mut writer = EdfWriter::create(path, "erp-rs synthetic audvis sample", 1.0, signal_headers)?;

    for record_idx in 0..N_RECORDS {
        let base = record_idx * SFREQ;
        let mut record: Vec<Vec<f64>> = Vec::with_capacity(N_EEG_CHANNELS + 1);
        for ch_idx in 0..N_EEG_CHANNELS {
            record.push((0..SFREQ).map(|i| eeg_value(ch_idx, base + i)).collect());
        }
        record.push((0..SFREQ).map(|i| stim_value(base + i)).collect());
        writer.write_physical_record(&record)?;
    }
    writer.finalize(N_RECORDS as i64)?;

    log::info!(
        "Wrote sample recording: {} EEG channels + '{}', {} s at {} Hz",
        N_EEG_CHANNELS,
        SAMPLE_STIM_CHANNEL,
        N_RECORDS,
        SFREQ
    );

    Ok(())
}

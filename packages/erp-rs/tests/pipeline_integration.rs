//! End-to-end pipeline test against a generated sample recording:
//! load, band-pass, average reference, events, epochs, evoked, plot.

use erp_rs::dataset::{self, SAMPLE_STIM_CHANNEL};
use erp_rs::epochs::{Baseline, Epochs};
use erp_rs::events::find_events;
use erp_rs::filters::band_pass;
use erp_rs::plot::plot_evoked;
use erp_rs::types::EventId;
use erp_rs::EdfReader;

#[test]
fn test_full_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let edf_path = dir.path().join("sample_audvis.edf");
    dataset::generate_sample(&edf_path).unwrap();

    let mut recording = EdfReader::open(&edf_path)
        .unwrap()
        .read_recording()
        .unwrap();
    assert!(recording.n_channels() > 0);
    assert!(recording.n_samples() > 0);

    band_pass(&mut recording, 1.0, 40.0, 4).unwrap();
    recording.set_average_reference();

    let events = find_events(&recording, SAMPLE_STIM_CHANNEL).unwrap();
    assert!(!events.is_empty());
    assert!(events.codes().iter().all(|c| (1..=4).contains(c)));

    let event_id = EventId::audvis_demo();
    let epochs = Epochs::from_events(
        &recording,
        &events,
        &event_id,
        -0.2,
        0.5,
        Some(Baseline::default()),
    )
    .unwrap();
    assert!(!epochs.is_empty());

    // All epochs share the same inclusive window span.
    let sfreq = recording.sfreq;
    let expected_len =
        ((0.5 * sfreq).round() as i64 - (-0.2 * sfreq).round() as i64 + 1) as usize;
    assert_eq!(epochs.n_times(), expected_len);
    for epoch in &epochs.data {
        for channel in epoch {
            assert_eq!(channel.len(), expected_len);
        }
    }

    let evoked = epochs.average("auditory/left").unwrap();
    assert_eq!(evoked.data.len(), epochs.ch_names.len());
    assert!(evoked
        .data
        .iter()
        .all(|ch| ch.iter().all(|v| v.is_finite())));

    // The synthetic auditory/left response peaks positively near
    // 100 ms on the front channels.
    let peak_idx = ((0.1 - evoked.tmin) * sfreq).round() as usize;
    assert!(evoked.data[0][peak_idx] > 0.0);

    let plot_path = dir.path().join("evoked.png");
    plot_evoked(&evoked, &plot_path).unwrap();
    assert!(plot_path.exists());
}

#[test]
fn test_pipeline_attenuates_out_of_band_power() {
    let dir = tempfile::tempdir().unwrap();
    let edf_path = dir.path().join("sample.edf");
    dataset::generate_sample(&edf_path).unwrap();

    let raw = EdfReader::open(&edf_path)
        .unwrap()
        .read_recording()
        .unwrap();
    let mut filtered = raw.clone();
    band_pass(&mut filtered, 1.0, 40.0, 4).unwrap();

    // The sample data carries a 0.31 Hz drift component; band-passing
    // 1-40 Hz must shrink the low-frequency variance of the signal.
    let drift_energy = |data: &[f64]| -> f64 {
        // Mean of 1-second block means approximates sub-1 Hz content.
        let block = 256;
        let means: Vec<f64> = data
            .chunks(block)
            .map(|c| c.iter().sum::<f64>() / c.len() as f64)
            .collect();
        means.iter().map(|m| m * m).sum::<f64>() / means.len() as f64
    };

    let before = drift_energy(&raw.data[0]);
    let after = drift_energy(&filtered.data[0]);
    assert!(after < before * 0.2, "before={} after={}", before, after);
}

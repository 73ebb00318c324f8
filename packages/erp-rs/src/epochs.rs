//! Event-locked epoching and evoked averaging.

use serde::{Deserialize, Serialize};

use crate::error::{ErpError, Result};
use crate::types::{label_matches, EventId, EventTable, Recording};

/// Baseline interval in seconds relative to the event. `None` bounds
/// extend to the epoch edge, so `Baseline::default()` is the interval
/// from the epoch start through t = 0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Baseline {
    pub from: Option<f64>,
    pub to: Option<f64>,
}

impl Default for Baseline {
    fn default() -> Self {
        Self {
            from: None,
            to: Some(0.0),
        }
    }
}

/// Fixed-window segments of a recording around events, grouped by
/// condition label. `data` is `[epoch x channel x sample]`; every epoch
/// shares one shape. Only EEG channels are carried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Epochs {
    pub ch_names: Vec<String>,
    pub sfreq: f64,
    pub tmin: f64,
    pub tmax: f64,
    pub labels: Vec<String>,
    pub data: Vec<Vec<Vec<f64>>>,
}

impl Epochs {
    /// Slice `recording` into epochs around the events whose code has a
    /// label in `event_id`.
    ///
    /// Pending reference projections are applied to a working copy of
    /// the data first. Events whose window does not fit inside the
    /// recording are dropped with a warning, as are events with codes
    /// absent from the mapping. Each epoch is baseline-corrected per
    /// channel unless `baseline` is `None`.
    pub fn from_events(
        recording: &Recording,
        events: &EventTable,
        event_id: &EventId,
        tmin: f64,
        tmax: f64,
        baseline: Option<Baseline>,
    ) -> Result<Self> {
        if tmin >= tmax {
            return Err(ErpError::InvalidParameter(format!(
                "tmin ({}) must be below tmax ({})",
                tmin, tmax
            )));
        }

        let mut working = recording.clone();
        working.apply_projections();

        let sfreq = working.sfreq;
        let n_samples = working.n_samples() as i64;
        let start_offset = (tmin * sfreq).round() as i64;
        let end_offset = (tmax * sfreq).round() as i64;
        let epoch_len = (end_offset - start_offset + 1) as usize;

        let eeg = working.eeg_channel_indices();
        let ch_names: Vec<String> = eeg.iter().map(|&idx| working.ch_names[idx].clone()).collect();

        // Local sample indices belonging to the baseline interval.
        let baseline_indices: Vec<usize> = match baseline {
            Some(interval) => {
                let from = interval.from.unwrap_or(tmin);
                let to = interval.to.unwrap_or(tmax);
                (0..epoch_len)
                    .filter(|&i| {
                        let t = (start_offset + i as i64) as f64 / sfreq;
                        t >= from && t <= to
                    })
                    .collect()
            }
            None => Vec::new(),
        };

        let mut labels = Vec::new();
        let mut data = Vec::new();
        let mut dropped_bounds = 0usize;
        let mut dropped_code = 0usize;

        for event in &events.events {
            let Some(label) = event_id.label_for_code(event.code) else {
                dropped_code += 1;
                continue;
            };

            let start = event.sample as i64 + start_offset;
            let end = event.sample as i64 + end_offset;
            if start < 0 || end >= n_samples {
                dropped_bounds += 1;
                continue;
            }

            let mut epoch: Vec<Vec<f64>> = Vec::with_capacity(eeg.len());
            for &ch_idx in &eeg {
                let mut window: Vec<f64> =
                    working.data[ch_idx][start as usize..=end as usize].to_vec();

                if !baseline_indices.is_empty() {
                    let mean: f64 = baseline_indices.iter().map(|&i| window[i]).sum::<f64>()
                        / baseline_indices.len() as f64;
                    for value in window.iter_mut() {
                        *value -= mean;
                    }
                }
                epoch.push(window);
            }

            labels.push(label.to_string());
            data.push(epoch);
        }

        if dropped_bounds > 0 {
            log::warn!(
                "Dropped {} event(s) whose epoch window fell outside the recording",
                dropped_bounds
            );
        }
        if dropped_code > 0 {
            log::debug!("Skipped {} event(s) with unmapped codes", dropped_code);
        }
        log::info!(
            "Built {} epochs of {} samples across {} channels",
            data.len(),
            epoch_len,
            ch_names.len()
        );

        Ok(Self {
            ch_names,
            sfreq,
            tmin,
            tmax,
            labels,
            data,
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Samples per epoch.
    pub fn n_times(&self) -> usize {
        self.data
            .first()
            .and_then(|epoch| epoch.first())
            .map(|ch| ch.len())
            .unwrap_or(0)
    }

    /// Epochs whose label matches `selector` (exact or by leading
    /// `/`-segments, so "auditory" selects both auditory conditions).
    pub fn pick(&self, selector: &str) -> Epochs {
        let mut labels = Vec::new();
        let mut data = Vec::new();
        for (label, epoch) in self.labels.iter().zip(&self.data) {
            if label_matches(selector, label) {
                labels.push(label.clone());
                data.push(epoch.clone());
            }
        }
        Epochs {
            ch_names: self.ch_names.clone(),
            sfreq: self.sfreq,
            tmin: self.tmin,
            tmax: self.tmax,
            labels,
            data,
        }
    }

    /// Sample-wise mean across the epochs matching `selector`.
    pub fn average(&self, selector: &str) -> Result<Evoked> {
        let selected = self.pick(selector);
        if selected.is_empty() {
            return Err(ErpError::NoMatchingEvents(selector.to_string()));
        }

        let n_epochs = selected.len();
        let n_channels = selected.ch_names.len();
        let n_times = selected.n_times();

        let mut data = vec![vec![0.0f64; n_times]; n_channels];
        for epoch in &selected.data {
            for (ch_idx, channel) in epoch.iter().enumerate() {
                for (sample_idx, &value) in channel.iter().enumerate() {
                    data[ch_idx][sample_idx] += value;
                }
            }
        }
        let scale = 1.0 / n_epochs as f64;
        for channel in data.iter_mut() {
            for value in channel.iter_mut() {
                *value *= scale;
            }
        }

        log::info!(
            "Averaged {} epochs for '{}' into one waveform per channel",
            n_epochs,
            selector
        );

        Ok(Evoked {
            id: uuid::Uuid::new_v4().to_string(),
            label: selector.to_string(),
            ch_names: selected.ch_names,
            sfreq: selected.sfreq,
            tmin: selected.tmin,
            n_epochs,
            data,
            created_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}

/// The averaged response for one condition: one waveform per channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evoked {
    pub id: String,
    pub label: String,
    pub ch_names: Vec<String>,
    pub sfreq: f64,
    pub tmin: f64,
    pub n_epochs: usize,
    pub data: Vec<Vec<f64>>,
    pub created_at: String,
}

impl Evoked {
    pub fn n_times(&self) -> usize {
        self.data.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Time in seconds of the given sample, relative to the event.
    pub fn time_at(&self, sample_idx: usize) -> f64 {
        self.tmin + sample_idx as f64 / self.sfreq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Event, EventTable};

    fn ramp_recording(n_samples: usize) -> Recording {
        // EEG channel is a ramp so epoch contents are predictable.
        let ramp: Vec<f64> = (0..n_samples).map(|i| i as f64).collect();
        let mut stim = vec![0.0; n_samples];
        stim[20] = 1.0;
        stim[40] = 1.0;
        stim[60] = 2.0;
        Recording::new(
            vec!["EEG 001".to_string(), "STI 014".to_string()],
            10.0,
            vec![ramp, stim],
        )
        .unwrap()
    }

    fn demo_events() -> EventTable {
        EventTable {
            stim_channel: "STI 014".to_string(),
            events: vec![
                Event { sample: 20, code: 1 },
                Event { sample: 40, code: 1 },
                Event { sample: 60, code: 2 },
            ],
        }
    }

    #[test]
    fn test_epoch_shape() {
        let rec = ramp_recording(100);
        let epochs = Epochs::from_events(
            &rec,
            &demo_events(),
            &EventId::audvis_demo(),
            -0.2,
            0.5,
            Some(Baseline::default()),
        )
        .unwrap();

        assert_eq!(epochs.len(), 3);
        assert_eq!(epochs.ch_names, vec!["EEG 001".to_string()]);
        // round(-0.2*10) = -2, round(0.5*10) = 5, inclusive span of 8.
        assert_eq!(epochs.n_times(), 8);
        for epoch in &epochs.data {
            assert_eq!(epoch[0].len(), 8);
        }
    }

    #[test]
    fn test_baseline_correction_zeroes_pre_event_mean() {
        let rec = ramp_recording(100);
        let epochs = Epochs::from_events(
            &rec,
            &demo_events(),
            &EventId::audvis_demo(),
            -0.2,
            0.5,
            Some(Baseline::default()),
        )
        .unwrap();

        // Baseline samples are t in {-0.2, -0.1, 0.0}; after
        // correction their mean is zero per channel.
        for epoch in &epochs.data {
            let mean: f64 = epoch[0][..3].iter().sum::<f64>() / 3.0;
            assert!(mean.abs() < 1e-9);
        }
    }

    #[test]
    fn test_out_of_bounds_events_dropped() {
        let rec = ramp_recording(100);
        let events = EventTable {
            stim_channel: "STI 014".to_string(),
            events: vec![
                Event { sample: 1, code: 1 },  // window starts before 0
                Event { sample: 98, code: 1 }, // window ends past the data
                Event { sample: 50, code: 1 },
            ],
        };
        let epochs = Epochs::from_events(
            &rec,
            &events,
            &EventId::audvis_demo(),
            -0.2,
            0.5,
            Some(Baseline::default()),
        )
        .unwrap();
        assert_eq!(epochs.len(), 1);
    }

    #[test]
    fn test_unmapped_codes_skipped() {
        let rec = ramp_recording(100);
        let events = EventTable {
            stim_channel: "STI 014".to_string(),
            events: vec![
                Event { sample: 30, code: 9 },
                Event { sample: 50, code: 2 },
            ],
        };
        let epochs = Epochs::from_events(
            &rec,
            &events,
            &EventId::audvis_demo(),
            -0.2,
            0.5,
            Some(Baseline::default()),
        )
        .unwrap();
        assert_eq!(epochs.len(), 1);
        assert_eq!(epochs.labels, vec!["auditory/right".to_string()]);
    }

    #[test]
    fn test_pick_hierarchical() {
        let rec = ramp_recording(100);
        let epochs = Epochs::from_events(
            &rec,
            &demo_events(),
            &EventId::audvis_demo(),
            -0.2,
            0.5,
            Some(Baseline::default()),
        )
        .unwrap();

        assert_eq!(epochs.pick("auditory/left").len(), 2);
        assert_eq!(epochs.pick("auditory").len(), 3);
        assert_eq!(epochs.pick("visual").len(), 0);
    }

    #[test]
    fn test_average_is_finite_and_shaped() {
        let rec = ramp_recording(100);
        let epochs = Epochs::from_events(
            &rec,
            &demo_events(),
            &EventId::audvis_demo(),
            -0.2,
            0.5,
            Some(Baseline::default()),
        )
        .unwrap();

        let evoked = epochs.average("auditory/left").unwrap();
        assert_eq!(evoked.n_epochs, 2);
        assert_eq!(evoked.data.len(), 1);
        assert_eq!(evoked.n_times(), 8);
        assert!(evoked
            .data
            .iter()
            .all(|ch| ch.iter().all(|v| v.is_finite())));
        assert!((evoked.time_at(0) - (-0.2)).abs() < 1e-9);
    }

    #[test]
    fn test_average_empty_selection_is_error() {
        let rec = ramp_recording(100);
        let epochs = Epochs::from_events(
            &rec,
            &demo_events(),
            &EventId::audvis_demo(),
            -0.2,
            0.5,
            Some(Baseline::default()),
        )
        .unwrap();
        let result = epochs.average("visual/left");
        assert!(matches!(result, Err(ErpError::NoMatchingEvents(_))));
    }

    #[test]
    fn test_projection_applied_during_epoching() {
        // Two EEG channels that are mirror images: after the average
        // reference their sum is zero, and the original data is kept.
        let n = 100;
        let a: Vec<f64> = (0..n).map(|i| (i as f64 * 0.1).sin()).collect();
        let b: Vec<f64> = a.iter().map(|v| 2.0 + v * 3.0).collect();
        let mut stim = vec![0.0; n];
        stim[50] = 1.0;
        let mut rec = Recording::new(
            vec![
                "EEG 001".to_string(),
                "EEG 002".to_string(),
                "STI 014".to_string(),
            ],
            10.0,
            vec![a.clone(), b, stim],
        )
        .unwrap();
        rec.set_average_reference();

        let events = EventTable {
            stim_channel: "STI 014".to_string(),
            events: vec![Event { sample: 50, code: 1 }],
        };
        let epochs = Epochs::from_events(
            &rec,
            &events,
            &EventId::audvis_demo(),
            -0.2,
            0.5,
            // No baseline so referencing is the only transform.
            None,
        )
        .unwrap();

        // Source recording still holds the raw data and the projection.
        assert_eq!(rec.data[0], a);
        assert_eq!(rec.projections.len(), 1);

        // Epoch channels sum to zero at every sample.
        let epoch = &epochs.data[0];
        for sample_idx in 0..epochs.n_times() {
            let sum = epoch[0][sample_idx] + epoch[1][sample_idx];
            assert!(sum.abs() < 1e-9);
        }
    }
}

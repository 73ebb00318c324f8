use serde::{Deserialize, Serialize};

use crate::error::{ErpError, Result};

/// Channels whose label starts with this prefix carry trigger codes,
/// not brain signal. They are excluded from referencing and averaging.
pub const STIM_PREFIX: &str = "STI";

/// Reference transform registered on a recording but not yet applied
/// to the sample matrix (the original applies it at epoching time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    AverageReference,
}

/// A continuous multichannel recording, fully loaded into memory.
///
/// `data` is `[channels x samples]` in physical units (µV for EEG
/// channels, raw trigger values for stim channels).
#[derive(Debug, Clone)]
pub struct Recording {
    pub ch_names: Vec<String>,
    pub sfreq: f64,
    pub data: Vec<Vec<f64>>,
    pub projections: Vec<Projection>,
}

impl Recording {
    pub fn new(ch_names: Vec<String>, sfreq: f64, data: Vec<Vec<f64>>) -> Result<Self> {
        if ch_names.len() != data.len() {
            return Err(ErpError::InvalidParameter(format!(
                "{} channel names for {} data rows",
                ch_names.len(),
                data.len()
            )));
        }
        if let Some(first) = data.first() {
            let n = first.len();
            if let Some(bad) = data.iter().position(|ch| ch.len() != n) {
                return Err(ErpError::InvalidParameter(format!(
                    "Channel '{}' has {} samples, expected {}",
                    ch_names[bad],
                    data[bad].len(),
                    n
                )));
            }
        }
        if sfreq <= 0.0 {
            return Err(ErpError::InvalidParameter(format!(
                "Sampling rate must be positive, got {}",
                sfreq
            )));
        }
        Ok(Self {
            ch_names,
            sfreq,
            data,
            projections: Vec::new(),
        })
    }

    pub fn n_channels(&self) -> usize {
        self.ch_names.len()
    }

    pub fn n_samples(&self) -> usize {
        self.data.first().map(|ch| ch.len()).unwrap_or(0)
    }

    pub fn duration_secs(&self) -> f64 {
        self.n_samples() as f64 / self.sfreq
    }

    /// Index of a channel by exact label.
    pub fn channel_index(&self, label: &str) -> Result<usize> {
        self.ch_names
            .iter()
            .position(|name| name == label)
            .ok_or_else(|| ErpError::MissingChannel(label.to_string()))
    }

    pub fn is_stim_channel(&self, idx: usize) -> bool {
        self.ch_names[idx].starts_with(STIM_PREFIX)
    }

    /// Indices of the non-trigger channels, in recording order.
    pub fn eeg_channel_indices(&self) -> Vec<usize> {
        (0..self.n_channels())
            .filter(|&idx| !self.is_stim_channel(idx))
            .collect()
    }
}

/// One discrete marker: the sample index where a trigger code appeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub sample: u64,
    pub code: i32,
}

/// Ordered event markers extracted from one stim channel. Read-only
/// after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventTable {
    pub stim_channel: String,
    pub events: Vec<Event>,
}

impl EventTable {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Distinct codes present in the table, sorted ascending.
    pub fn codes(&self) -> Vec<i32> {
        let mut codes: Vec<i32> = self.events.iter().map(|e| e.code).collect();
        codes.sort_unstable();
        codes.dedup();
        codes
    }
}

/// Mapping from condition label to trigger code. Labels may be
/// hierarchical, with `/`-separated segments (`auditory/left`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventId {
    entries: Vec<(String, i32)>,
}

impl EventId {
    pub fn new(entries: Vec<(String, i32)>) -> Self {
        Self { entries }
    }

    /// The fixed mapping used by the audvis demo recording.
    pub fn audvis_demo() -> Self {
        Self::new(vec![
            ("auditory/left".to_string(), 1),
            ("auditory/right".to_string(), 2),
            ("visual/left".to_string(), 3),
            ("visual/right".to_string(), 4),
        ])
    }

    pub fn label_for_code(&self, code: i32) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(label, _)| label.as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(label, _)| label.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// True if `selector` matches `label` by whole leading `/`-segments,
/// so "auditory" matches "auditory/left" but not "auditory2".
pub fn label_matches(selector: &str, label: &str) -> bool {
    if selector == label {
        return true;
    }
    label
        .strip_prefix(selector)
        .is_some_and(|rest| rest.starts_with('/'))
}

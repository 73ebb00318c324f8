//! Event extraction from a trigger (stim) channel.

use crate::error::Result;
use crate::types::{Event, EventTable, Recording};

/// Scan `stim_channel` for rising transitions and return one event per
/// onset: the previous sample is zero, the new sample is nonzero, and
/// the event code is the new value rounded to the nearest integer.
///
/// A held code produces a single event at its onset. Falling edges are
/// ignored.
pub fn find_events(recording: &Recording, stim_channel: &str) -> Result<EventTable> {
    let ch_idx = recording.channel_index(stim_channel)?;
    let samples = &recording.data[ch_idx];

    let mut events = Vec::new();
    let mut previous = 0i32;
    for (sample_idx, &value) in samples.iter().enumerate() {
        let code = value.round() as i32;
        if code != 0 && previous == 0 {
            events.push(Event {
                sample: sample_idx as u64,
                code,
            });
        }
        previous = code;
    }

    log::info!(
        "Found {} events on channel '{}'",
        events.len(),
        stim_channel
    );

    Ok(EventTable {
        stim_channel: stim_channel.to_string(),
        events,
    })
}

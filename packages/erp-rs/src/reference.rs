//! Re-referencing transforms.
//!
//! The average reference is registered as a deferred projection: it is
//! recorded on the [`Recording`] when requested and only subtracted
//! from the samples when epochs are built (or when applied explicitly).

use crate::types::{Projection, Recording};

impl Recording {
    /// Register an average-reference projection. The sample matrix is
    /// not modified yet.
    pub fn set_average_reference(&mut self) {
        if !self.projections.contains(&Projection::AverageReference) {
            self.projections.push(Projection::AverageReference);
            log::info!("Average reference projection added (deferred)");
        }
    }

    /// Apply all pending projections to the sample matrix and clear
    /// them. Idempotent once the projection list is empty.
    pub fn apply_projections(&mut self) {
        let projections = std::mem::take(&mut self.projections);
        for projection in projections {
            match projection {
                Projection::AverageReference => self.apply_average_reference(),
            }
        }
    }

    /// Subtract the per-sample mean across EEG channels from every EEG
    /// channel. Stim channels neither contribute nor change.
    fn apply_average_reference(&mut self) {
        let eeg = self.eeg_channel_indices();
        if eeg.is_empty() {
            log::warn!("No EEG channels; average reference is a no-op");
            return;
        }

        let n_samples = self.n_samples();
        let mut mean = vec![0.0f64; n_samples];
        for &ch_idx in &eeg {
            for (sample_idx, &value) in self.data[ch_idx].iter().enumerate() {
                mean[sample_idx] += value;
            }
        }
        let scale = 1.0 / eeg.len() as f64;
        for value in mean.iter_mut() {
            *value *= scale;
        }

        for &ch_idx in &eeg {
            for (sample_idx, value) in self.data[ch_idx].iter_mut().enumerate() {
                *value -= mean[sample_idx];
            }
        }

        log::info!("Applied average reference over {} EEG channels", eeg.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_recording() -> Recording {
        Recording::new(
            vec![
                "EEG 001".to_string(),
                "EEG 002".to_string(),
                "STI 014".to_string(),
            ],
            100.0,
            vec![vec![1.0, 2.0, 3.0], vec![3.0, 4.0, 5.0], vec![0.0, 7.0, 0.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_projection_is_deferred() {
        let mut rec = test_recording();
        rec.set_average_reference();
        assert_eq!(rec.projections, vec![Projection::AverageReference]);
        // Data untouched until applied.
        assert_eq!(rec.data[0], vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_set_average_reference_is_idempotent() {
        let mut rec = test_recording();
        rec.set_average_reference();
        rec.set_average_reference();
        assert_eq!(rec.projections.len(), 1);
    }

    #[test]
    fn test_apply_average_reference() {
        let mut rec = test_recording();
        rec.set_average_reference();
        rec.apply_projections();

        // Mean of EEG channels is [2, 3, 4].
        assert_eq!(rec.data[0], vec![-1.0, -1.0, -1.0]);
        assert_eq!(rec.data[1], vec![1.0, 1.0, 1.0]);
        // Stim channel is untouched.
        assert_eq!(rec.data[2], vec![0.0, 7.0, 0.0]);
        assert!(rec.projections.is_empty());

        // EEG channels now sum to zero at every sample.
        for sample_idx in 0..3 {
            let sum: f64 = rec.data[0][sample_idx] + rec.data[1][sample_idx];
            assert!(sum.abs() < 1e-12);
        }
    }
}

//! Butterworth IIR filters as cascaded second-order sections (biquads)
//! in Direct Form II Transposed, applied forward-backward for zero
//! phase distortion.

use rayon::prelude::*;
use std::f64::consts::PI;

use crate::error::{ErpError, Result};
use crate::types::Recording;

/// Second-order section coefficients.
/// H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

/// Single biquad section with its state.
#[derive(Debug, Clone)]
struct Biquad {
    coeffs: BiquadCoeffs,
    z1: f64,
    z2: f64,
}

impl Biquad {
    fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            z1: 0.0,
            z2: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, input: f64) -> f64 {
        let output = self.coeffs.b0 * input + self.z1;
        self.z1 = self.coeffs.b1 * input - self.coeffs.a1 * output + self.z2;
        self.z2 = self.coeffs.b2 * input - self.coeffs.a2 * output;
        output
    }

    fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

/// Cascade of second-order sections.
#[derive(Debug, Clone)]
pub struct SosFilter {
    sections: Vec<Biquad>,
}

impl SosFilter {
    pub fn new(sections: Vec<BiquadCoeffs>) -> Self {
        Self {
            sections: sections.into_iter().map(Biquad::new).collect(),
        }
    }

    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let mut output = input;
        for section in &mut self.sections {
            output = section.process(output);
        }
        output
    }

    pub fn process_signal(&mut self, signal: &mut [f64]) {
        for sample in signal.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
    }

    /// Forward-backward application (filtfilt). The signal is filtered,
    /// reversed, filtered again with fresh state, and reversed back,
    /// which squares the magnitude response and cancels the phase.
    pub fn filtfilt(&mut self, signal: &mut [f64]) {
        self.reset();
        self.process_signal(signal);
        signal.reverse();
        self.reset();
        self.process_signal(signal);
        signal.reverse();
        self.reset();
    }
}

/// Butterworth filter designer (bilinear transform with prewarping).
pub struct Butterworth;

impl Butterworth {
    pub fn lowpass(cutoff: f64, sample_rate: f64, order: usize) -> SosFilter {
        let wn = Self::prewarp(cutoff, sample_rate);
        SosFilter::new(Self::design_lowpass(wn, order))
    }

    pub fn highpass(cutoff: f64, sample_rate: f64, order: usize) -> SosFilter {
        let wn = Self::prewarp(cutoff, sample_rate);
        SosFilter::new(Self::design_highpass(wn, order))
    }

    /// Bandpass as a highpass/lowpass cascade of the given order each.
    pub fn bandpass(low: f64, high: f64, sample_rate: f64, order: usize) -> SosFilter {
        let wn_low = Self::prewarp(low, sample_rate);
        let wn_high = Self::prewarp(high, sample_rate);
        let mut sections = Self::design_highpass(wn_low, order);
        sections.extend(Self::design_lowpass(wn_high, order));
        SosFilter::new(sections)
    }

    fn prewarp(freq: f64, sample_rate: f64) -> f64 {
        (PI * freq / sample_rate).tan()
    }

    fn design_lowpass(wn: f64, order: usize) -> Vec<BiquadCoeffs> {
        let num_sections = (order + 1) / 2;
        let mut sections = Vec::with_capacity(num_sections);

        for k in 0..num_sections {
            let theta = PI * (2.0 * k as f64 + 1.0) / (2.0 * order as f64);
            let alpha = -2.0 * theta.cos();

            if order % 2 == 1 && k == num_sections - 1 {
                // Odd order: final section is first-order.
                let k_coeff = wn / (1.0 + wn);
                sections.push(BiquadCoeffs {
                    b0: k_coeff,
                    b1: k_coeff,
                    b2: 0.0,
                    a1: (wn - 1.0) / (wn + 1.0),
                    a2: 0.0,
                });
            } else {
                let wn2 = wn * wn;
                let denom = 1.0 + alpha * wn + wn2;
                sections.push(BiquadCoeffs {
                    b0: wn2 / denom,
                    b1: 2.0 * wn2 / denom,
                    b2: wn2 / denom,
                    a1: 2.0 * (wn2 - 1.0) / denom,
                    a2: (1.0 - alpha * wn + wn2) / denom,
                });
            }
        }

        sections
    }

    fn design_highpass(wn: f64, order: usize) -> Vec<BiquadCoeffs> {
        let num_sections = (order + 1) / 2;
        let mut sections = Vec::with_capacity(num_sections);

        for k in 0..num_sections {
            let theta = PI * (2.0 * k as f64 + 1.0) / (2.0 * order as f64);
            let alpha = -2.0 * theta.cos();

            if order % 2 == 1 && k == num_sections - 1 {
                let k_coeff = 1.0 / (1.0 + wn);
                sections.push(BiquadCoeffs {
                    b0: k_coeff,
                    b1: -k_coeff,
                    b2: 0.0,
                    a1: (wn - 1.0) / (wn + 1.0),
                    a2: 0.0,
                });
            } else {
                let wn2 = wn * wn;
                let denom = 1.0 + alpha * wn + wn2;
                sections.push(BiquadCoeffs {
                    b0: 1.0 / denom,
                    b1: -2.0 / denom,
                    b2: 1.0 / denom,
                    a1: 2.0 * (wn2 - 1.0) / denom,
                    a2: (1.0 - alpha * wn + wn2) / denom,
                });
            }
        }

        sections
    }
}

fn validate_band(low: f64, high: f64, order: usize, sfreq: f64) -> Result<()> {
    let nyquist = sfreq / 2.0;
    if !(1..=8).contains(&order) {
        return Err(ErpError::InvalidParameter(format!(
            "Filter order must be in 1..=8, got {}",
            order
        )));
    }
    if low <= 0.0 {
        return Err(ErpError::InvalidParameter(format!(
            "Low cutoff must be positive, got {} Hz",
            low
        )));
    }
    if low >= high {
        return Err(ErpError::InvalidParameter(format!(
            "Low cutoff ({} Hz) must be below high cutoff ({} Hz)",
            low, high
        )));
    }
    if high >= nyquist {
        return Err(ErpError::InvalidParameter(format!(
            "High cutoff ({} Hz) must be below Nyquist ({} Hz)",
            high, nyquist
        )));
    }
    Ok(())
}

/// Band-pass every EEG channel of the recording in place, zero-phase.
/// Stim channels carry trigger codes and are left untouched.
pub fn band_pass(recording: &mut Recording, low: f64, high: f64, order: usize) -> Result<()> {
    validate_band(low, high, order, recording.sfreq)?;

    let sfreq = recording.sfreq;
    let stim: Vec<bool> = (0..recording.n_channels())
        .map(|idx| recording.is_stim_channel(idx))
        .collect();

    log::info!(
        "Band-pass filtering {} channels: {}-{} Hz, order {}",
        recording.n_channels(),
        low,
        high,
        order
    );

    recording
        .data
        .par_iter_mut()
        .zip(stim.par_iter())
        .for_each(|(channel, &is_stim)| {
            if is_stim {
                return;
            }
            // Independent filter state per channel.
            let mut filter = Butterworth::bandpass(low, high, sfreq, order);
            filter.filtfilt(channel);
        });

    Ok(())
}

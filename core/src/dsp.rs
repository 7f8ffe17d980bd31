//! Spectral estimation and FMCW physics formulas.

use crate::records::Direction;
use crate::{PipelineError, PipelineResult};
use num_complex::Complex32;
use rustfft::{num_traits::Zero, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Transform length; shorter ramps are zero-padded up to this.
pub const FFT_SIZE: usize = 1024;

/// Result of one peak-frequency estimate.
#[derive(Debug, Clone)]
pub struct Spectrum {
    /// Absolute value of the dominant frequency, in Hz.
    pub peak_frequency: f64,
    /// Magnitude per bin, fftshifted.
    pub magnitude: Vec<f32>,
    /// Shifted frequency axis covering `[-fs/2, fs/2)`, in Hz.
    pub frequency_axis: Vec<f64>,
}

/// Stateless spectral estimator; the FFT plan is cached for reuse.
pub struct SignalProcessor {
    sample_rate: f64,
    fft: Arc<dyn Fft<f32>>,
}

impl SignalProcessor {
    pub fn new(sample_rate: f64) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        Self { sample_rate, fft }
    }

    /// Extracts the dominant beat frequency of a complex baseband ramp.
    ///
    /// DC removal, Hann window, zero-padded transform to `FFT_SIZE`
    /// bins, fftshift, argmax over the magnitude.
    pub fn peak_frequency(&self, signal: &[Complex32]) -> PipelineResult<Spectrum> {
        if signal.is_empty() {
            return Err(PipelineError::InvalidRecord(
                "empty signal has no spectrum".into(),
            ));
        }

        let mean = signal.iter().sum::<Complex32>() / signal.len() as f32;
        let window = hann_window(signal.len());

        let mut buffer = vec![Complex32::zero(); FFT_SIZE];
        for (slot, (&value, weight)) in buffer.iter_mut().zip(signal.iter().zip(window)) {
            *slot = (value - mean) * weight;
        }
        self.fft.process(&mut buffer);

        let shifted = fftshift(&buffer);
        let magnitude: Vec<f32> = shifted.iter().map(|bin| bin.norm()).collect();
        let frequency_axis = self.frequency_axis();

        let peak_bin = magnitude
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(bin, _)| bin)
            .unwrap_or(0);

        Ok(Spectrum {
            peak_frequency: frequency_axis[peak_bin].abs(),
            magnitude,
            frequency_axis,
        })
    }

    /// Shifted frequency grid, `fs / FFT_SIZE` per bin.
    pub fn frequency_axis(&self) -> Vec<f64> {
        let resolution = self.sample_rate / FFT_SIZE as f64;
        (0..FFT_SIZE)
            .map(|bin| (bin as f64 - (FFT_SIZE / 2) as f64) * resolution)
            .collect()
    }

    /// Range from the beat-frequency pair.
    ///
    /// The divisor carries a factor of 3 beyond the textbook
    /// triangular-sweep equation; it is a calibration constant for the
    /// deployed front end and must not be folded away.
    pub fn distance(f_up: f64, f_down: f64, speed_of_light: f64, sweep_rate: f64) -> f64 {
        (f_up + f_down) * speed_of_light / (4.0 * 3.0 * sweep_rate)
    }

    /// Relative radial velocity from the beat-frequency pair.
    pub fn velocity(f_up: f64, f_down: f64, speed_of_light: f64, center_frequency: f64) -> f64 {
        (f_up - f_down) * speed_of_light / (4.0 * center_frequency)
    }

    /// Direction of motion from the beat-frequency pair.
    pub fn direction(f_up: f64, f_down: f64) -> Direction {
        if f_down > f_up {
            Direction::Approaching
        } else if f_down < f_up {
            Direction::Receding
        } else {
            Direction::Static
        }
    }
}

/// Symmetric Hann window of length `len`.
fn hann_window(len: usize) -> Vec<f32> {
    if len == 1 {
        return vec![1.0];
    }
    (0..len)
        .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f32 / (len - 1) as f32).cos())
        .collect()
}

/// Rotates a spectrum so frequency zero sits at the center bin.
fn fftshift(spectrum: &[Complex32]) -> Vec<Complex32> {
    let half = spectrum.len() / 2;
    let mut shifted = Vec::with_capacity(spectrum.len());
    shifted.extend_from_slice(&spectrum[half..]);
    shifted.extend_from_slice(&spectrum[..half]);
    shifted
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Complex exponential at `frequency`, quantized like the ADC path.
    pub(crate) fn tone(frequency: f64, sample_rate: f64, len: usize) -> Vec<Complex32> {
        (0..len)
            .map(|n| {
                let phase = 2.0 * std::f64::consts::PI * frequency * n as f64 / sample_rate;
                Complex32::new(
                    (1000.0 * phase.cos()).round() as f32,
                    (1000.0 * phase.sin()).round() as f32,
                )
            })
            .collect()
    }

    #[test]
    fn recovers_bin_aligned_tone_within_one_bin() {
        let sample_rate = 40_960.0;
        let bin_width = sample_rate / FFT_SIZE as f64;
        let f0 = 64.0 * bin_width; // 2560 Hz
        let processor = SignalProcessor::new(sample_rate);

        let spectrum = processor.peak_frequency(&tone(f0, sample_rate, 256)).unwrap();
        assert!(
            (spectrum.peak_frequency - f0).abs() <= bin_width,
            "peak {} not within one bin of {}",
            spectrum.peak_frequency,
            f0
        );
        assert_eq!(spectrum.magnitude.len(), FFT_SIZE);
        assert_eq!(spectrum.frequency_axis.len(), FFT_SIZE);
    }

    #[test]
    fn frequency_axis_spans_half_sample_rate() {
        let processor = SignalProcessor::new(40_000.0);
        let axis = processor.frequency_axis();
        assert_eq!(axis[0], -20_000.0);
        assert_eq!(axis[FFT_SIZE / 2], 0.0);
        assert!(axis[FFT_SIZE - 1] < 20_000.0);
    }

    #[test]
    fn empty_signal_is_an_error() {
        let processor = SignalProcessor::new(40_000.0);
        assert!(processor.peak_frequency(&[]).is_err());
    }

    #[test]
    fn direction_follows_beat_frequency_order() {
        assert_eq!(SignalProcessor::direction(50.0, 100.0), Direction::Approaching);
        assert_eq!(SignalProcessor::direction(100.0, 50.0), Direction::Receding);
        assert_eq!(SignalProcessor::direction(75.0, 75.0), Direction::Static);
    }

    #[test]
    fn distance_keeps_the_calibration_divisor() {
        let distance = SignalProcessor::distance(100.0, 200.0, 3e8, 1e9);
        assert!((distance - 300.0 * 3e8 / (12.0 * 1e9)).abs() < 1e-9);
    }

    #[test]
    fn velocity_is_signed_by_frequency_difference() {
        let closing = SignalProcessor::velocity(200.0, 100.0, 3e8, 24e9);
        assert!((closing - 100.0 * 3e8 / (4.0 * 24e9)).abs() < 1e-12);
        let receding = SignalProcessor::velocity(100.0, 200.0, 3e8, 24e9);
        assert!((closing + receding).abs() < 1e-12);
    }
}

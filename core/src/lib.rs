//! Acquisition and signal-processing core for the FMCW I/Q radar pipeline.
//!
//! Two serial channels (in-phase and quadrature) deliver framed ramp
//! packets; the modules here reassemble them into per-channel sweeps,
//! pair the channels into one complex baseband measurement, and extract
//! beat frequencies, range, velocity, and direction of motion.

pub mod dsp;
pub mod frame;
pub mod prelude;
pub mod processor;
pub mod queue;
pub mod reader;
pub mod records;
pub mod telemetry;
pub mod worker;


use serde::{Deserialize, Serialize};

/// Read-only parameter set shared by every pipeline component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadarConfig {
    /// ADC sample rate in Hz.
    pub sample_rate: f64,
    /// Samples retained per ramp (up or down) for processing.
    pub samples_per_ramp: usize,
    /// Sweep bandwidth in Hz.
    pub bandwidth: f64,
    /// Antenna center frequency in Hz.
    pub center_frequency: f64,
    /// Propagation speed in m/s.
    pub speed_of_light: f64,
    /// Payload length of one ramp packet on the wire, in samples.
    pub n_samples: usize,
    /// Capacity of every inter-worker queue.
    pub queue_capacity: usize,
}

impl RadarConfig {
    /// Chirp duration T in seconds.
    pub fn chirp_duration(&self) -> f64 {
        self.samples_per_ramp as f64 / self.sample_rate
    }

    /// Frequency slope K = B / T in Hz/s.
    pub fn sweep_rate(&self) -> f64 {
        self.bandwidth / self.chirp_duration()
    }
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            sample_rate: 40_000.0,
            samples_per_ramp: 256,
            bandwidth: 250e6,
            center_frequency: 24e9,
            speed_of_light: 3e8,
            n_samples: 400,
            queue_capacity: 5,
        }
    }
}

/// Common error type for pipeline components.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

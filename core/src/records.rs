//! Value types exchanged between pipeline workers.

use crate::{PipelineError, PipelineResult};
use num_complex::Complex32;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the physical channel a sweep came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelId {
    /// In-phase channel.
    I,
    /// Quadrature channel.
    Q,
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelId::I => write!(f, "I"),
            ChannelId::Q => write!(f, "Q"),
        }
    }
}

/// One reassembled sweep (up-ramp plus down-ramp) from one channel.
///
/// Only ever constructed fully populated; the reader keeps its partial
/// reassembly state private and emits a record exactly when both ramps
/// have arrived. Consumers receive an immutable snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub channel_id: ChannelId,
    pub up_samples: Vec<i16>,
    pub down_samples: Vec<i16>,
}

impl ChannelRecord {
    /// Builds a record, rejecting ramps of the wrong length.
    pub fn new(
        channel_id: ChannelId,
        up_samples: Vec<i16>,
        down_samples: Vec<i16>,
        samples_per_ramp: usize,
    ) -> PipelineResult<Self> {
        if up_samples.len() != samples_per_ramp || down_samples.len() != samples_per_ramp {
            return Err(PipelineError::InvalidRecord(format!(
                "channel {}: ramp lengths {}/{} do not match {} samples per ramp",
                channel_id,
                up_samples.len(),
                down_samples.len(),
                samples_per_ramp
            )));
        }
        Ok(Self {
            channel_id,
            up_samples,
            down_samples,
        })
    }
}

/// Direction of motion derived from the beat-frequency pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Approaching,
    Receding,
    Static,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Approaching => write!(f, "APPROACHING"),
            Direction::Receding => write!(f, "RECEDING"),
            Direction::Static => write!(f, "STATIC"),
        }
    }
}

/// One physical measurement, produced per successful I/Q pairing.
///
/// Immutable once constructed; shared with every output queue via
/// `Arc`. The raw per-ramp arrays are retained for downstream
/// rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadarResult {
    /// Complex baseband signal of the up-chirp, I + jQ.
    pub signal_up: Vec<Complex32>,
    /// Complex baseband signal of the down-chirp, I + jQ.
    pub signal_down: Vec<Complex32>,
    /// Magnitude spectrum of the up-chirp, fftshifted.
    pub spectrum_up: Vec<f32>,
    /// Magnitude spectrum of the down-chirp, fftshifted.
    pub spectrum_down: Vec<f32>,
    /// Shifted frequency axis shared by both spectra, in Hz.
    pub frequency_axis: Vec<f64>,
    /// Detected beat frequency of the up-chirp, in Hz.
    pub f_up: f64,
    /// Detected beat frequency of the down-chirp, in Hz.
    pub f_down: f64,
    /// Target range in meters.
    pub distance: f64,
    /// Relative radial velocity in m/s.
    pub velocity: f64,
    pub direction: Direction,
    /// Raw per-ramp samples for visualization.
    pub i_up: Vec<i16>,
    pub q_up: Vec<i16>,
    pub i_down: Vec<i16>,
    pub q_down: Vec<i16>,
}

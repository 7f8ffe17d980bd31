//! Cross-channel pairing and measurement assembly.
//!
//! Pairing is by arrival order only: there is no sweep sequence number
//! or timestamp correlating the I and Q streams, so if one channel
//! free-runs faster, a pair may span two physically distinct sweeps.
//! Known limitation, deliberately not corrected here.

use crate::dsp::SignalProcessor;
use crate::queue::{QueueReceiver, QueueSender};
use crate::records::{ChannelRecord, RadarResult};
use crate::telemetry::PipelineMetrics;
use crate::worker::{join_timeout, StopFlag};
use crate::{PipelineError, PipelineResult, RadarConfig};
use log::{debug, error, info};
use num_complex::Complex32;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const DEQUEUE_WAIT: Duration = Duration::from_millis(100);

/// Builds one measurement from an I-record and a Q-record.
///
/// Pure and synchronous; the worker loop is a thin shell around it.
pub fn process_pair(
    dsp: &SignalProcessor,
    config: &RadarConfig,
    record_i: &ChannelRecord,
    record_q: &ChannelRecord,
) -> PipelineResult<RadarResult> {
    if record_i.up_samples.len() != record_q.up_samples.len()
        || record_i.down_samples.len() != record_q.down_samples.len()
    {
        return Err(PipelineError::InvalidRecord(format!(
            "I/Q ramp lengths differ: {}/{} up, {}/{} down",
            record_i.up_samples.len(),
            record_q.up_samples.len(),
            record_i.down_samples.len(),
            record_q.down_samples.len()
        )));
    }

    let signal_up = complex_baseband(&record_i.up_samples, &record_q.up_samples);
    let signal_down = complex_baseband(&record_i.down_samples, &record_q.down_samples);

    let up = dsp.peak_frequency(&signal_up)?;
    let down = dsp.peak_frequency(&signal_down)?;

    let distance = SignalProcessor::distance(
        up.peak_frequency,
        down.peak_frequency,
        config.speed_of_light,
        config.sweep_rate(),
    );
    let velocity = SignalProcessor::velocity(
        up.peak_frequency,
        down.peak_frequency,
        config.speed_of_light,
        config.center_frequency,
    );
    let direction = SignalProcessor::direction(up.peak_frequency, down.peak_frequency);

    Ok(RadarResult {
        signal_up,
        signal_down,
        spectrum_up: up.magnitude,
        spectrum_down: down.magnitude,
        frequency_axis: up.frequency_axis,
        f_up: up.peak_frequency,
        f_down: down.peak_frequency,
        distance,
        velocity,
        direction,
        i_up: record_i.up_samples.clone(),
        q_up: record_q.up_samples.clone(),
        i_down: record_i.down_samples.clone(),
        q_down: record_q.down_samples.clone(),
    })
}

fn complex_baseband(in_phase: &[i16], quadrature: &[i16]) -> Vec<Complex32> {
    in_phase
        .iter()
        .zip(quadrature)
        .map(|(&i, &q)| Complex32::new(i as f32, q as f32))
        .collect()
}

/// Worker that drains both channel queues, pairs the latest record from
/// each, and publishes one `RadarResult` per pairing to every output.
pub struct RadarProcessor {
    stop: StopFlag,
    handle: Option<JoinHandle<()>>,
}

impl RadarProcessor {
    pub fn spawn(
        config: RadarConfig,
        metrics: Arc<PipelineMetrics>,
        rx_i: QueueReceiver<ChannelRecord>,
        rx_q: QueueReceiver<ChannelRecord>,
        outputs: Vec<QueueSender<Arc<RadarResult>>>,
    ) -> Self {
        let stop = StopFlag::new();
        let worker_stop = stop.clone();
        let handle =
            thread::spawn(move || process_loop(config, metrics, rx_i, rx_q, outputs, worker_stop));
        info!("[PROC] processor started");
        Self {
            stop,
            handle: Some(handle),
        }
    }

    pub fn stop(mut self, grace: Duration) {
        self.stop.trigger();
        if let Some(handle) = self.handle.take() {
            join_timeout(handle, grace, "processor");
        }
    }
}

fn process_loop(
    config: RadarConfig,
    metrics: Arc<PipelineMetrics>,
    rx_i: QueueReceiver<ChannelRecord>,
    rx_q: QueueReceiver<ChannelRecord>,
    outputs: Vec<QueueSender<Arc<RadarResult>>>,
    stop: StopFlag,
) {
    let dsp = SignalProcessor::new(config.sample_rate);
    let mut latest_i: Option<ChannelRecord> = None;
    let mut latest_q: Option<ChannelRecord> = None;

    while !stop.is_set() {
        if let Some(record) = rx_i.recv_timeout(DEQUEUE_WAIT) {
            debug!("[PROC] I record received");
            latest_i = Some(record);
        }
        if let Some(record) = rx_q.recv_timeout(DEQUEUE_WAIT) {
            debug!("[PROC] Q record received");
            latest_q = Some(record);
        }

        if latest_i.is_some() && latest_q.is_some() {
            if let (Some(record_i), Some(record_q)) = (latest_i.take(), latest_q.take()) {
                match process_pair(&dsp, &config, &record_i, &record_q) {
                    Ok(result) => {
                        info!(
                            "[PROC] f_up {:.2} Hz, f_down {:.2} Hz -> {:.4} m, {:.4} m/s, {}",
                            result.f_up,
                            result.f_down,
                            result.distance,
                            result.velocity,
                            result.direction
                        );
                        let result = Arc::new(result);
                        for output in &outputs {
                            output.push(Arc::clone(&result));
                        }
                        metrics.record_pairing();
                    }
                    Err(err) => {
                        // Slots were already cleared by take(); the loop
                        // continues with the next pair.
                        error!("[PROC] pairing cycle failed: {}", err);
                        metrics.record_error();
                    }
                }
            }
        }
    }
    info!("[PROC] processor stopped");
}

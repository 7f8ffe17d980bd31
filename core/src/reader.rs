//! Per-channel acquisition worker.

use crate::frame::{PacketParser, TYPE_DOWN, TYPE_UP};
use crate::queue::QueueSender;
use crate::records::{ChannelId, ChannelRecord};
use crate::telemetry::PipelineMetrics;
use crate::worker::{join_timeout, StopFlag};
use crate::{PipelineResult, RadarConfig};
use log::{debug, error, info, warn};
use std::io::{self, Read};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Sweep reassembly state private to one reader. A record only becomes
/// visible once both ramps are populated.
struct PendingSweep {
    channel: ChannelId,
    samples_per_ramp: usize,
    up: Option<Vec<i16>>,
    down: Option<Vec<i16>>,
}

impl PendingSweep {
    fn new(channel: ChannelId, samples_per_ramp: usize) -> Self {
        Self {
            channel,
            samples_per_ramp,
            up: None,
            down: None,
        }
    }

    fn set_up(&mut self, samples: &[i16]) {
        self.up = Some(samples.to_vec());
    }

    fn set_down(&mut self, samples: &[i16]) {
        self.down = Some(samples.to_vec());
    }

    /// Converts to an emitted record once both ramps are present,
    /// leaving this sweep empty for the next cycle.
    fn take_complete(&mut self) -> Option<PipelineResult<ChannelRecord>> {
        if self.up.is_some() && self.down.is_some() {
            let up = self.up.take()?;
            let down = self.down.take()?;
            Some(ChannelRecord::new(
                self.channel,
                up,
                down,
                self.samples_per_ramp,
            ))
        } else {
            None
        }
    }
}

/// Owns one serial connection and reassembles framed ramp packets into
/// complete per-channel sweeps.
pub struct ChannelReader {
    channel: ChannelId,
    stop: StopFlag,
    handle: Option<JoinHandle<()>>,
}

impl ChannelReader {
    /// Spawns the reader worker. `open` runs inside the worker thread;
    /// if it fails the worker logs the error and ends permanently, which
    /// silently disables this one channel. The byte source is expected
    /// to enforce its own read timeout.
    pub fn spawn<R, F>(
        channel: ChannelId,
        config: RadarConfig,
        metrics: Arc<PipelineMetrics>,
        open: F,
        output: QueueSender<ChannelRecord>,
    ) -> Self
    where
        R: Read + Send + 'static,
        F: FnOnce() -> io::Result<R> + Send + 'static,
    {
        let stop = StopFlag::new();
        let worker_stop = stop.clone();
        let handle = thread::spawn(move || {
            read_loop(channel, config, metrics, open, output, worker_stop)
        });
        info!("[{}] reader started", channel);
        Self {
            channel,
            stop,
            handle: Some(handle),
        }
    }

    /// Signals the worker to stop and waits up to `grace` for it.
    pub fn stop(mut self, grace: Duration) {
        self.stop.trigger();
        if let Some(handle) = self.handle.take() {
            join_timeout(handle, grace, &format!("reader {}", self.channel));
        }
    }
}

fn read_loop<R, F>(
    channel: ChannelId,
    config: RadarConfig,
    metrics: Arc<PipelineMetrics>,
    open: F,
    output: QueueSender<ChannelRecord>,
    stop: StopFlag,
) where
    R: Read + Send + 'static,
    F: FnOnce() -> io::Result<R> + Send + 'static,
{
    let mut source = match open() {
        Ok(source) => source,
        Err(err) => {
            // Fatal to this worker only; the channel stays silent.
            error!("[{}] failed to open byte source: {}", channel, err);
            metrics.record_error();
            return;
        }
    };

    let parser = PacketParser::new(config.n_samples);
    let samples_per_ramp = config.samples_per_ramp;
    let mut pending = PendingSweep::new(channel, samples_per_ramp);

    while !stop.is_set() {
        let Some((pkt_type, samples)) = parser.read_packet(&mut source) else {
            continue;
        };
        metrics.record_packet_decoded();

        if samples.len() < samples_per_ramp {
            warn!(
                "[{}] payload of {} samples shorter than ramp length {}, dropping",
                channel,
                samples.len(),
                samples_per_ramp
            );
            metrics.record_packet_dropped();
            continue;
        }

        match pkt_type {
            TYPE_UP => {
                debug!("[{}] up-ramp received", channel);
                pending.set_up(&samples[..samples_per_ramp]);
            }
            TYPE_DOWN => {
                debug!("[{}] down-ramp received", channel);
                pending.set_down(&samples[samples.len() - samples_per_ramp..]);
            }
            other => {
                debug!("[{}] ignoring packet type {}", channel, other);
                continue;
            }
        }

        if let Some(result) = pending.take_complete() {
            match result {
                Ok(record) => {
                    output.push(record);
                    metrics.record_sweep_emitted();
                    debug!("[{}] sweep handed off", channel);
                }
                Err(err) => {
                    error!("[{}] discarding malformed sweep: {}", channel, err);
                    metrics.record_error();
                }
            }
        }
    }
    info!("[{}] reader stopped", channel);
}

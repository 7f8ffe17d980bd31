//! Result reporter: logs each measurement and optionally appends it as
//! a JSON line for offline inspection. Stands in for the live plotter
//! at its queue boundary.

use fmcwcore::prelude::{QueueReceiver, RadarResult, StopFlag};
use fmcwcore::worker::join_timeout;
use log::{error, info};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const DEQUEUE_WAIT: Duration = Duration::from_millis(500);

/// Scalar slice of a `RadarResult` written to the report stream; the
/// bulky sample arrays stay out of the file.
#[derive(Serialize)]
struct ReportLine {
    f_up: f64,
    f_down: f64,
    distance: f64,
    velocity: f64,
    direction: String,
}

impl From<&RadarResult> for ReportLine {
    fn from(result: &RadarResult) -> Self {
        Self {
            f_up: result.f_up,
            f_down: result.f_down,
            distance: result.distance,
            velocity: result.velocity,
            direction: result.direction.to_string(),
        }
    }
}

pub struct ResultReporter {
    stop: StopFlag,
    handle: Option<JoinHandle<()>>,
}

impl ResultReporter {
    pub fn spawn(input: QueueReceiver<Arc<RadarResult>>, report_path: Option<PathBuf>) -> Self {
        let stop = StopFlag::new();
        let worker_stop = stop.clone();
        let handle = thread::spawn(move || report_loop(input, report_path, worker_stop));
        info!("[REPORT] reporter started");
        Self {
            stop,
            handle: Some(handle),
        }
    }

    pub fn stop(mut self, grace: Duration) {
        self.stop.trigger();
        if let Some(handle) = self.handle.take() {
            join_timeout(handle, grace, "reporter");
        }
    }
}

fn report_loop(input: QueueReceiver<Arc<RadarResult>>, path: Option<PathBuf>, stop: StopFlag) {
    if let Some(parent) = path.as_deref().and_then(|p| p.parent()) {
        if let Err(err) = fs::create_dir_all(parent) {
            error!("[REPORT] cannot create report directory: {}", err);
        }
    }

    while !stop.is_set() {
        let Some(result) = input.recv_timeout(DEQUEUE_WAIT) else {
            continue;
        };
        info!(
            "[REPORT] f_up {:.2} Hz, f_down {:.2} Hz, distance {:.4} m, velocity {:.4} m/s, {}",
            result.f_up, result.f_down, result.distance, result.velocity, result.direction
        );

        if let Some(path) = &path {
            if let Err(err) = append_line(path, &result) {
                error!("[REPORT] write to {} failed: {}", path.display(), err);
            }
        }
    }
    info!("[REPORT] reporter stopped");
}

fn append_line(path: &PathBuf, result: &RadarResult) -> anyhow::Result<()> {
    let line = serde_json::to_string(&ReportLine::from(result))?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fmcwcore::dsp::SignalProcessor;
    use fmcwcore::processor::process_pair;
    use fmcwcore::prelude::{bounded_queue, ChannelId, ChannelRecord, RadarConfig};

    #[test]
    fn reporter_appends_one_json_line_per_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");

        let config = RadarConfig {
            samples_per_ramp: 4,
            n_samples: 4,
            ..RadarConfig::default()
        };
        let record_i =
            ChannelRecord::new(ChannelId::I, vec![100, 0, -100, 0], vec![50, 0, -50, 0], 4)
                .unwrap();
        let record_q =
            ChannelRecord::new(ChannelId::Q, vec![0, 100, 0, -100], vec![0, 50, 0, -50], 4)
                .unwrap();
        let dsp = SignalProcessor::new(config.sample_rate);
        let result = process_pair(&dsp, &config, &record_i, &record_q).unwrap();

        let (tx, rx) = bounded_queue(4);
        let reporter = ResultReporter::spawn(rx, Some(path.clone()));
        tx.push(Arc::new(result));

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while fs::metadata(&path).is_err() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        reporter.stop(Duration::from_secs(1));

        let contents = fs::read_to_string(&path).unwrap();
        let line: serde_json::Value = serde_json::from_str(contents.lines().next().unwrap())
            .unwrap();
        assert!(line.get("distance").is_some());
        assert!(line.get("direction").is_some());
    }
}

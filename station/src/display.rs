//! Formats measurements for the auxiliary display link.

use fmcwcore::prelude::{QueueReceiver, RadarResult, StopFlag};
use fmcwcore::worker::join_timeout;
use log::{debug, error, info};
use std::io::{self, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const DEQUEUE_WAIT: Duration = Duration::from_millis(500);

/// One wire line per measurement: `D:<m>,V:<m/s>,DIR:<direction>\n`.
pub fn format_message(result: &RadarResult) -> String {
    format!(
        "D:{:.2},V:{:.2},DIR:{}\n",
        result.distance, result.velocity, result.direction
    )
}

/// Worker that drains a result queue onto the display serial link.
pub struct DisplayWriter {
    stop: StopFlag,
    handle: Option<JoinHandle<()>>,
}

impl DisplayWriter {
    /// Spawns the writer. `open` runs inside the worker; failure to open
    /// the link ends this worker permanently.
    pub fn spawn<W, F>(open: F, input: QueueReceiver<Arc<RadarResult>>) -> Self
    where
        W: Write + Send + 'static,
        F: FnOnce() -> io::Result<W> + Send + 'static,
    {
        let stop = StopFlag::new();
        let worker_stop = stop.clone();
        let handle = thread::spawn(move || write_loop(open, input, worker_stop));
        info!("[DISPLAY] writer started");
        Self {
            stop,
            handle: Some(handle),
        }
    }

    pub fn stop(mut self, grace: Duration) {
        self.stop.trigger();
        if let Some(handle) = self.handle.take() {
            join_timeout(handle, grace, "display");
        }
    }
}

fn write_loop<W, F>(open: F, input: QueueReceiver<Arc<RadarResult>>, stop: StopFlag)
where
    W: Write + Send + 'static,
    F: FnOnce() -> io::Result<W> + Send + 'static,
{
    let mut link = match open() {
        Ok(link) => link,
        Err(err) => {
            error!("[DISPLAY] failed to open display link: {}", err);
            return;
        }
    };

    while !stop.is_set() {
        let Some(result) = input.recv_timeout(DEQUEUE_WAIT) else {
            continue;
        };
        let message = format_message(&result);
        match link
            .write_all(message.as_bytes())
            .and_then(|_| link.flush())
        {
            Ok(()) => debug!("[DISPLAY] sent: {}", message.trim_end()),
            Err(err) => error!("[DISPLAY] send failed: {}", err),
        }
    }
    info!("[DISPLAY] writer stopped");
}

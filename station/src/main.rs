use anyhow::Context;
use clap::Parser;
use config::StationConfig;
use display::DisplayWriter;
use fmcwcore::prelude::{
    bounded_queue, ChannelId, ChannelReader, PipelineMetrics, RadarProcessor,
};
use log::info;
use report::ResultReporter;
use serialport::SerialPort;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;

mod config;
mod display;
mod report;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(author, version, about = "FMCW I/Q radar acquisition station")]
struct Args {
    /// Load station configuration from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Append each measurement as a JSON line to this file
    #[arg(long)]
    report: Option<PathBuf>,
    /// Disable the auxiliary display link regardless of configuration
    #[arg(long, default_value_t = false)]
    no_display: bool,
}

fn serial_opener(
    port: String,
    baud_rate: u32,
    timeout: Duration,
) -> impl FnOnce() -> io::Result<Box<dyn SerialPort>> + Send + 'static {
    move || {
        serialport::new(&port, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(io::Error::from)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let station_config = if let Some(path) = args.config {
        StationConfig::load(path)?
    } else {
        StationConfig::default()
    };
    let radar_config = station_config.radar.clone();
    let capacity = radar_config.queue_capacity;
    let display_enabled = station_config.display.enabled && !args.no_display;

    let metrics = Arc::new(PipelineMetrics::new());
    let (tx_i, rx_i) = bounded_queue(capacity);
    let (tx_q, rx_q) = bounded_queue(capacity);
    let (tx_results, rx_results) = bounded_queue(capacity);

    let reader_i = ChannelReader::spawn(
        ChannelId::I,
        radar_config.clone(),
        metrics.clone(),
        serial_opener(
            station_config.port_i.clone(),
            station_config.baud_rate,
            station_config.read_timeout(),
        ),
        tx_i,
    );
    let reader_q = ChannelReader::spawn(
        ChannelId::Q,
        radar_config.clone(),
        metrics.clone(),
        serial_opener(
            station_config.port_q.clone(),
            station_config.baud_rate,
            station_config.read_timeout(),
        ),
        tx_q,
    );

    let mut outputs = vec![tx_results];
    let mut display_writer = None;
    if display_enabled {
        let (tx_display, rx_display) = bounded_queue(capacity);
        outputs.push(tx_display);
        display_writer = Some(DisplayWriter::spawn(
            serial_opener(
                station_config.display.port.clone(),
                station_config.display.baud_rate,
                station_config.read_timeout(),
            ),
            rx_display,
        ));
        info!(
            "[MAIN] display link enabled on {}",
            station_config.display.port
        );
    }

    let processor = RadarProcessor::spawn(radar_config, metrics.clone(), rx_i, rx_q, outputs);
    let reporter = ResultReporter::spawn(rx_results, args.report);

    info!(
        "[MAIN] station running, channels {} / {} (Ctrl+C to stop)",
        station_config.port_i, station_config.port_q
    );
    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating runtime for signal handling")?;
    runtime.block_on(async {
        signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
        Ok::<(), anyhow::Error>(())
    })?;

    info!("[MAIN] stopping workers");
    reader_i.stop(SHUTDOWN_GRACE);
    reader_q.stop(SHUTDOWN_GRACE);
    processor.stop(SHUTDOWN_GRACE);
    if let Some(writer) = display_writer {
        writer.stop(SHUTDOWN_GRACE);
    }
    reporter.stop(SHUTDOWN_GRACE);

    let snapshot = metrics.snapshot();
    info!(
        "[MAIN] stopped: {}",
        serde_json::to_string(&snapshot).unwrap_or_default()
    );
    Ok(())
}

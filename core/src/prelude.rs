//! Convenience re-exports for pipeline consumers.

pub use crate::dsp::{SignalProcessor, Spectrum, FFT_SIZE};
pub use crate::frame::{PacketParser, FOOTER, HEADER, TYPE_DOWN, TYPE_UP};
pub use crate::processor::RadarProcessor;
pub use crate::queue::{bounded_queue, QueueReceiver, QueueSender};
pub use crate::reader::ChannelReader;
pub use crate::records::{ChannelId, ChannelRecord, Direction, RadarResult};
pub use crate::telemetry::{MetricsSnapshot, PipelineMetrics};
pub use crate::worker::StopFlag;
pub use crate::{PipelineError, PipelineResult, RadarConfig};

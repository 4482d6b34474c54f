pub mod error;
pub mod config;
pub mod ring_buffer;
pub mod signal;
pub mod hw;
pub mod bluetooth;
pub mod uart;
pub mod display;
pub mod speech;
pub mod search;
pub mod sim;
pub mod ffi;

#[cfg(feature = "python")]
pub mod python;

pub use error::{Error, Result};
pub use config::Config;
pub use ring_buffer::RingBuffer;
pub use signal::{RssiSmoother, SignalRange, angle_for_rssi};
pub use hw::{Crawler, CrawlerAction, Display, Hardware, Inquiry, RangeSensor, Speaker};
pub use bluetooth::{MacAddress, PhoneLocator, Sighting};
pub use uart::{CrawlerBridge, MsgType, SYNC_BYTE, MAX_MSG_SIZE};
pub use display::{Frame, compass_frame};
pub use search::{Decision, Heading, PhoneFinder, RunSummary, SearchPlanner, StepReport, Turn};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error{
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no {expected} reply within {timeout_ms} ms")]
    Timeout{ expected: &'static str, timeout_ms: u64 },

    #[error("controller rejected {msg_type:#04x} with status {status}")]
    Nack{ msg_type: u8, status: u8 },

    #[error("payload of {0} bytes does not fit in a frame")]
    PayloadTooLarge(usize),

    #[error("bluetooth scan failed: {0}")]
    Bluetooth(String),

    #[error("invalid MAC address '{0}'")]
    InvalidMac(String),

    #[error("display error: {0}")]
    Display(String),

    #[error("speech command '{command}' failed: {reason}")]
    Speech{ command: String, reason: String },

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

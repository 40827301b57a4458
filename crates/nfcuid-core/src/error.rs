use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Flag parsing errors
    #[error("Unknown character flag '{value}'. Options: {options}")]
    UnknownCharFlag { value: String, options: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration key: {0}")]
    MissingConfig(String),

    // Device selection errors
    #[error("Devices not found. Try to plug-in new device and restart")]
    NoDevices,

    #[error("Device flag should not exceed the number of available devices ({available})")]
    DeviceOutOfRange { requested: usize, available: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

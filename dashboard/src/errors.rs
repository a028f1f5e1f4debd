use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(#[from] toml::de::Error),
    #[error("Config serialization failed: {0}")]
    ConfigSerialization(#[from] toml::ser::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Logger error: {0}")]
    LoggerError(#[from] log::SetLoggerError),
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(#[from] log::ParseLevelError),
}

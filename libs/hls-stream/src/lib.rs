pub mod config;
pub mod hls;
pub mod media;
pub mod playlist;
pub mod segment;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export main types
pub use config::HlsConfig;
pub use hls::Hls;
pub use media::{MediaError, MediaSink};
pub use playlist::{Level, LevelDetails};
pub use segment::HlsSegment;

#[derive(Error, Debug)]
pub enum HlsStreamError {
    #[error("NetworkError: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("HttpStatus: {status} for {url}")]
    HttpStatus { status: u16, url: String },
    #[error("ParseError: {0}")]
    ParseError(String),
    #[error("InvalidUrl: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("NoSource")]
    NoSource,
    #[error("Destroyed")]
    Destroyed,
}

/// Error category, used by callers to pick a recovery routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorType {
    NetworkError,
    MediaError,
    MuxError,
    OtherError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorDetails {
    ManifestLoadError,
    ManifestParsingError,
    LevelLoadError,
    BufferAppendError,
    InternalException,
}

/// Payload of [`HlsEvent::Error`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorData {
    pub kind: ErrorType,
    pub details: ErrorDetails,
    pub fatal: bool,
    pub reason: String,
}

impl ErrorData {
    pub fn fatal(kind: ErrorType, details: ErrorDetails, reason: impl Into<String>) -> Self {
        Self {
            kind,
            details,
            fatal: true,
            reason: reason.into(),
        }
    }

    pub fn recoverable(kind: ErrorType, details: ErrorDetails, reason: impl Into<String>) -> Self {
        Self {
            kind,
            details,
            fatal: false,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ErrorData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?}/{:?}{}: {}",
            self.kind,
            self.details,
            if self.fatal { " (fatal)" } else { "" },
            self.reason
        )
    }
}

/// Summary delivered once the first level playlist has been parsed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestParsed {
    pub levels: Vec<Level>,
    pub live: bool,
    pub target_duration: f64,
}

/// Client events (pure metadata, no data)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HlsEvent {
    /// A media sink was attached (or re-attached after media recovery)
    MediaAttached,
    /// Source URL accepted, loading will start once media is attached
    ManifestLoading { url: String },
    /// Manifest and first level playlist parsed
    ManifestParsed(ManifestParsed),
    /// Live level playlist refreshed
    LevelUpdated {
        total_segments: usize,
        live_edge: f64,
    },
    /// Segment accepted by the media sink
    FragBuffered { sequence: u64, start: f64, duration: f64 },
    /// Back buffer segments evicted from the media sink
    BufferFlushed { evicted: usize },
    /// Playhead moved to the live sync position
    LiveCatchUp { position: f64 },
    Error(ErrorData),
    Destroying,
}

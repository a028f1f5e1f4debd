use async_trait::async_trait;
use thiserror::Error;

use crate::HlsSegment;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MediaError {
    #[error("media detached")]
    Detached,
    #[error("buffer full")]
    BufferFull,
    #[error("append rejected: {0}")]
    Rejected(String),
}

/// Playback target a [`crate::Hls`] client feeds segments into.
///
/// Positions are seconds on the stream timeline (see [`HlsSegment::start`]).
#[async_trait]
pub trait MediaSink: Send + Sync {
    async fn append_segment(&self, segment: &HlsSegment) -> Result<(), MediaError>;

    /// End of the contiguous buffered range, or the playhead when nothing is buffered
    async fn buffered_end(&self) -> f64;

    async fn current_time(&self) -> f64;

    async fn seek(&self, position: f64);

    /// Drop buffered segments ending before `position`, returning how many were dropped
    async fn evict_before(&self, position: f64) -> usize;

    /// Clear all buffered media, keeping the playhead
    async fn reset(&self);
}

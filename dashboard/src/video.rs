use std::sync::Arc;

use async_trait::async_trait;
use hls_stream::playlist::{fetch_text, parse_manifest, Manifest};
use hls_stream::{HlsSegment, MediaError, MediaSink};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;
use url::Url;

use crate::page::escape_html;

const HLS_MIME_TYPES: [&str; 2] = ["application/vnd.apple.mpegurl", "application/x-mpegurl"];

/// What the playback environment supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaCapabilities {
    /// The media stack plays HLS without a client library
    pub native_hls: bool,
    /// `play()` may start without a user gesture
    pub autoplay_allowed: bool,
}

impl Default for MediaCapabilities {
    fn default() -> Self {
        Self {
            native_hls: false,
            autoplay_allowed: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanPlay {
    No,
    Maybe,
    Probably,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlayError {
    #[error("play() was not allowed without user interaction")]
    NotAllowed,
    #[error("no media source")]
    NoSource,
}

#[derive(Error, Debug)]
pub enum VideoError {
    #[error("no media source")]
    NoSource,
    #[error("Invalid source URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Stream error: {0}")]
    Stream(#[from] hls_stream::HlsStreamError),
}

/// Metadata the native stack reports once a source is loaded
#[derive(Debug, Clone, PartialEq)]
pub struct MediaMetadata {
    pub live: bool,
    pub duration: Option<f64>,
    pub levels: usize,
}

#[derive(Debug, Default)]
struct VideoState {
    src: Option<String>,
    metadata: Option<MediaMetadata>,
    buffered: Vec<HlsSegment>,
    base_time: f64,
    playing_since: Option<Instant>,
}

impl VideoState {
    fn buffered_end(&self) -> f64 {
        // Contiguous range starting at or before the playhead
        let mut end = self.base_time;
        for segment in &self.buffered {
            if segment.start <= end + 0.001 && segment.end() > end {
                end = segment.end();
            }
        }
        end
    }

    fn current_time(&self) -> f64 {
        match self.playing_since {
            Some(since) => {
                let played = self.base_time + since.elapsed().as_secs_f64();
                played.min(self.buffered_end())
            }
            None => self.base_time,
        }
    }
}

/// Headless `<video>` element. Clones share the same element.
#[derive(Clone)]
pub struct VideoHandle {
    id: String,
    capabilities: MediaCapabilities,
    client: reqwest::Client,
    state: Arc<RwLock<VideoState>>,
}

impl VideoHandle {
    pub fn new(id: &str, capabilities: MediaCapabilities) -> Self {
        Self {
            id: id.to_string(),
            capabilities,
            client: reqwest::Client::new(),
            state: Arc::new(RwLock::new(VideoState::default())),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn can_play_type(&self, mime: &str) -> CanPlay {
        if self.capabilities.native_hls
            && HLS_MIME_TYPES
                .iter()
                .any(|hls| hls.eq_ignore_ascii_case(mime.trim()))
        {
            CanPlay::Maybe
        } else {
            CanPlay::No
        }
    }

    /// Point the element at a source URL for the native stack.
    pub async fn set_src(&self, url: &str) {
        let mut state = self.state.write().await;
        *state = VideoState {
            src: Some(url.to_string()),
            ..Default::default()
        };
    }

    /// Drop the source and everything buffered, as after `removeAttribute("src")`.
    pub async fn unload(&self) {
        *self.state.write().await = VideoState::default();
    }

    pub async fn src(&self) -> Option<String> {
        self.state.read().await.src.clone()
    }

    /// Load the source manifest through the native stack.
    pub async fn loaded_metadata(&self) -> Result<MediaMetadata, VideoError> {
        let src = self.src().await.ok_or(VideoError::NoSource)?;
        let url = Url::parse(&src)?;
        let content = fetch_text(&self.client, &url).await?;
        let metadata = match parse_manifest(content.as_bytes(), &url)? {
            Manifest::Master(levels) => MediaMetadata {
                live: true,
                duration: None,
                levels: levels.len(),
            },
            Manifest::Media(info) => MediaMetadata {
                live: !info.end_list,
                duration: (info.end_list).then(|| info.segments.iter().map(|s| s.duration).sum()),
                levels: 1,
            },
        };
        self.state.write().await.metadata = Some(metadata.clone());
        Ok(metadata)
    }

    pub async fn metadata(&self) -> Option<MediaMetadata> {
        self.state.read().await.metadata.clone()
    }

    pub async fn play(&self) -> Result<(), PlayError> {
        let mut state = self.state.write().await;
        if state.src.is_none() && state.buffered.is_empty() {
            return Err(PlayError::NoSource);
        }
        if !self.capabilities.autoplay_allowed {
            return Err(PlayError::NotAllowed);
        }
        if state.playing_since.is_none() {
            state.playing_since = Some(Instant::now());
        }
        Ok(())
    }

    pub async fn pause(&self) {
        let mut state = self.state.write().await;
        state.base_time = state.current_time();
        state.playing_since = None;
    }

    pub async fn is_paused(&self) -> bool {
        self.state.read().await.playing_since.is_none()
    }

    pub async fn buffered_segments(&self) -> usize {
        self.state.read().await.buffered.len()
    }

    pub async fn render(&self) -> String {
        let state = self.state.read().await;
        format!(
            r#"<video id="{}" data-src="{}" data-state="{}" data-position="{:.1}" muted playsinline></video>"#,
            self.id,
            escape_html(state.src.as_deref().unwrap_or_default()).replace('"', "&quot;"),
            if state.playing_since.is_some() {
                "playing"
            } else {
                "paused"
            },
            state.current_time()
        )
    }
}

#[async_trait]
impl MediaSink for VideoHandle {
    async fn append_segment(&self, segment: &HlsSegment) -> Result<(), MediaError> {
        let mut state = self.state.write().await;
        if state.buffered.iter().any(|s| s.sequence == segment.sequence) {
            return Ok(());
        }
        state.buffered.push(segment.clone());
        state
            .buffered
            .sort_by(|a, b| a.start.total_cmp(&b.start));
        Ok(())
    }

    async fn buffered_end(&self) -> f64 {
        self.state.read().await.buffered_end()
    }

    async fn current_time(&self) -> f64 {
        self.state.read().await.current_time()
    }

    async fn seek(&self, position: f64) {
        let mut state = self.state.write().await;
        state.base_time = position;
        if state.playing_since.is_some() {
            state.playing_since = Some(Instant::now());
        }
    }

    async fn evict_before(&self, position: f64) -> usize {
        let mut state = self.state.write().await;
        let before = state.buffered.len();
        state.buffered.retain(|s| s.end() > position);
        before - state.buffered.len()
    }

    async fn reset(&self) {
        let mut state = self.state.write().await;
        state.base_time = state.current_time();
        if state.playing_since.is_some() {
            state.playing_since = Some(Instant::now());
        }
        state.buffered.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(sequence: u64, start: f64) -> HlsSegment {
        HlsSegment::new(sequence, 1.0, format!("http://camera.local/seg{}.ts", sequence))
            .with_start(start)
    }

    #[test]
    fn test_can_play_type() {
        let native = VideoHandle::new(
            "cctv1",
            MediaCapabilities {
                native_hls: true,
                autoplay_allowed: true,
            },
        );
        assert_eq!(
            native.can_play_type("application/vnd.apple.mpegurl"),
            CanPlay::Maybe
        );
        assert_eq!(native.can_play_type("video/webm"), CanPlay::No);

        let plain = VideoHandle::new("cctv2", MediaCapabilities::default());
        assert_eq!(
            plain.can_play_type("application/vnd.apple.mpegurl"),
            CanPlay::No
        );
    }

    #[tokio::test]
    async fn test_buffer_tracks_contiguous_range() {
        let video = VideoHandle::new("cctv1", MediaCapabilities::default());
        video.seek(10.0).await;
        assert_eq!(video.buffered_end().await, 10.0);

        video.append_segment(&segment(10, 10.0)).await.unwrap();
        video.append_segment(&segment(11, 11.0)).await.unwrap();
        // Duplicate append is ignored
        video.append_segment(&segment(11, 11.0)).await.unwrap();
        // Gap: not part of the contiguous range
        video.append_segment(&segment(14, 14.0)).await.unwrap();
        assert_eq!(video.buffered_segments().await, 3);
        assert_eq!(video.buffered_end().await, 12.0);

        assert_eq!(video.evict_before(11.5).await, 1);
        video.reset().await;
        assert_eq!(video.buffered_segments().await, 0);
        assert_eq!(video.current_time().await, 10.0);
    }

    #[tokio::test]
    async fn test_play_requires_source_and_permission() {
        let video = VideoHandle::new("cctv1", MediaCapabilities::default());
        assert_eq!(video.play().await, Err(PlayError::NoSource));

        video.set_src("http://camera.local/index.m3u8").await;
        assert_eq!(video.play().await, Ok(()));
        assert!(!video.is_paused().await);
        video.pause().await;
        assert!(video.is_paused().await);

        let restricted = VideoHandle::new(
            "cctv2",
            MediaCapabilities {
                native_hls: false,
                autoplay_allowed: false,
            },
        );
        restricted.set_src("http://camera.local/index.m3u8").await;
        assert_eq!(restricted.play().await, Err(PlayError::NotAllowed));
        assert!(restricted.is_paused().await);
    }

    #[tokio::test]
    async fn test_playback_stalls_at_buffer_end() {
        let video = VideoHandle::new("cctv1", MediaCapabilities::default());
        video.append_segment(&segment(0, 0.0)).await.unwrap();
        video.play().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(1200)).await;
        assert_eq!(video.current_time().await, 1.0);
    }
}

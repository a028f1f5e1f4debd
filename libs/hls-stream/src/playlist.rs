use std::collections::BTreeMap;

use m3u8_rs::{parse_playlist_res, MasterPlaylist, MediaPlaylist, Playlist};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{HlsConfig, HlsSegment, HlsStreamError};

/// One variant of a master playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub url: String,
    pub bandwidth: u64,
    pub resolution: Option<String>,
    pub codecs: Option<String>,
}

/// Parsed media playlist, segments not yet placed on the timeline
#[derive(Debug, Clone)]
pub struct MediaInfo {
    pub target_duration: f64,
    pub media_sequence: u64,
    pub end_list: bool,
    pub segments: Vec<HlsSegment>,
}

#[derive(Debug, Clone)]
pub enum Manifest {
    Master(Vec<Level>),
    Media(MediaInfo),
}

/// Current state of the loaded level
#[derive(Debug, Clone)]
pub struct LevelDetails {
    pub url: String,
    pub target_duration: f64,
    pub live: bool,
    pub segments: Vec<HlsSegment>,
}

impl LevelDetails {
    pub fn live_edge(&self) -> f64 {
        self.segments.last().map(|s| s.end()).unwrap_or(0.0)
    }

    pub fn window_start(&self) -> f64 {
        self.segments.first().map(|s| s.start).unwrap_or(0.0)
    }

    /// Position `live_sync_duration_count` target durations behind the live edge.
    pub fn live_sync_position(&self, config: &HlsConfig) -> Option<f64> {
        if !self.live || self.segments.is_empty() {
            return None;
        }
        let offset = config.live_sync_duration_count as f64 * self.target_duration;
        Some((self.live_edge() - offset).max(self.window_start()))
    }

    /// Latency beyond which playback jumps back to the live sync position.
    pub fn max_latency(&self, config: &HlsConfig) -> Option<f64> {
        config
            .live_max_latency_duration_count
            .map(|count| count as f64 * self.target_duration)
    }
}

pub fn parse_manifest(content: &[u8], base: &Url) -> Result<Manifest, HlsStreamError> {
    match parse_playlist_res(content) {
        Ok(Playlist::MasterPlaylist(playlist)) => Ok(Manifest::Master(levels_from(&playlist, base)?)),
        Ok(Playlist::MediaPlaylist(playlist)) => Ok(Manifest::Media(media_from(&playlist, base)?)),
        Err(e) => Err(HlsStreamError::ParseError(format!("M3U8 parse error: {}", e))),
    }
}

fn levels_from(playlist: &MasterPlaylist, base: &Url) -> Result<Vec<Level>, HlsStreamError> {
    let mut levels = Vec::new();
    for variant in playlist.variants.iter().filter(|v| !v.is_i_frame) {
        levels.push(Level {
            url: base.join(&variant.uri)?.to_string(),
            bandwidth: variant.bandwidth,
            resolution: variant
                .resolution
                .as_ref()
                .map(|r| format!("{}x{}", r.width, r.height)),
            codecs: variant.codecs.clone(),
        });
    }
    if levels.is_empty() {
        return Err(HlsStreamError::ParseError(
            "Master playlist has no variants".to_string(),
        ));
    }
    Ok(levels)
}

fn media_from(playlist: &MediaPlaylist, base: &Url) -> Result<MediaInfo, HlsStreamError> {
    let mut segments = Vec::with_capacity(playlist.segments.len());
    for (i, segment) in playlist.segments.iter().enumerate() {
        let hls_segment = HlsSegment::new(
            playlist.media_sequence + i as u64,
            segment.duration.into(),
            base.join(&segment.uri)?.to_string(),
        );
        segments.push(hls_segment);
    }

    Ok(MediaInfo {
        target_duration: playlist.target_duration as f64,
        media_sequence: playlist.media_sequence,
        end_list: playlist.end_list,
        segments,
    })
}

pub async fn fetch_text(client: &reqwest::Client, url: &Url) -> Result<String, HlsStreamError> {
    let response = client.get(url.clone()).send().await?;
    if !response.status().is_success() {
        return Err(HlsStreamError::HttpStatus {
            status: response.status().as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response.text().await?)
}

/// Places sliding-window segments on a continuous timeline keyed by media sequence.
#[derive(Debug, Default)]
pub struct Timeline {
    starts: BTreeMap<u64, f64>,
    end: f64,
}

impl Timeline {
    pub fn update(&mut self, url: &str, info: MediaInfo) -> LevelDetails {
        let mut cursor = self.anchor(&info.segments);
        let mut segments = Vec::with_capacity(info.segments.len());
        for segment in info.segments {
            let placed = segment.with_start(cursor);
            cursor = placed.end();
            self.starts.insert(placed.sequence, placed.start);
            segments.push(placed);
        }
        self.end = self.end.max(cursor);

        // Forget sequences that slid out of the window
        if let Some(first) = segments.first() {
            let first_sequence = first.sequence;
            self.starts.retain(|&seq, _| seq >= first_sequence);
        }

        LevelDetails {
            url: url.to_string(),
            target_duration: info.target_duration,
            live: !info.end_list,
            segments,
        }
    }

    fn anchor(&self, segments: &[HlsSegment]) -> f64 {
        let mut preceding = 0.0;
        for segment in segments {
            if let Some(start) = self.starts.get(&segment.sequence) {
                return start - preceding;
            }
            preceding += segment.duration;
        }
        self.end
    }
}

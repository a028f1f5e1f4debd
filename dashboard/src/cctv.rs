use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use hls_stream::{ErrorData, ErrorType, Hls, HlsConfig, HlsEvent, HlsStreamError, MediaSink};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::api::{ApiClient, QueryParams};
use crate::config::Config;
use crate::page::{Label, Status, StatusIndicator};
use crate::video::{CanPlay, MediaCapabilities, VideoHandle};

pub const STREAMS_ENDPOINT: &str = "/cctv/streams";
pub const HLS_MIME: &str = "application/vnd.apple.mpegurl";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub name: String,
    pub stream_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamList {
    pub data: Vec<StreamDescriptor>,
}

#[derive(Debug, Clone, Copy)]
pub struct CctvOptions {
    pub auto_play: bool,
    pub hls_client_supported: bool,
}

impl From<&Config> for CctvOptions {
    fn from(config: &Config) -> Self {
        Self {
            auto_play: config.auto_play_cctv,
            hls_client_supported: config.playback.hls_client,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    Native,
    HlsClient,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    Attached {
        name: String,
        slot: usize,
        mode: PlaybackMode,
        playing: bool,
    },
    /// Neither native HLS nor the client is available
    Unsupported { name: String, slot: usize },
    /// No video element left for this stream
    Skipped { name: String },
    Failed {
        name: String,
        slot: usize,
        reason: String,
    },
}

/// Recovery routine picked for a fatal streaming error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    Reload,
    RecoverMedia,
    None,
}

#[async_trait]
pub trait Recoverable: Send + Sync {
    async fn start_load(&self) -> Result<(), HlsStreamError>;
    async fn recover_media_error(&self) -> Result<(), HlsStreamError>;
}

#[async_trait]
impl Recoverable for Hls {
    async fn start_load(&self) -> Result<(), HlsStreamError> {
        Hls::start_load(self).await
    }

    async fn recover_media_error(&self) -> Result<(), HlsStreamError> {
        Hls::recover_media_error(self).await
    }
}

/// Dispatch a fatal error to the matching recovery routine.
pub async fn recover<R: Recoverable + ?Sized>(player: &R, slot: usize, error: &ErrorData) -> Recovery {
    match error.kind {
        ErrorType::NetworkError => {
            log::info!("CCTV {}: network error, reloading", slot);
            if let Err(e) = player.start_load().await {
                log::error!("CCTV {}: reload failed: {}", slot, e);
            }
            Recovery::Reload
        }
        ErrorType::MediaError => {
            log::info!("CCTV {}: media error, recovering", slot);
            if let Err(e) = player.recover_media_error().await {
                log::error!("CCTV {}: media recovery failed: {}", slot, e);
            }
            Recovery::RecoverMedia
        }
        _ => {
            log::error!("CCTV {}: fatal error, playback impossible", slot);
            Recovery::None
        }
    }
}

async fn supervise(hls: Hls, slot: usize) {
    while let Some(event) = hls.recv().await {
        match event {
            HlsEvent::Error(error) if error.fatal => {
                log::error!("CCTV {} error: {}", slot, error);
                if error.kind == ErrorType::NetworkError {
                    tokio::time::sleep(hls.config().level_loading_retry_delay).await;
                }
                recover(&hls, slot, &error).await;
            }
            HlsEvent::Destroying => break,
            _ => {}
        }
    }
}

/// HLS client bound to a slot, with the task watching its errors.
pub struct StreamPlayer {
    hls: Hls,
    supervisor: JoinHandle<()>,
}

impl StreamPlayer {
    fn start(hls: Hls, slot: usize) -> Self {
        let supervisor = tokio::spawn(supervise(hls.clone(), slot));
        Self { hls, supervisor }
    }

    pub async fn shutdown(self) {
        self.supervisor.abort();
        self.hls.destroy().await;
    }
}

pub struct CctvSlot {
    pub name: Label,
    pub video: VideoHandle,
    player: Option<StreamPlayer>,
}

impl CctvSlot {
    pub fn player(&self) -> Option<&StreamPlayer> {
        self.player.as_ref()
    }
}

/// A stream name plus how many earlier descriptors in the list share it.
type StreamKey = (String, usize);

fn stream_keys(descriptors: &[StreamDescriptor]) -> Vec<StreamKey> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    descriptors
        .iter()
        .map(|descriptor| {
            let occurrence = seen.entry(descriptor.name.as_str()).or_default();
            let key = (descriptor.name.clone(), *occurrence);
            *occurrence += 1;
            key
        })
        .collect()
}

/// Status indicator and the pre-numbered `cctv{N}` video slots.
pub struct CctvPanel {
    pub status: StatusIndicator,
    slots: Vec<CctvSlot>,
    bindings: HashMap<StreamKey, usize>,
}

impl CctvPanel {
    pub fn new(slot_count: usize, capabilities: MediaCapabilities) -> Self {
        let slots = (1..=slot_count)
            .map(|n| CctvSlot {
                name: Label::new(&format!("cctv{}-name", n)),
                video: VideoHandle::new(&format!("cctv{}", n), capabilities),
                player: None,
            })
            .collect();
        Self {
            status: StatusIndicator::new("cctv-status"),
            slots,
            bindings: HashMap::new(),
        }
    }

    pub fn slots(&self) -> &[CctvSlot] {
        &self.slots
    }

    /// Slot index for each descriptor. Streams still listed keep their slot,
    /// slots of streams no longer listed are freed, new streams take the lowest
    /// free slot, and `None` means no slot is left. Repeated names are told
    /// apart by their order in the list.
    pub fn bind(&mut self, descriptors: &[StreamDescriptor]) -> Vec<Option<usize>> {
        let keys = stream_keys(descriptors);
        self.bindings.retain(|key, _| keys.contains(key));
        keys.into_iter()
            .map(|key| {
                if let Some(&index) = self.bindings.get(&key) {
                    return Some(index);
                }
                let free = (0..self.slots.len())
                    .find(|index| !self.bindings.values().any(|bound| bound == index))?;
                self.bindings.insert(key, free);
                Some(free)
            })
            .collect()
    }

    /// Stop and blank every slot no stream is assigned to.
    async fn release_unassigned(&mut self, assignments: &[Option<usize>]) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if assignments.contains(&Some(index)) {
                continue;
            }
            if let Some(player) = slot.player.take() {
                log::info!("CCTV {}: stream removed, stopping player", index + 1);
                player.shutdown().await;
            }
            slot.name.set_text("");
            slot.video.unload().await;
        }
    }

    pub async fn shutdown(&mut self) {
        for slot in self.slots.iter_mut() {
            if let Some(player) = slot.player.take() {
                player.shutdown().await;
            }
        }
    }

    pub async fn render(&self) -> String {
        let mut html = self.status.render();
        for slot in &self.slots {
            html.push_str(&format!(
                "\n<figure>{}<figcaption>{}</figcaption></figure>",
                slot.video.render().await,
                slot.name.render()
            ));
        }
        html
    }
}

async fn try_play(video: &VideoHandle, slot: usize) -> bool {
    match video.play().await {
        Ok(()) => true,
        Err(e) => {
            log::info!("CCTV {} autoplay failed: {}", slot, e);
            false
        }
    }
}

async fn attach_native(
    descriptor: &StreamDescriptor,
    slot: usize,
    video: &VideoHandle,
    options: CctvOptions,
) -> StreamOutcome {
    video.set_src(&descriptor.stream_url).await;
    match video.loaded_metadata().await {
        Ok(_) => {
            log::info!(
                "CCTV {} ({}): native HLS metadata loaded",
                slot,
                descriptor.name
            );
            let playing = options.auto_play && try_play(video, slot).await;
            StreamOutcome::Attached {
                name: descriptor.name.clone(),
                slot,
                mode: PlaybackMode::Native,
                playing,
            }
        }
        Err(e) => {
            log::error!("CCTV {} native playback error: {}", slot, e);
            StreamOutcome::Failed {
                name: descriptor.name.clone(),
                slot,
                reason: e.to_string(),
            }
        }
    }
}

async fn attach_hls(
    descriptor: &StreamDescriptor,
    slot: usize,
    video: &VideoHandle,
    options: CctvOptions,
) -> (StreamOutcome, Option<StreamPlayer>) {
    let failed = |reason: String| StreamOutcome::Failed {
        name: descriptor.name.clone(),
        slot,
        reason,
    };

    let hls = match Hls::new(HlsConfig::low_latency()) {
        Ok(hls) => hls,
        Err(e) => return (failed(e.to_string()), None),
    };
    let media: Arc<dyn MediaSink> = Arc::new(video.clone());
    if let Err(e) = hls.load_source(&descriptor.stream_url).await {
        return (failed(e.to_string()), None);
    }
    if let Err(e) = hls.attach_media(media).await {
        hls.destroy().await;
        return (failed(e.to_string()), None);
    }

    match hls.manifest_parsed().await {
        Ok(_) => {
            log::info!("CCTV {} ({}): stream ready", slot, descriptor.name);
            if let Some(position) = hls.live_sync_position().await {
                video.seek(position).await;
            }
            let playing = options.auto_play && try_play(video, slot).await;
            let outcome = StreamOutcome::Attached {
                name: descriptor.name.clone(),
                slot,
                mode: PlaybackMode::HlsClient,
                playing,
            };
            (outcome, Some(StreamPlayer::start(hls, slot)))
        }
        Err(error) => {
            log::error!("CCTV {} error: {}", slot, error);
            let reason = error.to_string();
            recover(&hls, slot, &error).await;
            // Keep the client so recovery can still bring the stream up
            (failed(reason), Some(StreamPlayer::start(hls, slot)))
        }
    }
}

async fn attach_stream(
    descriptor: StreamDescriptor,
    slot: usize,
    video: VideoHandle,
    options: CctvOptions,
) -> (StreamOutcome, Option<StreamPlayer>) {
    if video.can_play_type(HLS_MIME) != CanPlay::No {
        (attach_native(&descriptor, slot, &video, options).await, None)
    } else if options.hls_client_supported {
        attach_hls(&descriptor, slot, &video, options).await
    } else {
        log::error!("CCTV {}: HLS playback is not supported", slot);
        (
            StreamOutcome::Unsupported {
                name: descriptor.name,
                slot,
            },
            None,
        )
    }
}

/// Fetch the stream list and attach every stream that has a video slot.
pub async fn load_cctv_streams(
    api: &ApiClient,
    panel: &mut CctvPanel,
    options: CctvOptions,
) -> Vec<StreamOutcome> {
    panel.status.set(Status::Loading, "⏳ Loading...");

    let result = api.fetch_api(STREAMS_ENDPOINT, &QueryParams::new()).await;
    let data = match result.data() {
        Some(data) if result.is_ok() => data,
        _ => {
            panel.status.set(Status::Error, "❌ Failed");
            log::error!("Error: {}", result.failure_message());
            return Vec::new();
        }
    };
    let streams = match serde_json::from_value::<StreamList>(data.clone()) {
        Ok(list) => list.data,
        Err(e) => {
            panel.status.set(Status::Error, "❌ Failed");
            log::error!("Unexpected stream list: {}", e);
            return Vec::new();
        }
    };
    panel.status.set(Status::Success, "✅ Success");

    let assignments = panel.bind(&streams);
    panel.release_unassigned(&assignments).await;
    let mut skipped = Vec::new();
    let mut pending = Vec::new();
    for (descriptor, assignment) in streams.into_iter().zip(assignments) {
        let Some(index) = assignment else {
            log::debug!("No video element for stream {}, skipping", descriptor.name);
            skipped.push(StreamOutcome::Skipped {
                name: descriptor.name,
            });
            continue;
        };
        let slot = &mut panel.slots[index];
        slot.name.set_text(&descriptor.name);
        if let Some(previous) = slot.player.take() {
            previous.shutdown().await;
        }
        pending.push((index, attach_stream(descriptor, index + 1, slot.video.clone(), options)));
    }

    let (indices, futures): (Vec<_>, Vec<_>) = pending.into_iter().unzip();
    let results = join_all(futures).await;

    let mut outcomes = Vec::with_capacity(results.len() + skipped.len());
    for (index, (outcome, player)) in indices.into_iter().zip(results) {
        let slot = &mut panel.slots[index];
        if let StreamOutcome::Unsupported { name, .. } = &outcome {
            slot.name.set_text(&format!("{} (unsupported)", name));
        }
        if let Some(stale) = std::mem::replace(&mut slot.player, player) {
            stale.shutdown().await;
        }
        outcomes.push(outcome);
    }
    outcomes.extend(skipped);
    outcomes
}

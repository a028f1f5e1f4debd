use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use url::Url;

use crate::playlist::{fetch_text, parse_manifest, Manifest, MediaInfo, Timeline};
use crate::{
    ErrorData, ErrorDetails, ErrorType, HlsConfig, HlsEvent, HlsStreamError, Level, LevelDetails,
    ManifestParsed, MediaSink,
};

/// HLS client: loads a manifest, keeps the level playlist fresh and feeds
/// segment metadata into the attached [`MediaSink`].
///
/// Loading starts once both a source and a media sink are set. Fatal errors
/// stop the loader and are reported through [`HlsEvent::Error`]; callers
/// resume with [`Hls::start_load`] or [`Hls::recover_media_error`].
#[derive(Clone)]
pub struct Hls {
    config: Arc<HlsConfig>,
    client: reqwest::Client,
    source: Arc<RwLock<Option<Url>>>,
    media: Arc<RwLock<Option<Arc<dyn MediaSink>>>>,
    levels: Arc<RwLock<Vec<Level>>>,
    details: Arc<RwLock<Option<LevelDetails>>>,
    timeline: Arc<Mutex<Timeline>>,
    next_sequence: Arc<RwLock<Option<u64>>>,
    media_stalled: Arc<RwLock<bool>>,
    destroyed: Arc<RwLock<bool>>,
    loader: Arc<Mutex<Option<JoinHandle<()>>>>,
    event_tx: mpsc::UnboundedSender<HlsEvent>,
    event_rx: Arc<Mutex<mpsc::UnboundedReceiver<HlsEvent>>>,
}

impl Hls {
    pub fn new(config: HlsConfig) -> Result<Self, HlsStreamError> {
        let client = reqwest::Client::builder()
            .timeout(config.manifest_loading_timeout)
            .build()?;
        let (tx, rx) = mpsc::unbounded_channel();

        Ok(Self {
            config: Arc::new(config),
            client,
            source: Arc::new(RwLock::new(None)),
            media: Arc::new(RwLock::new(None)),
            levels: Arc::new(RwLock::new(Vec::new())),
            details: Arc::new(RwLock::new(None)),
            timeline: Arc::new(Mutex::new(Timeline::default())),
            next_sequence: Arc::new(RwLock::new(None)),
            media_stalled: Arc::new(RwLock::new(false)),
            destroyed: Arc::new(RwLock::new(false)),
            loader: Arc::new(Mutex::new(None)),
            event_tx: tx,
            event_rx: Arc::new(Mutex::new(rx)),
        })
    }

    pub fn config(&self) -> &HlsConfig {
        &self.config
    }

    /// Set the manifest URL. Loading starts right away if media is attached.
    pub async fn load_source(&self, url: &str) -> Result<(), HlsStreamError> {
        self.ensure_alive().await?;
        let url = Url::parse(url)?;
        self.stop_load().await;
        *self.source.write().await = Some(url.clone());
        // New source, new timeline. Reloads through start_load keep it.
        *self.timeline.lock().await = Timeline::default();
        *self.details.write().await = None;
        *self.next_sequence.write().await = None;
        self.emit(HlsEvent::ManifestLoading {
            url: url.to_string(),
        });

        if self.media.read().await.is_some() {
            self.start_load().await?;
        }
        Ok(())
    }

    /// Attach a playback target. Loading starts right away if a source is set.
    pub async fn attach_media(&self, media: Arc<dyn MediaSink>) -> Result<(), HlsStreamError> {
        self.ensure_alive().await?;
        *self.media.write().await = Some(media);
        self.emit(HlsEvent::MediaAttached);

        if self.source.read().await.is_some() {
            self.start_load().await?;
        }
        Ok(())
    }

    /// (Re)start the loader from the manifest. Used for network error recovery.
    pub async fn start_load(&self) -> Result<(), HlsStreamError> {
        self.ensure_alive().await?;
        let source = self
            .source
            .read()
            .await
            .clone()
            .ok_or(HlsStreamError::NoSource)?;

        let mut loader = self.loader.lock().await;
        if let Some(handle) = loader.take() {
            handle.abort();
        }

        let hls = self.clone();
        *loader = Some(tokio::spawn(async move {
            hls.load_loop(source).await;
        }));
        Ok(())
    }

    pub async fn stop_load(&self) {
        if let Some(handle) = self.loader.lock().await.take() {
            handle.abort();
        }
    }

    /// Flush the media buffer and resume feeding from the playhead.
    pub async fn recover_media_error(&self) -> Result<(), HlsStreamError> {
        self.ensure_alive().await?;
        let media = self.media.read().await.clone();
        if let Some(media) = media {
            media.reset().await;
            *self.next_sequence.write().await = None;
            *self.media_stalled.write().await = false;
            self.emit(HlsEvent::MediaAttached);
            log::info!("Media buffer reset, resuming from playhead");
        }
        Ok(())
    }

    pub async fn destroy(&self) {
        self.emit(HlsEvent::Destroying);
        self.stop_load().await;
        *self.destroyed.write().await = true;
        *self.media.write().await = None;
        *self.details.write().await = None;
    }

    /// Receive client events
    pub async fn recv(&self) -> Option<HlsEvent> {
        self.event_rx.lock().await.recv().await
    }

    /// Wait until the first level playlist is parsed, or a fatal error occurs first.
    pub async fn manifest_parsed(&self) -> Result<ManifestParsed, ErrorData> {
        while let Some(event) = self.recv().await {
            match event {
                HlsEvent::ManifestParsed(parsed) => return Ok(parsed),
                HlsEvent::Error(error) if error.fatal => return Err(error),
                HlsEvent::Error(error) => log::warn!("Non-fatal error before manifest: {}", error),
                HlsEvent::Destroying => break,
                _ => {}
            }
        }
        Err(ErrorData::fatal(
            ErrorType::OtherError,
            ErrorDetails::InternalException,
            "client destroyed before manifest was parsed",
        ))
    }

    pub async fn levels(&self) -> Vec<Level> {
        self.levels.read().await.clone()
    }

    pub async fn live_sync_position(&self) -> Option<f64> {
        self.details
            .read()
            .await
            .as_ref()
            .and_then(|details| details.live_sync_position(&self.config))
    }

    async fn ensure_alive(&self) -> Result<(), HlsStreamError> {
        if *self.destroyed.read().await {
            return Err(HlsStreamError::Destroyed);
        }
        Ok(())
    }

    fn emit(&self, event: HlsEvent) {
        let _ = self.event_tx.send(event);
    }

    fn emit_error(&self, error: ErrorData) {
        if error.fatal {
            log::error!("HLS error: {}", error);
        } else {
            log::warn!("HLS error: {}", error);
        }
        self.emit(HlsEvent::Error(error));
    }

    async fn parse(&self, content: String, base: Url) -> Result<Manifest, HlsStreamError> {
        if self.config.enable_worker {
            tokio::task::spawn_blocking(move || parse_manifest(content.as_bytes(), &base))
                .await
                .map_err(|e| HlsStreamError::ParseError(format!("parser task failed: {}", e)))?
        } else {
            parse_manifest(content.as_bytes(), &base)
        }
    }

    async fn load_media_playlist(&self, url: &Url) -> Result<MediaInfo, HlsStreamError> {
        let content = fetch_text(&self.client, url).await?;
        match self.parse(content, url.clone()).await? {
            Manifest::Media(info) => Ok(info),
            Manifest::Master(_) => Err(HlsStreamError::ParseError(
                "Level playlist is a master playlist".to_string(),
            )),
        }
    }

    // Core loading loop
    async fn load_loop(&self, source: Url) {
        log::debug!("Loading manifest: {}", source);

        let content = match fetch_text(&self.client, &source).await {
            Ok(content) => content,
            Err(e) => {
                self.emit_error(ErrorData::fatal(
                    ErrorType::NetworkError,
                    ErrorDetails::ManifestLoadError,
                    e.to_string(),
                ));
                return;
            }
        };

        let (levels, level_url, mut pending) = match self.parse(content, source.clone()).await {
            Ok(Manifest::Master(levels)) => match Url::parse(&levels[0].url) {
                Ok(url) => (levels, url, None),
                Err(e) => {
                    self.emit_error(ErrorData::fatal(
                        ErrorType::NetworkError,
                        ErrorDetails::ManifestParsingError,
                        e.to_string(),
                    ));
                    return;
                }
            },
            Ok(Manifest::Media(info)) => {
                let level = Level {
                    url: source.to_string(),
                    bandwidth: 0,
                    resolution: None,
                    codecs: None,
                };
                (vec![level], source.clone(), Some(info))
            }
            Err(e) => {
                self.emit_error(ErrorData::fatal(
                    ErrorType::NetworkError,
                    ErrorDetails::ManifestParsingError,
                    e.to_string(),
                ));
                return;
            }
        };
        *self.levels.write().await = levels.clone();

        let mut parsed_sent = false;
        let mut consecutive_errors = 0u32;

        loop {
            let info = match pending.take() {
                Some(info) => info,
                None => match self.load_media_playlist(&level_url).await {
                    Ok(info) => {
                        consecutive_errors = 0;
                        info
                    }
                    Err(e) => {
                        consecutive_errors += 1;
                        if consecutive_errors > self.config.level_loading_max_retry {
                            self.emit_error(ErrorData::fatal(
                                ErrorType::NetworkError,
                                ErrorDetails::LevelLoadError,
                                e.to_string(),
                            ));
                            return;
                        }
                        self.emit_error(ErrorData::recoverable(
                            ErrorType::NetworkError,
                            ErrorDetails::LevelLoadError,
                            format!("attempt {}: {}", consecutive_errors, e),
                        ));
                        tokio::time::sleep(self.config.retry_delay(consecutive_errors)).await;
                        continue;
                    }
                },
            };

            let details = self.timeline.lock().await.update(level_url.as_str(), info);
            *self.details.write().await = Some(details.clone());

            if parsed_sent {
                self.emit(HlsEvent::LevelUpdated {
                    total_segments: details.segments.len(),
                    live_edge: details.live_edge(),
                });
            } else {
                parsed_sent = true;
                self.emit(HlsEvent::ManifestParsed(ManifestParsed {
                    levels: levels.clone(),
                    live: details.live,
                    target_duration: details.target_duration,
                }));
            }

            self.feed_media(&details).await;

            if !details.live {
                // VOD: no reloads, keep topping up the buffer until everything is appended
                loop {
                    if self.fully_buffered(&details).await {
                        log::debug!("All segments buffered, loader finished");
                        return;
                    }
                    tokio::time::sleep(self.config.refresh_interval(details.target_duration)).await;
                    self.feed_media(&details).await;
                }
            }

            tokio::time::sleep(self.config.refresh_interval(details.target_duration)).await;
        }
    }

    async fn fully_buffered(&self, details: &LevelDetails) -> bool {
        match (details.segments.last(), *self.next_sequence.read().await) {
            (Some(last), Some(next)) => next > last.sequence,
            (None, _) => true,
            _ => false,
        }
    }

    async fn feed_media(&self, details: &LevelDetails) {
        let Some(media) = self.media.read().await.clone() else {
            return;
        };
        if *self.media_stalled.read().await {
            return;
        }

        let mut position = media.current_time().await;

        if let Some(sync) = details.live_sync_position(&self.config) {
            let starting = self.next_sequence.read().await.is_none() && position < sync;
            let too_far_behind = details
                .max_latency(&self.config)
                .is_some_and(|max| details.live_edge() - position > max);
            if starting || too_far_behind {
                media.seek(sync).await;
                *self.next_sequence.write().await = None;
                position = sync;
                self.emit(HlsEvent::LiveCatchUp { position: sync });
            }
        }

        if self.config.back_buffer_length.is_finite() {
            let evicted = media
                .evict_before(position - self.config.back_buffer_length)
                .await;
            if evicted > 0 {
                self.emit(HlsEvent::BufferFlushed { evicted });
            }
        }

        let goal = self.config.buffer_goal();
        for segment in &details.segments {
            let next = *self.next_sequence.read().await;
            match next {
                Some(next) if segment.sequence < next => continue,
                None if segment.end() <= position => continue,
                _ => {}
            }
            if media.buffered_end().await - position >= goal {
                break;
            }

            match media.append_segment(segment).await {
                Ok(()) => {
                    *self.next_sequence.write().await = Some(segment.sequence + 1);
                    self.emit(HlsEvent::FragBuffered {
                        sequence: segment.sequence,
                        start: segment.start,
                        duration: segment.duration,
                    });
                }
                Err(e) => {
                    *self.media_stalled.write().await = true;
                    self.emit_error(ErrorData::fatal(
                        ErrorType::MediaError,
                        ErrorDetails::BufferAppendError,
                        e.to_string(),
                    ));
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{extract::Path, http::StatusCode, routing::get, Router};

    use super::*;
    use crate::{HlsSegment, MediaError};

    #[derive(Default)]
    struct RecordingSink {
        appended: std::sync::Mutex<Vec<HlsSegment>>,
        position: std::sync::Mutex<f64>,
        fail_appends: AtomicUsize,
        resets: AtomicUsize,
    }

    #[async_trait]
    impl MediaSink for RecordingSink {
        async fn append_segment(&self, segment: &HlsSegment) -> Result<(), MediaError> {
            if self.fail_appends.load(Ordering::SeqCst) > 0 {
                self.fail_appends.fetch_sub(1, Ordering::SeqCst);
                return Err(MediaError::Rejected("decoder error".to_string()));
            }
            self.appended.lock().unwrap().push(segment.clone());
            Ok(())
        }

        async fn buffered_end(&self) -> f64 {
            let position = *self.position.lock().unwrap();
            self.appended
                .lock()
                .unwrap()
                .last()
                .map(|s| s.end().max(position))
                .unwrap_or(position)
        }

        async fn current_time(&self) -> f64 {
            *self.position.lock().unwrap()
        }

        async fn seek(&self, position: f64) {
            *self.position.lock().unwrap() = position;
        }

        async fn evict_before(&self, position: f64) -> usize {
            let mut appended = self.appended.lock().unwrap();
            let before = appended.len();
            appended.retain(|s| s.end() > position);
            before - appended.len()
        }

        async fn reset(&self) {
            self.resets.fetch_add(1, Ordering::SeqCst);
            self.appended.lock().unwrap().clear();
        }
    }

    fn playlist(sequence: u64, count: u64, end_list: bool) -> String {
        let mut content = format!(
            "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:1\n#EXT-X-MEDIA-SEQUENCE:{}\n",
            sequence
        );
        for seq in sequence..sequence + count {
            content.push_str(&format!("#EXTINF:1.0,\nseg{}.ts\n", seq));
        }
        if end_list {
            content.push_str("#EXT-X-ENDLIST\n");
        }
        content
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// Live playlist of eight segments whose window starts at `first`.
    async fn sliding_live_source(first: Arc<AtomicU64>) -> String {
        let app = Router::new().route(
            "/live/index.m3u8",
            get(move || {
                let first = first.clone();
                async move { playlist(first.load(Ordering::SeqCst), 8, false) }
            }),
        );
        format!("{}/live/index.m3u8", serve(app).await)
    }

    async fn next_event(hls: &Hls, wanted: fn(&HlsEvent) -> bool) -> HlsEvent {
        let wait = async {
            loop {
                match hls.recv().await {
                    Some(event) if wanted(&event) => return event,
                    Some(_) => continue,
                    None => panic!("event channel closed"),
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(5), wait)
            .await
            .expect("event not received")
    }

    fn test_config() -> HlsConfig {
        HlsConfig {
            level_loading_retry_delay: Duration::from_millis(10),
            ..HlsConfig::low_latency()
        }
    }

    #[tokio::test]
    async fn test_live_stream_starts_at_live_sync_position() {
        let _ = env_logger::try_init();
        let app = Router::new().route(
            "/live/index.m3u8",
            get(|| async { playlist(100, 12, false) }),
        );
        let base = serve(app).await;

        let hls = Hls::new(test_config()).unwrap();
        let sink = Arc::new(RecordingSink::default());
        hls.load_source(&format!("{}/live/index.m3u8", base))
            .await
            .unwrap();
        hls.attach_media(sink.clone()).await.unwrap();

        let parsed = hls.manifest_parsed().await.unwrap();
        assert!(parsed.live);
        assert_eq!(parsed.levels.len(), 1);
        assert_eq!(parsed.target_duration, 1.0);
        // 12 one-second segments, three behind the edge
        assert_eq!(hls.live_sync_position().await, Some(9.0));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sink.current_time().await, 9.0);
        let appended = sink.appended.lock().unwrap().clone();
        assert_eq!(appended.first().map(|s| s.sequence), Some(109));
        assert_eq!(appended.last().map(|s| s.sequence), Some(111));
        hls.destroy().await;
    }

    #[tokio::test]
    async fn test_master_playlist_loads_first_level() {
        let app = Router::new()
            .route(
                "/master.m3u8",
                get(|| async {
                    "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360\nlow/index.m3u8\n#EXT-X-STREAM-INF:BANDWIDTH=2000000\nhigh/index.m3u8\n"
                }),
            )
            .route(
                "/:level/index.m3u8",
                get(|Path(level): Path<String>| async move {
                    assert_eq!(level, "low");
                    playlist(0, 4, true)
                }),
            );
        let base = serve(app).await;

        let hls = Hls::new(test_config()).unwrap();
        let sink = Arc::new(RecordingSink::default());
        hls.attach_media(sink.clone()).await.unwrap();
        hls.load_source(&format!("{}/master.m3u8", base)).await.unwrap();

        let parsed = hls.manifest_parsed().await.unwrap();
        assert!(!parsed.live);
        assert_eq!(parsed.levels.len(), 2);
        assert!(parsed.levels[0].url.ends_with("/low/index.m3u8"));
        assert_eq!(hls.live_sync_position().await, None);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sink.appended.lock().unwrap().len(), 4);
        hls.destroy().await;
    }

    #[tokio::test]
    async fn test_manifest_failure_is_fatal_network_error() {
        let app = Router::new().route(
            "/missing.m3u8",
            get(|| async { (StatusCode::NOT_FOUND, "gone") }),
        );
        let base = serve(app).await;

        let hls = Hls::new(test_config()).unwrap();
        hls.load_source(&format!("{}/missing.m3u8", base))
            .await
            .unwrap();
        hls.attach_media(Arc::new(RecordingSink::default()))
            .await
            .unwrap();

        let error = hls.manifest_parsed().await.unwrap_err();
        assert!(error.fatal);
        assert_eq!(error.kind, ErrorType::NetworkError);
        assert_eq!(error.details, ErrorDetails::ManifestLoadError);
    }

    #[tokio::test]
    async fn test_start_load_retries_manifest() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/flaky.m3u8",
            get(move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        (StatusCode::SERVICE_UNAVAILABLE, String::new())
                    } else {
                        (StatusCode::OK, playlist(0, 3, true))
                    }
                }
            }),
        );
        let base = serve(app).await;

        let hls = Hls::new(test_config()).unwrap();
        hls.load_source(&format!("{}/flaky.m3u8", base)).await.unwrap();
        hls.attach_media(Arc::new(RecordingSink::default()))
            .await
            .unwrap();
        assert!(hls.manifest_parsed().await.is_err());

        hls.start_load().await.unwrap();
        assert!(hls.manifest_parsed().await.is_ok());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_append_failure_stalls_until_media_recovery() {
        let app = Router::new().route("/vod.m3u8", get(|| async { playlist(0, 3, true) }));
        let base = serve(app).await;

        let hls = Hls::new(test_config()).unwrap();
        let sink = Arc::new(RecordingSink::default());
        sink.fail_appends.store(1, Ordering::SeqCst);
        hls.load_source(&format!("{}/vod.m3u8", base)).await.unwrap();
        hls.attach_media(sink.clone()).await.unwrap();
        hls.manifest_parsed().await.unwrap();

        let error = loop {
            match hls.recv().await {
                Some(HlsEvent::Error(error)) => break error,
                Some(_) => continue,
                None => panic!("event channel closed"),
            }
        };
        assert!(error.fatal);
        assert_eq!(error.kind, ErrorType::MediaError);
        assert_eq!(error.details, ErrorDetails::BufferAppendError);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sink.appended.lock().unwrap().is_empty());

        hls.recover_media_error().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(sink.resets.load(Ordering::SeqCst), 1);
        assert_eq!(sink.appended.lock().unwrap().len(), 3);
        hls.destroy().await;
    }

    #[tokio::test]
    async fn test_reload_keeps_timeline_positions() {
        let first = Arc::new(AtomicU64::new(100));
        let source = sliding_live_source(first.clone()).await;

        let hls = Hls::new(test_config()).unwrap();
        hls.load_source(&source).await.unwrap();
        hls.attach_media(Arc::new(RecordingSink::default()))
            .await
            .unwrap();
        hls.manifest_parsed().await.unwrap();
        // Segments 100..108 at 0..8, three behind the edge
        assert_eq!(hls.live_sync_position().await, Some(5.0));

        first.store(102, Ordering::SeqCst);
        hls.start_load().await.unwrap();
        hls.manifest_parsed().await.unwrap();
        // Segment 102 stays at 2.0, so the edge moved to 10
        assert_eq!(hls.live_sync_position().await, Some(7.0));
        hls.destroy().await;
    }

    #[tokio::test]
    async fn test_new_source_starts_fresh_timeline() {
        let first = Arc::new(AtomicU64::new(100));
        let source = sliding_live_source(first.clone()).await;

        let hls = Hls::new(test_config()).unwrap();
        hls.load_source(&source).await.unwrap();
        hls.attach_media(Arc::new(RecordingSink::default()))
            .await
            .unwrap();
        hls.manifest_parsed().await.unwrap();

        first.store(102, Ordering::SeqCst);
        hls.load_source(&source).await.unwrap();
        hls.manifest_parsed().await.unwrap();
        assert_eq!(hls.live_sync_position().await, Some(5.0));
        hls.destroy().await;
    }

    #[tokio::test]
    async fn test_falling_behind_live_catches_up_and_flushes_back_buffer() {
        let first = Arc::new(AtomicU64::new(100));
        let source = sliding_live_source(first.clone()).await;

        let hls = Hls::new(test_config()).unwrap();
        let sink = Arc::new(RecordingSink::default());
        hls.load_source(&source).await.unwrap();
        hls.attach_media(sink.clone()).await.unwrap();
        hls.manifest_parsed().await.unwrap();
        next_event(&hls, |e| matches!(e, HlsEvent::LiveCatchUp { .. })).await;
        assert_eq!(sink.current_time().await, 5.0);

        // The playhead stays put while the window slides: edge 15, ten seconds behind
        first.store(107, Ordering::SeqCst);
        let event = next_event(&hls, |e| matches!(e, HlsEvent::LiveCatchUp { .. })).await;
        assert!(matches!(event, HlsEvent::LiveCatchUp { position } if position == 12.0));
        assert_eq!(sink.current_time().await, 12.0);

        // Edge 22: catch up to 19 and drop segments ending before 9
        first.store(114, Ordering::SeqCst);
        let event = next_event(&hls, |e| matches!(e, HlsEvent::BufferFlushed { .. })).await;
        assert!(matches!(event, HlsEvent::BufferFlushed { evicted: 3 }));
        assert_eq!(sink.current_time().await, 19.0);
        let remaining: Vec<u64> = sink
            .appended
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.sequence)
            .collect();
        assert!(remaining.iter().all(|&seq| seq >= 112));
        hls.destroy().await;
    }

    #[tokio::test]
    async fn test_destroyed_client_rejects_calls() {
        let hls = Hls::new(test_config()).unwrap();
        hls.destroy().await;
        assert!(matches!(
            hls.load_source("http://127.0.0.1/index.m3u8").await,
            Err(HlsStreamError::Destroyed)
        ));
        assert!(matches!(
            hls.start_load().await,
            Err(HlsStreamError::Destroyed)
        ));
    }

    #[tokio::test]
    async fn test_start_load_without_source() {
        let hls = Hls::new(test_config()).unwrap();
        assert!(matches!(
            hls.start_load().await,
            Err(HlsStreamError::NoSource)
        ));
    }
}

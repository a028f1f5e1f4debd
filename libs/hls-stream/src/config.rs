use std::time::Duration;

/// Loader and buffer tuning for [`crate::Hls`].
///
/// Durations expressed as `f64` are seconds of media, `Duration` values are
/// wall-clock network limits.
#[derive(Debug, Clone)]
pub struct HlsConfig {
    /// Parse playlists on the blocking thread pool
    pub enable_worker: bool,
    /// Refresh live playlists twice per target duration
    pub low_latency_mode: bool,
    /// Media kept behind the playhead before eviction
    pub back_buffer_length: f64,
    /// Buffer-ahead goal
    pub max_buffer_length: f64,
    /// Hard cap for the buffer-ahead goal
    pub max_max_buffer_length: f64,
    /// Live sync position = live edge - count * target duration
    pub live_sync_duration_count: u32,
    /// Seek back to the live sync position once this far behind the edge
    pub live_max_latency_duration_count: Option<u32>,
    pub level_loading_max_retry: u32,
    pub level_loading_retry_delay: Duration,
    pub manifest_loading_timeout: Duration,
}

impl Default for HlsConfig {
    fn default() -> Self {
        Self {
            enable_worker: true,
            low_latency_mode: true,
            back_buffer_length: f64::INFINITY,
            max_buffer_length: 30.0,
            max_max_buffer_length: 600.0,
            live_sync_duration_count: 3,
            live_max_latency_duration_count: None,
            level_loading_max_retry: 4,
            level_loading_retry_delay: Duration::from_secs(1),
            manifest_loading_timeout: Duration::from_secs(10),
        }
    }
}

impl HlsConfig {
    /// Short buffers for live camera feeds.
    pub fn low_latency() -> Self {
        Self {
            enable_worker: true,
            low_latency_mode: true,
            back_buffer_length: 10.0,
            max_buffer_length: 10.0,
            max_max_buffer_length: 20.0,
            live_sync_duration_count: 3,
            live_max_latency_duration_count: Some(5),
            ..Default::default()
        }
    }

    pub fn buffer_goal(&self) -> f64 {
        self.max_buffer_length.min(self.max_max_buffer_length)
    }

    /// Delay between live playlist reloads for a given target duration.
    pub fn refresh_interval(&self, target_duration: f64) -> Duration {
        let secs = if self.low_latency_mode {
            target_duration / 2.0
        } else {
            target_duration
        };
        Duration::from_secs_f64(secs.max(0.1))
    }

    /// Backoff before retrying a failed level reload (1-based attempt).
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1)).min(30);
        (self.level_loading_retry_delay * factor).min(Duration::from_secs(30))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_latency_preset() {
        let config = HlsConfig::low_latency();
        assert!(config.enable_worker);
        assert!(config.low_latency_mode);
        assert_eq!(config.back_buffer_length, 10.0);
        assert_eq!(config.max_buffer_length, 10.0);
        assert_eq!(config.max_max_buffer_length, 20.0);
        assert_eq!(config.live_sync_duration_count, 3);
        assert_eq!(config.live_max_latency_duration_count, Some(5));
        assert_eq!(config.buffer_goal(), 10.0);
    }

    #[test]
    fn test_refresh_interval() {
        let mut config = HlsConfig::default();
        assert_eq!(config.refresh_interval(4.0), Duration::from_secs(2));
        config.low_latency_mode = false;
        assert_eq!(config.refresh_interval(4.0), Duration::from_secs(4));
        assert_eq!(config.refresh_interval(0.0), Duration::from_millis(100));
    }

    #[test]
    fn test_retry_delay_backoff() {
        let config = HlsConfig::default();
        assert_eq!(config.retry_delay(1), Duration::from_secs(1));
        assert_eq!(config.retry_delay(2), Duration::from_secs(2));
        assert_eq!(config.retry_delay(3), Duration::from_secs(4));
        assert_eq!(config.retry_delay(10), Duration::from_secs(30));
    }
}

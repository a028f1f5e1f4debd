use serde::{Deserialize, Serialize};

/// HLS segment metadata (no actual data)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HlsSegment {
    /// Media sequence number
    pub sequence: u64,
    /// Position of the segment on the stream timeline, in seconds
    pub start: f64,
    /// Segment duration in seconds
    pub duration: f64,
    /// Absolute segment URL
    pub url: String,
}

impl HlsSegment {
    pub fn new(sequence: u64, duration: f64, url: String) -> Self {
        Self {
            sequence,
            start: 0.0,
            duration,
            url,
        }
    }

    pub fn with_start(mut self, start: f64) -> Self {
        self.start = start;
        self
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

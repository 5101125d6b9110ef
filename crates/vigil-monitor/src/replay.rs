//! JSONL replay source.
//!
//! Each non-blank line is one frame:
//!
//! ```json
//! {"timestamp_ms": 66, "face": {"left_ear": 0.12, "right_ear": 0.3},
//!  "objects": [{"label": "cell phone", "score": 0.81}],
//!  "detections": [{"class": "smoking", "score": 0.2}]}
//! ```
//!
//! Every field is optional. Without `timestamp_ms` the frame is placed at
//! `index * frame_interval`.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info};

use vigil_models::FrameInfo;

use crate::error::{MonitorError, MonitorResult};
use crate::source::{Frame, FramePayload, FrameSource};

#[derive(Debug, Deserialize)]
struct ReplayRecord {
    #[serde(default)]
    timestamp_ms: Option<u64>,
    #[serde(flatten)]
    payload: FramePayload,
}

/// Replays recorded detector output from a JSONL file.
pub struct ReplaySource {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    /// 1-based number of the last line read
    line: usize,
    next_index: u64,
    frame_interval: Duration,
    pacing: Option<Interval>,
}

impl ReplaySource {
    pub async fn open(path: impl AsRef<Path>, frame_interval: Duration) -> MonitorResult<Self> {
        let path = path.as_ref().to_path_buf();
        let lines = open_lines(&path).await?;

        info!(path = %path.display(), "Opened replay file");

        Ok(Self {
            path,
            lines,
            line: 0,
            next_index: 0,
            frame_interval,
            pacing: None,
        })
    }

    /// Emit frames no faster than the frame interval.
    pub fn with_realtime(mut self, realtime: bool) -> Self {
        self.pacing = realtime.then(|| {
            let mut ticker = interval(self.frame_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&mut self, text: &str) -> MonitorResult<Frame> {
        let record: ReplayRecord =
            serde_json::from_str(text).map_err(|e| MonitorError::replay(self.line, e.to_string()))?;

        let index = self.next_index;
        self.next_index += 1;

        let info = match record.timestamp_ms {
            Some(ms) => FrameInfo::new(index, Duration::from_millis(ms)),
            None => FrameInfo::at_interval(index, self.frame_interval),
        };

        Ok(Frame::new(info, record.payload))
    }
}

async fn open_lines(path: &Path) -> MonitorResult<Lines<BufReader<File>>> {
    let file = File::open(path).await.map_err(|e| {
        MonitorError::source_unavailable(format!("cannot open {}: {}", path.display(), e))
    })?;
    Ok(BufReader::new(file).lines())
}

#[async_trait]
impl FrameSource for ReplaySource {
    async fn next_frame(&mut self) -> MonitorResult<Option<Frame>> {
        if let Some(ticker) = self.pacing.as_mut() {
            ticker.tick().await;
        }

        loop {
            let next = match self.lines.next_line().await {
                Ok(next) => next,
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    return Err(MonitorError::replay(self.line + 1, e.to_string()));
                }
                Err(e) => return Err(e.into()),
            };
            let Some(text) = next else {
                debug!(lines = self.line, "Replay file exhausted");
                return Ok(None);
            };
            self.line += 1;

            if text.trim().is_empty() {
                continue;
            }
            return self.parse(&text).map(Some);
        }
    }

    /// Reopen the file and skip the lines already replayed.
    async fn reconnect(&mut self) -> MonitorResult<()> {
        let mut lines = open_lines(&self.path).await?;
        for _ in 0..self.line {
            if lines.next_line().await?.is_none() {
                break;
            }
        }
        self.lines = lines;
        Ok(())
    }

    /// Paced replay stands in for a camera.
    fn is_live(&self) -> bool {
        self.pacing.is_some()
    }

    fn name(&self) -> &'static str {
        "replay"
    }
}

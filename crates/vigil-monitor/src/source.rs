//! Frame sources.
//!
//! A frame here is what the capture stage hands to inference: the frame's
//! index and timestamp plus whatever raw signals the upstream producer
//! attached (face ratios or landmarks, labeled object boxes, or already
//! classified detections). Pixel decoding happens outside this crate.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::mpsc;

use vigil_engine::{FaceSignal, Point};
use vigil_models::{BoundingBox, Detection, FrameInfo};

use crate::error::{MonitorError, MonitorResult};

/// Face signal as delivered upstream: raw landmark points or precomputed ratios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FaceRecord {
    Landmarks {
        left_eye: [Point; 6],
        right_eye: [Point; 6],
        #[serde(default)]
        mouth: Option<[Point; 8]>,
    },
    Ratios(FaceSignal),
}

impl FaceRecord {
    pub fn signal(&self) -> FaceSignal {
        match self {
            FaceRecord::Landmarks {
                left_eye,
                right_eye,
                mouth,
            } => FaceSignal::from_landmarks(left_eye, right_eye, mouth.as_ref()),
            FaceRecord::Ratios(signal) => *signal,
        }
    }
}

/// Labeled box from a general-purpose object detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledObject {
    pub label: String,
    pub score: f32,
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
}

impl LabeledObject {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
            bbox: None,
        }
    }
}

/// Most faces read from one frame.
pub const MAX_FACES: usize = 5;

/// Raw per-frame signals.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FramePayload {
    /// Every face in view. `"face"` with a single record is accepted too.
    #[serde(default, alias = "face", deserialize_with = "one_or_many_faces")]
    pub faces: Vec<FaceRecord>,
    #[serde(default)]
    pub objects: Vec<LabeledObject>,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<FaceRecord>),
    One(FaceRecord),
}

fn one_or_many_faces<'de, D>(deserializer: D) -> Result<Vec<FaceRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::Many(faces)) => faces,
        Some(OneOrMany::One(face)) => vec![face],
        None => Vec::new(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub info: FrameInfo,
    pub payload: FramePayload,
}

impl Frame {
    pub fn new(info: FrameInfo, payload: FramePayload) -> Self {
        Self { info, payload }
    }
}

/// Producer of frames for the capture stage.
#[async_trait]
pub trait FrameSource: Send {
    /// Next frame, or `None` at end of stream.
    ///
    /// Must be cancel safe: the capture stage races it against shutdown.
    async fn next_frame(&mut self) -> MonitorResult<Option<Frame>>;

    /// Re-establish the source after a retryable failure.
    async fn reconnect(&mut self) -> MonitorResult<()> {
        Err(MonitorError::source_unavailable(format!(
            "{} does not support reconnecting",
            self.name()
        )))
    }

    /// Whether frames arrive in real time, like a camera.
    ///
    /// Live sources never wait on a slow pipeline: the oldest queued frames
    /// are dropped instead. Offline sources are read at the pipeline's pace
    /// so every frame is evaluated.
    fn is_live(&self) -> bool {
        true
    }

    /// Source name for logging.
    fn name(&self) -> &'static str;
}

/// Frames pushed by an external producer, e.g. a camera adapter thread.
///
/// The stream ends when every sender is dropped. A producer signals a lost
/// device by sending an `Err`, which the monitor treats like any other
/// source failure.
pub struct ChannelSource {
    rx: mpsc::Receiver<MonitorResult<Frame>>,
}

impl ChannelSource {
    pub fn new(buffer: usize) -> (mpsc::Sender<MonitorResult<Frame>>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (tx, Self { rx })
    }
}

#[async_trait]
impl FrameSource for ChannelSource {
    async fn next_frame(&mut self) -> MonitorResult<Option<Frame>> {
        self.rx.recv().await.transpose()
    }

    /// The producer owns the device; the channel itself stays open.
    async fn reconnect(&mut self) -> MonitorResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vigil_models::ViolationClass;

    #[test]
    fn test_face_record_ratios() {
        let record: FaceRecord =
            serde_json::from_str(r#"{"left_ear": 0.1, "right_ear": 0.3}"#).unwrap();
        let signal = record.signal();
        assert_eq!(signal.min_ear(), Some(0.1));
        assert_eq!(signal.mar, None);
    }

    #[test]
    fn test_face_record_landmarks() {
        let eye = r#"[{"x":0,"y":0},{"x":1,"y":1},{"x":2,"y":1},{"x":3,"y":0},{"x":2,"y":-1},{"x":1,"y":-1}]"#;
        let json = format!(r#"{{"left_eye": {eye}, "right_eye": {eye}}}"#);
        let record: FaceRecord = serde_json::from_str(&json).unwrap();
        assert!(matches!(record, FaceRecord::Landmarks { mouth: None, .. }));
        assert!(record.signal().left_ear.is_some());
    }

    #[test]
    fn test_payload_defaults() {
        let payload: FramePayload =
            serde_json::from_str(r#"{"detections": [{"class": "smoking", "score": 0.7}]}"#).unwrap();
        assert!(payload.faces.is_empty());
        assert!(payload.objects.is_empty());
        assert_eq!(payload.detections[0].class, ViolationClass::Smoking);
    }

    #[test]
    fn test_payload_accepts_one_or_many_faces() {
        let single: FramePayload =
            serde_json::from_str(r#"{"face": {"left_ear": 0.1, "right_ear": 0.3}}"#).unwrap();
        assert_eq!(single.faces.len(), 1);

        let many: FramePayload = serde_json::from_str(
            r#"{"faces": [{"left_ear": 0.3, "right_ear": 0.3}, {"left_ear": 0.05, "right_ear": 0.3}]}"#,
        )
        .unwrap();
        assert_eq!(many.faces.len(), 2);
        assert_eq!(many.faces[1].signal().min_ear(), Some(0.05));

        let none: FramePayload = serde_json::from_str(r#"{"face": null}"#).unwrap();
        assert!(none.faces.is_empty());
    }

    #[tokio::test]
    async fn test_channel_source_ends_when_senders_drop() {
        let (tx, mut source) = ChannelSource::new(4);
        let frame = Frame::new(
            FrameInfo::at_interval(0, Duration::from_millis(33)),
            FramePayload::default(),
        );
        tx.send(Ok(frame.clone())).await.unwrap();
        tx.send(Err(MonitorError::source_unavailable("unplugged")))
            .await
            .unwrap();
        drop(tx);

        assert_eq!(source.next_frame().await.unwrap(), Some(frame));
        assert!(source.next_frame().await.unwrap_err().is_retryable());
        assert!(source.reconnect().await.is_ok());
        assert!(source.is_live());
        assert_eq!(source.next_frame().await.unwrap(), None);
    }
}

//! Hand detector seam and right-hand selection.

use image::RgbImage;
use log::warn;
use serde::Deserialize;
use std::{
    fs::File,
    io::{self, BufRead, BufReader, Lines},
    path::Path,
};
use thiserror::Error;

use crate::landmarks::{HandSnapshot, LANDMARK_COUNT};

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("failed to open landmark script {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to read landmark script: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

/// One hand as reported by a detector, in normalized image fractions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DetectedHand {
    pub handedness: Handedness,
    pub landmarks: [[f32; 3]; LANDMARK_COUNT],
}

/// Anything that turns a frame into zero or more tracked hands.
pub trait HandDetector {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<DetectedHand>, DetectorError>;
}

/// Snapshot of the first right hand, scaled to the frame. Left hands are
/// ignored so only one hand ever steers.
pub fn right_hand(hands: &[DetectedHand], width: u32, height: u32) -> Option<HandSnapshot> {
    hands
        .iter()
        .find(|h| h.handedness == Handedness::Right)
        .map(|h| HandSnapshot::from_normalized(&h.landmarks, width, height))
}

#[derive(Debug, Deserialize)]
struct ScriptLine {
    #[serde(default)]
    hands: Vec<DetectedHand>,
}

/// Replays recorded detections, one JSON line per frame:
/// `{"hands":[{"handedness":"Right","landmarks":[[x,y,z], ...]}]}`.
/// Lines that fail to parse count as frames with no hands.
pub struct ScriptedDetector<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl ScriptedDetector<Box<dyn BufRead>> {
    pub fn open(path: &Path) -> Result<Self, DetectorError> {
        let f = File::open(path).map_err(|source| DetectorError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::new(Box::new(BufReader::new(f))))
    }

    /// A detector that never sees a hand.
    pub fn idle() -> Self {
        Self::new(Box::new(io::empty()))
    }
}

impl<R: BufRead> ScriptedDetector<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> HandDetector for ScriptedDetector<R> {
    fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<DetectedHand>, DetectorError> {
        let Some(line) = self.lines.next() else {
            return Ok(Vec::new());
        };
        let line = line?;
        self.line_no += 1;
        if line.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str::<ScriptLine>(&line) {
            Ok(s) => Ok(s.hands),
            Err(e) => {
                warn!("landmark script line {}: {e}", self.line_no);
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{Landmark, Point};

    fn line(hands: &[(&str, f32)]) -> String {
        let hs: Vec<String> = hands
            .iter()
            .map(|(label, x)| {
                let pts = vec![format!("[{x},0.5,0.0]"); LANDMARK_COUNT].join(",");
                format!(r#"{{"handedness":"{label}","landmarks":[{pts}]}}"#)
            })
            .collect();
        format!(r#"{{"hands":[{}]}}"#, hs.join(","))
    }

    #[test]
    fn picks_first_right_hand_only() {
        let script = format!(
            "{}\n{}\n",
            line(&[("Left", 0.1), ("Right", 0.25), ("Right", 0.75)]),
            line(&[("Left", 0.5)])
        );
        let mut det = ScriptedDetector::new(script.as_bytes());
        let frame = RgbImage::new(1, 1);

        let hands = det.detect(&frame).unwrap();
        assert_eq!(hands.len(), 3);
        let snap = right_hand(&hands, 400, 200).unwrap();
        assert_eq!(snap[Landmark::IndexTip], Point::new(100, 100, 0));

        let hands = det.detect(&frame).unwrap();
        assert!(right_hand(&hands, 400, 200).is_none());
    }

    #[test]
    fn bad_lines_and_exhaustion_yield_no_hands() {
        let script = format!("not json\n\n{}\n", line(&[("Right", 0.5)]));
        let mut det = ScriptedDetector::new(script.as_bytes());
        let frame = RgbImage::new(1, 1);
        assert!(det.detect(&frame).unwrap().is_empty());
        assert!(det.detect(&frame).unwrap().is_empty());
        assert_eq!(det.detect(&frame).unwrap().len(), 1);
        assert!(det.detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn wrong_landmark_count_is_rejected() {
        let script = r#"{"hands":[{"handedness":"Right","landmarks":[[0.1,0.1,0.0]]}]}"#;
        let mut det = ScriptedDetector::new(script.as_bytes());
        assert!(det.detect(&RgbImage::new(1, 1)).unwrap().is_empty());
    }
}

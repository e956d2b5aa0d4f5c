use image::RgbImage;
use log::{debug, info, warn};
use std::{
    fs,
    path::PathBuf,
    sync::atomic::{AtomicBool, Ordering},
};

use super::pipeline::Pilot;
use super::retry::{self, MissCounter};
use crate::actions::VehicleActuator;
use crate::config::ProfileWatcher;
use crate::error::SessionError;
use crate::input::{FrameError, FrameSource};
use crate::tracker::HandDetector;

/// Where annotated frames go. Returning `false` ends the session.
pub trait FrameSink {
    fn show(&mut self, frame: &RgbImage) -> Result<bool, FrameError>;
}

/// Discards frames; for headless runs.
pub struct NullSink;

impl FrameSink for NullSink {
    fn show(&mut self, _frame: &RgbImage) -> Result<bool, FrameError> {
        Ok(true)
    }
}

/// Writes `frame_000000.png`, `frame_000001.png`, ... into a directory,
/// optionally stopping after `limit` frames.
pub struct PngSequenceSink {
    dir: PathBuf,
    next: u64,
    limit: Option<u64>,
}

impl PngSequenceSink {
    pub fn create(dir: PathBuf, limit: Option<u64>) -> Result<Self, FrameError> {
        fs::create_dir_all(&dir).map_err(|source| FrameError::Create {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            next: 0,
            limit,
        })
    }

    #[cfg(test)]
    pub fn written(&self) -> u64 {
        self.next
    }
}

impl FrameSink for PngSequenceSink {
    fn show(&mut self, frame: &RgbImage) -> Result<bool, FrameError> {
        let path = self.dir.join(format!("frame_{:06}.png", self.next));
        frame
            .save(&path)
            .map_err(|source| FrameError::Save { path, source })?;
        self.next += 1;
        Ok(self.limit.is_none_or(|n| self.next < n))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Too many consecutive frames failed to arrive.
    ConnectionLost { misses: u32 },
    /// SIGINT/SIGTERM or an equivalent stop request.
    Interrupted,
    /// The sink asked to stop.
    SinkClosed,
}

/// Drives `pilot` one frame at a time until the source dries up, the sink
/// closes, or `stop` is raised. Actuator and I/O failures end the session
/// with an error.
pub fn run_session<D: HandDetector, V: VehicleActuator>(
    source: &mut dyn FrameSource,
    pilot: &mut Pilot<D, V>,
    sink: &mut dyn FrameSink,
    stop: &AtomicBool,
    mut watcher: Option<&mut ProfileWatcher>,
) -> Result<SessionEnd, SessionError> {
    let mut misses = MissCounter::new(pilot.profile().thresholds.max_missed_frames);
    let mut frames: u64 = 0;
    info!("session: started");

    loop {
        if stop.load(Ordering::Relaxed) {
            info!("session: interrupted after {frames} frames");
            return Ok(SessionEnd::Interrupted);
        }
        if let Some(profile) = watcher.as_deref_mut().and_then(|w| w.poll()) {
            pilot.set_profile(profile.clone());
            misses.set_limit(pilot.profile().thresholds.max_missed_frames);
        }

        let frame = match retry::acquire(&mut misses, || source.next_frame()) {
            Ok(f) => f,
            Err(SessionError::ConnectionLost { misses }) => {
                warn!("session: no frame for {misses} attempts, connection lost");
                return Ok(SessionEnd::ConnectionLost { misses });
            }
            Err(e) => return Err(e),
        };

        let out = pilot.process_frame(frame)?;
        frames += 1;
        debug!("frame {frames}: held {:?}", pilot.held_command());
        if !sink.show(&out)? {
            info!("session: sink closed after {frames} frames");
            return Ok(SessionEnd::SinkClosed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::SimulatedVehicle;
    use crate::config::Profile;
    use crate::input::BlankSource;
    use crate::tracker::ScriptedDetector;

    fn pilot(max_missed: u32) -> Pilot<ScriptedDetector<Box<dyn std::io::BufRead>>, SimulatedVehicle> {
        let mut p: Profile = toml::from_str(&format!(
            r#"
            [meta]
            name = "test"
            [thresholds]
            stop_thumb_margin_px = 50
            min_move_cm = 40
            min_rotate_deg = 1
            max_missed_frames = {max_missed}
            [video]
            mirror = false
            show_landmarks = false
            width = 320
            height = 240
            [minimap]
            canvas_size = 1000
            position = [10, 10]
            size = 40
            "#
        ))
        .unwrap();
        p.minimap.enabled = true;
        Pilot::new(ScriptedDetector::idle(), None, p)
    }

    /// Counts frames, closes after a fixed number.
    struct Counting {
        seen: u64,
        close_after: u64,
    }

    impl FrameSink for Counting {
        fn show(&mut self, _frame: &RgbImage) -> Result<bool, FrameError> {
            self.seen += 1;
            Ok(self.seen < self.close_after)
        }
    }

    #[test]
    fn dry_source_ends_with_connection_lost() {
        let mut src = BlankSource::new(320, 240, Some(3));
        let mut sink = Counting {
            seen: 0,
            close_after: u64::MAX,
        };
        let stop = AtomicBool::new(false);
        let end = run_session(&mut src, &mut pilot(300), &mut sink, &stop, None).unwrap();
        assert_eq!(end, SessionEnd::ConnectionLost { misses: 300 });
        assert_eq!(sink.seen, 3);
    }

    #[test]
    fn sink_can_close_the_session() {
        let mut src = BlankSource::new(320, 240, None);
        let mut sink = Counting {
            seen: 0,
            close_after: 5,
        };
        let stop = AtomicBool::new(false);
        let end = run_session(&mut src, &mut pilot(10), &mut sink, &stop, None).unwrap();
        assert_eq!(end, SessionEnd::SinkClosed);
        assert_eq!(sink.seen, 5);
    }

    #[test]
    fn raised_stop_flag_interrupts_before_the_next_frame() {
        let mut src = BlankSource::new(320, 240, None);
        let stop = AtomicBool::new(true);
        let end = run_session(&mut src, &mut pilot(10), &mut NullSink, &stop, None).unwrap();
        assert_eq!(end, SessionEnd::Interrupted);
    }

    #[test]
    fn png_sink_writes_numbered_frames_up_to_its_limit() {
        let dir = std::env::temp_dir().join(format!("handpilot-out-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let mut sink = PngSequenceSink::create(dir.clone(), Some(2)).unwrap();
        let mut src = BlankSource::new(320, 240, None);
        let stop = AtomicBool::new(false);
        let end = run_session(&mut src, &mut pilot(10), &mut sink, &stop, None).unwrap();
        assert_eq!(end, SessionEnd::SinkClosed);
        assert_eq!(sink.written(), 2);
        assert!(dir.join("frame_000000.png").exists());
        assert!(dir.join("frame_000001.png").exists());
        assert!(!dir.join("frame_000002.png").exists());
        let _ = fs::remove_dir_all(&dir);
    }
}

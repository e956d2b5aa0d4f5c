use image::{RgbImage, imageops};
use log::{debug, info, warn};
use std::fmt;

use super::dispatch::Dispatcher;
use crate::actions::{ActuatorError, VehicleActuator};
use crate::config::Profile;
use crate::draw;
use crate::error::SessionError;
use crate::flight::{DispatchCommand, FlightDispatch, FlightMachine, FlightState, Transition};
use crate::gestures::{Command, GestureDetector};
use crate::landmarks::HandSnapshot;
use crate::minimap::Minimap;
use crate::path::{PathQueue, PushOutcome, QueuedAction};
use crate::tracker::{HandDetector, right_hand};

/// What the operator should see: the held gesture and the running tail of
/// the path queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Feedback {
    pub gesture: Command,
    pub tail: Option<QueuedAction>,
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gesture: {}", self.gesture.label())?;
        match self.tail {
            Some(QueuedAction::Move(d)) => write!(f, " | move {d:+}"),
            Some(QueuedAction::Rotate(d)) => write!(f, " | rotate {d:+}"),
            None => write!(f, " | -"),
        }
    }
}

/// Owns the whole per-session control state. One instance per loop; nothing
/// here is shared.
pub struct Pilot<D, V> {
    detector: D,
    vehicle: Option<V>,
    profile: Profile,
    gestures: GestureDetector,
    queue: PathQueue,
    flight: FlightMachine,
    minimap: Minimap,
    feedback: Feedback,
}

impl<D: HandDetector, V: VehicleActuator> Pilot<D, V> {
    pub fn new(detector: D, vehicle: Option<V>, profile: Profile) -> Self {
        Self {
            detector,
            vehicle,
            gestures: GestureDetector::new(profile.thresholds.clone()),
            queue: PathQueue::new(),
            flight: FlightMachine::new(),
            minimap: Minimap::new(profile.minimap.canvas_size),
            feedback: Feedback::default(),
            profile,
        }
    }

    /// Swaps in new tuning between frames. Frame size and canvas size are
    /// fixed for the session; a minimap placement that does not fit the
    /// current frames is ignored.
    pub fn set_profile(&mut self, mut profile: Profile) {
        let old = &self.profile;
        if (profile.video.width, profile.video.height) != (old.video.width, old.video.height) {
            warn!(
                "video size {}x{} applies to the next session",
                profile.video.width, profile.video.height
            );
            profile.video.width = old.video.width;
            profile.video.height = old.video.height;
        }
        if profile.minimap.canvas_size != old.minimap.canvas_size {
            warn!("minimap.canvas_size change applies to the next session");
            profile.minimap.canvas_size = old.minimap.canvas_size;
        }
        let [x, y] = profile.minimap.position;
        let span = 2 * u64::from(profile.minimap.size);
        if u64::from(x) + span > u64::from(old.video.width)
            || u64::from(y) + span > u64::from(old.video.height)
        {
            warn!(
                "minimap at ({x}, {y}) size {} does not fit {}x{} frames; keeping the current placement",
                profile.minimap.size, old.video.width, old.video.height
            );
            profile.minimap.position = old.minimap.position;
            profile.minimap.size = old.minimap.size;
        }
        self.gestures.set_thresholds(profile.thresholds.clone());
        self.profile = profile;
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn queue(&self) -> &PathQueue {
        &self.queue
    }

    pub fn flight_state(&self) -> FlightState {
        self.flight.state()
    }

    pub fn held_command(&self) -> Command {
        self.gestures.held()
    }

    pub fn feedback(&self) -> Feedback {
        self.feedback
    }

    pub fn minimap(&self) -> &Minimap {
        &self.minimap
    }

    pub fn vehicle(&self) -> Option<&V> {
        self.vehicle.as_ref()
    }

    /// Runs one dispatch command against the attached vehicle.
    pub fn dispatch(&mut self, cmd: DispatchCommand) -> Result<Option<bool>, ActuatorError> {
        Dispatcher {
            vehicle: self.vehicle.as_mut(),
            queue: &mut self.queue,
            minimap: &mut self.minimap,
            thresholds: &self.profile.thresholds,
        }
        .dispatch(cmd)
    }

    /// Classify, update the path, step the flight state, render. Returns the
    /// annotated frame.
    pub fn process_frame(&mut self, mut frame: RgbImage) -> Result<RgbImage, SessionError> {
        if self.profile.video.mirror {
            imageops::flip_horizontal_in_place(&mut frame);
        }
        let hands = self.detector.detect(&frame)?;
        let (width, height) = frame.dimensions();

        if let Some(hand) = right_hand(&hands, width, height) {
            if self.profile.video.show_landmarks {
                draw::hand_overlay(&mut frame, &hand);
            }
            self.steer(&hand)?;
        }

        let m = &self.profile.minimap;
        if m.enabled {
            self.minimap.render_viewport(&mut frame, m.position, m.size)?;
        }
        Ok(frame)
    }

    fn steer(&mut self, hand: &HandSnapshot) -> Result<(), SessionError> {
        let c = self.gestures.update(hand);
        if let Some(delta) = c.delta {
            match self.queue.push(delta) {
                PushOutcome::Appended(a) => {
                    debug!("queue: append {a:?}");
                    self.minimap.append_action(a);
                }
                PushOutcome::Merged(a) => {
                    debug!("queue: tail now {a:?}");
                    self.minimap.merge_tail(a);
                }
            }
        }

        // the held command drives the flight rules, so an unmatched shape
        // after a fist still counts as Start
        let held = self.gestures.held();
        self.flight.observe(held);
        let pending = !self.queue.is_empty();
        let mut d = Dispatcher {
            vehicle: self.vehicle.as_mut(),
            queue: &mut self.queue,
            minimap: &mut self.minimap,
            thresholds: &self.profile.thresholds,
        };
        if let Some(t) = self.flight.step(held, pending, &mut d)? {
            if t == Transition::Flushed {
                info!("path flushed");
            }
        }

        let now = Feedback {
            gesture: held,
            tail: self.queue.tail().copied(),
        };
        if now != self.feedback {
            info!("{now}");
            self.feedback = now;
        }
        Ok(())
    }
}

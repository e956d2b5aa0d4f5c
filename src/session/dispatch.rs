use log::{debug, info, warn};

use crate::actions::{ActuatorError, Direction, Maneuver, Rotation, VehicleActuator};
use crate::config::Thresholds;
use crate::flight::{DispatchCommand, FlightDispatch};
use crate::minimap::Minimap;
use crate::path::{PathQueue, QueuedAction};

/// Borrowed view of everything a dispatch command may touch.
pub struct Dispatcher<'a, V> {
    pub vehicle: Option<&'a mut V>,
    pub queue: &'a mut PathQueue,
    pub minimap: &'a mut Minimap,
    pub thresholds: &'a Thresholds,
}

/// Queue entries as directional maneuvers, in FIFO order. Zero deltas are
/// dropped; everything else is raised to the configured floor.
pub fn flush_plan(queue: &PathQueue, th: &Thresholds) -> Vec<Maneuver> {
    queue
        .iter()
        .filter_map(|a| {
            let d = a.delta();
            if d == 0 {
                warn!("flush: dropping zero-length {a:?}");
                return None;
            }
            let mag = d.unsigned_abs();
            Some(match a {
                QueuedAction::Move(_) => {
                    let dir = if d > 0 {
                        Direction::Forward
                    } else {
                        Direction::Back
                    };
                    Maneuver::Move(dir, mag.max(th.min_move_cm))
                }
                QueuedAction::Rotate(_) => {
                    let rot = if d > 0 { Rotation::Left } else { Rotation::Right };
                    Maneuver::Rotate(rot, mag.max(th.min_rotate_deg))
                }
            })
        })
        .collect()
}

fn fly<V: VehicleActuator>(v: &mut V, m: Maneuver) -> Result<(), ActuatorError> {
    match m {
        Maneuver::TakeOff => v.takeoff(),
        Maneuver::Land => v.land(),
        Maneuver::Move(Direction::Forward, cm) => v.move_forward(cm),
        Maneuver::Move(Direction::Back, cm) => v.move_backward(cm),
        Maneuver::Move(d, cm) => v.move_by(d, cm),
        Maneuver::Rotate(Rotation::Left, deg) => v.rotate_left(deg),
        Maneuver::Rotate(Rotation::Right, deg) => v.rotate_right(deg),
    }
}

impl<V: VehicleActuator> FlightDispatch for Dispatcher<'_, V> {
    fn dispatch(&mut self, cmd: DispatchCommand) -> Result<Option<bool>, ActuatorError> {
        let Some(v) = self.vehicle.as_deref_mut() else {
            if cmd == DispatchCommand::FlushPath {
                // dry run: the path is considered flown
                info!("flush: no vehicle, discarding {} entries", self.queue.len());
                self.queue.clear();
                self.minimap.clear_path();
            }
            return Ok(None);
        };

        match cmd {
            DispatchCommand::Start => v.takeoff()?,
            DispatchCommand::Stop => v.land()?,
            DispatchCommand::IsFlying => return Ok(Some(v.altitude_cm()? > 0)),
            DispatchCommand::FlushPath => {
                let plan = flush_plan(self.queue, self.thresholds);
                info!(
                    "flush: {} queued entries -> {} maneuvers",
                    self.queue.len(),
                    plan.len()
                );
                for m in plan {
                    debug!("flush: {m}");
                    fly(v, m)?;
                }
                self.queue.clear();
                self.minimap.clear_path();
            }
        }
        Ok(Some(true))
    }
}

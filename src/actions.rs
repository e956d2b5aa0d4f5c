use log::{info, warn};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActuatorError {
    #[error("vehicle is not airborne; refusing {0}")]
    NotFlying(Maneuver),
    #[error("vehicle is already airborne")]
    AlreadyFlying,
    #[error("{what} out of range: {value} (allowed {min}..={max})")]
    OutOfRange {
        what: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
    #[error("battery depleted")]
    BatteryDepleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// Counter-clockwise.
    Left,
    /// Clockwise.
    Right,
}

/// One directional command, already resolved to an unsigned magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Maneuver {
    TakeOff,
    Land,
    Move(Direction, u32),
    Rotate(Rotation, u32),
}

impl fmt::Display for Maneuver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TakeOff => f.write_str("takeoff"),
            Self::Land => f.write_str("land"),
            Self::Move(d, cm) => write!(f, "move {d:?} {cm} cm"),
            Self::Rotate(r, deg) => write!(f, "rotate {r:?} {deg} deg"),
        }
    }
}

/// Capability set of a remotely piloted vehicle. Calls block until the
/// vehicle acknowledges; failures are returned, never retried here.
pub trait VehicleActuator {
    fn takeoff(&mut self) -> Result<(), ActuatorError>;
    fn land(&mut self) -> Result<(), ActuatorError>;
    fn move_by(&mut self, direction: Direction, cm: u32) -> Result<(), ActuatorError>;
    fn rotate_by(&mut self, rotation: Rotation, degrees: u32) -> Result<(), ActuatorError>;
    fn altitude_cm(&mut self) -> Result<i32, ActuatorError>;
    fn battery_percent(&mut self) -> Result<u8, ActuatorError>;

    fn move_forward(&mut self, cm: u32) -> Result<(), ActuatorError> {
        self.move_by(Direction::Forward, cm)
    }
    fn move_backward(&mut self, cm: u32) -> Result<(), ActuatorError> {
        self.move_by(Direction::Back, cm)
    }
    fn move_left(&mut self, cm: u32) -> Result<(), ActuatorError> {
        self.move_by(Direction::Left, cm)
    }
    fn move_right(&mut self, cm: u32) -> Result<(), ActuatorError> {
        self.move_by(Direction::Right, cm)
    }
    fn move_up(&mut self, cm: u32) -> Result<(), ActuatorError> {
        self.move_by(Direction::Up, cm)
    }
    fn move_down(&mut self, cm: u32) -> Result<(), ActuatorError> {
        self.move_by(Direction::Down, cm)
    }
    fn rotate_left(&mut self, degrees: u32) -> Result<(), ActuatorError> {
        self.rotate_by(Rotation::Left, degrees)
    }
    fn rotate_right(&mut self, degrees: u32) -> Result<(), ActuatorError> {
        self.rotate_by(Rotation::Right, degrees)
    }
}

pub const TAKEOFF_ALTITUDE_CM: i32 = 80;
const MAX_MOVE_CM: u32 = 500;
const MAX_ROTATE_DEG: u32 = 360;

/// Stand-in vehicle that dead-reckons its own pose. Refuses motion while
/// grounded and rejects magnitudes a small quadcopter would reject.
#[derive(Debug, Clone)]
pub struct SimulatedVehicle {
    altitude_cm: i32,
    battery: u8,
    /// Ground-plane position in cm, x forward at heading 0.
    pub position_cm: (f64, f64),
    pub heading_deg: f64,
    log: Vec<Maneuver>,
}

impl Default for SimulatedVehicle {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedVehicle {
    pub fn new() -> Self {
        Self {
            altitude_cm: 0,
            battery: 100,
            position_cm: (0.0, 0.0),
            heading_deg: 0.0,
            log: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn with_battery(mut self, percent: u8) -> Self {
        self.battery = percent.min(100);
        self
    }

    /// Every accepted maneuver, oldest first.
    pub fn history(&self) -> &[Maneuver] {
        &self.log
    }

    fn spend(&mut self, m: Maneuver) -> Result<(), ActuatorError> {
        if self.battery == 0 {
            return Err(ActuatorError::BatteryDepleted);
        }
        self.battery = self.battery.saturating_sub(1);
        self.log.push(m);
        Ok(())
    }

    fn airborne(&self, m: Maneuver) -> Result<(), ActuatorError> {
        if self.altitude_cm <= 0 {
            warn!("sim: {m} refused on the ground");
            return Err(ActuatorError::NotFlying(m));
        }
        Ok(())
    }
}

fn check_range(what: &'static str, value: u32, min: u32, max: u32) -> Result<(), ActuatorError> {
    if value < min || value > max {
        return Err(ActuatorError::OutOfRange {
            what,
            value,
            min,
            max,
        });
    }
    Ok(())
}

impl VehicleActuator for SimulatedVehicle {
    fn takeoff(&mut self) -> Result<(), ActuatorError> {
        if self.altitude_cm > 0 {
            return Err(ActuatorError::AlreadyFlying);
        }
        self.spend(Maneuver::TakeOff)?;
        self.altitude_cm = TAKEOFF_ALTITUDE_CM;
        info!("sim: took off to {} cm", self.altitude_cm);
        Ok(())
    }

    fn land(&mut self) -> Result<(), ActuatorError> {
        self.airborne(Maneuver::Land)?;
        self.spend(Maneuver::Land)?;
        self.altitude_cm = 0;
        info!("sim: landed");
        Ok(())
    }

    fn move_by(&mut self, direction: Direction, cm: u32) -> Result<(), ActuatorError> {
        let m = Maneuver::Move(direction, cm);
        self.airborne(m)?;
        check_range("distance", cm, 20, MAX_MOVE_CM)?;
        self.spend(m)?;

        let d = cm as f64;
        let rad = self.heading_deg.to_radians();
        let (fx, fy) = (rad.cos(), rad.sin());
        match direction {
            Direction::Forward => {
                self.position_cm.0 += d * fx;
                self.position_cm.1 += d * fy;
            }
            Direction::Back => {
                self.position_cm.0 -= d * fx;
                self.position_cm.1 -= d * fy;
            }
            // left is +90 degrees from the heading
            Direction::Left => {
                self.position_cm.0 -= d * fy;
                self.position_cm.1 += d * fx;
            }
            Direction::Right => {
                self.position_cm.0 += d * fy;
                self.position_cm.1 -= d * fx;
            }
            Direction::Up => self.altitude_cm += cm as i32,
            Direction::Down => self.altitude_cm = (self.altitude_cm - cm as i32).max(0),
        }
        Ok(())
    }

    fn rotate_by(&mut self, rotation: Rotation, degrees: u32) -> Result<(), ActuatorError> {
        let m = Maneuver::Rotate(rotation, degrees);
        self.airborne(m)?;
        check_range("rotation", degrees, 1, MAX_ROTATE_DEG)?;
        self.spend(m)?;
        let signed = match rotation {
            Rotation::Left => degrees as f64,
            Rotation::Right => -(degrees as f64),
        };
        self.heading_deg = (self.heading_deg + signed).rem_euclid(360.0);
        Ok(())
    }

    fn altitude_cm(&mut self) -> Result<i32, ActuatorError> {
        Ok(self.altitude_cm)
    }

    fn battery_percent(&mut self) -> Result<u8, ActuatorError> {
        Ok(self.battery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grounded_vehicle_refuses_motion() {
        let mut v = SimulatedVehicle::new();
        assert_eq!(
            v.move_forward(50),
            Err(ActuatorError::NotFlying(Maneuver::Move(Direction::Forward, 50)))
        );
        assert!(matches!(v.land(), Err(ActuatorError::NotFlying(_))));
        assert!(v.history().is_empty());
    }

    #[test]
    fn takeoff_raises_altitude_and_land_drops_it() {
        let mut v = SimulatedVehicle::new();
        v.takeoff().unwrap();
        assert_eq!(v.altitude_cm().unwrap(), TAKEOFF_ALTITUDE_CM);
        assert_eq!(v.takeoff(), Err(ActuatorError::AlreadyFlying));
        v.land().unwrap();
        assert_eq!(v.altitude_cm().unwrap(), 0);
        assert_eq!(v.history(), &[Maneuver::TakeOff, Maneuver::Land]);
    }

    #[test]
    fn dead_reckons_moves_and_turns() {
        let mut v = SimulatedVehicle::new();
        v.takeoff().unwrap();
        v.move_forward(100).unwrap();
        v.rotate_left(90).unwrap();
        v.move_forward(50).unwrap();
        let (x, y) = v.position_cm;
        assert!((x - 100.0).abs() < 1e-9);
        assert!((y - 50.0).abs() < 1e-9);

        v.rotate_right(180).unwrap();
        assert!((v.heading_deg - 270.0).abs() < 1e-9);
        v.move_backward(50).unwrap();
        assert!((v.position_cm.1 - 100.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_out_of_range_magnitudes() {
        let mut v = SimulatedVehicle::new();
        v.takeoff().unwrap();
        assert!(matches!(
            v.move_left(5),
            Err(ActuatorError::OutOfRange { what: "distance", .. })
        ));
        assert!(matches!(
            v.rotate_right(0),
            Err(ActuatorError::OutOfRange { what: "rotation", .. })
        ));
    }

    #[test]
    fn battery_drains_until_depleted() {
        let mut v = SimulatedVehicle::new().with_battery(2);
        v.takeoff().unwrap();
        v.move_up(20).unwrap();
        assert_eq!(v.battery_percent().unwrap(), 0);
        assert_eq!(v.land(), Err(ActuatorError::BatteryDepleted));
    }
}

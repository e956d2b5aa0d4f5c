use log::info;

use crate::actions::ActuatorError;
use crate::gestures::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlightState {
    #[default]
    Idle,
    Flying,
}

/// Explicit commands the state machine issues toward the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchCommand {
    Start,
    Stop,
    IsFlying,
    FlushPath,
}

/// Executes dispatch commands. `Ok(None)` means no vehicle is attached.
pub trait FlightDispatch {
    fn dispatch(&mut self, cmd: DispatchCommand) -> Result<Option<bool>, ActuatorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    TookOff,
    /// The vehicle reported no altitude while we believed it airborne.
    Grounded,
    Flushed,
    Landed,
}

#[derive(Debug, Default)]
pub struct FlightMachine {
    state: FlightState,
    armed: bool,
}

impl FlightMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FlightState {
        self.state
    }

    #[cfg(test)]
    pub fn armed(&self) -> bool {
        self.armed
    }

    /// Start arms, Stop disarms; everything else leaves the flag alone.
    pub fn observe(&mut self, command: Command) {
        match command {
            Command::Start => self.armed = true,
            Command::Stop => self.armed = false,
            _ => {}
        }
    }

    /// One transition per frame, first matching rule wins.
    pub fn step<D: FlightDispatch + ?Sized>(
        &mut self,
        command: Command,
        path_pending: bool,
        d: &mut D,
    ) -> Result<Option<Transition>, ActuatorError> {
        use FlightState::*;

        if self.armed && self.state == Idle {
            d.dispatch(DispatchCommand::Start)?;
            self.state = Flying;
            info!("flight: takeoff");
            return Ok(Some(Transition::TookOff));
        }
        if self.state == Flying && d.dispatch(DispatchCommand::IsFlying)? == Some(false) {
            self.state = Idle;
            self.armed = false;
            info!("flight: vehicle reports no altitude, back to idle");
            return Ok(Some(Transition::Grounded));
        }
        if command == Command::Start && self.state == Flying && path_pending {
            d.dispatch(DispatchCommand::FlushPath)?;
            return Ok(Some(Transition::Flushed));
        }
        if !self.armed && self.state == Flying {
            d.dispatch(DispatchCommand::Stop)?;
            self.state = Idle;
            info!("flight: landing");
            return Ok(Some(Transition::Landed));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records dispatches and answers IsFlying from a scripted altitude.
    #[derive(Default)]
    struct Fake {
        calls: Vec<DispatchCommand>,
        altitude: i32,
        detached: bool,
    }

    impl FlightDispatch for Fake {
        fn dispatch(&mut self, cmd: DispatchCommand) -> Result<Option<bool>, ActuatorError> {
            if self.detached {
                return Ok(None);
            }
            self.calls.push(cmd);
            match cmd {
                DispatchCommand::IsFlying => Ok(Some(self.altitude > 0)),
                _ => Ok(Some(true)),
            }
        }
    }

    fn frame(m: &mut FlightMachine, c: Command, pending: bool, d: &mut Fake) -> Option<Transition> {
        m.observe(c);
        m.step(c, pending, d).unwrap()
    }

    #[test]
    fn start_takes_off_then_start_again_flushes() {
        let mut m = FlightMachine::new();
        let mut d = Fake {
            altitude: 80,
            ..Default::default()
        };
        assert_eq!(frame(&mut m, Command::Start, false, &mut d), Some(Transition::TookOff));
        assert_eq!(m.state(), FlightState::Flying);
        assert_eq!(frame(&mut m, Command::Wait, true, &mut d), None);
        assert_eq!(frame(&mut m, Command::Start, true, &mut d), Some(Transition::Flushed));
        assert_eq!(
            d.calls,
            vec![
                DispatchCommand::Start,
                DispatchCommand::IsFlying,
                DispatchCommand::IsFlying,
                DispatchCommand::FlushPath
            ]
        );
    }

    #[test]
    fn start_then_stop_before_climbing_ends_idle() {
        let mut m = FlightMachine::new();
        let mut d = Fake::default();
        frame(&mut m, Command::Start, false, &mut d);
        assert_eq!(frame(&mut m, Command::Stop, false, &mut d), Some(Transition::Grounded));
        assert_eq!(m.state(), FlightState::Idle);
        assert!(!m.armed());
    }

    #[test]
    fn stop_while_airborne_lands() {
        let mut m = FlightMachine::new();
        let mut d = Fake {
            altitude: 80,
            ..Default::default()
        };
        frame(&mut m, Command::Start, false, &mut d);
        assert_eq!(frame(&mut m, Command::Stop, true, &mut d), Some(Transition::Landed));
        assert_eq!(m.state(), FlightState::Idle);
        assert_eq!(d.calls.last(), Some(&DispatchCommand::Stop));
        // disarmed and idle: nothing more happens
        assert_eq!(frame(&mut m, Command::Wait, true, &mut d), None);
    }

    #[test]
    fn losing_altitude_disarms() {
        let mut m = FlightMachine::new();
        let mut d = Fake {
            altitude: 80,
            ..Default::default()
        };
        frame(&mut m, Command::Start, false, &mut d);
        d.altitude = 0;
        assert_eq!(frame(&mut m, Command::Start, true, &mut d), Some(Transition::Grounded));
        assert!(!m.armed());
        assert!(!d.calls.contains(&DispatchCommand::FlushPath));
    }

    #[test]
    fn without_vehicle_state_still_tracks_intent() {
        let mut m = FlightMachine::new();
        let mut d = Fake {
            detached: true,
            ..Default::default()
        };
        assert_eq!(frame(&mut m, Command::Start, false, &mut d), Some(Transition::TookOff));
        // no altitude answer, so no grounding; start + pending flushes
        assert_eq!(frame(&mut m, Command::Start, true, &mut d), Some(Transition::Flushed));
        assert_eq!(frame(&mut m, Command::Stop, false, &mut d), Some(Transition::Landed));
        assert!(d.calls.is_empty());
    }
}

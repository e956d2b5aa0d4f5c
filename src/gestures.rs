use crate::config::Thresholds;
use crate::landmarks::{Finger, HandSnapshot, Landmark};
use crate::path::QueuedAction;
use log::debug;

/// Static hand shape recognized in a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pose {
    /// Closed fist.
    Start,
    /// Open palm, thumb pointing down.
    Stop,
    /// Open palm.
    Wait,
    /// Index finger up.
    Move,
    /// Index and middle fingers up.
    Rotate,
}

/// Held command. `Move`/`Rotate` carry the index fingertip x of the last
/// frame, against which the next frame's delta is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    #[default]
    None,
    Start,
    Stop,
    Wait,
    Move { anchor_x: i32 },
    Rotate { anchor_x: i32 },
}

impl Command {
    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Wait => "wait",
            Self::Move { .. } => "move",
            Self::Rotate { .. } => "rotate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub command: Command,
    /// Delta to push onto the path queue this frame.
    pub delta: Option<QueuedAction>,
}

impl Classification {
    const NONE: Self = Self {
        command: Command::None,
        delta: None,
    };
}

/// Hand held upright: the wrist sits below every finger's DIP joint.
pub fn passes_gate(hand: &HandSnapshot) -> bool {
    let wrist_y = hand[Landmark::Wrist].y;
    Finger::ALL.iter().all(|f| wrist_y > hand[f.dip()].y)
}

/// First matching pose in priority order, or `None` when the gate fails or
/// no rule matches.
pub fn classify_pose(hand: &HandSnapshot, th: &Thresholds) -> Option<Pose> {
    use Finger::*;

    if !passes_gate(hand) {
        return None;
    }

    let curled = |f| hand.is_curled(f);
    let raised = |f| hand.is_raised(f);

    if Finger::ALL.into_iter().all(curled) {
        return Some(Pose::Start);
    }

    let all_raised = Finger::ALL.into_iter().all(raised);
    let thumb_down =
        hand[Landmark::ThumbTip].y - th.stop_thumb_margin_px > hand[Landmark::IndexMcp].y;
    if all_raised && thumb_down {
        return Some(Pose::Stop);
    }
    if all_raised {
        return Some(Pose::Wait);
    }
    if raised(Index) && curled(Middle) && curled(Ring) && curled(Pinky) {
        return Some(Pose::Move);
    }
    if raised(Index) && raised(Middle) && curled(Ring) && curled(Pinky) {
        return Some(Pose::Rotate);
    }
    None
}

#[derive(Debug)]
pub struct GestureDetector {
    th: Thresholds,
    held: Command,
}

impl GestureDetector {
    pub fn new(th: Thresholds) -> Self {
        Self {
            th,
            held: Command::None,
        }
    }

    pub fn set_thresholds(&mut self, th: Thresholds) {
        self.th = th;
    }

    pub fn held(&self) -> Command {
        self.held
    }

    pub fn reset(&mut self) {
        self.held = Command::None;
    }

    /// Classifies one right-hand snapshot against the held command.
    ///
    /// A failed gate drops the held command so a later Move/Rotate starts a
    /// fresh run. An unmatched shape leaves it untouched.
    pub fn update(&mut self, hand: &HandSnapshot) -> Classification {
        if !passes_gate(hand) {
            self.reset();
            return Classification::NONE;
        }
        let Some(pose) = classify_pose(hand, &self.th) else {
            return Classification::NONE;
        };

        let tip_x = hand[Landmark::IndexTip].x;
        let (command, delta) = match pose {
            Pose::Start => (Command::Start, None),
            Pose::Stop => (Command::Stop, None),
            Pose::Wait => (Command::Wait, None),
            Pose::Move => {
                let delta = match self.held {
                    Command::Move { anchor_x } => Some(QueuedAction::Move(tip_x - anchor_x)),
                    _ => None,
                };
                (Command::Move { anchor_x: tip_x }, delta)
            }
            Pose::Rotate => {
                let delta = match self.held {
                    Command::Rotate { anchor_x } => Some(QueuedAction::Rotate(tip_x - anchor_x)),
                    _ => None,
                };
                (Command::Rotate { anchor_x: tip_x }, delta)
            }
        };

        if std::mem::discriminant(&command) != std::mem::discriminant(&self.held) {
            debug!("gesture: {:?} -> {:?}", self.held, command);
        }
        self.held = command;
        Classification { command, delta }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::landmarks::{LANDMARK_COUNT, Point};
    use crate::path::PathQueue;

    /// Upright hand at a fixed spot; each finger raised or curled, thumb up
    /// or clearly down, index fingertip at `tip_x`.
    pub(crate) fn hand(
        fingers: [bool; 4],
        thumb_down: bool,
        tip_x: i32,
    ) -> HandSnapshot {
        let mut h = HandSnapshot::new([Point::default(); LANDMARK_COUNT]);
        h.set(Landmark::Wrist, Point::new(300, 400, 0));
        for (f, up) in Finger::ALL.into_iter().zip(fingers) {
            h.set(f.mcp(), Point::new(300, 250, 0));
            h.set(f.dip(), Point::new(300, if up { 150 } else { 300 }, 0));
        }
        h.set(Landmark::IndexTip, Point::new(tip_x, 120, 0));
        h.set(
            Landmark::ThumbTip,
            Point::new(260, if thumb_down { 320 } else { 200 }, 0),
        );
        h
    }

    pub(crate) fn fist() -> HandSnapshot {
        hand([false; 4], false, 300)
    }
    pub(crate) fn palm_thumb_down() -> HandSnapshot {
        hand([true; 4], true, 300)
    }
    pub(crate) fn palm() -> HandSnapshot {
        hand([true; 4], false, 300)
    }
    pub(crate) fn pointing(tip_x: i32) -> HandSnapshot {
        hand([true, false, false, false], false, tip_x)
    }
    pub(crate) fn two_up(tip_x: i32) -> HandSnapshot {
        hand([true, true, false, false], false, tip_x)
    }

    fn th() -> Thresholds {
        Thresholds::default()
    }

    #[test]
    fn poses_resolve_by_priority() {
        assert_eq!(classify_pose(&fist(), &th()), Some(Pose::Start));
        // a fist with the thumb tucked low is still Start
        assert_eq!(
            classify_pose(&hand([false; 4], true, 300), &th()),
            Some(Pose::Start)
        );
        assert_eq!(classify_pose(&palm_thumb_down(), &th()), Some(Pose::Stop));
        assert_eq!(classify_pose(&palm(), &th()), Some(Pose::Wait));
        assert_eq!(classify_pose(&pointing(300), &th()), Some(Pose::Move));
        assert_eq!(classify_pose(&two_up(300), &th()), Some(Pose::Rotate));
        assert_eq!(
            classify_pose(&hand([false, true, false, true], false, 300), &th()),
            None
        );
    }

    #[test]
    fn stop_margin_is_strict_and_configurable() {
        let mut h = palm();
        // index knuckle at y=250; exactly 50 px below is not enough
        h.set(Landmark::ThumbTip, Point::new(260, 300, 0));
        assert_eq!(classify_pose(&h, &th()), Some(Pose::Wait));
        h.set(Landmark::ThumbTip, Point::new(260, 301, 0));
        assert_eq!(classify_pose(&h, &th()), Some(Pose::Stop));

        let loose = Thresholds {
            stop_thumb_margin_px: 10,
            ..th()
        };
        h.set(Landmark::ThumbTip, Point::new(260, 270, 0));
        assert_eq!(classify_pose(&h, &loose), Some(Pose::Stop));
    }

    #[test]
    fn gate_requires_wrist_below_every_dip() {
        let mut h = fist();
        h.set(Landmark::Wrist, Point::new(300, 300, 0));
        assert!(!passes_gate(&h));
        assert_eq!(classify_pose(&h, &th()), None);
    }

    #[test]
    fn move_run_accumulates_into_one_entry() {
        let mut det = GestureDetector::new(th());
        let mut q = PathQueue::new();
        for x in [300, 340, 310] {
            if let Some(d) = det.update(&pointing(x)).delta {
                q.push(d);
            }
        }
        assert_eq!(q.as_slice(), &[QueuedAction::Move(10)]);
        assert_eq!(det.held(), Command::Move { anchor_x: 310 });
    }

    #[test]
    fn tail_delta_telescopes_over_any_run_length() {
        let xs = [120, 95, 400, 401, 233, 250, 12, 640];
        for n in 2..=xs.len() {
            let mut det = GestureDetector::new(th());
            let mut q = PathQueue::new();
            for &x in &xs[..n] {
                if let Some(d) = det.update(&pointing(x)).delta {
                    q.push(d);
                }
            }
            assert_eq!(q.tail(), Some(&QueuedAction::Move(xs[n - 1] - xs[0])));
            assert_eq!(q.len(), 1);
        }
    }

    #[test]
    fn switching_kind_starts_a_new_anchor() {
        let mut det = GestureDetector::new(th());
        assert_eq!(det.update(&pointing(100)).delta, None);
        assert_eq!(
            det.update(&pointing(150)).delta,
            Some(QueuedAction::Move(50))
        );
        assert_eq!(det.update(&two_up(150)).delta, None);
        assert_eq!(
            det.update(&two_up(120)).delta,
            Some(QueuedAction::Rotate(-30))
        );
    }

    #[test]
    fn unmatched_shape_keeps_anchor_but_gate_failure_drops_it() {
        let mut det = GestureDetector::new(th());
        det.update(&pointing(100));
        let c = det.update(&hand([false, true, false, true], false, 500));
        assert_eq!(c, Classification::NONE);
        assert_eq!(
            det.update(&pointing(130)).delta,
            Some(QueuedAction::Move(30))
        );

        let mut dropped = pointing(999);
        dropped.set(Landmark::Wrist, Point::new(300, 100, 0));
        assert_eq!(det.update(&dropped), Classification::NONE);
        assert_eq!(det.held(), Command::None);
        assert_eq!(det.update(&pointing(160)).delta, None);
    }
}

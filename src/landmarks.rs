//! The 21 tracked hand points and their pixel-space snapshot.

use std::ops::Index;

/// Anatomical label of one tracked point, in detector output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Landmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

pub const LANDMARK_COUNT: usize = 21;

impl Landmark {
    pub const ALL: [Landmark; LANDMARK_COUNT] = [
        Self::Wrist,
        Self::ThumbCmc,
        Self::ThumbMcp,
        Self::ThumbIp,
        Self::ThumbTip,
        Self::IndexMcp,
        Self::IndexPip,
        Self::IndexDip,
        Self::IndexTip,
        Self::MiddleMcp,
        Self::MiddlePip,
        Self::MiddleDip,
        Self::MiddleTip,
        Self::RingMcp,
        Self::RingPip,
        Self::RingDip,
        Self::RingTip,
        Self::PinkyMcp,
        Self::PinkyPip,
        Self::PinkyDip,
        Self::PinkyTip,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Bones drawn by the landmark overlay.
pub const SKELETON: [(Landmark, Landmark); 21] = {
    use Landmark::*;
    [
        (Wrist, ThumbCmc),
        (ThumbCmc, ThumbMcp),
        (ThumbMcp, ThumbIp),
        (ThumbIp, ThumbTip),
        (Wrist, IndexMcp),
        (IndexMcp, IndexPip),
        (IndexPip, IndexDip),
        (IndexDip, IndexTip),
        (IndexMcp, MiddleMcp),
        (MiddleMcp, MiddlePip),
        (MiddlePip, MiddleDip),
        (MiddleDip, MiddleTip),
        (MiddleMcp, RingMcp),
        (RingMcp, RingPip),
        (RingPip, RingDip),
        (RingDip, RingTip),
        (RingMcp, PinkyMcp),
        (PinkyMcp, PinkyPip),
        (PinkyPip, PinkyDip),
        (PinkyDip, PinkyTip),
        (Wrist, PinkyMcp),
    ]
};

/// The four non-thumb fingers the classifier reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 4] = [Self::Index, Self::Middle, Self::Ring, Self::Pinky];

    pub fn mcp(self) -> Landmark {
        match self {
            Self::Index => Landmark::IndexMcp,
            Self::Middle => Landmark::MiddleMcp,
            Self::Ring => Landmark::RingMcp,
            Self::Pinky => Landmark::PinkyMcp,
        }
    }

    pub fn dip(self) -> Landmark {
        match self {
            Self::Index => Landmark::IndexDip,
            Self::Middle => Landmark::MiddleDip,
            Self::Ring => Landmark::RingDip,
            Self::Pinky => Landmark::PinkyDip,
        }
    }
}

/// Pixel-space point; `z` is the detector's relative depth scaled by 100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// One hand in pixel coordinates for a single frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandSnapshot {
    points: [Point; LANDMARK_COUNT],
}

impl HandSnapshot {
    pub fn new(points: [Point; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Scales normalized image-fraction coordinates to a `width` x `height`
    /// frame, truncating toward zero.
    pub fn from_normalized(points: &[[f32; 3]; LANDMARK_COUNT], width: u32, height: u32) -> Self {
        let mut out = [Point::default(); LANDMARK_COUNT];
        for (dst, [x, y, z]) in out.iter_mut().zip(points.iter()) {
            *dst = Point {
                x: (x * width as f32) as i32,
                y: (y * height as f32) as i32,
                z: (z * 100.0) as i32,
            };
        }
        Self { points: out }
    }

    pub fn points(&self) -> &[Point; LANDMARK_COUNT] {
        &self.points
    }

    #[cfg(test)]
    pub fn set(&mut self, landmark: Landmark, p: Point) {
        self.points[landmark.index()] = p;
    }

    /// DIP joint sits above the knuckle (smaller y): finger held up.
    pub fn is_raised(&self, finger: Finger) -> bool {
        self[finger.mcp()].y > self[finger.dip()].y
    }

    /// DIP joint sits below the knuckle: finger curled into the palm.
    pub fn is_curled(&self, finger: Finger) -> bool {
        self[finger.mcp()].y < self[finger.dip()].y
    }
}

impl Index<Landmark> for HandSnapshot {
    type Output = Point;

    fn index(&self, l: Landmark) -> &Point {
        &self.points[l.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landmark_order_matches_detector_indices() {
        for (i, l) in Landmark::ALL.iter().enumerate() {
            assert_eq!(l.index(), i);
        }
        assert_eq!(Landmark::IndexTip.index(), 8);
        assert_eq!(Landmark::PinkyTip.index(), 20);
    }

    #[test]
    fn normalized_points_scale_and_truncate() {
        let mut raw = [[0.0f32; 3]; LANDMARK_COUNT];
        raw[Landmark::IndexTip.index()] = [0.5, 0.25, -0.123];
        raw[Landmark::Wrist.index()] = [0.999, 0.999, 0.0];
        let hand = HandSnapshot::from_normalized(&raw, 640, 480);
        assert_eq!(hand[Landmark::IndexTip], Point::new(320, 120, -12));
        assert_eq!(hand[Landmark::Wrist], Point::new(639, 479, 0));
    }

    #[test]
    fn raised_and_curled_are_strict() {
        let mut hand = HandSnapshot::new([Point::default(); LANDMARK_COUNT]);
        hand.set(Landmark::IndexMcp, Point::new(0, 100, 0));
        hand.set(Landmark::IndexDip, Point::new(0, 100, 0));
        assert!(!hand.is_raised(Finger::Index));
        assert!(!hand.is_curled(Finger::Index));

        hand.set(Landmark::IndexDip, Point::new(0, 60, 0));
        assert!(hand.is_raised(Finger::Index));
        hand.set(Landmark::IndexDip, Point::new(0, 140, 0));
        assert!(hand.is_curled(Finger::Index));
    }
}

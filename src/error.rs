use thiserror::Error;

use crate::actions::ActuatorError;
use crate::input::FrameError;
use crate::minimap::MinimapError;
use crate::tracker::DetectorError;

/// Anything that ends a control session abnormally.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("connection lost: no frame for {misses} consecutive attempts")]
    ConnectionLost { misses: u32 },
    #[error("vehicle command failed: {0}")]
    Actuator(#[from] ActuatorError),
    #[error("hand detection failed: {0}")]
    Detector(#[from] DetectorError),
    #[error("minimap: {0}")]
    Minimap(#[from] MinimapError),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

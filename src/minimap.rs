//! Dead-reckoning map of the commanded path.
//!
//! The world canvas is a fixed square raster with the drone starting at its
//! centre. Queued path entries are replayed once into the canvas (heading and
//! position accumulate across flushes) and a circular viewport around the
//! drone is composited onto each output frame.

use image::{
    RgbImage,
    imageops::{self, FilterType},
};
use log::debug;
use thiserror::Error;

use crate::draw::{self, BLACK, MARKER_RED, PATH_GREEN, RING_GREEN};
use crate::geometry::line_by_angle;
use crate::path::QueuedAction;

const PATH_HALF_WIDTH: i32 = 5;
const MARKER_HALF_WIDTH: i32 = 10;
const RADAR_RINGS: u32 = 3;
const BORDER_THICKNESS: u32 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MinimapError {
    #[error(
        "viewport {width}x{height} around ({x}, {y}) leaves the {canvas}x{canvas} canvas"
    )]
    ViewportOutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        canvas: u32,
    },
    #[error("minimap of size {size} at ({x}, {y}) does not fit a {width}x{height} frame")]
    DestinationOutOfBounds {
        x: u32,
        y: u32,
        size: u32,
        width: u32,
        height: u32,
    },
}

pub struct Minimap {
    canvas: RgbImage,
    path: Vec<QueuedAction>,
    cursor: usize,
    position: (i32, i32),
    heading_deg: f64,
}

impl Minimap {
    pub fn new(canvas_size: u32) -> Self {
        let c = (canvas_size / 2) as i32;
        Self {
            canvas: RgbImage::new(canvas_size, canvas_size),
            path: Vec::new(),
            cursor: 0,
            position: (c, c),
            heading_deg: 0.0,
        }
    }

    /// New path entry, mirroring an append to the path queue.
    pub fn append_action(&mut self, action: QueuedAction) {
        self.path.push(action);
    }

    /// Mirrors a merge into the queue tail. An entry already rasterized keeps
    /// its drawn length.
    pub fn merge_tail(&mut self, action: QueuedAction) {
        if let Some(tail) = self.path.last_mut() {
            *tail = action;
        }
    }

    /// Forgets the path entries once the vehicle has flown them. Canvas,
    /// position and heading carry over.
    pub fn clear_path(&mut self) {
        self.path.clear();
        self.cursor = 0;
    }

    pub fn position(&self) -> (i32, i32) {
        self.position
    }

    pub fn heading_deg(&self) -> f64 {
        self.heading_deg
    }

    #[cfg(test)]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[cfg(test)]
    pub fn path_len(&self) -> usize {
        self.path.len()
    }

    #[cfg(test)]
    pub fn canvas(&self) -> &RgbImage {
        &self.canvas
    }

    fn replay(&mut self) {
        for action in &self.path[self.cursor..] {
            match *action {
                QueuedAction::Rotate(deg) => self.heading_deg += deg as f64,
                QueuedAction::Move(len) => {
                    let (x, y) = self.position;
                    let line = line_by_angle(x, y, len as f64, self.heading_deg);
                    draw::stamp_line(&mut self.canvas, &line, PATH_HALF_WIDTH, PATH_GREEN);
                    if let Some(&end) = line.last() {
                        self.position = end;
                    }
                }
            }
            debug!(
                "minimap: {action:?} -> pos {:?} heading {}",
                self.position, self.heading_deg
            );
        }
        self.cursor = self.path.len();
    }

    /// Replays new path entries, then composites a circular view of the
    /// canvas around the drone onto `frame` at `position`, `2 * size` pixels
    /// square.
    pub fn render_viewport(
        &mut self,
        frame: &mut RgbImage,
        position: [u32; 2],
        size: u32,
    ) -> Result<(), MinimapError> {
        let (width, height) = frame.dimensions();
        let [dx, dy] = position;
        let span = 2 * u64::from(size);
        if size == 0
            || u64::from(dx) + span > u64::from(width)
            || u64::from(dy) + span > u64::from(height)
        {
            return Err(MinimapError::DestinationOutOfBounds {
                x: dx,
                y: dy,
                size,
                width,
                height,
            });
        }

        self.replay();

        let (half_w, half_h) = ((width / 2) as i32, (height / 2) as i32);
        let (px, py) = self.position;
        let canvas = self.canvas.width() as i32;
        if px - half_w < 0 || py - half_h < 0 || px + half_w > canvas || py + half_h > canvas {
            return Err(MinimapError::ViewportOutOfBounds {
                x: px,
                y: py,
                width,
                height,
                canvas: self.canvas.width(),
            });
        }

        let mut view = imageops::crop_imm(
            &self.canvas,
            (px - half_w) as u32,
            (py - half_h) as u32,
            2 * half_w as u32,
            2 * half_h as u32,
        )
        .to_image();
        draw::stamp(&mut view, half_w, half_h, MARKER_HALF_WIDTH, MARKER_RED);

        // canvas y grows downward; flip so a left turn reads counter-clockwise
        let view = imageops::flip_vertical(&view);
        let mut view = imageops::resize(&view, 2 * size, 2 * size, FilterType::Nearest);

        let c = size as i32;
        for k in 1..RADAR_RINGS {
            draw::ring(&mut view, c, c, size * k / RADAR_RINGS, 1, RING_GREEN);
        }
        draw::clear_outside(&mut view, c, c, size, BLACK);

        draw::overlay_non_black(frame, &view, dx, dy);
        draw::ring(
            frame,
            (dx + size) as i32,
            (dy + size) as i32,
            size,
            BORDER_THICKNESS,
            BLACK,
        );
        Ok(())
    }
}

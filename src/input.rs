//! Frame sources: a directory of stills or a synthetic blank feed.

use image::{Rgb, RgbImage};
use log::{debug, warn};
use std::{
    collections::VecDeque,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("cannot list frames in {}: {source}", .path.display())]
    List {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot save frame {}: {source}", .path.display())]
    Save {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Produces the next frame, or `None` when nothing arrived this time.
/// A `None` is not fatal; the caller decides how many to tolerate.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>, FrameError>;
}

const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Plays back still images from a directory in file name order. Files that
/// fail to decode count as missed frames.
pub struct ImageDirSource {
    files: VecDeque<PathBuf>,
    width: u32,
    height: u32,
}

impl ImageDirSource {
    pub fn open(dir: &Path, width: u32, height: u32) -> Result<Self, FrameError> {
        let rd = fs::read_dir(dir).map_err(|source| FrameError::List {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut files: Vec<PathBuf> = rd
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            })
            .collect();
        files.sort();
        debug!("{} frame files under {}", files.len(), dir.display());
        Ok(Self {
            files: files.into(),
            width,
            height,
        })
    }

    #[cfg(test)]
    pub fn remaining(&self) -> usize {
        self.files.len()
    }
}

impl FrameSource for ImageDirSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>, FrameError> {
        let Some(path) = self.files.pop_front() else {
            return Ok(None);
        };
        match image::open(&path) {
            Ok(img) => {
                let mut rgb = img.to_rgb8();
                if rgb.dimensions() != (self.width, self.height) {
                    rgb = image::imageops::resize(
                        &rgb,
                        self.width,
                        self.height,
                        image::imageops::FilterType::Triangle,
                    );
                }
                Ok(Some(rgb))
            }
            Err(e) => {
                warn!("skipping frame {}: {e}", path.display());
                Ok(None)
            }
        }
    }
}

/// Uniform frames for running without a camera. `limit` of `None` never
/// runs dry.
pub struct BlankSource {
    width: u32,
    height: u32,
    limit: Option<u64>,
    served: u64,
}

const BLANK_FILL: Rgb<u8> = Rgb([48, 48, 48]);

impl BlankSource {
    pub fn new(width: u32, height: u32, limit: Option<u64>) -> Self {
        Self {
            width,
            height,
            limit,
            served: 0,
        }
    }
}

impl FrameSource for BlankSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>, FrameError> {
        if self.limit.is_some_and(|n| self.served >= n) {
            return Ok(None);
        }
        self.served += 1;
        Ok(Some(RgbImage::from_pixel(self.width, self.height, BLANK_FILL)))
    }
}

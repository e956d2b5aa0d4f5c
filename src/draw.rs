//! Raster primitives on RGB frames. Writes outside the image are clipped.

use image::{Rgb, RgbImage};

use crate::geometry::bresenham;
use crate::landmarks::{HandSnapshot, SKELETON};

pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const PATH_GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const MARKER_RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const RING_GREEN: Rgb<u8> = Rgb([0, 90, 0]);
const JOINT_COLOR: Rgb<u8> = Rgb([255, 40, 40]);
const BONE_COLOR: Rgb<u8> = Rgb([240, 240, 240]);

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Filled square of side `2 * half + 1` centred on `(x, y)`.
pub fn stamp(img: &mut RgbImage, x: i32, y: i32, half: i32, color: Rgb<u8>) {
    for yy in (y - half) as i64..=(y + half) as i64 {
        for xx in (x - half) as i64..=(x + half) as i64 {
            put(img, xx, yy, color);
        }
    }
}

/// Stamps every pixel of an already rasterized line.
pub fn stamp_line(img: &mut RgbImage, pixels: &[(i32, i32)], half: i32, color: Rgb<u8>) {
    for &(x, y) in pixels {
        stamp(img, x, y, half, color);
    }
}

fn dist2(x: i64, y: i64, cx: i64, cy: i64) -> i64 {
    (x - cx) * (x - cx) + (y - cy) * (y - cy)
}

/// Circle outline of the given thickness, centred on `(cx, cy)`.
pub fn ring(img: &mut RgbImage, cx: i32, cy: i32, radius: u32, thickness: u32, color: Rgb<u8>) {
    let (cx, cy, r) = (cx as i64, cy as i64, radius as i64);
    let half = (thickness as i64).max(1) as f64 / 2.0;
    let inner = ((r as f64 - half).max(0.0)).powi(2);
    let outer = (r as f64 + half).powi(2);
    let reach = r + half.ceil() as i64;
    for y in cy - reach..=cy + reach {
        for x in cx - reach..=cx + reach {
            let d = dist2(x, y, cx, cy) as f64;
            if d >= inner && d < outer {
                put(img, x, y, color);
            }
        }
    }
}

/// Paints every pixel at or beyond `radius` from `(cx, cy)`.
pub fn clear_outside(img: &mut RgbImage, cx: i32, cy: i32, radius: u32, color: Rgb<u8>) {
    let r2 = (radius as i64) * (radius as i64);
    for (x, y, px) in img.enumerate_pixels_mut() {
        if dist2(x as i64, y as i64, cx as i64, cy as i64) >= r2 {
            *px = color;
        }
    }
}

/// Copies `src` onto `dst` at `(x, y)` wherever `src` is not pure black.
/// Whatever falls outside `dst` is clipped.
pub fn overlay_non_black(dst: &mut RgbImage, src: &RgbImage, x: u32, y: u32) {
    for (sx, sy, px) in src.enumerate_pixels() {
        if px.0 != [0, 0, 0] {
            put(dst, i64::from(x) + i64::from(sx), i64::from(y) + i64::from(sy), *px);
        }
    }
}

/// Hand skeleton with a dot on every joint.
pub fn hand_overlay(img: &mut RgbImage, hand: &HandSnapshot) {
    for (a, b) in SKELETON {
        let (pa, pb) = (hand[a], hand[b]);
        stamp_line(img, &bresenham(pa.x, pa.y, pb.x, pb.y), 0, BONE_COLOR);
    }
    for p in hand.points() {
        stamp(img, p.x, p.y, 2, JOINT_COLOR);
    }
}

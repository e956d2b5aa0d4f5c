//! Integer line rasterization and heading math for the minimap.

/// Every pixel on the straight line from `(x0, y0)` to `(x1, y1)`, endpoints
/// included, in drawing order.
pub fn bresenham(mut x0: i32, mut y0: i32, x1: i32, y1: i32) -> Vec<(i32, i32)> {
    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx - dy;

    let mut pixels = Vec::with_capacity((dx.max(dy) + 1) as usize);
    loop {
        pixels.push((x0, y0));
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = err.saturating_mul(2);
        if e2 > -dy {
            err -= dy;
            x0 += sx;
        }
        if e2 < dx {
            err += dx;
            y0 += sy;
        }
    }
    pixels
}

/// Endpoint of a segment of `length` pixels leaving `(x0, y0)` at `degrees`
/// (0 = +x, 90 = +y). Components truncate toward zero.
pub fn endpoint_by_angle(x0: i32, y0: i32, length: f64, degrees: f64) -> (i32, i32) {
    let rad = degrees.to_radians();
    (
        x0 + (length * rad.cos()) as i32,
        y0 + (length * rad.sin()) as i32,
    )
}

/// Rasterized segment of `length` pixels from `(x0, y0)` along `degrees`.
/// A negative length runs opposite to the heading.
pub fn line_by_angle(x0: i32, y0: i32, length: f64, degrees: f64) -> Vec<(i32, i32)> {
    let (x1, y1) = endpoint_by_angle(x0, y0, length, degrees);
    bresenham(x0, y0, x1, y1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_line_includes_both_endpoints() {
        let px = bresenham(0, 0, 4, 0);
        assert_eq!(px, vec![(0, 0), (1, 0), (2, 0), (3, 0), (4, 0)]);
    }

    #[test]
    fn single_point_line() {
        assert_eq!(bresenham(7, -3, 7, -3), vec![(7, -3)]);
    }

    #[test]
    fn steep_line_is_contiguous() {
        let px = bresenham(2, 10, 5, 0);
        assert_eq!(px.first(), Some(&(2, 10)));
        assert_eq!(px.last(), Some(&(5, 0)));
        assert_eq!(px.len(), 11);
        for w in px.windows(2) {
            let (a, b) = (w[0], w[1]);
            assert!((a.0 - b.0).abs() <= 1 && (a.1 - b.1).abs() <= 1);
        }
    }

    #[test]
    fn angle_endpoints_truncate() {
        assert_eq!(endpoint_by_angle(100, 100, 50.0, 0.0), (150, 100));
        assert_eq!(endpoint_by_angle(100, 100, 50.0, 90.0), (100, 150));
        assert_eq!(endpoint_by_angle(100, 100, 50.0, 180.0), (50, 100));
        assert_eq!(endpoint_by_angle(0, 0, 10.0, 45.0), (7, 7));
    }

    #[test]
    fn negative_length_runs_backwards() {
        let line = line_by_angle(10, 10, -5.0, 0.0);
        assert_eq!(line.last(), Some(&(5, 10)));
    }
}

//! Thick freehand/line stroke rasterization.
//!
//! A stroke segment is an integer Bresenham walk from `p0` to `p1` that stamps
//! a filled disk (the nib) at every stepped pixel. Stamping per step, rather
//! than once per segment, keeps the stroke connected at any slope. Freehand
//! tools call this once per pointer-move between the previous and current
//! positions; the line tool calls it once on release.

use image::Rgba;

use crate::canvas::{pack_rgba, PixelBuffer};

/// Draw a solid thick line segment from `p0` to `p1` directly into the buffer.
///
/// `thickness` is the nib diameter in pixels; the stamped disk radius is
/// `thickness / 2`, floored to at least 1. `p0 == p1` still stamps one disk,
/// which is what a single click produces. Everything is clipped to the buffer.
pub fn draw_line(buf: &mut PixelBuffer, p0: (i32, i32), p1: (i32, i32), color: Rgba<u8>, thickness: u32) {
    let (mut x0, mut y0) = p0;
    let (x1, y1) = p1;
    let px = pack_rgba(color);
    let radius = ((thickness / 2) as i32).max(1);

    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx - dy;

    loop {
        fill_disk(buf, x0, y0, radius, px);

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x0 += sx;
        }
        if e2 < dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Stamp a filled disk of `radius` centered at `(cx, cy)`.
/// Disk membership is `dx*dx + dy*dy <= radius*radius`.
fn fill_disk(buf: &mut PixelBuffer, cx: i32, cy: i32, radius: i32, px: u32) {
    let r2 = radius * radius;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= r2 {
                buf.set(cx + dx, cy + dy, px);
            }
        }
    }
}

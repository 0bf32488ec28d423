//! Ellipse and callout rasterization.
//!
//! Shapes are defined by the two drag corners of a gesture. The outline (and
//! optional interior fill) is evaluated per pixel from a signed distance
//! function, with a smoothstep band for edge anti-aliasing, and written into
//! a full-canvas premultiplied overlay for the compositor. Only the padded
//! bounding box of the shape is scanned; the rest of the overlay stays
//! transparent.

use image::Rgba;

use crate::ops::overlay::{blank_overlay, put_coverage, Overlay};

/// Stroke/fill styling for one shape commit, supplied per gesture.
#[derive(Clone, Copy, Debug)]
pub struct ShapeStyle {
    pub stroke_color: Rgba<u8>,
    /// Outline thickness in pixels, >= 1.
    pub stroke_thickness: u32,
    /// `None` leaves the interior transparent so the background shows through.
    pub fill: Option<Rgba<u8>>,
}

/// Axis-aligned box spanned by two gesture corners.
#[derive(Clone, Copy)]
struct DragBox {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

impl DragBox {
    fn new(a: (f32, f32), b: (f32, f32)) -> Self {
        Self {
            x: a.0.min(b.0),
            y: a.1.min(b.1),
            w: (b.0 - a.0).abs(),
            h: (b.1 - a.1).abs(),
        }
    }
}

/// Rasterize an ellipse inscribed in the drag box.
///
/// Returns the overlay to composite, or `None` when the box is degenerate
/// (either extent under 1 px), in which case nothing must be committed.
pub fn rasterize_ellipse(
    corner_a: (f32, f32),
    corner_b: (f32, f32),
    style: &ShapeStyle,
    canvas_w: u32,
    canvas_h: u32,
) -> Option<Overlay> {
    let bx = DragBox::new(corner_a, corner_b);
    if bx.w < 1.0 || bx.h < 1.0 {
        return None;
    }

    let cx = bx.x + bx.w * 0.5;
    let cy = bx.y + bx.h * 0.5;
    let rx = bx.w * 0.5;
    let ry = bx.h * 0.5;

    Some(rasterize_sdf(
        |px, py| sdf_ellipse(px - cx, py - cy, rx, ry),
        &bx,
        style,
        canvas_w,
        canvas_h,
    ))
}

/// Rasterize a callout: the drag box's upper portion as a body rectangle with
/// a triangular pointer tail descending to the box's bottom edge.
///
/// Returns `None` when the box is degenerate (either extent under 2 px).
pub fn rasterize_callout(
    corner_a: (f32, f32),
    corner_b: (f32, f32),
    style: &ShapeStyle,
    canvas_w: u32,
    canvas_h: u32,
) -> Option<Overlay> {
    let bx = DragBox::new(corner_a, corner_b);
    if bx.w < 2.0 || bx.h < 2.0 {
        return None;
    }

    let verts = callout_outline(&bx);
    Some(rasterize_sdf(
        |px, py| sdf_polygon(&verts, px, py),
        &bx,
        style,
        canvas_w,
        canvas_h,
    ))
}

/// Closed callout silhouette: body rectangle over the top of the box, tail
/// dropping from 35% width at the body's bottom edge to a tip at 15% width /
/// full height, back up at 20% width.
fn callout_outline(bx: &DragBox) -> Vec<(f32, f32)> {
    let tail_h = bx.h * 0.3;
    let mut rect_h = bx.h - tail_h;
    if rect_h < 2.0 {
        rect_h = bx.h * 0.7;
    }

    let (x, y, w, h) = (bx.x, bx.y, bx.w, bx.h);
    vec![
        (x, y),
        (x + w, y),
        (x + w, y + rect_h),
        (x + w * 0.35, y + rect_h),
        (x + w * 0.15, y + h), // tail tip
        (x + w * 0.2, y + rect_h),
        (x, y + rect_h),
    ]
}

// ============================================================================
// SDF scan
// ============================================================================

/// Evaluate `sdf` over the padded bounding box and write outline/fill
/// coverage into a fresh full-canvas overlay.
fn rasterize_sdf<F: Fn(f32, f32) -> f32>(
    sdf: F,
    bx: &DragBox,
    style: &ShapeStyle,
    canvas_w: u32,
    canvas_h: u32,
) -> Overlay {
    let mut overlay = blank_overlay(canvas_w, canvas_h);

    let outline_half = (style.stroke_thickness.max(1)) as f32 * 0.5;
    let pad = outline_half + 2.0;
    let x0 = ((bx.x - pad).floor() as i32).max(0);
    let y0 = ((bx.y - pad).floor() as i32).max(0);
    let x1 = ((bx.x + bx.w + pad).ceil() as i32).min(canvas_w as i32);
    let y1 = ((bx.y + bx.h + pad).ceil() as i32).min(canvas_h as i32);

    for y in y0..y1 {
        let py = y as f32 + 0.5;
        for x in x0..x1 {
            let px = x as f32 + 0.5;
            let d = sdf(px, py);

            let fill_cov = match style.fill {
                Some(_) => smoothstep(0.5, -0.5, d),
                None => 0.0,
            };
            let band = d.abs() - outline_half;
            let outline_cov = smoothstep(0.5, -0.5, band);

            // Outline sits on top of the fill; the fill only contributes
            // where the outline leaves room.
            if outline_cov > 0.001 {
                let oa = outline_cov;
                let fa = fill_cov * (1.0 - oa);
                let total = oa + fa;
                let fill = style.fill.unwrap_or(Rgba([0, 0, 0, 0]));
                let s = style.stroke_color;
                let mix = |sc: u8, fc: u8| {
                    ((sc as f32 * oa + fc as f32 * fa) / total) as u8
                };
                let color = Rgba([
                    mix(s[0], fill[0]),
                    mix(s[1], fill[1]),
                    mix(s[2], fill[2]),
                    mix(s[3], fill[3]),
                ]);
                put_coverage(&mut overlay, canvas_w, x, y, color, total);
            } else if fill_cov > 0.001 {
                // Interior; transparent when fill is disabled
                if let Some(fill) = style.fill {
                    put_coverage(&mut overlay, canvas_w, x, y, fill, fill_cov);
                }
            }
        }
    }

    overlay
}

/// Approximate signed distance to an ellipse with radii `(rx, ry)` centered
/// at the origin. Negative inside.
fn sdf_ellipse(px: f32, py: f32, rx: f32, ry: f32) -> f32 {
    let nx = px / rx;
    let ny = py / ry;
    let len = (nx * nx + ny * ny).sqrt();
    if len < 1e-8 {
        return -rx.min(ry);
    }
    // Distance from the normalized circle surface, scaled back
    let scale = (rx * rx * ny * ny + ry * ry * nx * nx).sqrt() / (rx * ry * len);
    (len - 1.0) / scale
}

/// Signed distance to a simple closed polygon. Negative inside (winding
/// crossing test flips the sign).
fn sdf_polygon(verts: &[(f32, f32)], px: f32, py: f32) -> f32 {
    let n = verts.len();
    let mut d = (px - verts[0].0) * (px - verts[0].0) + (py - verts[0].1) * (py - verts[0].1);
    let mut s: f32 = 1.0;
    let mut j = n - 1;
    for i in 0..n {
        let ex = verts[j].0 - verts[i].0;
        let ey = verts[j].1 - verts[i].1;
        let wx = px - verts[i].0;
        let wy = py - verts[i].1;
        let t = ((wx * ex + wy * ey) / (ex * ex + ey * ey)).clamp(0.0, 1.0);
        let bx = wx - ex * t;
        let by = wy - ey * t;
        d = d.min(bx * bx + by * by);

        let c1 = py >= verts[i].1;
        let c2 = py < verts[j].1;
        let c3 = ex * wy > ey * wx;
        if (c1 && c2 && c3) || (!c1 && !c2 && !c3) {
            s = -s;
        }
        j = i;
    }
    s * d.sqrt()
}

/// Smoothstep between edge0 and edge1.
#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

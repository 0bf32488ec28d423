//! Single-line text stamping.
//!
//! Glyphs are laid out with kerned advances, rasterized to a coverage plane
//! with `ab_glyph`, then converted into a premultiplied overlay for the
//! compositor. Fonts are resolved from the system by family name through
//! `font-kit`; the host passes the family as a plain string.

use ab_glyph::{point, Font, FontArc, ScaleFont};
use image::Rgba;

use crate::ops::overlay::{blank_overlay, put_coverage, Overlay};

/// Load a font by family name from the system, regular weight.
/// Returns `None` when the family cannot be resolved or its data is unusable.
pub fn load_system_font(family: &str) -> Option<FontArc> {
    use font_kit::family_name::FamilyName;
    use font_kit::properties::Properties;
    use font_kit::source::SystemSource;

    let source = SystemSource::new();
    let handle = source
        .select_best_match(&[FamilyName::Title(family.to_string())], &Properties::new())
        .ok()?;

    let font_data = handle.load().ok()?;
    let bytes: Vec<u8> = (*font_data.copy_font_data()?).clone();
    FontArc::try_from_vec(bytes).ok()
}

/// Rasterize one line of text into an overlay.
///
/// The anchor is the stamp's top-left: the line starts at `anchor.0` and the
/// ascent hangs from `anchor.1` (baseline at `anchor.1 + ascent`). Returns
/// `None` for an empty string or when no glyph coverage lands on the canvas.
pub fn rasterize_text(
    font: &FontArc,
    text: &str,
    font_size: f32,
    anchor: (f32, f32),
    color: Rgba<u8>,
    canvas_w: u32,
    canvas_h: u32,
) -> Option<Overlay> {
    if text.is_empty() {
        return None;
    }

    let scaled = font.as_scaled(font_size);
    let baseline_y = anchor.1 + scaled.ascent();

    // Kerned advance layout along the baseline
    let mut positioned = Vec::new();
    let mut cursor_x = 0.0f32;
    let mut last_glyph = None;
    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = last_glyph {
            cursor_x += scaled.kern(prev, glyph_id);
        }
        positioned.push((glyph_id, anchor.0 + cursor_x));
        cursor_x += scaled.h_advance(glyph_id);
        last_glyph = Some(glyph_id);
    }

    // Coverage plane over the full canvas; glyph pixels land via max so
    // overlapping outlines don't double up.
    let wu = canvas_w as usize;
    let mut coverage = vec![0.0f32; wu * canvas_h as usize];
    let mut any = false;

    for (glyph_id, gx) in positioned {
        let glyph = glyph_id.with_scale_and_position(font_size, point(gx, baseline_y));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, cov| {
                let x = bounds.min.x as i32 + px as i32;
                let y = bounds.min.y as i32 + py as i32;
                if x >= 0 && y >= 0 && (x as u32) < canvas_w && (y as u32) < canvas_h && cov > 0.0 {
                    let idx = y as usize * wu + x as usize;
                    coverage[idx] = coverage[idx].max(cov);
                    any = true;
                }
            });
        }
    }

    if !any {
        return None;
    }

    let mut overlay = blank_overlay(canvas_w, canvas_h);
    for y in 0..canvas_h as i32 {
        for x in 0..canvas_w as i32 {
            let cov = coverage[y as usize * wu + x as usize];
            if cov > 0.001 {
                put_coverage(&mut overlay, canvas_w, x, y, color, cov);
            }
        }
    }

    Some(overlay)
}

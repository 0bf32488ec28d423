//! Drawing tools and pointer-gesture dispatch.
//!
//! One tool is active at a time; its in-flight gesture state (anchor point,
//! previous freehand point, current drag position) lives inside the active
//! `Tool` variant, so selecting another tool drops any half-finished gesture.
//!
//! The freehand tools (pen, eraser) stroke directly into the buffer on every
//! pointer-move. The drag tools (line, ellipse, callout) only expose a
//! preview overlay while the pointer is down and commit a single raster
//! mutation on release. Fill and text act on pointer-down alone.

use image::Rgba;

use crate::canvas::Document;
use crate::log_warn;
use crate::ops::compositor::composite_over;
use crate::ops::fill::flood_fill;
use crate::ops::overlay::Overlay;
use crate::ops::shapes::{rasterize_callout, rasterize_ellipse, ShapeStyle};
use crate::ops::stroke::draw_line;
use crate::ops::text::{load_system_font, rasterize_text};

/// The eraser paints opaque white; the buffer has no empty state to erase to.
const ERASER_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Point size used when the host hands us a nonsense text size.
const DEFAULT_FONT_SIZE: f32 = 14.0;

// ============================================================================
// SETTINGS
// ============================================================================

/// Stroke/fill configuration, re-supplied by the host for every gesture.
#[derive(Clone, Copy, Debug)]
pub struct ToolSettings {
    pub stroke_color: Rgba<u8>,
    pub fill_color: Rgba<u8>,
    /// Nib diameter in pixels, >= 1.
    pub stroke_thickness: u32,
    /// Shapes paint a solid interior when set; outline-only otherwise.
    pub fill_enabled: bool,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            stroke_color: Rgba([0, 0, 0, 255]),
            fill_color: Rgba([255, 255, 0, 255]),
            stroke_thickness: 3,
            fill_enabled: false,
        }
    }
}

/// Text stamp configuration (string, family, point size), host-supplied.
#[derive(Clone, Debug)]
pub struct TextConfig {
    pub text: String,
    pub font_family: String,
    pub font_size: f32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_family: "Arial".to_string(),
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

// ============================================================================
// TOOLS
// ============================================================================

/// Active tool, gesture state included.
#[derive(Clone, Debug, PartialEq)]
pub enum Tool {
    Pen { last_point: Option<(i32, i32)> },
    Eraser { last_point: Option<(i32, i32)> },
    Line { anchor: Option<(f32, f32)>, cursor: (f32, f32) },
    Ellipse { anchor: Option<(f32, f32)>, cursor: (f32, f32) },
    Callout { anchor: Option<(f32, f32)>, cursor: (f32, f32) },
    Fill,
    Text,
}

impl Tool {
    pub fn pen() -> Self {
        Tool::Pen { last_point: None }
    }
    pub fn eraser() -> Self {
        Tool::Eraser { last_point: None }
    }
    pub fn line() -> Self {
        Tool::Line { anchor: None, cursor: (0.0, 0.0) }
    }
    pub fn ellipse() -> Self {
        Tool::Ellipse { anchor: None, cursor: (0.0, 0.0) }
    }
    pub fn callout() -> Self {
        Tool::Callout { anchor: None, cursor: (0.0, 0.0) }
    }

    /// Display name for the host's status bar.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Pen { .. } => "Pen",
            Tool::Eraser { .. } => "Eraser",
            Tool::Line { .. } => "Line",
            Tool::Ellipse { .. } => "Ellipse",
            Tool::Callout { .. } => "Callout",
            Tool::Fill => "Fill",
            Tool::Text => "Text",
        }
    }
}

// ============================================================================
// CONTROLLER
// ============================================================================

/// Routes pointer events to the active tool and owns the per-gesture
/// configuration the host keeps up to date.
pub struct ToolController {
    pub tool: Tool,
    pub settings: ToolSettings,
    pub text: TextConfig,
}

impl Default for ToolController {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolController {
    pub fn new() -> Self {
        Self {
            tool: Tool::pen(),
            settings: ToolSettings::default(),
            text: TextConfig::default(),
        }
    }

    /// Switch tools. Any in-flight gesture of the old tool is abandoned.
    pub fn select(&mut self, tool: Tool) {
        self.tool = tool;
    }

    /// Pointer pressed at `pos` (canvas coordinates, fractional).
    pub fn pointer_down(&mut self, doc: &mut Document, pos: (f32, f32)) {
        match &mut self.tool {
            Tool::Pen { last_point } => {
                *last_point = Some(trunc(pos));
                doc.modified = true;
            }
            Tool::Eraser { last_point } => {
                let p = trunc(pos);
                *last_point = Some(p);
                // A click erases a dab even without any movement
                draw_line(&mut doc.buffer, p, p, ERASER_COLOR, self.settings.stroke_thickness * 2);
                doc.modified = true;
            }
            Tool::Line { anchor, cursor }
            | Tool::Ellipse { anchor, cursor }
            | Tool::Callout { anchor, cursor } => {
                *anchor = Some(pos);
                *cursor = pos;
            }
            Tool::Fill => {
                let (x, y) = trunc(pos);
                if x >= 0 && y >= 0 && (x as u32) < doc.buffer.width() && (y as u32) < doc.buffer.height() {
                    flood_fill(&mut doc.buffer, x, y, self.settings.fill_color);
                    doc.modified = true;
                }
            }
            Tool::Text => stamp_text(&self.text, &self.settings, doc, pos),
        }
    }

    /// Pointer moved to `pos`; `primary_held` is the primary button state.
    pub fn pointer_move(&mut self, doc: &mut Document, pos: (f32, f32), primary_held: bool) {
        match &mut self.tool {
            Tool::Pen { last_point } => {
                if !primary_held {
                    return;
                }
                if let Some(last) = *last_point {
                    draw_line(&mut doc.buffer, last, trunc(pos), self.settings.stroke_color, self.settings.stroke_thickness);
                    *last_point = Some(trunc(pos));
                    doc.modified = true;
                }
            }
            Tool::Eraser { last_point } => {
                if !primary_held {
                    return;
                }
                if let Some(last) = *last_point {
                    draw_line(&mut doc.buffer, last, trunc(pos), ERASER_COLOR, self.settings.stroke_thickness * 2);
                    *last_point = Some(trunc(pos));
                    doc.modified = true;
                }
            }
            Tool::Line { anchor, cursor }
            | Tool::Ellipse { anchor, cursor }
            | Tool::Callout { anchor, cursor } => {
                // Preview geometry only; the buffer is untouched until release
                if primary_held && anchor.is_some() {
                    *cursor = pos;
                }
            }
            Tool::Fill | Tool::Text => {}
        }
    }

    /// Pointer released at `pos`. Drag tools commit here.
    pub fn pointer_up(&mut self, doc: &mut Document, pos: (f32, f32)) {
        match &mut self.tool {
            Tool::Pen { last_point } | Tool::Eraser { last_point } => {
                *last_point = None;
            }
            Tool::Line { anchor, .. } => {
                if let Some(start) = anchor.take() {
                    draw_line(&mut doc.buffer, trunc(start), trunc(pos), self.settings.stroke_color, self.settings.stroke_thickness);
                    doc.modified = true;
                }
            }
            Tool::Ellipse { anchor, .. } => {
                if let Some(start) = anchor.take() {
                    let style = shape_style(&self.settings);
                    if let Some(overlay) =
                        rasterize_ellipse(start, pos, &style, doc.buffer.width(), doc.buffer.height())
                    {
                        composite_over(&mut doc.buffer, &overlay);
                        doc.modified = true;
                    }
                }
            }
            Tool::Callout { anchor, .. } => {
                if let Some(start) = anchor.take() {
                    let style = shape_style(&self.settings);
                    if let Some(overlay) =
                        rasterize_callout(start, pos, &style, doc.buffer.width(), doc.buffer.height())
                    {
                        composite_over(&mut doc.buffer, &overlay);
                        doc.modified = true;
                    }
                }
            }
            Tool::Fill | Tool::Text => {}
        }
    }

    /// Overlay for the in-progress drag gesture, for the host to display.
    /// `None` when the active tool has nothing to preview.
    pub fn preview(&self, doc: &Document) -> Option<Overlay> {
        let w = doc.buffer.width();
        let h = doc.buffer.height();
        match &self.tool {
            Tool::Line { anchor: Some(start), cursor } => {
                // Render the pending segment into a transparent scratch buffer.
                // Like the committed line, the raw stroke color is written.
                let mut scratch =
                    crate::canvas::PixelBuffer::from_raw(vec![0u32; w as usize * h as usize], w, h)
                        .expect("scratch dimensions match the document");
                draw_line(&mut scratch, trunc(*start), trunc(*cursor), self.settings.stroke_color, self.settings.stroke_thickness);
                let mut pixels = scratch.pixels().to_vec();
                premultiply_in_place(&mut pixels);
                Some(pixels)
            }
            Tool::Ellipse { anchor: Some(start), cursor } => {
                rasterize_ellipse(*start, *cursor, &shape_style(&self.settings), w, h)
            }
            Tool::Callout { anchor: Some(start), cursor } => {
                rasterize_callout(*start, *cursor, &shape_style(&self.settings), w, h)
            }
            _ => None,
        }
    }

}

/// Text tool pointer-down: stamp the configured string at the click.
fn stamp_text(config: &TextConfig, settings: &ToolSettings, doc: &mut Document, pos: (f32, f32)) {
    let w = doc.buffer.width() as f32;
    let h = doc.buffer.height() as f32;
    if pos.0 < 0.0 || pos.1 < 0.0 || pos.0 > w || pos.1 > h {
        return;
    }
    if config.text.is_empty() {
        return;
    }

    let Some(font) = load_system_font(&config.font_family) else {
        log_warn!("text stamp skipped: font family '{}' not found", config.font_family);
        return;
    };

    let size = if config.font_size < 1.0 { DEFAULT_FONT_SIZE } else { config.font_size };
    if let Some(overlay) = rasterize_text(
        &font,
        &config.text,
        size,
        pos,
        settings.stroke_color,
        doc.buffer.width(),
        doc.buffer.height(),
    ) {
        composite_over(&mut doc.buffer, &overlay);
        doc.modified = true;
    }
}

/// Truncate fractional canvas coordinates to pixel indices.
#[inline]
fn trunc(pos: (f32, f32)) -> (i32, i32) {
    (pos.0 as i32, pos.1 as i32)
}

fn shape_style(settings: &ToolSettings) -> ShapeStyle {
    ShapeStyle {
        stroke_color: settings.stroke_color,
        stroke_thickness: settings.stroke_thickness,
        fill: settings.fill_enabled.then_some(settings.fill_color),
    }
}

/// Convert a non-premultiplied scratch raster into overlay (premultiplied)
/// form. Opaque and fully transparent pixels pass through unchanged.
fn premultiply_in_place(pixels: &mut [u32]) {
    for px in pixels.iter_mut() {
        let a = (*px >> 24) & 0xFF;
        if a == 0 || a == 255 {
            continue;
        }
        let r = ((*px >> 16) & 0xFF) * a / 255;
        let g = ((*px >> 8) & 0xFF) * a / 255;
        let b = (*px & 0xFF) * a / 255;
        *px = (a << 24) | (r << 16) | (g << 8) | b;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{pack_rgba, Document, WHITE};

    const BLACK_PX: u32 = 0xFF00_0000;

    fn doc(w: u32, h: u32) -> Document {
        Document::new(w, h).unwrap()
    }

    #[test]
    fn test_pen_strokes_on_move() {
        let mut d = doc(60, 60);
        let mut tc = ToolController::new();
        tc.settings.stroke_thickness = 1;

        tc.pointer_down(&mut d, (10.0, 30.0));
        tc.pointer_move(&mut d, (40.0, 30.0), true);
        tc.pointer_up(&mut d, (40.0, 30.0));

        for x in 10..=40 {
            assert_eq!(d.buffer.get(x, 30), Some(BLACK_PX));
        }
        assert!(d.modified);
        assert_eq!(tc.tool, Tool::pen());
    }

    #[test]
    fn test_pen_ignores_move_without_button() {
        let mut d = doc(30, 30);
        let mut tc = ToolController::new();
        tc.pointer_down(&mut d, (5.0, 5.0));
        tc.pointer_move(&mut d, (25.0, 5.0), false);
        assert_eq!(d.buffer.get(15, 5), Some(WHITE));
    }

    #[test]
    fn test_line_commits_only_on_release() {
        let mut d = doc(60, 60);
        let mut tc = ToolController::new();
        tc.settings.stroke_thickness = 1;
        tc.select(Tool::line());

        tc.pointer_down(&mut d, (5.0, 20.0));
        tc.pointer_move(&mut d, (50.0, 20.0), true);

        // Still previewing: buffer untouched, preview overlay available
        assert!(d.buffer.pixels().iter().all(|&p| p == WHITE));
        let preview = tc.preview(&d).expect("line preview while dragging");
        assert!(preview.iter().any(|&p| p != 0));

        tc.pointer_up(&mut d, (50.0, 20.0));
        for x in 5..=50 {
            assert_eq!(d.buffer.get(x, 20), Some(BLACK_PX));
        }
        assert!(tc.preview(&d).is_none());
    }

    #[test]
    fn test_ellipse_preview_does_not_touch_buffer() {
        let mut d = doc(80, 80);
        let mut tc = ToolController::new();
        tc.select(Tool::ellipse());
        tc.settings.fill_enabled = true;

        tc.pointer_down(&mut d, (10.0, 10.0));
        tc.pointer_move(&mut d, (70.0, 70.0), true);
        assert!(tc.preview(&d).is_some());
        assert!(d.buffer.pixels().iter().all(|&p| p == WHITE));

        tc.pointer_up(&mut d, (70.0, 70.0));
        assert_eq!(d.buffer.get(40, 40), Some(pack_rgba(tc.settings.fill_color)));
        assert!(d.modified);
    }

    #[test]
    fn test_degenerate_ellipse_commit_is_noop() {
        let mut d = doc(40, 40);
        let mut tc = ToolController::new();
        tc.select(Tool::ellipse());
        tc.pointer_down(&mut d, (20.0, 20.0));
        tc.pointer_up(&mut d, (20.0, 20.0));
        assert!(d.buffer.pixels().iter().all(|&p| p == WHITE));
        assert!(!d.modified);
    }

    #[test]
    fn test_eraser_paints_white_double_width() {
        let mut d = doc(40, 40);
        let mut tc = ToolController::new();
        tc.settings.stroke_thickness = 2;

        // Lay down some ink first
        tc.pointer_down(&mut d, (5.0, 20.0));
        tc.pointer_move(&mut d, (35.0, 20.0), true);
        tc.pointer_up(&mut d, (35.0, 20.0));
        assert_eq!(d.buffer.get(20, 20), Some(BLACK_PX));

        // Erase across it: nib is 2x the stroke thickness
        tc.select(Tool::eraser());
        tc.pointer_down(&mut d, (5.0, 20.0));
        tc.pointer_move(&mut d, (35.0, 20.0), true);
        tc.pointer_up(&mut d, (35.0, 20.0));
        for x in 5..=35 {
            assert_eq!(d.buffer.get(x, 20), Some(WHITE));
            assert_eq!(d.buffer.get(x, 19), Some(WHITE));
            assert_eq!(d.buffer.get(x, 21), Some(WHITE));
        }
    }

    #[test]
    fn test_eraser_click_dabs_without_move() {
        let mut d = doc(20, 20);
        let mut tc = ToolController::new();
        // Ink a single pixel, then click-erase it
        tc.settings.stroke_thickness = 1;
        tc.pointer_down(&mut d, (10.0, 10.0));
        tc.pointer_move(&mut d, (10.0, 10.0), true);
        tc.pointer_up(&mut d, (10.0, 10.0));

        tc.select(Tool::eraser());
        tc.pointer_down(&mut d, (10.0, 10.0));
        tc.pointer_up(&mut d, (10.0, 10.0));
        assert_eq!(d.buffer.get(10, 10), Some(WHITE));
    }

    #[test]
    fn test_fill_acts_on_pointer_down() {
        let mut d = doc(50, 50);
        let mut tc = ToolController::new();
        tc.select(Tool::Fill);
        tc.settings.fill_color = Rgba([255, 0, 0, 255]);

        tc.pointer_down(&mut d, (0.0, 0.0));
        assert!(d.buffer.pixels().iter().all(|&p| p == 0xFFFF_0000));
        assert!(d.modified);
    }

    #[test]
    fn test_fill_outside_canvas_is_noop() {
        let mut d = doc(10, 10);
        let mut tc = ToolController::new();
        tc.select(Tool::Fill);
        tc.pointer_down(&mut d, (-3.0, 4.0));
        tc.pointer_down(&mut d, (4.0, 12.0));
        assert!(d.buffer.pixels().iter().all(|&p| p == WHITE));
        assert!(!d.modified);
    }

    #[test]
    fn test_text_with_empty_string_is_noop() {
        let mut d = doc(30, 30);
        let mut tc = ToolController::new();
        tc.select(Tool::Text);
        tc.text.text.clear();
        tc.pointer_down(&mut d, (5.0, 5.0));
        assert!(d.buffer.pixels().iter().all(|&p| p == WHITE));
        assert!(!d.modified);
    }

    #[test]
    fn test_switching_tools_abandons_gesture() {
        let mut d = doc(40, 40);
        let mut tc = ToolController::new();
        tc.select(Tool::line());
        tc.pointer_down(&mut d, (5.0, 5.0));
        tc.select(Tool::pen());
        // Release with the new tool: the old anchor is gone, nothing commits
        tc.pointer_up(&mut d, (35.0, 35.0));
        assert!(d.buffer.pixels().iter().all(|&p| p == WHITE));
    }

    #[test]
    fn test_callout_commit_fills_body() {
        let mut d = doc(120, 120);
        let mut tc = ToolController::new();
        tc.select(Tool::callout());
        tc.settings.fill_enabled = true;

        tc.pointer_down(&mut d, (10.0, 10.0));
        tc.pointer_move(&mut d, (110.0, 110.0), true);
        tc.pointer_up(&mut d, (110.0, 110.0));
        assert_eq!(d.buffer.get(60, 40), Some(pack_rgba(tc.settings.fill_color)));
        assert!(d.modified);
    }
}

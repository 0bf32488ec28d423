//! Source-over compositing of a vector-rendered overlay onto the canvas.
//!
//! Overlays come out of the shape and text rasterizers as full-canvas packed
//! ARGB arrays with **premultiplied** alpha (the render-target convention the
//! rasterizers share). The destination buffer stores non-premultiplied pixels,
//! so each semi-transparent source pixel is unpremultiplied before the blend.

use crate::canvas::PixelBuffer;

/// Blend `src` over every pixel of `dst` in place.
///
/// `src` must be a full-extent overlay (`dst.width * dst.height` entries);
/// malformed overlays are a caller contract violation, not a handled error.
/// Pixels with zero source alpha leave the destination untouched, so the
/// transparent bulk of an overlay costs one branch per pixel.
pub fn composite_over(dst: &mut PixelBuffer, src: &[u32]) {
    debug_assert_eq!(src.len(), dst.pixels().len());

    for (d, &s) in dst.pixels_mut().iter_mut().zip(src.iter()) {
        let src_a = (s >> 24) & 0xFF;
        if src_a == 0 {
            continue;
        }

        let mut src_r = (s >> 16) & 0xFF;
        let mut src_g = (s >> 8) & 0xFF;
        let mut src_b = s & 0xFF;

        // Premultiplied source: recover straight channel values
        if src_a < 255 {
            src_r = src_r * 255 / src_a;
            src_g = src_g * 255 / src_a;
            src_b = src_b * 255 / src_a;
        }

        let dst_a = (*d >> 24) & 0xFF;
        let dst_r = (*d >> 16) & 0xFF;
        let dst_g = (*d >> 8) & 0xFF;
        let dst_b = *d & 0xFF;

        let out_a = src_a + dst_a * (255 - src_a) / 255;
        let (out_r, out_g, out_b) = if out_a > 0 {
            (
                (src_r * src_a + dst_r * dst_a * (255 - src_a) / 255) / out_a,
                (src_g * src_a + dst_g * dst_a * (255 - src_a) / 255) / out_a,
                (src_b * src_a + dst_b * dst_a * (255 - src_a) / 255) / out_a,
            )
        } else {
            (0, 0, 0)
        };

        *d = (out_a << 24) | (out_r << 16) | (out_g << 8) | out_b;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{pack_rgba, unpack_rgba, PixelBuffer, WHITE};
    use image::Rgba;

    fn white_canvas(w: u32, h: u32) -> PixelBuffer {
        PixelBuffer::new(w, h).unwrap()
    }

    #[test]
    fn test_fully_transparent_source_is_noop() {
        let mut buf = white_canvas(8, 8);
        let before = buf.pixels().to_vec();
        let overlay = vec![0u32; 64];
        composite_over(&mut buf, &overlay);
        assert_eq!(buf.pixels(), &before[..]);
    }

    #[test]
    fn test_fully_opaque_source_replaces_destination() {
        let mut buf = white_canvas(4, 4);
        let green = pack_rgba(Rgba([0, 255, 0, 255]));
        let overlay = vec![green; 16];
        composite_over(&mut buf, &overlay);
        assert!(buf.pixels().iter().all(|&p| p == green));
    }

    #[test]
    fn test_half_transparent_red_over_white() {
        // Premultiplied 50% red: a=128, r=255*128/255=128, g=b=0
        let mut buf = white_canvas(1, 1);
        let overlay = vec![(128u32 << 24) | (128 << 16)];
        composite_over(&mut buf, &overlay);

        let out = unpack_rgba(buf.pixels()[0]);
        assert_eq!(out[3], 255); // opaque dst stays opaque
        assert_eq!(out[0], 255); // red channel saturated (red over white)
        assert_eq!(out[1], 127); // green/blue pulled halfway down
        assert_eq!(out[2], 127);
    }

    #[test]
    fn test_blend_over_transparent_destination() {
        // Dst alpha 0: result takes the source color outright
        let mut buf = PixelBuffer::from_raw(vec![0u32; 1], 1, 1).unwrap();
        let opaque_blue = pack_rgba(Rgba([0, 0, 255, 255]));
        composite_over(&mut buf, &[opaque_blue]);
        assert_eq!(buf.pixels()[0], opaque_blue);
    }

    #[test]
    fn test_partial_overlay_leaves_rest_untouched() {
        let mut buf = white_canvas(3, 1);
        let black = pack_rgba(Rgba([0, 0, 0, 255]));
        let overlay = vec![0, black, 0];
        composite_over(&mut buf, &overlay);
        assert_eq!(buf.pixels(), &[WHITE, black, WHITE]);
    }
}

//! Bucket fill: 4-connected region growing from a seed pixel.
//!
//! The match test is exact packed-word equality against the seed's original
//! color. On anti-aliased imagery this can leave thin unfilled seams along
//! smooth edges; that is the intended behavior, not a tolerance bug.

use image::Rgba;

use crate::canvas::{pack_rgba, PixelBuffer};

/// Flood-fill the region containing `(sx, sy)` with `fill_color`.
///
/// Works on a snapshot of the pixel array and writes the finished result back
/// in one pass, so a fill is atomic as far as any observer of the buffer is
/// concerned. A seed outside the buffer, or a region already carrying the
/// fill color, is a no-op.
pub fn flood_fill(buf: &mut PixelBuffer, sx: i32, sy: i32, fill_color: Rgba<u8>) {
    let w = buf.width();
    let h = buf.height();
    if sx < 0 || sy < 0 || sx as u32 >= w || sy as u32 >= h {
        return;
    }

    let wu = w as usize;
    let replacement = pack_rgba(fill_color);

    // Working copy; rewritten pixels stop matching `target`, so the copy
    // doubles as the visited set.
    let mut work: Vec<u32> = buf.pixels().to_vec();
    let seed_idx = sy as usize * wu + sx as usize;
    let target = work[seed_idx];

    // Filling a region with its own color would re-match forever
    if target == replacement {
        return;
    }

    // DFS stack of packed flat indices (y * width + x); neighbors are
    // bounds-checked before pushing so every popped index is valid.
    let mut stack: Vec<u32> = Vec::with_capacity(4096);
    stack.push(seed_idx as u32);

    while let Some(idx) = stack.pop() {
        let idx = idx as usize;
        if work[idx] != target {
            continue;
        }
        work[idx] = replacement;

        let x = (idx % wu) as u32;
        let y = (idx / wu) as u32;
        if x > 0 {
            stack.push((idx - 1) as u32);
        }
        if x + 1 < w {
            stack.push((idx + 1) as u32);
        }
        if y > 0 {
            stack.push((idx - wu) as u32);
        }
        if y + 1 < h {
            stack.push((idx + wu) as u32);
        }
    }

    buf.pixels_mut().copy_from_slice(&work);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{PixelBuffer, WHITE};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const RED_PX: u32 = 0xFFFF_0000;
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    #[test]
    fn test_fills_whole_blank_canvas() {
        let mut buf = PixelBuffer::new(50, 50).unwrap();
        flood_fill(&mut buf, 0, 0, RED);
        assert!(buf.pixels().iter().all(|&p| p == RED_PX));
    }

    #[test]
    fn test_out_of_bounds_seed_is_noop() {
        let mut buf = PixelBuffer::new(10, 10).unwrap();
        flood_fill(&mut buf, -1, 5, RED);
        flood_fill(&mut buf, 5, -1, RED);
        flood_fill(&mut buf, 10, 5, RED);
        flood_fill(&mut buf, 5, 10, RED);
        assert!(buf.pixels().iter().all(|&p| p == WHITE));
    }

    #[test]
    fn test_same_color_fill_is_noop() {
        let mut buf = PixelBuffer::new(10, 10).unwrap();
        flood_fill(&mut buf, 3, 3, RED);
        let after_first = buf.pixels().to_vec();
        // Second fill with the identical color must change nothing
        flood_fill(&mut buf, 3, 3, RED);
        assert_eq!(buf.pixels(), &after_first[..]);
    }

    #[test]
    fn test_fill_stops_at_border() {
        // Vertical black wall splits the canvas; fill on the left side only
        let mut buf = PixelBuffer::new(9, 9).unwrap();
        for y in 0..9 {
            buf.set(4, y, 0xFF00_0000);
        }
        flood_fill(&mut buf, 1, 4, BLUE);

        for y in 0..9 {
            for x in 0..4 {
                assert_eq!(buf.get(x, y), Some(0xFF00_00FF));
            }
            assert_eq!(buf.get(4, y), Some(0xFF00_0000)); // wall survives
            for x in 5..9 {
                assert_eq!(buf.get(x, y), Some(WHITE)); // right side untouched
            }
        }
    }

    #[test]
    fn test_exact_match_only() {
        // A nearly-white pixel (one bit of difference) must not be filled
        let mut buf = PixelBuffer::new(5, 1).unwrap();
        buf.set(2, 0, 0xFFFF_FFFE);
        flood_fill(&mut buf, 0, 0, RED);
        assert_eq!(buf.get(0, 0), Some(RED_PX));
        assert_eq!(buf.get(1, 0), Some(RED_PX));
        assert_eq!(buf.get(2, 0), Some(0xFFFF_FFFE));
        // Pixels beyond the mismatch are unreachable through it
        assert_eq!(buf.get(3, 0), Some(WHITE));
        assert_eq!(buf.get(4, 0), Some(WHITE));
    }

    #[test]
    fn test_diagonal_is_not_connected() {
        // 2x2 checkerboard: 4-connectivity must not leak across the diagonal
        let mut buf = PixelBuffer::new(2, 2).unwrap();
        buf.set(0, 0, 0xFF00_0000);
        buf.set(1, 1, 0xFF00_0000);
        flood_fill(&mut buf, 0, 0, RED);
        assert_eq!(buf.get(0, 0), Some(RED_PX));
        assert_eq!(buf.get(1, 1), Some(0xFF00_0000));
    }
}

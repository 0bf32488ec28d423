use std::path::PathBuf;

use image::{Rgba, RgbaImage};

// ============================================================================
// PACKED PIXEL FORMAT
// ============================================================================
//
// Every pixel is one u32 word packing the channels as (A<<24)|(R<<16)|(G<<8)|B,
// i.e. B,G,R,A byte order in memory on little-endian targets. This matches the
// Bgra32 layout common image codecs round-trip to, so load/export is a channel
// shuffle and nothing more. Pixels are stored non-premultiplied at rest; only
// overlay rasters (see `ops`) carry premultiplied values.

/// Opaque white in the packed format, the blank-canvas color.
pub const WHITE: u32 = 0xFFFF_FFFF;

/// Pack an RGBA color into a pixel word.
#[inline]
pub fn pack_rgba(color: Rgba<u8>) -> u32 {
    ((color[3] as u32) << 24) | ((color[0] as u32) << 16) | ((color[1] as u32) << 8) | color[2] as u32
}

/// Unpack a pixel word back into an RGBA color.
#[inline]
pub fn unpack_rgba(px: u32) -> Rgba<u8> {
    Rgba([
        ((px >> 16) & 0xFF) as u8,
        ((px >> 8) & 0xFF) as u8,
        (px & 0xFF) as u8,
        ((px >> 24) & 0xFF) as u8,
    ])
}

// ============================================================================
// ERRORS
// ============================================================================

/// Errors raised by buffer construction. Out-of-range pixel access is never
/// an error: gestures routinely stray off-canvas, so reads and writes outside
/// the buffer are silently clipped instead.
#[derive(Debug, PartialEq, Eq)]
pub enum CanvasError {
    /// Width or height was zero on create/resize.
    InvalidDimension { width: u32, height: u32 },
    /// Supplied pixel array length disagrees with width*height on load.
    SizeMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for CanvasError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CanvasError::InvalidDimension { width, height } => {
                write!(f, "invalid canvas dimensions {}x{}", width, height)
            }
            CanvasError::SizeMismatch { expected, actual } => {
                write!(f, "pixel array length {} does not match declared size {}", actual, expected)
            }
        }
    }
}

impl std::error::Error for CanvasError {}

// ============================================================================
// PIXEL BUFFER
// ============================================================================

/// The mutable raster backing one open document.
///
/// A flat `Vec<u32>` of packed pixels with `pixels.len() == width * height`.
/// All coordinate access is bounds-checked; the `&mut self` receiver on every
/// mutating pass is the scoped exclusive acquisition of the backing store
/// (nothing else can interleave a mutation mid-pass).
#[derive(Clone)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl PixelBuffer {
    /// Create a blank canvas filled with opaque white.
    ///
    /// The buffer accepts any positive size; callers that take sizes from
    /// users are expected to bound them (the CLI caps at 4000 per edge).
    pub fn new(width: u32, height: u32) -> Result<Self, CanvasError> {
        if width == 0 || height == 0 {
            return Err(CanvasError::InvalidDimension { width, height });
        }
        Ok(Self {
            width,
            height,
            pixels: vec![WHITE; (width as usize) * (height as usize)],
        })
    }

    /// Adopt an already-decoded pixel array in the packed format.
    pub fn from_raw(pixels: Vec<u32>, width: u32, height: u32) -> Result<Self, CanvasError> {
        if width == 0 || height == 0 {
            return Err(CanvasError::InvalidDimension { width, height });
        }
        let expected = (width as usize) * (height as usize);
        if pixels.len() != expected {
            return Err(CanvasError::SizeMismatch { expected, actual: pixels.len() });
        }
        Ok(Self { width, height, pixels })
    }

    /// Import from an RGBA interchange image (decoded file content).
    pub fn from_rgba_image(src: &RgbaImage) -> Result<Self, CanvasError> {
        let (w, h) = src.dimensions();
        let pixels = src.pixels().map(|p| pack_rgba(*p)).collect();
        Self::from_raw(pixels, w, h)
    }

    /// Flatten to an RGBA interchange image for encoding.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut out = RgbaImage::new(self.width, self.height);
        for (px, out_px) in self.pixels.iter().zip(out.pixels_mut()) {
            *out_px = unpack_rgba(*px);
        }
        out
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The full packed pixel array, row-major.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// Read one pixel. `None` outside `[0,width) x [0,height)`.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<u32> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(self.pixels[y as usize * self.width as usize + x as usize])
    }

    /// Write one pixel. Silently ignored outside the buffer.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, px: u32) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        self.pixels[y as usize * self.width as usize + x as usize] = px;
    }

    /// Build the replacement buffer for a canvas resize: opaque white at the
    /// new size, with the overlapping `min(w,w') x min(h,h')` rectangle copied
    /// from this buffer's top-left, pixel for pixel, no scaling.
    pub fn resized(&self, new_width: u32, new_height: u32) -> Result<Self, CanvasError> {
        let mut out = Self::new(new_width, new_height)?;
        let copy_w = self.width.min(new_width) as usize;
        let copy_h = self.height.min(new_height) as usize;
        for y in 0..copy_h {
            let src_start = y * self.width as usize;
            let dst_start = y * new_width as usize;
            out.pixels[dst_start..dst_start + copy_w]
                .copy_from_slice(&self.pixels[src_start..src_start + copy_w]);
        }
        Ok(out)
    }
}

// ============================================================================
// DOCUMENT
// ============================================================================

/// One open document: exactly one live `PixelBuffer`, plus the file path and
/// unsaved-changes flag the host shows in its title bar.
pub struct Document {
    pub buffer: PixelBuffer,
    pub file_path: Option<PathBuf>,
    pub modified: bool,
}

impl Document {
    /// New blank document (opaque white canvas, no backing file).
    pub fn new(width: u32, height: u32) -> Result<Self, CanvasError> {
        Ok(Self {
            buffer: PixelBuffer::new(width, height)?,
            file_path: None,
            modified: false,
        })
    }

    /// Document wrapping an already-loaded buffer.
    pub fn from_buffer(buffer: PixelBuffer, file_path: Option<PathBuf>) -> Self {
        Self { buffer, file_path, modified: false }
    }

    /// Replace the buffer with a resized copy (content kept top-left aligned).
    pub fn resize(&mut self, new_width: u32, new_height: u32) -> Result<(), CanvasError> {
        self.buffer = self.buffer.resized(new_width, new_height)?;
        self.modified = true;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_opaque_white() {
        let buf = PixelBuffer::new(4, 3).unwrap();
        assert_eq!(buf.pixels().len(), 12);
        assert!(buf.pixels().iter().all(|&p| p == WHITE));
    }

    #[test]
    fn test_new_rejects_zero_dimension() {
        assert_eq!(
            PixelBuffer::new(0, 5).err(),
            Some(CanvasError::InvalidDimension { width: 0, height: 5 })
        );
        assert_eq!(
            PixelBuffer::new(5, 0).err(),
            Some(CanvasError::InvalidDimension { width: 5, height: 0 })
        );
    }

    #[test]
    fn test_from_raw_length_mismatch() {
        let err = PixelBuffer::from_raw(vec![0u32; 11], 4, 3).err();
        assert_eq!(err, Some(CanvasError::SizeMismatch { expected: 12, actual: 11 }));
    }

    #[test]
    fn test_get_set_bounds_clipping() {
        let mut buf = PixelBuffer::new(2, 2).unwrap();
        buf.set(-1, 0, 0);
        buf.set(0, -1, 0);
        buf.set(2, 0, 0);
        buf.set(0, 2, 0);
        assert!(buf.pixels().iter().all(|&p| p == WHITE));
        assert_eq!(buf.get(-1, 0), None);
        assert_eq!(buf.get(2, 2), None);

        buf.set(1, 1, 0xFF00_0000);
        assert_eq!(buf.get(1, 1), Some(0xFF00_0000));
    }

    #[test]
    fn test_resized_preserves_overlap_and_fills_white() {
        let mut buf = PixelBuffer::new(3, 3).unwrap();
        for y in 0..3 {
            for x in 0..3 {
                buf.set(x, y, 0xFF00_0000 | (y as u32 * 3 + x as u32));
            }
        }

        // Grow: overlap identical, newly exposed area white
        let grown = buf.resized(5, 4).unwrap();
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(grown.get(x, y), buf.get(x, y));
            }
        }
        assert_eq!(grown.get(4, 0), Some(WHITE));
        assert_eq!(grown.get(0, 3), Some(WHITE));

        // Shrink: remaining region identical
        let shrunk = buf.resized(2, 2).unwrap();
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(shrunk.get(x, y), buf.get(x, y));
            }
        }
    }

    #[test]
    fn test_pack_unpack_round_trip() {
        let c = Rgba([12, 200, 7, 130]);
        assert_eq!(unpack_rgba(pack_rgba(c)), c);
        assert_eq!(pack_rgba(Rgba([255, 255, 255, 255])), WHITE);
        // Channel placement: red lands in bits 16..24
        assert_eq!(pack_rgba(Rgba([255, 0, 0, 255])), 0xFFFF_0000);
    }

    #[test]
    fn test_rgba_image_round_trip() {
        let mut buf = PixelBuffer::new(3, 2).unwrap();
        buf.set(2, 1, pack_rgba(Rgba([10, 20, 30, 40])));
        let img = buf.to_rgba_image();
        assert_eq!(*img.get_pixel(2, 1), Rgba([10, 20, 30, 40]));
        let back = PixelBuffer::from_rgba_image(&img).unwrap();
        assert_eq!(back.pixels(), buf.pixels());
    }

    #[test]
    fn test_document_resize_marks_modified() {
        let mut doc = Document::new(4, 4).unwrap();
        assert!(!doc.modified);
        doc.resize(2, 6).unwrap();
        assert!(doc.modified);
        assert_eq!(doc.buffer.width(), 2);
        assert_eq!(doc.buffer.height(), 6);
    }
}

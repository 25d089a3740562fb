//! Glyph atlas input to the encoder: per glyph metrics and a sampler for the atlas image.

use alloc::vec::Vec;

/// Where a glyph sits in the atlas and how it is placed when drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlyphMetrics {
    pub code: u32,
    /// x of the glyph's top left corner in the atlas
    pub x: u32,
    /// y of the glyph's top left corner in the atlas
    pub y: u32,
    pub width: u8,
    pub height: u8,
    pub x_offset: u8,
    pub y_offset: u8,
    pub advance: u8,
}

impl GlyphMetrics {
    /// Whether the glyph's bitmap rectangle lies inside an atlas of the given size.
    pub fn fits_in(&self, atlas_width: u32, atlas_height: u32) -> bool {
        let right = self.x as u64 + self.width as u64;
        let bottom = self.y as u64 + self.height as u64;
        right <= atlas_width as u64 && bottom <= atlas_height as u64
    }
}

/// Reduce an 8 bit per channel pixel to a 3 bit intensity (`0..=7`).
pub fn intensity_from_rgb(r: u8, g: u8, b: u8) -> u8 {
    (((r as u16 + g as u16 + b as u16) / 3) >> 5) as u8
}

/// Image the glyph bitmaps are cut from.
pub trait Atlas {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Intensity in `0..=7` at `(x, y)`. Only called with in bounds coordinates.
    fn intensity(&self, x: u32, y: u32) -> u8;
}

/// An atlas stored as one intensity per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntensityAtlas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl IntensityAtlas {
    /// Returns `None` when `pixels` doesn't hold exactly `width * height` samples.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() as u64 != width as u64 * height as u64 {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels: pixels.into_iter().map(|level| level & 0x07).collect(),
        })
    }

    /// Build from packed 8 bit RGB triples.
    pub fn from_rgb8(width: u32, height: u32, rgb: &[u8]) -> Option<Self> {
        let pixels = rgb
            .chunks_exact(3)
            .map(|px| intensity_from_rgb(px[0], px[1], px[2]))
            .collect();
        Self::new(width, height, pixels)
    }

    /// Build from rows of intensities. Every row must have the same length.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Option<Self> {
        let width = rows.first().map(|row| row.as_ref().len()).unwrap_or(0);
        if rows.iter().any(|row| row.as_ref().len() != width) {
            return None;
        }
        let pixels = rows
            .iter()
            .flat_map(|row| row.as_ref().iter().copied())
            .collect();
        Self::new(width as u32, rows.len() as u32, pixels)
    }
}

impl Atlas for IntensityAtlas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn intensity(&self, x: u32, y: u32) -> u8 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rgb_average_is_truncated_to_three_bits() {
        assert_eq!(intensity_from_rgb(0, 0, 0), 0);
        assert_eq!(intensity_from_rgb(255, 255, 255), 7);
        assert_eq!(intensity_from_rgb(31, 31, 31), 0);
        assert_eq!(intensity_from_rgb(32, 32, 32), 1);
        // (255 + 0 + 0) / 3 = 85 -> 2
        assert_eq!(intensity_from_rgb(255, 0, 0), 2);
    }

    #[test]
    fn atlas_size_must_match_pixels() {
        assert!(IntensityAtlas::new(2, 2, vec![0; 3]).is_none());
        assert!(IntensityAtlas::from_rows(&[vec![0u8, 1], vec![2]]).is_none());
        let atlas = IntensityAtlas::from_rows(&[[0u8, 1], [2, 3]]).unwrap();
        assert_eq!((atlas.width(), atlas.height()), (2, 2));
        assert_eq!(atlas.intensity(1, 1), 3);
    }

    #[test]
    fn glyph_bounds() {
        let glyph = GlyphMetrics {
            x: 6,
            y: 2,
            width: 4,
            height: 8,
            ..Default::default()
        };
        assert!(glyph.fits_in(10, 10));
        assert!(!glyph.fits_in(9, 10));
        assert!(!glyph.fits_in(10, 9));
    }
}

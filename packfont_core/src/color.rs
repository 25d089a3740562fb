//! 16-bit 5/6/5 colors (red in the most significant bits) and the 8 level blend ramp used to
//! draw anti-aliased glyph edges.

/// Number of intensity levels a packed glyph pixel can take.
pub const LEVELS: usize = 8;

/// 8 bit per channel view of a 5/6/5 color. The low bits that don't survive packing are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnpackedColor {
    pub r: u16,
    pub g: u16,
    pub b: u16,
}

impl UnpackedColor {
    pub fn unpack(color: u16) -> Self {
        Self {
            r: (color >> 8) & 0xF8,
            g: (color >> 3) & 0xFC,
            b: (color << 3) & 0xF8,
        }
    }

    pub fn pack(self) -> u16 {
        ((self.r & 0xF8) << 8) | ((self.g & 0xFC) << 3) | ((self.b & 0xF8) >> 3)
    }

    /// Channel-wise blend `self*(7-level)/7 + other*level/7`. Each term is truncated on its own.
    fn blend(self, other: Self, level: u16) -> Self {
        let max = (LEVELS - 1) as u16;
        let mix = |bg: u16, fg: u16| (bg * (max - level)) / max + (fg * level) / max;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }
}

/// Pre-blended colors for every intensity level. Index 0 is the background and index 7 the
/// foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorRamp {
    colors: [u16; LEVELS],
}

impl ColorRamp {
    pub fn new(background: u16, foreground: u16) -> Self {
        let bg = UnpackedColor::unpack(background);
        let fg = UnpackedColor::unpack(foreground);
        let mut colors = [0u16; LEVELS];
        for (level, color) in colors.iter_mut().enumerate() {
            *color = bg.blend(fg, level as u16).pack();
        }
        Self { colors }
    }

    pub fn background(&self) -> u16 {
        self.colors[0]
    }

    /// Color for an intensity level. Only the low three bits of `level` are used.
    pub fn get(&self, level: u8) -> u16 {
        self.colors[(level & 0x07) as usize]
    }

    pub fn colors(&self) -> &[u16; LEVELS] {
        &self.colors
    }
}

#[cfg(feature = "embedded-graphics")]
mod rgb565 {
    use super::UnpackedColor;
    use embedded_graphics::pixelcolor::{raw::RawU16, IntoStorage, Rgb565};

    impl From<UnpackedColor> for Rgb565 {
        fn from(color: UnpackedColor) -> Self {
            Rgb565::from(RawU16::new(color.pack()))
        }
    }

    impl From<Rgb565> for UnpackedColor {
        fn from(color: Rgb565) -> Self {
            UnpackedColor::unpack(color.into_storage())
        }
    }
}

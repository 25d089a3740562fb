use crate::{
    atlas::{Atlas, GlyphMetrics},
    symbol::SymbolDesc,
    token::{NibbleWriter, Token, MAX_RUN},
};
use alloc::vec::Vec;

/// Output of [`encode`]: the shared blob and the descriptors pointing into it, sorted by code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFont {
    pub blob: Vec<u8>,
    pub symbols: Vec<SymbolDesc>,
}

impl EncodedFont {
    pub fn total_bytes(&self) -> usize {
        self.blob.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    EmptyGlyphSet,
    DuplicateCode {
        code: u32,
    },
    GlyphOutOfBounds {
        code: u32,
        atlas_width: u32,
        atlas_height: u32,
    },
    /// The blob grew past what a `u32` descriptor offset can address.
    BlobTooLarge,
}

impl core::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EncodeError::EmptyGlyphSet => write!(f, "there are no glyphs to encode"),
            EncodeError::DuplicateCode { code } => {
                write!(f, "code {code} is defined by more than one glyph")
            }
            EncodeError::GlyphOutOfBounds {
                code,
                atlas_width,
                atlas_height,
            } => write!(
                f,
                "glyph {code} extends outside the {atlas_width}x{atlas_height} atlas"
            ),
            EncodeError::BlobTooLarge => write!(f, "packed data exceeds 4GiB"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EncodeError {}

/// Run-length state while emitting one glyph.
struct GlyphEncoder<'w> {
    writer: &'w mut NibbleWriter,
    run_color: Option<u8>,
    run_count: u8,
}

impl<'w> GlyphEncoder<'w> {
    fn new(writer: &'w mut NibbleWriter) -> Self {
        Self {
            writer,
            run_color: None,
            run_count: 0,
        }
    }

    fn push_pixel(&mut self, level: u8) {
        if self.run_color != Some(level) {
            self.flush_run();
            self.writer.push(Token::Literal(level));
            self.run_color = Some(level);
        } else {
            self.run_count += 1;
            if self.run_count == MAX_RUN {
                self.flush_run();
            }
        }
    }

    fn flush_run(&mut self) {
        if self.run_count > 0 {
            self.writer.push(Token::Repeat(self.run_count));
            self.run_count = 0;
        }
    }

    fn finish(mut self) {
        self.flush_run();
    }
}

/// Pack every glyph's bitmap into one nibble stream.
///
/// Glyphs are written in ascending code order with no padding between them so a glyph may start
/// in the low half of a byte. Nothing is returned unless every glyph encodes.
pub fn encode<A: Atlas>(glyphs: &[GlyphMetrics], atlas: &A) -> Result<EncodedFont, EncodeError> {
    if glyphs.is_empty() {
        return Err(EncodeError::EmptyGlyphSet);
    }

    let mut sorted: Vec<&GlyphMetrics> = glyphs.iter().collect();
    sorted.sort_by_key(|glyph| glyph.code);
    if let Some(pair) = sorted.windows(2).find(|pair| pair[0].code == pair[1].code) {
        return Err(EncodeError::DuplicateCode { code: pair[0].code });
    }

    let (atlas_width, atlas_height) = (atlas.width(), atlas.height());
    if let Some(glyph) = sorted
        .iter()
        .find(|glyph| !glyph.fits_in(atlas_width, atlas_height))
    {
        return Err(EncodeError::GlyphOutOfBounds {
            code: glyph.code,
            atlas_width,
            atlas_height,
        });
    }

    let mut writer = NibbleWriter::new();
    let mut symbols = Vec::with_capacity(sorted.len());

    for glyph in sorted {
        let (offset, nibble) = writer.position();
        let offset = u32::try_from(offset).map_err(|_| EncodeError::BlobTooLarge)?;
        symbols.push(SymbolDesc {
            code: glyph.code,
            offset,
            nibble,
            width: glyph.width,
            height: glyph.height,
            x_offset: glyph.x_offset,
            y_offset: glyph.y_offset,
            x_advance: glyph.advance,
        });

        let mut glyph_encoder = GlyphEncoder::new(&mut writer);
        for y in glyph.y..glyph.y + glyph.height as u32 {
            for x in glyph.x..glyph.x + glyph.width as u32 {
                glyph_encoder.push_pixel(atlas.intensity(x, y) & 0x07);
            }
        }
        glyph_encoder.finish();
    }

    #[cfg(feature = "tracing")]
    tracing::event!(
        tracing::Level::DEBUG,
        glyphs = symbols.len(),
        tokens = writer.token_count(),
        "encoded glyphs"
    );

    Ok(EncodedFont {
        blob: writer.into_bytes(),
        symbols,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{atlas::IntensityAtlas, token::NibbleParity};
    use alloc::vec::Vec;

    fn single_row(levels: &[u8]) -> EncodedFont {
        let atlas = IntensityAtlas::from_rows(&[levels]).unwrap();
        let glyph = GlyphMetrics {
            code: 65,
            width: levels.len() as u8,
            height: 1,
            advance: levels.len() as u8,
            ..Default::default()
        };
        encode(&[glyph], &atlas).unwrap()
    }

    fn nibbles(blob: &[u8]) -> Vec<u8> {
        blob.iter().flat_map(|byte| [byte >> 4, byte & 0x0F]).collect()
    }

    #[test]
    fn single_pixel_is_one_literal() {
        let font = single_row(&[5]);
        assert_eq!(font.blob, vec![0x50]);
    }

    #[test]
    fn run_lengths_around_the_cap() {
        // literal followed by 7 repeats
        assert_eq!(nibbles(&single_row(&[3; 8]).blob), vec![0x3, 0xE]);
        // literal followed by 8 repeats fills one repeat token exactly
        assert_eq!(nibbles(&single_row(&[3; 9]).blob), vec![0x3, 0xF]);
        // 9 repeats spill into a second repeat token
        assert_eq!(
            nibbles(&single_row(&[3; 10]).blob),
            vec![0x3, 0xF, 0x8, 0x0]
        );
    }

    #[test]
    fn color_change_after_full_run() {
        let mut levels = [3u8; 10];
        levels[9] = 6;
        assert_eq!(nibbles(&single_row(&levels).blob), vec![0x3, 0xF, 0x6, 0x0]);
    }

    #[test]
    fn literal_only_when_every_pixel_changes() {
        assert_eq!(single_row(&[0, 1, 2, 3]).blob, vec![0x01, 0x23]);
    }

    #[test]
    fn glyphs_share_bytes_and_are_sorted() {
        let atlas = IntensityAtlas::from_rows(&[[1u8, 2, 3, 4]]).unwrap();
        let b = GlyphMetrics {
            code: 66,
            x: 1,
            width: 3,
            height: 1,
            ..Default::default()
        };
        let a = GlyphMetrics {
            code: 65,
            width: 1,
            height: 1,
            ..Default::default()
        };
        let font = encode(&[b, a], &atlas).unwrap();
        assert_eq!(font.blob, vec![0x12, 0x34]);
        assert_eq!(font.total_bytes(), 2);
        assert_eq!(font.symbols[0].code, 65);
        assert_eq!(
            (font.symbols[0].offset, font.symbols[0].nibble),
            (0, NibbleParity::High)
        );
        assert_eq!(font.symbols[1].code, 66);
        assert_eq!(
            (font.symbols[1].offset, font.symbols[1].nibble),
            (0, NibbleParity::Low)
        );
    }

    #[test]
    fn metrics_are_copied() {
        let atlas = IntensityAtlas::from_rows(&[[0u8; 4]; 4]).unwrap();
        let glyph = GlyphMetrics {
            code: 0x263A,
            x: 1,
            y: 1,
            width: 2,
            height: 3,
            x_offset: 4,
            y_offset: 5,
            advance: 6,
        };
        let symbol = encode(&[glyph], &atlas).unwrap().symbols[0];
        assert_eq!(symbol.code, 0x263A);
        assert_eq!(
            (
                symbol.width,
                symbol.height,
                symbol.x_offset,
                symbol.y_offset,
                symbol.x_advance
            ),
            (2, 3, 4, 5, 6)
        );
    }

    #[test]
    fn rejects_bad_input() {
        let atlas = IntensityAtlas::from_rows(&[[0u8; 4]; 4]).unwrap();
        assert_eq!(encode(&[], &atlas), Err(EncodeError::EmptyGlyphSet));

        let glyph = GlyphMetrics {
            code: 7,
            width: 2,
            height: 2,
            ..Default::default()
        };
        assert_eq!(
            encode(&[glyph, glyph], &atlas),
            Err(EncodeError::DuplicateCode { code: 7 })
        );

        let outside = GlyphMetrics {
            code: 8,
            x: 3,
            width: 2,
            height: 1,
            ..Default::default()
        };
        assert_eq!(
            encode(&[glyph, outside], &atlas),
            Err(EncodeError::GlyphOutOfBounds {
                code: 8,
                atlas_width: 4,
                atlas_height: 4
            })
        );
    }
}

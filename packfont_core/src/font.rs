use crate::{
    encode::EncodedFont,
    symbol::{check_table, find_symbol_index, SymbolDesc, TableError},
};
use alloc::vec::Vec;
use bincode::{Decode, Encode};

/// A packed font ready for rendering.
///
/// Generated font modules define these as `static`s so the fields are public. Call
/// [`PackedFont::validate`] before trusting a font that came from elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedFont<'a> {
    /// Token streams of every glyph, back to back
    pub bmp: &'a [u8],
    /// Vertical advance of a full text line
    pub row_height: u16,
    /// Symbol drawn for codes that aren't in the table
    pub default_index: u16,
    /// Sorted by code
    pub symbols: &'a [SymbolDesc],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontError {
    Table(TableError),
    DefaultIndexOutOfRange { index: usize, symbols: usize },
    ZeroRowHeight,
    /// A symbol's stream starts past the end of the blob.
    OffsetOutOfRange { code: u32, offset: u32 },
}

impl core::fmt::Display for FontError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FontError::Table(error) => write!(f, "{error}"),
            FontError::DefaultIndexOutOfRange { index, symbols } => write!(
                f,
                "default symbol index {index} is outside the table of {symbols} symbols"
            ),
            FontError::ZeroRowHeight => write!(f, "row height must be at least one pixel"),
            FontError::OffsetOutOfRange { code, offset } => {
                write!(f, "symbol {code} starts at {offset} which is past the data")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FontError {}

impl From<TableError> for FontError {
    fn from(error: TableError) -> Self {
        FontError::Table(error)
    }
}

impl<'a> PackedFont<'a> {
    pub fn new(
        bmp: &'a [u8],
        symbols: &'a [SymbolDesc],
        row_height: u16,
        default_index: u16,
    ) -> Result<Self, FontError> {
        let font = Self {
            bmp,
            row_height,
            default_index,
            symbols,
        };
        font.validate()?;
        Ok(font)
    }

    pub fn validate(&self) -> Result<(), FontError> {
        check_table(self.symbols)?;
        if self.default_index as usize >= self.symbols.len() {
            return Err(FontError::DefaultIndexOutOfRange {
                index: self.default_index as usize,
                symbols: self.symbols.len(),
            });
        }
        if self.row_height == 0 {
            return Err(FontError::ZeroRowHeight);
        }
        if let Some(symbol) = self
            .symbols
            .iter()
            .find(|symbol| symbol.pixel_count() > 0 && symbol.offset as usize >= self.bmp.len())
        {
            return Err(FontError::OffsetOutOfRange {
                code: symbol.code,
                offset: symbol.offset,
            });
        }
        Ok(())
    }

    pub fn symbols_count(&self) -> usize {
        self.symbols.len()
    }

    /// Index of the symbol for `code`, or the default index when the font doesn't have it.
    pub fn find_symbol_index(&self, code: u32) -> usize {
        find_symbol_index(self.symbols, code, self.default_index as usize)
    }

    /// The symbol drawn for `code`.
    ///
    /// # Panics
    ///
    /// If the font hasn't been validated and the default index is out of range.
    pub fn symbol(&self, code: u32) -> &'a SymbolDesc {
        &self.symbols[self.find_symbol_index(code)]
    }

    pub fn default_symbol(&self) -> &'a SymbolDesc {
        &self.symbols[self.default_index as usize]
    }

    pub fn contains(&self, code: u32) -> bool {
        self.symbols
            .binary_search_by_key(&code, |symbol| symbol.code)
            .is_ok()
    }

    /// Widest row any symbol produces. A row buffer this long fits every glyph.
    pub fn max_symbol_width(&self) -> usize {
        self.symbols
            .iter()
            .map(SymbolDesc::columns)
            .max()
            .unwrap_or(0)
    }

    /// Width in pixels of `text` drawn on one line.
    pub fn measure(&self, text: &str) -> usize {
        text.chars()
            .map(|c| self.symbol(c as u32).columns())
            .sum()
    }
}

/// A packed font that owns its data, e.g. after loading a binary font file.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, serde::Serialize, serde::Deserialize)]
pub struct OwnedFont {
    pub bmp: Vec<u8>,
    pub row_height: u16,
    pub default_index: u16,
    pub symbols: Vec<SymbolDesc>,
}

impl OwnedFont {
    pub fn from_encoded(
        encoded: EncodedFont,
        row_height: u16,
        default_index: u16,
    ) -> Result<Self, FontError> {
        let font = Self {
            bmp: encoded.blob,
            row_height,
            default_index,
            symbols: encoded.symbols,
        };
        font.as_font().validate()?;
        Ok(font)
    }

    /// Borrow as a [`PackedFont`]. This doesn't validate.
    pub fn as_font(&self) -> PackedFont<'_> {
        PackedFont {
            bmp: &self.bmp,
            row_height: self.row_height,
            default_index: self.default_index,
            symbols: &self.symbols,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::error::EncodeError> {
        bincode::encode_to_vec(self, bincode::config::standard())
    }

    /// Load a font written by [`OwnedFont::to_bytes`] and validate it.
    pub fn from_bytes(data: &[u8]) -> Result<Self, LoadError> {
        let (font, _) = bincode::decode_from_slice::<OwnedFont, _>(data, bincode::config::standard())
            .map_err(LoadError::Decode)?;
        font.as_font().validate().map_err(LoadError::Font)?;
        Ok(font)
    }
}

#[derive(Debug)]
pub enum LoadError {
    Decode(bincode::error::DecodeError),
    Font(FontError),
}

impl core::fmt::Display for LoadError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LoadError::Decode(error) => write!(f, "couldn't decode font data: {error}"),
            LoadError::Font(error) => write!(f, "invalid font: {error}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LoadError {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::token::NibbleParity;

    const SYMBOLS: [SymbolDesc; 2] = [
        SymbolDesc {
            code: 63,
            offset: 0,
            nibble: NibbleParity::High,
            width: 1,
            height: 1,
            x_offset: 0,
            y_offset: 0,
            x_advance: 3,
        },
        SymbolDesc {
            code: 65,
            offset: 0,
            nibble: NibbleParity::Low,
            width: 4,
            height: 1,
            x_offset: 1,
            y_offset: 0,
            x_advance: 4,
        },
    ];

    #[test]
    fn validation() {
        let bmp = [0x70, 0x10];
        assert!(PackedFont::new(&bmp, &SYMBOLS, 4, 0).is_ok());
        assert_eq!(
            PackedFont::new(&bmp, &SYMBOLS, 4, 2),
            Err(FontError::DefaultIndexOutOfRange {
                index: 2,
                symbols: 2
            })
        );
        assert_eq!(
            PackedFont::new(&bmp, &SYMBOLS, 0, 0),
            Err(FontError::ZeroRowHeight)
        );
        assert_eq!(
            PackedFont::new(&bmp, &[], 4, 0),
            Err(FontError::Table(TableError::Empty))
        );
        assert_eq!(
            PackedFont::new(&[], &SYMBOLS, 4, 0),
            Err(FontError::OffsetOutOfRange {
                code: 63,
                offset: 0
            })
        );
    }

    #[test]
    fn lookup_and_measure() {
        let font = PackedFont::new(&[0x70, 0x10], &SYMBOLS, 4, 0).unwrap();
        assert_eq!(font.symbols_count(), 2);
        assert_eq!(font.symbol('A' as u32).code, 65);
        assert_eq!(font.symbol('Z' as u32).code, 63);
        assert!(font.contains(63));
        assert!(!font.contains(64));
        assert_eq!(font.max_symbol_width(), 5);
        // 'A' is 5 columns wide because its glyph overhangs the advance, 'x' falls back to '?'
        assert_eq!(font.measure("AxA"), 13);
    }

    #[test]
    fn binary_font_round_trip() {
        let font = OwnedFont {
            bmp: vec![0x70, 0x10],
            row_height: 4,
            default_index: 0,
            symbols: SYMBOLS.to_vec(),
        };
        let bytes = font.to_bytes().unwrap();
        assert_eq!(OwnedFont::from_bytes(&bytes).unwrap(), font);

        let broken = OwnedFont {
            default_index: 9,
            ..font
        };
        let bytes = broken.to_bytes().unwrap();
        assert!(matches!(
            OwnedFont::from_bytes(&bytes),
            Err(LoadError::Font(FontError::DefaultIndexOutOfRange { .. }))
        ));
    }
}

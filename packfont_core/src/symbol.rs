use crate::token::NibbleParity;
use bincode::{Decode, Encode};

/// A packed glyph: where its token stream starts in the font blob and how to place it.
///
/// Field order matches the order of the generated descriptor tables.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode, serde::Serialize, serde::Deserialize,
)]
pub struct SymbolDesc {
    pub code: u32,
    /// Byte offset of the first token in the font blob
    pub offset: u32,
    /// Half of the byte at `offset` holding the first token
    pub nibble: NibbleParity,
    pub width: u8,
    pub height: u8,
    pub x_offset: u8,
    pub y_offset: u8,
    /// Displayed width of the symbol
    pub x_advance: u8,
}

impl SymbolDesc {
    /// Number of pixels the token stream decodes to.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Column after the last glyph pixel.
    pub fn last_col(&self) -> usize {
        self.x_offset as usize + self.width as usize
    }

    /// Row after the last glyph pixel.
    pub fn last_row(&self) -> usize {
        self.y_offset as usize + self.height as usize
    }

    /// Pixels written per output row. Normally the advance but never narrower than the glyph
    /// itself.
    pub fn columns(&self) -> usize {
        (self.x_advance as usize).max(self.last_col())
    }
}

/// Binary search a table sorted by code. Codes that aren't present give `default_index`.
///
/// The table must not be empty and its codes must be unique; see [`check_table`].
pub fn find_symbol_index(symbols: &[SymbolDesc], code: u32, default_index: usize) -> usize {
    symbols
        .binary_search_by_key(&code, |symbol| symbol.code)
        .unwrap_or(default_index)
}

/// Problem with a symbol table as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    Empty,
    /// `codes[index]` is not strictly greater than the code before it.
    NotSorted { index: usize },
}

impl core::fmt::Display for TableError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TableError::Empty => write!(f, "symbol table is empty"),
            TableError::NotSorted { index } => write!(
                f,
                "symbol table is not strictly sorted by code at index {index}"
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TableError {}

/// Checks the table is non-empty and strictly ascending by code.
pub fn check_table(symbols: &[SymbolDesc]) -> Result<(), TableError> {
    if symbols.is_empty() {
        return Err(TableError::Empty);
    }
    match symbols
        .windows(2)
        .position(|pair| pair[0].code >= pair[1].code)
    {
        Some(index) => Err(TableError::NotSorted { index: index + 1 }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use alloc::vec::Vec;
    use proptest::{collection, prelude::*};

    fn table(codes: &[u32]) -> Vec<SymbolDesc> {
        codes
            .iter()
            .map(|&code| SymbolDesc {
                code,
                ..Default::default()
            })
            .collect()
    }

    fn check_every_code(codes: &[u32], default_index: usize) {
        let symbols = table(codes);
        check_table(&symbols).unwrap();
        for (index, &code) in codes.iter().enumerate() {
            assert_eq!(find_symbol_index(&symbols, code, default_index), index);
        }
    }

    #[test]
    fn lookup_small_tables() {
        check_every_code(&[65], 0);
        check_every_code(&[65, 66], 1);
        check_every_code(&[32, 63, 65], 1);
    }

    #[test]
    fn lookup_hundred_symbols() {
        let codes: Vec<u32> = (0..100).map(|i| 32 + i * 3).collect();
        check_every_code(&codes, 42);

        let symbols = table(&codes);
        assert_eq!(find_symbol_index(&symbols, 31, 42), 42);
        assert_eq!(find_symbol_index(&symbols, 0, 42), 42);
        assert_eq!(find_symbol_index(&symbols, 32 + 99 * 3 + 1, 42), 42);
        assert_eq!(find_symbol_index(&symbols, u32::MAX, 42), 42);
        for gap in [33, 34, 32 + 50 * 3 + 1, 32 + 98 * 3 + 2] {
            assert_eq!(find_symbol_index(&symbols, gap, 42), 42, "gap {gap}");
        }
        assert_eq!(find_symbol_index(&symbols, 32 + 50 * 3, 42), 50);
    }

    #[test]
    fn missing_codes_give_default() {
        for codes in [&[65][..], &[65, 70], &[65, 70, 80], &[10, 20, 30, 40, 50]] {
            let symbols = table(codes);
            let default_index = symbols.len() - 1;
            let below = codes[0] - 1;
            let above = codes[codes.len() - 1] + 1;
            assert_eq!(find_symbol_index(&symbols, below, default_index), default_index);
            assert_eq!(find_symbol_index(&symbols, above, default_index), default_index);
            if codes.len() > 1 {
                let gap = codes[0] + 1;
                assert_eq!(find_symbol_index(&symbols, gap, default_index), default_index);
            }
        }
    }

    #[test]
    fn table_checks() {
        assert_eq!(check_table(&[]), Err(TableError::Empty));
        assert_eq!(
            check_table(&table(&[1, 3, 2])),
            Err(TableError::NotSorted { index: 2 })
        );
        assert_eq!(
            check_table(&table(&[1, 1])),
            Err(TableError::NotSorted { index: 1 })
        );
    }

    #[test]
    fn columns_cover_glyph_and_advance() {
        let symbol = SymbolDesc {
            width: 5,
            x_offset: 2,
            x_advance: 6,
            ..Default::default()
        };
        assert_eq!(symbol.columns(), 7);
        assert_eq!(
            SymbolDesc {
                x_advance: 9,
                ..symbol
            }
            .columns(),
            9
        );
    }

    proptest! {
        #[test]
        fn lookup_matches_linear_scan(codes in collection::btree_set(any::<u32>(), 1..200), probe in any::<u32>()) {
            let codes: Vec<u32> = codes.into_iter().collect();
            let symbols = table(&codes);
            let expected = codes.iter().position(|&code| code == probe).unwrap_or(usize::MAX);
            prop_assert_eq!(find_symbol_index(&symbols, probe, usize::MAX), expected);
        }
    }
}

//! Row by row glyph rendering.
//!
//! A [`RenderSession`] walks one glyph's token stream and writes one row of 16-bit pixels per
//! call to [`RenderSession::next_row`], from the top of the text line to its bottom. Rows above
//! and below the glyph bitmap, and the columns left and right of it, are filled with the
//! background color. A repeat token that runs past the right edge of the bitmap carries over to
//! the start of the next bitmap row.

use crate::{
    color::ColorRamp,
    font::PackedFont,
    symbol::SymbolDesc,
    token::{NibbleReader, Token},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The token stream of `code` runs past the end of the font data.
    OutOfBounds { code: u32, offset: usize },
    /// The row buffer can't hold a full row of the symbol.
    DestinationTooSmall { needed: usize, got: usize },
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DecodeError::OutOfBounds { code, offset } => write!(
                f,
                "glyph {code} reads past the end of the font data at byte {offset}"
            ),
            DecodeError::DestinationTooSmall { needed, got } => write!(
                f,
                "row buffer holds {got} pixels but the symbol needs {needed}"
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}

/// Which part of the text line a row falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    AboveGlyph,
    InGlyph,
    BelowGlyph,
}

/// Rendering state for one glyph.
///
/// Sessions borrow the font and own everything else, so any number of them can render from the
/// same font at once.
#[derive(Debug, Clone)]
pub struct RenderSession<'a> {
    font: PackedFont<'a>,
    symbol: &'a SymbolDesc,
    reader: NibbleReader<'a>,
    row: usize,
    /// Pixels of `run_color` still owed by the last repeat token
    pending: u8,
    run_color: u8,
    ramp: ColorRamp,
}

impl<'a> RenderSession<'a> {
    /// Start rendering `code`, or the font's default symbol if the font doesn't have it.
    ///
    /// The font must be valid (see [`PackedFont::validate`]).
    pub fn new(font: &PackedFont<'a>, code: u32, background: u16, foreground: u16) -> Self {
        Self::with_ramp(font, code, ColorRamp::new(background, foreground))
    }

    pub fn with_ramp(font: &PackedFont<'a>, code: u32, ramp: ColorRamp) -> Self {
        let symbol = font.symbol(code);
        Self {
            font: *font,
            symbol,
            reader: Self::reader_for(font, symbol),
            row: 0,
            pending: 0,
            run_color: 0,
            ramp,
        }
    }

    /// Start over on a different symbol with the same font and colors.
    pub fn restart(&mut self, code: u32) {
        let symbol = self.font.symbol(code);
        self.start(symbol);
    }

    /// Start over on the font's default symbol.
    pub fn restart_with_default(&mut self) {
        let symbol = self.font.default_symbol();
        self.start(symbol);
    }

    fn start(&mut self, symbol: &'a SymbolDesc) {
        self.symbol = symbol;
        self.reader = Self::reader_for(&self.font, symbol);
        self.row = 0;
        self.pending = 0;
        self.run_color = 0;
    }

    fn reader_for(font: &PackedFont<'a>, symbol: &SymbolDesc) -> NibbleReader<'a> {
        NibbleReader::new(font.bmp, symbol.offset as usize, symbol.nibble)
    }

    pub fn symbol(&self) -> &'a SymbolDesc {
        self.symbol
    }

    pub fn ramp(&self) -> &ColorRamp {
        &self.ramp
    }

    /// Pixels written by each call to [`RenderSession::next_row`].
    pub fn columns(&self) -> usize {
        self.symbol.columns()
    }

    /// Rows produced so far.
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn is_finished(&self) -> bool {
        self.row >= self.font.row_height as usize
    }

    fn row_kind(&self) -> RowKind {
        if self.row < self.symbol.y_offset as usize {
            RowKind::AboveGlyph
        } else if self.row < self.symbol.last_row() {
            RowKind::InGlyph
        } else {
            RowKind::BelowGlyph
        }
    }

    /// Write the next row into the front of `dst`, which must hold at least
    /// [`columns`](Self::columns) pixels. Returns `true` once the last row of the text line has
    /// been written.
    ///
    /// On error the session is left part way through a row and should be discarded or restarted.
    pub fn next_row(&mut self, dst: &mut [u16]) -> Result<bool, DecodeError> {
        let columns = self.columns();
        let got = dst.len();
        let row = dst
            .get_mut(..columns)
            .ok_or(DecodeError::DestinationTooSmall {
                needed: columns,
                got,
            })?;
        let background = self.ramp.background();

        match self.row_kind() {
            RowKind::AboveGlyph | RowKind::BelowGlyph => row.fill(background),
            RowKind::InGlyph => {
                let first_col = self.symbol.x_offset as usize;
                let last_col = self.symbol.last_col();
                row[..first_col].fill(background);
                self.decode_span(&mut row[first_col..last_col])?;
                row[last_col..].fill(background);
            }
        }

        self.row += 1;
        Ok(self.is_finished())
    }

    /// Render every row of the current symbol into `dst`, `stride` pixels apart, starting from the
    /// first row. If the symbol's data is corrupt the whole cell is rendered again with the
    /// default symbol, so `dst` never holds a partial glyph. Returns the symbol that was drawn.
    pub fn render_cell(
        &mut self,
        dst: &mut [u16],
        stride: usize,
    ) -> Result<&'a SymbolDesc, DecodeError> {
        self.start(self.symbol);
        match self.render_rows(dst, stride) {
            Ok(()) => Ok(self.symbol),
            Err(DecodeError::OutOfBounds { .. })
                if !core::ptr::eq(self.symbol, self.font.default_symbol()) =>
            {
                #[cfg(feature = "tracing")]
                tracing::event!(
                    tracing::Level::WARN,
                    code = self.symbol.code,
                    "glyph data is corrupt, drawing the default symbol"
                );
                self.restart_with_default();
                self.render_rows(dst, stride)?;
                Ok(self.symbol)
            }
            Err(e) => Err(e),
        }
    }

    fn render_rows(&mut self, dst: &mut [u16], stride: usize) -> Result<(), DecodeError> {
        let rows = self.font.row_height as usize;
        let columns = self.columns();
        let needed = stride * rows;
        if stride < columns || dst.len() < needed {
            return Err(DecodeError::DestinationTooSmall {
                needed: needed.max(columns * rows),
                got: dst.len(),
            });
        }
        for row in 0..rows {
            if self.next_row(&mut dst[row * stride..])? {
                break;
            }
        }
        Ok(())
    }

    /// Fill one bitmap row from the token stream, carrying an unfinished run to the next row.
    fn decode_span(&mut self, span: &mut [u16]) -> Result<(), DecodeError> {
        let mut col = 0;
        while col < span.len() {
            if self.pending == 0 {
                let token = self
                    .reader
                    .next_token()
                    .map_err(|end| DecodeError::OutOfBounds {
                        code: self.symbol.code,
                        offset: end.offset,
                    })?;
                match token {
                    Token::Literal(level) => {
                        self.run_color = level;
                        span[col] = self.ramp.get(level);
                        col += 1;
                        continue;
                    }
                    Token::Repeat(run) => self.pending = run,
                }
            }
            let take = (self.pending as usize).min(span.len() - col);
            span[col..col + take].fill(self.ramp.get(self.run_color));
            col += take;
            self.pending -= take as u8;
        }
        Ok(())
    }
}

/// Render a whole glyph into `dst` as `row_height` rows of `stride` pixels.
///
/// If the glyph's data is corrupt the default symbol is rendered instead. Returns the symbol that
/// was drawn.
pub fn render_glyph<'a>(
    font: &PackedFont<'a>,
    code: u32,
    background: u16,
    foreground: u16,
    dst: &mut [u16],
    stride: usize,
) -> Result<&'a SymbolDesc, DecodeError> {
    RenderSession::new(font, code, background, foreground).render_cell(dst, stride)
}

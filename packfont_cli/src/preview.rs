//! Lays a line of text out with a packed font so it can be printed to a terminal.
use packfont_core::{ColorRamp, DecodeError, PackedFont, RenderSession};

/// Darkest to brightest, one per intensity level.
const SHADES: [char; 8] = [' ', '.', ':', '-', '=', '+', '*', '#'];

/// One rendered line of text, `row_height` rows of `width` 565 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    pub width: usize,
    pub ramp: ColorRamp,
    pub rows: Vec<Vec<u16>>,
}

pub fn render_text(
    font: &PackedFont<'_>,
    text: &str,
    background: u16,
    foreground: u16,
) -> Result<TextLine, DecodeError> {
    let ramp = ColorRamp::new(background, foreground);
    let row_height = font.row_height as usize;
    let stride = font.max_symbol_width();
    let mut cell = vec![ramp.background(); stride * row_height];
    let mut rows = vec![Vec::new(); row_height];

    let mut session = RenderSession::with_ramp(font, 0, ramp);
    for c in text.chars() {
        session.restart(c as u32);
        let columns = session.render_cell(&mut cell, stride)?.columns();
        for (row, line) in rows.iter_mut().zip(cell.chunks(stride.max(1))) {
            row.extend_from_slice(&line[..columns]);
        }
    }
    let width = rows.first().map_or(0, Vec::len);

    Ok(TextLine { width, ramp, rows })
}

impl TextLine {
    /// Each pixel as big-endian hex, one line per row.
    pub fn hex_rows(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|pixel| format!("{pixel:04X}"))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    /// Each pixel as a shade character picked by its position on the color ramp.
    pub fn ascii_rows(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|pixel| {
                        let level = self
                            .ramp
                            .colors()
                            .iter()
                            .position(|color| color == pixel)
                            .unwrap_or(0);
                        SHADES[level]
                    })
                    .collect()
            })
            .collect()
    }
}

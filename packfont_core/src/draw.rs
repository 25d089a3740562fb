//! Draw packed text onto an `embedded-graphics` [`DrawTarget`].
use crate::{
    color::ColorRamp,
    font::PackedFont,
    render::{DecodeError, RenderSession},
};
use alloc::vec::Vec;
use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{Point, Size},
    pixelcolor::{raw::RawU16, IntoStorage, Rgb565},
    primitives::Rectangle,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawError<E> {
    Decode(DecodeError),
    Target(E),
}

impl<E: core::fmt::Debug> core::fmt::Display for DrawError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DrawError::Decode(error) => write!(f, "{error}"),
            DrawError::Target(error) => write!(f, "draw target error: {error:?}"),
        }
    }
}

#[cfg(feature = "std")]
impl<E: core::fmt::Debug> std::error::Error for DrawError<E> {}

/// Text color, background color and font. Text is drawn as opaque cells so the background is
/// painted too.
#[derive(Debug, Clone)]
pub struct PackedTextStyle<'a> {
    pub font: PackedFont<'a>,
    ramp: ColorRamp,
}

impl<'a> PackedTextStyle<'a> {
    pub fn new(font: PackedFont<'a>, text_color: Rgb565, background_color: Rgb565) -> Self {
        Self {
            font,
            ramp: ColorRamp::new(background_color.into_storage(), text_color.into_storage()),
        }
    }

    /// Draw one character cell with its top left corner at `position`. Returns where the next
    /// character goes.
    pub fn draw_char<D>(
        &self,
        c: char,
        position: Point,
        target: &mut D,
    ) -> Result<Point, DrawError<D::Error>>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let mut cell = self.cell_buffer();
        let mut session = RenderSession::with_ramp(&self.font, c as u32, self.ramp);
        self.draw_session(&mut session, &mut cell, position, target)
    }

    /// Draw `text` on one line starting at `position` (top left). Returns the position after the
    /// last character.
    pub fn draw_string<D>(
        &self,
        text: &str,
        position: Point,
        target: &mut D,
    ) -> Result<Point, DrawError<D::Error>>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let mut cell = self.cell_buffer();
        let mut session = RenderSession::with_ramp(&self.font, 0, self.ramp);
        let mut position = position;
        for c in text.chars() {
            session.restart(c as u32);
            position = self.draw_session(&mut session, &mut cell, position, target)?;
        }
        Ok(position)
    }

    fn cell_buffer(&self) -> Vec<u16> {
        vec![0u16; self.font.max_symbol_width() * self.font.row_height as usize]
    }

    /// Decode the whole cell first and hand it to the target in one fill, so a corrupt glyph never
    /// reaches the display half drawn.
    fn draw_session<D>(
        &self,
        session: &mut RenderSession<'a>,
        cell: &mut [u16],
        position: Point,
        target: &mut D,
    ) -> Result<Point, DrawError<D::Error>>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let stride = self.font.max_symbol_width();
        let rows = self.font.row_height as usize;
        let columns = session
            .render_cell(cell, stride)
            .map_err(DrawError::Decode)?
            .columns();
        let area = Rectangle::new(position, Size::new(columns as u32, rows as u32));
        let pixels = cell
            .chunks(stride.max(1))
            .take(rows)
            .flat_map(|line| line[..columns].iter())
            .map(|&color| Rgb565::from(RawU16::new(color)));
        target
            .fill_contiguous(&area, pixels)
            .map_err(DrawError::Target)?;
        Ok(Point::new(position.x + columns as i32, position.y))
    }

    /// Size of `text` drawn on one line.
    pub fn measure(&self, text: &str) -> Size {
        Size::new(self.font.measure(text) as u32, self.font.row_height as u32)
    }
}

#![no_std]
//! Anti-aliased bitmap fonts packed into nibble run-length streams for small displays.
//!
//! [`encode`] turns an atlas of 8 level glyph bitmaps into one shared byte blob and a table of
//! [`SymbolDesc`]s sorted by code. [`RenderSession`] decodes a glyph back one display row at a
//! time, blending between a background and a foreground color.
#[cfg(feature = "std")]
extern crate std;

#[macro_use]
extern crate alloc;

pub mod atlas;
pub mod color;
#[cfg(feature = "embedded-graphics")]
pub mod draw;
pub mod encode;
pub mod font;
pub mod render;
pub mod symbol;
pub mod token;

pub use atlas::{intensity_from_rgb, Atlas, GlyphMetrics, IntensityAtlas};
pub use color::{ColorRamp, UnpackedColor};
pub use encode::{encode, EncodeError, EncodedFont};
pub use font::{FontError, LoadError, OwnedFont, PackedFont};
pub use render::{render_glyph, DecodeError, RenderSession};
pub use symbol::{check_table, find_symbol_index, SymbolDesc, TableError};
pub use token::{NibbleParity, Token};

use anyhow::{anyhow, Context};
use packfont_core::IntensityAtlas;
use std::path::Path;
use tracing::{event, Level};

/// Load the atlas page image and reduce it to 3 bit intensities.
///
/// The image has to be exactly the size the descriptor declares.
pub fn load_atlas(path: &Path, width: u32, height: u32) -> anyhow::Result<IntensityAtlas> {
    let image = image::open(path)
        .with_context(|| format!("can't read atlas image '{}'", path.display()))?;
    let rgb = image.to_rgb8();
    event!(
        Level::DEBUG,
        path = %path.display(),
        color = ?image.color(),
        width = rgb.width(),
        height = rgb.height(),
        "loaded atlas image"
    );
    if rgb.dimensions() != (width, height) {
        return Err(anyhow!(
            "atlas image '{}' is {}x{} but the descriptor says {}x{}",
            path.display(),
            rgb.width(),
            rgb.height(),
            width,
            height
        ));
    }
    IntensityAtlas::from_rgb8(width, height, rgb.as_raw())
        .ok_or_else(|| anyhow!("atlas image '{}' has a truncated pixel buffer", path.display()))
}

use anyhow::{anyhow, Context};
use artifact::Format;
use descriptor::FontDescriptor;
use packfont_core::{encode, OwnedFont, SymbolDesc};
use std::path::{Path, PathBuf};
use tracing::{event, Level};

mod artifact;
mod atlas_image;
mod descriptor;
mod preview;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    #[arg(short)]
    verbosity: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Pack a BMFont descriptor and its atlas image
    Pack {
        #[arg(value_name = "DESCRIPTOR")]
        descriptor: PathBuf,
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,
        /// Identifier for the generated font, defaults to the descriptor's file stem
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long, value_enum, default_value_t = Format::C)]
        format: Format,
        /// Character drawn for codes the font doesn't have
        #[arg(short, long)]
        default_char: Option<char>,
    },
    /// Render text with a packed `.bin` font
    Render {
        #[arg(value_name = "FONT")]
        font: PathBuf,
        #[arg(value_name = "TEXT")]
        text: String,
        #[arg(long, value_parser = parse_color, default_value = "0x0000")]
        bg: u16,
        #[arg(long, value_parser = parse_color, default_value = "0xFFFF")]
        fg: u16,
        /// Print shades instead of hex pixels
        #[arg(long)]
        ascii: bool,
    },
    /// Summarize a packed `.bin` font
    Inspect {
        #[arg(value_name = "FONT")]
        font: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

fn parse_color(value: &str) -> Result<u16, String> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u16::from_str_radix(digits, 16).map_err(|e| format!("'{value}' is not a 565 color: {e}"))
}

/// Index of the symbol to draw for missing codes. Without a choice `?` is used when the font has
/// one.
fn default_index(symbols: &[SymbolDesc], default_char: Option<char>) -> anyhow::Result<u16> {
    let index = match default_char {
        Some(c) => symbols
            .binary_search_by_key(&(c as u32), |symbol| symbol.code)
            .map_err(|_| anyhow!("default char {c:?} isn't in the font"))?,
        None => symbols
            .binary_search_by_key(&('?' as u32), |symbol| symbol.code)
            .unwrap_or(0),
    };
    u16::try_from(index).context("too many symbols")
}

fn load_font(path: &Path) -> anyhow::Result<OwnedFont> {
    let bytes =
        std::fs::read(path).with_context(|| format!("can't read font '{}'", path.display()))?;
    OwnedFont::from_bytes(&bytes).with_context(|| format!("can't load font '{}'", path.display()))
}

fn pack(
    descriptor_path: &Path,
    out_dir: &Path,
    name: Option<String>,
    format: Format,
    default_char: Option<char>,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(descriptor_path)
        .with_context(|| format!("can't read descriptor '{}'", descriptor_path.display()))?;
    let descriptor = FontDescriptor::parse(&text)
        .with_context(|| format!("bad descriptor '{}'", descriptor_path.display()))?;
    event!(
        Level::DEBUG,
        glyphs = descriptor.glyphs.len(),
        row_height = descriptor.row_height,
        page = %descriptor.page_file,
        "parsed descriptor"
    );

    let page_path = descriptor_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(&descriptor.page_file);
    let atlas = atlas_image::load_atlas(
        &page_path,
        descriptor.atlas_width,
        descriptor.atlas_height,
    )?;

    let encoded = encode(&descriptor.glyphs, &atlas)?;
    let default_index = default_index(&encoded.symbols, default_char)?;
    let total_bytes = encoded.total_bytes();
    let font = OwnedFont::from_encoded(encoded, descriptor.row_height, default_index)?;

    let name = match name {
        Some(name) => name,
        None => descriptor_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| anyhow!("can't name the font, pass --name"))?
            .to_string(),
    };
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("can't create '{}'", out_dir.display()))?;
    let source = descriptor_path.display().to_string();
    let written = artifact::write_artifacts(out_dir, &name, &source, format, &font)?;

    event!(
        Level::INFO,
        symbols = font.symbols.len(),
        bytes = total_bytes,
        default_code = font.symbols[default_index as usize].code,
        "packed font"
    );
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

fn render(font_path: &Path, text: &str, bg: u16, fg: u16, ascii: bool) -> anyhow::Result<()> {
    let font = load_font(font_path)?;
    let font = font.as_font();
    for c in text.chars() {
        if !font.contains(c as u32) {
            event!(Level::WARN, character = ?c, "not in font, drawing the default symbol");
        }
    }
    let line = preview::render_text(&font, text, bg, fg)?;
    let rows = if ascii {
        line.ascii_rows()
    } else {
        line.hex_rows()
    };
    for row in rows {
        println!("{row}");
    }
    Ok(())
}

fn inspect(font_path: &Path, json: bool) -> anyhow::Result<()> {
    let owned = load_font(font_path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&owned)?);
        return Ok(());
    }

    let font = owned.as_font();
    println!("row height:        {}", font.row_height);
    println!("symbols:           {}", font.symbols_count());
    println!("blob bytes:        {}", font.bmp.len());
    println!("default symbol:    {}", font.default_symbol().code);
    println!("max symbol width:  {}", font.max_symbol_width());
    println!();
    println!(
        "{:>8} {:>8} {:>6} {:>5} {:>6} {:>4} {:>4} {:>4}",
        "code", "offset", "nibble", "w", "h", "xo", "yo", "adv"
    );
    for symbol in font.symbols {
        println!(
            "{:>8} {:>8} {:>6} {:>5} {:>6} {:>4} {:>4} {:>4}",
            symbol.code,
            symbol.offset,
            symbol.nibble.is_low() as u8,
            symbol.width,
            symbol.height,
            symbol.x_offset,
            symbol.y_offset,
            symbol.x_advance
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if cli.verbosity {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .with_writer(std::io::stderr)
        .pretty()
        .finish();
    // use that subscriber to process traces emitted after this point
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Command::Pack {
            descriptor,
            out_dir,
            name,
            format,
            default_char,
        } => pack(&descriptor, &out_dir, name, format, default_char),
        Command::Render {
            font,
            text,
            bg,
            fg,
            ascii,
        } => render(&font, &text, bg, fg, ascii),
        Command::Inspect { font, json } => inspect(&font, json),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use packfont_core::NibbleParity;

    fn symbol(code: u32) -> SymbolDesc {
        SymbolDesc {
            code,
            offset: 0,
            nibble: NibbleParity::High,
            width: 1,
            height: 1,
            x_offset: 0,
            y_offset: 0,
            x_advance: 1,
        }
    }

    #[test]
    fn colors_parse_with_or_without_prefix() {
        assert_eq!(parse_color("0xF800"), Ok(0xF800));
        assert_eq!(parse_color("0X001f"), Ok(0x001F));
        assert_eq!(parse_color("07E0"), Ok(0x07E0));
        assert!(parse_color("0x10000").is_err());
        assert!(parse_color("red").is_err());
    }

    #[test]
    fn default_char_resolution() {
        let symbols = [symbol(32), symbol('?' as u32), symbol('A' as u32)];
        assert_eq!(default_index(&symbols, None).unwrap(), 1);
        assert_eq!(default_index(&symbols, Some('A')).unwrap(), 2);
        assert!(default_index(&symbols, Some('Z')).is_err());

        let no_question = [symbol(32), symbol('A' as u32)];
        assert_eq!(default_index(&no_question, None).unwrap(), 0);
    }

    #[test]
    fn pack_descriptor_to_bin() {
        use image::{ImageFormat, Rgb, RgbImage};

        let dir = tempfile::tempdir().unwrap();
        let mut atlas = RgbImage::new(4, 2);
        atlas.put_pixel(0, 0, Rgb([255, 255, 255]));
        atlas.put_pixel(1, 1, Rgb([255, 255, 255]));
        atlas.put_pixel(3, 0, Rgb([128, 128, 128]));
        atlas
            .save_with_format(dir.path().join("tiny_0.tga"), ImageFormat::Tga)
            .unwrap();
        let descriptor = dir.path().join("tiny.fnt");
        std::fs::write(
            &descriptor,
            "common lineHeight=3 base=2 scaleW=4 scaleH=2 pages=1\n\
             page id=0 file=\"tiny_0.tga\"\n\
             chars count=2\n\
             char id=65 x=0 y=0 width=2 height=2 xoffset=0 yoffset=0 xadvance=2\n\
             char id=63 x=3 y=0 width=1 height=1 xoffset=1 yoffset=1 xadvance=3\n",
        )
        .unwrap();

        let out_dir = dir.path().join("out");
        pack(&descriptor, &out_dir, None, Format::Bin, None).unwrap();

        let font = load_font(&out_dir.join("tiny.bin")).unwrap();
        assert_eq!(font.row_height, 3);
        assert_eq!(font.symbols.len(), 2);
        assert_eq!(font.symbols[font.default_index as usize].code, '?' as u32);

        let line = preview::render_text(&font.as_font(), "A?", 0x0000, 0xFFFF).unwrap();
        assert_eq!(line.ascii_rows(), vec!["#    ", " # = ", "     "]);
    }
}

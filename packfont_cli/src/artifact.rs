//! Writers for packed font artifacts: C declarations and definitions, a Rust module, or a bincode
//! file that `render` and `inspect` can load back.
use anyhow::Context;
use packfont_core::{NibbleParity, OwnedFont, SymbolDesc};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

const BYTES_PER_LINE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// `<name>.h` and `<name>.c`
    C,
    /// `<name>.rs` for use with packfont_core
    Rust,
    /// `<name>.bin`, bincode encoded
    Bin,
}

/// Turn an arbitrary file stem into a C and Rust identifier.
pub fn identifier(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

fn symbol_label(symbol: &SymbolDesc) -> String {
    match char::from_u32(symbol.code).filter(|c| !c.is_control()) {
        Some(c) => format!("'{}'", c.escape_default()),
        None => format!("U+{:04X}", symbol.code),
    }
}

fn write_bytes(out: &mut impl Write, bytes: &[u8], indent: &str) -> std::io::Result<()> {
    for line in bytes.chunks(BYTES_PER_LINE) {
        let hex: Vec<String> = line.iter().map(|byte| format!("0x{byte:02X},")).collect();
        writeln!(out, "{indent}{}", hex.join(" "))?;
    }
    Ok(())
}

pub fn write_c_header(out: &mut impl Write, name: &str, font: &OwnedFont) -> std::io::Result<()> {
    let guard = format!("_{}_H_", name.to_ascii_uppercase());
    writeln!(out, "#ifndef {guard}")?;
    writeln!(out, "#define {guard}")?;
    writeln!(out)?;
    writeln!(out, "#include <inttypes.h>")?;
    writeln!(out, "#include \"font_bmp.h\"")?;
    writeln!(out)?;
    writeln!(
        out,
        "#define {name}_MAX_SYMBOL_WIDTH {}",
        font.as_font().max_symbol_width()
    )?;
    writeln!(out)?;
    writeln!(out, "extern const uint8_t {name}_bmp[{}];", font.bmp.len())?;
    writeln!(
        out,
        "extern const packed_symbol_desc_s {name}_symbols[{}];",
        font.symbols.len()
    )?;
    writeln!(out, "extern const packed_font_desc_s {name};")?;
    writeln!(out)?;
    writeln!(out, "#endif // {guard}")?;
    Ok(())
}

pub fn write_c_source(
    out: &mut impl Write,
    name: &str,
    header_file: &str,
    font: &OwnedFont,
) -> std::io::Result<()> {
    writeln!(out, "#include \"{header_file}\"")?;
    writeln!(out)?;
    writeln!(out, "const uint8_t {name}_bmp[{}] = {{", font.bmp.len())?;
    write_bytes(out, &font.bmp, "  ")?;
    writeln!(out, "}};")?;
    writeln!(out)?;
    writeln!(out, "// code, offset, nibble, width, height, x_offset, y_offset, x_advance")?;
    writeln!(
        out,
        "const packed_symbol_desc_s {name}_symbols[{}] = {{",
        font.symbols.len()
    )?;
    for symbol in &font.symbols {
        writeln!(
            out,
            "  {{ {}, {}, {}, {}, {}, {}, {}, {} }}, // {}",
            symbol.code,
            symbol.offset,
            symbol.nibble.is_low() as u8,
            symbol.width,
            symbol.height,
            symbol.x_offset,
            symbol.y_offset,
            symbol.x_advance,
            symbol_label(symbol)
        )?;
    }
    writeln!(out, "}};")?;
    writeln!(out)?;
    writeln!(out, "const packed_font_desc_s {name} = {{")?;
    writeln!(
        out,
        "  {name}_bmp, {}, {}, {}, {name}_symbols",
        font.symbols.len(),
        font.row_height,
        font.default_index
    )?;
    writeln!(out, "}};")?;
    Ok(())
}

pub fn write_rust_module(
    out: &mut impl Write,
    name: &str,
    source: &str,
    font: &OwnedFont,
) -> std::io::Result<()> {
    let upper = name.to_ascii_uppercase();
    writeln!(out, "//! Generated by packfont from `{source}`. Do not edit.")?;
    writeln!(out, "use packfont_core::{{NibbleParity, PackedFont, SymbolDesc}};")?;
    writeln!(out)?;
    writeln!(
        out,
        "pub const {upper}_MAX_SYMBOL_WIDTH: usize = {};",
        font.as_font().max_symbol_width()
    )?;
    writeln!(out)?;
    writeln!(out, "static BMP: [u8; {}] = [", font.bmp.len())?;
    write_bytes(out, &font.bmp, "    ")?;
    writeln!(out, "];")?;
    writeln!(out)?;
    writeln!(out, "static SYMBOLS: [SymbolDesc; {}] = [", font.symbols.len())?;
    for symbol in &font.symbols {
        let nibble = match symbol.nibble {
            NibbleParity::High => "High",
            NibbleParity::Low => "Low",
        };
        writeln!(
            out,
            "    SymbolDesc {{ code: {}, offset: {}, nibble: NibbleParity::{nibble}, width: {}, height: {}, x_offset: {}, y_offset: {}, x_advance: {} }}, // {}",
            symbol.code,
            symbol.offset,
            symbol.width,
            symbol.height,
            symbol.x_offset,
            symbol.y_offset,
            symbol.x_advance,
            symbol_label(symbol)
        )?;
    }
    writeln!(out, "];")?;
    writeln!(out)?;
    writeln!(out, "pub static {upper}: PackedFont<'static> = PackedFont {{")?;
    writeln!(out, "    bmp: &BMP,")?;
    writeln!(out, "    row_height: {},", font.row_height)?;
    writeln!(out, "    default_index: {},", font.default_index)?;
    writeln!(out, "    symbols: &SYMBOLS,")?;
    writeln!(out, "}};")?;
    Ok(())
}

fn create(path: &Path) -> anyhow::Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("can't open '{}' for write", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Write the artifact files for `font` into `out_dir` and return their paths.
pub fn write_artifacts(
    out_dir: &Path,
    name: &str,
    source: &str,
    format: Format,
    font: &OwnedFont,
) -> anyhow::Result<Vec<PathBuf>> {
    let name = identifier(name);
    let written = match format {
        Format::C => {
            let header_path = out_dir.join(format!("{name}.h"));
            let source_path = out_dir.join(format!("{name}.c"));
            let header_file = format!("{name}.h");

            let mut header = create(&header_path)?;
            write_c_header(&mut header, &name, font)?;
            header.flush()?;

            let mut c_source = create(&source_path)?;
            write_c_source(&mut c_source, &name, &header_file, font)?;
            c_source.flush()?;

            vec![header_path, source_path]
        }
        Format::Rust => {
            let path = out_dir.join(format!("{name}.rs"));
            let mut module = create(&path)?;
            write_rust_module(&mut module, &name, source, font)?;
            module.flush()?;
            vec![path]
        }
        Format::Bin => {
            let path = out_dir.join(format!("{name}.bin"));
            let bytes = font.to_bytes().context("encoding font")?;
            std::fs::write(&path, bytes)
                .with_context(|| format!("can't write '{}'", path.display()))?;
            vec![path]
        }
    };
    Ok(written)
}

//! Reader for AngelCode BMFont text descriptors, the format most atlas generators export.
//!
//! ```text
//! common lineHeight=32 base=26 scaleW=256 scaleH=256 pages=1
//! page id=0 file="font_0.tga"
//! chars count=95
//! char id=65 x=10 y=0 width=18 height=22 xoffset=0 yoffset=4 xadvance=18 page=0 chnl=15
//! ```
use packfont_core::GlyphMetrics;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{event, Level};

/// Everything the descriptor says about the font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontDescriptor {
    pub row_height: u16,
    pub atlas_width: u32,
    pub atlas_height: u32,
    /// Atlas image file, relative to the descriptor
    pub page_file: String,
    pub glyphs: Vec<GlyphMetrics>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    MissingKey { line: usize, key: &'static str },
    BadValue { line: usize, key: &'static str, value: String },
    UnterminatedQuote { line: usize },
    CharBeforeHeader { line: usize },
    TooManyChars { line: usize, count: usize },
    MissingHeader { tag: &'static str },
    CharCountMismatch { expected: usize, found: usize },
    NoChars,
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorError::MissingKey { line, key } => {
                write!(f, "line {line}: missing '{key}'")
            }
            DescriptorError::BadValue { line, key, value } => {
                write!(f, "line {line}: '{key}' has invalid value '{value}'")
            }
            DescriptorError::UnterminatedQuote { line } => {
                write!(f, "line {line}: unterminated quoted value")
            }
            DescriptorError::CharBeforeHeader { line } => write!(
                f,
                "line {line}: 'char' found before the 'common', 'page' and 'chars' lines"
            ),
            DescriptorError::TooManyChars { line, count } => write!(
                f,
                "line {line}: more 'char' lines than the {count} declared"
            ),
            DescriptorError::MissingHeader { tag } => write!(f, "no '{tag}' line"),
            DescriptorError::CharCountMismatch { expected, found } => write!(
                f,
                "{expected} chars were declared but {found} were defined"
            ),
            DescriptorError::NoChars => write!(f, "the font has no chars"),
        }
    }
}

impl std::error::Error for DescriptorError {}

/// One descriptor line split into its tag and `key=value` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    number: usize,
    tag: String,
    values: BTreeMap<String, String>,
}

impl Line {
    fn parse(number: usize, text: &str) -> Result<Option<Self>, DescriptorError> {
        let text = text.trim();
        let (tag, rest) = match text.split_once(char::is_whitespace) {
            Some((tag, rest)) => (tag, rest),
            None => (text, ""),
        };
        if tag.is_empty() {
            return Ok(None);
        }

        let mut values = BTreeMap::new();
        let mut rest = rest.trim_start();
        while !rest.is_empty() {
            let (key, after_key) = match rest.split_once('=') {
                Some(split) => split,
                // a bare word with no value
                None => break,
            };
            let key = key.trim();
            let (value, remaining) = if let Some(quoted) = after_key.strip_prefix('"') {
                let end = quoted
                    .find('"')
                    .ok_or(DescriptorError::UnterminatedQuote { line: number })?;
                (&quoted[..end], &quoted[end + 1..])
            } else {
                match after_key.split_once(char::is_whitespace) {
                    Some((value, remaining)) => (value, remaining),
                    None => (after_key, ""),
                }
            };
            values.insert(key.to_string(), value.to_string());
            rest = remaining.trim_start();
        }

        Ok(Some(Self {
            number,
            tag: tag.to_string(),
            values,
        }))
    }

    fn get<T: std::str::FromStr>(&self, key: &'static str) -> Result<T, DescriptorError> {
        let value = self.values.get(key).ok_or(DescriptorError::MissingKey {
            line: self.number,
            key,
        })?;
        value.parse().map_err(|_| DescriptorError::BadValue {
            line: self.number,
            key,
            value: value.clone(),
        })
    }

    fn get_string(&self, key: &'static str) -> Result<String, DescriptorError> {
        self.values
            .get(key)
            .cloned()
            .ok_or(DescriptorError::MissingKey {
                line: self.number,
                key,
            })
    }

    /// A signed placement offset. Packed offsets can't be negative so those are clamped to zero.
    fn get_offset(&self, key: &'static str, code: u32) -> Result<u8, DescriptorError> {
        let value: i32 = self.get(key)?;
        if value < 0 {
            event!(
                Level::WARN,
                code,
                key,
                value,
                "negative offset clamped to zero"
            );
        }
        u8::try_from(value.max(0)).map_err(|_| DescriptorError::BadValue {
            line: self.number,
            key,
            value: value.to_string(),
        })
    }
}

#[derive(Default)]
struct Header {
    common: Option<(u16, u32, u32)>,
    page_file: Option<String>,
    count: Option<usize>,
}

impl Header {
    fn warn_repeat(tag: &str, line: usize) {
        event!(Level::WARN, tag, line, "line repeated, using the last one");
    }
}

impl FontDescriptor {
    pub fn parse(text: &str) -> Result<Self, DescriptorError> {
        let mut header = Header::default();
        let mut glyphs = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line = match Line::parse(index + 1, raw)? {
                Some(line) => line,
                None => continue,
            };
            match line.tag.as_str() {
                "common" => {
                    if header.common.is_some() {
                        Header::warn_repeat("common", line.number);
                    }
                    header.common = Some((
                        line.get("lineHeight")?,
                        line.get("scaleW")?,
                        line.get("scaleH")?,
                    ));
                }
                "page" => {
                    if header.page_file.is_some() {
                        Header::warn_repeat("page", line.number);
                    }
                    header.page_file = Some(line.get_string("file")?);
                }
                "chars" => {
                    if header.count.is_some() {
                        Header::warn_repeat("chars", line.number);
                    }
                    let count: usize = line.get("count")?;
                    glyphs.reserve(count);
                    header.count = Some(count);
                }
                "char" => {
                    let count = match (&header.common, &header.page_file, header.count) {
                        (Some(_), Some(_), Some(count)) => count,
                        _ => return Err(DescriptorError::CharBeforeHeader { line: line.number }),
                    };
                    if glyphs.len() >= count {
                        return Err(DescriptorError::TooManyChars {
                            line: line.number,
                            count,
                        });
                    }
                    let code = line.get("id")?;
                    glyphs.push(GlyphMetrics {
                        code,
                        x: line.get("x")?,
                        y: line.get("y")?,
                        width: line.get("width")?,
                        height: line.get("height")?,
                        x_offset: line.get_offset("xoffset", code)?,
                        y_offset: line.get_offset("yoffset", code)?,
                        advance: line.get("xadvance")?,
                    });
                }
                other => {
                    event!(Level::DEBUG, tag = other, line = line.number, "skipping line");
                }
            }
        }

        let (row_height, atlas_width, atlas_height) = header
            .common
            .ok_or(DescriptorError::MissingHeader { tag: "common" })?;
        let page_file = header
            .page_file
            .ok_or(DescriptorError::MissingHeader { tag: "page" })?;
        let count = header
            .count
            .ok_or(DescriptorError::MissingHeader { tag: "chars" })?;
        if glyphs.is_empty() {
            return Err(DescriptorError::NoChars);
        }
        if glyphs.len() != count {
            return Err(DescriptorError::CharCountMismatch {
                expected: count,
                found: glyphs.len(),
            });
        }

        Ok(Self {
            row_height,
            atlas_width,
            atlas_height,
            page_file,
            glyphs,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SAMPLE: &str = r#"info face="Noto Sans" size=17 bold=0 italic=0 charset="" unicode=1
common lineHeight=20 base=16 scaleW=64 scaleH=32 pages=1 packed=0
page id=0 file="noto sans_0.tga"
chars count=2
char id=65 x=0 y=0 width=11 height=12 xoffset=0 yoffset=4 xadvance=11 page=0 chnl=15
char id=103 x=12 y=0 width=9 height=13 xoffset=-1 yoffset=7 xadvance=10 page=0 chnl=15
kernings count=0
"#;

    #[test]
    fn parse_sample() {
        let descriptor = FontDescriptor::parse(SAMPLE).unwrap();
        assert_eq!(descriptor.row_height, 20);
        assert_eq!((descriptor.atlas_width, descriptor.atlas_height), (64, 32));
        assert_eq!(descriptor.page_file, "noto sans_0.tga");
        assert_eq!(
            descriptor.glyphs,
            vec![
                GlyphMetrics {
                    code: 65,
                    x: 0,
                    y: 0,
                    width: 11,
                    height: 12,
                    x_offset: 0,
                    y_offset: 4,
                    advance: 11,
                },
                GlyphMetrics {
                    code: 103,
                    x: 12,
                    y: 0,
                    width: 9,
                    height: 13,
                    x_offset: 0,
                    y_offset: 7,
                    advance: 10,
                },
            ]
        );
    }

    #[test]
    fn each_line_is_tokenized_on_its_own() {
        let line = Line::parse(3, r#"page id=0 file="a b.tga""#).unwrap().unwrap();
        assert_eq!(line.tag, "page");
        assert_eq!(line.values.len(), 2);
        assert_eq!(line.values["file"], "a b.tga");

        let next = Line::parse(4, "chars count=7").unwrap().unwrap();
        assert_eq!(next.values.len(), 1);
        assert_eq!(next.get::<usize>("count"), Ok(7));

        assert_eq!(Line::parse(5, "   ").unwrap(), None);
        assert_eq!(
            Line::parse(6, r#"page file="oops"#),
            Err(DescriptorError::UnterminatedQuote { line: 6 })
        );
    }

    #[test]
    fn char_before_header() {
        let text = "common lineHeight=8 scaleW=8 scaleH=8\nchar id=1 x=0 y=0 width=1 height=1 xoffset=0 yoffset=0 xadvance=1\n";
        assert_eq!(
            FontDescriptor::parse(text),
            Err(DescriptorError::CharBeforeHeader { line: 2 })
        );
    }

    #[test]
    fn char_count_must_match() {
        let too_few = SAMPLE.replace("chars count=2", "chars count=3");
        assert_eq!(
            FontDescriptor::parse(&too_few),
            Err(DescriptorError::CharCountMismatch {
                expected: 3,
                found: 2
            })
        );
        let too_many = SAMPLE.replace("chars count=2", "chars count=1");
        assert_eq!(
            FontDescriptor::parse(&too_many),
            Err(DescriptorError::TooManyChars { line: 6, count: 1 })
        );
        let none = "common lineHeight=8 scaleW=8 scaleH=8\npage file=\"a.tga\"\nchars count=0\n";
        assert_eq!(FontDescriptor::parse(none), Err(DescriptorError::NoChars));
    }

    #[test]
    fn values_must_fit() {
        let wide = SAMPLE.replace("width=11", "width=300");
        assert_eq!(
            FontDescriptor::parse(&wide),
            Err(DescriptorError::BadValue {
                line: 5,
                key: "width",
                value: "300".into()
            })
        );
        let missing = SAMPLE.replace(" scaleW=64", "");
        assert_eq!(
            FontDescriptor::parse(&missing),
            Err(DescriptorError::MissingKey {
                line: 2,
                key: "scaleW"
            })
        );
        let no_page = SAMPLE.replace("page id=0 file=\"noto sans_0.tga\"\n", "");
        assert_eq!(
            FontDescriptor::parse(&no_page),
            Err(DescriptorError::CharBeforeHeader { line: 4 })
        );
    }
}

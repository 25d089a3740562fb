//! The nibble token stream shared by the encoder and the decoder.
//!
//! Each token is four bits. A clear top bit is a *literal* carrying an intensity in `0..=7`. A set
//! top bit is a *repeat* whose low three bits hold `run - 1`, so a single repeat covers 1 to 8
//! more pixels of the last literal's intensity. Tokens are packed two per byte, the first one in
//! the high nibble.

use alloc::vec::Vec;
use bincode::{Decode, Encode};

/// Longest run a single repeat token can express.
pub const MAX_RUN: u8 = 8;

const REPEAT_FLAG: u8 = 0x08;
const PAYLOAD_MASK: u8 = 0x07;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Emit one pixel with this intensity and make it the current run color.
    Literal(u8),
    /// Emit this many (1..=8) pixels of the current run color.
    Repeat(u8),
}

impl Token {
    pub fn from_nibble(nibble: u8) -> Self {
        let payload = nibble & PAYLOAD_MASK;
        if nibble & REPEAT_FLAG == 0 {
            Token::Literal(payload)
        } else {
            Token::Repeat(payload + 1)
        }
    }

    pub fn to_nibble(self) -> u8 {
        match self {
            Token::Literal(level) => {
                debug_assert!(level <= PAYLOAD_MASK);
                level & PAYLOAD_MASK
            }
            Token::Repeat(run) => {
                debug_assert!((1..=MAX_RUN).contains(&run));
                REPEAT_FLAG | ((run - 1) & PAYLOAD_MASK)
            }
        }
    }
}

/// Which half of a byte a token sits in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode, serde::Serialize, serde::Deserialize,
)]
pub enum NibbleParity {
    #[default]
    High,
    Low,
}

impl NibbleParity {
    pub fn is_low(self) -> bool {
        matches!(self, NibbleParity::Low)
    }
}

/// Appends tokens to a byte buffer. The parity carries over between glyphs so streams are packed
/// back to back without padding.
#[derive(Debug, Default, Clone)]
pub struct NibbleWriter {
    bytes: Vec<u8>,
    parity: NibbleParity,
    tokens: usize,
}

impl NibbleWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Where the next token will land, as a byte offset and a nibble parity.
    pub fn position(&self) -> (usize, NibbleParity) {
        match self.parity {
            NibbleParity::High => (self.bytes.len(), NibbleParity::High),
            NibbleParity::Low => (self.bytes.len() - 1, NibbleParity::Low),
        }
    }

    pub fn push(&mut self, token: Token) {
        let nibble = token.to_nibble();
        match self.parity {
            NibbleParity::High => {
                self.bytes.push(nibble << 4);
                self.parity = NibbleParity::Low;
            }
            NibbleParity::Low => {
                // position() guarantees a byte exists when parity is low
                if let Some(last) = self.bytes.last_mut() {
                    *last |= nibble;
                }
                self.parity = NibbleParity::High;
            }
        }
        self.tokens += 1;
    }

    pub fn token_count(&self) -> usize {
        self.tokens
    }

    /// Every byte touched so far, including a half filled trailing byte.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// A token stream position reached past the end of the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOfStream {
    pub offset: usize,
}

/// Reads tokens out of a packed blob with a bounds check on every byte access.
#[derive(Debug, Clone, Copy)]
pub struct NibbleReader<'a> {
    data: &'a [u8],
    offset: usize,
    parity: NibbleParity,
}

impl<'a> NibbleReader<'a> {
    pub fn new(data: &'a [u8], offset: usize, parity: NibbleParity) -> Self {
        Self {
            data,
            offset,
            parity,
        }
    }

    pub fn position(&self) -> (usize, NibbleParity) {
        (self.offset, self.parity)
    }

    pub fn next_token(&mut self) -> Result<Token, EndOfStream> {
        let byte = *self.data.get(self.offset).ok_or(EndOfStream {
            offset: self.offset,
        })?;
        let nibble = match self.parity {
            NibbleParity::High => {
                self.parity = NibbleParity::Low;
                byte >> 4
            }
            NibbleParity::Low => {
                self.parity = NibbleParity::High;
                self.offset += 1;
                byte & 0x0F
            }
        };
        Ok(Token::from_nibble(nibble))
    }
}
